//! Verification of candidate files against the loaded catalogs.
//!
//! Without a game selection a file's whole-content hash is looked up by
//! exact equality. With a game selection the named entry's byte range is
//! hashed at increasing offsets, recovering dumps whose payload is preceded
//! by a short header.

pub mod engine;
pub mod hashing;

pub use engine::{
    VerificationEngine, VerificationOutcome, VerificationReport, VerificationRequest, VerifyConfig,
};
pub use hashing::{ByteRange, FileHasher, HashError, HashProgress, HashProvider};
