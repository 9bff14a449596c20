//! JSON API over the loaded catalogs.
//!
//! ## Starting the Server
//!
//! ```text
//! # Start on default port 8080
//! dump-verifier serve
//!
//! # Custom port, catalogs from disk only
//! dump-verifier --offline serve --port 3000
//! ```
//!
//! ## API Endpoints
//!
//! - `GET /api/systems` - Loaded systems `{system_id, display_name, entry_count}`
//! - `GET /api/games?system=<id>` - Entry names of one system
//! - `POST /api/verify` - Verify server-local files; body is
//!   `{"file_paths": [...], "system_hint": "...", "game_hint": "..."}`
//!
//! Verification runs one request at a time against the shared store.

pub mod server;
