//! Centralized validation and helper functions.

/// Maximum number of rom entries accepted from a single raw catalog document
pub const MAX_ENTRIES: usize = 2_000_000;

/// Security-related constants for input validation
pub const MAX_FILENAME_LENGTH: usize = 255;

/// Validate that a string is a valid SHA-1 digest (40 hex characters).
///
/// # Examples
///
/// ```
/// use dump_verifier::utils::validation::is_valid_sha1;
///
/// assert!(is_valid_sha1("da39a3ee5e6b4b0d3255bfef95601890afd80709"));
/// assert!(!is_valid_sha1("not-a-sha1"));
/// assert!(!is_valid_sha1("da39a3ee5e6b4b0d3255bfef95601890afd8070")); // 39 chars
/// ```
#[must_use]
pub fn is_valid_sha1(s: &str) -> bool {
    s.len() == 40 && s.chars().all(|c| c.is_ascii_hexdigit())
}

/// Normalize a SHA-1 string to lowercase.
/// Returns None if the input is not a valid SHA-1.
#[must_use]
pub fn normalize_sha1(s: &str) -> Option<String> {
    if is_valid_sha1(s) {
        Some(s.to_lowercase())
    } else {
        None
    }
}

/// Lower-cased suffix after the last dot of a file name, or empty if there is none.
///
/// ```
/// use dump_verifier::utils::validation::extension_of;
///
/// assert_eq!(extension_of("Game (USA) (Track 01).BIN"), "bin");
/// assert_eq!(extension_of("README"), "");
/// ```
#[must_use]
pub fn extension_of(name: &str) -> String {
    match name.rsplit_once('.') {
        Some((_, ext)) => ext.to_lowercase(),
        None => String::new(),
    }
}

/// Turn a catalog system name into a lowercase, dash-separated slug.
///
/// ```
/// use dump_verifier::utils::validation::slugify;
///
/// assert_eq!(slugify("Sony - PlayStation"), "sony-playstation");
/// assert_eq!(slugify("  Nintendo - Game Boy Advance (Multiboot) "), "nintendo-game-boy-advance-multiboot");
/// ```
#[must_use]
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;

    for c in name.chars() {
        if c.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.extend(c.to_lowercase());
        } else {
            pending_dash = true;
        }
    }

    slug
}

/// Security validation error types
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Filename too long: exceeds {MAX_FILENAME_LENGTH} characters")]
    FilenameTooLong,
    #[error("Invalid filename: contains path traversal or invalid characters")]
    InvalidFilename,
    #[error("Empty filename provided")]
    EmptyFilename,
}

/// Secure filename validation for files copied into the catalog directories
///
/// Validates and sanitizes filenames by:
/// - Checking length limits
/// - Preventing directory traversal (../, ..\\)
/// - Removing potentially dangerous characters
/// - Ensuring filename is not empty after sanitization
///
/// # Errors
///
/// Returns `ValidationError::EmptyFilename` if the filename is empty,
/// `ValidationError::FilenameTooLong` if it exceeds the limit, or
/// `ValidationError::InvalidFilename` if it contains invalid characters.
pub fn validate_filename(filename: &str) -> Result<String, ValidationError> {
    if filename.trim().is_empty() {
        return Err(ValidationError::EmptyFilename);
    }

    if filename.len() > MAX_FILENAME_LENGTH {
        return Err(ValidationError::FilenameTooLong);
    }

    // Prevent directory traversal attacks
    if filename.contains("..") || filename.contains('/') || filename.contains('\\') {
        return Err(ValidationError::InvalidFilename);
    }

    if filename.contains('\0') || filename.chars().any(|c| ('\x01'..='\x1F').contains(&c)) {
        return Err(ValidationError::InvalidFilename);
    }

    // Datfile names carry dates and regions in parentheses, keep those
    let sanitized = filename
        .chars()
        .filter(|c| {
            c.is_ascii_alphanumeric()
                || matches!(*c, '.' | '-' | '_' | ' ' | '(' | ')' | '[' | ']' | '+' | ',')
        })
        .collect::<String>();

    if sanitized.trim().is_empty() {
        return Err(ValidationError::InvalidFilename);
    }

    // No hidden files
    if sanitized.starts_with('.') {
        return Err(ValidationError::InvalidFilename);
    }

    Ok(sanitized)
}
