//! Random name generation for stored files and share tokens.
//!
//! Both draw from UUID v4 (122 bits of OS-provided randomness), which is a
//! large enough namespace that no uniqueness check against the store is
//! performed, so concurrent operations get collision-free names for free.

use std::path::Path;
use uuid::Uuid;

/// Generate a server-assigned stored filename: 32 random hex characters
/// plus the original file's extension (if any).
///
/// The stored name is deliberately unrelated to the client-supplied name so
/// uploads can never collide with or overwrite each other on disk.
pub fn generate_stored_name(original_filename: &str) -> String {
    let random = Uuid::new_v4().simple().to_string();
    match Path::new(original_filename)
        .extension()
        .and_then(|e| e.to_str())
    {
        Some(ext) => format!("{random}.{ext}"),
        None => random,
    }
}

/// Generate an opaque share token (32 hex characters).
pub fn generate_share_token() -> String {
    Uuid::new_v4().simple().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stored_name_keeps_extension() {
        let name = generate_stored_name("holiday.mp4");
        assert!(name.ends_with(".mp4"));
        assert_eq!(name.len(), 32 + 4);
    }

    #[test]
    fn test_stored_name_without_extension() {
        let name = generate_stored_name("rawfile");
        assert_eq!(name.len(), 32);
        assert!(name.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_stored_names_are_unique() {
        let a = generate_stored_name("a.mp4");
        let b = generate_stored_name("a.mp4");
        assert_ne!(a, b);
    }

    #[test]
    fn test_share_token_shape() {
        let token = generate_share_token();
        assert_eq!(token.len(), 32);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(token, generate_share_token());
    }
}
