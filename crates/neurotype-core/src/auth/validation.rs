use std::path::Path;

use thiserror::Error;

/// Minimum password length accepted at registration
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// File extensions accepted for a profile photo, with their MIME types
const IMAGE_TYPES: [(&str, &str); 7] = [
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("gif", "image/gif"),
    ("webp", "image/webp"),
    ("bmp", "image/bmp"),
    ("svg", "image/svg+xml"),
];

/// Form errors caught before any request is sent
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please enter a valid email address.")]
    InvalidEmail,

    #[error("Password cannot be empty.")]
    EmptyPassword,

    #[error("Password must be at least 8 characters long.")]
    PasswordTooShort,

    #[error("Passwords do not match.")]
    PasswordMismatch,

    #[error("Only image files are allowed.")]
    NotAnImage,
}

/// Loose email shape check: something@something.something with no whitespace
/// in any of the three parts.
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    let valid = email.split_whitespace().any(|word| {
        word.char_indices().any(|(at, c)| {
            c == '@' && at > 0 && {
                let domain = &word[at + 1..];
                domain
                    .char_indices()
                    .any(|(dot, d)| d == '.' && dot > 0 && dot + 1 < domain.len())
            }
        })
    });
    if valid {
        Ok(())
    } else {
        Err(ValidationError::InvalidEmail)
    }
}

/// Check a registration password and its confirmation.
/// Returns every problem found so the form can show them together.
pub fn validate_registration(
    email: &str,
    password: &str,
    confirm: &str,
) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    if let Err(e) = validate_email(email) {
        errors.push(e);
    }
    if password.trim().is_empty() {
        errors.push(ValidationError::EmptyPassword);
    } else if password.chars().count() < MIN_PASSWORD_LENGTH {
        errors.push(ValidationError::PasswordTooShort);
    }
    if password != confirm {
        errors.push(ValidationError::PasswordMismatch);
    }
    errors
}

/// MIME type for a profile photo, or `NotAnImage` if the extension is not an image
pub fn image_mime_type(path: &Path) -> Result<&'static str, ValidationError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .ok_or(ValidationError::NotAnImage)?;
    IMAGE_TYPES
        .iter()
        .find(|(known, _)| *known == ext)
        .map(|(_, mime)| *mime)
        .ok_or(ValidationError::NotAnImage)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email() {
        assert!(validate_email("ada@example.com").is_ok());
        assert!(validate_email("a@b.co").is_ok());
        assert!(validate_email("  ada@example.com ").is_ok());
        assert_eq!(validate_email(""), Err(ValidationError::InvalidEmail));
        assert_eq!(validate_email("ada"), Err(ValidationError::InvalidEmail));
        assert_eq!(validate_email("ada@example"), Err(ValidationError::InvalidEmail));
        assert_eq!(validate_email("@example.com"), Err(ValidationError::InvalidEmail));
        assert_eq!(validate_email("ada@.com"), Err(ValidationError::InvalidEmail));
        assert_eq!(validate_email("ada@example."), Err(ValidationError::InvalidEmail));
    }

    #[test]
    fn test_validate_registration_ok() {
        assert!(validate_registration("a@b.co", "longenough", "longenough").is_empty());
    }

    #[test]
    fn test_validate_registration_collects_all() {
        let errors = validate_registration("nope", "short", "different");
        assert_eq!(
            errors,
            vec![
                ValidationError::InvalidEmail,
                ValidationError::PasswordTooShort,
                ValidationError::PasswordMismatch,
            ]
        );

        let errors = validate_registration("a@b.co", "   ", "   ");
        assert_eq!(errors, vec![ValidationError::EmptyPassword]);
    }

    #[test]
    fn test_image_mime_type() {
        assert_eq!(image_mime_type(Path::new("me.PNG")), Ok("image/png"));
        assert_eq!(image_mime_type(Path::new("/tmp/me.jpeg")), Ok("image/jpeg"));
        assert_eq!(image_mime_type(Path::new("notes.csv")), Err(ValidationError::NotAnImage));
        assert_eq!(image_mime_type(Path::new("noext")), Err(ValidationError::NotAnImage));
    }
}
