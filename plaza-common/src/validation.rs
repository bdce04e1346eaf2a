//! Checks that run before any remote call is made.

use crate::model::user::{BIO_MAX_LEN, Bio, DISPLAY_NAME_MAX_LEN, DisplayName};
use thiserror::Error;

pub const PASSWORD_MIN_LEN: usize = 8;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Error)]
pub enum ValidationError {
    #[error("Please fill in all fields")]
    MissingFields,
    #[error("Password must be at least {PASSWORD_MIN_LEN} characters")]
    PasswordTooShort,
    #[error("Passwords do not match")]
    PasswordMismatch,
    #[error("Please enter a valid email address")]
    InvalidEmail,
    #[error("Name cannot be empty")]
    EmptyName,
    #[error("Name must be at most {DISPLAY_NAME_MAX_LEN} characters")]
    NameTooLong,
    #[error("Bio must be at most {BIO_MAX_LEN} characters")]
    BioTooLong,
    #[error("Please write something")]
    EmptyContent,
}

/// Trimmed, non-empty text of a post or comment.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash)]
pub struct Content(String);

impl Content {
    pub fn new(text: &str) -> Result<Self, ValidationError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            Err(ValidationError::EmptyContent)
        } else {
            Ok(Self(trimmed.to_owned()))
        }
    }

    #[must_use]
    pub fn get(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

/// Accepts `local@domain.tld` where no part contains whitespace or a second `@`.
#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    let well_formed = |part: &str| {
        !part.is_empty() && !part.contains(|c: char| c.is_whitespace() || c == '@')
    };
    if !well_formed(local) || !well_formed(domain) {
        return false;
    }

    domain
        .char_indices()
        .any(|(index, c)| c == '.' && index > 0 && index + 1 < domain.len())
}

/// Trims `name` and checks it is present and short enough to be stored.
pub fn display_name(name: &str) -> Result<DisplayName, ValidationError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::EmptyName);
    }

    DisplayName::new(name.to_owned()).map_err(|_| ValidationError::NameTooLong)
}

pub fn bio(text: &str) -> Result<Bio, ValidationError> {
    Bio::new(text.trim().to_owned()).map_err(|_| ValidationError::BioTooLong)
}

pub fn validate_login(email: &str, password: &str) -> Result<(), ValidationError> {
    if email.is_empty() || password.is_empty() {
        return Err(ValidationError::MissingFields);
    }

    Ok(())
}

pub fn validate_signup(
    name: &str,
    email: &str,
    password: &str,
    confirm_password: &str,
) -> Result<(), ValidationError> {
    if [name, email, password, confirm_password]
        .iter()
        .any(|field| field.is_empty())
    {
        return Err(ValidationError::MissingFields);
    }

    if password.chars().count() < PASSWORD_MIN_LEN {
        return Err(ValidationError::PasswordTooShort);
    }

    if password != confirm_password {
        return Err(ValidationError::PasswordMismatch);
    }

    if !is_valid_email(email) {
        return Err(ValidationError::InvalidEmail);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::validation::{
        Content, ValidationError, bio, display_name, is_valid_email, validate_login,
        validate_signup,
    };

    #[test]
    fn password_length_boundary() {
        assert_eq!(
            validate_signup("Ada", "ada@example.com", "1234567", "1234567"),
            Err(ValidationError::PasswordTooShort)
        );
        assert_eq!(
            validate_signup("Ada", "ada@example.com", "12345678", "12345678"),
            Ok(())
        );
    }

    #[test]
    fn confirmation_must_match() {
        assert_eq!(
            validate_signup("Ada", "ada@example.com", "correct horse", "correct house"),
            Err(ValidationError::PasswordMismatch)
        );
    }

    #[test]
    fn checks_run_in_form_order() {
        assert_eq!(
            validate_signup("", "not an email", "short", "other"),
            Err(ValidationError::MissingFields)
        );
        assert_eq!(
            validate_signup("Ada", "not an email", "short", "other"),
            Err(ValidationError::PasswordTooShort)
        );
        assert_eq!(
            validate_signup("Ada", "not an email", "long enough", "long enough"),
            Err(ValidationError::InvalidEmail)
        );
        assert_eq!(validate_login("", "secret"), Err(ValidationError::MissingFields));
    }

    #[test]
    fn email_shapes() {
        for valid in ["a@b.co", "first.last@mail.example.org", "x+tag@host.io"] {
            assert!(is_valid_email(valid), "{valid}");
        }
        let invalid_emails = [
            "", "plain", "@b.co", "a@", "a@b", "a@.co", "a@b.", "a b@c.de", "a@b@c.de",
        ];
        for invalid in invalid_emails {
            assert!(!is_valid_email(invalid), "{invalid}");
        }
    }

    #[test]
    fn content_is_trimmed() {
        assert_eq!(Content::new("  Hello world \n").unwrap().get(), "Hello world");
        assert_eq!(Content::new(" \t "), Err(ValidationError::EmptyContent));
    }

    #[test]
    fn profile_fields() {
        assert_eq!(display_name("  Ada ").unwrap().get(), "Ada");
        assert_eq!(display_name("   "), Err(ValidationError::EmptyName));
        assert_eq!(
            display_name(&"x".repeat(129)),
            Err(ValidationError::NameTooLong)
        );

        assert!(bio(&"b".repeat(500)).is_ok());
        assert_eq!(bio(&"b".repeat(501)), Err(ValidationError::BioTooLong));
        assert!(bio("").unwrap().is_empty());
    }
}
