//! Custom field validators shared by the DTOs.

use std::borrow::Cow;

use hoshidori_core::rating::{is_valid_rating, MAX_RATING, MIN_RATING};
use validator::{ValidateUrl, ValidationError};

/// Accept an empty string or a well-formed URL.
pub fn blank_or_url(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() || value.validate_url() {
        Ok(())
    } else {
        Err(ValidationError::new("url").with_message(Cow::Borrowed("Enter a valid URL.")))
    }
}

/// Reject strings that are empty after trimming.
pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::new("blank")
            .with_message(Cow::Borrowed("This field may not be blank.")))
    } else {
        Ok(())
    }
}

/// Accept an empty string or a well-formed e-mail address.
pub fn blank_or_email(value: &str) -> Result<(), ValidationError> {
    use validator::ValidateEmail;

    if value.trim().is_empty() || value.validate_email() {
        Ok(())
    } else {
        Err(ValidationError::new("email")
            .with_message(Cow::Borrowed("Enter a valid email address.")))
    }
}

/// Accept a star rating within the inclusive rating bounds.
pub fn rating_in_range<T: std::borrow::Borrow<f64>>(value: T) -> Result<(), ValidationError> {
    if is_valid_rating(*value.borrow()) {
        Ok(())
    } else {
        Err(ValidationError::new("range").with_message(Cow::Owned(format!(
            "Rating must be between {MIN_RATING:.1} and {MAX_RATING:.1}."
        ))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_or_url_accepts_blank_and_urls() {
        assert!(blank_or_url("").is_ok());
        assert!(blank_or_url("   ").is_ok());
        assert!(blank_or_url("https://example.com/troupe").is_ok());
        assert!(blank_or_url("not a url").is_err());
    }

    #[test]
    fn not_blank_rejects_whitespace() {
        assert!(not_blank("Hamlet").is_ok());
        assert!(not_blank("  ").is_err());
    }

    #[test]
    fn blank_or_email_accepts_blank() {
        assert!(blank_or_email("").is_ok());
        assert!(blank_or_email("fan@example.com").is_ok());
        assert!(blank_or_email("fan-at-example").is_err());
    }

    #[test]
    fn rating_in_range_uses_inclusive_bounds() {
        assert!(rating_in_range(&1.0).is_ok());
        assert!(rating_in_range(&5.0).is_ok());
        let err = rating_in_range(&5.5).unwrap_err();
        assert_eq!(err.code, "range");
        assert_eq!(
            err.message.as_deref(),
            Some("Rating must be between 1.0 and 5.0.")
        );
        assert!(rating_in_range(&f64::NAN).is_err());
    }
}
