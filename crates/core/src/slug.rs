//! URL slug helpers.
//!
//! [`slugify`] folds text to lower-case ASCII words joined by hyphens.
//! Titles written entirely in non-Latin scripts fold to an empty string, so
//! callers that need a non-empty unique slug use [`slug_or_random`].

use unicode_normalization::UnicodeNormalization;
use uuid::Uuid;

/// Convert `value` to a slug: NFKD-fold to ASCII, lower-case, drop anything
/// that is not alphanumeric, underscore, hyphen or whitespace, collapse runs
/// of whitespace and hyphens into a single hyphen, and trim leading and
/// trailing hyphens and underscores.
pub fn slugify(value: &str) -> String {
    let folded: String = value
        .nfkd()
        .filter(char::is_ascii)
        .collect::<String>()
        .to_ascii_lowercase();

    let mut slug = String::with_capacity(folded.len());
    let mut pending_separator = false;
    for ch in folded.chars() {
        if ch.is_ascii_alphanumeric() || ch == '_' {
            if pending_separator && !slug.is_empty() {
                slug.push('-');
            }
            pending_separator = false;
            slug.push(ch);
        } else if ch == '-' || ch.is_ascii_whitespace() {
            pending_separator = true;
        }
    }

    slug.trim_matches(|c| c == '-' || c == '_').to_string()
}

/// A fresh random slug. Used as the identifier of works created through
/// `create_or_get`, where titles are not unique.
pub fn new_work_slug() -> String {
    Uuid::new_v4().to_string()
}

/// [`slugify`] `value`, or a random slug when it folds to nothing.
pub fn slug_or_random(value: &str) -> String {
    let slug = slugify(value);
    if slug.is_empty() {
        Uuid::new_v4().to_string()
    } else {
        slug
    }
}

/// Append a short random suffix to disambiguate a slug that is already taken.
pub fn with_random_suffix(slug: &str) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{slug}-{}", &suffix[..8])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_basic_title() {
        assert_eq!(slugify("Hamlet: The Return"), "hamlet-the-return");
    }

    #[test]
    fn slugify_collapses_separators() {
        assert_eq!(slugify("  a -- b   c "), "a-b-c");
    }

    #[test]
    fn slugify_strips_accents() {
        assert_eq!(slugify("Théâtre Élysée"), "theatre-elysee");
    }

    #[test]
    fn slugify_non_latin_is_empty() {
        assert_eq!(slugify("劇団四季"), "");
    }

    #[test]
    fn slugify_keeps_underscores_inside() {
        assert_eq!(slugify("_stage_left_"), "stage_left");
    }

    #[test]
    fn slug_or_random_falls_back_to_uuid() {
        let slug = slug_or_random("星取");
        assert_eq!(slug.len(), 36);
        assert!(Uuid::parse_str(&slug).is_ok());
        assert_eq!(slug_or_random("Shiki"), "shiki");
    }

    #[test]
    fn new_work_slugs_are_distinct() {
        assert_ne!(new_work_slug(), new_work_slug());
    }

    #[test]
    fn random_suffix_extends_slug() {
        let slug = with_random_suffix("globe");
        assert!(slug.starts_with("globe-"));
        assert_eq!(slug.len(), "globe-".len() + 8);
    }
}
