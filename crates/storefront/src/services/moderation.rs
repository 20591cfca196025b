//! Forbidden-word validation for submitted content.
//!
//! Catalog products and blog articles pass through the same check before
//! persistence. The denylist is handed in at construction (see
//! `SiteConfig::forbidden_words`), never read from ambient state.

use std::fmt;

use thiserror::Error;

/// Which submitted field failed moderation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentField {
    /// Product name or article title.
    Title,
    /// Product description or article body.
    Description,
}

impl fmt::Display for ContentField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Title => write!(f, "title"),
            Self::Description => write!(f, "description"),
        }
    }
}

/// A field-scoped moderation rejection.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{field} must not contain the forbidden word \"{word}\"")]
pub struct ModerationError {
    /// The field that failed.
    pub field: ContentField,
    /// The denylisted word that matched.
    pub word: String,
}

/// Denylist-based content validator.
///
/// Pure and deterministic: the same inputs always produce the same verdict,
/// and validation has no side effects.
#[derive(Debug, Clone)]
pub struct ContentPolicy {
    /// Lowercase forbidden words.
    forbidden_words: Vec<String>,
}

impl ContentPolicy {
    /// Build a policy from a denylist.
    ///
    /// Words are lowercased once here so every later check is a plain
    /// substring match.
    #[must_use]
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            forbidden_words: words
                .into_iter()
                .map(|w| w.as_ref().to_lowercase())
                .filter(|w| !w.is_empty())
                .collect(),
        }
    }

    /// Validate a title/description pair.
    ///
    /// Both fields are checked independently, title first, and the error
    /// names the field that failed together with the matched word.
    /// Matching is case-insensitive substring containment.
    ///
    /// # Errors
    ///
    /// Returns `ModerationError` for the first forbidden word found.
    pub fn validate(&self, title: &str, description: &str) -> Result<(), ModerationError> {
        self.check_field(ContentField::Title, title)?;
        self.check_field(ContentField::Description, description)?;
        Ok(())
    }

    fn check_field(&self, field: ContentField, value: &str) -> Result<(), ModerationError> {
        let lower = value.to_lowercase();
        for word in &self.forbidden_words {
            if lower.contains(word.as_str()) {
                return Err(ModerationError {
                    field,
                    word: word.clone(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> ContentPolicy {
        ContentPolicy::new([
            "casino",
            "cryptocurrency",
            "crypto",
            "exchange",
            "cheap",
            "free",
            "scam",
            "police",
            "radar",
        ])
    }

    #[test]
    fn test_clean_content_passes() {
        assert!(policy().validate("Wooden chair", "Solid oak chair").is_ok());
    }

    #[test]
    fn test_forbidden_word_in_title() {
        let err = policy()
            .validate("Cheap casino tickets", "Great value")
            .unwrap_err();
        assert_eq!(err.field, ContentField::Title);
        assert_eq!(err.word, "cheap");
    }

    #[test]
    fn test_forbidden_word_in_description() {
        let err = policy()
            .validate("Garden bench", "Pay with cryptocurrency")
            .unwrap_err();
        assert_eq!(err.field, ContentField::Description);
        assert_eq!(err.word, "cryptocurrency");
    }

    #[test]
    fn test_match_is_case_insensitive() {
        let err = policy().validate("RADAR detector", "").unwrap_err();
        assert_eq!(err.field, ContentField::Title);
        assert_eq!(err.word, "radar");
    }

    #[test]
    fn test_match_is_substring() {
        // Containment, not word-boundary matching: "freestanding" is rejected.
        let err = policy().validate("Freestanding lamp", "").unwrap_err();
        assert_eq!(err.word, "free");
    }

    #[test]
    fn test_deterministic() {
        let p = policy();
        assert_eq!(
            p.validate("Cheap casino tickets", "x"),
            p.validate("Cheap casino tickets", "x")
        );
    }

    #[test]
    fn test_uppercase_denylist_entries_are_normalized() {
        let p = ContentPolicy::new(["CASINO"]);
        assert!(p.validate("casino night", "").is_err());
    }
}
