//! URL slug type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// A URL-safe slug derived from a title.
///
/// Slugs are computed once, when a content item is first saved, and are
/// never recomputed on later edits: renaming a product or article keeps its
/// original slug.
///
/// ## Examples
///
/// ```
/// use oakwood_core::Slug;
///
/// assert_eq!(Slug::from_title("Wooden Chair").as_str(), "wooden-chair");
/// assert_eq!(Slug::from_title("  Solid -- Oak!  ").as_str(), "solid-oak");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Slug(String);

impl Slug {
    /// Derive a slug from a title.
    ///
    /// Lowercases, keeps ASCII alphanumerics, and collapses every other run
    /// of characters into a single hyphen. Deterministic: the same title
    /// always yields the same slug.
    #[must_use]
    pub fn from_title(title: &str) -> Self {
        let mut slug = String::with_capacity(title.len());
        let mut pending_separator = false;

        for c in title.chars() {
            if c.is_ascii_alphanumeric() {
                if pending_separator && !slug.is_empty() {
                    slug.push('-');
                }
                pending_separator = false;
                slug.push(c.to_ascii_lowercase());
            } else {
                pending_separator = true;
            }
        }

        Self(slug)
    }

    /// Wrap an already-derived slug (e.g. read back from the database).
    #[must_use]
    pub fn from_stored(s: String) -> Self {
        Self(s)
    }

    /// Returns the slug as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `Slug` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Slug {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// SQLx support (with postgres feature)
#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Slug {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Slug {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self(s))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Slug {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_title() {
        assert_eq!(Slug::from_title("Wooden Chair").as_str(), "wooden-chair");
    }

    #[test]
    fn test_punctuation_collapses() {
        assert_eq!(
            Slug::from_title("Oak, Ash & Elm: a guide").as_str(),
            "oak-ash-elm-a-guide"
        );
    }

    #[test]
    fn test_leading_trailing_noise() {
        assert_eq!(Slug::from_title("  --Hello!--  ").as_str(), "hello");
    }

    #[test]
    fn test_deterministic() {
        assert_eq!(
            Slug::from_title("Garden Bench 2024"),
            Slug::from_title("Garden Bench 2024")
        );
    }

    #[test]
    fn test_non_ascii_dropped() {
        assert_eq!(Slug::from_title("café table").as_str(), "caf-table");
    }

    #[test]
    fn test_empty_title() {
        assert_eq!(Slug::from_title("").as_str(), "");
        assert_eq!(Slug::from_title("!!!").as_str(), "");
    }
}
