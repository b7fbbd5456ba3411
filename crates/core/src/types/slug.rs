//! Human-readable keys used as record identifiers.
//!
//! Categories are addressed by a lowercase-kebab slug that doubles as their
//! URL segment (`business-cards`). Homepage sections use a lowercase key with
//! underscores (`best_sellers`).

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors produced when parsing a [`CategorySlug`] or [`SectionKey`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SlugError {
    #[error("identifier cannot be empty")]
    Empty,
    #[error("identifier must be at most {max} characters")]
    TooLong { max: usize },
    #[error("invalid character {0:?}; use lowercase letters, digits and '{1}'")]
    InvalidChar(char, char),
    #[error("identifier cannot start or end with '{0}', or repeat it")]
    MisplacedSeparator(char),
}

const MAX_LENGTH: usize = 64;

fn validate(s: &str, separator: char) -> Result<(), SlugError> {
    if s.is_empty() {
        return Err(SlugError::Empty);
    }
    if s.len() > MAX_LENGTH {
        return Err(SlugError::TooLong { max: MAX_LENGTH });
    }
    if let Some(c) = s
        .chars()
        .find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || *c == separator))
    {
        return Err(SlugError::InvalidChar(c, separator));
    }
    if s.starts_with(separator) || s.ends_with(separator) || s.split(separator).any(str::is_empty)
    {
        return Err(SlugError::MisplacedSeparator(separator));
    }
    Ok(())
}

macro_rules! define_key {
    ($(#[$meta:meta])* $name:ident, $separator:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Separator allowed between words.
            pub const SEPARATOR: char = $separator;

            /// Parse and validate a key.
            ///
            /// # Errors
            ///
            /// Returns [`SlugError`] if the input is empty, too long, contains
            /// anything other than lowercase ASCII letters, digits and the
            /// separator, or has a leading, trailing or doubled separator.
            pub fn parse(s: &str) -> Result<Self, SlugError> {
                validate(s, Self::SEPARATOR)?;
                Ok(Self(s.to_owned()))
            }

            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl TryFrom<String> for $name {
            type Error = SlugError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                validate(&value, Self::SEPARATOR)?;
                Ok(Self(value))
            }
        }

        impl From<$name> for String {
            fn from(key: $name) -> Self {
                key.0
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::Type<::sqlx::Postgres> for $name {
            fn type_info() -> ::sqlx::postgres::PgTypeInfo {
                <String as ::sqlx::Type<::sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &::sqlx::postgres::PgTypeInfo) -> bool {
                <String as ::sqlx::Type<::sqlx::Postgres>>::compatible(ty)
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::postgres::PgHasArrayType for $name {
            fn array_type_info() -> ::sqlx::postgres::PgTypeInfo {
                <String as ::sqlx::postgres::PgHasArrayType>::array_type_info()
            }
        }

        #[cfg(feature = "postgres")]
        impl<'r> ::sqlx::Decode<'r, ::sqlx::Postgres> for $name {
            fn decode(
                value: ::sqlx::postgres::PgValueRef<'r>,
            ) -> ::core::result::Result<Self, ::sqlx::error::BoxDynError> {
                let raw = <String as ::sqlx::Decode<::sqlx::Postgres>>::decode(value)?;
                Ok(Self::try_from(raw)?)
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::Encode<'_, ::sqlx::Postgres> for $name {
            fn encode_by_ref(
                &self,
                buf: &mut ::sqlx::postgres::PgArgumentBuffer,
            ) -> ::std::result::Result<::sqlx::encode::IsNull, ::sqlx::error::BoxDynError> {
                <String as ::sqlx::Encode<::sqlx::Postgres>>::encode_by_ref(&self.0, buf)
            }
        }
    };
}

define_key!(
    /// Category identifier and URL slug, lowercase-kebab (`business-cards`).
    CategorySlug,
    '-'
);

define_key!(
    /// Homepage section identifier, lowercase with underscores (`best_sellers`).
    SectionKey,
    '_'
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_kebab_slugs() {
        assert!(CategorySlug::parse("business-cards").is_ok());
        assert!(CategorySlug::parse("a4").is_ok());
    }

    #[test]
    fn rejects_bad_slugs() {
        assert_eq!(CategorySlug::parse(""), Err(SlugError::Empty));
        assert_eq!(
            CategorySlug::parse("Business"),
            Err(SlugError::InvalidChar('B', '-'))
        );
        assert_eq!(
            CategorySlug::parse("-cards"),
            Err(SlugError::MisplacedSeparator('-'))
        );
        assert_eq!(
            CategorySlug::parse("flyers--a5"),
            Err(SlugError::MisplacedSeparator('-'))
        );
    }

    #[test]
    fn section_keys_use_underscores() {
        assert!(SectionKey::parse("best_sellers").is_ok());
        assert_eq!(
            SectionKey::parse("best-sellers"),
            Err(SlugError::InvalidChar('-', '_'))
        );
    }

    #[test]
    fn deserialization_validates() {
        let ok: Result<SectionKey, _> = serde_json::from_str("\"new_arrivals\"");
        assert!(ok.is_ok());
        let bad: Result<SectionKey, _> = serde_json::from_str("\"New Arrivals\"");
        assert!(bad.is_err());
    }
}
