//! Search keyword derivation.
//!
//! The catalog store only supports exact array-membership queries, so prefix
//! search is approximated by materializing every useful prefix of a product
//! name when the product is written.

use std::collections::BTreeSet;

/// Words must be longer than this to be searchable on their own.
const MIN_WORD_LEN: usize = 2;

/// Words must be longer than this to contribute prefixes.
const MIN_PREFIX_WORD_LEN: usize = 3;

/// Shortest prefix materialized.
const MIN_PREFIX_LEN: usize = 3;

/// Derive the keyword set for a product name.
///
/// The set holds the lower-cased full name, every word longer than two
/// characters, and every prefix of at least three characters of every word
/// longer than three characters. Lengths count Unicode scalar values, so
/// `"Cartão"` yields `car`, `cart`, `cartã` and `cartão`.
///
/// The result is sorted and free of duplicates, which makes the function
/// idempotent.
///
/// ```
/// use graphica_core::generate_keywords;
///
/// let keywords = generate_keywords("Cartão de Visita");
/// assert!(keywords.contains(&"cartão de visita".to_string()));
/// assert!(keywords.contains(&"vis".to_string()));
/// assert!(!keywords.contains(&"de".to_string()));
/// ```
#[must_use]
pub fn generate_keywords(name: &str) -> Vec<String> {
    let full = name.trim().to_lowercase();
    let mut keywords = BTreeSet::new();
    if full.is_empty() {
        return Vec::new();
    }

    for word in full.split_whitespace() {
        let chars: Vec<char> = word.chars().collect();
        if chars.len() > MIN_WORD_LEN {
            keywords.insert(word.to_owned());
        }
        if chars.len() > MIN_PREFIX_WORD_LEN {
            for end in MIN_PREFIX_LEN..=chars.len() {
                keywords.insert(chars.iter().take(end).collect::<String>());
            }
        }
    }
    keywords.insert(full);

    keywords.into_iter().collect()
}

/// Normalize a free-text query to the form stored in the keyword set.
///
/// Returns `None` for blank input.
#[must_use]
pub fn normalize_query(query: &str) -> Option<String> {
    let normalized = query.trim().to_lowercase();
    (!normalized.is_empty()).then_some(normalized)
}
