//! Model identifier normalization.
//!
//! BioModels identifiers are fixed-width: `BIOMD` followed by a 10-digit,
//! zero-padded number. Users type `12`, `BIOMD12` or `biomd0000000012`; all
//! of them map to `BIOMD0000000012`, which is the cache key in every tier.

use crate::{CacheError, Result};

/// Prefix of curated BioModels identifiers.
pub const PREFIX: &str = "BIOMD";

/// Width of the numeric part of a canonical identifier.
pub const DIGITS: usize = 10;

/// Canonicalize a user-supplied identifier.
///
/// Every non-digit character is dropped and the remaining digits are
/// zero-padded to [`DIGITS`]. Inputs without any digit are rejected.
pub fn normalize(input: &str) -> Result<String> {
    let digits: String = input.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return Err(CacheError::InvalidQuery(format!(
            "model identifier '{input}' contains no digits"
        )));
    }
    Ok(format!("{PREFIX}{digits:0>width$}", width = DIGITS))
}

/// Whether `id` is already in canonical form.
pub fn is_canonical(id: &str) -> bool {
    id.strip_prefix(PREFIX)
        .is_some_and(|n| n.len() == DIGITS && n.bytes().all(|b| b.is_ascii_digit()))
}
