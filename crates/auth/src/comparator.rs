//! Timing-safe token comparison

use tokenauth_common::secure_compare;

/// Compares a presented token against the one stored on a record.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenComparator;

impl TokenComparator {
    /// Returns true only when both tokens are present, non-empty and equal.
    ///
    /// An unset stored token never authenticates anything, so two absent
    /// (or two empty) tokens do not match.
    pub fn compare(&self, stored: Option<&str>, presented: Option<&str>) -> bool {
        match (stored, presented) {
            (Some(stored), Some(presented)) if !stored.is_empty() && !presented.is_empty() => {
                secure_compare(stored.as_bytes(), presented.as_bytes())
            }
            _ => false,
        }
    }
}
