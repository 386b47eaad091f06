//! Range options for collection iteration
//!
//! ## Bounds
//!
//! | Direction  | Covered keys          |
//! |------------|-----------------------|
//! | ascending  | `start <= k < end`    |
//! | descending | `start < k <= end`    |
//!
//! A descending scan starts at `end` and walks down, so `end` is the first
//! key it can yield and `start` is where it stops. For keys `a b c d`:
//!
//! - `start=b, end=c` → `[b]`
//! - `start=b, end=c, reverse` → `[c]`
//! - `end=b, reverse` → `[b, a]`
//!
//! `limit` caps the number of results after the direction is applied.

/// Range options for `keys`/`values`/`entries`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Range<K> {
    /// Lower bound (inclusive ascending, exclusive descending)
    pub start: Option<K>,
    /// Upper bound (exclusive ascending, inclusive descending)
    pub end: Option<K>,
    /// Iterate from the highest key down
    pub reverse: bool,
    /// Maximum number of results
    pub limit: Option<usize>,
}

impl<K> Default for Range<K> {
    fn default() -> Self {
        Self {
            start: None,
            end: None,
            reverse: false,
            limit: None,
        }
    }
}

impl<K> Range<K> {
    /// Unbounded ascending range
    pub fn all() -> Self {
        Self::default()
    }

    /// Set the lower bound
    pub fn start(mut self, key: impl Into<K>) -> Self {
        self.start = Some(key.into());
        self
    }

    /// Set the upper bound
    pub fn end(mut self, key: impl Into<K>) -> Self {
        self.end = Some(key.into());
        self
    }

    /// Iterate in descending order
    pub fn reverse(mut self) -> Self {
        self.reverse = true;
        self
    }

    /// Cap the number of results
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}
