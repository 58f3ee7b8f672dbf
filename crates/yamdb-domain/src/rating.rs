//! Title rating aggregation.
//!
//! Ratings are never stored. Storage reports `SUM(score)` and `COUNT(score)`
//! per title and [`ScoreTotals::rating`] finishes the computation, so single
//! and list reads cannot disagree.

/// Lowest accepted review score.
pub const MIN_SCORE: i32 = 1;

/// Highest accepted review score.
pub const MAX_SCORE: i32 = 10;

/// Running totals of the review scores of one title.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScoreTotals {
    pub sum: i64,
    pub count: i64,
}

impl ScoreTotals {
    pub fn new(sum: i64, count: i64) -> Self {
        Self { sum, count }
    }

    /// Mean score rounded to the nearest integer, halves rounding up.
    ///
    /// `None` when the title has no reviews.
    pub fn rating(self) -> Option<i32> {
        if self.count <= 0 {
            return None;
        }
        let rounded = (2 * self.sum + self.count).div_euclid(2 * self.count);
        i32::try_from(rounded).ok()
    }
}

/// Scores outside `MIN_SCORE..=MAX_SCORE` are rejected on every write path.
pub fn is_valid_score(score: i32) -> bool {
    (MIN_SCORE..=MAX_SCORE).contains(&score)
}
