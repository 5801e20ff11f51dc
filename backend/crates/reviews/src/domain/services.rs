//! Domain Services

use crate::domain::value_objects::Score;

/// Arithmetic mean of review scores, `None` for no reviews
pub fn mean_score(scores: impl IntoIterator<Item = Score>) -> Option<f64> {
    let (sum, count) = scores
        .into_iter()
        .fold((0u64, 0u64), |(sum, count), s| (sum + u64::from(s.get()), count + 1));
    (count > 0).then(|| sum as f64 / count as f64)
}
