//! Random numbers.

use rand::Rng;

/// Uniform random integer in `[min, max)`. Returns `max` when the range is
/// empty. Zero bounds are ordinary values, not special-cased.
pub fn range_rand(min: i64, max: i64) -> i64 {
    if min >= max {
        return max;
    }
    rand::rng().random_range(min..max)
}
