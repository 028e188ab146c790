//! String hashing.

/// Polynomial hash `h = 31 * h + byte` over the UTF-8 bytes of `s`.
///
/// Arithmetic wraps on overflow and the result is made non-negative
/// (`i64::MIN` stays as is).
///
/// ```
/// assert_eq!(baseutils::hash::string_hash("abc"), 96354);
/// ```
pub fn string_hash(s: &str) -> i64 {
    s.bytes()
        .fold(0i64, |h, byte| h.wrapping_mul(31).wrapping_add(i64::from(byte)))
        .wrapping_abs()
}
