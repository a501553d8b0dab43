//! Small pure text helpers.

/// Keep at most `max` characters of `raw`, appending `suffix` only when
/// something was cut.
///
/// Counts `char`s, not bytes, so multi-byte text (Japanese source material is
/// the common case) is never split inside a scalar value. The suffix does not
/// count toward `max`.
#[must_use]
pub fn truncate_chars(raw: &str, max: usize, suffix: &str) -> String {
    match raw.char_indices().nth(max) {
        None => raw.to_string(),
        Some((cut, _)) => {
            let mut out = String::with_capacity(cut + suffix.len());
            out.push_str(&raw[..cut]);
            out.push_str(suffix);
            out
        }
    }
}

/// Truncate a string to a maximum length, adding `...` if needed.
///
/// - Trims surrounding whitespace before truncating.
/// - Enforces a minimum `max` of 3 so the ellipsis fits.
/// - The ellipsis counts toward `max`.
#[must_use]
pub fn truncate_with_ellipsis(raw: &str, max: usize) -> String {
    let max = max.max(3);
    let trimmed = raw.trim();
    if trimmed.chars().count() <= max {
        return trimmed.to_string();
    }
    truncate_chars(trimmed, max - 3, "...")
}
