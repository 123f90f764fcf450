//! Small string helpers for log lines and reports

use std::time::Duration;

/// Truncate a string to at most `max_chars` characters (not bytes).
///
/// Respects UTF-8 boundaries, so it never panics on multi-byte input.
///
/// # Examples
/// ```
/// # use collection_indexer::utils::string_utils::safe_truncate_chars;
/// assert_eq!(safe_truncate_chars("Hello, World!", 5), "Hello");
/// assert_eq!(safe_truncate_chars("Hi", 100), "Hi");
/// ```
#[inline]
pub fn safe_truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        None => s,
        Some((byte_idx, _)) => &s[..byte_idx],
    }
}

/// Render a duration as `HH:MM:SS`; hours are not wrapped at 24
#[must_use]
pub fn format_hms(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncation_respects_char_boundaries() {
        assert_eq!(safe_truncate_chars("héllo", 2), "hé");
        assert_eq!(safe_truncate_chars("🎉🎊🎈", 2), "🎉🎊");
        assert_eq!(safe_truncate_chars("", 3), "");
    }

    #[test]
    fn hms_formatting() {
        assert_eq!(format_hms(Duration::from_secs(0)), "00:00:00");
        assert_eq!(format_hms(Duration::from_millis(61_999)), "00:01:01");
        assert_eq!(format_hms(Duration::from_secs(3 * 3600 + 25 * 60 + 7)), "03:25:07");
        assert_eq!(format_hms(Duration::from_secs(100 * 3600)), "100:00:00");
    }
}
