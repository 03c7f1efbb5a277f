//! Helpers for keeping logged and stored text bounded.

/// Truncate to at most `max` characters, appending `...` when cut.
///
/// # Examples
///
/// ```
/// use reelforge_core::truncate_chars;
///
/// assert_eq!(truncate_chars("abcdef", 3), "abc...");
/// assert_eq!(truncate_chars("abc", 3), "abc");
/// ```
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

/// Shorten an image URL for log output.
///
/// Data URIs keep only their first 50 characters; other URLs their first 100.
///
/// # Examples
///
/// ```
/// use reelforge_core::truncate_url_for_log;
///
/// let data = format!("data:image/png;base64,{}", "A".repeat(500));
/// assert!(truncate_url_for_log(&data).ends_with("...[base64 data]"));
/// assert_eq!(truncate_url_for_log("https://cdn/x.png"), "https://cdn/x.png");
/// ```
pub fn truncate_url_for_log(url: &str) -> String {
    if url.starts_with("data:") {
        let head: String = url.chars().take(50).collect();
        return format!("{head}...[base64 data]");
    }
    truncate_chars(url, 100)
}
