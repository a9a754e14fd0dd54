//! Tool result truncation.
//!
//! Fetched pages and search payloads can dwarf an LLM context window, so
//! oversized results are cut to a byte budget before being handed back.
//! Truncation is the only transformation applied to fetched content.

/// Default maximum result size in bytes (20 KB).
pub const DEFAULT_MAX_RESULT_BYTES: usize = 20_480;

/// Truncate `text` to at most `max_bytes`, appending a marker that names
/// how much was dropped. UTF-8 char boundaries are respected.
pub fn truncate_result(text: &str, max_bytes: usize) -> String {
    if text.len() <= max_bytes {
        return text.to_string();
    }
    let head = take_prefix_charsafe(text, max_bytes);
    let truncated = text.len() - head.len();
    format!("{head}\n...[truncated {truncated} bytes]...")
}

/// Trim `text` to at most `max_chars` characters, without splitting a char.
pub fn clip_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let clipped: String = text.chars().take(max_chars).collect();
    format!("{clipped}...")
}

fn take_prefix_charsafe(s: &str, max_bytes: usize) -> &str {
    let mut end = max_bytes.min(s.len());
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
