pub fn truncate_utf8_prefix(value: &str, max_bytes: usize) -> String {
    if max_bytes == 0 {
        return String::new();
    }
    if value.len() <= max_bytes {
        return value.to_string();
    }
    let mut end = max_bytes;
    while end > 0 && !value.is_char_boundary(end) {
        end -= 1;
    }
    value[..end].to_string()
}

/// Renders a response body for a log line: lossy UTF-8, cut at `max_bytes`
/// with a marker noting how much was dropped.
pub fn body_preview(body: &[u8], max_bytes: usize) -> String {
    let text = String::from_utf8_lossy(body);
    if text.len() <= max_bytes {
        return text.into_owned();
    }
    let mut preview = truncate_utf8_prefix(&text, max_bytes);
    preview.push_str(&format!("... ({} bytes total)", body.len()));
    preview
}
