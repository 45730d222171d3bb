//! Text helpers

/// Leading `max_chars` characters of `text`, cut on a char boundary.
///
/// Used to keep user content short in log lines.
pub fn preview(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
