pub const DEFAULT_PREVIEW_CHARS: usize = 200;

/// First `max_chars` characters of a chapter body, for progress logging.
pub fn body_preview(body: &str, max_chars: usize) -> &str {
    match body.char_indices().nth(max_chars) {
        Some((end, _)) => &body[..end],
        None => body,
    }
}

#[cfg(test)]
mod tests {
    use super::{body_preview, DEFAULT_PREVIEW_CHARS};

    #[test]
    fn short_body_kept_as_is() {
        assert_eq!(body_preview("short body", DEFAULT_PREVIEW_CHARS), "short body");
    }

    #[test]
    fn long_body_is_cut_at_char_count() {
        let body = "a".repeat(DEFAULT_PREVIEW_CHARS + 50);
        assert_eq!(body_preview(&body, DEFAULT_PREVIEW_CHARS).len(), DEFAULT_PREVIEW_CHARS);
    }

    #[test]
    fn multibyte_characters_are_not_split() {
        let body = "\u{e9}".repeat(10);
        let preview = body_preview(&body, 4);
        assert_eq!(preview.chars().count(), 4);
        assert_eq!(preview, "\u{e9}\u{e9}\u{e9}\u{e9}");
    }
}
