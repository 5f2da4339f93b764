//! Text sanitization for the PDF's single-byte text encoding. The built-in
//! fonts use WinAnsi, which matches Latin-1 except that U+0080..U+009F have
//! no glyphs.

/// Emitted for empty input.
pub const EMPTY_PLACEHOLDER: &str = "N/A";

/// Replaces any character the output encoding cannot represent.
pub const FALLBACK_CHAR: char = '?';

/// Highest code point representable in the output encoding.
const MAX_REPRESENTABLE: char = '\u{ff}';

/// C1 controls: inside the Latin-1 range but without a WinAnsi glyph.
const C1_CONTROLS: std::ops::RangeInclusive<char> = '\u{80}'..='\u{9f}';

const SUBSTITUTIONS: &[(&str, &str)] = &[
    ("\u{2014}", "--"),
    ("\u{2013}", "-"),
    ("\u{201c}", "\""),
    ("\u{201d}", "\""),
    ("\u{2018}", "'"),
    ("\u{2019}", "'"),
    ("\u{2026}", "..."),
    ("\u{a0}", " "),
    ("&nbsp;", " "),
    ("\r\n", "\n"),
    ("\r", "\n"),
];

/// Makes arbitrary harvested text safe for the output document.
///
/// Total: never fails, and the result only contains characters up to
/// U+00FF outside the C1 control range. Newlines survive (CRLF and CR become LF) so the renderer can lay
/// out paragraphs. Input that is empty, or empty after trimming, becomes
/// [`EMPTY_PLACEHOLDER`].
pub fn sanitize(text: &str) -> String {
    let mut out = text.to_string();
    for (from, to) in SUBSTITUTIONS {
        if out.contains(from) {
            out = out.replace(from, to);
        }
    }

    let out: String = out
        .chars()
        .map(|c| if is_representable(c) { c } else { FALLBACK_CHAR })
        .collect();

    let trimmed = out.trim();
    if trimmed.is_empty() {
        EMPTY_PLACEHOLDER.to_string()
    } else {
        trimmed.to_string()
    }
}

pub fn is_representable(c: char) -> bool {
    c <= MAX_REPRESENTABLE && !C1_CONTROLS.contains(&c)
}
