/// Used when a title consists only of forbidden characters and whitespace.
pub const FALLBACK_BASE_NAME: &str = "story";

/// File stem for a story: forbidden characters stripped, trimmed, and spaces
/// replaced with hyphens. Applying it to its own output changes nothing.
pub fn story_base_name(title: &str) -> String {
    let stripped: String = title.chars().filter(|c| !is_forbidden(*c)).collect();
    let name = stripped.trim().replace(' ', "-");
    if name.is_empty() {
        FALLBACK_BASE_NAME.to_string()
    } else {
        name
    }
}

fn is_forbidden(c: char) -> bool {
    matches!(c, '\\' | '/' | '*' | '?' | ':' | '"' | '<' | '>' | '|')
}
