use url::Url;

/// Address of the next chapter page, or nothing once traversal is done.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraversalCursor {
    current: Option<String>,
}

impl TraversalCursor {
    pub fn new(first: impl Into<String>) -> Self {
        Self {
            current: Some(first.into()),
        }
    }

    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn advance(&mut self, next: String) {
        self.current = Some(next);
    }

    pub fn exhaust(&mut self) {
        self.current = None;
    }

    pub fn is_exhausted(&self) -> bool {
        self.current.is_none()
    }
}

/// Resolves a next-link `href` against the page it was found on.
/// Fragment-only and `javascript:` links resolve to nothing.
pub fn resolve_link(reference: &str, base: Option<&str>) -> Option<String> {
    let trimmed = reference.trim();
    if trimmed.is_empty() {
        return None;
    }
    let lower = trimmed.to_ascii_lowercase();
    if lower.starts_with('#') || lower.starts_with("javascript:") {
        return None;
    }
    if let Ok(url) = Url::parse(trimmed) {
        return Some(url.into());
    }
    base.and_then(|b| Url::parse(b).ok())
        .and_then(|b| b.join(trimmed).ok())
        .map(Into::into)
}
