use std::fmt;

/// A loaded-page session the harvest controller drives.
///
/// Lookups return `Ok(None)` when the selector matches nothing; that is a
/// routine outcome, not an error. `Err` is reserved for a broken session,
/// an invalid selector, or a failed navigation.
#[async_trait::async_trait]
pub trait PageClient: Send {
    async fn navigate(&mut self, url: &str) -> Result<(), ClientError>;

    async fn query_text(&mut self, selector: &str) -> Result<Option<String>, ClientError>;

    async fn query_attribute(
        &mut self,
        selector: &str,
        attribute: &str,
    ) -> Result<Option<String>, ClientError>;

    async fn exists(&mut self, selector: &str) -> Result<bool, ClientError> {
        Ok(self.query_text(selector).await?.is_some())
    }

    /// URL of the currently loaded page, after redirects.
    fn current_url(&self) -> Option<&str>;

    /// Releases the underlying session. Safe to call more than once.
    async fn release(&mut self) -> Result<(), ClientError>;
}

#[async_trait::async_trait]
pub trait PageClientFactory: Send + Sync {
    async fn connect(&self) -> Result<Box<dyn PageClient>, ClientError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientError {
    pub kind: ClientErrorKind,
    pub message: String,
}

impl ClientError {
    pub fn new(kind: ClientErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            write!(f, "{}", self.kind)
        } else {
            write!(f, "{}: {}", self.kind, self.message)
        }
    }
}

impl std::error::Error for ClientError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientErrorKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    RedirectLimitExceeded,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    UnsupportedContentType { content_type: String },
    InvalidSelector,
    NoPageLoaded,
    Released,
    WebDriver,
    Network,
}

impl fmt::Display for ClientErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientErrorKind::InvalidUrl => write!(f, "invalid url"),
            ClientErrorKind::HttpStatus(code) => write!(f, "http status {code}"),
            ClientErrorKind::Timeout => write!(f, "timeout"),
            ClientErrorKind::RedirectLimitExceeded => write!(f, "redirect limit exceeded"),
            ClientErrorKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            ClientErrorKind::UnsupportedContentType { content_type } => {
                write!(f, "unsupported content type {content_type}")
            }
            ClientErrorKind::InvalidSelector => write!(f, "invalid selector"),
            ClientErrorKind::NoPageLoaded => write!(f, "no page loaded"),
            ClientErrorKind::Released => write!(f, "client already released"),
            ClientErrorKind::WebDriver => write!(f, "webdriver error"),
            ClientErrorKind::Network => write!(f, "network error"),
        }
    }
}
