use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};
use std::time::Duration;

use futures_util::StreamExt;
use harvest_logging::{harvest_debug, harvest_warn};
use reqwest::header::CONTENT_TYPE;
use scraper::{Html, Selector};

use crate::client::{ClientError, ClientErrorKind, PageClient, PageClientFactory};
use crate::decode::decode_page;
use crate::text::element_text;

#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub connect_timeout: Duration,
    /// Whole-request limit. `None` waits for a slow page indefinitely.
    pub request_timeout: Option<Duration>,
    pub redirect_limit: usize,
    pub max_bytes: u64,
    pub allowed_content_types: Vec<String>,
    pub user_agent: String,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: None,
            redirect_limit: 5,
            max_bytes: 5 * 1024 * 1024,
            allowed_content_types: vec![
                "text/html".to_string(),
                "application/xhtml+xml".to_string(),
            ],
            user_agent: concat!("story-harvest/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Creates one [`ReqwestPageClient`] per harvest run.
#[derive(Debug, Clone, Default)]
pub struct ReqwestClientFactory {
    settings: FetchSettings,
}

impl ReqwestClientFactory {
    pub fn new(settings: FetchSettings) -> Self {
        Self { settings }
    }
}

#[async_trait::async_trait]
impl PageClientFactory for ReqwestClientFactory {
    async fn connect(&self) -> Result<Box<dyn PageClient>, ClientError> {
        Ok(Box::new(ReqwestPageClient::new(self.settings.clone())?))
    }
}

struct LoadedPage {
    final_url: String,
    html: String,
}

/// Page client for statically rendered sites: plain GET, then CSS selector
/// queries against the parsed response.
pub struct ReqwestPageClient {
    settings: FetchSettings,
    client: Option<reqwest::Client>,
    page: Option<LoadedPage>,
    redirect_counter: Arc<AtomicUsize>,
}

impl ReqwestPageClient {
    pub fn new(settings: FetchSettings) -> Result<Self, ClientError> {
        let redirect_counter = Arc::new(AtomicUsize::new(0));
        let client = build_client(&settings, redirect_counter.clone())?;
        Ok(Self {
            settings,
            client: Some(client),
            page: None,
            redirect_counter,
        })
    }

    fn is_content_type_allowed(&self, content_type: &str) -> bool {
        let ct = content_type.split(';').next().unwrap_or(content_type).trim();
        self.settings
            .allowed_content_types
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(ct))
    }

    fn loaded_html(&self) -> Result<&str, ClientError> {
        if self.client.is_none() {
            return Err(ClientError::new(ClientErrorKind::Released, ""));
        }
        self.page
            .as_ref()
            .map(|page| page.html.as_str())
            .ok_or_else(|| ClientError::new(ClientErrorKind::NoPageLoaded, ""))
    }

    async fn download(&self, url: &str) -> Result<LoadedPage, ClientError> {
        let client = self
            .client
            .as_ref()
            .ok_or_else(|| ClientError::new(ClientErrorKind::Released, ""))?;
        let parsed = reqwest::Url::parse(url)
            .map_err(|err| ClientError::new(ClientErrorKind::InvalidUrl, err.to_string()))?;
        self.redirect_counter.store(0, Ordering::Relaxed);

        let mut request = client.get(parsed);
        if let Some(timeout) = self.settings.request_timeout {
            request = request.timeout(timeout);
        }
        let response = request.send().await.map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::new(
                ClientErrorKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }

        if let Some(content_len) = response.content_length() {
            if content_len > self.settings.max_bytes {
                return Err(ClientError::new(
                    ClientErrorKind::TooLarge {
                        max_bytes: self.settings.max_bytes,
                        actual: Some(content_len),
                    },
                    "response too large",
                ));
            }
        }

        let final_url = response.url().to_string();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());

        if let Some(ct) = content_type.as_deref() {
            if !self.is_content_type_allowed(ct) {
                return Err(ClientError::new(
                    ClientErrorKind::UnsupportedContentType {
                        content_type: ct.to_string(),
                    },
                    "unsupported content type",
                ));
            }
        }

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = bytes.len() as u64 + chunk.len() as u64;
            if next_len > self.settings.max_bytes {
                return Err(ClientError::new(
                    ClientErrorKind::TooLarge {
                        max_bytes: self.settings.max_bytes,
                        actual: Some(next_len),
                    },
                    "response too large",
                ));
            }
            bytes.extend_from_slice(&chunk);
        }

        let decoded = decode_page(&bytes, content_type.as_deref());
        if decoded.had_errors {
            harvest_warn!(
                "Page {} had malformed {} sequences; decoded lossily",
                final_url,
                decoded.encoding_label
            );
        }
        harvest_debug!(
            "Loaded {} ({} bytes, {}, {} redirects)",
            final_url,
            bytes.len(),
            decoded.encoding_label,
            self.redirect_counter.load(Ordering::Relaxed)
        );

        Ok(LoadedPage {
            final_url,
            html: decoded.html,
        })
    }
}

#[async_trait::async_trait]
impl PageClient for ReqwestPageClient {
    async fn navigate(&mut self, url: &str) -> Result<(), ClientError> {
        // A failed navigation leaves no page loaded, like a browser error page.
        self.page = None;
        self.page = Some(self.download(url).await?);
        Ok(())
    }

    async fn query_text(&mut self, selector: &str) -> Result<Option<String>, ClientError> {
        let html = self.loaded_html()?;
        select_text(html, selector)
    }

    async fn query_attribute(
        &mut self,
        selector: &str,
        attribute: &str,
    ) -> Result<Option<String>, ClientError> {
        let html = self.loaded_html()?;
        select_attribute(html, selector, attribute)
    }

    async fn exists(&mut self, selector: &str) -> Result<bool, ClientError> {
        let html = self.loaded_html()?;
        select_exists(html, selector)
    }

    fn current_url(&self) -> Option<&str> {
        self.page.as_ref().map(|page| page.final_url.as_str())
    }

    async fn release(&mut self) -> Result<(), ClientError> {
        self.page = None;
        self.client = None;
        Ok(())
    }
}

fn build_client(
    settings: &FetchSettings,
    redirect_counter: Arc<AtomicUsize>,
) -> Result<reqwest::Client, ClientError> {
    let redirect_limit = settings.redirect_limit;
    let policy = reqwest::redirect::Policy::custom(move |attempt| {
        let count = attempt.previous().len();
        redirect_counter.store(count, Ordering::Relaxed);
        if count >= redirect_limit {
            attempt.error("redirect limit exceeded")
        } else {
            attempt.follow()
        }
    });

    reqwest::Client::builder()
        .connect_timeout(settings.connect_timeout)
        .user_agent(settings.user_agent.clone())
        .redirect(policy)
        .build()
        .map_err(|err| ClientError::new(ClientErrorKind::Network, err.to_string()))
}

fn parse_selector(selector: &str) -> Result<Selector, ClientError> {
    Selector::parse(selector)
        .map_err(|err| ClientError::new(ClientErrorKind::InvalidSelector, format!("{selector}: {err}")))
}

// `Html` is not `Send`, so parsing stays inside these synchronous helpers and
// never lives across an await point.
fn select_text(html: &str, selector: &str) -> Result<Option<String>, ClientError> {
    let sel = parse_selector(selector)?;
    let doc = Html::parse_document(html);
    let text = doc.select(&sel).next().map(element_text);
    Ok(text)
}

fn select_exists(html: &str, selector: &str) -> Result<bool, ClientError> {
    let sel = parse_selector(selector)?;
    let doc = Html::parse_document(html);
    let found = doc.select(&sel).next().is_some();
    Ok(found)
}

fn select_attribute(
    html: &str,
    selector: &str,
    attribute: &str,
) -> Result<Option<String>, ClientError> {
    let sel = parse_selector(selector)?;
    let doc = Html::parse_document(html);
    let value = doc
        .select(&sel)
        .next()
        .and_then(|element| element.value().attr(attribute))
        .map(str::to_string);
    Ok(value)
}

fn map_reqwest_error(err: reqwest::Error) -> ClientError {
    if err.is_timeout() {
        return ClientError::new(ClientErrorKind::Timeout, err.to_string());
    }
    if err.is_redirect() {
        return ClientError::new(ClientErrorKind::RedirectLimitExceeded, err.to_string());
    }
    ClientError::new(ClientErrorKind::Network, err.to_string())
}
