use fantoccini::elements::Element;
use fantoccini::error::CmdError;
use fantoccini::{Client, ClientBuilder, Locator};
use harvest_logging::{harvest_debug, harvest_info};

use crate::client::{ClientError, ClientErrorKind, PageClient, PageClientFactory};

#[derive(Debug, Clone)]
pub struct WebDriverSettings {
    /// Address of a running WebDriver server, e.g. chromedriver.
    pub webdriver_url: String,
    pub headless: bool,
}

impl Default for WebDriverSettings {
    fn default() -> Self {
        Self {
            webdriver_url: "http://localhost:4444".to_string(),
            headless: false,
        }
    }
}

/// Opens a fresh browser session per harvest run.
#[derive(Debug, Clone, Default)]
pub struct WebDriverClientFactory {
    settings: WebDriverSettings,
}

impl WebDriverClientFactory {
    pub fn new(settings: WebDriverSettings) -> Self {
        Self { settings }
    }

    fn capabilities(&self) -> serde_json::Map<String, serde_json::Value> {
        let mut caps = serde_json::Map::new();
        if self.settings.headless {
            caps.insert(
                "goog:chromeOptions".to_string(),
                serde_json::json!({ "args": ["--headless=new", "--disable-gpu"] }),
            );
            caps.insert(
                "moz:firefoxOptions".to_string(),
                serde_json::json!({ "args": ["-headless"] }),
            );
        }
        caps
    }
}

#[async_trait::async_trait]
impl PageClientFactory for WebDriverClientFactory {
    async fn connect(&self) -> Result<Box<dyn PageClient>, ClientError> {
        let mut builder = ClientBuilder::native();
        builder.capabilities(self.capabilities());
        let client = builder
            .connect(&self.settings.webdriver_url)
            .await
            .map_err(|err| {
                ClientError::new(
                    ClientErrorKind::WebDriver,
                    format!("connect to {}: {err}", self.settings.webdriver_url),
                )
            })?;
        harvest_info!("WebDriver session opened at {}", self.settings.webdriver_url);
        Ok(Box::new(WebDriverPageClient {
            client: Some(client),
            current_url: None,
        }))
    }
}

/// Page client backed by a real browser, for pages that render their content
/// with scripts after load.
pub struct WebDriverPageClient {
    client: Option<Client>,
    current_url: Option<String>,
}

impl WebDriverPageClient {
    fn session(&self) -> Result<&Client, ClientError> {
        self.client
            .as_ref()
            .ok_or_else(|| ClientError::new(ClientErrorKind::Released, ""))
    }

    async fn find(&self, selector: &str) -> Result<Option<Element>, ClientError> {
        match self.session()?.find(Locator::Css(selector)).await {
            Ok(element) => Ok(Some(element)),
            Err(err) if err.is_no_such_element() => Ok(None),
            Err(err) => Err(map_cmd_error(err)),
        }
    }
}

#[async_trait::async_trait]
impl PageClient for WebDriverPageClient {
    async fn navigate(&mut self, url: &str) -> Result<(), ClientError> {
        let session = self.session()?;
        session.goto(url).await.map_err(map_cmd_error)?;
        let landed = session
            .current_url()
            .await
            .map(|u| u.to_string())
            .unwrap_or_else(|_| url.to_string());
        harvest_debug!("WebDriver navigated to {}", landed);
        self.current_url = Some(landed);
        Ok(())
    }

    async fn query_text(&mut self, selector: &str) -> Result<Option<String>, ClientError> {
        match self.find(selector).await? {
            Some(element) => element.text().await.map(Some).map_err(map_cmd_error),
            None => Ok(None),
        }
    }

    async fn query_attribute(
        &mut self,
        selector: &str,
        attribute: &str,
    ) -> Result<Option<String>, ClientError> {
        match self.find(selector).await? {
            Some(element) => element.attr(attribute).await.map_err(map_cmd_error),
            None => Ok(None),
        }
    }

    async fn exists(&mut self, selector: &str) -> Result<bool, ClientError> {
        Ok(self.find(selector).await?.is_some())
    }

    fn current_url(&self) -> Option<&str> {
        self.current_url.as_deref()
    }

    async fn release(&mut self) -> Result<(), ClientError> {
        self.current_url = None;
        match self.client.take() {
            Some(client) => client.close().await.map_err(map_cmd_error),
            None => Ok(()),
        }
    }
}

fn map_cmd_error(err: CmdError) -> ClientError {
    ClientError::new(ClientErrorKind::WebDriver, err.to_string())
}
