#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use harvest_engine::{
    ClientError, ClientErrorKind, EngineEvent, HarvestPhase, HarvestSettings, LogLine,
    PageClient, PageClientFactory, PauseGate, ProgressSink,
};

pub const BASE: &str = "https://stories.test/story";

pub fn url(path: &str) -> String {
    format!("{BASE}/{path}")
}

/// Harvest settings with no settling waits.
pub fn fast_settings() -> HarvestSettings {
    HarvestSettings {
        metadata_settle: Duration::ZERO,
        chapter_settle: Duration::ZERO,
        countdown: false,
        ..HarvestSettings::default()
    }
}

#[derive(Debug, Clone, Default)]
pub struct StubPage {
    texts: HashMap<String, String>,
    attrs: HashMap<String, HashMap<String, String>>,
}

impl StubPage {
    pub fn metadata(title: &str, description: &str) -> Self {
        Self::default()
            .text("#book_name", title)
            .text("#description", description)
    }

    pub fn chapter(title: &str, body: &str) -> Self {
        Self::default()
            .text("#chapter_title", title)
            .text("#chapter_content", body)
    }

    pub fn text(mut self, selector: &str, text: &str) -> Self {
        self.texts.insert(selector.to_string(), text.to_string());
        self
    }

    pub fn attr(mut self, selector: &str, name: &str, value: &str) -> Self {
        self.attrs
            .entry(selector.to_string())
            .or_default()
            .insert(name.to_string(), value.to_string());
        self
    }

    pub fn next(self, href: &str) -> Self {
        self.attr("#next-chap", "href", href)
            .attr("#next-chap", "class", "btn btn-primary")
    }

    pub fn next_disabled(self) -> Self {
        self.attr("#next-chap", "href", "#")
            .attr("#next-chap", "class", "btn btn-primary disabled")
    }
}

#[derive(Debug, Default)]
struct SiteLog {
    connects: usize,
    navigations: Vec<String>,
    releases: usize,
}

#[derive(Default)]
struct SiteConfig {
    pages: HashMap<String, StubPage>,
    fail_connect: bool,
    pause_on: HashSet<String>,
    panic_on: HashSet<String>,
    gate: Option<PauseGate>,
}

/// In-memory site standing in for a real page client. Records every
/// connect, navigation and release.
#[derive(Clone, Default)]
pub struct StubSite {
    config: Arc<Mutex<SiteConfig>>,
    log: Arc<Mutex<SiteLog>>,
}

impl StubSite {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(self, url: impl Into<String>, page: StubPage) -> Self {
        self.config.lock().unwrap().pages.insert(url.into(), page);
        self
    }

    pub fn fail_connect(self) -> Self {
        self.config.lock().unwrap().fail_connect = true;
        self
    }

    /// Closes `gate` right after `url` has loaded, as if the user paused
    /// while that page was being harvested.
    pub fn pause_on(self, url: impl Into<String>, gate: &PauseGate) -> Self {
        {
            let mut config = self.config.lock().unwrap();
            config.pause_on.insert(url.into());
            config.gate = Some(gate.clone());
        }
        self
    }

    pub fn panic_on(self, url: impl Into<String>) -> Self {
        self.config.lock().unwrap().panic_on.insert(url.into());
        self
    }

    pub fn factory(&self) -> Arc<dyn PageClientFactory> {
        Arc::new(self.clone())
    }

    pub fn connects(&self) -> usize {
        self.log.lock().unwrap().connects
    }

    pub fn navigations(&self) -> Vec<String> {
        self.log.lock().unwrap().navigations.clone()
    }

    pub fn releases(&self) -> usize {
        self.log.lock().unwrap().releases
    }
}

#[async_trait::async_trait]
impl PageClientFactory for StubSite {
    async fn connect(&self) -> Result<Box<dyn PageClient>, ClientError> {
        if self.config.lock().unwrap().fail_connect {
            return Err(ClientError::new(
                ClientErrorKind::WebDriver,
                "session not created",
            ));
        }
        self.log.lock().unwrap().connects += 1;
        Ok(Box::new(StubClient {
            site: self.clone(),
            current: None,
            released: false,
        }))
    }
}

struct StubClient {
    site: StubSite,
    current: Option<(String, StubPage)>,
    released: bool,
}

impl StubClient {
    fn page(&self) -> Result<&StubPage, ClientError> {
        self.current
            .as_ref()
            .map(|(_, page)| page)
            .ok_or_else(|| ClientError::new(ClientErrorKind::NoPageLoaded, ""))
    }
}

#[async_trait::async_trait]
impl PageClient for StubClient {
    async fn navigate(&mut self, url: &str) -> Result<(), ClientError> {
        if self.released {
            return Err(ClientError::new(ClientErrorKind::Released, ""));
        }
        self.site.log.lock().unwrap().navigations.push(url.to_string());
        self.current = None;

        let (page, gate, panics) = {
            let config = self.site.config.lock().unwrap();
            let gate = config
                .pause_on
                .contains(url)
                .then(|| config.gate.clone())
                .flatten();
            (
                config.pages.get(url).cloned(),
                gate,
                config.panic_on.contains(url),
            )
        };
        if panics {
            panic!("stub page {url} exploded");
        }
        let page = page.ok_or_else(|| ClientError::new(ClientErrorKind::HttpStatus(404), url))?;
        self.current = Some((url.to_string(), page));
        if let Some(gate) = gate {
            gate.set_paused(true);
        }
        Ok(())
    }

    async fn query_text(&mut self, selector: &str) -> Result<Option<String>, ClientError> {
        Ok(self.page()?.texts.get(selector).cloned())
    }

    async fn query_attribute(
        &mut self,
        selector: &str,
        attribute: &str,
    ) -> Result<Option<String>, ClientError> {
        Ok(self
            .page()?
            .attrs
            .get(selector)
            .and_then(|attrs| attrs.get(attribute))
            .cloned())
    }

    async fn exists(&mut self, selector: &str) -> Result<bool, ClientError> {
        let page = self.page()?;
        Ok(page.texts.contains_key(selector) || page.attrs.contains_key(selector))
    }

    fn current_url(&self) -> Option<&str> {
        self.current.as_ref().map(|(url, _)| url.as_str())
    }

    async fn release(&mut self) -> Result<(), ClientError> {
        if !self.released {
            self.released = true;
            self.site.log.lock().unwrap().releases += 1;
        }
        Ok(())
    }
}

/// Collects every event a run emits.
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<EngineEvent>>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn phases(&self) -> Vec<HarvestPhase> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter_map(|event| match event {
                EngineEvent::Phase(phase) => Some(*phase),
                _ => None,
            })
            .collect()
    }

    pub fn lines(&self) -> Vec<LogLine> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter_map(|event| match event {
                EngineEvent::Log(line) => Some(line.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn messages(&self) -> Vec<String> {
        self.lines().into_iter().map(|line| line.message).collect()
    }

    pub fn appended_titles(&self) -> Vec<String> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter_map(|event| match event {
                EngineEvent::EntryAppended { title, .. } => Some(title.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().unwrap().is_empty()
    }
}

impl ProgressSink for RecordingSink {
    fn emit(&self, event: EngineEvent) {
        self.events.lock().unwrap().push(event);
    }
}

/// Polls `condition` until it holds, failing the test after a few seconds.
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    for _ in 0..500 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached in time");
}

/// Blocking counterpart of [`wait_until`] for tests without a runtime.
pub fn wait_until_blocking(mut condition: impl FnMut() -> bool) {
    for _ in 0..500 {
        if condition() {
            return;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    panic!("condition not reached in time");
}

pub async fn with_timeout<T>(future: impl Future<Output = T>) -> T {
    tokio::time::timeout(Duration::from_secs(5), future)
        .await
        .expect("timed out")
}
