use std::sync::Arc;
use std::time::Duration;

use crate::client::PageClientFactory;
use crate::fetch::{FetchSettings, ReqwestClientFactory};
use crate::preview::DEFAULT_PREVIEW_CHARS;
use crate::render::OutputLayout;
use crate::webdriver::{WebDriverClientFactory, WebDriverSettings};

/// CSS selectors locating the story fields on the source site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorySelectors {
    pub story_title: String,
    pub story_description: String,
    pub chapter_title: String,
    pub chapter_body: String,
    pub next_link: String,
    /// Class token that marks the next-chapter control as disabled.
    pub disabled_class: String,
}

impl Default for StorySelectors {
    fn default() -> Self {
        Self {
            story_title: "#book_name".to_string(),
            story_description: "#description".to_string(),
            chapter_title: "#chapter_title".to_string(),
            chapter_body: "#chapter_content".to_string(),
            next_link: "#next-chap".to_string(),
            disabled_class: "disabled".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct HarvestSettings {
    pub selectors: StorySelectors,
    /// Wait after loading the metadata page before querying it.
    pub metadata_settle: Duration,
    /// Wait after loading each chapter page before querying it.
    pub chapter_settle: Duration,
    /// Show the metadata wait as a per-second countdown.
    pub countdown: bool,
    pub preview_chars: usize,
    pub untitled_placeholder: String,
    pub no_description_placeholder: String,
}

impl Default for HarvestSettings {
    fn default() -> Self {
        Self {
            selectors: StorySelectors::default(),
            metadata_settle: Duration::from_secs(30),
            chapter_settle: Duration::from_secs(5),
            countdown: true,
            preview_chars: DEFAULT_PREVIEW_CHARS,
            untitled_placeholder: "Untitled Story".to_string(),
            no_description_placeholder: "No description.".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum ClientBackend {
    Http(FetchSettings),
    WebDriver(WebDriverSettings),
}

impl Default for ClientBackend {
    fn default() -> Self {
        ClientBackend::Http(FetchSettings::default())
    }
}

impl ClientBackend {
    pub fn factory(&self) -> Arc<dyn PageClientFactory> {
        match self {
            ClientBackend::Http(settings) => Arc::new(ReqwestClientFactory::new(settings.clone())),
            ClientBackend::WebDriver(settings) => {
                Arc::new(WebDriverClientFactory::new(settings.clone()))
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    pub harvest: HarvestSettings,
    pub backend: ClientBackend,
    pub output_layout: OutputLayout,
}
