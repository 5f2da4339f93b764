//! Optional RON configuration for the terminal front end.
//!
//! Every field has a default, so a file only needs the values it changes:
//!
//! ```ron
//! (
//!     output_dir: Some("books"),
//!     harvest: (metadata_settle_secs: 10),
//!     backend: WebDriver(url: "http://localhost:9515", headless: true),
//! )
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use harvest_engine::{
    ClientBackend, EngineConfig, FetchSettings, HarvestSettings, OutputLayout, StorySelectors,
    WebDriverSettings,
};
use log::LevelFilter;
use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_CONFIG_FILE: &str = "story_harvest.ron";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {}: {}", .0.display(), .1)]
    Read(PathBuf, #[source] io::Error),
    #[error("cannot parse {}: {}", .0.display(), .1)]
    Parse(PathBuf, #[source] ron::error::SpannedError),
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub output_dir: Option<PathBuf>,
    pub log: LogConfig,
    pub harvest: HarvestConfig,
    pub backend: BackendConfig,
    pub layout: LayoutConfig,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
pub enum LogTarget {
    #[default]
    File,
    Terminal,
    Both,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct LogConfig {
    pub target: LogTarget,
    pub level: LogLevel,
    pub file: PathBuf,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            target: LogTarget::File,
            level: LogLevel::Info,
            file: PathBuf::from("story_harvest.log"),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct HarvestConfig {
    pub metadata_settle_secs: u64,
    pub chapter_settle_secs: u64,
    pub countdown: bool,
    pub preview_chars: usize,
    pub selectors: SelectorConfig,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        let defaults = HarvestSettings::default();
        Self {
            metadata_settle_secs: defaults.metadata_settle.as_secs(),
            chapter_settle_secs: defaults.chapter_settle.as_secs(),
            countdown: defaults.countdown,
            preview_chars: defaults.preview_chars,
            selectors: SelectorConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct SelectorConfig {
    pub story_title: String,
    pub story_description: String,
    pub chapter_title: String,
    pub chapter_body: String,
    pub next_link: String,
    pub disabled_class: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        let StorySelectors {
            story_title,
            story_description,
            chapter_title,
            chapter_body,
            next_link,
            disabled_class,
        } = StorySelectors::default();
        Self {
            story_title,
            story_description,
            chapter_title,
            chapter_body,
            next_link,
            disabled_class,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub enum BackendConfig {
    Http {
        #[serde(default)]
        request_timeout_secs: Option<u64>,
        #[serde(default)]
        user_agent: Option<String>,
    },
    WebDriver {
        url: String,
        #[serde(default)]
        headless: bool,
    },
}

impl Default for BackendConfig {
    fn default() -> Self {
        BackendConfig::Http {
            request_timeout_secs: None,
            user_agent: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
pub enum LayoutConfig {
    #[default]
    StoryFolder,
    Flat,
}

impl AppConfig {
    pub fn engine_config(&self) -> EngineConfig {
        let selectors = &self.harvest.selectors;
        let harvest = HarvestSettings {
            selectors: StorySelectors {
                story_title: selectors.story_title.clone(),
                story_description: selectors.story_description.clone(),
                chapter_title: selectors.chapter_title.clone(),
                chapter_body: selectors.chapter_body.clone(),
                next_link: selectors.next_link.clone(),
                disabled_class: selectors.disabled_class.clone(),
            },
            metadata_settle: Duration::from_secs(self.harvest.metadata_settle_secs),
            chapter_settle: Duration::from_secs(self.harvest.chapter_settle_secs),
            countdown: self.harvest.countdown,
            preview_chars: self.harvest.preview_chars,
            ..HarvestSettings::default()
        };

        let backend = match &self.backend {
            BackendConfig::Http {
                request_timeout_secs,
                user_agent,
            } => {
                let defaults = FetchSettings::default();
                ClientBackend::Http(FetchSettings {
                    request_timeout: request_timeout_secs.map(Duration::from_secs),
                    user_agent: user_agent.clone().unwrap_or(defaults.user_agent.clone()),
                    ..defaults
                })
            }
            BackendConfig::WebDriver { url, headless } => {
                ClientBackend::WebDriver(WebDriverSettings {
                    webdriver_url: url.clone(),
                    headless: *headless,
                })
            }
        };

        let output_layout = match self.layout {
            LayoutConfig::StoryFolder => OutputLayout::StoryFolder,
            LayoutConfig::Flat => OutputLayout::Flat,
        };

        EngineConfig {
            harvest,
            backend,
            output_layout,
        }
    }
}

/// Reads the configuration at `path`. A missing file is `Ok(None)`.
pub fn load_config(path: &Path) -> Result<Option<AppConfig>, ConfigError> {
    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(ConfigError::Read(path.to_path_buf(), err)),
    };
    ron::from_str(&content)
        .map(Some)
        .map_err(|err| ConfigError::Parse(path.to_path_buf(), err))
}
