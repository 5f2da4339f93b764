//! Story harvest engine: page clients, the chapter traversal loop, the pause
//! gate, the entry store and PDF rendering.
mod client;
mod cursor;
mod decode;
mod engine;
mod fetch;
mod filename;
mod gate;
mod harvest;
mod persist;
mod preview;
pub mod render;
mod sanitize;
mod settings;
mod sink;
mod store;
mod text;
mod types;
mod webdriver;

pub use client::{ClientError, ClientErrorKind, PageClient, PageClientFactory};
pub use cursor::{resolve_link, TraversalCursor};
pub use decode::{decode_page, DecodedPage};
pub use engine::EngineHandle;
pub use fetch::{FetchSettings, ReqwestClientFactory, ReqwestPageClient};
pub use filename::{story_base_name, FALLBACK_BASE_NAME};
pub use gate::PauseGate;
pub use harvest::HarvestController;
pub use persist::{ensure_output_dir, AtomicFileWriter, PersistError};
pub use preview::{body_preview, DEFAULT_PREVIEW_CHARS};
pub use render::{render_document, OutputLayout, RenderError};
pub use sanitize::{sanitize, EMPTY_PLACEHOLDER, FALLBACK_CHAR};
pub use settings::{ClientBackend, EngineConfig, HarvestSettings, StorySelectors};
pub use sink::{ChannelProgressSink, NullProgressSink, ProgressSink};
pub use store::{Entry, StoryStore};
pub use text::element_text;
pub use types::{
    EngineEvent, HarvestError, HarvestPhase, HarvestReport, LogLine, LogStyle, RunId, Termination,
};
pub use webdriver::{WebDriverClientFactory, WebDriverPageClient, WebDriverSettings};
