use std::path::PathBuf;

use crate::{HarvestStage, RunOutcome};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub metadata_url: String,
    pub chapter_url: String,
    pub output_dir: String,
    pub stage: HarvestStage,
    pub start_enabled: bool,
    pub pause_enabled: bool,
    pub paused: bool,
    pub pause_label: &'static str,
    /// Entries in the store, including the metadata entry.
    pub entries: usize,
    pub chapters: usize,
    pub last_title: Option<String>,
    pub last_outcome: Option<RunOutcome>,
    pub last_document: Option<PathBuf>,
    pub dirty: bool,
}
