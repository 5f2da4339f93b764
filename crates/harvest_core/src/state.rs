use std::path::PathBuf;

use crate::view_model::AppViewModel;
use crate::RunOutcome;

/// Output directory used until the user picks one.
pub const DEFAULT_OUTPUT_DIR: &str = ".";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HarvestStage {
    #[default]
    Idle,
    FetchingMetadata,
    TraversingChapters,
    Paused,
    Completed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    metadata_url: String,
    chapter_url: String,
    output_dir: String,
    stage: HarvestStage,
    running: bool,
    paused: bool,
    entries: usize,
    last_title: Option<String>,
    last_outcome: Option<RunOutcome>,
    last_document: Option<PathBuf>,
    dirty: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            metadata_url: String::new(),
            chapter_url: String::new(),
            output_dir: DEFAULT_OUTPUT_DIR.to_string(),
            stage: HarvestStage::Idle,
            running: false,
            paused: false,
            entries: 0,
            last_title: None,
            last_outcome: None,
            last_document: None,
            dirty: false,
        }
    }
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> AppViewModel {
        AppViewModel {
            metadata_url: self.metadata_url.clone(),
            chapter_url: self.chapter_url.clone(),
            output_dir: self.output_dir.clone(),
            stage: self.stage,
            start_enabled: !self.running,
            pause_enabled: self.running,
            paused: self.paused,
            pause_label: if self.paused { "Resume" } else { "Pause" },
            entries: self.entries,
            chapters: self.entries.saturating_sub(1),
            last_title: self.last_title.clone(),
            last_outcome: self.last_outcome.clone(),
            last_document: self.last_document.clone(),
            dirty: self.dirty,
        }
    }

    /// Returns whether anything changed since the last call, and resets the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub(crate) fn metadata_url(&self) -> &str {
        &self.metadata_url
    }

    pub(crate) fn chapter_url(&self) -> &str {
        &self.chapter_url
    }

    pub(crate) fn output_dir(&self) -> &str {
        &self.output_dir
    }

    pub(crate) fn entries(&self) -> usize {
        self.entries
    }

    pub(crate) fn set_metadata_url(&mut self, url: String) {
        self.metadata_url = url;
        self.mark_dirty();
    }

    pub(crate) fn set_chapter_url(&mut self, url: String) {
        self.chapter_url = url;
        self.mark_dirty();
    }

    pub(crate) fn set_output_dir(&mut self, dir: String) {
        self.output_dir = dir;
        self.mark_dirty();
    }

    pub(crate) fn begin_run(&mut self) {
        self.running = true;
        self.paused = false;
        self.entries = 0;
        self.last_title = None;
        self.last_outcome = None;
        self.stage = HarvestStage::FetchingMetadata;
        self.mark_dirty();
    }

    pub(crate) fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
        self.mark_dirty();
    }

    pub(crate) fn set_stage(&mut self, stage: HarvestStage) {
        if self.stage != stage {
            self.stage = stage;
            self.mark_dirty();
        }
    }

    pub(crate) fn record_entry(&mut self, index: usize, title: String) {
        self.entries = self.entries.max(index + 1);
        self.last_title = Some(title);
        self.mark_dirty();
    }

    pub(crate) fn finish_run(&mut self, outcome: RunOutcome) {
        self.running = false;
        self.paused = false;
        self.stage = match outcome {
            RunOutcome::Completed { .. } => HarvestStage::Completed,
            RunOutcome::Failed { .. } => HarvestStage::Failed,
        };
        self.last_outcome = Some(outcome);
        self.mark_dirty();
    }

    pub(crate) fn set_last_document(&mut self, path: PathBuf) {
        self.last_document = Some(path);
        self.mark_dirty();
    }

    fn mark_dirty(&mut self) {
        self.dirty = true;
    }
}
