use std::path::PathBuf;

use crate::HarvestStage;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User edited the story metadata URL.
    MetadataUrlChanged(String),
    /// User edited the first chapter URL.
    ChapterUrlChanged(String),
    /// User picked an output directory.
    OutputDirChanged(String),
    StartClicked,
    PauseToggled,
    RenderClicked,
    /// Engine moved to another phase.
    StageChanged(HarvestStage),
    /// Engine appended an entry to the store.
    EntryHarvested { index: usize, title: String },
    /// Engine run ended, successfully or not.
    HarvestFinished(RunOutcome),
    /// Engine refused a start because a run is active.
    StartRejected,
    RenderFinished(RenderOutcome),
    /// UI/render tick to coalesce rendering.
    Tick,
    /// Fallback for placeholder wiring.
    NoOp,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Completed { chapters: usize, summary: String },
    Failed { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderOutcome {
    Written(PathBuf),
    /// Nothing has been harvested yet.
    Empty,
    Failed(String),
}
