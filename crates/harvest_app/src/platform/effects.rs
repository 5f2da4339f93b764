use std::io::Write;

use harvest_core::{Effect, HarvestStage, Msg, RenderOutcome, RunOutcome};
use harvest_engine::{EngineEvent, EngineHandle, HarvestPhase, RenderError};
use harvest_logging::{harvest_info, harvest_warn};

use super::console::Console;

/// Executes core effects against the engine and turns engine events back
/// into core messages.
pub struct EffectRunner {
    engine: EngineHandle,
}

impl EffectRunner {
    pub fn new(engine: EngineHandle) -> Self {
        Self { engine }
    }

    /// Runs one effect. Effects that complete synchronously report back with
    /// a follow-up message.
    pub fn run<W: Write>(&self, effect: Effect, console: &mut Console<W>) -> Option<Msg> {
        match effect {
            Effect::StartHarvest {
                metadata_url,
                chapter_url,
            } => {
                harvest_info!(
                    "StartHarvest metadata={} chapter={}",
                    metadata_url,
                    chapter_url
                );
                self.engine.start_harvest(metadata_url, chapter_url);
                None
            }
            Effect::SetPaused(paused) => {
                self.engine.set_paused(paused);
                None
            }
            Effect::RenderDocument { output_dir } => {
                harvest_info!("RenderDocument dir={}", output_dir.display());
                let outcome = match self.engine.render(&output_dir) {
                    Ok(path) => RenderOutcome::Written(path),
                    Err(RenderError::EmptyInput) => RenderOutcome::Empty,
                    Err(err) => {
                        harvest_warn!("Render failed: {}", err);
                        RenderOutcome::Failed(err.to_string())
                    }
                };
                Some(Msg::RenderFinished(outcome))
            }
            Effect::Notify(notification) => {
                console.notify(&notification);
                None
            }
            Effect::AppendLog(line) => {
                console.plain(&line);
                None
            }
            Effect::AppendHeader(line) => {
                console.header(&line);
                None
            }
        }
    }

    /// Next engine event as a core message. Log lines are written straight
    /// to the console and yield `Msg::NoOp`.
    pub fn poll<W: Write>(&self, console: &mut Console<W>) -> Option<Msg> {
        let event = self.engine.try_recv()?;
        Some(translate_event(event, console))
    }
}

fn translate_event<W: Write>(event: EngineEvent, console: &mut Console<W>) -> Msg {
    match event {
        EngineEvent::Log(line) => {
            console.log_line(&line);
            Msg::NoOp
        }
        EngineEvent::Phase(phase) => Msg::StageChanged(map_phase(phase)),
        EngineEvent::EntryAppended { index, title } => Msg::EntryHarvested { index, title },
        EngineEvent::HarvestFinished { run_id, result } => {
            let outcome = match result {
                Ok(report) => RunOutcome::Completed {
                    chapters: report.chapters,
                    summary: report.termination.to_string(),
                },
                Err(err) => {
                    harvest_warn!("Run {} failed: {}", run_id, err);
                    RunOutcome::Failed {
                        message: err.to_string(),
                    }
                }
            };
            Msg::HarvestFinished(outcome)
        }
        EngineEvent::StartRejected => Msg::StartRejected,
    }
}

fn map_phase(phase: HarvestPhase) -> HarvestStage {
    match phase {
        HarvestPhase::Idle => HarvestStage::Idle,
        HarvestPhase::FetchingMetadata => HarvestStage::FetchingMetadata,
        HarvestPhase::TraversingChapters => HarvestStage::TraversingChapters,
        HarvestPhase::Paused => HarvestStage::Paused,
        HarvestPhase::Completed => HarvestStage::Completed,
        HarvestPhase::Failed => HarvestStage::Failed,
    }
}
