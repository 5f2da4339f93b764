use std::path::PathBuf;

use url::Url;

use crate::{AppState, Effect, Msg, Notification, RenderOutcome, RunOutcome};

const INPUT_ERROR: &str = "Input Error";

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::MetadataUrlChanged(url) => {
            state.set_metadata_url(url);
            Vec::new()
        }
        Msg::ChapterUrlChanged(url) => {
            state.set_chapter_url(url);
            Vec::new()
        }
        Msg::OutputDirChanged(dir) => {
            let dir = dir.trim();
            if dir.is_empty() {
                return (state, Vec::new());
            }
            state.set_output_dir(dir.to_string());
            vec![Effect::AppendLog(format!("Output directory set to: {dir}"))]
        }
        Msg::StartClicked => {
            if state.is_running() {
                return (state, Vec::new());
            }
            let metadata_url = state.metadata_url().trim().to_string();
            let chapter_url = state.chapter_url().trim().to_string();
            if let Err(message) = validate_urls(&metadata_url, &chapter_url) {
                return (
                    state,
                    vec![Effect::Notify(Notification::error(INPUT_ERROR, message))],
                );
            }
            state.begin_run();
            vec![Effect::StartHarvest {
                metadata_url,
                chapter_url,
            }]
        }
        Msg::PauseToggled => {
            if !state.is_running() {
                return (state, Vec::new());
            }
            let paused = !state.is_paused();
            state.set_paused(paused);
            let line = if paused {
                "Harvest paused..."
            } else {
                "Harvest resumed..."
            };
            vec![Effect::SetPaused(paused), Effect::AppendLog(line.to_string())]
        }
        Msg::RenderClicked => {
            if state.entries() == 0 {
                vec![Effect::Notify(no_data())]
            } else {
                vec![Effect::RenderDocument {
                    output_dir: PathBuf::from(state.output_dir()),
                }]
            }
        }
        Msg::StageChanged(stage) => {
            state.set_stage(stage);
            Vec::new()
        }
        Msg::EntryHarvested { index, title } => {
            state.record_entry(index, title);
            Vec::new()
        }
        Msg::HarvestFinished(outcome) => {
            let effect = match &outcome {
                RunOutcome::Completed { chapters, summary } => Effect::AppendHeader(format!(
                    "Harvest complete: {chapters} chapters ({summary})"
                )),
                RunOutcome::Failed { message } => {
                    Effect::Notify(Notification::error("Harvest Failed", message.clone()))
                }
            };
            state.finish_run(outcome);
            vec![effect]
        }
        Msg::StartRejected => vec![Effect::Notify(Notification::warning(
            "Busy",
            "A harvest is already running.",
        ))],
        Msg::RenderFinished(outcome) => match outcome {
            RenderOutcome::Written(path) => {
                let shown = path.display().to_string();
                state.set_last_document(path);
                vec![
                    Effect::AppendHeader(format!("PDF generated: {shown}")),
                    Effect::Notify(Notification::info(
                        "Success",
                        format!("PDF saved to:\n{shown}"),
                    )),
                ]
            }
            RenderOutcome::Empty => vec![Effect::Notify(no_data())],
            RenderOutcome::Failed(message) => {
                vec![Effect::Notify(Notification::error("PDF Error", message))]
            }
        },
        Msg::Tick | Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn validate_urls(metadata_url: &str, chapter_url: &str) -> Result<(), String> {
    if metadata_url.is_empty() || chapter_url.is_empty() {
        return Err("Please provide both URLs.".to_string());
    }
    for candidate in [metadata_url, chapter_url] {
        if Url::parse(candidate).is_err() {
            return Err(format!("Not a valid URL: {candidate}"));
        }
    }
    Ok(())
}

fn no_data() -> Notification {
    Notification::warning("No Data", "No data to generate PDF.")
}
