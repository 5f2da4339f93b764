//! Story harvest core: pure front-end state machine and view-model helpers.
mod effect;
mod msg;
mod state;
mod update;
mod view_model;

pub use effect::{Effect, Notification, NotificationLevel};
pub use msg::{Msg, RenderOutcome, RunOutcome};
pub use state::{AppState, HarvestStage, DEFAULT_OUTPUT_DIR};
pub use update::update;
pub use view_model::AppViewModel;
