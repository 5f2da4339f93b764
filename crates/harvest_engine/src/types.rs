use std::fmt;

use crate::client::ClientError;

pub type RunId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HarvestPhase {
    Idle,
    FetchingMetadata,
    TraversingChapters,
    Paused,
    Completed,
    Failed,
}

/// How a front end should present a log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogStyle {
    Plain,
    /// Upper-cased banner, visually separated from the surrounding lines.
    Header,
    /// Settling countdown tick; replaces the previous tick if one is still open.
    Countdown,
    /// Last countdown line; replaces the open tick and closes the countdown.
    CountdownDone,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    pub message: String,
    pub style: LogStyle,
}

impl LogLine {
    pub fn plain(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            style: LogStyle::Plain,
        }
    }

    pub fn header(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            style: LogStyle::Header,
        }
    }

    pub fn countdown(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            style: LogStyle::Countdown,
        }
    }

    pub fn countdown_done(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            style: LogStyle::CountdownDone,
        }
    }
}

#[derive(Debug)]
pub enum EngineEvent {
    Log(LogLine),
    Phase(HarvestPhase),
    EntryAppended {
        index: usize,
        title: String,
    },
    HarvestFinished {
        run_id: RunId,
        result: Result<HarvestReport, HarvestError>,
    },
    /// A start was requested while another run was still active.
    StartRejected,
}

/// Why the traversal loop stopped without raising an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Termination {
    /// The next-chapter control was present but disabled.
    LastChapter,
    /// A chapter selector or the next-chapter control was missing.
    EndOfChapters,
    /// Some other per-chapter failure; the message is what was logged.
    Interrupted(String),
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Termination::LastChapter => write!(f, "last chapter reached"),
            Termination::EndOfChapters => write!(f, "end of chapters reached"),
            Termination::Interrupted(message) => write!(f, "interrupted: {message}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestReport {
    /// Chapter entries appended; the metadata entry is not counted.
    pub chapters: usize,
    pub termination: Termination,
}

#[derive(Debug, thiserror::Error)]
pub enum HarvestError {
    #[error("missing input: {field} is empty")]
    MissingInput { field: &'static str },
    #[error("could not acquire page client: {0}")]
    ResourceAcquisition(#[source] ClientError),
    #[error("could not load story metadata: {0}")]
    Navigation(#[source] ClientError),
    #[error("harvest aborted unexpectedly")]
    Aborted,
    #[error("could not start harvest runtime: {0}")]
    Runtime(#[source] std::io::Error),
}
