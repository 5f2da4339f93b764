use std::sync::mpsc;

use crate::{EngineEvent, LogLine};

/// Receives progress from a running harvest. Front ends implement this to
/// surface log lines and phase changes; tests record into a vector.
pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: EngineEvent);

    fn log(&self, line: LogLine) {
        self.emit(EngineEvent::Log(line));
    }
}

pub struct ChannelProgressSink {
    tx: mpsc::Sender<EngineEvent>,
}

impl ChannelProgressSink {
    pub fn new(tx: mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl ProgressSink for ChannelProgressSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}

/// Discards everything.
pub struct NullProgressSink;

impl ProgressSink for NullProgressSink {
    fn emit(&self, _event: EngineEvent) {}
}
