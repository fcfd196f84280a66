//! Progress events for observers outside the engine

use crate::outcome::{GroupState, RemovalOutcome};
use crate::plan::StageKind;
use tokio::sync::mpsc;

#[derive(Debug, Clone)]
pub enum ProgressEvent {
    GroupStateChanged {
        group: String,
        state: GroupState,
    },
    StageStarted {
        group: String,
        stage: StageKind,
        tasks: usize,
    },
    StageFinished {
        group: String,
        stage: StageKind,
        failed: usize,
        total: usize,
        duration_ms: u64,
    },
    ResourceOutcome {
        group: String,
        stage: StageKind,
        outcome: RemovalOutcome,
    },
}

pub type ProgressSender = mpsc::UnboundedSender<ProgressEvent>;

/// Optional event sink; a dropped receiver is not an error
#[derive(Debug, Clone, Default)]
pub struct ProgressSink(Option<ProgressSender>);

impl ProgressSink {
    pub fn new(sender: ProgressSender) -> Self {
        Self(Some(sender))
    }

    pub fn disabled() -> Self {
        Self(None)
    }

    pub fn emit(&self, event: ProgressEvent) {
        if let Some(sender) = &self.0 {
            let _ = sender.send(event);
        }
    }
}
