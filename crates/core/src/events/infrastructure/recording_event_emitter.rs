use std::sync::{Arc, Mutex};

use crate::events::domain::event_emitter::EventEmitter;
use crate::events::domain::pipeline_event::{EventKind, PipelineEvent};

/// Keeps every emitted event in memory. Clones share one log.
#[derive(Clone, Default)]
pub struct RecordingEventEmitter {
    events: Arc<Mutex<Vec<PipelineEvent>>>,
}

impl RecordingEventEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<PipelineEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn kinds(&self) -> Vec<EventKind> {
        self.events().iter().map(PipelineEvent::kind).collect()
    }

    pub fn count(&self, kind: EventKind) -> usize {
        self.kinds().into_iter().filter(|k| *k == kind).count()
    }

    pub fn clear(&self) {
        if let Ok(mut events) = self.events.lock() {
            events.clear();
        }
    }
}

impl EventEmitter for RecordingEventEmitter {
    fn emit(&self, event: PipelineEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_log() {
        let recorder = RecordingEventEmitter::new();
        let clone = recorder.clone();
        clone.emit(PipelineEvent::ImageLoading);
        assert_eq!(recorder.kinds(), vec![EventKind::ImageLoading]);

        recorder.clear();
        assert!(clone.events().is_empty());
    }
}
