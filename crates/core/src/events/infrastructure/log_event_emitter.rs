use std::collections::BTreeMap;
use std::sync::Mutex;
use std::time::Instant;

use crate::events::domain::event_emitter::EventEmitter;
use crate::events::domain::pipeline_event::{EventKind, PipelineEvent};

/// Silent emitter that discards all events.
pub struct NullEventEmitter;

impl EventEmitter for NullEventEmitter {
    fn emit(&self, _event: PipelineEvent) {}
}

/// Writes each event through the `log` facade and tallies them per kind.
///
/// Failures log at `warn`, everything else at `info`.
pub struct LogEventEmitter {
    counts: Mutex<BTreeMap<EventKind, usize>>,
    start_time: Instant,
}

impl LogEventEmitter {
    pub fn new() -> Self {
        Self {
            counts: Mutex::new(BTreeMap::new()),
            start_time: Instant::now(),
        }
    }

    pub fn count(&self, kind: EventKind) -> usize {
        self.counts
            .lock()
            .map(|c| c.get(&kind).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    /// Returns the formatted summary string, or `None` if nothing was emitted.
    pub fn summary_string(&self) -> Option<String> {
        let counts = self.counts.lock().ok()?;
        if counts.is_empty() {
            return None;
        }

        let elapsed = self.start_time.elapsed().as_secs_f64();
        let total: usize = counts.values().sum();
        let mut lines = vec![format!("Event summary ({total} events, {elapsed:.1}s):")];
        for (kind, count) in counts.iter() {
            lines.push(format!("  {:40}: {count}", kind.name()));
        }
        Some(lines.join("\n"))
    }

    pub fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n\n{text}");
        }
    }
}

impl Default for LogEventEmitter {
    fn default() -> Self {
        Self::new()
    }
}

impl EventEmitter for LogEventEmitter {
    fn emit(&self, event: PipelineEvent) {
        match &event {
            PipelineEvent::ImageLoadingFailure(_) | PipelineEvent::VideoLoadingFailure(_) => {
                log::warn!("{event}")
            }
            _ => log::info!("{event}"),
        }
        if let Ok(mut counts) = self.counts.lock() {
            *counts.entry(event.kind()).or_default() += 1;
        }
    }
}
