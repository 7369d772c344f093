use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::events::domain::event_emitter::EventEmitter;
use crate::events::domain::pipeline_event::PipelineEvent;

/// Forwards events into an unbounded tokio channel for an async host.
///
/// Sends after the receiver is dropped are discarded.
pub struct ChannelEventEmitter {
    tx: UnboundedSender<PipelineEvent>,
}

impl ChannelEventEmitter {
    pub fn new() -> (Self, UnboundedReceiver<PipelineEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl EventEmitter for ChannelEventEmitter {
    fn emit(&self, event: PipelineEvent) {
        if self.tx.send(event).is_err() {
            log::debug!("event receiver dropped, discarding event");
        }
    }
}

/// Delivers every event to each inner emitter in registration order.
pub struct FanOutEventEmitter {
    sinks: Vec<Box<dyn EventEmitter>>,
}

impl FanOutEventEmitter {
    pub fn new(sinks: Vec<Box<dyn EventEmitter>>) -> Self {
        Self { sinks }
    }
}

impl EventEmitter for FanOutEventEmitter {
    fn emit(&self, event: PipelineEvent) {
        for sink in &self.sinks {
            sink.emit(event.clone());
        }
    }
}
