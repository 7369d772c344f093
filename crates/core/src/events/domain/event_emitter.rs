use crate::events::domain::pipeline_event::PipelineEvent;

/// Outward notification channel shared by every pipeline component.
///
/// Emission is synchronous and ordered: events reach the sink in the order
/// `emit` is called.
pub trait EventEmitter: Send + Sync {
    fn emit(&self, event: PipelineEvent);
}
