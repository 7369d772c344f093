pub mod channel_event_emitter;
pub mod log_event_emitter;
#[cfg(test)]
pub mod recording_event_emitter;
