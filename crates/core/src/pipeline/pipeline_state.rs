use std::fmt;

/// Lifecycle of one pipeline instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PipelineState {
    #[default]
    Idle,
    Loading,
    Staged,
    Inferring,
    Rendered,
    Streaming,
    Error,
}

impl PipelineState {
    pub fn is_error(self) -> bool {
        self == PipelineState::Error
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineState::Idle => "idle",
            PipelineState::Loading => "loading",
            PipelineState::Staged => "staged",
            PipelineState::Inferring => "inferring",
            PipelineState::Rendered => "rendered",
            PipelineState::Streaming => "streaming",
            PipelineState::Error => "error",
        };
        f.write_str(name)
    }
}

/// Capture loop state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    Stopped,
    Running,
}
