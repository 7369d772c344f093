use async_trait::async_trait;
use thiserror::Error;

use crate::shared::frame::Frame;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CameraError {
    #[error("camera access denied: {0}")]
    PermissionDenied(String),
    #[error("camera unavailable: {0}")]
    Unavailable(String),
    #[error("stream negotiation failed: {0}")]
    Negotiation(String),
}

/// A live video stream. Only the most recent frame is kept.
#[async_trait]
pub trait VideoStream: Send {
    /// Waits for a frame newer than the last one returned.
    ///
    /// Returns `None` once the stream has ended.
    async fn next_frame(&mut self) -> Option<Frame>;
}

/// Grants access to a camera.
#[async_trait]
pub trait CameraProvider: Send + Sync {
    async fn request_camera_stream(&self) -> Result<Box<dyn VideoStream>, CameraError>;
}
