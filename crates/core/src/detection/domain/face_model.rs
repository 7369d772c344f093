use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;

use crate::detection::domain::detection::Detection;
use crate::shared::frame::Frame;

#[derive(Error, Debug)]
pub enum ModelLoadError {
    #[error("inference backend not found at {0}")]
    NotFound(String),
    #[error("failed to initialise inference backend: {0}")]
    Backend(String),
}

/// A loaded face-detection model.
///
/// Estimation is total: a model that cannot find a face returns an empty
/// sequence, never an error.
#[async_trait]
pub trait FaceModel: Send {
    async fn estimate_faces(&mut self, frame: &Frame) -> Vec<Detection>;
}

/// Builds a [`FaceModel`] from the configured backend location.
#[async_trait]
pub trait ModelLoader: Send + Sync {
    async fn load(&self, backend_path: &Path) -> Result<Box<dyn FaceModel>, ModelLoadError>;
}
