use thiserror::Error;

use crate::detection::domain::face_model::ModelLoadError;
use crate::pipeline::pagination_navigator::NavigatorBoundsError;
use crate::rendering::domain::color::ColorParseError;
use crate::rendering::domain::render_surface::SurfaceError;
use crate::shared::configuration::ConfigError;
use crate::source::domain::source_error::SourceError;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("inference already in flight")]
    InvariantViolation,
    #[error("inference backend unavailable: {0}")]
    BackendUnavailable(String),
    #[error("inference backend failed to initialise: {0}")]
    BackendInit(#[from] ModelLoadError),
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error("failed to stage frame: {0}")]
    Surface(#[from] SurfaceError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Navigator(#[from] NavigatorBoundsError),
    #[error("invalid stroke style: {0}")]
    StrokeStyle(#[from] ColorParseError),
}
