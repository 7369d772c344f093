use thiserror::Error;

use crate::source::domain::camera::CameraError;
use crate::source::domain::image_fetcher::FetchError;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("unsupported media type {0}")]
    UnsupportedMime(String),
    #[error("failed to decode image: {0}")]
    Decode(String),
    #[error(transparent)]
    Camera(#[from] CameraError),
    #[error("video stream ended before its first frame")]
    StreamEnded,
}
