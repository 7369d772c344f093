use std::fmt;

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

use crate::shared::rectangle::Rectangle;

/// Closed set of notifications a pipeline reports to its host.
#[derive(Clone, Debug, PartialEq)]
pub enum PipelineEvent {
    ImageDragEnter,
    ImageDragOver,
    ImageDragLeave,
    ImageDrop,
    ImageLoading,
    ImageLoaded,
    ImageLoadingFailure(String),
    VideoLoadingFailure(String),
    FaceDetected(Rectangle),
    NoFaceDetected,
}

/// Payload-free discriminant of [`PipelineEvent`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventKind {
    ImageDragEnter,
    ImageDragOver,
    ImageDragLeave,
    ImageDrop,
    ImageLoading,
    ImageLoaded,
    ImageLoadingFailure,
    VideoLoadingFailure,
    FaceDetected,
    NoFaceDetected,
}

impl EventKind {
    pub const ALL: &[EventKind] = &[
        EventKind::ImageDragEnter,
        EventKind::ImageDragOver,
        EventKind::ImageDragLeave,
        EventKind::ImageDrop,
        EventKind::ImageLoading,
        EventKind::ImageLoaded,
        EventKind::ImageLoadingFailure,
        EventKind::VideoLoadingFailure,
        EventKind::FaceDetected,
        EventKind::NoFaceDetected,
    ];

    /// Stable wire name, as dispatched to hosts.
    pub fn name(self) -> &'static str {
        match self {
            EventKind::ImageDragEnter => "x-face-detector-image-drag-enter",
            EventKind::ImageDragOver => "x-face-detector-image-drag-over",
            EventKind::ImageDragLeave => "x-face-detector-image-drag-leave",
            EventKind::ImageDrop => "x-face-detector-image-drop",
            EventKind::ImageLoading => "x-face-detector-image-loading",
            EventKind::ImageLoaded => "x-face-detector-image-loaded",
            EventKind::ImageLoadingFailure => "x-face-detector-image-loading-failure",
            EventKind::VideoLoadingFailure => "x-face-detector-video-loading-failure",
            EventKind::FaceDetected => "x-face-detector-face-detected",
            EventKind::NoFaceDetected => "x-face-detector-no-face-detected",
        }
    }

    /// True for the two kinds that close a detection cycle.
    pub fn is_detection_outcome(self) -> bool {
        matches!(self, EventKind::FaceDetected | EventKind::NoFaceDetected)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl PipelineEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            PipelineEvent::ImageDragEnter => EventKind::ImageDragEnter,
            PipelineEvent::ImageDragOver => EventKind::ImageDragOver,
            PipelineEvent::ImageDragLeave => EventKind::ImageDragLeave,
            PipelineEvent::ImageDrop => EventKind::ImageDrop,
            PipelineEvent::ImageLoading => EventKind::ImageLoading,
            PipelineEvent::ImageLoaded => EventKind::ImageLoaded,
            PipelineEvent::ImageLoadingFailure(_) => EventKind::ImageLoadingFailure,
            PipelineEvent::VideoLoadingFailure(_) => EventKind::VideoLoadingFailure,
            PipelineEvent::FaceDetected(_) => EventKind::FaceDetected,
            PipelineEvent::NoFaceDetected => EventKind::NoFaceDetected,
        }
    }

    pub fn name(&self) -> &'static str {
        self.kind().name()
    }
}

impl fmt::Display for PipelineEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineEvent::ImageLoadingFailure(cause) | PipelineEvent::VideoLoadingFailure(cause) => {
                write!(f, "{} ({cause})", self.name())
            }
            PipelineEvent::FaceDetected(rect) => write!(f, "{} {:?}", self.name(), rect.as_array()),
            _ => f.write_str(self.name()),
        }
    }
}

/// Serializes as `{"type": "<wire name>", "detail": <payload or null>}`.
impl Serialize for PipelineEvent {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("PipelineEvent", 2)?;
        state.serialize_field("type", self.name())?;
        match self {
            PipelineEvent::ImageLoadingFailure(cause) | PipelineEvent::VideoLoadingFailure(cause) => {
                state.serialize_field("detail", cause)?
            }
            PipelineEvent::FaceDetected(rect) => state.serialize_field("detail", rect)?,
            _ => state.serialize_field("detail", &Option::<()>::None)?,
        }
        state.end()
    }
}
