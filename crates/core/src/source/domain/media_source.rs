use std::fmt;

use crate::source::domain::camera::VideoStream;

/// A visual input awaiting resolution into a frame.
///
/// Constructed by the host and consumed by one resolution.
pub enum MediaSource {
    RemoteImage {
        url: String,
    },
    DroppedFile {
        bytes: Vec<u8>,
        mime_type: Option<String>,
    },
    VideoHandle {
        stream: Box<dyn VideoStream>,
    },
}

impl MediaSource {
    pub fn remote(url: impl Into<String>) -> Self {
        MediaSource::RemoteImage { url: url.into() }
    }

    pub fn dropped(bytes: Vec<u8>, mime_type: Option<String>) -> Self {
        MediaSource::DroppedFile { bytes, mime_type }
    }

    pub fn video(stream: Box<dyn VideoStream>) -> Self {
        MediaSource::VideoHandle { stream }
    }
}

impl fmt::Debug for MediaSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaSource::RemoteImage { url } => {
                f.debug_struct("RemoteImage").field("url", url).finish()
            }
            MediaSource::DroppedFile { bytes, mime_type } => f
                .debug_struct("DroppedFile")
                .field("bytes", &bytes.len())
                .field("mime_type", mime_type)
                .finish(),
            MediaSource::VideoHandle { .. } => f.write_str("VideoHandle"),
        }
    }
}
