use std::fmt;
use std::sync::Arc;

use crate::events::domain::event_emitter::EventEmitter;
use crate::events::domain::pipeline_event::PipelineEvent;
use crate::shared::frame::Frame;
use crate::source::domain::camera::{CameraProvider, VideoStream};
use crate::source::domain::image_fetcher::ImageFetcher;
use crate::source::domain::media_source::MediaSource;
use crate::source::domain::source_error::SourceError;
use crate::source::domain::stream_geometry::StreamGeometry;
use crate::source::infrastructure::image_decoder::decode_image;

/// A negotiated live stream, ready on its first frame.
pub struct LiveStream {
    pub first_frame: Frame,
    pub geometry: StreamGeometry,
    pub stream: Box<dyn VideoStream>,
}

impl fmt::Debug for LiveStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LiveStream")
            .field("geometry", &self.geometry)
            .finish_non_exhaustive()
    }
}

#[derive(Debug)]
pub enum ResolvedSource {
    Still(Frame),
    Live(LiveStream),
}

/// Turns a [`MediaSource`] into a decoded frame, reporting progress as events.
///
/// Resolution takes `&mut self`, so one provider never has two resolutions
/// outstanding.
pub struct SourceProvider {
    fetcher: Arc<dyn ImageFetcher>,
    emitter: Arc<dyn EventEmitter>,
    target_width: u32,
    target_height: u32,
}

impl SourceProvider {
    pub fn new(
        fetcher: Arc<dyn ImageFetcher>,
        emitter: Arc<dyn EventEmitter>,
        target_width: u32,
        target_height: u32,
    ) -> Self {
        Self {
            fetcher,
            emitter,
            target_width,
            target_height,
        }
    }

    pub async fn resolve(&mut self, source: MediaSource) -> Result<ResolvedSource, SourceError> {
        match source {
            MediaSource::RemoteImage { url } => self.resolve_remote(&url).await.map(ResolvedSource::Still),
            MediaSource::DroppedFile { bytes, mime_type } => self
                .resolve_dropped(&bytes, mime_type.as_deref())
                .map(ResolvedSource::Still),
            MediaSource::VideoHandle { stream } => {
                self.negotiate(stream).await.map(ResolvedSource::Live)
            }
        }
    }

    /// Requests a camera stream and waits for its first frame.
    pub async fn open_camera(
        &mut self,
        camera: &dyn CameraProvider,
    ) -> Result<LiveStream, SourceError> {
        match camera.request_camera_stream().await {
            Ok(stream) => self.negotiate(stream).await,
            Err(e) => {
                self.emitter
                    .emit(PipelineEvent::VideoLoadingFailure(e.to_string()));
                Err(e.into())
            }
        }
    }

    async fn resolve_remote(&mut self, url: &str) -> Result<Frame, SourceError> {
        self.emitter.emit(PipelineEvent::ImageLoading);
        log::info!("Loading image from {url}");
        let result = match self.fetcher.fetch(url).await {
            Ok(bytes) => decode_image(&bytes, None),
            Err(e) => Err(e.into()),
        };
        self.report_image(result)
    }

    fn resolve_dropped(&mut self, bytes: &[u8], mime_type: Option<&str>) -> Result<Frame, SourceError> {
        self.emitter.emit(PipelineEvent::ImageLoading);
        log::info!(
            "Decoding dropped file ({} bytes, {})",
            bytes.len(),
            mime_type.unwrap_or("unknown type")
        );
        self.report_image(decode_image(bytes, mime_type))
    }

    fn report_image(&self, result: Result<Frame, SourceError>) -> Result<Frame, SourceError> {
        match &result {
            Ok(frame) => {
                log::debug!("Decoded {}x{} image", frame.width(), frame.height());
                self.emitter.emit(PipelineEvent::ImageLoaded);
            }
            Err(e) => self
                .emitter
                .emit(PipelineEvent::ImageLoadingFailure(e.to_string())),
        }
        result
    }

    async fn negotiate(&mut self, mut stream: Box<dyn VideoStream>) -> Result<LiveStream, SourceError> {
        let Some(first_frame) = stream.next_frame().await else {
            let e = SourceError::StreamEnded;
            self.emitter
                .emit(PipelineEvent::VideoLoadingFailure(e.to_string()));
            return Err(e);
        };
        let geometry = StreamGeometry::fit(
            first_frame.width(),
            first_frame.height(),
            self.target_width,
            self.target_height,
        );
        log::info!(
            "Video ready: {}x{} -> {}x{}",
            geometry.source_width,
            geometry.source_height,
            geometry.output_width,
            geometry.output_height
        );
        Ok(LiveStream {
            first_frame,
            geometry,
            stream,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{HashMap, VecDeque};
    use std::io::Cursor;

    use async_trait::async_trait;
    use image::{DynamicImage, ImageFormat, RgbImage};

    use super::*;
    use crate::events::domain::pipeline_event::EventKind;
    use crate::events::infrastructure::recording_event_emitter::RecordingEventEmitter;
    use crate::source::domain::camera::CameraError;
    use crate::source::domain::image_fetcher::FetchError;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let mut out = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(RgbImage::new(width, height))
            .write_to(&mut out, ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    struct StubFetcher {
        responses: HashMap<String, Vec<u8>>,
    }

    #[async_trait]
    impl ImageFetcher for StubFetcher {
        async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
            self.responses.get(url).cloned().ok_or(FetchError::Status {
                url: url.to_string(),
                status: 404,
            })
        }
    }

    struct QueuedStream {
        frames: VecDeque<Frame>,
    }

    #[async_trait]
    impl VideoStream for QueuedStream {
        async fn next_frame(&mut self) -> Option<Frame> {
            self.frames.pop_front()
        }
    }

    struct StubCamera {
        result: Result<Vec<Frame>, CameraError>,
    }

    #[async_trait]
    impl CameraProvider for StubCamera {
        async fn request_camera_stream(&self) -> Result<Box<dyn VideoStream>, CameraError> {
            let frames = self.result.clone()?;
            Ok(Box::new(QueuedStream {
                frames: frames.into(),
            }))
        }
    }

    fn provider() -> (SourceProvider, RecordingEventEmitter) {
        let recorder = RecordingEventEmitter::new();
        let fetcher = StubFetcher {
            responses: HashMap::from([("host/42".to_string(), png(6, 4))]),
        };
        let provider = SourceProvider::new(Arc::new(fetcher), Arc::new(recorder.clone()), 640, 480);
        (provider, recorder)
    }

    #[tokio::test]
    async fn test_remote_image_emits_loading_then_loaded() {
        let (mut provider, recorder) = provider();
        let resolved = provider.resolve(MediaSource::remote("host/42")).await.unwrap();

        let ResolvedSource::Still(frame) = resolved else {
            panic!("expected a still frame");
        };
        assert_eq!((frame.width(), frame.height()), (6, 4));
        assert_eq!(
            recorder.kinds(),
            vec![EventKind::ImageLoading, EventKind::ImageLoaded]
        );
    }

    #[tokio::test]
    async fn test_fetch_failure_emits_failure_with_cause() {
        let (mut provider, recorder) = provider();
        let err = provider
            .resolve(MediaSource::remote("host/404"))
            .await
            .unwrap_err();

        assert!(matches!(err, SourceError::Fetch(FetchError::Status { status: 404, .. })));
        let events = recorder.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], PipelineEvent::ImageLoading);
        assert!(matches!(&events[1], PipelineEvent::ImageLoadingFailure(cause) if cause.contains("404")));
    }

    #[tokio::test]
    async fn test_dropped_file_decodes_with_mime() {
        let (mut provider, recorder) = provider();
        let resolved = provider
            .resolve(MediaSource::dropped(png(3, 3), Some("image/png".into())))
            .await
            .unwrap();

        assert!(matches!(resolved, ResolvedSource::Still(f) if f.width() == 3));
        assert_eq!(
            recorder.kinds(),
            vec![EventKind::ImageLoading, EventKind::ImageLoaded]
        );
    }

    #[tokio::test]
    async fn test_dropped_corrupt_file_fails() {
        let (mut provider, recorder) = provider();
        let err = provider
            .resolve(MediaSource::dropped(b"garbage".to_vec(), None))
            .await
            .unwrap_err();

        assert!(matches!(err, SourceError::Decode(_)));
        assert_eq!(
            recorder.kinds(),
            vec![EventKind::ImageLoading, EventKind::ImageLoadingFailure]
        );
    }

    #[tokio::test]
    async fn test_video_handle_computes_geometry_on_first_frame() {
        let (mut provider, recorder) = provider();
        let stream = QueuedStream {
            frames: VecDeque::from([Frame::blank(1280, 720), Frame::blank(1280, 720)]),
        };
        let resolved = provider
            .resolve(MediaSource::video(Box::new(stream)))
            .await
            .unwrap();

        let ResolvedSource::Live(live) = resolved else {
            panic!("expected a live stream");
        };
        assert_eq!((live.geometry.output_width, live.geometry.output_height), (640, 360));
        assert_eq!(live.first_frame.width(), 1280);
        assert!(recorder.events().is_empty());
    }

    #[tokio::test]
    async fn test_empty_video_stream_fails() {
        let (mut provider, recorder) = provider();
        let stream = QueuedStream {
            frames: VecDeque::new(),
        };
        let err = provider
            .resolve(MediaSource::video(Box::new(stream)))
            .await
            .unwrap_err();

        assert!(matches!(err, SourceError::StreamEnded));
        assert_eq!(recorder.kinds(), vec![EventKind::VideoLoadingFailure]);
    }

    #[tokio::test]
    async fn test_camera_denied_emits_video_failure() {
        let (mut provider, recorder) = provider();
        let camera = StubCamera {
            result: Err(CameraError::PermissionDenied("/dev/video0".into())),
        };
        let err = provider.open_camera(&camera).await.unwrap_err();

        assert!(matches!(err, SourceError::Camera(CameraError::PermissionDenied(_))));
        assert_eq!(
            recorder.events(),
            vec![PipelineEvent::VideoLoadingFailure(
                "camera access denied: /dev/video0".into()
            )]
        );
    }

    #[tokio::test]
    async fn test_camera_success_is_silent() {
        let (mut provider, recorder) = provider();
        let camera = StubCamera {
            result: Ok(vec![Frame::blank(320, 240)]),
        };
        let live = provider.open_camera(&camera).await.unwrap();

        assert_eq!(live.geometry.output_height, 480);
        assert!(recorder.events().is_empty());
    }
}
