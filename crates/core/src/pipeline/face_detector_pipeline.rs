use std::sync::Arc;

use crate::detection::domain::detection::Detection;
use crate::detection::domain::face_model::{FaceModel, ModelLoader};
use crate::events::domain::event_emitter::EventEmitter;
use crate::events::domain::pipeline_event::PipelineEvent;
use crate::pipeline::capture_loop::{CaptureHandle, CaptureLoop};
use crate::pipeline::frame_stager::{FrameStager, StagedFrame};
use crate::pipeline::inference_invoker::InferenceInvoker;
use crate::pipeline::pagination_navigator::NavigatorCursor;
use crate::pipeline::pipeline_error::PipelineError;
use crate::pipeline::pipeline_state::{CaptureState, PipelineState};
use crate::pipeline::source_provider::{LiveStream, ResolvedSource, SourceProvider};
use crate::rendering::domain::color::Color;
use crate::rendering::domain::render_surface::RenderSurface;
use crate::rendering::infrastructure::annotation_renderer::AnnotationRenderer;
use crate::shared::configuration::Configuration;
use crate::shared::frame::Frame;
use crate::shared::rectangle::Rectangle;
use crate::source::domain::camera::CameraProvider;
use crate::source::domain::image_fetcher::ImageFetcher;
use crate::source::domain::media_source::MediaSource;
use crate::source::domain::stream_geometry::StreamGeometry;

/// Drag-and-drop notifications forwarded by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragEvent {
    Enter,
    Over,
    Leave,
}

/// Result of one stage -> detect -> render cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    pub frame_index: usize,
    pub detections: Vec<Detection>,
    pub rectangles: Vec<Rectangle>,
}

impl CycleReport {
    pub fn face_count(&self) -> usize {
        self.rectangles.len()
    }
}

/// Outcome of asking for a camera stream.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamOutcome {
    /// The stream is negotiated; [`FaceDetectorPipeline::run_capture`] may run.
    Streaming(StreamGeometry),
    /// Acquisition failed; the pipeline stays idle.
    NotStreaming { cause: String },
}

/// Summary of a finished capture loop run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureSummary {
    pub ticks: u64,
    pub faces: usize,
}

/// Media-to-detection pipeline.
///
/// Resolves a source, stages it, runs inference once and draws the results,
/// emitting one ordered event sequence per cycle. Cycles take `&mut self`
/// and therefore never interleave.
pub struct FaceDetectorPipeline {
    config: Configuration,
    emitter: Arc<dyn EventEmitter>,
    provider: SourceProvider,
    stager: FrameStager,
    renderer: AnnotationRenderer,
    navigator: NavigatorCursor,
    invoker: Option<InferenceInvoker>,
    backend_failure: Option<String>,
    capture: CaptureLoop,
    live: Option<LiveStream>,
    pending_frame: Option<Frame>,
    state: PipelineState,
}

impl FaceDetectorPipeline {
    pub fn new(
        config: Configuration,
        fetcher: Arc<dyn ImageFetcher>,
        emitter: Arc<dyn EventEmitter>,
    ) -> Result<Self, PipelineError> {
        config.validate()?;
        let renderer = AnnotationRenderer::from_config(&config)?;
        let navigator = NavigatorCursor::new(config.navigator_min, config.navigator_max)?;
        let provider = SourceProvider::new(
            fetcher,
            Arc::clone(&emitter),
            config.target_width,
            config.target_height,
        );
        Ok(Self {
            config,
            emitter,
            provider,
            stager: FrameStager::new(),
            renderer,
            navigator,
            invoker: None,
            backend_failure: None,
            capture: CaptureLoop::new(),
            live: None,
            pending_frame: None,
            state: PipelineState::Idle,
        })
    }

    /// Loads the model from `inferenceBackendPath`.
    ///
    /// Failure is fatal: the pipeline enters [`PipelineState::Error`] and
    /// every later cycle returns [`PipelineError::BackendUnavailable`].
    pub async fn load_model(&mut self, loader: &dyn ModelLoader) -> Result<(), PipelineError> {
        let path = self.config.inference_backend_path.clone();
        log::info!("Loading inference backend from {}", path.display());
        match loader.load(&path).await {
            Ok(model) => {
                self.install_model(model);
                Ok(())
            }
            Err(e) => {
                log::error!("Inference backend failed to initialise: {e}");
                self.invoker = None;
                self.backend_failure = Some(e.to_string());
                self.state = PipelineState::Error;
                Err(e.into())
            }
        }
    }

    /// Installs an already loaded model.
    pub fn with_model(mut self, model: Box<dyn FaceModel>) -> Self {
        self.install_model(model);
        self
    }

    fn install_model(&mut self, model: Box<dyn FaceModel>) {
        self.invoker = Some(InferenceInvoker::new(model));
        self.backend_failure = None;
        if self.state.is_error() {
            self.state = PipelineState::Idle;
        }
    }

    pub fn config(&self) -> &Configuration {
        &self.config
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn surface(&self) -> &RenderSurface {
        self.stager.surface()
    }

    pub fn last_staged(&self) -> Option<StagedFrame> {
        self.stager.last_staged()
    }

    pub fn navigator(&self) -> &NavigatorCursor {
        &self.navigator
    }

    pub fn capture_handle(&self) -> CaptureHandle {
        self.capture.handle()
    }

    pub fn capture_state(&self) -> CaptureState {
        self.capture.state()
    }

    pub fn is_streaming(&self) -> bool {
        self.live.is_some()
    }

    /// Resolves any still source and runs one full cycle on it.
    ///
    /// A [`MediaSource::VideoHandle`] runs the cycle on its first frame and
    /// is left ready for [`Self::run_capture`], which continues from the
    /// next frame.
    pub async fn process(&mut self, source: MediaSource) -> Result<CycleReport, PipelineError> {
        self.ensure_backend()?;
        self.state = PipelineState::Loading;
        match self.provider.resolve(source).await {
            Ok(ResolvedSource::Still(frame)) => self.run_cycle(&frame, None).await,
            Ok(ResolvedSource::Live(live)) => {
                self.live = None;
                self.pending_frame = None;
                let report = self.run_cycle(&live.first_frame, Some(live.geometry)).await;
                if report.is_ok() {
                    self.capture.clear_stop();
                    self.live = Some(live);
                    self.state = PipelineState::Streaming;
                }
                report
            }
            Err(e) => {
                log::warn!("Source resolution failed: {e}");
                self.state = PipelineState::Idle;
                Err(e.into())
            }
        }
    }

    /// Moves the navigator without loading anything. Returns the clamped id.
    pub fn seek(&mut self, id: i64) -> i64 {
        self.navigator.set(id)
    }

    /// Loads the remote image for navigator id `id` (clamped to its bounds).
    pub async fn load_remote(&mut self, id: i64) -> Result<CycleReport, PipelineError> {
        let id = self.navigator.set(id);
        self.process_navigator_id(id).await
    }

    pub async fn next_remote(&mut self) -> Result<CycleReport, PipelineError> {
        let id = self.navigator.increment();
        self.process_navigator_id(id).await
    }

    pub async fn previous_remote(&mut self) -> Result<CycleReport, PipelineError> {
        let id = self.navigator.decrement();
        self.process_navigator_id(id).await
    }

    async fn process_navigator_id(&mut self, id: i64) -> Result<CycleReport, PipelineError> {
        let url = self.config.source_url(id);
        log::debug!("Navigator at {id}: {url}");
        self.process(MediaSource::RemoteImage { url }).await
    }

    pub fn notify_drag(&self, event: DragEvent) {
        self.emitter.emit(match event {
            DragEvent::Enter => PipelineEvent::ImageDragEnter,
            DragEvent::Over => PipelineEvent::ImageDragOver,
            DragEvent::Leave => PipelineEvent::ImageDragLeave,
        });
    }

    /// Handles a dropped file: `ImageDrop`, then a normal cycle.
    pub async fn drop_file(
        &mut self,
        bytes: Vec<u8>,
        mime_type: Option<String>,
    ) -> Result<CycleReport, PipelineError> {
        self.emitter.emit(PipelineEvent::ImageDrop);
        self.process(MediaSource::DroppedFile { bytes, mime_type })
            .await
    }

    /// Acquires a camera and waits for its first frame.
    ///
    /// A failed acquisition is reported through `VideoLoadingFailure` and a
    /// [`StreamOutcome::NotStreaming`]; the state stays idle.
    pub async fn start_video(
        &mut self,
        camera: &dyn CameraProvider,
    ) -> Result<StreamOutcome, PipelineError> {
        self.ensure_backend()?;
        if let Some(live) = &self.live {
            log::debug!("Video already negotiated");
            return Ok(StreamOutcome::Streaming(live.geometry));
        }
        self.state = PipelineState::Loading;
        match self.provider.open_camera(camera).await {
            Ok(live) => {
                let geometry = live.geometry;
                self.capture.clear_stop();
                self.pending_frame = Some(live.first_frame.clone());
                self.live = Some(live);
                self.state = PipelineState::Streaming;
                Ok(StreamOutcome::Streaming(geometry))
            }
            Err(e) => {
                log::warn!("Camera acquisition failed: {e}");
                self.state = PipelineState::Idle;
                Ok(StreamOutcome::NotStreaming {
                    cause: e.to_string(),
                })
            }
        }
    }

    /// Runs the continuous capture loop until stopped, the tick limit is
    /// reached or the stream ends. Without a negotiated stream this is a
    /// no-op.
    ///
    /// The loop releases the stream when it exits.
    pub async fn run_capture(&mut self, max_ticks: Option<u64>) -> Result<CaptureSummary, PipelineError> {
        self.ensure_backend()?;
        let Some(mut live) = self.live.take() else {
            log::debug!("No video stream negotiated, capture loop not started");
            return Ok(CaptureSummary { ticks: 0, faces: 0 });
        };
        self.capture.set_max_ticks(max_ticks);
        if !self.capture.start() {
            self.live = Some(live);
            return Ok(CaptureSummary { ticks: 0, faces: 0 });
        }

        let geometry = live.geometry;
        let mut pending = self.pending_frame.take();
        let mut faces = 0;
        let mut outcome = Ok(());

        while self.capture.should_continue() {
            let frame = match pending.take() {
                Some(frame) => frame,
                None => match live.stream.next_frame().await {
                    Some(frame) => frame,
                    None => {
                        log::info!("Video stream ended");
                        break;
                    }
                },
            };
            match self.run_cycle(&frame, Some(geometry)).await {
                Ok(report) => faces += report.face_count(),
                Err(e) => {
                    outcome = Err(e);
                    break;
                }
            }
            self.state = PipelineState::Streaming;
            let tick = self.capture.complete_tick();
            log::debug!("Capture tick {tick} complete");
            tokio::task::yield_now().await;
        }

        let ticks = self.capture.handle().ticks();
        self.capture.finish();
        drop(live);
        if !self.state.is_error() {
            self.state = PipelineState::Idle;
        }
        outcome.map(|()| CaptureSummary { ticks, faces })
    }

    /// Releases a negotiated stream without running the loop.
    ///
    /// A running loop is stopped through [`Self::capture_handle`] instead.
    pub fn stop_video(&mut self) {
        self.pending_frame = None;
        if self.live.take().is_some() {
            log::info!("Video stream released");
            self.state = PipelineState::Idle;
        }
    }

    pub fn clear(&mut self) {
        self.renderer.clear(self.stager.surface_mut());
    }

    pub fn fill(&mut self, color: Color) {
        self.renderer.fill(self.stager.surface_mut(), color);
    }

    fn ensure_backend(&self) -> Result<(), PipelineError> {
        if let Some(cause) = &self.backend_failure {
            return Err(PipelineError::BackendUnavailable(cause.clone()));
        }
        if self.invoker.is_none() {
            return Err(PipelineError::BackendUnavailable(
                "no model loaded".to_string(),
            ));
        }
        Ok(())
    }

    async fn run_cycle(
        &mut self,
        frame: &Frame,
        geometry: Option<StreamGeometry>,
    ) -> Result<CycleReport, PipelineError> {
        let Some(invoker) = self.invoker.as_ref() else {
            self.state = PipelineState::Idle;
            return Err(PipelineError::BackendUnavailable("no model loaded".to_string()));
        };

        let staged = match geometry {
            Some(g) if !g.is_native() => {
                self.stager
                    .stage_scaled(frame, g.output_width, g.output_height)
            }
            _ => self.stager.stage(frame),
        };
        let surface = match staged {
            Ok(surface) => surface,
            Err(e) => {
                log::warn!("Failed to stage frame {}: {e}", frame.index());
                self.state = PipelineState::Idle;
                return Err(e.into());
            }
        };
        self.state = PipelineState::Staged;

        self.state = PipelineState::Inferring;
        let detections = match invoker.detect(surface).await {
            Ok(detections) => detections,
            Err(e) => {
                self.state = PipelineState::Idle;
                return Err(e);
            }
        };

        let rectangles = self.renderer.render(surface, &detections);
        self.state = PipelineState::Rendered;

        if rectangles.is_empty() {
            self.emitter.emit(PipelineEvent::NoFaceDetected);
        } else {
            for rect in &rectangles {
                self.emitter.emit(PipelineEvent::FaceDetected(*rect));
            }
        }

        Ok(CycleReport {
            frame_index: frame.index(),
            detections,
            rectangles,
        })
    }
}
