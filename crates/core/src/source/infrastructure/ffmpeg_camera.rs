use std::ffi::CString;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use async_trait::async_trait;
use tokio::sync::{oneshot, watch};

use crate::shared::frame::Frame;
use crate::source::domain::camera::{CameraError, CameraProvider, VideoStream};

/// `EACCES`, reported by capture devices the process may not open.
const EACCES: i32 = 13;

/// Camera access through ffmpeg-next (libavdevice + libavcodec).
///
/// `uri` is a device path such as `/dev/video0` (with `format = "v4l2"`) or
/// anything libavformat can open. Decoding runs on a dedicated thread that
/// publishes RGBA frames into a single slot: a slow consumer only ever sees
/// the newest frame.
pub struct FfmpegCameraProvider {
    uri: String,
    format: Option<String>,
}

impl FfmpegCameraProvider {
    pub fn new(uri: impl Into<String>, format: Option<String>) -> Self {
        Self {
            uri: uri.into(),
            format,
        }
    }
}

#[async_trait]
impl CameraProvider for FfmpegCameraProvider {
    async fn request_camera_stream(&self) -> Result<Box<dyn VideoStream>, CameraError> {
        let (ready_tx, ready_rx) = oneshot::channel();
        let (frame_tx, frame_rx) = watch::channel(None);
        let stop = Arc::new(AtomicBool::new(false));

        let uri = self.uri.clone();
        let format = self.format.clone();
        let thread_stop = Arc::clone(&stop);
        thread::Builder::new()
            .name("camera-capture".into())
            .spawn(move || capture_thread(&uri, format.as_deref(), ready_tx, frame_tx, thread_stop))
            .map_err(|e| CameraError::Unavailable(e.to_string()))?;

        match ready_rx.await {
            Ok(Ok(())) => Ok(Box::new(FfmpegVideoStream { rx: frame_rx, stop })),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(CameraError::Unavailable(
                "capture thread exited before opening the device".into(),
            )),
        }
    }
}

/// Receiving end of a running capture thread. Dropping it stops the thread.
pub struct FfmpegVideoStream {
    rx: watch::Receiver<Option<Frame>>,
    stop: Arc<AtomicBool>,
}

#[async_trait]
impl VideoStream for FfmpegVideoStream {
    async fn next_frame(&mut self) -> Option<Frame> {
        loop {
            self.rx.changed().await.ok()?;
            if let Some(frame) = self.rx.borrow_and_update().clone() {
                return Some(frame);
            }
        }
    }
}

impl Drop for FfmpegVideoStream {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
    }
}

type ReadySender = oneshot::Sender<Result<(), CameraError>>;

fn capture_thread(
    uri: &str,
    format: Option<&str>,
    ready: ReadySender,
    frames: watch::Sender<Option<Frame>>,
    stop: Arc<AtomicBool>,
) {
    let mut capture = match Capture::open(uri, format) {
        Ok(capture) => capture,
        Err(e) => {
            log::warn!("Failed to open camera {uri}: {e}");
            let _ = ready.send(Err(e));
            return;
        }
    };
    log::info!(
        "Camera {uri} opened ({}x{})",
        capture.width,
        capture.height
    );
    if ready.send(Ok(())).is_err() {
        return;
    }

    while !stop.load(Ordering::Relaxed) {
        match capture.next_frame() {
            Ok(Some(frame)) => {
                if frames.send(Some(frame)).is_err() {
                    break;
                }
            }
            Ok(None) => {
                log::info!("Camera {uri} reached end of stream");
                break;
            }
            Err(e) => {
                log::warn!("Camera {uri} decode error: {e}");
                break;
            }
        }
    }
    log::debug!("Capture thread for {uri} exiting");
}

/// Maps a failure to open the input onto the camera error reported to hosts.
fn open_error(uri: &str, format: Option<&str>, err: ffmpeg_next::Error) -> CameraError {
    match err {
        ffmpeg_next::Error::Other { errno } if errno == EACCES => {
            CameraError::PermissionDenied(uri.to_string())
        }
        ffmpeg_next::Error::DemuxerNotFound => CameraError::Unavailable(format!(
            "input format {} not available",
            format.unwrap_or("auto")
        )),
        other => CameraError::Unavailable(format!("{uri}: {other}")),
    }
}

/// Open demuxer, decoder and RGBA scaler for one video stream.
struct Capture {
    ictx: ffmpeg_next::format::context::Input,
    decoder: ffmpeg_next::decoder::Video,
    scaler: ffmpeg_next::software::scaling::Context,
    stream_index: usize,
    width: u32,
    height: u32,
    frame_index: usize,
    flushing: bool,
}

impl Capture {
    fn open(uri: &str, format: Option<&str>) -> Result<Self, CameraError> {
        ffmpeg_next::init().map_err(|e| CameraError::Unavailable(e.to_string()))?;

        let ictx = open_input(uri, format).map_err(|e| open_error(uri, format, e))?;

        let negotiation = |e: ffmpeg_next::Error| CameraError::Negotiation(e.to_string());
        let stream = ictx
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or_else(|| CameraError::Negotiation(format!("{uri}: no video stream")))?;
        let stream_index = stream.index();
        let codec_ctx = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())
            .map_err(negotiation)?;
        let decoder = codec_ctx.decoder().video().map_err(negotiation)?;

        let width = decoder.width();
        let height = decoder.height();
        if width == 0 || height == 0 {
            return Err(CameraError::Negotiation(format!(
                "{uri}: stream reports zero dimensions"
            )));
        }

        let scaler = ffmpeg_next::software::scaling::Context::get(
            decoder.format(),
            width,
            height,
            ffmpeg_next::format::Pixel::RGBA,
            width,
            height,
            ffmpeg_next::software::scaling::Flags::BILINEAR,
        )
        .map_err(negotiation)?;

        Ok(Self {
            ictx,
            decoder,
            scaler,
            stream_index,
            width,
            height,
            frame_index: 0,
            flushing: false,
        })
    }

    /// Blocks until the next decoded frame. `Ok(None)` at end of stream.
    fn next_frame(&mut self) -> Result<Option<Frame>, ffmpeg_next::Error> {
        loop {
            if let Some(frame) = self.try_receive()? {
                return Ok(Some(frame));
            }
            if self.flushing {
                return Ok(None);
            }

            match self.ictx.packets().next() {
                Some((stream, packet)) => {
                    if stream.index() != self.stream_index {
                        continue;
                    }
                    if let Err(e) = self.decoder.send_packet(&packet) {
                        log::debug!("Dropping undecodable packet: {e}");
                    }
                }
                None => {
                    let _ = self.decoder.send_eof();
                    self.flushing = true;
                }
            }
        }
    }

    fn try_receive(&mut self) -> Result<Option<Frame>, ffmpeg_next::Error> {
        let mut decoded = ffmpeg_next::util::frame::video::Video::empty();
        if self.decoder.receive_frame(&mut decoded).is_err() {
            return Ok(None);
        }
        let mut rgba = ffmpeg_next::util::frame::video::Video::empty();
        self.scaler.run(&decoded, &mut rgba)?;

        let pixels = extract_rgba_pixels(&rgba, self.width, self.height);
        let frame = Frame::new(pixels, self.width, self.height, 4, self.frame_index);
        self.frame_index += 1;
        Ok(Some(frame))
    }
}

fn open_input(
    uri: &str,
    format: Option<&str>,
) -> Result<ffmpeg_next::format::context::Input, ffmpeg_next::Error> {
    let Some(name) = format else {
        return ffmpeg_next::format::input(&uri);
    };

    ffmpeg_next::device::register_all();
    let input_format = find_input_format(name).ok_or(ffmpeg_next::Error::DemuxerNotFound)?;
    let ctx = ffmpeg_next::format::open_with(&uri, &input_format, ffmpeg_next::Dictionary::new())?;
    Ok(ctx.input())
}

/// Looks up a demuxer or capture device format by its short name.
fn find_input_format(name: &str) -> Option<ffmpeg_next::format::format::Format> {
    let name = CString::new(name).ok()?;
    // Safety: `name` is NUL-terminated and outlives the call; the returned
    // pointer refers to a static libavformat table entry.
    let ptr = unsafe { ffmpeg_next::ffi::av_find_input_format(name.as_ptr()) };
    if ptr.is_null() {
        return None;
    }
    let input = unsafe { ffmpeg_next::format::format::Input::wrap(ptr as *mut _) };
    Some(ffmpeg_next::format::format::Format::Input(input))
}

/// Copies an RGBA ffmpeg frame into a tightly packed buffer, dropping row
/// padding.
fn extract_rgba_pixels(
    frame: &ffmpeg_next::util::frame::video::Video,
    width: u32,
    height: u32,
) -> Vec<u8> {
    let stride = frame.stride(0);
    let data = frame.data(0);
    let row_bytes = width as usize * 4;

    let mut pixels = Vec::with_capacity(row_bytes * height as usize);
    for row in 0..height as usize {
        let start = row * stride;
        pixels.extend_from_slice(&data[start..start + row_bytes]);
    }
    pixels
}
