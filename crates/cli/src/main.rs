use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use face_detector_core::detection::infrastructure::onnx_blazeface_model::OnnxModelLoader;
use face_detector_core::events::domain::event_emitter::EventEmitter;
use face_detector_core::events::domain::pipeline_event::PipelineEvent;
use face_detector_core::events::infrastructure::log_event_emitter::LogEventEmitter;
use face_detector_core::pipeline::face_detector_pipeline::{
    CycleReport, FaceDetectorPipeline, StreamOutcome,
};
use face_detector_core::shared::configuration::Configuration;
use face_detector_core::source::domain::media_source::MediaSource;
use face_detector_core::source::infrastructure::ffmpeg_camera::FfmpegCameraProvider;
use face_detector_core::source::infrastructure::http_image_fetcher::HttpImageFetcher;

/// Detect faces in remote images, dropped files or a live camera.
#[derive(Parser, Debug)]
#[command(name = "face-detector", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Config file (default: <config dir>/FaceDetector/config.json).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// BlazeFace ONNX model, overrides inferenceBackendPath.
    #[arg(long, global = true)]
    model: Option<PathBuf>,

    /// Write the annotated surface to this PNG after the last cycle.
    #[arg(long, global = true)]
    output: Option<PathBuf>,

    /// Box color: a named color or #rgb / #rrggbb / #rrggbbaa.
    #[arg(long, global = true)]
    stroke_style: Option<String>,

    /// Box stroke width in pixels.
    #[arg(long, global = true)]
    line_width: Option<u32>,

    /// Video output width; height follows the stream's aspect ratio.
    #[arg(long, global = true)]
    target_width: Option<u32>,

    #[arg(long, global = true)]
    target_height: Option<u32>,

    /// Remote image URL template; `{id}` is replaced with the page id.
    #[arg(long, global = true)]
    url_template: Option<String>,

    /// Face detection confidence threshold (0.0-1.0).
    #[arg(long, global = true)]
    confidence: Option<f64>,

    /// Print every event to stdout as a JSON line.
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Detect faces in an image fetched from a URL (http, https or file).
    Image { url: String },

    /// Detect faces in a local image file, handled like a dropped file.
    File {
        path: PathBuf,

        /// MIME type of the file; sniffed from the content when omitted.
        #[arg(long)]
        mime: Option<String>,
    },

    /// Detect faces in the remote image for a page id.
    Page {
        /// Page id (default: the lower navigator bound).
        #[arg(long)]
        id: Option<i64>,

        /// Step forward from the id, wrapping at the upper bound.
        #[arg(long, conflicts_with = "prev")]
        next: bool,

        /// Step back from the id, wrapping at the lower bound.
        #[arg(long)]
        prev: bool,
    },

    /// Run continuous detection on a camera or video stream.
    Camera {
        /// Device or URL, e.g. /dev/video0.
        uri: String,

        /// ffmpeg input format, e.g. v4l2, avfoundation or dshow.
        #[arg(long)]
        format: Option<String>,

        /// Stop after this many frames.
        #[arg(long)]
        max_ticks: Option<u64>,
    },
}

/// Logs every event and, with `--json`, echoes it to stdout.
struct CliEventEmitter {
    log: LogEventEmitter,
    json: bool,
}

impl EventEmitter for CliEventEmitter {
    fn emit(&self, event: PipelineEvent) {
        if self.json {
            match serde_json::to_string(&event) {
                Ok(line) => println!("{line}"),
                Err(e) => log::warn!("Failed to serialize event: {e}"),
            }
        }
        self.log.emit(event);
    }
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = build_config(&cli)?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(execute(cli, config))
}

async fn execute(cli: Cli, config: Configuration) -> Result<(), Box<dyn std::error::Error>> {
    let emitter = Arc::new(CliEventEmitter {
        log: LogEventEmitter::new(),
        json: cli.json,
    });
    let fetcher = Arc::new(HttpImageFetcher::new()?);
    let confidence = config.detection_confidence;
    let mut pipeline = FaceDetectorPipeline::new(config, fetcher, emitter.clone())?;
    pipeline.load_model(&OnnxModelLoader::new(confidence)).await?;

    let result = match cli.command {
        Command::Image { url } => pipeline
            .process(MediaSource::remote(url))
            .await
            .map(|report| print_report(&report, cli.json)),
        Command::File { path, mime } => {
            let bytes = tokio::fs::read(&path)
                .await
                .map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
            pipeline
                .drop_file(bytes, mime)
                .await
                .map(|report| print_report(&report, cli.json))
        }
        Command::Page { id, next, prev } => {
            let start = id.unwrap_or(pipeline.navigator().min());
            let report = if next {
                pipeline.seek(start);
                pipeline.next_remote().await
            } else if prev {
                pipeline.seek(start);
                pipeline.previous_remote().await
            } else {
                pipeline.load_remote(start).await
            };
            log::info!("Page id {}", pipeline.navigator().current());
            report.map(|report| print_report(&report, cli.json))
        }
        Command::Camera {
            uri,
            format,
            max_ticks,
        } => {
            let camera = FfmpegCameraProvider::new(uri, format);
            match pipeline.start_video(&camera).await? {
                StreamOutcome::NotStreaming { cause } => {
                    emitter.log.summary();
                    return Err(format!("Camera unavailable: {cause}").into());
                }
                StreamOutcome::Streaming(geometry) => {
                    log::info!(
                        "Streaming at {}x{}, press Ctrl-C to stop",
                        geometry.output_width,
                        geometry.output_height
                    );
                }
            }

            let handle = pipeline.capture_handle();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    handle.stop();
                }
            });

            pipeline.run_capture(max_ticks).await.map(|summary| {
                if !cli.json {
                    println!(
                        "{} frame(s) processed, {} face(s) detected",
                        summary.ticks, summary.faces
                    );
                }
            })
        }
    };

    emitter.log.summary();
    result?;

    if let Some(output) = &cli.output {
        pipeline.surface().save(output)?;
        log::info!("Wrote {}", output.display());
    }
    Ok(())
}

/// Loads the config file, then applies command-line overrides.
fn build_config(cli: &Cli) -> Result<Configuration, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => Configuration::load(path)?,
        None => Configuration::load_default()?,
    };

    if let Some(model) = &cli.model {
        config.inference_backend_path = model.clone();
    }
    if let Some(stroke_style) = &cli.stroke_style {
        config.stroke_style = stroke_style.clone();
    }
    if let Some(line_width) = cli.line_width {
        config.line_width = line_width;
    }
    if let Some(target_width) = cli.target_width {
        config.target_width = target_width;
    }
    if let Some(target_height) = cli.target_height {
        config.target_height = target_height;
    }
    if let Some(template) = &cli.url_template {
        config.source_url_template = template.clone();
    }
    if let Some(confidence) = cli.confidence {
        config.detection_confidence = confidence;
    }

    config.validate()?;
    Ok(config)
}

fn print_report(report: &CycleReport, json: bool) {
    if json {
        return;
    }
    if report.rectangles.is_empty() {
        println!("No face detected");
        return;
    }
    for (rect, detection) in report.rectangles.iter().zip(&report.detections) {
        println!(
            "Face at {:?} (probability {:.2})",
            rect.as_array(),
            detection.probability
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_page_navigation() {
        let cli = Cli::try_parse_from(["face-detector", "page", "--id", "9999999", "--next"])
            .unwrap();
        assert!(matches!(
            cli.command,
            Command::Page {
                id: Some(9_999_999),
                next: true,
                prev: false
            }
        ));
    }

    #[test]
    fn test_next_and_prev_conflict() {
        assert!(Cli::try_parse_from(["face-detector", "page", "--next", "--prev"]).is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "face-detector",
            "camera",
            "/dev/video0",
            "--format",
            "v4l2",
            "--max-ticks",
            "5",
            "--json",
        ])
        .unwrap();
        assert!(cli.json);
        assert!(matches!(
            cli.command,
            Command::Camera { ref format, max_ticks: Some(5), .. } if format.as_deref() == Some("v4l2")
        ));
    }

    #[test]
    fn test_overrides_apply_over_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"strokeStyle": "red", "lineWidth": 4}"#).unwrap();

        let cli = Cli::try_parse_from([
            "face-detector",
            "image",
            "https://example.com/a.png",
            "--config",
            path.to_str().unwrap(),
            "--line-width",
            "2",
        ])
        .unwrap();
        let config = build_config(&cli).unwrap();

        assert_eq!(config.stroke_style, "red");
        assert_eq!(config.line_width, 2);
    }

    #[test]
    fn test_invalid_override_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{}").unwrap();

        let cli = Cli::try_parse_from([
            "face-detector",
            "image",
            "https://example.com/a.png",
            "--config",
            path.to_str().unwrap(),
            "--stroke-style",
            "chartreuse-ish",
        ])
        .unwrap();
        assert!(build_config(&cli).is_err());
    }
}
