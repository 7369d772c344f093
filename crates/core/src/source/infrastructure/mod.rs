pub mod ffmpeg_camera;
pub mod http_image_fetcher;
pub mod image_decoder;
