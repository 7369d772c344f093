pub const DEFAULT_SOURCE_URL_TEMPLATE: &str = "https://picsum.photos/id/{id}/640/480";

/// Placeholder replaced with the navigator id when building remote URLs.
pub const URL_TEMPLATE_PLACEHOLDER: &str = "{id}";

pub const DEFAULT_STROKE_STYLE: &str = "yellow";
pub const DEFAULT_LINE_WIDTH: u32 = 10;

pub const DEFAULT_TARGET_WIDTH: u32 = 640;
pub const DEFAULT_TARGET_HEIGHT: u32 = 480;

pub const BLAZEFACE_MODEL_NAME: &str = "blazeface.onnx";

pub const NAVIGATOR_MIN: i64 = 0;
pub const NAVIGATOR_MAX: i64 = 9_999_999;

pub const CONFIG_DIR_NAME: &str = "FaceDetector";
pub const CONFIG_FILE_NAME: &str = "config.json";
