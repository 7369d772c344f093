use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::rendering::domain::color::{Color, ColorParseError};
use crate::shared::constants::{
    BLAZEFACE_MODEL_NAME, CONFIG_DIR_NAME, CONFIG_FILE_NAME, DEFAULT_LINE_WIDTH,
    DEFAULT_SOURCE_URL_TEMPLATE, DEFAULT_STROKE_STYLE, DEFAULT_TARGET_HEIGHT,
    DEFAULT_TARGET_WIDTH, NAVIGATOR_MAX, NAVIGATOR_MIN, URL_TEMPLATE_PLACEHOLDER,
};

/// Default BlazeFace confidence threshold.
pub const DEFAULT_DETECTION_CONFIDENCE: f64 = 0.5;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid stroke style: {0}")]
    StrokeStyle(#[from] ColorParseError),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Pipeline options. Immutable once a pipeline is constructed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Configuration {
    pub source_url_template: String,
    pub stroke_style: String,
    pub line_width: u32,
    pub target_width: u32,
    pub target_height: u32,
    pub inference_backend_path: PathBuf,
    pub detection_confidence: f64,
    pub navigator_min: i64,
    pub navigator_max: i64,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            source_url_template: DEFAULT_SOURCE_URL_TEMPLATE.to_string(),
            stroke_style: DEFAULT_STROKE_STYLE.to_string(),
            line_width: DEFAULT_LINE_WIDTH,
            target_width: DEFAULT_TARGET_WIDTH,
            target_height: DEFAULT_TARGET_HEIGHT,
            inference_backend_path: PathBuf::from("models").join(BLAZEFACE_MODEL_NAME),
            detection_confidence: DEFAULT_DETECTION_CONFIDENCE,
            navigator_min: NAVIGATOR_MIN,
            navigator_max: NAVIGATOR_MAX,
        }
    }
}

impl Configuration {
    /// `<config dir>/FaceDetector/config.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Loads and validates a config file. Missing keys take their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: Configuration =
            serde_json::from_str(&json).map_err(|e| ConfigError::Parse {
                path: path.to_path_buf(),
                source: e,
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Loads the file at [`Self::default_path`] if present, else defaults.
    pub fn load_default() -> Result<Self, ConfigError> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.line_width == 0 {
            return Err(ConfigError::Invalid("lineWidth must be positive".into()));
        }
        if self.source_url_template.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "sourceUrlTemplate must not be empty".into(),
            ));
        }
        if self.navigator_min > self.navigator_max {
            return Err(ConfigError::Invalid(format!(
                "navigatorMin ({}) must not exceed navigatorMax ({})",
                self.navigator_min, self.navigator_max
            )));
        }
        if !(0.0..=1.0).contains(&self.detection_confidence) {
            return Err(ConfigError::Invalid(format!(
                "detectionConfidence must be between 0.0 and 1.0, got {}",
                self.detection_confidence
            )));
        }
        self.stroke_color()?;
        Ok(())
    }

    pub fn stroke_color(&self) -> Result<Color, ColorParseError> {
        self.stroke_style.parse()
    }

    /// Builds the remote image URL for a navigator id.
    ///
    /// Every `{id}` is replaced; a template without one gets the id appended.
    pub fn source_url(&self, id: i64) -> String {
        if self.source_url_template.contains(URL_TEMPLATE_PLACEHOLDER) {
            self.source_url_template
                .replace(URL_TEMPLATE_PLACEHOLDER, &id.to_string())
        } else {
            format!("{}{id}", self.source_url_template)
        }
    }
}
