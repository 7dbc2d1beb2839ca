use std::path::PathBuf;
use thiserror::Error;

/// The recognition engine could not turn an image into text fragments.
#[derive(Error, Debug)]
pub enum DetectionError {
    #[error("Failed to read image {path}: {source}")]
    UnreadableImage {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Recognition engine failed to initialize: {0}")]
    EngineInit(String),

    #[error("Recognition failed: {0}")]
    Recognition(String),

    #[error("Malformed recognition output: {0}")]
    MalformedOutput(String),
}

/// No detected fragment matched the requested label.
///
/// `available_labels` holds every fragment text in detector order, unmodified.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("'{target}' not found in detected text")]
pub struct NoMatchError {
    pub target: String,
    pub available_labels: Vec<String>,
}

#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("No monitor available for capture")]
    NoMonitor,

    #[error("Platform-specific capture error: {0}")]
    PlatformError(String),

    #[error("Failed to save screenshot to {path}: {source}")]
    Save {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// The unified failure of a single grounding attempt.
#[derive(Error, Debug)]
pub enum GroundingError {
    #[error("Screen capture failed: {0}")]
    Capture(#[from] CaptureError),

    #[error(transparent)]
    Detection(#[from] DetectionError),

    #[error("No text found in screenshot")]
    EmptyScene,

    #[error(transparent)]
    NoMatch(#[from] NoMatchError),
}

impl GroundingError {
    /// Labels observed during the failed attempt. Empty unless the failure was a miss.
    pub fn available_labels(&self) -> &[String] {
        match self {
            GroundingError::NoMatch(e) => &e.available_labels,
            _ => &[],
        }
    }
}

#[derive(Error, Debug)]
pub enum InputError {
    #[error("Failed to simulate input event: {0}")]
    Simulate(String),

    #[error("Clipboard error: {0}")]
    Clipboard(String),
}

#[derive(Error, Debug)]
pub enum AnnotateError {
    #[error("Failed to open screenshot {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Failed to save annotated screenshot {path}: {source}")]
    Save {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {key}: '{value}'")]
    InvalidValue { key: &'static str, value: String },

    #[error("Invalid retry policy: {0}")]
    InvalidRetryPolicy(String),

    #[error("Failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
