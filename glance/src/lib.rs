//! Desktop UI grounding through on-screen text
//!
//! This crate locates desktop elements by recognizing their captions in a screenshot and
//! inferring a click target from the caption's position. Recognition results vary from run
//! to run, so acquisition re-captures and re-grounds with exponential backoff until the
//! element is found or the retry budget is spent.

use std::path::Path;
use std::sync::Arc;
use tracing::instrument;

pub mod acquisition;
pub mod anchor;
pub mod annotate;
pub mod capture;
pub mod config;
pub mod detector;
pub mod engines;
pub mod errors;
pub mod grounding;
pub mod input;
pub mod matcher;
#[cfg(test)]
mod tests;
pub mod types;

pub use acquisition::{Acquisition, AcquisitionLoop, RetryPolicy, Sleeper, ThreadSleeper};
pub use anchor::IconAnchorResolver;
pub use capture::{ImageSource, ScreenCapture};
pub use config::Config;
pub use detector::TextDetector;
pub use engines::RecognitionEngine;
pub use errors::{
    AnnotateError, CaptureError, ConfigError, DetectionError, GroundingError, InputError,
    NoMatchError,
};
pub use grounding::{Grounder, GroundingService};
pub use matcher::{LabelMatcher, MatchKind};
pub use types::{GroundingResult, RawText, TextFragment, DEFAULT_ICON_OFFSET};

/// The main entry point for grounding named elements on the desktop
#[derive(Clone)]
pub struct Glance {
    service: Arc<GroundingService>,
}

impl Glance {
    pub fn new(service: GroundingService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }

    /// Build from configuration: a Tesseract engine that loads on first use and the
    /// configured icon offset.
    pub fn from_config(config: &Config) -> Self {
        let service = GroundingService::tesseract(config.tesseract())
            .with_resolver(IconAnchorResolver::with_offset(config.icon_offset));
        Self::new(service)
    }

    pub fn service(&self) -> &GroundingService {
        &self.service
    }

    /// Resolve `label` to a click coordinate in the screenshot at `image_path`.
    #[instrument(skip(self, image_path))]
    pub fn ground_icon(
        &self,
        image_path: &Path,
        label: &str,
    ) -> Result<GroundingResult, GroundingError> {
        self.service.ground(image_path, label)
    }

    /// Capture and ground `label` until it is found or `policy` is exhausted.
    #[instrument(skip(self, capture, policy))]
    pub fn acquire<I: ImageSource + ?Sized>(
        &self,
        capture: &mut I,
        label: &str,
        policy: RetryPolicy,
    ) -> Result<GroundingResult, GroundingError> {
        AcquisitionLoop::new(self.service.as_ref(), policy).acquire(capture, label)
    }

    /// Like [`Glance::acquire`], also reporting the screenshot and attempt count.
    pub fn acquire_detailed<I: ImageSource + ?Sized>(
        &self,
        capture: &mut I,
        label: &str,
        policy: RetryPolicy,
    ) -> Result<Acquisition, GroundingError> {
        AcquisitionLoop::new(self.service.as_ref(), policy).acquire_detailed(capture, label)
    }
}
