use crate::{DetectionError, RawText};
use image::DynamicImage;

pub mod tesseract;

pub use tesseract::{Granularity, TesseractConfig, TesseractEngine};

/// The common trait that all OCR backends must implement.
///
/// Implementations are expected to be read-only after construction so a single instance can
/// serve every detection call for the lifetime of the process.
pub trait RecognitionEngine: Send + Sync {
    /// Recognize every piece of text in the image, in the engine's reading order.
    fn recognize(&self, image: &DynamicImage) -> Result<Vec<RawText>, DetectionError>;

    /// Short backend name used in logs
    fn name(&self) -> &str {
        "unknown"
    }
}
