use crate::engines::RecognitionEngine;
use crate::{DetectionError, TextFragment};
use once_cell::sync::OnceCell;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

type EngineLoader =
    Box<dyn Fn() -> Result<Arc<dyn RecognitionEngine>, DetectionError> + Send + Sync>;

/// Turns images into [`TextFragment`]s through a lazily initialized recognition engine.
///
/// The engine is built on the first call to [`TextDetector::detect`] and reused for every
/// call after that. A failed initialization is not cached, so the next call tries again.
pub struct TextDetector {
    engine: OnceCell<Arc<dyn RecognitionEngine>>,
    loader: EngineLoader,
}

impl TextDetector {
    /// Create a detector whose engine is built on first use.
    pub fn new<F>(loader: F) -> Self
    where
        F: Fn() -> Result<Arc<dyn RecognitionEngine>, DetectionError> + Send + Sync + 'static,
    {
        Self {
            engine: OnceCell::new(),
            loader: Box::new(loader),
        }
    }

    /// Create a detector around an engine that is already initialized.
    pub fn with_engine(engine: Arc<dyn RecognitionEngine>) -> Self {
        let cell = OnceCell::new();
        let _ = cell.set(engine);
        Self {
            engine: cell,
            loader: Box::new(|| {
                Err(DetectionError::EngineInit(
                    "engine was supplied pre-initialized".into(),
                ))
            }),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.engine.get().is_some()
    }

    /// Returns the engine, initializing it if this is the first use.
    pub fn engine(&self) -> Result<&Arc<dyn RecognitionEngine>, DetectionError> {
        self.engine.get_or_try_init(|| {
            let engine = (self.loader)().inspect_err(|e| {
                warn!("OCR engine initialization failed: {}", e);
            })?;
            info!(engine = engine.name(), "OCR engine initialized");
            Ok(engine)
        })
    }

    /// Recognize all text in the image file at `image_path`.
    #[instrument(level = "debug", skip(self, image_path), fields(image = %image_path.display()))]
    pub fn detect(&self, image_path: &Path) -> Result<Vec<TextFragment>, DetectionError> {
        let image = image::open(image_path).map_err(|source| DetectionError::UnreadableImage {
            path: image_path.to_path_buf(),
            source,
        })?;

        let engine = self.engine()?;
        let raw = engine.recognize(&image)?;
        let fragments: Vec<TextFragment> =
            raw.into_iter().filter_map(TextFragment::from_raw).collect();

        debug!(count = fragments.len(), "Detected text fragments");
        Ok(fragments)
    }
}

impl fmt::Debug for TextDetector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextDetector")
            .field("initialized", &self.is_initialized())
            .finish()
    }
}
