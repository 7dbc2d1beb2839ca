use crate::anchor::IconAnchorResolver;
use crate::detector::TextDetector;
use crate::engines::{RecognitionEngine, TesseractConfig, TesseractEngine};
use crate::matcher::LabelMatcher;
use crate::{GroundingError, GroundingResult};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, instrument};

/// Number of labels echoed to the log when a scan completes.
const LOGGED_LABELS: usize = 15;

/// A single grounding attempt against one screenshot.
pub trait Grounder {
    fn ground(&self, image_path: &Path, target: &str) -> Result<GroundingResult, GroundingError>;
}

/// Locates a named element in a screenshot: detect, match, then anchor.
///
/// A single call is one grounding attempt. Failures are returned as they happen; retrying is
/// left to [`crate::AcquisitionLoop`].
#[derive(Debug)]
pub struct GroundingService {
    detector: TextDetector,
    matcher: LabelMatcher,
    resolver: IconAnchorResolver,
}

impl GroundingService {
    pub fn new(detector: TextDetector) -> Self {
        Self {
            detector,
            matcher: LabelMatcher::new(),
            resolver: IconAnchorResolver::new(),
        }
    }

    /// Service backed by a Tesseract engine that loads on the first grounding call.
    pub fn tesseract(config: TesseractConfig) -> Self {
        Self::new(TextDetector::new(move || {
            let engine: Arc<dyn RecognitionEngine> = Arc::new(TesseractEngine::new(config.clone())?);
            Ok(engine)
        }))
    }

    pub fn with_resolver(mut self, resolver: IconAnchorResolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn detector(&self) -> &TextDetector {
        &self.detector
    }

    pub fn resolver(&self) -> &IconAnchorResolver {
        &self.resolver
    }

    /// Find the icon captioned `target` in the screenshot at `image_path`.
    #[instrument(skip(self, image_path), fields(image = %image_path.display()))]
    pub fn ground(&self, image_path: &Path, target: &str) -> Result<GroundingResult, GroundingError> {
        info!("OCR scanning for '{}'...", target);

        let fragments = self.detector.detect(image_path)?;
        if fragments.is_empty() {
            return Err(GroundingError::EmptyScene);
        }

        let labels: Vec<&str> = fragments
            .iter()
            .take(LOGGED_LABELS)
            .map(|f| f.text.as_str())
            .collect();
        info!(
            "Found {} labels: {:?}{}",
            fragments.len(),
            labels,
            if fragments.len() > LOGGED_LABELS { "..." } else { "" }
        );

        let matched = self.matcher.find(&fragments, target)?;
        let (x, y) = self.resolver.resolve(matched);
        info!("Found '{}' -> icon at ({}, {})", matched.text, x, y);

        Ok(GroundingResult {
            x,
            y,
            confidence: matched.confidence,
            matched_text: matched.text.clone(),
        })
    }
}

impl Grounder for GroundingService {
    fn ground(&self, image_path: &Path, target: &str) -> Result<GroundingResult, GroundingError> {
        GroundingService::ground(self, image_path, target)
    }
}
