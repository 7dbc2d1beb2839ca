use glance::engines::TesseractConfig;
use glance::{
    CaptureError, DetectionError, Glance, GroundingError, GroundingService, RawText,
    RecognitionEngine, RetryPolicy, TextDetector,
};
use image::{DynamicImage, RgbImage};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Engine that reports captions only from its `visible_from`-th call onward.
struct SlowDesktop {
    visible_from: usize,
    calls: AtomicUsize,
}

impl RecognitionEngine for SlowDesktop {
    fn recognize(&self, _image: &DynamicImage) -> Result<Vec<RawText>, DetectionError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.visible_from {
            return Ok(vec![box_text("Recycle Bin", 15.0, 100.0, 70.0, 15.0)]);
        }
        Ok(vec![
            box_text("Recycle Bin", 15.0, 100.0, 70.0, 15.0),
            box_text("Notepad", 100.0, 200.0, 50.0, 20.0),
        ])
    }

    fn name(&self) -> &str {
        "slow-desktop"
    }
}

fn box_text(text: &str, left: f64, top: f64, width: f64, height: f64) -> RawText {
    RawText {
        polygon: vec![
            (left, top),
            (left + width, top),
            (left + width, top + height),
            (left, top + height),
        ],
        text: text.to_string(),
        confidence: 0.9,
    }
}

fn write_screenshot(dir: &Path) -> PathBuf {
    let path = dir.join("desktop.png");
    DynamicImage::ImageRgb8(RgbImage::new(32, 32))
        .save(&path)
        .unwrap();
    path
}

fn glance_with(engine: SlowDesktop) -> Glance {
    Glance::new(GroundingService::new(TextDetector::with_engine(Arc::new(
        engine,
    ))))
}

#[test]
fn test_icon_appears_after_retries() {
    let dir = tempfile::tempdir().unwrap();
    let screenshot = write_screenshot(dir.path());
    let glance = glance_with(SlowDesktop {
        visible_from: 2,
        calls: AtomicUsize::new(0),
    });

    let captures = Mutex::new(0);
    let mut capture = || -> Result<PathBuf, CaptureError> {
        *captures.lock().unwrap() += 1;
        Ok(screenshot.clone())
    };

    let policy = RetryPolicy::new(3, Duration::ZERO).unwrap();
    let acquisition = glance
        .acquire_detailed(&mut capture, "notepad", policy)
        .unwrap();

    assert_eq!(acquisition.attempts, 3);
    assert_eq!(acquisition.result.coordinates(), (125, 165));
    assert_eq!(acquisition.result.matched_text, "Notepad");
    assert_eq!(*captures.lock().unwrap(), 3);
}

#[test]
fn test_icon_never_appears() {
    let dir = tempfile::tempdir().unwrap();
    let screenshot = write_screenshot(dir.path());
    let glance = glance_with(SlowDesktop {
        visible_from: usize::MAX,
        calls: AtomicUsize::new(0),
    });

    let mut capture = || -> Result<PathBuf, CaptureError> { Ok(screenshot.clone()) };
    let policy = RetryPolicy::new(2, Duration::ZERO).unwrap();
    let err = glance.acquire(&mut capture, "Notepad", policy).unwrap_err();

    assert!(matches!(err, GroundingError::NoMatch(_)));
    assert_eq!(err.available_labels(), ["Recycle Bin"]);
}

#[test]
fn test_missing_tesseract_surfaces_on_first_use() {
    let dir = tempfile::tempdir().unwrap();
    let screenshot = write_screenshot(dir.path());
    let service = GroundingService::tesseract(TesseractConfig {
        binary: "definitely-not-a-tesseract-binary".into(),
        ..Default::default()
    });
    assert!(!service.detector().is_initialized());

    let err = service.ground(&screenshot, "Notepad").unwrap_err();
    assert!(matches!(
        err,
        GroundingError::Detection(DetectionError::EngineInit(_))
    ));
}

/// Needs a local tesseract install.
#[test]
#[ignore]
fn test_real_tesseract_on_blank_image_finds_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let screenshot = write_screenshot(dir.path());
    let service = GroundingService::tesseract(TesseractConfig::default());

    let err = service.ground(&screenshot, "Notepad").unwrap_err();
    assert!(matches!(err, GroundingError::EmptyScene));
}
