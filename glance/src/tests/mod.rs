
use crate::engines::RecognitionEngine;
use crate::{DetectionError, RawText};
use image::{DynamicImage, Rgba, RgbaImage};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

// Initialize tracing for tests
pub fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};
    let _ = fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::DEBUG.into()))
        .with_target(true)
        .with_test_writer()
        .try_init();
}

/// Writes a small blank PNG the detector can decode.
pub fn blank_png(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    RgbaImage::from_pixel(64, 48, Rgba([255, 255, 255, 255]))
        .save(&path)
        .unwrap();
    path
}

pub fn caption(text: &str, left: f64, top: f64, width: f64, height: f64, conf: f64) -> RawText {
    RawText {
        polygon: vec![
            (left, top),
            (left + width, top),
            (left + width, top + height),
            (left, top + height),
        ],
        text: text.to_string(),
        confidence: conf,
    }
}

/// Engine that replays a fixed script of responses, then repeats the last one.
pub struct ScriptedEngine {
    script: Mutex<VecDeque<Result<Vec<RawText>, String>>>,
    calls: AtomicUsize,
}

impl ScriptedEngine {
    pub fn new(script: Vec<Result<Vec<RawText>, String>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn always(detections: Vec<RawText>) -> Self {
        Self::new(vec![Ok(detections)])
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl RecognitionEngine for ScriptedEngine {
    fn recognize(&self, _image: &DynamicImage) -> Result<Vec<RawText>, DetectionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut script = self.script.lock().unwrap();
        let next = if script.len() > 1 {
            script.pop_front()
        } else {
            script.front().cloned()
        };
        match next {
            Some(Ok(detections)) => Ok(detections),
            Some(Err(message)) => Err(DetectionError::Recognition(message)),
            None => Ok(Vec::new()),
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
