//! Full-desktop screen capture

use crate::CaptureError;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, instrument};

/// Produces a freshly captured desktop image on every call.
pub trait ImageSource {
    fn capture(&mut self) -> Result<PathBuf, CaptureError>;
}

impl<F> ImageSource for F
where
    F: FnMut() -> Result<PathBuf, CaptureError>,
{
    fn capture(&mut self) -> Result<PathBuf, CaptureError> {
        self()
    }
}

/// Captures the primary monitor with `xcap` and saves it as PNG.
///
/// Successive captures are numbered `desktop_attempt_1.png`, `desktop_attempt_2.png`, ...
#[derive(Debug, Clone)]
pub struct ScreenCapture {
    output_dir: PathBuf,
    counter: u32,
}

impl ScreenCapture {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            counter: 0,
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Restart attempt numbering so the next capture overwrites `desktop_attempt_1.png`.
    pub fn reset(&mut self) {
        self.counter = 0;
    }

    fn next_attempt_name(&mut self) -> String {
        self.counter += 1;
        format!("desktop_attempt_{}.png", self.counter)
    }

    /// Capture the primary monitor into `output_dir/filename`.
    ///
    /// Without a filename a millisecond timestamp is used.
    #[instrument(skip(self))]
    pub fn capture_to(&self, filename: Option<&str>) -> Result<PathBuf, CaptureError> {
        std::fs::create_dir_all(&self.output_dir)?;

        let filename = match filename {
            Some(name) => name.to_string(),
            None => {
                let millis = SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .map(|d| d.as_millis())
                    .unwrap_or_default();
                format!("desktop_{millis}.png")
            }
        };
        let path = self.output_dir.join(filename);

        let monitor = primary_monitor()?;
        let image = monitor.capture_image().map_err(|e| {
            CaptureError::PlatformError(format!("Failed to capture primary monitor: {e}"))
        })?;
        image.save(&path).map_err(|source| CaptureError::Save {
            path: path.clone(),
            source,
        })?;

        debug!(
            width = image.width(),
            height = image.height(),
            "Saved screenshot to {}",
            path.display()
        );
        Ok(path)
    }
}

impl ImageSource for ScreenCapture {
    fn capture(&mut self) -> Result<PathBuf, CaptureError> {
        let name = self.next_attempt_name();
        self.capture_to(Some(&name))
    }
}

fn primary_monitor() -> Result<xcap::Monitor, CaptureError> {
    let monitors = xcap::Monitor::all()
        .map_err(|e| CaptureError::PlatformError(format!("Failed to get monitors: {e}")))?;

    let mut fallback = None;
    for monitor in monitors {
        if monitor.is_primary().unwrap_or(false) {
            return Ok(monitor);
        }
        if fallback.is_none() {
            fallback = Some(monitor);
        }
    }
    fallback.ok_or(CaptureError::NoMonitor)
}

/// Resolution of the primary monitor.
pub fn screen_size() -> Result<(u32, u32), CaptureError> {
    let monitor = primary_monitor()?;
    let width = monitor
        .width()
        .map_err(|e| CaptureError::PlatformError(format!("Failed to get monitor width: {e}")))?;
    let height = monitor
        .height()
        .map_err(|e| CaptureError::PlatformError(format!("Failed to get monitor height: {e}")))?;
    Ok((width, height))
}
