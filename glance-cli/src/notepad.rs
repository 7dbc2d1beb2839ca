//! Drives Notepad through the desktop: find its icon, open it, write a post, save, close

use crate::posts::Post;
use anyhow::{Context, Result};
use glance::input::{self, Key};
use glance::{Acquisition, Config, Glance, RetryPolicy, ScreenCapture};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;
use tracing::{info, instrument, warn};

pub const NOTEPAD_LABEL: &str = "Notepad";

const DESKTOP_SETTLE: Duration = Duration::from_millis(500);
const LAUNCH_WAIT: Duration = Duration::from_secs(2);
const SAVE_DIALOG_WAIT: Duration = Duration::from_secs(1);
const CLOSE_WAIT: Duration = Duration::from_millis(500);

/// Text written into the editor for a post.
pub fn post_content(post: &Post) -> String {
    format!("Title: {}\n\n{}", post.title, post.body)
}

/// Where a post is saved.
pub fn post_path(output_dir: &Path, post: &Post) -> PathBuf {
    output_dir.join(format!("post_{}.txt", post.id))
}

pub struct NotepadWorkflow {
    glance: Glance,
    policy: RetryPolicy,
    capture: ScreenCapture,
    output_dir: PathBuf,
}

impl NotepadWorkflow {
    pub fn new(glance: Glance, config: &Config) -> Result<Self> {
        config
            .ensure_dirs()
            .context("Failed to create output directories")?;
        Ok(Self {
            glance,
            policy: config.retry_policy()?,
            capture: ScreenCapture::new(&config.screenshots_dir),
            output_dir: config.output_dir.clone(),
        })
    }

    /// Show the desktop and locate the icon, retrying with fresh screenshots.
    #[instrument(skip(self))]
    pub fn locate(&mut self, label: &str) -> Result<Acquisition> {
        input::show_desktop()?;
        thread::sleep(DESKTOP_SETTLE);

        self.capture.reset();
        let acquisition = self
            .glance
            .acquire_detailed(&mut self.capture, label, self.policy)?;
        info!(
            "Found '{}' at ({}, {}) after {} attempt(s)",
            acquisition.result.matched_text,
            acquisition.result.x,
            acquisition.result.y,
            acquisition.attempts
        );
        Ok(acquisition)
    }

    /// Locate the icon and double-click it.
    #[instrument(skip(self))]
    pub fn launch(&mut self) -> Result<()> {
        let acquisition = self.locate(NOTEPAD_LABEL)?;
        let (x, y) = acquisition.result.coordinates();
        input::double_click(x, y)?;
        thread::sleep(LAUNCH_WAIT);
        Ok(())
    }

    /// Type the post into the open editor and save it, overwriting any previous copy.
    #[instrument(skip(self, post), fields(post_id = post.id))]
    pub fn write_post(&self, post: &Post) -> Result<PathBuf> {
        input::type_text(&post_content(post))?;

        input::hotkey(&[Key::ControlLeft, Key::KeyS])?;
        thread::sleep(SAVE_DIALOG_WAIT);

        let path = post_path(&self.output_dir, post);
        input::type_text(&path.to_string_lossy())?;
        input::press(Key::Return)?;
        thread::sleep(DESKTOP_SETTLE);

        // Confirm the overwrite prompt if one appeared.
        input::press(Key::LeftArrow)?;
        input::press(Key::Return)?;
        thread::sleep(DESKTOP_SETTLE);

        info!("Saved post {} to {}", post.id, path.display());
        Ok(path)
    }

    /// Close the editor, declining any save prompt.
    pub fn close(&self) -> Result<()> {
        input::hotkey(&[Key::Alt, Key::F4])?;
        thread::sleep(CLOSE_WAIT);
        input::press(Key::KeyN)?;
        thread::sleep(CLOSE_WAIT);
        Ok(())
    }

    /// Open, write, save and close for one post.
    pub fn process(&mut self, post: &Post) -> Result<PathBuf> {
        self.launch()
            .with_context(|| format!("Failed to open Notepad for post {}", post.id))?;
        let written = self.write_post(post);
        if let Err(e) = self.close() {
            warn!("Failed to close Notepad: {e}");
        }
        written
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post() -> Post {
        Post {
            id: 7,
            user_id: 1,
            title: "magnam facilis".into(),
            body: "quo et expedita\nmodi cum officia".into(),
        }
    }

    #[test]
    fn test_post_content_layout() {
        assert_eq!(
            post_content(&post()),
            "Title: magnam facilis\n\nquo et expedita\nmodi cum officia"
        );
    }

    #[test]
    fn test_post_path_uses_id() {
        assert_eq!(
            post_path(Path::new("/tmp/out"), &post()),
            PathBuf::from("/tmp/out/post_7.txt")
        );
    }
}
