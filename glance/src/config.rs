//! Process-wide settings read from environment variables

use crate::acquisition::RetryPolicy;
use crate::engines::TesseractConfig;
use crate::types::DEFAULT_ICON_OFFSET;
use crate::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub screen_width: u32,
    pub screen_height: u32,
    /// Where saved posts end up
    pub output_dir: PathBuf,
    pub screenshots_dir: PathBuf,
    pub max_retries: u32,
    /// Base backoff delay in seconds
    pub retry_delay: f64,
    pub icon_offset: i32,
    pub tesseract_cmd: String,
    pub ocr_language: String,
}

impl Config {
    /// Read settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through `lookup`, falling back to defaults for absent keys.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let home = lookup("HOME")
            .or_else(|| lookup("USERPROFILE"))
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        let output_name = lookup("OUTPUT_DIR").unwrap_or_else(|| "tjm-project".to_string());
        let screenshots_dir = lookup("SCREENSHOTS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("screenshots"));

        Ok(Self {
            screen_width: parse(&lookup, "SCREEN_WIDTH", 1920)?,
            screen_height: parse(&lookup, "SCREEN_HEIGHT", 1080)?,
            output_dir: home.join("Desktop").join(output_name),
            screenshots_dir,
            max_retries: parse(&lookup, "MAX_RETRIES", 3)?,
            retry_delay: parse(&lookup, "RETRY_DELAY", 1.0)?,
            icon_offset: parse(&lookup, "GLANCE_ICON_OFFSET", DEFAULT_ICON_OFFSET)?,
            tesseract_cmd: lookup("TESSERACT_CMD").unwrap_or_else(|| "tesseract".to_string()),
            ocr_language: lookup("OCR_LANG").unwrap_or_else(|| "eng".to_string()),
        })
    }

    /// Whether a live `(width, height)` agrees with the configured resolution.
    pub fn matches_resolution(&self, (width, height): (u32, u32)) -> bool {
        (width, height) == (self.screen_width, self.screen_height)
    }

    pub fn retry_policy(&self) -> Result<RetryPolicy, ConfigError> {
        RetryPolicy::from_secs_f64(self.max_retries, self.retry_delay)
    }

    pub fn tesseract(&self) -> TesseractConfig {
        TesseractConfig {
            binary: self.tesseract_cmd.clone(),
            language: self.ocr_language.clone(),
            ..Default::default()
        }
    }

    /// Create the output and screenshot directories if they do not exist.
    pub fn ensure_dirs(&self) -> Result<(), ConfigError> {
        create_dir(&self.output_dir)?;
        create_dir(&self.screenshots_dir)
    }
}

fn create_dir(path: &Path) -> Result<(), ConfigError> {
    std::fs::create_dir_all(path).map_err(|source| ConfigError::CreateDir {
        path: path.to_path_buf(),
        source,
    })
}

fn parse<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { key, value }),
    }
}
