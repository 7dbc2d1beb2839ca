//! Tesseract backend driven through the `tesseract` command line tool
//!
//! The image is piped in as PNG and the word table is read back in TSV form, so no native
//! bindings are needed at build time. Only a `tesseract` binary on `PATH` (or configured via
//! [`TesseractConfig::binary`]) is required at run time.

use super::RecognitionEngine;
use crate::{DetectionError, RawText};
use image::{DynamicImage, ImageFormat};
use serde::Deserialize;
use std::io::{Cursor, Write};
use std::process::{Command, Stdio};
use tracing::{debug, info, instrument};

/// TSV rows at this level describe individual words.
const WORD_LEVEL: u32 = 5;

/// How recognized words are grouped into fragments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Granularity {
    /// One fragment per word
    Word,
    /// One fragment per text line, words joined by a single space
    #[default]
    Line,
}

#[derive(Debug, Clone)]
pub struct TesseractConfig {
    pub binary: String,
    pub language: String,
    /// Page segmentation mode. 11 ("sparse text") suits scattered desktop captions.
    pub page_segmentation_mode: u8,
    pub granularity: Granularity,
}

impl Default for TesseractConfig {
    fn default() -> Self {
        Self {
            binary: "tesseract".to_string(),
            language: "eng".to_string(),
            page_segmentation_mode: 11,
            granularity: Granularity::Line,
        }
    }
}

pub struct TesseractEngine {
    config: TesseractConfig,
    version: String,
}

impl TesseractEngine {
    /// Probe the configured binary and build an engine around it.
    #[instrument(skip(config), fields(binary = %config.binary))]
    pub fn new(config: TesseractConfig) -> Result<Self, DetectionError> {
        info!("Loading OCR engine (first time may take a moment)...");
        let output = Command::new(&config.binary)
            .arg("--version")
            .output()
            .map_err(|e| {
                DetectionError::EngineInit(format!(
                    "Failed to run '{}': {e}",
                    config.binary
                ))
            })?;

        if !output.status.success() {
            return Err(DetectionError::EngineInit(format!(
                "'{} --version' exited with {}",
                config.binary, output.status
            )));
        }

        // Older releases print the banner on stderr.
        let banner = if output.stdout.is_empty() {
            &output.stderr
        } else {
            &output.stdout
        };
        let version = String::from_utf8_lossy(banner)
            .lines()
            .next()
            .unwrap_or_default()
            .trim()
            .to_string();
        debug!(%version, "OCR engine ready");

        Ok(Self { config, version })
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn config(&self) -> &TesseractConfig {
        &self.config
    }
}

impl RecognitionEngine for TesseractEngine {
    #[instrument(level = "debug", skip(self, image), fields(width = image.width(), height = image.height()))]
    fn recognize(&self, image: &DynamicImage) -> Result<Vec<RawText>, DetectionError> {
        let mut png = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .map_err(|e| DetectionError::Recognition(format!("Failed to encode image: {e}")))?;

        let psm = self.config.page_segmentation_mode.to_string();
        let mut child = Command::new(&self.config.binary)
            .args([
                "stdin",
                "stdout",
                "-l",
                &self.config.language,
                "--psm",
                &psm,
                "tsv",
            ])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| DetectionError::Recognition(format!("Failed to spawn tesseract: {e}")))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| DetectionError::Recognition("tesseract stdin unavailable".into()))?;

        // Feed the image from a separate thread so a full stdout pipe cannot stall us.
        let output = std::thread::scope(|scope| {
            let writer = scope.spawn(move || stdin.write_all(&png));
            let output = child.wait_with_output();
            let written = writer
                .join()
                .unwrap_or_else(|_| Err(std::io::Error::other("stdin writer panicked")));
            output.and_then(|o| written.map(|_| o))
        })
        .map_err(|e| DetectionError::Recognition(format!("tesseract I/O failed: {e}")))?;

        if !output.status.success() {
            return Err(DetectionError::Recognition(format!(
                "tesseract exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let tsv = String::from_utf8_lossy(&output.stdout);
        parse_tsv(&tsv, self.config.granularity)
    }

    fn name(&self) -> &str {
        "tesseract"
    }
}

#[derive(Debug, Deserialize)]
struct TsvRow {
    level: u32,
    #[allow(dead_code)]
    page_num: u32,
    block_num: u32,
    par_num: u32,
    line_num: u32,
    #[allow(dead_code)]
    word_num: u32,
    left: i32,
    top: i32,
    width: i32,
    height: i32,
    conf: f64,
    #[serde(default)]
    text: String,
}

struct LineGroup {
    key: (u32, u32, u32),
    words: Vec<TsvRow>,
}

impl LineGroup {
    fn into_raw(self) -> RawText {
        let left = self.words.iter().map(|w| w.left).min().unwrap_or(0);
        let top = self.words.iter().map(|w| w.top).min().unwrap_or(0);
        let right = self
            .words
            .iter()
            .map(|w| w.left + w.width)
            .max()
            .unwrap_or(0);
        let bottom = self
            .words
            .iter()
            .map(|w| w.top + w.height)
            .max()
            .unwrap_or(0);
        let confidence =
            self.words.iter().map(|w| w.conf).sum::<f64>() / self.words.len().max(1) as f64;
        let text = self
            .words
            .iter()
            .map(|w| w.text.trim())
            .collect::<Vec<_>>()
            .join(" ");

        RawText {
            polygon: rect_polygon(left, top, right, bottom),
            text,
            confidence: confidence / 100.0,
        }
    }
}

fn rect_polygon(left: i32, top: i32, right: i32, bottom: i32) -> Vec<(f64, f64)> {
    let (l, t, r, b) = (left as f64, top as f64, right as f64, bottom as f64);
    vec![(l, t), (r, t), (r, b), (l, b)]
}

/// Parse `tesseract ... tsv` output into raw detections in reading order.
///
/// Rows above word level, rows with negative confidence, and blank words are skipped.
pub fn parse_tsv(tsv: &str, granularity: Granularity) -> Result<Vec<RawText>, DetectionError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .quoting(false)
        .flexible(true)
        .has_headers(true)
        .from_reader(tsv.as_bytes());

    let mut words = Vec::new();
    for row in reader.deserialize::<TsvRow>() {
        let row = row.map_err(|e| DetectionError::MalformedOutput(e.to_string()))?;
        if row.level != WORD_LEVEL || row.conf < 0.0 || row.text.trim().is_empty() {
            continue;
        }
        words.push(row);
    }

    let detections = match granularity {
        Granularity::Word => words
            .into_iter()
            .map(|w| RawText {
                polygon: rect_polygon(w.left, w.top, w.left + w.width, w.top + w.height),
                text: w.text.trim().to_string(),
                confidence: w.conf / 100.0,
            })
            .collect(),
        Granularity::Line => {
            let mut lines: Vec<LineGroup> = Vec::new();
            for word in words {
                let key = (word.block_num, word.par_num, word.line_num);
                match lines.last_mut() {
                    Some(line) if line.key == key => line.words.push(word),
                    _ => lines.push(LineGroup {
                        key,
                        words: vec![word],
                    }),
                }
            }
            lines.into_iter().map(LineGroup::into_raw).collect()
        }
    };

    Ok(detections)
}
