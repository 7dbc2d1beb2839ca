//! Screenshot annotation for human review of grounding results
//!
//! Draws a ring and crosshair at the grounded point, with a caption and the coordinates
//! underneath. Text is rendered with the first system font found; without one only the
//! shapes are drawn.

use crate::AnnotateError;
use ab_glyph::FontVec;
use image::{Rgba, RgbaImage};
use imageproc::drawing::{
    draw_filled_rect_mut, draw_hollow_circle_mut, draw_line_segment_mut, draw_text_mut, text_size,
};
use imageproc::rect::Rect;
use once_cell::sync::Lazy;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

const FONT_PATHS: [&str; 4] = [
    "C:\\Windows\\Fonts\\arial.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/System/Library/Fonts/Arial.ttf",
];

static SYSTEM_FONT: Lazy<Option<FontVec>> = Lazy::new(|| {
    for path in FONT_PATHS {
        if let Ok(data) = std::fs::read(path) {
            if let Ok(font) = FontVec::try_from_vec(data) {
                debug!("Loaded annotation font: {}", path);
                return Some(font);
            }
        }
    }
    debug!("No system font found, annotation text will be skipped");
    None
});

const LABEL_FG: Rgba<u8> = Rgba([255, 255, 255, 255]);
const COORD_FG: Rgba<u8> = Rgba([255, 255, 0, 255]);
const TEXT_BG: Rgba<u8> = Rgba([0, 0, 0, 255]);

#[derive(Debug, Clone)]
pub struct AnnotationStyle {
    pub color: Rgba<u8>,
    pub radius: i32,
    /// Ring thickness in pixels
    pub thickness: i32,
    pub font_scale: f32,
}

impl Default for AnnotationStyle {
    fn default() -> Self {
        Self {
            color: Rgba([0, 255, 0, 255]),
            radius: 40,
            thickness: 3,
            font_scale: 20.0,
        }
    }
}

/// `<dir>/<stem>_annotated.<ext>` next to the original screenshot.
pub fn default_output_path(screenshot: &Path) -> PathBuf {
    let stem = screenshot
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "screenshot".to_string());
    let ext = screenshot
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_else(|| "png".to_string());
    screenshot.with_file_name(format!("{stem}_annotated.{ext}"))
}

/// Output path for a deliverable screenshot of the icon at `position` (e.g. "top-left").
pub fn deliverable_path(output_dir: &Path, position: &str) -> PathBuf {
    output_dir.join(format!("notepad_detected_{position}.png"))
}

/// Caption drawn on a deliverable screenshot, e.g. `Notepad - top-left`.
pub fn deliverable_caption(label: &str, position: &str) -> String {
    format!("{label} - {position}")
}

/// Mark `(x, y)` on the screenshot and save the result.
#[instrument(skip(screenshot, output, style), fields(image = %screenshot.display()))]
pub fn annotate_screenshot(
    screenshot: &Path,
    x: i32,
    y: i32,
    label: &str,
    output: Option<&Path>,
    style: &AnnotationStyle,
) -> Result<PathBuf, AnnotateError> {
    let output = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| default_output_path(screenshot));

    let mut img = image::open(screenshot)
        .map_err(|source| AnnotateError::Open {
            path: screenshot.to_path_buf(),
            source,
        })?
        .to_rgba8();

    draw_marker(&mut img, x, y, style);
    if let Some(font) = SYSTEM_FONT.as_ref() {
        let left = x - style.radius;
        let label_y = y + style.radius + 15;
        draw_caption(&mut img, font, style.font_scale, left, label_y, label, LABEL_FG);
        let coords = format!("({x}, {y})");
        draw_caption(&mut img, font, style.font_scale, left, label_y + 25, &coords, COORD_FG);
    }

    img.save(&output).map_err(|source| AnnotateError::Save {
        path: output.clone(),
        source,
    })?;
    info!("Annotated screenshot: {}", output.display());
    Ok(output)
}

fn draw_marker(img: &mut RgbaImage, x: i32, y: i32, style: &AnnotationStyle) {
    for t in 0..style.thickness.max(1) {
        draw_hollow_circle_mut(img, (x, y), style.radius + t, style.color);
    }

    let reach = (style.radius + 10) as f32;
    let (fx, fy) = (x as f32, y as f32);
    for d in [-1.0, 0.0, 1.0] {
        draw_line_segment_mut(img, (fx - reach, fy + d), (fx + reach, fy + d), style.color);
        draw_line_segment_mut(img, (fx + d, fy - reach), (fx + d, fy + reach), style.color);
    }
}

fn draw_caption(
    img: &mut RgbaImage,
    font: &FontVec,
    scale: f32,
    x: i32,
    y: i32,
    text: &str,
    fg: Rgba<u8>,
) {
    let (w, h) = text_size(scale, font, text);
    let background = Rect::at(x - 3, y - 3).of_size(w + 6, h + 6);
    draw_filled_rect_mut(img, background, TEXT_BG);
    draw_text_mut(img, fg, x, y, scale, font, text);
}
