//! Common value types shared by the grounding pipeline

use serde::{Deserialize, Serialize};

/// Empirical distance in pixels between a desktop icon glyph and the center of its caption.
///
/// Derived from a standard-DPI desktop; not validated against display scaling or large icon
/// sizes. Override through [`crate::IconAnchorResolver::with_offset`] when it does not hold.
pub const DEFAULT_ICON_OFFSET: i32 = 45;

/// One piece of text as reported by a recognition engine, before normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct RawText {
    /// Polygon vertices in image coordinates. Usually four corners, possibly skewed.
    pub polygon: Vec<(f64, f64)>,
    pub text: String,
    pub confidence: f64,
}

/// A recognized text fragment with an axis-aligned bounding box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextFragment {
    pub text: String,
    pub left: i32,
    pub top: i32,
    pub width: i32,
    pub height: i32,
    pub confidence: f64,
}

impl TextFragment {
    /// Normalizes an arbitrary polygon to the box spanned by its min/max on each axis.
    ///
    /// Returns `None` for a polygon without vertices.
    pub fn from_raw(raw: RawText) -> Option<Self> {
        let first = raw.polygon.first()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.0, first.1, first.0, first.1);
        for &(x, y) in &raw.polygon[1..] {
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }

        let left = min_x as i32;
        let top = min_y as i32;
        let confidence = if raw.confidence.is_nan() {
            0.0
        } else {
            raw.confidence.clamp(0.0, 1.0)
        };

        Some(Self {
            text: raw.text,
            left,
            top,
            width: (max_x as i32).saturating_sub(left).max(0),
            height: (max_y as i32).saturating_sub(top).max(0),
            confidence,
        })
    }

    /// Saturates at the `i32` bounds.
    pub fn center(&self) -> (i32, i32) {
        (
            self.left.saturating_add(self.width / 2),
            self.top.saturating_add(self.height / 2),
        )
    }

    /// Approximate center of the icon drawn above this caption.
    pub fn icon_anchor(&self) -> (i32, i32) {
        let (cx, cy) = self.center();
        (cx, cy.saturating_sub(DEFAULT_ICON_OFFSET))
    }
}

/// The actionable outcome of one successful grounding attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroundingResult {
    pub x: i32,
    pub y: i32,
    pub confidence: f64,
    pub matched_text: String,
}

impl GroundingResult {
    pub fn coordinates(&self) -> (i32, i32) {
        (self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(polygon: Vec<(f64, f64)>) -> RawText {
        RawText {
            polygon,
            text: "Recycle Bin".to_string(),
            confidence: 0.87,
        }
    }

    #[test]
    fn test_axis_aligned_polygon_becomes_box() {
        let fragment = TextFragment::from_raw(raw(vec![
            (10.0, 20.0),
            (70.0, 20.0),
            (70.0, 38.0),
            (10.0, 38.0),
        ]))
        .unwrap();
        assert_eq!(
            (fragment.left, fragment.top, fragment.width, fragment.height),
            (10, 20, 60, 18)
        );
        assert_eq!(fragment.text, "Recycle Bin");
    }

    #[test]
    fn test_skewed_polygon_uses_extremes() {
        let fragment = TextFragment::from_raw(raw(vec![
            (12.7, 21.0),
            (70.2, 18.4),
            (71.9, 36.0),
            (10.5, 39.8),
        ]))
        .unwrap();
        assert_eq!(fragment.left, 10);
        assert_eq!(fragment.top, 18);
        assert_eq!(fragment.width, 61);
        assert_eq!(fragment.height, 21);
    }

    #[test]
    fn test_empty_polygon_is_rejected() {
        assert!(TextFragment::from_raw(raw(vec![])).is_none());
    }

    #[test]
    fn test_confidence_is_clamped() {
        let mut r = raw(vec![(0.0, 0.0), (1.0, 1.0)]);
        r.confidence = 1.4;
        assert_eq!(TextFragment::from_raw(r.clone()).unwrap().confidence, 1.0);
        r.confidence = -0.2;
        assert_eq!(TextFragment::from_raw(r.clone()).unwrap().confidence, 0.0);
        r.confidence = f64::NAN;
        assert_eq!(TextFragment::from_raw(r).unwrap().confidence, 0.0);
    }

    #[test]
    fn test_center_and_icon_anchor() {
        let fragment = TextFragment {
            text: "Notepad".to_string(),
            left: 100,
            top: 200,
            width: 50,
            height: 20,
            confidence: 0.9,
        };
        assert_eq!(fragment.center(), (125, 210));
        assert_eq!(fragment.icon_anchor(), (125, 165));
    }

    #[test]
    fn test_huge_polygon_saturates_instead_of_overflowing() {
        let fragment =
            TextFragment::from_raw(raw(vec![(-2e9, 0.0), (2e9, 10.0), (0.0, -3e9)])).unwrap();
        assert_eq!(fragment.left, -2_000_000_000);
        assert_eq!(fragment.top, i32::MIN);
        assert_eq!(fragment.width, i32::MAX);
        assert_eq!(fragment.height, i32::MAX);
    }

    #[test]
    fn test_center_saturates_at_bounds() {
        let fragment = TextFragment {
            text: "edge".to_string(),
            left: i32::MAX - 1,
            top: i32::MIN,
            width: 100,
            height: 0,
            confidence: 0.5,
        };
        assert_eq!(fragment.center(), (i32::MAX, i32::MIN));
        assert_eq!(fragment.icon_anchor(), (i32::MAX, i32::MIN));
    }
}
