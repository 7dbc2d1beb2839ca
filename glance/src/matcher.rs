//! Label matching over detected text fragments
//!
//! OCR casing and word segmentation are unreliable, so matching is case-insensitive and
//! tolerates truncated or merged captions. There is no scoring: within a tier the first
//! fragment in detector order wins.

use crate::{NoMatchError, TextFragment};
use tracing::debug;

/// How a fragment was matched to the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    /// Case-insensitive equality
    Exact,
    /// The target contains the fragment text or the other way round
    Substring,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LabelMatcher;

impl LabelMatcher {
    pub fn new() -> Self {
        Self
    }

    /// Select the fragment that best matches `target`.
    pub fn find<'a>(
        &self,
        fragments: &'a [TextFragment],
        target: &str,
    ) -> Result<&'a TextFragment, NoMatchError> {
        self.find_with_kind(fragments, target)
            .map(|(fragment, _)| fragment)
    }

    pub fn find_with_kind<'a>(
        &self,
        fragments: &'a [TextFragment],
        target: &str,
    ) -> Result<(&'a TextFragment, MatchKind), NoMatchError> {
        let target_lower = target.to_lowercase();
        let lowered: Vec<String> = fragments.iter().map(|f| f.text.to_lowercase()).collect();

        if let Some(i) = lowered.iter().position(|text| *text == target_lower) {
            debug!(text = %fragments[i].text, "Exact label match");
            return Ok((&fragments[i], MatchKind::Exact));
        }

        if let Some(i) = lowered
            .iter()
            .position(|text| text.contains(&target_lower) || target_lower.contains(text.as_str()))
        {
            debug!(text = %fragments[i].text, "Partial label match");
            return Ok((&fragments[i], MatchKind::Substring));
        }

        Err(NoMatchError {
            target: target.to_string(),
            available_labels: fragments.iter().map(|f| f.text.clone()).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fragments(texts: &[&str]) -> Vec<TextFragment> {
        texts
            .iter()
            .enumerate()
            .map(|(i, text)| TextFragment {
                text: text.to_string(),
                left: 10,
                top: 100 * i as i32,
                width: 60,
                height: 16,
                confidence: 0.5 + i as f64 / 100.0,
            })
            .collect()
    }

    #[test]
    fn test_exact_match_wins_over_earlier_substring() {
        let frags = fragments(&["Notepad++", "Recycle Bin", "NOTEPAD"]);
        let (found, kind) = LabelMatcher::new()
            .find_with_kind(&frags, "Notepad")
            .unwrap();
        assert_eq!(found.text, "NOTEPAD");
        assert_eq!(kind, MatchKind::Exact);
    }

    #[test]
    fn test_substring_target_inside_fragment() {
        let frags = fragments(&["Recycle Bin", "Notepad"]);
        let (found, kind) = LabelMatcher::new().find_with_kind(&frags, "Note").unwrap();
        assert_eq!(found.text, "Notepad");
        assert_eq!(kind, MatchKind::Substring);
    }

    #[test]
    fn test_substring_fragment_inside_target() {
        let frags = fragments(&["Recycle Bin", "Note"]);
        let found = LabelMatcher::new().find(&frags, "Notepad").unwrap();
        assert_eq!(found.text, "Note");
    }

    #[test]
    fn test_substring_tie_break_follows_detector_order() {
        let matcher = LabelMatcher::new();
        let frags = fragments(&["Notepad", "Notes"]);
        assert_eq!(matcher.find(&frags, "Note").unwrap().text, "Notepad");

        let frags = fragments(&["Notes", "Notepad"]);
        assert_eq!(matcher.find(&frags, "Note").unwrap().text, "Notes");
    }

    #[test]
    fn test_exact_tie_break_follows_detector_order() {
        let frags = fragments(&["notepad", "Notepad"]);
        let found = LabelMatcher::new().find(&frags, "Notepad").unwrap();
        assert_eq!(found.top, 0);
    }

    #[test]
    fn test_no_match_lists_all_labels_in_order() {
        let frags = fragments(&["Recycle Bin", "This PC", "recycle bin"]);
        let err = LabelMatcher::new().find(&frags, "Notepad").unwrap_err();
        assert_eq!(err.target, "Notepad");
        assert_eq!(
            err.available_labels,
            vec!["Recycle Bin", "This PC", "recycle bin"]
        );
    }

    #[test]
    fn test_blank_fragment_is_a_substring_of_any_target() {
        let matcher = LabelMatcher::new();
        let frags = fragments(&["", "Recycle Bin"]);
        assert_eq!(matcher.find(&frags, "Bin").unwrap().text, "");
        // The exact tier still takes precedence.
        let frags = fragments(&["", "Bin"]);
        assert_eq!(matcher.find(&frags, "Bin").unwrap().text, "Bin");
    }
}
