use crate::types::DEFAULT_ICON_OFFSET;
use crate::TextFragment;

/// Maps a caption fragment to the click target of the icon drawn above it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IconAnchorResolver {
    offset: i32,
}

impl Default for IconAnchorResolver {
    fn default() -> Self {
        Self {
            offset: DEFAULT_ICON_OFFSET,
        }
    }
}

impl IconAnchorResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a vertical caption-to-icon distance other than [`DEFAULT_ICON_OFFSET`].
    pub fn with_offset(offset: i32) -> Self {
        Self { offset }
    }

    pub fn offset(&self) -> i32 {
        self.offset
    }

    /// Never fails; degenerate geometry may yield a point outside the screen.
    pub fn resolve(&self, fragment: &TextFragment) -> (i32, i32) {
        let (cx, cy) = fragment.center();
        (cx, cy.saturating_sub(self.offset))
    }
}
