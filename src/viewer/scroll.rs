//! Scroll position over the viewer's local copy of the output.
//!
//! `viewport_height` is the number of content rows on screen. After any
//! movement the offset satisfies `offset <= max(0, len - viewport_height)`,
//! so the last line can be brought into view but never scrolled past.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollAction {
    LineUp,
    LineDown,
    PageUp,
    PageDown,
    Top,
    Bottom,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScrollState {
    offset: usize,
}

impl ScrollState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of the first visible line.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Largest offset that still fills the viewport.
    pub fn max_offset(len: usize, viewport_height: usize) -> usize {
        len.saturating_sub(viewport_height)
    }

    pub fn is_at_bottom(&self, len: usize, viewport_height: usize) -> bool {
        self.offset >= Self::max_offset(len, viewport_height)
    }

    /// Pull the offset back into range after the content or viewport shrank.
    pub fn clamp(&mut self, len: usize, viewport_height: usize) {
        self.offset = self.offset.min(Self::max_offset(len, viewport_height));
    }

    pub fn apply(&mut self, action: ScrollAction, len: usize, viewport_height: usize) {
        let max = Self::max_offset(len, viewport_height);
        let page = viewport_height.max(1);
        self.offset = match action {
            ScrollAction::LineUp => self.offset.saturating_sub(1),
            ScrollAction::LineDown => self.offset.saturating_add(1).min(max),
            ScrollAction::PageUp => self.offset.saturating_sub(page),
            ScrollAction::PageDown => self.offset.saturating_add(page).min(max),
            ScrollAction::Top => 0,
            ScrollAction::Bottom => max,
        };
    }
}
