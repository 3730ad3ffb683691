//! The two cells shared between the refresher and the viewer.
//!
//! `lines` holds the most recent command output, replaced wholesale on every
//! publication. `dirty` tells the viewer that `lines` changed since its last
//! copy. The refresher writes `lines` before raising `dirty`, so a viewer
//! that sees `dirty == true` always finds output at least that new.
//!
//! Neither side ever holds both locks at once.

use crate::guarded::GuardedCell;
use std::sync::Arc;

/// Output lines of the last completed run; `None` until the first one.
pub type LineBuffer = GuardedCell<Option<Vec<String>>>;

/// Raised by the refresher after publishing, cleared by the viewer after
/// copying.
pub type DirtyFlag = GuardedCell<bool>;

#[derive(Debug, Clone)]
pub struct SharedOutput {
    lines: Arc<LineBuffer>,
    dirty: Arc<DirtyFlag>,
}

impl Default for SharedOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl SharedOutput {
    /// Empty line buffer and a clear dirty flag.
    pub fn new() -> Self {
        Self {
            lines: Arc::new(GuardedCell::new(None)),
            dirty: Arc::new(GuardedCell::new(false)),
        }
    }

    pub fn lines(&self) -> &LineBuffer {
        &self.lines
    }

    pub fn dirty(&self) -> &DirtyFlag {
        &self.dirty
    }

    /// Replace the line buffer, then raise the dirty flag.
    ///
    /// These are two separate critical sections.
    pub fn publish(&self, lines: Vec<String>) {
        self.lines.set(Some(lines));
        self.dirty.set(true);
    }

    /// Copy of the line buffer if any output has been published yet.
    pub fn snapshot(&self) -> Option<Vec<String>> {
        self.lines.get()
    }

    /// Take a fresh copy of the output if it changed since the last call.
    ///
    /// The flag is observed and cleared in one critical section, then
    /// released before the line buffer is locked. A publication that lands
    /// in between only makes the copy newer; its flag stays raised and the
    /// next call copies again.
    pub fn take_if_dirty(&self) -> Option<Vec<String>> {
        let was_dirty = self.dirty.with(|dirty| std::mem::replace(dirty, false));
        if !was_dirty {
            return None;
        }
        // `dirty` is only raised after a publication, so the buffer is set.
        Some(self.lines.get().unwrap_or_default())
    }
}
