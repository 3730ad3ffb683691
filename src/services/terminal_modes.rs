//! Terminal mode management
//!
//! The viewer needs raw mode (no line buffering, no echo), the alternate
//! screen and a hidden cursor. `TerminalModes` switches them on and puts the
//! terminal back exactly once, whichever way the program ends:
//!
//! - normal quit: the viewer calls [`TerminalModes::undo`]
//! - error return: `Drop` runs `undo`
//! - panic: the panic hook calls [`emergency_cleanup`] before the message is
//!   printed, and the later `Drop` finds nothing left to undo

use crossterm::{
    cursor::{Hide, Show},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use std::io::{self, stdout, Write};
use std::sync::atomic::{AtomicBool, Ordering};

/// Set while a crossterm session has modified the terminal and nobody has
/// restored it yet.
static SESSION_ACTIVE: AtomicBool = AtomicBool::new(false);

/// Switches the terminal into and out of the viewer's modes.
pub trait ModeControl {
    /// Enable all modes. On error, anything partially enabled is undone.
    fn enter(&mut self) -> io::Result<()>;

    /// Put the terminal back. Best effort; never fails.
    fn restore(&mut self);
}

/// Tracks which modes crossterm enabled.
#[derive(Debug, Default)]
pub struct CrosstermModes {
    raw_mode: bool,
    alternate_screen: bool,
    cursor_hidden: bool,
}

impl ModeControl for CrosstermModes {
    fn enter(&mut self) -> io::Result<()> {
        SESSION_ACTIVE.store(true, Ordering::SeqCst);

        if let Err(e) = enable_raw_mode() {
            tracing::error!("Failed to enable raw mode: {}", e);
            self.restore();
            return Err(e);
        }
        self.raw_mode = true;
        tracing::debug!("Enabled raw mode");

        if let Err(e) = stdout().execute(EnterAlternateScreen) {
            tracing::error!("Failed to enter alternate screen: {}", e);
            self.restore();
            return Err(e);
        }
        self.alternate_screen = true;
        tracing::debug!("Entered alternate screen");

        if let Err(e) = stdout().execute(Hide) {
            tracing::warn!("Failed to hide cursor: {}", e);
            // Non-fatal, continue with a visible cursor
        } else {
            self.cursor_hidden = true;
        }

        Ok(())
    }

    fn restore(&mut self) {
        // The panic hook may already have restored everything.
        if !SESSION_ACTIVE.swap(false, Ordering::SeqCst) {
            *self = Self::default();
            return;
        }

        if self.cursor_hidden {
            let _ = stdout().execute(Show);
            self.cursor_hidden = false;
        }

        // Disable raw mode before leaving the alternate screen for cleaner output
        if self.raw_mode {
            let _ = disable_raw_mode();
            self.raw_mode = false;
            tracing::debug!("Disabled raw mode");
        }

        if self.alternate_screen {
            let _ = stdout().execute(LeaveAlternateScreen);
            self.alternate_screen = false;
            tracing::debug!("Left alternate screen");
        }

        let _ = stdout().flush();
    }
}

/// RAII guard over the viewer's terminal modes.
///
/// `undo` is safe to call multiple times; only the first call restores.
#[derive(Debug)]
pub struct TerminalModes<C: ModeControl = CrosstermModes> {
    control: C,
    active: bool,
}

impl TerminalModes<CrosstermModes> {
    /// Enable raw mode, the alternate screen and a hidden cursor.
    pub fn enable() -> io::Result<Self> {
        Self::enable_with(CrosstermModes::default())
    }
}

impl<C: ModeControl> TerminalModes<C> {
    pub fn enable_with(mut control: C) -> io::Result<Self> {
        control.enter()?;
        Ok(Self {
            control,
            active: true,
        })
    }

    /// Restore the terminal to its original state.
    pub fn undo(&mut self) {
        if std::mem::replace(&mut self.active, false) {
            self.control.restore();
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }
}

impl<C: ModeControl> Drop for TerminalModes<C> {
    fn drop(&mut self) {
        self.undo();
    }
}

/// Unconditionally restore terminal state without access to the guard.
///
/// Intended for the panic hook. Does nothing if no session is active.
pub fn emergency_cleanup() {
    if !SESSION_ACTIVE.swap(false, Ordering::SeqCst) {
        return;
    }
    let _ = stdout().execute(Show);
    let _ = disable_raw_mode();
    let _ = stdout().execute(LeaveAlternateScreen);
    let _ = stdout().flush();
}

/// Whether a panic on `thread` should tear the terminal session down.
///
/// Only the main thread draws. A background thread that panics must leave
/// raw mode and the alternate screen alone while the viewer keeps running.
pub fn panic_restores_terminal(thread: &std::thread::Thread) -> bool {
    thread.name() == Some("main")
}
