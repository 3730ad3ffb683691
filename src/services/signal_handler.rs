//! Termination signals.
//!
//! SIGINT, SIGTERM and SIGHUP only raise a flag. The viewer polls it every
//! frame and leaves through its normal exit path, which restores the
//! terminal; nothing unsafe happens inside the handler itself.

use std::sync::atomic::{AtomicBool, Ordering};

static TERMINATION_REQUESTED: AtomicBool = AtomicBool::new(false);

/// Whether a termination signal has been received.
pub fn termination_requested() -> bool {
    TERMINATION_REQUESTED.load(Ordering::SeqCst)
}

/// Initialize handlers for SIGINT, SIGTERM and SIGHUP.
/// On non-Unix platforms this is a no-op.
pub fn install_signal_handlers() {
    #[cfg(unix)]
    unix::install_termination_handlers();
}

#[cfg(unix)]
mod unix {
    use super::TERMINATION_REQUESTED;
    use nix::sys::signal::{sigaction, SaFlags, SigAction, SigHandler, SigSet, Signal};
    use std::sync::atomic::Ordering;

    extern "C" fn termination_handler(_: nix::libc::c_int) {
        // Only an atomic store: async-signal-safe.
        TERMINATION_REQUESTED.store(true, Ordering::SeqCst);
    }

    pub(super) fn install_termination_handlers() {
        let handler = SigHandler::Handler(termination_handler);
        let action = SigAction::new(handler, SaFlags::SA_RESTART, SigSet::empty());

        for signal in [Signal::SIGINT, Signal::SIGTERM, Signal::SIGHUP] {
            // SAFETY: the handler only performs an atomic store.
            if let Err(e) = unsafe { sigaction(signal, &action) } {
                tracing::error!("Failed to set {} handler: {}", signal, e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_termination_without_signal() {
        assert!(!termination_requested());
    }
}
