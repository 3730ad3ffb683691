//! Process-level services: logging, signals, terminal modes and time.

pub mod log_dirs;
pub mod signal_handler;
pub mod terminal_modes;
pub mod time_source;
pub mod tracing_setup;
