//! XDG-compliant log directory management
//!
//! Logs are stored in `$XDG_STATE_HOME/watchl/logs/` (typically
//! `~/.local/state/watchl/logs/`).
//!
//! Each instance uses a PID-based log file so concurrent runs never share
//! one. On startup, stale log files from dead processes are cleaned up.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::{Duration, SystemTime};

/// Minimum age for log files to be cleaned up (24 hours)
const CLEANUP_AGE: Duration = Duration::from_secs(24 * 60 * 60);

static LOG_DIR: OnceLock<PathBuf> = OnceLock::new();

/// Get the base log directory, creating it if necessary.
///
/// Falls back to `~/.local/state/watchl/logs/` if XDG_STATE_HOME is not set,
/// and to the system temp directory as a last resort.
pub fn log_dir() -> &'static PathBuf {
    LOG_DIR.get_or_init(|| {
        let dir = get_xdg_log_dir().unwrap_or_else(|| std::env::temp_dir().join("watchl-logs"));

        if let Err(e) = fs::create_dir_all(&dir) {
            tracing::warn!("Failed to create log directory {:?}: {}", dir, e);
            return std::env::temp_dir().join("watchl-logs");
        }

        dir
    })
}

fn get_xdg_log_dir() -> Option<PathBuf> {
    if let Ok(state_home) = std::env::var("XDG_STATE_HOME") {
        let path = PathBuf::from(state_home);
        if path.is_absolute() {
            return Some(path.join("watchl").join("logs"));
        }
    }

    dirs::home_dir().map(|home| home.join(".local").join("state").join("watchl").join("logs"))
}

/// Path of the log file for this process: `{log_dir}/watchl-{PID}.log`
pub fn main_log_path() -> PathBuf {
    log_dir().join(format!("watchl-{}.log", std::process::id()))
}

/// Remove log files left behind by processes that no longer exist.
pub fn cleanup_stale_logs() {
    cleanup_stale_logs_in_dir(log_dir(), std::process::id());
}

fn cleanup_stale_logs_in_dir(dir: &Path, current_pid: u32) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };

    for entry in entries.flatten() {
        let file_name = entry.file_name();
        let name = file_name.to_string_lossy();

        let Some(pid) = extract_pid_from_filename(&name) else {
            continue;
        };
        if pid == current_pid {
            continue;
        }

        if !is_process_running(pid)
            && is_file_older_than(&entry.path(), CLEANUP_AGE)
            && entry.file_type().map(|t| t.is_file()).unwrap_or(false)
        {
            if let Err(e) = fs::remove_file(entry.path()) {
                tracing::debug!("Failed to clean up stale log {:?}: {}", entry.path(), e);
            } else {
                tracing::debug!("Cleaned up stale log file: {:?}", entry.path());
            }
        }
    }
}

fn is_file_older_than(path: &Path, age: Duration) -> bool {
    let Ok(metadata) = fs::metadata(path) else {
        return false;
    };

    let Ok(modified) = metadata.modified() else {
        return false;
    };

    SystemTime::now()
        .duration_since(modified)
        .map(|elapsed| elapsed > age)
        .unwrap_or(false)
}

/// Extract PID from a filename like "watchl-12345.log"
fn extract_pid_from_filename(name: &str) -> Option<u32> {
    let without_ext = name.strip_suffix(".log")?;
    let last_hyphen = without_ext.rfind('-')?;
    without_ext[last_hyphen + 1..].parse().ok()
}

fn is_process_running(pid: u32) -> bool {
    #[cfg(unix)]
    {
        use nix::errno::Errno;
        use nix::sys::signal::kill;
        use nix::unistd::Pid;

        let Ok(raw) = i32::try_from(pid) else {
            return false;
        };
        // Signal 0 only checks that the process exists.
        matches!(kill(Pid::from_raw(raw), None), Ok(()) | Err(Errno::EPERM))
    }

    #[cfg(not(unix))]
    {
        // Assume running so nothing is deleted by mistake.
        let _ = pid;
        true
    }
}

/// Print the directories used by watchl to stdout
pub fn print_all_paths() {
    use std::io::Write;

    let stdout = std::io::stdout();
    let mut handle = stdout.lock();

    let config_path = crate::config::default_config_path()
        .unwrap_or_else(|| PathBuf::from("<unavailable>"));

    writeln!(handle, "watchl directories:").ok();
    writeln!(handle).ok();
    writeln!(handle, "Config:     {}", config_path.display()).ok();
    writeln!(handle, "Logs:       {}", log_dir().display()).ok();
    writeln!(handle, "  this run:     {}", main_log_path().display()).ok();
}
