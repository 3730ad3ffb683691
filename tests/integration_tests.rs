// Integration tests - the refresher and viewer running against a real shell

mod common;

use common::tracing::init_tracing_from_env;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{backend::TestBackend, Terminal};
use std::io::{self, Write};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use watchl::command::{CommandRunner, ShellRunner};
use watchl::config::{Config, ConfigError};
use watchl::output::SharedOutput;
use watchl::refresher::Refresher;
use watchl::services::time_source::RealTimeSource;
use watchl::throttle::StopSignal;
use watchl::viewer::keys::KeySource;
use watchl::viewer::{ExitReason, Viewer, ViewerOptions};

fn lines(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Start a refresher for `command` under /bin/sh at `rate` runs per second.
fn start(command: &str, rate: f64, output: &SharedOutput, stop: &StopSignal) -> JoinHandle<()> {
    Refresher::new(
        command,
        Box::new(ShellRunner::new("/bin/sh")),
        output.clone(),
        rate,
        RealTimeSource::shared(),
    )
    .with_stop_signal(stop.clone())
    .spawn()
    .unwrap()
}

/// Poll until output is published or `timeout` passes.
fn wait_for_output(output: &SharedOutput, timeout: Duration) -> Option<Vec<String>> {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if let Some(lines) = output.snapshot() {
            return Some(lines);
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    None
}

#[cfg(unix)]
#[test]
fn test_echo_published_with_trailing_empty_line() {
    init_tracing_from_env();
    let output = SharedOutput::new();
    let stop = StopSignal::new();
    let handle = start("echo hello", 1.0, &output, &stop);

    let published = wait_for_output(&output, Duration::from_secs(5));
    stop.stop();
    handle.join().unwrap();

    assert_eq!(published, Some(lines(&["hello", ""])));
    assert!(output.dirty().get());
}

#[cfg(unix)]
#[test]
fn test_failing_command_output_is_still_shown() {
    init_tracing_from_env();
    let output = SharedOutput::new();
    let stop = StopSignal::new();
    let handle = start("echo 'error: bad flag' >&2; exit 2", 1.0, &output, &stop);

    let published = wait_for_output(&output, Duration::from_secs(5));
    stop.stop();
    handle.join().unwrap();

    assert_eq!(published, Some(lines(&["error: bad flag", ""])));
}

#[cfg(unix)]
#[test]
fn test_runs_are_spaced_by_the_interval() {
    init_tracing_from_env();
    let output = SharedOutput::new();
    let stop = StopSignal::new();
    // Appends one line per run; 10 runs per second at most.
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("runs");
    let command = format!("echo run >> '{}'", log.display());
    let handle = start(&command, 10.0, &output, &stop);

    std::thread::sleep(Duration::from_millis(450));
    stop.stop();
    handle.join().unwrap();

    let runs = std::fs::read_to_string(&log).unwrap().lines().count();
    assert!((1..=5).contains(&runs), "{} runs in 450ms", runs);
}

#[cfg(unix)]
#[test]
fn test_env_script_sourced_before_command() {
    let mut script = tempfile::NamedTempFile::new().unwrap();
    writeln!(script, "GREETING='hi there'").unwrap();

    let mut runner = ShellRunner::new("/bin/sh").with_env_script(script.path());
    let result = runner.run("echo \"$GREETING\"").unwrap();

    assert_eq!(result.lines, lines(&["hi there", ""]));
    assert!(result.success());
}

#[test]
fn test_missing_shell_leaves_buffer_empty() {
    let output = SharedOutput::new();
    let mut refresher = Refresher::new(
        "echo hello",
        Box::new(ShellRunner::new("/nonexistent/shell")),
        output.clone(),
        1.0,
        RealTimeSource::shared(),
    );

    assert!(!refresher.refresh_once());
    assert_eq!(output.snapshot(), None);
    assert!(!output.dirty().get());
}

/// Idles with real waits until `frames` frames have been read after the
/// first output, then quits.
struct QuitAfterFrames {
    output: SharedOutput,
    frames: usize,
}

impl KeySource for QuitAfterFrames {
    fn next_key(&mut self, timeout: Duration) -> io::Result<Option<KeyEvent>> {
        if self.output.snapshot().is_some() {
            if self.frames == 0 {
                return Ok(Some(KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE)));
            }
            self.frames -= 1;
        }
        std::thread::sleep(timeout);
        Ok(None)
    }
}

#[cfg(unix)]
#[test]
fn test_viewer_shows_refreshed_output() {
    init_tracing_from_env();
    let output = SharedOutput::new();
    let stop = StopSignal::new();
    let handle = start("printf 'one\\ttab\\ntwo\\n'", 2.0, &output, &stop);

    let mut viewer = Viewer::new(
        output.clone(),
        ViewerOptions::from_config("Every 0.5s: printf", &Config::default().viewer),
        RealTimeSource::shared(),
    );
    let mut terminal = Terminal::new(TestBackend::new(50, 6)).unwrap();
    let mut keys = QuitAfterFrames {
        output: output.clone(),
        frames: 2,
    };

    let reason = viewer.run(&mut terminal, &mut keys).unwrap();
    stop.stop();
    handle.join().unwrap();

    assert_eq!(reason, ExitReason::Quit);
    assert_eq!(viewer.local_lines(), lines(&["one\ttab", "two", ""]).as_slice());

    let buffer = terminal.backend().buffer();
    let row = |y: u16| -> String { (0..50).map(|x| buffer[(x, y)].symbol()).collect() };
    assert!(row(0).contains("Every 0.5s: printf"), "row 0: {:?}", row(0));
    assert!(row(1).starts_with("│one     tab"), "row 1: {:?}", row(1));
    assert!(row(2).starts_with("│two "), "row 2: {:?}", row(2));
    assert!(row(5).contains("1-3/3"), "row 5: {:?}", row(5));
}

#[test]
fn test_invalid_config_file_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, r#"{ "viewer": { "tab_width": 0 } }"#).unwrap();

    let config = Config::load_from_file(&path).unwrap();
    match config.validate() {
        Err(ConfigError::Invalid(message)) => assert!(message.contains("tab_width")),
        other => panic!("expected validation error, got {:?}", other),
    }
}
