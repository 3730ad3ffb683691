//! Background loop that re-runs the command and publishes its output.

use crate::command::CommandRunner;
use crate::output::SharedOutput;
use crate::services::time_source::SharedTimeSource;
use crate::throttle::{StopSignal, Throttle};
use std::thread::JoinHandle;

/// Default executions per second (one run every two seconds).
pub const DEFAULT_EXECUTE_RATE: f64 = 0.5;

pub struct Refresher {
    command: String,
    runner: Box<dyn CommandRunner>,
    output: SharedOutput,
    throttle: Throttle,
    time: SharedTimeSource,
    stop: StopSignal,
}

impl Refresher {
    /// `execute_rate` is the maximum number of runs per second.
    pub fn new(
        command: impl Into<String>,
        runner: Box<dyn CommandRunner>,
        output: SharedOutput,
        execute_rate: f64,
        time: SharedTimeSource,
    ) -> Self {
        Self {
            command: command.into(),
            runner,
            output,
            throttle: Throttle::from_rate(execute_rate),
            time,
            stop: StopSignal::new(),
        }
    }

    /// Use `stop` to end the loop. Without one the loop runs until the
    /// process exits.
    pub fn with_stop_signal(mut self, stop: StopSignal) -> Self {
        self.stop = stop;
        self
    }

    /// Run one execution and publish its result.
    ///
    /// Returns `true` if new output was published. Failures are logged and
    /// leave the previously published output in place.
    pub fn refresh_once(&mut self) -> bool {
        let result = self.runner.run(&self.command);
        self.throttle.mark(self.time.now());

        match result {
            Ok(output) => {
                if !output.success() {
                    tracing::warn!(
                        command = %self.command,
                        exit_code = ?output.exit_code,
                        "Command exited unsuccessfully"
                    );
                }
                tracing::debug!(lines = output.lines.len(), "Publishing command output");
                self.output.publish(output.lines);
                true
            }
            Err(e) => {
                tracing::warn!(command = %self.command, "Command execution failed: {}", e);
                false
            }
        }
    }

    /// Run until the stop signal is raised.
    pub fn run(mut self) {
        tracing::info!(
            command = %self.command,
            period = ?self.throttle.period(),
            "Refresher started"
        );
        while self.throttle.wait(self.time.as_ref(), &self.stop) {
            self.refresh_once();
        }
        tracing::info!("Refresher stopped");
    }

    /// Run the loop on a named background thread.
    pub fn spawn(self) -> std::io::Result<JoinHandle<()>> {
        std::thread::Builder::new()
            .name("watchl-refresher".to_string())
            .spawn(move || self.run())
    }
}
