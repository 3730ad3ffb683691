//! Wires the refresher and the viewer together for one watch session.

use crate::command::ShellRunner;
use crate::config::Config;
use crate::output::SharedOutput;
use crate::refresher::Refresher;
use crate::services::terminal_modes::TerminalModes;
use crate::services::time_source::{RealTimeSource, SharedTimeSource};
use crate::viewer::keys::CrosstermKeys;
use crate::viewer::{run_session, ExitReason, Viewer, ViewerOptions};
use anyhow::{Context, Result};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::stdout;
use std::path::PathBuf;

/// Everything needed to start watching a command.
#[derive(Debug, Clone)]
pub struct WatchOptions {
    pub command: String,
    pub shell: String,
    pub env_script: Option<PathBuf>,
    pub config: Config,
}

impl WatchOptions {
    /// Text for the top border.
    pub fn title(&self) -> String {
        format!(
            "Every {}s: {}",
            self.config.refresh.interval_secs, self.command
        )
    }

    fn runner(&self) -> ShellRunner {
        let runner = ShellRunner::new(self.shell.clone());
        match &self.env_script {
            Some(path) => runner.with_env_script(path.clone()),
            None => runner,
        }
    }

    /// Refresher publishing into `output`, not yet started.
    pub fn refresher(&self, output: SharedOutput, time: SharedTimeSource) -> Refresher {
        Refresher::new(
            self.command.clone(),
            Box::new(self.runner()),
            output,
            self.config.refresh.execute_rate(),
            time,
        )
    }
}

/// Start the refresher in the background and run the viewer on the current
/// thread until it exits. The terminal is restored before this returns.
pub fn run(options: WatchOptions) -> Result<ExitReason> {
    let time = RealTimeSource::shared();
    let output = SharedOutput::new();

    tracing::info!(
        "Watching {:?} every {}s with {}",
        options.command,
        options.config.refresh.interval_secs,
        options.shell
    );

    // Detached: it runs until the process exits.
    let _refresher = options
        .refresher(output.clone(), time.clone())
        .spawn()
        .context("Failed to start refresher thread")?;

    let mut viewer = Viewer::new(
        output,
        ViewerOptions::from_config(options.title(), &options.config.viewer),
        time,
    );

    let modes = TerminalModes::enable().context("Failed to set up terminal")?;
    let mut terminal =
        Terminal::new(CrosstermBackend::new(stdout())).context("Failed to create terminal")?;

    let reason = run_session(&mut viewer, modes, &mut terminal, &mut CrosstermKeys)
        .context("Viewer failed")?;
    tracing::info!("Viewer exited: {:?}", reason);
    Ok(reason)
}
