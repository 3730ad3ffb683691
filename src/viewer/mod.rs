//! Foreground display of the shared output.
//!
//! The viewer keeps its own copy of the output and only resyncs it when the
//! refresher raised the dirty flag, so scrolling never waits on a running
//! command. Frames are capped to the display rate by a [`Throttle`].

pub mod keys;
pub mod render;
pub mod scroll;

use crate::config::ViewerConfig;
use crate::output::SharedOutput;
use crate::services::signal_handler::termination_requested;
use crate::services::terminal_modes::{ModeControl, TerminalModes};
use crate::services::time_source::SharedTimeSource;
use crate::throttle::{StopSignal, Throttle};
use keys::{action_for_key, KeySource, ViewerAction};
use ratatui::{backend::Backend, Terminal};
use render::{content_size, draw_frame, position_label, visible_lines, FrameInfo};
use scroll::{ScrollAction, ScrollState};
use std::io;
use std::time::Duration;

/// How often the line buffer is checked before the first output arrives.
pub const INITIAL_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Why the viewer stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// The user pressed a quit key.
    Quit,
    /// The stop signal was raised.
    Stopped,
    /// SIGINT, SIGTERM or SIGHUP arrived.
    Terminated,
}

#[derive(Debug, Clone)]
pub struct ViewerOptions {
    /// Shown in the top border, e.g. `Every 2s: make test`
    pub title: String,
    pub display_rate: f64,
    pub tab_width: usize,
    pub follow: bool,
}

impl ViewerOptions {
    pub fn from_config(title: impl Into<String>, config: &ViewerConfig) -> Self {
        Self {
            title: title.into(),
            display_rate: config.display_rate,
            tab_width: config.tab_width,
            follow: config.follow_output,
        }
    }
}

pub struct Viewer {
    output: SharedOutput,
    local_lines: Vec<String>,
    scroll: ScrollState,
    follow: bool,
    throttle: Throttle,
    time: SharedTimeSource,
    stop: StopSignal,
    terminate: Box<dyn Fn() -> bool>,
    title: String,
    tab_width: usize,
    last_updated: Option<String>,
    viewport_height: usize,
}

impl Viewer {
    pub fn new(output: SharedOutput, options: ViewerOptions, time: SharedTimeSource) -> Self {
        Self {
            output,
            local_lines: Vec::new(),
            scroll: ScrollState::new(),
            follow: options.follow,
            throttle: Throttle::from_rate(options.display_rate),
            time,
            stop: StopSignal::new(),
            terminate: Box::new(termination_requested),
            title: options.title,
            tab_width: options.tab_width,
            last_updated: None,
            viewport_height: 0,
        }
    }

    pub fn with_stop_signal(mut self, stop: StopSignal) -> Self {
        self.stop = stop;
        self
    }

    /// Replace the signal-flag check used to detect SIGINT, SIGTERM and
    /// SIGHUP.
    pub fn with_termination_check(mut self, check: impl Fn() -> bool + 'static) -> Self {
        self.terminate = Box::new(check);
        self
    }

    pub fn local_lines(&self) -> &[String] {
        &self.local_lines
    }

    pub fn scroll_offset(&self) -> usize {
        self.scroll.offset()
    }

    pub fn is_following(&self) -> bool {
        self.follow
    }

    /// Run until quit, stop or a termination signal.
    pub fn run<B: Backend, K: KeySource>(
        &mut self,
        terminal: &mut Terminal<B>,
        keys: &mut K,
    ) -> io::Result<ExitReason> {
        if let Some(reason) = self.wait_for_first_output(keys)? {
            return Ok(reason);
        }
        tracing::debug!("First output received, starting frame loop");

        loop {
            self.throttle.mark(self.time.now());

            let (height, width) = content_size(terminal.size()?);
            self.viewport_height = height;
            // The terminal may have been resized.
            self.scroll.clamp(self.local_lines.len(), height);
            self.resync();
            self.draw(terminal, width)?;

            let budget = self.throttle.remaining(self.time.now());
            if let Some(key) = keys.next_key(budget)? {
                if let Some(action) = action_for_key(key) {
                    if self.handle_action(action) {
                        return Ok(ExitReason::Quit);
                    }
                }
            }

            if !self.throttle.wait(&*self.time, &self.stop) {
                return Ok(ExitReason::Stopped);
            }
            if (self.terminate)() {
                return Ok(ExitReason::Terminated);
            }
        }
    }

    /// Block until the refresher has published once. Returns an exit reason
    /// if the viewer should stop before rendering anything.
    fn wait_for_first_output<K: KeySource>(
        &mut self,
        keys: &mut K,
    ) -> io::Result<Option<ExitReason>> {
        loop {
            if self.stop.is_stopped() {
                return Ok(Some(ExitReason::Stopped));
            }
            if (self.terminate)() {
                return Ok(Some(ExitReason::Terminated));
            }
            if let Some(lines) = self.output.snapshot() {
                self.replace_lines(lines);
                return Ok(None);
            }
            if let Some(key) = keys.next_key(INITIAL_POLL_INTERVAL)? {
                if action_for_key(key) == Some(ViewerAction::Quit) {
                    return Ok(Some(ExitReason::Quit));
                }
            }
        }
    }

    /// Copy the shared output if it changed since the last frame.
    fn resync(&mut self) {
        if let Some(lines) = self.output.take_if_dirty() {
            self.replace_lines(lines);
        }
    }

    /// Install a new copy of the output, keeping the view at the bottom in
    /// follow mode and in range otherwise.
    fn replace_lines(&mut self, lines: Vec<String>) {
        let was_at_bottom = self
            .scroll
            .is_at_bottom(self.local_lines.len(), self.viewport_height);
        self.local_lines = lines;
        if self.follow && was_at_bottom {
            self.scroll.apply(
                ScrollAction::Bottom,
                self.local_lines.len(),
                self.viewport_height,
            );
        } else {
            self.scroll
                .clamp(self.local_lines.len(), self.viewport_height);
        }
        self.last_updated = Some(chrono::Local::now().format("updated %H:%M:%S").to_string());
    }

    fn draw<B: Backend>(&self, terminal: &mut Terminal<B>, width: usize) -> io::Result<()> {
        let offset = self.scroll.offset();
        let visible = visible_lines(
            &self.local_lines,
            offset,
            self.viewport_height,
            width,
            self.tab_width,
        );
        let position = position_label(offset, self.viewport_height, self.local_lines.len());
        let info = FrameInfo {
            title: &self.title,
            updated: self.last_updated.as_deref(),
            follow: self.follow,
        };
        terminal.draw(|frame| draw_frame(frame, &visible, &position, &info))?;
        Ok(())
    }

    /// Apply one action. Returns true on quit.
    fn handle_action(&mut self, action: ViewerAction) -> bool {
        match action {
            ViewerAction::Quit => return true,
            ViewerAction::Scroll(scroll) => {
                self.scroll
                    .apply(scroll, self.local_lines.len(), self.viewport_height);
            }
            ViewerAction::ToggleFollow => {
                self.follow = !self.follow;
                tracing::debug!("Follow mode {}", if self.follow { "on" } else { "off" });
            }
        }
        false
    }
}

/// Run the viewer inside an enabled terminal session and restore the
/// terminal before returning, whatever the outcome.
pub fn run_session<B: Backend, K: KeySource, C: ModeControl>(
    viewer: &mut Viewer,
    mut modes: TerminalModes<C>,
    terminal: &mut Terminal<B>,
    keys: &mut K,
) -> io::Result<ExitReason> {
    let result = viewer.run(terminal, keys);
    modes.undo();
    result
}
