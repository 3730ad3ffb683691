//! Running the watched command.
//!
//! The refresher only needs "run this command string to completion and hand
//! back everything it printed". `CommandRunner` is that seam; `ShellRunner`
//! is the production implementation.

use std::io;
use std::path::PathBuf;
use std::process::{Command, Stdio};

/// Everything a finished run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Combined stdout and stderr, split into lines.
    pub lines: Vec<String>,
    /// Exit code, or `None` if the process was killed by a signal.
    pub exit_code: Option<i32>,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Why a run produced no output at all.
#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    #[error("failed to spawn `{shell}`: {source}")]
    Spawn {
        shell: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to collect command output: {0}")]
    Wait(#[source] io::Error),
}

/// Runs a command string to completion.
pub trait CommandRunner: Send {
    fn run(&mut self, command: &str) -> Result<CommandOutput, ExecError>;
}

/// Runs commands through `<shell> -c`, inheriting the environment.
///
/// The script first redirects the shell's own stderr onto stdout, so the
/// command's two streams arrive interleaved on one pipe in the order they
/// were written. When an environment script is configured it is sourced
/// before every run.
#[derive(Debug, Clone)]
pub struct ShellRunner {
    shell: String,
    env_script: Option<PathBuf>,
}

impl ShellRunner {
    pub fn new(shell: impl Into<String>) -> Self {
        Self {
            shell: shell.into(),
            env_script: None,
        }
    }

    pub fn with_env_script(mut self, path: impl Into<PathBuf>) -> Self {
        self.env_script = Some(path.into());
        self
    }

    pub fn shell(&self) -> &str {
        &self.shell
    }

    /// Script handed to `<shell> -c` for `command`.
    pub fn script(&self, command: &str) -> String {
        let mut script = String::from("exec 2>&1\n");
        if let Some(env) = &self.env_script {
            script.push_str(". ");
            script.push_str(&shell_words::quote(&env.to_string_lossy()));
            script.push('\n');
        }
        script.push_str(command);
        script
    }
}

impl CommandRunner for ShellRunner {
    fn run(&mut self, command: &str) -> Result<CommandOutput, ExecError> {
        let child = Command::new(&self.shell)
            .arg("-c")
            .arg(self.script(command))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| ExecError::Spawn {
                shell: self.shell.clone(),
                source,
            })?;

        let output = child.wait_with_output().map_err(ExecError::Wait)?;

        // Anything the shell wrote before the redirect took effect.
        let mut bytes = output.stdout;
        bytes.extend_from_slice(&output.stderr);

        Ok(CommandOutput {
            lines: split_lines(&bytes),
            exit_code: output.status.code(),
        })
    }
}

/// Split raw output into display lines.
///
/// Bytes are decoded as UTF-8, replacing invalid sequences. Lines are
/// separated by `'\n'`; a `'\r'` right before a separator is dropped. A
/// final newline leaves a trailing empty line, so `"hello\n"` becomes
/// `["hello", ""]` and empty output becomes `[""]`.
pub fn split_lines(bytes: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(bytes)
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line).to_string())
        .collect()
}

pub const DEFAULT_SHELL: &str = "/bin/sh";

/// Shell used when none is configured.
///
/// The script prelude (`exec 2>&1`, `. <env>`) is POSIX syntax, so this is
/// always `/bin/sh` rather than the user's login shell.
pub fn default_shell() -> String {
    DEFAULT_SHELL.to_string()
}
