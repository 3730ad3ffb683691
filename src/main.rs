use anyhow::{Context, Result as AnyhowResult};
use clap::Parser;
use std::path::PathBuf;
use watchl::app::{self, WatchOptions};
use watchl::command::default_shell;
use watchl::config::Config;
use watchl::services::{log_dirs, signal_handler, terminal_modes, tracing_setup};

/// Run a command periodically and browse its latest output full-screen
#[derive(Parser, Debug)]
#[command(name = "watchl")]
#[command(about = "Run a command periodically and scroll through its output", long_about = None)]
#[command(version)]
struct Args {
    /// Command to run; multiple tokens are joined with spaces
    #[arg(
        value_name = "COMMAND",
        trailing_var_arg = true,
        allow_hyphen_values = true,
        required_unless_present_any = ["show_paths", "dump_config"]
    )]
    command: Vec<String>,

    /// Seconds between the end of one run and the start of the next
    #[arg(short = 'n', long, value_name = "SECONDS", allow_negative_numbers = true)]
    interval: Option<f64>,

    /// Script sourced by the shell before every run
    #[arg(long, value_name = "PATH")]
    env: Option<PathBuf>,

    /// POSIX shell used to run the command (default: /bin/sh)
    #[arg(long, value_name = "SHELL")]
    shell: Option<String>,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Path to log file for diagnostics (default: XDG state dir)
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Print the effective configuration as JSON and exit
    #[arg(long)]
    dump_config: bool,

    /// Print the directories used by watchl and exit
    #[arg(long)]
    show_paths: bool,
}

/// Config file (explicit or default location) with command-line overrides.
fn effective_config(args: &Args) -> AnyhowResult<Config> {
    let mut config = match &args.config {
        Some(path) => Config::load_from_file(path)?,
        None => Config::load_default()?,
    };

    if let Some(interval) = args.interval {
        config.refresh.interval_secs = interval;
    }
    if let Some(shell) = &args.shell {
        config.refresh.shell = Some(shell.clone());
    }

    config.validate()?;
    Ok(config)
}

fn main() -> AnyhowResult<()> {
    let args = Args::parse();

    // Handle --show-paths early (no terminal setup needed)
    if args.show_paths {
        log_dirs::print_all_paths();
        return Ok(());
    }

    let config = effective_config(&args).context("Invalid configuration")?;

    if args.dump_config {
        let json = serde_json::to_string_pretty(&config)
            .context("Failed to serialize configuration")?;
        println!("{}", json);
        return Ok(());
    }

    let log_file = args
        .log_file
        .clone()
        .unwrap_or_else(log_dirs::main_log_path);
    if let Err(e) = tracing_setup::init_global(&log_file) {
        eprintln!(
            "Warning: could not open log file {}: {}",
            log_file.display(),
            e
        );
    }

    // Clean up stale log files from dead processes on startup
    log_dirs::cleanup_stale_logs();

    tracing::info!("watchl starting");

    signal_handler::install_signal_handlers();
    tracing::info!("Signal handlers installed");

    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic| {
        let thread = std::thread::current();
        if terminal_modes::panic_restores_terminal(&thread) {
            terminal_modes::emergency_cleanup();
            original_hook(panic);
        } else {
            // The viewer still owns the screen; keep the report out of it.
            tracing::error!("Thread {:?} panicked: {}", thread.name(), panic);
        }
    }));

    let shell = config.refresh.shell.clone().unwrap_or_else(default_shell);
    let options = WatchOptions {
        command: args.command.join(" "),
        shell,
        env_script: args.env.clone(),
        config,
    };

    app::run(options)?;
    Ok(())
}
