//! CLI entrypoint for ce-agent
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, bail};
use ceagent_application::{
    LoopProgressNotifier, NoLoopProgress, RpcTransport, RunSessionUseCase, SessionLogger,
    ToolDispatcher,
};
use ceagent_domain::OutputFormat;
use ceagent_infrastructure::{
    ConfigLoader, FileConfig, JsonlSessionLogger, StdioChannel, default_registry,
};
use ceagent_presentation::{
    Cli, ConsoleFormatter, OutputFormatter, ProgressReporter, SimpleProgress,
};
use clap::Parser;
use std::fs::OpenOptions;
use std::io::IsTerminal;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Held until exit so buffered file logs are flushed
    let _log_guard = init_logging(cli.verbose, cli.log_file.as_deref())?;

    info!("Starting ce-agent");

    if cli.show_config {
        ConfigLoader::print_config_sources(cli.config.as_ref());
        return Ok(());
    }

    // === Configuration ===
    let mut config: FileConfig = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref()).context("Failed to load configuration")?
    };
    apply_overrides(&mut config, &cli);

    for issue in config.check()? {
        warn!("{}", issue);
    }

    if cli.no_color || !config.output.color {
        colored::control::set_override(false);
    }

    let registry = Arc::new(default_registry().context("Failed to build tool registry")?);

    if cli.list_tools {
        print!("{}", ConsoleFormatter::format_tool_list(&registry));
        return Ok(());
    }

    let Some(request) = cli.request.as_deref() else {
        bail!("A request is required. Use --list-tools to see what the agent can call.");
    };

    let Some(planner) = config.planner.to_planner() else {
        bail!("No planner configured. Set [planner].command or pass --planner <COMMAND>.");
    };

    // === Dependency Injection ===
    let transport = Arc::new(
        StdioChannel::open(
            &config.bridge.command,
            &config.bridge.args,
            config.bridge.to_channel_config(),
        )
        .await
        .with_context(|| format!("Failed to start bridge '{}'", config.bridge.command))?,
    );

    let dispatcher = ToolDispatcher::new(registry, Arc::clone(&transport))
        .with_timeouts(config.timeouts.to_timeout_policy());

    let cancellation = CancellationToken::new();
    spawn_interrupt_handler(cancellation.clone());

    let mut use_case = RunSessionUseCase::new(Arc::new(planner), dispatcher)
        .with_config(config.session.to_loop_config())
        .with_cancellation(cancellation);

    let session_log = cli
        .session_log
        .clone()
        .or_else(|| config.logging.session_log_path());
    if let Some(path) = session_log {
        match JsonlSessionLogger::new(&path) {
            Some(logger) => {
                let logger: Arc<dyn SessionLogger> = Arc::new(logger);
                use_case = use_case.with_session_logger(logger);
            }
            None => warn!(path = %path.display(), "Session transcript disabled"),
        }
    }

    // === Run ===
    let progress: Box<dyn LoopProgressNotifier> = if cli.quiet {
        Box::new(NoLoopProgress)
    } else if std::io::stderr().is_terminal() {
        Box::new(ProgressReporter::new())
    } else {
        Box::new(SimpleProgress)
    };
    let result = use_case.run(request, progress.as_ref()).await;

    transport.close().await;
    let report = result.context("Session could not start")?;

    let format: OutputFormat = cli.output.map(Into::into).unwrap_or(config.output.format);
    println!("{}", ConsoleFormatter.render(&report, format));

    Ok(())
}

/// Install the fmt subscriber. `-v` picks the level unless `RUST_LOG` is set.
fn init_logging(verbose: u8, log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace", // -vvv or more
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            let (writer, guard) = tracing_appender::non_blocking(file);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(false)
                .with_ansi(false)
                .with_writer(writer)
                .init();
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
            Ok(None)
        }
    }
}

/// Command-line flags win over every config source.
fn apply_overrides(config: &mut FileConfig, cli: &Cli) {
    if let Some(bridge) = &cli.bridge {
        // configured args belong to the configured command
        config.bridge.command = bridge.clone();
        config.bridge.args.clear();
    }
    if let Some(planner) = &cli.planner {
        config.planner.command = planner.clone();
    }
    if let Some(max) = cli.max_iterations {
        config.session.max_iterations = max;
    }
    if let Some(secs) = cli.time_budget {
        config.session.time_budget_secs = secs;
    }
}

/// First Ctrl-C cancels the session; the loop then reports what it has.
fn spawn_interrupt_handler(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling session");
            token.cancel();
            // A second interrupt exits without waiting for the bridge.
            if tokio::signal::ctrl_c().await.is_ok() {
                std::process::exit(130);
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::parse_from([
            "ce-agent",
            "--bridge",
            "bridge.exe",
            "--planner",
            "ask.sh",
            "--time-budget",
            "60",
            "find health",
        ]);
        let mut config = FileConfig::default();
        apply_overrides(&mut config, &cli);
        assert_eq!(config.bridge.command, "bridge.exe");
        assert!(config.bridge.args.is_empty());
        assert_eq!(config.planner.command, "ask.sh");
        assert_eq!(config.session.time_budget_secs, 60);
        assert_eq!(config.session.max_iterations, 20);
    }

    #[test]
    fn test_config_bridge_args_kept_without_flag() {
        let cli = Cli::parse_from(["ce-agent", "find health"]);
        let mut config = FileConfig::default();
        let args = config.bridge.args.clone();
        apply_overrides(&mut config, &cli);
        assert_eq!(config.bridge.args, args);
        assert!(!config.bridge.args.is_empty());
    }
}
