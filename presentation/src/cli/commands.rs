//! CLI command definitions

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Output format for session reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Full report with plan, every step and the final answer
    Full,
    /// Outcome and step counts only
    Summary,
    /// JSON output
    Json,
}

impl From<OutputFormat> for ceagent_domain::OutputFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Full => ceagent_domain::OutputFormat::Full,
            OutputFormat::Summary => ceagent_domain::OutputFormat::Summary,
            OutputFormat::Json => ceagent_domain::OutputFormat::Json,
        }
    }
}

/// CLI arguments for ce-agent
#[derive(Parser, Debug)]
#[command(name = "ce-agent")]
#[command(author, version, about = "Reasoning agent driving a Cheat Engine bridge")]
#[command(long_about = r#"
ce-agent answers a reverse-engineering request by planning, calling Cheat Engine
bridge tools one at a time, and reporting what it found.

The bridge runs as a subprocess speaking JSON over its standard streams. The
planner is an external command that reads a prompt on stdin and answers on stdout.

Configuration files are loaded from (in priority order):
1. --config <path>       Explicit config file
2. ./ce-agent.toml       Project-level config
3. ~/.config/ce-agent/config.toml   Global config
Environment variables CE_AGENT_<SECTION>__<KEY> override all files.

Example:
  ce-agent "find the address holding the player's health"
  ce-agent --planner ./ask-llm.sh -o json "list the loaded modules"
  ce-agent --list-tools
"#)]
pub struct Cli {
    /// The request for the agent (not required with --list-tools or --show-config)
    pub request: Option<String>,

    /// Output format (defaults to [output].format)
    #[arg(short, long, value_enum)]
    pub output: Option<OutputFormat>,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,

    /// List the bridge tools and exit
    #[arg(long)]
    pub list_tools: bool,

    /// Bridge command, run without arguments (replaces [bridge].command and [bridge].args)
    #[arg(long, value_name = "COMMAND")]
    pub bridge: Option<String>,

    /// Planner command (overrides [planner].command)
    #[arg(long, value_name = "COMMAND")]
    pub planner: Option<String>,

    /// Maximum selection rounds (overrides [session].max_iterations)
    #[arg(long, value_name = "N")]
    pub max_iterations: Option<usize>,

    /// Session time budget in seconds (overrides [session].time_budget_secs)
    #[arg(long, value_name = "SECS")]
    pub time_budget: Option<u64>,

    /// Write diagnostic logs to this file instead of stderr
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Append a JSONL session transcript to this file
    #[arg(long, value_name = "PATH")]
    pub session_log: Option<PathBuf>,
}
