use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "tdigest", version, about = "Weekly AI-written digest of completed Todoist tasks")]
pub struct Cli {
    /// Config file path
    #[arg(long, env = "TDIGEST_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Debug-level logging (RUST_LOG overrides)
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Fetch, group, summarize, save, and optionally email one week
    Run(RunArgs),
    /// Print one week's grouped completed tasks as JSON
    Tasks(TasksArgs),
    /// List stored summaries
    History(HistoryArgs),
}

#[derive(Parser)]
pub struct RunArgs {
    /// Any date in the week to summarize (YYYY-MM-DD). Default: last completed week
    #[arg(long)]
    pub week_of: Option<String>,

    /// Do not send the email even if enabled in config
    #[arg(long)]
    pub no_email: bool,

    /// Print the prompt and stop: no model call, nothing saved or sent
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Parser)]
pub struct TasksArgs {
    /// Any date in the week (YYYY-MM-DD). Default: last completed week
    #[arg(long)]
    pub week_of: Option<String>,
}

#[derive(Parser)]
pub struct HistoryArgs {
    /// Show at most this many summaries, newest last (default 10)
    #[arg(long, default_value = "10")]
    pub limit: usize,
}
