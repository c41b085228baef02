use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tweetmill_social::twitter::browse::Order;

/// Fetch, clean and browse tweets, and talk to a local model server.
#[derive(Debug, Parser)]
#[command(name = "tweetmill", version, about)]
pub struct Cli {
    /// YAML configuration file. Defaults to ./tweetmill.yaml when present.
    #[arg(long, global = true, env = "TWEETMILL_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Look up every tweet URL in a file and save the raw API payloads.
    Fetch(FetchArgs),
    /// Reshape fetched payloads into display records.
    Clean(CleanArgs),
    /// Search, filter and sort cleaned tweets.
    Browse(BrowseArgs),
    /// Call a model on a local Ollama server.
    Llm(LlmArgs),
}

#[derive(Debug, Args)]
pub struct FetchArgs {
    /// Text file with one tweet URL per line.
    #[arg(long)]
    pub input: Option<PathBuf>,
    /// Where to write the raw payloads.
    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct CleanArgs {
    /// Raw payloads written by `fetch`.
    #[arg(long)]
    pub input: Option<PathBuf>,
    #[arg(long)]
    pub output: Option<PathBuf>,
    /// Report and drop bad records instead of aborting.
    #[arg(long)]
    pub skip_invalid: bool,
}

#[derive(Debug, Args)]
pub struct BrowseArgs {
    /// Cleaned records written by `clean`.
    #[arg(long)]
    pub input: Option<PathBuf>,
    /// Case-insensitive text matched against content, username and handle.
    pub query: Option<String>,
    #[arg(long, default_value_t = 0)]
    pub min_likes: u64,
    /// Earliest date to keep (YYYY-MM-DD).
    #[arg(long)]
    pub since: Option<NaiveDate>,
    /// Latest date to keep (YYYY-MM-DD).
    #[arg(long)]
    pub until: Option<NaiveDate>,
    /// Keep only these handles. Repeatable.
    #[arg(long = "author")]
    pub authors: Vec<String>,
    /// all, popular, recent or discussed.
    #[arg(long, default_value_t = Order::All)]
    pub order: Order,
    /// Print matches as JSON instead of a listing.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct LlmArgs {
    /// Model name to use.
    #[arg(long)]
    pub model: Option<String>,
    /// Ollama host URL.
    #[arg(long)]
    pub host: Option<String>,
    #[arg(long)]
    pub temperature: Option<f32>,
    /// Maximum tokens to generate.
    #[arg(long)]
    pub max_tokens: Option<u32>,
    /// Optional system prompt.
    #[arg(long)]
    pub system: Option<String>,
    /// List available models and exit.
    #[arg(long)]
    pub list_models: bool,
    /// Prompt to send. Asked for interactively when absent.
    #[arg(long)]
    pub prompt: Option<String>,
    /// Wait for the whole response instead of streaming it.
    #[arg(long)]
    pub no_stream: bool,
}
