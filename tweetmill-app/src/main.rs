use anyhow::{Context, Result};
use clap::Parser;
use std::io;
use cli::{Cli, Command};
use tweetmill_common::observability::{LogConfig, init_logging};
use tweetmill_config::{DEFAULT_CONFIG_FILE, LoggingConfig, TweetmillConfig, TweetmillConfigLoader};

mod browse;
mod clean;
mod cli;
mod fetch;
mod llm;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // .env is optional; real environment variables take precedence
    dotenv::dotenv().ok();

    // 1) Load config (env wins)
    let loader = match &cli.config {
        Some(path) => TweetmillConfigLoader::new().with_file(path),
        None => TweetmillConfigLoader::new().with_optional_file(DEFAULT_CONFIG_FILE),
    };
    let cfg: TweetmillConfig = loader.load().context("failed to load configuration")?;

    // 2) Logging from the `logging` section
    let log_path = init_logging(log_config(&cfg.logging))?;
    tracing::debug!(log = %log_path.display(), "tweetmill.start");

    let mut stdout = io::stdout();
    match cli.command {
        Command::Fetch(args) => fetch::run(&cfg.fetcher, args, &mut stdout).await,
        Command::Clean(args) => clean::run(&cfg.cleaner, args),
        Command::Browse(args) => browse::run(&cfg.cleaner, args),
        Command::Llm(args) => llm::run(&cfg.ollama, args, &mut stdout).await,
    }
}

fn log_config(logging: &LoggingConfig) -> LogConfig {
    LogConfig {
        app_name: "tweetmill",
        log_dir: logging.dir.clone(),
        emit_stderr: logging.stderr,
        format: logging.format,
        default_filter: logging.filter.clone(),
    }
}
