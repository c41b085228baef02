use crate::cli::FetchArgs;
use anyhow::{Context, Result};
use std::io::{self, Write};
use std::time::Duration;
use tweetmill_common::{TweetmillError, jsonfile};
use tweetmill_config::{FetcherConfig, RateConfig};
use tweetmill_social::rate::{FixedDelay, NoDelay, RateGate, TokenBucket};
use tweetmill_social::twitter::links::parse_tweet_ids;
use tweetmill_social::twitter::{FetchEvent, Fetcher, RapidApiClient, RapidApiSettings};

pub async fn run<W: Write>(cfg: &FetcherConfig, args: FetchArgs, out: &mut W) -> Result<()> {
    let input = args.input.unwrap_or_else(|| cfg.input.clone());
    let output = args.output.unwrap_or_else(|| cfg.output.clone());

    let api_key = cfg.resolve_api_key()?;
    let client = RapidApiClient::new(RapidApiSettings {
        base_url: cfg.base_url.clone(),
        path: cfg.path.clone(),
        api_host: cfg.api_host.clone(),
        api_key,
        timeout: Duration::from_secs(cfg.timeout_secs),
    })?;
    let gate = gate_for(&cfg.rate)?;

    let text = match jsonfile::read_text(&input) {
        Ok(text) => text,
        Err(TweetmillError::MissingInput(path)) => {
            writeln!(out, "Error: {} not found.", path.display())?;
            return Ok(());
        }
        Err(err) => return Err(err.into()),
    };
    let ids = parse_tweet_ids(&text);
    tracing::info!(input = %input.display(), count = ids.len(), "fetch.start");

    let mut console: io::Result<()> = Ok(());
    let mut fetcher = Fetcher::new(client, gate);
    let report = fetcher
        .fetch_all(&ids, |event| {
            if console.is_err() {
                return;
            }
            console = match event {
                FetchEvent::Failed(failure) => {
                    writeln!(out, "Error fetching tweet {}: {}", failure.id, failure.reason)
                }
                FetchEvent::Progress { done, total } => {
                    writeln!(out, "Progress: {done}/{total} tweets processed.")
                }
            };
        })
        .await;
    if let Err(err) = console {
        tracing::warn!(error = %err, "fetch.console.closed");
    }

    jsonfile::write_pretty(&output, &report.records)
        .with_context(|| format!("failed to save {}", output.display()))?;
    writeln!(out, "Tweet details saved to {}", output.display())?;
    Ok(())
}

fn gate_for(rate: &RateConfig) -> Result<Box<dyn RateGate>> {
    let gate: Box<dyn RateGate> = match rate {
        RateConfig::Fixed { interval_ms } => {
            Box::new(FixedDelay::new(Duration::from_millis(*interval_ms)))
        }
        RateConfig::TokenBucket { qps, burst } => Box::new(TokenBucket::new(*qps, *burst)?),
        RateConfig::Off => Box::new(NoDelay),
    };
    Ok(gate)
}
