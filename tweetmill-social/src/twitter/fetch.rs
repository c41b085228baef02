//! Sequential batch lookup of tweet identifiers.
//!
//! Best-effort semantics: a failing identifier is logged and dropped, the
//! batch carries on, and the surviving payloads keep their input order.
use crate::rate::RateGate;
use crate::twitter::client::TweetLookup;
use serde_json::Value;

/// An identifier whose lookup failed, and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchFailure {
    pub id: String,
    pub reason: String,
}

/// Outcome of a batch: successful payloads in input order, plus failures.
#[derive(Debug, Default)]
pub struct FetchReport {
    pub records: Vec<Value>,
    pub failures: Vec<FetchFailure>,
}

/// Progress notifications emitted while a batch runs.
#[derive(Debug)]
pub enum FetchEvent<'a> {
    Failed(&'a FetchFailure),
    Progress { done: usize, total: usize },
}

pub struct Fetcher<L, G> {
    lookup: L,
    gate: G,
}

impl<L, G> Fetcher<L, G>
where
    L: TweetLookup,
    G: RateGate,
{
    pub fn new(lookup: L, gate: G) -> Self {
        Self { lookup, gate }
    }

    /// Look up every identifier once, in order.
    ///
    /// `on_event` sees each failure as it happens and a progress tick after
    /// every identifier, including failed ones.
    pub async fn fetch_all<F>(&mut self, ids: &[String], mut on_event: F) -> FetchReport
    where
        F: FnMut(FetchEvent<'_>),
    {
        let total = ids.len();
        let mut report = FetchReport::default();

        for (index, id) in ids.iter().enumerate() {
            self.gate.acquire().await;
            let outcome = self.lookup.lookup(id).await;
            self.gate.cooldown().await;

            match outcome {
                Ok(payload) => report.records.push(payload),
                Err(err) => {
                    tracing::warn!(tweet_id = %id, error = %format!("{err:#}"), "fetch.tweet.failed");
                    let failure = FetchFailure {
                        id: id.clone(),
                        reason: format!("{err:#}"),
                    };
                    on_event(FetchEvent::Failed(&failure));
                    report.failures.push(failure);
                }
            }

            on_event(FetchEvent::Progress {
                done: index + 1,
                total,
            });
        }

        tracing::info!(
            total,
            fetched = report.records.len(),
            failed = report.failures.len(),
            "fetch.batch.done"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rate::NoDelay;
    use anyhow::{Result, bail};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    /// Answers with `{"id": <id>}` unless the id is listed as failing.
    struct Scripted {
        failing: Vec<&'static str>,
        seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl TweetLookup for Scripted {
        async fn lookup(&self, tweet_id: &str) -> Result<Value> {
            self.seen.lock().unwrap().push(tweet_id.to_string());
            if self.failing.iter().any(|f| *f == tweet_id) {
                bail!("server returned error 404 Not Found");
            }
            Ok(json!({ "id": tweet_id }))
        }
    }

    /// Counts hook invocations.
    #[derive(Default)]
    struct CountingGate {
        acquired: usize,
        cooled: usize,
    }

    #[async_trait]
    impl RateGate for CountingGate {
        async fn acquire(&mut self) {
            self.acquired += 1;
        }
        async fn cooldown(&mut self) {
            self.cooled += 1;
        }
    }

    fn ids(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn failures_are_skipped_and_order_is_kept() {
        let lookup = Scripted {
            failing: vec!["2", "4"],
            seen: Mutex::new(Vec::new()),
        };
        let mut fetcher = Fetcher::new(lookup, NoDelay);
        let report = fetcher.fetch_all(&ids(&["1", "2", "3", "4", "5"]), |_| {}).await;

        let got: Vec<_> = report.records.iter().map(|v| v["id"].clone()).collect();
        assert_eq!(got, vec![json!("1"), json!("3"), json!("5")]);
        assert_eq!(
            report.failures.iter().map(|f| f.id.as_str()).collect::<Vec<_>>(),
            vec!["2", "4"]
        );
        assert!(report.failures[0].reason.contains("404"));
    }

    #[tokio::test]
    async fn every_identifier_is_requested_once_and_paced() {
        let lookup = Scripted {
            failing: vec!["b"],
            seen: Mutex::new(Vec::new()),
        };
        let mut fetcher = Fetcher::new(lookup, CountingGate::default());
        fetcher.fetch_all(&ids(&["a", "b", "c"]), |_| {}).await;

        assert_eq!(*fetcher.lookup.seen.lock().unwrap(), vec!["a", "b", "c"]);
        assert_eq!(fetcher.gate.acquired, 3);
        assert_eq!(fetcher.gate.cooled, 3);
    }

    #[tokio::test]
    async fn progress_is_reported_after_each_identifier() {
        let lookup = Scripted {
            failing: vec!["y"],
            seen: Mutex::new(Vec::new()),
        };
        let mut fetcher = Fetcher::new(lookup, NoDelay);
        let mut log = Vec::new();
        fetcher
            .fetch_all(&ids(&["x", "y"]), |event| match event {
                FetchEvent::Failed(f) => log.push(format!("failed {}", f.id)),
                FetchEvent::Progress { done, total } => log.push(format!("{done}/{total}")),
            })
            .await;

        assert_eq!(log, vec!["1/2", "failed y", "2/2"]);
    }

    #[tokio::test]
    async fn empty_batch_yields_empty_report() {
        let lookup = Scripted {
            failing: vec![],
            seen: Mutex::new(Vec::new()),
        };
        let mut fetcher = Fetcher::new(lookup, NoDelay);
        let report = fetcher.fetch_all(&[], |_| {}).await;
        assert!(report.records.is_empty());
        assert!(report.failures.is_empty());
    }
}
