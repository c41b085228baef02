//! Minimal wrapper around the RapidAPI `twitter241` tweet lookup endpoint.
//!
//! One call is one `GET <base>/<path>?pid=<id>` carrying the RapidAPI key and
//! host headers. The payload is returned untouched; shaping happens in
//! [`crate::twitter::clean`].
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;
use std::borrow::Cow;
use std::time::Duration;
use tweetmill_http::{HttpClient, RequestOpts, secret_header};

const KEY_HEADER: &str = "x-rapidapi-key";
const HOST_HEADER: &str = "x-rapidapi-host";

/// Anything that can turn a tweet identifier into a raw JSON payload.
#[async_trait]
pub trait TweetLookup: Send + Sync {
    async fn lookup(&self, tweet_id: &str) -> Result<Value>;
}

/// Connection details for the RapidAPI tweet endpoint.
#[derive(Debug, Clone)]
pub struct RapidApiSettings {
    pub base_url: String,
    pub path: String,
    pub api_host: String,
    pub api_key: String,
    pub timeout: Duration,
}

#[derive(Clone)]
pub struct RapidApiClient {
    http: HttpClient,
    path: String,
    headers: HeaderMap,
}

impl RapidApiClient {
    pub fn new(settings: RapidApiSettings) -> Result<Self> {
        let http = HttpClient::new(&settings.base_url)
            .context("invalid RapidAPI base url")?
            .with_timeout(settings.timeout);

        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static(KEY_HEADER),
            secret_header(&settings.api_key).context("invalid RapidAPI key")?,
        );
        headers.insert(
            HeaderName::from_static(HOST_HEADER),
            HeaderValue::from_str(&settings.api_host).context("invalid RapidAPI host")?,
        );

        Ok(Self {
            http,
            path: settings.path,
            headers,
        })
    }
}

#[async_trait]
impl TweetLookup for RapidApiClient {
    async fn lookup(&self, tweet_id: &str) -> Result<Value> {
        let payload: Value = self
            .http
            .get_json(
                &self.path,
                RequestOpts {
                    headers: Some(self.headers.clone()),
                    query: Some(vec![("pid", Cow::Borrowed(tweet_id))]),
                    ..Default::default()
                },
            )
            .await?;

        tracing::debug!(tweet_id, "rapidapi.lookup.ok");
        Ok(payload)
    }
}
