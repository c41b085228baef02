//! Newline-delimited JSON decoding for streamed generations.
//!
//! [`fragments`] turns a raw byte body into a [`FragmentStream`] that stops at
//! the first chunk reporting `done: true`; [`accumulate`] drains such a stream
//! while handing each fragment to a callback. Display and concatenation stay
//! separate concerns.
use crate::traits::{FragmentStream, LlmError, Result};
use bytes::Bytes;
use futures::{Stream, StreamExt};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct StreamChunk {
    #[serde(default)]
    response: Option<String>,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    error: Option<String>,
}

/// Decode one NDJSON line. Blank lines yield `None`.
fn decode_line(line: &[u8]) -> Result<Option<StreamChunk>> {
    let trimmed = line.trim_ascii();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let chunk: StreamChunk = serde_json::from_slice(trimmed).map_err(|e| {
        LlmError::Decode(format!("{e}: {}", String::from_utf8_lossy(trimmed)))
    })?;
    if let Some(message) = chunk.error {
        return Err(LlmError::Api(message));
    }
    Ok(Some(chunk))
}

/// Text fragments from an NDJSON body.
///
/// Network chunks may split or join lines arbitrarily. Nothing after a
/// `done: true` chunk is read; a body that ends without one simply ends the
/// stream.
pub fn fragments<S, E>(body: S) -> FragmentStream
where
    S: Stream<Item = std::result::Result<Bytes, E>> + Send + 'static,
    E: Into<LlmError> + Send + 'static,
{
    Box::pin(decode(body))
}

fn decode<S, E>(body: S) -> impl Stream<Item = Result<String>> + Send
where
    S: Stream<Item = std::result::Result<Bytes, E>> + Send + 'static,
    E: Into<LlmError> + Send + 'static,
{
    async_stream::try_stream! {
        let mut body = Box::pin(body);
        let mut buf: Vec<u8> = Vec::new();
        let mut finished = false;

        'read: while let Some(next) = body.next().await {
            let bytes: Bytes = next.map_err(Into::<LlmError>::into)?;
            buf.extend_from_slice(&bytes);

            while let Some(pos) = buf.iter().position(|b| *b == b'\n') {
                let line: Vec<u8> = buf.drain(..=pos).collect();
                if let Some(chunk) = decode_line(&line)? {
                    if let Some(text) = chunk.response {
                        yield text;
                    }
                    if chunk.done {
                        finished = true;
                        break 'read;
                    }
                }
            }
        }

        if !finished {
            if let Some(chunk) = decode_line(&buf)? {
                if let Some(text) = chunk.response {
                    yield text;
                }
            }
        }
    }
}

/// Drain `stream`, calling `on_fragment` for each piece, and return the full text.
pub async fn accumulate<S, F>(stream: S, mut on_fragment: F) -> Result<String>
where
    S: Stream<Item = Result<String>> + Unpin,
    F: FnMut(&str),
{
    try_accumulate(stream, |fragment| {
        on_fragment(fragment);
        Ok::<(), LlmError>(())
    })
    .await
}

/// Like [`accumulate`], but the callback may fail. The first callback error
/// stops the drain and nothing more is read from `stream`.
pub async fn try_accumulate<S, F, E>(mut stream: S, mut on_fragment: F) -> std::result::Result<String, E>
where
    S: Stream<Item = Result<String>> + Unpin,
    F: FnMut(&str) -> std::result::Result<(), E>,
    E: From<LlmError>,
{
    let mut full = String::new();
    while let Some(fragment) = stream.next().await {
        let fragment = fragment?;
        on_fragment(&fragment)?;
        full.push_str(&fragment);
    }
    Ok(full)
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tweetmill_http::HttpError;

    fn body(parts: Vec<&'static str>) -> impl Stream<Item = std::result::Result<Bytes, HttpError>> + Send {
        stream::iter(parts.into_iter().map(|p| Ok(Bytes::from_static(p.as_bytes()))))
    }

    #[tokio::test]
    async fn concatenates_until_done() {
        let s = fragments(body(vec![
            "{\"response\":\"Hel\",\"done\":false}\n",
            "{\"response\":\"lo\",\"done\":false}\n",
            "{\"done\":true}\n",
        ]));
        let mut seen = Vec::new();
        let text = accumulate(s, |f| seen.push(f.to_string())).await.unwrap();
        assert_eq!(text, "Hello");
        assert_eq!(seen, vec!["Hel", "lo"]);
    }

    #[tokio::test]
    async fn nothing_is_read_after_done() {
        let reads = Arc::new(AtomicUsize::new(0));
        let counter = reads.clone();
        let parts = vec![
            "{\"response\":\"a\",\"done\":false}\n{\"done\":true}\n",
            "{\"response\":\"never\"}\n",
            "this is not json\n",
        ];
        let counted = stream::iter(parts).map(move |p| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok::<_, HttpError>(Bytes::from_static(p.as_bytes()))
        });

        let text = accumulate(fragments(counted), |_| {}).await.unwrap();
        assert_eq!(text, "a");
        assert_eq!(reads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn lines_split_across_network_chunks() {
        let s = fragments(body(vec![
            "{\"respo",
            "nse\":\"Hi\"}\n\n{\"response\":\" there\"",
            ",\"done\":false}\n{\"done\":",
            "true}",
        ]));
        assert_eq!(accumulate(s, |_| {}).await.unwrap(), "Hi there");
    }

    #[tokio::test]
    async fn unterminated_tail_without_done_is_used() {
        let s = fragments(body(vec!["{\"response\":\"x\"}\n{\"response\":\"y\"}"]));
        assert_eq!(accumulate(s, |_| {}).await.unwrap(), "xy");
    }

    #[tokio::test]
    async fn malformed_chunk_is_an_error() {
        let s = fragments(body(vec!["{\"response\":\"ok\"}\n", "garbage\n"]));
        let err = accumulate(s, |_| {}).await.unwrap_err();
        assert!(matches!(err, LlmError::Decode(_)));
    }

    #[tokio::test]
    async fn server_error_chunk_surfaces() {
        let s = fragments(body(vec!["{\"error\":\"model 'nope' not found\"}\n"]));
        let err = accumulate(s, |_| {}).await.unwrap_err();
        assert!(matches!(err, LlmError::Api(m) if m.contains("nope")));
    }

    #[tokio::test]
    async fn failing_callback_stops_the_drain() {
        let reads = Arc::new(AtomicUsize::new(0));
        let counter = reads.clone();
        let parts = vec!["{\"response\":\"a\"}\n", "{\"response\":\"b\"}\n"];
        let counted = stream::iter(parts).map(move |p| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok::<_, HttpError>(Bytes::from_static(p.as_bytes()))
        });

        let err = try_accumulate(fragments(counted), |_| {
            Err::<(), LlmError>(LlmError::Decode("sink closed".into()))
        })
        .await
        .unwrap_err();
        assert!(matches!(err, LlmError::Decode(m) if m == "sink closed"));
        assert_eq!(reads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn transport_error_surfaces() {
        let parts: Vec<std::result::Result<Bytes, HttpError>> = vec![
            Ok(Bytes::from_static(b"{\"response\":\"a\"}\n")),
            Err(HttpError::Network("connection reset".into())),
        ];
        let err = accumulate(fragments(stream::iter(parts)), |_| {})
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::Http(_)));
    }
}
