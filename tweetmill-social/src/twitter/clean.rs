//! Projection of raw RapidAPI payloads into [`CleanTweetRecord`]s.
//!
//! Output order is the reverse of the input order. [`clean_all`] stops at the
//! first bad record and returns nothing else; [`clean_lenient`] keeps going and
//! reports every bad record alongside the good ones.
use crate::twitter::types::{CleanTweetRecord, RawTweetRecord, status_url};
use chrono::{DateTime, Datelike, Weekday};
use serde::Deserialize;
use serde_json::Value;

/// Timestamp layout of Twitter's legacy `created_at`, e.g. `Wed Oct 10 20:19:24 +0000 2018`.
pub const SOURCE_DATE_FORMAT: &str = "%a %b %d %H:%M:%S %z %Y";

#[derive(Debug, thiserror::Error)]
pub enum CleanError {
    #[error("record {index}: {source}")]
    Shape {
        index: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("record {index}: unparseable created_at {value:?}: {source}")]
    Timestamp {
        index: usize,
        value: String,
        #[source]
        source: chrono::ParseError,
    },
}

impl CleanError {
    /// Position of the offending record in the raw input list.
    pub fn index(&self) -> usize {
        match self {
            CleanError::Shape { index, .. } | CleanError::Timestamp { index, .. } => *index,
        }
    }
}

/// Result of a lenient run.
#[derive(Debug, Default)]
pub struct CleanReport {
    pub records: Vec<CleanTweetRecord>,
    pub failures: Vec<CleanError>,
}

/// English ordinal suffix for a day of the month.
pub fn ordinal_suffix(day: u32) -> &'static str {
    if (11..=13).contains(&(day % 100)) {
        return "th";
    }
    match day % 10 {
        1 => "st",
        2 => "nd",
        3 => "rd",
        _ => "th",
    }
}

/// Layout of the timestamp once the leading weekday name is split off.
const DATE_WITHOUT_WEEKDAY: &str = "%b %d %H:%M:%S %z %Y";

/// Reformat a legacy timestamp as `<day><suffix> <Month> <year>`.
///
/// The day is taken in the timestamp's own offset. The weekday name must be a
/// real weekday but need not agree with the date.
///
/// ```
/// use tweetmill_social::twitter::clean::pretty_date;
///
/// assert_eq!(pretty_date("Wed Oct 10 20:19:24 +0000 2018").unwrap(), "10th October 2018");
/// ```
pub fn pretty_date(raw: &str) -> Result<String, chrono::ParseError> {
    let dt = match raw.trim_start().split_once(' ') {
        Some((weekday, rest)) if weekday.parse::<Weekday>().is_ok() => {
            DateTime::parse_from_str(rest.trim_start(), DATE_WITHOUT_WEEKDAY)?
        }
        _ => DateTime::parse_from_str(raw, SOURCE_DATE_FORMAT)?,
    };
    let day = dt.day();
    Ok(format!("{day}{} {}", ordinal_suffix(day), dt.format("%B %Y")))
}

/// Project one raw payload. `index` is only used for error reporting.
pub fn clean_record(index: usize, raw: &Value) -> Result<CleanTweetRecord, CleanError> {
    let rec = RawTweetRecord::deserialize(raw).map_err(|source| CleanError::Shape { index, source })?;
    let created_at = pretty_date(&rec.tweet.created_at).map_err(|source| CleanError::Timestamp {
        index,
        value: rec.tweet.created_at.clone(),
        source,
    })?;

    let legacy = rec.user.legacy;
    let tweet = rec.tweet;
    Ok(CleanTweetRecord {
        tweet_url: status_url(&legacy.screen_name, &tweet.conversation_id_str),
        profile_img: legacy.profile_image_url_https,
        username: legacy.screen_name,
        created_at,
        likes: tweet.favorite_count,
        bookmarks: tweet.bookmark_count,
        reposts: tweet.retweet_count,
        content: tweet.full_text,
    })
}

/// All-or-nothing projection: the first bad record aborts the whole batch.
pub fn clean_all(raw: &[Value]) -> Result<Vec<CleanTweetRecord>, CleanError> {
    raw.iter()
        .enumerate()
        .rev()
        .map(|(index, value)| clean_record(index, value))
        .collect()
}

/// Per-record projection: bad records are reported, good ones kept.
pub fn clean_lenient(raw: &[Value]) -> CleanReport {
    let mut report = CleanReport::default();
    for (index, value) in raw.iter().enumerate().rev() {
        match clean_record(index, value) {
            Ok(rec) => report.records.push(rec),
            Err(err) => {
                tracing::warn!(index, error = %err, "clean.record.skipped");
                report.failures.push(err);
            }
        }
    }
    report
}
