//! Search, filter and sort over cleaned tweets.
//!
//! All filters combine with AND. Sorting is stable, so records that compare
//! equal keep their file order.
use crate::twitter::types::CleanTweetRecord;
use chrono::NaiveDate;
use std::cmp::Reverse;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Order {
    /// File order.
    #[default]
    All,
    /// Most likes first.
    Popular,
    /// Newest first; records with unreadable dates last.
    Recent,
    /// Most bookmarks first.
    Discussed,
}

impl FromStr for Order {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(Order::All),
            "popular" => Ok(Order::Popular),
            "recent" => Ok(Order::Recent),
            "discussed" => Ok(Order::Discussed),
            other => Err(format!(
                "unknown order {other:?} (expected all, popular, recent or discussed)"
            )),
        }
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Order::All => "all",
            Order::Popular => "popular",
            Order::Recent => "recent",
            Order::Discussed => "discussed",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Default)]
pub struct BrowseQuery {
    /// Case-insensitive substring matched against content, username and handle.
    pub text: Option<String>,
    /// Minimum like count; 0 disables the filter.
    pub min_likes: u64,
    /// Inclusive lower date bound.
    pub since: Option<NaiveDate>,
    /// Inclusive upper date bound.
    pub until: Option<NaiveDate>,
    /// Handles to keep, with or without the leading `@`.
    pub authors: Vec<String>,
    pub order: Order,
}

impl BrowseQuery {
    pub fn apply<'a>(&self, records: &'a [CleanTweetRecord]) -> Vec<&'a CleanTweetRecord> {
        let needle = self
            .text
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_lowercase);
        let authors: Vec<String> = self
            .authors
            .iter()
            .map(|a| format!("@{}", a.trim().trim_start_matches('@').to_lowercase()))
            .collect();
        let date_bounded = self.since.is_some() || self.until.is_some();

        let mut hits: Vec<&CleanTweetRecord> = records
            .iter()
            .filter(|r| match &needle {
                Some(n) => {
                    r.content.to_lowercase().contains(n)
                        || r.username.to_lowercase().contains(n)
                        || r.handle().contains(n)
                }
                None => true,
            })
            .filter(|r| r.likes >= self.min_likes)
            .filter(|r| {
                if !date_bounded {
                    return true;
                }
                match parse_display_date(&r.created_at) {
                    Some(d) => {
                        self.since.map_or(true, |s| d >= s) && self.until.map_or(true, |u| d <= u)
                    }
                    None => false,
                }
            })
            .filter(|r| authors.is_empty() || authors.contains(&r.handle()))
            .collect();

        match self.order {
            Order::All => {}
            Order::Popular => hits.sort_by_key(|r| Reverse(r.likes)),
            Order::Recent => hits.sort_by_key(|r| Reverse(parse_display_date(&r.created_at))),
            Order::Discussed => hits.sort_by_key(|r| Reverse(r.bookmarks)),
        }
        hits
    }
}

/// Parse a cleaned date such as `10th October 2018` back into a calendar date.
pub fn parse_display_date(s: &str) -> Option<NaiveDate> {
    let mut parts = s.split_whitespace();
    let day = parts.next()?.trim_end_matches(|c: char| c.is_ascii_alphabetic());
    let month = parts.next()?;
    let year = parts.next()?;
    if parts.next().is_some() {
        return None;
    }
    NaiveDate::parse_from_str(&format!("{day} {month} {year}"), "%d %B %Y").ok()
}
