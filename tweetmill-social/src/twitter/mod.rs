//! Twitter/X tweet lookup pipeline.
//!
//! Links are parsed into identifiers ([`links`]), fetched one at a time through
//! RapidAPI ([`client`], [`fetch`]), projected to flat records ([`clean`]) and
//! queried ([`browse`]). Each stage hands the next a JSON file.
pub mod browse;
pub mod clean;
pub mod client;
pub mod fetch;
pub mod links;
pub mod types;

pub use client::{RapidApiClient, RapidApiSettings, TweetLookup};
pub use fetch::{FetchEvent, FetchFailure, FetchReport, Fetcher};
pub use types::CleanTweetRecord;
