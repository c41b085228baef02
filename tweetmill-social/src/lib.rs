//! Tweet collection and shaping for tweetmill.
//!
//! [`twitter`] holds the RapidAPI lookup client, the batch fetcher, the
//! cleaner that projects raw payloads to display records, and the browser
//! that filters cleaned records. [`rate`] paces the fetcher.
pub mod rate;
pub mod twitter;
