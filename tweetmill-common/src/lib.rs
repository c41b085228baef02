//! Common types and utilities shared across tweetmill crates.
//!
//! This crate defines the shared error type, JSON file helpers, and the
//! observability setup used by every other crate in the workspace. It stays
//! small so that all crates can depend on it without heavy transitive costs.
//!
//! # Overview
//!
//! - [`observability`]: Centralised tracing/logging initialisation
//! - [`jsonfile`]: Reading and writing the 4-space indented JSON files that
//!   the fetcher and cleaner hand to each other
//! - [`TweetmillError`] and [`Result`]: Shared error handling
//!
//! # Examples
//!
//! ```rust
//! use std::path::Path;
//! use tweetmill_common::{jsonfile, TweetmillError};
//!
//! let err = jsonfile::read_text(Path::new("no-such-batch.txt")).unwrap_err();
//! assert!(matches!(err, TweetmillError::MissingInput(_)));
//! assert_eq!(err.to_string(), "no-such-batch.txt not found.");
//! ```
use std::path::PathBuf;

pub mod jsonfile;
pub mod observability;

/// Error types used across the tweetmill workspace.
#[derive(thiserror::Error, Debug)]
pub enum TweetmillError {
    /// A required input file does not exist.
    #[error("{} not found.", .0.display())]
    MissingInput(PathBuf),

    /// Reading or writing a file failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A file did not contain the JSON we expected.
    #[error("JSON error in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Convenient alias for results that use [`TweetmillError`].
pub type Result<T> = std::result::Result<T, TweetmillError>;
