//! JSON file handoff between the pipeline stages.
//!
//! Every file the fetcher and cleaner write is a UTF-8 JSON document indented
//! with four spaces. Existing files are overwritten.

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};

use crate::{Result, TweetmillError};

const INDENT: &[u8] = b"    ";

/// Serialize `value` with four-space indentation.
pub fn to_string_indented<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<String> {
    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(INDENT);
    let mut ser = Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut ser)?;
    // serde_json only ever emits valid UTF-8.
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Write `value` to `path`, replacing any previous contents.
pub fn write_pretty<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let text = to_string_indented(value).map_err(|source| TweetmillError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, text).map_err(|source| TweetmillError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(path = %path.display(), "jsonfile.written");
    Ok(())
}

/// Read and decode a JSON document from `path`.
///
/// A missing file maps to [`TweetmillError::MissingInput`] so callers can
/// report it separately from malformed content.
pub fn read<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = read_text(path)?;
    serde_json::from_str(&text).map_err(|source| TweetmillError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Read a UTF-8 text file, mapping a missing file to [`TweetmillError::MissingInput`].
pub fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            TweetmillError::MissingInput(path.to_path_buf())
        } else {
            TweetmillError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })
}
