//! Artifact files under the output directory.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use common::Error;
use ladder::Bracket;
use serde::Serialize;

/// A document with a `timestamp` field (Unix milliseconds) appended.
#[derive(Debug, Serialize)]
struct Timestamped<'a, T> {
    #[serde(flatten)]
    body: &'a T,
    timestamp: i64,
}

pub fn talents_path(output: &Path, file_name: &str) -> PathBuf {
    output.join("talents").join(file_name)
}

pub fn ladder_path(output: &Path, bracket: Bracket, file_name: &str) -> PathBuf {
    output.join("pvp").join(bracket.as_str()).join(file_name)
}

/// Write `body` as pretty JSON stamped with the current time, creating
/// parent directories as needed.
pub fn write_json<T: Serialize>(path: &Path, body: &T) -> Result<(), Error> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let document = Timestamped {
        body,
        timestamp: Utc::now().timestamp_millis(),
    };
    fs::write(path, serde_json::to_string_pretty(&document)?)?;
    Ok(())
}
