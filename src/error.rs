use std::path::PathBuf;
use thiserror::Error;

/// Failure kinds surfaced while scraping.
///
/// Only `Configuration` is fatal; everything else is logged where it happens
/// and the run carries on with the next record or query.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("configuration error ({origin}): {reason}")]
    Configuration { origin: String, reason: String },

    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("extraction failed on {url}: {reason}")]
    Extraction { url: String, reason: String },

    #[error("could not write {}: {reason}", .path.display())]
    Persistence { path: PathBuf, reason: String },
}

impl ScrapeError {
    /// `origin` names the offending setting: an input path or a base URL
    pub fn configuration(origin: impl ToString, reason: impl ToString) -> Self {
        Self::Configuration {
            origin: origin.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn persistence(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::Persistence {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ScrapeError>;
