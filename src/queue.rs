use crate::error::{Result, ScrapeError};
use std::path::Path;
use tracing::{info, warn};

/// Pending search keywords, consumed last-in-first-out
#[derive(Debug, Default)]
pub struct QueryQueue {
    queries: Vec<String>,
}

impl QueryQueue {
    /// Load keywords from a JSON array of strings.
    ///
    /// Any failure here is a configuration error and must stop the run.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| ScrapeError::configuration(path.display(), e))?;
        let entries: Vec<String> =
            serde_json::from_str(&raw).map_err(|e| ScrapeError::configuration(path.display(), e))?;

        let total = entries.len();
        let queries: Vec<String> = entries
            .into_iter()
            .map(|q| q.trim().to_string())
            .filter(|q| !q.is_empty())
            .collect();

        if queries.len() < total {
            warn!(
                "Ignored {} blank keyword(s) in {}",
                total - queries.len(),
                path.display()
            );
        }
        info!("Loaded {} search keywords from {}", queries.len(), path.display());

        Ok(Self { queries })
    }

    #[cfg(test)]
    pub fn from_queries<I, S>(queries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            queries: queries.into_iter().map(Into::into).collect(),
        }
    }

    /// Remove and return the most recently loaded keyword
    pub fn pop_next(&mut self) -> Option<String> {
        self.queries.pop()
    }

    pub fn len(&self) -> usize {
        self.queries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }
}
