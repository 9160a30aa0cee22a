use crate::error::{Result, ScrapeError};
use crate::models::ProductRecord;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Items written so far, owned by the crawl driver
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ScrapeCounters {
    /// Reset whenever a new query starts
    pub current_query: u64,
    /// Monotonic over the whole run
    pub total: u64,
}

impl ScrapeCounters {
    pub fn start_query(&mut self) {
        self.current_query = 0;
    }

    fn record_item(&mut self) {
        self.current_query += 1;
        self.total += 1;
    }
}

/// Appends product records to `{output_dir}/{query}.json`
#[derive(Debug, Clone)]
pub struct JsonPersister {
    output_dir: PathBuf,
}

impl JsonPersister {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_path(&self, query: &str) -> PathBuf {
        let name: String = query
            .chars()
            .map(|c| if matches!(c, '/' | '\\') { '_' } else { c })
            .collect();
        self.output_dir.join(format!("{}.json", name))
    }

    /// Append one record to the query's JSON array.
    ///
    /// The file is rewritten through a temporary sibling and renamed into
    /// place, so an interrupted write never leaves a half-written array.
    /// Counters only move when the write lands.
    pub fn append(
        &self,
        record: &ProductRecord,
        query: &str,
        counters: &mut ScrapeCounters,
    ) -> Result<PathBuf> {
        let path = self.output_path(query);

        let mut items = if path.exists() {
            let raw = fs::read_to_string(&path).map_err(|e| ScrapeError::persistence(&path, e))?;
            serde_json::from_str::<Vec<ProductRecord>>(&raw).map_err(|e| {
                ScrapeError::persistence(&path, format!("existing file is not a product array: {}", e))
            })?
        } else {
            Vec::new()
        };
        items.push(record.clone());

        write_pretty(&path, &items)?;

        counters.record_item();
        info!("Current Query Items Scraped {}", counters.current_query);
        info!("All Items Scraped {}", counters.total);

        Ok(path)
    }
}

fn write_pretty<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let mut buf = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    value
        .serialize(&mut ser)
        .map_err(|e| ScrapeError::persistence(path, e))?;

    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, &buf).map_err(|e| ScrapeError::persistence(&tmp, e))?;
    if let Err(e) = fs::rename(&tmp, path) {
        if let Err(cleanup) = fs::remove_file(&tmp) {
            warn!("Could not remove {}: {}", tmp.display(), cleanup);
        }
        return Err(ScrapeError::persistence(path, e));
    }
    Ok(())
}
