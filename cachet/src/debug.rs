//! Cache contents report for development builds.

use std::fmt;

use cachet_backend::EntryInfo;
use comfy_table::Table;
use tracing::debug;

const KEY_WIDTH: usize = 80;

/// One row of a [`DebugReport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebugRow {
    /// Request method, `-` for explicit keys.
    pub method: String,
    /// Request path, `-` for explicit keys.
    pub url: String,
    /// Whether the entry would still be served.
    pub has_data: bool,
    /// Rendered key, truncated.
    pub key: String,
}

/// Snapshot of every stored entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DebugReport {
    /// Entry rows, sorted by key.
    pub rows: Vec<DebugRow>,
}

impl DebugReport {
    pub(crate) fn from_entries(entries: Vec<EntryInfo>) -> Self {
        let rows = entries
            .into_iter()
            .map(|entry| DebugRow {
                method: entry.key.method().unwrap_or("-").to_owned(),
                url: entry.key.path().unwrap_or("-").to_owned(),
                has_data: entry.fresh,
                key: truncate(entry.key.as_str(), KEY_WIDTH),
            })
            .collect();
        Self { rows }
    }

    /// Number of entries.
    pub fn size(&self) -> usize {
        self.rows.len()
    }

    /// The rows as a table.
    pub fn table(&self) -> Table {
        let mut table = Table::new();
        table.set_header(vec!["Method", "URL", "HasData", "CacheKey"]);
        for row in &self.rows {
            table.add_row(vec![
                row.method.clone(),
                row.url.clone(),
                row.has_data.to_string(),
                row.key.clone(),
            ]);
        }
        table
    }

    /// Emits the report at debug level.
    pub fn log(&self) {
        debug!(size = self.size(), "cache report\n{}", self);
    }
}

impl fmt::Display for DebugReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.rows.is_empty() {
            return f.write_str("No cache entries found");
        }
        writeln!(f, "Total cache entries: {}", self.size())?;
        write!(f, "{}", self.table())
    }
}

fn truncate(key: &str, width: usize) -> String {
    match key.char_indices().nth(width) {
        Some((at, _)) => format!("{}...", &key[..at]),
        None => key.to_owned(),
    }
}
