//! Persisted store document.

use std::collections::HashSet;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Notice;

/// Schema version written into every store document.
pub const STORAGE_VERSION: &str = "1.0.0";

/// The whole store as it lives on disk and in memory.
///
/// ```json
/// {
///   "notices": [{ "id": 1, "title": "...", "link": "...", "timestamp": "...", "created_at": "..." }],
///   "lastUpdate": "2026-10-16T09:00:00Z",
///   "version": "1.0.0",
///   "nextId": 2
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StoreState {
    /// Notices in discovery order
    pub notices: Vec<Notice>,

    /// Set whenever notices are added, cleared on reset
    #[serde(default)]
    pub last_update: Option<DateTime<Utc>>,

    #[serde(default = "default_version")]
    pub version: String,

    /// Next id to assign. Older documents omit it.
    #[serde(default)]
    pub next_id: u64,
}

fn default_version() -> String {
    STORAGE_VERSION.to_string()
}

impl Default for StoreState {
    fn default() -> Self {
        Self {
            notices: Vec::new(),
            last_update: None,
            version: default_version(),
            next_id: 1,
        }
    }
}

impl StoreState {
    /// Parse a store document and repair its id counter.
    pub fn from_slice(bytes: &[u8]) -> serde_json::Result<Self> {
        let mut state: StoreState = serde_json::from_slice(bytes)?;
        state.normalize();
        Ok(state)
    }

    /// Raise `next_id` above every stored id.
    pub fn normalize(&mut self) {
        let floor = self.max_id() + 1;
        if self.next_id < floor {
            self.next_id = floor;
        }
    }

    /// Largest id in the store, 0 when empty.
    pub fn max_id(&self) -> u64 {
        self.notices.iter().map(|n| n.id).max().unwrap_or(0)
    }

    pub fn count(&self) -> usize {
        self.notices.len()
    }

    pub fn contains(&self, title: &str, link: &str) -> bool {
        self.notices.iter().any(|n| n.matches(title, link))
    }

    /// Check the store invariants: unique `(title, link)` keys, ids
    /// strictly increasing in insertion order, a `last_update` whenever
    /// notices are present, and the current schema version.
    pub fn check_invariants(&self) -> std::result::Result<(), String> {
        if self.version != STORAGE_VERSION {
            return Err(format!(
                "version {} is not {}",
                self.version, STORAGE_VERSION
            ));
        }
        if !self.notices.is_empty() && self.last_update.is_none() {
            return Err(format!("{} notices but no lastUpdate", self.notices.len()));
        }

        let mut keys = HashSet::new();
        let mut last_id = 0;
        for notice in &self.notices {
            if !keys.insert(notice.key()) {
                return Err(format!(
                    "duplicate notice '{}' -> {}",
                    notice.title, notice.link
                ));
            }
            if notice.id <= last_id {
                return Err(format!("id {} is not greater than {}", notice.id, last_id));
            }
            last_id = notice.id;
        }
        Ok(())
    }
}

/// Read-only metadata for diagnostics.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct StoreInfo {
    /// Path of the data file
    pub location: PathBuf,
    pub count: usize,
    pub last_update: Option<DateTime<Utc>>,
    pub version: String,
}
