//! Fetch → diff → append, as one operation.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::Result;
use crate::models::Notice;
use crate::services::NoticeSource;
use crate::storage::NoticeStore;

/// Summary of one check against the source.
#[derive(Debug, Clone, Serialize)]
pub struct CheckOutcome {
    /// Notices currently listed by the source
    pub total_count: usize,
    /// Notices stored by this check
    pub new_notices: Vec<Notice>,
    /// Notices in the store after this check
    pub saved_count: usize,
    pub last_update: Option<DateTime<Utc>>,
}

impl CheckOutcome {
    pub fn new_count(&self) -> usize {
        self.new_notices.len()
    }

    pub fn has_updates(&self) -> bool {
        !self.new_notices.is_empty()
    }

    /// Human readable summary.
    pub fn message(&self) -> String {
        if self.has_updates() {
            format!("Found {} new notification(s)", self.new_count())
        } else {
            "No new updates available".to_string()
        }
    }
}

/// Fetch the listing and store whatever is new.
///
/// The fetch runs before the store is locked.
pub async fn run_check(source: &dyn NoticeSource, store: &NoticeStore) -> Result<CheckOutcome> {
    let candidates = source.fetch().await?;
    let total_count = candidates.len();

    let new_notices = store.append_if_new(candidates).await?;
    let saved_count = store.count().await;
    let last_update = store.last_update().await;

    log::info!(
        "Check complete: {} listed, {} new, {} stored",
        total_count,
        new_notices.len(),
        saved_count
    );

    Ok(CheckOutcome {
        total_count,
        new_notices,
        saved_count,
        last_update,
    })
}
