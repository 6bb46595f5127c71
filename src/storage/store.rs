//! The notice store.
//!
//! Owns the deduplicated notice log and its aggregates. All access goes
//! through one async mutex, held across read-modify-persist but never across
//! a network fetch. Mutations build the next state off to the side, persist
//! it, and only then swap it in, so a failed write leaves memory untouched.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::error::{AppError, Result};
use crate::models::{Candidate, Notice, StorageConfig, StoreInfo, StoreState};
use crate::pipeline::find_new;
use crate::storage::LocalStorage;

/// Durable, deduplicated record of seen notices.
#[derive(Debug)]
pub struct NoticeStore {
    data: LocalStorage,
    backups: LocalStorage,
    file_name: String,
    backup_prefix: String,
    state: Mutex<StoreState>,
}

impl NoticeStore {
    /// Open the store described by `config`.
    ///
    /// A missing, unreadable or corrupt data file is replaced by an empty
    /// store, which is persisted right away. A file that parses but breaks
    /// the store invariants counts as corrupt.
    pub async fn open(config: &StorageConfig) -> Self {
        let timeout = Duration::from_secs(config.write_timeout_secs);
        let data = LocalStorage::new(absolute(&config.dir)).with_write_timeout(timeout);
        let backups = LocalStorage::new(absolute(&config.backup_path())).with_write_timeout(timeout);

        let state = Self::load_or_init(&data, &config.file_name).await;

        Self {
            data,
            backups,
            file_name: config.file_name.clone(),
            backup_prefix: config.backup_prefix.clone(),
            state: Mutex::new(state),
        }
    }

    async fn load_or_init(data: &LocalStorage, file_name: &str) -> StoreState {
        let path = data.path(file_name);
        match data.read_bytes(file_name).await {
            Ok(Some(bytes)) => match StoreState::from_slice(&bytes) {
                Ok(state) => match state.check_invariants() {
                    Ok(()) => {
                        log::info!(
                            "Loaded {} notices from {}",
                            state.count(),
                            path.display()
                        );
                        return state;
                    }
                    Err(e) => log::warn!(
                        "Store {} violates invariants ({}), reinitializing",
                        path.display(),
                        e
                    ),
                },
                Err(e) => log::warn!(
                    "Store {} is corrupt ({}), reinitializing",
                    path.display(),
                    e
                ),
            },
            Ok(None) => log::info!("No store at {}, creating a new one", path.display()),
            Err(e) => log::warn!(
                "Store {} is unreadable ({}), reinitializing",
                path.display(),
                e
            ),
        }

        let state = StoreState::default();
        if let Err(e) = data.write_json(file_name, &state).await {
            log::error!("Failed to persist new store at {}: {}", path.display(), e);
        }
        state
    }

    async fn persist(&self, state: &StoreState, context: &str) -> Result<()> {
        self.data
            .write_json(&self.file_name, state)
            .await
            .map_err(|e| match e {
                AppError::Storage { .. } => e,
                other => AppError::storage(context, other),
            })
    }

    /// Full path of the live data file.
    pub fn location(&self) -> PathBuf {
        self.data.path(&self.file_name)
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// All notices in discovery order.
    pub async fn list_all(&self) -> Vec<Notice> {
        self.state.lock().await.notices.clone()
    }

    /// True if a notice with exactly this title and link is stored.
    pub async fn exists(&self, title: &str, link: &str) -> bool {
        self.state.lock().await.contains(title, link)
    }

    pub async fn count(&self) -> usize {
        self.state.lock().await.count()
    }

    pub async fn last_update(&self) -> Option<DateTime<Utc>> {
        self.state.lock().await.last_update
    }

    pub async fn info(&self) -> StoreInfo {
        let state = self.state.lock().await;
        StoreInfo {
            location: self.location(),
            count: state.count(),
            last_update: state.last_update,
            version: state.version.clone(),
        }
    }

    /// Store every candidate not seen before and return the stored notices.
    ///
    /// Candidates are checked in input order against the store as it was
    /// before the call; repeats within the batch keep only the first. Either
    /// all accepted notices are persisted or none are.
    pub async fn append_if_new(&self, candidates: Vec<Candidate>) -> Result<Vec<Notice>> {
        let mut state = self.state.lock().await;

        let fresh = find_new(candidates, &state.notices);
        if fresh.is_empty() {
            return Ok(Vec::new());
        }

        let now = Utc::now();
        let mut next = state.clone();
        let start = next.notices.len();
        for candidate in fresh {
            let id = next.next_id;
            next.next_id += 1;
            next.notices.push(Notice::from_candidate(id, candidate, now));
        }
        next.last_update = Some(now);

        self.persist(&next, "append").await?;
        let added = next.notices[start..].to_vec();
        *state = next;

        log::info!(
            "Stored {} new notices ({} total)",
            added.len(),
            state.count()
        );
        Ok(added)
    }

    /// Remove every notice and clear `last_update`. Returns how many were removed.
    ///
    /// The id counter keeps counting, so ids are never handed out twice.
    pub async fn reset(&self) -> Result<usize> {
        let mut state = self.state.lock().await;
        let cleared = state.count();

        let next = StoreState {
            notices: Vec::new(),
            last_update: None,
            version: state.version.clone(),
            next_id: state.next_id,
        };
        self.persist(&next, "reset").await?;
        *state = next;

        log::info!("Cleared {} notices from storage", cleared);
        Ok(cleared)
    }

    /// Write the current state to a new, uniquely named backup file.
    pub async fn backup(&self) -> Result<PathBuf> {
        let state = self.state.lock().await;
        let path = self.next_backup_path().await?;

        self.backups
            .write_json(&path, &*state)
            .await
            .map_err(|e| AppError::storage("backup", e))?;

        log::info!("Backup of {} notices written to {}", state.count(), path.display());
        Ok(path)
    }

    /// `<prefix>_<unix millis>.json`, with a `-N` suffix if that name is taken.
    /// Only called with the state lock held.
    async fn next_backup_path(&self) -> Result<PathBuf> {
        let stem = format!("{}_{}", self.backup_prefix, Utc::now().timestamp_millis());
        let mut path = self.backups.path(format!("{stem}.json"));
        let mut n = 1;
        while self.backups.exists(&path).await? {
            path = self.backups.path(format!("{stem}-{n}.json"));
            n += 1;
        }
        Ok(path)
    }

    /// Replace the live state with a backup.
    ///
    /// Returns `Ok(false)` and leaves the store untouched when the backup
    /// cannot be read or is not a valid store document. Relative paths are
    /// resolved against the backup directory.
    pub async fn restore(&self, backup: impl AsRef<Path>) -> Result<bool> {
        let path = self.backups.path(backup);

        let mut restored = match self.backups.read_bytes(&path).await {
            Ok(Some(bytes)) => match StoreState::from_slice(&bytes) {
                Ok(state) => state,
                Err(e) => {
                    log::warn!("Backup {} is not a valid store: {}", path.display(), e);
                    return Ok(false);
                }
            },
            Ok(None) => {
                log::warn!("Backup {} not found", path.display());
                return Ok(false);
            }
            Err(e) => {
                log::warn!("Backup {} is unreadable: {}", path.display(), e);
                return Ok(false);
            }
        };

        if let Err(e) = restored.check_invariants() {
            log::warn!("Backup {} rejected: {}", path.display(), e);
            return Ok(false);
        }

        let mut state = self.state.lock().await;
        restored.next_id = restored.next_id.max(state.next_id);
        self.persist(&restored, "restore").await?;
        *state = restored;

        log::info!(
            "Restored {} notices from {}",
            state.count(),
            path.display()
        );
        Ok(true)
    }

    /// Persist the in-memory state as it is.
    pub async fn flush(&self) -> Result<()> {
        let state = self.state.lock().await;
        self.persist(&state, "flush").await
    }

    /// Final best-effort flush, bounded by `timeout`.
    pub async fn shutdown(&self, timeout: Duration) {
        log::info!("Saving data before shutdown...");
        match tokio::time::timeout(timeout, self.flush()).await {
            Ok(Ok(())) => log::info!("Store flushed to {}", self.location().display()),
            Ok(Err(e)) => log::error!("Final flush failed: {}", e),
            Err(_) => log::error!("Final flush timed out after {:?}", timeout),
        }
    }

    /// Check that the data file is still reachable on disk.
    pub async fn health_check(&self) -> Result<()> {
        if self.data.exists(&self.file_name).await? {
            Ok(())
        } else {
            Err(AppError::storage(
                "health check",
                format!("{} is missing", self.location().display()),
            ))
        }
    }
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}
