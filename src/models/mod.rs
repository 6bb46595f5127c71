// src/models/mod.rs

//! Domain models for the notice service.

mod config;
mod notice;
mod state;

// Re-export all public types
pub use config::{Config, LoggingConfig, ServerConfig, ServiceConfig, SourceConfig, StorageConfig};
pub use notice::{Candidate, Notice};
pub use state::{STORAGE_VERSION, StoreInfo, StoreState};
