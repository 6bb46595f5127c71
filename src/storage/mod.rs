//! Durable notice storage.
//!
//! - `local`: atomic JSON file I/O under a root directory
//! - `store`: the deduplicated notice log built on top of it

pub mod local;
pub mod store;

// Re-export for convenience
pub use local::LocalStorage;
pub use store::NoticeStore;
