// src/lib.rs

//! Notice Watch Library
//!
//! Detects new notices on a college notice board, keeps them in a durable
//! append-only JSON store and serves them over HTTP.

pub mod api;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod server;
pub mod services;
pub mod storage;
pub mod utils;

pub use api::{AppState, router};
