//! Change detection pipeline.
//!
//! - `diff`: find the candidates not yet stored
//! - `check`: fetch the source and store whatever is new

pub mod check;
pub mod diff;

pub use check::{CheckOutcome, run_check};
pub use diff::find_new;
