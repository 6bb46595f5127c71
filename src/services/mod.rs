//! Service layer.
//!
//! - Notice fetching (`HtmlNoticeSource`, behind the `NoticeSource` trait)

mod notices;

pub use notices::{HtmlNoticeSource, ListingSelectors, NoticeSource, parse_listing};
