//! Notice data structures.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A notice as observed on the source page, before it is stored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Candidate {
    /// Notice title
    pub title: String,

    /// Absolute URL to the notice
    pub link: String,

    /// When the listing was fetched
    pub timestamp: DateTime<Utc>,
}

impl Candidate {
    pub fn new(title: impl Into<String>, link: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            title: title.into(),
            link: link.into(),
            timestamp,
        }
    }

    /// Identity key of the notice.
    pub fn key(&self) -> (&str, &str) {
        (&self.title, &self.link)
    }
}

/// A stored notice. Never modified after it is created.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Notice {
    /// Store-assigned id, strictly increasing from 1
    pub id: u64,

    /// Notice title
    pub title: String,

    /// Absolute URL to the notice
    pub link: String,

    /// When the notice was observed on the source
    pub timestamp: DateTime<Utc>,

    /// When the notice was first persisted
    pub created_at: DateTime<Utc>,
}

impl Notice {
    /// Promote a candidate into a stored notice.
    pub fn from_candidate(id: u64, candidate: Candidate, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            title: candidate.title,
            link: candidate.link,
            timestamp: candidate.timestamp,
            created_at,
        }
    }

    /// Identity key of the notice.
    pub fn key(&self) -> (&str, &str) {
        (&self.title, &self.link)
    }

    /// True if this notice has exactly the given title and link.
    pub fn matches(&self, title: &str, link: &str) -> bool {
        self.title == title && self.link == link
    }
}
