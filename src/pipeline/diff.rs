//! Change detection between a fetched listing and the stored notices.
//!
//! A notice is identified by its exact `(title, link)` pair. A candidate is
//! new when that pair is absent from the snapshot taken before the batch;
//! when the same pair appears more than once in one batch, only the first
//! occurrence is new.

use std::collections::HashSet;

use crate::models::{Candidate, Notice};

/// Split `candidates` into the ones not present in `saved`, keeping input order.
pub fn find_new(candidates: Vec<Candidate>, saved: &[Notice]) -> Vec<Candidate> {
    let known: HashSet<(&str, &str)> = saved.iter().map(Notice::key).collect();
    let mut seen: HashSet<(String, String)> = HashSet::new();

    candidates
        .into_iter()
        .filter(|c| {
            !known.contains(&c.key()) && seen.insert((c.title.clone(), c.link.clone()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn candidate(title: &str, link: &str) -> Candidate {
        Candidate::new(title, link, Utc::now())
    }

    fn stored(id: u64, title: &str, link: &str) -> Notice {
        Notice::from_candidate(id, candidate(title, link), Utc::now())
    }

    #[test]
    fn test_empty_store() {
        let result = find_new(
            vec![candidate("A", "https://x/a"), candidate("B", "https://x/b")],
            &[],
        );
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn test_no_changes() {
        let saved = vec![stored(1, "A", "https://x/a")];
        let result = find_new(vec![candidate("A", "https://x/a")], &saved);
        assert!(result.is_empty());
    }

    #[test]
    fn test_only_unknown_returned_in_order() {
        let saved = vec![stored(1, "T1", "https://x/1")];
        let result = find_new(
            vec![
                candidate("T3", "https://x/3"),
                candidate("T1", "https://x/1"),
                candidate("T2", "https://x/2"),
            ],
            &saved,
        );
        let titles: Vec<_> = result.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["T3", "T2"]);
    }

    #[test]
    fn test_batch_duplicates_first_wins() {
        let first = Candidate::new("A", "https://x/a", Utc::now());
        let later = Candidate::new("A", "https://x/a", first.timestamp + chrono::Duration::seconds(5));
        let result = find_new(vec![first.clone(), later], &[]);
        assert_eq!(result, vec![first]);
    }

    #[test]
    fn test_same_title_new_link_is_new() {
        let saved = vec![stored(1, "Exam Notice", "https://x/old")];
        let result = find_new(vec![candidate("Exam Notice", "https://x/new")], &saved);
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn test_key_is_not_normalized() {
        let saved = vec![stored(1, "Exam Notice", "https://x/n1")];
        let result = find_new(
            vec![
                candidate("Exam Notice ", "https://x/n1"),
                candidate("Exam Notice", "https://X/n1"),
            ],
            &saved,
        );
        assert_eq!(result.len(), 2);
    }
}
