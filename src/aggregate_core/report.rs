//! Aggregate report generation over a window snapshot

use crate::stream_core::parser::Event;
use std::collections::{HashMap, HashSet};

/// Per-minute aggregate derived from the current window. Ephemeral: rendered
/// once and discarded, never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub minute: u64,
    /// Domains by descending distinct-page count.
    pub domains: Vec<DomainCount>,
    /// Users of the distinguished domain by descending max edit count.
    pub users: Vec<UserEdits>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainCount {
    pub domain: String,
    pub pages: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserEdits {
    pub user: String,
    pub max_edit_count: u64,
}

/// Compute the aggregate report for one window snapshot.
///
/// Pure function of the snapshot: safe to call repeatedly, deterministic
/// ordering (ties broken by name so re-renders are stable).
pub fn generate<'a, I>(events: I, distinguished_domain: &str, minute: u64) -> Report
where
    I: IntoIterator<Item = &'a Event>,
{
    let mut pages_by_domain: HashMap<&str, HashSet<&str>> = HashMap::new();
    let mut max_edits_by_user: HashMap<&str, u64> = HashMap::new();

    for event in events {
        pages_by_domain
            .entry(event.domain.as_str())
            .or_default()
            .insert(event.page_title.as_str());

        if event.domain == distinguished_domain {
            let max = max_edits_by_user.entry(event.user.as_str()).or_insert(0);
            *max = (*max).max(event.user_edit_count);
        }
    }

    let mut domains: Vec<DomainCount> = pages_by_domain
        .into_iter()
        .map(|(domain, pages)| DomainCount {
            domain: domain.to_string(),
            pages: pages.len(),
        })
        .collect();
    domains.sort_by(|a, b| b.pages.cmp(&a.pages).then_with(|| a.domain.cmp(&b.domain)));

    let mut users: Vec<UserEdits> = max_edits_by_user
        .into_iter()
        .map(|(user, max_edit_count)| UserEdits {
            user: user.to_string(),
            max_edit_count,
        })
        .collect();
    users.sort_by(|a, b| {
        b.max_edit_count
            .cmp(&a.max_edit_count)
            .then_with(|| a.user.cmp(&b.user))
    });

    Report {
        minute,
        domains,
        users,
    }
}
