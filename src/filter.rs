// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Record filters

use crate::types::LinkRecord;
use chrono::NaiveDateTime;

/// Optional time window applied before the sentiment filter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Window {
    /// Inclusive lower bound
    pub since: Option<NaiveDateTime>,
    /// Exclusive upper bound
    pub until: Option<NaiveDateTime>,
}

impl Window {
    /// Whether either bound is set
    #[must_use]
    pub fn is_bounded(&self) -> bool {
        self.since.is_some() || self.until.is_some()
    }

    /// Whether `at` falls inside the window
    #[must_use]
    pub fn contains(&self, at: NaiveDateTime) -> bool {
        self.since.map_or(true, |s| at >= s) && self.until.map_or(true, |u| at < u)
    }

    /// Borrowing view of the records inside the window
    pub fn select<'a>(
        self,
        records: impl IntoIterator<Item = &'a LinkRecord>,
    ) -> impl Iterator<Item = &'a LinkRecord> {
        records.into_iter().filter(move |r| self.contains(r.timestamp))
    }
}

/// Borrowing view of the negative links
pub fn negatives<'a>(records: impl IntoIterator<Item = &'a LinkRecord>) -> impl Iterator<Item = &'a LinkRecord> {
    records.into_iter().filter(|r| r.is_negative())
}

/// Keep only negative links, preserving order
#[must_use]
pub fn negative_only(records: &[LinkRecord]) -> Vec<LinkRecord> {
    negatives(records).cloned().collect()
}

/// Keep links with `since <= timestamp < until`; either bound may be open
#[must_use]
pub fn within_window(
    records: &[LinkRecord],
    since: Option<NaiveDateTime>,
    until: Option<NaiveDateTime>,
) -> Vec<LinkRecord> {
    Window { since, until }.select(records).cloned().collect()
}
