// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! Rifts library - hostility mapping between online communities
//!
//! This crate loads cross-community hyperlink datasets, keeps the negative
//! links, builds a weighted directed graph of communities and derives
//! degree metrics, PageRank, community structure and role labels
//! (instigator, target, bridge) from it.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_precision_loss)]

pub mod commands;
pub mod community;
pub mod config;
pub mod error;
pub mod filter;
pub mod graph;
pub mod loader;
pub mod metrics;
pub mod pipeline;
pub mod report;
pub mod roles;

/// Core data types shared by every pipeline stage
pub mod types {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Serialize};
    use std::fmt;

    // =========================================================================
    // Sentiment
    // =========================================================================

    /// Sentiment of the linking post toward the linked community
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
    #[serde(rename_all = "lowercase")]
    pub enum Sentiment {
        /// Label `1` in the hyperlink dataset
        Positive,
        /// Label `0`
        Neutral,
        /// Label `-1`
        Negative,
    }

    impl Sentiment {
        /// Parse a dataset label (`-1`, `0`, `1`) or a sentiment word
        #[must_use]
        pub fn parse(raw: &str) -> Option<Self> {
            let raw = raw.trim();
            match raw {
                "-1" => return Some(Self::Negative),
                "0" => return Some(Self::Neutral),
                "1" | "+1" => return Some(Self::Positive),
                _ => {}
            }
            match raw.to_ascii_lowercase().as_str() {
                "negative" | "neg" => Some(Self::Negative),
                "neutral" => Some(Self::Neutral),
                "positive" | "pos" => Some(Self::Positive),
                _ => None,
            }
        }

        /// Numeric label as used by the hyperlink dataset
        #[must_use]
        pub fn label(self) -> i8 {
            match self {
                Self::Positive => 1,
                Self::Neutral => 0,
                Self::Negative => -1,
            }
        }
    }

    impl fmt::Display for Sentiment {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            let name = match self {
                Self::Positive => "positive",
                Self::Neutral => "neutral",
                Self::Negative => "negative",
            };
            f.write_str(name)
        }
    }

    // =========================================================================
    // Link records (edges as loaded)
    // =========================================================================

    /// One cross-community hyperlink, immutable once loaded
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct LinkRecord {
        /// Community the linking post was made in
        pub source: String,
        /// Community the link points to
        pub target: String,
        /// Dataset post identifier, when present
        pub post_id: Option<String>,
        /// When the linking post was made
        pub timestamp: NaiveDateTime,
        /// Sentiment of the linking post toward the target
        pub sentiment: Sentiment,
        /// Label of the input the record came from (`body`, `title`, ...)
        pub origin: String,
    }

    impl LinkRecord {
        /// Whether the link carries negative sentiment
        #[must_use]
        pub fn is_negative(&self) -> bool {
            self.sentiment == Sentiment::Negative
        }
    }

    // =========================================================================
    // Roles
    // =========================================================================

    /// Role a community plays in the hostility network
    #[derive(
        Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, clap::ValueEnum,
    )]
    #[serde(rename_all = "lowercase")]
    pub enum Role {
        /// Sends far more negative links than it receives
        Instigator,
        /// Receives far more negative links than it sends
        Target,
        /// Sends and receives heavily while joining otherwise separate neighbourhoods
        Bridge,
        /// Too little activity, or no dominant direction
        Unclassified,
    }

    impl Role {
        /// All roles in display order
        pub const ALL: [Self; 4] = [Self::Instigator, Self::Target, Self::Bridge, Self::Unclassified];

        /// Lowercase name
        #[must_use]
        pub fn name(self) -> &'static str {
            match self {
                Self::Instigator => "instigator",
                Self::Target => "target",
                Self::Bridge => "bridge",
                Self::Unclassified => "unclassified",
            }
        }
    }

    impl fmt::Display for Role {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.name())
        }
    }
}

/// Prelude for common imports
pub mod prelude {
    pub use crate::types::*;
    pub use anyhow::{Context, Result};
}

#[cfg(test)]
mod tests {
    use super::types::{Role, Sentiment};

    #[test]
    fn test_sentiment_parse_dataset_labels() {
        assert_eq!(Sentiment::parse("-1"), Some(Sentiment::Negative));
        assert_eq!(Sentiment::parse(" 1 "), Some(Sentiment::Positive));
        assert_eq!(Sentiment::parse("0"), Some(Sentiment::Neutral));
    }

    #[test]
    fn test_sentiment_parse_words() {
        assert_eq!(Sentiment::parse("NEGATIVE"), Some(Sentiment::Negative));
        assert_eq!(Sentiment::parse("Positive"), Some(Sentiment::Positive));
        assert_eq!(Sentiment::parse("meh"), None);
        assert_eq!(Sentiment::parse("-2"), None);
    }

    #[test]
    fn test_role_names() {
        let names: Vec<_> = Role::ALL.iter().map(|r| r.to_string()).collect();
        assert_eq!(names, ["instigator", "target", "bridge", "unclassified"]);
    }
}
