// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Error types for loading and configuration

use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors while reading input datasets
#[derive(Debug, Error)]
pub enum LoadError {
    /// The input file does not exist
    #[error("input file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The input file exists but could not be read
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// File being read
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },
}

/// Reasons a single input row is rejected; always recoverable
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowError {
    /// Fewer columns than the schema requires
    #[error("expected at least {expected} columns, found {found}")]
    MissingField {
        /// Required column count
        expected: usize,
        /// Columns present
        found: usize,
    },

    /// Source or target community is blank
    #[error("empty community identifier")]
    EmptyCommunity,

    /// Timestamp column could not be parsed
    #[error("unparseable timestamp `{0}`")]
    BadTimestamp(String),

    /// Label column is not a known sentiment
    #[error("unknown sentiment label `{0}`")]
    BadLabel(String),

    /// Line is not valid UTF-8
    #[error("line is not valid UTF-8")]
    InvalidUtf8,
}

impl RowError {
    /// Stable key used when tallying skipped rows
    #[must_use]
    pub fn reason(&self) -> &'static str {
        match self {
            Self::MissingField { .. } => "missing_field",
            Self::EmptyCommunity => "empty_community",
            Self::BadTimestamp(_) => "bad_timestamp",
            Self::BadLabel(_) => "bad_label",
            Self::InvalidUtf8 => "invalid_utf8",
        }
    }
}

/// Errors building the layered configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An explicitly requested config file is missing
    #[error("config file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// A source failed to parse or deserialize
    #[error(transparent)]
    Invalid(#[from] config::ConfigError),

    /// A value parsed but is out of range
    #[error("invalid setting `{key}`: {reason}")]
    OutOfRange {
        /// Dotted key of the offending setting
        key: &'static str,
        /// What is wrong with it
        reason: String,
    },
}
