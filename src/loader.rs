// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Dataset loading
//!
//! Reads delimited hyperlink files with the column layout
//! `SOURCE_SUBREDDIT, TARGET_SUBREDDIT, POST_ID, TIMESTAMP, POST_LABEL[, POST_PROPERTIES]`.
//! Malformed rows are skipped and tallied; only an unreadable file is fatal.

use crate::error::{LoadError, RowError};
use crate::types::{LinkRecord, Sentiment};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Columns every row must carry (properties are optional)
const REQUIRED_COLUMNS: usize = 5;

/// Options controlling how rows are split and normalised
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderOptions {
    /// Column delimiter
    pub delimiter: char,
    /// Lowercase community identifiers
    pub lowercase_ids: bool,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            delimiter: '\t',
            lowercase_ids: true,
        }
    }
}

/// Per-input summary of accepted records
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OriginSummary {
    /// Input label (`body`, `title`, or the file stem)
    pub origin: String,
    /// Accepted records
    pub rows: usize,
    /// Distinct source communities
    pub distinct_sources: usize,
    /// Distinct target communities
    pub distinct_targets: usize,
    /// Count per sentiment label
    pub labels: BTreeMap<String, usize>,
    /// Earliest timestamp
    pub first: Option<NaiveDateTime>,
    /// Latest timestamp
    pub last: Option<NaiveDateTime>,
}

/// Result of loading one or more inputs
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    /// Accepted records, in file then line order
    pub records: Vec<LinkRecord>,
    /// Data rows seen (headers and blank lines excluded)
    pub rows_read: usize,
    /// Rows rejected as malformed
    pub skipped: usize,
    /// Rejected rows tallied by reason
    pub skip_reasons: BTreeMap<String, usize>,
}

impl LoadReport {
    fn skip(&mut self, origin: &str, line_no: usize, err: &RowError) {
        debug!("{}:{}: skipping row: {}", origin, line_no, err);
        self.skipped += 1;
        *self.skip_reasons.entry(err.reason().to_string()).or_insert(0) += 1;
    }

    /// Summaries per origin, ordered by origin label
    #[must_use]
    pub fn origins(&self) -> Vec<OriginSummary> {
        summarize_origins(&self.records)
    }
}

/// Load and merge every file in `paths`
pub fn load_files(paths: &[PathBuf], options: &LoaderOptions) -> Result<LoadReport, LoadError> {
    let mut report = LoadReport::default();
    for path in paths {
        load_file(path, options, &mut report)?;
    }
    info!(
        "Loaded {} records from {} file(s), skipped {} malformed row(s)",
        report.records.len(),
        paths.len(),
        report.skipped
    );
    if report.skipped > 0 {
        warn!("Skipped rows by reason: {:?}", report.skip_reasons);
    }
    Ok(report)
}

/// Load one file, appending to `report`
pub fn load_file(path: &Path, options: &LoaderOptions, report: &mut LoadReport) -> Result<(), LoadError> {
    if !path.exists() {
        return Err(LoadError::NotFound(path.to_path_buf()));
    }
    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let origin = origin_label(path);
    debug!("Reading {} as origin `{}`", path.display(), origin);
    load_reader(BufReader::new(file), &origin, options, report).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Load rows from any buffered reader
pub fn load_reader<R: BufRead>(
    mut reader: R,
    origin: &str,
    options: &LoaderOptions,
    report: &mut LoadReport,
) -> std::io::Result<()> {
    let mut buf = Vec::new();
    let mut line_no = 0usize;

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        line_no += 1;

        let Ok(line) = std::str::from_utf8(&buf) else {
            report.rows_read += 1;
            report.skip(origin, line_no, &RowError::InvalidUtf8);
            continue;
        };
        let line = line.trim_end_matches(['\n', '\r']);
        if line.trim().is_empty() || is_header(line, options.delimiter) {
            continue;
        }

        report.rows_read += 1;
        match parse_row(line, origin, options) {
            Ok(record) => report.records.push(record),
            Err(err) => report.skip(origin, line_no, &err),
        }
    }

    Ok(())
}

/// Parse one data row into a record
pub fn parse_row(line: &str, origin: &str, options: &LoaderOptions) -> Result<LinkRecord, RowError> {
    let fields: Vec<&str> = line.splitn(REQUIRED_COLUMNS + 1, options.delimiter).collect();
    if fields.len() < REQUIRED_COLUMNS {
        return Err(RowError::MissingField {
            expected: REQUIRED_COLUMNS,
            found: fields.len(),
        });
    }

    let source = normalize_id(fields[0], options.lowercase_ids);
    let target = normalize_id(fields[1], options.lowercase_ids);
    if source.is_empty() || target.is_empty() {
        return Err(RowError::EmptyCommunity);
    }

    let post_id = Some(fields[2].trim())
        .filter(|p| !p.is_empty())
        .map(String::from);

    let timestamp =
        parse_timestamp(fields[3]).ok_or_else(|| RowError::BadTimestamp(fields[3].trim().to_string()))?;

    let sentiment = Sentiment::parse(fields[4]).ok_or_else(|| RowError::BadLabel(fields[4].trim().to_string()))?;

    Ok(LinkRecord {
        source,
        target,
        post_id,
        timestamp,
        sentiment,
        origin: origin.to_string(),
    })
}

/// Parse a timestamp in dataset (`%Y-%m-%d %H:%M:%S`), RFC 3339 or date-only form
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(ts) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(ts);
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.naive_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Derive an origin label from a file name.
///
/// The published dataset ships as `soc-redditHyperlinks-body.tsv` and
/// `soc-redditHyperlinks-title.tsv`; those map to `body` and `title`.
#[must_use]
pub fn origin_label(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let lower = stem.to_ascii_lowercase();
    for suffix in ["body", "title"] {
        if lower.ends_with(&format!("-{suffix}")) || lower.ends_with(&format!("_{suffix}")) || lower == suffix {
            return suffix.to_string();
        }
    }
    if stem.is_empty() {
        "input".to_string()
    } else {
        stem
    }
}

/// Group records by origin and summarise each group
#[must_use]
pub fn summarize_origins(records: &[LinkRecord]) -> Vec<OriginSummary> {
    struct Acc<'a> {
        summary: OriginSummary,
        sources: BTreeSet<&'a str>,
        targets: BTreeSet<&'a str>,
    }

    let mut by_origin: BTreeMap<&str, Acc<'_>> = BTreeMap::new();
    for record in records {
        let acc = by_origin.entry(record.origin.as_str()).or_insert_with(|| Acc {
            summary: OriginSummary {
                origin: record.origin.clone(),
                ..OriginSummary::default()
            },
            sources: BTreeSet::new(),
            targets: BTreeSet::new(),
        });
        acc.summary.rows += 1;
        acc.sources.insert(&record.source);
        acc.targets.insert(&record.target);
        *acc.summary.labels.entry(record.sentiment.to_string()).or_insert(0) += 1;
        acc.summary.first = Some(acc.summary.first.map_or(record.timestamp, |t| t.min(record.timestamp)));
        acc.summary.last = Some(acc.summary.last.map_or(record.timestamp, |t| t.max(record.timestamp)));
    }

    by_origin
        .into_values()
        .map(|acc| OriginSummary {
            distinct_sources: acc.sources.len(),
            distinct_targets: acc.targets.len(),
            ..acc.summary
        })
        .collect()
}

fn normalize_id(raw: &str, lowercase: bool) -> String {
    let trimmed = raw.trim();
    if lowercase {
        trimmed.to_lowercase()
    } else {
        trimmed.to_string()
    }
}

fn is_header(line: &str, delimiter: char) -> bool {
    line.split(delimiter)
        .next()
        .is_some_and(|first| first.trim().eq_ignore_ascii_case("SOURCE_SUBREDDIT"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const SAMPLE: &str = "SOURCE_SUBREDDIT\tTARGET_SUBREDDIT\tPOST_ID\tTIMESTAMP\tPOST_LABEL\tPOST_PROPERTIES\n\
        leagueoflegends\tteamredditteams\t1u4nrps\t2013-12-31 16:39:58\t1\t345.0,298.0,0.75\n\
        theredlion\tsoccer\t1u4qkd\t2013-12-31 18:18:37\t-1\t101.0,98.0,0.74\n\
        \n\
        broken\trow\n\
        a\tb\tx\tnot-a-date\t-1\n\
        a\tb\tx\t2014-01-01 00:00:00\t7\n";

    fn load(input: &str) -> LoadReport {
        let mut report = LoadReport::default();
        load_reader(Cursor::new(input), "body", &LoaderOptions::default(), &mut report).unwrap();
        report
    }

    #[test]
    fn test_header_and_blank_lines_not_counted() {
        let report = load(SAMPLE);
        assert_eq!(report.rows_read, 5);
        assert_eq!(report.records.len(), 2);
        assert_eq!(report.skipped, 3);
    }

    #[test]
    fn test_skip_reasons_tallied() {
        let report = load(SAMPLE);
        assert_eq!(report.skip_reasons.get("missing_field"), Some(&1));
        assert_eq!(report.skip_reasons.get("bad_timestamp"), Some(&1));
        assert_eq!(report.skip_reasons.get("bad_label"), Some(&1));
    }

    #[test]
    fn test_parse_row_fields() {
        let record = parse_row(
            "TheRedLion\tSoccer\t1u4qkd\t2013-12-31 18:18:37\t-1\t1.0,2.0",
            "body",
            &LoaderOptions::default(),
        )
        .unwrap();
        assert_eq!(record.source, "theredlion");
        assert_eq!(record.target, "soccer");
        assert_eq!(record.post_id.as_deref(), Some("1u4qkd"));
        assert!(record.is_negative());
        assert_eq!(record.origin, "body");
    }

    #[test]
    fn test_parse_row_keeps_case_when_asked() {
        let options = LoaderOptions {
            lowercase_ids: false,
            ..LoaderOptions::default()
        };
        let record = parse_row("AskReddit\tPics\t\t2014-02-01\t0", "t", &options).unwrap();
        assert_eq!(record.source, "AskReddit");
        assert_eq!(record.post_id, None);
    }

    #[test]
    fn test_parse_row_empty_community() {
        let err = parse_row(" \tsoccer\tid\t2014-01-01 00:00:00\t-1", "t", &LoaderOptions::default()).unwrap_err();
        assert_eq!(err, RowError::EmptyCommunity);
    }

    #[test]
    fn test_custom_delimiter() {
        let options = LoaderOptions {
            delimiter: ',',
            ..LoaderOptions::default()
        };
        let record = parse_row("a,b,p1,2014-01-01T10:00:00Z,negative", "csv", &options).unwrap();
        assert_eq!(record.target, "b");
        assert!(record.is_negative());
    }

    #[test]
    fn test_invalid_utf8_is_skipped() {
        let mut bytes = b"a\tb\tp\t2014-01-01 00:00:00\t-1\n".to_vec();
        bytes.extend_from_slice(&[0xff, 0xfe, b'\n']);
        let mut report = LoadReport::default();
        load_reader(Cursor::new(bytes), "body", &LoaderOptions::default(), &mut report).unwrap();
        assert_eq!(report.records.len(), 1);
        assert_eq!(report.skip_reasons.get("invalid_utf8"), Some(&1));
    }

    #[test]
    fn test_origin_label() {
        assert_eq!(origin_label(Path::new("/data/soc-redditHyperlinks-body.tsv")), "body");
        assert_eq!(origin_label(Path::new("soc-redditHyperlinks-title.tsv")), "title");
        assert_eq!(origin_label(Path::new("links.tsv")), "links");
    }

    #[test]
    fn test_missing_file_is_fatal() {
        let mut report = LoadReport::default();
        let err = load_file(Path::new("/nonexistent/links.tsv"), &LoaderOptions::default(), &mut report).unwrap_err();
        assert!(matches!(err, LoadError::NotFound(_)));
    }

    #[test]
    fn test_origin_summary() {
        let report = load(SAMPLE);
        let origins = report.origins();
        assert_eq!(origins.len(), 1);
        let body = &origins[0];
        assert_eq!(body.rows, 2);
        assert_eq!(body.distinct_sources, 2);
        assert_eq!(body.labels.get("negative"), Some(&1));
        assert_eq!(body.labels.get("positive"), Some(&1));
        assert!(body.first < body.last);
    }
}
