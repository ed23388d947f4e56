// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Rank command - top communities by one metric

use super::{emit, Global, Inputs};
use crate::metrics::{controversy, RankBy};
use crate::pipeline;
use crate::report::{render_ranking, Painter};
use anyhow::{Context, Result};
use std::fmt::Write as _;

/// What to rank by
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum RankKey {
    /// Distinct targets of negative links
    OutDegree,
    /// Distinct sources of negative links
    InDegree,
    /// In-degree plus out-degree
    Total,
    /// Negative links sent
    OutWeight,
    /// Negative links received
    InWeight,
    /// Weighted PageRank
    Pagerank,
    /// Negative share of all links touching the community
    Controversy,
}

impl RankKey {
    fn metric(self) -> Option<RankBy> {
        match self {
            Self::OutDegree => Some(RankBy::OutDegree),
            Self::InDegree => Some(RankBy::InDegree),
            Self::Total => Some(RankBy::Total),
            Self::OutWeight => Some(RankBy::OutWeight),
            Self::InWeight => Some(RankBy::InWeight),
            Self::Pagerank => Some(RankBy::Pagerank),
            Self::Controversy => None,
        }
    }
}

/// Run the rank command
pub fn run(global: &Global, inputs: &Inputs, by: RankKey, top: Option<usize>) -> Result<()> {
    let config = &global.config;
    let top = top.unwrap_or(config.report.top);
    let analysis = pipeline::run(&inputs.files, inputs.window, config)?;

    let Some(metric) = by.metric() else {
        let mut ranked = controversy(analysis.windowed(), config.metrics.min_posts);
        ranked.truncate(top);
        if global.json {
            return emit(&serde_json::to_string_pretty(&ranked).context("Failed to serialize ranking")?);
        }
        let mut out = String::new();
        for (i, c) in ranked.iter().enumerate() {
            let _ = writeln!(
                out,
                "  {:>3}. {:<30} {:>6.2}%  ({}/{})",
                i + 1,
                c.id,
                c.negative_ratio * 100.0,
                c.negative_links,
                c.total_links
            );
        }
        if out.is_empty() {
            out.push_str("No community has enough links to rank.\n");
        }
        return emit(&out);
    };

    let ranked: Vec<_> = analysis.metrics.top(metric, top).into_iter().cloned().collect();
    if global.json {
        return emit(&serde_json::to_string_pretty(&ranked).context("Failed to serialize ranking")?);
    }
    let painter = Painter { color: global.color };
    let title = format!("Top {} by {:?}", ranked.len(), metric);
    emit(&render_ranking(&painter, &title, &ranked, metric))
}
