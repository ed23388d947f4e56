// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Analyze command - full pipeline and report

use super::{emit, Global, Inputs};
use crate::community::CommunityAnalysis;
use crate::pipeline;
use crate::report::AnalysisReport;
use anyhow::{Context, Result};
use tracing::info;

/// Run the analyze command
pub fn run(global: &Global, inputs: &Inputs) -> Result<()> {
    info!("Analyzing {} file(s)", inputs.files.len());
    let config = &global.config;

    let analysis = pipeline::run(&inputs.files, inputs.window, config)?;
    if analysis.graph.is_empty() {
        eprintln!("Warning: no negative links found in the input.");
    }

    let roles = analysis.roles(config);
    let communities = CommunityAnalysis::analyze(&analysis.graph, &config.metrics.pagerank, &config.community);
    let report = AnalysisReport::build(&analysis, &roles, &communities, config);

    let content = if global.json {
        serde_json::to_string_pretty(&report).context("Failed to serialize report")?
    } else {
        report.render_text(global.color)
    };
    emit(&content)
}
