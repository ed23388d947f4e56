// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Communities command - Louvain partition and conflict flows

use super::{emit, Global, Inputs};
use crate::community::CommunityAnalysis;
use crate::pipeline;
use crate::report::{render_communities, CommunityReport, Painter};
use anyhow::{Context, Result};
use tracing::info;

/// Run the communities command
pub fn run(global: &Global, inputs: &Inputs, resolution: Option<f64>, top: Option<usize>) -> Result<()> {
    let mut config = global.config.clone();
    if let Some(resolution) = resolution {
        config.community.resolution = resolution;
    }
    config.validate().context("Invalid community settings")?;
    let top = top.unwrap_or(config.report.top);

    let analysis = pipeline::run(&inputs.files, inputs.window, &config)?;
    let communities = CommunityAnalysis::analyze(&analysis.graph, &config.metrics.pagerank, &config.community);
    info!(
        "Found {} communities (modularity {:.4})",
        communities.communities.len(),
        communities.modularity
    );

    let report = CommunityReport::from_analysis(&communities, top);
    if global.json {
        return emit(&serde_json::to_string_pretty(&report).context("Failed to serialize communities")?);
    }

    let painter = Painter { color: global.color };
    let mut out = format!(
        "{}\n  found: {}  modularity: {:.4}\n",
        painter.heading("Communities"),
        report.count,
        report.modularity
    );
    out.push_str(&render_communities(&report));
    emit(&out)
}
