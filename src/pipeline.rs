// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Load -> filter -> build -> measure, shared by every command
//!
//! Loaded records are held once, in [`LoadReport`]; the windowed and
//! negative sets are borrowing views over them.

use crate::config::Config;
use crate::filter;
use crate::graph::HostilityGraph;
use crate::loader::{self, LoadReport};
use crate::metrics::Metrics;
use crate::roles::RoleMap;
use crate::types::LinkRecord;
use anyhow::{Context, Result};
use std::collections::BTreeSet;
use std::path::PathBuf;
use tracing::info;

pub use crate::filter::Window;

/// Everything derived from one set of inputs
#[derive(Debug, Clone)]
pub struct Analysis {
    /// Loader output, all sentiments
    pub load: LoadReport,
    /// Time window the analysis covers
    pub window: Window,
    /// Number of negative records inside the window
    pub negative_links: usize,
    /// Graph over the negative records
    pub graph: HostilityGraph,
    /// Per-node metrics
    pub metrics: Metrics,
}

impl Analysis {
    /// Run the pipeline over already-loaded records
    #[must_use]
    pub fn from_load(load: LoadReport, window: Window, config: &Config) -> Self {
        if window.is_bounded() {
            info!(
                "Time window kept {} of {} records",
                window.select(&load.records).count(),
                load.records.len()
            );
        }

        let negative_links = filter::negatives(window.select(&load.records)).count();
        info!("{} records in window are negative", negative_links);

        let graph = HostilityGraph::build(filter::negatives(window.select(&load.records)));
        let metrics = Metrics::compute(&graph, &config.metrics.pagerank);
        info!(
            "Hostility graph: {} communities, {} directed pairs",
            graph.node_count(),
            graph.edge_count()
        );

        Self {
            load,
            window,
            negative_links,
            graph,
            metrics,
        }
    }

    /// Records inside the window, all sentiments
    pub fn windowed(&self) -> impl Iterator<Item = &LinkRecord> {
        self.window.select(&self.load.records)
    }

    /// Negative records inside the window
    pub fn negative(&self) -> impl Iterator<Item = &LinkRecord> {
        filter::negatives(self.windowed())
    }

    /// Every community seen in the window, whatever the sentiment
    #[must_use]
    pub fn known_communities(&self) -> BTreeSet<&str> {
        self.windowed()
            .flat_map(|r| [r.source.as_str(), r.target.as_str()])
            .collect()
    }

    /// Roles for every known community
    #[must_use]
    pub fn roles(&self, config: &Config) -> RoleMap {
        RoleMap::classify(&self.metrics, self.known_communities(), &config.roles)
    }
}

/// Load `paths` and run the pipeline
pub fn run(paths: &[PathBuf], window: Window, config: &Config) -> Result<Analysis> {
    let load = loader::load_files(paths, &config.input).context("Failed to load input data")?;
    Ok(Analysis::from_load(load, window, config))
}
