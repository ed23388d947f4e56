// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Export command - writes the hostility graph in machine-readable formats

use super::{emit, Global, Inputs};
use crate::pipeline;
use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;
use tracing::info;

/// Supported export formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ExportFormat {
    /// Graphviz DOT format
    Dot,
    /// JSON format
    Json,
    /// Tab-separated edge list
    Tsv,
    /// GraphML for Gephi, yEd and networkx
    Graphml,
}

impl ExportFormat {
    /// Get file extension for format
    #[must_use]
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Dot => "dot",
            Self::Json => "json",
            Self::Tsv => "tsv",
            Self::Graphml => "graphml",
        }
    }
}

/// Run the export command
pub fn run(global: &Global, inputs: &Inputs, format: ExportFormat, output: Option<PathBuf>) -> Result<()> {
    info!("Exporting to {}", format.extension());

    let analysis = pipeline::run(&inputs.files, inputs.window, &global.config)?;
    if analysis.graph.is_empty() {
        eprintln!("Warning: graph is empty; no negative links in the input.");
    }

    let content = match format {
        ExportFormat::Dot => analysis.graph.to_dot(),
        ExportFormat::Json => analysis.graph.to_json()?,
        ExportFormat::Tsv => analysis.graph.to_tsv(),
        ExportFormat::Graphml => analysis.graph.to_graphml(),
    };

    match output {
        Some(path) => {
            fs::write(&path, &content).with_context(|| format!("Failed to write to {}", path.display()))?;
            println!("Exported to {}", path.display());
            Ok(())
        }
        None => emit(&content),
    }
}
