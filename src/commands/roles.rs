// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Roles command - list the role of every community

use super::{emit, Global, Inputs};
use crate::pipeline;
use crate::report::Painter;
use crate::types::Role;
use anyhow::{Context, Result};
use std::fmt::Write as _;

/// Threshold overrides given on the command line
#[derive(Debug, Clone, Default)]
pub struct RoleArgs {
    /// Only list this role
    pub role: Option<Role>,
    /// Override `roles.min_activity`
    pub min_activity: Option<usize>,
    /// Override `roles.dominance_ratio`
    pub ratio: Option<f64>,
}

/// Run the roles command
pub fn run(global: &Global, inputs: &Inputs, args: &RoleArgs) -> Result<()> {
    let mut config = global.config.clone();
    if let Some(min_activity) = args.min_activity {
        config.roles.min_activity = min_activity;
    }
    if let Some(ratio) = args.ratio {
        config.roles.dominance_ratio = ratio;
    }
    config.validate().context("Invalid role thresholds")?;

    let analysis = pipeline::run(&inputs.files, inputs.window, &config)?;
    let roles = analysis.roles(&config);

    let selected: Vec<_> = roles
        .assignments
        .iter()
        .filter(|a| args.role.map_or(true, |r| a.role == r))
        .collect();

    if global.json {
        let json = serde_json::to_string_pretty(&selected).context("Failed to serialize roles")?;
        return emit(&json);
    }

    if selected.is_empty() {
        println!("No communities match.");
        return Ok(());
    }

    let painter = Painter { color: global.color };
    let mut out = String::new();
    let _ = writeln!(out, "{:<30} {:<13} {:>6} {:>6} {:>10}", "community", "role", "out", "in", "clustering");
    for a in selected {
        let _ = writeln!(
            out,
            "{:<30} {} {:>6} {:>6} {:>10.4}",
            a.id,
            painter.role(a.role),
            a.out_degree,
            a.in_degree,
            a.clustering
        );
    }
    emit(&out)
}
