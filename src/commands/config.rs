// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Config command - show the effective configuration

use super::{emit, Global};
use anyhow::{bail, Context, Result};

/// Print the whole configuration, or one dotted key such as `roles.min_activity`
pub fn run(global: &Global, key: Option<&str>) -> Result<()> {
    let value = serde_json::to_value(&global.config).context("Failed to serialize config")?;

    let Some(key) = key else {
        if global.json {
            return emit(&serde_json::to_string_pretty(&value)?);
        }
        return emit(&global.config.to_toml().context("Failed to render config as TOML")?);
    };

    let mut current = &value;
    for part in key.split('.') {
        current = match current.get(part) {
            Some(v) => v,
            None => bail!("Unknown config key: {}", key),
        };
    }

    let rendered = match current {
        serde_json::Value::String(s) => s.clone(),
        other => serde_json::to_string_pretty(other)?,
    };
    tracing::debug!("{} = {}", key, rendered);
    emit(&rendered)
}
