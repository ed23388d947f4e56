// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! Command implementations

pub mod analyze;
pub mod communities;
pub mod completions;
pub mod config;
pub mod export;
pub mod rank;
pub mod roles;

use crate::pipeline::Window;
use std::path::PathBuf;

/// Options shared by every command
#[derive(Debug, Clone)]
pub struct Global {
    /// Effective configuration
    pub config: crate::config::Config,
    /// Print JSON instead of text
    pub json: bool,
    /// Emit ANSI colours in text output
    pub color: bool,
}

/// Inputs shared by the analysis commands
#[derive(Debug, Clone)]
pub struct Inputs {
    /// Dataset files
    pub files: Vec<PathBuf>,
    /// Time window
    pub window: Window,
}

/// Write `content` to stdout followed by a newline
pub(crate) fn emit(content: &str) -> anyhow::Result<()> {
    use std::io::Write;

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(content.as_bytes())?;
    if !content.ends_with('\n') {
        stdout.write_all(b"\n")?;
    }
    Ok(())
}
