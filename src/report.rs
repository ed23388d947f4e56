// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Analysis report assembly and terminal rendering

use crate::community::{BridgeScore, CommunityAnalysis, CommunitySummary, ConflictFlow};
use crate::config::Config;
use crate::loader::OriginSummary;
use crate::metrics::{controversy, Controversy, GraphStats, NodeMetrics, RankBy};
use crate::pipeline::Analysis;
use crate::roles::{RoleAssignment, RoleMap};
use crate::types::Role;
use owo_colors::OwoColorize;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write as _;

/// Loader figures carried into the report
#[derive(Debug, Clone, Serialize)]
pub struct LoadSummary {
    /// Data rows read
    pub rows_read: usize,
    /// Rows accepted
    pub records: usize,
    /// Rows skipped as malformed
    pub skipped: usize,
    /// Skipped rows by reason
    pub skip_reasons: BTreeMap<String, usize>,
    /// Per-input breakdown
    pub origins: Vec<OriginSummary>,
}

/// Trimmed community results for reporting
#[derive(Debug, Clone, Serialize)]
pub struct CommunityReport {
    /// Number of communities found
    pub count: usize,
    /// Partition modularity
    pub modularity: f64,
    /// Largest communities
    pub largest: Vec<CommunitySummary>,
    /// Heaviest cross-community flows
    pub flows: Vec<ConflictFlow>,
    /// Nodes with the most cross-community weight
    pub bridges: Vec<BridgeScore>,
}

impl CommunityReport {
    /// Keep the first `top` entries of each list
    #[must_use]
    pub fn from_analysis(analysis: &CommunityAnalysis, top: usize) -> Self {
        Self {
            count: analysis.communities.len(),
            modularity: analysis.modularity,
            largest: analysis.communities.iter().take(top).cloned().collect(),
            flows: analysis.flows.iter().take(top).cloned().collect(),
            bridges: analysis.bridges.iter().take(top).cloned().collect(),
        }
    }
}

/// Full report produced by `analyze`
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    /// Loader figures
    pub load: LoadSummary,
    /// Negative links after windowing
    pub negative_links: usize,
    /// Graph fingerprint
    pub fingerprint: String,
    /// Graph statistics
    pub stats: GraphStats,
    /// Highest negative out-degree
    pub top_sources: Vec<NodeMetrics>,
    /// Highest negative in-degree
    pub top_targets: Vec<NodeMetrics>,
    /// Highest PageRank
    pub top_pagerank: Vec<NodeMetrics>,
    /// Highest negative share of all links
    pub most_controversial: Vec<Controversy>,
    /// Count per role
    pub role_census: BTreeMap<Role, usize>,
    /// Leading members per role, ranked by total degree
    pub role_leaders: BTreeMap<Role, Vec<String>>,
    /// Role of every known community, sorted by id
    pub roles: Vec<RoleAssignment>,
    /// Community structure
    pub communities: CommunityReport,
}

impl AnalysisReport {
    /// Assemble the report
    #[must_use]
    pub fn build(analysis: &Analysis, roles: &RoleMap, communities: &CommunityAnalysis, config: &Config) -> Self {
        let top = config.report.top;
        let owned = |nodes: Vec<&NodeMetrics>| nodes.into_iter().cloned().collect::<Vec<_>>();

        let mut role_leaders = BTreeMap::new();
        for role in [Role::Instigator, Role::Target, Role::Bridge] {
            let mut members: Vec<_> = roles.with_role(role).collect();
            members.sort_by(|a, b| {
                (b.in_degree + b.out_degree)
                    .cmp(&(a.in_degree + a.out_degree))
                    .then_with(|| a.id.cmp(&b.id))
            });
            role_leaders.insert(role, members.into_iter().take(top).map(|a| a.id.clone()).collect());
        }

        let mut most_controversial = controversy(analysis.windowed(), config.metrics.min_posts);
        most_controversial.truncate(top);

        Self {
            load: LoadSummary {
                rows_read: analysis.load.rows_read,
                records: analysis.load.records.len(),
                skipped: analysis.load.skipped,
                skip_reasons: analysis.load.skip_reasons.clone(),
                origins: analysis.load.origins(),
            },
            negative_links: analysis.negative_links,
            fingerprint: analysis.graph.fingerprint(),
            stats: analysis.metrics.stats(&analysis.graph),
            top_sources: owned(analysis.metrics.top(RankBy::OutDegree, top)),
            top_targets: owned(analysis.metrics.top(RankBy::InDegree, top)),
            top_pagerank: owned(analysis.metrics.top(RankBy::Pagerank, top)),
            most_controversial,
            role_census: roles.census(),
            role_leaders,
            roles: roles.assignments.clone(),
            communities: CommunityReport::from_analysis(communities, top),
        }
    }

    /// Render as terminal text
    #[must_use]
    pub fn render_text(&self, color: bool) -> String {
        let p = Painter { color };
        let mut out = String::new();

        let _ = writeln!(out, "{}", p.heading("Input"));
        let _ = writeln!(
            out,
            "  rows read: {}  accepted: {}  skipped: {}",
            self.load.rows_read, self.load.records, self.load.skipped
        );
        for (reason, count) in &self.load.skip_reasons {
            let _ = writeln!(out, "    {reason}: {count}");
        }
        for origin in &self.load.origins {
            let range = match (origin.first, origin.last) {
                (Some(first), Some(last)) => format!("{} .. {}", first.date(), last.date()),
                _ => "-".to_string(),
            };
            let labels: Vec<String> = origin.labels.iter().map(|(k, v)| format!("{k}={v}")).collect();
            let _ = writeln!(
                out,
                "  [{}] {} rows, {} sources, {} targets, {}, {}",
                origin.origin,
                origin.rows,
                origin.distinct_sources,
                origin.distinct_targets,
                labels.join(" "),
                range
            );
        }
        out.push('\n');

        let s = &self.stats;
        let _ = writeln!(out, "{}", p.heading("Hostility graph"));
        let _ = writeln!(out, "  negative links: {}", self.negative_links);
        let _ = writeln!(out, "  communities: {}  directed pairs: {}  density: {:.6}", s.nodes, s.edges, s.density);
        let _ = writeln!(
            out,
            "  in-degree  min {:.0} max {:.0} mean {:.2}",
            s.in_degree.min, s.in_degree.max, s.in_degree.mean
        );
        let _ = writeln!(
            out,
            "  out-degree min {:.0} max {:.0} mean {:.2}",
            s.out_degree.min, s.out_degree.max, s.out_degree.mean
        );
        let _ = writeln!(
            out,
            "  edge weight min {:.0} max {:.0} mean {:.2}",
            s.edge_weight.min, s.edge_weight.max, s.edge_weight.mean
        );
        match s.power_law_exponent {
            Some(alpha) => {
                let _ = writeln!(out, "  degree power-law exponent: {alpha:.3}");
            }
            None => {
                let _ = writeln!(out, "  degree power-law exponent: n/a");
            }
        }
        let _ = writeln!(out, "  fingerprint: {}", &self.fingerprint[..16.min(self.fingerprint.len())]);
        out.push('\n');

        out.push_str(&render_ranking(&p, "Top sources (negative out-degree)", &self.top_sources, RankBy::OutDegree));
        out.push_str(&render_ranking(&p, "Top targets (negative in-degree)", &self.top_targets, RankBy::InDegree));
        out.push_str(&render_ranking(&p, "Top PageRank", &self.top_pagerank, RankBy::Pagerank));

        if !self.most_controversial.is_empty() {
            let _ = writeln!(out, "{}", p.heading("Most controversial"));
            for c in &self.most_controversial {
                let _ = writeln!(
                    out,
                    "  {:<30} {:>6.2}%  ({}/{})",
                    c.id,
                    c.negative_ratio * 100.0,
                    c.negative_links,
                    c.total_links
                );
            }
            out.push('\n');
        }

        let _ = writeln!(out, "{}", p.heading("Roles"));
        for (role, count) in &self.role_census {
            let leaders = self.role_leaders.get(role).map(|l| l.join(", ")).unwrap_or_default();
            if leaders.is_empty() {
                let _ = writeln!(out, "  {:<13} {}", p.role(*role), count);
            } else {
                let _ = writeln!(out, "  {:<13} {}  {}", p.role(*role), count, leaders);
            }
        }
        out.push('\n');

        let c = &self.communities;
        let _ = writeln!(out, "{}", p.heading("Communities"));
        let _ = writeln!(out, "  found: {}  modularity: {:.4}", c.count, c.modularity);
        out.push_str(&render_communities(c));
        out
    }
}

/// Render a ranking table, showing the value selected by `by`
#[must_use]
pub fn render_ranking(p: &Painter, title: &str, nodes: &[NodeMetrics], by: RankBy) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", p.heading(title));
    if nodes.is_empty() {
        out.push_str("  (none)\n\n");
        return out;
    }
    for (rank, node) in nodes.iter().enumerate() {
        let value = match by {
            RankBy::OutDegree => node.out_degree.to_string(),
            RankBy::InDegree => node.in_degree.to_string(),
            RankBy::Total => node.total_degree().to_string(),
            RankBy::OutWeight => node.out_weight.to_string(),
            RankBy::InWeight => node.in_weight.to_string(),
            RankBy::Pagerank => format!("{:.6}", node.pagerank),
        };
        let _ = writeln!(out, "  {:>3}. {:<30} {:>10}", rank + 1, node.id, value);
    }
    out.push('\n');
    out
}

/// Render community tables without a heading
#[must_use]
pub fn render_communities(report: &CommunityReport) -> String {
    let mut out = String::new();
    for comm in &report.largest {
        let _ = writeln!(
            out,
            "  #{:<4} {:>6} members  out {:>6}  in {:>6}  internal {:>6}  ({})",
            comm.id,
            comm.size,
            comm.outbound,
            comm.inbound,
            comm.internal,
            comm.representative.as_deref().unwrap_or("-")
        );
    }
    if !report.flows.is_empty() {
        out.push_str("  conflict flows:\n");
        for flow in &report.flows {
            let _ = writeln!(out, "    #{} -> #{}  {}", flow.from, flow.to, flow.weight);
        }
    }
    if !report.bridges.is_empty() {
        out.push_str("  bridge nodes:\n");
        for bridge in &report.bridges {
            let _ = writeln!(out, "    {:<30} {}", bridge.id, bridge.score);
        }
    }
    out
}

/// Applies colours when enabled
#[derive(Debug, Clone, Copy)]
pub struct Painter {
    /// Whether to emit ANSI colours
    pub color: bool,
}

impl Painter {
    /// Section heading
    #[must_use]
    pub fn heading(&self, text: &str) -> String {
        if self.color {
            text.bold().cyan().to_string()
        } else {
            text.to_string()
        }
    }

    /// Role name, coloured by role
    #[must_use]
    pub fn role(&self, role: Role) -> String {
        let name = format!("{:<13}", role.name());
        if !self.color {
            return name;
        }
        match role {
            Role::Instigator => name.red().to_string(),
            Role::Target => name.yellow().to_string(),
            Role::Bridge => name.magenta().to_string(),
            Role::Unclassified => name.dimmed().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::community::CommunityAnalysis;
    use crate::loader::{load_reader, LoadReport, LoaderOptions};
    use crate::pipeline::Window;
    use std::io::Cursor;

    fn report() -> AnalysisReport {
        let input = "a\tb\tp\t2014-01-01 00:00:00\t-1\n\
            a\tc\tp\t2014-01-02 00:00:00\t-1\n\
            c\tb\tp\t2014-01-03 00:00:00\t1\n\
            bad row\n";
        let mut load = LoadReport::default();
        load_reader(Cursor::new(input), "body", &LoaderOptions::default(), &mut load).unwrap();
        let config = Config::default();
        let analysis = Analysis::from_load(load, Window::default(), &config);
        let roles = analysis.roles(&config);
        let communities = CommunityAnalysis::analyze(&analysis.graph, &config.metrics.pagerank, &config.community);
        AnalysisReport::build(&analysis, &roles, &communities, &config)
    }

    #[test]
    fn test_report_figures() {
        let report = report();
        assert_eq!(report.load.records, 3);
        assert_eq!(report.load.skipped, 1);
        assert_eq!(report.negative_links, 2);
        assert_eq!(report.top_sources[0].id, "a");
        assert_eq!(report.role_census.values().sum::<usize>(), 3);
    }

    #[test]
    fn test_plain_text_has_no_escapes() {
        let text = report().render_text(false);
        assert!(text.contains("Hostility graph"));
        assert!(text.contains("negative links: 2"));
        assert!(!text.contains('\u{1b}'));
    }

    #[test]
    fn test_coloured_text_has_escapes() {
        assert!(report().render_text(true).contains('\u{1b}'));
    }

    #[test]
    fn test_json_serialises() {
        let json = serde_json::to_value(report()).unwrap();
        assert_eq!(json["negative_links"], 2);
        assert!(json["role_census"]["unclassified"].is_number());
        assert_eq!(json["roles"].as_array().map(Vec::len), Some(3));
    }
}
