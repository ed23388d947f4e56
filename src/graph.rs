// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Weighted directed hostility graph over communities

use crate::types::LinkRecord;
use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt::Write as _;
use tracing::{debug, warn};

/// Aggregated negative links between one ordered pair of communities
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkWeight {
    /// Number of negative links
    pub weight: u64,
    /// Earliest link
    pub first_link: NaiveDateTime,
    /// Latest link
    pub last_link: NaiveDateTime,
}

impl LinkWeight {
    fn new(at: NaiveDateTime) -> Self {
        Self {
            weight: 1,
            first_link: at,
            last_link: at,
        }
    }

    fn absorb(&mut self, at: NaiveDateTime) {
        self.weight += 1;
        self.first_link = self.first_link.min(at);
        self.last_link = self.last_link.max(at);
    }
}

/// One exported edge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeExport {
    /// Source community
    pub source: String,
    /// Target community
    pub target: String,
    /// Aggregated link data
    #[serde(flatten)]
    pub link: LinkWeight,
}

/// JSON export layout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphExport {
    /// Adjacency fingerprint
    pub fingerprint: String,
    /// Community ids, sorted
    pub nodes: Vec<String>,
    /// Edges sorted by (source, target)
    pub edges: Vec<EdgeExport>,
}

/// The hostility graph with petgraph backing for algorithms.
///
/// Built once from negative links and read-only afterwards. Nodes are
/// inserted in sorted id order and edges in sorted pair order, so the
/// node index of a community is its rank among all ids.
#[derive(Debug, Clone, Default)]
pub struct HostilityGraph {
    /// The underlying directed graph
    graph: DiGraph<String, LinkWeight>,
    /// Map from community id to node index
    node_indices: HashMap<String, NodeIndex>,
}

impl HostilityGraph {
    /// Create an empty graph
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from link records, aggregating repeated pairs into weights.
    ///
    /// Only negative records contribute; any others are ignored.
    #[must_use]
    pub fn build<'a>(records: impl IntoIterator<Item = &'a LinkRecord>) -> Self {
        let mut pairs: BTreeMap<(&str, &str), LinkWeight> = BTreeMap::new();
        let mut ids: BTreeSet<&str> = BTreeSet::new();
        let mut ignored = 0usize;

        for record in records {
            if !record.is_negative() {
                ignored += 1;
                continue;
            }
            ids.insert(&record.source);
            ids.insert(&record.target);
            pairs
                .entry((record.source.as_str(), record.target.as_str()))
                .and_modify(|w| w.absorb(record.timestamp))
                .or_insert_with(|| LinkWeight::new(record.timestamp));
        }

        if ignored > 0 {
            warn!("Ignored {} non-negative record(s) while building the graph", ignored);
        }

        let mut graph = DiGraph::with_capacity(ids.len(), pairs.len());
        let mut node_indices = HashMap::with_capacity(ids.len());
        for id in ids {
            let idx = graph.add_node(id.to_string());
            node_indices.insert(id.to_string(), idx);
        }
        for ((source, target), link) in pairs {
            // Both endpoints were inserted above
            if let (Some(&from), Some(&to)) = (node_indices.get(source), node_indices.get(target)) {
                graph.add_edge(from, to, link);
            }
        }

        debug!(
            "Built hostility graph: {} nodes, {} edges",
            graph.node_count(),
            graph.edge_count()
        );

        Self { graph, node_indices }
    }

    /// Subgraph induced by `members`: those nodes and every edge between them.
    ///
    /// Ids not in the graph are ignored. Members keep their sorted order.
    #[must_use]
    pub fn induced(&self, members: &BTreeSet<&str>) -> Self {
        let mut graph = DiGraph::with_capacity(members.len(), 0);
        let mut node_indices = HashMap::with_capacity(members.len());
        for &id in members.iter().filter(|id| self.contains(id)) {
            let idx = graph.add_node(id.to_string());
            node_indices.insert(id.to_string(), idx);
        }

        for &id in members {
            let (Some(source), Some(&from)) = (self.index_of(id), node_indices.get(id)) else {
                continue;
            };
            let mut targets: Vec<(NodeIndex, LinkWeight)> = self
                .graph
                .edges_directed(source, Direction::Outgoing)
                .filter_map(|e| {
                    let to = node_indices.get(self.graph[e.target()].as_str())?;
                    Some((*to, e.weight().clone()))
                })
                .collect();
            targets.sort_by_key(|(to, _)| *to);
            for (to, link) in targets {
                graph.add_edge(from, to, link);
            }
        }

        Self { graph, node_indices }
    }

    /// Borrow the petgraph graph
    #[must_use]
    pub fn inner(&self) -> &DiGraph<String, LinkWeight> {
        &self.graph
    }

    /// Node index of a community
    #[must_use]
    pub fn index_of(&self, id: &str) -> Option<NodeIndex> {
        self.node_indices.get(id).copied()
    }

    /// Community id at a node index
    #[must_use]
    pub fn id_at(&self, idx: NodeIndex) -> Option<&str> {
        self.graph.node_weight(idx).map(String::as_str)
    }

    /// Whether the community appears in the graph
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.node_indices.contains_key(id)
    }

    /// Community ids in sorted order
    pub fn node_ids(&self) -> impl Iterator<Item = &str> {
        self.graph.node_weights().map(String::as_str)
    }

    /// Get node count
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Get edge count (distinct ordered pairs)
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Check if the graph is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Sum of edge weights, equal to the number of negative links
    #[must_use]
    pub fn total_weight(&self) -> u64 {
        self.graph.edge_weights().map(|w| w.weight).sum()
    }

    /// Aggregated link data from `source` to `target`
    #[must_use]
    pub fn link(&self, source: &str, target: &str) -> Option<&LinkWeight> {
        let from = self.index_of(source)?;
        let to = self.index_of(target)?;
        self.graph.find_edge(from, to).and_then(|e| self.graph.edge_weight(e))
    }

    /// Number of negative links from `source` to `target`
    #[must_use]
    pub fn weight(&self, source: &str, target: &str) -> Option<u64> {
        self.link(source, target).map(|l| l.weight)
    }

    /// Outbound neighbours with weights, sorted by id
    #[must_use]
    pub fn successors(&self, id: &str) -> Vec<(&str, u64)> {
        self.neighbours(id, Direction::Outgoing)
    }

    /// Inbound neighbours with weights, sorted by id
    #[must_use]
    pub fn predecessors(&self, id: &str) -> Vec<(&str, u64)> {
        self.neighbours(id, Direction::Incoming)
    }

    fn neighbours(&self, id: &str, direction: Direction) -> Vec<(&str, u64)> {
        let Some(idx) = self.index_of(id) else {
            return Vec::new();
        };
        let mut out: Vec<(&str, u64)> = self
            .graph
            .edges_directed(idx, direction)
            .map(|e| {
                let other = match direction {
                    Direction::Outgoing => e.target(),
                    Direction::Incoming => e.source(),
                };
                (self.graph[other].as_str(), e.weight().weight)
            })
            .collect();
        out.sort_unstable();
        out
    }

    /// Ordered adjacency: source -> (target -> weight).
    ///
    /// Every node appears as a key, including those with no outbound links.
    #[must_use]
    pub fn adjacency(&self) -> BTreeMap<String, BTreeMap<String, u64>> {
        let mut adjacency: BTreeMap<String, BTreeMap<String, u64>> =
            self.node_ids().map(|id| (id.to_string(), BTreeMap::new())).collect();
        for edge in self.graph.edge_references() {
            let source = &self.graph[edge.source()];
            let target = &self.graph[edge.target()];
            adjacency
                .entry(source.clone())
                .or_default()
                .insert(target.clone(), edge.weight().weight);
        }
        adjacency
    }

    /// SHA-256 over the ordered adjacency, hex encoded
    #[must_use]
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for (source, targets) in self.adjacency() {
            hasher.update(source.as_bytes());
            hasher.update([0u8]);
            for (target, weight) in targets {
                hasher.update(target.as_bytes());
                hasher.update([0u8]);
                hasher.update(weight.to_le_bytes());
            }
            hasher.update([0xffu8]);
        }
        hex::encode(hasher.finalize())
    }

    /// Directed density: edges / (n * (n - 1))
    #[must_use]
    pub fn density(&self) -> f64 {
        let n = self.node_count() as f64;
        if n < 2.0 {
            return 0.0;
        }
        self.edge_count() as f64 / (n * (n - 1.0))
    }

    fn sorted_edges(&self) -> Vec<EdgeExport> {
        let mut edges: Vec<EdgeExport> = self
            .graph
            .edge_references()
            .map(|e| EdgeExport {
                source: self.graph[e.source()].clone(),
                target: self.graph[e.target()].clone(),
                link: e.weight().clone(),
            })
            .collect();
        edges.sort_by(|a, b| (&a.source, &a.target).cmp(&(&b.source, &b.target)));
        edges
    }

    /// Export to DOT format for Graphviz
    #[must_use]
    pub fn to_dot(&self) -> String {
        let mut dot = String::from("digraph hostility {\n");
        dot.push_str("  rankdir=LR;\n");
        dot.push_str("  node [shape=ellipse];\n\n");

        for id in self.node_ids() {
            let _ = writeln!(dot, "  \"{}\";", escape_dot(id));
        }

        dot.push('\n');

        for edge in self.sorted_edges() {
            let _ = writeln!(
                dot,
                "  \"{}\" -> \"{}\" [weight={}, label=\"{}\"];",
                escape_dot(&edge.source),
                escape_dot(&edge.target),
                edge.link.weight,
                edge.link.weight
            );
        }

        dot.push_str("}\n");
        dot
    }

    /// Export to JSON
    pub fn to_json(&self) -> Result<String> {
        let export = GraphExport {
            fingerprint: self.fingerprint(),
            nodes: self.node_ids().map(String::from).collect(),
            edges: self.sorted_edges(),
        };
        serde_json::to_string_pretty(&export).context("Failed to serialize graph to JSON")
    }

    /// Export the edge list as TSV with a header row.
    ///
    /// Backslash, tab, newline and carriage return in ids are written as
    /// `\\`, `\t`, `\n` and `\r` so every edge stays on one five-column line.
    #[must_use]
    pub fn to_tsv(&self) -> String {
        let mut tsv = String::from("source\ttarget\tweight\tfirst_link\tlast_link\n");
        for edge in self.sorted_edges() {
            let _ = writeln!(
                tsv,
                "{}\t{}\t{}\t{}\t{}",
                escape_tsv(&edge.source),
                escape_tsv(&edge.target),
                edge.link.weight,
                edge.link.first_link.format(TIME_FORMAT),
                edge.link.last_link.format(TIME_FORMAT)
            );
        }
        tsv
    }

    /// Export to GraphML with per-edge weight and first/last link times
    #[must_use]
    pub fn to_graphml(&self) -> String {
        let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        xml.push_str("<graphml xmlns=\"http://graphml.graphdrawing.org/xmlns\">\n");
        xml.push_str("  <key id=\"weight\" for=\"edge\" attr.name=\"weight\" attr.type=\"long\"/>\n");
        xml.push_str("  <key id=\"first_link\" for=\"edge\" attr.name=\"first_link\" attr.type=\"string\"/>\n");
        xml.push_str("  <key id=\"last_link\" for=\"edge\" attr.name=\"last_link\" attr.type=\"string\"/>\n");
        xml.push_str("  <graph id=\"hostility\" edgedefault=\"directed\">\n");

        for id in self.node_ids() {
            let _ = writeln!(xml, "    <node id=\"{}\"/>", escape_xml(id));
        }

        for edge in self.sorted_edges() {
            let _ = writeln!(
                xml,
                "    <edge source=\"{}\" target=\"{}\">",
                escape_xml(&edge.source),
                escape_xml(&edge.target)
            );
            let _ = writeln!(xml, "      <data key=\"weight\">{}</data>", edge.link.weight);
            let _ = writeln!(
                xml,
                "      <data key=\"first_link\">{}</data>",
                edge.link.first_link.format(TIME_FORMAT)
            );
            let _ = writeln!(
                xml,
                "      <data key=\"last_link\">{}</data>",
                edge.link.last_link.format(TIME_FORMAT)
            );
            xml.push_str("    </edge>\n");
        }

        xml.push_str("  </graph>\n</graphml>\n");
        xml
    }
}

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn escape_dot(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

fn escape_tsv(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('\t', "\\t")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
