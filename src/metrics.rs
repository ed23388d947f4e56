// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Per-node and graph-level metrics over the hostility graph

use crate::graph::HostilityGraph;
use crate::types::LinkRecord;
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::debug;

/// Metrics for one community, all counted over negative links only
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeMetrics {
    /// Community id
    pub id: String,
    /// Distinct communities this one links to negatively
    pub out_degree: usize,
    /// Distinct communities linking to this one negatively
    pub in_degree: usize,
    /// Negative links sent
    pub out_weight: u64,
    /// Negative links received
    pub in_weight: u64,
    /// Local clustering coefficient on the undirected projection
    pub clustering: f64,
    /// Weighted PageRank score
    pub pagerank: f64,
}

impl NodeMetrics {
    /// In-degree plus out-degree
    #[must_use]
    pub fn total_degree(&self) -> usize {
        self.in_degree + self.out_degree
    }

    /// Whether the node has no negative links at all
    #[must_use]
    pub fn is_inactive(&self) -> bool {
        self.in_degree == 0 && self.out_degree == 0
    }
}

/// Ranking keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RankBy {
    /// Distinct targets
    OutDegree,
    /// Distinct sources
    InDegree,
    /// In-degree plus out-degree
    Total,
    /// Negative links sent
    OutWeight,
    /// Negative links received
    InWeight,
    /// Weighted PageRank
    Pagerank,
}

impl RankBy {
    fn key(self, node: &NodeMetrics) -> f64 {
        match self {
            Self::OutDegree => node.out_degree as f64,
            Self::InDegree => node.in_degree as f64,
            Self::Total => node.total_degree() as f64,
            Self::OutWeight => node.out_weight as f64,
            Self::InWeight => node.in_weight as f64,
            Self::Pagerank => node.pagerank,
        }
    }
}

/// PageRank parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PageRankConfig {
    /// Damping factor
    pub damping: f64,
    /// L1 convergence tolerance
    pub tolerance: f64,
    /// Iteration cap
    pub max_iterations: usize,
}

impl Default for PageRankConfig {
    fn default() -> Self {
        Self {
            damping: 0.85,
            tolerance: 1e-6,
            max_iterations: 100,
        }
    }
}

/// min / max / mean of a sample
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Summary {
    /// Smallest value
    pub min: f64,
    /// Largest value
    pub max: f64,
    /// Arithmetic mean
    pub mean: f64,
}

impl Summary {
    fn of(values: impl IntoIterator<Item = f64>) -> Self {
        let mut count = 0usize;
        let mut sum = 0.0;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for v in values {
            count += 1;
            sum += v;
            min = min.min(v);
            max = max.max(v);
        }
        if count == 0 {
            return Self::default();
        }
        Self {
            min,
            max,
            mean: sum / count as f64,
        }
    }
}

/// Graph-level statistics
#[derive(Debug, Clone, Serialize)]
pub struct GraphStats {
    /// Communities
    pub nodes: usize,
    /// Distinct ordered pairs
    pub edges: usize,
    /// Negative links
    pub total_weight: u64,
    /// Directed density
    pub density: f64,
    /// In-degree distribution
    pub in_degree: Summary,
    /// Out-degree distribution
    pub out_degree: Summary,
    /// Edge weight distribution
    pub edge_weight: Summary,
    /// Total degree -> number of nodes with that degree
    pub degree_histogram: BTreeMap<usize, usize>,
    /// Estimated exponent of `P(k) ~ k^-alpha`
    pub power_law_exponent: Option<f64>,
}

/// Negative share of all links touching a community
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Controversy {
    /// Community id
    pub id: String,
    /// Links sent or received, any sentiment
    pub total_links: usize,
    /// Negative links sent or received
    pub negative_links: usize,
    /// `negative_links / total_links`
    pub negative_ratio: f64,
}

/// Metrics for every node, sorted by id
#[derive(Debug, Clone, Default)]
pub struct Metrics {
    nodes: Vec<NodeMetrics>,
    index: HashMap<String, usize>,
}

impl Metrics {
    /// Compute metrics for every node in the graph
    #[must_use]
    pub fn compute(graph: &HostilityGraph, pagerank_config: &PageRankConfig) -> Self {
        let g = graph.inner();
        let clustering = clustering_coefficients(graph);
        let ranks = pagerank(graph, pagerank_config);

        let nodes: Vec<NodeMetrics> = g
            .node_indices()
            .map(|idx| {
                let mut out_degree = 0;
                let mut out_weight = 0;
                for edge in g.edges_directed(idx, Direction::Outgoing) {
                    out_degree += 1;
                    out_weight += edge.weight().weight;
                }
                let mut in_degree = 0;
                let mut in_weight = 0;
                for edge in g.edges_directed(idx, Direction::Incoming) {
                    in_degree += 1;
                    in_weight += edge.weight().weight;
                }
                NodeMetrics {
                    id: g[idx].clone(),
                    out_degree,
                    in_degree,
                    out_weight,
                    in_weight,
                    clustering: clustering[idx.index()],
                    pagerank: ranks[idx.index()],
                }
            })
            .collect();

        let index = nodes.iter().enumerate().map(|(i, n)| (n.id.clone(), i)).collect();
        Self { nodes, index }
    }

    /// All node metrics, sorted by id
    #[must_use]
    pub fn nodes(&self) -> &[NodeMetrics] {
        &self.nodes
    }

    /// Metrics of one community
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&NodeMetrics> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    /// Nodes sorted descending by `by`, ties broken by id ascending
    #[must_use]
    pub fn ranking(&self, by: RankBy) -> Vec<&NodeMetrics> {
        let mut ranked: Vec<&NodeMetrics> = self.nodes.iter().collect();
        ranked.sort_by(|a, b| {
            by.key(b)
                .partial_cmp(&by.key(a))
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });
        ranked
    }

    /// The first `n` entries of [`Metrics::ranking`]
    #[must_use]
    pub fn top(&self, by: RankBy, n: usize) -> Vec<&NodeMetrics> {
        let mut ranked = self.ranking(by);
        ranked.truncate(n);
        ranked
    }

    /// Graph-level statistics
    #[must_use]
    pub fn stats(&self, graph: &HostilityGraph) -> GraphStats {
        let mut degree_histogram = BTreeMap::new();
        for node in &self.nodes {
            *degree_histogram.entry(node.total_degree()).or_insert(0) += 1;
        }
        GraphStats {
            nodes: graph.node_count(),
            edges: graph.edge_count(),
            total_weight: graph.total_weight(),
            density: graph.density(),
            in_degree: Summary::of(self.nodes.iter().map(|n| n.in_degree as f64)),
            out_degree: Summary::of(self.nodes.iter().map(|n| n.out_degree as f64)),
            edge_weight: Summary::of(graph.inner().edge_weights().map(|w| w.weight as f64)),
            power_law_exponent: power_law_exponent(&degree_histogram),
            degree_histogram,
        }
    }
}

/// Weighted PageRank by power iteration, indexed by node index.
///
/// Rank flows along edges in proportion to their weight. Mass held by
/// nodes with no outbound links is spread uniformly each round.
#[must_use]
pub fn pagerank(graph: &HostilityGraph, config: &PageRankConfig) -> Vec<f64> {
    let g = graph.inner();
    let n = g.node_count();
    if n == 0 {
        return Vec::new();
    }
    let uniform = 1.0 / n as f64;
    let d = config.damping;

    let out_weight: Vec<f64> = g
        .node_indices()
        .map(|idx| {
            g.edges_directed(idx, Direction::Outgoing)
                .map(|e| e.weight().weight as f64)
                .sum()
        })
        .collect();

    let mut scores = vec![uniform; n];
    let mut next = vec![0.0; n];

    for iter in 0..config.max_iterations {
        next.iter_mut().for_each(|s| *s = 0.0);
        let mut dangling = 0.0;

        for idx in g.node_indices() {
            let i = idx.index();
            if out_weight[i] == 0.0 {
                dangling += scores[i];
                continue;
            }
            for edge in g.edges_directed(idx, Direction::Outgoing) {
                next[edge.target().index()] += d * scores[i] * edge.weight().weight as f64 / out_weight[i];
            }
        }

        let jump = (1.0 - d) * uniform + d * dangling * uniform;
        for s in &mut next {
            *s += jump;
        }

        let diff: f64 = next.iter().zip(&scores).map(|(a, b)| (a - b).abs()).sum();
        std::mem::swap(&mut scores, &mut next);
        if diff < config.tolerance {
            debug!("PageRank converged after {} iterations (diff {:.2e})", iter + 1, diff);
            return scores;
        }
    }

    debug!("PageRank stopped at {} iterations without converging", config.max_iterations);
    scores
}

/// Local clustering coefficient of each node on the undirected projection,
/// indexed by node index. Self-loops are ignored; nodes with fewer than two
/// neighbours score zero.
#[must_use]
pub fn clustering_coefficients(graph: &HostilityGraph) -> Vec<f64> {
    let g = graph.inner();
    let n = g.node_count();

    let mut neighbours: Vec<HashSet<usize>> = vec![HashSet::new(); n];
    for edge in g.edge_references() {
        let (a, b) = (edge.source().index(), edge.target().index());
        if a != b {
            neighbours[a].insert(b);
            neighbours[b].insert(a);
        }
    }

    (0..n)
        .map(|u| {
            let k = neighbours[u].len();
            if k < 2 {
                return 0.0;
            }
            let mut links = 0usize;
            for &v in &neighbours[u] {
                links += neighbours[v].iter().filter(|&w| neighbours[u].contains(w)).count();
            }
            // each neighbour pair was seen from both ends
            let triangles = links as f64 / 2.0;
            triangles / ((k * (k - 1)) as f64 / 2.0)
        })
        .collect()
}

/// Least-squares slope of `ln(count)` against `ln(degree)`, negated.
///
/// Returns `None` with fewer than two distinct positive degrees.
#[must_use]
pub fn power_law_exponent(histogram: &BTreeMap<usize, usize>) -> Option<f64> {
    let points: Vec<(f64, f64)> = histogram
        .iter()
        .filter(|(&k, &c)| k > 0 && c > 0)
        .map(|(&k, &c)| ((k as f64).ln(), (c as f64).ln()))
        .collect();
    if points.len() < 2 {
        return None;
    }
    let n = points.len() as f64;
    let mean_x = points.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = points.iter().map(|p| p.1).sum::<f64>() / n;
    let sxx: f64 = points.iter().map(|p| (p.0 - mean_x).powi(2)).sum();
    let sxy: f64 = points.iter().map(|p| (p.0 - mean_x) * (p.1 - mean_y)).sum();
    if sxx == 0.0 {
        return None;
    }
    Some(-(sxy / sxx))
}

/// Rank communities by the negative share of every link they touch.
///
/// Counts all records, not just negative ones. A link is counted once for
/// its source and once for its target. Communities with fewer than
/// `min_links` links are left out.
#[must_use]
pub fn controversy<'a>(records: impl IntoIterator<Item = &'a LinkRecord>, min_links: usize) -> Vec<Controversy> {
    let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();
    for record in records {
        for id in [&record.source, &record.target] {
            let entry = counts.entry(id.as_str()).or_insert((0, 0));
            entry.0 += 1;
            if record.is_negative() {
                entry.1 += 1;
            }
        }
    }

    let mut ranked: Vec<Controversy> = counts
        .into_iter()
        .filter(|(_, (total, _))| *total >= min_links.max(1))
        .map(|(id, (total, negative))| Controversy {
            id: id.to_string(),
            total_links: total,
            negative_links: negative,
            negative_ratio: negative as f64 / total as f64,
        })
        .collect();
    ranked.sort_by(|a, b| {
        b.negative_ratio
            .partial_cmp(&a.negative_ratio)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.id.cmp(&b.id))
    });
    ranked
}
