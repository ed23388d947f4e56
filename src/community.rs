// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Community structure of the hostility graph
//!
//! Communities of communities are found with Louvain modularity
//! optimisation (Blondel et al. 2008) on the undirected projection, where
//! the weight between two nodes is the sum of negative links in both
//! directions. Phase 1 moves single nodes to the neighbouring community with
//! the best modularity gain. Phase 2 collapses each community into one node
//! and repeats until nothing moves.
//!
//! Nodes are visited in index order (sorted ids) and candidate communities
//! in ascending order, so the partition is reproducible.
//!
//! On top of the partition this module measures the conflict flow between
//! communities and how much each node sits on cross-community links.

use crate::graph::HostilityGraph;
use crate::metrics::{pagerank, PageRankConfig};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Louvain parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LouvainConfig {
    /// Resolution (gamma); higher values give smaller communities
    pub resolution: f64,
    /// Maximum local-moving sweeps per level
    pub max_iterations: usize,
    /// Maximum aggregation levels
    pub max_levels: usize,
}

impl Default for LouvainConfig {
    fn default() -> Self {
        Self {
            resolution: 1.0,
            max_iterations: 100,
            max_levels: 10,
        }
    }
}

/// Undirected weighted graph used between Louvain levels
#[derive(Debug, Clone)]
struct Level {
    n: usize,
    /// `(i, j, w)` with `i < j`
    edges: Vec<(usize, usize, f64)>,
    self_loops: Vec<f64>,
}

impl Level {
    fn from_graph(graph: &HostilityGraph) -> Self {
        let g = graph.inner();
        let n = g.node_count();
        let mut weights: BTreeMap<(usize, usize), f64> = BTreeMap::new();
        let mut self_loops = vec![0.0; n];
        for edge in g.edge_references() {
            let (a, b) = (edge.source().index(), edge.target().index());
            let w = edge.weight().weight as f64;
            if a == b {
                self_loops[a] += w;
            } else {
                *weights.entry((a.min(b), a.max(b))).or_insert(0.0) += w;
            }
        }
        Self {
            n,
            edges: weights.into_iter().map(|((i, j), w)| (i, j, w)).collect(),
            self_loops,
        }
    }

    fn total_weight(&self) -> f64 {
        self.edges.iter().map(|e| e.2).sum::<f64>() + self.self_loops.iter().sum::<f64>()
    }

    fn degrees(&self) -> Vec<f64> {
        let mut degrees = vec![0.0; self.n];
        for &(i, j, w) in &self.edges {
            degrees[i] += w;
            degrees[j] += w;
        }
        for (i, &sl) in self.self_loops.iter().enumerate() {
            degrees[i] += 2.0 * sl;
        }
        degrees
    }

    fn modularity(&self, partition: &[usize], resolution: f64) -> f64 {
        let m = self.total_weight();
        if m == 0.0 {
            return 0.0;
        }
        let degrees = self.degrees();
        let mut internal: BTreeMap<usize, f64> = BTreeMap::new();
        let mut totals: BTreeMap<usize, f64> = BTreeMap::new();
        for &(i, j, w) in &self.edges {
            if partition[i] == partition[j] {
                *internal.entry(partition[i]).or_insert(0.0) += w;
            }
        }
        for (i, &sl) in self.self_loops.iter().enumerate() {
            *internal.entry(partition[i]).or_insert(0.0) += sl;
        }
        for (i, &k) in degrees.iter().enumerate() {
            *totals.entry(partition[i]).or_insert(0.0) += k;
        }
        totals
            .iter()
            .map(|(c, &tot)| {
                let inside = internal.get(c).copied().unwrap_or(0.0);
                inside / m - resolution * (tot / (2.0 * m)).powi(2)
            })
            .sum()
    }

    /// Phase 1. Returns the partition and whether any node moved.
    fn local_moving(&self, config: &LouvainConfig) -> (Vec<usize>, bool) {
        let mut adj: Vec<BTreeMap<usize, f64>> = vec![BTreeMap::new(); self.n];
        for &(i, j, w) in &self.edges {
            *adj[i].entry(j).or_insert(0.0) += w;
            *adj[j].entry(i).or_insert(0.0) += w;
        }

        let m = self.total_weight();
        let mut communities: Vec<usize> = (0..self.n).collect();
        if m == 0.0 {
            return (communities, false);
        }

        let degrees = self.degrees();
        let mut community_degrees = degrees.clone();
        let mut any_moved = false;

        for _ in 0..config.max_iterations {
            let mut moved = false;

            for node in 0..self.n {
                let current = communities[node];
                let ki = degrees[node];
                community_degrees[current] -= ki;

                let mut links: BTreeMap<usize, f64> = BTreeMap::new();
                for (&neighbour, &w) in &adj[node] {
                    *links.entry(communities[neighbour]).or_insert(0.0) += w;
                }

                let gain = |comm: usize, ki_in: f64| {
                    ki_in / m - config.resolution * community_degrees[comm] * ki / (2.0 * m * m)
                };

                let mut best = current;
                let mut best_gain = gain(current, links.get(&current).copied().unwrap_or(0.0));
                for (&comm, &ki_in) in &links {
                    let g = gain(comm, ki_in);
                    if g > best_gain + 1e-12 {
                        best_gain = g;
                        best = comm;
                    }
                }

                community_degrees[best] += ki;
                if best != current {
                    communities[node] = best;
                    moved = true;
                    any_moved = true;
                }
            }

            if !moved {
                break;
            }
        }

        (communities, any_moved)
    }

    /// Phase 2. Collapse each community into a node; returns the new level
    /// and, for each new node, the old nodes it holds.
    fn aggregate(&self, partition: &[usize]) -> (Self, Vec<Vec<usize>>) {
        let mut ids: Vec<usize> = partition.to_vec();
        ids.sort_unstable();
        ids.dedup();
        let remap: BTreeMap<usize, usize> = ids.iter().enumerate().map(|(i, &c)| (c, i)).collect();
        let n = ids.len();

        let mut members = vec![Vec::new(); n];
        for (node, comm) in partition.iter().enumerate() {
            members[remap[comm]].push(node);
        }

        let mut weights: BTreeMap<(usize, usize), f64> = BTreeMap::new();
        let mut self_loops = vec![0.0; n];
        for (i, &sl) in self.self_loops.iter().enumerate() {
            self_loops[remap[&partition[i]]] += sl;
        }
        for &(i, j, w) in &self.edges {
            let (ci, cj) = (remap[&partition[i]], remap[&partition[j]]);
            if ci == cj {
                self_loops[ci] += w;
            } else {
                *weights.entry((ci.min(cj), ci.max(cj))).or_insert(0.0) += w;
            }
        }

        let level = Self {
            n,
            edges: weights.into_iter().map(|((i, j), w)| (i, j, w)).collect(),
            self_loops,
        };
        (level, members)
    }
}

/// Louvain partition indexed by node index, plus its modularity.
///
/// Community labels are arbitrary but stable for a given graph.
#[must_use]
pub fn louvain(graph: &HostilityGraph, config: &LouvainConfig) -> (Vec<usize>, f64) {
    let base = Level::from_graph(graph);
    let n = base.n;
    if n == 0 {
        return (Vec::new(), 0.0);
    }

    // assignment[base node] = node at the current level
    let mut assignment: Vec<usize> = (0..n).collect();
    let mut level = base.clone();

    for depth in 0..config.max_levels {
        let (partition, moved) = level.local_moving(config);
        if !moved {
            break;
        }
        let (next, members) = level.aggregate(&partition);
        debug!("Louvain level {}: {} -> {} nodes", depth, level.n, next.n);

        let mut owner = vec![0; level.n];
        for (new_node, old_nodes) in members.iter().enumerate() {
            for &old in old_nodes {
                owner[old] = new_node;
            }
        }
        for slot in &mut assignment {
            *slot = owner[*slot];
        }

        let collapsed = next.n == level.n;
        level = next;
        if collapsed {
            break;
        }
    }

    let modularity = base.modularity(&assignment, config.resolution);
    (assignment, modularity)
}

/// One detected community
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommunitySummary {
    /// Community number; 0 is the largest
    pub id: usize,
    /// Member count
    pub size: usize,
    /// Negative links leaving the community
    pub outbound: u64,
    /// Negative links entering the community
    pub inbound: u64,
    /// Negative links between members
    pub internal: u64,
    /// Member with the highest PageRank within the community's own subgraph
    pub representative: Option<String>,
}

/// Negative links from one community to another
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConflictFlow {
    /// Sending community
    pub from: usize,
    /// Receiving community
    pub to: usize,
    /// Negative links
    pub weight: u64,
}

/// Weight of a node's cross-community links
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BridgeScore {
    /// Community id
    pub id: String,
    /// Negative links sent to or received from other communities
    pub score: u64,
}

/// Louvain partition with conflict flows and bridge scores
#[derive(Debug, Clone, Default, Serialize)]
pub struct CommunityAnalysis {
    /// Node id -> community number
    pub membership: BTreeMap<String, usize>,
    /// Communities ordered by number
    pub communities: Vec<CommunitySummary>,
    /// Cross-community flows, heaviest first
    pub flows: Vec<ConflictFlow>,
    /// Nodes with cross-community links, highest score first
    pub bridges: Vec<BridgeScore>,
    /// Modularity of the partition
    pub modularity: f64,
}

impl CommunityAnalysis {
    /// Detect communities and measure the conflict between them.
    ///
    /// Each community's representative is the top member by weighted
    /// PageRank over the subgraph induced by its members, ties going to
    /// the lowest id.
    #[must_use]
    pub fn analyze(graph: &HostilityGraph, pagerank_config: &PageRankConfig, config: &LouvainConfig) -> Self {
        let (raw, modularity) = louvain(graph, config);
        if raw.is_empty() {
            return Self::default();
        }
        let partition = renumber_by_size(&raw);
        let count = partition.iter().max().map_or(0, |&m| m + 1);
        let g = graph.inner();

        let representatives = representatives(graph, &partition, count, pagerank_config);
        let mut communities: Vec<CommunitySummary> = representatives
            .into_iter()
            .enumerate()
            .map(|(id, representative)| CommunitySummary {
                id,
                size: 0,
                outbound: 0,
                inbound: 0,
                internal: 0,
                representative,
            })
            .collect();
        let mut membership = BTreeMap::new();

        for idx in g.node_indices() {
            let comm = partition[idx.index()];
            communities[comm].size += 1;
            membership.insert(g[idx].clone(), comm);
        }

        let mut flow_weights: BTreeMap<(usize, usize), u64> = BTreeMap::new();
        let mut bridge_weights = vec![0u64; g.node_count()];
        for edge in g.edge_references() {
            let (a, b) = (edge.source().index(), edge.target().index());
            let w = edge.weight().weight;
            let (ca, cb) = (partition[a], partition[b]);
            if ca == cb {
                communities[ca].internal += w;
            } else {
                communities[ca].outbound += w;
                communities[cb].inbound += w;
                *flow_weights.entry((ca, cb)).or_insert(0) += w;
                bridge_weights[a] += w;
                bridge_weights[b] += w;
            }
        }

        let mut flows: Vec<ConflictFlow> = flow_weights
            .into_iter()
            .map(|((from, to), weight)| ConflictFlow { from, to, weight })
            .collect();
        flows.sort_by(|a, b| b.weight.cmp(&a.weight).then((a.from, a.to).cmp(&(b.from, b.to))));

        let mut bridges: Vec<BridgeScore> = g
            .node_indices()
            .filter(|idx| bridge_weights[idx.index()] > 0)
            .map(|idx| BridgeScore {
                id: g[idx].clone(),
                score: bridge_weights[idx.index()],
            })
            .collect();
        bridges.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.id.cmp(&b.id)));

        Self {
            membership,
            communities,
            flows,
            bridges,
            modularity,
        }
    }

    /// Community number of a node
    #[must_use]
    pub fn community_of(&self, id: &str) -> Option<usize> {
        self.membership.get(id).copied()
    }
}

/// Top member of each community by PageRank on its induced subgraph
fn representatives(
    graph: &HostilityGraph,
    partition: &[usize],
    count: usize,
    config: &PageRankConfig,
) -> Vec<Option<String>> {
    let g = graph.inner();
    let mut members: Vec<BTreeSet<&str>> = vec![BTreeSet::new(); count];
    for idx in g.node_indices() {
        members[partition[idx.index()]].insert(g[idx].as_str());
    }

    members
        .iter()
        .map(|ids| {
            let sub = graph.induced(ids);
            let ranks = pagerank(&sub, config);
            let mut best: Option<(&str, f64)> = None;
            for (idx, &rank) in sub.inner().node_indices().zip(&ranks) {
                if best.map_or(true, |(_, top)| rank > top) {
                    best = Some((sub.inner()[idx].as_str(), rank));
                }
            }
            best.map(|(id, _)| id.to_string())
        })
        .collect()
}

/// Relabel so community 0 is the largest; ties go to the community whose
/// first member has the lowest index.
fn renumber_by_size(partition: &[usize]) -> Vec<usize> {
    let mut stats: BTreeMap<usize, (usize, usize)> = BTreeMap::new();
    for (node, &comm) in partition.iter().enumerate() {
        let entry = stats.entry(comm).or_insert((0, node));
        entry.0 += 1;
    }
    let mut order: Vec<(usize, (usize, usize))> = stats.into_iter().collect();
    order.sort_by(|a, b| match b.1 .0.cmp(&a.1 .0) {
        Ordering::Equal => a.1 .1.cmp(&b.1 .1),
        other => other,
    });
    let relabel: BTreeMap<usize, usize> = order.iter().enumerate().map(|(new, (old, _))| (*old, new)).collect();
    partition.iter().map(|c| relabel[c]).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{LinkRecord, Sentiment};
    use chrono::NaiveDate;

    fn neg(source: &str, target: &str) -> LinkRecord {
        LinkRecord {
            source: source.into(),
            target: target.into(),
            post_id: None,
            timestamp: NaiveDate::from_ymd_opt(2016, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            sentiment: Sentiment::Negative,
            origin: "body".into(),
        }
    }

    /// Two dense triangles joined by one link a1 -> b1
    fn two_cliques() -> HostilityGraph {
        let mut records = Vec::new();
        for (x, y) in [("a1", "a2"), ("a2", "a3"), ("a3", "a1"), ("b1", "b2"), ("b2", "b3"), ("b3", "b1")] {
            records.push(neg(x, y));
            records.push(neg(y, x));
        }
        records.push(neg("a1", "b1"));
        HostilityGraph::build(&records)
    }

    #[test]
    fn test_louvain_splits_cliques() {
        let graph = two_cliques();
        let (partition, modularity) = louvain(&graph, &LouvainConfig::default());
        let comm = |id: &str| partition[graph.index_of(id).unwrap().index()];

        assert_eq!(comm("a1"), comm("a2"));
        assert_eq!(comm("a2"), comm("a3"));
        assert_eq!(comm("b1"), comm("b3"));
        assert_ne!(comm("a1"), comm("b1"));
        assert!(modularity > 0.3, "modularity was {modularity}");
    }

    #[test]
    fn test_louvain_deterministic() {
        let graph = two_cliques();
        let config = LouvainConfig::default();
        assert_eq!(louvain(&graph, &config), louvain(&graph, &config));
    }

    #[test]
    fn test_empty_graph() {
        let analysis = CommunityAnalysis::analyze(&HostilityGraph::new(), &PageRankConfig::default(), &LouvainConfig::default());
        assert!(analysis.communities.is_empty());
        assert!(analysis.flows.is_empty());
    }

    #[test]
    fn test_conflict_flow_and_bridges() {
        let graph = two_cliques();
        let analysis = CommunityAnalysis::analyze(&graph, &PageRankConfig::default(), &LouvainConfig::default());

        assert_eq!(analysis.communities.len(), 2);
        assert_eq!(analysis.flows.len(), 1);
        let flow = &analysis.flows[0];
        assert_eq!(flow.weight, 1);
        assert_eq!(Some(flow.from), analysis.community_of("a1"));
        assert_eq!(Some(flow.to), analysis.community_of("b1"));

        let ids: Vec<_> = analysis.bridges.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, ["a1", "b1"]);

        let total_internal: u64 = analysis.communities.iter().map(|c| c.internal).sum();
        assert_eq!(total_internal, 12);
        assert!(analysis.communities.iter().all(|c| c.representative.is_some()));
    }

    #[test]
    fn test_representative_ranked_within_community() {
        // x collects more global rank than h, but only from outside its community
        let mut records = vec![neg("a1", "h"), neg("a2", "h"), neg("a3", "h")];
        for i in 1..=6 {
            for _ in 0..5 {
                records.push(neg(&format!("b{i}"), "x"));
            }
        }
        let graph = HostilityGraph::build(&records);
        let config = PageRankConfig::default();

        let global = pagerank(&graph, &config);
        let rank = |id: &str| global[graph.index_of(id).unwrap().index()];
        assert!(rank("x") > rank("h"));

        let mut partition = vec![0; graph.node_count()];
        for i in 1..=6 {
            partition[graph.index_of(&format!("b{i}")).unwrap().index()] = 1;
        }

        let reps = representatives(&graph, &partition, 2, &config);
        assert_eq!(reps[0].as_deref(), Some("h"));
        // no internal links: ties go to the lowest id
        assert_eq!(reps[1].as_deref(), Some("b1"));
    }

    #[test]
    fn test_renumber_largest_first() {
        assert_eq!(renumber_by_size(&[7, 3, 3, 7, 3]), vec![1, 0, 0, 1, 0]);
        assert_eq!(renumber_by_size(&[5, 2]), vec![0, 1]);
    }
}
