// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Role classification - instigators, targets and bridges

use crate::metrics::{Metrics, NodeMetrics};
use crate::types::Role;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Heuristic thresholds for role assignment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoleThresholds {
    /// Minimum dominant-direction degree for instigator or target
    pub min_activity: usize,
    /// Dominant degree must be at least this multiple of the other direction
    pub dominance_ratio: f64,
    /// Minimum in- and out-degree for a bridge
    pub bridge_min_degree: usize,
    /// Maximum clustering coefficient for a bridge
    pub bridge_max_clustering: f64,
}

impl Default for RoleThresholds {
    fn default() -> Self {
        Self {
            min_activity: 5,
            dominance_ratio: 2.0,
            bridge_min_degree: 10,
            bridge_max_clustering: 0.1,
        }
    }
}

/// A community and the role it was given
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoleAssignment {
    /// Community id
    pub id: String,
    /// Assigned role
    pub role: Role,
    /// Negative out-degree
    pub out_degree: usize,
    /// Negative in-degree
    pub in_degree: usize,
    /// Clustering coefficient
    pub clustering: f64,
}

/// Classify one node.
///
/// Rules apply in order: inactive nodes are unclassified, then bridge,
/// instigator, target, and unclassified for everything else.
#[must_use]
pub fn classify(node: &NodeMetrics, thresholds: &RoleThresholds) -> Role {
    if node.is_inactive() {
        return Role::Unclassified;
    }

    let out_degree = node.out_degree as f64;
    let in_degree = node.in_degree as f64;

    if node.in_degree >= thresholds.bridge_min_degree
        && node.out_degree >= thresholds.bridge_min_degree
        && node.clustering <= thresholds.bridge_max_clustering
    {
        return Role::Bridge;
    }
    if node.out_degree >= thresholds.min_activity && out_degree >= thresholds.dominance_ratio * in_degree {
        return Role::Instigator;
    }
    if node.in_degree >= thresholds.min_activity && in_degree >= thresholds.dominance_ratio * out_degree {
        return Role::Target;
    }
    Role::Unclassified
}

/// Roles for every community
#[derive(Debug, Clone, Default, Serialize)]
pub struct RoleMap {
    /// Assignments sorted by id
    pub assignments: Vec<RoleAssignment>,
}

impl RoleMap {
    /// Classify every node with metrics, plus any extra `known` ids that
    /// never appear in a negative link (those are always unclassified).
    #[must_use]
    pub fn classify<'a>(
        metrics: &Metrics,
        known: impl IntoIterator<Item = &'a str>,
        thresholds: &RoleThresholds,
    ) -> Self {
        let mut by_id: BTreeMap<String, RoleAssignment> = metrics
            .nodes()
            .iter()
            .map(|node| {
                (
                    node.id.clone(),
                    RoleAssignment {
                        id: node.id.clone(),
                        role: classify(node, thresholds),
                        out_degree: node.out_degree,
                        in_degree: node.in_degree,
                        clustering: node.clustering,
                    },
                )
            })
            .collect();

        for id in known {
            by_id.entry(id.to_string()).or_insert_with(|| RoleAssignment {
                id: id.to_string(),
                role: Role::Unclassified,
                out_degree: 0,
                in_degree: 0,
                clustering: 0.0,
            });
        }

        Self {
            assignments: by_id.into_values().collect(),
        }
    }

    /// Role of one community
    #[must_use]
    pub fn role_of(&self, id: &str) -> Option<Role> {
        self.assignments
            .binary_search_by(|a| a.id.as_str().cmp(id))
            .ok()
            .map(|i| self.assignments[i].role)
    }

    /// Assignments with the given role, sorted by id
    pub fn with_role(&self, role: Role) -> impl Iterator<Item = &RoleAssignment> {
        self.assignments.iter().filter(move |a| a.role == role)
    }

    /// Count per role; every role is present, possibly with zero
    #[must_use]
    pub fn census(&self) -> BTreeMap<Role, usize> {
        let mut census: BTreeMap<Role, usize> = Role::ALL.iter().map(|&r| (r, 0)).collect();
        for assignment in &self.assignments {
            *census.entry(assignment.role).or_insert(0) += 1;
        }
        census
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(out_degree: usize, in_degree: usize, clustering: f64) -> NodeMetrics {
        NodeMetrics {
            id: "n".into(),
            out_degree,
            in_degree,
            out_weight: out_degree as u64,
            in_weight: in_degree as u64,
            clustering,
            pagerank: 0.0,
        }
    }

    #[test]
    fn test_inactive_is_unclassified() {
        assert_eq!(classify(&node(0, 0, 0.0), &RoleThresholds::default()), Role::Unclassified);
    }

    #[test]
    fn test_instigator() {
        let t = RoleThresholds::default();
        assert_eq!(classify(&node(10, 2, 0.5), &t), Role::Instigator);
        assert_eq!(classify(&node(10, 6, 0.5), &t), Role::Unclassified);
        // below min activity
        assert_eq!(classify(&node(4, 0, 0.5), &t), Role::Unclassified);
    }

    #[test]
    fn test_target() {
        let t = RoleThresholds::default();
        assert_eq!(classify(&node(1, 8, 0.5), &t), Role::Target);
        assert_eq!(classify(&node(0, 5, 0.0), &t), Role::Target);
    }

    #[test]
    fn test_bridge_needs_low_clustering() {
        let t = RoleThresholds::default();
        assert_eq!(classify(&node(12, 15, 0.05), &t), Role::Bridge);
        assert_eq!(classify(&node(12, 15, 0.4), &t), Role::Unclassified);
        // lopsided but qualifying bridge still counts as bridge
        assert_eq!(classify(&node(40, 10, 0.0), &t), Role::Bridge);
    }

    #[test]
    fn test_custom_thresholds() {
        let t = RoleThresholds {
            min_activity: 1,
            dominance_ratio: 1.5,
            ..RoleThresholds::default()
        };
        assert_eq!(classify(&node(3, 2, 0.0), &t), Role::Instigator);
        assert_eq!(classify(&node(1, 0, 0.0), &t), Role::Instigator);
    }

    #[test]
    fn test_census_covers_all_roles() {
        let map = RoleMap::classify(&Metrics::default(), ["quiet", "calm"], &RoleThresholds::default());
        let census = map.census();
        assert_eq!(census.len(), 4);
        assert_eq!(census[&Role::Unclassified], 2);
        assert_eq!(map.role_of("calm"), Some(Role::Unclassified));
        assert_eq!(map.role_of("absent"), None);
    }
}
