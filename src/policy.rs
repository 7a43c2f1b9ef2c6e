// StaticPlan: Address and static route planning for lab topologies
// Copyright (C) 2024 The StaticPlan Authors
//
// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; either version 2 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along
// with this program; if not, write to the Free Software Foundation, Inc.,
// 51 Franklin Street, Fifth Floor, Boston, MA 02110-1301 USA.

//! # Route Policy
//!
//! A [`RoutePolicy`] tells, for each node and each destination link, which node should be used as
//! the next-hop. The policy is plain data. It can be written by hand, or derived from the
//! topology with [`RoutePolicy::shortest_path`]. Overrides set with
//! [`RoutePolicy::set_override`] supersede the default choice, and may even redirect traffic
//! towards a link that the node is directly attached to.

use std::collections::{BTreeMap, HashMap};

use itertools::Itertools;
use log::*;
use petgraph::{algo::dijkstra, visit::NodeFiltered};
use serde::{Deserialize, Serialize};

use crate::{
    topology::Topology,
    types::{GraphError, IfaceId, LinkId, NodeId},
};

/// Desired next-hop of a node towards a destination link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PolicyEntry {
    /// The node to forward traffic to.
    pub next_hop: NodeId,
    /// Whether this entry was set explicitly by the caller.
    pub is_override: bool,
    /// Interface of the source node whose connected route must be withdrawn before the static
    /// route is installed. Only set for overrides towards a link the source is a member of.
    pub withdraw: Option<IfaceId>,
}

/// Mapping from `(source, destination link)` to the desired next-hop.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoutePolicy {
    entries: BTreeMap<(NodeId, LinkId), PolicyEntry>,
}

/// Compute the default shortest-path policy of the topology. See
/// [`RoutePolicy::shortest_path`].
pub fn compute_policy(topo: &Topology) -> RoutePolicy {
    RoutePolicy::shortest_path(topo)
}

impl RoutePolicy {
    /// Create an empty policy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Derive the shortest-path policy. For every node and every link that node is not attached
    /// to, the next-hop is the neighboring switch closest to that link, where each link counts as
    /// a single hop. Only switches forward traffic, so hosts are never chosen as next-hop or used
    /// as transit. Equally good next-hops are resolved by picking the lowest node name. Pairs
    /// without any forwarding path are left out.
    pub fn shortest_path(topo: &Topology) -> Self {
        let g = topo.graph();
        let forwarders = NodeFiltered::from_fn(g, |n| g[n].kind().forwards());

        // hop count between every pair of switches
        let dist: HashMap<NodeId, HashMap<NodeId, usize>> = topo
            .nodes()
            .filter(|n| g[*n].kind().forwards())
            .map(|s| (s, dijkstra(&forwarders, s, None, |_| 1usize)))
            .collect();

        let mut entries = BTreeMap::new();
        for (link_id, link) in topo.links().filter_map(|l| Some((l, topo.link(l)?))) {
            let members = link
                .endpoints()
                .iter()
                .map(|(n, _)| *n)
                .filter(|n| g[*n].kind().forwards())
                .collect_vec();

            // distance of a switch to the link, counted in switch-to-switch hops.
            let dist_to_link = |n: NodeId| -> Option<usize> {
                let d = dist.get(&n)?;
                members.iter().filter_map(|m| d.get(m)).min().copied()
            };

            for src in topo.nodes().filter(|n| !link.contains(*n)) {
                let best = topo
                    .neighbors(src)
                    .into_iter()
                    .filter(|n| g[*n].kind().forwards())
                    .filter_map(|n| Some((dist_to_link(n)?, g[n].name(), n)))
                    .min();
                match best {
                    Some((_, _, next_hop)) => {
                        entries.insert(
                            (src, link_id),
                            PolicyEntry {
                                next_hop,
                                is_override: false,
                                withdraw: None,
                            },
                        );
                    }
                    None => warn!(
                        "{} cannot reach {}: no forwarding path",
                        g[src].name(),
                        link.name()
                    ),
                }
            }
        }

        debug!("Computed shortest-path policy with {} entries", entries.len());
        Self { entries }
    }

    /// Set the next-hop of `source` towards `destination` without marking it as an override.
    /// Returns the previous entry.
    pub fn set_next_hop(
        &mut self,
        source: NodeId,
        destination: LinkId,
        next_hop: NodeId,
    ) -> Option<PolicyEntry> {
        self.entries.insert(
            (source, destination),
            PolicyEntry {
                next_hop,
                is_override: false,
                withdraw: None,
            },
        )
    }

    /// Force `source` to reach `destination` through `next_hop`, superseding any other entry. If
    /// `source` is itself a member of `destination`, its interface on that link is recorded, as
    /// the connected route on that interface must be withdrawn first. Returns the previous entry.
    pub fn set_override(
        &mut self,
        topo: &Topology,
        source: NodeId,
        destination: LinkId,
        next_hop: NodeId,
    ) -> Option<PolicyEntry> {
        self.entries.insert(
            (source, destination),
            PolicyEntry {
                next_hop,
                is_override: true,
                withdraw: topo.iface_on(source, destination),
            },
        )
    }

    /// Remove the entry of `source` towards `destination`.
    pub fn remove(&mut self, source: NodeId, destination: LinkId) -> Option<PolicyEntry> {
        self.entries.remove(&(source, destination))
    }

    /// Get the entry of `source` towards `destination`.
    pub fn get(&self, source: NodeId, destination: LinkId) -> Option<&PolicyEntry> {
        self.entries.get(&(source, destination))
    }

    /// Layer all entries of `other` on top of `self`. Entries in `other` win.
    pub fn merge(&mut self, other: RoutePolicy) {
        self.entries.extend(other.entries)
    }

    /// Iterate over all entries of a single source node, ordered by the destination link.
    pub fn entries_of(&self, source: NodeId) -> impl Iterator<Item = (LinkId, &PolicyEntry)> {
        self.entries
            .range((source, LinkId(0))..=(source, LinkId(u32::MAX)))
            .map(|((_, l), e)| (*l, e))
    }

    /// Iterate over all entries.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, LinkId, &PolicyEntry)> {
        self.entries.iter().map(|((s, l), e)| (*s, *l, e))
    }

    /// Iterate over all overrides.
    pub fn overrides(&self) -> impl Iterator<Item = (NodeId, LinkId, &PolicyEntry)> {
        self.iter().filter(|(_, _, e)| e.is_override)
    }

    /// Number of entries in the policy.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the policy has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Caller-written overrides, referencing nodes and links by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicySpec {
    /// All overrides
    #[serde(default)]
    pub overrides: Vec<OverrideSpec>,
}

/// A single override: `node` reaches `destination` through `via`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrideSpec {
    /// The node whose route is forced
    pub node: String,
    /// Name of the destination link
    pub destination: String,
    /// Name of the next-hop node
    pub via: String,
}

impl PolicySpec {
    /// Resolve all names against the topology, and return a policy containing only the
    /// overrides. Merge it on top of the default policy with [`RoutePolicy::merge`].
    pub fn build(&self, topo: &Topology) -> Result<RoutePolicy, GraphError> {
        let mut policy = RoutePolicy::new();
        for o in self.overrides.iter() {
            let source = topo.get_node_id(&o.node)?;
            let destination = topo.get_link_id(&o.destination)?;
            let next_hop = topo.get_node_id(&o.via)?;
            policy.set_override(topo, source, destination, next_hop);
        }
        Ok(policy)
    }
}
