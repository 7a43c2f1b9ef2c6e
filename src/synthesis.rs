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

//! # Route Synthesizer
//!
//! Combines the topology, the address plan and the route policy into one static route table per
//! node. Each route names the destination subnet, the address of the next-hop on a link shared
//! with the node, and the interface through which that next-hop is reached.
//!
//! Every node gets one route towards each link it is not attached to. Links without a policy
//! entry are skipped, and reported by the validator as missing routes.
//!
//! If the policy redirects traffic towards a link the node is itself attached to, the operating
//! system would still prefer its automatically installed connected route. Such entries carry the
//! `delete_before_add` flag, telling the renderer to remove the connected route first. Once that
//! route is gone, addresses on the link are no longer directly reachable, so every route leaving
//! through the withdrawn interface is marked `onlink`.

use std::{collections::BTreeMap, net::Ipv4Addr};

use ipnet::Ipv4Net;
use log::*;
use serde::{Deserialize, Serialize};

use crate::{
    addressing::AddressPlan,
    policy::RoutePolicy,
    topology::Topology,
    types::{IfaceId, LinkId, NodeId, SynthesisError},
};

/// A single static route of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RouteTableEntry {
    /// Destination subnet
    pub destination: Ipv4Net,
    /// The link to which `destination` is allocated
    pub link: LinkId,
    /// Address of the next-hop
    pub next_hop: Ipv4Addr,
    /// The node that owns the next-hop address
    pub next_hop_node: NodeId,
    /// Outgoing interface of the node, through which `next_hop` is reachable
    pub iface: IfaceId,
    /// The connected route towards `destination` must be removed before this route is added.
    pub delete_before_add: bool,
    /// The interface carrying the connected route to remove. Only set if `delete_before_add` is
    /// `true`.
    pub withdraw: Option<IfaceId>,
    /// `iface` carries a withdrawn connected route of this node, so `next_hop` must be installed
    /// as directly reachable on `iface`.
    pub onlink: bool,
}

/// Static route tables of all nodes. Every node of the topology has a (possibly empty) table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteTables {
    pub(crate) tables: BTreeMap<NodeId, Vec<RouteTableEntry>>,
}

impl RouteTables {
    /// Get the route table of a node. Returns an empty slice if the node is unknown.
    pub fn get(&self, node: NodeId) -> &[RouteTableEntry] {
        self.tables.get(&node).map(|t| t.as_slice()).unwrap_or_default()
    }

    /// Iterate over all route tables, ordered by the node id.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &[RouteTableEntry])> {
        self.tables.iter().map(|(n, t)| (*n, t.as_slice()))
    }

    /// Total number of routes over all nodes.
    pub fn num_entries(&self) -> usize {
        self.tables.values().map(|t| t.len()).sum()
    }
}

/// Synthesize the static route tables of all nodes. Fails if the policy references elements not
/// present in the topology, or names a next-hop that shares no link with the node. No partial
/// result is returned.
pub fn synthesize_routes(
    topo: &Topology,
    plan: &AddressPlan,
    policy: &RoutePolicy,
) -> Result<RouteTables, SynthesisError> {
    for (src, link, entry) in policy.iter() {
        for node in [src, entry.next_hop] {
            topo.node(node).ok_or(SynthesisError::UnknownNode(node))?;
        }
        topo.link(link).ok_or(SynthesisError::UnknownLink(link))?;
    }

    let mut tables = BTreeMap::new();
    for node in topo.nodes() {
        let attached = topo.links_of(node);
        let mut table = Vec::new();

        for link in topo.links() {
            let connected = attached.contains(&link);
            let entry = match policy.get(node, link) {
                Some(entry) if !connected || entry.is_override => entry,
                // the connected route already covers this link
                _ if connected => continue,
                _ => {
                    warn!(
                        "{} has no next-hop towards {}",
                        topo.node_name(node),
                        topo.link(link).map(|l| l.name()).unwrap_or("?")
                    );
                    continue;
                }
            };
            if entry.next_hop == node {
                return Err(SynthesisError::NextHopIsSelf(node, link));
            }
            let destination = plan.subnet(link).ok_or(SynthesisError::MissingSubnet(link))?;

            let via = topo
                .shared_links(node, entry.next_hop)
                .into_iter()
                .next()
                .ok_or(SynthesisError::NoSharedLink(node, entry.next_hop))?;
            let iface = topo
                .iface_on(node, via)
                .ok_or(SynthesisError::NoSharedLink(node, entry.next_hop))?;
            let nh_iface = topo
                .iface_on(entry.next_hop, via)
                .ok_or(SynthesisError::NoSharedLink(node, entry.next_hop))?;
            let next_hop = plan
                .address(nh_iface)
                .ok_or(SynthesisError::MissingAddress(nh_iface))?;

            let withdraw = if connected {
                topo.iface_on(node, link)
            } else {
                None
            };

            trace!(
                "{}: {} via {} ({}){}",
                topo.node_name(node),
                destination,
                next_hop,
                topo.node_name(entry.next_hop),
                if connected { " [delete-before-add]" } else { "" }
            );

            table.push(RouteTableEntry {
                destination,
                link,
                next_hop,
                next_hop_node: entry.next_hop,
                iface,
                delete_before_add: connected,
                withdraw,
                onlink: false,
            });
        }

        // next-hops behind a withdrawn connected route are no longer on-link for the kernel
        let withdrawn = table.iter().filter_map(|e| e.withdraw).collect::<Vec<_>>();
        for entry in table.iter_mut() {
            entry.onlink = withdrawn.contains(&entry.iface);
        }

        table.sort_by(|a, b| {
            (a.destination.network(), a.destination.prefix_len())
                .cmp(&(b.destination.network(), b.destination.prefix_len()))
                .then_with(|| {
                    topo.node_name(a.next_hop_node)
                        .cmp(topo.node_name(b.next_hop_node))
                })
        });
        debug!("{}: {} static routes", topo.node_name(node), table.len());
        tables.insert(node, table);
    }

    let tables = RouteTables { tables };
    info!(
        "Synthesized {} static routes for {} nodes",
        tables.num_entries(),
        topo.num_nodes()
    );
    Ok(tables)
}
