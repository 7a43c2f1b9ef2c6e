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

//! Module that introduces a formatter to display all types containing `NodeId`, `LinkId` or
//! `IfaceId` by their names.

use itertools::Itertools;

use crate::{
    synthesis::{RouteTableEntry, RouteTables},
    topology::Topology,
    types::{IfaceId, LinkId, NodeId, SynthesisError, Violation},
};

/// Trait to format a type that contains identifiers of the topology.
pub trait PlanFormatter<'a, 't> {
    /// Type that is returned, which implements `std::fmt::Display`.
    type Formatter;

    /// Return a struct that can be formatted and displayed.
    fn fmt(&'a self, topo: &'t Topology) -> Self::Formatter;
}

impl<'a, 't> PlanFormatter<'a, 't> for NodeId {
    type Formatter = &'t str;

    fn fmt(&'a self, topo: &'t Topology) -> Self::Formatter {
        topo.node_name(*self)
    }
}

impl<'a, 't> PlanFormatter<'a, 't> for LinkId {
    type Formatter = &'t str;

    fn fmt(&'a self, topo: &'t Topology) -> Self::Formatter {
        topo.link(*self).map(|l| l.name()).unwrap_or("?")
    }
}

impl<'a, 't> PlanFormatter<'a, 't> for IfaceId {
    type Formatter = String;

    fn fmt(&'a self, topo: &'t Topology) -> Self::Formatter {
        match topo.iface(*self) {
            Some(i) => format!("{}:{}", i.node().fmt(topo), i.name()),
            None => "?".to_string(),
        }
    }
}

impl<'a, 't> PlanFormatter<'a, 't> for RouteTableEntry {
    type Formatter = String;

    fn fmt(&'a self, topo: &'t Topology) -> Self::Formatter {
        format!(
            "{} via {} ({}) dev {}{}{}",
            self.destination,
            self.next_hop,
            self.next_hop_node.fmt(topo),
            topo.iface(self.iface).map(|i| i.name()).unwrap_or("?"),
            if self.onlink { " onlink" } else { "" },
            if self.delete_before_add {
                " [delete-before-add]"
            } else {
                ""
            }
        )
    }
}

impl<'a, 't> PlanFormatter<'a, 't> for RouteTables {
    type Formatter = String;

    fn fmt(&'a self, topo: &'t Topology) -> Self::Formatter {
        self.iter()
            .map(|(node, table)| {
                format!(
                    "{}:\n{}",
                    node.fmt(topo),
                    table.iter().map(|e| format!("    {}", e.fmt(topo))).join("\n")
                )
            })
            .join("\n")
    }
}

impl<'a, 't> PlanFormatter<'a, 't> for Violation {
    type Formatter = String;

    fn fmt(&'a self, topo: &'t Topology) -> Self::Formatter {
        match self {
            Violation::DuplicateAddress { link, addr, a, b } => format!(
                "{} and {} both use {} on {}",
                a.fmt(topo),
                b.fmt(topo),
                addr,
                link.fmt(topo)
            ),
            Violation::OverlappingSubnets { a, b } => {
                format!("subnets of {} and {} overlap", a.fmt(topo), b.fmt(topo))
            }
            Violation::AddressOutsideSubnet {
                iface,
                addr,
                subnet,
            } => format!("{} uses {} outside of {}", iface.fmt(topo), addr, subnet),
            Violation::ReservedAddress { iface, addr } => {
                format!("{} uses the reserved address {}", iface.fmt(topo), addr)
            }
            Violation::MissingSubnet(link) => format!("{} has no subnet", link.fmt(topo)),
            Violation::MissingAddress(iface) => format!("{} has no address", iface.fmt(topo)),
            Violation::UnreachableNextHop {
                node,
                destination,
                next_hop,
            } => format!(
                "{} routes {} via unreachable {}",
                node.fmt(topo),
                destination,
                next_hop
            ),
            Violation::DuplicateRoute { node, destination } => {
                format!("{} has multiple routes for {}", node.fmt(topo), destination)
            }
            Violation::MissingRoute { node, link } => {
                format!("{} has no route towards {}", node.fmt(topo), link.fmt(topo))
            }
            Violation::WithdrawnNextHop {
                node,
                destination,
                iface,
            } => format!(
                "{} routes {} through the withdrawn {} without onlink",
                node.fmt(topo),
                destination,
                iface.fmt(topo)
            ),
        }
    }
}

impl<'a, 't> PlanFormatter<'a, 't> for SynthesisError {
    type Formatter = String;

    fn fmt(&'a self, topo: &'t Topology) -> Self::Formatter {
        match self {
            SynthesisError::NoSharedLink(a, b) => format!(
                "Node {} shares no link with its next-hop {}",
                a.fmt(topo),
                b.fmt(topo)
            ),
            SynthesisError::NextHopIsSelf(n, l) => format!(
                "Node {} is its own next-hop towards {}",
                n.fmt(topo),
                l.fmt(topo)
            ),
            SynthesisError::MissingSubnet(l) => {
                format!("The address plan has no subnet for {}", l.fmt(topo))
            }
            SynthesisError::MissingAddress(i) => {
                format!("The address plan has no address for {}", i.fmt(topo))
            }
            e => e.to_string(),
        }
    }
}
