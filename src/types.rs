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

//! Module containing all identifier types and the error types of every planning stage.

use std::net::Ipv4Addr;

use ipnet::Ipv4Net;
use petgraph::graph::NodeIndex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub(crate) type IndexType = u32;
/// Node Identification (and index into the adjacency graph)
pub type NodeId = NodeIndex<IndexType>;

/// Interface Identification. Interfaces are numbered globally in the order in which they were
/// added to the topology.
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Clone, Copy, Serialize, Deserialize)]
pub struct IfaceId(pub(crate) IndexType);

impl IfaceId {
    /// Get the index of the interface.
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl From<usize> for IfaceId {
    fn from(x: usize) -> Self {
        Self(x as IndexType)
    }
}

/// Link Identification. Links are numbered in the order in which they were added to the
/// topology. This order also determines the order of subnet allocation.
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LinkId(pub(crate) IndexType);

impl LinkId {
    /// Get the index of the link.
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl From<usize> for LinkId {
    fn from(x: usize) -> Self {
        Self(x as IndexType)
    }
}

/// Kind of a node in the topology.
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// End host. Hosts never forward traffic for others.
    Host,
    /// Software switch that forwards IP traffic between its links.
    Switch,
}

impl NodeKind {
    /// Returns `true` if nodes of this kind forward traffic.
    pub fn forwards(&self) -> bool {
        matches!(self, NodeKind::Switch)
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeKind::Host => f.write_str("host"),
            NodeKind::Switch => f.write_str("switch"),
        }
    }
}

/// Error raised while building a topology.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// A node, interface or link identifier is used twice.
    #[error("Identifier is used twice: {0}")]
    DuplicateId(String),
    /// The interface is already a member of another link.
    #[error("Interface {1} of node {0} is already bound to link {2}")]
    InterfaceAlreadyBound(String, String, String),
    /// The interface of an endpoint does not belong to the node it is paired with.
    #[error("Interface {1} does not belong to node {0}")]
    EndpointMismatch(String, String),
    /// The node is not part of the topology.
    #[error("Node was not found in the topology: {0}")]
    UnknownNode(String),
    /// The interface is not declared on the node.
    #[error("Interface {1} was not declared on node {0}")]
    UnknownInterface(String, String),
    /// The link is not part of the topology.
    #[error("Link was not found in the topology: {0}")]
    UnknownLink(String),
    /// A link must join at least two interfaces.
    #[error("Link {0} has fewer than two endpoints")]
    TooFewEndpoints(String),
    /// A node appears twice on the same link.
    #[error("Node {1} appears more than once on link {0}")]
    DuplicateEndpoint(String, String),
}

/// Error raised by the address planner. No partial plan is returned if this error occurs.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlanError {
    /// The netmask is invalid.
    #[error("Invalid Netmask: {0}")]
    InvalidNetmask(#[from] ipnet::PrefixLenError),
    /// No unused subnet of the required size remains in the pool.
    #[error("Address pool {pool} is exhausted! Cannot allocate a /{prefix_len} for link {link:?}.")]
    PoolExhausted {
        /// The pool that ran out of addresses
        pool: Ipv4Net,
        /// The link that could not be allocated
        link: LinkId,
        /// The requested prefix length
        prefix_len: u8,
    },
    /// The configured prefix of a link cannot hold all of its endpoints.
    #[error("A /{prefix_len} is too small for the {endpoints} endpoints of link {link:?}")]
    SubnetTooSmall {
        /// The link with the explicit prefix length
        link: LinkId,
        /// The configured prefix length
        prefix_len: u8,
        /// Number of endpoints on that link
        endpoints: usize,
    },
    /// An explicit prefix length was configured for a link that does not exist.
    #[error("Prefix length configured for an unknown link: {0}")]
    UnknownLink(String),
}

/// Error raised during route synthesis. It always points to a mismatch between policy and
/// topology that must be fixed by the caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SynthesisError {
    /// The policy names a next-hop that does not share a link with the node.
    #[error("Node {0:?} shares no link with its next-hop {1:?}")]
    NoSharedLink(NodeId, NodeId),
    /// The policy names the node itself as its next-hop.
    #[error("Node {0:?} is its own next-hop towards link {1:?}")]
    NextHopIsSelf(NodeId, LinkId),
    /// The policy references a node that is not part of the topology.
    #[error("Node {0:?} is not part of the topology")]
    UnknownNode(NodeId),
    /// The policy references a link that is not part of the topology.
    #[error("Link {0:?} is not part of the topology")]
    UnknownLink(LinkId),
    /// The address plan has no subnet for this link.
    #[error("The address plan has no subnet for link {0:?}")]
    MissingSubnet(LinkId),
    /// The address plan has no address for this interface.
    #[error("The address plan has no address for interface {0:?}")]
    MissingAddress(IfaceId),
}

/// A consistency problem found by the validator. Violations are never fatal on their own.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Violation {
    /// Two interfaces on the same link carry the same address.
    DuplicateAddress {
        /// The link
        link: LinkId,
        /// The address used twice
        addr: Ipv4Addr,
        /// First interface
        a: IfaceId,
        /// Second interface
        b: IfaceId,
    },
    /// Two links are assigned overlapping subnets.
    OverlappingSubnets {
        /// First link
        a: LinkId,
        /// Second link
        b: LinkId,
    },
    /// The address of an interface lies outside the subnet of its link.
    AddressOutsideSubnet {
        /// The interface
        iface: IfaceId,
        /// Its address
        addr: Ipv4Addr,
        /// Subnet of the link
        subnet: Ipv4Net,
    },
    /// The address of an interface is the network or broadcast address of its subnet.
    ReservedAddress {
        /// The interface
        iface: IfaceId,
        /// Its address
        addr: Ipv4Addr,
    },
    /// A link has no subnet assigned.
    MissingSubnet(LinkId),
    /// An interface bound to a link has no address assigned.
    MissingAddress(IfaceId),
    /// The next-hop of a route is not an address on a link shared with the node.
    UnreachableNextHop {
        /// The node owning the route table
        node: NodeId,
        /// Destination of the route
        destination: Ipv4Net,
        /// The next-hop address
        next_hop: Ipv4Addr,
    },
    /// A node has two routes for the same destination.
    DuplicateRoute {
        /// The node owning the route table
        node: NodeId,
        /// The destination with multiple routes
        destination: Ipv4Net,
    },
    /// A node has no route towards a link it is not attached to.
    MissingRoute {
        /// The node owning the route table
        node: NodeId,
        /// The link without a route
        link: LinkId,
    },
    /// A route leaves through an interface whose connected route is withdrawn, but is not marked
    /// as `onlink`. Once the connected route is gone, the kernel no longer considers the next-hop
    /// to be directly reachable.
    WithdrawnNextHop {
        /// The node owning the route table
        node: NodeId,
        /// Destination of the route
        destination: Ipv4Net,
        /// The interface whose connected route is withdrawn
        iface: IfaceId,
    },
}
