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

//! # Topology Graph
//!
//! The [`Topology`] holds all nodes (hosts and switches), their interfaces, and the links (shared
//! layer-2 segments) joining them. Every element must be declared explicitly; nothing is
//! inferred. Nodes are stored on an undirected petgraph [`Graph`], where each pair of nodes
//! sharing a link is connected by an edge carrying the [`LinkId`].
//!
//! ```
//! use staticplan::prelude::*;
//!
//! # fn main() -> Result<(), GraphError> {
//! let mut t = Topology::new();
//! let s1 = t.add_node("switch1", NodeKind::Switch)?;
//! let h0 = t.add_node("node-0", NodeKind::Host)?;
//! let s1_i0 = t.add_interface(s1, "interface-0")?;
//! let h0_i1 = t.add_interface(h0, "interface-1")?;
//! let l0 = t.add_link("link-0", [(s1, s1_i0), (h0, h0_i1)])?;
//!
//! assert_eq!(t.shared_links(s1, h0), vec![l0]);
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;

use itertools::Itertools;
use log::*;
use petgraph::{prelude::*, Graph};
use serde::{Deserialize, Serialize};

use crate::types::{GraphError, IfaceId, IndexType, LinkId, NodeId, NodeKind};

/// Graph storing all nodes. Two nodes are connected by one edge per link they share.
pub type AdjacencyGraph = Graph<Node, LinkId, Undirected, IndexType>;

/// A host or a switch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    name: String,
    kind: NodeKind,
    ifaces: Vec<IfaceId>,
}

impl Node {
    /// Name of the node
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Kind of the node
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// All interfaces of the node in the order they were added.
    pub fn ifaces(&self) -> &[IfaceId] {
        &self.ifaces
    }
}

/// Interface owned by exactly one node, and bound to at most one link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interface {
    name: String,
    node: NodeId,
    link: Option<LinkId>,
}

impl Interface {
    /// Name of the interface (unique within its node)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The node that owns this interface
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// The link this interface is bound to, if any
    pub fn link(&self) -> Option<LinkId> {
        self.link
    }
}

/// A shared broadcast segment joining two or more interfaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    name: String,
    endpoints: Vec<(NodeId, IfaceId)>,
}

impl Link {
    /// Name of the link
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Ordered list of endpoints. This order determines the address assignment.
    pub fn endpoints(&self) -> &[(NodeId, IfaceId)] {
        &self.endpoints
    }

    /// Returns `true` if the node is a member of this link.
    pub fn contains(&self, node: NodeId) -> bool {
        self.endpoints.iter().any(|(n, _)| *n == node)
    }
}

/// The topology of the network, owning all nodes, interfaces and links.
#[derive(Debug, Clone, Default)]
pub struct Topology {
    graph: AdjacencyGraph,
    ifaces: Vec<Interface>,
    links: Vec<Link>,
    node_names: HashMap<String, NodeId>,
    link_names: HashMap<String, LinkId>,
}

impl Topology {
    /// Generate an empty topology
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a topology from its declarative description. All nodes and their interfaces are
    /// added before any link, such that the order of declarations does not matter.
    pub fn from_spec(spec: &TopologySpec) -> Result<Self, GraphError> {
        let mut t = Self::new();
        for n in spec.nodes.iter() {
            let id = t.add_node(&n.name, n.kind)?;
            for iface in n.interfaces.iter() {
                t.add_interface(id, iface)?;
            }
        }
        for l in spec.links.iter() {
            let endpoints = l
                .endpoints
                .iter()
                .map(|e| {
                    let node = t.get_node_id(&e.node)?;
                    let iface = t.get_iface_id(node, &e.iface)?;
                    Ok((node, iface))
                })
                .collect::<Result<Vec<_>, GraphError>>()?;
            t.add_link(&l.name, endpoints)?;
        }
        info!(
            "Built topology with {} nodes, {} interfaces and {} links",
            t.num_nodes(),
            t.ifaces.len(),
            t.links.len()
        );
        Ok(t)
    }

    /// Add a new node to the topology. Fails with `GraphError::DuplicateId` if the name is already
    /// used by another node.
    pub fn add_node(&mut self, name: impl Into<String>, kind: NodeKind) -> Result<NodeId, GraphError> {
        let name = name.into();
        if self.node_names.contains_key(&name) {
            return Err(GraphError::DuplicateId(name));
        }
        let id = self.graph.add_node(Node {
            name: name.clone(),
            kind,
            ifaces: Vec::new(),
        });
        self.node_names.insert(name, id);
        Ok(id)
    }

    /// Add a new interface to an existing node. The name must be unique within that node.
    pub fn add_interface(
        &mut self,
        node: NodeId,
        name: impl Into<String>,
    ) -> Result<IfaceId, GraphError> {
        let name = name.into();
        let n = self
            .graph
            .node_weight(node)
            .ok_or_else(|| GraphError::UnknownNode(format!("{node:?}")))?;
        if n.ifaces.iter().any(|i| self.ifaces[i.index()].name == name) {
            return Err(GraphError::DuplicateId(format!("{}:{}", n.name, name)));
        }
        let id = IfaceId::from(self.ifaces.len());
        self.ifaces.push(Interface {
            name,
            node,
            link: None,
        });
        self.graph[node].ifaces.push(id);
        Ok(id)
    }

    /// Add a new link joining all `endpoints` in the given order. The topology is left unchanged
    /// if this function returns an error.
    pub fn add_link(
        &mut self,
        name: impl Into<String>,
        endpoints: impl IntoIterator<Item = (NodeId, IfaceId)>,
    ) -> Result<LinkId, GraphError> {
        let name = name.into();
        let endpoints: Vec<(NodeId, IfaceId)> = endpoints.into_iter().collect();

        if self.link_names.contains_key(&name) {
            return Err(GraphError::DuplicateId(name));
        }
        if endpoints.len() < 2 {
            return Err(GraphError::TooFewEndpoints(name));
        }
        for (i, (node, iface)) in endpoints.iter().enumerate() {
            let n = self
                .graph
                .node_weight(*node)
                .ok_or_else(|| GraphError::UnknownNode(format!("{node:?}")))?;
            let x = self
                .ifaces
                .get(iface.index())
                .ok_or_else(|| GraphError::UnknownInterface(n.name.clone(), format!("{iface:?}")))?;
            if x.node != *node {
                return Err(GraphError::EndpointMismatch(n.name.clone(), x.name.clone()));
            }
            if let Some(l) = x.link {
                return Err(GraphError::InterfaceAlreadyBound(
                    n.name.clone(),
                    x.name.clone(),
                    self.links[l.index()].name.clone(),
                ));
            }
            if endpoints[..i].iter().any(|(prev, _)| prev == node) {
                return Err(GraphError::DuplicateEndpoint(name, n.name.clone()));
            }
        }

        let id = LinkId::from(self.links.len());
        for (_, iface) in endpoints.iter() {
            self.ifaces[iface.index()].link = Some(id);
        }
        for ((a, _), (b, _)) in endpoints.iter().tuple_combinations() {
            self.graph.add_edge(*a, *b, id);
        }
        debug!("Added link {} with {} endpoints", name, endpoints.len());
        self.link_names.insert(name.clone(), id);
        self.links.push(Link { name, endpoints });
        Ok(id)
    }

    // ********************
    // * Helper Functions *
    // ********************

    /// Returns a reference to the adjacency graph (PetGraph struct)
    pub fn graph(&self) -> &AdjacencyGraph {
        &self.graph
    }

    /// Returns the number of nodes in the topology
    pub fn num_nodes(&self) -> usize {
        self.graph.node_count()
    }

    /// Returns the number of links in the topology
    pub fn num_links(&self) -> usize {
        self.links.len()
    }

    /// Iterate over all nodes in the order they were added.
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.graph.node_indices()
    }

    /// Iterate over all links in the order they were added.
    pub fn links(&self) -> impl Iterator<Item = LinkId> + '_ {
        (0..self.links.len()).map(LinkId::from)
    }

    /// Get the node with the given id.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.graph.node_weight(id)
    }

    /// Get the link with the given id.
    pub fn link(&self, id: LinkId) -> Option<&Link> {
        self.links.get(id.index())
    }

    /// Get the interface with the given id.
    pub fn iface(&self, id: IfaceId) -> Option<&Interface> {
        self.ifaces.get(id.index())
    }

    /// Get the name of a node, or `"?"` if it does not exist.
    pub fn node_name(&self, id: NodeId) -> &str {
        self.node(id).map(|n| n.name()).unwrap_or("?")
    }

    /// Get the NodeId with the given name.
    pub fn get_node_id(&self, name: impl AsRef<str>) -> Result<NodeId, GraphError> {
        self.node_names
            .get(name.as_ref())
            .copied()
            .ok_or_else(|| GraphError::UnknownNode(name.as_ref().to_string()))
    }

    /// Get the LinkId with the given name.
    pub fn get_link_id(&self, name: impl AsRef<str>) -> Result<LinkId, GraphError> {
        self.link_names
            .get(name.as_ref())
            .copied()
            .ok_or_else(|| GraphError::UnknownLink(name.as_ref().to_string()))
    }

    /// Get the interface of `node` with the given name.
    pub fn get_iface_id(&self, node: NodeId, name: impl AsRef<str>) -> Result<IfaceId, GraphError> {
        let n = self
            .node(node)
            .ok_or_else(|| GraphError::UnknownNode(format!("{node:?}")))?;
        n.ifaces
            .iter()
            .copied()
            .find(|i| self.ifaces[i.index()].name == name.as_ref())
            .ok_or_else(|| GraphError::UnknownInterface(n.name.clone(), name.as_ref().to_string()))
    }

    /// All links the node is a member of, sorted by their id.
    pub fn links_of(&self, node: NodeId) -> Vec<LinkId> {
        self.node(node)
            .into_iter()
            .flat_map(|n| n.ifaces.iter())
            .filter_map(|i| self.ifaces[i.index()].link)
            .sorted()
            .collect()
    }

    /// The interface of `node` bound to `link`, if `node` is a member of it.
    pub fn iface_on(&self, node: NodeId, link: LinkId) -> Option<IfaceId> {
        self.link(link)?
            .endpoints
            .iter()
            .find(|(n, _)| *n == node)
            .map(|(_, i)| *i)
    }

    /// Returns `true` if `node` is a member of `link`.
    pub fn is_member(&self, node: NodeId, link: LinkId) -> bool {
        self.iface_on(node, link).is_some()
    }

    /// All links shared by `a` and `b`, sorted by their id.
    pub fn shared_links(&self, a: NodeId, b: NodeId) -> Vec<LinkId> {
        self.graph
            .edges_connecting(a, b)
            .map(|e| *e.weight())
            .sorted()
            .dedup()
            .collect()
    }

    /// All nodes that share at least one link with `node`, sorted by their id.
    pub fn neighbors(&self, node: NodeId) -> Vec<NodeId> {
        self.graph.neighbors(node).sorted().dedup().collect()
    }
}

/// Declarative description of a topology, as read from a JSON file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopologySpec {
    /// All nodes
    pub nodes: Vec<NodeSpec>,
    /// All links
    pub links: Vec<LinkSpec>,
}

/// Declaration of a single node and its interfaces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSpec {
    /// Name of the node
    pub name: String,
    /// Host or switch
    pub kind: NodeKind,
    /// Names of all interfaces
    #[serde(default)]
    pub interfaces: Vec<String>,
}

/// Declaration of a link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkSpec {
    /// Name of the link
    pub name: String,
    /// Ordered list of endpoints
    pub endpoints: Vec<EndpointSpec>,
}

/// A `(node, interface)` pair referenced by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointSpec {
    /// Name of the node
    pub node: String,
    /// Name of the interface on that node
    pub iface: String,
}
