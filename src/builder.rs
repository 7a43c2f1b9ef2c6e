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

//! Ready-made topologies. [`forced_spine`] and [`leaf_chain`] are two small fat-tree networks
//! used for testing distributed systems on the test bed, and [`two_tier`] generates a leaf/spine
//! network of any size.

use std::collections::BTreeMap;

use maplit::btreemap;

use crate::{
    pipeline::PlanInput,
    policy::OverrideSpec,
    topology::{EndpointSpec, LinkSpec, NodeSpec, TopologySpec},
    types::NodeKind,
};

fn node(name: &str, kind: NodeKind, ifaces: &[&str]) -> NodeSpec {
    NodeSpec {
        name: name.to_string(),
        kind,
        interfaces: ifaces.iter().map(|s| s.to_string()).collect(),
    }
}

fn link(name: &str, endpoints: &[(&str, &str)]) -> LinkSpec {
    LinkSpec {
        name: name.to_string(),
        endpoints: endpoints
            .iter()
            .map(|(n, i)| EndpointSpec {
                node: n.to_string(),
                iface: i.to_string(),
            })
            .collect(),
    }
}

/// The fat tree where the spine `switch3` shares `link-2` with `switch2` and `node-2`, but must
/// not deliver traffic to `node-2` directly. Traffic between `switch3` and `node-2` is forced
/// through `switch2` in both directions, and `link-2` is a `/29`.
///
/// ```text
///  node-0   node-1           node-3   node-4
///      \     /                   \     /
///      [link-0]                  [link-1]
///         |                         |
///      switch1 --[link-3]-- switch2  switch3
///                              \     /
///                              [link-2]
///                                 |
///                               node-2
/// ```
pub fn forced_spine() -> PlanInput {
    use NodeKind::*;
    PlanInput {
        topology: TopologySpec {
            nodes: vec![
                node("node-0", Host, &["interface-1"]),
                node("node-1", Host, &["interface-2"]),
                node("node-2", Host, &["interface-6"]),
                node("node-3", Host, &["interface-4"]),
                node("node-4", Host, &["interface-5"]),
                node("switch1", Switch, &["interface-0", "interface-10"]),
                node("switch2", Switch, &["interface-7", "interface-9"]),
                node("switch3", Switch, &["interface-3", "interface-8"]),
            ],
            links: vec![
                link(
                    "link-0",
                    &[
                        ("switch1", "interface-0"),
                        ("node-0", "interface-1"),
                        ("node-1", "interface-2"),
                    ],
                ),
                link(
                    "link-1",
                    &[
                        ("switch3", "interface-3"),
                        ("node-3", "interface-4"),
                        ("node-4", "interface-5"),
                    ],
                ),
                link(
                    "link-2",
                    &[
                        ("switch2", "interface-7"),
                        ("node-2", "interface-6"),
                        ("switch3", "interface-8"),
                    ],
                ),
                link(
                    "link-3",
                    &[("switch2", "interface-9"), ("switch1", "interface-10")],
                ),
            ],
        },
        overrides: vec![
            OverrideSpec {
                node: "switch3".to_string(),
                destination: "link-2".to_string(),
                via: "switch2".to_string(),
            },
            OverrideSpec {
                node: "node-2".to_string(),
                destination: "link-1".to_string(),
                via: "switch2".to_string(),
            },
        ],
        link_prefix_len: btreemap! { "link-2".to_string() => 29 },
    }
}

/// A chain of three switches, with two hosts behind `switch1`, one host behind `switch2`, and two
/// hosts behind `switch3`. All links between switches, and the link to `node-2`, are
/// point-to-point links.
///
/// ```text
///  node-0  node-1                                   node-3  node-4
///      \    /                                           \    /
///     [link-0]                                         [link-4]
///        |                                                |
///     switch1 --[link-1]-- switch2 --[link-3]-- switch3 --+
///                             |
///                          [link-2]
///                             |
///                           node-2
/// ```
pub fn leaf_chain() -> PlanInput {
    use NodeKind::*;
    PlanInput {
        topology: TopologySpec {
            nodes: vec![
                node("node-0", Host, &["interface-1"]),
                node("node-1", Host, &["interface-2"]),
                node("node-2", Host, &["interface-6"]),
                node("node-3", Host, &["interface-4"]),
                node("node-4", Host, &["interface-5"]),
                node("switch1", Switch, &["interface-0", "interface-10"]),
                node("switch2", Switch, &["interface-9", "interface-7", "interface-11"]),
                node("switch3", Switch, &["interface-12", "interface-3"]),
            ],
            links: vec![
                link(
                    "link-0",
                    &[
                        ("switch1", "interface-0"),
                        ("node-0", "interface-1"),
                        ("node-1", "interface-2"),
                    ],
                ),
                link(
                    "link-1",
                    &[("switch1", "interface-10"), ("switch2", "interface-9")],
                ),
                link(
                    "link-2",
                    &[("switch2", "interface-7"), ("node-2", "interface-6")],
                ),
                link(
                    "link-3",
                    &[("switch2", "interface-11"), ("switch3", "interface-12")],
                ),
                link(
                    "link-4",
                    &[
                        ("switch3", "interface-3"),
                        ("node-3", "interface-4"),
                        ("node-4", "interface-5"),
                    ],
                ),
            ],
        },
        overrides: Vec::new(),
        link_prefix_len: BTreeMap::new(),
    }
}

/// Leaf/spine network with a single spine switch `spine`. Each leaf `leaf-i` connects the hosts
/// `host-i-0`, `host-i-1`, ... on the link `lan-i`, and reaches the spine over the
/// point-to-point link `uplink-i`.
pub fn two_tier(leaves: usize, hosts_per_leaf: usize) -> PlanInput {
    let mut nodes = Vec::new();
    let mut links = Vec::new();

    let uplinks = (0..leaves).map(|i| format!("uplink-{i}")).collect::<Vec<_>>();
    nodes.push(NodeSpec {
        name: "spine".to_string(),
        kind: NodeKind::Switch,
        interfaces: uplinks.clone(),
    });

    for i in 0..leaves {
        let leaf = format!("leaf-{i}");
        nodes.push(node(&leaf, NodeKind::Switch, &["down", "up"]));
        let hosts = (0..hosts_per_leaf)
            .map(|j| format!("host-{i}-{j}"))
            .collect::<Vec<_>>();
        for h in hosts.iter() {
            nodes.push(node(h, NodeKind::Host, &["eth0"]));
        }

        let mut lan = vec![(leaf.as_str(), "down")];
        lan.extend(hosts.iter().map(|h| (h.as_str(), "eth0")));
        links.push(link(&format!("lan-{i}"), &lan));
        links.push(link(
            &uplinks[i],
            &[("spine", uplinks[i].as_str()), (leaf.as_str(), "up")],
        ));
    }

    PlanInput {
        topology: TopologySpec { nodes, links },
        overrides: Vec::new(),
        link_prefix_len: BTreeMap::new(),
    }
}
