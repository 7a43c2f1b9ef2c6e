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

//! Test the shortest-path policy and overrides.

use pretty_assertions::assert_eq;
use test_log::test;

use super::{iface, link, node};
use crate::{
    builder::{forced_spine, leaf_chain, two_tier},
    policy::{compute_policy, OverrideSpec, PolicyEntry, PolicySpec, RoutePolicy},
    topology::Topology,
    types::{GraphError, NodeId, NodeKind},
};

fn next_hop<'t>(t: &'t Topology, p: &RoutePolicy, src: &str, dst: &str) -> Option<&'t str> {
    p.get(node(t, src), link(t, dst))
        .map(|e| t.node_name(e.next_hop))
}

#[test]
fn leaf_chain_shortest_path() {
    let t = Topology::from_spec(&leaf_chain().topology).unwrap();
    let p = compute_policy(&t);

    assert_eq!(next_hop(&t, &p, "node-0", "link-4"), Some("switch1"));
    assert_eq!(next_hop(&t, &p, "node-2", "link-0"), Some("switch2"));
    assert_eq!(next_hop(&t, &p, "switch1", "link-2"), Some("switch2"));
    assert_eq!(next_hop(&t, &p, "switch1", "link-4"), Some("switch2"));
    assert_eq!(next_hop(&t, &p, "switch2", "link-0"), Some("switch1"));
    assert_eq!(next_hop(&t, &p, "switch2", "link-4"), Some("switch3"));
    assert_eq!(next_hop(&t, &p, "switch3", "link-0"), Some("switch2"));
    assert_eq!(next_hop(&t, &p, "switch3", "link-1"), Some("switch2"));

    // no entries towards attached links
    assert_eq!(next_hop(&t, &p, "switch1", "link-0"), None);
    assert_eq!(next_hop(&t, &p, "switch2", "link-3"), None);
    assert_eq!(next_hop(&t, &p, "node-3", "link-4"), None);

    // every host has 4 entries, switch1 and switch3 have 3 and switch2 has 2.
    assert_eq!(p.len(), 5 * 4 + 3 + 2 + 3);
    assert_eq!(p.overrides().count(), 0);
}

#[test]
fn forced_spine_shortest_path() {
    let t = Topology::from_spec(&forced_spine().topology).unwrap();
    let p = RoutePolicy::shortest_path(&t);

    // both spines are members of link-1 and link-2, and switch3 is on link-1 directly
    assert_eq!(next_hop(&t, &p, "node-2", "link-1"), Some("switch3"));
    assert_eq!(next_hop(&t, &p, "node-2", "link-0"), Some("switch2"));
    assert_eq!(next_hop(&t, &p, "switch2", "link-1"), Some("switch3"));
    assert_eq!(next_hop(&t, &p, "switch1", "link-1"), Some("switch2"));
    assert_eq!(next_hop(&t, &p, "switch1", "link-2"), Some("switch2"));
    assert_eq!(next_hop(&t, &p, "node-3", "link-0"), Some("switch3"));
    assert_eq!(next_hop(&t, &p, "switch3", "link-2"), None);
}

#[test]
fn ties_are_broken_by_name() {
    let mut t = Topology::new();
    let h = t.add_node("host", NodeKind::Host).unwrap();
    let b = t.add_node("switch-b", NodeKind::Switch).unwrap();
    let a = t.add_node("switch-a", NodeKind::Switch).unwrap();
    let d = t.add_node("dst", NodeKind::Host).unwrap();
    let ep = |t: &mut Topology, n: NodeId, name: &str| (n, t.add_interface(n, name).unwrap());
    let lan = vec![ep(&mut t, h, "lan"), ep(&mut t, b, "lan"), ep(&mut t, a, "lan")];
    let far = vec![ep(&mut t, d, "far"), ep(&mut t, b, "far"), ep(&mut t, a, "far")];
    t.add_link("lan", lan).unwrap();
    t.add_link("far", far).unwrap();

    let p = compute_policy(&t);
    assert_eq!(next_hop(&t, &p, "host", "far"), Some("switch-a"));
    assert_eq!(next_hop(&t, &p, "dst", "lan"), Some("switch-a"));
}

#[test]
fn hosts_do_not_forward() {
    // s1 -- h -- s2 -- h2
    let mut t = Topology::new();
    let s1 = t.add_node("s1", NodeKind::Switch).unwrap();
    let h = t.add_node("h", NodeKind::Host).unwrap();
    let s2 = t.add_node("s2", NodeKind::Switch).unwrap();
    let h2 = t.add_node("h2", NodeKind::Host).unwrap();
    let ep = |t: &mut Topology, n: NodeId, name: &str| (n, t.add_interface(n, name).unwrap());
    let a = vec![ep(&mut t, s1, "a"), ep(&mut t, h, "a")];
    let b = vec![ep(&mut t, h, "b"), ep(&mut t, s2, "b")];
    let c = vec![ep(&mut t, s2, "c"), ep(&mut t, h2, "c")];
    t.add_link("a", a).unwrap();
    t.add_link("b", b).unwrap();
    t.add_link("c", c).unwrap();

    let p = compute_policy(&t);
    assert_eq!(next_hop(&t, &p, "s1", "b"), None);
    assert_eq!(next_hop(&t, &p, "s1", "c"), None);
    assert_eq!(next_hop(&t, &p, "h2", "a"), None);
    assert_eq!(next_hop(&t, &p, "h", "c"), Some("s2"));
    assert_eq!(next_hop(&t, &p, "h2", "b"), Some("s2"));
    assert_eq!(next_hop(&t, &p, "s2", "a"), None);
    assert!(p.iter().all(|(_, _, e)| t.node(e.next_hop).unwrap().kind() == NodeKind::Switch));
}

#[test]
fn set_override() {
    let t = Topology::from_spec(&forced_spine().topology).unwrap();
    let s2 = node(&t, "switch2");
    let s3 = node(&t, "switch3");
    let l1 = link(&t, "link-1");
    let l2 = link(&t, "link-2");
    let n2 = node(&t, "node-2");

    let mut p = compute_policy(&t);
    let before = p.len();

    // towards an attached link: the connected route must be withdrawn
    assert_eq!(p.set_override(&t, s3, l2, s2), None);
    assert_eq!(
        p.get(s3, l2),
        Some(&PolicyEntry {
            next_hop: s2,
            is_override: true,
            withdraw: Some(iface(&t, "switch3", "interface-8")),
        })
    );

    // towards a remote link: replaces the shortest-path entry
    let old = p.set_override(&t, n2, l1, s2).unwrap();
    assert_eq!(old.next_hop, s3);
    assert!(!old.is_override);
    assert_eq!(p.get(n2, l1).unwrap().withdraw, None);

    assert_eq!(p.len(), before + 1);
    assert_eq!(p.overrides().count(), 2);

    p.remove(s3, l2);
    assert_eq!(p.get(s3, l2), None);
    assert_eq!(p.overrides().count(), 1);
}

#[test]
fn merge_other_wins() {
    let t = Topology::from_spec(&forced_spine().topology).unwrap();
    let n2 = node(&t, "node-2");
    let l1 = link(&t, "link-1");

    let mut p = compute_policy(&t);
    let mut o = RoutePolicy::new();
    o.set_override(&t, n2, l1, node(&t, "switch2"));
    let len = p.len();
    p.merge(o);

    assert_eq!(p.len(), len);
    assert_eq!(next_hop(&t, &p, "node-2", "link-1"), Some("switch2"));
    assert!(p.get(n2, l1).unwrap().is_override);
}

#[test]
fn entries_of_single_node() {
    let t = Topology::from_spec(&leaf_chain().topology).unwrap();
    let p = compute_policy(&t);
    let s1 = node(&t, "switch1");
    assert_eq!(
        p.entries_of(s1).map(|(l, _)| l).collect::<Vec<_>>(),
        vec![link(&t, "link-2"), link(&t, "link-3"), link(&t, "link-4")]
    );
    assert!(p.entries_of(s1).all(|(_, e)| e.next_hop == node(&t, "switch2")));
}

#[test]
fn two_tier_policy() {
    let t = Topology::from_spec(&two_tier(3, 2).topology).unwrap();
    let p = compute_policy(&t);
    // every leaf and every host reaches the remote LANs via the spine or their leaf.
    assert_eq!(next_hop(&t, &p, "leaf-0", "lan-1"), Some("spine"));
    assert_eq!(next_hop(&t, &p, "host-0-1", "lan-2"), Some("leaf-0"));
    assert_eq!(next_hop(&t, &p, "spine", "lan-2"), Some("leaf-2"));
    assert_eq!(p.len(), 3 + 3 * 4 + 6 * 5);
}

#[test]
fn policy_spec() {
    let t = Topology::from_spec(&forced_spine().topology).unwrap();
    let spec = PolicySpec {
        overrides: forced_spine().overrides,
    };
    let p = spec.build(&t).unwrap();
    assert_eq!(p.len(), 2);
    assert_eq!(next_hop(&t, &p, "switch3", "link-2"), Some("switch2"));
    assert_eq!(next_hop(&t, &p, "node-2", "link-1"), Some("switch2"));

    let spec = PolicySpec {
        overrides: vec![OverrideSpec {
            node: "switch3".to_string(),
            destination: "link-7".to_string(),
            via: "switch2".to_string(),
        }],
    };
    assert_eq!(
        spec.build(&t),
        Err(GraphError::UnknownLink("link-7".to_string()))
    );

    let json = r#"{ "overrides": [ { "node": "switch3", "destination": "link-2", "via": "switch2" } ] }"#;
    let spec: PolicySpec = serde_json::from_str(json).unwrap();
    assert_eq!(spec.build(&t).unwrap().overrides().count(), 1);
}
