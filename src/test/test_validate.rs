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

//! Test the validator on tampered plans.

use pretty_assertions::assert_eq;
use test_log::test;

use super::{iface, ip, link, net, node, planned};
use crate::{
    builder::{forced_spine, leaf_chain, two_tier},
    formatter::PlanFormatter,
    policy::RoutePolicy,
    synthesis::synthesize_routes,
    types::{NodeKind, Violation},
    validate::validate,
    Plan,
};

fn revalidate(plan: &Plan) -> Vec<Violation> {
    validate(&plan.topo, &plan.addresses, &plan.routes)
}

#[test]
fn clean_plans() {
    for input in [forced_spine(), leaf_chain(), two_tier(3, 2), two_tier(8, 5)] {
        let plan = planned(&input);
        assert_eq!(plan.violations, Vec::new());
        assert_eq!(revalidate(&plan), Vec::new());
    }
}

#[test]
fn duplicate_address() {
    let mut plan = planned(&forced_spine());
    let a = iface(&plan.topo, "node-0", "interface-1");
    let b = iface(&plan.topo, "node-1", "interface-2");
    plan.addresses.addrs.insert(b, net("10.0.0.2/24"));

    let violations = revalidate(&plan);
    assert_eq!(
        violations,
        vec![Violation::DuplicateAddress {
            link: link(&plan.topo, "link-0"),
            addr: ip("10.0.0.2"),
            a,
            b,
        }]
    );
    assert_eq!(
        violations[0].fmt(&plan.topo),
        "node-0:interface-1 and node-1:interface-2 both use 10.0.0.2 on link-0"
    );
}

#[test]
fn overlapping_subnets() {
    let mut plan = planned(&forced_spine());
    let l2 = link(&plan.topo, "link-2");
    let l3 = link(&plan.topo, "link-3");
    plan.addresses.subnets.insert(l3, net("10.0.2.0/30"));

    let violations = revalidate(&plan);
    assert!(violations.contains(&Violation::OverlappingSubnets { a: l2, b: l3 }));
    assert!(violations.contains(&Violation::AddressOutsideSubnet {
        iface: iface(&plan.topo, "switch2", "interface-9"),
        addr: ip("10.0.2.9"),
        subnet: net("10.0.2.0/30"),
    }));
}

#[test]
fn reserved_address() {
    let mut plan = planned(&forced_spine());
    let i = iface(&plan.topo, "switch1", "interface-0");
    plan.addresses.addrs.insert(i, net("10.0.0.0/24"));

    let violations = revalidate(&plan);
    assert!(violations.contains(&Violation::ReservedAddress {
        iface: i,
        addr: ip("10.0.0.0"),
    }));
    // the hosts on link-0 now point to an address nobody owns
    assert!(violations.contains(&Violation::UnreachableNextHop {
        node: node(&plan.topo, "node-0"),
        destination: net("10.0.1.0/24"),
        next_hop: ip("10.0.0.1"),
    }));
}

#[test]
fn missing_subnet_and_address() {
    let mut plan = planned(&forced_spine());
    let i = iface(&plan.topo, "node-4", "interface-5");
    plan.addresses.addrs.remove(&i);
    assert_eq!(revalidate(&plan), vec![Violation::MissingAddress(i)]);

    let mut plan = planned(&leaf_chain());
    let l2 = link(&plan.topo, "link-2");
    plan.addresses.subnets.remove(&l2);
    assert_eq!(revalidate(&plan), vec![Violation::MissingSubnet(l2)]);
}

#[test]
fn unreachable_next_hop() {
    let mut plan = planned(&leaf_chain());
    let n0 = node(&plan.topo, "node-0");
    let entry = plan.routes.tables.get_mut(&n0).unwrap().first_mut().unwrap();
    entry.next_hop = ip("10.0.1.2");
    let destination = entry.destination;

    assert_eq!(
        revalidate(&plan),
        vec![Violation::UnreachableNextHop {
            node: n0,
            destination,
            next_hop: ip("10.0.1.2"),
        }]
    );
}

#[test]
fn duplicate_route() {
    let mut plan = planned(&leaf_chain());
    let s1 = node(&plan.topo, "switch1");
    let table = plan.routes.tables.get_mut(&s1).unwrap();
    let first = table[0];
    table.push(first);

    assert_eq!(
        revalidate(&plan),
        vec![Violation::DuplicateRoute {
            node: s1,
            destination: first.destination,
        }]
    );
}

#[test]
fn missing_policy_entry() {
    let mut plan = planned(&leaf_chain());
    let s1 = node(&plan.topo, "switch1");
    let l4 = link(&plan.topo, "link-4");
    let mut policy = RoutePolicy::shortest_path(&plan.topo);
    policy.remove(s1, l4);
    plan.routes = synthesize_routes(&plan.topo, &plan.addresses, &policy).unwrap();

    let violations = revalidate(&plan);
    assert_eq!(violations, vec![Violation::MissingRoute { node: s1, link: l4 }]);
    assert_eq!(
        violations[0].fmt(&plan.topo),
        "switch1 has no route towards link-4"
    );
}

#[test]
fn unreachable_link_is_reported() {
    let mut input = leaf_chain();
    // without switch3 forwarding, nobody reaches link-4 except its own members
    input.topology.nodes[7].kind = NodeKind::Host;
    let plan = planned(&input);
    let l4 = link(&plan.topo, "link-4");
    assert!(plan
        .violations
        .contains(&Violation::MissingRoute {
            node: node(&plan.topo, "switch1"),
            link: l4,
        }));
    assert!(plan.violations.iter().all(|v| matches!(v, Violation::MissingRoute { .. })));
}

#[test]
fn withdrawn_next_hop_without_onlink() {
    let mut plan = planned(&forced_spine());
    let s3 = node(&plan.topo, "switch3");
    let entry = plan.routes.tables.get_mut(&s3).unwrap().last_mut().unwrap();
    entry.onlink = false;
    let destination = entry.destination;

    assert_eq!(
        revalidate(&plan),
        vec![Violation::WithdrawnNextHop {
            node: s3,
            destination,
            iface: iface(&plan.topo, "switch3", "interface-8"),
        }]
    );
}
