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

//! Consistency checks of a complete plan. The validator never raises an error and never repairs
//! anything. It only reports every [`Violation`] it finds, and the caller decides what is fatal.

use std::collections::HashSet;

use itertools::Itertools;
use log::*;

use crate::{
    addressing::AddressPlan,
    synthesis::RouteTables,
    topology::Topology,
    types::Violation,
};

/// Check the address plan and the route tables for internal consistency. Returns an empty vector
/// if the plan is consistent. The checks are:
///
/// - every link has a subnet, and every endpoint has an address within that subnet, which is
///   neither its network nor its broadcast address,
/// - no two endpoints on a link share an address,
/// - no two subnets overlap,
/// - the next-hop of every route is the address of an interface on a link shared with the node,
/// - no node has two routes for the same destination,
/// - every node has a route towards each link it is not attached to,
/// - routes leaving through an interface whose connected route is withdrawn are `onlink`.
pub fn validate(topo: &Topology, plan: &AddressPlan, tables: &RouteTables) -> Vec<Violation> {
    let mut violations = Vec::new();
    check_addresses(topo, plan, &mut violations);
    check_subnets(plan, &mut violations);
    check_routes(topo, plan, tables, &mut violations);
    check_coverage(topo, tables, &mut violations);

    if violations.is_empty() {
        debug!("Plan is consistent");
    } else {
        warn!("Plan has {} violations", violations.len());
    }
    violations
}

fn check_addresses(topo: &Topology, plan: &AddressPlan, violations: &mut Vec<Violation>) {
    for (link_id, link) in topo.links().filter_map(|l| Some((l, topo.link(l)?))) {
        let subnet = plan.subnet(link_id);
        if subnet.is_none() {
            violations.push(Violation::MissingSubnet(link_id));
        }

        let mut addrs = Vec::new();
        for (_, iface) in link.endpoints() {
            let addr = match plan.address(*iface) {
                Some(addr) => addr,
                None => {
                    violations.push(Violation::MissingAddress(*iface));
                    continue;
                }
            };
            if let Some(subnet) = subnet {
                if !subnet.contains(&addr) {
                    violations.push(Violation::AddressOutsideSubnet {
                        iface: *iface,
                        addr,
                        subnet,
                    });
                } else if subnet.prefix_len() < 31
                    && (addr == subnet.network() || addr == subnet.broadcast())
                {
                    violations.push(Violation::ReservedAddress { iface: *iface, addr });
                }
            }
            addrs.push((*iface, addr));
        }

        for ((a, addr_a), (b, addr_b)) in addrs.iter().tuple_combinations() {
            if addr_a == addr_b {
                violations.push(Violation::DuplicateAddress {
                    link: link_id,
                    addr: *addr_a,
                    a: *a,
                    b: *b,
                });
            }
        }
    }
}

fn check_subnets(plan: &AddressPlan, violations: &mut Vec<Violation>) {
    let subnets = plan.subnets().collect_vec();
    for ((a, net_a), (b, net_b)) in subnets.iter().tuple_combinations() {
        if net_a.contains(net_b) || net_b.contains(net_a) {
            violations.push(Violation::OverlappingSubnets { a: *a, b: *b });
        }
    }
}

fn check_routes(
    topo: &Topology,
    plan: &AddressPlan,
    tables: &RouteTables,
    violations: &mut Vec<Violation>,
) {
    for (node, table) in tables.iter() {
        // addresses of all other members on links shared with this node.
        let reachable: HashSet<_> = topo
            .links_of(node)
            .into_iter()
            .filter_map(|l| topo.link(l))
            .flat_map(|l| l.endpoints().iter())
            .filter(|(n, _)| *n != node)
            .filter_map(|(_, i)| plan.address(*i))
            .collect();

        let withdrawn: HashSet<_> = table.iter().filter_map(|e| e.withdraw).collect();

        let mut seen = HashSet::new();
        for entry in table {
            if withdrawn.contains(&entry.iface) && !entry.onlink {
                violations.push(Violation::WithdrawnNextHop {
                    node,
                    destination: entry.destination,
                    iface: entry.iface,
                });
            }
            if !reachable.contains(&entry.next_hop) {
                violations.push(Violation::UnreachableNextHop {
                    node,
                    destination: entry.destination,
                    next_hop: entry.next_hop,
                });
            }
            if !seen.insert(entry.destination) {
                violations.push(Violation::DuplicateRoute {
                    node,
                    destination: entry.destination,
                });
            }
        }
    }
}

fn check_coverage(topo: &Topology, tables: &RouteTables, violations: &mut Vec<Violation>) {
    for node in topo.nodes() {
        let attached = topo.links_of(node);
        let table = tables.get(node);
        for link in topo.links().filter(|l| !attached.contains(l)) {
            if !table.iter().any(|e| e.link == link) {
                violations.push(Violation::MissingRoute { node, link });
            }
        }
    }
}
