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

use std::net::Ipv4Addr;

use ipnet::Ipv4Net;

use crate::{
    addressing::SizingRules,
    pipeline::{plan, Plan, PlanInput},
    topology::Topology,
    types::{IfaceId, LinkId, NodeId},
};

/// Plan the input with the default pool `10.0.0.0/16` and the default sizing rules.
fn planned(input: &PlanInput) -> Plan {
    plan(input, net("10.0.0.0/16"), &SizingRules::default()).unwrap()
}

fn ip(s: &str) -> Ipv4Addr {
    s.parse().unwrap()
}

fn net(s: &str) -> Ipv4Net {
    s.parse().unwrap()
}

fn node(t: &Topology, name: &str) -> NodeId {
    t.get_node_id(name).unwrap()
}

fn link(t: &Topology, name: &str) -> LinkId {
    t.get_link_id(name).unwrap()
}

fn iface(t: &Topology, node: &str, name: &str) -> IfaceId {
    t.get_iface_id(t.get_node_id(node).unwrap(), name).unwrap()
}

mod test_policy;
mod test_validate;
