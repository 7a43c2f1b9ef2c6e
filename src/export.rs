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

//! This module provides export methods for turning a finished plan into something a provisioning
//! system understands. The main trait is [`PlanExporter`], which generates the configuration of a
//! single node. [`ShellExporter`] renders the plan as `ip` and `sysctl` commands, and
//! [`PlanReport`] is a serializable view of the entire plan with all identifiers replaced by
//! names.

use std::{collections::BTreeMap, fmt::Write};

use ipnet::Ipv4Net;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    addressing::AddressPlan,
    formatter::PlanFormatter,
    synthesis::RouteTables,
    topology::Topology,
    types::{IfaceId, NodeId, NodeKind, Violation},
};

/// A trait for generating the configuration of a single node.
pub trait PlanExporter {
    /// Generate the configuration of the node.
    fn generate_config(
        &mut self,
        topo: &Topology,
        plan: &AddressPlan,
        tables: &RouteTables,
        node: NodeId,
    ) -> Result<String, ExportError>;

    /// Generate the configuration of all nodes, keyed (and ordered) by the node name.
    fn generate_all(
        &mut self,
        topo: &Topology,
        plan: &AddressPlan,
        tables: &RouteTables,
    ) -> Result<BTreeMap<String, String>, ExportError> {
        topo.nodes()
            .map(|n| {
                Ok((
                    topo.node_name(n).to_string(),
                    self.generate_config(topo, plan, tables, n)?,
                ))
            })
            .collect()
    }
}

/// Renders the plan of a node as a sequence of shell commands:
///
/// 1. `ip addr add` for every addressed interface,
/// 2. `sysctl -w net.ipv4.ip_forward=1` on switches,
/// 3. `ip route del` for every connected route that is replaced,
/// 4. `ip route add` for every static route. Routes through an interface whose connected route
///    was removed name that interface and are installed `onlink`.
///
/// If `host_default_route` is set, the table of a host whose routes all point to the same
/// gateway is replaced by a single default route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellExporter {
    /// Prefix every command with `sudo`. The default value is `true`.
    pub sudo: bool,
    /// Collapse the routes of hosts with a single gateway into a default route. The default value
    /// is `true`.
    pub host_default_route: bool,
    /// Emit the `ip addr add` commands. Some provisioning systems configure the addresses
    /// themselves. The default value is `true`.
    pub assign_addresses: bool,
}

impl Default for ShellExporter {
    fn default() -> Self {
        Self {
            sudo: true,
            host_default_route: true,
            assign_addresses: true,
        }
    }
}

impl ShellExporter {
    /// Create a new exporter with default arguments.
    pub fn new() -> Self {
        Default::default()
    }

    fn cmd(&self, s: &mut String, cmd: impl std::fmt::Display) -> Result<(), ExportError> {
        if self.sudo {
            s.push_str("sudo ");
        }
        writeln!(s, "{cmd}")?;
        Ok(())
    }
}

impl PlanExporter for ShellExporter {
    fn generate_config(
        &mut self,
        topo: &Topology,
        plan: &AddressPlan,
        tables: &RouteTables,
        node: NodeId,
    ) -> Result<String, ExportError> {
        let n = topo.node(node).ok_or(ExportError::NodeNotFound(node))?;
        let iface_name = |i: IfaceId| {
            topo.iface(i)
                .map(|x| x.name())
                .ok_or(ExportError::InterfaceNotFound(i))
        };
        let table = tables.get(node);
        let mut s = String::new();

        if self.assign_addresses {
            for (iface, _, addr) in plan.list_ifaces(topo, node) {
                self.cmd(
                    &mut s,
                    format_args!("ip addr add {} dev {}", addr, iface_name(iface)?),
                )?;
            }
        }

        if n.kind().forwards() {
            self.cmd(&mut s, "sysctl -w net.ipv4.ip_forward=1")?;
        }

        let gateways = table.iter().map(|e| e.next_hop).unique().collect_vec();
        let collapse = self.host_default_route
            && n.kind() == NodeKind::Host
            && gateways.len() == 1
            && table.iter().all(|e| !e.delete_before_add);
        if collapse {
            self.cmd(&mut s, format_args!("ip route add default via {}", gateways[0]))?;
            return Ok(s);
        }

        for entry in table {
            if entry.delete_before_add {
                let withdraw = entry.withdraw.ok_or(ExportError::MissingWithdrawIface(
                    node,
                    entry.destination,
                ))?;
                self.cmd(
                    &mut s,
                    format_args!(
                        "ip route del {} dev {}",
                        entry.destination,
                        iface_name(withdraw)?
                    ),
                )?;
            }
            if entry.onlink {
                self.cmd(
                    &mut s,
                    format_args!(
                        "ip route add {} via {} dev {} onlink",
                        entry.destination,
                        entry.next_hop,
                        iface_name(entry.iface)?
                    ),
                )?;
            } else {
                self.cmd(
                    &mut s,
                    format_args!("ip route add {} via {}", entry.destination, entry.next_hop),
                )?;
            }
        }

        Ok(s)
    }
}

/// Error thrown by the exporter
#[derive(Debug, Error)]
pub enum ExportError {
    /// The node does not exist.
    #[error("Node {0:?} was not found in the topology")]
    NodeNotFound(NodeId),
    /// The interface does not exist.
    #[error("Interface {0:?} was not found in the topology")]
    InterfaceNotFound(IfaceId),
    /// A route replaces a connected route, but does not name the interface to withdraw it from.
    #[error("Route of {0:?} towards {1} must replace a connected route, but names no interface")]
    MissingWithdrawIface(NodeId, Ipv4Net),
    /// Formatting error
    #[error("Formatting error: {0}")]
    Fmt(#[from] std::fmt::Error),
}

/// Name-keyed view of the entire plan, used for JSON output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanReport {
    /// The pool from which all subnets were drawn
    pub pool: Ipv4Net,
    /// Subnet of each link
    pub subnets: BTreeMap<String, Ipv4Net>,
    /// Per node, the address of every interface (including the prefix length)
    pub addresses: BTreeMap<String, BTreeMap<String, Ipv4Net>>,
    /// Per node, the ordered list of static routes
    pub routes: BTreeMap<String, Vec<ReportRoute>>,
    /// All violations found by the validator, formatted by name.
    pub violations: Vec<String>,
}

/// A single route in the [`PlanReport`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRoute {
    /// Destination subnet
    pub destination: Ipv4Net,
    /// Next-hop address
    pub via: std::net::Ipv4Addr,
    /// Name of the next-hop node
    pub next_hop: String,
    /// Name of the outgoing interface
    pub dev: String,
    /// Name of the interface whose connected route must be removed first.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replaces_connected: Option<String>,
    /// The next-hop is installed as directly reachable on `dev`.
    #[serde(default)]
    pub onlink: bool,
}

impl PlanReport {
    /// Build the report.
    pub fn new(
        topo: &Topology,
        plan: &AddressPlan,
        tables: &RouteTables,
        violations: &[Violation],
    ) -> Self {
        let iface_name = |i: IfaceId| topo.iface(i).map(|x| x.name()).unwrap_or("?").to_string();
        Self {
            pool: plan.pool(),
            subnets: plan
                .subnets()
                .map(|(l, n)| (l.fmt(topo).to_string(), n))
                .collect(),
            addresses: topo
                .nodes()
                .map(|n| {
                    (
                        n.fmt(topo).to_string(),
                        plan.list_ifaces(topo, n)
                            .into_iter()
                            .map(|(i, _, a)| (iface_name(i), a))
                            .collect(),
                    )
                })
                .collect(),
            routes: tables
                .iter()
                .map(|(n, table)| {
                    (
                        n.fmt(topo).to_string(),
                        table
                            .iter()
                            .map(|e| ReportRoute {
                                destination: e.destination,
                                via: e.next_hop,
                                next_hop: e.next_hop_node.fmt(topo).to_string(),
                                dev: iface_name(e.iface),
                                replaces_connected: e.withdraw.map(iface_name),
                                onlink: e.onlink,
                            })
                            .collect(),
                    )
                })
                .collect(),
            violations: violations.iter().map(|v| v.fmt(topo)).collect(),
        }
    }
}
