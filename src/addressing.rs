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

//! This module contains the address planner. It allocates one subnet per link from an address
//! pool, and one address per endpoint on that link.

use std::{collections::BTreeMap, net::Ipv4Addr};

use ipnet::Ipv4Net;
use log::*;
use serde::{Deserialize, Serialize};

use crate::{
    topology::Topology,
    types::{IfaceId, LinkId, NodeId, PlanError},
};

/// Number of addresses in each subnet that cannot be assigned to an interface (network and
/// broadcast address).
pub const RESERVED_ADDRESSES: usize = 2;

/// Rules to choose the size of the subnet of each link. The following are the default values:
///
/// - `shared_prefix_len`: `Some(24)`
/// - `max_prefix_len`: 30
/// - `link_prefix_len`: empty
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizingRules {
    /// Prefix length of links with more than two endpoints (shared LAN segments). Such a segment
    /// gets room to grow. If set to `None`, or if the prefix cannot hold all endpoints, the link
    /// is sized like a point-to-point link.
    pub shared_prefix_len: Option<u8>,
    /// All other links get the tightest power-of-two block that fits all endpoints plus the
    /// network and broadcast address. This is the upper bound of the resulting prefix length. The
    /// default value is `30`.
    pub max_prefix_len: u8,
    /// Explicit prefix length for individual links, referenced by name. Takes precedence over
    /// all other rules.
    #[serde(default)]
    pub link_prefix_len: BTreeMap<String, u8>,
}

impl Default for SizingRules {
    fn default() -> Self {
        Self {
            shared_prefix_len: Some(24),
            max_prefix_len: 30,
            link_prefix_len: BTreeMap::new(),
        }
    }
}

impl SizingRules {
    /// Create the default sizing rules
    pub fn new() -> Self {
        Default::default()
    }

    /// Prefix length of links with more than two endpoints. The default value is `Some(24)`.
    pub fn shared_prefix_len(&mut self, x: Option<u8>) -> &mut Self {
        self.shared_prefix_len = x;
        self
    }

    /// Upper bound of the prefix length for tightly sized links. The default value is `30`.
    pub fn max_prefix_len(&mut self, x: u8) -> &mut Self {
        self.max_prefix_len = x;
        self
    }

    /// Set an explicit prefix length for the link with the given name.
    pub fn link_prefix_len(&mut self, link: impl Into<String>, x: u8) -> &mut Self {
        self.link_prefix_len.insert(link.into(), x);
        self
    }

    /// Compute the prefix length for a link with `endpoints` members.
    fn prefix_len(&self, name: &str, link: LinkId, endpoints: usize) -> Result<u8, PlanError> {
        let needed = endpoints + RESERVED_ADDRESSES;
        if let Some(len) = self.link_prefix_len.get(name).copied() {
            if len > 32 {
                return Err(PlanError::InvalidNetmask(ipnet::PrefixLenError));
            }
            return if capacity(len) >= needed as u64 {
                Ok(len)
            } else {
                Err(PlanError::SubnetTooSmall {
                    link,
                    prefix_len: len,
                    endpoints,
                })
            };
        }
        if let Some(len) = self.shared_prefix_len {
            if endpoints > 2 && len <= 32 && capacity(len) >= needed as u64 {
                return Ok(len);
            }
        }
        let host_bits = (needed as u64).next_power_of_two().trailing_zeros();
        let tight = 32u32.saturating_sub(host_bits) as u8;
        Ok(tight.min(self.max_prefix_len))
    }
}

/// Number of addresses in a block of the given prefix length.
fn capacity(prefix_len: u8) -> u64 {
    1u64 << (32 - prefix_len as u32)
}

/// Plan the addresses of the entire topology. Links are processed in the order they were added,
/// and subnets are drawn from `pool` in increasing order without reuse. Calling this function
/// twice on the same input yields identical plans.
pub fn plan_addresses(
    topo: &Topology,
    pool: Ipv4Net,
    rules: &SizingRules,
) -> Result<AddressPlan, PlanError> {
    AddressPlan::new(topo, pool, rules)
}

/// Subnets of all links and addresses of all bound interfaces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressPlan {
    /// The pool from which all subnets are drawn
    pub(crate) pool: Ipv4Net,
    /// Subnet of each link
    pub(crate) subnets: BTreeMap<LinkId, Ipv4Net>,
    /// Address of each interface, including the prefix length of its subnet.
    pub(crate) addrs: BTreeMap<IfaceId, Ipv4Net>,
}

impl AddressPlan {
    /// Allocate all subnets and addresses. Use [`plan_addresses`] as a shorthand.
    pub fn new(topo: &Topology, pool: Ipv4Net, rules: &SizingRules) -> Result<Self, PlanError> {
        for name in rules.link_prefix_len.keys() {
            topo.get_link_id(name)
                .map_err(|_| PlanError::UnknownLink(name.clone()))?;
        }

        let pool = pool.trunc();
        let pool_end = u32::from(pool.broadcast()) as u64 + 1;
        let mut cursor = u32::from(pool.network()) as u64;
        let mut subnets = BTreeMap::new();
        let mut addrs = BTreeMap::new();

        for (link_id, link) in topo.links().filter_map(|l| Some((l, topo.link(l)?))) {
            let prefix_len = rules.prefix_len(link.name(), link_id, link.endpoints().len())?;
            let size = capacity(prefix_len);
            let start = cursor.div_ceil(size) * size;
            if prefix_len < pool.prefix_len() || start + size > pool_end {
                return Err(PlanError::PoolExhausted {
                    pool,
                    link: link_id,
                    prefix_len,
                });
            }
            let net = Ipv4Net::new(Ipv4Addr::from(start as u32), prefix_len)?;
            cursor = start + size;

            for ((_, iface), addr) in link.endpoints().iter().zip(net.hosts()) {
                addrs.insert(*iface, Ipv4Net::new(addr, prefix_len)?);
            }
            debug!(
                "Allocated {} for {} ({} endpoints)",
                net,
                link.name(),
                link.endpoints().len()
            );
            subnets.insert(link_id, net);
        }

        info!(
            "Planned {} subnets and {} addresses from {}",
            subnets.len(),
            addrs.len(),
            pool
        );

        Ok(Self {
            pool,
            subnets,
            addrs,
        })
    }

    /// The pool from which all subnets were drawn.
    pub fn pool(&self) -> Ipv4Net {
        self.pool
    }

    /// Get the subnet of a link.
    pub fn subnet(&self, link: LinkId) -> Option<Ipv4Net> {
        self.subnets.get(&link).copied()
    }

    /// Iterate over all links and their subnet, ordered by the link id.
    pub fn subnets(&self) -> impl Iterator<Item = (LinkId, Ipv4Net)> + '_ {
        self.subnets.iter().map(|(l, n)| (*l, *n))
    }

    /// Get the address of an interface.
    pub fn address(&self, iface: IfaceId) -> Option<Ipv4Addr> {
        self.addrs.get(&iface).map(|a| a.addr())
    }

    /// Get the address of an interface, including the prefix length of its subnet.
    pub fn address_full(&self, iface: IfaceId) -> Option<Ipv4Net> {
        self.addrs.get(&iface).copied()
    }

    /// Iterate over all interfaces and their address, ordered by the interface id.
    pub fn addresses(&self) -> impl Iterator<Item = (IfaceId, Ipv4Net)> + '_ {
        self.addrs.iter().map(|(i, a)| (*i, *a))
    }

    /// Lookup an IP address, and return the interface to which it is assigned.
    pub fn find_address(&self, addr: Ipv4Addr) -> Option<IfaceId> {
        self.addrs
            .iter()
            .find(|(_, a)| a.addr() == addr)
            .map(|(i, _)| *i)
    }

    /// Lookup an IP address, and return the link whose subnet contains it.
    pub fn find_link(&self, addr: Ipv4Addr) -> Option<LinkId> {
        self.subnets
            .iter()
            .find(|(_, n)| n.contains(&addr))
            .map(|(l, _)| *l)
    }

    /// Get a list of all addressed interfaces of a single node. Each entry contains the
    /// interface, the link it is bound to, and its address (including the prefix length). The
    /// list is ordered by the interface id.
    pub fn list_ifaces(&self, topo: &Topology, node: NodeId) -> Vec<(IfaceId, LinkId, Ipv4Net)> {
        topo.node(node)
            .into_iter()
            .flat_map(|n| n.ifaces().iter())
            .filter_map(|i| Some((*i, topo.iface(*i)?.link()?, *self.addrs.get(i)?)))
            .collect()
    }
}
