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

//! # StaticPlan: Address and static route planning for lab topologies
//!
//! StaticPlan takes a declarative description of a small lab network (hosts, switches, their
//! interfaces, and the shared layer-2 links joining them) and computes everything needed to bring
//! up IPv4 forwarding on it without any routing protocol:
//!
//! - a subnet for every link and an address for every interface, drawn from a single pool,
//! - a next-hop policy for every pair of node and destination link, computed by shortest paths
//!   over the switches and refined by explicit overrides,
//! - the static route table of every node, and
//! - a list of all consistency violations of the resulting plan.
//!
//! ## Structure
//! - The module [`topology`] defines the [`Topology`] graph of nodes, interfaces and links.
//! - The module [`addressing`] allocates subnets and addresses ([`plan_addresses`]).
//! - The module [`policy`] decides the next hop of every node towards every link
//!   ([`compute_policy`]), including overrides that replace connected routes.
//! - The module [`synthesis`] turns the policy and the addresses into route tables
//!   ([`synthesize_routes`]).
//! - The module [`validate`](mod@validate) checks the plan for inconsistencies.
//! - The module [`export`] renders a finished plan as shell commands or as a serializable report.
//! - The module [`builder`] contains ready-made topologies.
//!
//! The function [`plan()`] runs all stages in sequence.
//!
//! ```
//! use staticplan::prelude::*;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let input = staticplan::builder::leaf_chain();
//! let plan = staticplan::plan(&input, "10.0.0.0/16".parse()?, &SizingRules::default())?;
//! assert!(plan.violations.is_empty());
//!
//! let switch1 = plan.topo.get_node_id("switch1")?;
//! assert_eq!(plan.routes.get(switch1).len(), 3);
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs, missing_debug_implementations, rust_2018_idioms)]

pub mod addressing;
pub mod builder;
pub mod export;
pub mod formatter;
pub mod pipeline;
pub mod policy;
pub mod prelude;
pub mod synthesis;
#[cfg(test)]
mod test;
pub mod topology;
pub mod types;
pub mod validate;

pub use addressing::plan_addresses;
pub use pipeline::{plan, Error, Plan, PlanInput};
pub use policy::compute_policy;
pub use synthesis::synthesize_routes;
pub use topology::Topology;
pub use validate::validate;
