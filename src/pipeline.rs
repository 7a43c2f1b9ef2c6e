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

//! Runs all stages in sequence: topology, address plan, policy, synthesis and validation.

use std::collections::BTreeMap;

use ipnet::Ipv4Net;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    addressing::{plan_addresses, AddressPlan, SizingRules},
    policy::{OverrideSpec, PolicySpec, RoutePolicy},
    synthesis::{synthesize_routes, RouteTables},
    topology::{Topology, TopologySpec},
    types::{GraphError, PlanError, SynthesisError, Violation},
    validate::validate,
};

/// Complete input of a planning run, as read from a JSON file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanInput {
    /// Nodes and links
    #[serde(flatten)]
    pub topology: TopologySpec,
    /// Overrides layered on top of the shortest-path policy
    #[serde(default)]
    pub overrides: Vec<OverrideSpec>,
    /// Explicit prefix length of individual links
    #[serde(default)]
    pub link_prefix_len: BTreeMap<String, u8>,
}

impl PlanInput {
    /// Get the overrides as a [`PolicySpec`].
    pub fn policy_spec(&self) -> PolicySpec {
        PolicySpec {
            overrides: self.overrides.clone(),
        }
    }
}

/// Result of a successful planning run.
#[derive(Debug, Clone)]
pub struct Plan {
    /// The topology
    pub topo: Topology,
    /// Subnets and addresses
    pub addresses: AddressPlan,
    /// The shortest-path policy with all overrides merged on top
    pub policy: RoutePolicy,
    /// Static routes of every node
    pub routes: RouteTables,
    /// Everything the validator found. Empty if the plan is consistent.
    pub violations: Vec<Violation>,
}

/// Error of a planning run. Whatever stage fails, no partial plan is returned.
#[derive(Debug, Error)]
pub enum Error {
    /// The topology is invalid.
    #[error("Topology error: {0}")]
    Graph(#[from] GraphError),
    /// The addresses could not be allocated.
    #[error("Address plan error: {0}")]
    Plan(#[from] PlanError),
    /// The route tables could not be synthesized.
    #[error("Synthesis error: {0}")]
    Synthesis(#[from] SynthesisError),
}

/// Plan the entire network. The explicit prefix lengths of `input` are added to `rules`, and the
/// overrides of `input` are merged on top of the shortest-path policy.
pub fn plan(input: &PlanInput, pool: Ipv4Net, rules: &SizingRules) -> Result<Plan, Error> {
    let topo = Topology::from_spec(&input.topology)?;

    let mut rules = rules.clone();
    rules
        .link_prefix_len
        .extend(input.link_prefix_len.iter().map(|(k, v)| (k.clone(), *v)));
    let addresses = plan_addresses(&topo, pool, &rules)?;

    let mut policy = RoutePolicy::shortest_path(&topo);
    policy.merge(input.policy_spec().build(&topo)?);

    let routes = synthesize_routes(&topo, &addresses, &policy)?;
    let violations = validate(&topo, &addresses, &routes);

    Ok(Plan {
        topo,
        addresses,
        policy,
        routes,
        violations,
    })
}
