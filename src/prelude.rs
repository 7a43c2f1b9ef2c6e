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

//! Convenience re-export of common members.

pub use crate::addressing::{AddressPlan, SizingRules};
pub use crate::export::{PlanExporter, PlanReport, ShellExporter};
pub use crate::formatter::PlanFormatter;
pub use crate::pipeline::{Plan, PlanInput};
pub use crate::policy::{PolicySpec, RoutePolicy};
pub use crate::synthesis::{RouteTableEntry, RouteTables};
pub use crate::topology::{Topology, TopologySpec};
pub use crate::types::{
    GraphError, IfaceId, LinkId, NodeId, NodeKind, PlanError, SynthesisError, Violation,
};
