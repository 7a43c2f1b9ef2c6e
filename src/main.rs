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

use std::{fs::File, io::BufReader, path::PathBuf};

use clap::{Parser, ValueEnum};
use ipnet::Ipv4Net;
use log::*;

use staticplan::{builder, plan, prelude::*};

/// Compute the address plan and the static routes of a lab topology.
#[derive(Debug, Parser)]
struct Cli {
    /// Topology to plan, as a JSON file.
    #[clap(required_unless_present = "example")]
    input: Option<PathBuf>,
    /// Plan one of the built-in topologies instead of reading a file.
    #[clap(long = "example", short = 'e', conflicts_with = "input")]
    example: Option<Example>,
    /// Number of leaves of the `two-tier` example.
    #[clap(long = "leaves", default_value_t = 4)]
    leaves: usize,
    /// Number of hosts behind each leaf of the `two-tier` example.
    #[clap(long = "hosts-per-leaf", default_value_t = 3)]
    hosts_per_leaf: usize,
    /// Pool from which all subnets are allocated.
    #[clap(long = "pool", short = 'p', default_value = "10.0.0.0/16")]
    pool: Ipv4Net,
    /// Prefix length of links with more than two endpoints.
    #[clap(long = "shared-prefix-len", default_value_t = 24)]
    shared_prefix_len: u8,
    /// Size links with more than two endpoints like point-to-point links.
    #[clap(long = "no-shared-prefix", conflicts_with = "shared_prefix_len")]
    no_shared_prefix: bool,
    /// Upper bound of the prefix length chosen for point-to-point links.
    #[clap(long = "max-prefix-len", default_value_t = 30)]
    max_prefix_len: u8,
    /// Output format.
    #[clap(long = "format", short = 'f', default_value = "text")]
    format: Format,
    /// Do not prefix the shell commands with `sudo`.
    #[clap(long = "no-sudo")]
    no_sudo: bool,
    /// Exit with an error if the plan has any violations.
    #[clap(long = "strict")]
    strict: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    /// Human-readable summary
    Text,
    /// The plan report as JSON
    Json,
    /// Shell commands for every node
    Shell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Example {
    /// Spine forced through switch2 towards node-2
    ForcedSpine,
    /// Chain of three switches
    LeafChain,
    /// Leaf/spine network, sized by `--leaves` and `--hosts-per-leaf`
    TwoTier,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init_timed();

    let args = Cli::parse();

    let input = match (args.example, args.input.as_ref()) {
        (Some(Example::ForcedSpine), _) => builder::forced_spine(),
        (Some(Example::LeafChain), _) => builder::leaf_chain(),
        (Some(Example::TwoTier), _) => builder::two_tier(args.leaves, args.hosts_per_leaf),
        (None, Some(path)) => {
            info!("Reading the topology from {}", path.to_string_lossy());
            serde_json::from_reader(BufReader::new(File::open(path)?))?
        }
        (None, None) => return Err("Either an input file or an example is required".into()),
    };

    let mut rules = SizingRules::new();
    rules
        .shared_prefix_len((!args.no_shared_prefix).then_some(args.shared_prefix_len))
        .max_prefix_len(args.max_prefix_len);

    let plan = plan(&input, args.pool, &rules)?;
    info!(
        "Planned {} links and {} routes",
        plan.topo.num_links(),
        plan.routes.num_entries()
    );

    match args.format {
        Format::Text => print_text(&plan),
        Format::Json => {
            let report =
                PlanReport::new(&plan.topo, &plan.addresses, &plan.routes, &plan.violations);
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Format::Shell => {
            let mut exporter = ShellExporter::new();
            exporter.sudo = !args.no_sudo;
            for n in plan.topo.nodes() {
                let cfg = exporter.generate_config(&plan.topo, &plan.addresses, &plan.routes, n)?;
                println!("# {}\n{}", n.fmt(&plan.topo), cfg);
            }
        }
    }

    for v in plan.violations.iter() {
        warn!("{}", v.fmt(&plan.topo));
    }
    if args.strict && !plan.violations.is_empty() {
        return Err(format!("The plan has {} violations", plan.violations.len()).into());
    }

    Ok(())
}

fn print_text(plan: &Plan) {
    let topo = &plan.topo;
    println!("Subnets:");
    for (link, net) in plan.addresses.subnets() {
        println!("    {}: {}", link.fmt(topo), net);
    }
    println!("\nAddresses:");
    for n in topo.nodes() {
        for (iface, _, addr) in plan.addresses.list_ifaces(topo, n) {
            println!("    {}: {}", iface.fmt(topo), addr);
        }
    }
    println!("\nRoutes:\n{}", plan.routes.fmt(topo));
    if !plan.violations.is_empty() {
        println!("\nViolations:");
        for v in plan.violations.iter() {
            println!("    {}", v.fmt(topo));
        }
    }
}
