//! Device command implementation.

use std::path::Path;

use anyhow::Result;
use clap::ValueEnum;
use console::style;

use qmap_compile::ConnectivityGraph;

use super::common::write_json;

/// Built-in device topologies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Topology {
    /// Nodes in a line.
    Linear,
    /// Nodes in a cycle.
    Ring,
    /// Rows by columns lattice.
    Grid,
    /// Node 0 connected to every other node.
    Star,
    /// Every pair connected.
    Full,
}

/// Build the graph for a topology.
pub fn build(topology: Topology, size: u32, cols: Option<u32>) -> Result<ConnectivityGraph> {
    if size == 0 {
        anyhow::bail!("Device size must be at least 1");
    }
    if cols.is_some() && topology != Topology::Grid {
        anyhow::bail!("--cols only applies to grid topologies");
    }
    Ok(match topology {
        Topology::Linear => ConnectivityGraph::linear(size),
        Topology::Ring => ConnectivityGraph::ring(size),
        Topology::Grid => ConnectivityGraph::grid(size, cols.unwrap_or(size)),
        Topology::Star => ConnectivityGraph::star(size),
        Topology::Full => ConnectivityGraph::full(size),
    })
}

/// Execute the device command.
pub fn execute(topology: Topology, size: u32, cols: Option<u32>, output: Option<&Path>) -> Result<()> {
    let graph = build(topology, size, cols)?;
    write_json(&graph, output)?;

    if let Some(path) = output {
        println!(
            "{} Wrote {:?} device with {} nodes and {} edges to {}",
            style("✓").green().bold(),
            topology,
            graph.num_nodes(),
            graph.num_edges(),
            style(path.display()).green()
        );
    }
    Ok(())
}
