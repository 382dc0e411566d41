//! Route command implementation.

use std::path::PathBuf;

use anyhow::{Context, Result};
use console::style;
use serde::Serialize;
use tracing::debug;

use qmap_compile::{
    CompilationUnit, CompilerConfig, ConnectivityGraph, DeviceCharacterization,
    PassManagerBuilder, PlacementState, QubitMapping,
};
use qmap_ir::{Circuit, StandardGate};

use super::common::{load, write_json};

/// Arguments of the route command.
#[derive(Debug, Clone, Default)]
pub struct RouteOptions {
    pub device: PathBuf,
    pub circuit: PathBuf,
    pub config: Option<PathBuf>,
    pub noise: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub allow_bridge: bool,
    pub decompose_swaps: bool,
    pub decompose_bridges: bool,
    pub elide_trailing_swaps: bool,
}

/// What the route command writes.
#[derive(Debug, Serialize)]
pub struct RouteOutput<'a> {
    pub circuit: &'a Circuit,
    pub initial_map: &'a QubitMapping,
    pub final_map: &'a QubitMapping,
    pub state: PlacementState,
}

/// Build the compiler configuration from the config file, the environment
/// and the command-line flags, in increasing precedence.
pub fn load_config(options: &RouteOptions) -> Result<CompilerConfig> {
    let mut config = match &options.config {
        Some(path) => CompilerConfig::from_file(path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => CompilerConfig::default(),
    }
    .apply_env();

    if let Some(path) = &options.noise {
        let noise: DeviceCharacterization = load(path, "device characterization")?;
        config.placement.characterization = Some(noise);
    }
    if options.allow_bridge {
        config.routing.allow_bridge = true;
    }
    config.validate()?;
    Ok(config)
}

/// Execute the route command.
pub fn execute(options: &RouteOptions) -> Result<()> {
    let device: ConnectivityGraph = load(&options.device, "device")?;
    let circuit: Circuit = load(&options.circuit, "circuit")?;
    let config = load_config(options)?;
    debug!("Configuration: {:?}", config);

    eprintln!(
        "{} Routing {} ({} qubits, {} ops) on {} nodes",
        style("→").cyan().bold(),
        style(circuit.name()).green(),
        circuit.num_qubits(),
        circuit.num_ops(),
        style(device.num_nodes()).yellow()
    );
    if !device.is_connected() {
        eprintln!(
            "  {} device graph is not connected",
            style("warning:").yellow().bold()
        );
    }

    let pm = PassManagerBuilder::new(&device)
        .with_config(config)
        .decompose_swaps(options.decompose_swaps)
        .decompose_bridges(options.decompose_bridges)
        .elide_trailing_swaps(options.elide_trailing_swaps)
        .build()?;
    eprintln!("  Running {} passes", pm.len());

    let input_ops = circuit.num_ops();
    let mut unit = CompilationUnit::new(circuit);
    pm.run(&mut unit).context("Routing failed")?;

    let routed = unit.circuit();
    let swaps = routed
        .operations()
        .iter()
        .filter(|op| op.is_standard(&StandardGate::Swap))
        .count();
    eprintln!("{} Routing complete", style("✓").green().bold());
    eprintln!(
        "  Result: {} -> {} ops, {} swaps, depth {}",
        input_ops,
        routed.num_ops(),
        swaps,
        routed.depth()
    );
    eprintln!("  Initial map: {}", unit.initial_map());
    eprintln!("  Final map:   {}", unit.final_map());

    let output = RouteOutput {
        circuit: routed,
        initial_map: unit.initial_map(),
        final_map: unit.final_map(),
        state: unit.state(),
    };
    write_json(&output, options.output.as_deref())?;

    if let Some(path) = &options.output {
        eprintln!("  Output: {}", style(path.display()).green());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let options = RouteOptions {
            allow_bridge: true,
            ..RouteOptions::default()
        };
        let config = load_config(&options).unwrap();
        assert!(config.routing.allow_bridge);
        assert!(config.placement.characterization.is_none());
    }

    #[test]
    fn test_missing_config_file() {
        let options = RouteOptions {
            config: Some(PathBuf::from("/nonexistent/qmap.yaml")),
            ..RouteOptions::default()
        };
        assert!(load_config(&options).is_err());
    }
}
