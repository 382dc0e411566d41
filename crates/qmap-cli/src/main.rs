//! qmap command-line interface.
//!
//! Places and routes circuits onto device connectivity graphs:
//!
//! ```text
//! qmap device --topology grid --size 3 > grid.json
//! qmap route --device grid.json --circuit bell.json --output routed.json
//! ```

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use console::style;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::device::Topology;
use commands::route::RouteOptions;
use commands::{device, route, version};

/// qmap - place and route quantum circuits on constrained devices
#[derive(Parser)]
#[command(name = "qmap")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Place and route a circuit on a device
    Route {
        /// Device connectivity graph (JSON or YAML)
        #[arg(short, long)]
        device: PathBuf,

        /// Input circuit (JSON or YAML)
        #[arg(short, long)]
        circuit: PathBuf,

        /// Compiler configuration (YAML)
        #[arg(long, env = "QMAP_CONFIG")]
        config: Option<PathBuf>,

        /// Device characterization used to break placement ties (JSON or YAML)
        #[arg(long)]
        noise: Option<PathBuf>,

        /// Output file for the routed unit (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Allow BRIDGE gates for distance-two CX
        #[arg(long)]
        allow_bridge: bool,

        /// Rewrite inserted SWAPs as CX gates
        #[arg(long)]
        decompose_swaps: bool,

        /// Rewrite inserted BRIDGEs as CX gates
        #[arg(long)]
        decompose_bridges: bool,

        /// Fold trailing SWAPs into the final map
        #[arg(long)]
        elide_trailing_swaps: bool,
    },

    /// Generate a device connectivity graph
    Device {
        /// Topology of the device
        #[arg(short, long, value_enum)]
        topology: Topology,

        /// Number of nodes (rows for a grid)
        #[arg(short, long)]
        size: u32,

        /// Number of columns for a grid (defaults to --size)
        #[arg(long)]
        cols: Option<u32>,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show version information
    Version,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging; stdout is reserved for JSON output.
    let filter = match cli.verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Route {
            device,
            circuit,
            config,
            noise,
            output,
            allow_bridge,
            decompose_swaps,
            decompose_bridges,
            elide_trailing_swaps,
        } => route::execute(&RouteOptions {
            device,
            circuit,
            config,
            noise,
            output,
            allow_bridge,
            decompose_swaps,
            decompose_bridges,
            elide_trailing_swaps,
        }),

        Commands::Device {
            topology,
            size,
            cols,
            output,
        } => device::execute(topology, size, cols, output.as_deref()),

        Commands::Version => {
            version::execute();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }

    Ok(())
}
