use anyhow::Context;
use clap::{Parser, Subcommand};
use scada_kernel::SimParams;
use scada_layout::Layout;
use scada_server::ServerConfig;
use scada_tools::PlantInspector;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "scada", about = "Factory-floor SCADA backend")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and default settings
    Info,
    /// Run the simulation and serve the HTTP API
    Serve {
        /// YAML config file
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Listen address, overrides config and SCADA_ADDR
        #[arg(long)]
        addr: Option<SocketAddr>,
        /// Layout JSON file
        #[arg(short, long)]
        layout: Option<PathBuf>,
        /// Fixed RNG seed
        #[arg(short, long)]
        seed: Option<u64>,
        /// Tick interval in milliseconds
        #[arg(long)]
        tick_ms: Option<u64>,
    },
    /// Run a headless simulation and print the outcome
    Simulate {
        /// Number of ticks to simulate
        #[arg(short, long, default_value = "600")]
        ticks: u64,
        /// RNG seed
        #[arg(short, long, default_value = "42")]
        seed: u64,
        /// Layout JSON file; the built-in floor when absent
        #[arg(short, long)]
        layout: Option<PathBuf>,
    },
    /// Check a layout file and print its fingerprint
    Validate {
        /// Layout JSON file
        path: PathBuf,
    },
    /// Write the built-in layout as JSON, a starting point for custom floors
    Export {
        /// Output file
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .init();

    match cli.command {
        Commands::Info => {
            let config = ServerConfig::default();
            let layout = Layout::builtin();
            println!("scada v{}", env!("CARGO_PKG_VERSION"));
            println!(
                "defaults: addr={} tick={}ms speed={}",
                config.addr, config.tick_interval_ms, config.speed
            );
            println!(
                "builtin layout: locations={} vehicles={} fingerprint={}",
                layout.locations().len(),
                layout.vehicles().len(),
                layout.fingerprint()?
            );
        }
        Commands::Serve {
            config,
            addr,
            layout,
            seed,
            tick_ms,
        } => {
            let mut settings = match &config {
                Some(path) => ServerConfig::load(path)
                    .with_context(|| format!("loading config {}", path.display()))?,
                None => ServerConfig::default(),
            };
            settings.apply_env()?;
            if let Some(addr) = addr {
                settings.addr = addr;
            }
            if layout.is_some() {
                settings.layout = layout;
            }
            if seed.is_some() {
                settings.seed = seed;
            }
            if let Some(ms) = tick_ms {
                settings.tick_interval_ms = ms;
            }
            tracing::info!(addr = %settings.addr, seed = ?settings.seed, "starting server");
            scada_server::serve(settings).await?;
        }
        Commands::Simulate {
            ticks,
            seed,
            layout,
        } => {
            let layout = match &layout {
                Some(path) => Layout::load(path)
                    .with_context(|| format!("loading layout {}", path.display()))?,
                None => Layout::builtin(),
            };
            tracing::info!(seed, ticks, "headless simulation");

            let mut plant = layout.build_plant(SimParams::default(), seed)?;
            let mut arrivals = 0;
            let mut toggles = 0;
            for _ in 0..ticks {
                let report = plant.step();
                arrivals += report.arrivals;
                toggles += report.occupancy_toggles;
            }

            println!("{}", PlantInspector::summary(&plant));
            println!("arrivals={arrivals} occupancy_toggles={toggles}");
            for vehicle in layout.vehicles() {
                if let Some(info) = PlantInspector::inspect_vehicle(&plant, &vehicle.id) {
                    println!("  {info}");
                }
            }
            println!("state hash: {:#018x}", plant.state_hash());
        }
        Commands::Validate { path } => {
            let layout = Layout::load(&path)
                .with_context(|| format!("validating {}", path.display()))?;
            println!(
                "{}: OK (locations={}, vehicles={}, routes={})",
                path.display(),
                layout.locations().len(),
                layout.vehicles().len(),
                layout.effective_routes().len()
            );
            println!("fingerprint: {}", layout.fingerprint()?);
        }
        Commands::Export { path } => {
            let layout = Layout::builtin();
            layout
                .save(&path)
                .with_context(|| format!("writing {}", path.display()))?;
            tracing::info!(path = %path.display(), "builtin layout exported");
            println!("{}: fingerprint {}", path.display(), layout.fingerprint()?);
        }
    }

    Ok(())
}
