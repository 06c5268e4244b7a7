use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Packages owned by this workspace; xtask itself is left out of lint and
/// test runs.
const PACKAGES: &[&str] = &[
    "scada-common",
    "scada-kernel",
    "scada-layout",
    "scada-tools",
    "scada-server",
    "scada-cli",
];

#[derive(Parser)]
#[command(name = "xtask", about = "Workspace automation for the SCADA backend")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// fmt, clippy, tests, then a smoke run
    Check,
    /// cargo fmt --check
    Fmt,
    /// clippy on the scada packages, warnings denied
    Clippy,
    /// Tests for the scada packages
    Test,
    /// Export the builtin layout, validate it, and simulate on it
    Smoke {
        /// Number of ticks to simulate
        #[arg(long, default_value = "3000")]
        ticks: u64,
        /// Where to write the exported layout
        #[arg(long, default_value = "target/xtask/layout.json")]
        layout: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check => {
            fmt()?;
            clippy()?;
            test()?;
            smoke(600, Path::new("target/xtask/layout.json"))?;
        }
        Commands::Fmt => fmt()?,
        Commands::Clippy => clippy()?,
        Commands::Test => test()?,
        Commands::Smoke { ticks, layout } => smoke(ticks, &layout)?,
    }

    Ok(())
}

fn with_packages<'a>(mut args: Vec<&'a str>) -> Vec<&'a str> {
    for &package in PACKAGES {
        args.extend(["-p", package]);
    }
    args
}

fn fmt() -> Result<()> {
    cargo("fmt", &["fmt", "--all", "--", "--check"])
}

fn clippy() -> Result<()> {
    let mut args = with_packages(vec!["clippy", "--all-targets"]);
    args.extend(["--", "-D", "warnings"]);
    cargo("clippy", &args)
}

fn test() -> Result<()> {
    cargo("test", &with_packages(vec!["test"]))
}

fn smoke(ticks: u64, layout: &Path) -> Result<()> {
    if let Some(dir) = layout.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating {}", dir.display()))?;
    }
    let layout = layout.to_string_lossy();
    let layout: &str = &layout;
    let ticks = ticks.to_string();
    let scada = ["run", "--quiet", "-p", "scada-cli", "--"];

    let mut export = scada.to_vec();
    export.extend(["export", layout]);
    cargo("export layout", &export)?;

    let mut validate = scada.to_vec();
    validate.extend(["validate", layout]);
    cargo("validate layout", &validate)?;

    let mut simulate = scada.to_vec();
    simulate.extend(["simulate", "--ticks", &ticks, "--layout", layout]);
    cargo("headless simulation", &simulate)
}

fn cargo(step: &str, args: &[&str]) -> Result<()> {
    println!("==> {step}: cargo {}", args.join(" "));
    let status = Command::new("cargo").args(args).status()?;
    if !status.success() {
        anyhow::bail!("{step} failed ({status})");
    }
    Ok(())
}
