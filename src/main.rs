//! Shade Lane CLI
//!
//! Entry point for the `shade` command-line tool.

use clap::{Parser, Subcommand};
use std::fs::File;
use std::path::PathBuf;
use std::process;

use shade_lane::{CacheLayout, Lane, LaneConfig};

#[derive(Parser)]
#[command(name = "shade")]
#[command(about = "Runtime dependency shading lane", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve, verify, and relocate every dependency in a manifest
    Process {
        /// Path to the load manifest (JSON)
        #[arg(long, short = 'm')]
        manifest: PathBuf,

        /// Base cache directory (default: .shade)
        #[arg(long)]
        base_dir: Option<PathBuf>,

        /// Secrets file, layered in order; may be given more than once
        #[arg(long = "secrets")]
        secrets: Vec<PathBuf>,

        /// Reuse existing relocated output instead of rebuilding it
        #[arg(long)]
        reuse_relocated: bool,

        /// Path to lane config file (default: .shade/lane.toml)
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,
    },

    /// Resolve and verify dependencies without relocating them
    Resolve {
        /// Path to the load manifest (JSON)
        #[arg(long, short = 'm')]
        manifest: PathBuf,

        /// Base cache directory (default: .shade)
        #[arg(long)]
        base_dir: Option<PathBuf>,

        /// Secrets file, layered in order; may be given more than once
        #[arg(long = "secrets")]
        secrets: Vec<PathBuf>,

        /// Path to lane config file (default: .shade/lane.toml)
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,
    },

    /// Prefetch a tool artifact from the public repository
    Tool {
        /// Tool group, in dotted notation
        #[arg(long)]
        group: String,

        /// Tool artifact name
        #[arg(long)]
        artifact: String,

        /// Tool version (default: configured override, environment, or built-in)
        #[arg(long)]
        version: Option<String>,

        /// Base cache directory (default: .shade)
        #[arg(long)]
        base_dir: Option<PathBuf>,

        /// Path to lane config file (default: .shade/lane.toml)
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,
    },

    /// Cache maintenance commands
    Cache {
        #[command(subcommand)]
        action: CacheCommands,
    },
}

#[derive(Subcommand)]
enum CacheCommands {
    /// Report file counts and sizes per cache namespace
    Stats {
        /// Base cache directory (default: .shade)
        #[arg(long)]
        base_dir: Option<PathBuf>,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Remove relocated output so the next run rebuilds it
    Clear {
        /// Base cache directory (default: .shade)
        #[arg(long)]
        base_dir: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        eprintln!("error: {err}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Process {
            manifest,
            base_dir,
            secrets,
            reuse_relocated,
            config,
        } => {
            let mut lane_config = load_config(config.as_deref(), base_dir)?;
            lane_config.secrets_files.extend(secrets);
            if reuse_relocated {
                lane_config.reuse_relocated = true;
            }

            let lane = Lane::create(lane_config)?;
            let file = File::open(&manifest)?;
            eprintln!("Processing manifest {}...", manifest.display());
            let report = lane.process(file, |path| println!("{}", path.display()))?;
            eprintln!(
                "Relocated {} archive(s) ({} reused, {} unit(s) rewritten)",
                report.relocated.len(),
                report.reused,
                report.units_rewritten,
            );
            Ok(())
        }

        Commands::Resolve {
            manifest,
            base_dir,
            secrets,
            config,
        } => {
            let mut lane_config = load_config(config.as_deref(), base_dir)?;
            lane_config.secrets_files.extend(secrets);

            let lane = Lane::create(lane_config)?;
            let file = File::open(&manifest)?;
            eprintln!("Resolving manifest {}...", manifest.display());
            let resolved = lane.resolve(file)?;
            for path in &resolved {
                println!("{}", path.display());
            }
            eprintln!("Resolved {} dependenc(ies)", resolved.len());
            Ok(())
        }

        Commands::Tool {
            group,
            artifact,
            version,
            base_dir,
            config,
        } => {
            let lane_config = load_config(config.as_deref(), base_dir)?;
            let lane = Lane::create(lane_config)?;
            let path = lane.download_tool(&group, &artifact, version.as_deref())?;
            println!("{}", path.display());
            Ok(())
        }

        Commands::Cache { action } => match action {
            CacheCommands::Stats { base_dir, json } => {
                let config = load_config(None, base_dir)?;
                let layout = CacheLayout::new(config.base_dir);
                let stats = layout.stats()?;
                if json {
                    println!("{}", serde_json::to_string_pretty(&stats)?);
                } else {
                    println!("downloads: {} file(s), {} byte(s)", stats.downloads.files, stats.downloads.bytes);
                    println!("tools:     {} file(s), {} byte(s)", stats.tools.files, stats.tools.bytes);
                    println!("relocated: {} file(s), {} byte(s)", stats.relocated.files, stats.relocated.bytes);
                }
                Ok(())
            }
            CacheCommands::Clear { base_dir } => {
                let config = load_config(None, base_dir)?;
                let layout = CacheLayout::new(config.base_dir);
                layout.clear_relocated()?;
                eprintln!("Cleared relocated output");
                Ok(())
            }
        },
    }
}

fn load_config(
    config: Option<&std::path::Path>,
    base_dir: Option<PathBuf>,
) -> Result<LaneConfig, Box<dyn std::error::Error>> {
    let mut lane_config = LaneConfig::load(config)?;
    if let Some(base_dir) = base_dir {
        lane_config.base_dir = base_dir;
    }
    Ok(lane_config)
}
