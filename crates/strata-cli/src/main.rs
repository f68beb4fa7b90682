/// Command-line front end: classifies the elements of an Abaqus mesh into
/// strata and writes one `*ELSET` per stratum.
use std::fs;
use std::io::BufWriter;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use strata_core::elset::write_element_sets;
use strata_core::{DepthDistribution, HorizonSource, RunConfig};

#[derive(Parser, Debug)]
#[command(name = "strata", about = "Assign mesh elements to strata from horizon depth files")]
struct Args {
    /// JSON run configuration. Flags below override its fields.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Abaqus input file with *NODE and *ELEMENT sections.
    #[arg(short, long)]
    geometry: Option<PathBuf>,

    /// Horizon depth files, shallowest dataset first.
    #[arg(long, num_args = 1..)]
    horizons: Vec<PathBuf>,

    /// Stratum names, topmost first (comma separated).
    #[arg(short, long, value_delimiter = ',')]
    strata: Vec<String>,

    /// Also load shell (S3/S4) element blocks.
    #[arg(long)]
    include_2d: bool,

    /// ELSET names whose elements are not classified.
    #[arg(short, long)]
    exclude: Vec<String>,

    /// Boundary depth distribution: fixed, normal, uniform or mean_depth.
    #[arg(short, long)]
    distribution: Option<String>,

    /// Seed for stochastic distributions.
    #[arg(long)]
    seed: Option<u64>,

    /// Output element-set file.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Enable verbose debug output.
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false)
        .init();
}

/// Merge the optional config file with command-line overrides.
fn resolve_config(args: &Args) -> Result<RunConfig> {
    let mut config = match &args.config {
        Some(path) => RunConfig::from_json_file(path)?,
        None => {
            let Some(geometry) = &args.geometry else {
                bail!("either --config or --geometry is required");
            };
            RunConfig::new(geometry.clone(), Vec::new(), Vec::new())
        }
    };

    if let Some(geometry) = &args.geometry {
        config.geometry = geometry.clone();
    }
    if !args.horizons.is_empty() {
        config.horizons = args.horizons.iter().cloned().map(HorizonSource::new).collect();
    }
    if !args.strata.is_empty() {
        config.strata = args.strata.iter().map(|s| s.trim().to_string()).collect();
    }
    if args.include_2d {
        config.include_2d_elements = true;
    }
    if !args.exclude.is_empty() {
        config.excluded_elsets = args.exclude.clone();
    }
    if let Some(name) = &args.distribution {
        config.distribution = name.parse::<DepthDistribution>()?;
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    if let Some(output) = &args.output {
        config.output = output.clone();
    }

    config.validate()?;
    Ok(config)
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let config = resolve_config(&args)?;
    let strata = strata_core::run(&config).context("classification failed")?;

    let file = fs::File::create(&config.output)
        .with_context(|| format!("Cannot create {}", config.output.display()))?;
    write_element_sets(&mut BufWriter::new(file), &strata)
        .with_context(|| format!("Cannot write {}", config.output.display()))?;

    println!("{:<24} {:>10}", "Stratum", "Elements");
    println!("{}", "-".repeat(35));
    for (name, ids) in strata.iter() {
        println!("{:<24} {:>10}", name, ids.len());
    }
    println!("{}", "-".repeat(35));
    println!("{:<24} {:>10}", "Total", strata.total());
    println!("Element sets written to {}", config.output.display());
    Ok(())
}
