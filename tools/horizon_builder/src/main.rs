//! Merge per-horizon `x y depth` point files into one multi-column horizon
//! file. Input files are given shallowest first; points missing from a
//! horizon take the depth of the next deeper horizon defined there.

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::{fs, io::BufWriter, path::PathBuf};
use strata_core::grid::{read_point_file, HorizonGrid};
use tracing::info;

// ── CLI ───────────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "horizon_builder", about = "Assemble a horizon file from per-horizon point files")]
struct Args {
    /// Point files, one per horizon, shallowest first.
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Output horizon file.
    #[arg(short, long, default_value = "horizons.txt")]
    output: PathBuf,

    /// Lines starting with this prefix are skipped.
    #[arg(short, long, default_value = "#")]
    comment: String,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let args = Args::parse();
    let Some((first, rest)) = args.files.split_first() else {
        bail!("no point files given");
    };

    let points = read_point_file(first, &args.comment)?;
    info!(points = points.len(), "{}: horizon 1", first.display());
    let mut grid = HorizonGrid::from_first(&points);

    for (i, path) in rest.iter().enumerate() {
        let points = read_point_file(path, &args.comment)?;
        info!(points = points.len(), "{}: horizon {}", path.display(), i + 2);
        grid.add_horizon(&points);
    }
    grid.fill_absent();

    let file = fs::File::create(&args.output)
        .with_context(|| format!("Cannot create {}", args.output.display()))?;
    grid.write(&mut BufWriter::new(file))
        .with_context(|| format!("Cannot write {}", args.output.display()))?;

    println!(
        "{} rows × {} horizons written to {}",
        grid.rows().len(),
        grid.horizon_count(),
        args.output.display()
    );
    Ok(())
}
