//! Pipeline orchestrator: runs all classification stages in order.
//!
//! Pipeline order:
//!   1. Mesh reading (element blocks filtered)
//!   2. Horizon file reading
//!   3. Depth sampling
//!   4. Boundary-count validation across all horizon sets
//!   5. Multi-horizon merge (profile index → aggregation → classification)
//!
//! Steps 1–4 complete before any element is classified, so configuration and
//! shape errors never leave a partial result behind.

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info};

use crate::config::{HorizonSource, RunConfig};
use crate::error::{Result, StrataError};
use crate::horizon::{read_horizon_file, HorizonSet};
use crate::merge::{MultiHorizonMerger, StrataSet};
use crate::mesh::{read_abaqus, Mesh};
use crate::sampler::sample_horizons;

/// Read every input named by `config` and classify the mesh.
pub fn run(config: &RunConfig) -> Result<StrataSet> {
    config.validate()?;

    // ── 1. Mesh ─────────────────────────────────────────────────────────────
    let mesh = read_abaqus(&config.geometry, &config.mesh_filter())?;

    // ── 2. Horizon files ────────────────────────────────────────────────────
    let files = config
        .horizons
        .iter()
        .map(|h| read_horizon_file(&h.path))
        .collect::<Result<Vec<_>>>()?;

    // ── 3. Depth sampling ───────────────────────────────────────────────────
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    if config.distribution.is_stochastic() {
        debug!(seed = ?config.seed, "sampling boundary depths from {} distribution", config.distribution);
    }
    let sets = files
        .iter()
        .map(|f| sample_horizons(f, config.distribution, &mut rng))
        .collect::<Result<Vec<_>>>()?;

    // ── 4. Validation ───────────────────────────────────────────────────────
    check_boundary_counts(&config.horizons, &sets, config.total_boundaries())?;

    // ── 5. Merge ────────────────────────────────────────────────────────────
    let strata = classify_mesh(&mesh, &sets, config.strata.clone())?;
    info!(elements = strata.total(), strata = strata.len(), "classification complete");
    Ok(strata)
}

/// Classify every element of `mesh` against `sets`, shallowest set first.
///
/// The sets must define exactly `strata.len() - 1` boundaries between them.
pub fn classify_mesh(mesh: &Mesh, sets: &[HorizonSet], strata: Vec<String>) -> Result<StrataSet> {
    check_total_boundaries(sets, strata.len().saturating_sub(1))?;
    let mut merger = MultiHorizonMerger::new(mesh, strata)?;
    for set in sets {
        merger.process(set)?;
    }
    Ok(merger.finish())
}

/// Every set must be non-empty, match its declared boundary count, and the
/// counts must add up to `total` (strata − 1).
pub fn check_boundary_counts(sources: &[HorizonSource], sets: &[HorizonSet], total: usize) -> Result<()> {
    for (source, set) in sources.iter().zip(sets) {
        if set.is_empty() {
            return Err(StrataError::EmptyHorizonSet { file: set.source.clone() });
        }
        if let Some(expected) = source.boundaries {
            if expected != set.boundary_count() {
                return Err(StrataError::BoundaryCountMismatch {
                    file: set.source.clone(),
                    expected,
                    found: set.boundary_count(),
                });
            }
        }
    }
    check_total_boundaries(sets, total)
}

fn check_total_boundaries(sets: &[HorizonSet], total: usize) -> Result<()> {
    let found: usize = sets.iter().map(HorizonSet::boundary_count).sum();
    if found == total {
        return Ok(());
    }
    match sets {
        [only] => Err(StrataError::BoundaryCountMismatch {
            file: only.source.clone(),
            expected: total,
            found,
        }),
        _ => Err(StrataError::Config(format!(
            "horizon files define {found} boundaries in total, expected {total}"
        ))),
    }
}
