//! Depth sampling: turns horizon-file rows into concrete boundary depths.
//!
//! Fixed runs read one column per boundary. The stochastic distributions
//! read an interleaved (mean, spread) pair per boundary:
//!   x, y, mean₁, spread₁, mean₂, spread₂, …
//! and draw a fresh depth for every boundary of every sample point, so two
//! runs with different seeds will generally classify differently.

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{Result, StrataError};
use crate::horizon::{is_absent, HorizonFile, HorizonSample, HorizonSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepthDistribution {
    /// One depth column per boundary, used as-is.
    #[default]
    #[serde(alias = "absent", alias = "none")]
    Fixed,
    /// Gaussian with the given mean and standard deviation.
    Normal,
    /// Uniform over [mean − spread, mean + spread].
    Uniform,
    /// The mean column, spread ignored.
    MeanDepth,
}

impl DepthDistribution {
    /// Value columns consumed per boundary.
    pub fn columns_per_boundary(self) -> usize {
        match self {
            DepthDistribution::Fixed => 1,
            _ => 2,
        }
    }

    pub fn is_stochastic(self) -> bool {
        matches!(self, DepthDistribution::Normal | DepthDistribution::Uniform)
    }

    /// `None` when `mean ± spread` does not span a finite range.
    fn draw<R: Rng>(self, mean: f64, spread: f64, rng: &mut R) -> Option<f64> {
        // Pinched-out boundaries stay pinched out.
        if is_absent(mean) {
            return Some(mean);
        }
        if !self.is_stochastic() {
            return Some(mean);
        }
        let half = spread.abs();
        let (low, high) = (mean - half, mean + half);
        if !(high - low).is_finite() {
            return None;
        }
        let depth = match self {
            DepthDistribution::Normal => mean + spread * gauss_random(rng),
            _ if half == 0.0 => mean,
            _ => rng.gen_range(low..=high),
        };
        Some(depth)
    }
}

impl FromStr for DepthDistribution {
    type Err = StrataError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fixed" | "absent" | "none" => Ok(DepthDistribution::Fixed),
            "normal" => Ok(DepthDistribution::Normal),
            "uniform" => Ok(DepthDistribution::Uniform),
            "mean_depth" => Ok(DepthDistribution::MeanDepth),
            _ => Err(StrataError::UnsupportedDistribution(s.to_string())),
        }
    }
}

impl fmt::Display for DepthDistribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DepthDistribution::Fixed => "fixed",
            DepthDistribution::Normal => "normal",
            DepthDistribution::Uniform => "uniform",
            DepthDistribution::MeanDepth => "mean_depth",
        };
        f.write_str(name)
    }
}

/// Box-Muller transform for a standard normal deviate.
fn gauss_random<R: Rng>(rng: &mut R) -> f64 {
    // Clamp u1 away from 0 to avoid ln(0) = -inf
    let u1: f64 = rng.gen::<f64>().max(f64::MIN_POSITIVE);
    let u2: f64 = rng.gen();
    (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos()
}

/// Resolve every row of `file` into a [`HorizonSample`] with one depth per
/// boundary.
pub fn sample_horizons<R: Rng>(
    file: &HorizonFile,
    distribution: DepthDistribution,
    rng: &mut R,
) -> Result<HorizonSet> {
    let width = distribution.columns_per_boundary();
    let columns = file.value_columns();
    if columns % width != 0 {
        return Err(StrataError::ColumnCount {
            file: file.source.clone(),
            line: 1,
            expected: 2 + (columns / width + 1) * width,
            found: 2 + columns,
        });
    }

    let samples = file
        .records
        .iter()
        .enumerate()
        .map(|(row, rec)| {
            let boundaries = match distribution {
                DepthDistribution::Fixed => rec.values.clone(),
                _ => rec
                    .values
                    .chunks_exact(2)
                    .map(|pair| {
                        distribution.draw(pair[0], pair[1], rng).ok_or_else(|| StrataError::InvalidSpread {
                            file: file.source.clone(),
                            row: row + 1,
                            mean: pair[0],
                            spread: pair[1],
                        })
                    })
                    .collect::<Result<Vec<_>>>()?,
            };
            Ok(HorizonSample::new(rec.x, rec.y, boundaries))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(HorizonSet::new(file.source.clone(), samples))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::horizon::{parse_horizon_file, ABSENT_BOUNDARY};
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::path::Path;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    #[test]
    fn parses_names_and_rejects_unknown() {
        assert_eq!("normal".parse::<DepthDistribution>().unwrap(), DepthDistribution::Normal);
        assert_eq!("MEAN_DEPTH".parse::<DepthDistribution>().unwrap(), DepthDistribution::MeanDepth);
        assert_eq!("absent".parse::<DepthDistribution>().unwrap(), DepthDistribution::Fixed);
        assert!(matches!(
            "lognormal".parse::<DepthDistribution>(),
            Err(StrataError::UnsupportedDistribution(name)) if name == "lognormal"
        ));
    }

    #[test]
    fn serde_names_match_from_str() {
        let d: DepthDistribution = serde_json::from_str("\"mean_depth\"").unwrap();
        assert_eq!(d, DepthDistribution::MeanDepth);
        assert!(serde_json::from_str::<DepthDistribution>("\"gamma\"").is_err());
        assert_eq!(DepthDistribution::Uniform.to_string(), "uniform");
    }

    #[test]
    fn fixed_passes_depths_through() {
        let file = parse_horizon_file("0, 0, -10, 9999, -30\n", Path::new("h")).unwrap();
        let set = sample_horizons(&file, DepthDistribution::Fixed, &mut rng()).unwrap();
        assert_eq!(set.boundary_count(), 3);
        assert_eq!(set.samples[0].boundaries, vec![-10.0, ABSENT_BOUNDARY, -30.0]);
    }

    #[test]
    fn mean_depth_ignores_spread() {
        let file = parse_horizon_file("0, 0, -10, 3, -20, 4\n", Path::new("h")).unwrap();
        let set = sample_horizons(&file, DepthDistribution::MeanDepth, &mut rng()).unwrap();
        assert_eq!(set.boundary_count(), 2);
        assert_relative_eq!(set.samples[0].boundaries[0], -10.0);
        assert_relative_eq!(set.samples[0].boundaries[1], -20.0);
    }

    #[test]
    fn uniform_stays_within_spread() {
        let text = (0..200).map(|i| format!("{i}, 0, -100, 5\n")).collect::<String>();
        let file = parse_horizon_file(&text, Path::new("h")).unwrap();
        let set = sample_horizons(&file, DepthDistribution::Uniform, &mut rng()).unwrap();
        assert!(set.samples.iter().all(|s| (-105.0..=-95.0).contains(&s.boundaries[0])));
        // Not every draw collapses onto the mean.
        assert!(set.samples.iter().any(|s| s.boundaries[0] != -100.0));
    }

    #[test]
    fn normal_sample_mean_and_std_are_close() {
        let text = (0..4000).map(|i| format!("{i}, 0, -50, 2\n")).collect::<String>();
        let file = parse_horizon_file(&text, Path::new("h")).unwrap();
        let set = sample_horizons(&file, DepthDistribution::Normal, &mut rng()).unwrap();
        let draws: Vec<f64> = set.samples.iter().map(|s| s.boundaries[0]).collect();
        let n = draws.len() as f64;
        let mean = draws.iter().sum::<f64>() / n;
        let std = (draws.iter().map(|d| (d - mean).powi(2)).sum::<f64>() / n).sqrt();
        assert!((mean + 50.0).abs() < 0.2, "mean = {mean}");
        assert!((std - 2.0).abs() < 0.2, "std = {std}");
    }

    #[test]
    fn absent_means_survive_sampling() {
        let file = parse_horizon_file("0, 0, 9999, 10\n", Path::new("h")).unwrap();
        for dist in [DepthDistribution::Normal, DepthDistribution::Uniform] {
            let set = sample_horizons(&file, dist, &mut rng()).unwrap();
            assert!(is_absent(set.samples[0].boundaries[0]));
        }
    }

    #[test]
    fn unbounded_spread_is_a_data_error() {
        for text in ["0, 0, 0, 1e308\n", "0, 0, -10, inf\n", "0, 0, 0, 1\n5, 5, -10, NaN\n"] {
            let file = parse_horizon_file(text, Path::new("h")).unwrap();
            for dist in [DepthDistribution::Normal, DepthDistribution::Uniform] {
                assert!(
                    matches!(sample_horizons(&file, dist, &mut rng()), Err(StrataError::InvalidSpread { .. })),
                    "{dist} accepted {text:?}"
                );
            }
            // The spread column is not read for mean depths.
            sample_horizons(&file, DepthDistribution::MeanDepth, &mut rng()).unwrap();
        }
    }

    #[test]
    fn odd_column_count_rejected_for_paired_layout() {
        let file = parse_horizon_file("0, 0, -10, 1, -20\n", Path::new("h")).unwrap();
        assert!(matches!(
            sample_horizons(&file, DepthDistribution::Normal, &mut rng()),
            Err(StrataError::ColumnCount { found: 5, expected: 6, .. })
        ));
    }
}
