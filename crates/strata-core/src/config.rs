//! Run configuration: every input the pipeline needs, as one JSON record.
//!
//! ```json
//! {
//!   "geometry": "model.inp",
//!   "horizons": [{ "path": "upper.txt", "boundaries": 2 }, { "path": "lower.txt" }],
//!   "strata": ["Unit_1", "Unit_2", "Unit_3", "Unit_4"],
//!   "include_2d_elements": false,
//!   "excluded_elsets": ["Fault"],
//!   "distribution": "normal",
//!   "seed": 7
//! }
//! ```

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, StrataError};
use crate::mesh::MeshFilter;
use crate::sampler::DepthDistribution;

/// Default element-set output file.
pub const DEFAULT_OUTPUT: &str = "elements.set";

/// One horizon file, shallowest dataset first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HorizonSource {
    pub path: PathBuf,
    /// Boundaries this file must define. When omitted, the file's own column
    /// count is used and only the total across files is checked.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boundaries: Option<usize>,
}

impl HorizonSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), boundaries: None }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Abaqus input file with nodes and elements.
    pub geometry: PathBuf,
    pub horizons: Vec<HorizonSource>,
    /// Unit names, topmost first.
    pub strata: Vec<String>,
    #[serde(default)]
    pub include_2d_elements: bool,
    #[serde(default)]
    pub excluded_elsets: Vec<String>,
    #[serde(default)]
    pub distribution: DepthDistribution,
    /// Seed for stochastic distributions; drawn from OS entropy when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    #[serde(default = "default_output")]
    pub output: PathBuf,
}

fn default_output() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT)
}

impl RunConfig {
    pub fn new(geometry: impl Into<PathBuf>, horizons: Vec<HorizonSource>, strata: Vec<String>) -> Self {
        Self {
            geometry: geometry.into(),
            horizons,
            strata,
            include_2d_elements: false,
            excluded_elsets: Vec::new(),
            distribution: DepthDistribution::default(),
            seed: None,
            output: default_output(),
        }
    }

    pub fn from_json_str(text: &str, path: &Path) -> Result<Self> {
        serde_json::from_str(text).map_err(|source| StrataError::Json { path: path.to_path_buf(), source })
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| StrataError::io(path, e))?;
        Self::from_json_str(&text, path)
    }

    pub fn mesh_filter(&self) -> MeshFilter {
        MeshFilter {
            include_2d_elements: self.include_2d_elements,
            excluded_elsets: self.excluded_elsets.clone(),
        }
    }

    /// Boundaries expected across all horizon files.
    pub fn total_boundaries(&self) -> usize {
        self.strata.len().saturating_sub(1)
    }

    /// Checks that need no file access.
    pub fn validate(&self) -> Result<()> {
        if self.strata.len() < 2 {
            return Err(StrataError::Config("at least two strata are required".into()));
        }
        let mut seen = HashSet::new();
        if let Some(dup) = self.strata.iter().find(|s| !seen.insert(s.as_str())) {
            return Err(StrataError::Config(format!("stratum '{dup}' is listed twice")));
        }
        if self.horizons.is_empty() {
            return Err(StrataError::Config("no horizon files given".into()));
        }
        let declared: Option<usize> = self.horizons.iter().map(|h| h.boundaries).sum();
        if let Some(declared) = declared {
            if declared != self.total_boundaries() {
                return Err(StrataError::Config(format!(
                    "horizon files declare {declared} boundaries but {} strata need {}",
                    self.strata.len(),
                    self.total_boundaries()
                )));
            }
        }
        Ok(())
    }
}
