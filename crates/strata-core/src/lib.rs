//! Horizon-based stratigraphic classification of finite-element meshes.
//!
//! Every element of a mesh is assigned to a stratum by comparing its mean
//! nodal elevation with the boundary depths of the nearest horizon sample
//! point. See [`pipeline::run`] for the end-to-end entry point.

pub mod aggregate;
pub mod classify;
pub mod config;
pub mod elset;
pub mod error;
pub mod grid;
pub mod horizon;
pub mod merge;
pub mod mesh;
pub mod pipeline;
pub mod profile;
pub mod sampler;

pub use config::{HorizonSource, RunConfig};
pub use error::{Result, StrataError};
pub use merge::{MultiHorizonMerger, PassReport, StrataSet};
pub use mesh::{Element, Mesh, MeshFilter, Node};
pub use pipeline::{classify_mesh, run};
pub use sampler::DepthDistribution;
