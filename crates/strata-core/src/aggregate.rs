//! Per-element aggregation of nodal profiles.
//!
//! An element's depth is the arithmetic mean of its nodes' vertical
//! coordinates; its governing profile is the one assigned to most of its
//! nodes. Ties go to the profile seen first in connectivity order, so the
//! same mesh always yields the same element profiles.

#[cfg(feature = "threading")]
use rayon::prelude::*;

use crate::error::{Result, StrataError};
use crate::mesh::{Element, ElementId};
use crate::profile::NodeProfiles;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElementProfile {
    pub element: ElementId,
    pub mean_z: f64,
    /// Index into `HorizonSet::samples`.
    pub profile: usize,
}

/// Most frequent profile index; among equally frequent ones the first seen
/// wins. `None` for an empty input.
pub fn dominant_profile<I>(profiles: I) -> Option<usize>
where
    I: IntoIterator<Item = usize>,
{
    // (profile, count) in first-seen order. Elements have a handful of
    // nodes, so a linear scan beats hashing.
    let mut counts: Vec<(usize, usize)> = Vec::new();
    for p in profiles {
        match counts.iter_mut().find(|(q, _)| *q == p) {
            Some((_, c)) => *c += 1,
            None => counts.push((p, 1)),
        }
    }

    let mut best: Option<(usize, usize)> = None;
    for &(p, c) in &counts {
        if best.map_or(true, |(_, bc)| c > bc) {
            best = Some((p, c));
        }
    }
    best.map(|(p, _)| p)
}

pub fn aggregate_element(element: &Element, node_profiles: &NodeProfiles) -> Result<ElementProfile> {
    let mut sum_z = 0.0f64;
    let mut assigned = Vec::with_capacity(element.nodes.len());
    for &node in &element.nodes {
        let vp = node_profiles
            .get(&node)
            .ok_or(StrataError::MissingNode { element: element.id, node })?;
        sum_z += vp.z;
        assigned.push(vp.profile);
    }

    let profile = dominant_profile(assigned).ok_or_else(|| {
        StrataError::Config(format!("element {} has no nodes", element.id))
    })?;

    Ok(ElementProfile {
        element: element.id,
        mean_z: sum_z / element.nodes.len() as f64,
        profile,
    })
}

/// Aggregate every element; fails on the first referential error.
#[cfg(not(feature = "threading"))]
pub fn aggregate_elements(elements: &[&Element], node_profiles: &NodeProfiles) -> Result<Vec<ElementProfile>> {
    elements.iter().map(|e| aggregate_element(e, node_profiles)).collect()
}

/// Aggregate every element; fails on the first referential error.
#[cfg(feature = "threading")]
pub fn aggregate_elements(elements: &[&Element], node_profiles: &NodeProfiles) -> Result<Vec<ElementProfile>> {
    elements.par_iter().map(|e| aggregate_element(e, node_profiles)).collect()
}
