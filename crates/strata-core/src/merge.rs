//! Stratum collections and the multi-horizon merge.
//!
//! Horizon sets are processed top to bottom. Each set only sees the elements
//! earlier sets left unresolved (the residual list). An element that falls
//! below every boundary of the current set is deferred to the next set;
//! anything else lands in unit `index + offset`, where `offset` is the number
//! of boundaries consumed by earlier sets. Whatever is still unresolved after
//! the last set goes to the deepest unit.

use std::path::PathBuf;

use tracing::{debug, info};

use crate::aggregate::aggregate_elements;
use crate::classify::classify;
use crate::error::{Result, StrataError};
use crate::horizon::HorizonSet;
use crate::mesh::{Element, ElementId, Mesh};
use crate::profile::ProfileIndex;

/// Ordered units (index 0 = topmost) and the element ids assigned to each.
#[derive(Debug, Clone, PartialEq)]
pub struct StrataSet {
    names: Vec<String>,
    members: Vec<Vec<ElementId>>,
}

impl StrataSet {
    pub fn new(names: Vec<String>) -> Self {
        let members = vec![Vec::new(); names.len()];
        Self { names, members }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn members(&self, unit: usize) -> &[ElementId] {
        &self.members[unit]
    }

    pub fn assign(&mut self, unit: usize, element: ElementId) {
        self.members[unit].push(element);
    }

    /// (name, element ids) in declared top-to-bottom order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[ElementId])> + '_ {
        self.names.iter().map(String::as_str).zip(self.members.iter().map(Vec::as_slice))
    }

    /// Number of assigned elements across all units.
    pub fn total(&self) -> usize {
        self.members.iter().map(Vec::len).sum()
    }

    /// Unit containing `element`, if assigned.
    pub fn unit_of(&self, element: ElementId) -> Option<usize> {
        self.members.iter().position(|m| m.contains(&element))
    }
}

/// Outcome of one horizon pass.
#[derive(Debug, Clone, PartialEq)]
pub struct PassReport {
    pub source: PathBuf,
    pub boundaries: usize,
    /// Unit offset applied to this pass's indices.
    pub offset: usize,
    pub assigned: usize,
    pub deferred: usize,
}

pub struct MultiHorizonMerger<'m> {
    mesh: &'m Mesh,
    strata: StrataSet,
    residual: Vec<&'m Element>,
    offset: usize,
}

impl<'m> MultiHorizonMerger<'m> {
    /// Start a merge over every element of `mesh`.
    pub fn new(mesh: &'m Mesh, strata_names: Vec<String>) -> Result<Self> {
        if strata_names.is_empty() {
            return Err(StrataError::Config("at least one stratum is required".into()));
        }
        Ok(Self {
            mesh,
            strata: StrataSet::new(strata_names),
            residual: mesh.elements().collect(),
            offset: 0,
        })
    }

    /// Elements not yet assigned to any unit.
    pub fn residual(&self) -> impl Iterator<Item = ElementId> + '_ {
        self.residual.iter().map(|e| e.id)
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Classify the residual elements against one horizon set.
    ///
    /// Nothing is assigned if the pass fails.
    pub fn process(&mut self, set: &HorizonSet) -> Result<PassReport> {
        let count = set.boundary_count();
        let deepest = self.strata.len() - 1;
        if self.offset + count > deepest {
            return Err(StrataError::BoundaryCountMismatch {
                file: set.source.clone(),
                expected: deepest - self.offset.min(deepest),
                found: count,
            });
        }

        let index = ProfileIndex::build(set)?;
        let node_profiles = index.assign_nodes(self.mesh);
        let element_profiles = aggregate_elements(&self.residual, &node_profiles)?;

        let mut deferred = Vec::new();
        let mut assigned = 0usize;
        for (element, ep) in self.residual.iter().zip(&element_profiles) {
            let unit = classify(ep.mean_z, &set.samples[ep.profile].boundaries);
            if unit == count {
                deferred.push(*element);
            } else {
                self.strata.assign(unit + self.offset, element.id);
                assigned += 1;
            }
        }

        let report = PassReport {
            source: set.source.clone(),
            boundaries: count,
            offset: self.offset,
            assigned,
            deferred: deferred.len(),
        };
        info!(
            assigned = report.assigned,
            deferred = report.deferred,
            offset = report.offset,
            "horizon pass {} done",
            set.source.display()
        );

        self.residual = deferred;
        self.offset += count;
        Ok(report)
    }

    /// Assign whatever is left to the deepest unit and return the result.
    pub fn finish(mut self) -> StrataSet {
        let deepest = self.strata.len() - 1;
        if !self.residual.is_empty() {
            debug!(count = self.residual.len(), "unresolved elements assigned to deepest unit");
        }
        for element in std::mem::take(&mut self.residual) {
            self.strata.assign(deepest, element.id);
        }
        self.strata
    }
}
