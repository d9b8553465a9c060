//! Provenance aggregation.
//!
//! A [`MetadataAggregator`] is a plain accumulator value owned by one conversion. Partial
//! aggregators (one per subject, say) are combined with [`MetadataAggregator::extend`]; nothing
//! is shared between conversions.

use crate::individual::whole_seconds;
use crate::registry::CodingRegistry;
use chrono::{DateTime, Utc};
use fhir::Coding;
use indexmap::IndexSet;
use phenopackets::{MetaData, Resource};

/// Insertion-ordered set of coding-system resources.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MetadataAggregator {
    resources: IndexSet<Resource>,
}

impl MetadataAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a resource unless an equal one is already present. Returns whether it was added.
    pub fn accumulate(&mut self, resource: Resource) -> bool {
        self.resources.insert(resource)
    }

    /// Add the coding system behind `coding`. Codings without a code contribute nothing.
    pub fn accumulate_coding(&mut self, registry: &CodingRegistry<'_>, coding: &Coding) -> bool {
        if !coding.has_code() {
            return false;
        }
        let resource = registry.register_or_lookup(
            coding.system.as_deref().unwrap_or_default(),
            coding.code_str(),
            coding.version.as_deref(),
        );
        self.accumulate(resource)
    }

    /// Append every resource of `other`, keeping first-seen order.
    pub fn extend(&mut self, other: MetadataAggregator) {
        self.resources.extend(other.resources);
    }

    pub fn resources(&self) -> impl Iterator<Item = &Resource> {
        self.resources.iter()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Finish aggregation, stamping the current time.
    pub fn build(self, created_by: &str) -> MetaData {
        self.build_at(created_by, Utc::now())
    }

    /// Finish aggregation with an explicit creation instant (truncated to whole seconds).
    ///
    /// Returns the empty [`MetaData`] when nothing was accumulated.
    pub fn build_at(self, created_by: &str, created: DateTime<Utc>) -> MetaData {
        if self.resources.is_empty() {
            return MetaData::default();
        }

        MetaData {
            created: whole_seconds(created),
            created_by: created_by.to_string(),
            resources: self.resources.into_iter().collect(),
        }
    }
}
