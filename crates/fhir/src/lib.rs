//! FHIR wire/boundary support for the phenopacket mapper.
//!
//! This crate provides the **in-memory resource graph** the mapper consumes and produces, plus
//! **format/translation helpers** for FHIR R4 bundles:
//! - JSON bundles, as exchanged over REST
//! - YAML bundles, using the same field names, for fixtures and hand-written input
//!
//! This crate focuses on:
//! - FHIR semantic alignment for the supported resources (Patient, Condition, Specimen)
//! - serialisation/deserialisation
//! - translation between wire structs and domain-level resources
//!
//! Resources outside the supported set are carried through as [`OtherResource`] so that no
//! entry silently disappears from a bundle.

pub mod bundle;
pub mod condition;
pub mod datatypes;
pub mod patient;
pub mod specimen;

// Re-export public domain-level types
pub use bundle::{Bundle, BundleEntry, BundleType, OtherResource, Resource, ResourceKind};
pub use condition::{Condition, Onset, CONDITION_VER_STATUS_SYSTEM};
pub use datatypes::{CodeableConcept, Coding, Reference};
pub use patient::{AdministrativeGender, Patient};
pub use specimen::Specimen;

/// Errors returned by the `fhir` boundary crate.
#[derive(Debug, thiserror::Error)]
pub enum FhirError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("invalid YAML: {0}")]
    InvalidYaml(#[from] serde_yaml::Error),

    #[error("translation error: {0}")]
    Translation(String),
}

/// Type alias for Results that can fail with a [`FhirError`].
pub type FhirResult<T> = Result<T, FhirError>;
