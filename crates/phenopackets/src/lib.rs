//! Phenopacket record model and wire support.
//!
//! This crate defines the compact, strongly-typed side of the FHIR interop mapping: one
//! subject's identity, sex, phenotypic features, biosamples and provenance metadata. The
//! mapping logic itself lives in `phenofhir-core`; this crate handles structure and
//! serialisation only.
//!
//! Records are rendered as JSON (camelCase field names, the phenopacket convention) or YAML.

pub mod data_types;
pub mod individual;
pub mod meta_data;
pub mod record;

pub use data_types::OntologyClass;
pub use individual::{Biosample, FeatureOnset, Individual, PhenotypicFeature, Sex};
pub use meta_data::{MetaData, Resource};
pub use record::{Cohort, PhenoRecord, Phenopacket};

/// Errors returned by the `phenopackets` crate.
#[derive(Debug, thiserror::Error)]
pub enum PhenopacketError {
    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("invalid YAML: {0}")]
    InvalidYaml(#[from] serde_yaml::Error),

    #[error("translation error: {0}")]
    Translation(String),
}

pub type PhenopacketResult<T> = Result<T, PhenopacketError>;
