//! # Phenofhir Core
//!
//! Bidirectional mapping between FHIR bundles and phenopacket records.
//!
//! This crate contains the pure conversion logic:
//! - Coding registry and namespace table (CURIE prefix <-> coding-system URL)
//! - Ontology-class mapping, resource grouping, feature and subject extraction
//! - Metadata aggregation and the forward/reverse pipelines
//!
//! **No I/O concerns**: parsing and rendering of wire formats belong in the `fhir` and
//! `phenopackets` crates; serving requests belongs in the binaries.

pub mod config;
pub mod constants;
pub mod error;
pub mod feature;
pub mod forward;
pub mod grouping;
pub mod individual;
pub mod metadata;
pub mod ontology;
pub mod registry;
pub mod reverse;

pub use config::{ConverterConfig, SubjectPolicy};
pub use error::{ConvertError, ConvertResult};
pub use registry::{CodingRegistry, Namespace, NamespaceTable};

use fhir::Bundle;
use phenopackets::PhenoRecord;

/// Conversion entry point holding read-only configuration.
///
/// Every call builds its own accumulators, so one `Converter` can be shared across threads
/// (e.g. behind an `Arc`) and used for concurrent conversions.
#[derive(Clone, Debug, Default)]
pub struct Converter {
    config: ConverterConfig,
}

impl Converter {
    /// Creates a new converter.
    ///
    /// # Arguments
    /// * `config` - Configuration resolved at startup.
    pub fn new(config: ConverterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ConverterConfig {
        &self.config
    }

    /// Converts a bundle into a phenopacket record.
    ///
    /// # Returns
    /// A [`PhenoRecord::Phenopacket`] for zero or one subject, or for several subjects under
    /// [`SubjectPolicy::FirstOnly`]; a [`PhenoRecord::Cohort`] for several subjects under
    /// [`SubjectPolicy::CollectAll`]. Never fails: unusable resources are logged and skipped.
    pub fn to_phenopacket(&self, bundle: &Bundle) -> PhenoRecord {
        forward::to_phenopacket(bundle, &self.config)
    }

    /// Expands a phenopacket record into a `collection` bundle.
    pub fn to_bundle(&self, record: &PhenoRecord) -> Bundle {
        reverse::to_bundle(record, &self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BUNDLE_JSON: &str = r#"{
        "resourceType": "Bundle",
        "type": "collection",
        "entry": [
            {
                "fullUrl": "urn:uuid:2f5c",
                "resource": {
                    "resourceType": "Patient",
                    "id": "P1",
                    "gender": "female",
                    "birthDate": "1998-01-01"
                }
            },
            {
                "resource": {
                    "resourceType": "Condition",
                    "code": {
                        "coding": [
                            {
                                "system": "http://purl.obolibrary.org/obo/hp.owl",
                                "code": "HP:0001250",
                                "display": "Seizure"
                            }
                        ]
                    },
                    "onsetString": "childhood",
                    "subject": { "reference": "urn:uuid:2f5c" }
                }
            },
            {
                "resource": {
                    "resourceType": "Observation",
                    "id": "O1"
                }
            }
        ]
    }"#;

    #[test]
    fn converts_parsed_bundle_json() {
        let bundle = Bundle::from_json(BUNDLE_JSON).expect("valid bundle");
        let converter = Converter::default();

        let record = converter.to_phenopacket(&bundle);
        let subjects = record.subjects();
        assert_eq!(subjects.len(), 1);
        assert_eq!(subjects[0].id, "P1");
        assert_eq!(subjects[0].phenotypic_features.len(), 1);
        assert_eq!(record.meta_data().created_by, "FHIR converter");
        assert!(record.meta_data().created.is_some());

        let json = record.to_json().expect("render record");
        let reparsed = PhenoRecord::from_json(&json).expect("parse record");
        assert_eq!(reparsed, record);
    }

    #[test]
    fn converter_round_trips_through_wire_formats() {
        let converter = Converter::new(ConverterConfig::default());
        let record = converter.to_phenopacket(&Bundle::from_json(BUNDLE_JSON).expect("valid"));

        let bundle = converter.to_bundle(&record);
        let yaml = bundle.to_yaml().expect("render yaml");
        let reparsed = Bundle::from_yaml(&yaml).expect("parse yaml");

        let again = converter.to_phenopacket(&reparsed);
        assert_eq!(again.subjects(), record.subjects());
    }

    #[test]
    fn converter_is_shareable_across_threads() {
        let converter = std::sync::Arc::new(Converter::default());
        let bundle = Bundle::from_json(BUNDLE_JSON).expect("valid bundle");

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let converter = converter.clone();
                let bundle = bundle.clone();
                std::thread::spawn(move || converter.to_phenopacket(&bundle).subjects().len())
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().expect("thread"), 1);
        }
    }
}
