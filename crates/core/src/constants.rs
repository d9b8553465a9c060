//! Constants used throughout the phenofhir core crate.
//!
//! Coding-system URLs here seed the default namespace table and the per-field fallbacks used
//! when mapping phenopacket concepts back to FHIR codings. They are defaults, not fixed
//! behaviour: everything is overridable through [`crate::ConverterConfig`].

/// Provenance label stamped on metadata when the caller does not supply one.
pub const DEFAULT_CREATED_BY: &str = "FHIR converter";

/// Human Phenotype Ontology: default system for phenotype, severity and onset concepts.
pub const HPO_SYSTEM: &str = "http://purl.obolibrary.org/obo/hp.owl";

/// Phenotype And Trait Ontology: system for sex concepts.
pub const PATO_SYSTEM: &str = "http://purl.obolibrary.org/obo/pato.owl";

/// PATO release the sex concepts are taken from.
pub const PATO_VERSION: &str = "2018-08-14";

/// SNOMED CT: default system for specimen type concepts.
pub const SNOMED_CT_SYSTEM: &str = "http://snomed.info/sct";

pub const MONDO_SYSTEM: &str = "http://purl.obolibrary.org/obo/mondo.owl";

pub const UBERON_SYSTEM: &str = "http://purl.obolibrary.org/obo/uberon.owl";

pub const NCIT_SYSTEM: &str = "http://purl.obolibrary.org/obo/ncit.owl";

/// Warning emitted when a bundle names more than one subject.
pub const AMBIGUOUS_SUBJECT_WARNING: &str = "ambiguous primary subject";
