//! Reverse conversion: phenopacket record to FHIR bundle.
//!
//! Each subject becomes a patient followed by one condition per phenotypic feature; each
//! biosample becomes a specimen. Coding-system URLs are re-derived from the namespace table
//! and the configured fallbacks, not recovered from the record's metadata, so provenance may
//! differ from the bundle the record was built from.

use crate::config::ConverterConfig;
use crate::individual::to_patient;
use crate::ontology::OntologyMapper;
use crate::registry::CodingRegistry;
use fhir::{Bundle, Condition, Onset, Reference, Resource, Specimen};
use phenopackets::{Biosample, Individual, PhenoRecord, PhenotypicFeature};

/// Expand a record into a `collection` bundle. An empty record yields an empty bundle.
pub fn to_bundle(record: &PhenoRecord, config: &ConverterConfig) -> Bundle {
    if record.is_empty() {
        return Bundle::default();
    }

    let mapper = OntologyMapper::new(CodingRegistry::new(config.namespaces()));
    let mut resources: Vec<Resource> = Vec::new();

    for individual in record.subjects() {
        resources.push(to_patient(individual).into());
        for feature in &individual.phenotypic_features {
            resources.push(to_condition(&mapper, config, individual, feature).into());
        }
    }

    resources.extend(
        record
            .biosamples()
            .iter()
            .map(|biosample| Resource::from(to_specimen(&mapper, config, biosample))),
    );

    tracing::debug!(resources = resources.len(), "expanded record into bundle");
    Bundle::collection(resources)
}

fn to_condition(
    mapper: &OntologyMapper<'_>,
    config: &ConverterConfig,
    individual: &Individual,
    feature: &PhenotypicFeature,
) -> Condition {
    let phenotype_system = config.phenotype_system();

    if !feature.modifiers.is_empty() {
        tracing::debug!(
            subject = %individual.id,
            modifiers = feature.modifiers.len(),
            "feature modifiers have no condition counterpart - dropping"
        );
    }

    if individual.id.is_empty() {
        tracing::warn!("individual has no id - condition emitted without subject");
    }

    Condition {
        id: None,
        code: Some(mapper.to_concept(&feature.feature_type, phenotype_system)),
        severity: feature
            .severity
            .as_ref()
            .filter(|class| !class.is_empty())
            .map(|class| mapper.to_concept(class, phenotype_system)),
        onset: feature
            .onset
            .as_ref()
            .map(|onset| onset.display_text())
            .filter(|text| !text.is_empty())
            .map(|text| Onset::String(text.to_string())),
        verification_status: feature.negated.then(Condition::refuted_status),
        subject: (!individual.id.is_empty()).then(|| Reference::to_patient(&individual.id)),
    }
}

fn to_specimen(
    mapper: &OntologyMapper<'_>,
    config: &ConverterConfig,
    biosample: &Biosample,
) -> Specimen {
    Specimen {
        id: (!biosample.id.is_empty()).then(|| biosample.id.clone()),
        specimen_type: biosample
            .sampled_tissue
            .as_ref()
            .filter(|class| !class.is_empty())
            .map(|class| mapper.to_concept(class, config.specimen_system())),
        subject: (!biosample.individual_id.is_empty())
            .then(|| Reference::new(biosample.individual_id.clone())),
    }
}
