//! Forward conversion: FHIR bundle to phenopacket record.
//!
//! Steps:
//! 1. group the bundle and resolve condition subjects
//! 2. build one individual per distinct subject key, merging repeated patient resources
//! 3. attach the features of every convertible condition to its subject
//! 4. apply the subject policy and assemble metadata for the subjects that were kept
//!
//! Each subject owns its own provenance accumulator, so the metadata of a record only lists
//! coding systems referenced by the subjects it actually contains.

use crate::config::{ConverterConfig, SubjectPolicy};
use crate::constants::AMBIGUOUS_SUBJECT_WARNING;
use crate::feature::{condition_codings, extract_feature};
use crate::grouping::group;
use crate::individual::{extract_individual, merge_patient, sex_resource};
use crate::metadata::MetadataAggregator;
use crate::registry::CodingRegistry;
use chrono::{DateTime, Utc};
use fhir::Bundle;
use indexmap::map::Entry;
use indexmap::IndexMap;
use phenopackets::{Cohort, Individual, PhenoRecord, Phenopacket};

/// One subject under construction together with the provenance it contributed.
struct SubjectDraft {
    individual: Individual,
    provenance: MetadataAggregator,
}

/// Convert a bundle, stamping metadata with the current time.
pub fn to_phenopacket(bundle: &Bundle, config: &ConverterConfig) -> PhenoRecord {
    to_phenopacket_at(bundle, config, Utc::now())
}

/// Convert a bundle with an explicit metadata creation instant.
pub fn to_phenopacket_at(
    bundle: &Bundle,
    config: &ConverterConfig,
    created: DateTime<Utc>,
) -> PhenoRecord {
    let groups = group(&bundle.entries);
    let registry = CodingRegistry::new(config.namespaces());

    let mut drafts: IndexMap<&str, SubjectDraft> = IndexMap::new();

    for subject in &groups.subjects {
        match drafts.entry(subject.key.as_str()) {
            Entry::Occupied(mut occupied) => {
                merge_patient(&mut occupied.get_mut().individual, subject.patient);
            }
            Entry::Vacant(vacant) => {
                let mut individual = extract_individual(subject.patient);
                if individual.id.is_empty() {
                    individual.id = subject.key.clone();
                }
                vacant.insert(SubjectDraft {
                    individual,
                    provenance: MetadataAggregator::new(),
                });
            }
        }
    }

    for draft in drafts.values_mut() {
        if let Some(sex) = draft.individual.sex {
            draft.provenance.accumulate(sex_resource(&registry, sex));
        }
    }

    for link in &groups.conditions {
        let Some(draft) = drafts.get_mut(link.subject_key.as_str()) else {
            continue;
        };
        let Some(feature) = extract_feature(link.condition) else {
            continue;
        };

        for coding in condition_codings(link.condition) {
            draft.provenance.accumulate_coding(&registry, coding);
        }
        draft.individual.phenotypic_features.push(feature);
    }

    if !groups.specimens.is_empty() {
        tracing::debug!(
            specimens = groups.specimens.len(),
            "specimens are not mapped to biosamples - ignoring"
        );
    }

    assemble(drafts, config, created)
}

fn assemble(
    drafts: IndexMap<&str, SubjectDraft>,
    config: &ConverterConfig,
    created: DateTime<Utc>,
) -> PhenoRecord {
    if drafts.len() > 1 {
        let subject_keys: Vec<&str> = drafts.keys().copied().collect();
        tracing::warn!(
            subjects = ?subject_keys,
            policy = %config.subject_policy(),
            "{}",
            AMBIGUOUS_SUBJECT_WARNING
        );
    }

    match (drafts.len(), config.subject_policy()) {
        (0, _) => PhenoRecord::default(),
        (1, _) | (_, SubjectPolicy::FirstOnly) => {
            let Some(draft) = drafts.into_values().next() else {
                return PhenoRecord::default();
            };
            Phenopacket {
                subject: Some(draft.individual),
                biosamples: Vec::new(),
                meta_data: draft.provenance.build_at(config.created_by(), created),
            }
            .into()
        }
        (_, SubjectPolicy::CollectAll) => {
            let mut provenance = MetadataAggregator::new();
            let mut members = Vec::with_capacity(drafts.len());
            for draft in drafts.into_values() {
                provenance.extend(draft.provenance);
                members.push(draft.individual);
            }
            Cohort {
                members,
                biosamples: Vec::new(),
                meta_data: provenance.build_at(config.created_by(), created),
            }
            .into()
        }
    }
}
