//! Phenotypic feature extraction from FHIR conditions.

use crate::ontology::{concept_to_ontology_class, to_ontology_class};
use fhir::{Coding, Condition, Onset};
use phenopackets::{FeatureOnset, PhenotypicFeature};

/// Convert one condition into a phenotypic feature.
///
/// Returns `None` (and logs a warning) when the condition carries no usable code. Severity is
/// kept only when it maps to a non-empty class. Only string onsets are carried over.
pub fn extract_feature(condition: &Condition) -> Option<PhenotypicFeature> {
    let Some(coding) = code_coding(condition) else {
        tracing::warn!(
            condition = condition.id.as_deref().unwrap_or(""),
            "condition has no code - skipping"
        );
        return None;
    };

    let severity = condition
        .severity
        .as_ref()
        .and_then(concept_to_ontology_class)
        .filter(|class| !class.is_empty());

    let onset = match &condition.onset {
        Some(Onset::String(text)) => Some(FeatureOnset::Text(text.clone())),
        Some(other) => {
            tracing::debug!(
                condition = condition.id.as_deref().unwrap_or(""),
                onset = ?other,
                "unsupported onset representation - ignoring"
            );
            None
        }
        None => None,
    };

    Some(PhenotypicFeature {
        feature_type: to_ontology_class(coding),
        severity,
        onset,
        negated: condition.is_refuted(),
        modifiers: Vec::new(),
    })
}

/// Codings of a condition that contribute provenance: the representative code coding and the
/// representative severity coding, each only when it carries a code.
pub fn condition_codings(condition: &Condition) -> impl Iterator<Item = &Coding> {
    let severity = condition
        .severity
        .as_ref()
        .and_then(|concept| concept.first_coding())
        .filter(|coding| coding.has_code());

    code_coding(condition).into_iter().chain(severity)
}

fn code_coding(condition: &Condition) -> Option<&Coding> {
    condition
        .code
        .as_ref()
        .and_then(|concept| concept.first_coding())
        .filter(|coding| coding.has_code())
}
