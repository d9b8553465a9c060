//! Subject-level phenopacket types: the individual, its phenotypic features and biosamples.

use crate::OntologyClass;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// CURIE of the PATO `male` term.
pub const PATO_MALE: &str = "PATO:0000384";
/// CURIE of the PATO `female` term.
pub const PATO_FEMALE: &str = "PATO:0000383";
/// CURIE of the PATO `biological sex` root term, used where no specific term exists.
pub const PATO_BIOLOGICAL_SEX: &str = "PATO:0000047";

/// Phenotypic sex of an individual.
///
/// `UnknownSex` means the source explicitly stated that sex is unknown. An individual whose
/// source did not state a sex at all carries no `Sex` value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Sex {
    UnknownSex,
    Female,
    Male,
    OtherSex,
}

impl Sex {
    /// The namespaced concept for this sex, drawn from PATO.
    pub fn ontology_class(self) -> OntologyClass {
        match self {
            Sex::Male => OntologyClass::new(PATO_MALE, "male"),
            Sex::Female => OntologyClass::new(PATO_FEMALE, "female"),
            Sex::OtherSex => OntologyClass::new(PATO_BIOLOGICAL_SEX, "other sex"),
            Sex::UnknownSex => OntologyClass::new(PATO_BIOLOGICAL_SEX, "unknown sex"),
        }
    }
}

/// Onset of a phenotypic feature: either a coded term or free text.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FeatureOnset {
    OntologyClass(OntologyClass),
    Text(String),
}

impl FeatureOnset {
    /// Text to show for this onset: the label of a term (or its id if unlabelled), or the text.
    pub fn display_text(&self) -> &str {
        match self {
            FeatureOnset::OntologyClass(class) if class.label.is_empty() => &class.id,
            FeatureOnset::OntologyClass(class) => &class.label,
            FeatureOnset::Text(text) => text,
        }
    }
}

/// One observed (or explicitly excluded) phenotypic abnormality.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhenotypicFeature {
    #[serde(rename = "type")]
    pub feature_type: OntologyClass,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<OntologyClass>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub onset: Option<FeatureOnset>,

    /// `true` when the feature was looked for and found to be absent.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub negated: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub modifiers: Vec<OntologyClass>,
}

/// The subject of a phenopacket.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Individual {
    /// Correlation key across all source resources describing the same person.
    pub id: String,

    /// Whole seconds only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sex: Option<Sex>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub phenotypic_features: Vec<PhenotypicFeature>,
}

impl Individual {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }
}

/// A biological sample taken from an individual.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Biosample {
    pub id: String,

    /// Id of the [`Individual`] the sample was taken from.
    #[serde(default)]
    pub individual_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sampled_tissue: Option<OntologyClass>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sex_concepts_use_pato() {
        assert_eq!(Sex::Male.ontology_class().id, "PATO:0000384");
        assert_eq!(Sex::Female.ontology_class().id, "PATO:0000383");
        assert_ne!(
            Sex::OtherSex.ontology_class(),
            Sex::UnknownSex.ontology_class()
        );
    }

    #[test]
    fn sex_serialises_as_screaming_snake_case() {
        let json = serde_json::to_string(&Sex::OtherSex).expect("serialise");
        assert_eq!(json, r#""OTHER_SEX""#);
    }

    #[test]
    fn feature_serialises_type_and_skips_defaults() {
        let feature = PhenotypicFeature {
            feature_type: OntologyClass::new("HP:0001250", "Seizure"),
            onset: Some(FeatureOnset::Text("childhood".into())),
            ..PhenotypicFeature::default()
        };

        let json = serde_json::to_value(&feature).expect("serialise");
        assert_eq!(json["type"]["id"], "HP:0001250");
        assert_eq!(json["onset"]["text"], "childhood");
        assert!(json.get("negated").is_none());
        assert!(json.get("modifiers").is_none());
    }

    #[test]
    fn onset_display_prefers_label() {
        let coded = FeatureOnset::OntologyClass(OntologyClass::new("HP:0003577", "Congenital onset"));
        assert_eq!(coded.display_text(), "Congenital onset");

        let unlabelled = FeatureOnset::OntologyClass(OntologyClass::new("HP:0003577", ""));
        assert_eq!(unlabelled.display_text(), "HP:0003577");
    }

    #[test]
    fn individual_date_of_birth_is_rfc3339() {
        let individual = Individual {
            id: "P1".into(),
            date_of_birth: DateTime::from_timestamp(92225730, 0),
            sex: Some(Sex::Male),
            phenotypic_features: vec![],
        };

        let json = serde_json::to_value(&individual).expect("serialise");
        assert_eq!(json["dateOfBirth"], "1972-12-03T10:15:30Z");
        assert_eq!(json["sex"], "MALE");
        assert!(json.get("phenotypicFeatures").is_none());
    }
}
