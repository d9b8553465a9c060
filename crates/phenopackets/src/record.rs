//! Top-level phenopacket records.
//!
//! A conversion produces either a single-subject [`Phenopacket`] or, when the caller asked for
//! every subject of an ambiguous multi-subject bundle, a [`Cohort`]. [`PhenoRecord`] is the
//! closed choice between the two.

use crate::{Biosample, Individual, MetaData, PhenopacketError, PhenopacketResult};
use serde::{Deserialize, Serialize};

/// A single-subject record.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Phenopacket {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<Individual>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub biosamples: Vec<Biosample>,

    #[serde(default, skip_serializing_if = "MetaData::is_empty")]
    pub meta_data: MetaData,
}

/// A multi-subject record, members in discovery order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cohort {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<Individual>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub biosamples: Vec<Biosample>,

    #[serde(default, skip_serializing_if = "MetaData::is_empty")]
    pub meta_data: MetaData,
}

/// Output record of a forward conversion.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PhenoRecord {
    Phenopacket(Phenopacket),
    Cohort(Cohort),
}

impl Default for PhenoRecord {
    fn default() -> Self {
        PhenoRecord::Phenopacket(Phenopacket::default())
    }
}

impl From<Phenopacket> for PhenoRecord {
    fn from(value: Phenopacket) -> Self {
        PhenoRecord::Phenopacket(value)
    }
}

impl From<Cohort> for PhenoRecord {
    fn from(value: Cohort) -> Self {
        PhenoRecord::Cohort(value)
    }
}

impl PhenoRecord {
    /// Every subject in the record, in order.
    pub fn subjects(&self) -> Vec<&Individual> {
        match self {
            PhenoRecord::Phenopacket(p) => p.subject.iter().collect(),
            PhenoRecord::Cohort(c) => c.members.iter().collect(),
        }
    }

    pub fn biosamples(&self) -> &[Biosample] {
        match self {
            PhenoRecord::Phenopacket(p) => &p.biosamples,
            PhenoRecord::Cohort(c) => &c.biosamples,
        }
    }

    pub fn meta_data(&self) -> &MetaData {
        match self {
            PhenoRecord::Phenopacket(p) => &p.meta_data,
            PhenoRecord::Cohort(c) => &c.meta_data,
        }
    }

    /// Whether the record carries nothing at all (no subjects, samples or provenance).
    pub fn is_empty(&self) -> bool {
        self.subjects().is_empty() && self.biosamples().is_empty() && self.meta_data().is_empty()
    }

    /// Parse a record from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`PhenopacketError::Translation`] with the failing path when the JSON does not
    /// match the record schema.
    pub fn from_json(json_text: &str) -> PhenopacketResult<Self> {
        let mut deserializer = serde_json::Deserializer::from_str(json_text);
        let record = decode(&mut deserializer)?;
        deserializer.end()?;
        Ok(record)
    }

    /// Parse a record from YAML text.
    pub fn from_yaml(yaml_text: &str) -> PhenopacketResult<Self> {
        decode(serde_yaml::Deserializer::from_str(yaml_text))
    }

    pub fn to_json(&self) -> PhenopacketResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn to_yaml(&self) -> PhenopacketResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

fn decode<'de, D>(deserializer: D) -> PhenopacketResult<PhenoRecord>
where
    D: serde::Deserializer<'de>,
{
    serde_path_to_error::deserialize(deserializer).map_err(|err| {
        let path = err.path().to_string();
        let source = err.into_inner();
        let path = if path.is_empty() || path == "." {
            "<root>"
        } else {
            path.as_str()
        };
        PhenopacketError::Translation(format!("Phenopacket schema mismatch at {path}: {source}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{OntologyClass, PhenotypicFeature, Resource, Sex};
    use chrono::DateTime;

    fn sample() -> PhenoRecord {
        PhenoRecord::Phenopacket(Phenopacket {
            subject: Some(Individual {
                id: "P1".into(),
                date_of_birth: DateTime::from_timestamp(92225730, 0),
                sex: Some(Sex::Male),
                phenotypic_features: vec![PhenotypicFeature {
                    feature_type: OntologyClass::new("HP:0001250", "Seizure"),
                    negated: true,
                    ..PhenotypicFeature::default()
                }],
            }),
            biosamples: vec![],
            meta_data: MetaData {
                created: DateTime::from_timestamp(1_700_000_000, 0),
                created_by: "FHIR converter".into(),
                resources: vec![Resource {
                    id: "hp".into(),
                    name: String::new(),
                    namespace_prefix: "HP".into(),
                    url: "http://purl.obolibrary.org/obo/hp.owl".into(),
                    version: String::new(),
                }],
            },
        })
    }

    #[test]
    fn round_trips_json() {
        let record = sample();
        let json = record.to_json().expect("render json");
        assert!(json.contains(r#""phenopacket""#));
        assert!(json.contains(r#""createdBy": "FHIR converter""#));
        assert_eq!(PhenoRecord::from_json(&json).expect("reparse"), record);
    }

    #[test]
    fn round_trips_yaml() {
        let record = sample();
        let yaml = record.to_yaml().expect("render yaml");
        assert_eq!(PhenoRecord::from_yaml(&yaml).expect("reparse"), record);
    }

    #[test]
    fn default_record_is_empty() {
        assert!(PhenoRecord::default().is_empty());
        assert!(!sample().is_empty());
    }

    #[test]
    fn cohort_exposes_all_members() {
        let record = PhenoRecord::Cohort(Cohort {
            members: vec![Individual::new("A"), Individual::new("B")],
            ..Cohort::default()
        });
        let ids: Vec<_> = record.subjects().iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["A", "B"]);
    }

    #[test]
    fn reports_path_of_schema_mismatch() {
        let err = PhenoRecord::from_json(r#"{"phenopacket":{"subject":{"id":"P1","sex":"ROBOT"}}}"#)
            .expect_err("should reject unknown sex");
        match err {
            PhenopacketError::Translation(msg) => assert!(msg.contains("subject.sex"), "{msg}"),
            other => panic!("expected Translation error, got {other:?}"),
        }
    }
}
