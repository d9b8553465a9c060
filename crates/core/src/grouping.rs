//! Resource classification and subject-reference resolution.
//!
//! A bundle is an unordered bag of resources linked by literal references. Grouping partitions
//! it by [`ResourceKind`] (encounter order is preserved inside each group) and binds every
//! condition to the subject it refers to. Conditions whose subject cannot be found in the
//! bundle are dropped: FHIR allows references to resources held elsewhere, so this is a soft
//! skip rather than an error.
//!
//! Every patient gets a subject key: its logical id, else its entry `fullUrl`, else a key
//! derived from its entry position. Patients sharing a key describe the same person.

use fhir::{BundleEntry, Condition, OtherResource, Patient, Resource, ResourceKind, Specimen};
use std::collections::HashMap;

/// A patient resource together with the key that identifies its subject.
#[derive(Clone, Debug, PartialEq)]
pub struct SubjectEntry<'a> {
    pub patient: &'a Patient,
    pub key: String,
}

/// A condition bound to the key of the subject it describes.
#[derive(Clone, Debug, PartialEq)]
pub struct ConditionLink<'a> {
    pub condition: &'a Condition,
    pub subject_key: String,
}

/// Resources of one bundle, partitioned by kind.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResourceGroups<'a> {
    pub subjects: Vec<SubjectEntry<'a>>,
    /// Only conditions whose subject resolved.
    pub conditions: Vec<ConditionLink<'a>>,
    pub specimens: Vec<&'a Specimen>,
    pub others: Vec<&'a OtherResource>,
}

impl ResourceGroups<'_> {
    /// Number of resources kept for `kind`.
    pub fn len(&self, kind: ResourceKind) -> usize {
        match kind {
            ResourceKind::Patient => self.subjects.len(),
            ResourceKind::Condition => self.conditions.len(),
            ResourceKind::Specimen => self.specimens.len(),
            ResourceKind::Other => self.others.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.subjects.is_empty()
            && self.conditions.is_empty()
            && self.specimens.is_empty()
            && self.others.is_empty()
    }
}

/// Partition `entries` and resolve condition subjects.
pub fn group(entries: &[BundleEntry]) -> ResourceGroups<'_> {
    let mut groups = ResourceGroups::default();
    let mut index = SubjectIndex::default();

    // Subjects first, so a condition may precede the patient it refers to.
    for (position, entry) in entries.iter().enumerate() {
        if let Resource::Patient(patient) = &entry.resource {
            let full_url = entry.full_url.as_deref().filter(|url| !url.is_empty());
            let key = subject_key(patient, full_url, position);
            index.insert(full_url, patient, &key);
            groups.subjects.push(SubjectEntry { patient, key });
        }
    }

    for entry in entries {
        match &entry.resource {
            Resource::Patient(_) => {}
            Resource::Condition(condition) => {
                if let Some(link) = link_condition(&index, condition) {
                    groups.conditions.push(link);
                }
            }
            Resource::Specimen(specimen) => groups.specimens.push(specimen),
            Resource::Other(other) => groups.others.push(other),
        }
    }

    tracing::debug!(
        subjects = groups.subjects.len(),
        conditions = groups.conditions.len(),
        specimens = groups.specimens.len(),
        others = groups.others.len(),
        "grouped bundle resources"
    );

    groups
}

/// Logical id, else `fullUrl`, else `patient-<entry position>`.
fn subject_key(patient: &Patient, full_url: Option<&str>, position: usize) -> String {
    match (patient.id_str(), full_url) {
        ("", Some(url)) => url.to_string(),
        ("", None) => format!("patient-{position}"),
        (id, _) => id.to_string(),
    }
}

fn link_condition<'a>(
    index: &SubjectIndex,
    condition: &'a Condition,
) -> Option<ConditionLink<'a>> {
    let Some(reference) = condition.subject_reference() else {
        tracing::warn!(
            condition = condition.id.as_deref().unwrap_or(""),
            "condition has no subject reference - skipping"
        );
        return None;
    };

    match index.resolve(reference) {
        Some(subject_key) => Some(ConditionLink {
            condition,
            subject_key: subject_key.to_string(),
        }),
        None => {
            tracing::warn!(
                condition = condition.id.as_deref().unwrap_or(""),
                reference,
                "unresolved subject reference - skipping condition"
            );
            None
        }
    }
}

/// Lookup from the ways a patient can be referenced to its subject key.
#[derive(Default)]
struct SubjectIndex {
    keys: HashMap<String, String>,
}

impl SubjectIndex {
    fn insert(&mut self, full_url: Option<&str>, patient: &Patient, key: &str) {
        let id = patient.id_str();

        if let Some(url) = full_url {
            self.keys.insert(url.to_string(), key.to_string());
        }
        if !id.is_empty() {
            self.keys.insert(format!("Patient/{id}"), key.to_string());
            self.keys
                .entry(id.to_string())
                .or_insert_with(|| key.to_string());
        }
    }

    /// Accepts `fullUrl` values, `Patient/<id>`, bare ids, and absolute URLs ending in
    /// `/Patient/<id>`. Version-specific references (`.../_history/<v>`) resolve to the
    /// unversioned resource.
    fn resolve(&self, reference: &str) -> Option<&str> {
        let reference = match reference.find("/_history/") {
            Some(split) => &reference[..split],
            None => reference,
        };

        if let Some(key) = self.keys.get(reference) {
            return Some(key);
        }

        reference
            .rfind("/Patient/")
            .and_then(|split| self.keys.get(&reference[split + 1..]))
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fhir::Reference;

    fn condition_for(id: &str, reference: Option<&str>) -> Condition {
        Condition {
            id: Some(id.into()),
            subject: reference.map(Reference::new),
            ..Condition::default()
        }
    }

    #[test]
    fn groups_by_kind_in_encounter_order() {
        let entries = vec![
            BundleEntry::new(Patient::with_id("P1")),
            BundleEntry::new(Resource::Other(OtherResource {
                resource_type: "Observation".into(),
                id: Some("O1".into()),
            })),
            BundleEntry::new(condition_for("C1", Some("Patient/P1"))),
            BundleEntry::new(Patient::with_id("P2")),
            BundleEntry::new(condition_for("C2", Some("Patient/P2"))),
            BundleEntry::new(Specimen::default()),
        ];

        let groups = group(&entries);
        let subject_keys: Vec<_> = groups.subjects.iter().map(|s| s.key.as_str()).collect();
        assert_eq!(subject_keys, vec!["P1", "P2"]);

        let links: Vec<_> = groups
            .conditions
            .iter()
            .map(|l| (l.condition.id.as_deref(), l.subject_key.as_str()))
            .collect();
        assert_eq!(links, vec![(Some("C1"), "P1"), (Some("C2"), "P2")]);

        assert_eq!(groups.len(ResourceKind::Specimen), 1);
        assert_eq!(groups.len(ResourceKind::Other), 1);
    }

    #[test]
    fn condition_before_subject_still_resolves() {
        let entries = vec![
            BundleEntry::new(condition_for("C1", Some("Patient/P1"))),
            BundleEntry::new(Patient::with_id("P1")),
        ];

        let groups = group(&entries);
        assert_eq!(groups.conditions.len(), 1);
    }

    #[test]
    fn resolves_full_url_absolute_and_versioned_references() {
        let mut entries = vec![BundleEntry {
            full_url: Some("urn:uuid:6f1c".into()),
            resource: Patient::with_id("P1").into(),
        }];
        for reference in [
            "urn:uuid:6f1c",
            "P1",
            "http://fhir.example.org/base/Patient/P1",
            "Patient/P1/_history/3",
        ] {
            entries.push(BundleEntry::new(condition_for(reference, Some(reference))));
        }

        let groups = group(&entries);
        assert_eq!(groups.conditions.len(), 4);
        assert!(groups.conditions.iter().all(|l| l.subject_key == "P1"));
    }

    #[test]
    fn patients_without_id_are_keyed_by_full_url_then_position() {
        let entries = vec![
            BundleEntry {
                full_url: Some("urn:uuid:a".into()),
                resource: Patient::default().into(),
            },
            BundleEntry {
                full_url: Some("urn:uuid:b".into()),
                resource: Patient::default().into(),
            },
            BundleEntry::new(Patient::default()),
            BundleEntry::new(condition_for("C1", Some("urn:uuid:b"))),
            BundleEntry::new(condition_for("C2", Some("urn:uuid:a"))),
            BundleEntry::new(condition_for("C3", Some("Patient/"))),
        ];

        let groups = group(&entries);
        let keys: Vec<_> = groups.subjects.iter().map(|s| s.key.as_str()).collect();
        assert_eq!(keys, vec!["urn:uuid:a", "urn:uuid:b", "patient-2"]);

        let links: Vec<_> = groups
            .conditions
            .iter()
            .map(|l| (l.condition.id.as_deref(), l.subject_key.as_str()))
            .collect();
        assert_eq!(
            links,
            vec![(Some("C1"), "urn:uuid:b"), (Some("C2"), "urn:uuid:a")]
        );
    }

    #[test]
    fn drops_unresolved_and_missing_subjects() {
        let entries = vec![
            BundleEntry::new(Patient::with_id("P1")),
            BundleEntry::new(condition_for("C1", Some("Patient/elsewhere"))),
            BundleEntry::new(condition_for("C2", None)),
        ];

        let groups = group(&entries);
        assert!(groups.conditions.is_empty());
        assert_eq!(groups.subjects.len(), 1);
    }

    #[test]
    fn empty_bundle_groups_to_nothing() {
        assert!(group(&[]).is_empty());
    }
}
