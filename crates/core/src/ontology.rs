//! Ontology-class mapping between FHIR codings and phenopacket concepts.
//!
//! Forward mapping is total: a coding with neither code nor display becomes the empty
//! [`OntologyClass`]. Reverse mapping needs a coding-system URL, which is looked up in the
//! namespace table by prefix before falling back to the caller's per-field default.

use crate::registry::{namespace_prefix, CodingRegistry};
use fhir::{CodeableConcept, Coding};
use phenopackets::OntologyClass;

/// Map a single coding to an ontology class. The raw code becomes the class id verbatim.
pub fn to_ontology_class(coding: &Coding) -> OntologyClass {
    OntologyClass::new(
        coding.code.as_deref().unwrap_or_default(),
        coding.display.as_deref().unwrap_or_default(),
    )
}

/// Map the first representative coding of a concept.
///
/// Further codings for the same field are ignored. Returns `None` for a concept with no
/// codings at all.
pub fn concept_to_ontology_class(concept: &CodeableConcept) -> Option<OntologyClass> {
    concept.first_coding().map(to_ontology_class)
}

/// Reverse mapper from ontology classes to FHIR codings.
#[derive(Clone, Copy, Debug)]
pub struct OntologyMapper<'a> {
    registry: CodingRegistry<'a>,
}

impl<'a> OntologyMapper<'a> {
    pub fn new(registry: CodingRegistry<'a>) -> Self {
        Self { registry }
    }

    /// Expand a class into a coding.
    ///
    /// The system URL comes from the namespace table when the class prefix is registered,
    /// otherwise from `fallback_system`. With neither, the coding is emitted without a system
    /// and a warning is logged; the code and display are always kept.
    pub fn to_coding(&self, class: &OntologyClass, fallback_system: Option<&str>) -> Coding {
        if class.is_empty() {
            return Coding::default();
        }

        let system = match self.registry.system_for(&class.id) {
            Some(url) => Some(url.to_string()),
            None => match fallback_system {
                Some(url) => Some(url.to_string()),
                None => {
                    tracing::warn!(
                        code = %class.id,
                        prefix = namespace_prefix(&class.id),
                        "unknown namespace prefix - coding emitted without system"
                    );
                    None
                }
            },
        };

        Coding {
            system,
            version: None,
            code: non_empty(&class.id),
            display: non_empty(&class.label),
        }
    }

    /// Expand a class into a single-coding concept.
    pub fn to_concept(
        &self,
        class: &OntologyClass,
        fallback_system: Option<&str>,
    ) -> CodeableConcept {
        CodeableConcept::from_coding(self.to_coding(class, fallback_system))
    }
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::HPO_SYSTEM;
    use crate::registry::NamespaceTable;

    #[test]
    fn maps_code_and_display() {
        let coding = Coding::new(HPO_SYSTEM, "HP:0001250", "Seizure");
        assert_eq!(
            to_ontology_class(&coding),
            OntologyClass::new("HP:0001250", "Seizure")
        );
    }

    #[test]
    fn empty_coding_maps_to_empty_class() {
        let class = to_ontology_class(&Coding::default());
        assert!(class.is_empty());
        assert_eq!(class, OntologyClass::default());
    }

    #[test]
    fn concept_uses_first_representative() {
        let concept = CodeableConcept {
            coding: vec![
                Coding::new(HPO_SYSTEM, "HP:0001250", "Seizure"),
                Coding::new("http://snomed.info/sct", "91175000", "Seizure"),
            ],
            text: None,
        };
        let class = concept_to_ontology_class(&concept).expect("has coding");
        assert_eq!(class.id, "HP:0001250");

        assert_eq!(concept_to_ontology_class(&CodeableConcept::default()), None);
    }

    #[test]
    fn ontology_class_prefix_matches_registry_prefix() {
        let table = NamespaceTable::default();
        let registry = CodingRegistry::new(&table);

        for (system, code) in [
            (HPO_SYSTEM, "HP:0001250"),
            ("http://example.org/x", "X_42"),
            ("http://snomed.info/sct", "91175000"),
            ("http://example.org/y", "lower:case"),
        ] {
            let coding = Coding::new(system, code, "");
            let class = to_ontology_class(&coding);
            let resource = registry.register_or_lookup(system, code, None);
            assert_eq!(namespace_prefix(&class.id), resource.namespace_prefix);
        }
    }

    #[test]
    fn reverse_prefers_namespace_table() {
        let table = NamespaceTable::default();
        let mapper = OntologyMapper::new(CodingRegistry::new(&table));

        let coding = mapper.to_coding(
            &OntologyClass::new("MONDO:0007739", "Huntington disease"),
            Some(HPO_SYSTEM),
        );
        assert_eq!(
            coding.system.as_deref(),
            Some("http://purl.obolibrary.org/obo/mondo.owl")
        );
        assert_eq!(coding.code.as_deref(), Some("MONDO:0007739"));
        assert_eq!(coding.display.as_deref(), Some("Huntington disease"));
    }

    #[test]
    fn reverse_uses_fallback_for_unknown_prefix() {
        let table = NamespaceTable::default();
        let mapper = OntologyMapper::new(CodingRegistry::new(&table));

        let coding = mapper.to_coding(&OntologyClass::new("ORPHA:558", ""), Some(HPO_SYSTEM));
        assert_eq!(coding.system.as_deref(), Some(HPO_SYSTEM));
        assert_eq!(coding.display, None);
    }

    #[test]
    fn reverse_without_system_keeps_code() {
        let table = NamespaceTable::empty();
        let mapper = OntologyMapper::new(CodingRegistry::new(&table));

        let coding = mapper.to_coding(&OntologyClass::new("ORPHA:558", "Marfan"), None);
        assert_eq!(coding.system, None);
        assert_eq!(coding.code.as_deref(), Some("ORPHA:558"));
    }

    #[test]
    fn reverse_of_empty_class_is_empty_coding() {
        let table = NamespaceTable::default();
        let mapper = OntologyMapper::new(CodingRegistry::new(&table));
        assert_eq!(
            mapper.to_coding(&OntologyClass::default(), Some(HPO_SYSTEM)),
            Coding::default()
        );
    }
}
