//! Shared phenopacket data types.

use serde::{Deserialize, Serialize};

/// A term in an external ontology, identified by a CURIE such as `HP:0001250`.
///
/// The default value (empty id and label) stands for "no concept".
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OntologyClass {
    /// Namespaced identifier, `<prefix>:<code>` by convention.
    #[serde(default)]
    pub id: String,

    /// Human-readable label.
    #[serde(default)]
    pub label: String,
}

impl OntologyClass {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }

    /// Whether both id and label are empty.
    pub fn is_empty(&self) -> bool {
        self.id.is_empty() && self.label.is_empty()
    }
}

impl std::fmt::Display for OntologyClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.label.is_empty() {
            write!(f, "{}", self.id)
        } else {
            write!(f, "{} ({})", self.id, self.label)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_empty() {
        assert!(OntologyClass::default().is_empty());
        assert!(!OntologyClass::new("", "congenital").is_empty());
    }

    #[test]
    fn display_includes_label_when_present() {
        assert_eq!(
            OntologyClass::new("HP:0001250", "Seizure").to_string(),
            "HP:0001250 (Seizure)"
        );
        assert_eq!(OntologyClass::new("HP:0001250", "").to_string(), "HP:0001250");
    }
}
