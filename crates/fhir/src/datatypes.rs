//! FHIR general-purpose data types used by the supported resources.
//!
//! Only the subset of `Coding`, `CodeableConcept` and `Reference` that the phenopacket mapping
//! needs is modelled. Unknown wire fields are ignored on input.

use serde::{Deserialize, Serialize};

/// A reference to a code defined by a terminology system.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coding {
    /// Identity of the terminology system (a URL).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    /// Version of the system, if relevant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Symbol in syntax defined by the system.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    /// Representation defined by the system.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

impl Coding {
    /// Build a coding from system, code and display text.
    pub fn new(
        system: impl Into<String>,
        code: impl Into<String>,
        display: impl Into<String>,
    ) -> Self {
        Self {
            system: Some(system.into()),
            version: None,
            code: Some(code.into()),
            display: Some(display.into()),
        }
    }

    /// Code as a string slice, or `""` when absent.
    pub fn code_str(&self) -> &str {
        self.code.as_deref().unwrap_or("")
    }

    /// Whether the coding carries a non-empty code.
    pub fn has_code(&self) -> bool {
        !self.code_str().is_empty()
    }
}

/// A concept that may be defined by one or more codings, plus optional free text.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeableConcept {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub coding: Vec<Coding>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl CodeableConcept {
    /// A concept with exactly one coding.
    pub fn from_coding(coding: Coding) -> Self {
        Self {
            coding: vec![coding],
            text: None,
        }
    }

    /// The first coding, used as the representative when several are present.
    pub fn first_coding(&self) -> Option<&Coding> {
        self.coding.first()
    }
}

/// A reference from one resource to another.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    /// Literal reference: relative (`Patient/123`), absolute URL, or `urn:uuid:` form.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

impl Reference {
    pub fn new(reference: impl Into<String>) -> Self {
        Self {
            reference: Some(reference.into()),
            display: None,
        }
    }

    /// Reference pointing at a patient by logical id.
    pub fn to_patient(id: &str) -> Self {
        Self::new(format!("Patient/{id}"))
    }
}
