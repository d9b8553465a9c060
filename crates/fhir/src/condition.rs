//! FHIR-aligned condition resource and wire translation helpers.
//!
//! A condition is the bundle-side carrier of a clinical finding: a coded concept, an optional
//! severity, an optional onset and an optional verification status, all attached to a subject
//! through a [`Reference`].
//!
//! Notes:
//! - `onset[x]` is a choice type on the wire (`onsetString`, `onsetDateTime`, `onsetAge`,
//!   `onsetPeriod`) and becomes the closed [`Onset`] enum here
//! - `verificationStatus` is accepted both as an R4 `CodeableConcept` and as a DSTU3 plain code

use crate::datatypes::{CodeableConcept, Coding, Reference};
use crate::patient::{parse_fhir_date, render_fhir_date};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// System URL of the HL7 condition verification status code system.
pub const CONDITION_VER_STATUS_SYSTEM: &str =
    "http://terminology.hl7.org/CodeSystem/condition-ver-status";

// ============================================================================
// Public domain-level types
// ============================================================================

/// Estimated or actual onset of a condition.
#[derive(Clone, Debug, PartialEq)]
pub enum Onset {
    /// Free-text onset description.
    String(String),
    DateTime(DateTime<Utc>),
    /// Age at onset.
    Age { value: f64, unit: Option<String> },
    Period {
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    },
}

/// Domain-level condition resource.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Condition {
    pub id: Option<String>,

    /// Identification of the condition, problem or diagnosis.
    pub code: Option<CodeableConcept>,

    /// Subjective severity of the condition.
    pub severity: Option<CodeableConcept>,

    pub onset: Option<Onset>,

    /// `unconfirmed | provisional | differential | confirmed | refuted | entered-in-error`.
    pub verification_status: Option<CodeableConcept>,

    /// Who has the condition.
    pub subject: Option<Reference>,
}

impl Condition {
    /// Whether the verification status explicitly refutes the condition.
    pub fn is_refuted(&self) -> bool {
        self.verification_status
            .as_ref()
            .map(|status| {
                status
                    .coding
                    .iter()
                    .any(|c| c.code_str().eq_ignore_ascii_case("refuted"))
            })
            .unwrap_or(false)
    }

    /// A verification status that marks the condition as refuted.
    pub fn refuted_status() -> CodeableConcept {
        CodeableConcept::from_coding(Coding::new(
            CONDITION_VER_STATUS_SYSTEM,
            "refuted",
            "Refuted",
        ))
    }

    /// The literal subject reference, if any.
    pub fn subject_reference(&self) -> Option<&str> {
        self.subject.as_ref().and_then(|s| s.reference.as_deref())
    }
}

// ============================================================================
// Wire types (crate-internal)
// ============================================================================

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub(crate) struct ConditionWire {
    #[serde(rename = "resourceType")]
    pub resource_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<CodeableConcept>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<CodeableConcept>,

    #[serde(rename = "onsetString", default, skip_serializing_if = "Option::is_none")]
    pub onset_string: Option<String>,

    #[serde(rename = "onsetDateTime", default, skip_serializing_if = "Option::is_none")]
    pub onset_date_time: Option<String>,

    #[serde(rename = "onsetAge", default, skip_serializing_if = "Option::is_none")]
    pub onset_age: Option<AgeWire>,

    #[serde(rename = "onsetPeriod", default, skip_serializing_if = "Option::is_none")]
    pub onset_period: Option<PeriodWire>,

    #[serde(
        rename = "verificationStatus",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub verification_status: Option<VerificationStatusWire>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<Reference>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub(crate) struct AgeWire {
    pub value: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub(crate) struct PeriodWire {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
}

/// R4 uses a CodeableConcept, DSTU3 a bare code.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub(crate) enum VerificationStatusWire {
    Concept(CodeableConcept),
    Code(String),
}

// ============================================================================
// Helper functions
// ============================================================================

pub(crate) fn wire_to_domain(wire: ConditionWire) -> Condition {
    let onset = if let Some(text) = wire.onset_string {
        Some(Onset::String(text))
    } else if let Some(dt) = wire.onset_date_time.as_deref().and_then(parse_fhir_date) {
        Some(Onset::DateTime(dt))
    } else if let Some(age) = wire.onset_age {
        Some(Onset::Age {
            value: age.value,
            unit: age.unit,
        })
    } else {
        wire.onset_period.map(|p| Onset::Period {
            start: p.start.as_deref().and_then(parse_fhir_date),
            end: p.end.as_deref().and_then(parse_fhir_date),
        })
    };

    let verification_status = wire.verification_status.map(|status| match status {
        VerificationStatusWire::Concept(concept) => concept,
        VerificationStatusWire::Code(code) => CodeableConcept::from_coding(Coding {
            system: Some(CONDITION_VER_STATUS_SYSTEM.to_string()),
            code: Some(code),
            ..Coding::default()
        }),
    });

    Condition {
        id: wire.id,
        code: wire.code,
        severity: wire.severity,
        onset,
        verification_status,
        subject: wire.subject,
    }
}

pub(crate) fn domain_to_wire(condition: &Condition) -> ConditionWire {
    let mut wire = ConditionWire {
        resource_type: "Condition".to_string(),
        id: condition.id.clone(),
        code: condition.code.clone(),
        severity: condition.severity.clone(),
        onset_string: None,
        onset_date_time: None,
        onset_age: None,
        onset_period: None,
        verification_status: condition
            .verification_status
            .clone()
            .map(VerificationStatusWire::Concept),
        subject: condition.subject.clone(),
    };

    match &condition.onset {
        Some(Onset::String(text)) => wire.onset_string = Some(text.clone()),
        Some(Onset::DateTime(dt)) => wire.onset_date_time = Some(render_fhir_date(*dt)),
        Some(Onset::Age { value, unit }) => {
            wire.onset_age = Some(AgeWire {
                value: *value,
                unit: unit.clone(),
            })
        }
        Some(Onset::Period { start, end }) => {
            wire.onset_period = Some(PeriodWire {
                start: start.map(render_fhir_date),
                end: end.map(render_fhir_date),
            })
        }
        None => {}
    }

    wire
}
