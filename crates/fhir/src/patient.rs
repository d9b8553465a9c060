//! FHIR-aligned patient resource and wire translation helpers.
//!
//! Responsibilities:
//! - Define the domain-level patient carried in a resource graph
//! - Define the wire model for `resourceType: Patient`
//! - Translate FHIR `date`/`dateTime` birth dates to absolute instants and back
//!
//! Notes:
//! - Only identity, birth date and administrative gender are modelled
//! - Unrecognised gender codes are dropped (with a warning) rather than rejected

use chrono::{DateTime, NaiveDate, NaiveTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Public domain-level types
// ============================================================================

/// FHIR `AdministrativeGender` value set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AdministrativeGender {
    Male,
    Female,
    Other,
    Unknown,
}

impl AdministrativeGender {
    /// Convert to FHIR wire format string.
    pub fn to_wire(self) -> &'static str {
        match self {
            AdministrativeGender::Male => "male",
            AdministrativeGender::Female => "female",
            AdministrativeGender::Other => "other",
            AdministrativeGender::Unknown => "unknown",
        }
    }

    /// Parse from FHIR wire format string (case-insensitive).
    pub fn from_wire(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "male" => Some(AdministrativeGender::Male),
            "female" => Some(AdministrativeGender::Female),
            "other" => Some(AdministrativeGender::Other),
            "unknown" => Some(AdministrativeGender::Unknown),
            _ => None,
        }
    }
}

/// Domain-level patient resource.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Patient {
    /// Logical id of the resource, if the bundle assigned one.
    pub id: Option<String>,

    /// Birth date as an absolute instant. Date-only values land on midnight UTC.
    pub birth_date: Option<DateTime<Utc>>,

    pub gender: Option<AdministrativeGender>,
}

impl Patient {
    /// Create a patient with the given logical id and no other data.
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }

    /// Logical id as a string slice, or `""` when absent.
    pub fn id_str(&self) -> &str {
        self.id.as_deref().unwrap_or("")
    }
}

// ============================================================================
// Wire types (crate-internal)
// ============================================================================

/// Wire representation of a patient resource.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub(crate) struct PatientWire {
    #[serde(rename = "resourceType")]
    pub resource_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,

    #[serde(rename = "birthDate", default, skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,
}

// ============================================================================
// Helper functions
// ============================================================================

pub(crate) fn wire_to_domain(wire: PatientWire) -> Patient {
    let gender = wire.gender.as_deref().and_then(|g| {
        let parsed = AdministrativeGender::from_wire(g);
        if parsed.is_none() {
            tracing::warn!(patient = ?wire.id, gender = g, "unrecognised patient gender - ignoring");
        }
        parsed
    });

    let birth_date = wire.birth_date.as_deref().and_then(|d| {
        let parsed = parse_fhir_date(d);
        if parsed.is_none() {
            tracing::warn!(patient = ?wire.id, birth_date = d, "unparseable patient birthDate - ignoring");
        }
        parsed
    });

    Patient {
        id: wire.id,
        birth_date,
        gender,
    }
}

pub(crate) fn domain_to_wire(patient: &Patient) -> PatientWire {
    PatientWire {
        resource_type: "Patient".to_string(),
        id: patient.id.clone(),
        gender: patient.gender.map(|g| g.to_wire().to_string()),
        birth_date: patient.birth_date.map(render_fhir_date),
    }
}

/// Parse a FHIR `date` (`YYYY`, `YYYY-MM`, `YYYY-MM-DD`) or `dateTime` into an instant.
///
/// Partial dates resolve to the first day of the period at midnight UTC.
pub fn parse_fhir_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();

    if value.contains('T') {
        return DateTime::parse_from_rfc3339(value)
            .ok()
            .map(|dt| dt.with_timezone(&Utc));
    }

    let mut parts = value.splitn(3, '-');
    let year: i32 = parts.next()?.parse().ok()?;
    let month: u32 = match parts.next() {
        Some(m) => m.parse().ok()?,
        None => 1,
    };
    let day: u32 = match parts.next() {
        Some(d) => d.parse().ok()?,
        None => 1,
    };

    NaiveDate::from_ymd_opt(year, month, day).map(|date| date.and_time(NaiveTime::MIN).and_utc())
}

/// Render an instant as a FHIR date, keeping the time part only when it is not midnight UTC.
pub fn render_fhir_date(instant: DateTime<Utc>) -> String {
    if instant.time() == NaiveTime::MIN {
        instant.format("%Y-%m-%d").to_string()
    } else {
        instant.to_rfc3339_opts(SecondsFormat::Secs, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_date() {
        let parsed = parse_fhir_date("1992-03-20").expect("valid date");
        assert_eq!(parsed.to_rfc3339(), "1992-03-20T00:00:00+00:00");
    }

    #[test]
    fn parses_partial_dates() {
        let year = parse_fhir_date("1972").expect("year only");
        assert_eq!(year.format("%Y-%m-%d").to_string(), "1972-01-01");

        let month = parse_fhir_date("1972-12").expect("year and month");
        assert_eq!(month.format("%Y-%m-%d").to_string(), "1972-12-01");
    }

    #[test]
    fn parses_date_time_with_offset() {
        let parsed = parse_fhir_date("1972-12-03T11:15:30+01:00").expect("valid dateTime");
        assert_eq!(parsed.timestamp(), 92225730);
    }

    #[test]
    fn rejects_garbage_dates() {
        assert!(parse_fhir_date("not-a-date").is_none());
        assert!(parse_fhir_date("1972-13-01").is_none());
        assert!(parse_fhir_date("").is_none());
    }

    #[test]
    fn renders_midnight_as_date_only() {
        let instant = parse_fhir_date("1992-03-20").expect("valid date");
        assert_eq!(render_fhir_date(instant), "1992-03-20");

        let instant = parse_fhir_date("1972-12-03T10:15:30Z").expect("valid dateTime");
        assert_eq!(render_fhir_date(instant), "1972-12-03T10:15:30Z");
    }

    #[test]
    fn unknown_gender_is_dropped() {
        let wire = PatientWire {
            resource_type: "Patient".into(),
            id: Some("P1".into()),
            gender: Some("robot".into()),
            birth_date: None,
        };
        let patient = wire_to_domain(wire);
        assert_eq!(patient.id_str(), "P1");
        assert!(patient.gender.is_none());
    }

    #[test]
    fn gender_round_trips_through_wire() {
        let patient = Patient {
            id: Some("P1".into()),
            birth_date: parse_fhir_date("1972-12-03T10:15:30Z"),
            gender: Some(AdministrativeGender::Female),
        };

        let wire = domain_to_wire(&patient);
        assert_eq!(wire.gender.as_deref(), Some("female"));
        assert_eq!(wire.birth_date.as_deref(), Some("1972-12-03T10:15:30Z"));
        assert_eq!(wire_to_domain(wire), patient);
    }
}
