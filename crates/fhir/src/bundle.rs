//! FHIR bundle: the unit of exchange carrying a heterogeneous resource collection.
//!
//! Responsibilities:
//! - Define the closed [`Resource`] variant over the supported resource kinds
//! - Parse a wire bundle (JSON or YAML) into an in-memory resource graph
//! - Render a resource graph back to wire JSON or YAML
//!
//! Notes:
//! - The bundle envelope is strict: a malformed envelope fails with the path to the bad field
//! - Individual resources are lenient: one undecodable resource is kept as
//!   [`Resource::Other`] and logged, it never fails the whole bundle

use crate::condition::{self, Condition, ConditionWire};
use crate::patient::{self, Patient, PatientWire};
use crate::specimen::{self, Specimen, SpecimenWire};
use crate::{FhirError, FhirResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================================================
// Public domain-level types
// ============================================================================

/// Closed set of resource kinds the mapper understands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceKind {
    Patient,
    Condition,
    Specimen,
    Other,
}

impl ResourceKind {
    /// Classify a wire `resourceType`.
    pub fn from_resource_type(resource_type: &str) -> Self {
        match resource_type {
            "Patient" => ResourceKind::Patient,
            "Condition" => ResourceKind::Condition,
            "Specimen" => ResourceKind::Specimen,
            _ => ResourceKind::Other,
        }
    }
}

/// A resource of a kind the mapper does not interpret. Kept so nothing is silently lost.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OtherResource {
    pub resource_type: String,
    pub id: Option<String>,
}

/// One resource in a bundle.
#[derive(Clone, Debug, PartialEq)]
pub enum Resource {
    Patient(Patient),
    Condition(Condition),
    Specimen(Specimen),
    Other(OtherResource),
}

impl Resource {
    pub fn kind(&self) -> ResourceKind {
        match self {
            Resource::Patient(_) => ResourceKind::Patient,
            Resource::Condition(_) => ResourceKind::Condition,
            Resource::Specimen(_) => ResourceKind::Specimen,
            Resource::Other(_) => ResourceKind::Other,
        }
    }

    /// Logical id of the resource, if any.
    pub fn id(&self) -> Option<&str> {
        match self {
            Resource::Patient(p) => p.id.as_deref(),
            Resource::Condition(c) => c.id.as_deref(),
            Resource::Specimen(s) => s.id.as_deref(),
            Resource::Other(o) => o.id.as_deref(),
        }
    }
}

impl From<Patient> for Resource {
    fn from(value: Patient) -> Self {
        Resource::Patient(value)
    }
}

impl From<Condition> for Resource {
    fn from(value: Condition) -> Self {
        Resource::Condition(value)
    }
}

impl From<Specimen> for Resource {
    fn from(value: Specimen) -> Self {
        Resource::Specimen(value)
    }
}

/// Bundle `type` value set.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BundleType {
    Document,
    Message,
    Transaction,
    TransactionResponse,
    Batch,
    BatchResponse,
    History,
    Searchset,
    Collection,
}

impl BundleType {
    fn to_wire(self) -> &'static str {
        match self {
            BundleType::Document => "document",
            BundleType::Message => "message",
            BundleType::Transaction => "transaction",
            BundleType::TransactionResponse => "transaction-response",
            BundleType::Batch => "batch",
            BundleType::BatchResponse => "batch-response",
            BundleType::History => "history",
            BundleType::Searchset => "searchset",
            BundleType::Collection => "collection",
        }
    }

    fn from_wire(s: &str) -> Option<Self> {
        match s {
            "document" => Some(BundleType::Document),
            "message" => Some(BundleType::Message),
            "transaction" => Some(BundleType::Transaction),
            "transaction-response" => Some(BundleType::TransactionResponse),
            "batch" => Some(BundleType::Batch),
            "batch-response" => Some(BundleType::BatchResponse),
            "history" => Some(BundleType::History),
            "searchset" => Some(BundleType::Searchset),
            "collection" => Some(BundleType::Collection),
            _ => None,
        }
    }
}

/// A bundle entry: the resource plus the absolute URL it is known by inside the bundle.
#[derive(Clone, Debug, PartialEq)]
pub struct BundleEntry {
    pub full_url: Option<String>,
    pub resource: Resource,
}

impl BundleEntry {
    pub fn new(resource: impl Into<Resource>) -> Self {
        Self {
            full_url: None,
            resource: resource.into(),
        }
    }
}

/// In-memory bundle: an ordered collection of resources.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Bundle {
    pub bundle_type: Option<BundleType>,
    pub entries: Vec<BundleEntry>,
}

impl Bundle {
    /// A `collection` bundle over the given resources, in order.
    pub fn collection<I, R>(resources: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<Resource>,
    {
        Self {
            bundle_type: Some(BundleType::Collection),
            entries: resources.into_iter().map(BundleEntry::new).collect(),
        }
    }

    /// Iterate over the resources in entry order.
    pub fn resources(&self) -> impl Iterator<Item = &Resource> {
        self.entries.iter().map(|e| &e.resource)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parse a bundle from FHIR JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`FhirError`] if:
    /// - the text is not JSON or the envelope does not match the bundle schema,
    /// - `resourceType` is not `"Bundle"`.
    pub fn from_json(json_text: &str) -> FhirResult<Self> {
        let mut deserializer = serde_json::Deserializer::from_str(json_text);
        let wire: BundleWire = decode(&mut deserializer, "Bundle")?;
        deserializer.end()?;
        wire_to_domain(wire)
    }

    /// Parse a bundle from YAML text using the FHIR JSON field names.
    pub fn from_yaml(yaml_text: &str) -> FhirResult<Self> {
        let deserializer = serde_yaml::Deserializer::from_str(yaml_text);
        let wire: BundleWire = decode(deserializer, "Bundle")?;
        wire_to_domain(wire)
    }

    /// Render the bundle as pretty-printed FHIR JSON.
    pub fn to_json(&self) -> FhirResult<String> {
        Ok(serde_json::to_string_pretty(&domain_to_wire(self))?)
    }

    /// Render the bundle as YAML.
    pub fn to_yaml(&self) -> FhirResult<String> {
        Ok(serde_yaml::to_string(&domain_to_wire(self))?)
    }
}

// ============================================================================
// Wire types (internal)
// ============================================================================

#[derive(Clone, Debug, Deserialize, Serialize)]
struct BundleWire {
    #[serde(rename = "resourceType")]
    resource_type: String,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    bundle_type: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    entry: Vec<EntryWire>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
struct EntryWire {
    #[serde(rename = "fullUrl", default, skip_serializing_if = "Option::is_none")]
    full_url: Option<String>,

    /// Kept untyped until the resource kind is known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    resource: Option<Value>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(untagged)]
enum ResourceWire {
    Patient(PatientWire),
    Condition(ConditionWire),
    Specimen(SpecimenWire),
    Other(OtherWire),
}

#[derive(Clone, Debug, Serialize)]
struct OtherWire {
    #[serde(rename = "resourceType")]
    resource_type: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<String>,
}

// ============================================================================
// Helper functions (internal)
// ============================================================================

/// Deserialise with `serde_path_to_error`, surfacing the failing path (e.g. `entry.2.fullUrl`).
fn decode<'de, D, T>(deserializer: D, what: &str) -> FhirResult<T>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    serde_path_to_error::deserialize(deserializer).map_err(|err| {
        let path = err.path().to_string();
        let source = err.into_inner();
        let path = if path.is_empty() || path == "." {
            "<root>"
        } else {
            path.as_str()
        };
        FhirError::Translation(format!("{what} schema mismatch at {path}: {source}"))
    })
}

fn decode_value<T: DeserializeOwned>(value: Value, what: &str) -> FhirResult<T> {
    decode(value, what)
}

fn wire_to_domain(wire: BundleWire) -> FhirResult<Bundle> {
    if wire.resource_type != "Bundle" {
        return Err(FhirError::InvalidInput(format!(
            "Expected resourceType 'Bundle', got '{}'",
            wire.resource_type
        )));
    }

    let bundle_type = wire.bundle_type.as_deref().and_then(|t| {
        let parsed = BundleType::from_wire(t);
        if parsed.is_none() {
            tracing::warn!(bundle_type = t, "unrecognised bundle type - ignoring");
        }
        parsed
    });

    let mut entries = Vec::with_capacity(wire.entry.len());
    for (index, entry) in wire.entry.into_iter().enumerate() {
        let Some(value) = entry.resource else {
            tracing::warn!(entry = index, "bundle entry has no resource - skipping");
            continue;
        };
        entries.push(BundleEntry {
            full_url: entry.full_url,
            resource: decode_resource(value, index),
        });
    }

    Ok(Bundle {
        bundle_type,
        entries,
    })
}

fn decode_resource(value: Value, index: usize) -> Resource {
    let resource_type = value
        .get("resourceType")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let id = value.get("id").and_then(Value::as_str).map(str::to_string);

    let decoded = match ResourceKind::from_resource_type(&resource_type) {
        ResourceKind::Patient => decode_value::<PatientWire>(value, "Patient")
            .map(|w| Resource::Patient(patient::wire_to_domain(w))),
        ResourceKind::Condition => decode_value::<ConditionWire>(value, "Condition")
            .map(|w| Resource::Condition(condition::wire_to_domain(w))),
        ResourceKind::Specimen => decode_value::<SpecimenWire>(value, "Specimen")
            .map(|w| Resource::Specimen(specimen::wire_to_domain(w))),
        ResourceKind::Other => {
            tracing::debug!(entry = index, resource_type = %resource_type, "keeping unsupported resource as opaque");
            return Resource::Other(OtherResource { resource_type, id });
        }
    };

    decoded.unwrap_or_else(|err| {
        tracing::warn!(entry = index, error = %err, "undecodable resource - keeping as opaque");
        Resource::Other(OtherResource { resource_type, id })
    })
}

fn domain_to_wire(bundle: &Bundle) -> BundleWire {
    let entry = bundle
        .entries
        .iter()
        .map(|entry| {
            let resource = match &entry.resource {
                Resource::Patient(p) => ResourceWire::Patient(patient::domain_to_wire(p)),
                Resource::Condition(c) => ResourceWire::Condition(condition::domain_to_wire(c)),
                Resource::Specimen(s) => ResourceWire::Specimen(specimen::domain_to_wire(s)),
                Resource::Other(o) => ResourceWire::Other(OtherWire {
                    resource_type: o.resource_type.clone(),
                    id: o.id.clone(),
                }),
            };
            EntryWire {
                full_url: entry.full_url.clone(),
                // Serialising our own wire structs into a Value cannot fail.
                resource: serde_json::to_value(resource).ok(),
            }
        })
        .collect();

    BundleWire {
        resource_type: "Bundle".to_string(),
        bundle_type: bundle.bundle_type.map(|t| t.to_wire().to_string()),
        entry,
    }
}
