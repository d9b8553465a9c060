//! Provenance metadata: who created a record, when, and which coding systems it references.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A coding system referenced by a record.
///
/// Two resources describing the same system compare equal, which is what makes them
/// deduplicate in the metadata resource list.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    /// Internal id, the lower-cased namespace prefix (e.g. `hp`).
    pub id: String,

    /// Human-readable name of the system, empty when not known.
    #[serde(default)]
    pub name: String,

    /// Namespace prefix used in CURIEs (e.g. `HP`).
    pub namespace_prefix: String,

    /// Source URL of the system, carried verbatim.
    #[serde(default)]
    pub url: String,

    /// Empty when the source did not state a version.
    #[serde(default)]
    pub version: String,
}

/// Record-level provenance.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub created_by: String,

    /// Distinct coding systems in first-seen order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resources: Vec<Resource>,
}

impl MetaData {
    /// Whether this is the default "no provenance" value.
    pub fn is_empty(&self) -> bool {
        self.created.is_none() && self.created_by.is_empty() && self.resources.is_empty()
    }
}
