//! Coding registry: CURIE prefixes, coding-system URLs and provenance resources.
//!
//! Two responsibilities live here, and only here:
//! - deriving a namespace prefix from a raw code (`HP:0001250` -> `HP`)
//! - translating between prefixes and coding-system URLs through a [`NamespaceTable`]
//!
//! Prefix derivation is a best-effort heuristic, not a CURIE parser. Keeping it behind this
//! module means it can be replaced by a real prefix registry without touching extraction code.

use crate::constants::{
    HPO_SYSTEM, MONDO_SYSTEM, NCIT_SYSTEM, PATO_SYSTEM, PATO_VERSION, SNOMED_CT_SYSTEM,
    UBERON_SYSTEM,
};
use crate::{ConvertError, ConvertResult};
use phenopackets::Resource;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Derive the namespace prefix of a code.
///
/// The prefix is everything before the first `:` or `_`. A code with no separator is its own
/// prefix; an empty code has an empty prefix.
pub fn namespace_prefix(code: &str) -> &str {
    match code.find([':', '_']) {
        Some(split) => &code[..split],
        None => code,
    }
}

/// One coding system known to the registry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Namespace {
    pub url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Namespace {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            version: None,
            name: None,
        }
    }

    fn named(url: &str, name: &str) -> Self {
        Self {
            url: url.to_string(),
            version: None,
            name: Some(name.to_string()),
        }
    }
}

/// Namespace entries in a YAML file may be a bare URL or a full mapping.
#[derive(Deserialize)]
#[serde(untagged)]
enum NamespaceEntry {
    Url(String),
    Full(Namespace),
}

/// Mapping from namespace prefix to coding system. Prefix lookups ignore ASCII case.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NamespaceTable {
    entries: BTreeMap<String, Namespace>,
}

impl Default for NamespaceTable {
    fn default() -> Self {
        let mut table = Self::empty();
        table.insert("HP", Namespace::named(HPO_SYSTEM, "Human Phenotype Ontology"));
        table.insert(
            "PATO",
            Namespace {
                url: PATO_SYSTEM.to_string(),
                version: Some(PATO_VERSION.to_string()),
                name: Some("Phenotype And Trait Ontology".to_string()),
            },
        );
        table.insert("MONDO", Namespace::named(MONDO_SYSTEM, "Mondo Disease Ontology"));
        table.insert("UBERON", Namespace::named(UBERON_SYSTEM, "Uber-anatomy ontology"));
        table.insert("NCIT", Namespace::named(NCIT_SYSTEM, "NCI Thesaurus"));
        table.insert("SNOMEDCT", Namespace::named(SNOMED_CT_SYSTEM, "SNOMED CT"));
        table
    }
}

impl NamespaceTable {
    /// A table with no entries at all.
    pub fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Add or replace the entry for `prefix`.
    pub fn insert(&mut self, prefix: &str, namespace: Namespace) {
        self.entries.insert(prefix.to_ascii_uppercase(), namespace);
    }

    pub fn get(&self, prefix: &str) -> Option<&Namespace> {
        self.entries.get(&prefix.to_ascii_uppercase())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries of `other` override entries of `self` with the same prefix.
    pub fn extend(&mut self, other: NamespaceTable) {
        self.entries.extend(other.entries);
    }

    /// Parse a YAML mapping of prefix to URL (or to a `{url, version, name}` mapping).
    ///
    /// # Errors
    ///
    /// Returns [`ConvertError::InvalidYaml`] if the text is not such a mapping, and
    /// [`ConvertError::InvalidConfig`] if any prefix or URL is blank.
    pub fn from_yaml_str(yaml_text: &str) -> ConvertResult<Self> {
        let raw: BTreeMap<String, NamespaceEntry> = serde_yaml::from_str(yaml_text)?;

        let mut table = Self::empty();
        for (prefix, entry) in raw {
            let namespace = match entry {
                NamespaceEntry::Url(url) => Namespace::new(url),
                NamespaceEntry::Full(namespace) => namespace,
            };
            if prefix.trim().is_empty() || namespace.url.trim().is_empty() {
                return Err(ConvertError::InvalidConfig(format!(
                    "namespace '{prefix}' must have a non-empty prefix and url"
                )));
            }
            table.insert(&prefix, namespace);
        }
        Ok(table)
    }

    /// Load a YAML namespace file (see [`NamespaceTable::from_yaml_str`]).
    pub fn from_yaml_file(path: &Path) -> ConvertResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| ConvertError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&text)
    }
}

/// Read-only view over a [`NamespaceTable`] used during one conversion.
#[derive(Clone, Copy, Debug)]
pub struct CodingRegistry<'a> {
    namespaces: &'a NamespaceTable,
}

impl<'a> CodingRegistry<'a> {
    pub fn new(namespaces: &'a NamespaceTable) -> Self {
        Self { namespaces }
    }

    /// Describe the coding system behind `raw_code` as a provenance resource.
    ///
    /// `system_url` is carried verbatim. The version is the caller's, or empty. The name is
    /// taken from the namespace table when the prefix is registered there. Pure: collecting and
    /// deduplicating the result is up to the caller.
    pub fn register_or_lookup(
        &self,
        system_url: &str,
        raw_code: &str,
        version: Option<&str>,
    ) -> Resource {
        let prefix = namespace_prefix(raw_code);
        let name = self
            .namespaces
            .get(prefix)
            .and_then(|ns| ns.name.clone())
            .unwrap_or_default();

        Resource {
            id: prefix.to_lowercase(),
            name,
            namespace_prefix: prefix.to_string(),
            url: system_url.to_string(),
            version: version.unwrap_or_default().to_string(),
        }
    }

    /// Provenance resource for the system a CURIE belongs to, built from the table entry.
    ///
    /// Falls back to a resource with an empty URL when the prefix is not registered.
    pub fn resource_for_curie(&self, curie: &str) -> Resource {
        let prefix = namespace_prefix(curie);
        match self.namespaces.get(prefix) {
            Some(ns) => Resource {
                id: prefix.to_lowercase(),
                name: ns.name.clone().unwrap_or_default(),
                namespace_prefix: prefix.to_string(),
                url: ns.url.clone(),
                version: ns.version.clone().unwrap_or_default(),
            },
            None => self.register_or_lookup("", curie, None),
        }
    }

    /// Coding-system URL registered for the prefix of `curie`.
    pub fn system_for(&self, curie: &str) -> Option<&'a str> {
        self.namespaces
            .get(namespace_prefix(curie))
            .map(|ns| ns.url.as_str())
    }
}
