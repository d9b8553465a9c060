//! Converter configuration.
//!
//! Configuration is resolved once at process startup and then passed into the [`Converter`].
//! Nothing in this crate reads environment variables during a conversion; the `*_from_env_value`
//! helpers take values the binary has already read.
//!
//! [`Converter`]: crate::Converter

use crate::constants::{DEFAULT_CREATED_BY, HPO_SYSTEM, SNOMED_CT_SYSTEM};
use crate::registry::NamespaceTable;
use crate::{ConvertError, ConvertResult};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// What the forward conversion does with a bundle that names more than one subject.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SubjectPolicy {
    /// Keep only the first subject encountered; the rest are discarded.
    #[default]
    FirstOnly,
    /// Keep every subject, producing a cohort record.
    CollectAll,
}

impl FromStr for SubjectPolicy {
    type Err = ConvertError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "first" | "first-only" => Ok(SubjectPolicy::FirstOnly),
            "all" | "collect-all" => Ok(SubjectPolicy::CollectAll),
            _ => Err(ConvertError::InvalidPolicy(s.to_string())),
        }
    }
}

impl fmt::Display for SubjectPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubjectPolicy::FirstOnly => f.write_str("first"),
            SubjectPolicy::CollectAll => f.write_str("all"),
        }
    }
}

/// Converter configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct ConverterConfig {
    namespaces: NamespaceTable,
    created_by: String,
    subject_policy: SubjectPolicy,
    phenotype_system: Option<String>,
    specimen_system: Option<String>,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            namespaces: NamespaceTable::default(),
            created_by: DEFAULT_CREATED_BY.to_string(),
            subject_policy: SubjectPolicy::default(),
            phenotype_system: Some(HPO_SYSTEM.to_string()),
            specimen_system: Some(SNOMED_CT_SYSTEM.to_string()),
        }
    }
}

impl ConverterConfig {
    /// Create a new `ConverterConfig` with the default fallback systems.
    ///
    /// # Errors
    ///
    /// Returns [`ConvertError::InvalidConfig`] if `created_by` is blank.
    pub fn new(
        namespaces: NamespaceTable,
        created_by: String,
        subject_policy: SubjectPolicy,
    ) -> ConvertResult<Self> {
        if created_by.trim().is_empty() {
            return Err(ConvertError::InvalidConfig(
                "created_by cannot be empty".into(),
            ));
        }

        Ok(Self {
            namespaces,
            created_by,
            subject_policy,
            ..Self::default()
        })
    }

    /// Fallback system for phenotype, severity and onset concepts. `None` disables it.
    pub fn with_phenotype_system(mut self, system: Option<String>) -> Self {
        self.phenotype_system = system;
        self
    }

    /// Fallback system for specimen types. `None` disables it.
    pub fn with_specimen_system(mut self, system: Option<String>) -> Self {
        self.specimen_system = system;
        self
    }

    pub fn namespaces(&self) -> &NamespaceTable {
        &self.namespaces
    }

    pub fn created_by(&self) -> &str {
        &self.created_by
    }

    pub fn subject_policy(&self) -> SubjectPolicy {
        self.subject_policy
    }

    pub fn phenotype_system(&self) -> Option<&str> {
        self.phenotype_system.as_deref()
    }

    pub fn specimen_system(&self) -> Option<&str> {
        self.specimen_system.as_deref()
    }
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse the subject policy from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns [`SubjectPolicy::FirstOnly`].
pub fn subject_policy_from_env_value(value: Option<String>) -> ConvertResult<SubjectPolicy> {
    let parsed = trimmed(value)
        .map(|v| v.parse::<SubjectPolicy>())
        .transpose()?;

    Ok(parsed.unwrap_or_default())
}

/// Resolve the provenance label, defaulting to `"FHIR converter"`.
pub fn created_by_from_env_value(value: Option<String>) -> String {
    trimmed(value).unwrap_or_else(|| DEFAULT_CREATED_BY.to_string())
}

/// Build the namespace table: the defaults, extended by the YAML file at `path` if given.
pub fn resolve_namespaces(path: Option<&Path>) -> ConvertResult<NamespaceTable> {
    let mut table = NamespaceTable::default();
    if let Some(path) = path {
        let overrides = NamespaceTable::from_yaml_file(path)?;
        tracing::info!(
            path = %path.display(),
            entries = overrides.len(),
            "loaded namespace overrides"
        );
        table.extend(overrides);
    }
    Ok(table)
}
