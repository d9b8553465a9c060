use std::path::PathBuf;

/// Errors raised while building converter configuration.
///
/// Conversions themselves never fail: malformed or partial input degrades to a record with
/// fewer populated fields, so these variants only cover setup.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to read configuration file {}: {source}", .path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid namespace YAML: {0}")]
    InvalidYaml(#[from] serde_yaml::Error),

    #[error("invalid subject policy '{0}' (expected 'first' or 'all')")]
    InvalidPolicy(String),
}

pub type ConvertResult<T> = std::result::Result<T, ConvertError>;
