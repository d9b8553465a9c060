use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use fhir::Bundle;
use phenofhir_core::config::{
    created_by_from_env_value, resolve_namespaces, subject_policy_from_env_value,
};
use phenofhir_core::{Converter, ConverterConfig, SubjectPolicy};
use phenopackets::PhenoRecord;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "phenofhir")]
#[command(about = "Convert between FHIR bundles and phenopackets")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a FHIR bundle into a phenopacket record
    ToPhenopacket {
        /// Bundle file (.json, .yaml or .yml)
        file: PathBuf,
        /// Output format
        #[arg(long, value_enum, default_value_t = Format::Json)]
        format: Format,
        /// Provenance label for the metadata block
        #[arg(long)]
        created_by: Option<String>,
        /// What to do with more than one subject
        #[arg(long, value_enum)]
        subject_policy: Option<PolicyArg>,
        /// YAML file of extra namespace prefixes
        #[arg(long)]
        namespaces: Option<PathBuf>,
    },
    /// Expand a phenopacket record into a FHIR bundle
    ToBundle {
        /// Record file (.json, .yaml or .yml)
        file: PathBuf,
        /// Output format
        #[arg(long, value_enum, default_value_t = Format::Json)]
        format: Format,
        /// YAML file of extra namespace prefixes
        #[arg(long)]
        namespaces: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    Json,
    Yaml,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum PolicyArg {
    /// Keep the first subject only
    #[value(alias = "first-only")]
    First,
    /// Keep every subject as a cohort
    #[value(alias = "collect-all")]
    All,
}

impl From<PolicyArg> for SubjectPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::First => SubjectPolicy::FirstOnly,
            PolicyArg::All => SubjectPolicy::CollectAll,
        }
    }
}

impl Format {
    /// YAML for `.yaml`/`.yml` files, JSON for everything else.
    fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
                Format::Yaml
            }
            _ => Format::Json,
        }
    }
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("phenofhir=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let output = match cli.command {
        Commands::ToPhenopacket {
            file,
            format,
            created_by,
            subject_policy,
            namespaces,
        } => {
            let config = resolve_config(created_by, subject_policy.map(Into::into), namespaces)?;
            let bundle = read_bundle(&file)?;
            let record = Converter::new(config).to_phenopacket(&bundle);
            tracing::info!(
                subjects = record.subjects().len(),
                "converted {}",
                file.display()
            );
            match format {
                Format::Json => record.to_json()?,
                Format::Yaml => record.to_yaml()?,
            }
        }
        Commands::ToBundle {
            file,
            format,
            namespaces,
        } => {
            let config = resolve_config(None, None, namespaces)?;
            let record = read_record(&file)?;
            let bundle = Converter::new(config).to_bundle(&record);
            tracing::info!(
                resources = bundle.entries.len(),
                "expanded {}",
                file.display()
            );
            match format {
                Format::Json => bundle.to_json()?,
                Format::Yaml => bundle.to_yaml()?,
            }
        }
    };

    println!("{output}");
    Ok(())
}

/// Flags win over `PHENOFHIR_*` environment variables, which win over defaults.
fn resolve_config(
    created_by: Option<String>,
    subject_policy: Option<SubjectPolicy>,
    namespaces: Option<PathBuf>,
) -> anyhow::Result<ConverterConfig> {
    let created_by = created_by_from_env_value(
        created_by.or_else(|| std::env::var("PHENOFHIR_CREATED_BY").ok()),
    );
    let subject_policy = match subject_policy {
        Some(policy) => policy,
        None => subject_policy_from_env_value(std::env::var("PHENOFHIR_SUBJECT_POLICY").ok())?,
    };
    let namespaces_path =
        namespaces.or_else(|| std::env::var_os("PHENOFHIR_NAMESPACES").map(PathBuf::from));
    let namespaces = resolve_namespaces(namespaces_path.as_deref())?;

    Ok(ConverterConfig::new(namespaces, created_by, subject_policy)?)
}

fn read_bundle(path: &Path) -> anyhow::Result<Bundle> {
    let text = read_input(path)?;
    let bundle = match Format::from_path(path) {
        Format::Json => Bundle::from_json(&text),
        Format::Yaml => Bundle::from_yaml(&text),
    }
    .with_context(|| format!("failed to parse bundle {}", path.display()))?;
    Ok(bundle)
}

fn read_record(path: &Path) -> anyhow::Result<PhenoRecord> {
    let text = read_input(path)?;
    let record = match Format::from_path(path) {
        Format::Json => PhenoRecord::from_json(&text),
        Format::Yaml => PhenoRecord::from_yaml(&text),
    }
    .with_context(|| format!("failed to parse phenopacket record {}", path.display()))?;
    Ok(record)
}

fn read_input(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn format_is_inferred_from_extension() {
        assert_eq!(Format::from_path(Path::new("bundle.yaml")), Format::Yaml);
        assert_eq!(Format::from_path(Path::new("bundle.YML")), Format::Yaml);
        assert_eq!(Format::from_path(Path::new("bundle.json")), Format::Json);
        assert_eq!(Format::from_path(Path::new("bundle")), Format::Json);
    }

    #[test]
    fn parses_subcommands() {
        let cli = Cli::try_parse_from([
            "phenofhir",
            "to-phenopacket",
            "bundle.json",
            "--format",
            "yaml",
            "--subject-policy",
            "all",
        ])
        .expect("valid arguments");

        match cli.command {
            Commands::ToPhenopacket {
                file,
                format,
                subject_policy,
                ..
            } => {
                assert_eq!(file, PathBuf::from("bundle.json"));
                assert_eq!(format, Format::Yaml);
                assert_eq!(subject_policy, Some(PolicyArg::All));
                assert_eq!(
                    subject_policy.map(SubjectPolicy::from),
                    Some(SubjectPolicy::CollectAll)
                );
            }
            Commands::ToBundle { .. } => panic!("wrong subcommand"),
        }

        assert!(Cli::try_parse_from(["phenofhir", "to-bundle"]).is_err());
    }

    #[test]
    fn subject_policy_is_checked_at_parse_time() {
        let parse = |value: &str| {
            Cli::try_parse_from([
                "phenofhir",
                "to-phenopacket",
                "bundle.json",
                "--subject-policy",
                value,
            ])
        };

        let cli = parse("first-only").expect("alias accepted");
        let Commands::ToPhenopacket { subject_policy, .. } = cli.command else {
            panic!("wrong subcommand");
        };
        assert_eq!(subject_policy, Some(PolicyArg::First));

        let err = parse("many").err().expect("invalid policy rejected");
        assert_eq!(err.kind(), clap::error::ErrorKind::InvalidValue);
    }

    #[test]
    fn reads_yaml_bundle_by_extension() {
        let mut file = tempfile::Builder::new()
            .suffix(".yaml")
            .tempfile()
            .expect("temp file");
        writeln!(
            file,
            "resourceType: Bundle\ntype: collection\nentry:\n  - resource:\n      resourceType: Patient\n      id: P1"
        )
        .expect("write");

        let bundle = read_bundle(file.path()).expect("parse bundle");
        assert_eq!(bundle.entries.len(), 1);
    }

    #[test]
    fn invalid_json_reports_file() {
        let mut file = tempfile::Builder::new()
            .suffix(".json")
            .tempfile()
            .expect("temp file");
        write!(file, "{{\"resourceType\": \"Patient\"}}").expect("write");

        let err = read_bundle(file.path()).expect_err("not a bundle");
        assert!(err.to_string().contains("failed to parse bundle"));
    }
}
