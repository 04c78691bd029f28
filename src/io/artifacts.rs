//! Locate and read the scoring artifacts.
//!
//! A model directory holds three JSON files:
//!
//! - `features_list.json`: the feature schema (array of names)
//! - `primary.json`: primary estimator artifact
//! - `secondary.json`: secondary estimator artifact
//!
//! Resolution order for each path: CLI flag, then environment (`.env` is loaded
//! first), then the default file name inside the model directory.
//!
//! Every failure here is a startup failure (exit code 2).

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use tracing::info;

use crate::domain::{FeatureSchema, ModelPaths};
use crate::error::AppError;
use crate::models::{Estimator, EstimatorArtifact};

pub const ENV_MODEL_DIR: &str = "LOAN_RISK_MODEL_DIR";
pub const ENV_SCHEMA: &str = "LOAN_RISK_SCHEMA";
pub const ENV_PRIMARY: &str = "LOAN_RISK_PRIMARY_MODEL";
pub const ENV_SECONDARY: &str = "LOAN_RISK_SECONDARY_MODEL";

pub const DEFAULT_MODEL_DIR: &str = "models";
pub const DEFAULT_SCHEMA_FILE: &str = "features_list.json";
pub const DEFAULT_PRIMARY_FILE: &str = "primary.json";
pub const DEFAULT_SECONDARY_FILE: &str = "secondary.json";

impl ModelPaths {
    /// Default layout inside `dir`.
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            schema: dir.join(DEFAULT_SCHEMA_FILE),
            primary: dir.join(DEFAULT_PRIMARY_FILE),
            secondary: dir.join(DEFAULT_SECONDARY_FILE),
        }
    }

    /// Resolve paths from an optional CLI directory and the process environment.
    pub fn resolve(model_dir: Option<&Path>) -> Self {
        dotenvy::dotenv().ok();
        Self::resolve_with(model_dir, |key| std::env::var(key).ok())
    }

    /// Resolution with an injectable environment lookup.
    pub fn resolve_with<F>(model_dir: Option<&Path>, env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let dir = model_dir
            .map(Path::to_path_buf)
            .or_else(|| env(ENV_MODEL_DIR).filter(|v| !v.trim().is_empty()).map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_MODEL_DIR));

        let defaults = Self::in_dir(&dir);
        let pick = |key: &str, fallback: PathBuf| {
            env(key)
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(fallback)
        };

        Self {
            schema: pick(ENV_SCHEMA, defaults.schema),
            primary: pick(ENV_PRIMARY, defaults.primary),
            secondary: pick(ENV_SECONDARY, defaults.secondary),
        }
    }
}

fn open(path: &Path, what: &str) -> Result<BufReader<File>, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open {what} '{}': {e}", path.display())))?;
    Ok(BufReader::new(file))
}

/// Parse a feature schema from JSON.
pub fn read_schema<R: Read>(reader: R) -> Result<FeatureSchema, AppError> {
    serde_json::from_reader(reader).map_err(|e| AppError::new(2, format!("Invalid feature schema: {e}")))
}

/// Load the feature schema file.
pub fn load_schema(path: &Path) -> Result<FeatureSchema, AppError> {
    let schema = read_schema(open(path, "feature schema")?)
        .map_err(|e| AppError::new(e.exit_code(), format!("{} ({})", e.message(), path.display())))?;
    info!(path = %path.display(), features = schema.len(), "loaded feature schema");
    Ok(schema)
}

/// Parse and validate an estimator artifact from JSON.
pub fn read_estimator<R: Read>(reader: R) -> Result<Box<dyn Estimator>, AppError> {
    let artifact: EstimatorArtifact = serde_json::from_reader(reader)
        .map_err(|e| AppError::new(2, format!("Invalid estimator artifact: {e}")))?;
    let kind = artifact.kind();
    let name = artifact.name().to_string();
    let estimator = artifact
        .into_estimator()
        .map_err(|e| AppError::new(2, format!("Invalid {kind} estimator '{name}': {e}")))?;
    info!(name = %name, kind, "loaded estimator");
    Ok(estimator)
}

/// Load an estimator artifact file.
pub fn load_estimator(path: &Path) -> Result<Box<dyn Estimator>, AppError> {
    read_estimator(open(path, "estimator artifact")?)
        .map_err(|e| AppError::new(e.exit_code(), format!("{} ({})", e.message(), path.display())))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn defaults_without_env() {
        let paths = ModelPaths::resolve_with(None, |_| None);
        assert_eq!(paths, ModelPaths::in_dir(Path::new("models")));
        assert_eq!(paths.schema, PathBuf::from("models/features_list.json"));
    }

    #[test]
    fn env_dir_and_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            (ENV_MODEL_DIR, "/srv/models"),
            (ENV_SECONDARY, "/tmp/other.json"),
            (ENV_SCHEMA, "  "),
        ]);
        let paths = ModelPaths::resolve_with(None, |k| env.get(k).map(|v| v.to_string()));
        assert_eq!(paths.primary, PathBuf::from("/srv/models/primary.json"));
        assert_eq!(paths.secondary, PathBuf::from("/tmp/other.json"));
        assert_eq!(paths.schema, PathBuf::from("/srv/models/features_list.json"));
    }

    #[test]
    fn cli_dir_beats_env_dir() {
        let paths = ModelPaths::resolve_with(Some(Path::new("cli")), |k| {
            (k == ENV_MODEL_DIR).then(|| "env".to_string())
        });
        assert_eq!(paths.primary, PathBuf::from("cli/primary.json"));
    }

    #[test]
    fn schema_parse_errors_are_config_errors() {
        let err = read_schema(r#"["a", "a"]"#.as_bytes()).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.message().contains("duplicated"));

        let err = read_schema("{}".as_bytes()).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn estimator_validation_errors_are_config_errors() {
        let json = r#"{
            "kind": "logistic",
            "name": "lr",
            "features": ["a", "b"],
            "coefficients": [1.0],
            "intercept": 0.0
        }"#;
        let err = read_estimator(json.as_bytes()).err().unwrap();
        assert_eq!(err.exit_code(), 2);
        assert!(err.message().contains("Invalid logistic estimator 'lr'"));
    }

    #[test]
    fn missing_file_is_reported_with_path() {
        let err = load_schema(Path::new("/definitely/not/here.json")).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.message().contains("/definitely/not/here.json"));
    }
}
