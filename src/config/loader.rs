//! Reading table configs from JSON files.
//!
//! Lookup order for [`load_first_available`]: the model's config directory first, then the
//! extension's own `.plantech` directory. Missing, empty or malformed files are skipped with a
//! warning; when nothing loads the embedded defaults are used. The result always passes through
//! [`ConfigValidator`].

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::defaults::default_config;
use super::validator::ConfigValidator;
use super::TableConfig;
use crate::diagnostics::Outcome;
use crate::error::{ConfigError, ConfigResult};

/// File name looked up in every candidate directory.
pub const CONFIG_FILE_NAME: &str = "phase-visualizer.json";

/// Sub-directory of the extension root holding its bundled config.
pub const CONFIG_DIRECTORY_NAME: &str = ".plantech";

/// Parse a raw (unvalidated) config from JSON text. Unknown fields are ignored.
pub fn parse_config_str(input: &str) -> ConfigResult<TableConfig> {
    Ok(serde_json::from_str(input)?)
}

/// Read and parse a raw (unvalidated) config file.
pub fn load_config_from_path(path: impl AsRef<Path>) -> ConfigResult<TableConfig> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)?;
    if text.trim().is_empty() {
        return Err(ConfigError::Empty {
            path: path.to_path_buf(),
        });
    }
    parse_config_str(&text)
}

/// Candidate config files in lookup order.
pub fn candidate_paths(model_directory: Option<&Path>, extension_root: Option<&Path>) -> Vec<PathBuf> {
    let mut candidates = Vec::with_capacity(2);
    if let Some(dir) = model_directory.filter(|d| !d.as_os_str().is_empty()) {
        candidates.push(dir.join(CONFIG_FILE_NAME));
    }
    if let Some(root) = extension_root.filter(|d| !d.as_os_str().is_empty()) {
        candidates.push(root.join(CONFIG_DIRECTORY_NAME).join(CONFIG_FILE_NAME));
    }
    candidates
}

/// Load the first candidate that exists and parses, validated.
///
/// Diagnostics cover skipped files as well as everything the validator reported.
pub fn load_first_available<I, P>(candidates: I, validator: &ConfigValidator) -> Outcome<TableConfig>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let mut skipped = Vec::new();

    for candidate in candidates {
        let path = candidate.as_ref();
        if !path.is_file() {
            continue;
        }

        match load_config_from_path(path) {
            Ok(raw) => {
                debug!(path = %path.display(), "loaded table config");
                let mut outcome = validator.validate(Some(&raw));
                skipped.extend(outcome.diagnostics);
                outcome.diagnostics = skipped.into();
                return outcome;
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "config load failed");
                skipped.push(format!("config load failed at {}: {e}", path.display()));
            }
        }
    }

    let message = "config not found. Using embedded defaults.".to_string();
    warn!("{message}");
    skipped.push(message);

    let mut outcome = validator.validate(Some(&default_config()));
    skipped.extend(outcome.diagnostics);
    outcome.diagnostics = skipped.into();
    outcome
}
