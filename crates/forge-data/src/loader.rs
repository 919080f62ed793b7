//! Policy loading: format detection, deserialization, clamping and
//! validation.
//!
//! Out-of-range limits and cooking times are clamped and logged. Only
//! inconsistent durations are a hard error.

use crate::schema::PolicyData;
use forge_core::fixed::f64_to_fixed64;
use forge_core::policy::{MAX_COOK_SECONDS, Policy, PolicyError};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

/// Base name of the policy file looked up by [`load_policy_from_dir`].
pub const POLICY_FILE_BASE: &str = "config";

// ===========================================================================
// Errors
// ===========================================================================

/// Errors that can occur while loading a policy.
#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    /// The file has an extension we don't support.
    #[error("unsupported format for file: {file}")]
    UnsupportedFormat { file: PathBuf },

    /// Two files with the same base name but different formats exist.
    #[error("conflicting formats: {a} and {b}")]
    ConflictingFormats { a: PathBuf, b: PathBuf },

    /// A deserialization error occurred.
    #[error("parse error in {file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    /// The policy parsed but its durations are inconsistent.
    #[error("invalid policy: {0}")]
    InvalidPolicy(#[from] PolicyError),

    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ===========================================================================
// Format detection
// ===========================================================================

/// Supported policy file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ron,
    Toml,
    Json,
}

/// Detect the format of a file based on its extension.
pub fn detect_format(path: &Path) -> Result<Format, DataLoadError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("ron") => Ok(Format::Ron),
        Some("toml") => Ok(Format::Toml),
        Some("json") => Ok(Format::Json),
        _ => Err(DataLoadError::UnsupportedFormat {
            file: path.to_path_buf(),
        }),
    }
}

/// Look for `{base_name}.ron`, `.toml` or `.json` in `dir`.
///
/// Returns `Ok(None)` if none exists, or `Err(ConflictingFormats)` if more
/// than one does.
pub fn find_data_file(dir: &Path, base_name: &str) -> Result<Option<PathBuf>, DataLoadError> {
    let mut found: Option<PathBuf> = None;
    for ext in ["ron", "toml", "json"] {
        let candidate = dir.join(format!("{base_name}.{ext}"));
        if candidate.exists() {
            if let Some(existing) = found {
                return Err(DataLoadError::ConflictingFormats {
                    a: existing,
                    b: candidate,
                });
            }
            found = Some(candidate);
        }
    }
    Ok(found)
}

/// Read a file and deserialize it according to its format.
pub fn deserialize_file<T: DeserializeOwned>(path: &Path) -> Result<T, DataLoadError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;
    let parse_err = |detail: String| DataLoadError::Parse {
        file: path.to_path_buf(),
        detail,
    };

    match format {
        Format::Ron => ron::from_str(&content).map_err(|e| parse_err(e.to_string())),
        Format::Json => serde_json::from_str(&content).map_err(|e| parse_err(e.to_string())),
        Format::Toml => toml::from_str(&content).map_err(|e| parse_err(e.to_string())),
    }
}

// ===========================================================================
// Resolution
// ===========================================================================

/// Clamp out-of-range values, convert to a [`Policy`] and validate it.
pub fn resolve_policy(data: PolicyData) -> Result<Policy, DataLoadError> {
    let max_stack_horizontal = clamp_limit("stack-limit-horizontal", data.stack_limit_horizontal);
    let max_stack_vertical = clamp_limit("stack-limit-vertical", data.stack_limit_vertical);
    if max_stack_vertical == 0 {
        tracing::warn!("stack-limit-vertical is zero; no furnace will be treated as a forge");
    }

    let cooking_time = if data.cooking_time.is_nan() || data.cooking_time < 0.0 {
        tracing::error!(value = data.cooking_time, "Negative cooking-time, setting to zero");
        0.0
    } else if data.cooking_time > MAX_COOK_SECONDS {
        tracing::error!(
            value = data.cooking_time,
            "cooking-time is too high, setting to {MAX_COOK_SECONDS}"
        );
        MAX_COOK_SECONDS
    } else {
        data.cooking_time
    };

    let policy = Policy {
        cook_time: f64_to_fixed64(cooking_time),
        require_fuel: data.require_fuel,
        allow_crafted_fuel: data.allow_crafted_items,
        max_stack_horizontal,
        max_stack_vertical,
        durations: data.durations.into(),
    };
    policy.validate()?;
    Ok(policy)
}

fn clamp_limit(key: &str, value: i32) -> i32 {
    if value < 0 {
        tracing::error!(key, value, "Negative stack limit, setting to zero");
        0
    } else {
        value
    }
}

/// Load and resolve a policy file.
pub fn load_policy(path: &Path) -> Result<Policy, DataLoadError> {
    let data: PolicyData = deserialize_file(path)?;
    let policy = resolve_policy(data)?;
    tracing::info!(file = %path.display(), "policy loaded");
    Ok(policy)
}

/// Load `config.{ron,toml,json}` from `dir`, or the default policy if no
/// such file exists.
pub fn load_policy_from_dir(dir: &Path) -> Result<Policy, DataLoadError> {
    match find_data_file(dir, POLICY_FILE_BASE)? {
        Some(path) => load_policy(&path),
        None => {
            tracing::info!(dir = %dir.display(), "no policy file; using defaults");
            Ok(Policy::default())
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================
