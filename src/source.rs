//! Spec document resolution shared by both loaders.
//!
//! Inline specs are used as-is. Otherwise a filename (or the configured
//! default) is resolved to an absolute path, read with the configured
//! encoding and parsed. `.yaml` / `.yml` files go through `serde_yaml`,
//! everything else through `serde_json`.

use crate::config::LoaderConfig;
use crate::error::LoadError;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Resolve `filename` against the configured root directory (or the process
/// working directory). An empty or absent filename selects `default`.
pub fn resolve_path(config: &LoaderConfig, filename: Option<&Path>, default: &str) -> PathBuf {
    let name: &Path = match filename {
        Some(f) if !f.as_os_str().is_empty() => f,
        _ => Path::new(default),
    };
    if name.is_absolute() {
        return name.to_path_buf();
    }
    let base = config
        .root_dir
        .clone()
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_default();
    base.join(name)
}

/// Read and parse the spec file at `path`.
pub fn read_document(config: &LoaderConfig, path: &Path) -> Result<Value, LoadError> {
    if !path.exists() {
        return Err(LoadError::NotFound {
            path: path.to_path_buf(),
        });
    }

    let bytes = std::fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let size_bytes = bytes.len();
    let content = config
        .file_encoding
        .decode(bytes)
        .map_err(|e| LoadError::parse(path, e))?;

    let value: Value = if is_yaml(path) {
        serde_yaml::from_str(&content).map_err(|e| LoadError::parse(path, e))?
    } else {
        serde_json::from_str(&content).map_err(|e| LoadError::parse(path, e))?
    };

    info!(
        path = %path.display(),
        size_bytes,
        encoding = ?config.file_encoding,
        "Spec file loaded"
    );
    Ok(value)
}

/// Inline document when given, otherwise the resolved file.
pub fn resolve_document(
    config: &LoaderConfig,
    inline: Option<Value>,
    filename: Option<&Path>,
    default: &str,
) -> Result<(Value, Option<PathBuf>), LoadError> {
    if let Some(value) = inline {
        debug!("Using inline spec");
        return Ok((value, None));
    }
    let path = resolve_path(config, filename, default);
    let value = read_document(config, &path)?;
    Ok((value, Some(path)))
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    )
}
