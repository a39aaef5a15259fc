//! # Loader Configuration
//!
//! Settings shared by the flat route loader and the Swagger loader. The
//! configuration is an explicit value handed to each loader at construction;
//! nothing is read from process-global state at load time.
//!
//! ## Sources
//!
//! - [`LoaderConfig::default()`] for the built-in defaults
//! - [`LoaderConfig::from_yaml_file()`] for a `config.yaml` style file
//! - [`LoaderConfig::apply_env()`] / [`LoaderConfig::from_env()`] for overrides
//!
//! ## Environment Variables
//!
//! | Variable                     | Field                      |
//! |------------------------------|----------------------------|
//! | `SPECROUTE_ROUTES_FILE`      | `default_route_filename`   |
//! | `SPECROUTE_SWAGGER_FILE`     | `default_swagger_filename` |
//! | `SPECROUTE_EXPOSE_SWAGGER`   | `expose_swagger_json`      |
//! | `SPECROUTE_FILE_ENCODING`    | `file_encoding`            |
//! | `SPECROUTE_ROOT_DIR`         | `root_dir`                 |
//!
//! ```rust
//! use specroute::config::LoaderConfig;
//!
//! let config = LoaderConfig::from_env();
//! println!("routes file: {}", config.default_route_filename);
//! ```

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Text encoding used when reading spec files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FileEncoding {
    #[default]
    #[serde(rename = "utf-8", alias = "utf8", alias = "UTF-8")]
    Utf8,
    #[serde(rename = "latin1", alias = "iso-8859-1", alias = "binary")]
    Latin1,
}

impl FileEncoding {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "utf-8" | "utf8" => Some(FileEncoding::Utf8),
            "latin1" | "iso-8859-1" | "binary" => Some(FileEncoding::Latin1),
            _ => None,
        }
    }

    /// Decode raw file bytes into text.
    pub fn decode(self, bytes: Vec<u8>) -> Result<String, std::string::FromUtf8Error> {
        match self {
            FileEncoding::Utf8 => String::from_utf8(bytes),
            // Latin-1 code points map one-to-one onto the first 256 chars.
            FileEncoding::Latin1 => Ok(bytes.into_iter().map(char::from).collect()),
        }
    }
}

/// Configuration consumed by [`RouteLoader`](crate::routes::RouteLoader) and
/// [`SwaggerLoader`](crate::swagger::SwaggerLoader).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// File read by the flat loader when neither specs nor a filename are given
    pub default_route_filename: String,
    /// File read by the Swagger loader when neither specs nor a filename are given
    pub default_swagger_filename: String,
    /// Register `GET /swagger.json` serving the loaded document
    pub expose_swagger_json: bool,
    /// Encoding of spec files on disk
    pub file_encoding: FileEncoding,
    /// Directory relative filenames resolve against (process cwd when unset)
    pub root_dir: Option<PathBuf>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            default_route_filename: "routes.json".to_string(),
            default_swagger_filename: "swagger.json".to_string(),
            expose_swagger_json: false,
            file_encoding: FileEncoding::Utf8,
            root_dir: None,
        }
    }
}

impl LoaderConfig {
    /// Defaults with `SPECROUTE_*` overrides applied.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Read a YAML configuration file. Missing keys keep their defaults.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: LoaderConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    /// Overlay `SPECROUTE_*` environment variables onto this configuration.
    pub fn apply_env(&mut self) {
        if let Ok(v) = env::var("SPECROUTE_ROUTES_FILE") {
            self.default_route_filename = v;
        }
        if let Ok(v) = env::var("SPECROUTE_SWAGGER_FILE") {
            self.default_swagger_filename = v;
        }
        if let Ok(v) = env::var("SPECROUTE_EXPOSE_SWAGGER") {
            match parse_flag(&v) {
                Some(flag) => self.expose_swagger_json = flag,
                None => warn!(value = %v, "Ignoring unrecognised SPECROUTE_EXPOSE_SWAGGER"),
            }
        }
        if let Ok(v) = env::var("SPECROUTE_FILE_ENCODING") {
            match FileEncoding::parse(&v) {
                Some(enc) => self.file_encoding = enc,
                None => warn!(value = %v, "Ignoring unsupported SPECROUTE_FILE_ENCODING"),
            }
        }
        if let Ok(v) = env::var("SPECROUTE_ROOT_DIR") {
            self.root_dir = Some(PathBuf::from(v));
        }
    }

    pub fn with_root_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.root_dir = Some(dir.into());
        self
    }

    pub fn with_expose_swagger_json(mut self, expose: bool) -> Self {
        self.expose_swagger_json = expose;
        self
    }
}

fn parse_flag(v: &str) -> Option<bool> {
    match v.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
