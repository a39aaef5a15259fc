//! Error types for route loading and parameter casting.
//!
//! Two regimes coexist and are kept apart on purpose:
//!
//! - [`LoadError`] is returned synchronously from
//!   [`RouteLoader::load`](crate::routes::RouteLoader::load) and
//!   [`SwaggerLoader::load`](crate::swagger::SwaggerLoader::load). The first
//!   failure aborts the remainder of that call; routes registered before it stay
//!   registered.
//! - [`CastError`] never leaves the per-request Swagger wrapper. It is reported to
//!   the [`ErrorObserver`](crate::swagger::ErrorObserver) and the request carries
//!   on with the parameter left uncast.

use std::path::PathBuf;
use thiserror::Error;

/// Boxed parser error kept as the `source` of [`LoadError::Parse`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Load-time failure of a route table or Swagger document.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The caller supplied unusable options (no handler registry, no `paths`).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The resolved spec file does not exist.
    #[error("spec file not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// The spec file exists but its contents could not be decoded or parsed.
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: BoxError,
    },

    /// The method name is not one the host can register.
    #[error("invalid method '{method}' for path '{path}'")]
    InvalidMethod { path: String, method: String },

    /// A flat route names a handler that is not in the registry.
    #[error("invalid handler '{handler}' for {method} '{path}'")]
    InvalidHandler {
        path: String,
        method: String,
        handler: String,
    },

    /// A Swagger path lists a method whose operation object is empty.
    #[error("missing operation spec for {method} '{path}'")]
    MissingSpec { path: String, method: String },

    /// A Swagger operation's `operationId` has no handler in the registry.
    #[error("missing handler '{operation_id}' for {method} '{path}'")]
    MissingHandler {
        path: String,
        method: String,
        operation_id: String,
    },

    /// Reading the spec file failed for a reason other than absence.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl LoadError {
    pub(crate) fn parse(path: impl Into<PathBuf>, source: impl Into<BoxError>) -> Self {
        LoadError::Parse {
            path: path.into(),
            source: source.into(),
        }
    }
}

/// Per-request casting failure. Confined to the Swagger wrapper.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CastError {
    /// The declared parameter entry is not a usable parameter object.
    #[error("malformed parameter spec at index {index}: {reason}")]
    Malformed { index: usize, reason: String },
}
