//! # Swagger Route Loader
//!
//! Registers routes from a Swagger/OpenAPI document. Each operation is
//! looked up by `operationId` in the handler registry and registered behind a
//! wrapper that casts the operation's declared parameters into
//! `request.swagger` before calling the real handler.
//!
//! ## Path translation
//!
//! `/users/{id}/posts/{postId}` is registered as `/users/:id/posts/:postId`.
//! Translation is textual: every `/{` becomes `/:` and every `}` is dropped.
//!
//! ## Failure visibility
//!
//! Problems with the document surface as [`LoadError`] from
//! [`SwaggerLoader::load`]. Problems while serving a request (a malformed
//! parameter declaration, a failing or panicking handler) never leave the
//! wrapper: they are reported to the [`ErrorObserver`] and swallowed. A
//! handler that fails before answering therefore leaves the request
//! unanswered.
//!
//! ```rust
//! use specroute::config::LoaderConfig;
//! use specroute::host::{App, HandlerRegistry, Request, Scope};
//! use specroute::swagger::{CastValue, SwaggerLoadOptions, SwaggerLoader};
//! use serde_json::json;
//!
//! let handlers = HandlerRegistry::new().with("getUser", |req, res, _next| {
//!     let id = req.swagger.as_ref().and_then(|s| s.get(Scope::Path, "id")).cloned();
//!     assert_eq!(id, Some(CastValue::Integer(7)));
//!     res.json(json!({ "ok": true }));
//!     Ok(())
//! });
//! let doc = json!({
//!     "info": { "version": "1.0.0" },
//!     "paths": {
//!         "/users/{id}": {
//!             "get": {
//!                 "operationId": "getUser",
//!                 "parameters": [{ "name": "id", "in": "path", "type": "integer" }]
//!             }
//!         }
//!     }
//! });
//!
//! let mut app = App::new();
//! SwaggerLoader::new(LoaderConfig::default())
//!     .load(&mut app, SwaggerLoadOptions::new(&handlers).with_specs(doc))
//!     .unwrap();
//! assert!(app.dispatch(&mut Request::get("/users/7")).response().is_some());
//! ```

mod cast;

pub use cast::{
    cast_declared, cast_parameter, collection_separator, parse_date, parse_float_prefix,
    parse_int_prefix, CastOutcome, CastValue, DeclaredParameter, ParameterSpec, SkipReason,
};

use crate::config::LoaderConfig;
use crate::error::{CastError, LoadError};
use crate::host::{handler, Handler, HandlerRegistry, HostMethod, RouteHost};
use crate::source;
use serde_json::{Map, Value};
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Path at which the loaded document is served when exposure is enabled.
pub const SWAGGER_JSON_PATH: &str = "/swagger.json";

/// Path-item keys that are not operations.
const PATH_ITEM_FIELDS: [&str; 5] = ["summary", "description", "servers", "parameters", "$ref"];

/// Translate an OpenAPI path template into host path syntax.
pub fn translate_path(templated: &str) -> String {
    templated.replace("/{", "/:").replace('}', "")
}

/// A Swagger/OpenAPI document, kept verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct SwaggerDocument {
    raw: Value,
}

impl SwaggerDocument {
    pub fn new(raw: Value) -> Self {
        Self { raw }
    }

    /// `info.version`, if it is a string.
    pub fn version(&self) -> Option<&str> {
        self.raw.get("info")?.get("version")?.as_str()
    }

    /// Overwrite `info.version`, creating `info` if needed.
    pub fn set_version(&mut self, version: &str) {
        let Value::Object(root) = &mut self.raw else {
            return;
        };
        let info = root
            .entry("info")
            .or_insert_with(|| Value::Object(Map::new()));
        if !info.is_object() {
            *info = Value::Object(Map::new());
        }
        if let Value::Object(info) = info {
            info.insert("version".to_string(), Value::String(version.to_string()));
        }
    }

    pub fn paths(&self) -> Option<&Map<String, Value>> {
        self.raw.get("paths")?.as_object()
    }

    pub fn as_value(&self) -> &Value {
        &self.raw
    }

    pub fn into_value(self) -> Value {
        self.raw
    }
}

/// One operation of a path item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationSpec {
    pub operation_id: Option<String>,
    pub parameters: Vec<DeclaredParameter>,
}

impl OperationSpec {
    /// Read an operation object. Non-object values have no `operationId`.
    pub fn from_value(value: &Value) -> Self {
        Self {
            operation_id: value
                .get("operationId")
                .and_then(Value::as_str)
                .map(str::to_string),
            parameters: DeclaredParameter::list_from_value(value.get("parameters")),
        }
    }
}

/// A failure raised while serving a Swagger-registered request.
#[derive(Debug)]
pub enum RequestFailure {
    /// A declared parameter could not be read.
    Cast {
        operation_id: String,
        error: CastError,
    },
    /// The real handler returned an error.
    Handler {
        operation_id: String,
        error: anyhow::Error,
    },
    /// The real handler panicked.
    Panic {
        operation_id: String,
        message: String,
    },
}

impl RequestFailure {
    pub fn operation_id(&self) -> &str {
        match self {
            RequestFailure::Cast { operation_id, .. }
            | RequestFailure::Handler { operation_id, .. }
            | RequestFailure::Panic { operation_id, .. } => operation_id,
        }
    }
}

impl fmt::Display for RequestFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestFailure::Cast { operation_id, error } => {
                write!(f, "{operation_id}: parameter cast failed: {error}")
            }
            RequestFailure::Handler {
                operation_id,
                error,
            } => write!(f, "{operation_id}: handler failed: {error}"),
            RequestFailure::Panic {
                operation_id,
                message,
            } => write!(f, "{operation_id}: handler panicked: {message}"),
        }
    }
}

/// Receives per-request failures swallowed by the Swagger wrapper.
pub type ErrorObserver = Arc<dyn Fn(&RequestFailure) + Send + Sync>;

/// Observer that logs failures with `tracing::error!`.
pub fn log_observer() -> ErrorObserver {
    Arc::new(|failure: &RequestFailure| {
        error!(
            operation_id = %failure.operation_id(),
            error = %failure,
            "Swagger request failed"
        );
    })
}

/// Options for one [`SwaggerLoader::load`] call.
#[derive(Debug, Clone, Default)]
pub struct SwaggerLoadOptions<'a> {
    /// Handler registry keyed by `operationId`; required
    pub handlers: Option<&'a HandlerRegistry>,
    /// Inline document; takes precedence over `filename`
    pub specs: Option<Value>,
    /// Document file; empty or absent selects the configured default
    pub filename: Option<PathBuf>,
    /// Replaces `info.version` before registration
    pub version: Option<String>,
}

impl<'a> SwaggerLoadOptions<'a> {
    pub fn new(handlers: &'a HandlerRegistry) -> Self {
        Self {
            handlers: Some(handlers),
            ..Self::default()
        }
    }

    pub fn with_specs(mut self, specs: Value) -> Self {
        self.specs = Some(specs);
        self
    }

    pub fn with_filename(mut self, filename: impl Into<PathBuf>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }
}

/// Loads Swagger documents onto a [`RouteHost`].
#[derive(Clone)]
pub struct SwaggerLoader {
    config: LoaderConfig,
    observer: ErrorObserver,
}

impl fmt::Debug for SwaggerLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SwaggerLoader")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Default for SwaggerLoader {
    fn default() -> Self {
        Self::new(LoaderConfig::default())
    }
}

impl SwaggerLoader {
    pub fn new(config: LoaderConfig) -> Self {
        Self {
            config,
            observer: log_observer(),
        }
    }

    /// Replace the default logging observer.
    pub fn with_observer(mut self, observer: ErrorObserver) -> Self {
        self.observer = observer;
        self
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Register every operation of the document resolved from `options`.
    pub fn load<H: RouteHost + ?Sized>(
        &self,
        host: &mut H,
        options: SwaggerLoadOptions<'_>,
    ) -> Result<(), LoadError> {
        let handlers = options.handlers.ok_or_else(|| {
            LoadError::Configuration("swagger loading requires a handler registry".to_string())
        })?;

        let (raw, origin) = source::resolve_document(
            &self.config,
            options.specs,
            options.filename.as_deref(),
            &self.config.default_swagger_filename,
        )?;
        let mut document = SwaggerDocument::new(raw);
        if let Some(version) = options.version.as_deref() {
            document.set_version(version);
        }

        let paths = document.paths().ok_or_else(|| {
            LoadError::Configuration("swagger document has no `paths` object".to_string())
        })?;

        let mut registered = 0usize;
        for (templated, item) in paths {
            let host_path = translate_path(templated);
            let Some(methods) = item.as_object() else {
                continue;
            };
            for (method_name, operation) in methods {
                if PATH_ITEM_FIELDS.contains(&method_name.as_str()) || method_name.starts_with("x-")
                {
                    continue;
                }
                let route = self.build_route(handlers, &host_path, method_name, operation)?;
                debug!(
                    method = %route.0,
                    path = %host_path,
                    swagger_path = %templated,
                    "Registering operation"
                );
                host.route(route.0, &host_path, route.1);
                registered += 1;
            }
        }

        if self.config.expose_swagger_json {
            let doc = Arc::new(document.as_value().clone());
            host.get(
                SWAGGER_JSON_PATH,
                handler(move |_req, res, _next| {
                    res.json(Value::clone(&doc));
                    Ok(())
                }),
            );
            debug!(path = SWAGGER_JSON_PATH, "Exposing swagger document");
        }

        info!(
            routes_count = registered,
            version = ?document.version(),
            source = ?origin,
            "Swagger routes loaded"
        );
        Ok(())
    }

    fn build_route(
        &self,
        handlers: &HandlerRegistry,
        host_path: &str,
        method_name: &str,
        operation: &Value,
    ) -> Result<(HostMethod, Handler), LoadError> {
        if is_falsy(operation) {
            return Err(LoadError::MissingSpec {
                path: host_path.to_string(),
                method: method_name.to_string(),
            });
        }
        let spec = OperationSpec::from_value(operation);
        let operation_id = spec.operation_id.unwrap_or_default();
        let real = handlers
            .get(&operation_id)
            .ok_or_else(|| LoadError::MissingHandler {
                path: host_path.to_string(),
                method: method_name.to_string(),
                operation_id: operation_id.clone(),
            })?;
        let method = HostMethod::parse(method_name, host_path)?;

        let wrapper = cast_then_call(
            operation_id,
            spec.parameters.into(),
            Arc::clone(real),
            Arc::clone(&self.observer),
        );
        Ok((method, wrapper))
    }
}

/// Wrap `real` so declared parameters are cast before it runs.
///
/// The wrapper always returns `Ok(())`; failures go to `observer`.
fn cast_then_call(
    operation_id: String,
    parameters: Arc<[DeclaredParameter]>,
    real: Handler,
    observer: ErrorObserver,
) -> Handler {
    handler(move |req, res, next| {
        req.swagger_mut();
        for declared in parameters.iter() {
            if let CastOutcome::Failed(error) = cast_declared(req, declared) {
                observer(&RequestFailure::Cast {
                    operation_id: operation_id.clone(),
                    error,
                });
            }
        }

        match catch_unwind(AssertUnwindSafe(|| real(&mut *req, &mut *res, next))) {
            Ok(Ok(())) => {}
            Ok(Err(error)) => observer(&RequestFailure::Handler {
                operation_id: operation_id.clone(),
                error,
            }),
            Err(panic) => {
                let message = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                observer(&RequestFailure::Panic {
                    operation_id: operation_id.clone(),
                    message,
                });
            }
        }
        Ok(())
    })
}

/// `null`, `false`, `0`, `NaN` and `""` count as an absent operation.
fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64().map_or(false, |f| f == 0.0 || f.is_nan()),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}
