//! # Route Table Loader
//!
//! Registers routes from a flat route table:
//!
//! ```json
//! {
//!   "/": "getHome",
//!   "/users/:id": { "get": "getUser", "delete": "deleteUser" }
//! }
//! ```
//!
//! A string value is shorthand for `{ "get": value }`. Entries are registered
//! in document order. Validation happens while iterating, so the first
//! invalid method or unknown handler aborts the load; entries before it stay
//! registered.
//!
//! ```rust
//! use specroute::config::LoaderConfig;
//! use specroute::host::{App, HandlerRegistry, Request};
//! use specroute::routes::{RouteLoadOptions, RouteLoader, RouteSpec};
//! use serde_json::json;
//!
//! let handlers = HandlerRegistry::new().with("getHome", |_req, res, _next| {
//!     res.send_text("home");
//!     Ok(())
//! });
//! let specs = RouteSpec::from_value(json!({ "/": "getHome" })).unwrap();
//!
//! let mut app = App::new();
//! RouteLoader::new(LoaderConfig::default())
//!     .load(&mut app, &RouteLoadOptions::new(&handlers).with_specs(specs))
//!     .unwrap();
//! assert!(app.dispatch(&mut Request::get("/")).response().is_some());
//! ```

use crate::config::LoaderConfig;
use crate::error::LoadError;
use crate::host::{HandlerRegistry, HostMethod, RouteHost};
use crate::source;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Value of one route table entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteTarget {
    /// Handler name; registered for GET.
    Handler(String),
    /// Method name to handler name, in document order.
    Methods(Vec<(String, String)>),
}

impl RouteTarget {
    /// `(method, handler)` pairs with the GET shorthand expanded.
    pub fn pairs(&self) -> Vec<(&str, &str)> {
        match self {
            RouteTarget::Handler(h) => vec![("get", h.as_str())],
            RouteTarget::Methods(m) => m.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect(),
        }
    }
}

/// Flat route table: URL path to [`RouteTarget`], in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteSpec {
    entries: Vec<(String, RouteTarget)>,
}

impl RouteSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entry(mut self, path: impl Into<String>, target: RouteTarget) -> Self {
        self.entries.push((path.into(), target));
        self
    }

    pub fn entries(&self) -> &[(String, RouteTarget)] {
        &self.entries
    }

    /// Shape a parsed JSON document into a route table.
    ///
    /// Only the top level must be an object. Values are not checked here:
    /// a non-string handler keeps its JSON text as its name, so the loader
    /// reports it as an unknown handler in document order.
    pub fn from_value(value: Value) -> Result<Self, String> {
        let Value::Object(map) = value else {
            return Err("route table must be a JSON object".to_string());
        };
        let entries = map
            .into_iter()
            .map(|(path, target)| {
                let target = match target {
                    Value::String(handler) => RouteTarget::Handler(handler),
                    Value::Object(methods) => RouteTarget::Methods(
                        methods
                            .into_iter()
                            .map(|(method, handler)| (method, handler_name(handler)))
                            .collect(),
                    ),
                    Value::Array(items) => RouteTarget::Methods(
                        items
                            .into_iter()
                            .enumerate()
                            .map(|(i, handler)| (i.to_string(), handler_name(handler)))
                            .collect(),
                    ),
                    // Scalars have no method keys to register.
                    _ => RouteTarget::Methods(Vec::new()),
                };
                (path, target)
            })
            .collect();
        Ok(Self { entries })
    }
}

fn handler_name(value: Value) -> String {
    match value {
        Value::String(name) => name,
        other => other.to_string(),
    }
}

/// Options for one [`RouteLoader::load`] call.
#[derive(Debug, Clone, Default)]
pub struct RouteLoadOptions<'a> {
    /// Handler registry; required
    pub handlers: Option<&'a HandlerRegistry>,
    /// Inline route table; takes precedence over `filename`
    pub specs: Option<RouteSpec>,
    /// Route file; empty or absent selects the configured default
    pub filename: Option<PathBuf>,
}

impl<'a> RouteLoadOptions<'a> {
    pub fn new(handlers: &'a HandlerRegistry) -> Self {
        Self {
            handlers: Some(handlers),
            ..Self::default()
        }
    }

    pub fn with_specs(mut self, specs: RouteSpec) -> Self {
        self.specs = Some(specs);
        self
    }

    pub fn with_filename(mut self, filename: impl Into<PathBuf>) -> Self {
        self.filename = Some(filename.into());
        self
    }
}

/// Loads flat route tables onto a [`RouteHost`].
#[derive(Debug, Clone, Default)]
pub struct RouteLoader {
    config: LoaderConfig,
}

impl RouteLoader {
    pub fn new(config: LoaderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Register every route in the table resolved from `options`.
    pub fn load<H: RouteHost + ?Sized>(
        &self,
        host: &mut H,
        options: &RouteLoadOptions<'_>,
    ) -> Result<(), LoadError> {
        let handlers = options.handlers.ok_or_else(|| {
            LoadError::Configuration("route loading requires a handler registry".to_string())
        })?;

        let specs = match &options.specs {
            Some(specs) => specs.clone(),
            None => self.read_table(options.filename.as_deref())?,
        };

        let mut registered = 0usize;
        for (path, target) in specs.entries() {
            for (method_name, handler_name) in target.pairs() {
                let method = HostMethod::parse(method_name, path)?;
                let handler = handlers.get(handler_name).ok_or_else(|| LoadError::InvalidHandler {
                    path: path.clone(),
                    method: method_name.to_string(),
                    handler: handler_name.to_string(),
                })?;
                debug!(method = %method, path = %path, handler = %handler_name, "Registering route");
                host.route(method, path, Arc::clone(handler));
                registered += 1;
            }
        }

        info!(routes_count = registered, "Route table loaded");
        Ok(())
    }

    /// Resolve and read a route file without registering anything.
    pub fn read_table(&self, filename: Option<&Path>) -> Result<RouteSpec, LoadError> {
        let path = source::resolve_path(&self.config, filename, &self.config.default_route_filename);
        let value = source::read_document(&self.config, &path)?;
        RouteSpec::from_value(value).map_err(|reason| LoadError::parse(&path, reason))
    }
}
