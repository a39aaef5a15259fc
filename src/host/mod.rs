//! # Host Module
//!
//! The HTTP application host that loaders register routes against.
//!
//! Loaders only see the [`RouteHost`] trait. Method names coming from route
//! files are mapped onto host registration calls through [`HostMethod::parse`],
//! an explicit lookup table whose default arm is
//! [`LoadError::InvalidMethod`].
//!
//! [`App`] is the in-process implementation: an ordered layer table with
//! first-registered-wins dispatch and a `next` continuation.

mod app;
mod path;
mod request;

pub use app::{App, Dispatch};
pub use path::PathPattern;
pub use request::{Request, Response, Scope, SwaggerParams};

use crate::error::LoadError;
use std::cell::Cell;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A request handler: `(request, response, next)`.
///
/// Returning `Err` hands the error to the host's default error responder.
pub type Handler =
    Arc<dyn Fn(&mut Request, &mut Response, &Next) -> anyhow::Result<()> + Send + Sync>;

/// Wrap a closure as a [`Handler`].
pub fn handler<F>(f: F) -> Handler
where
    F: Fn(&mut Request, &mut Response, &Next) -> anyhow::Result<()> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Registration functions the host exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    All,
    Use,
    Head,
}

impl HostMethod {
    pub const ALL: [HostMethod; 8] = [
        HostMethod::Get,
        HostMethod::Post,
        HostMethod::Put,
        HostMethod::Patch,
        HostMethod::Delete,
        HostMethod::All,
        HostMethod::Use,
        HostMethod::Head,
    ];

    /// Look up the registration function named `name`.
    ///
    /// Names are the lowercase spellings used in route files; `path` is only
    /// used to build the error.
    pub fn parse(name: &str, path: &str) -> Result<Self, LoadError> {
        match name {
            "get" => Ok(HostMethod::Get),
            "post" => Ok(HostMethod::Post),
            "put" => Ok(HostMethod::Put),
            "patch" => Ok(HostMethod::Patch),
            "delete" => Ok(HostMethod::Delete),
            "all" => Ok(HostMethod::All),
            "use" => Ok(HostMethod::Use),
            "head" => Ok(HostMethod::Head),
            _ => Err(LoadError::InvalidMethod {
                path: path.to_string(),
                method: name.to_string(),
            }),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            HostMethod::Get => "get",
            HostMethod::Post => "post",
            HostMethod::Put => "put",
            HostMethod::Patch => "patch",
            HostMethod::Delete => "delete",
            HostMethod::All => "all",
            HostMethod::Use => "use",
            HostMethod::Head => "head",
        }
    }

    /// Whether a layer registered with this method answers `method`.
    ///
    /// `get` layers also answer `HEAD`; `all` and `use` answer everything.
    pub fn accepts(self, method: &http::Method) -> bool {
        match self {
            HostMethod::Get => method == http::Method::GET || method == http::Method::HEAD,
            HostMethod::Post => method == http::Method::POST,
            HostMethod::Put => method == http::Method::PUT,
            HostMethod::Patch => method == http::Method::PATCH,
            HostMethod::Delete => method == http::Method::DELETE,
            HostMethod::Head => method == http::Method::HEAD,
            HostMethod::All | HostMethod::Use => true,
        }
    }
}

impl fmt::Display for HostMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Something routes can be registered on.
///
/// Registration is additive: hosts never replace or deduplicate layers.
pub trait RouteHost {
    fn route(&mut self, method: HostMethod, path: &str, handler: Handler);

    fn get(&mut self, path: &str, handler: Handler) {
        self.route(HostMethod::Get, path, handler);
    }
    fn post(&mut self, path: &str, handler: Handler) {
        self.route(HostMethod::Post, path, handler);
    }
    fn put(&mut self, path: &str, handler: Handler) {
        self.route(HostMethod::Put, path, handler);
    }
    fn patch(&mut self, path: &str, handler: Handler) {
        self.route(HostMethod::Patch, path, handler);
    }
    fn delete(&mut self, path: &str, handler: Handler) {
        self.route(HostMethod::Delete, path, handler);
    }
    fn all(&mut self, path: &str, handler: Handler) {
        self.route(HostMethod::All, path, handler);
    }
    fn use_(&mut self, path: &str, handler: Handler) {
        self.route(HostMethod::Use, path, handler);
    }
    fn head(&mut self, path: &str, handler: Handler) {
        self.route(HostMethod::Head, path, handler);
    }
}

/// Continuation passed to every handler.
///
/// Calling [`Next::call`] tells the host to keep looking for matching layers
/// once the current handler returns.
#[derive(Debug, Default)]
pub struct Next {
    called: Cell<bool>,
}

impl Next {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn call(&self) {
        self.called.set(true);
    }

    pub fn was_called(&self) -> bool {
        self.called.get()
    }
}

/// Handler name to [`Handler`] mapping supplied to the loaders.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Handler>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `f` under `name`, replacing any previous entry.
    pub fn insert<F>(&mut self, name: impl Into<String>, f: F) -> &mut Self
    where
        F: Fn(&mut Request, &mut Response, &Next) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.handlers.insert(name.into(), Arc::new(f));
        self
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&mut Request, &mut Response, &Next) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.insert(name, f);
        self
    }

    pub fn insert_handler(&mut self, name: impl Into<String>, handler: Handler) -> &mut Self {
        self.handlers.insert(name.into(), handler);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Handler> {
        self.handlers.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.handlers.keys().collect();
        names.sort();
        f.debug_struct("HandlerRegistry")
            .field("handlers", &names)
            .finish()
    }
}
