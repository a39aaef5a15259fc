use super::path::PathPattern;
use super::request::{Request, Response};
use super::{Handler, HostMethod, Next, RouteHost};
use serde_json::json;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

struct Layer {
    method: HostMethod,
    pattern: PathPattern,
    handler: Handler,
}

/// Result of dispatching one request through an [`App`].
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch {
    /// A handler (or the default error responder) answered.
    Responded(Response),
    /// A handler returned without answering and without calling `next`.
    /// An HTTP client would be left waiting.
    Unanswered,
    /// No layer matched, or every matching layer passed on.
    NotFound,
}

impl Dispatch {
    pub fn response(&self) -> Option<&Response> {
        match self {
            Dispatch::Responded(res) => Some(res),
            _ => None,
        }
    }
}

/// In-process application host.
///
/// Layers are kept in registration order and the first matching layer runs
/// first. A handler that calls [`Next::call`] passes the request on to the
/// next matching layer.
#[derive(Default)]
pub struct App {
    layers: Vec<Layer>,
}

impl App {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registered `(method, path)` pairs in registration order.
    pub fn routes(&self) -> Vec<(HostMethod, String)> {
        self.layers
            .iter()
            .map(|l| (l.method, l.pattern.as_str().to_string()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Run `req` through the matching layers.
    ///
    /// The request is borrowed mutably so callers can inspect what handlers
    /// wrote onto it (path params, the Swagger scratch).
    pub fn dispatch(&self, req: &mut Request) -> Dispatch {
        debug!(method = %req.method, path = %req.path, "Dispatch attempt");

        for layer in &self.layers {
            if !layer.method.accepts(&req.method) {
                continue;
            }
            let Some(params) = layer.pattern.captures(&req.path) else {
                continue;
            };
            req.params = params;

            let mut res = Response::new();
            let next = Next::new();
            if let Err(err) = (layer.handler)(&mut *req, &mut res, &next) {
                error!(
                    method = %req.method,
                    path = %req.path,
                    route_pattern = %layer.pattern.as_str(),
                    error = %err,
                    "Handler failed"
                );
                let mut failure = Response::new();
                failure
                    .status(500)
                    .json(json!({ "error": "Internal Server Error", "details": err.to_string() }));
                return Dispatch::Responded(failure);
            }

            if res.is_sent() {
                info!(
                    method = %req.method,
                    path = %req.path,
                    route_pattern = %layer.pattern.as_str(),
                    status = res.status_code(),
                    "Request answered"
                );
                return Dispatch::Responded(res);
            }
            if !next.was_called() {
                warn!(
                    method = %req.method,
                    path = %req.path,
                    route_pattern = %layer.pattern.as_str(),
                    "Handler returned without responding"
                );
                return Dispatch::Unanswered;
            }
        }

        warn!(method = %req.method, path = %req.path, "No route matched");
        Dispatch::NotFound
    }
}

impl RouteHost for App {
    fn route(&mut self, method: HostMethod, path: &str, handler: Handler) {
        let pattern = match method {
            HostMethod::Use => PathPattern::prefix(path),
            _ => PathPattern::exact(path),
        };
        match pattern {
            Ok(pattern) => {
                debug!(method = %method, path = %path, "Route registered");
                self.layers.push(Layer {
                    method,
                    pattern,
                    handler,
                });
            }
            Err(err) => {
                error!(method = %method, path = %path, error = %err, "Unusable route path");
            }
        }
    }
}

impl fmt::Debug for App {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("App").field("routes", &self.routes()).finish()
    }
}

impl Clone for Layer {
    fn clone(&self) -> Self {
        Self {
            method: self.method,
            pattern: self.pattern.clone(),
            handler: Arc::clone(&self.handler),
        }
    }
}

impl Clone for App {
    fn clone(&self) -> Self {
        Self {
            layers: self.layers.clone(),
        }
    }
}
