//! # specroute
//!
//! **specroute** declares routes on an HTTP application host from data: either a
//! flat JSON route table or a Swagger/OpenAPI document. Swagger-declared
//! parameters are cast to typed values on every request before the handler
//! runs.
//!
//! ## Overview
//!
//! - **[`routes`]** - Route Table Loader: `path → method → handler name`
//! - **[`swagger`]** - Swagger Route Loader: `operationId` lookup, path
//!   translation, per-request parameter casting, `/swagger.json` exposure
//! - **[`host`]** - The host seam ([`host::RouteHost`]) and an in-process host
//!   ([`host::App`]) with ordered, first-match dispatch
//! - **[`config`]** - Default filenames, exposure flag, file encoding
//! - **[`error`]** - Load-time errors and the non-propagating cast error
//! - **[`otel`]** - Structured logging setup
//! - **[`cli`]** - The `specroute check` command
//!
//! ### Swagger Request Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Client
//!     participant Host as App
//!     participant Wrapper as Swagger wrapper
//!     participant Caster as cast_parameter
//!     participant Handler
//!     participant Observer as ErrorObserver
//!
//!     Client->>Host: GET /users/7?tags=a,b
//!     Host->>Host: Match /users/:id (first registered wins)
//!     Host->>Wrapper: (req, res, next)
//!     Wrapper->>Wrapper: ensure req.swagger
//!     loop every declared parameter
//!         Wrapper->>Caster: cast_parameter(req, spec)
//!         Caster-->>Wrapper: Cast | Skipped | Failed
//!         alt Failed
//!             Wrapper->>Observer: RequestFailure::Cast
//!         end
//!     end
//!     Wrapper->>Handler: (req, res, next)
//!     alt handler error or panic
//!         Wrapper->>Observer: RequestFailure::Handler / Panic
//!     end
//!     Wrapper-->>Host: Ok(())
//!     Host-->>Client: response (or none)
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use specroute::config::LoaderConfig;
//! use specroute::host::{App, HandlerRegistry, Request};
//! use specroute::swagger::{SwaggerLoadOptions, SwaggerLoader};
//! use serde_json::json;
//!
//! let handlers = HandlerRegistry::new().with("getAbc", |_req, res, _next| {
//!     res.json(json!({ "abc": true }));
//!     Ok(())
//! });
//!
//! let mut app = App::new();
//! SwaggerLoader::new(LoaderConfig::default().with_expose_swagger_json(true))
//!     .load(
//!         &mut app,
//!         SwaggerLoadOptions::new(&handlers)
//!             .with_specs(json!({ "paths": { "/abc": { "get": { "operationId": "getAbc" } } } })),
//!     )
//!     .unwrap();
//!
//! assert!(app.dispatch(&mut Request::get("/abc?unrelated=1")).response().is_some());
//! assert!(app.dispatch(&mut Request::get("/swagger.json")).response().is_some());
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod host;
pub mod otel;
pub mod routes;
pub mod source;
pub mod swagger;

pub use config::{FileEncoding, LoaderConfig};
pub use error::{CastError, LoadError};
pub use host::{App, Dispatch, HandlerRegistry, HostMethod, Request, Response, RouteHost};
pub use routes::{RouteLoadOptions, RouteLoader, RouteSpec, RouteTarget};
pub use swagger::{
    cast_parameter, translate_path, CastOutcome, CastValue, ErrorObserver, ParameterSpec,
    RequestFailure, SkipReason, SwaggerDocument, SwaggerLoadOptions, SwaggerLoader,
};
