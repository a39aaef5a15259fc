//! # CLI Module
//!
//! Command-line access to the loaders.
//!
//! ## Commands
//!
//! ### `check`
//!
//! Load a flat route table and/or a Swagger document against placeholder
//! handlers and print the resulting route table:
//!
//! ```bash
//! specroute check --routes config/routes.json --swagger config/swagger.yaml
//! ```
//!
//! Options:
//! - `--routes <FILE>` - Flat route table to load
//! - `--swagger <FILE>` - Swagger/OpenAPI document to load
//! - `--config <FILE>` - YAML loader configuration (defaults + `SPECROUTE_*` otherwise)
//! - `--version <VERSION>` - Override `info.version` of the Swagger document
//!
//! With neither `--routes` nor `--swagger`, both configured default files are
//! loaded. Any load-time error exits non-zero.

mod commands;

pub use commands::{check, placeholder_registry, run_cli, CheckReport, Cli, Commands};
