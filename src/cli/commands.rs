use crate::config::LoaderConfig;
use crate::error::LoadError;
use crate::host::{App, HandlerRegistry, HostMethod};
use crate::routes::{RouteLoadOptions, RouteLoader};
use crate::source;
use crate::swagger::{SwaggerDocument, SwaggerLoadOptions, SwaggerLoader};
use anyhow::Context;
use clap::{Parser, Subcommand};
use serde_json::json;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::info;

/// Command-line interface for specroute
#[derive(Parser)]
#[command(name = "specroute")]
#[command(about = "Load route tables and Swagger documents onto a host", long_about = None)]
pub struct Cli {
    /// Log level: trace/debug/info/warn/error
    #[arg(long, global = true, default_value = "warn", env = "SPECROUTE_LOG_LEVEL")]
    pub log_level: String,

    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Load route files against placeholder handlers and print the route table
    Check {
        /// Flat route table (JSON)
        #[arg(short, long)]
        routes: Option<PathBuf>,

        /// Swagger/OpenAPI document (JSON or YAML)
        #[arg(short, long)]
        swagger: Option<PathBuf>,

        /// Loader configuration file (YAML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Override `info.version` of the Swagger document
        #[arg(long)]
        version: Option<String>,
    },
}

/// Routes registered by [`check`], in registration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckReport {
    pub routes: Vec<(HostMethod, String)>,
}

/// Registry answering every name in `names` with `501 Not Implemented`.
pub fn placeholder_registry<I>(names: I) -> HandlerRegistry
where
    I: IntoIterator<Item = String>,
{
    let mut registry = HandlerRegistry::new();
    for name in names {
        let label = name.clone();
        registry.insert(name, move |_req, res, _next| {
            res.status(501)
                .json(json!({ "error": "Not Implemented", "handler": label }));
            Ok(())
        });
    }
    registry
}

/// Load the given files onto a fresh [`App`] with placeholder handlers.
///
/// With neither file given, both configured defaults are loaded.
pub fn check(
    config: &LoaderConfig,
    routes: Option<&Path>,
    swagger: Option<&Path>,
    version: Option<&str>,
) -> Result<CheckReport, LoadError> {
    let (routes, swagger) = match (routes, swagger) {
        (None, None) => (Some(Path::new("")), Some(Path::new(""))),
        other => other,
    };
    let mut app = App::new();

    if let Some(filename) = routes {
        let loader = RouteLoader::new(config.clone());
        let table = loader.read_table(Some(filename))?;
        let names: BTreeSet<String> = table
            .entries()
            .iter()
            .flat_map(|(_, target)| target.pairs())
            .map(|(_, handler)| handler.to_string())
            .collect();
        let handlers = placeholder_registry(names);
        loader.load(&mut app, &RouteLoadOptions::new(&handlers).with_specs(table))?;
    }

    if let Some(filename) = swagger {
        let (raw, _) = source::resolve_document(
            config,
            None,
            Some(filename),
            &config.default_swagger_filename,
        )?;
        let handlers = placeholder_registry(operation_ids(&SwaggerDocument::new(raw.clone())));
        let mut options = SwaggerLoadOptions::new(&handlers).with_specs(raw);
        options.version = version.map(str::to_string);
        SwaggerLoader::new(config.clone()).load(&mut app, options)?;
    }

    Ok(CheckReport {
        routes: app.routes(),
    })
}

fn operation_ids(document: &SwaggerDocument) -> BTreeSet<String> {
    document
        .paths()
        .into_iter()
        .flat_map(|paths| paths.values())
        .filter_map(|item| item.as_object())
        .flat_map(|methods| methods.values())
        .filter_map(|op| op.get("operationId").and_then(|v| v.as_str()))
        .map(str::to_string)
        .collect()
}

/// Execute the CLI command provided by the user
pub fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();
    crate::otel::init_logging(&cli.log_level)?;

    match &cli.command {
        Commands::Check {
            routes,
            swagger,
            config,
            version,
        } => {
            let mut loader_config = match config {
                Some(path) => LoaderConfig::from_yaml_file(path)?,
                None => LoaderConfig::default(),
            };
            loader_config.apply_env();

            let report = check(
                &loader_config,
                routes.as_deref(),
                swagger.as_deref(),
                version.as_deref(),
            )
            .context("route check failed")?;

            info!(routes_count = report.routes.len(), "Route check passed");
            println!("[routes] count={}", report.routes.len());
            for (method, path) in &report.routes {
                println!("[route] {method} {path}");
            }
            Ok(())
        }
    }
}
