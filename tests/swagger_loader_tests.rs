#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::handlers::{named, recording_observer};
use common::temp_files::SpecDir;
use http::Method;
use serde_json::{json, Value};
use specroute::config::LoaderConfig;
use specroute::error::LoadError;
use specroute::host::{App, Dispatch, HandlerRegistry, HostMethod, Request, Scope};
use specroute::swagger::{CastValue, SwaggerLoadOptions, SwaggerLoader};
use std::sync::{Arc, Mutex};

fn abc_document() -> Value {
    json!({
        "swagger": "2.0",
        "info": { "title": "abc", "version": "1.0.0" },
        "paths": {
            "/abc": { "get": { "operationId": "getAbc" } }
        }
    })
}

#[test]
fn test_abc_route_ignores_unrelated_query() {
    let handlers = named(&["getAbc"]);
    let mut app = App::new();
    SwaggerLoader::default()
        .load(
            &mut app,
            SwaggerLoadOptions::new(&handlers).with_specs(abc_document()),
        )
        .unwrap();

    let mut req = Request::get("/abc?unrelated=1");
    let dispatch = app.dispatch(&mut req);
    let res = dispatch.response().expect("answered");
    assert_eq!(res.body(), Some(&json!({ "handler": "getAbc" })));
    // The scratch exists but nothing undeclared was copied into it.
    let scratch = req.swagger.expect("scratch created");
    assert!(scratch.get(Scope::Query, "unrelated").is_none());
}

#[test]
fn test_templated_paths_are_translated() {
    let handlers = HandlerRegistry::new().with("getPost", |req, res, _next| {
        let swagger = req.swagger.as_ref().unwrap();
        res.json(json!({
            "id": swagger.get(Scope::Path, "id").unwrap().to_json(),
            "postId": swagger.get(Scope::Path, "postId").unwrap().to_json(),
        }));
        Ok(())
    });
    let doc = json!({
        "paths": {
            "/users/{id}/posts/{postId}": {
                "get": {
                    "operationId": "getPost",
                    "parameters": [
                        { "name": "id", "in": "path", "type": "integer" },
                        { "name": "postId", "in": "path", "type": "string" }
                    ]
                }
            }
        }
    });
    let mut app = App::new();
    SwaggerLoader::default()
        .load(&mut app, SwaggerLoadOptions::new(&handlers).with_specs(doc))
        .unwrap();

    assert_eq!(
        app.routes(),
        vec![(HostMethod::Get, "/users/:id/posts/:postId".to_string())]
    );
    let dispatch = app.dispatch(&mut Request::get("/users/12/posts/hello"));
    assert_eq!(
        dispatch.response().unwrap().body(),
        Some(&json!({ "id": 12, "postId": "hello" }))
    );
}

#[test]
fn test_swagger_json_is_served_when_exposed() {
    let handlers = named(&["getAbc"]);
    let mut app = App::new();
    SwaggerLoader::new(LoaderConfig::default().with_expose_swagger_json(true))
        .load(
            &mut app,
            SwaggerLoadOptions::new(&handlers).with_specs(abc_document()),
        )
        .unwrap();

    let dispatch = app.dispatch(&mut Request::get("/swagger.json"));
    let res = dispatch.response().unwrap();
    assert_eq!(res.status_code(), 200);
    assert_eq!(res.body(), Some(&abc_document()));
}

#[test]
fn test_swagger_json_is_absent_by_default() {
    let handlers = named(&["getAbc"]);
    let mut app = App::new();
    SwaggerLoader::default()
        .load(
            &mut app,
            SwaggerLoadOptions::new(&handlers).with_specs(abc_document()),
        )
        .unwrap();

    assert_eq!(app.dispatch(&mut Request::get("/swagger.json")), Dispatch::NotFound);
}

#[test]
fn test_version_override_is_served() {
    let handlers = named(&["getAbc"]);
    let mut app = App::new();
    SwaggerLoader::new(LoaderConfig::default().with_expose_swagger_json(true))
        .load(
            &mut app,
            SwaggerLoadOptions::new(&handlers)
                .with_specs(abc_document())
                .with_version("2.3.4"),
        )
        .unwrap();

    let dispatch = app.dispatch(&mut Request::get("/swagger.json"));
    let body = dispatch.response().unwrap().body().unwrap();
    assert_eq!(body["info"]["version"], "2.3.4");
    assert_eq!(body["info"]["title"], "abc");
}

#[test]
fn test_empty_operation_is_missing_spec() {
    let handlers = named(&["getAbc"]);
    let mut app = App::new();
    let err = SwaggerLoader::default()
        .load(
            &mut app,
            SwaggerLoadOptions::new(&handlers)
                .with_specs(json!({ "paths": { "/abc": { "get": null } } })),
        )
        .unwrap_err();
    assert!(matches!(err, LoadError::MissingSpec { ref path, ref method } if path == "/abc" && method == "get"));
    assert!(app.is_empty());
}

#[test]
fn test_unknown_operation_id_is_missing_handler() {
    let handlers = named(&[]);
    let mut app = App::new();
    let err = SwaggerLoader::default()
        .load(
            &mut app,
            SwaggerLoadOptions::new(&handlers).with_specs(abc_document()),
        )
        .unwrap_err();
    assert!(matches!(err, LoadError::MissingHandler { ref operation_id, .. } if operation_id == "getAbc"));
}

#[test]
fn test_unknown_method_is_invalid_method() {
    let handlers = named(&["fetchAbc"]);
    let mut app = App::new();
    let err = SwaggerLoader::default()
        .load(
            &mut app,
            SwaggerLoadOptions::new(&handlers).with_specs(json!({
                "paths": { "/abc": { "fetch": { "operationId": "fetchAbc" } } }
            })),
        )
        .unwrap_err();
    assert!(matches!(err, LoadError::InvalidMethod { .. }));
}

#[test]
fn test_missing_handlers_and_paths_are_configuration_errors() {
    let mut app = App::new();
    let err = SwaggerLoader::default()
        .load(
            &mut app,
            SwaggerLoadOptions {
                specs: Some(abc_document()),
                ..SwaggerLoadOptions::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, LoadError::Configuration(_)));

    let handlers = named(&[]);
    let err = SwaggerLoader::default()
        .load(
            &mut app,
            SwaggerLoadOptions::new(&handlers).with_specs(json!({ "info": {} })),
        )
        .unwrap_err();
    assert!(matches!(err, LoadError::Configuration(_)));
}

#[test]
fn test_path_item_fields_are_not_operations() {
    let handlers = named(&["listPets"]);
    let mut app = App::new();
    SwaggerLoader::default()
        .load(
            &mut app,
            SwaggerLoadOptions::new(&handlers).with_specs(json!({
                "paths": {
                    "/pets": {
                        "summary": "Pets",
                        "parameters": [{ "name": "limit", "in": "query", "type": "integer" }],
                        "x-internal": true,
                        "get": { "operationId": "listPets" }
                    }
                }
            })),
        )
        .unwrap();
    assert_eq!(app.routes(), vec![(HostMethod::Get, "/pets".to_string())]);
}

#[test]
fn test_handler_error_goes_to_observer_and_leaves_request_unanswered() {
    let handlers = HandlerRegistry::new().with("boom", |_req, _res, _next| {
        Err(anyhow::anyhow!("database unavailable"))
    });
    let (observer, seen) = recording_observer();
    let mut app = App::new();
    SwaggerLoader::default()
        .with_observer(observer)
        .load(
            &mut app,
            SwaggerLoadOptions::new(&handlers).with_specs(json!({
                "paths": { "/boom": { "post": { "operationId": "boom" } } }
            })),
        )
        .unwrap();

    let dispatch = app.dispatch(&mut Request::new(Method::POST, "/boom"));
    assert_eq!(dispatch, Dispatch::Unanswered);
    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert!(seen[0].contains("boom"));
    assert!(seen[0].contains("database unavailable"));
}

#[test]
fn test_handler_panic_goes_to_observer() {
    let handlers = HandlerRegistry::new().with("panics", |_req, _res, _next| {
        panic!("handler exploded");
    });
    let (observer, seen) = recording_observer();
    let mut app = App::new();
    SwaggerLoader::default()
        .with_observer(observer)
        .load(
            &mut app,
            SwaggerLoadOptions::new(&handlers).with_specs(json!({
                "paths": { "/panic": { "get": { "operationId": "panics" } } }
            })),
        )
        .unwrap();

    assert_eq!(app.dispatch(&mut Request::get("/panic")), Dispatch::Unanswered);
    assert!(seen.lock().unwrap()[0].contains("handler exploded"));
}

#[test]
fn test_malformed_parameter_is_reported_and_handler_still_runs() {
    let calls = Arc::new(Mutex::new(0u32));
    let counter = Arc::clone(&calls);
    let handlers = HandlerRegistry::new().with("getAbc", move |req, res, _next| {
        *counter.lock().unwrap() += 1;
        let limit = req
            .swagger
            .as_ref()
            .and_then(|s| s.get(Scope::Query, "limit"))
            .cloned();
        assert_eq!(limit, Some(CastValue::Integer(5)));
        res.send_text("ok");
        Ok(())
    });
    let (observer, seen) = recording_observer();
    let mut app = App::new();
    SwaggerLoader::default()
        .with_observer(observer)
        .load(
            &mut app,
            SwaggerLoadOptions::new(&handlers).with_specs(json!({
                "paths": {
                    "/abc": {
                        "get": {
                            "operationId": "getAbc",
                            "parameters": [
                                42,
                                { "name": "limit", "in": "query", "type": "integer" }
                            ]
                        }
                    }
                }
            })),
        )
        .unwrap();

    let dispatch = app.dispatch(&mut Request::get("/abc?limit=5"));
    assert!(dispatch.response().is_some());
    assert_eq!(*calls.lock().unwrap(), 1);
    assert_eq!(seen.lock().unwrap().len(), 1);
}

#[test]
fn test_loads_yaml_document_from_file() {
    let dir = SpecDir::new();
    dir.write(
        "openapi.yaml",
        r#"
openapi: 3.0.0
info:
  title: pets
  version: 0.1.0
paths:
  /pets/{petId}:
    get:
      operationId: getPet
    delete:
      operationId: deletePet
"#,
    );
    let handlers = named(&["getPet", "deletePet"]);
    let mut app = App::new();
    SwaggerLoader::new(LoaderConfig::default().with_root_dir(dir.path()))
        .load(
            &mut app,
            SwaggerLoadOptions::new(&handlers).with_filename("openapi.yaml"),
        )
        .unwrap();

    assert_eq!(
        app.routes(),
        vec![
            (HostMethod::Get, "/pets/:petId".to_string()),
            (HostMethod::Delete, "/pets/:petId".to_string()),
        ]
    );
}

#[test]
fn test_default_swagger_file_not_found() {
    let dir = SpecDir::new();
    let handlers = named(&[]);
    let mut app = App::new();
    let err = SwaggerLoader::new(LoaderConfig::default().with_root_dir(dir.path()))
        .load(&mut app, SwaggerLoadOptions::new(&handlers))
        .unwrap_err();
    assert!(matches!(err, LoadError::NotFound { ref path } if path.ends_with("swagger.json")));
}

#[test]
fn test_next_passes_request_to_later_layer() {
    let handlers = HandlerRegistry::new()
        .with("tagRequest", |_req, _res, next| {
            next.call();
            Ok(())
        })
        .with("getAbc", |req, res, _next| {
            let limit = req
                .swagger
                .as_ref()
                .and_then(|s| s.get(Scope::Query, "limit"))
                .cloned();
            assert_eq!(limit, Some(CastValue::Integer(3)));
            res.send_text("second");
            Ok(())
        });
    let doc = |operation_id: &str| {
        json!({
            "paths": {
                "/abc": {
                    "get": {
                        "operationId": operation_id,
                        "parameters": [{ "name": "limit", "in": "query", "type": "integer" }]
                    }
                }
            }
        })
    };
    let loader = SwaggerLoader::default();
    let mut app = App::new();
    loader
        .load(&mut app, SwaggerLoadOptions::new(&handlers).with_specs(doc("tagRequest")))
        .unwrap();
    loader
        .load(&mut app, SwaggerLoadOptions::new(&handlers).with_specs(doc("getAbc")))
        .unwrap();

    let dispatch = app.dispatch(&mut Request::get("/abc?limit=3"));
    assert_eq!(
        dispatch.response().and_then(|r| r.body()),
        Some(&json!("second"))
    );
}

#[test]
fn test_reload_is_additive_and_first_swagger_json_wins() {
    let handlers = named(&["getAbc"]);
    let loader = SwaggerLoader::new(LoaderConfig::default().with_expose_swagger_json(true));
    let mut app = App::new();
    loader
        .load(
            &mut app,
            SwaggerLoadOptions::new(&handlers)
                .with_specs(abc_document())
                .with_version("1.0.0"),
        )
        .unwrap();
    loader
        .load(
            &mut app,
            SwaggerLoadOptions::new(&handlers)
                .with_specs(abc_document())
                .with_version("2.0.0"),
        )
        .unwrap();

    assert_eq!(
        app.routes(),
        vec![
            (HostMethod::Get, "/abc".to_string()),
            (HostMethod::Get, "/swagger.json".to_string()),
            (HostMethod::Get, "/abc".to_string()),
            (HostMethod::Get, "/swagger.json".to_string()),
        ]
    );
    let dispatch = app.dispatch(&mut Request::get("/swagger.json"));
    let body = dispatch.response().unwrap().body().unwrap();
    assert_eq!(body["info"]["version"], "1.0.0");
}
