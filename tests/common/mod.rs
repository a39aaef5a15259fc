#![allow(dead_code)]

pub mod temp_files {
    use std::path::PathBuf;
    use tempfile::TempDir;

    /// A temporary directory holding spec files; removed on drop.
    pub struct SpecDir {
        dir: TempDir,
    }

    impl SpecDir {
        pub fn new() -> Self {
            Self {
                dir: tempfile::tempdir().unwrap(),
            }
        }

        pub fn path(&self) -> PathBuf {
            self.dir.path().to_path_buf()
        }

        /// Write `content` to `name` inside the directory and return its path.
        pub fn write(&self, name: &str, content: &str) -> PathBuf {
            let path = self.dir.path().join(name);
            std::fs::write(&path, content).unwrap();
            path
        }

        pub fn write_bytes(&self, name: &str, content: &[u8]) -> PathBuf {
            let path = self.dir.path().join(name);
            std::fs::write(&path, content).unwrap();
            path
        }
    }
}

pub mod handlers {
    use serde_json::json;
    use specroute::host::HandlerRegistry;
    use specroute::swagger::{ErrorObserver, RequestFailure};
    use std::sync::{Arc, Mutex};

    /// Registry whose handlers answer with `{"handler": <name>}`.
    pub fn named(names: &[&str]) -> HandlerRegistry {
        let mut registry = HandlerRegistry::new();
        for name in names {
            let label = name.to_string();
            registry.insert(*name, move |_req, res, _next| {
                res.json(json!({ "handler": label }));
                Ok(())
            });
        }
        registry
    }

    /// Observer that records failure messages.
    pub fn recording_observer() -> (ErrorObserver, Arc<Mutex<Vec<String>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let observer: ErrorObserver = Arc::new(move |failure: &RequestFailure| {
            sink.lock().unwrap().push(failure.to_string());
        });
        (observer, seen)
    }
}
