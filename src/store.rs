//! [`ConfigStore`] implementations: in-memory and JSON-file backed.

use crate::error::{MirrorError, Result};
use crate::host::ConfigStore;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

fn lookup<'a>(doc: &'a Value, key: &str) -> Option<&'a Value> {
    key.split('.')
        .try_fold(doc, |node, segment| node.as_object()?.get(segment))
}

fn assign(doc: &mut Value, key: &str, value: Value) -> Result<()> {
    if key.is_empty() {
        return Err(MirrorError::Config("empty config key".to_string()));
    }
    if !doc.is_object() {
        *doc = Value::Object(Map::new());
    }

    let segments: Vec<&str> = key.split('.').collect();
    let (last, parents) = segments
        .split_last()
        .ok_or_else(|| MirrorError::Config("empty config key".to_string()))?;

    let mut node = doc;
    for segment in parents {
        let obj = node
            .as_object_mut()
            .ok_or_else(|| MirrorError::Config(format!("{} is not an object", key)))?;
        node = obj
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !node.is_object() {
            return Err(MirrorError::Config(format!(
                "cannot set {}: {} is not an object",
                key, segment
            )));
        }
    }

    node.as_object_mut()
        .ok_or_else(|| MirrorError::Config(format!("{} is not an object", key)))?
        .insert(last.to_string(), value);
    Ok(())
}

/// Process-local store, used by embedders without persistent config and by tests.
#[derive(Debug, Default)]
pub struct MemoryConfigStore {
    doc: RwLock<Value>,
}

impl MemoryConfigStore {
    pub fn new() -> Self {
        Self::from_value(Value::Object(Map::new()))
    }

    pub fn from_value(doc: Value) -> Self {
        MemoryConfigStore {
            doc: RwLock::new(doc),
        }
    }

    pub fn to_value(&self) -> Value {
        self.doc.read().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl ConfigStore for MemoryConfigStore {
    fn get(&self, key: &str) -> Option<Value> {
        let doc = self.doc.read().unwrap_or_else(|e| e.into_inner());
        lookup(&doc, key).cloned()
    }

    fn set(&self, key: &str, value: Value) -> Result<()> {
        let mut doc = self.doc.write().unwrap_or_else(|e| e.into_inner());
        assign(&mut doc, key, value)
    }
}

/// Store persisted as a single JSON document on disk.
///
/// Every `set` rewrites the file.
#[derive(Debug)]
pub struct JsonFileConfigStore {
    path: PathBuf,
    inner: MemoryConfigStore,
}

impl JsonFileConfigStore {
    /// Load `path`, or start from an empty document if it is missing or invalid.
    pub fn load_or_default(path: &Path) -> Self {
        let doc = if path.exists() {
            match std::fs::read_to_string(path) {
                Ok(content) => match serde_json::from_str::<Value>(&content) {
                    Ok(doc) if doc.is_object() => {
                        tracing::info!("Loaded config from {}", path.display());
                        doc
                    }
                    Ok(_) => {
                        tracing::error!(
                            "Config at {} is not a JSON object, using defaults",
                            path.display()
                        );
                        Value::Object(Map::new())
                    }
                    Err(e) => {
                        tracing::error!(
                            "Failed to parse {}: {}, using defaults",
                            path.display(),
                            e
                        );
                        Value::Object(Map::new())
                    }
                },
                Err(e) => {
                    tracing::error!("Failed to read {}: {}, using defaults", path.display(), e);
                    Value::Object(Map::new())
                }
            }
        } else {
            tracing::info!("No config at {}, starting empty", path.display());
            Value::Object(Map::new())
        };

        JsonFileConfigStore {
            path: path.to_path_buf(),
            inner: MemoryConfigStore::from_value(doc),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn save(&self) -> Result<()> {
        write_document(&self.path, &self.inner.to_value())
    }
}

fn write_document(path: &Path, doc: &Value) -> Result<()> {
    let content = serde_json::to_string_pretty(doc)?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, content)?;
    Ok(())
}

impl ConfigStore for JsonFileConfigStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.inner.get(key)
    }

    /// The new document only replaces the in-memory one once it is on disk.
    fn set(&self, key: &str, value: Value) -> Result<()> {
        let mut doc = self.inner.doc.write().unwrap_or_else(|e| e.into_inner());
        let mut candidate = doc.clone();
        assign(&mut candidate, key, value)?;
        write_document(&self.path, &candidate)?;
        *doc = candidate;
        Ok(())
    }
}
