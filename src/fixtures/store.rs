//! File-backed and in-memory fixture providers.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;
use std::sync::{PoisonError, RwLock};

use log::debug;
use serde::Serialize;
use serde_json::Value;
use serde_json::value::RawValue;

use super::{FixtureProvider, FixtureSet, is_null, project};
use crate::{DecodeStage, EffconfError};

/// A fixture document loaded once and served read-only.
#[derive(Debug, Clone, Default)]
pub struct FixtureFile {
    documents: FixtureSet,
}

impl FixtureFile {
    /// Read and parse the fixture document at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`EffconfError::Io`] when the file cannot be read and
    /// [`EffconfError::Decode`] when it is not a JSON object.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, EffconfError> {
        let path = path.as_ref();
        debug!("loading fixture file {}", path.display());
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text).map_err(|err| match err {
            EffconfError::Decode { stage, message } => EffconfError::decode(
                stage,
                format_args!("{}: {message}", path.display()),
            ),
            other => other,
        })
    }

    /// Parse a fixture document from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`EffconfError::Decode`] when `text` is not a JSON object.
    pub fn from_json_str(text: &str) -> Result<Self, EffconfError> {
        let documents: FixtureSet = serde_json::from_str(text)
            .map_err(|e| EffconfError::decode(DecodeStage::FixtureDecode, e))?;
        Ok(Self { documents })
    }

    #[must_use]
    pub fn documents(&self) -> &FixtureSet {
        &self.documents
    }

    /// Kind names present in the document, including `null` ones.
    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.documents.keys().map(String::as_str)
    }
}

impl From<FixtureSet> for FixtureFile {
    fn from(documents: FixtureSet) -> Self {
        Self { documents }
    }
}

impl FixtureProvider for FixtureFile {
    fn fixtures(&self, kinds: &BTreeSet<String>) -> Result<FixtureSet, EffconfError> {
        project(&self.documents, kinds)
    }
}

/// In-memory registry of captured objects grouped by kind.
///
/// Objects are stored as JSON values at insertion time. Registered kinds
/// without objects are written as `null`, matching the capture format.
#[derive(Debug, Default)]
pub struct FixtureStore {
    objects: RwLock<BTreeMap<String, Vec<Value>>>,
}

impl FixtureStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `kind` known to the store without adding objects.
    pub fn register_kind(&self, kind: &str) {
        let mut objects = self.objects.write().unwrap_or_else(PoisonError::into_inner);
        objects.entry(kind.to_owned()).or_default();
    }

    /// Record a captured `object` under `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`EffconfError::Decode`] when `object` cannot be encoded as
    /// JSON.
    pub fn insert<T: Serialize>(&self, kind: &str, object: &T) -> Result<(), EffconfError> {
        let value = serde_json::to_value(object).map_err(|e| {
            EffconfError::decode(
                DecodeStage::FixtureDecode,
                format_args!("encoding captured {kind}: {e}"),
            )
        })?;
        let mut objects = self.objects.write().unwrap_or_else(PoisonError::into_inner);
        objects.entry(kind.to_owned()).or_default().push(value);
        Ok(())
    }

    /// Number of objects captured for `kind`.
    #[must_use]
    pub fn count(&self, kind: &str) -> usize {
        let objects = self.objects.read().unwrap_or_else(PoisonError::into_inner);
        objects.get(kind).map_or(0, Vec::len)
    }

    /// Snapshot the store as raw fixture documents.
    ///
    /// # Errors
    ///
    /// Returns [`EffconfError::Decode`] if a stored collection cannot be
    /// re-encoded.
    pub fn documents(&self) -> Result<FixtureSet, EffconfError> {
        let objects = self.objects.read().unwrap_or_else(PoisonError::into_inner);
        objects
            .iter()
            .map(|(kind, items)| {
                let raw = if items.is_empty() {
                    RawValue::from_string("null".to_owned())
                } else {
                    serde_json::value::to_raw_value(items)
                };
                raw.map(|raw| (kind.clone(), raw))
                    .map_err(|e| EffconfError::decode(DecodeStage::FixtureDecode, e))
            })
            .collect()
    }

    /// Write the store to `path` as a fixture document.
    ///
    /// # Errors
    ///
    /// Returns [`EffconfError::Io`] when the file cannot be written.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), EffconfError> {
        let documents = self.documents()?;
        let text = serde_json::to_string_pretty(&documents)
            .map_err(|e| EffconfError::decode(DecodeStage::FixtureDecode, e))?;
        fs::write(path.as_ref(), text)?;
        debug!("saved {} fixture kinds to {}", documents.len(), path.as_ref().display());
        Ok(())
    }

    /// Rebuild a store from a fixture document previously written by
    /// [`FixtureStore::save`].
    ///
    /// # Errors
    ///
    /// Returns [`EffconfError::Io`] or [`EffconfError::Decode`] when the file
    /// cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, EffconfError> {
        let file = FixtureFile::load(path)?;
        let mut objects = BTreeMap::new();
        for (kind, raw) in file.documents() {
            let items = if is_null(raw) {
                Vec::new()
            } else {
                match serde_json::from_str::<Value>(raw.get()) {
                    Ok(Value::Array(items)) => items,
                    Ok(single) => vec![single],
                    Err(e) => {
                        return Err(EffconfError::decode(
                            DecodeStage::FixtureDecode,
                            format_args!("fixture '{kind}': {e}"),
                        ));
                    }
                }
            };
            objects.insert(kind.clone(), items);
        }
        Ok(Self {
            objects: RwLock::new(objects),
        })
    }
}

impl FixtureProvider for FixtureStore {
    fn fixtures(&self, kinds: &BTreeSet<String>) -> Result<FixtureSet, EffconfError> {
        project(&self.documents()?, kinds)
    }
}
