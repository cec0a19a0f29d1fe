//! Locate every value stored under a field across projected fixtures.
//!
//! A field without a `.` is a *name search*: every object key equal to the
//! field, at any depth, contributes its value. A dotted field is a *path
//! search* that steps through the segments from the root of each document,
//! fanning out over arrays of objects.

use std::collections::BTreeSet;

use log::debug;
use serde_json::Value;

use crate::fixtures::FixtureSet;
use crate::{DecodeStage, EffconfError};

#[cfg(test)]
mod tests;

/// Separator between path segments in a field selector.
pub const PATH_SEPARATOR: char = '.';

/// How a field string is interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldSelector<'a> {
    /// Match the key at any depth.
    Name(&'a str),
    /// Walk these segments from each document root.
    Path(Vec<&'a str>),
}

impl<'a> FieldSelector<'a> {
    /// Parse `field` into a selector.
    ///
    /// # Errors
    ///
    /// Returns [`EffconfError::MalformedEntry`] for an empty field or a path
    /// with an empty segment such as `spec..containers`.
    pub fn parse(field: &'a str) -> Result<Self, EffconfError> {
        if field.is_empty() {
            return Err(EffconfError::malformed("field must not be empty"));
        }
        if !field.contains(PATH_SEPARATOR) {
            return Ok(Self::Name(field));
        }
        let segments: Vec<&str> = field.split(PATH_SEPARATOR).collect();
        if segments.iter().any(|segment| segment.is_empty()) {
            return Err(EffconfError::malformed(format!(
                "field path '{field}' contains an empty segment"
            )));
        }
        Ok(Self::Path(segments))
    }
}

/// Which subtrees a name search descends into.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum NameScope {
    /// Recurse into every nested value.
    #[default]
    Anywhere,
    /// Do not search inside the values of these keys. The keys themselves
    /// still match when they equal the searched name.
    SkipKeys(BTreeSet<String>),
}

impl NameScope {
    /// Skip free-form metadata maps whose keys are user-chosen strings.
    #[must_use]
    pub fn strict() -> Self {
        Self::SkipKeys(["annotations", "labels"].map(str::to_owned).into())
    }

    fn descends_into(&self, key: &str) -> bool {
        match self {
            Self::Anywhere => true,
            Self::SkipKeys(keys) => !keys.contains(key),
        }
    }
}

/// Field value extractor with a configurable name-search scope.
#[derive(Debug, Clone, Default)]
pub struct Extractor {
    scope: NameScope,
}

impl Extractor {
    #[must_use]
    pub fn new(scope: NameScope) -> Self {
        Self { scope }
    }

    #[must_use]
    pub fn scope(&self) -> &NameScope {
        &self.scope
    }

    /// Collect every value stored under `field` across `projected`.
    ///
    /// Documents are visited in kind order and a document that does not
    /// contain the field simply contributes nothing.
    ///
    /// # Errors
    ///
    /// Returns [`EffconfError::Decode`] if any document is not valid JSON,
    /// [`EffconfError::MalformedEntry`] for an invalid field and
    /// [`EffconfError::FieldNotFound`] when no document contains the field.
    pub fn extract(&self, projected: &FixtureSet, field: &str) -> Result<Vec<Value>, EffconfError> {
        let selector = FieldSelector::parse(field)?;
        let mut results = Vec::new();
        for (kind, raw) in projected {
            let document: Value = serde_json::from_str(raw.get()).map_err(|e| {
                EffconfError::decode(
                    DecodeStage::FixtureDecode,
                    format_args!("fixture '{kind}': {e}"),
                )
            })?;
            let before = results.len();
            match &selector {
                FieldSelector::Name(name) => self.find_by_name(&document, name, &mut results),
                FieldSelector::Path(segments) => find_by_path(&document, segments, &mut results),
            }
            debug!(
                "field '{field}' matched {} value(s) in fixture '{kind}'",
                results.len() - before
            );
        }
        if results.is_empty() {
            return Err(EffconfError::FieldNotFound { field: field.into() });
        }
        Ok(results)
    }

    fn find_by_name(&self, node: &Value, name: &str, out: &mut Vec<Value>) {
        match node {
            Value::Object(map) => {
                for (key, value) in map {
                    if key == name {
                        out.push(value.clone());
                    }
                    if self.scope.descends_into(key) {
                        self.find_by_name(value, name, out);
                    }
                }
            }
            Value::Array(items) => {
                for item in items {
                    self.find_by_name(item, name, out);
                }
            }
            _ => {}
        }
    }
}

/// Collect every value stored under `field` using a permissive name search.
///
/// # Errors
///
/// See [`Extractor::extract`].
pub fn extract(projected: &FixtureSet, field: &str) -> Result<Vec<Value>, EffconfError> {
    Extractor::default().extract(projected, field)
}

fn find_by_path(root: &Value, segments: &[&str], out: &mut Vec<Value>) {
    let mut current = vec![root];
    for segment in segments {
        let next: Vec<&Value> = current
            .iter()
            .flat_map(|&node| step(node, segment))
            .collect();
        if next.is_empty() {
            return;
        }
        current = next;
    }
    out.extend(current.into_iter().cloned());
}

fn step<'v>(node: &'v Value, segment: &str) -> Vec<&'v Value> {
    match node {
        Value::Object(map) => map.get(segment).into_iter().collect(),
        Value::Array(items) => items
            .iter()
            .filter_map(|item| item.as_object().and_then(|map| map.get(segment)))
            .collect(),
        _ => Vec::new(),
    }
}
