//! A single hardcoded test configuration awaiting variation.

use std::collections::BTreeSet;

use log::warn;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::extract::FieldSelector;
use crate::{DecodeStage, EffconfError};

/// One unit of work: a baseline value, the field it corresponds to in the
/// fixtures, and the kinds of captured objects to search.
///
/// Entries are immutable once built. Test labels keep their insertion order
/// and never repeat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigEntry<B> {
    #[serde(default)]
    fixture_file_name: String,
    #[serde(default, deserialize_with = "deserialize_labels")]
    test_labels: Vec<String>,
    field: String,
    #[serde(default)]
    kinds: BTreeSet<String>,
    baseline: B,
}

/// Keep the first occurrence of each label, preserving order.
fn unique_labels(labels: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut unique: Vec<String> = Vec::new();
    for label in labels {
        if !unique.contains(&label) {
            unique.push(label);
        }
    }
    unique
}

fn deserialize_labels<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Vec::<String>::deserialize(deserializer).map(unique_labels)
}

impl<B> ConfigEntry<B> {
    /// Create an entry searching every fixture kind for `field`.
    pub fn new(field: impl Into<String>, baseline: B) -> Self {
        Self {
            fixture_file_name: String::new(),
            test_labels: Vec::new(),
            field: field.into(),
            kinds: BTreeSet::new(),
            baseline,
        }
    }

    /// Restrict the search to `kinds`. Blank names are kept here and only
    /// left out of the request made to the fixture provider.
    #[must_use]
    pub fn with_kinds<I, S>(mut self, kinds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.kinds = kinds.into_iter().map(Into::into).collect();
        self
    }

    /// Attach test labels, dropping repeats while preserving order.
    #[must_use]
    pub fn with_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.test_labels = unique_labels(labels.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn with_fixture_file(mut self, name: impl Into<String>) -> Self {
        self.fixture_file_name = name.into();
        self
    }

    #[must_use]
    pub fn fixture_file_name(&self) -> &str {
        &self.fixture_file_name
    }

    #[must_use]
    pub fn test_labels(&self) -> &[String] {
        &self.test_labels
    }

    #[must_use]
    pub fn field(&self) -> &str {
        &self.field
    }

    #[must_use]
    pub fn kinds(&self) -> &BTreeSet<String> {
        &self.kinds
    }

    #[must_use]
    pub fn baseline(&self) -> &B {
        &self.baseline
    }

    /// Kinds to request from the fixture provider, without empty names.
    pub(crate) fn requested_kinds(&self) -> BTreeSet<String> {
        let requested: BTreeSet<String> = self
            .kinds
            .iter()
            .filter(|kind| !kind.trim().is_empty())
            .cloned()
            .collect();
        if requested.len() != self.kinds.len() {
            warn!(
                "entry for field '{}' lists empty fixture kinds; they were filtered out",
                self.field
            );
            if requested.is_empty() {
                warn!("all fixture kinds were empty; every kind will be searched");
            }
        }
        requested
    }
}

impl<B: Serialize> ConfigEntry<B> {
    /// Check the entry shape and encode its baseline as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`EffconfError::MalformedEntry`] for an empty or malformed
    /// field or a baseline that encodes to `null`, and
    /// [`EffconfError::Decode`] when the baseline cannot be encoded.
    pub fn encode_baseline(&self) -> Result<Value, EffconfError> {
        FieldSelector::parse(&self.field)?;
        let value = serde_json::to_value(&self.baseline)
            .map_err(|e| EffconfError::decode(DecodeStage::BaseEncode, e))?;
        if value.is_null() {
            return Err(EffconfError::malformed(format!(
                "baseline for field '{}' is null",
                self.field
            )));
        }
        Ok(value)
    }
}
