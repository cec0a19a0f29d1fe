//! Turn a hardcoded baseline into typed effective configurations.
//!
//! Materialisation projects the fixtures for an entry, extracts every value
//! stored under the entry's field, merges each one into the encoded
//! baseline, decodes the merge results into the caller's type and drops the
//! ones that are indistinguishable from the baseline.

use std::collections::BTreeMap;

use log::{debug, error, info, warn};
use serde::de::DeserializeOwned;
use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::error::decode_value;
use crate::extract::{Extractor, NameScope};
use crate::fixtures::FixtureProvider;
use crate::merge::{MergeMode, MergePolicy, OverrideMissing};
use crate::{ConfigEntry, DecodeStage, EffconfError};


/// Surviving typed results plus their combined JSON encoding.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectiveConfig<T> {
    values: Vec<T>,
    json: String,
}

impl<T> EffectiveConfig<T> {
    fn empty() -> Self {
        Self {
            values: Vec::new(),
            json: String::from("[]"),
        }
    }

    /// The surviving values in candidate order.
    #[must_use]
    pub fn values(&self) -> &[T] {
        &self.values
    }

    #[must_use]
    pub fn into_values(self) -> Vec<T> {
        self.values
    }

    /// JSON array holding the encoding of every surviving value; `[]` when
    /// nothing survived.
    #[must_use]
    pub fn json(&self) -> &str {
        &self.json
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// `true` when no configuration differs from the baseline. Callers should
    /// skip whatever they intended to vary.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<T> IntoIterator for EffectiveConfig<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}

/// Serialises a value with object keys in sorted order at every depth,
/// whatever ordering the underlying map keeps.
struct Canonical<'a>(&'a Value);

impl Serialize for Canonical<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0 {
            Value::Object(map) => {
                let sorted: BTreeMap<&str, Canonical<'_>> = map
                    .iter()
                    .map(|(key, value)| (key.as_str(), Canonical(value)))
                    .collect();
                sorted.serialize(serializer)
            }
            Value::Array(items) => serializer.collect_seq(items.iter().map(Canonical)),
            leaf => leaf.serialize(serializer),
        }
    }
}

/// Canonical JSON text of `value`: object keys sorted, no whitespace.
#[must_use]
pub fn normalize_json(value: &Value) -> String {
    serde_json::to_string(&Canonical(value)).unwrap_or_else(|_| value.to_string())
}

/// Materialises entries against one fixture provider.
#[derive(Debug)]
pub struct Materializer<'p, P> {
    provider: &'p P,
    extractor: Extractor,
}

impl<'p, P: FixtureProvider> Materializer<'p, P> {
    pub fn new(provider: &'p P) -> Self {
        Self {
            provider,
            extractor: Extractor::default(),
        }
    }

    /// Use `scope` for name searches instead of the permissive default.
    #[must_use]
    pub fn with_name_scope(mut self, scope: NameScope) -> Self {
        self.extractor = Extractor::new(scope);
        self
    }

    /// Produce the effective configurations for `entry`.
    ///
    /// `missing` only applies to [`MergeMode::OverrideOnly`] and defaults to
    /// [`OverrideMissing::KeepMissingOriginal`].
    ///
    /// # Errors
    ///
    /// - [`EffconfError::MalformedEntry`] for an invalid entry.
    /// - [`EffconfError::MissingFixtureKind`] when a requested kind is not
    ///   captured; without fixtures no comparison is possible.
    /// - [`EffconfError::Decode`] when the baseline cannot be encoded or any
    ///   merge result cannot be decoded into `T`. One bad candidate fails the
    ///   whole call.
    ///
    /// A field absent from every fixture is not an error: the result is empty.
    pub fn materialize<T, B>(
        &self,
        entry: &ConfigEntry<B>,
        mode: MergeMode,
        missing: Option<OverrideMissing>,
    ) -> Result<EffectiveConfig<T>, EffconfError>
    where
        T: DeserializeOwned + Serialize + PartialEq,
        B: Serialize,
    {
        let policy = MergePolicy::resolve(mode, missing);
        debug!("materialising field '{}' with {policy}", entry.field());
        let base = entry.encode_baseline()?;
        let candidates = self.candidates(entry, &base, policy)?;
        let reference: T = decode_value(base.clone(), DecodeStage::BaseEncode, "baseline")?;
        select_distinct(&base, &reference, candidates)
    }

    fn candidates<B>(
        &self,
        entry: &ConfigEntry<B>,
        base: &Value,
        policy: MergePolicy,
    ) -> Result<Vec<Value>, EffconfError> {
        let kinds = entry.requested_kinds();
        let projected = self.provider.fixtures(&kinds).map_err(|err| {
            if let EffconfError::MissingFixtureKind { kinds: missing } = &err {
                error!(
                    "fixtures for field '{}' are missing kinds {missing:?}; aborting",
                    entry.field()
                );
            }
            err
        })?;
        if projected.is_empty() {
            debug!("no fixture documents available; comparing the baseline with itself");
            return Ok(vec![base.clone()]);
        }
        match self.extractor.extract(&projected, entry.field()) {
            Ok(externals) => Ok(policy.apply_all(base, &externals)),
            Err(EffconfError::FieldNotFound { field }) => {
                warn!("field '{field}' not found in fixtures {kinds:?}");
                Ok(Vec::new())
            }
            Err(err) => Err(err),
        }
    }
}

/// Decode every candidate and keep the ones that differ from the baseline.
fn select_distinct<T>(
    base: &Value,
    reference: &T,
    candidates: Vec<Value>,
) -> Result<EffectiveConfig<T>, EffconfError>
where
    T: DeserializeOwned + Serialize + PartialEq,
{
    let normalized_base = normalize_json(base);
    let mut values = Vec::with_capacity(candidates.len());
    let mut encodings = Vec::with_capacity(candidates.len());
    for (i, candidate) in candidates.into_iter().enumerate() {
        let same_text = normalize_json(&candidate) == normalized_base;
        let context = format!("candidate {}", i + 1);
        let target: T = decode_value(candidate, DecodeStage::ResultDecode, &context)?;
        if same_text || target == *reference {
            debug!("{context} is identical to the baseline, skipping");
            continue;
        }
        let encoded = serde_json::to_value(&target).map_err(|e| {
            EffconfError::decode(DecodeStage::ResultDecode, format_args!("{context}: {e}"))
        })?;
        encodings.push(encoded);
        values.push(target);
    }

    if values.is_empty() {
        info!("every merge result matched the baseline; nothing to vary");
        return Ok(EffectiveConfig::empty());
    }
    let json = Value::Array(encodings).to_string();
    debug!("materialised {} distinct configuration(s)", values.len());
    Ok(EffectiveConfig { values, json })
}

/// Materialise `entry` against `provider` with a permissive name search.
///
/// # Errors
///
/// See [`Materializer::materialize`].
pub fn materialize<T, B, P>(
    entry: &ConfigEntry<B>,
    provider: &P,
    mode: MergeMode,
    missing: Option<OverrideMissing>,
) -> Result<EffectiveConfig<T>, EffconfError>
where
    T: DeserializeOwned + Serialize + PartialEq,
    B: Serialize,
    P: FixtureProvider,
{
    Materializer::new(provider).materialize(entry, mode, missing)
}
