//! Merge policies combining a baseline JSON tree with external candidates.
//!
//! Each policy is a pure recursive walk over two [`serde_json::Value`]s and
//! never fails. The `path` threaded through the walks only feeds trace
//! logging.

use std::fmt;
use std::str::FromStr;

use log::{debug, trace};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{DecodeStage, EffconfError};

pub mod compat;
mod extend;
mod overriding;
mod union;


pub use compat::{is_all_null, is_compatible};

/// How external data may change the baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MergeMode {
    /// Only add structure missing from the baseline.
    ExtendOnly,
    /// Only replace values the baseline already has.
    OverrideOnly,
    /// Replace existing values, then add missing ones.
    Union,
}

/// Treatment of baseline keys and indices absent from the external value
/// under [`MergeMode::OverrideOnly`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OverrideMissing {
    /// Missing entries become `null`; results that end up entirely `null`
    /// are dropped.
    SetMissingToNil,
    /// Missing entries keep their baseline value.
    #[default]
    KeepMissingOriginal,
}

/// Lower-case `text` and drop `-`/`_` so spellings like `extend-only`,
/// `extend_only` and `ExtendOnly` compare equal.
fn fold_name(text: &str) -> String {
    text.chars()
        .filter(|c| !matches!(c, '-' | '_'))
        .flat_map(char::to_lowercase)
        .collect()
}

impl FromStr for MergeMode {
    type Err = EffconfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match fold_name(s.trim()).as_str() {
            "extend" | "extendonly" => Ok(Self::ExtendOnly),
            "override" | "overrideonly" => Ok(Self::OverrideOnly),
            "union" => Ok(Self::Union),
            _ => Err(EffconfError::UnknownMode(s.into())),
        }
    }
}

impl FromStr for OverrideMissing {
    type Err = EffconfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match fold_name(s.trim()).as_str() {
            "nil" | "null" | "setmissingtonil" => Ok(Self::SetMissingToNil),
            "keep" | "keepmissingoriginal" => Ok(Self::KeepMissingOriginal),
            _ => Err(EffconfError::UnknownMode(s.into())),
        }
    }
}

impl fmt::Display for MergeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ExtendOnly => "extend-only",
            Self::OverrideOnly => "override-only",
            Self::Union => "union",
        })
    }
}

impl fmt::Display for OverrideMissing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::SetMissingToNil => "set-missing-to-nil",
            Self::KeepMissingOriginal => "keep-missing-original",
        })
    }
}

/// A fully resolved merge policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergePolicy {
    Extend,
    Override(OverrideMissing),
    Union,
}

impl MergePolicy {
    /// Combine a mode with its optional sub-mode. The sub-mode only applies
    /// to [`MergeMode::OverrideOnly`] and defaults to keeping the original.
    #[must_use]
    pub fn resolve(mode: MergeMode, missing: Option<OverrideMissing>) -> Self {
        match mode {
            MergeMode::ExtendOnly | MergeMode::Union => {
                if let Some(missing) = missing {
                    debug!("ignoring override sub-mode {missing} for {mode}");
                }
                if mode == MergeMode::Union {
                    Self::Union
                } else {
                    Self::Extend
                }
            }
            MergeMode::OverrideOnly => Self::Override(missing.unwrap_or_default()),
        }
    }

    /// Parse a mode name and optional sub-mode name.
    ///
    /// # Errors
    ///
    /// Returns [`EffconfError::UnknownMode`] for unrecognised names.
    pub fn parse(mode: &str, missing: Option<&str>) -> Result<Self, EffconfError> {
        let mode = mode.parse::<MergeMode>()?;
        let missing = missing.map(str::parse::<OverrideMissing>).transpose()?;
        Ok(Self::resolve(mode, missing))
    }

    /// Merge a single external value into `base`.
    #[must_use]
    pub fn apply(self, base: &Value, external: &Value) -> Value {
        match self {
            Self::Extend => extend::merge(base, external, ""),
            Self::Override(missing) => overriding::merge(base, external, missing, ""),
            Self::Union => union::merge(base, external, ""),
        }
    }

    /// Merge every external value into `base`, one result per candidate.
    ///
    /// Under [`OverrideMissing::SetMissingToNil`] results that are entirely
    /// `null` are dropped, so fewer results than candidates may be returned.
    #[must_use]
    pub fn apply_all(self, base: &Value, externals: &[Value]) -> Vec<Value> {
        let drop_all_null = self == Self::Override(OverrideMissing::SetMissingToNil);
        let results: Vec<Value> = externals
            .iter()
            .enumerate()
            .filter_map(|(i, external)| {
                let merged = self.apply(base, external);
                if drop_all_null && is_all_null(&merged) {
                    debug!("result {} is entirely null, skipping", i + 1);
                    None
                } else {
                    Some(merged)
                }
            })
            .collect();
        debug!(
            "{self} merge produced {} result(s) from {} candidate(s)",
            results.len(),
            externals.len()
        );
        results
    }
}

impl fmt::Display for MergePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Extend => write!(f, "{}", MergeMode::ExtendOnly),
            Self::Override(missing) => write!(f, "{}/{missing}", MergeMode::OverrideOnly),
            Self::Union => write!(f, "{}", MergeMode::Union),
        }
    }
}

/// Parse raw JSON documents and merge each external document into `base`.
///
/// # Errors
///
/// Returns [`EffconfError::Decode`] tagged [`DecodeStage::BaseEncode`] when
/// `base` is not valid JSON, or [`DecodeStage::ExternalDecode`] naming the
/// first external document that is not.
pub fn combine_json(
    base: &str,
    externals: &[&str],
    policy: MergePolicy,
) -> Result<Vec<Value>, EffconfError> {
    let base: Value = serde_json::from_str(base)
        .map_err(|e| EffconfError::decode(DecodeStage::BaseEncode, e))?;
    let externals = externals
        .iter()
        .enumerate()
        .map(|(i, text)| {
            serde_json::from_str::<Value>(text).map_err(|e| {
                EffconfError::decode(
                    DecodeStage::ExternalDecode,
                    format_args!("external {}: {e}", i + 1),
                )
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(policy.apply_all(&base, &externals))
}

fn key_path(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_owned()
    } else {
        format!("{path}.{key}")
    }
}

fn index_path(path: &str, index: usize) -> String {
    format!("{path}[{index}]")
}

/// Describe a leaf replacement whose JSON types differ, or `None` when the
/// types are compatible.
fn type_mismatch(label: &str, path: &str, base: &Value, external: &Value) -> Option<String> {
    (!is_compatible(base, external)).then(|| {
        format!(
            "[{label} TYPE MISMATCH] {path}: {} -> {}, using external value",
            compat::kind_name(base),
            compat::kind_name(external)
        )
    })
}

/// Log a leaf replacement, noting when the JSON types differ.
fn trace_leaf(label: &str, path: &str, base: &Value, external: &Value) {
    type_mismatch(label, path, base, external).map_or_else(
        || trace!("[{label}] {path}: {base} -> {external}"),
        |note| trace!("{note}"),
    );
}
