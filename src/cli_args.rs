//! Command-line argument structures.
//!
//! Isolates clap derivations so lint expectations remain scoped, keeping
//! `main.rs` focused on dispatch.

use std::path::PathBuf;

use clap::Parser;
use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

/// Serde predicate for boolean flags.
///
/// A `false` CLI default is skipped when serialising so it cannot mask a
/// `true` value from the environment or a configuration file.
fn not(value: &bool) -> bool {
    !*value
}

/// Parameters accepted by the `materialize` sub-command.
///
/// The baseline comes from `--baseline`, from an entry table selected with
/// `--entries` and `--label`, or from standard input.
#[derive(Parser, Deserialize, Serialize, Debug, OrthoConfig, Clone, Default)]
#[command(name = "materialize")]
#[ortho_config(prefix = "EFFCONF")]
pub struct MaterializeArgs {
    /// Captured fixture file; defaults to `test_fixtures.json`
    #[arg(long, value_name = "FILE")]
    pub fixtures: Option<PathBuf>,
    /// JSON file holding the hardcoded baseline value
    #[arg(long, value_name = "FILE", conflicts_with = "entries")]
    pub baseline: Option<PathBuf>,
    /// Field name or dotted path to extract from the fixtures
    #[arg(long, value_name = "FIELD")]
    pub field: Option<String>,
    /// Fixture kinds to search; every kind when omitted
    #[arg(long = "kind", value_name = "KIND")]
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub kinds: Vec<String>,
    /// Merge mode: extend-only, override-only or union
    #[arg(long, value_name = "MODE")]
    pub mode: Option<String>,
    /// Override-only handling of missing fields: nil or keep
    #[arg(long, value_name = "MISSING")]
    pub missing: Option<String>,
    /// Do not search label and annotation maps for the field name
    #[arg(long)]
    #[serde(default, skip_serializing_if = "not")]
    pub strict_names: bool,
    /// Print a unified diff against the baseline for every result
    #[arg(long)]
    #[serde(default, skip_serializing_if = "not")]
    pub diff: bool,
    /// JSON entry table to select the baseline from
    #[arg(long, value_name = "FILE", requires = "label")]
    pub entries: Option<PathBuf>,
    /// Test label of the entry to materialise
    #[arg(long, value_name = "LABEL", requires = "entries")]
    pub label: Option<String>,
}

/// Parameters accepted by the `merge` sub-command.
#[derive(Parser, Deserialize, Serialize, Debug, OrthoConfig, Clone, Default)]
#[command(name = "merge")]
#[ortho_config(prefix = "EFFCONF")]
pub struct MergeArgs {
    /// JSON document used as the merge base
    #[arg(required = true, value_name = "BASE")]
    // Clap marks the argument as required so parsing yields `Some(value)`. The
    // `Option` allows `MergeArgs::default()` and config merging to leave it unset.
    pub base: Option<PathBuf>,
    /// JSON documents merged into the base one at a time
    #[arg(value_name = "EXTERNAL", num_args = 1..)]
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub externals: Vec<PathBuf>,
    /// Merge mode: extend-only, override-only or union
    #[arg(long, value_name = "MODE")]
    pub mode: Option<String>,
    /// Override-only handling of missing fields: nil or keep
    #[arg(long, value_name = "MISSING")]
    pub missing: Option<String>,
}
