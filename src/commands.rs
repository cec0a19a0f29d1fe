//! Command execution helpers for `effconf`.
//!
//! This module owns the runtime flow for each subcommand: reading the
//! baseline and fixture documents, running the merge engine and rendering
//! the results to standard output.

use std::fs;
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};

use effconf::fixtures::DEFAULT_FIXTURE_FILE;
use effconf::merge::combine_json;
use effconf::{
    ConfigEntry, DecodeStage, EffconfError, EffectiveConfig, EntryTable, FixtureFile,
    MaterializeArgs, Materializer, MergeArgs, MergeMode, MergePolicy, NameScope, OverrideMissing,
};
use log::{debug, error, info};
use serde_json::Value;

#[cfg(test)]
mod tests;

const EMPTY_MESSAGE: &str = "No effective configuration differs from the baseline.";

fn caused_by_broken_pipe(err: &anyhow::Error) -> bool {
    err.chain().any(|c| {
        c.downcast_ref::<io::Error>()
            .is_some_and(|io| io.kind() == ErrorKind::BrokenPipe)
    })
}

fn read_text(path: &Path) -> Result<String, EffconfError> {
    fs::read_to_string(path).map_err(|e| {
        error!("cannot read {}: {e}", path.display());
        EffconfError::Io(e)
    })
}

fn parse_baseline(text: &str) -> Result<Value, EffconfError> {
    serde_json::from_str(text)
        .map_err(|e| EffconfError::decode(DecodeStage::BaseEncode, format_args!("baseline: {e}")))
}

/// Build the entry to materialise from the command-line arguments.
///
/// An entry table takes precedence; otherwise `--field` and a baseline read
/// from `--baseline` or standard input describe the entry directly.
fn entry_from_args(args: &MaterializeArgs) -> Result<ConfigEntry<Value>, EffconfError> {
    let entry = if let (Some(table_path), Some(label)) = (&args.entries, &args.label) {
        let table = EntryTable::<Value>::load(table_path)?;
        let found = args.field.as_deref().map_or_else(
            || table.by_label(label),
            |field| table.by_label_and_field(label, field),
        );
        found
            .cloned()
            .ok_or_else(|| EffconfError::malformed(format!("no entry labelled '{label}'")))?
    } else {
        let field = args
            .field
            .clone()
            .ok_or_else(|| EffconfError::malformed("--field is required without --entries"))?;
        let text = match &args.baseline {
            Some(path) => read_text(path)?,
            None => {
                debug!("reading baseline from standard input");
                io::read_to_string(io::stdin())?
            }
        };
        ConfigEntry::new(field, parse_baseline(&text)?)
    };

    if args.kinds.is_empty() {
        Ok(entry)
    } else {
        Ok(entry.with_kinds(args.kinds.iter().cloned()))
    }
}

fn fixture_path(args: &MaterializeArgs, entry: &ConfigEntry<Value>) -> PathBuf {
    args.fixtures.clone().unwrap_or_else(|| {
        if entry.fixture_file_name().is_empty() {
            PathBuf::from(DEFAULT_FIXTURE_FILE)
        } else {
            PathBuf::from(entry.fixture_file_name())
        }
    })
}

fn pretty(value: &Value) -> anyhow::Result<String> {
    let mut text = serde_json::to_string_pretty(value)?;
    text.push('\n');
    Ok(text)
}

/// Render materialised results, optionally followed by a diff per result.
pub(crate) fn write_materialized<W: Write>(
    mut out: W,
    baseline: &Value,
    effective: &EffectiveConfig<Value>,
    diff: bool,
) -> anyhow::Result<()> {
    if effective.is_empty() {
        writeln!(out, "{EMPTY_MESSAGE}")?;
        return Ok(());
    }
    writeln!(out, "{}", effective.json())?;
    if diff {
        let original = pretty(baseline)?;
        for (i, value) in effective.values().iter().enumerate() {
            let modified = pretty(value)?;
            writeln!(out, "# effective configuration {}", i + 1)?;
            write!(out, "{}", diffy::create_patch(&original, &modified))?;
        }
    }
    Ok(())
}

/// Run the `materialize` sub-command.
///
/// # Errors
///
/// Returns an [`EffconfError`] when the inputs cannot be read or the merge
/// engine rejects them. Output failures other than a closed pipe are logged.
pub fn run_materialize(args: &MaterializeArgs) -> Result<(), EffconfError> {
    let entry = entry_from_args(args)?;
    let fixtures = FixtureFile::load(fixture_path(args, &entry))?;
    let mode = args
        .mode
        .as_deref()
        .map(str::parse::<MergeMode>)
        .transpose()?
        .unwrap_or(MergeMode::Union);
    let missing = args
        .missing
        .as_deref()
        .map(str::parse::<OverrideMissing>)
        .transpose()?;
    let scope = if args.strict_names {
        NameScope::strict()
    } else {
        NameScope::default()
    };

    let effective: EffectiveConfig<Value> = Materializer::new(&fixtures)
        .with_name_scope(scope)
        .materialize(&entry, mode, missing)?;
    info!(
        "{} effective configuration(s) for field '{}'",
        effective.len(),
        entry.field()
    );

    let stdout = io::stdout().lock();
    if let Err(e) = write_materialized(stdout, entry.baseline(), &effective, args.diff) {
        if caused_by_broken_pipe(&e) {
            return Ok(());
        }
        error!("error printing results: {e}");
    }
    Ok(())
}

/// Render merge results as a pretty JSON array.
pub(crate) fn write_merged<W: Write>(mut out: W, results: Vec<Value>) -> anyhow::Result<()> {
    write!(out, "{}", pretty(&Value::Array(results))?)?;
    Ok(())
}

/// Run the `merge` sub-command.
///
/// # Errors
///
/// Returns an [`EffconfError`] when a document cannot be read or parsed, or
/// when the mode names are unknown.
pub fn run_merge(args: &MergeArgs) -> Result<(), EffconfError> {
    let base_path = args
        .base
        .as_deref()
        .ok_or_else(|| EffconfError::malformed("merge requires a BASE document"))?;
    let policy = MergePolicy::parse(
        args.mode.as_deref().unwrap_or("union"),
        args.missing.as_deref(),
    )?;
    let base = read_text(base_path)?;
    let externals = args
        .externals
        .iter()
        .map(|path| read_text(path))
        .collect::<Result<Vec<_>, _>>()?;
    let external_refs: Vec<&str> = externals.iter().map(String::as_str).collect();

    let results = combine_json(&base, &external_refs, policy)?;
    debug!("merged {} document(s) with {policy}", results.len());

    if let Err(e) = write_merged(io::stdout().lock(), results) {
        if caused_by_broken_pipe(&e) {
            return Ok(());
        }
        error!("error printing results: {e}");
    }
    Ok(())
}
