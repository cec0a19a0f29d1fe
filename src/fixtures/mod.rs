//! Captured fixture documents and the projection applied before extraction.
//!
//! A fixture document maps a kind name (`"pods"`, `"deployments"`) to the raw
//! JSON captured for that kind, usually an array of objects. Entries stored
//! as JSON `null` are treated as absent. Documents are kept as raw JSON so
//! that malformed captures only surface when extraction actually parses them.

use std::collections::{BTreeMap, BTreeSet};

use log::debug;
use serde_json::value::RawValue;

use crate::EffconfError;

mod store;


pub use store::{FixtureFile, FixtureStore};

/// Default file name of the captured fixture document.
pub const DEFAULT_FIXTURE_FILE: &str = "test_fixtures.json";

/// Raw fixture documents keyed by kind name, iterated in sorted kind order.
pub type FixtureSet = BTreeMap<String, Box<RawValue>>;

/// Source of projected fixture documents.
///
/// Implementations return the documents for the requested kinds, applying
/// the same rules as [`project`]. Closures of the matching shape implement
/// this trait so tests can supply documents directly.
pub trait FixtureProvider {
    /// Fetch the documents for `kinds`; an empty set requests every kind.
    ///
    /// # Errors
    ///
    /// Returns [`EffconfError::MissingFixtureKind`] when a requested kind is
    /// unknown to the provider.
    fn fixtures(&self, kinds: &BTreeSet<String>) -> Result<FixtureSet, EffconfError>;
}

impl<F> FixtureProvider for F
where
    F: Fn(&BTreeSet<String>) -> Result<FixtureSet, EffconfError>,
{
    fn fixtures(&self, kinds: &BTreeSet<String>) -> Result<FixtureSet, EffconfError> {
        self(kinds)
    }
}

/// Returns `true` when `raw` holds no document.
pub(crate) fn is_null(raw: &RawValue) -> bool {
    let text = raw.get().trim();
    text.is_empty() || text == "null"
}

/// Select the non-null documents for `requested` from `documents`.
///
/// With an empty `requested` set every non-null document is returned. A
/// requested kind that is present but `null` is dropped silently.
///
/// # Errors
///
/// Returns [`EffconfError::MissingFixtureKind`] naming every requested kind
/// absent from `documents`.
///
/// # Examples
///
/// ```
/// use std::collections::BTreeSet;
/// use effconf::fixtures::{FixtureFile, project};
///
/// let file = FixtureFile::from_json_str(r#"{"pods": [{"name": "a"}], "services": null}"#)
///     .expect("valid fixture");
/// let projected = project(file.documents(), &BTreeSet::new()).expect("projection");
/// assert_eq!(projected.keys().collect::<Vec<_>>(), ["pods"]);
/// ```
pub fn project(
    documents: &FixtureSet,
    requested: &BTreeSet<String>,
) -> Result<FixtureSet, EffconfError> {
    if requested.is_empty() {
        let projected: FixtureSet = documents
            .iter()
            .filter(|(_, raw)| !is_null(raw))
            .map(|(kind, raw)| (kind.clone(), raw.clone()))
            .collect();
        debug!(
            "projected {} of {} fixture kinds (all requested)",
            projected.len(),
            documents.len()
        );
        return Ok(projected);
    }

    let missing: Vec<String> = requested
        .iter()
        .filter(|kind| !documents.contains_key(kind.as_str()))
        .cloned()
        .collect();
    if !missing.is_empty() {
        debug!("missing requested fixture kinds: {missing:?}");
        return Err(EffconfError::MissingFixtureKind { kinds: missing });
    }

    let projected: FixtureSet = requested
        .iter()
        .filter_map(|kind| {
            documents
                .get(kind)
                .filter(|raw| !is_null(raw))
                .map(|raw| (kind.clone(), raw.clone()))
        })
        .collect();
    debug!(
        "projected {} fixture kinds for request {requested:?}",
        projected.len()
    );
    Ok(projected)
}
