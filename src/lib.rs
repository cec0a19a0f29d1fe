//! Effective configuration merge engine.
//!
//! Tests often hardcode a configuration value (a container list, a probe, a
//! resource block). `effconf` varies such a baseline against configuration
//! captured from real systems: it projects the captured fixtures by kind,
//! extracts every value stored under the baseline's field, merges each one
//! into the baseline under a [`MergeMode`] and returns the typed results that
//! differ from the baseline.
//!
//! ```
//! use effconf::fixtures::FixtureFile;
//! use effconf::{ConfigEntry, MergeMode, materialize};
//!
//! let fixtures = FixtureFile::from_json_str(
//!     r#"{"pods": [{"spec": {"replicas": 3}}, {"spec": {"replicas": 1}}]}"#,
//! )?;
//! let entry = ConfigEntry::new("replicas", 1_u32).with_kinds(["pods"]);
//! let effective = materialize::<u32, _, _>(&entry, &fixtures, MergeMode::Union, None)?;
//! assert_eq!(effective.values(), [3]);
//! assert_eq!(effective.json(), "[3]");
//! # Ok::<(), effconf::EffconfError>(())
//! ```

pub mod cli_args;
pub mod config;
pub mod entries;
pub mod entry;
pub mod error;
pub mod extract;
pub mod fixtures;
pub mod materialize;
pub mod merge;
pub mod test_utils;

pub use cli_args::{MaterializeArgs, MergeArgs};
pub use entries::EntryTable;
pub use entry::ConfigEntry;
pub use error::{DecodeStage, EffconfError};
pub use extract::{Extractor, NameScope};
pub use fixtures::{FixtureFile, FixtureProvider, FixtureStore};
pub use materialize::{EffectiveConfig, Materializer, materialize};
pub use merge::{MergeMode, MergePolicy, OverrideMissing};
