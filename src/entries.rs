//! Lookup of configuration entries by the test labels they belong to.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use log::warn;
use regex::Regex;
use serde::de::DeserializeOwned;

use crate::{ConfigEntry, EffconfError};

/// An ordered collection of entries, typically one per hardcoded value in a
/// test file.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryTable<B> {
    entries: Vec<ConfigEntry<B>>,
}

impl<B> EntryTable<B> {
    /// Build a table, warning about labels carried by more than one entry.
    /// Lookups by such a label return the first entry.
    #[must_use]
    pub fn new(entries: Vec<ConfigEntry<B>>) -> Self {
        let table = Self { entries };
        for (label, count) in table.shared_labels() {
            warn!("test label '{label}' is used by {count} entries; lookups return the first");
        }
        table
    }

    /// Labels carried by more than one entry, with the number of entries.
    #[must_use]
    pub fn shared_labels(&self) -> Vec<(&str, usize)> {
        let mut seen: BTreeMap<&str, usize> = BTreeMap::new();
        for entry in &self.entries {
            for label in entry.test_labels() {
                *seen.entry(label.as_str()).or_default() += 1;
            }
        }
        seen.into_iter().filter(|&(_, count)| count > 1).collect()
    }

    #[must_use]
    pub fn entries(&self) -> &[ConfigEntry<B>] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn find_first<F>(&self, mut matches: F) -> Option<&ConfigEntry<B>>
    where
        F: FnMut(&ConfigEntry<B>, &str) -> bool,
    {
        self.entries.iter().find(|&entry| {
            entry
                .test_labels()
                .iter()
                .any(|label| matches(entry, label.as_str()))
        })
    }

    /// First entry carrying exactly `label`.
    #[must_use]
    pub fn by_label(&self, label: &str) -> Option<&ConfigEntry<B>> {
        self.find_first(|_, candidate| candidate == label)
    }

    /// First entry carrying exactly `label` whose field is `field`.
    #[must_use]
    pub fn by_label_and_field(&self, label: &str, field: &str) -> Option<&ConfigEntry<B>> {
        self.find_first(|entry, candidate| candidate == label && entry.field() == field)
    }

    /// First entry with a label containing `fragment`.
    #[must_use]
    pub fn containing(&self, fragment: &str) -> Option<&ConfigEntry<B>> {
        self.find_first(|_, candidate| candidate.contains(fragment))
    }

    /// First entry with a label containing `fragment`, ignoring case.
    #[must_use]
    pub fn containing_ignore_case(&self, fragment: &str) -> Option<&ConfigEntry<B>> {
        let needle = fragment.to_lowercase();
        self.find_first(|_, candidate| candidate.to_lowercase().contains(&needle))
    }

    /// Every entry with a label containing `fragment`, each listed once.
    #[must_use]
    pub fn all_containing(&self, fragment: &str) -> Vec<&ConfigEntry<B>> {
        self.entries
            .iter()
            .filter(|entry| {
                entry
                    .test_labels()
                    .iter()
                    .any(|label| label.contains(fragment))
            })
            .collect()
    }

    /// Every entry with a label matched by `pattern`, each listed once.
    #[must_use]
    pub fn matching(&self, pattern: &Regex) -> Vec<&ConfigEntry<B>> {
        self.entries
            .iter()
            .filter(|entry| entry.test_labels().iter().any(|label| pattern.is_match(label)))
            .collect()
    }
}

impl<B: DeserializeOwned> EntryTable<B> {
    /// Parse a JSON array of entries.
    ///
    /// # Errors
    ///
    /// Returns [`EffconfError::MalformedEntry`] naming the path of the first
    /// entry that does not have the expected shape.
    pub fn from_json_str(text: &str) -> Result<Self, EffconfError> {
        let mut de = serde_json::Deserializer::from_str(text);
        let entries: Vec<ConfigEntry<B>> = serde_path_to_error::deserialize(&mut de)
            .map_err(|e| {
                let path = e.path().to_string();
                EffconfError::malformed(format!("{} at {path}", e.into_inner()))
            })?;
        de.end()
            .map_err(|e| EffconfError::malformed(e.to_string()))?;
        Ok(Self::new(entries))
    }

    /// Read and parse an entry file.
    ///
    /// # Errors
    ///
    /// Returns [`EffconfError::Io`] when the file cannot be read, otherwise
    /// as [`EntryTable::from_json_str`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, EffconfError> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}

impl<B> FromIterator<ConfigEntry<B>> for EntryTable<B> {
    fn from_iter<I: IntoIterator<Item = ConfigEntry<B>>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use serde_json::{Value, json};

    #[fixture]
    fn table() -> EntryTable<Value> {
        [
            ConfigEntry::new("image", json!("nginx"))
                .with_labels(["TestPodImage", "TestPodImage/ipv6"]),
            ConfigEntry::new("replicas", json!(1)).with_labels(["TestScaleUp"]),
            ConfigEntry::new("image", json!("busybox")).with_labels(["TestScaleUp"]),
        ]
        .into_iter()
        .collect()
    }

    #[rstest]
    fn exact_label_lookup(table: EntryTable<Value>) {
        let entry = table.by_label("TestScaleUp").expect("entry");
        assert_eq!(entry.field(), "replicas");
        assert!(table.by_label("TestScale").is_none());
    }

    #[rstest]
    fn label_and_field_lookup(table: EntryTable<Value>) {
        let entry = table
            .by_label_and_field("TestScaleUp", "image")
            .expect("entry");
        assert_eq!(entry.baseline(), &json!("busybox"));
    }

    #[rstest]
    #[case("ipv6", Some("image"))]
    #[case("Scale", Some("replicas"))]
    #[case("scale", None)]
    fn substring_lookup(
        table: EntryTable<Value>,
        #[case] fragment: &str,
        #[case] field: Option<&str>,
    ) {
        assert_eq!(table.containing(fragment).map(ConfigEntry::field), field);
    }

    #[rstest]
    fn case_insensitive_lookup(table: EntryTable<Value>) {
        let entry = table.containing_ignore_case("testpod").expect("entry");
        assert_eq!(entry.baseline(), &json!("nginx"));
    }

    #[rstest]
    fn all_matches_are_listed_once(table: EntryTable<Value>) {
        assert_eq!(table.all_containing("Test").len(), 3);
        assert_eq!(table.all_containing("TestPodImage").len(), 1);
    }

    #[rstest]
    fn regex_lookup(table: EntryTable<Value>) {
        let pattern = Regex::new(r"^TestPod\w+/ipv\d$").expect("valid regex");
        let matches = table.matching(&pattern);
        assert_eq!(matches.len(), 1);
    }

    #[rstest]
    fn labels_shared_across_entries_are_reported(table: EntryTable<Value>) {
        assert_eq!(table.shared_labels(), [("TestScaleUp", 2)]);
    }

    #[test]
    fn repeated_labels_in_one_loaded_entry_collapse() {
        let table = EntryTable::<Value>::from_json_str(
            r#"[{"test_labels": ["TestA", "TestA", "TestB"], "field": "image", "baseline": "x"}]"#,
        )
        .expect("valid table");
        let entry = table.by_label("TestA").expect("entry");
        assert_eq!(entry.test_labels(), ["TestA", "TestB"]);
        assert!(table.shared_labels().is_empty());
    }

    #[test]
    fn entry_files_report_the_failing_path() {
        let err = EntryTable::<Value>::from_json_str(
            r#"[{"field": "image", "baseline": "nginx"}, {"baseline": 1}]"#,
        )
        .expect_err("missing field");
        let text = err.to_string();
        assert!(text.starts_with("malformed entry:"), "{text}");
        assert!(text.contains("missing field `field`"), "{text}");
    }

    #[test]
    fn entry_files_load_from_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("entries.json");
        fs::write(
            &path,
            r#"[{"test_labels": ["TestA"], "field": "spec.containers", "kinds": ["pods"], "baseline": []}]"#,
        )
        .expect("write entries");
        let table = EntryTable::<Value>::load(&path).expect("load");
        assert_eq!(table.len(), 1);
        assert!(!table.is_empty());
        assert_eq!(
            table.entries().first().map(|entry| entry.kinds().len()),
            Some(1)
        );
    }
}
