//! Tests for command helper utilities.

use super::*;
use effconf::fixtures::FixtureFile;
use rstest::rstest;
use serde_json::json;

fn effective(values: &[Value]) -> EffectiveConfig<Value> {
    let fixtures = FixtureFile::from_json_str(
        &json!({ "pods": values.iter().map(|v| json!({"probe": v})).collect::<Vec<_>>() })
            .to_string(),
    )
    .expect("capture");
    let entry = ConfigEntry::new("probe", json!({"period": 10}));
    Materializer::new(&fixtures)
        .materialize(&entry, MergeMode::OverrideOnly, None)
        .expect("materialise")
}

fn render(baseline: &Value, result: &EffectiveConfig<Value>, diff: bool) -> String {
    let mut out = Vec::new();
    write_materialized(&mut out, baseline, result, diff).expect("write");
    String::from_utf8(out).expect("utf8")
}

#[test]
fn empty_results_print_the_skip_message() {
    let result = effective(&[json!({"period": 10})]);
    assert_eq!(
        render(&json!({"period": 10}), &result, true),
        format!("{EMPTY_MESSAGE}\n")
    );
}

#[test]
fn results_print_as_one_json_line() {
    let result = effective(&[json!({"period": 3}), json!({"period": 10})]);
    assert_eq!(
        render(&json!({"period": 10}), &result, false),
        "[{\"period\":3}]\n"
    );
}

#[test]
fn diff_shows_each_changed_line() {
    let result = effective(&[json!({"period": 3})]);
    let text = render(&json!({"period": 10}), &result, true);
    assert!(text.contains("# effective configuration 1"), "{text}");
    assert!(text.contains("-  \"period\": 10"), "{text}");
    assert!(text.contains("+  \"period\": 3"), "{text}");
}

#[test]
fn merged_output_is_a_pretty_array() {
    let mut out = Vec::new();
    write_merged(&mut out, vec![json!({"a": 1})]).expect("write");
    assert_eq!(
        String::from_utf8(out).expect("utf8"),
        "[\n  {\n    \"a\": 1\n  }\n]\n"
    );
}

#[rstest]
#[case(io::Error::from(ErrorKind::BrokenPipe), true)]
#[case(io::Error::from(ErrorKind::PermissionDenied), false)]
fn broken_pipes_are_detected(#[case] err: io::Error, #[case] expected: bool) {
    let err = anyhow::Error::from(err).context("printing");
    assert_eq!(caused_by_broken_pipe(&err), expected);
}

#[test]
fn entry_kinds_from_flags_replace_table_kinds() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("entries.json");
    fs::write(
        &path,
        r#"[{"test_labels": ["TestProbe"], "field": "probe", "kinds": ["jobs"], "baseline": {"period": 1}}]"#,
    )
    .expect("write entries");
    let args = MaterializeArgs {
        entries: Some(path),
        label: Some("TestProbe".into()),
        kinds: vec!["pods".into()],
        ..MaterializeArgs::default()
    };
    let entry = entry_from_args(&args).expect("entry");
    assert_eq!(entry.kinds().iter().collect::<Vec<_>>(), ["pods"]);
    assert_eq!(fixture_path(&args, &entry), PathBuf::from(DEFAULT_FIXTURE_FILE));
}

#[test]
fn unknown_labels_are_reported() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("entries.json");
    fs::write(&path, "[]").expect("write entries");
    let args = MaterializeArgs {
        entries: Some(path),
        label: Some("TestMissing".into()),
        ..MaterializeArgs::default()
    };
    let err = entry_from_args(&args).expect_err("no such label");
    assert!(err.to_string().contains("TestMissing"));
}
