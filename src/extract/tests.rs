//! Tests for field extraction.

use super::*;
use crate::fixtures::{FixtureFile, project};
use rstest::{fixture, rstest};
use serde_json::json;

#[fixture]
fn projected() -> FixtureSet {
    let file = FixtureFile::from_json_str(
        &json!({
            "deployments": [{
                "metadata": {"name": "api", "labels": {"image": "team-label"}},
                "spec": {"template": {"spec": {"containers": [
                    {"name": "api", "image": "api:v2"}
                ]}}}
            }],
            "pods": [
                {
                    "metadata": {"name": "web"},
                    "spec": {"containers": [
                        {"name": "web", "image": "nginx:1.25"},
                        {"name": "sidecar", "image": "envoy:1.29"}
                    ]}
                },
                {
                    "metadata": {"name": "batch"},
                    "spec": {"restartPolicy": "Never"}
                }
            ],
            "services": null
        })
        .to_string(),
    )
    .expect("valid capture");
    project(file.documents(), &BTreeSet::new()).expect("projection")
}

#[rstest]
#[case("image", FieldSelector::Name("image"))]
#[case("spec.containers", FieldSelector::Path(vec!["spec", "containers"]))]
fn selectors_follow_the_separator(#[case] field: &str, #[case] expected: FieldSelector<'static>) {
    assert_eq!(FieldSelector::parse(field).expect("valid field"), expected);
}

#[rstest]
#[case("")]
#[case("spec..containers")]
#[case(".spec")]
fn malformed_fields_are_rejected(#[case] field: &str) {
    let err = FieldSelector::parse(field).expect_err("malformed field");
    assert!(matches!(err, EffconfError::MalformedEntry(_)));
}

#[rstest]
fn name_search_matches_at_any_depth(projected: FixtureSet) {
    let values = extract(&projected, "image").expect("image values");
    assert_eq!(
        values,
        vec![
            json!("team-label"),
            json!("api:v2"),
            json!("nginx:1.25"),
            json!("envoy:1.29"),
        ]
    );
}

#[rstest]
fn strict_scope_skips_label_maps(projected: FixtureSet) {
    let extractor = Extractor::new(NameScope::strict());
    let values = extractor.extract(&projected, "image").expect("image values");
    assert_eq!(values.len(), 3);
    assert!(!values.contains(&json!("team-label")));
}

#[rstest]
fn skipped_keys_still_match_by_name(projected: FixtureSet) {
    let extractor = Extractor::new(NameScope::strict());
    let values = extractor.extract(&projected, "labels").expect("labels");
    assert_eq!(values, vec![json!({"image": "team-label"})]);
}

#[rstest]
fn path_returns_the_array_as_one_value(projected: FixtureSet) {
    let values = extract(&projected, "spec.containers").expect("containers");
    assert_eq!(values.len(), 1);
    assert_eq!(
        values.first().and_then(Value::as_array).map(Vec::len),
        Some(2)
    );
}

#[rstest]
fn path_fans_out_over_arrays(projected: FixtureSet) {
    let values = extract(&projected, "metadata.name").expect("names");
    assert_eq!(values, vec![json!("api"), json!("web"), json!("batch")]);
}

#[test]
fn path_fans_out_over_nested_item_arrays() {
    let file = FixtureFile::from_json_str(
        r#"{"lists": {"items": [{"metadata": {"name": "a"}}, {"metadata": {"name": "b"}}, 7]}}"#,
    )
    .expect("valid capture");
    let values = extract(file.documents(), "items.metadata.name").expect("names");
    assert_eq!(values, vec![json!("a"), json!("b")]);
}

#[rstest]
fn partial_misses_are_not_errors(projected: FixtureSet) {
    let values = extract(&projected, "restartPolicy").expect("restart policy");
    assert_eq!(values, vec![json!("Never")]);
}

#[rstest]
fn aggregate_miss_is_field_not_found(projected: FixtureSet) {
    let err = extract(&projected, "spec.volumes").expect_err("no volumes");
    assert!(matches!(err, EffconfError::FieldNotFound { ref field } if &**field == "spec.volumes"));
}

#[test]
fn malformed_document_fails_before_extraction() {
    let err = FixtureFile::from_json_str(r#"{"pods": [{"image": "a"}], "broken": [{"image": }]}"#)
        .expect_err("malformed capture");
    assert_eq!(err.stage(), Some(DecodeStage::FixtureDecode));
}
