//! CLI integration tests for the `effconf` binary.

use assert_cmd::Command;
use predicates::prelude::*;
use rstest::{fixture, rstest};
use std::fs;
use tempfile::TempDir;

/// Temporary directory holding a fixture capture and a few JSON documents.
#[fixture]
fn workspace() -> TempDir {
    let dir = tempfile::tempdir().expect("create temp dir");
    let files = [
        (
            "test_fixtures.json",
            r#"{
                "pods": [
                    {"image": "nginx:2", "metadata": {"labels": {"image": "label"}}},
                    {"image": "nginx:1", "probe": {"period": 3}}
                ],
                "services": null
            }"#,
        ),
        ("image.json", r#""nginx:1""#),
        ("base.json", r#"{"a": 1, "list": [1, 2]}"#),
        ("ext.json", r#"{"a": 2, "b": 3, "list": [9, 9, 9]}"#),
        (
            "entries.json",
            r#"[{"test_labels": ["TestProbe"], "field": "probe", "kinds": ["pods"], "baseline": {"period": 10}}]"#,
        ),
    ];
    for (name, content) in files {
        fs::write(dir.path().join(name), content).expect("write workspace file");
    }
    dir
}

fn effconf(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("effconf").expect("binary");
    cmd.current_dir(dir.path())
        .env_remove("EFFCONF_CONFIG_PATH")
        .env_remove("RUST_LOG");
    cmd
}

fn stdout_of(cmd: &mut Command) -> String {
    let output = cmd.output().expect("run effconf");
    assert!(output.status.success(), "{output:?}");
    String::from_utf8(output.stdout).expect("utf8 stdout")
}

#[rstest]
fn materialize_prints_distinct_results(workspace: TempDir) {
    let stdout = stdout_of(effconf(&workspace).args([
        "materialize",
        "--field",
        "image",
        "--kind",
        "pods",
        "--baseline",
        "image.json",
    ]));
    insta::assert_snapshot!(stdout.trim_end(), @r#"["nginx:2","label"]"#);
}

#[rstest]
fn strict_names_skip_label_maps(workspace: TempDir) {
    let stdout = stdout_of(effconf(&workspace).args([
        "materialize",
        "--field",
        "image",
        "--strict-names",
        "--baseline",
        "image.json",
    ]));
    insta::assert_snapshot!(stdout.trim_end(), @r#"["nginx:2"]"#);
}

#[rstest]
fn baseline_can_come_from_stdin(workspace: TempDir) {
    effconf(&workspace)
        .args(["materialize", "--field", "probe"])
        .write_stdin(r#"{"period": 3}"#)
        .assert()
        .success()
        .stdout(predicate::str::contains("No effective configuration differs"));
}

#[rstest]
fn diff_renders_a_patch_per_result(workspace: TempDir) {
    let stdout = stdout_of(effconf(&workspace).args([
        "materialize",
        "--entries",
        "entries.json",
        "--label",
        "TestProbe",
        "--mode",
        "override-only",
        "--diff",
    ]));
    insta::assert_snapshot!(stdout.trim_end(), @r#"
    [{"period":3}]
    # effective configuration 1
    --- original
    +++ modified
    @@ -1,3 +1,3 @@
     {
    -  "period": 10
    +  "period": 3
     }
    "#);
}

#[rstest]
fn missing_kinds_fail_the_command(workspace: TempDir) {
    effconf(&workspace)
        .args([
            "materialize",
            "--field",
            "image",
            "--kind",
            "pods",
            "--kind",
            "widgets",
            "--baseline",
            "image.json",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "requested fixture kinds not found: widgets",
        ));
}

#[rstest]
#[case(&["--mode", "sideways"], "unknown merge mode 'sideways'")]
#[case(&["--mode", "override", "--missing", "drop"], "unknown merge mode 'drop'")]
fn unknown_modes_are_rejected(
    workspace: TempDir,
    #[case] extra: &[&str],
    #[case] expected: &str,
) {
    effconf(&workspace)
        .args(["materialize", "--field", "image", "--baseline", "image.json"])
        .args(extra)
        .assert()
        .failure()
        .stderr(predicate::str::contains(expected));
}

#[rstest]
fn merge_prints_each_result(workspace: TempDir) {
    let stdout = stdout_of(effconf(&workspace).args([
        "merge", "base.json", "ext.json", "base.json", "--mode", "extend",
    ]));
    let results: serde_json::Value = serde_json::from_str(&stdout).expect("json output");
    assert_eq!(
        results,
        serde_json::json!([
            {"a": 1, "b": 3, "list": [1, 2, 9]},
            {"a": 1, "list": [1, 2]}
        ])
    );
}

#[rstest]
fn merge_reports_invalid_external_documents(workspace: TempDir) {
    fs::write(workspace.path().join("broken.json"), "{").expect("write broken");
    effconf(&workspace)
        .args(["merge", "base.json", "broken.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("external decode failed"));
}
