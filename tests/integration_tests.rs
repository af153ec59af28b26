//! Integration tests for krossa
//!
//! Every test runs the full pipeline against temporary directories.

use krossa::config::KrossaConfig;
use krossa::output::{OUTPUT_FOOTER, OUTPUT_HEADER};
use krossa::pipeline::{SplitCoordinator, SplitResult};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::{tempdir, TempDir};

fn write_input(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

fn list_of(items: &[&str]) -> String {
    format!(
        r#"{{"apiVersion":"v1","kind":"List","metadata":{{"resourceVersion":""}},"items":[{}]}}"#,
        items.join(",")
    )
}

fn pod(ns: &str, name: &str) -> String {
    format!(r#"{{"kind":"Pod","metadata":{{"namespace":"{ns}","name":"{name}"}}}}"#)
}

fn run(output: &Path, inputs: Vec<PathBuf>, readers: usize) -> SplitResult {
    let config = KrossaConfig::new(output, inputs).with_readers(readers);
    SplitCoordinator::new(config).run().unwrap()
}

/// Items of one output file, parsed
fn items_of(path: &Path) -> Vec<Value> {
    let text = fs::read_to_string(path).unwrap();
    let doc: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(doc["kind"], "List");
    assert_eq!(doc["apiVersion"], "v1");
    doc["items"].as_array().unwrap().clone()
}

/// Every output file below `root`, keyed by relative path, with sorted items
fn snapshot(root: &Path) -> BTreeMap<String, Vec<String>> {
    let mut files = BTreeMap::new();
    let mut stack = vec![root.to_path_buf()];

    while let Some(dir) = stack.pop() {
        for entry in fs::read_dir(&dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                stack.push(path);
                continue;
            }
            let mut items: Vec<String> = items_of(&path).iter().map(Value::to_string).collect();
            items.sort();
            let rel = path.strip_prefix(root).unwrap().display().to_string();
            files.insert(rel, items);
        }
    }

    files
}

fn setup() -> (TempDir, TempDir) {
    (tempdir().unwrap(), tempdir().unwrap())
}

#[test]
fn test_end_to_end_example() {
    let (input_dir, out) = setup();
    let input = write_input(
        input_dir.path(),
        "dump.json",
        &list_of(&[
            r#"{"kind":"Pod","metadata":{"namespace":"ops"}}"#,
            r#"{"kind":"ConfigMap"}"#,
        ]),
    );

    let result = run(out.path(), vec![input], 2);
    assert!(result.is_success(), "{:?}", result.errors.messages());
    assert_eq!(result.objects_written, 2);
    assert_eq!(result.files_created, 5);

    let files = snapshot(out.path());
    let counts: BTreeMap<&str, usize> = files.iter().map(|(k, v)| (k.as_str(), v.len())).collect();
    assert_eq!(
        counts,
        BTreeMap::from([
            ("__all__.json", 2),
            ("default/ConfigMap.json", 1),
            ("default/__all__.json", 1),
            ("ops/Pod.json", 1),
            ("ops/__all__.json", 1),
        ])
    );

    let pods = items_of(&out.path().join("ops").join("Pod.json"));
    assert_eq!(pods[0]["metadata"]["namespace"], "ops");
    let maps = items_of(&out.path().join("default").join("ConfigMap.json"));
    assert!(maps[0].get("metadata").is_none());
}

#[test]
fn test_partition_counts_add_up() {
    let (input_dir, out) = setup();
    let mut inputs = Vec::new();
    for i in 0..6 {
        let items: Vec<String> = (0..25)
            .map(|j| {
                let ns = format!("ns-{}", j % 3);
                let kind = if j % 2 == 0 { "Pod" } else { "Service" };
                format!(r#"{{"kind":"{kind}","metadata":{{"namespace":"{ns}","name":"o-{i}-{j}"}}}}"#)
            })
            .collect();
        let refs: Vec<&str> = items.iter().map(String::as_str).collect();
        inputs.push(write_input(input_dir.path(), &format!("in-{i}.json"), &list_of(&refs)));
    }

    let result = run(out.path(), inputs, 4);
    assert!(result.is_success());
    assert_eq!(result.objects_written, 150);
    assert_eq!(result.inputs_decoded, 6);

    let files = snapshot(out.path());
    assert_eq!(files["__all__.json"].len(), 150);

    let ns_total: usize = files
        .iter()
        .filter(|(k, _)| k.ends_with("/__all__.json"))
        .map(|(_, v)| v.len())
        .sum();
    let kind_total: usize = files
        .iter()
        .filter(|(k, _)| k.contains('/') && !k.ends_with("/__all__.json"))
        .map(|(_, v)| v.len())
        .sum();
    assert_eq!(ns_total, 150);
    assert_eq!(kind_total, 150);

    // Every namespace file is the union of its kind files
    for ns in ["ns-0", "ns-1", "ns-2"] {
        let mut union: Vec<String> = files[&format!("{ns}/Pod.json")].clone();
        union.extend(files[&format!("{ns}/Service.json")].iter().cloned());
        union.sort();
        assert_eq!(union, files[&format!("{ns}/__all__.json")]);
    }
}

#[test]
fn test_reader_count_does_not_change_output() {
    let input_dir = tempdir().unwrap();
    let mut inputs = Vec::new();
    for i in 0..10 {
        let items: Vec<String> = (0..10).map(|j| pod(&format!("ns{}", j % 4), &format!("p{i}-{j}"))).collect();
        let refs: Vec<&str> = items.iter().map(String::as_str).collect();
        inputs.push(write_input(input_dir.path(), &format!("{i}.json"), &list_of(&refs)));
    }

    let single = tempdir().unwrap();
    let many = tempdir().unwrap();
    assert!(run(single.path(), inputs.clone(), 1).is_success());
    assert!(run(many.path(), inputs, 8).is_success());

    assert_eq!(snapshot(single.path()), snapshot(many.path()));
}

#[test]
fn test_items_keep_their_order_within_one_input() {
    let (input_dir, out) = setup();
    let items: Vec<String> = (0..50).map(|i| pod("ops", &format!("p{i:02}"))).collect();
    let refs: Vec<&str> = items.iter().map(String::as_str).collect();
    let input = write_input(input_dir.path(), "ordered.json", &list_of(&refs));

    assert!(run(out.path(), vec![input], 4).is_success());

    let names: Vec<String> = items_of(&out.path().join("ops").join("Pod.json"))
        .iter()
        .map(|item| item["metadata"]["name"].as_str().unwrap().to_string())
        .collect();
    let expected: Vec<String> = (0..50).map(|i| format!("p{i:02}")).collect();
    assert_eq!(names, expected);
}

#[test]
fn test_empty_list_creates_only_global_file() {
    let (input_dir, out) = setup();
    let input = write_input(input_dir.path(), "empty.json", &list_of(&[]));

    let result = run(out.path(), vec![input], 2);
    assert!(result.is_success());
    assert_eq!(result.files_created, 1);

    let text = fs::read_to_string(out.path().join("__all__.json")).unwrap();
    assert_eq!(text, format!("{OUTPUT_HEADER}{OUTPUT_FOOTER}"));
    assert!(items_of(&out.path().join("__all__.json")).is_empty());
}

#[test]
fn test_non_list_root_is_reported() {
    let (input_dir, out) = setup();
    let bad = write_input(
        input_dir.path(),
        "pod.json",
        r#"{"kind":"Pod","items":[{"kind":"Pod"}]}"#,
    );
    let good = write_input(input_dir.path(), "good.json", &list_of(&[&pod("ops", "a")]));

    let result = run(out.path(), vec![bad.clone(), good], 2);
    assert!(!result.is_success());
    assert_eq!(result.inputs_failed, 1);
    assert_eq!(result.objects_written, 1);

    let messages = result.errors.messages();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].starts_with(&bad.display().to_string()));
    assert!(messages[0].contains("Expected list object"));

    assert_eq!(items_of(&out.path().join("__all__.json")).len(), 1);
}

#[test]
fn test_broken_item_discards_whole_input() {
    let (input_dir, out) = setup();
    let input = write_input(
        input_dir.path(),
        "broken.json",
        r#"{"kind":"List","items":[{"kind":"Pod"},[1,2]]}"#,
    );

    let result = run(out.path(), vec![input], 1);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.objects_written, 0);
    assert!(items_of(&out.path().join("__all__.json")).is_empty());
}

#[test]
fn test_missing_input_reported_with_path() {
    let (input_dir, out) = setup();
    let missing = input_dir.path().join("nope.json");

    let result = run(out.path(), vec![missing.clone()], 1);
    let messages = result.errors.messages();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].starts_with(&format!("{}: ", missing.display())));
}

#[test]
fn test_namespace_separator_is_escaped() {
    let (input_dir, out) = setup();
    let input = write_input(
        input_dir.path(),
        "odd.json",
        &list_of(&[
            r#"{"kind":"Pod","metadata":{"namespace":"a/b"}}"#,
            r#"{"kind":"Pod","metadata":{"namespace":".."}}"#,
        ]),
    );

    let result = run(out.path(), vec![input], 1);
    assert!(result.is_success());

    assert_eq!(items_of(&out.path().join("a%2Fb").join("Pod.json")).len(), 1);
    assert_eq!(items_of(&out.path().join("%2E%2E").join("__all__.json")).len(), 1);
    assert!(!out.path().join("a").exists());
}

#[test]
fn test_items_copied_with_normalized_indentation() {
    let (input_dir, out) = setup();
    let input = write_input(
        input_dir.path(),
        "raw.json",
        "{\"kind\":\"List\",\"items\":[{\"kind\":\"Pod\",\"metadata\":{\"namespace\":\"ops\"},\"spec\":{\"n\":1.50,\"s\":\"\\u00e9\",\"e\":{}}}]}",
    );

    assert!(run(out.path(), vec![input], 1).is_success());

    let text = fs::read_to_string(out.path().join("ops").join("Pod.json")).unwrap();
    let expected_item = "{\n  \"kind\": \"Pod\",\n  \"metadata\": {\n    \"namespace\": \"ops\"\n  },\n  \"spec\": {\n    \"n\": 1.50,\n    \"s\": \"\\u00e9\",\n    \"e\": {}\n  }\n}";
    assert_eq!(text, format!("{OUTPUT_HEADER}{expected_item}{OUTPUT_FOOTER}"));
}

#[test]
fn test_write_failure_aborts_without_hanging() {
    let (input_dir, out) = setup();

    // A regular file where the namespace directory should go
    fs::write(out.path().join("ops"), b"blocker").unwrap();

    let mut inputs = Vec::new();
    for i in 0..40 {
        let items: Vec<String> = (0..20).map(|j| pod("ops", &format!("p{i}-{j}"))).collect();
        let refs: Vec<&str> = items.iter().map(String::as_str).collect();
        inputs.push(write_input(input_dir.path(), &format!("{i}.json"), &list_of(&refs)));
    }

    let config = KrossaConfig::new(out.path(), inputs)
        .with_readers(4)
        .with_queue_size(1);
    let result = SplitCoordinator::new(config).run().unwrap();

    assert!(result.aborted);
    assert!(!result.is_success());
    assert!(result.objects_written < 800);
    assert_eq!(
        result.objects_forwarded,
        result.objects_written + result.objects_discarded + 1
    );

    // Files opened before the failure are still closed properly
    items_of(&out.path().join("__all__.json"));
}
