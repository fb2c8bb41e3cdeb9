use std::fs;
use std::process::Command;

fn noiseball(args: &[&str]) -> (bool, String) {
    let output = Command::new(env!("CARGO_BIN_EXE_noiseball"))
        .args(args)
        .output()
        .expect("Failed to execute noiseball");
    (
        output.status.success(),
        String::from_utf8_lossy(&output.stdout).into_owned(),
    )
}

#[test]
fn trace_prints_commands_and_releases_everything() {
    let (ok, stdout) = noiseball(&["trace", "--frames", "3"]);
    assert!(ok, "noiseball trace exited with error");

    assert!(stdout.contains("frame 0 nodes=960"), "{stdout}");
    assert!(stdout.contains("(reinitialized)"));
    assert!(stdout.contains("dispatch InitNodes groups=15"));
    assert_eq!(stdout.matches("dispatch UpdateNodes").count(), 3);
    assert!(stdout.contains("live buffers: 0"));
}

#[test]
fn trace_resize_reallocates() {
    let (ok, stdout) = noiseball(&["trace", "--frames", "4", "--resize-at", "2=256"]);
    assert!(ok);

    assert_eq!(stdout.matches("(reinitialized)").count(), 2);
    assert!(stdout.contains("frame 2 nodes=256"));
    assert!(stdout.contains("write-args #8 [240, 256, 0, 0, 0]"));
}

#[test]
fn inspect_reads_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ball.yaml");
    fs::write(&path, "max_nodes: 300\nscale: 0.2\n").unwrap();

    let (ok, stdout) = noiseball(&["inspect", "--config", path.to_str().unwrap(), "--json"]);
    assert!(ok);

    let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(json["node_count"], 256);
    assert_eq!(json["thread_groups"], 4);
    assert_eq!(json["max_edges"], 256);
    assert_eq!(json["node_buffer_bytes"], 256 * 16);
    let scale = json["config"]["scale"].as_f64().unwrap();
    assert!((scale - 0.2).abs() < 1e-6);
}

#[test]
fn inspect_clamps_tiny_capacity() {
    let (ok, stdout) = noiseball(&["inspect", "--max-nodes", "5"]);
    assert!(ok);
    assert!(stdout.contains("max nodes:       64"), "{stdout}");
    assert!(stdout.contains("thread groups:   1"));
}

#[test]
fn inspect_rejects_unsupported_config_format() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ball.toml");
    fs::write(&path, "max_nodes = 64\n").unwrap();

    let (ok, _) = noiseball(&["inspect", "--config", path.to_str().unwrap()]);
    assert!(!ok);
}
