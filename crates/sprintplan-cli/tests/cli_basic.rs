//! Basic CLI E2E tests.
//!
//! Tests invoke the built binary against a temporary snapshot and config.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use serde_json::{json, Value};
use tempfile::TempDir;

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = json!({
            "projects": ["OPS"],
            "completed_periods": {
                "OPS": [{"items_completed": 4}, {"items_completed": 4}]
            },
            "active_items": {
                "OPS": [
                    {"key": "OPS-1", "summary": "Fix login", "type": "Bug", "priority": "Highest",
                     "status": "In Progress", "story_points": 3, "assignee": "Dana Scully"},
                    {"key": "OPS-2", "summary": "Add export", "priority": "High",
                     "status": "To Do", "story_points": "5", "assignee": "Fox Mulder"}
                ]
            },
            "backlog": {
                "OPS": [
                    {"key": "OPS-3", "summary": "Tune alerts", "priority": "Medium", "status": "Backlog"}
                ]
            },
            "availability": [{"source": "calendar", "content": "Walter is on vacation"}]
        });
        std::fs::write(
            dir.path().join("snapshot.json"),
            serde_json::to_string_pretty(&snapshot).unwrap(),
        )
        .unwrap();
        Self { dir }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn snapshot(&self) -> Value {
        let text = std::fs::read_to_string(self.path("snapshot.json")).unwrap();
        serde_json::from_str(&text).unwrap()
    }

    /// Run the binary with an isolated home and config.
    fn run(&self, args: &[&str]) -> (String, String, i32) {
        let output = Command::new(env!("CARGO_BIN_EXE_sprintplan"))
            .env("SPRINTPLAN_HOME", self.dir.path())
            .env_remove("RUST_LOG")
            .arg("--config")
            .arg(self.path("config.toml"))
            .args(args)
            .stdin(Stdio::null())
            .output()
            .expect("Failed to execute CLI command");

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        let code = output.status.code().unwrap_or(-1);
        (stdout, stderr, code)
    }

    fn input(&self) -> String {
        display(&self.path("snapshot.json"))
    }
}

fn display(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

#[test]
fn test_plan_prints_markdown() {
    let ws = Workspace::new();
    let (stdout, stderr, code) = ws.run(&["plan", "--input", &ws.input()]);
    assert_eq!(code, 0, "plan failed: {stderr}");
    assert!(stdout.starts_with("# Sprint Plan"));
    assert!(stdout.contains("### Dana Scully"));
    assert!(stdout.contains("### Fox Mulder"));
}

#[test]
fn test_plan_writes_output_file() {
    let ws = Workspace::new();
    let out = display(&ws.path("plan.md"));
    let (stdout, _, code) = ws.run(&["plan", "--input", &ws.input(), "--output", &out]);
    assert_eq!(code, 0);
    let written = std::fs::read_to_string(ws.path("plan.md")).unwrap();
    assert_eq!(written, stdout);
}

#[test]
fn test_plan_json() {
    let ws = Workspace::new();
    let (stdout, _, code) = ws.run(&["plan", "--input", &ws.input(), "--json"]);
    assert_eq!(code, 0);
    let outcome: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(outcome["plan"]["total_items"], 3);
    assert_eq!(outcome["plan"]["item_budget"], 3);
    assert_eq!(outcome["scored"][0]["key"], "OPS-1");
}

#[test]
fn test_analyze_reports_capacity() {
    let ws = Workspace::new();
    let (stdout, _, code) = ws.run(&["analyze", "--input", &ws.input()]);
    assert_eq!(code, 0);
    let analysis: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(analysis["capacity"]["total_members"], 2);
    assert_eq!(analysis["velocity"]["OPS"]["trend"], "stable");
    assert!(analysis["recommendation"]
        .as_str()
        .unwrap()
        .starts_with("Normal capacity"));
}

#[test]
fn test_execute_dry_run_leaves_snapshot_alone() {
    let ws = Workspace::new();
    let before = ws.snapshot();
    let (stdout, _, code) = ws.run(&["execute", "--input", &ws.input(), "--dry-run", "--transition"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("DRY RUN"));
    assert!(stdout.contains("| OPS-3 | Backlog | To Do | DRY RUN |"));
    assert_eq!(ws.snapshot(), before);
}

#[test]
fn test_execute_updates_snapshot() {
    let ws = Workspace::new();
    let (stdout, stderr, code) = ws.run(&["execute", "--input", &ws.input(), "--yes", "--transition"]);
    assert_eq!(code, 0, "execute failed: {stderr}");
    assert!(stdout.contains("# Sprint Execution Report"));

    let snapshot = ws.snapshot();
    let tuned = &snapshot["backlog"]["OPS"][0];
    assert_eq!(tuned["status"], "To Do");
    assert_eq!(tuned["assignee"], "Dana Scully");
}

#[test]
fn test_execute_without_confirmation_cancels() {
    let ws = Workspace::new();
    let before = ws.snapshot();
    let (_, stderr, code) = ws.run(&["execute", "--input", &ws.input()]);
    assert_eq!(code, 0);
    assert!(stderr.contains("Execution cancelled."));
    assert_eq!(ws.snapshot(), before);
}

#[test]
fn test_config_set_and_get() {
    let ws = Workspace::new();
    let (_, _, code) = ws.run(&["config", "set", "planner.max_items_per_person", "4"]);
    assert_eq!(code, 0);
    let (stdout, _, code) = ws.run(&["config", "get", "planner.max_items_per_person"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "4");

    let (stdout, _, code) = ws.run(&["config", "reset"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("reset"));
    let (stdout, _, _) = ws.run(&["config", "get", "planner.max_items_per_person"]);
    assert_eq!(stdout.trim(), "6");
}

#[test]
fn test_config_unknown_key_fails() {
    let ws = Workspace::new();
    let (_, stderr, code) = ws.run(&["config", "get", "planner.nope"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("unknown key"));

    let (_, stderr, code) = ws.run(&["config", "set", "planner.nope", "1"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("error: unknown config key: planner.nope"));
}

#[test]
fn test_missing_input_fails() {
    let ws = Workspace::new();
    let missing = display(&ws.path("missing.json"));
    let (_, stderr, code) = ws.run(&["plan", "--input", &missing]);
    assert_eq!(code, 1);
    assert!(stderr.contains("error: Failed to read snapshot"));
}
