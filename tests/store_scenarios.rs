//! End-to-end scenario coverage through the command envelope.
//!
//! Each test drives `cli::dispatch` against one in-memory state, the same
//! way the stdin driver does, and asserts on exit codes and envelope
//! payloads.

use serde_json::Value;

use planloom::cli::{dispatch, Outcome};
use planloom::core::config::GuardConfig;
use planloom::store::AgentState;

fn state() -> AgentState {
    AgentState::new(GuardConfig::default())
}

fn run(state: &mut AgentState, line: &str) -> (i32, Value) {
    let tokens = shell_words::split(line).expect("test line tokenizes");
    let Outcome { exit_code, output } = dispatch(state, &tokens);
    let value = serde_json::from_str(&output)
        .unwrap_or_else(|_| panic!("non-JSON output for '{}': {}", line, output));
    (exit_code, value)
}

fn ok(state: &mut AgentState, line: &str) -> Value {
    let (code, value) = run(state, line);
    assert_eq!(code, 0, "expected success for '{}': {}", line, value);
    value["data"].clone()
}

fn fail(state: &mut AgentState, line: &str) -> Value {
    let (code, value) = run(state, line);
    assert_eq!(code, 2, "expected domain failure for '{}': {}", line, value);
    value["error"].clone()
}

#[test]
fn version_fence_rejects_stale_write() {
    let mut state = state();
    ok(&mut state, "plan create --goal demo --plan-id P");
    let data = ok(
        &mut state,
        "plan add --plan P --expected-version 1 --title A",
    );
    assert_eq!(data["plan"]["version"], 2);
    let step = data["step"]["id"].as_str().unwrap().to_string();

    let error = fail(
        &mut state,
        &format!("plan update --plan P --expected-version 1 --step {} --title X", step),
    );
    assert_eq!(error["kind"], "version_mismatch");
    assert_eq!(error["current_version"], 2);
    assert_eq!(error["expected_version"], 1);

    // No event was appended for the failed call.
    let history = ok(&mut state, "plan history --plan P");
    assert_eq!(history["events"].as_array().unwrap().len(), 2);
}

#[test]
fn cycle_rejected_with_rotation_of_ids() {
    let mut state = state();
    ok(&mut state, "plan create --goal demo --plan-id P");
    ok(&mut state, "plan add --plan P --expected-version 1 --title A");
    ok(&mut state, "plan add --plan P --expected-version 2 --title B");
    ok(&mut state, "plan add --plan P --expected-version 3 --title C");
    ok(
        &mut state,
        "plan dep set --plan P --expected-version 4 --step s1 --deps s2",
    );
    ok(
        &mut state,
        "plan dep set --plan P --expected-version 5 --step s2 --deps s3",
    );

    let error = fail(
        &mut state,
        "plan dep set --plan P --expected-version 6 --step s3 --deps s1",
    );
    assert_eq!(error["kind"], "cycle");
    let cycle: Vec<String> = error["cycle"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap().to_string())
        .collect();
    assert_eq!(cycle.len(), 3);
    for id in ["s1", "s2", "s3"] {
        assert!(cycle.contains(&id.to_string()));
    }

    // s3's dependency list is unchanged (empty).
    let view = ok(&mut state, "plan view --plan P");
    let steps = view["plan"]["steps"].as_array().unwrap();
    let s3 = steps.iter().find(|s| s["id"] == "s3").unwrap();
    assert_eq!(s3["dependencies"].as_array().unwrap().len(), 0);
}

#[test]
fn remove_blocked_by_dependents() {
    let mut state = state();
    ok(&mut state, "plan create --goal demo --plan-id P");
    ok(&mut state, "plan add --plan P --expected-version 1 --title A");
    ok(
        &mut state,
        "plan add --plan P --expected-version 2 --title B --depends s1",
    );

    let error = fail(
        &mut state,
        "plan remove --plan P --expected-version 3 --step s1",
    );
    assert_eq!(error["kind"], "dependent_steps");
    assert_eq!(error["dependent_steps"], serde_json::json!(["s2"]));

    let view = ok(&mut state, "plan view --plan P");
    assert_eq!(view["plan"]["steps"].as_array().unwrap().len(), 2);
    assert_eq!(view["plan"]["version"], 3);
}

#[test]
fn reorder_honors_dependencies() {
    let mut state = state();
    ok(&mut state, "plan create --goal demo --plan-id P");
    ok(&mut state, "plan add --plan P --expected-version 1 --title A");
    ok(&mut state, "plan add --plan P --expected-version 2 --title B");
    ok(
        &mut state,
        "plan add --plan P --expected-version 3 --title C --depends s1",
    );

    let error = fail(
        &mut state,
        "plan reorder --plan P --expected-version 4 --order s3,s2,s1",
    );
    assert_eq!(error["kind"], "conflict_step");
    assert_eq!(error["conflict_step"], "s3");

    let data = ok(
        &mut state,
        "plan reorder --plan P --expected-version 4 --order s2,s1,s3",
    );
    let ids: Vec<&str> = data["plan"]["steps"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["s2", "s1", "s3"]);
}

#[test]
fn mark_done_blocked_until_dependencies_done() {
    let mut state = state();
    ok(&mut state, "plan create --goal demo --plan-id P");
    ok(&mut state, "plan add --plan P --expected-version 1 --title A");
    ok(
        &mut state,
        "plan add --plan P --expected-version 2 --title B --depends s1",
    );

    let error = fail(
        &mut state,
        "plan mark --plan P --expected-version 3 --step s2 --status done",
    );
    assert_eq!(error["kind"], "blocked_by");
    assert_eq!(error["blocked_by"], serde_json::json!(["s1"]));

    ok(
        &mut state,
        "plan mark --plan P --expected-version 3 --step s1 --status done",
    );
    let data = ok(
        &mut state,
        "plan mark --plan P --expected-version 4 --step s2 --status done",
    );
    assert_eq!(data["step"]["status"], "done");
}

#[test]
fn undo_redo_linearity() {
    let mut state = state();
    ok(&mut state, "plan create --goal demo --plan-id P");
    ok(
        &mut state,
        "plan add --plan P --expected-version 1 --title first",
    );
    ok(
        &mut state,
        "plan update --plan P --expected-version 2 --step s1 --title A",
    );
    ok(
        &mut state,
        "plan update --plan P --expected-version 3 --step s1 --title B",
    );

    let data = ok(&mut state, "plan undo --plan P --steps 1");
    assert_eq!(data["applied"], 1);
    assert_eq!(data["plan"]["steps"][0]["title"], "A");

    let data = ok(&mut state, "plan undo --plan P --steps 1");
    assert_eq!(data["plan"]["steps"][0]["title"], "first");

    let data = ok(&mut state, "plan redo --plan P --steps 2");
    assert_eq!(data["applied"], 2);
    assert_eq!(data["plan"]["steps"][0]["title"], "B");
}

#[test]
fn split_and_merge_round() {
    let mut state = state();
    ok(&mut state, "plan create --goal demo --plan-id P");
    ok(
        &mut state,
        "plan add --plan P --expected-version 1 --title big",
    );
    let data = ok(
        &mut state,
        "plan split --plan P --expected-version 2 --step s1 --child design::sketch --child build --keep-parent",
    );
    let children = data["children"].as_array().unwrap();
    assert_eq!(children.len(), 2);
    assert_eq!(children[0]["title"], "design");
    assert_eq!(children[0]["description"], "sketch");
    assert_eq!(children[0]["parent_id"], "s1");
    let parent = data["plan"]["steps"][0].clone();
    assert_eq!(parent["id"], "s1");
    assert_eq!(parent["virtual_parent"], true);

    let data = ok(
        &mut state,
        "plan merge --plan P --expected-version 3 --steps s2,s3 --title combined",
    );
    assert_eq!(data["step"]["title"], "combined");
    let ids: Vec<&str> = data["plan"]["steps"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["s1", "s4"]);
}

#[test]
fn checklist_lifecycle_and_unknown_op() {
    let mut state = state();
    ok(&mut state, "plan create --goal demo --plan-id P");
    ok(&mut state, "plan add --plan P --expected-version 1 --title A");

    let data = ok(
        &mut state,
        "plan checklist --plan P --expected-version 2 --step s1 --op add --text verify",
    );
    let item = data["step"]["checklist"][0]["id"].as_str().unwrap().to_string();

    let data = ok(
        &mut state,
        &format!("plan checklist --plan P --expected-version 3 --step s1 --op toggle --item {}", item),
    );
    assert_eq!(data["step"]["checklist"][0]["done"], true);

    let error = fail(
        &mut state,
        "plan checklist --plan P --expected-version 4 --step s1 --op explode",
    );
    assert_eq!(error["kind"], "unknown_op");

    let error = fail(
        &mut state,
        "plan checklist --plan P --expected-version 4 --step s1 --op toggle",
    );
    assert_eq!(error["kind"], "missing_argument");
}

#[test]
fn snapshot_survives_later_mutations() {
    let mut state = state();
    ok(&mut state, "plan create --goal demo --plan-id P");
    ok(&mut state, "plan add --plan P --expected-version 1 --title A");
    let snap = ok(&mut state, "plan snapshot --plan P --reason baseline");
    assert_eq!(snap["snapshot"]["plan"]["version"], 2);

    ok(
        &mut state,
        "plan update --plan P --expected-version 2 --step s1 --title changed",
    );
    let view = ok(&mut state, "plan view --plan P --include-history");
    let snapshots = view["snapshots"].as_array().unwrap();
    assert_eq!(snapshots.len(), 1);
    assert_eq!(snapshots[0]["plan"]["steps"][0]["title"], "A");
    assert_eq!(view["plan"]["steps"][0]["title"], "changed");
}

#[test]
fn brief_reflects_plan_state() {
    let mut state = state();
    ok(&mut state, "plan create --goal 'ship the kernel' --plan-id P");
    ok(&mut state, "plan add --plan P --expected-version 1 --title A");
    ok(&mut state, "plan add --plan P --expected-version 2 --title B");
    ok(&mut state, "plan add --plan P --expected-version 3 --title C");
    ok(
        &mut state,
        "plan mark --plan P --expected-version 4 --step s1 --status done",
    );
    ok(
        &mut state,
        "plan mark --plan P --expected-version 5 --step s2 --status running --reason started",
    );

    let data = ok(&mut state, "plan brief --plan P");
    assert_eq!(data["now_step_id"], "s2");
    assert_eq!(data["done_step_ids"], serde_json::json!(["s1"]));
    assert_eq!(data["next_step_ids"], serde_json::json!(["s3"]));
    let text = data["mic_text"].as_str().unwrap();
    assert!(text.starts_with("Goal: ship the kernel\n"));
    assert!(text.contains("Now: [s2] B"));
    assert!(text.len() <= 800);
}

#[test]
fn signals_are_advisory() {
    let mut state = state();
    ok(&mut state, "plan create --goal demo --plan-id P");
    let data = ok(
        &mut state,
        "plan signal --plan P --type START --step s1 --note beginning",
    );
    assert_eq!(data["signal"]["type"], "START");
    assert_eq!(data["plan"]["version"], 1);

    let view = ok(&mut state, "plan view --plan P --include-history");
    assert_eq!(view["signals"].as_array().unwrap().len(), 1);
}

#[test]
fn budgets_report_overruns_without_enforcing() {
    let mut state = state();
    ok(&mut state, "budget set --task t1 --tokens 100");
    let data = ok(&mut state, "budget meter --task t1 --tokens 150 --requests 1");
    assert_eq!(data["budget"]["used"]["tokens"], 150);
    assert_eq!(data["over_budget"]["tokens"], true);
    assert_eq!(data["over_budget"]["requests"], false);

    // Still meterable after the overrun.
    let data = ok(&mut state, "budget meter --task t1 --tokens 10");
    assert_eq!(data["budget"]["used"]["tokens"], 160);
}

#[test]
fn timer_records_deadline() {
    let mut state = state();
    let data = ok(&mut state, "timer --task t1 --step s1 --timeout 30");
    assert_eq!(data["timer"]["timeout_s"], 30);
    assert!(data["timer"]["id"].as_str().unwrap().starts_with("timer-"));
}

#[test]
fn context_capture_pin_pack() {
    let mut state = state();
    let a = ok(
        &mut state,
        "ctx capture --task t1 --type code --title reader --summary 'parses input'",
    )["entry_id"]
        .as_str()
        .unwrap()
        .to_string();
    let _b = ok(
        &mut state,
        "ctx capture --task t1 --type note --title memo --summary 'remember this'",
    );

    let data = ok(&mut state, &format!("ctx pin --entry {}", a));
    assert_eq!(data["affected"], serde_json::json!([a.clone()]));

    let data = ok(
        &mut state,
        "ctx pack-for-mic --task t1 --token-cap 200 --type-priority code,note",
    );
    let used: Vec<&str> = data["used_ids"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap())
        .collect();
    assert_eq!(used[0], a);
    assert!(data["text"].as_str().unwrap().contains("[code] reader"));
}

#[test]
fn guard_decisions_follow_policy() {
    let mut state = state();
    let data = ok(&mut state, "guard fs --op read --path /etc/passwd");
    assert_eq!(data["allowed"], false);

    let data = ok(&mut state, "guard shell --command 'rm target/debug'");
    assert_eq!(data["allowed"], true);
    assert_eq!(data["require_snapshot"], true);

    let data = ok(&mut state, "guard net --host example.org");
    assert_eq!(data["allowed"], true);
}

#[test]
fn risk_and_review_derive_from_plan() {
    let mut state = state();
    ok(&mut state, "plan create --goal demo --plan-id P");
    ok(
        &mut state,
        "plan add --plan P --expected-version 1 --title hot --priority 3",
    );
    ok(
        &mut state,
        "plan add --plan P --expected-version 2 --title calm",
    );

    let data = ok(&mut state, "risk assess --plan P");
    let steps = data["steps"].as_array().unwrap();
    assert_eq!(steps[0]["risk"], "high");
    assert_eq!(steps[0]["need_review"], true);
    assert_eq!(steps[1]["risk"], "low");
    assert_eq!(steps[1]["need_review"], false);

    let data = ok(
        &mut state,
        "request review --plan P --intent 'apply migration' --step s1",
    );
    assert_eq!(data["review"]["steps_needing_review"], serde_json::json!(["s1"]));
    assert_eq!(data["review"]["intent"], "apply migration");
}

#[test]
fn global_log_and_report_summary() {
    let mut state = state();
    ok(&mut state, "plan create --goal demo --plan-id P");
    ok(&mut state, "plan add --plan P --expected-version 1 --title A");
    let data = ok(
        &mut state,
        "log event --plan P --type milestone --message 'first step in'",
    );
    assert_eq!(data["event"]["type"], "milestone");

    let data = ok(&mut state, "report summary --plan P");
    let text = data["summary"].as_str().unwrap();
    assert!(text.contains("Plan P"));
    assert!(text.contains("[pending] s1 A"));
    assert!(text.contains("Events: 2"));
}
