//! Binary-level tests for the command envelope and exit codes.

use assert_cmd::Command;
use predicates::prelude::*;

fn ploom() -> Command {
    Command::cargo_bin("ploom").unwrap()
}

#[test]
fn one_shot_success_emits_envelope() {
    ploom()
        .args(["plan", "create", "--goal", "ship", "--plan-id", "P"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"ok\":true"))
        .stdout(predicate::str::contains("\"id\":\"P\""));
}

#[test]
fn one_shot_domain_failure_exits_two() {
    ploom()
        .args(["plan", "view", "--plan", "missing"])
        .assert()
        .code(2)
        .stdout(predicate::str::contains("\"kind\":\"not_found\""));
}

#[test]
fn usage_error_exits_one_with_plain_text() {
    ploom()
        .args(["plan", "create"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("--goal"))
        .stdout(predicate::str::contains("\"ok\"").not());
}

#[test]
fn unknown_subcommand_exits_one() {
    ploom().args(["plan", "explode"]).assert().code(1);
}

#[test]
fn driver_keeps_state_across_lines() {
    let script = "\
plan create --goal demo --plan-id P
plan add --plan P --expected-version 1 --title A
plan update --plan P --expected-version 1 --step s1 --title X
";
    ploom()
        .write_stdin(script)
        .assert()
        .code(2)
        .stdout(predicate::str::contains("\"version\":2"))
        .stdout(predicate::str::contains("\"kind\":\"version_mismatch\""));
}

#[test]
fn driver_skips_blank_and_comment_lines() {
    let script = "\
# set up a plan
plan create --goal demo --plan-id P

plan view --plan P
";
    ploom()
        .write_stdin(script)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"goal\":\"demo\"").count(2));
}

#[test]
fn driver_quoting_supports_spaces() {
    let script = "plan create --goal 'ship the kernel' --plan-id P\n";
    ploom()
        .write_stdin(script)
        .assert()
        .success()
        .stdout(predicate::str::contains("ship the kernel"));
}

#[test]
fn completion_script_generates() {
    ploom()
        .args(["completion", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ploom"));
}

#[test]
fn help_lists_command_areas() {
    ploom()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("plan"))
        .stdout(predicate::str::contains("guard"))
        .stdout(predicate::str::contains("budget"));
}
