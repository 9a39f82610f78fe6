//! End-to-end runs over the scripts in `tests/data`.

use std::path::PathBuf;

use dectest_runner::{run_script, Counters, Result, Runner, RunnerError, SimpleEngine};
use pretty_assertions::assert_eq;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/data")
        .join(name)
}

fn run(name: &str) -> (Result<Counters>, String) {
    let mut out = Vec::new();
    let result = run_script(fixture(name), &mut out);
    (result, String::from_utf8(out).unwrap())
}

#[test]
fn smoke_script_passes() {
    let (result, out) = run("smoke.decTest");
    assert_eq!(
        result.unwrap(),
        Counters { tests: 1, successes: 1, failures: 0, skips: 0 }
    );
    assert!(
        out.ends_with("smoke.decTest: tests=1 success=1 failure=0 skip=0\n"),
        "{out}"
    );
}

#[test]
fn arithmetic_suite_passes_silently() {
    let (result, out) = run("arith.decTest");
    assert_eq!(
        result.unwrap(),
        Counters { tests: 49, successes: 49, failures: 0, skips: 0 }
    );
    // a clean file produces nothing but its summary line
    assert_eq!(out.lines().count(), 1, "{out}");
}

#[test]
fn hex_and_format_notations() {
    let (result, out) = run("hex.decTest");
    assert_eq!(
        result.unwrap(),
        Counters { tests: 11, successes: 10, failures: 0, skips: 1 }
    );
    assert!(
        out.ends_with("hex.decTest: tests=11 success=10 failure=0 skip=1\n"),
        "{out}"
    );
}

#[test]
fn mismatches_are_reported_and_counted() {
    let (result, out) = run("mismatch.decTest");
    assert_eq!(
        result.unwrap(),
        Counters { tests: 2, successes: 0, failures: 2, skips: 0 }
    );
    assert!(out.contains("id=addx001"), "{out}");
    assert!(out.contains("   actual_value=[2]"), "{out}");
    assert!(out.contains(" expected_value=[3]"), "{out}");
    assert!(out.contains("id=stax001"), "{out}");
    assert!(out.contains("status unmatched"), "{out}");
    assert!(out.contains("    actual_status=[Inexact Rounded]"), "{out}");
    assert!(out.contains("  expected_status=[Inexact]"), "{out}");
}

#[test]
fn default_skip_list_diverts_before_dispatch() {
    // ln and power would hit the engine's unsupported set if evaluated
    let (result, _) = run("skip.decTest");
    assert_eq!(
        result.unwrap(),
        Counters { tests: 3, successes: 1, failures: 0, skips: 2 }
    );
}

#[test]
fn empty_skip_list_lets_unsupported_operators_through() {
    let mut runner = Runner::with_skip_ids(SimpleEngine::new(), Vec::<String>::new());
    let mut out = Vec::new();
    let result = runner.run_file(fixture("skip.decTest"), &mut out);
    assert!(matches!(result, Err(RunnerError::Engine(_))), "{result:?}");
}

#[test]
fn extended_gate_skips_every_case() {
    let (result, _) = run("extended.decTest");
    assert_eq!(
        result.unwrap(),
        Counters { tests: 2, successes: 0, failures: 0, skips: 2 }
    );
}

#[test]
fn inclusion_folds_counters_and_isolates_contexts() {
    let (result, out) = run("parent.decTest");
    assert_eq!(
        result.unwrap(),
        Counters { tests: 3, successes: 3, failures: 0, skips: 0 }
    );
    // the child's summary comes first, then the parent's totals
    assert!(
        out.contains("child.decTest: tests=1 success=1 failure=0 skip=0"),
        "{out}"
    );
    assert!(
        out.ends_with("parent.decTest: tests=3 success=3 failure=0 skip=0\n"),
        "{out}"
    );
}

#[test]
fn self_inclusion_is_refused() {
    let mut out = Vec::new();
    let result = run_script(fixture("cycle.decTest"), &mut out);
    assert!(matches!(result, Err(RunnerError::IncludeCycle { .. })), "{result:?}");
    let out = String::from_utf8(out).unwrap();
    assert!(out.contains("== break because of failure."), "{out}");
}

#[test]
fn unknown_operator_aborts_the_file() {
    let (result, out) = run("badop.decTest");
    assert!(matches!(result, Err(RunnerError::UnknownOperator(_))), "{result:?}");
    // the summary still appears, counting the aborted case
    assert!(
        out.ends_with("badop.decTest: tests=1 success=0 failure=0 skip=0\n"),
        "{out}"
    );
}

#[test]
fn missing_script_is_an_open_error() {
    let (result, _) = run("no-such-file.decTest");
    assert!(matches!(result, Err(RunnerError::Open { .. })), "{result:?}");
}
