//! The test-case evaluator: parse one tokenized test line, reset the
//! context's status and traps, decode the expectation and operands, drive
//! the engine, and hand the outcome to the verifier.

use std::io::Write;

use crate::context::{Context, Status};
use crate::engine::{DecValue, Engine};
use crate::errors::{Result, RunnerError};
use crate::literal;
use crate::ops::{Operation, ResultKind};
use crate::verify;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Pass,
    Fail,
    Skip,
}

/// What the engine produced for a case.
pub enum Actual {
    Value(DecValue),
    Text(String),
}

pub struct TestCase {
    pub id: String,
    pub operation: Operation,
    pub operands: Vec<String>,
    pub expected: String,
    pub expected_value: Option<DecValue>,
    pub expected_status: Status,
}

/// Run one test line. `tokens` is known to contain `->`.
pub fn run<E: Engine, W: Write>(
    engine: &E,
    tokens: &[String],
    ctx: &mut Context,
    skip_ids: &[String],
    out: &mut W,
) -> Result<Outcome> {
    let arrow = tokens
        .iter()
        .position(|t| t == "->")
        .ok_or_else(|| RunnerError::UnsupportedLine(tokens.join(" ")))?;
    if arrow < 2 {
        return Err(RunnerError::UnsupportedLine(tokens.join(" ")));
    }
    let id = &tokens[0];
    let operation = Operation::lookup(&tokens[1])?;
    let operands = &tokens[2..arrow];
    let expected = tokens
        .get(arrow + 1)
        .ok_or(RunnerError::MissingExpected)?
        .clone();
    let mut expected_status = Status::empty();
    for name in &tokens[arrow + 2..] {
        expected_status |= Status::from_name(name)
            .ok_or_else(|| RunnerError::UnknownStatus(name.clone()))?;
    }

    // every case starts from a clean slate
    ctx.status.clear();
    ctx.traps.clear();

    let expected_value = match operation.result_kind() {
        ResultKind::Numeric => literal::decode_expected(engine, &expected, ctx)?,
        ResultKind::Text => None,
    };

    if operands.iter().any(|o| o == "#") || skip_ids.iter().any(|s| s == id) {
        tracing::debug!(id = %id, "skipping test case");
        return Ok(Outcome::Skip);
    }

    if operands.len() != operation.arity() {
        return Err(RunnerError::OperandCount {
            operator: operation.name(),
            expected: operation.arity(),
            got: operands.len(),
        });
    }

    let mut values = Vec::with_capacity(operands.len());
    for operand in operands {
        // omitted operands were diverted to Skip above
        let value = literal::decode_operand(engine, operand, operation, ctx)?
            .ok_or_else(|| RunnerError::BadHexLiteral(operand.clone()))?;
        values.push(value);
    }

    let actual = match operation {
        Operation::Class => Actual::Text(engine.class_name(&values[0], ctx).to_string()),
        Operation::ToSci => Actual::Text(engine.to_sci_string(&values[0])),
        Operation::ToEng => Actual::Text(engine.to_eng_string(&values[0])),
        _ => Actual::Value(engine.evaluate(operation, &values, ctx)?),
    };
    let actual_status = ctx.status;

    let case = TestCase {
        id: id.clone(),
        operation,
        operands: operands.to_vec(),
        expected,
        expected_value,
        expected_status,
    };
    if verify::check(engine, &case, &actual, actual_status, ctx, out)? {
        Ok(Outcome::Pass)
    } else {
        Ok(Outcome::Fail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::SimpleEngine;
    use crate::tokens::tokenize;
    use pretty_assertions::assert_eq;

    fn run_line(line: &str, ctx: &mut Context) -> (Result<Outcome>, String) {
        let engine = SimpleEngine::new();
        let tokens = tokenize(line);
        let mut out = Vec::new();
        let outcome = run(&engine, &tokens, ctx, &[], &mut out);
        (outcome, String::from_utf8(out).unwrap())
    }

    #[test]
    fn passing_case_is_silent() {
        let mut ctx = Context::default();
        let (outcome, out) = run_line("addx001 add 1 1 -> 2", &mut ctx);
        assert_eq!(outcome.unwrap(), Outcome::Pass);
        assert_eq!(out, "");
    }

    #[test]
    fn status_expectation_must_match_exactly() {
        let mut ctx = Context::default();
        let (outcome, _) =
            run_line("divx001 divide 1 3 -> 0.333333333 Inexact Rounded", &mut ctx);
        assert_eq!(outcome.unwrap(), Outcome::Pass);
        let (outcome, out) = run_line("divx002 divide 1 3 -> 0.333333333 Inexact", &mut ctx);
        assert_eq!(outcome.unwrap(), Outcome::Fail);
        assert!(out.contains("status unmatched"), "{out}");
    }

    #[test]
    fn value_mismatch_prints_both_sides() {
        let mut ctx = Context::default();
        let (outcome, out) = run_line("addx002 add 1 1 -> 3", &mut ctx);
        assert_eq!(outcome.unwrap(), Outcome::Fail);
        assert!(out.contains("actual_value=[2]"), "{out}");
        assert!(out.contains("expected_value=[3]"), "{out}");
    }

    #[test]
    fn omitted_operand_skips() {
        let mut ctx = Context::default();
        let (outcome, out) = run_line("nulx001 add # 1 -> ?", &mut ctx);
        assert_eq!(outcome.unwrap(), Outcome::Skip);
        assert_eq!(out, "");
    }

    #[test]
    fn skip_list_is_honored() {
        let engine = SimpleEngine::new();
        let mut ctx = Context::default();
        let tokens = tokenize("lnx732 add 1 1 -> 2");
        let mut out = Vec::new();
        let outcome = run(&engine, &tokens, &mut ctx, &["lnx732".to_string()], &mut out);
        assert_eq!(outcome.unwrap(), Outcome::Skip);
    }

    #[test]
    fn wildcard_expectation_matches_any_value() {
        let mut ctx = Context::default();
        let (outcome, _) = run_line("wldx001 multiply 2 3 -> ?", &mut ctx);
        assert_eq!(outcome.unwrap(), Outcome::Pass);
    }

    #[test]
    fn text_results_compare_as_strings() {
        let mut ctx = Context::default();
        ctx.emax = 384;
        ctx.emin = -383;
        let (outcome, _) = run_line("clsx001 class 2.50 -> +Normal", &mut ctx);
        assert_eq!(outcome.unwrap(), Outcome::Pass);
        let (outcome, _) = run_line("scix001 tosci 1.23E+4 -> '1.23E+4'", &mut ctx);
        assert_eq!(outcome.unwrap(), Outcome::Pass);
        let (outcome, _) = run_line("engx001 toeng 1.23E+5 -> 123E+3", &mut ctx);
        assert_eq!(outcome.unwrap(), Outcome::Pass);
    }

    #[test]
    fn wrong_arity_is_a_hard_error() {
        let mut ctx = Context::default();
        let (outcome, _) = run_line("addx003 add 1 -> 1", &mut ctx);
        assert!(matches!(outcome, Err(RunnerError::OperandCount { .. })));
    }

    #[test]
    fn unknown_operator_is_a_hard_error() {
        let mut ctx = Context::default();
        let (outcome, _) = run_line("wibx001 frobnicate 1 -> 1", &mut ctx);
        assert!(matches!(outcome, Err(RunnerError::UnknownOperator(_))));
    }

    #[test]
    fn unknown_status_name_is_a_hard_error() {
        let mut ctx = Context::default();
        let (outcome, _) = run_line("addx004 add 1 1 -> 2 Sticky", &mut ctx);
        assert!(matches!(outcome, Err(RunnerError::UnknownStatus(_))));
    }
}
