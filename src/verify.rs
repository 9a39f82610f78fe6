//! The result verifier: value check (wildcard, text, or total-order
//! numeric), exact status-set check, and the mismatch diagnostic.

use std::cmp::Ordering;
use std::io::Write;

use crate::case::{Actual, TestCase};
use crate::context::{Context, Status};
use crate::engine::Engine;
use crate::errors::Result;

/// Returns true when both the value and the status set match. A mismatch
/// writes the diagnostic block to `out`; the caller counts it as a failure.
pub fn check<E: Engine, W: Write>(
    engine: &E,
    case: &TestCase,
    actual: &Actual,
    actual_status: Status,
    ctx: &Context,
    out: &mut W,
) -> Result<bool> {
    let value_matched = if case.expected == "?" {
        true
    } else {
        match actual {
            Actual::Text(text) => *text == case.expected,
            Actual::Value(value) => match &case.expected_value {
                Some(expected) => engine.compare_total(value, expected) == Ordering::Equal,
                None => true,
            },
        }
    };
    let status_matched = actual_status == case.expected_status;
    if value_matched && status_matched {
        return Ok(true);
    }

    let (actual_text, expected_text) = match actual {
        Actual::Text(text) => (text.clone(), case.expected.clone()),
        Actual::Value(value) => (
            engine.to_sci_string(value),
            case.expected_value
                .as_ref()
                .map(|e| engine.to_sci_string(e))
                .unwrap_or_else(|| case.expected.clone()),
        ),
    };
    writeln!(
        out,
        "id={}  {} {} -> {} [{}]",
        case.id,
        case.operation.name(),
        case.operands.join(" "),
        case.expected,
        case.expected_status,
    )?;
    writeln!(out, "value {}", matched_word(value_matched))?;
    writeln!(out, "   actual_value=[{actual_text}]")?;
    writeln!(out, " expected_value=[{expected_text}]")?;
    writeln!(out, "status {}", matched_word(status_matched))?;
    writeln!(out, "    actual_status=[{actual_status}]")?;
    writeln!(out, "  expected_status=[{}]", case.expected_status)?;
    writeln!(out, "{ctx}")?;
    Ok(false)
}

fn matched_word(matched: bool) -> &'static str {
    if matched {
        "matched"
    } else {
        "unmatched"
    }
}
