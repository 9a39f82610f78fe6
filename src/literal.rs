//! Literal classification and decoding.
//!
//! A test-case token is one of: a plain numeric literal, hex notation
//! (`#` followed by 8, 16 or 32 hex digits naming an exact encoding), the
//! format-dependent notation (`32#`/`64#`/`128#` prefix), the wildcard `?`,
//! or a lone `#` marking an omitted operand.
//!
//! Most literals decode under a *derived* context whose precision is the
//! literal's own coefficient digit count and whose exponent bounds are
//! effectively unbounded; only the conversion-exercising operators (`apply`,
//! `tosci`, `toeng`) decode their operands under the directive context, where
//! any flags raised stay visible to the test case.

use crate::context::Context;
use crate::engine::{DecValue, Engine, Format};
use crate::errors::{Result, RunnerError};
use crate::ops::Operation;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Literal {
    /// Ordinary numeric string, fed to the engine's string conversion.
    Plain(String),
    /// Exact encoding given as hex; the width picks the format.
    Hex { format: Format, bytes: Vec<u8> },
    /// Value that must round-trip through an interchange format.
    FormatDependent { format: Format, text: String },
    /// `?`: matches any value when used as the expected result.
    Wildcard,
    /// A lone `#`: operand not supplied, the test case is skipped.
    Omitted,
}

impl Literal {
    pub fn classify(token: &str) -> Result<Literal> {
        if token == "?" {
            return Ok(Literal::Wildcard);
        }
        if let Some(rest) = token.strip_prefix('#') {
            if rest.is_empty() {
                return Ok(Literal::Omitted);
            }
            let format = Format::from_hex_digits(rest.len())
                .ok_or_else(|| RunnerError::BadHexLiteral(token.to_string()))?;
            let bytes = parse_hex_bytes(token, rest)?;
            return Ok(Literal::Hex { format, bytes });
        }
        if token.contains('#') {
            for (prefix, format) in [
                ("32#", Format::Decimal32),
                ("64#", Format::Decimal64),
                ("128#", Format::Decimal128),
            ] {
                if let Some(text) = token.strip_prefix(prefix) {
                    return Ok(Literal::FormatDependent { format, text: text.to_string() });
                }
            }
            return Err(RunnerError::BadFormatLiteral(token.to_string()));
        }
        Ok(Literal::Plain(token.to_string()))
    }
}

fn parse_hex_bytes(token: &str, hex: &str) -> Result<Vec<u8>> {
    let nibble = |c: u8| -> Option<u8> {
        match c {
            b'0'..=b'9' => Some(c - b'0'),
            b'a'..=b'f' => Some(c - b'a' + 10),
            b'A'..=b'F' => Some(c - b'A' + 10),
            _ => None,
        }
    };
    // widths are all even, so pairs always line up
    hex.as_bytes()
        .chunks(2)
        .map(|pair| match (nibble(pair[0]), nibble(pair[1])) {
            (Some(hi), Some(lo)) => Ok(hi << 4 | lo),
            _ => Err(RunnerError::BadHexLiteral(token.to_string())),
        })
        .collect()
}

/// Count the coefficient digits of a literal: skip a sign and a NaN prefix,
/// then count ASCII digits up to an exponent marker. This is what sizes the
/// derived decoding context.
pub fn coefficient_digits(token: &str) -> i32 {
    let mut s = token.as_bytes();
    if let Some(b'+' | b'-') = s.first() {
        s = &s[1..];
    }
    for prefix in [b"snan".as_slice(), b"nan".as_slice()] {
        if s.len() >= prefix.len() && s[..prefix.len()].eq_ignore_ascii_case(prefix) {
            s = &s[prefix.len()..];
            break;
        }
    }
    let mut count = 0;
    for &c in s {
        if c.is_ascii_digit() {
            count += 1;
        } else if c == b'e' || c == b'E' {
            break;
        }
    }
    count
}

fn decode_in<E: Engine>(
    engine: &E,
    literal: &Literal,
    ctx: &mut Context,
    canonical: bool,
) -> Option<DecValue> {
    match literal {
        Literal::Plain(text) => Some(engine.from_string(text, ctx)),
        // as an operand, the wildcard goes through conversion like any
        // other text and comes back as a NaN with Conversion_syntax
        Literal::Wildcard => Some(engine.from_string("?", ctx)),
        Literal::Omitted => None,
        Literal::Hex { format, bytes } => Some(if canonical {
            engine.decode(*format, &engine.canonical(*format, bytes))
        } else {
            // exercise the format: decode, re-encode under the context,
            // decode again
            let value = engine.decode(*format, bytes);
            let encoded = engine.encode(*format, &value, ctx);
            engine.decode(*format, &encoded)
        }),
        Literal::FormatDependent { format, text } => {
            let value = engine.from_string(text, ctx);
            let encoded = engine.encode(*format, &value, ctx);
            Some(engine.decode(*format, &encoded))
        }
    }
}

/// Decode one operand. Returns `None` only for an omitted (`#`) operand.
pub fn decode_operand<E: Engine>(
    engine: &E,
    token: &str,
    op: Operation,
    shared: &mut Context,
) -> Result<Option<DecValue>> {
    let literal = Literal::classify(token)?;
    if op.uses_directive_precision() {
        // conversion flags accumulate in the live context
        Ok(decode_in(engine, &literal, shared, false))
    } else {
        let mut local = shared.literal_context(coefficient_digits(token));
        let value = decode_in(engine, &literal, &mut local, op == Operation::Canonical);
        // flags raised under the derived context are not the test's business
        Ok(value)
    }
}

/// Decode the expected-result literal, or `None` for the wildcard. Always a
/// derived context; a literal spelled with `#` implies clamping for the
/// round trip and folds any flags it raises into the shared context.
pub fn decode_expected<E: Engine>(
    engine: &E,
    token: &str,
    shared: &mut Context,
) -> Result<Option<DecValue>> {
    let literal = Literal::classify(token)?;
    if literal == Literal::Wildcard {
        return Ok(None);
    }
    let hashed = !matches!(literal, Literal::Plain(_));
    let mut local = shared.literal_context(coefficient_digits(token));
    if hashed {
        local.clamp = true;
    }
    let value = decode_in(engine, &literal, &mut local, false);
    if hashed && !local.status.is_empty() {
        shared.raise(local.status);
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Status;
    use crate::engine::SimpleEngine;
    use pretty_assertions::assert_eq;

    #[test]
    fn classification() {
        assert_eq!(Literal::classify("?").unwrap(), Literal::Wildcard);
        assert_eq!(Literal::classify("#").unwrap(), Literal::Omitted);
        assert_eq!(
            Literal::classify("-7.50").unwrap(),
            Literal::Plain("-7.50".to_string())
        );
        assert_eq!(
            Literal::classify("#22500001").unwrap(),
            Literal::Hex { format: Format::Decimal32, bytes: vec![0x22, 0x50, 0x00, 0x01] }
        );
        assert_eq!(
            Literal::classify("64#1.23").unwrap(),
            Literal::FormatDependent { format: Format::Decimal64, text: "1.23".to_string() }
        );
        assert!(matches!(
            Literal::classify("#1234"),
            Err(RunnerError::BadHexLiteral(_))
        ));
        assert!(matches!(
            Literal::classify("#2250000g"),
            Err(RunnerError::BadHexLiteral(_))
        ));
        assert!(matches!(
            Literal::classify("16#1"),
            Err(RunnerError::BadFormatLiteral(_))
        ));
    }

    #[test]
    fn digit_counting() {
        assert_eq!(coefficient_digits("123"), 3);
        assert_eq!(coefficient_digits("-1.50"), 3);
        assert_eq!(coefficient_digits("1.23E+44"), 3);
        assert_eq!(coefficient_digits("Infinity"), 0);
        assert_eq!(coefficient_digits("NaN123"), 3);
        assert_eq!(coefficient_digits("-sNaN77"), 2);
        assert_eq!(coefficient_digits("0.001"), 4);
    }

    #[test]
    fn operand_decodes_exactly_under_derived_context() {
        let engine = SimpleEngine::new();
        let mut ctx = Context::default();
        ctx.precision = 5;
        // twelve digits survive even though the directive precision is 5
        let v = decode_operand(&engine, "123456789012", Operation::Add, &mut ctx)
            .unwrap()
            .unwrap();
        assert_eq!(v.to_sci_string(), "123456789012");
        assert!(ctx.status.is_empty());
    }

    #[test]
    fn directive_precision_operand_rounds_into_shared_context() {
        let engine = SimpleEngine::new();
        let mut ctx = Context::default(); // precision 9
        let v = decode_operand(&engine, "123456789012", Operation::Apply, &mut ctx)
            .unwrap()
            .unwrap();
        assert_eq!(v.to_sci_string(), "1.23456789E+11");
        assert!(ctx.status.contains(Status::ROUNDED));
        assert!(ctx.status.contains(Status::INEXACT));
    }

    #[test]
    fn omitted_operand_is_none() {
        let engine = SimpleEngine::new();
        let mut ctx = Context::default();
        let v = decode_operand(&engine, "#", Operation::Add, &mut ctx).unwrap();
        assert!(v.is_none());
    }

    #[test]
    fn hex_expected_round_trips() {
        let engine = SimpleEngine::new();
        let mut ctx = Context::default();
        let v = decode_expected(&engine, "#22500001", &mut ctx).unwrap().unwrap();
        assert_eq!(v.to_sci_string(), "1");
        assert!(ctx.status.is_empty());
        assert!(decode_expected(&engine, "?", &mut ctx).unwrap().is_none());
    }

    #[test]
    fn format_dependent_expected_rounds_to_format_width() {
        let engine = SimpleEngine::new();
        let mut ctx = Context::default();
        // 8 significant digits exceed decimal32's 7; the flags fold back
        let v = decode_expected(&engine, "32#12345678", &mut ctx).unwrap().unwrap();
        assert_eq!(v.to_sci_string(), "1.234568E+7");
        assert!(ctx.status.contains(Status::ROUNDED));
    }
}
