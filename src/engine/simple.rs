//! `SimpleEngine`: the in-tree reference arithmetic. Exact coefficient
//! arithmetic on `BigUint` followed by a single rounding step per operation,
//! covering string conversion, the interchange encodings, and the
//! non-transcendental operator set.

use std::cmp::Ordering;

use num_bigint::{BigInt, BigUint, Sign};
use num_traits::{One, ToPrimitive, Zero};

use crate::context::{Context, Rounding, Status};
use crate::ops::Operation;

use super::dpd::{self, Format};
use super::value::{DecValue, Kind};
use super::{Engine, EngineError};

#[derive(Clone, Copy, Debug, Default)]
pub struct SimpleEngine;

impl SimpleEngine {
    pub fn new() -> SimpleEngine {
        SimpleEngine
    }
}

impl Engine for SimpleEngine {
    fn from_string(&self, text: &str, ctx: &mut Context) -> DecValue {
        from_string(text, ctx)
    }

    fn to_sci_string(&self, value: &DecValue) -> String {
        value.to_sci_string()
    }

    fn to_eng_string(&self, value: &DecValue) -> String {
        value.to_eng_string()
    }

    fn decode(&self, format: Format, bytes: &[u8]) -> DecValue {
        dpd::decode(format, bytes)
    }

    fn encode(&self, format: Format, value: &DecValue, ctx: &mut Context) -> Vec<u8> {
        encode_value(format, value, ctx)
    }

    fn canonical(&self, format: Format, bytes: &[u8]) -> Vec<u8> {
        dpd::encode_raw(format, &dpd::decode(format, bytes))
    }

    fn class_name(&self, value: &DecValue, ctx: &Context) -> &'static str {
        class_of(value, ctx)
    }

    fn compare_total(&self, a: &DecValue, b: &DecValue) -> Ordering {
        total_order(a, b)
    }

    fn evaluate(
        &self,
        op: Operation,
        v: &[DecValue],
        ctx: &mut Context,
    ) -> Result<DecValue, EngineError> {
        use Operation::*;
        Ok(match op {
            Abs => sign_op(&v[0], ctx, SignOp::Abs),
            Plus => sign_op(&v[0], ctx, SignOp::Plus),
            Minus => sign_op(&v[0], ctx, SignOp::Minus),
            Add => add(&v[0], &v[1], ctx),
            Subtract => subtract(&v[0], &v[1], ctx),
            Multiply => multiply(&v[0], &v[1], ctx),
            Fma => fma(&v[0], &v[1], &v[2], ctx),
            Divide => divide(&v[0], &v[1], ctx),
            DivideInt => divide_int(&v[0], &v[1], ctx),
            Remainder => remainder(&v[0], &v[1], ctx, false),
            RemainderNear => remainder(&v[0], &v[1], ctx, true),
            Compare => compare(&v[0], &v[1], ctx, false),
            CompareSig => compare(&v[0], &v[1], ctx, true),
            CompareTotal => DecValue::from_int(ord_to_int(total_order(&v[0], &v[1]))),
            CompareTotMag => {
                let (mut a, mut b) = (v[0].clone(), v[1].clone());
                a.sign = false;
                b.sign = false;
                DecValue::from_int(ord_to_int(total_order(&a, &b)))
            }
            Copy => v[0].clone(),
            CopyAbs => {
                let mut r = v[0].clone();
                r.sign = false;
                r
            }
            CopyNegate => {
                let mut r = v[0].clone();
                r.sign = !r.sign;
                r
            }
            CopySign => {
                let mut r = v[0].clone();
                r.sign = v[1].sign;
                r
            }
            Max => min_max(&v[0], &v[1], ctx, true, false),
            Min => min_max(&v[0], &v[1], ctx, false, false),
            MaxMag => min_max(&v[0], &v[1], ctx, true, true),
            MinMag => min_max(&v[0], &v[1], ctx, false, true),
            Quantize => quantize_like(&v[0], &v[1], ctx, false),
            Rescale => quantize_like(&v[0], &v[1], ctx, true),
            Reduce => reduce(&v[0], ctx),
            Trim => trim(&v[0]),
            LogB => logb(&v[0], ctx),
            ScaleB => scaleb(&v[0], &v[1], ctx),
            Shift => shift_rotate(&v[0], &v[1], ctx, false),
            Rotate => shift_rotate(&v[0], &v[1], ctx, true),
            And | Or | Xor | Invert => logical_op(op, v, ctx),
            SameQuantum => same_quantum(&v[0], &v[1]),
            ToIntegral => to_integral(&v[0], ctx, false),
            ToIntegralX => to_integral(&v[0], ctx, true),
            // literal decoding already conditioned the operand
            Apply | Canonical => v[0].clone(),
            Exp | Ln | Log10 | Power | SquareRoot | NextMinus | NextPlus | NextToward => {
                return Err(EngineError::Unsupported(op.name()))
            }
            // text-result operations go through the string entry points
            Class | ToSci | ToEng => return Err(EngineError::Unsupported(op.name())),
        })
    }
}

// ---------------------------------------------------------------------------
// coefficient helpers
// ---------------------------------------------------------------------------

fn coeff_of(v: &DecValue) -> BigUint {
    v.digits
        .iter()
        .fold(BigUint::zero(), |acc, &d| acc * 10u32 + u32::from(d))
}

fn digits_of(n: &BigUint) -> Vec<u8> {
    n.to_string().bytes().map(|b| b - b'0').collect()
}

fn num_digits(n: &BigUint) -> i64 {
    n.to_string().len() as i64
}

fn pow10(n: u64) -> BigUint {
    num_traits::pow(BigUint::from(10u32), n as usize)
}

fn rem10(n: &BigUint) -> u8 {
    (n % 10u32).to_u32().unwrap_or(0) as u8
}

fn pad_digits(digits: &[u8], width: usize) -> Vec<u8> {
    if digits.len() >= width {
        digits[digits.len() - width..].to_vec()
    } else {
        let mut v = vec![0u8; width - digits.len()];
        v.extend_from_slice(digits);
        v
    }
}

fn clamp_exp(e: i64) -> i32 {
    e.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}

fn big_signed(sign: bool, mag: BigUint) -> BigInt {
    BigInt::from_biguint(if sign { Sign::Minus } else { Sign::Plus }, mag)
}

fn qnan() -> DecValue {
    DecValue::nan(false, vec![], false)
}

fn invalid(ctx: &mut Context) -> DecValue {
    ctx.raise(Status::INVALID_OPERATION);
    qnan()
}

fn ord_to_int(o: Ordering) -> i64 {
    match o {
        Ordering::Less => -1,
        Ordering::Equal => 0,
        Ordering::Greater => 1,
    }
}

fn propagate_nan(operands: &[&DecValue], ctx: &mut Context) -> Option<DecValue> {
    if let Some(v) = operands.iter().find(|v| v.is_signaling()) {
        ctx.raise(Status::INVALID_OPERATION);
        let mut r = (*v).clone();
        r.kind = Kind::Quiet;
        return Some(r);
    }
    operands.iter().find(|v| v.is_nan()).map(|&v| v.clone())
}

// ---------------------------------------------------------------------------
// rounding
// ---------------------------------------------------------------------------

/// Whether the truncated result must be incremented, given the discarded
/// part's relation to half an ulp and the kept least significant digit.
fn round_up(ctx: &mut Context, sign: bool, half: Ordering, exact: bool, lsd: u8) -> bool {
    if exact {
        return false;
    }
    match ctx.rounding {
        Rounding::Down => false,
        Rounding::Up => true,
        Rounding::HalfUp => half != Ordering::Less,
        Rounding::HalfEven => half == Ordering::Greater || (half == Ordering::Equal && lsd % 2 == 1),
        Rounding::HalfDown => half == Ordering::Greater,
        Rounding::Ceiling => !sign,
        Rounding::Floor => sign,
        Rounding::ZeroFiveUp => lsd == 0 || lsd == 5,
        Rounding::Max => {
            ctx.raise(Status::INVALID_CONTEXT);
            false
        }
    }
}

/// Discard `drop` low digits of `coeff`, rounding per context. Returns true
/// when the discarded digits were all zero. Raises no accuracy flags itself.
fn round_at(coeff: &mut BigUint, drop: u64, sign: bool, ctx: &mut Context) -> bool {
    if coeff.is_zero() {
        return true;
    }
    if drop > num_digits(coeff) as u64 {
        // everything is discarded and lies below half an ulp
        let up = round_up(ctx, sign, Ordering::Less, false, 0);
        *coeff = if up { BigUint::one() } else { BigUint::zero() };
        return false;
    }
    let scale = pow10(drop);
    let half = &scale / 2u32;
    let q = &*coeff / &scale;
    let r = &*coeff % &scale;
    let exact = r.is_zero();
    let mut q = q;
    if round_up(ctx, sign, r.cmp(&half), exact, rem10(&q)) {
        q += 1u32;
    }
    *coeff = q;
    exact
}

/// The single rounding step every arithmetic result goes through: precision
/// rounding, overflow, subnormal/underflow at etiny, fold-down clamp, and
/// zero-exponent clamping, with the matching condition flags.
fn round_finite(sign: bool, mut coeff: BigUint, mut exp: i64, ctx: &mut Context) -> DecValue {
    let precision = ctx.precision.max(0) as i64;
    if precision > 0 {
        let nd = num_digits(&coeff);
        if nd > precision && !coeff.is_zero() {
            let drop = nd - precision;
            let exact = round_at(&mut coeff, drop as u64, sign, ctx);
            exp += drop;
            ctx.raise(Status::ROUNDED);
            if !exact {
                ctx.raise(Status::INEXACT);
            }
            if num_digits(&coeff) > precision {
                // carry widened the coefficient (999... became 1000...)
                coeff /= 10u32;
                exp += 1;
            }
        }
        if !coeff.is_zero() {
            let adjusted = exp + num_digits(&coeff) - 1;
            if adjusted > ctx.emax as i64 {
                ctx.raise(Status::OVERFLOW | Status::INEXACT | Status::ROUNDED);
                return overflow_result(sign, ctx);
            }
            if adjusted < ctx.emin as i64 {
                ctx.raise(Status::SUBNORMAL);
                let etiny = ctx.etiny() as i64;
                if exp < etiny {
                    let drop = (etiny - exp) as u64;
                    let exact = round_at(&mut coeff, drop, sign, ctx);
                    exp = etiny;
                    ctx.raise(Status::ROUNDED);
                    if !exact {
                        ctx.raise(Status::INEXACT | Status::UNDERFLOW);
                    }
                    if coeff.is_zero() {
                        ctx.raise(Status::CLAMPED);
                    } else if num_digits(&coeff) > precision {
                        coeff /= 10u32;
                        exp += 1;
                    }
                }
            }
        }
        if ctx.clamp && exp > ctx.emax as i64 - (precision - 1) {
            let qmax = ctx.emax as i64 - (precision - 1);
            if !coeff.is_zero() {
                coeff *= pow10((exp - qmax) as u64);
            }
            exp = qmax;
            ctx.raise(Status::CLAMPED);
        }
        if coeff.is_zero() {
            let etiny = ctx.etiny() as i64;
            if exp > ctx.emax as i64 {
                exp = ctx.emax as i64;
                ctx.raise(Status::CLAMPED);
            }
            if exp < etiny {
                exp = etiny;
                ctx.raise(Status::CLAMPED);
            }
        }
    }
    DecValue::finite(sign, digits_of(&coeff), clamp_exp(exp))
}

fn overflow_result(sign: bool, ctx: &mut Context) -> DecValue {
    let to_infinity = match ctx.rounding {
        Rounding::Down | Rounding::ZeroFiveUp => false,
        Rounding::Floor => sign,
        Rounding::Ceiling => !sign,
        _ => true,
    };
    if to_infinity {
        DecValue::infinity(sign)
    } else {
        let p = ctx.precision.max(1);
        DecValue::finite(sign, vec![9; p as usize], ctx.emax - (p - 1))
    }
}

fn round_value(v: &DecValue, ctx: &mut Context) -> DecValue {
    if v.is_finite() {
        round_finite(v.sign, coeff_of(v), v.exponent as i64, ctx)
    } else {
        v.clone()
    }
}

// ---------------------------------------------------------------------------
// string conversion
// ---------------------------------------------------------------------------

enum Parsed {
    Finite { sign: bool, digits: Vec<u8>, exponent: i64 },
    Infinity(bool),
    Nan { sign: bool, signaling: bool, payload: Vec<u8> },
}

fn parse_decimal(s: &str) -> Option<Parsed> {
    let bytes = s.as_bytes();
    let mut i = 0;
    let mut sign = false;
    if let Some(&c @ (b'+' | b'-')) = bytes.first() {
        sign = c == b'-';
        i = 1;
    }
    let rest = &s[i..];
    if rest.eq_ignore_ascii_case("inf") || rest.eq_ignore_ascii_case("infinity") {
        return Some(Parsed::Infinity(sign));
    }
    for (prefix, signaling) in [("snan", true), ("nan", false)] {
        if rest.len() >= prefix.len() && rest[..prefix.len()].eq_ignore_ascii_case(prefix) {
            let payload = &rest[prefix.len()..];
            if !payload.bytes().all(|c| c.is_ascii_digit()) {
                return None;
            }
            return Some(Parsed::Nan {
                sign,
                signaling,
                payload: payload.bytes().map(|b| b - b'0').collect(),
            });
        }
    }
    // coefficient: digits with at most one point, then optional exponent
    let (mantissa, exp_text) = match rest.find(['e', 'E']) {
        Some(pos) => (&rest[..pos], Some(&rest[pos + 1..])),
        None => (rest, None),
    };
    let mut digits = Vec::new();
    let mut frac: i64 = 0;
    let mut seen_point = false;
    for c in mantissa.bytes() {
        match c {
            b'0'..=b'9' => {
                digits.push(c - b'0');
                if seen_point {
                    frac += 1;
                }
            }
            b'.' if !seen_point => seen_point = true,
            _ => return None,
        }
    }
    if digits.is_empty() {
        return None;
    }
    let mut exponent: i64 = 0;
    if let Some(text) = exp_text {
        let bytes = text.as_bytes();
        let mut j = 0;
        let mut exp_sign = false;
        if let Some(&c @ (b'+' | b'-')) = bytes.first() {
            exp_sign = c == b'-';
            j = 1;
        }
        if j == bytes.len() {
            return None;
        }
        for &c in &bytes[j..] {
            if !c.is_ascii_digit() {
                return None;
            }
            // saturate well past any usable exponent range
            exponent = (exponent * 10 + i64::from(c - b'0')).min(1_000_000_000_000_000);
        }
        if exp_sign {
            exponent = -exponent;
        }
    }
    Some(Parsed::Finite { sign, digits, exponent: exponent - frac })
}

fn from_string(text: &str, ctx: &mut Context) -> DecValue {
    match parse_decimal(text) {
        Some(Parsed::Infinity(sign)) => DecValue::infinity(sign),
        Some(Parsed::Nan { sign, signaling, payload }) => {
            if payload.len() as i32 > ctx.precision.max(1) {
                ctx.raise(Status::CONVERSION_SYNTAX);
                return qnan();
            }
            DecValue::nan(sign, payload, signaling)
        }
        Some(Parsed::Finite { sign, digits, exponent }) => {
            let coeff = digits
                .iter()
                .fold(BigUint::zero(), |acc, &d| acc * 10u32 + u32::from(d));
            round_finite(sign, coeff, exponent, ctx)
        }
        None => {
            ctx.raise(Status::CONVERSION_SYNTAX);
            qnan()
        }
    }
}

// ---------------------------------------------------------------------------
// comparison
// ---------------------------------------------------------------------------

/// Magnitude ordering of two finite nonzero values.
fn cmp_magnitude(a: &DecValue, b: &DecValue) -> Ordering {
    match a.adjusted_exponent().cmp(&b.adjusted_exponent()) {
        Ordering::Equal => {
            let ea = a.exponent as i64;
            let eb = b.exponent as i64;
            let e = ea.min(eb);
            let ca = coeff_of(a) * pow10((ea - e) as u64);
            let cb = coeff_of(b) * pow10((eb - e) as u64);
            ca.cmp(&cb)
        }
        o => o,
    }
}

fn cmp_finite(a: &DecValue, b: &DecValue) -> Ordering {
    match (a.is_zero(), b.is_zero()) {
        (true, true) => return Ordering::Equal,
        (true, false) => return if b.sign { Ordering::Greater } else { Ordering::Less },
        (false, true) => return if a.sign { Ordering::Less } else { Ordering::Greater },
        _ => {}
    }
    if a.sign != b.sign {
        return if a.sign { Ordering::Less } else { Ordering::Greater };
    }
    let mag = cmp_magnitude(a, b);
    if a.sign {
        mag.reverse()
    } else {
        mag
    }
}

/// Numeric ordering of two non-NaN values.
fn cmp_values(a: &DecValue, b: &DecValue) -> Ordering {
    match (a.is_infinite(), b.is_infinite()) {
        (true, true) => match (a.sign, b.sign) {
            (x, y) if x == y => Ordering::Equal,
            (true, false) => Ordering::Less,
            _ => Ordering::Greater,
        },
        (true, false) => {
            if a.sign {
                Ordering::Less
            } else {
                Ordering::Greater
            }
        }
        (false, true) => {
            if b.sign {
                Ordering::Greater
            } else {
                Ordering::Less
            }
        }
        _ => cmp_finite(a, b),
    }
}

/// The specification's total ordering over every value, NaNs included:
/// -NaN < -sNaN < -Infinity < finite negatives < -0 < 0 < ... < NaN.
fn total_order(a: &DecValue, b: &DecValue) -> Ordering {
    if a.sign != b.sign {
        return if a.sign { Ordering::Less } else { Ordering::Greater };
    }
    let rank = |v: &DecValue| match v.kind {
        Kind::Finite => 0,
        Kind::Infinite => 1,
        Kind::Signaling => 2,
        Kind::Quiet => 3,
    };
    let magnitude = match rank(a).cmp(&rank(b)) {
        Ordering::Equal => match a.kind {
            Kind::Infinite => Ordering::Equal,
            Kind::Quiet | Kind::Signaling => a
                .digits
                .len()
                .cmp(&b.digits.len())
                .then_with(|| a.digits.cmp(&b.digits)),
            Kind::Finite => total_finite_abs(a, b),
        },
        o => o,
    };
    if a.sign {
        magnitude.reverse()
    } else {
        magnitude
    }
}

fn total_finite_abs(a: &DecValue, b: &DecValue) -> Ordering {
    match (a.is_zero(), b.is_zero()) {
        (true, true) => a.exponent.cmp(&b.exponent),
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        _ => match cmp_magnitude(a, b) {
            // numerically equal: the one with the smaller exponent sorts first
            Ordering::Equal => a.exponent.cmp(&b.exponent),
            o => o,
        },
    }
}

fn compare(a: &DecValue, b: &DecValue, ctx: &mut Context, signal_quiet: bool) -> DecValue {
    if a.is_nan() || b.is_nan() {
        if a.is_signaling() || b.is_signaling() || signal_quiet {
            ctx.raise(Status::INVALID_OPERATION);
        }
        let src = if a.is_signaling() {
            a
        } else if b.is_signaling() {
            b
        } else if a.is_nan() {
            a
        } else {
            b
        };
        let mut r = src.clone();
        r.kind = Kind::Quiet;
        return r;
    }
    DecValue::from_int(ord_to_int(cmp_values(a, b)))
}

fn min_max(a: &DecValue, b: &DecValue, ctx: &mut Context, want_max: bool, by_mag: bool) -> DecValue {
    if a.is_signaling() || b.is_signaling() {
        if let Some(n) = propagate_nan(&[a, b], ctx) {
            return n;
        }
    }
    match (a.is_nan(), b.is_nan()) {
        (true, true) => {
            let mut r = a.clone();
            r.kind = Kind::Quiet;
            return r;
        }
        // a quiet NaN loses to any number, silently
        (true, false) => return round_value(b, ctx),
        (false, true) => return round_value(a, ctx),
        _ => {}
    }
    let base = if by_mag {
        let (mut xa, mut xb) = (a.clone(), b.clone());
        xa.sign = false;
        xb.sign = false;
        cmp_values(&xa, &xb)
    } else {
        cmp_values(a, b)
    };
    let ord = match base {
        Ordering::Equal => total_order(a, b),
        o => o,
    };
    let chosen = match ord {
        Ordering::Greater => {
            if want_max {
                a
            } else {
                b
            }
        }
        Ordering::Less => {
            if want_max {
                b
            } else {
                a
            }
        }
        Ordering::Equal => a,
    };
    round_value(chosen, ctx)
}

// ---------------------------------------------------------------------------
// arithmetic
// ---------------------------------------------------------------------------

/// Collapse an operand lying entirely below the rounding horizon into a
/// single sticky unit so that exponent gaps never force astronomically long
/// alignments.
fn collapse_below(coeff: &mut BigUint, exp: &mut i64, adjusted: Option<i64>, floor: i64) {
    match adjusted {
        Some(adj) if adj < floor => {
            *coeff = BigUint::one();
            *exp = floor - 1;
        }
        None if *exp < floor - 1 => *exp = floor - 1,
        _ => {}
    }
}

fn add(a: &DecValue, b: &DecValue, ctx: &mut Context) -> DecValue {
    if let Some(n) = propagate_nan(&[a, b], ctx) {
        return n;
    }
    match (a.is_infinite(), b.is_infinite()) {
        (true, true) => {
            return if a.sign == b.sign {
                DecValue::infinity(a.sign)
            } else {
                invalid(ctx)
            }
        }
        (true, false) => return DecValue::infinity(a.sign),
        (false, true) => return DecValue::infinity(b.sign),
        _ => {}
    }
    let mut ca = coeff_of(a);
    let mut cb = coeff_of(b);
    let mut ea = a.exponent as i64;
    let mut eb = b.exponent as i64;
    let adj_a = (!a.is_zero()).then(|| a.adjusted_exponent());
    let adj_b = (!b.is_zero()).then(|| b.adjusted_exponent());
    if ctx.precision > 0 {
        if let Some(hi) = adj_a.max(adj_b) {
            let floor = hi - (ctx.precision as i64 + 2);
            collapse_below(&mut ca, &mut ea, adj_a, floor);
            collapse_below(&mut cb, &mut eb, adj_b, floor);
        }
    }
    let target = ea.min(eb);
    let ia = big_signed(a.sign, ca * pow10((ea - target) as u64));
    let ib = big_signed(b.sign, cb * pow10((eb - target) as u64));
    let (s, mag) = (ia + ib).into_parts();
    let sign = if mag.is_zero() {
        if a.sign == b.sign {
            a.sign
        } else {
            ctx.rounding == Rounding::Floor
        }
    } else {
        s == Sign::Minus
    };
    round_finite(sign, mag, target, ctx)
}

fn subtract(a: &DecValue, b: &DecValue, ctx: &mut Context) -> DecValue {
    if let Some(n) = propagate_nan(&[a, b], ctx) {
        return n;
    }
    let mut nb = b.clone();
    nb.sign = !nb.sign;
    add(a, &nb, ctx)
}

fn multiply(a: &DecValue, b: &DecValue, ctx: &mut Context) -> DecValue {
    if let Some(n) = propagate_nan(&[a, b], ctx) {
        return n;
    }
    let sign = a.sign != b.sign;
    if a.is_infinite() || b.is_infinite() {
        if a.is_zero() || b.is_zero() {
            return invalid(ctx);
        }
        return DecValue::infinity(sign);
    }
    round_finite(
        sign,
        coeff_of(a) * coeff_of(b),
        a.exponent as i64 + b.exponent as i64,
        ctx,
    )
}

fn fma(a: &DecValue, b: &DecValue, c: &DecValue, ctx: &mut Context) -> DecValue {
    if let Some(n) = propagate_nan(&[a, b, c], ctx) {
        return n;
    }
    // exact product, one rounding at the end of the addition
    let mut wide = ctx.clone();
    wide.precision = 0;
    wide.status = Status::empty();
    let product = multiply(a, b, &mut wide);
    ctx.raise(wide.status);
    if product.is_nan() {
        return product;
    }
    add(&product, c, ctx)
}

fn divide(a: &DecValue, b: &DecValue, ctx: &mut Context) -> DecValue {
    if let Some(n) = propagate_nan(&[a, b], ctx) {
        return n;
    }
    let sign = a.sign != b.sign;
    match (a.is_infinite(), b.is_infinite()) {
        (true, true) => return invalid(ctx),
        (true, false) => return DecValue::infinity(sign),
        (false, true) => {
            let mut z = DecValue::zero();
            z.sign = sign;
            z.exponent = clamp_exp(ctx.etiny() as i64);
            return z;
        }
        _ => {}
    }
    if b.is_zero() {
        if a.is_zero() {
            ctx.raise(Status::DIVISION_UNDEFINED);
            return qnan();
        }
        ctx.raise(Status::DIVISION_BY_ZERO);
        return DecValue::infinity(sign);
    }
    let ideal = a.exponent as i64 - b.exponent as i64;
    if a.is_zero() {
        return round_finite(sign, BigUint::zero(), ideal, ctx);
    }
    let ca = coeff_of(a);
    let cb = coeff_of(b);
    let prec = ctx.precision.max(1) as i64;
    let shift = prec + num_digits(&cb) - num_digits(&ca) + 1;
    let (mut q, r, mut e);
    if shift >= 0 {
        let scaled = ca * pow10(shift as u64);
        q = &scaled / &cb;
        r = scaled % &cb;
        e = ideal - shift;
    } else {
        q = &ca / &cb;
        r = ca % cb;
        e = ideal;
    }
    if r.is_zero() {
        // exact: give back trailing zeros down toward the ideal exponent
        while e < ideal && rem10(&q) == 0 {
            q /= 10u32;
            e += 1;
        }
    } else {
        // sticky adjustment so a single rounding step sees the remainder
        let lsd = rem10(&q);
        if lsd == 0 || lsd == 5 {
            q += 1u32;
        }
    }
    round_finite(sign, q, e, ctx)
}

fn divide_int(a: &DecValue, b: &DecValue, ctx: &mut Context) -> DecValue {
    if let Some(n) = propagate_nan(&[a, b], ctx) {
        return n;
    }
    let sign = a.sign != b.sign;
    if a.is_infinite() {
        return invalid(ctx);
    }
    if b.is_infinite() {
        let mut z = DecValue::zero();
        z.sign = sign;
        return z;
    }
    if b.is_zero() {
        if a.is_zero() {
            ctx.raise(Status::DIVISION_UNDEFINED);
            return qnan();
        }
        ctx.raise(Status::DIVISION_BY_ZERO);
        return DecValue::infinity(sign);
    }
    let prec = ctx.precision.max(1) as i64;
    if a.is_zero() {
        let mut z = DecValue::zero();
        z.sign = sign;
        return z;
    }
    if a.adjusted_exponent() - b.adjusted_exponent() > prec + 1 {
        ctx.raise(Status::DIVISION_IMPOSSIBLE);
        return qnan();
    }
    let (n, d) = aligned_coeffs(a, b);
    let q = &n / &d;
    if num_digits(&q) > prec {
        ctx.raise(Status::DIVISION_IMPOSSIBLE);
        return qnan();
    }
    DecValue::finite(sign, digits_of(&q), 0)
}

fn remainder(a: &DecValue, b: &DecValue, ctx: &mut Context, near: bool) -> DecValue {
    if let Some(n) = propagate_nan(&[a, b], ctx) {
        return n;
    }
    if a.is_infinite() {
        return invalid(ctx);
    }
    if b.is_infinite() {
        return round_value(a, ctx);
    }
    if b.is_zero() {
        if a.is_zero() {
            ctx.raise(Status::DIVISION_UNDEFINED);
            return qnan();
        }
        return invalid(ctx);
    }
    if a.is_zero() {
        return DecValue::finite(a.sign, vec![0], a.exponent.min(b.exponent));
    }
    let prec = ctx.precision.max(1) as i64;
    if a.adjusted_exponent() - b.adjusted_exponent() > prec + 1 {
        ctx.raise(Status::DIVISION_IMPOSSIBLE);
        return qnan();
    }
    let e = (a.exponent as i64).min(b.exponent as i64);
    let (n, d) = aligned_coeffs(a, b);
    let mut q = &n / &d;
    let mut rem = n % &d;
    let mut reversed = false;
    if near {
        let twice = 2u32 * &rem;
        if twice > d || (twice == d && rem10(&q) % 2 == 1) {
            rem = &d - &rem;
            reversed = true;
            q += 1u32;
        }
    }
    if num_digits(&q) > prec {
        ctx.raise(Status::DIVISION_IMPOSSIBLE);
        return qnan();
    }
    round_finite(a.sign != reversed, rem, e, ctx)
}

fn aligned_coeffs(a: &DecValue, b: &DecValue) -> (BigUint, BigUint) {
    let ea = a.exponent as i64;
    let eb = b.exponent as i64;
    let e = ea.min(eb);
    (
        coeff_of(a) * pow10((ea - e) as u64),
        coeff_of(b) * pow10((eb - e) as u64),
    )
}

// ---------------------------------------------------------------------------
// sign, quantum, and digit-manipulation operations
// ---------------------------------------------------------------------------

enum SignOp {
    Abs,
    Plus,
    Minus,
}

fn sign_op(a: &DecValue, ctx: &mut Context, op: SignOp) -> DecValue {
    if let Some(n) = propagate_nan(&[a], ctx) {
        return n;
    }
    let sign = match op {
        SignOp::Abs => false,
        SignOp::Plus => a.sign,
        SignOp::Minus => !a.sign,
    };
    if a.is_infinite() {
        return DecValue::infinity(sign);
    }
    let mut r = round_finite(sign, coeff_of(a), a.exponent as i64, ctx);
    if r.is_zero() {
        // a zero result takes the sign of 0+x / 0-x under the rounding mode
        r.sign = match op {
            SignOp::Abs => false,
            SignOp::Plus => a.sign && ctx.rounding == Rounding::Floor,
            SignOp::Minus => !a.sign && ctx.rounding == Rounding::Floor,
        };
    }
    r
}

fn quantize_like(a: &DecValue, b: &DecValue, ctx: &mut Context, exp_from_value: bool) -> DecValue {
    if let Some(n) = propagate_nan(&[a, b], ctx) {
        return n;
    }
    if a.is_infinite() || b.is_infinite() {
        if a.is_infinite() && b.is_infinite() {
            return a.clone();
        }
        return invalid(ctx);
    }
    let target = if exp_from_value {
        match value_to_i64(b) {
            Some(t) => t,
            None => return invalid(ctx),
        }
    } else {
        b.exponent as i64
    };
    quantize_to(a, target, ctx)
}

fn quantize_to(a: &DecValue, target: i64, ctx: &mut Context) -> DecValue {
    let prec = ctx.precision.max(1) as i64;
    if target > ctx.emax as i64 || target < ctx.etiny() as i64 {
        return invalid(ctx);
    }
    let diff = a.exponent as i64 - target;
    let mut coeff = coeff_of(a);
    let mut exact = true;
    if diff > 0 {
        if !coeff.is_zero() && num_digits(&coeff) + diff > prec {
            return invalid(ctx);
        }
        coeff *= pow10(diff as u64);
    } else if diff < 0 {
        exact = round_at(&mut coeff, (-diff) as u64, a.sign, ctx);
    }
    if num_digits(&coeff) > prec {
        return invalid(ctx);
    }
    if !exact {
        ctx.raise(Status::INEXACT | Status::ROUNDED);
    }
    DecValue::finite(a.sign, digits_of(&coeff), clamp_exp(target))
}

fn to_integral(a: &DecValue, ctx: &mut Context, raise_flags: bool) -> DecValue {
    if let Some(n) = propagate_nan(&[a], ctx) {
        return n;
    }
    if a.is_infinite() || a.exponent >= 0 {
        return a.clone();
    }
    let mut coeff = coeff_of(a);
    let exact = round_at(&mut coeff, (-(a.exponent as i64)) as u64, a.sign, ctx);
    if raise_flags && !exact {
        ctx.raise(Status::INEXACT | Status::ROUNDED);
    }
    DecValue::finite(a.sign, digits_of(&coeff), 0)
}

fn reduce(a: &DecValue, ctx: &mut Context) -> DecValue {
    if let Some(n) = propagate_nan(&[a], ctx) {
        return n;
    }
    if a.is_infinite() {
        return a.clone();
    }
    let mut r = round_value(a, ctx);
    if r.is_zero() {
        r.exponent = 0;
        return r;
    }
    while r.digits.len() > 1 && r.digits.last() == Some(&0) {
        r.digits.pop();
        r.exponent = r.exponent.saturating_add(1);
    }
    r
}

/// Remove insignificant fractional zeros; no flags, no rounding.
fn trim(a: &DecValue) -> DecValue {
    let mut r = a.clone();
    if !r.is_finite() {
        return r;
    }
    if r.is_zero() {
        if r.exponent < 0 {
            r.exponent = 0;
        }
        return r;
    }
    while r.exponent < 0 && r.digits.len() > 1 && r.digits.last() == Some(&0) {
        r.digits.pop();
        r.exponent += 1;
    }
    r
}

fn logb(a: &DecValue, ctx: &mut Context) -> DecValue {
    if let Some(n) = propagate_nan(&[a], ctx) {
        return n;
    }
    if a.is_infinite() {
        return DecValue::infinity(false);
    }
    if a.is_zero() {
        ctx.raise(Status::DIVISION_BY_ZERO);
        return DecValue::infinity(true);
    }
    round_value(&DecValue::from_int(a.adjusted_exponent()), ctx)
}

fn scaleb(a: &DecValue, b: &DecValue, ctx: &mut Context) -> DecValue {
    if let Some(n) = propagate_nan(&[a, b], ctx) {
        return n;
    }
    let limit = 2 * (ctx.emax as i64 + ctx.precision.max(1) as i64);
    let n = match value_to_i64(b) {
        Some(n) if n.abs() <= limit => n,
        _ => return invalid(ctx),
    };
    if a.is_infinite() {
        return a.clone();
    }
    round_finite(a.sign, coeff_of(a), a.exponent as i64 + n, ctx)
}

fn shift_rotate(a: &DecValue, b: &DecValue, ctx: &mut Context, rotate: bool) -> DecValue {
    if let Some(n) = propagate_nan(&[a, b], ctx) {
        return n;
    }
    let prec = ctx.precision.max(1) as i64;
    let n = match value_to_i64(b) {
        Some(n) if n.abs() <= prec => n,
        _ => return invalid(ctx),
    };
    if a.is_infinite() {
        return a.clone();
    }
    if a.digits.len() as i64 > prec {
        return invalid(ctx);
    }
    let width = prec as usize;
    let mut ds = pad_digits(&a.digits, width);
    let k = n.unsigned_abs() as usize;
    if rotate {
        if n >= 0 {
            ds.rotate_left(k % width);
        } else {
            ds.rotate_right(k % width);
        }
    } else if n >= 0 {
        ds.drain(..k);
        ds.extend(std::iter::repeat(0).take(k));
    } else {
        ds.truncate(width - k);
        let mut padded = vec![0u8; k];
        padded.extend_from_slice(&ds);
        ds = padded;
    }
    DecValue::finite(a.sign, ds, a.exponent)
}

fn logical_digits(v: &DecValue, width: usize) -> Option<Vec<u8>> {
    if !v.is_finite() || v.sign || v.exponent != 0 {
        return None;
    }
    if v.digits.len() > width || v.digits.iter().any(|&d| d > 1) {
        return None;
    }
    Some(pad_digits(&v.digits, width))
}

fn logical_op(op: Operation, v: &[DecValue], ctx: &mut Context) -> DecValue {
    let width = ctx.precision.max(1) as usize;
    let Some(x) = logical_digits(&v[0], width) else {
        return invalid(ctx);
    };
    if op == Operation::Invert {
        return DecValue::finite(false, x.iter().map(|d| 1 - d).collect(), 0);
    }
    let Some(y) = logical_digits(&v[1], width) else {
        return invalid(ctx);
    };
    let combined = x
        .iter()
        .zip(&y)
        .map(|(&p, &q)| match op {
            Operation::And => p & q,
            Operation::Or => p | q,
            _ => p ^ q,
        })
        .collect();
    DecValue::finite(false, combined, 0)
}

fn same_quantum(a: &DecValue, b: &DecValue) -> DecValue {
    let same = match (a.kind, b.kind) {
        (Kind::Finite, Kind::Finite) => a.exponent == b.exponent,
        (Kind::Infinite, Kind::Infinite) => true,
        (Kind::Quiet | Kind::Signaling, Kind::Quiet | Kind::Signaling) => true,
        _ => false,
    };
    DecValue::from_int(same as i64)
}

/// Exact small-integer value of an operand, if it has one.
fn value_to_i64(v: &DecValue) -> Option<i64> {
    if !v.is_finite() {
        return None;
    }
    if v.digits.len() > 38 {
        return None;
    }
    let mut n: i128 = 0;
    for &d in &v.digits {
        n = n.checked_mul(10)?.checked_add(i128::from(d))?;
    }
    let mut exp = v.exponent;
    while exp > 0 {
        n = n.checked_mul(10)?;
        if n > i64::MAX as i128 {
            return None;
        }
        exp -= 1;
    }
    while exp < 0 {
        if n % 10 != 0 {
            return None;
        }
        n /= 10;
        exp += 1;
    }
    if v.sign {
        n = -n;
    }
    i64::try_from(n).ok()
}

fn class_of(v: &DecValue, ctx: &Context) -> &'static str {
    match v.kind {
        Kind::Signaling => "sNaN",
        Kind::Quiet => "NaN",
        Kind::Infinite => {
            if v.sign {
                "-Infinity"
            } else {
                "+Infinity"
            }
        }
        Kind::Finite => {
            if v.is_zero() {
                if v.sign {
                    "-Zero"
                } else {
                    "+Zero"
                }
            } else if v.adjusted_exponent() < ctx.emin as i64 {
                if v.sign {
                    "-Subnormal"
                } else {
                    "+Subnormal"
                }
            } else if v.sign {
                "-Normal"
            } else {
                "+Normal"
            }
        }
    }
}

fn encode_value(fmt: Format, value: &DecValue, ctx: &mut Context) -> Vec<u8> {
    match value.kind {
        Kind::Infinite => dpd::encode_raw(fmt, value),
        Kind::Quiet | Kind::Signaling => {
            let mut v = value.clone();
            let cap = fmt.declets() * 3;
            if v.digits.len() > cap {
                v.digits = v.digits[v.digits.len() - cap..].to_vec();
            }
            dpd::encode_raw(fmt, &v)
        }
        Kind::Finite => {
            // round and clamp under the format's own limits, folding the
            // flags into the caller's context
            let mut fctx = Context {
                precision: fmt.digits(),
                rounding: ctx.rounding,
                emax: fmt.emax(),
                emin: fmt.emin(),
                clamp: true,
                extended: false,
                traps: Status::empty(),
                status: Status::empty(),
            };
            let r = round_finite(value.sign, coeff_of(value), value.exponent as i64, &mut fctx);
            ctx.raise(fctx.status);
            dpd::encode_raw(fmt, &r)
        }
    }
}
