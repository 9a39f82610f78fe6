//! Arithmetic context: precision, rounding, exponent bounds, clamp, and the
//! accumulated status-flag set. One `Context` is owned per open script file
//! and mutated in place by directives and per-literal decodes.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use itertools::Itertools;

/// Rounding modes, in the script directive's fixed name table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rounding {
    Ceiling,
    Up,
    HalfUp,
    HalfEven,
    HalfDown,
    Down,
    Floor,
    ZeroFiveUp,
    /// Placeholder used by some scripts; an engine asked to actually round
    /// under it reports `Invalid_context`.
    Max,
}

const ROUNDING_NAMES: &[(&str, Rounding)] = &[
    ("ceiling", Rounding::Ceiling),
    ("up", Rounding::Up),
    ("half_up", Rounding::HalfUp),
    ("half_even", Rounding::HalfEven),
    ("half_down", Rounding::HalfDown),
    ("down", Rounding::Down),
    ("floor", Rounding::Floor),
    ("05up", Rounding::ZeroFiveUp),
    ("max", Rounding::Max),
];

impl Rounding {
    pub fn from_name(name: &str) -> Option<Rounding> {
        ROUNDING_NAMES
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|&(_, r)| r)
    }

    pub fn name(self) -> &'static str {
        ROUNDING_NAMES
            .iter()
            .find(|&&(_, r)| r == self)
            .map(|&(n, _)| n)
            .unwrap_or("?")
    }
}

/// A set of condition flags, accumulated with bitwise OR and only cleared by
/// an explicit reset before each test case.
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub struct Status(u32);

impl Status {
    pub const CONVERSION_SYNTAX: Status = Status(1 << 0);
    pub const DIVISION_BY_ZERO: Status = Status(1 << 1);
    pub const DIVISION_IMPOSSIBLE: Status = Status(1 << 2);
    pub const DIVISION_UNDEFINED: Status = Status(1 << 3);
    pub const INSUFFICIENT_STORAGE: Status = Status(1 << 4);
    pub const INEXACT: Status = Status(1 << 5);
    pub const INVALID_CONTEXT: Status = Status(1 << 6);
    pub const INVALID_OPERATION: Status = Status(1 << 7);
    /// Legacy subset mode only.
    pub const LOST_DIGITS: Status = Status(1 << 8);
    pub const OVERFLOW: Status = Status(1 << 9);
    pub const CLAMPED: Status = Status(1 << 10);
    pub const ROUNDED: Status = Status(1 << 11);
    pub const SUBNORMAL: Status = Status(1 << 12);
    pub const UNDERFLOW: Status = Status(1 << 13);

    pub const fn empty() -> Status {
        Status(0)
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn contains(self, other: Status) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: Status) {
        self.0 |= other.0;
    }

    pub fn clear(&mut self) {
        self.0 = 0;
    }

    /// Case-insensitive lookup in the fixed flag-name table.
    pub fn from_name(name: &str) -> Option<Status> {
        STATUS_NAMES
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|&(_, s)| s)
    }

    /// Names of the flags present, in table order.
    pub fn names(self) -> impl Iterator<Item = &'static str> {
        STATUS_NAMES
            .iter()
            .filter(move |&&(_, s)| self.contains(s))
            .map(|&(n, _)| n)
    }
}

const STATUS_NAMES: &[(&str, Status)] = &[
    ("Conversion_syntax", Status::CONVERSION_SYNTAX),
    ("Division_by_zero", Status::DIVISION_BY_ZERO),
    ("Division_impossible", Status::DIVISION_IMPOSSIBLE),
    ("Division_undefined", Status::DIVISION_UNDEFINED),
    ("Insufficient_storage", Status::INSUFFICIENT_STORAGE),
    ("Inexact", Status::INEXACT),
    ("Invalid_context", Status::INVALID_CONTEXT),
    ("Invalid_operation", Status::INVALID_OPERATION),
    ("Lost_digits", Status::LOST_DIGITS),
    ("Overflow", Status::OVERFLOW),
    ("Clamped", Status::CLAMPED),
    ("Rounded", Status::ROUNDED),
    ("Subnormal", Status::SUBNORMAL),
    ("Underflow", Status::UNDERFLOW),
];

impl BitOr for Status {
    type Output = Status;
    fn bitor(self, rhs: Status) -> Status {
        Status(self.0 | rhs.0)
    }
}

impl BitOrAssign for Status {
    fn bitor_assign(&mut self, rhs: Status) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.names().join(" "))
    }
}

impl fmt::Debug for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Status[{self}]")
    }
}

/// The mutable arithmetic context threaded through a script run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Context {
    pub precision: i32,
    pub rounding: Rounding,
    pub emax: i32,
    pub emin: i32,
    pub clamp: bool,
    /// When set for a file, every test case in it is skipped (legacy
    /// subset-compatibility gate).
    pub extended: bool,
    pub traps: Status,
    pub status: Status,
}

impl Default for Context {
    /// The engine's base defaults with traps cleared, as each script file
    /// starts from.
    fn default() -> Context {
        Context {
            precision: 9,
            rounding: Rounding::HalfUp,
            emax: 999_999_999,
            emin: -999_999_999,
            clamp: false,
            extended: false,
            traps: Status::empty(),
            status: Status::empty(),
        }
    }
}

impl Context {
    pub fn raise(&mut self, flags: Status) {
        self.status |= flags;
    }

    /// The derived context used to decode one literal of `digits`
    /// coefficient digits: same rounding, exponent bounds widened to
    /// effectively unbounded, clamp off.
    pub fn literal_context(&self, digits: i32) -> Context {
        Context {
            precision: digits,
            emax: i32::MAX - digits,
            emin: i32::MIN + digits,
            clamp: false,
            status: Status::empty(),
            ..self.clone()
        }
    }

    /// Smallest exponent a subnormal coefficient may take.
    pub fn etiny(&self) -> i32 {
        self.emin.saturating_sub(self.precision.saturating_sub(1))
    }
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "context prec={} round={} emax={} emin={} status=[{}] traps=[{}] clamp={}",
            self.precision,
            self.rounding.name(),
            self.emax,
            self.emin,
            self.status,
            self.traps,
            self.clamp as u8,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn rounding_names_round_trip() {
        for &(name, mode) in ROUNDING_NAMES {
            assert_eq!(Rounding::from_name(name), Some(mode));
            assert_eq!(mode.name(), name);
        }
        assert_eq!(Rounding::from_name("HALF_EVEN"), Some(Rounding::HalfEven));
        assert_eq!(Rounding::from_name("nearest"), None);
    }

    #[test]
    fn status_accumulates_and_formats() {
        let mut s = Status::empty();
        s.insert(Status::ROUNDED);
        s |= Status::INEXACT;
        assert!(s.contains(Status::INEXACT));
        assert!(!s.contains(Status::OVERFLOW));
        // table order, space separated
        assert_eq!(s.to_string(), "Inexact Rounded");
    }

    #[test]
    fn status_names_parse_case_insensitively() {
        assert_eq!(Status::from_name("inexact"), Some(Status::INEXACT));
        assert_eq!(
            Status::from_name("Division_by_zero"),
            Some(Status::DIVISION_BY_ZERO)
        );
        assert_eq!(Status::from_name("Sticky"), None);
    }

    #[test]
    fn directive_idempotence() {
        let mut ctx = Context::default();
        ctx.precision = 42;
        ctx.precision = 9;
        assert_eq!(ctx.precision, 9);
    }

    #[test]
    fn literal_context_widens_bounds() {
        let ctx = Context::default();
        let lit = ctx.literal_context(3);
        assert_eq!(lit.precision, 3);
        assert_eq!(lit.emax, i32::MAX - 3);
        assert_eq!(lit.emin, i32::MIN + 3);
        assert!(!lit.clamp);
        assert_eq!(lit.rounding, ctx.rounding);
    }
}
