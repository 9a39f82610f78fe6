//! The operator table: every operator a test case may name, with its arity,
//! result kind, and whether its operands decode under the directive
//! precision rather than a derived per-literal one.

use crate::errors::{Result, RunnerError};

/// How a result is checked against the expectation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResultKind {
    /// Decoded and compared with the total ordering.
    Numeric,
    /// Compared as an exact string (`class`, `tosci`, `toeng`).
    Text,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    Abs,
    Add,
    And,
    Apply,
    Canonical,
    Class,
    Compare,
    CompareSig,
    CompareTotal,
    CompareTotMag,
    Copy,
    CopyAbs,
    CopyNegate,
    CopySign,
    Divide,
    DivideInt,
    Exp,
    Fma,
    Invert,
    Ln,
    Log10,
    LogB,
    Max,
    MaxMag,
    Min,
    MinMag,
    Minus,
    Multiply,
    NextMinus,
    NextPlus,
    NextToward,
    Or,
    Plus,
    Power,
    Quantize,
    Reduce,
    Remainder,
    RemainderNear,
    Rescale,
    Rotate,
    SameQuantum,
    ScaleB,
    Shift,
    SquareRoot,
    Subtract,
    ToEng,
    ToIntegral,
    ToIntegralX,
    ToSci,
    Trim,
    Xor,
}

const OPERATOR_NAMES: &[(&str, Operation)] = &[
    ("abs", Operation::Abs),
    ("add", Operation::Add),
    ("and", Operation::And),
    ("apply", Operation::Apply),
    ("canonical", Operation::Canonical),
    ("class", Operation::Class),
    ("compare", Operation::Compare),
    ("comparesig", Operation::CompareSig),
    ("comparetotal", Operation::CompareTotal),
    ("comparetotmag", Operation::CompareTotMag),
    ("copy", Operation::Copy),
    ("copyabs", Operation::CopyAbs),
    ("copynegate", Operation::CopyNegate),
    ("copysign", Operation::CopySign),
    ("divide", Operation::Divide),
    ("divideint", Operation::DivideInt),
    ("exp", Operation::Exp),
    ("fma", Operation::Fma),
    ("invert", Operation::Invert),
    ("ln", Operation::Ln),
    ("log10", Operation::Log10),
    ("logb", Operation::LogB),
    ("max", Operation::Max),
    ("maxmag", Operation::MaxMag),
    ("min", Operation::Min),
    ("minmag", Operation::MinMag),
    ("minus", Operation::Minus),
    ("multiply", Operation::Multiply),
    ("nextminus", Operation::NextMinus),
    ("nextplus", Operation::NextPlus),
    ("nexttoward", Operation::NextToward),
    ("or", Operation::Or),
    ("plus", Operation::Plus),
    ("power", Operation::Power),
    ("quantize", Operation::Quantize),
    ("reduce", Operation::Reduce),
    ("remainder", Operation::Remainder),
    ("remaindernear", Operation::RemainderNear),
    ("rescale", Operation::Rescale),
    ("rotate", Operation::Rotate),
    ("samequantum", Operation::SameQuantum),
    ("scaleb", Operation::ScaleB),
    ("shift", Operation::Shift),
    ("squareroot", Operation::SquareRoot),
    ("subtract", Operation::Subtract),
    ("toeng", Operation::ToEng),
    ("tointegral", Operation::ToIntegral),
    ("tointegralx", Operation::ToIntegralX),
    ("tosci", Operation::ToSci),
    ("trim", Operation::Trim),
    ("xor", Operation::Xor),
];

impl Operation {
    /// Case-insensitive operator lookup.
    pub fn lookup(name: &str) -> Result<Operation> {
        OPERATOR_NAMES
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|&(_, op)| op)
            .ok_or_else(|| RunnerError::UnknownOperator(name.to_string()))
    }

    pub fn name(self) -> &'static str {
        OPERATOR_NAMES
            .iter()
            .find(|&&(_, op)| op == self)
            .map(|&(n, _)| n)
            .unwrap_or("?")
    }

    pub fn arity(self) -> usize {
        use Operation::*;
        match self {
            Fma => 3,
            Add | And | Compare | CompareSig | CompareTotal | CompareTotMag | CopySign
            | Divide | DivideInt | Max | MaxMag | Min | MinMag | Multiply | NextToward | Or
            | Power | Quantize | Remainder | RemainderNear | Rescale | Rotate | SameQuantum
            | ScaleB | Shift | Subtract | Xor => 2,
            _ => 1,
        }
    }

    pub fn result_kind(self) -> ResultKind {
        match self {
            Operation::Class | Operation::ToSci | Operation::ToEng => ResultKind::Text,
            _ => ResultKind::Numeric,
        }
    }

    /// `apply`, `tosci` and `toeng` exercise conversion itself, so their
    /// operands decode under the directive precision instead of a derived
    /// per-literal context.
    pub fn uses_directive_precision(self) -> bool {
        matches!(self, Operation::Apply | Operation::ToSci | Operation::ToEng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn lookup_is_case_insensitive() {
        assert_eq!(Operation::lookup("add").unwrap(), Operation::Add);
        assert_eq!(Operation::lookup("CompareTotal").unwrap(), Operation::CompareTotal);
        assert_eq!(Operation::lookup("TOSCI").unwrap(), Operation::ToSci);
        assert!(matches!(
            Operation::lookup("frobnicate"),
            Err(RunnerError::UnknownOperator(_))
        ));
    }

    #[test]
    fn names_round_trip() {
        for &(name, op) in OPERATOR_NAMES {
            assert_eq!(Operation::lookup(name).unwrap(), op);
            assert_eq!(op.name(), name);
        }
    }

    #[test]
    fn arities() {
        assert_eq!(Operation::Abs.arity(), 1);
        assert_eq!(Operation::Add.arity(), 2);
        assert_eq!(Operation::Fma.arity(), 3);
        assert_eq!(Operation::NextToward.arity(), 2);
        assert_eq!(Operation::Canonical.arity(), 1);
    }

    #[test]
    fn result_kinds_and_precision_sources() {
        assert_eq!(Operation::Class.result_kind(), ResultKind::Text);
        assert_eq!(Operation::Add.result_kind(), ResultKind::Numeric);
        assert!(Operation::Apply.uses_directive_precision());
        assert!(Operation::ToEng.uses_directive_precision());
        assert!(!Operation::Canonical.uses_directive_precision());
    }
}
