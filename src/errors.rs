use std::path::PathBuf;

use thiserror::Error;

use crate::engine::EngineError;

/// Hard errors: script-authoring or environment problems that abort the
/// current file. A test case whose value or status merely differs from the
/// expectation is *not* an error; it is counted as a failure and the run
/// continues.
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("cannot open script {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("error reading {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("error writing output: {0}")]
    Output(#[from] std::io::Error),

    #[error("unsupported line: {0:?}")]
    UnsupportedLine(String),

    #[error("unknown directive: {0:?}")]
    UnknownDirective(String),

    #[error("bad value {value:?} for directive {directive:?}")]
    BadDirectiveValue { directive: String, value: String },

    #[error("unknown rounding mode: {0:?}")]
    UnknownRounding(String),

    #[error("unknown status flag: {0:?}")]
    UnknownStatus(String),

    #[error("unknown operator: {0:?}")]
    UnknownOperator(String),

    #[error("operator {operator} takes {expected} operand(s), got {got}")]
    OperandCount {
        operator: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("test line has no expected result after '->'")]
    MissingExpected,

    #[error("invalid hex notation: {0:?}")]
    BadHexLiteral(String),

    #[error("invalid format-dependent notation: {0:?}")]
    BadFormatLiteral(String),

    #[error("inclusion cycle: {path} is already being processed")]
    IncludeCycle { path: PathBuf },

    #[error(transparent)]
    Engine(#[from] EngineError),
}

pub type Result<T> = std::result::Result<T, RunnerError>;
