//! The arithmetic engine boundary. The runner only ever talks to an
//! implementation of [`Engine`]; the in-tree [`SimpleEngine`] covers the
//! non-transcendental operator set and the interchange encodings.

use std::cmp::Ordering;

use thiserror::Error;

use crate::context::Context;
use crate::ops::Operation;

pub mod dpd;
pub mod simple;
pub mod value;

pub use dpd::Format;
pub use simple::SimpleEngine;
pub use value::{DecValue, Kind};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("operation {0:?} is not supported by this engine")]
    Unsupported(&'static str),
}

/// The decimal arithmetic an engine must supply.
///
/// Condition flags raised by a conversion or an operation accumulate in the
/// `Context` passed to it; the engine never clears them.
pub trait Engine {
    /// Convert a literal to a value, rounding to the context precision. A
    /// malformed literal yields a quiet NaN with `Conversion_syntax` raised.
    fn from_string(&self, text: &str, ctx: &mut Context) -> DecValue;

    fn to_sci_string(&self, value: &DecValue) -> String;

    fn to_eng_string(&self, value: &DecValue) -> String;

    /// Decode an interchange encoding; never fails (non-canonical bit
    /// patterns decode to their aliased value).
    fn decode(&self, format: Format, bytes: &[u8]) -> DecValue;

    /// Encode into an interchange format, rounding/clamping to the format's
    /// own limits and reporting flags through `ctx`.
    fn encode(&self, format: Format, value: &DecValue, ctx: &mut Context) -> Vec<u8>;

    /// Rewrite an encoding into its canonical bit pattern.
    fn canonical(&self, format: Format, bytes: &[u8]) -> Vec<u8>;

    /// The `class` operation's name for a value under the given context.
    fn class_name(&self, value: &DecValue, ctx: &Context) -> &'static str;

    /// Total ordering over all values, specials included.
    fn compare_total(&self, a: &DecValue, b: &DecValue) -> Ordering;

    /// Run one numeric operation. `operands.len()` matches the operation's
    /// arity.
    fn evaluate(
        &self,
        op: Operation,
        operands: &[DecValue],
        ctx: &mut Context,
    ) -> Result<DecValue, EngineError>;
}
