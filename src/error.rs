//! Error taxonomy. Threshold parsing is the only fallible operation in the
//! core; everything else degrades to low scores instead of erroring.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The threshold expression does not match the comparison grammar.
    /// Fatal to the current evaluation; there is no fallback threshold.
    #[error("Could not parse `{0}` as comparison")]
    InvalidComparison(String),

    /// An operator string outside `>`, `>=`, `<`, `<=`.
    #[error("Unknown comparison operator `{0}`")]
    UnknownOperator(String),
}
