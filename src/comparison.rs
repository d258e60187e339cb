//! Threshold expression parsing: `<op> <number>[%][ annotation]`.
//!
//! The grammar is a public mini-format shared with stored configuration, so
//! the accepted language must stay stable. Named groups beyond the core
//! operator/value/percent trio ride along in [`ValueComparison::groups`] for
//! forward extensibility.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::ParseError;

/// Grammar: `^\s*(>|>=|<|<=)\s*(-?\d+(?:[.,]\d+)*)(%)?(\s+.*)?$`
pub static GENERIC_VALUE_COMPARISON: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?P<opStr>>|>=|<|<=)\s*(?P<value>-?\d+(?:[.,]\d+)*)(?P<percent>%)?(?P<extra>\s+.*)?$")
        .expect("comparison grammar regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComparisonOperator {
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
}

impl ComparisonOperator {
    /// Apply the operator to two numbers.
    pub fn test(self, lhs: f64, rhs: f64) -> bool {
        match self {
            ComparisonOperator::GreaterThan => lhs > rhs,
            ComparisonOperator::GreaterThanOrEqual => lhs >= rhs,
            ComparisonOperator::LessThan => lhs < rhs,
            ComparisonOperator::LessThanOrEqual => lhs <= rhs,
        }
    }

    /// `>` and `>=`. The trigger policy treats these differently from the
    /// "lesser" family (see `evaluate`).
    pub fn is_greater_family(self) -> bool {
        matches!(
            self,
            ComparisonOperator::GreaterThan | ComparisonOperator::GreaterThanOrEqual
        )
    }
}

impl FromStr for ComparisonOperator {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            ">" => Ok(ComparisonOperator::GreaterThan),
            ">=" => Ok(ComparisonOperator::GreaterThanOrEqual),
            "<" => Ok(ComparisonOperator::LessThan),
            "<=" => Ok(ComparisonOperator::LessThanOrEqual),
            other => Err(ParseError::UnknownOperator(other.to_string())),
        }
    }
}

impl fmt::Display for ComparisonOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ComparisonOperator::GreaterThan => ">",
            ComparisonOperator::GreaterThanOrEqual => ">=",
            ComparisonOperator::LessThan => "<",
            ComparisonOperator::LessThanOrEqual => "<=",
        };
        f.write_str(s)
    }
}

/// A parsed threshold expression.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueComparison {
    pub operator: ComparisonOperator,
    pub value: f64,
    pub is_percent: bool,
    /// Trailing free-text annotation, trimmed. `None` when absent or blank.
    pub extra: Option<String>,
    /// All named capture groups, untrimmed, keyed by group name.
    pub groups: BTreeMap<String, String>,
}

/// Parse a threshold expression such as `>= 3`, `< 2`, or `> 50% of window`.
pub fn parse_generic_value_comparison(input: &str) -> Result<ValueComparison, ParseError> {
    let caps = GENERIC_VALUE_COMPARISON
        .captures(input)
        .ok_or_else(|| ParseError::InvalidComparison(input.to_string()))?;

    let op_str = caps
        .name("opStr")
        .ok_or_else(|| ParseError::InvalidComparison(input.to_string()))?
        .as_str();
    let operator = op_str.parse::<ComparisonOperator>()?;

    let raw_value = caps
        .name("value")
        .ok_or_else(|| ParseError::InvalidComparison(input.to_string()))?
        .as_str();
    // decimal commas are accepted by the grammar; normalize before parsing
    let value = raw_value
        .replace(',', ".")
        .parse::<f64>()
        .map_err(|_| ParseError::InvalidComparison(input.to_string()))?;

    let is_percent = caps.name("percent").is_some();
    let extra = caps.name("extra").and_then(|m| {
        let trimmed = m.as_str().trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    });

    let mut groups = BTreeMap::new();
    for name in GENERIC_VALUE_COMPARISON.capture_names().flatten() {
        if let Some(m) = caps.name(name) {
            groups.insert(name.to_string(), m.as_str().to_string());
        }
    }

    Ok(ValueComparison {
        operator,
        value,
        is_percent,
        extra,
        groups,
    })
}

/// String-operator form of [`ComparisonOperator::test`]; unknown operator
/// strings fail with [`ParseError::UnknownOperator`].
pub fn comparison_text_op(lhs: f64, op: &str, rhs: f64) -> Result<bool, ParseError> {
    Ok(op.parse::<ComparisonOperator>()?.test(lhs, rhs))
}
