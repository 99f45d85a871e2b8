//! Condition pattern matching
//!
//! Maps an MC/DC condition string plus its assigned truth value to
//! candidate variable expectations. The rule set is an explicit ordered
//! table; rules are non-exclusive, so several rules may contribute
//! expectations for the same condition.

use crate::confidence::ConfidenceLevel;
use crate::returns::strip_parens;
use crate::value::{self, Value};
use once_cell::sync::Lazy;
use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Pseudo-target naming the function's return value
pub const RETURN_TARGET: &str = "_return_value";

/// Assertion form an expectation calls for
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum AssertionKind {
    Equal,
    NotEqual,
    Null,
    NotNull,
    True,
    False,
}

/// One inferred expectation about a variable (or the return value)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct InferredExpectation {
    /// Target variable, or [`RETURN_TARGET`]
    pub variable: String,
    /// Expected value; `None` for null/truth assertions
    pub value: Option<Value>,
    /// Assertion form
    pub assertion: AssertionKind,
    /// Confidence score in [0,1]
    pub confidence: f32,
    /// Bucketed confidence level
    pub level: ConfidenceLevel,
    /// Human-readable justification
    pub reason: String,
}

impl InferredExpectation {
    /// Build an expectation, deriving the level from the score
    pub fn new(
        variable: impl Into<String>,
        value: Option<Value>,
        assertion: AssertionKind,
        confidence: f32,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            variable: variable.into(),
            value,
            assertion,
            confidence,
            level: ConfidenceLevel::from_score(confidence),
            reason: reason.into(),
        }
    }
}

/// One entry of the ordered rule table
pub struct ConditionRule {
    /// Rule name, for diagnostics and tests
    pub name: &'static str,
    apply: fn(&str, bool) -> Vec<InferredExpectation>,
}

/// The ordered, non-exclusive condition rule table
pub static CONDITION_RULES: &[ConditionRule] = &[
    ConditionRule {
        name: "equality",
        apply: rule_equality,
    },
    ConditionRule {
        name: "inequality",
        apply: rule_inequality,
    },
    ConditionRule {
        name: "relational",
        apply: rule_relational,
    },
    ConditionRule {
        name: "null-check",
        apply: rule_null_check,
    },
    ConditionRule {
        name: "bitmask",
        apply: rule_bitmask,
    },
];

static RE_EQ: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\w+)\s*==\s*(.+)$").unwrap());
static RE_NEQ: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\w+)\s*!=\s*(.+)$").unwrap());
static RE_REL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\w+)\s*(>=|<=|>|<)\s*(.+)$").unwrap());
static RE_EQ_NULL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\w+)\s*==\s*NULL$").unwrap());
static RE_NEQ_NULL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\w+)\s*!=\s*NULL$").unwrap());
static RE_NEGATED: Lazy<Regex> = Lazy::new(|| Regex::new(r"^!\s*(\w+)$").unwrap());
static RE_BARE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\w+)$").unwrap());
static RE_BITMASK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\((\w+)\s*&\s*([^)]+)\)\s*!=\s*0$").unwrap());

/// Condition pattern matcher
///
/// Stateless; all state lives in the inputs and the returned records.
#[derive(Debug, Default)]
pub struct ConditionMatcher;

impl ConditionMatcher {
    pub fn new() -> Self {
        Self
    }

    /// Apply the rule table to a single condition with one truth value
    pub fn infer_from_condition(&self, condition: &str, truth: bool) -> Vec<InferredExpectation> {
        let normalized = strip_parens(condition.trim());
        CONDITION_RULES
            .iter()
            .flat_map(|rule| (rule.apply)(normalized, truth))
            .collect()
    }

    /// Infer from a possibly compound condition.
    ///
    /// Compound conditions split on `||` (or, failing that, `&&`); each
    /// sub-condition consumes one truth value, left to right, and all
    /// contributions are concatenated. A simple condition consumes the
    /// whole sequence as "any true".
    pub fn infer_compound(&self, condition: &str, truths: &[bool]) -> Vec<InferredExpectation> {
        let condition = condition.trim();

        let sub_conditions: Vec<&str> = if condition.contains("||") {
            condition.split("||").collect()
        } else if condition.contains("&&") {
            condition.split("&&").collect()
        } else {
            return self.infer_from_condition(condition, truths.iter().any(|t| *t));
        };

        sub_conditions
            .iter()
            .zip(truths.iter())
            .flat_map(|(sub, truth)| self.infer_from_condition(sub, *truth))
            .collect()
    }

    /// Expectation for the controlling variable of a switch case.
    ///
    /// `case` is `None` for the default label; the inferred value is then
    /// guaranteed distinct from every enumerated case value.
    pub fn infer_from_switch(
        &self,
        variable: &str,
        case: Option<&Value>,
        all_cases: &[Value],
    ) -> Vec<InferredExpectation> {
        match case {
            Some(value) => vec![InferredExpectation::new(
                variable,
                Some(value.clone()),
                AssertionKind::Equal,
                0.95,
                format!("switch case {}", value),
            )],
            None => {
                let unused = unused_case_value(all_cases);
                vec![InferredExpectation::new(
                    variable,
                    Some(unused),
                    AssertionKind::Equal,
                    0.70,
                    "switch default (outside enumerated cases)",
                )]
            }
        }
    }
}

/// A value distinct from every enumerated case value
fn unused_case_value(used: &[Value]) -> Value {
    let ints: Vec<i64> = used.iter().filter_map(|v| v.as_int()).collect();
    if ints.len() == used.len() {
        Value::Int(ints.iter().copied().max().unwrap_or(0) + 999)
    } else {
        Value::Int(999)
    }
}

fn rule_equality(condition: &str, truth: bool) -> Vec<InferredExpectation> {
    let Some(caps) = RE_EQ.captures(condition) else {
        return vec![];
    };
    let variable = &caps[1];
    let value = value::parse_text(&caps[2]);
    if truth {
        vec![InferredExpectation::new(
            variable,
            Some(value),
            AssertionKind::Equal,
            0.90,
            format!("condition '{}' is true", condition),
        )]
    } else {
        vec![InferredExpectation::new(
            variable,
            Some(value),
            AssertionKind::NotEqual,
            0.80,
            format!("condition '{}' is false", condition),
        )]
    }
}

fn rule_inequality(condition: &str, truth: bool) -> Vec<InferredExpectation> {
    let Some(caps) = RE_NEQ.captures(condition) else {
        return vec![];
    };
    let variable = &caps[1];
    let value = value::parse_text(&caps[2]);
    if truth {
        vec![InferredExpectation::new(
            variable,
            Some(value),
            AssertionKind::NotEqual,
            0.90,
            format!("condition '{}' is true", condition),
        )]
    } else {
        vec![InferredExpectation::new(
            variable,
            Some(value),
            AssertionKind::Equal,
            0.80,
            format!("condition '{}' is false", condition),
        )]
    }
}

fn rule_relational(condition: &str, truth: bool) -> Vec<InferredExpectation> {
    // Boundary inference only makes sense when the relation holds
    if !truth {
        return vec![];
    }
    let Some(caps) = RE_REL.captures(condition) else {
        return vec![];
    };
    let variable = &caps[1];
    // Non-numeric right-hand sides are skipped, not errors
    let Some(Value::Int(rhs)) = value::parse_literal(&caps[3]) else {
        return vec![];
    };
    let boundary = match &caps[2] {
        ">" => rhs + 1,
        ">=" => rhs,
        "<" => rhs - 1,
        "<=" => rhs,
        _ => return vec![],
    };
    vec![InferredExpectation::new(
        variable,
        Some(Value::Int(boundary)),
        AssertionKind::Equal,
        0.70,
        format!("boundary value satisfying '{}'", condition),
    )]
}

fn rule_null_check(condition: &str, truth: bool) -> Vec<InferredExpectation> {
    // All null-check shapes assert only on the true branch
    if !truth {
        return vec![];
    }

    let shapes: &[(&Lazy<Regex>, AssertionKind)] = &[
        (&RE_EQ_NULL, AssertionKind::Null),
        (&RE_NEQ_NULL, AssertionKind::NotNull),
        (&RE_NEGATED, AssertionKind::Null),
        (&RE_BARE, AssertionKind::NotNull),
    ];

    let mut expectations = Vec::new();
    for (pattern, assertion) in shapes {
        if let Some(caps) = pattern.captures(condition) {
            let variable = &caps[1];
            if is_likely_pointer(variable) {
                expectations.push(InferredExpectation::new(
                    variable,
                    None,
                    *assertion,
                    0.80,
                    format!("pointer check '{}'", condition),
                ));
            }
        }
    }
    expectations
}

fn rule_bitmask(condition: &str, truth: bool) -> Vec<InferredExpectation> {
    if !truth {
        return vec![];
    }
    let Some(caps) = RE_BITMASK.captures(condition) else {
        return vec![];
    };
    // Assert on the masked expression itself, not the variable alone
    let masked = format!("({} & {})", &caps[1], caps[2].trim());
    vec![InferredExpectation::new(
        masked,
        None,
        AssertionKind::True,
        0.70,
        format!("bitmask check '{}' is true", condition),
    )]
}

/// Heuristic: does the name look like a pointer?
pub fn is_likely_pointer(name: &str) -> bool {
    const HINTS: &[&str] = &["ptr", "p_", "lp", "h_", "handle", "buf", "buffer"];
    let lower = name.to_lowercase();
    HINTS.iter().any(|hint| lower.contains(hint))
}
