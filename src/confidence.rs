//! Confidence scoring and level bucketing
//!
//! Two scoring paths feed the same four-bucket level mapping: static
//! scoring of a classified [`ReturnPattern`], and scoring of a resolved
//! return evaluation for one concrete test case.

use crate::returns::{ReturnKind, ReturnPattern, ReturnStatement};
use crate::value::Value;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Four-bucket classification of a confidence score
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum ConfidenceLevel {
    /// >= 0.90: safe to assert directly
    High,
    /// >= 0.60: assert with a verification note
    Medium,
    /// >= 0.30: assert behind a manual-check marker
    Low,
    /// < 0.30: ask a human instead
    Uncertain,
}

impl ConfidenceLevel {
    /// Map a score in [0,1] to its bucket
    pub fn from_score(score: f32) -> Self {
        if score >= 0.90 {
            ConfidenceLevel::High
        } else if score >= 0.60 {
            ConfidenceLevel::Medium
        } else if score >= 0.30 {
            ConfidenceLevel::Low
        } else {
            ConfidenceLevel::Uncertain
        }
    }
}

impl std::fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfidenceLevel::High => write!(f, "HIGH"),
            ConfidenceLevel::Medium => write!(f, "MEDIUM"),
            ConfidenceLevel::Low => write!(f, "LOW"),
            ConfidenceLevel::Uncertain => write!(f, "UNCERTAIN"),
        }
    }
}

/// Static confidence for a classified return pattern
pub fn score_pattern(pattern: &ReturnPattern) -> f32 {
    if pattern.kind == ReturnKind::Constant {
        return 0.95;
    }
    if pattern.kind == ReturnKind::Variable && pattern.variables.len() == 1 {
        return 0.75;
    }
    if pattern.kind == ReturnKind::Expression && pattern.complexity < 5 {
        return 0.65;
    }
    if pattern.kind == ReturnKind::StructMember {
        return 0.60;
    }
    if pattern.kind == ReturnKind::ArrayElement {
        return 0.55;
    }
    if pattern.kind == ReturnKind::Conditional {
        return 0.40;
    }
    if pattern.kind == ReturnKind::FunctionCall {
        return 0.30;
    }
    if pattern.complexity > 10 {
        return 0.20;
    }
    0.25
}

/// Confidence for a resolved return-expression evaluation.
///
/// Distinct from [`score_pattern`]: this judges how much to trust the
/// concrete value produced for one executed return, given the shape of
/// the expression it came from.
pub fn score_resolved(statement: &ReturnStatement, resolved: &Value) -> f32 {
    const ARITHMETIC: &[char] = &['+', '-', '*', '/', '%'];
    const BITWISE_STR: &[&str] = &["&", "|", "^", "<<", ">>"];

    if statement.is_constant {
        return 0.95;
    }
    if resolved.is_numeric() {
        return 0.85;
    }

    let expr = statement.expression.trim();
    if expr.chars().all(|c| c.is_alphanumeric() || c == '_') {
        // Bare variable reference
        return 0.70;
    }
    if expr.contains(ARITHMETIC) {
        return 0.60;
    }
    if BITWISE_STR.iter().any(|op| expr.contains(op)) {
        return 0.50;
    }
    if expr.contains('(') {
        // Unresolved call
        return 0.30;
    }
    0.20
}
