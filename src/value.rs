//! Value descriptors and best-effort expression evaluation
//!
//! A [`Value`] is what the analyses can say about a C expression without
//! executing it: a literal, a symbol, or a composite textual descriptor.
//! Extraction never fails; expressions with no usable descriptor yield
//! `None` and callers degrade gracefully.

use crate::ast::{Expr, UnaryOp};
use once_cell::sync::Lazy;
use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Best-effort value descriptor for a C expression
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub enum Value {
    /// Integer literal (decimal, hex, or decoded char)
    Int(i64),
    /// Floating literal
    Float(f64),
    /// String literal (without surrounding quotes)
    Str(String),
    /// Identifier: a variable, macro, or enum constant
    Symbol(String),
    /// Composite descriptor such as `a + b` or `helper()`
    Composite(String),
    /// Null pointer sentinel
    Null,
}

impl Value {
    /// True for `Int` and `Float`
    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Int(_) | Value::Float(_))
    }

    /// Integer payload if this is an `Int`
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Value::Int(_) => 0,
            Value::Float(_) => 1,
            Value::Str(_) => 2,
            Value::Symbol(_) => 3,
            Value::Composite(_) => 4,
            Value::Null => 5,
        }
    }
}

impl fmt::Display for Value {
    /// Renders the value the way it would appear in C source
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => {
                let s = x.to_string();
                if s.contains('.') || s.contains('e') {
                    write!(f, "{}", s)
                } else {
                    write!(f, "{}.0", s)
                }
            }
            Value::Str(s) => write!(f, "\"{}\"", s),
            Value::Symbol(s) | Value::Composite(s) => write!(f, "{}", s),
            Value::Null => write!(f, "NULL"),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Symbol(a), Value::Symbol(b)) => a == b,
            (Value::Composite(a), Value::Composite(b)) => a == b,
            (Value::Null, Value::Null) => true,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    /// Total order so values can key deterministic maps. Cross-kind
    /// comparisons order by kind, not by magnitude.
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (Value::Float(a), Value::Float(b)) => a.total_cmp(b),
            (Value::Str(a), Value::Str(b)) => a.cmp(b),
            (Value::Symbol(a), Value::Symbol(b)) => a.cmp(b),
            (Value::Composite(a), Value::Composite(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl std::hash::Hash for Value {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.rank().hash(state);
        match self {
            Value::Int(i) => i.hash(state),
            Value::Float(x) => x.to_bits().hash(state),
            Value::Str(s) | Value::Symbol(s) | Value::Composite(s) => s.hash(state),
            Value::Null => {}
        }
    }
}

static RE_INT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^-?\d+$").unwrap());
static RE_HEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^0[xX][0-9a-fA-F]+$").unwrap());
static RE_FLOAT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^-?\d+\.\d+$").unwrap());
static RE_CHAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"^'.'$").unwrap());

/// Decode a boolean/null alias to its integer value
fn constant_alias(text: &str) -> Option<i64> {
    match text {
        "true" | "TRUE" => Some(1),
        "false" | "FALSE" | "NULL" | "nullptr" => Some(0),
        _ => None,
    }
}

/// Parse a compile-time constant: decimal and hex integers, floats,
/// single-character literals, and the boolean/null alias table.
///
/// Returns `None` for anything else, including plain identifiers.
pub fn parse_literal(text: &str) -> Option<Value> {
    let text = text.trim();

    if RE_INT.is_match(text) {
        return text.parse::<i64>().ok().map(Value::Int);
    }
    if RE_HEX.is_match(text) {
        return i64::from_str_radix(&text[2..], 16).ok().map(Value::Int);
    }
    if RE_FLOAT.is_match(text) {
        return text.parse::<f64>().ok().map(Value::Float);
    }
    if RE_CHAR.is_match(text) {
        return text.chars().nth(1).map(|c| Value::Int(c as i64));
    }
    constant_alias(text).map(Value::Int)
}

/// Parse isolated text into the best available descriptor.
///
/// Falls back from constants through string literals to a bare symbol;
/// never fails.
pub fn parse_text(text: &str) -> Value {
    let trimmed = text.trim();
    if let Some(value) = parse_literal(trimmed) {
        return value;
    }
    if let Ok(x) = trimmed.parse::<f64>() {
        return Value::Float(x);
    }
    if trimmed.len() >= 2 && trimmed.starts_with('"') && trimmed.ends_with('"') {
        return Value::Str(trimmed[1..trimmed.len() - 1].to_string());
    }
    Value::Symbol(trimmed.to_string())
}

/// Extract a value descriptor from a tree expression.
///
/// Literals evaluate, identifiers become symbols, binary operations
/// become `left OP right` composites, unary minus negates, and calls
/// become `name()` placeholders. Member chains, indexing, and ternaries
/// have no single-value descriptor and yield `None`.
pub fn from_expr(expr: &Expr) -> Option<Value> {
    match expr {
        Expr::IntLit { value, .. } => Some(Value::Int(*value)),
        Expr::FloatLit { value, .. } => Some(Value::Float(*value)),
        Expr::CharLit { value, .. } => Some(Value::Int(*value as i64)),
        Expr::StrLit { value, .. } => Some(Value::Str(value.clone())),
        Expr::Var { name, .. } => match constant_alias(name) {
            Some(i) => Some(Value::Int(i)),
            None => Some(Value::Symbol(name.clone())),
        },
        Expr::Unary {
            op: UnaryOp::Neg,
            operand,
            ..
        } => match from_expr(operand) {
            Some(Value::Int(i)) => Some(Value::Int(-i)),
            Some(Value::Float(x)) => Some(Value::Float(-x)),
            Some(other) => Some(Value::Composite(format!("-{}", other))),
            None => None,
        },
        Expr::Binary {
            op, left, right, ..
        } => {
            let l = from_expr(left)?;
            let r = from_expr(right)?;
            Some(Value::Composite(format!("{} {} {}", l, op, r)))
        }
        Expr::Call { function, .. } => Some(Value::Composite(format!("{}()", function))),
        _ => None,
    }
}
