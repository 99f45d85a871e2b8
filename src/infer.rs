//! Expectation inference engine
//!
//! Given a function body and one test case's branch-condition truth
//! assignment, picks the return statement that case would execute,
//! resolves its expression against the case's input values, and scores
//! the result. Inference never fails: when nothing can be resolved the
//! result degrades to an uncertain placeholder instead of an error.

use crate::ast::FunctionSource;
use crate::confidence::{score_resolved, ConfidenceLevel};
use crate::error::{Error, Result};
use crate::returns::{extract_returns, ReturnStatement, TOP_CONTEXT};
use crate::value::Value;
use log::{debug, warn};
use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Engine tuning knobs
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema)]
pub struct EngineConfig {
    /// Minimum confidence for a result to count as inferred
    pub confidence_threshold: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.6,
        }
    }
}

/// One synthesized test case's inputs
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TestCase {
    /// Case name, for logging and generated test labels
    pub name: String,
    /// Branch condition text -> assigned truth value
    pub condition_truths: BTreeMap<String, bool>,
    /// Input variable name -> concrete value
    pub variable_values: BTreeMap<String, Value>,
}

/// The inferred expected outcome of one test case
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ExpectedValue {
    /// Resolved value; `None` when nothing could be inferred
    pub value: Option<Value>,
    /// Confidence score in [0,1]
    pub confidence: f32,
    /// Bucketed confidence level
    pub level: ConfidenceLevel,
    /// How the value was arrived at
    pub justification: String,
    /// Whether the result clears the configured threshold
    pub is_inferred: bool,
}

impl ExpectedValue {
    fn uncertain(justification: impl Into<String>) -> Self {
        Self {
            value: None,
            confidence: 0.0,
            level: ConfidenceLevel::Uncertain,
            justification: justification.into(),
            is_inferred: false,
        }
    }
}

/// Expectation inference engine
#[derive(Debug, Default)]
pub struct InferenceEngine {
    config: EngineConfig,
}

impl InferenceEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Infer the expected return value for one truth assignment.
    ///
    /// Never fails; internal evaluation problems are logged and degrade
    /// the result to uncertain.
    pub fn infer(
        &self,
        source: &FunctionSource,
        condition_truths: &BTreeMap<String, bool>,
        variable_values: &BTreeMap<String, Value>,
    ) -> ExpectedValue {
        match self.try_infer(source, condition_truths, variable_values) {
            Ok(expected) => expected,
            Err(err) => {
                warn!("expectation inference degraded to uncertain: {}", err);
                ExpectedValue::uncertain(format!("inference failed: {}", err))
            }
        }
    }

    /// Infer expectations for a batch of test cases against one function
    pub fn infer_batch(&self, source: &FunctionSource, cases: &[TestCase]) -> Vec<ExpectedValue> {
        cases
            .iter()
            .map(|case| {
                debug!("inferring expected value for case '{}'", case.name);
                self.infer(source, &case.condition_truths, &case.variable_values)
            })
            .collect()
    }

    fn try_infer(
        &self,
        source: &FunctionSource,
        condition_truths: &BTreeMap<String, bool>,
        variable_values: &BTreeMap<String, Value>,
    ) -> Result<ExpectedValue> {
        let returns = extract_returns(source);
        if returns.is_empty() {
            return Ok(ExpectedValue::uncertain("No return statements found"));
        }

        let statement = select_executed_return(&returns, condition_truths);
        let resolved = evaluate_return(statement, variable_values)?;
        let confidence = score_resolved(statement, &resolved);

        Ok(ExpectedValue {
            value: Some(resolved),
            confidence,
            level: ConfidenceLevel::from_score(confidence),
            justification: format!(
                "return '{}' (line {}, context '{}')",
                statement.expression, statement.line, statement.condition_context
            ),
            is_inferred: confidence >= self.config.confidence_threshold,
        })
    }
}

/// Pick the return statement the truth assignment would execute
fn select_executed_return<'a>(
    returns: &'a [ReturnStatement],
    condition_truths: &BTreeMap<String, bool>,
) -> &'a ReturnStatement {
    let any_true = condition_truths.values().any(|t| *t);

    if !condition_truths.is_empty() && !any_true {
        // Every guarded branch is skipped: take the fallthrough or else
        if let Some(stmt) = returns.iter().find(|r| {
            r.condition_context == TOP_CONTEXT || r.condition_context.contains("else")
        }) {
            return stmt;
        }
        return returns.get(1).unwrap_or(&returns[0]);
    }

    for (condition, truth) in condition_truths {
        if *truth {
            if let Some(stmt) = returns
                .iter()
                .find(|r| r.condition_context.contains(condition.as_str()))
            {
                return stmt;
            }
        }
    }

    &returns[0]
}

/// Resolve a return expression against the case's input values
fn evaluate_return(
    statement: &ReturnStatement,
    variable_values: &BTreeMap<String, Value>,
) -> Result<Value> {
    if let Some(value) = &statement.value {
        return Ok(value.clone());
    }

    let expression = statement.expression.trim();
    if let Some(value) = variable_values.get(expression) {
        return Ok(value.clone());
    }

    let substituted = substitute_variables(expression, variable_values)?;
    if let Some(value) = eval_arithmetic(&substituted) {
        return Ok(value);
    }

    Ok(fallback_value(expression))
}

/// Replace whole-word variable references with their known values
fn substitute_variables(
    expression: &str,
    variable_values: &BTreeMap<String, Value>,
) -> Result<String> {
    let mut text = expression.to_string();
    for (name, value) in variable_values {
        let pattern = Regex::new(&format!(r"\b{}\b", regex::escape(name)))
            .map_err(|e| Error::Eval(e.to_string()))?;
        text = pattern.replace_all(&text, value.to_string()).into_owned();
    }
    Ok(text)
}

/// Type-shaped default when resolution comes up empty
fn fallback_value(expression: &str) -> Value {
    if expression.contains("->") || expression.contains('*') {
        Value::Null
    } else {
        Value::Int(0)
    }
}

/// Evaluate a fully numeric arithmetic expression.
///
/// Accepts only digits, `+ - * /`, parentheses, dots, and spaces; any
/// other character means an unresolved symbol remains and evaluation is
/// declined rather than guessed.
fn eval_arithmetic(text: &str) -> Option<Value> {
    const CHARSET: &str = "0123456789+-*/(). ";
    let text = text.trim();
    if text.is_empty() || !text.chars().all(|c| CHARSET.contains(c)) {
        return None;
    }

    let mut parser = ArithParser {
        bytes: text.as_bytes(),
        pos: 0,
    };
    let result = parser.expr()?;
    parser.skip_spaces();
    if parser.pos != parser.bytes.len() {
        return None;
    }

    if result.fract() == 0.0 && result.abs() < i64::MAX as f64 {
        Some(Value::Int(result as i64))
    } else {
        Some(Value::Float(result))
    }
}

struct ArithParser<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl ArithParser<'_> {
    fn skip_spaces(&mut self) {
        while self.bytes.get(self.pos) == Some(&b' ') {
            self.pos += 1;
        }
    }

    fn peek(&mut self) -> Option<u8> {
        self.skip_spaces();
        self.bytes.get(self.pos).copied()
    }

    fn expr(&mut self) -> Option<f64> {
        let mut acc = self.term()?;
        while let Some(op @ (b'+' | b'-')) = self.peek() {
            self.pos += 1;
            let rhs = self.term()?;
            if op == b'+' {
                acc += rhs;
            } else {
                acc -= rhs;
            }
        }
        Some(acc)
    }

    fn term(&mut self) -> Option<f64> {
        let mut acc = self.factor()?;
        while let Some(op @ (b'*' | b'/')) = self.peek() {
            self.pos += 1;
            let rhs = self.factor()?;
            if op == b'*' {
                acc *= rhs;
            } else {
                if rhs == 0.0 {
                    return None;
                }
                acc /= rhs;
            }
        }
        Some(acc)
    }

    fn factor(&mut self) -> Option<f64> {
        match self.peek()? {
            b'-' => {
                self.pos += 1;
                Some(-self.factor()?)
            }
            b'(' => {
                self.pos += 1;
                let inner = self.expr()?;
                if self.peek() != Some(b')') {
                    return None;
                }
                self.pos += 1;
                Some(inner)
            }
            _ => self.number(),
        }
    }

    fn number(&mut self) -> Option<f64> {
        self.skip_spaces();
        let start = self.pos;
        while self
            .bytes
            .get(self.pos)
            .is_some_and(|b| b.is_ascii_digit() || *b == b'.')
        {
            self.pos += 1;
        }
        if self.pos == start {
            return None;
        }
        std::str::from_utf8(&self.bytes[start..self.pos])
            .ok()?
            .parse()
            .ok()
    }
}
