//! Assertion directive synthesis
//!
//! Turns inferred expectations into Unity assertion directives and
//! renders them as C test lines. The confidence level decides the
//! emission policy: high asserts directly, medium asserts with a
//! verification note, low comments the assertion out behind a manual
//! check marker, and anything below threshold becomes a TODO
//! placeholder with hints.

use crate::conditions::{AssertionKind, InferredExpectation, RETURN_TARGET};
use crate::confidence::ConfidenceLevel;
use crate::infer::ExpectedValue;
use crate::value::Value;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One synthesized assertion or placeholder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Directive {
    /// Emit an assertion on a target expression
    Assert {
        target: String,
        value: Option<Value>,
        assertion: AssertionKind,
        confidence: f32,
        level: ConfidenceLevel,
        reason: String,
    },
    /// Nothing trustworthy to assert; leave a marked gap
    Placeholder {
        target: String,
        reason: String,
        confidence: f32,
        hints: Vec<String>,
    },
}

/// Assertion synthesizer with a confidence cutoff
#[derive(Debug, Clone, Copy)]
pub struct Synthesizer {
    threshold: f32,
}

impl Default for Synthesizer {
    fn default() -> Self {
        Self { threshold: 0.6 }
    }
}

impl Synthesizer {
    pub fn new(threshold: f32) -> Self {
        Self { threshold }
    }

    /// Directive for a variable expectation
    pub fn directive_for(&self, expectation: &InferredExpectation) -> Directive {
        if expectation.confidence < self.threshold
            || expectation.level == ConfidenceLevel::Uncertain
        {
            return Directive::Placeholder {
                target: expectation.variable.clone(),
                reason: expectation.reason.clone(),
                confidence: expectation.confidence,
                hints: vec![assertion_form_hint(expectation.assertion).to_string()],
            };
        }
        Directive::Assert {
            target: expectation.variable.clone(),
            value: expectation.value.clone(),
            assertion: expectation.assertion,
            confidence: expectation.confidence,
            level: expectation.level,
            reason: expectation.reason.clone(),
        }
    }

    /// Directive for an inferred return value.
    ///
    /// The synthesizer applies its own cutoff in addition to the
    /// engine's inferred flag, so its policy holds even when the two
    /// are configured with different thresholds. Results that fail
    /// either gate become placeholders; `condition_truths` feeds their
    /// hint lines.
    pub fn directive_for_return(
        &self,
        expected: &ExpectedValue,
        condition_truths: &BTreeMap<String, bool>,
    ) -> Directive {
        match &expected.value {
            Some(value)
                if expected.is_inferred && expected.confidence >= self.threshold =>
            {
                Directive::Assert {
                    target: RETURN_TARGET.to_string(),
                    value: Some(value.clone()),
                    assertion: AssertionKind::Equal,
                    confidence: expected.confidence,
                    level: expected.level,
                    reason: expected.justification.clone(),
                }
            }
            _ => Directive::Placeholder {
                target: RETURN_TARGET.to_string(),
                reason: expected.justification.clone(),
                confidence: expected.confidence,
                hints: condition_hints(condition_truths),
            },
        }
    }
}

/// Hint lines describing the truth assignment under test.
///
/// Each condition contributes its assigned truth value plus, where the
/// condition shape suggests one, the assertion form to reach for.
pub fn condition_hints(condition_truths: &BTreeMap<String, bool>) -> Vec<String> {
    let mut hints = Vec::new();
    for (condition, truth) in condition_truths {
        hints.push(format!(
            "condition '{}' is {} in this case",
            condition,
            if *truth { "true" } else { "false" }
        ));
        if let Some(advice) = shape_advice(condition) {
            hints.push(advice.to_string());
        }
    }
    hints
}

/// The Unity macro the expectation's assertion form maps to
fn assertion_form_hint(assertion: AssertionKind) -> &'static str {
    match assertion {
        AssertionKind::Equal => "TEST_ASSERT_EQUAL would apply once the value is confirmed",
        AssertionKind::NotEqual => {
            "TEST_ASSERT_NOT_EQUAL would apply once the value is confirmed"
        }
        AssertionKind::Null => "TEST_ASSERT_NULL would apply",
        AssertionKind::NotNull => "TEST_ASSERT_NOT_NULL would apply",
        AssertionKind::True => "TEST_ASSERT_TRUE would apply",
        AssertionKind::False => "TEST_ASSERT_FALSE would apply",
    }
}

/// Assertion-form advice derived from the condition's shape
fn shape_advice(condition: &str) -> Option<&'static str> {
    if condition.contains("NULL") || condition.trim_start().starts_with('!') {
        Some("assert pointer validity with TEST_ASSERT_NULL / TEST_ASSERT_NOT_NULL")
    } else if condition.contains("==") || condition.contains("!=") {
        Some("an equality assertion (TEST_ASSERT_EQUAL) usually fits here")
    } else if condition.contains('<') || condition.contains('>') {
        Some("pick a boundary value satisfying the relation and assert equality")
    } else {
        None
    }
}

impl Directive {
    /// Render as Unity C test lines
    pub fn render(&self) -> String {
        match self {
            Directive::Assert {
                target,
                value,
                assertion,
                level,
                reason,
                ..
            } => {
                let actual = render_target(target);
                let line = assertion_line(*assertion, value.as_ref(), actual);
                match level {
                    ConfidenceLevel::High => format!("{}  /* {} */", line, reason),
                    ConfidenceLevel::Medium => format!(
                        "/* verify: {} (confidence MEDIUM) */\n{}",
                        reason, line
                    ),
                    ConfidenceLevel::Low | ConfidenceLevel::Uncertain => format!(
                        "/* MANUAL CHECK: {} (confidence {}) */\n/* {} */",
                        reason, level, line
                    ),
                }
            }
            Directive::Placeholder {
                target,
                reason,
                hints,
                ..
            } => {
                let actual = render_target(target);
                let mut lines = vec![format!(
                    "/* TODO: determine expected value for {} ({}) */",
                    actual, reason
                )];
                for hint in hints {
                    lines.push(format!("/* hint: {} */", hint));
                }
                lines.push(format!("/* TEST_ASSERT_EQUAL(..., {}); */", actual));
                lines.join("\n")
            }
        }
    }
}

/// The return pseudo-target renders as the conventional `result` local
fn render_target(target: &str) -> &str {
    if target == RETURN_TARGET {
        "result"
    } else {
        target
    }
}

fn assertion_line(assertion: AssertionKind, value: Option<&Value>, actual: &str) -> String {
    match assertion {
        AssertionKind::Equal => match value {
            Some(Value::Str(s)) => {
                format!("TEST_ASSERT_EQUAL_STRING(\"{}\", {});", s, actual)
            }
            Some(v @ Value::Float(_)) => {
                format!("TEST_ASSERT_EQUAL_FLOAT({}, {});", v, actual)
            }
            Some(v) => format!("TEST_ASSERT_EQUAL({}, {});", v, actual),
            None => format!("TEST_ASSERT_EQUAL(0, {});", actual),
        },
        AssertionKind::NotEqual => {
            let expected = value.map(Value::to_string).unwrap_or_else(|| "0".into());
            format!("TEST_ASSERT_NOT_EQUAL({}, {});", expected, actual)
        }
        AssertionKind::Null => format!("TEST_ASSERT_NULL({});", actual),
        AssertionKind::NotNull => format!("TEST_ASSERT_NOT_NULL({});", actual),
        AssertionKind::True => format!("TEST_ASSERT_TRUE({});", actual),
        AssertionKind::False => format!("TEST_ASSERT_FALSE({});", actual),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expectation(confidence: f32) -> InferredExpectation {
        InferredExpectation::new(
            "status",
            Some(Value::Int(3)),
            AssertionKind::Equal,
            confidence,
            "condition 'status == 3' is true",
        )
    }

    #[test]
    fn test_high_confidence_renders_direct_assert() {
        let directive = Synthesizer::default().directive_for(&expectation(0.95));
        let rendered = directive.render();
        assert!(rendered.starts_with("TEST_ASSERT_EQUAL(3, status);"));
        assert!(rendered.contains("/* condition 'status == 3' is true */"));
    }

    #[test]
    fn test_medium_confidence_adds_verification_note() {
        let directive = Synthesizer::default().directive_for(&expectation(0.70));
        let rendered = directive.render();
        assert!(rendered.starts_with("/* verify:"));
        assert!(rendered.contains("TEST_ASSERT_EQUAL(3, status);"));
    }

    #[test]
    fn test_below_threshold_becomes_placeholder() {
        // 0.40 is LOW but still under the default 0.6 cutoff
        let directive = Synthesizer::default().directive_for(&expectation(0.40));
        assert!(matches!(directive, Directive::Placeholder { .. }));

        let rendered = directive.render();
        assert!(rendered.starts_with("/* TODO:"));
        assert!(rendered.contains("TEST_ASSERT_EQUAL would apply"));
    }

    #[test]
    fn test_raised_threshold_gates_medium_expectation() {
        let directive = Synthesizer::new(0.95).directive_for(&expectation(0.70));
        assert!(matches!(directive, Directive::Placeholder { .. }));
    }

    #[test]
    fn test_low_confidence_comments_assert_out() {
        // A lowered cutoff lets a LOW expectation through as an assert;
        // the LOW rendering still wraps it in a manual-check marker
        let directive = Synthesizer::new(0.3).directive_for(&expectation(0.40));
        let rendered = directive.render();
        assert!(rendered.starts_with("/* MANUAL CHECK:"));
        assert!(rendered.contains("/* TEST_ASSERT_EQUAL(3, status); */"));
    }

    #[test]
    fn test_null_assertion_macros() {
        let exp = InferredExpectation::new(
            "buf_ptr",
            None,
            AssertionKind::Null,
            0.80,
            "pointer check 'buf_ptr == NULL'",
        );
        let rendered = Synthesizer::default().directive_for(&exp).render();
        assert!(rendered.contains("TEST_ASSERT_NULL(buf_ptr);"));
    }

    #[test]
    fn test_string_value_uses_string_macro() {
        let exp = InferredExpectation::new(
            "label",
            Some(Value::Str("ok".into())),
            AssertionKind::Equal,
            0.95,
            "constant return",
        );
        let rendered = Synthesizer::default().directive_for(&exp).render();
        assert!(rendered.contains("TEST_ASSERT_EQUAL_STRING(\"ok\", label);"));
    }

    #[test]
    fn test_return_target_renders_as_result() {
        let expected = ExpectedValue {
            value: Some(Value::Int(1)),
            confidence: 0.95,
            level: ConfidenceLevel::High,
            justification: "return '1' (line 2, context 'if(x > 10)')".into(),
            is_inferred: true,
        };
        let directive =
            Synthesizer::default().directive_for_return(&expected, &BTreeMap::new());
        assert!(directive.render().contains("TEST_ASSERT_EQUAL(1, result);"));
    }

    #[test]
    fn test_return_directive_respects_synthesizer_threshold() {
        // Inferred at the engine's 0.6 cutoff, but this synthesizer
        // demands more
        let expected = ExpectedValue {
            value: Some(Value::Int(7)),
            confidence: 0.85,
            level: ConfidenceLevel::Medium,
            justification: "return 'count' (line 1, context 'top')".into(),
            is_inferred: true,
        };
        let directive = Synthesizer::new(0.95).directive_for_return(&expected, &BTreeMap::new());
        assert!(matches!(directive, Directive::Placeholder { .. }));
    }

    #[test]
    fn test_placeholder_hint_names_assertion_form() {
        let exp = InferredExpectation::new(
            "msg_ptr",
            None,
            AssertionKind::Null,
            0.20,
            "pointer check 'msg_ptr == NULL'",
        );
        let directive = Synthesizer::default().directive_for(&exp);
        let rendered = directive.render();
        assert!(rendered.contains("/* hint: TEST_ASSERT_NULL would apply */"));
    }

    #[test]
    fn test_uncertain_return_yields_placeholder_with_hints() {
        let expected = ExpectedValue {
            value: None,
            confidence: 0.0,
            level: ConfidenceLevel::Uncertain,
            justification: "No return statements found".into(),
            is_inferred: false,
        };
        let truths: BTreeMap<String, bool> = [("x > 10".to_string(), true)].into();
        let directive = Synthesizer::default().directive_for_return(&expected, &truths);

        let rendered = directive.render();
        assert!(rendered.starts_with("/* TODO: determine expected value for result"));
        assert!(rendered.contains("/* hint: condition 'x > 10' is true in this case */"));
        assert!(rendered.contains("boundary value"));
        assert!(rendered.contains("/* TEST_ASSERT_EQUAL(..., result); */"));
    }

    #[test]
    fn test_uncertain_expectation_becomes_placeholder() {
        let exp = InferredExpectation::new(
            "mystery",
            None,
            AssertionKind::Equal,
            0.1,
            "unresolvable expression",
        );
        let directive = Synthesizer::default().directive_for(&exp);
        assert!(matches!(directive, Directive::Placeholder { .. }));
    }
}
