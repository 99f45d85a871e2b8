//! Data-driven tests for expectation inference
//!
//! Exercises the full pipeline on realistic C function bodies: branch
//! selection, value resolution, confidence policy, and rendering.

use cexpect::{
    AssertionKind, ConditionMatcher, ConfidenceLevel, Directive, FunctionSource, InferenceEngine,
    ReturnAnalyzer, Synthesizer, TestCase, Value,
};
use rstest::rstest;
use std::collections::BTreeMap;

fn truths(pairs: &[(&str, bool)]) -> BTreeMap<String, bool> {
    pairs.iter().map(|(c, t)| (c.to_string(), *t)).collect()
}

const IF_ELSE_BODY: &str = "\
if (x > 10) {
    return 1;
} else {
    return 0;
}
";

const SWITCH_BODY: &str = "\
switch (state) {
    case 0:
        return 100;
    case 1:
        return 200;
    case 2:
        return 300;
    default:
        return -1;
}
";

// ============================================================================
// Branch selection
// ============================================================================

#[rstest]
#[case(true, 1)]
#[case(false, 0)]
fn test_if_else_both_branches_high(#[case] truth: bool, #[case] expected: i64) {
    let engine = InferenceEngine::new();
    let source = FunctionSource::Text(IF_ELSE_BODY.into());
    let result = engine.infer(&source, &truths(&[("x > 10", truth)]), &BTreeMap::new());

    assert_eq!(result.value, Some(Value::Int(expected)));
    assert_eq!(result.level, ConfidenceLevel::High);
    assert!(result.is_inferred);
}

#[rstest]
#[case("state == 0", 100)]
#[case("state == 1", 200)]
#[case("state == 2", 300)]
fn test_switch_case_selection(#[case] condition: &str, #[case] expected: i64) {
    // The generator phrases each case as an equality condition; the
    // context trail carries "case N" labels the condition text matches
    // through the case value.
    let case_value = condition.rsplit(' ').next().unwrap();
    let engine = InferenceEngine::new();
    let source = FunctionSource::Text(SWITCH_BODY.into());
    let result = engine.infer(
        &source,
        &truths(&[(&format!("case {}", case_value), true)]),
        &BTreeMap::new(),
    );

    assert_eq!(result.value, Some(Value::Int(expected)));
    assert_eq!(result.level, ConfidenceLevel::High);
}

#[test]
fn test_switch_default_value() {
    let analysis = ReturnAnalyzer::new().analyze(&FunctionSource::Text(SWITCH_BODY.into()));
    assert_eq!(analysis.default_value, Some(Value::Int(-1)));

    let keys: Vec<&str> = analysis
        .value_distribution
        .keys()
        .map(|k| k.as_str())
        .collect();
    assert_eq!(keys, vec!["-1", "100", "200", "300"]);
}

#[test]
fn test_all_conditions_false_takes_else() {
    let engine = InferenceEngine::new();
    let source = FunctionSource::Text(IF_ELSE_BODY.into());
    let result = engine.infer(&source, &truths(&[("x > 10", false)]), &BTreeMap::new());
    assert_eq!(result.value, Some(Value::Int(0)));
}

// ============================================================================
// Condition expectation properties
// ============================================================================

#[test]
fn test_equality_negation_flips_assertion() {
    let matcher = ConditionMatcher::new();
    let on_true = matcher.infer_from_condition("error_code == 0", true);
    let on_false = matcher.infer_from_condition("error_code == 0", false);

    assert_eq!(on_true[0].assertion, AssertionKind::Equal);
    assert_eq!(on_false[0].assertion, AssertionKind::NotEqual);
    // The negated direction is weaker
    assert!(on_true[0].confidence > on_false[0].confidence);
}

#[rstest]
#[case("len > 0", 1)]
#[case("len >= 8", 8)]
#[case("len < 256", 255)]
#[case("len <= 64", 64)]
fn test_relational_boundary_satisfies_condition(#[case] condition: &str, #[case] boundary: i64) {
    let matcher = ConditionMatcher::new();
    let exps = matcher.infer_from_condition(condition, true);
    let exp = exps
        .iter()
        .find(|e| e.reason.contains("boundary"))
        .expect("boundary expectation");
    assert_eq!(exp.value, Some(Value::Int(boundary)));
}

#[test]
fn test_null_checks_gated_by_pointer_shape() {
    let matcher = ConditionMatcher::new();

    let pointer = matcher.infer_from_condition("msg_buf == NULL", true);
    assert!(pointer.iter().any(|e| e.assertion == AssertionKind::Null));

    let scalar = matcher.infer_from_condition("total == NULL", true);
    assert!(scalar.iter().all(|e| e.assertion != AssertionKind::Null));
}

#[test]
fn test_compound_condition_consumes_truths_in_order() {
    let matcher = ConditionMatcher::new();
    let exps = matcher.infer_compound("mode == 1 || mode == 2", &[false, true]);

    assert_eq!(exps.len(), 2);
    assert_eq!(exps[0].assertion, AssertionKind::NotEqual);
    assert_eq!(exps[1].assertion, AssertionKind::Equal);
    assert_eq!(exps[1].value, Some(Value::Int(2)));
}

// ============================================================================
// Degradation
// ============================================================================

#[test]
fn test_empty_function_never_panics() {
    let engine = InferenceEngine::new();
    let result = engine.infer(
        &FunctionSource::Text(String::new()),
        &BTreeMap::new(),
        &BTreeMap::new(),
    );

    assert_eq!(result.value, None);
    assert_eq!(result.level, ConfidenceLevel::Uncertain);
    assert!(!result.is_inferred);
}

#[test]
fn test_uncertain_result_renders_placeholder() {
    let engine = InferenceEngine::new();
    let truths = truths(&[("ptr != NULL", true)]);
    let result = engine.infer(&FunctionSource::Text(String::new()), &truths, &BTreeMap::new());

    let directive = Synthesizer::default().directive_for_return(&result, &truths);
    assert!(matches!(directive, Directive::Placeholder { .. }));

    let rendered = directive.render();
    assert!(rendered.contains("TODO"));
    assert!(rendered.contains("condition 'ptr != NULL' is true in this case"));
}

// ============================================================================
// Batch and serialization
// ============================================================================

#[test]
fn test_batch_results_align_with_cases() {
    let engine = InferenceEngine::new();
    let source = FunctionSource::Text(IF_ELSE_BODY.into());
    let cases: Vec<TestCase> = [true, false]
        .iter()
        .map(|truth| TestCase {
            name: format!("case_{}", truth),
            condition_truths: truths(&[("x > 10", *truth)]),
            variable_values: BTreeMap::new(),
        })
        .collect();

    let results = engine.infer_batch(&source, &cases);
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].value, Some(Value::Int(1)));
    assert_eq!(results[1].value, Some(Value::Int(0)));
}

#[test]
fn test_expected_value_serde_round_trip() {
    let engine = InferenceEngine::new();
    let source = FunctionSource::Text(IF_ELSE_BODY.into());
    let result = engine.infer(&source, &truths(&[("x > 10", true)]), &BTreeMap::new());

    let json = serde_json::to_string(&result).unwrap();
    let back: cexpect::ExpectedValue = serde_json::from_str(&json).unwrap();
    assert_eq!(result, back);
    // Serialization is deterministic
    assert_eq!(json, serde_json::to_string(&back).unwrap());
}

#[test]
fn test_return_analysis_serde_round_trip() {
    let analysis = ReturnAnalyzer::new().analyze(&FunctionSource::Text(SWITCH_BODY.into()));

    let json = serde_json::to_string(&analysis).unwrap();
    let back: cexpect::FunctionReturnAnalysis = serde_json::from_str(&json).unwrap();
    assert_eq!(analysis, back);
    assert_eq!(json, serde_json::to_string(&back).unwrap());
}
