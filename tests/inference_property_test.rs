//! Property-based tests for expectation inference
//!
//! Uses proptest to generate random function bodies and truth
//! assignments and verify the engine's invariants.

use cexpect::{ConfidenceLevel, FunctionSource, InferenceEngine, ReturnAnalyzer};
use proptest::prelude::*;
use std::collections::BTreeMap;

proptest! {
    #[test]
    fn test_inference_never_panics(body in any_body(), truth_map in any_truths()) {
        let engine = InferenceEngine::new();
        let source = FunctionSource::Text(body);
        // Arbitrary input must degrade, never abort
        let _ = engine.infer(&source, &truth_map, &BTreeMap::new());
    }

    #[test]
    fn test_confidence_bounds(body in any_body(), truth_map in any_truths()) {
        let engine = InferenceEngine::new();
        let result = engine.infer(&FunctionSource::Text(body), &truth_map, &BTreeMap::new());
        prop_assert!(result.confidence >= 0.0);
        prop_assert!(result.confidence <= 1.0);
    }

    #[test]
    fn test_level_matches_score(body in any_body(), truth_map in any_truths()) {
        let engine = InferenceEngine::new();
        let result = engine.infer(&FunctionSource::Text(body), &truth_map, &BTreeMap::new());
        prop_assert_eq!(result.level, ConfidenceLevel::from_score(result.confidence));
    }

    #[test]
    fn test_inference_is_deterministic(body in any_body(), truth_map in any_truths()) {
        let engine = InferenceEngine::new();
        let source = FunctionSource::Text(body);
        let first = engine.infer(&source, &truth_map, &BTreeMap::new());
        let second = engine.infer(&source, &truth_map, &BTreeMap::new());
        prop_assert_eq!(first, second);
    }

    #[test]
    fn test_analysis_serde_idempotent(body in any_body()) {
        let analysis = ReturnAnalyzer::new().analyze(&FunctionSource::Text(body));
        let json = serde_json::to_string(&analysis).unwrap();
        let back: cexpect::FunctionReturnAnalysis = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(&analysis, &back);
        prop_assert_eq!(json, serde_json::to_string(&back).unwrap());
    }

    #[test]
    fn test_no_returns_means_uncertain(truth_map in any_truths()) {
        let engine = InferenceEngine::new();
        let result = engine.infer(
            &FunctionSource::Text("x = 1;\n".into()),
            &truth_map,
            &BTreeMap::new(),
        );
        prop_assert_eq!(result.value, None);
        prop_assert_eq!(result.level, ConfidenceLevel::Uncertain);
    }
}

fn any_body() -> impl Strategy<Value = String> {
    let return_line = prop_oneof![
        (-100i64..100).prop_map(|n| format!("    return {};\n", n)),
        Just("    return result;\n".to_string()),
        Just("    return a + b;\n".to_string()),
        Just("    return helper(x);\n".to_string()),
        Just("    return NULL;\n".to_string()),
    ];
    let guarded = ("[a-z]{1,8}", 0i64..50, return_line.clone()).prop_map(
        |(name, bound, ret)| format!("if ({} > {}) {{\n{}}}\n", name, bound, ret),
    );
    prop::collection::vec(prop_oneof![guarded, return_line], 0..6)
        .prop_map(|chunks| chunks.concat())
}

fn any_truths() -> impl Strategy<Value = BTreeMap<String, bool>> {
    prop::collection::btree_map("[a-z]{1,8} > [0-9]{1,2}", any::<bool>(), 0..4)
}
