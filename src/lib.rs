// Production-quality lints
#![warn(
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro,
    clippy::print_stdout,
    clippy::print_stderr
)]
// Deny truly dangerous patterns
#![deny(clippy::mem_forget)]
// Allow common patterns in library code
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

//! # cexpect: expected-value inference for generated C unit tests
//!
//! When a test generator synthesizes an MC/DC test case for a C function,
//! it knows which truth value each branch condition takes, but not what
//! the test should assert afterwards. cexpect fills that gap with
//! heuristics: it analyzes the function's return patterns and branch
//! effects, resolves the return expression the case would execute, and
//! produces confidence-scored assertion directives.
//!
//! Inference never fails. Anything the heuristics cannot resolve
//! degrades to an `UNCERTAIN` placeholder that a human fills in, never
//! to an error or a fabricated value.
//!
//! ## Quick Start
//!
//! ```rust
//! use cexpect::{FunctionSource, InferenceEngine, Synthesizer};
//! use std::collections::BTreeMap;
//!
//! let source = FunctionSource::Text(
//!     "if (x > 10) {\n    return 1;\n}\nreturn 0;\n".into(),
//! );
//!
//! let mut truths = BTreeMap::new();
//! truths.insert("x > 10".to_string(), true);
//!
//! let engine = InferenceEngine::new();
//! let expected = engine.infer(&source, &truths, &BTreeMap::new());
//! assert!(expected.is_inferred);
//!
//! let directive = Synthesizer::default().directive_for_return(&expected, &truths);
//! assert!(directive.render().contains("TEST_ASSERT_EQUAL(1, result);"));
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                                                          │
//! │  FUNCTION (tree or raw body text)                        │
//! │       │                                                  │
//! │       ├──► ReturnAnalyzer ──► FunctionReturnAnalysis     │
//! │       │                                                  │
//! │       ├──► EffectAnalyzer ──► FunctionAnalysis           │
//! │       │                                                  │
//! │       └──► InferenceEngine ──► ExpectedValue             │
//! │                                      │                   │
//! │  CONDITIONS (truth assignment)       │                   │
//! │       │                              │                   │
//! │       └──► ConditionMatcher ──► InferredExpectation      │
//! │                                      │                   │
//! │                    Synthesizer ──► Directive ──► C text  │
//! │                                                          │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Confidence Levels
//!
//! Every result carries a score in [0,1] bucketed into four levels that
//! drive the emission policy:
//!
//! | Level | Score | Policy |
//! |-------|-------|--------|
//! | `HIGH` | >= 0.90 | assert directly |
//! | `MEDIUM` | >= 0.60 | assert with a verification note |
//! | `LOW` | >= 0.30 | commented-out assert behind a manual check marker |
//! | `UNCERTAIN` | < 0.30 | TODO placeholder with hints |

pub mod ast;
pub mod conditions;
pub mod confidence;
pub mod effects;
pub mod emit;
pub mod error;
pub mod infer;
pub mod returns;
pub mod value;

// Re-exports
pub use ast::{
    BinaryOp, CFunction, CaseLabel, Expr, FunctionSource, Parameter, Span, Stmt, SwitchCase,
    UnaryOp,
};
pub use conditions::{
    is_likely_pointer, AssertionKind, ConditionMatcher, ConditionRule, InferredExpectation,
    CONDITION_RULES, RETURN_TARGET,
};
pub use confidence::{score_pattern, score_resolved, ConfidenceLevel};
pub use effects::{
    BranchEffect, CallSite, EffectAnalyzer, FunctionAnalysis, VariableFlow, VariableInfo,
};
pub use emit::{condition_hints, Directive, Synthesizer};
pub use error::{Error, Result};
pub use infer::{EngineConfig, ExpectedValue, InferenceEngine, TestCase};
pub use returns::{
    classify_return, extract_returns, is_error_value, FunctionReturnAnalysis, ReturnAnalyzer,
    ReturnKind, ReturnPattern, ReturnStatement, TOP_CONTEXT,
};
pub use value::{parse_literal, parse_text, Value};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
