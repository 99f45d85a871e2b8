//! Return pattern classification
//!
//! Extracts every `return` statement from a function body (tree or raw
//! text), classifies its expression into a semantic category with a
//! complexity score, and aggregates a function-wide summary: value
//! distribution, likely default value, and estimated return type.

use crate::ast::{CaseLabel, CFunction, FunctionSource, Stmt};
use crate::value::{self, Value};
use once_cell::sync::Lazy;
use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Context label for returns outside any conditional
pub const TOP_CONTEXT: &str = "top";

/// Separator joining nested control labels into a context trail
const CONTEXT_SEP: &str = " -> ";

/// Semantic category of a return expression
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReturnKind {
    Constant,
    Variable,
    Expression,
    FunctionCall,
    Pointer,
    StructMember,
    ArrayElement,
    Conditional,
    Unknown,
}

/// One `return` statement as found in the body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ReturnStatement {
    /// The returned expression, as written
    pub expression: String,
    /// Source line
    pub line: usize,
    /// Trail of enclosing control labels, joined with `" -> "`
    pub condition_context: String,
    /// Whether the expression is a compile-time constant
    pub is_constant: bool,
    /// Evaluated value when constant
    pub value: Option<Value>,
}

/// Classified return pattern
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ReturnPattern {
    /// Semantic category
    pub kind: ReturnKind,
    /// The returned expression, as written
    pub expression: String,
    /// Evaluated value when constant
    pub value: Option<Value>,
    /// Variable names referenced by the expression
    pub variables: BTreeSet<String>,
    /// Functions called by the expression
    pub functions: BTreeSet<String>,
    /// Operators appearing in the expression
    pub operators: BTreeSet<String>,
    /// Accumulated complexity score
    pub complexity: u32,
    /// Trail of enclosing control labels
    pub context: String,
    /// Source line
    pub line: usize,
}

/// Aggregate return behavior of one function
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FunctionReturnAnalysis {
    /// All return patterns, in source order
    pub patterns: Vec<ReturnPattern>,
    /// Likely fallthrough/default value
    pub default_value: Option<Value>,
    /// Values appearing at least twice, or top-3 for small sets
    pub common_values: Vec<Value>,
    /// Constant value -> occurrence count, keyed by C literal text
    pub value_distribution: BTreeMap<String, usize>,
    /// Category -> occurrence count
    pub kind_distribution: BTreeMap<ReturnKind, usize>,
    /// Whether an error-handling return shape was detected
    pub has_error_handling: bool,
    /// Estimated C return type label
    pub estimated_return_type: String,
}

/// Values conventionally used to signal failure
pub fn is_error_value(value: &Value) -> bool {
    match value {
        Value::Int(-1) | Value::Int(0) | Value::Null => true,
        Value::Symbol(s) => matches!(s.as_str(), "NULL" | "nullptr" | "false" | "FALSE"),
        _ => false,
    }
}

static RE_RETURN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*return\s+([^;]+);?").unwrap());
static RE_IF: Lazy<Regex> = Lazy::new(|| Regex::new(r"(else\s+)?if\s*\((.*?)\)").unwrap());
static RE_SWITCH: Lazy<Regex> = Lazy::new(|| Regex::new(r"switch\s*\((.*?)\)").unwrap());
static RE_CASE: Lazy<Regex> = Lazy::new(|| Regex::new(r"case\s+(.+?)\s*:").unwrap());
static RE_WHILE: Lazy<Regex> = Lazy::new(|| Regex::new(r"while\s*\((.*?)\)").unwrap());
static RE_CALL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\w+)\s*\(").unwrap());
static RE_MULTIPLICATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\w\)]\s*\*\s*[\w\(]").unwrap());
static RE_FLOAT_PART: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+\.\d+").unwrap());
static RE_CALL_STRIP: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w+\s*\([^)]*\)").unwrap());
static RE_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\d+\b").unwrap());
static RE_HEX_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b0[xX][0-9a-fA-F]+\b").unwrap());
static RE_NONWORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[+\-*/&|^~!<>=()\[\]{},;?:]").unwrap());

const KEYWORDS: &[&str] = &[
    "return", "if", "else", "NULL", "nullptr", "true", "false", "TRUE", "FALSE",
];

/// Return pattern analyzer
///
/// Stateless; one `analyze` call produces one complete result.
#[derive(Debug, Default)]
pub struct ReturnAnalyzer;

impl ReturnAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Analyze all returns of a function
    pub fn analyze(&self, source: &FunctionSource) -> FunctionReturnAnalysis {
        let patterns: Vec<ReturnPattern> = extract_returns(source)
            .iter()
            .map(|stmt| classify_return(&stmt.expression, &stmt.condition_context, stmt.line))
            .collect();

        let distribution = value_counts(&patterns);
        let kind_distribution = kind_counts(&patterns);
        let default_value = find_default_value(&patterns, &distribution);
        let common_values = find_common_values(&distribution);
        let has_error_handling = detect_error_handling(&patterns);
        let estimated_return_type = estimate_return_type(&patterns, &distribution);

        FunctionReturnAnalysis {
            patterns,
            default_value,
            common_values,
            value_distribution: distribution
                .iter()
                .map(|(v, n)| (v.to_string(), *n))
                .collect(),
            kind_distribution,
            has_error_handling,
            estimated_return_type,
        }
    }
}

/// Extract all return statements with their condition-context trails
pub fn extract_returns(source: &FunctionSource) -> Vec<ReturnStatement> {
    match source {
        FunctionSource::Text(text) => extract_from_text(text),
        FunctionSource::Tree(func) => extract_from_tree(func),
    }
}

/// Classify one return expression into a pattern
pub fn classify_return(expression: &str, context: &str, line: usize) -> ReturnPattern {
    let expression = expression.trim();

    // Constants short-circuit the whole chain
    if let Some(constant) = value::parse_literal(expression) {
        return ReturnPattern {
            kind: ReturnKind::Constant,
            expression: expression.to_string(),
            value: Some(constant),
            variables: BTreeSet::new(),
            functions: BTreeSet::new(),
            operators: BTreeSet::new(),
            complexity: 0,
            context: context.to_string(),
            line,
        };
    }

    let functions: BTreeSet<String> = RE_CALL
        .captures_iter(expression)
        .map(|c| c[1].to_string())
        .collect();
    let has_pointer = expression.contains("->")
        || (expression.contains('*') && !RE_MULTIPLICATION.is_match(expression));
    let has_member = expression.contains('.') && !RE_FLOAT_PART.is_match(expression);
    let has_array = expression.contains('[') && expression.contains(']');
    let has_ternary = expression.contains('?') && expression.contains(':');

    let variables = extract_variables(expression);
    let operators = extract_operators(expression);

    let mut complexity = 10 * functions.len() as u32;
    if has_pointer {
        complexity += 5;
    }
    if has_member {
        complexity += 3;
    }
    if has_array {
        complexity += 4;
    }
    if has_ternary {
        complexity += 6;
    }
    complexity += 2 * operators.len() as u32;

    // Priority chain: first matching structural feature decides the kind
    let kind = if !functions.is_empty() {
        ReturnKind::FunctionCall
    } else if has_pointer {
        ReturnKind::Pointer
    } else if has_member {
        ReturnKind::StructMember
    } else if has_array {
        ReturnKind::ArrayElement
    } else if has_ternary {
        ReturnKind::Conditional
    } else if !operators.is_empty() {
        ReturnKind::Expression
    } else if !variables.is_empty() {
        ReturnKind::Variable
    } else {
        ReturnKind::Unknown
    };

    ReturnPattern {
        kind,
        expression: expression.to_string(),
        value: None,
        variables,
        functions,
        operators,
        complexity,
        context: context.to_string(),
        line,
    }
}

// --- text-based extraction ---

fn extract_from_text(body: &str) -> Vec<ReturnStatement> {
    let mut statements = Vec::new();
    // (indent, label) stack of enclosing control constructs
    let mut context_stack: Vec<(usize, String)> = Vec::new();

    for (i, line) in body.lines().enumerate() {
        let line_no = i + 1;
        let stripped = line.trim();

        if stripped == "}" {
            context_stack.pop();
        } else if is_control_line(stripped) {
            let indent = line.len() - line.trim_start().len();
            while context_stack
                .last()
                .is_some_and(|(rec, _)| *rec >= indent)
            {
                context_stack.pop();
            }
            context_stack.push((indent, control_label(stripped)));
        }

        if let Some(caps) = RE_RETURN.captures(line) {
            let expression = caps[1].trim().trim_end_matches(';').trim().to_string();
            let (is_constant, value) = match value::parse_literal(&expression) {
                Some(v) => (true, Some(v)),
                None => (false, None),
            };
            statements.push(ReturnStatement {
                expression,
                line: line_no,
                condition_context: join_context(
                    context_stack.iter().map(|(_, l)| l.as_str()),
                ),
                is_constant,
                value,
            });
        }
    }

    statements
}

fn is_control_line(stripped: &str) -> bool {
    // Tolerate brace styles like `} else if (...) {`
    let rest = stripped.trim_start_matches('}').trim_start();
    let first = rest
        .split(|c: char| !c.is_alphanumeric() && c != '_')
        .next()
        .unwrap_or("");
    matches!(
        first,
        "if" | "else" | "switch" | "case" | "default" | "for" | "while" | "do"
    )
}

fn control_label(stripped: &str) -> String {
    if let Some(caps) = RE_IF.captures(stripped) {
        return format!("if({})", &caps[2]);
    }
    if let Some(caps) = RE_SWITCH.captures(stripped) {
        return format!("switch({})", &caps[1]);
    }
    if let Some(caps) = RE_CASE.captures(stripped) {
        return format!("case {}", &caps[1]);
    }
    if stripped.contains("default:") {
        return "default".to_string();
    }
    if stripped.contains("else") {
        return "else".to_string();
    }
    if stripped.starts_with("for") {
        return "for".to_string();
    }
    if let Some(caps) = RE_WHILE.captures(stripped) {
        return format!("while({})", &caps[1]);
    }
    stripped
        .split_whitespace()
        .next()
        .unwrap_or("")
        .to_string()
}

fn join_context<'a>(labels: impl Iterator<Item = &'a str>) -> String {
    let parts: Vec<&str> = labels.collect();
    if parts.is_empty() {
        TOP_CONTEXT.to_string()
    } else {
        parts.join(CONTEXT_SEP)
    }
}

// --- tree-based extraction ---

fn extract_from_tree(func: &CFunction) -> Vec<ReturnStatement> {
    let mut statements = Vec::new();
    let mut context = Vec::new();
    walk_stmts(&func.body, &mut context, &mut statements);
    statements
}

fn walk_stmts(stmts: &[Stmt], context: &mut Vec<String>, out: &mut Vec<ReturnStatement>) {
    for stmt in stmts {
        walk_stmt(stmt, context, out);
    }
}

fn walk_stmt(stmt: &Stmt, context: &mut Vec<String>, out: &mut Vec<ReturnStatement>) {
    match stmt {
        Stmt::Return { value, span } => {
            if let Some(expr) = value {
                let expression = expr.to_c_text();
                let value = value::from_expr(expr).filter(|v| v.is_numeric());
                out.push(ReturnStatement {
                    is_constant: value.is_some(),
                    expression,
                    line: span.start_line,
                    condition_context: join_context(context.iter().map(|s| s.as_str())),
                    value,
                });
            }
        }
        Stmt::If {
            condition,
            then_branch,
            else_branch,
            ..
        } => {
            context.push(format!("if({})", strip_parens(&condition.to_c_text())));
            walk_stmts(then_branch, context, out);
            context.pop();
            if let Some(else_stmts) = else_branch {
                context.push("else".to_string());
                walk_stmts(else_stmts, context, out);
                context.pop();
            }
        }
        Stmt::Switch {
            scrutinee, cases, ..
        } => {
            context.push(format!("switch({})", strip_parens(&scrutinee.to_c_text())));
            for case in cases {
                let label = match &case.label {
                    CaseLabel::Value(expr) => format!("case {}", expr.to_c_text()),
                    CaseLabel::Default => "default".to_string(),
                };
                context.push(label);
                walk_stmts(&case.body, context, out);
                context.pop();
            }
            context.pop();
        }
        Stmt::While {
            condition, body, ..
        } => {
            context.push(format!("while({})", strip_parens(&condition.to_c_text())));
            walk_stmts(body, context, out);
            context.pop();
        }
        Stmt::For { body, .. } => {
            context.push("for".to_string());
            walk_stmts(body, context, out);
            context.pop();
        }
        Stmt::Block { statements, .. } => walk_stmts(statements, context, out),
        _ => {}
    }
}

/// Drop one level of redundant outer parentheses from rendered text
pub(crate) fn strip_parens(text: &str) -> &str {
    let trimmed = text.trim();
    if trimmed.starts_with('(') && trimmed.ends_with(')') {
        let inner = &trimmed[1..trimmed.len() - 1];
        // Only when the outer pair actually matches
        let mut depth = 0i32;
        for (i, c) in inner.char_indices() {
            match c {
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth < 0 && i < inner.len() - 1 {
                        return trimmed;
                    }
                }
                _ => {}
            }
        }
        if depth == 0 {
            return inner.trim();
        }
    }
    trimmed
}

// --- expression feature extraction ---

fn extract_variables(expression: &str) -> BTreeSet<String> {
    let stripped = RE_CALL_STRIP.replace_all(expression, "");
    let stripped = RE_HEX_NUMBER.replace_all(&stripped, "");
    let stripped = RE_NUMBER.replace_all(&stripped, "");
    let stripped = RE_NONWORD.replace_all(&stripped, " ");

    stripped
        .split_whitespace()
        .filter(|w| w.chars().next().is_some_and(|c| c.is_alphabetic()))
        .filter(|w| !KEYWORDS.contains(w))
        .map(|w| w.to_string())
        .collect()
}

fn extract_operators(expression: &str) -> BTreeSet<String> {
    const OPERATORS: &[&str] = &[
        "+", "-", "*", "/", "%", "&", "|", "^", "~", "<<", ">>", "==", "!=", "<=", ">=", "<",
        ">", "&&", "||", "!",
    ];
    OPERATORS
        .iter()
        .filter(|op| expression.contains(**op))
        .map(|op| op.to_string())
        .collect()
}

// --- aggregation ---

fn value_counts(patterns: &[ReturnPattern]) -> BTreeMap<Value, usize> {
    let mut counts = BTreeMap::new();
    for pattern in patterns {
        if let Some(value) = &pattern.value {
            *counts.entry(value.clone()).or_insert(0) += 1;
        }
    }
    counts
}

fn kind_counts(patterns: &[ReturnPattern]) -> BTreeMap<ReturnKind, usize> {
    let mut counts = BTreeMap::new();
    for pattern in patterns {
        *counts.entry(pattern.kind).or_insert(0) += 1;
    }
    counts
}

fn find_default_value(
    patterns: &[ReturnPattern],
    distribution: &BTreeMap<Value, usize>,
) -> Option<Value> {
    // Last fallthrough or else-context return usually is the default
    for pattern in patterns.iter().rev() {
        if pattern.context == TOP_CONTEXT || pattern.context.contains("else") {
            if let Some(value) = &pattern.value {
                return Some(value.clone());
            }
        }
    }

    // Most frequent constant value; ties break toward the smaller value
    if !distribution.is_empty() {
        return distribution
            .iter()
            .max_by(|(va, na), (vb, nb)| na.cmp(nb).then(vb.cmp(va)))
            .map(|(v, _)| v.clone());
    }

    // First conventional error value
    for pattern in patterns {
        if let Some(value) = &pattern.value {
            if is_error_value(value) {
                return Some(value.clone());
            }
        }
    }

    if patterns.is_empty() {
        None
    } else {
        Some(Value::Int(0))
    }
}

fn find_common_values(distribution: &BTreeMap<Value, usize>) -> Vec<Value> {
    let mut sorted: Vec<(&Value, &usize)> = distribution.iter().collect();
    sorted.sort_by(|(va, na), (vb, nb)| nb.cmp(na).then(va.cmp(vb)));

    let distinct = sorted.len();
    sorted
        .into_iter()
        .take(3)
        .filter(|(_, n)| **n >= 2 || distinct <= 3)
        .map(|(v, _)| v.clone())
        .collect()
}

fn detect_error_handling(patterns: &[ReturnPattern]) -> bool {
    const ERROR_CUES: &[&str] = &["error", "fail", "null", "!", "=="];

    for pattern in patterns {
        if let Some(value) = &pattern.value {
            if is_error_value(value) {
                let context = pattern.context.to_lowercase();
                if ERROR_CUES.iter().any(|cue| context.contains(cue)) {
                    return true;
                }
            }
        }
    }

    let values: BTreeSet<&Value> = patterns.iter().filter_map(|p| p.value.as_ref()).collect();
    values.len() > 1 && values.iter().copied().any(is_error_value)
}

fn estimate_return_type(
    patterns: &[ReturnPattern],
    distribution: &BTreeMap<Value, usize>,
) -> String {
    let values: Vec<&Value> = distribution.keys().collect();

    if !values.is_empty() && values.iter().all(|v| matches!(v, Value::Int(_))) {
        if values.iter().all(|v| matches!(v, Value::Int(0) | Value::Int(1))) {
            return "bool".to_string();
        }
        if values.iter().any(|v| matches!(v, Value::Int(i) if *i < 0)) {
            return "int (error code)".to_string();
        }
        return "int".to_string();
    }

    if patterns.iter().any(|p| p.kind == ReturnKind::Pointer) {
        return "pointer".to_string();
    }
    if values.iter().any(|v| matches!(v, Value::Float(_))) {
        return "float/double".to_string();
    }
    if patterns.iter().any(|p| p.kind == ReturnKind::StructMember) {
        return "struct/union".to_string();
    }

    "unknown".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_classify_constant() {
        let pattern = classify_return("42", TOP_CONTEXT, 1);
        assert_eq!(pattern.kind, ReturnKind::Constant);
        assert_eq!(pattern.value, Some(Value::Int(42)));
        assert_eq!(pattern.complexity, 0);
    }

    #[test]
    fn test_classify_null_alias_constant() {
        let pattern = classify_return("NULL", TOP_CONTEXT, 1);
        assert_eq!(pattern.kind, ReturnKind::Constant);
        assert_eq!(pattern.value, Some(Value::Int(0)));
    }

    #[test]
    fn test_classify_variable() {
        let pattern = classify_return("result", TOP_CONTEXT, 1);
        assert_eq!(pattern.kind, ReturnKind::Variable);
        assert!(pattern.variables.contains("result"));
        assert!(pattern.operators.is_empty());
    }

    #[test]
    fn test_classify_expression_complexity() {
        let pattern = classify_return("a + b", TOP_CONTEXT, 1);
        assert_eq!(pattern.kind, ReturnKind::Expression);
        // one operator: +2
        assert_eq!(pattern.complexity, 2);
        assert_eq!(pattern.variables.len(), 2);
    }

    #[test]
    fn test_classify_function_call() {
        let pattern = classify_return("compute(x)", TOP_CONTEXT, 1);
        assert_eq!(pattern.kind, ReturnKind::FunctionCall);
        assert!(pattern.functions.contains("compute"));
        assert!(pattern.complexity >= 10);
    }

    #[test]
    fn test_classify_pointer_vs_multiplication() {
        assert_eq!(classify_return("*ptr", TOP_CONTEXT, 1).kind, ReturnKind::Pointer);
        assert_eq!(
            classify_return("a * b", TOP_CONTEXT, 1).kind,
            ReturnKind::Expression
        );
    }

    #[test]
    fn test_classify_member_not_float() {
        assert_eq!(
            classify_return("obj.field", TOP_CONTEXT, 1).kind,
            ReturnKind::StructMember
        );
        assert_eq!(
            classify_return("3.25", TOP_CONTEXT, 1).kind,
            ReturnKind::Constant
        );
    }

    #[test]
    fn test_classify_array_and_ternary() {
        assert_eq!(
            classify_return("buf[i]", TOP_CONTEXT, 1).kind,
            ReturnKind::ArrayElement
        );
        assert_eq!(
            classify_return("x > 0 ? 1 : 0", TOP_CONTEXT, 1).kind,
            ReturnKind::Conditional
        );
    }

    #[test]
    fn test_extract_from_text_contexts() {
        let body = "\
if (x > 10) {
    return 1;
} else {
    return 0;
}
";
        let returns = extract_from_text(body);
        assert_eq!(returns.len(), 2);
        assert_eq!(returns[0].condition_context, "if(x > 10)");
        assert_eq!(returns[0].value, Some(Value::Int(1)));
        assert_eq!(returns[1].condition_context, "else");
        assert_eq!(returns[1].value, Some(Value::Int(0)));
    }

    #[test]
    fn test_extract_nested_context_trail() {
        let body = "\
if (mode == 1) {
    if (ready) {
        return 100;
    }
}
return -1;
";
        let returns = extract_from_text(body);
        assert_eq!(returns.len(), 2);
        assert_eq!(
            returns[0].condition_context,
            "if(mode == 1) -> if(ready)"
        );
        assert_eq!(returns[1].condition_context, TOP_CONTEXT);
    }

    #[test]
    fn test_analyze_switch_distribution() {
        let body = "\
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
        let analysis = ReturnAnalyzer::new().analyze(&FunctionSource::Text(body.into()));
        let keys: Vec<&str> = analysis
            .value_distribution
            .keys()
            .map(|k| k.as_str())
            .collect();
        assert_eq!(keys, vec!["-1", "100", "200", "300"]);
        assert_eq!(analysis.default_value, Some(Value::Int(-1)));
    }

    #[test]
    fn test_estimate_bool_type() {
        let body = "if (ok) {\n    return 1;\n}\nreturn 0;\n";
        let analysis = ReturnAnalyzer::new().analyze(&FunctionSource::Text(body.into()));
        assert_eq!(analysis.estimated_return_type, "bool");
    }

    #[test]
    fn test_estimate_error_code_type() {
        let body = "if (bad) {\n    return -1;\n}\nreturn 5;\n";
        let analysis = ReturnAnalyzer::new().analyze(&FunctionSource::Text(body.into()));
        assert_eq!(analysis.estimated_return_type, "int (error code)");
        assert!(analysis.has_error_handling);
    }

    #[test]
    fn test_default_prefers_else_context() {
        let body = "\
if (x == 1) {
    return 7;
} else {
    return 9;
}
";
        let analysis = ReturnAnalyzer::new().analyze(&FunctionSource::Text(body.into()));
        assert_eq!(analysis.default_value, Some(Value::Int(9)));
    }

    #[test]
    fn test_empty_body_yields_empty_analysis() {
        let analysis = ReturnAnalyzer::new().analyze(&FunctionSource::Text(String::new()));
        assert!(analysis.patterns.is_empty());
        assert_eq!(analysis.default_value, None);
        assert_eq!(analysis.estimated_return_type, "unknown");
    }

    #[test]
    fn test_strip_parens() {
        assert_eq!(strip_parens("(x > 10)"), "x > 10");
        assert_eq!(strip_parens("x > 10"), "x > 10");
        assert_eq!(strip_parens("(a) && (b)"), "(a) && (b)");
    }
}
