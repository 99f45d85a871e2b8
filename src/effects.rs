//! Branch effect extraction and per-function data tracking
//!
//! Walks a function tree recording what each branch of a conditional or
//! switch actually does: variable writes, function calls, and terminal
//! returns. One [`FunctionAnalysis`] is built per function and discarded
//! with it; nothing is shared across calls.

use crate::ast::{CaseLabel, CFunction, Expr, Stmt};
use crate::conditions::{AssertionKind, InferredExpectation, RETURN_TARGET};
use crate::value::{self, Value};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Everything known about one declared or parameter variable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct VariableInfo {
    pub name: String,
    /// Declared type, as written
    pub typ: String,
    pub is_global: bool,
    pub is_input: bool,
    pub is_output: bool,
    pub is_pointer: bool,
    /// Assignment events in source order: (line, extracted value)
    pub assignments: Vec<(usize, Option<Value>)>,
    /// Lines where the variable is read
    pub usages: Vec<usize>,
}

/// Observable effects of executing one branch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct BranchEffect {
    /// Condition text of the enclosing construct
    pub condition: String,
    /// Truth value this effect represents
    pub truth_value: bool,
    /// Source line of the construct
    pub line: usize,
    /// Variable name -> last value written inside the branch
    pub modified_variables: BTreeMap<String, Option<Value>>,
    /// Names of functions called inside the branch
    pub function_calls: BTreeSet<String>,
    /// Return value if the branch returns
    pub returns: Option<Value>,
}

/// One recorded call site
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CallSite {
    pub line: usize,
    /// Extracted argument descriptors, positionally
    pub args: Vec<Option<Value>>,
}

/// Data-flow summary for one variable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct VariableFlow {
    pub definitions: Vec<(usize, Option<Value>)>,
    pub usages: Vec<usize>,
    /// Assigned more than once
    pub is_modified: bool,
    pub last_value: Option<Value>,
}

/// Complete effect analysis of one function
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FunctionAnalysis {
    pub variables: BTreeMap<String, VariableInfo>,
    /// One effect per (conditional, truth value) and per switch case
    pub branch_effects: Vec<BranchEffect>,
    /// Function name -> call sites
    pub calls: BTreeMap<String, Vec<CallSite>>,
}

impl FunctionAnalysis {
    /// Data-flow view of one variable, if tracked
    pub fn variable_flow(&self, name: &str) -> Option<VariableFlow> {
        let info = self.variables.get(name)?;
        Some(VariableFlow {
            definitions: info.assignments.clone(),
            usages: info.usages.clone(),
            is_modified: info.assignments.len() > 1,
            last_value: info
                .assignments
                .last()
                .and_then(|(_, value)| value.clone()),
        })
    }
}

/// Branch/effect extractor
///
/// Construct one per function; the global-name set distinguishes global
/// mutation from local assignment.
#[derive(Debug, Default)]
pub struct EffectAnalyzer {
    globals: BTreeSet<String>,
}

impl EffectAnalyzer {
    pub fn new(globals: BTreeSet<String>) -> Self {
        Self { globals }
    }

    /// Analyze a whole function: variables, branch effects, call sites
    pub fn analyze_function(&self, func: &CFunction) -> FunctionAnalysis {
        let mut analysis = FunctionAnalysis::default();

        for param in &func.params {
            analysis.variables.insert(
                param.name.clone(),
                VariableInfo {
                    name: param.name.clone(),
                    typ: param.typ.clone(),
                    is_global: self.globals.contains(&param.name),
                    is_input: true,
                    is_output: false,
                    is_pointer: param.is_pointer(),
                    assignments: Vec::new(),
                    usages: Vec::new(),
                },
            );
        }

        self.walk(&func.body, &mut analysis);
        finalize_data_flow(&mut analysis);
        analysis
    }

    /// Effects of one branch of an `if`, or `None` when the requested
    /// branch does not exist.
    pub fn branch_effect(&self, stmt: &Stmt, truth_value: bool) -> Option<BranchEffect> {
        let Stmt::If {
            condition,
            then_branch,
            else_branch,
            span,
        } = stmt
        else {
            return None;
        };

        let branch: &[Stmt] = if truth_value {
            then_branch
        } else {
            else_branch.as_deref()?
        };

        let mut effect = BranchEffect {
            condition: condition.to_c_text(),
            truth_value,
            line: span.start_line,
            modified_variables: BTreeMap::new(),
            function_calls: BTreeSet::new(),
            returns: None,
        };
        collect_effects(branch, &mut effect);
        Some(effect)
    }

    /// Effects of one switch case, walking the labelled body and its
    /// fall-through successors until a `break`.
    ///
    /// `case` is `None` for the default label. Returns `None` when the
    /// label is absent.
    pub fn switch_effect(&self, stmt: &Stmt, case: Option<&Value>) -> Option<BranchEffect> {
        let Stmt::Switch {
            scrutinee,
            cases,
            span,
        } = stmt
        else {
            return None;
        };

        let start = cases.iter().position(|c| match (&c.label, case) {
            (CaseLabel::Default, None) => true,
            (CaseLabel::Value(expr), Some(value)) => {
                value::from_expr(expr).as_ref() == Some(value)
            }
            _ => false,
        })?;

        let label = match case {
            Some(value) => format!("case {}", value),
            None => "default".to_string(),
        };
        let mut effect = BranchEffect {
            condition: format!("switch({}) {}", scrutinee.to_c_text(), label),
            truth_value: true,
            line: span.start_line,
            modified_variables: BTreeMap::new(),
            function_calls: BTreeSet::new(),
            returns: None,
        };

        // Fall through into following cases until a break or a return
        for switch_case in &cases[start..] {
            collect_effects(&switch_case.body, &mut effect);
            if effect.returns.is_some() || body_breaks(&switch_case.body) {
                break;
            }
        }
        Some(effect)
    }

    /// Expectations implied by one branch effect: global writes and the
    /// terminal return value.
    pub fn expectations_from_effect(&self, effect: &BranchEffect) -> Vec<InferredExpectation> {
        let mut expectations = Vec::new();

        for (name, value) in &effect.modified_variables {
            if self.globals.contains(name) {
                if let Some(value) = value {
                    expectations.push(InferredExpectation::new(
                        name.as_str(),
                        Some(value.clone()),
                        AssertionKind::Equal,
                        0.85,
                        format!("assignment to global '{}'", name),
                    ));
                }
            }
        }

        if let Some(value) = &effect.returns {
            expectations.push(InferredExpectation::new(
                RETURN_TARGET,
                Some(value.clone()),
                AssertionKind::Equal,
                0.90,
                "function return value",
            ));
        }

        expectations
    }

    fn walk(&self, stmts: &[Stmt], analysis: &mut FunctionAnalysis) {
        for stmt in stmts {
            match stmt {
                Stmt::Decl {
                    name,
                    typ,
                    init,
                    span,
                } => {
                    analysis.variables.insert(
                        name.clone(),
                        VariableInfo {
                            name: name.clone(),
                            typ: typ.clone(),
                            is_global: self.globals.contains(name),
                            is_input: false,
                            is_output: false,
                            is_pointer: typ.contains('*'),
                            assignments: Vec::new(),
                            usages: Vec::new(),
                        },
                    );
                    if let Some(init) = init {
                        record_usages(init, span.start_line, analysis);
                        record_assignment(name, init, span.start_line, analysis);
                    }
                }

                Stmt::Assign {
                    target,
                    value,
                    span,
                } => {
                    record_usages(value, span.start_line, analysis);
                    if let Expr::Var { name, .. } = target {
                        record_assignment(name, value, span.start_line, analysis);
                    }
                }

                Stmt::Expr { expr, span } => {
                    record_usages(expr, span.start_line, analysis);
                    if let Expr::Call { function, args, .. } = expr {
                        let site = CallSite {
                            line: span.start_line,
                            args: args.iter().map(value::from_expr).collect(),
                        };
                        analysis.calls.entry(function.clone()).or_default().push(site);
                    }
                }

                Stmt::If {
                    condition, span, ..
                } => {
                    record_usages(condition, span.start_line, analysis);
                    if let Some(effect) = self.branch_effect(stmt, true) {
                        analysis.branch_effects.push(effect);
                    }
                    if let Some(effect) = self.branch_effect(stmt, false) {
                        analysis.branch_effects.push(effect);
                    }
                }

                Stmt::Switch {
                    scrutinee,
                    cases,
                    span,
                } => {
                    record_usages(scrutinee, span.start_line, analysis);
                    for case in cases {
                        let label = match &case.label {
                            CaseLabel::Value(expr) => value::from_expr(expr),
                            CaseLabel::Default => None,
                        };
                        if let Some(effect) = self.switch_effect(stmt, label.as_ref()) {
                            analysis.branch_effects.push(effect);
                        }
                    }
                }

                Stmt::Block { statements, .. } => self.walk(statements, analysis),

                // Loops and returns carry no branch-selected effects here
                _ => {}
            }
        }
    }
}

fn record_assignment(name: &str, value: &Expr, line: usize, analysis: &mut FunctionAnalysis) {
    if let Some(info) = analysis.variables.get_mut(name) {
        info.assignments.push((line, value::from_expr(value)));
        info.is_output = true;
    }
}

/// Record a read of every known variable referenced by the expression
fn record_usages(expr: &Expr, line: usize, analysis: &mut FunctionAnalysis) {
    let mut names = Vec::new();
    collect_var_names(expr, &mut names);
    for name in names {
        if let Some(info) = analysis.variables.get_mut(&name) {
            info.usages.push(line);
        }
    }
}

fn collect_var_names(expr: &Expr, out: &mut Vec<String>) {
    match expr {
        Expr::Var { name, .. } => out.push(name.clone()),
        Expr::Unary { operand, .. } => collect_var_names(operand, out),
        Expr::Binary { left, right, .. } => {
            collect_var_names(left, out);
            collect_var_names(right, out);
        }
        Expr::Call { args, .. } => {
            for arg in args {
                collect_var_names(arg, out);
            }
        }
        Expr::Member { object, .. } => collect_var_names(object, out),
        Expr::Index { object, index, .. } => {
            collect_var_names(object, out);
            collect_var_names(index, out);
        }
        Expr::Ternary {
            condition,
            then_expr,
            else_expr,
            ..
        } => {
            collect_var_names(condition, out);
            collect_var_names(then_expr, out);
            collect_var_names(else_expr, out);
        }
        _ => {}
    }
}

/// Collect effects from a statement list, recursing into plain blocks
/// but never into nested conditionals' own branches.
fn collect_effects(stmts: &[Stmt], effect: &mut BranchEffect) {
    for stmt in stmts {
        match stmt {
            Stmt::Assign { target, value, .. } => {
                if let Expr::Var { name, .. } = target {
                    // Last write wins, matching execution order
                    effect
                        .modified_variables
                        .insert(name.clone(), value::from_expr(value));
                }
            }
            Stmt::Expr { expr, .. } => {
                if let Expr::Call { function, .. } = expr {
                    effect.function_calls.insert(function.clone());
                }
            }
            Stmt::Return { value, .. } => {
                if let Some(expr) = value {
                    effect.returns = value::from_expr(expr);
                }
            }
            Stmt::Block { statements, .. } => collect_effects(statements, effect),
            _ => {}
        }
    }
}

fn body_breaks(stmts: &[Stmt]) -> bool {
    stmts.iter().any(|stmt| match stmt {
        Stmt::Break { .. } => true,
        Stmt::Block { statements, .. } => body_breaks(statements),
        _ => false,
    })
}

/// Mark inputs and outputs once all events are recorded
fn finalize_data_flow(analysis: &mut FunctionAnalysis) {
    for info in analysis.variables.values_mut() {
        if info.assignments.is_empty() && !info.usages.is_empty() {
            info.is_input = true;
        } else if !info.assignments.is_empty() && !info.is_global {
            info.is_output = true;
        }
    }
}
