//! Function tree types for C code under test
//!
//! A closed, language-specific tree that captures the control-flow and
//! effect structure of one C function. An external C parser populates
//! these types; cexpect itself never parses C source beyond the
//! line-oriented fallback in [`crate::returns`].

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Source location
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Span {
    pub start_line: usize,
    pub start_col: usize,
    pub end_line: usize,
    pub end_col: usize,
}

impl Span {
    /// Span covering a single line
    pub fn line(line: usize) -> Self {
        Span {
            start_line: line,
            start_col: 0,
            end_line: line,
            end_col: 0,
        }
    }
}

/// A C function definition supplied by the external parser
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CFunction {
    /// Function name
    pub name: String,

    /// Parameters
    pub params: Vec<Parameter>,

    /// Declared return type (as written, e.g. `int`, `char *`)
    pub return_type: Option<String>,

    /// Body statements
    pub body: Vec<Stmt>,

    /// Source location
    pub span: Span,
}

/// Function parameter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub typ: String,
}

impl Parameter {
    /// Whether the declared type is a pointer type
    pub fn is_pointer(&self) -> bool {
        self.typ.contains('*')
    }
}

/// The function under test, as a structured tree or as raw source text.
///
/// All analyses accept either form and fall back to line-oriented
/// extraction when no tree is available.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum FunctionSource {
    /// Structured tree from the external parser
    Tree(CFunction),
    /// Raw body text (everything between the function's braces)
    Text(String),
}

impl FunctionSource {
    /// Content hash of the function body, for cache keying by callers.
    ///
    /// cexpect itself performs no caching; every analysis recomputes
    /// from scratch.
    pub fn source_hash(&self) -> String {
        let mut hasher = Sha256::new();
        match self {
            FunctionSource::Text(text) => hasher.update(text.as_bytes()),
            FunctionSource::Tree(func) => {
                // Serialized form is deterministic for a given tree
                let json = serde_json::to_string(func).unwrap_or_default();
                hasher.update(json.as_bytes());
            }
        }
        format!("sha256:{}", hex::encode(&hasher.finalize()[..8]))
    }
}

/// Statement kinds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Stmt {
    /// Local declaration, optionally initialized
    Decl {
        name: String,
        typ: String,
        init: Option<Expr>,
        span: Span,
    },

    /// Simple assignment `target = value`
    Assign {
        target: Expr,
        value: Expr,
        span: Span,
    },

    /// Expression statement (typically a call)
    Expr { expr: Expr, span: Span },

    /// If statement with optional else branch
    If {
        condition: Expr,
        then_branch: Vec<Stmt>,
        else_branch: Option<Vec<Stmt>>,
        span: Span,
    },

    /// Switch statement
    Switch {
        scrutinee: Expr,
        cases: Vec<SwitchCase>,
        span: Span,
    },

    /// While loop
    While {
        condition: Expr,
        body: Vec<Stmt>,
        span: Span,
    },

    /// For loop (init/cond/step left to the parser; only the body matters here)
    For { body: Vec<Stmt>, span: Span },

    /// Return with optional expression
    Return { value: Option<Expr>, span: Span },

    /// Break (terminates a switch case)
    Break { span: Span },

    /// Nested compound block
    Block { statements: Vec<Stmt>, span: Span },

    /// Statement the parser could not classify
    Unknown { text: String, span: Span },
}

impl Stmt {
    /// Get the span of this statement
    pub fn span(&self) -> Span {
        match self {
            Stmt::Decl { span, .. } => *span,
            Stmt::Assign { span, .. } => *span,
            Stmt::Expr { span, .. } => *span,
            Stmt::If { span, .. } => *span,
            Stmt::Switch { span, .. } => *span,
            Stmt::While { span, .. } => *span,
            Stmt::For { span, .. } => *span,
            Stmt::Return { span, .. } => *span,
            Stmt::Break { span, .. } => *span,
            Stmt::Block { span, .. } => *span,
            Stmt::Unknown { span, .. } => *span,
        }
    }
}

/// One labelled arm of a switch statement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwitchCase {
    pub label: CaseLabel,
    /// Statements up to the next label; fall-through is the parser's
    /// responsibility to preserve, ours to walk.
    pub body: Vec<Stmt>,
    pub span: Span,
}

/// Case label
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CaseLabel {
    /// `case <expr>:`
    Value(Expr),
    /// `default:`
    Default,
}

/// Expression kinds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Expr {
    /// Integer literal (decimal or hex, already decoded)
    IntLit { value: i64, span: Span },

    /// Floating literal
    FloatLit { value: f64, span: Span },

    /// Character literal
    CharLit { value: char, span: Span },

    /// String literal
    StrLit { value: String, span: Span },

    /// Identifier reference
    Var { name: String, span: Span },

    /// Unary operation
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
        span: Span,
    },

    /// Binary operation
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
        span: Span,
    },

    /// Function call
    Call {
        function: String,
        args: Vec<Expr>,
        span: Span,
    },

    /// Member access, `obj.field` or `obj->field`
    Member {
        object: Box<Expr>,
        field: String,
        arrow: bool,
        span: Span,
    },

    /// Array index
    Index {
        object: Box<Expr>,
        index: Box<Expr>,
        span: Span,
    },

    /// Ternary conditional `c ? a : b`
    Ternary {
        condition: Box<Expr>,
        then_expr: Box<Expr>,
        else_expr: Box<Expr>,
        span: Span,
    },

    /// Expression the parser could not classify; carries raw text
    Unknown { text: String, span: Span },
}

impl Expr {
    /// Get the span of this expression
    pub fn span(&self) -> Span {
        match self {
            Expr::IntLit { span, .. } => *span,
            Expr::FloatLit { span, .. } => *span,
            Expr::CharLit { span, .. } => *span,
            Expr::StrLit { span, .. } => *span,
            Expr::Var { span, .. } => *span,
            Expr::Unary { span, .. } => *span,
            Expr::Binary { span, .. } => *span,
            Expr::Call { span, .. } => *span,
            Expr::Member { span, .. } => *span,
            Expr::Index { span, .. } => *span,
            Expr::Ternary { span, .. } => *span,
            Expr::Unknown { span, .. } => *span,
        }
    }

    /// Render the expression back to C-shaped text.
    ///
    /// Used for condition strings and justification messages. The output
    /// is normalized (parenthesized binaries), not a verbatim copy of the
    /// source.
    pub fn to_c_text(&self) -> String {
        match self {
            Expr::IntLit { value, .. } => value.to_string(),
            Expr::FloatLit { value, .. } => {
                let s = value.to_string();
                if s.contains('.') {
                    s
                } else {
                    format!("{}.0", s)
                }
            }
            Expr::CharLit { value, .. } => format!("'{}'", value),
            Expr::StrLit { value, .. } => format!("\"{}\"", value),
            Expr::Var { name, .. } => name.clone(),
            Expr::Unary { op, operand, .. } => format!("{}{}", op, operand.to_c_text()),
            Expr::Binary {
                op, left, right, ..
            } => format!("({} {} {})", left.to_c_text(), op, right.to_c_text()),
            Expr::Call { function, args, .. } => {
                let args_text: Vec<String> = args.iter().map(|a| a.to_c_text()).collect();
                format!("{}({})", function, args_text.join(", "))
            }
            Expr::Member {
                object,
                field,
                arrow,
                ..
            } => {
                let sep = if *arrow { "->" } else { "." };
                format!("{}{}{}", object.to_c_text(), sep, field)
            }
            Expr::Index { object, index, .. } => {
                format!("{}[{}]", object.to_c_text(), index.to_c_text())
            }
            Expr::Ternary {
                condition,
                then_expr,
                else_expr,
                ..
            } => format!(
                "({} ? {} : {})",
                condition.to_c_text(),
                then_expr.to_c_text(),
                else_expr.to_c_text()
            ),
            Expr::Unknown { text, .. } => text.clone(),
        }
    }
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,

    // Comparison
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,

    // Logical
    And,
    Or,

    // Bitwise
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
}

impl std::fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BinaryOp::Add => write!(f, "+"),
            BinaryOp::Sub => write!(f, "-"),
            BinaryOp::Mul => write!(f, "*"),
            BinaryOp::Div => write!(f, "/"),
            BinaryOp::Mod => write!(f, "%"),
            BinaryOp::Eq => write!(f, "=="),
            BinaryOp::Ne => write!(f, "!="),
            BinaryOp::Lt => write!(f, "<"),
            BinaryOp::Le => write!(f, "<="),
            BinaryOp::Gt => write!(f, ">"),
            BinaryOp::Ge => write!(f, ">="),
            BinaryOp::And => write!(f, "&&"),
            BinaryOp::Or => write!(f, "||"),
            BinaryOp::BitAnd => write!(f, "&"),
            BinaryOp::BitOr => write!(f, "|"),
            BinaryOp::BitXor => write!(f, "^"),
            BinaryOp::Shl => write!(f, "<<"),
            BinaryOp::Shr => write!(f, ">>"),
        }
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    Neg,
    Not,
    BitNot,
    Deref,
    AddrOf,
}

impl std::fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnaryOp::Neg => write!(f, "-"),
            UnaryOp::Not => write!(f, "!"),
            UnaryOp::BitNot => write!(f, "~"),
            UnaryOp::Deref => write!(f, "*"),
            UnaryOp::AddrOf => write!(f, "&"),
        }
    }
}

impl CFunction {
    /// Find a parameter by name
    pub fn get_param(&self, name: &str) -> Option<&Parameter> {
        self.params.iter().find(|p| p.name == name)
    }

    /// All parameter names
    pub fn param_names(&self) -> Vec<&str> {
        self.params.iter().map(|p| p.name.as_str()).collect()
    }
}
