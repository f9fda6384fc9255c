//! # facetql - Abstract Syntax Tree
//!
//! Nodes of the facet query language. An expression tree is built once,
//! either programmatically or by the [`crate::parser::Parser`], and then
//! evaluated any number of times against an [`crate::context::EvalContext`].
//!
//! ## Node kinds
//!
//! - **Constant**: a literal value with its declared value type
//! - **Control**: `if`, `foreach`, `filter`, `default`; receives its
//!   arguments *unevaluated* so it can short-circuit or loop
//! - **Function**: `union`, `count`, `max`, ...; arguments are evaluated
//!   eagerly, left to right, before dispatch
//! - **Operator**: a binary operator applied over the cartesian product
//!   of its two operand collections
//! - **Path**: a multi-hop graph traversal, see [`crate::path`]
//!
//! ## Example
//!
//! ```text
//! if(exists(.director), concat(.label, ' (', .director ! movie .label, ')'), .label)
//! ```

use crate::path::Path;
use crate::value::{Value, ValueType};

/// One node of an expression tree.
///
/// Controls are a closed enum resolved at parse time; function names stay
/// strings and resolve at evaluation time, so a dynamically built tree can
/// still fail with `UnknownFunction`.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// Literal value tagged with a declared value type.
    Constant { value: Value, value_type: ValueType },

    /// Control construct call; arguments are handed over unevaluated.
    Control { control: Control, args: Vec<Expression> },

    /// Function call by name; arguments are evaluated eagerly.
    Function { name: String, args: Vec<Expression> },

    /// Binary operator over the cartesian product of two collections.
    Operator {
        op: BinOp,
        left: Box<Expression>,
        right: Box<Expression>,
    },

    /// Graph path rooted at a context variable.
    Path(Path),
}

impl Expression {
    /// A number constant.
    pub fn number(n: f64) -> Self {
        Expression::Constant {
            value: Value::Number(n),
            value_type: ValueType::Number,
        }
    }

    /// A text constant.
    pub fn text(s: impl Into<String>) -> Self {
        Expression::Constant {
            value: Value::Text(s.into()),
            value_type: ValueType::Text,
        }
    }
}

/// The closed set of control constructs.
///
/// Referencing an unknown control name is a parse-time error; by the time
/// a tree exists, every control call is one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    /// `if(cond, then, else)`: evaluates only the selected branch.
    If,
    /// `foreach(coll, body)`: rebinds `value` per element.
    Foreach,
    /// `filter(coll, pred)`: keeps elements whose predicate yields `"true"`.
    Filter,
    /// `default(e1, ..., eN)`: first non-empty result.
    Default,
}

impl Control {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "if" => Some(Control::If),
            "foreach" => Some(Control::Foreach),
            "filter" => Some(Control::Filter),
            "default" => Some(Control::Default),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Control::If => "if",
            Control::Foreach => "foreach",
            Control::Filter => "filter",
            Control::Default => "default",
        }
    }
}

/// Binary operators.
///
/// Arithmetic and ordering operators coerce both operands with a
/// permissive float parse (unparsable operands become NaN and propagate);
/// equality operators compare strictly with no coercion. Both `<>` and
/// `><` parse to [`BinOp::NotEqual`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    // Arithmetic
    Add,
    Subtract,
    Multiply,
    Divide,

    // Equality (strict)
    Equal,
    NotEqual,

    // Ordering (numeric coercion)
    LessThan,
    GreaterThan,
    LessEqual,
    GreaterEqual,
}

impl BinOp {
    /// The fixed value type of this operator's results.
    pub fn result_type(&self) -> ValueType {
        match self {
            BinOp::Add | BinOp::Subtract | BinOp::Multiply | BinOp::Divide => ValueType::Number,
            _ => ValueType::Boolean,
        }
    }
}

/// Lexical tokens of the expression grammar, with the input offset at
/// which each one starts.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Number literal (digits with an optional fraction)
    Number(f64),

    /// Quoted string literal (single or double quotes)
    Str(String),

    /// Identifier: control name, function name, property id, or root name.
    ///
    /// The identifier character set is everything except `( ) , . ! @`
    /// and whitespace, which is what lets `date-range` be a plain name.
    Identifier(String),

    /// Binary operator
    Op(BinOp),

    /// Path hop operator: `.` / `!` with an optional `@` array marker
    Hop { forward: bool, is_array: bool },

    LParen,
    RParen,
    Comma,

    Eof,
}
