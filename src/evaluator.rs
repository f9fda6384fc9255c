//! Tree-walking evaluator.
//!
//! Evaluation is a pure function of the expression and the context; the
//! same tree can be evaluated concurrently against independent contexts.

use log::{debug, trace};

use crate::ast::{BinOp, Expression};
use crate::collection::Collection;
use crate::context::EvalContext;
use crate::error::EvalError;
use crate::functions::Function;
use crate::value::Value;

/// Evaluate an expression tree against a context.
pub fn evaluate(expr: &Expression, ctx: &EvalContext) -> Result<Collection, EvalError> {
    expr.evaluate(ctx)
}

impl Expression {
    pub fn evaluate(&self, ctx: &EvalContext) -> Result<Collection, EvalError> {
        match self {
            Expression::Constant { value, value_type } => {
                Ok(Collection::singleton(value.clone(), *value_type))
            }
            Expression::Control { control, args } => {
                trace!("control call: {}", control.name());
                control.evaluate(args, ctx)
            }
            Expression::Function { name, args } => {
                // Arguments evaluate before the registry lookup, so an
                // argument failure wins over an unknown function name.
                let mut evaluated = Vec::with_capacity(args.len());
                for arg in args {
                    evaluated.push(arg.evaluate(ctx)?);
                }
                let function = Function::from_name(name)
                    .ok_or_else(|| EvalError::UnknownFunction(name.clone()))?;
                trace!("function call: {} ({} args)", name, evaluated.len());
                Ok(function.apply(&evaluated))
            }
            Expression::Operator { op, left, right } => {
                let left = left.evaluate(ctx)?;
                let right = right.evaluate(ctx)?;
                debug!(
                    "operator {:?} over {}x{} values",
                    op,
                    left.size(),
                    right.size()
                );
                let mut values = Vec::with_capacity(left.size() * right.size());
                for a in left.iter() {
                    for b in right.iter() {
                        values.push(op.apply(a, b));
                    }
                }
                Ok(Collection::from_values(values, op.result_type()))
            }
            Expression::Path(path) => path.evaluate(ctx),
        }
    }
}

impl BinOp {
    /// Apply the operator to one pair of values.
    ///
    /// Arithmetic and ordering coerce both operands to numbers; NaN
    /// propagates through arithmetic and makes every ordering comparison
    /// false. Equality compares values strictly, with no coercion, so
    /// `"5" = 5` is false.
    pub fn apply(&self, a: &Value, b: &Value) -> Value {
        match self {
            BinOp::Add => Value::Number(a.to_number() + b.to_number()),
            BinOp::Subtract => Value::Number(a.to_number() - b.to_number()),
            BinOp::Multiply => Value::Number(a.to_number() * b.to_number()),
            BinOp::Divide => Value::Number(a.to_number() / b.to_number()),
            BinOp::Equal => Value::Boolean(a == b),
            BinOp::NotEqual => Value::Boolean(a != b),
            BinOp::LessThan => Value::Boolean(a.to_number() < b.to_number()),
            BinOp::GreaterThan => Value::Boolean(a.to_number() > b.to_number()),
            BinOp::LessEqual => Value::Boolean(a.to_number() <= b.to_number()),
            BinOp::GreaterEqual => Value::Boolean(a.to_number() >= b.to_number()),
        }
    }
}
