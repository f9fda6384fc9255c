//! Control constructs: `if`, `foreach`, `filter`, `default`.
//!
//! Unlike functions, controls receive their arguments *unevaluated* so
//! they can decide what to evaluate, in what order, and under what loop
//! bindings. The loop variable is bound by extending the context, never
//! by mutating it, so nested and reentrant loops compose freely.

use std::collections::HashSet;

use crate::ast::{Control, Expression};
use crate::collection::Collection;
use crate::context::EvalContext;
use crate::error::EvalError;
use crate::value::{Value, ValueType};

impl Control {
    /// Evaluate a control call. Arity is validated at parse time; a
    /// programmatically built call with missing arguments treats them as
    /// empty.
    pub fn evaluate(
        &self,
        args: &[Expression],
        ctx: &EvalContext,
    ) -> Result<Collection, EvalError> {
        match self {
            Control::If => eval_if(args, ctx),
            Control::Foreach => eval_foreach(args, ctx),
            Control::Filter => eval_filter(args, ctx),
            Control::Default => eval_default(args, ctx),
        }
    }
}

fn eval_arg(args: &[Expression], index: usize, ctx: &EvalContext) -> Result<Collection, EvalError> {
    match args.get(index) {
        Some(expr) => expr.evaluate(ctx),
        None => Ok(Collection::empty(ValueType::Text)),
    }
}

/// The condition is true iff any of its values is truthy; the scan stops
/// at the first truthy value. Only the selected branch is evaluated.
fn eval_if(args: &[Expression], ctx: &EvalContext) -> Result<Collection, EvalError> {
    let condition = eval_arg(args, 0, ctx)?;
    let truthy = condition.for_each_value(|v| v.is_truthy());
    if truthy {
        eval_arg(args, 1, ctx)
    } else {
        eval_arg(args, 2, ctx)
    }
}

/// Evaluate the source once, then the body once per element with `value`
/// bound, appending every produced value in order.
///
/// The output value type is taken from the last iteration's body alone,
/// not unioned across iterations. An empty source yields an empty "text"
/// collection.
fn eval_foreach(args: &[Expression], ctx: &EvalContext) -> Result<Collection, EvalError> {
    let source = eval_arg(args, 0, ctx)?;
    let mut values = Vec::new();
    let mut value_type = ValueType::Text;

    for v in source.iter() {
        let scope = ctx.with_value(v.clone(), source.value_type());
        let body = eval_arg(args, 1, &scope)?;
        value_type = body.value_type();
        values.extend(body.iter().cloned());
    }

    Ok(Collection::from_values(values, value_type))
}

/// Keep each source element whose predicate result is non-empty and
/// contains the literal string `"true"`, a string test rather than a
/// boolean
/// one. Output is set-backed with the source's value type.
fn eval_filter(args: &[Expression], ctx: &EvalContext) -> Result<Collection, EvalError> {
    let source = eval_arg(args, 0, ctx)?;
    let keep_marker = Value::Text("true".to_string());
    let mut kept = HashSet::new();

    for v in source.iter() {
        let scope = ctx.with_value(v.clone(), source.value_type());
        let verdict = eval_arg(args, 1, &scope)?;
        if verdict.size() > 0 && verdict.contains(&keep_marker) {
            kept.insert(v.clone());
        }
    }

    Ok(Collection::from_set(kept, source.value_type()))
}

/// The first argument whose result is non-empty; an empty "text"
/// collection when all are empty.
fn eval_default(args: &[Expression], ctx: &EvalContext) -> Result<Collection, EvalError> {
    for arg in args {
        let collection = arg.evaluate(ctx)?;
        if collection.size() > 0 {
            return Ok(collection);
        }
    }
    Ok(Collection::empty(ValueType::Text))
}
