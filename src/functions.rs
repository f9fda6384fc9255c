//! The function registry: pure(ish) functions over already-evaluated
//! collections.
//!
//! Functions are a closed enum; call sites resolve names through
//! [`Function::from_name`], so a dynamically built tree calling an
//! unregistered name fails with `UnknownFunction` at evaluation time.
//! Every function takes its arguments fully evaluated and returns a
//! fresh collection; none of them can fail. `now` is the one
//! intentionally non-deterministic member.

use std::collections::HashSet;

use chrono::Utc;

use crate::collection::Collection;
use crate::value::{Value, ValueType, parse_float_prefix};

/// The closed set of built-in functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    Union,
    Contains,
    Exists,
    Count,
    Not,
    And,
    Or,
    Add,
    Multiply,
    Concat,
    DateRange,
    Distance,
    Min,
    Max,
    Remove,
    Now,
}

impl Function {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "union" => Some(Function::Union),
            "contains" => Some(Function::Contains),
            "exists" => Some(Function::Exists),
            "count" => Some(Function::Count),
            "not" => Some(Function::Not),
            "and" => Some(Function::And),
            "or" => Some(Function::Or),
            "add" => Some(Function::Add),
            "multiply" => Some(Function::Multiply),
            "concat" => Some(Function::Concat),
            "date-range" => Some(Function::DateRange),
            "distance" => Some(Function::Distance),
            "min" => Some(Function::Min),
            "max" => Some(Function::Max),
            "remove" => Some(Function::Remove),
            "now" => Some(Function::Now),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Function::Union => "union",
            Function::Contains => "contains",
            Function::Exists => "exists",
            Function::Count => "count",
            Function::Not => "not",
            Function::And => "and",
            Function::Or => "or",
            Function::Add => "add",
            Function::Multiply => "multiply",
            Function::Concat => "concat",
            Function::DateRange => "date-range",
            Function::Distance => "distance",
            Function::Min => "min",
            Function::Max => "max",
            Function::Remove => "remove",
            Function::Now => "now",
        }
    }

    /// Apply the function to its evaluated arguments.
    pub fn apply(&self, args: &[Collection]) -> Collection {
        match self {
            Function::Union => union(args),
            Function::Contains => contains(args),
            Function::Exists => exists(args),
            Function::Count => count(args),
            Function::Not => not(args),
            Function::And => and(args),
            Function::Or => or(args),
            Function::Add => fold_numeric(args, 0.0, |acc, n| acc + n),
            Function::Multiply => fold_numeric(args, 1.0, |acc, n| acc * n),
            Function::Concat => concat(args),
            Function::DateRange => date_range(args),
            Function::Distance => distance(args),
            Function::Min => min_max(args, false),
            Function::Max => min_max(args, true),
            Function::Remove => remove(args),
            Function::Now => Collection::singleton(Value::Date(Utc::now()), ValueType::Date),
        }
    }
}

/// Set union of all non-empty arguments; the value type comes from the
/// first non-empty argument.
fn union(args: &[Collection]) -> Collection {
    let mut set = HashSet::new();
    let mut value_type = None;
    for arg in args {
        if arg.size() > 0 {
            value_type.get_or_insert(arg.value_type());
            set.extend(arg.iter().cloned());
        }
    }
    Collection::from_set(set, value_type.unwrap_or_default())
}

/// True iff the haystack is non-empty and every needle value is a member
/// of it.
fn contains(args: &[Collection]) -> Collection {
    let haystack = args.first();
    let mut result = haystack.is_some_and(|h| h.size() > 0);
    if let (Some(haystack), Some(needles)) = (haystack, args.get(1)) {
        let set = haystack.to_set();
        needles.for_each_value(|v| {
            if !set.contains(v) {
                result = false;
                true
            } else {
                false
            }
        });
    }
    Collection::singleton(Value::Boolean(result), ValueType::Boolean)
}

fn exists(args: &[Collection]) -> Collection {
    let present = args.first().is_some_and(|a| a.size() > 0);
    Collection::singleton(Value::Boolean(present), ValueType::Boolean)
}

fn count(args: &[Collection]) -> Collection {
    let n = args.first().map(|a| a.size()).unwrap_or(0);
    Collection::singleton(Value::Number(n as f64), ValueType::Number)
}

/// The boolean functions test membership of the literal `true` value.
fn holds(arg: &Collection) -> bool {
    arg.contains(&Value::Boolean(true))
}

fn not(args: &[Collection]) -> Collection {
    let r = !args.first().is_some_and(holds);
    Collection::singleton(Value::Boolean(r), ValueType::Boolean)
}

fn and(args: &[Collection]) -> Collection {
    let mut r = true;
    for arg in args {
        if !r {
            break;
        }
        r = holds(arg);
    }
    Collection::singleton(Value::Boolean(r), ValueType::Boolean)
}

fn or(args: &[Collection]) -> Collection {
    let mut r = false;
    for arg in args {
        if r {
            break;
        }
        r = holds(arg);
    }
    Collection::singleton(Value::Boolean(r), ValueType::Boolean)
}

/// Fold every value of every argument with permissive numeric coercion.
/// Number values enter the fold as-is (NaN included); other values are
/// parsed and silently skipped when unparsable.
fn fold_numeric(args: &[Collection], identity: f64, f: impl Fn(f64, f64) -> f64) -> Collection {
    let mut acc = identity;
    for arg in args {
        for v in arg.iter() {
            match v {
                Value::Number(n) => acc = f(acc, *n),
                other => {
                    let n = other.to_number();
                    if !n.is_nan() {
                        acc = f(acc, n);
                    }
                }
            }
        }
    }
    Collection::singleton(Value::Number(acc), ValueType::Number)
}

/// Stringify and join every value across every argument, no separator.
/// Arguments are visited left to right; within an argument the values
/// come in backing order, which for a set backing is unspecified. This
/// is a documented limitation of the function's contract.
fn concat(args: &[Collection]) -> Collection {
    let mut out = String::new();
    for arg in args {
        for v in arg.iter() {
            out.push_str(&v.to_string());
        }
    }
    Collection::singleton(Value::Text(out), ValueType::Text)
}

/// Millisecond lengths of the gregorian units accepted by `date-range`.
fn unit_millis(unit: &str) -> Option<f64> {
    const DAY: f64 = 24.0 * 60.0 * 60.0 * 1000.0;
    match unit.to_ascii_lowercase().as_str() {
        "millisecond" => Some(1.0),
        "second" => Some(1000.0),
        "minute" => Some(60.0 * 1000.0),
        "hour" => Some(60.0 * 60.0 * 1000.0),
        "day" => Some(DAY),
        "week" => Some(7.0 * DAY),
        "month" => Some(30.0 * DAY),
        "year" => Some(365.0 * DAY),
        "decade" => Some(10.0 * 365.0 * DAY),
        "century" => Some(100.0 * 365.0 * DAY),
        "millennium" => Some(1000.0 * 365.0 * DAY),
        _ => None,
    }
}

/// `date-range(from, to, unit)`: minimum of the parsed `from` values,
/// maximum of the parsed `to` values, elapsed time divided by the unit
/// length and rounded. The unit defaults to "day"; an unrecognized unit
/// leaves the range in milliseconds. A non-finite range yields an empty
/// result.
fn date_range(args: &[Collection]) -> Collection {
    let mut from = f64::INFINITY;
    if let Some(arg) = args.first() {
        for v in arg.iter() {
            from = from.min(v.date_millis());
        }
    }

    let mut to = f64::NEG_INFINITY;
    if let Some(arg) = args.get(1) {
        for v in arg.iter() {
            to = to.max(v.date_millis());
        }
    }

    let mut unit = "day".to_string();
    if let Some(arg) = args.get(2) {
        for v in arg.iter() {
            unit = v.to_string();
        }
    }

    let mut range = to - from;
    if !range.is_finite() {
        return Collection::empty(ValueType::Number);
    }
    if let Some(len) = unit_millis(&unit) {
        range = (range / len).round();
    }
    Collection::singleton(Value::Number(range), ValueType::Number)
}

/// Round to the nearest multiple of `precision`.
fn round_to(n: f64, precision: f64) -> f64 {
    if precision == 0.0 {
        return n;
    }
    (n / precision).round() * precision
}

/// Great-circle distance in meters between two latitude/longitude pairs
/// (haversine over a 6378137 m sphere).
fn haversine_meters(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    const RADIUS: f64 = 6_378_137.0;
    let (phi1, phi2) = (lat1.to_radians(), lat2.to_radians());
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lng2 - lng1).to_radians();
    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    2.0 * RADIUS * a.sqrt().atan2((1.0 - a).sqrt())
}

/// `distance(origo, lat, lng, unit, round)`: distance from an origin
/// expressed as a `"lat,lng"` text value to the given point. Multi-value
/// arguments collapse to their last value. Unknown units leave the
/// distance in meters; the result is rounded to a multiple of `round`
/// (default 1). Missing or unparsable coordinates yield an empty result.
fn distance(args: &[Collection]) -> Collection {
    fn last_value(args: &[Collection], index: usize) -> Option<Value> {
        args.get(index)?.iter().last().cloned()
    }

    let origo = match last_value(args, 0) {
        Some(v) => v.to_string(),
        None => return Collection::empty(ValueType::Number),
    };
    let mut parts = origo.splitn(2, ',');
    let lat1 = parse_float_prefix(parts.next().unwrap_or(""));
    let lng1 = parse_float_prefix(parts.next().unwrap_or(""));

    let lat2 = last_value(args, 1).map(|v| v.to_number()).unwrap_or(f64::NAN);
    let lng2 = last_value(args, 2).map(|v| v.to_number()).unwrap_or(f64::NAN);

    let mut range = haversine_meters(lat1, lng1, lat2, lng2);
    if !range.is_finite() {
        return Collection::empty(ValueType::Number);
    }

    if let Some(unit) = last_value(args, 3) {
        match unit.to_string().as_str() {
            "km" => range /= 1_000.0,
            "mile" => range /= 1_609.344,
            _ => {}
        }
    }
    let precision = last_value(args, 4).map(|v| v.to_number()).unwrap_or(1.0);
    let rounded = round_to(range, if precision.is_nan() { 1.0 } else { precision });
    Collection::singleton(Value::Number(rounded), ValueType::Number)
}

/// Comparison key used by `min`/`max`: each argument's values are parsed
/// with the parser implied by that argument's own declared value type.
/// Keys of different kinds never replace the current extremum.
#[derive(Debug, PartialEq)]
enum SortKey {
    Numeric(f64),
    Lexical(String),
}

impl SortKey {
    fn beats(&self, other: &SortKey, want_max: bool) -> bool {
        match (self, other) {
            (SortKey::Numeric(a), SortKey::Numeric(b)) => {
                if want_max { a > b } else { a < b }
            }
            (SortKey::Lexical(a), SortKey::Lexical(b)) => {
                if want_max { a > b } else { a < b }
            }
            _ => false,
        }
    }
}

fn parse_for_type(v: &Value, value_type: ValueType) -> (SortKey, Value) {
    match value_type {
        ValueType::Number => {
            let n = v.to_number();
            (SortKey::Numeric(n), Value::Number(n))
        }
        ValueType::Date => (SortKey::Numeric(v.date_millis()), v.clone()),
        _ => (SortKey::Lexical(v.to_string()), v.clone()),
    }
}

/// Scan every value of every argument, parsing each with its argument's
/// declared value type, and keep the extremum. The result's value type
/// follows the winning arguments and degrades to "text" when extrema came
/// from differently typed arguments. No values at all yields an empty
/// collection.
fn min_max(args: &[Collection], want_max: bool) -> Collection {
    let mut best: Option<(SortKey, Value)> = None;
    let mut value_type: Option<ValueType> = None;

    for arg in args {
        let arg_type = arg.value_type();
        for v in arg.iter() {
            let (key, parsed) = parse_for_type(v, arg_type);
            let replace = match &best {
                None => true,
                Some((current, _)) => key.beats(current, want_max),
            };
            if replace {
                best = Some((key, parsed));
                value_type = Some(match value_type {
                    None => arg_type,
                    Some(t) if t == arg_type => t,
                    Some(_) => ValueType::Text,
                });
            }
        }
    }

    let value_type = value_type.unwrap_or_default();
    match best {
        Some((_, v)) => Collection::singleton(v, value_type),
        None => Collection::empty(value_type),
    }
}

/// `remove(primary, r1, ..., rN)`: the primary argument's set minus the
/// union of all the others; the value type stays the primary's.
fn remove(args: &[Collection]) -> Collection {
    let Some(primary) = args.first() else {
        return Collection::empty(ValueType::Text);
    };
    let mut set = primary.to_set();
    for arg in &args[1..] {
        if arg.size() > 0 {
            for v in arg.iter() {
                set.remove(v);
            }
        }
    }
    Collection::from_set(set, primary.value_type())
}
