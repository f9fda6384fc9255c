use std::fmt;
use std::hash::{Hash, Hasher};

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// A single value flowing through the facet query language.
///
/// The language is dynamically typed: a value carries its own concrete
/// variant, while the [`ValueType`] tag on a collection is informational
/// and never enforced.
///
/// # Equality
///
/// Equality is total so that values can live in hash sets: `Number`
/// compares by bit pattern, which makes NaN equal to itself. This is the
/// same behavior a `Set` gives NaN in the source language.
///
/// # Examples
///
/// ```
/// use facetql::Value;
///
/// let number = Value::Number(42.0);
/// assert_eq!(number.to_number(), 42.0);
/// assert_eq!(Value::Text("12.5kg".to_string()).to_number(), 12.5);
/// ```
#[derive(Debug, Clone)]
pub enum Value {
    /// Plain text
    Text(String),

    /// Floating-point number (NaN is a legal, propagated value)
    Number(f64),

    /// Boolean
    Boolean(bool),

    /// Point in time
    Date(DateTime<Utc>),

    /// Reference to an item in the database, by identifier
    Item(String),
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a.to_bits() == b.to_bits(),
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Date(a), Value::Date(b)) => a == b,
            (Value::Item(a), Value::Item(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Value::Text(s) => {
                state.write_u8(0);
                s.hash(state);
            }
            Value::Number(n) => {
                state.write_u8(1);
                state.write_u64(n.to_bits());
            }
            Value::Boolean(b) => {
                state.write_u8(2);
                b.hash(state);
            }
            Value::Date(d) => {
                state.write_u8(3);
                d.hash(state);
            }
            Value::Item(id) => {
                state.write_u8(4);
                id.hash(state);
            }
        }
    }
}

impl Value {
    /// Truthiness for conditions (the `if` control).
    ///
    /// False, zero, NaN, and empty text are falsy; dates are always truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Text(s) | Value::Item(s) => !s.is_empty(),
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::Boolean(b) => *b,
            Value::Date(_) => true,
        }
    }

    /// Permissive numeric coercion, used by arithmetic operators and the
    /// `add`/`multiply` folds.
    ///
    /// Numbers pass through unchanged (including NaN). Text and item
    /// identifiers parse a leading float prefix; everything that does not
    /// look like a number becomes NaN, never an error.
    pub fn to_number(&self) -> f64 {
        match self {
            Value::Number(n) => *n,
            Value::Text(s) | Value::Item(s) => parse_float_prefix(s),
            Value::Boolean(_) | Value::Date(_) => f64::NAN,
        }
    }

    /// Timestamp in milliseconds, for `date-range`.
    ///
    /// Dates answer their timestamp; text parses as ISO 8601; anything
    /// unparsable degrades to negative infinity rather than erroring.
    pub fn date_millis(&self) -> f64 {
        match self {
            Value::Date(d) => d.timestamp_millis() as f64,
            Value::Text(s) | Value::Item(s) => match parse_iso8601(s) {
                Some(d) => d.timestamp_millis() as f64,
                None => f64::NEG_INFINITY,
            },
            _ => f64::NEG_INFINITY,
        }
    }

    /// The natural [`ValueType`] tag for this value.
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Text(_) => ValueType::Text,
            Value::Number(_) => ValueType::Number,
            Value::Boolean(_) => ValueType::Boolean,
            Value::Date(_) => ValueType::Date,
            Value::Item(_) => ValueType::Item,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) | Value::Item(s) => f.write_str(s),
            Value::Number(n) => {
                // Whole floats print without a fraction, matching how the
                // language stringifies numbers for concat.
                if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{}", n)
                }
            }
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Date(d) => write!(f, "{}", d.to_rfc3339()),
        }
    }
}

/// Coarse element-type tag carried by collections and database properties.
///
/// Informational only: nothing validates that a collection's elements
/// actually match its tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ValueType {
    #[default]
    Text,
    Number,
    Boolean,
    Date,
    Item,
}

impl ValueType {
    /// The tag's label as it appears in data files and schemas.
    pub fn label(&self) -> &'static str {
        match self {
            ValueType::Text => "text",
            ValueType::Number => "number",
            ValueType::Boolean => "boolean",
            ValueType::Date => "date",
            ValueType::Item => "item",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "text" => Some(ValueType::Text),
            "number" => Some(ValueType::Number),
            "boolean" => Some(ValueType::Boolean),
            "date" => Some(ValueType::Date),
            "item" => Some(ValueType::Item),
            _ => None,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Parse a leading float prefix the way JavaScript's `parseFloat` does:
/// skip leading whitespace, accept an optional sign, digits, an optional
/// fraction, and an optional exponent. Returns NaN when no digits are
/// found.
pub fn parse_float_prefix(s: &str) -> f64 {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;
    let mut seen_digit = false;
    let mut seen_dot = false;

    if end < bytes.len() && (bytes[end] == b'+' || bytes[end] == b'-') {
        end += 1;
    }
    while end < bytes.len() {
        match bytes[end] {
            b'0'..=b'9' => {
                seen_digit = true;
                end += 1;
            }
            b'.' if !seen_dot => {
                seen_dot = true;
                end += 1;
            }
            _ => break,
        }
    }
    if !seen_digit {
        return f64::NAN;
    }

    // A trailing exponent only counts when complete ("1e" is just 1).
    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && (bytes[exp_end] == b'+' || bytes[exp_end] == b'-') {
            exp_end += 1;
        }
        let digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > digits_start {
            end = exp_end;
        }
    }

    s[..end].parse::<f64>().unwrap_or(f64::NAN)
}

/// Parse an ISO 8601 date or datetime. Tries RFC 3339 first, then a naive
/// datetime, then a plain date at midnight UTC.
pub fn parse_iso8601(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt.and_utc());
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d.and_hms_opt(0, 0, 0)?.and_utc());
    }
    None
}
