//! Type coercion for raw mention values.
//!
//! A [`Coercer`] turns one raw value (whatever a source produced: a string
//! from a command line, a typed value from a decoded map) into the item's
//! typed value, or rejects it with a reason. Coercers are shared between
//! parses and threads, so they must be pure.

use std::fmt;
use std::sync::Arc;

use serde_json::{Number, Value};

type CoerceFn = dyn Fn(&Value) -> Result<Value, String> + Send + Sync;

/// A named coercion function.
#[derive(Clone)]
pub struct Coercer {
    name: &'static str,
    func: Arc<CoerceFn>,
}

impl Coercer {
    /// Wrap a custom coercion function.
    pub fn new<F>(name: &'static str, func: F) -> Self
    where
        F: Fn(&Value) -> Result<Value, String> + Send + Sync + 'static,
    {
        Self {
            name,
            func: Arc::new(func),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn apply(&self, raw: &Value) -> Result<Value, String> {
        (self.func)(raw)
    }
}

impl fmt::Debug for Coercer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Coercer").field(&self.name).finish()
    }
}

impl Default for Coercer {
    fn default() -> Self {
        string()
    }
}

/// Strings pass through; numbers and booleans are rendered as strings.
pub fn string() -> Coercer {
    Coercer::new("string", |raw| match raw {
        Value::String(s) => Ok(Value::String(s.clone())),
        Value::Number(n) => Ok(Value::String(n.to_string())),
        Value::Bool(b) => Ok(Value::String(b.to_string())),
        other => Err(format!("expected a string, got {}", kind(other))),
    })
}

/// Integers, or strings that parse as integers.
pub fn integer() -> Coercer {
    Coercer::new("integer", |raw| match raw {
        Value::Number(n) if n.is_i64() || n.is_u64() => Ok(Value::Number(n.clone())),
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map(Value::from)
            .map_err(|e| format!("not an integer: {e}")),
        other => Err(format!("expected an integer, got {}", kind(other))),
    })
}

/// Numbers, or strings that parse as finite floats.
pub fn float() -> Coercer {
    Coercer::new("float", |raw| {
        let f = match raw {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        f.and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or_else(|| format!("expected a number, got {}", kind(raw)))
    })
}

/// Booleans, or the strings `true/false`, `yes/no`, `on/off`, `1/0`
/// (case-insensitive).
pub fn boolean() -> Coercer {
    Coercer::new("boolean", |raw| match raw {
        Value::Bool(b) => Ok(Value::Bool(*b)),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Ok(Value::Bool(true)),
            "false" | "no" | "off" | "0" => Ok(Value::Bool(false)),
            _ => Err(format!("not a boolean: '{s}'")),
        },
        other => Err(format!("expected a boolean, got {}", kind(other))),
    })
}

/// Accept any raw value unchanged.
pub fn identity() -> Coercer {
    Coercer::new("identity", |raw| Ok(raw.clone()))
}

/// Guess a type for string values: bool, then integer, then float, then
/// string. Non-string values pass through unchanged.
pub fn auto() -> Coercer {
    Coercer::new("auto", |raw| match raw {
        Value::String(s) => Ok(guess(s)),
        other => Ok(other.clone()),
    })
}

fn guess(s: &str) -> Value {
    if s.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if s.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }
    if let Ok(i) = s.parse::<i64>() {
        return Value::from(i);
    }
    // Require a dot so "NaN" and "inf" stay strings.
    if s.contains('.')
        && let Some(n) = s.parse::<f64>().ok().and_then(Number::from_f64)
    {
        return Value::Number(n);
    }
    Value::String(s.to_string())
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a table",
    }
}
