//! Small value types shared by items, actions and the resolve pipeline.
//!
//! `null` is a legitimate config value, so "nothing here" is never encoded as
//! `Value::Null`. Instead:
//!
//! - [`Resolved::Absent`]: nothing has been resolved yet (no mention, no seed).
//! - [`Resolved::NoValue`]: mentioned, but without a value (flags, `--opt`
//!   with an optional argument left out).
//! - [`ItemDefault::Omit`]: if nothing resolves, leave the key out of the
//!   output entirely.

use std::collections::BTreeSet;
use std::fmt;

use serde_json::Value;

/// The state of one accumulator, or the result of coercing one mention.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Resolved {
    #[default]
    Absent,
    NoValue,
    Value(Value),
}

/// The default of a config item.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ItemDefault {
    /// Resolves to `null` when never mentioned.
    #[default]
    Absent,
    /// Leaves the key out of the output when never mentioned.
    Omit,
    Value(Value),
}

impl ItemDefault {
    pub fn value(value: impl Into<Value>) -> Self {
        ItemDefault::Value(value.into())
    }

    /// The accumulator seed for this default. `Omit` seeds nothing, so the
    /// combine step never sees it.
    pub(crate) fn seed(&self) -> Resolved {
        match self {
            ItemDefault::Absent | ItemDefault::Omit => Resolved::Absent,
            ItemDefault::Value(v) => Resolved::Value(v.clone()),
        }
    }
}

/// How many raw values one mention of an item carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arity {
    /// Exactly one value, stored as a scalar.
    Single,
    /// Exactly `n` values (`n >= 1`), stored as a list.
    Fixed(usize),
    /// Zero or one value; a bare mention uses the item's `const`.
    ZeroOrOne,
    /// Any number of values, stored as a list.
    ZeroOrMore,
    /// At least one value, stored as a list.
    OneOrMore,
    /// No values at all (flags and counters).
    Zero,
}

impl Arity {
    /// True if a mention produces a list rather than a scalar.
    pub fn is_list(&self) -> bool {
        matches!(
            self,
            Arity::Fixed(_) | Arity::ZeroOrMore | Arity::OneOrMore
        )
    }

    /// True if a mention may carry no value.
    pub fn accepts_no_value(&self) -> bool {
        matches!(self, Arity::Zero | Arity::ZeroOrOne | Arity::ZeroOrMore)
    }

    pub(crate) fn expectation(&self) -> String {
        match self {
            Arity::Single | Arity::Fixed(1) => "1 value".into(),
            Arity::Fixed(n) => format!("{n} values"),
            Arity::ZeroOrOne => "up to 1 value".into(),
            Arity::ZeroOrMore => "any number of values".into(),
            Arity::OneOrMore => "1 or more values".into(),
            Arity::Zero => "no values".into(),
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Single => write!(f, "single"),
            Arity::Fixed(n) => write!(f, "{n}"),
            Arity::ZeroOrOne => write!(f, "?"),
            Arity::ZeroOrMore => write!(f, "*"),
            Arity::OneOrMore => write!(f, "+"),
            Arity::Zero => write!(f, "0"),
        }
    }
}

/// Which sources an item listens to, by source id.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SourceFilter {
    #[default]
    All,
    Include(BTreeSet<String>),
    Exclude(BTreeSet<String>),
}

impl SourceFilter {
    pub fn accepts(&self, source_id: &str) -> bool {
        match self {
            SourceFilter::All => true,
            SourceFilter::Include(ids) => ids.contains(source_id),
            SourceFilter::Exclude(ids) => !ids.contains(source_id),
        }
    }
}
