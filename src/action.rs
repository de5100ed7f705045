//! Actions: what a mention does to an item's accumulated value.
//!
//! Every mention goes through two steps, in this order:
//!
//! 1. [`Action::validate_and_coerce`] checks the mention's raw arguments
//!    against the item's [`Arity`], runs the item's coercion on each value and
//!    checks the results against the item's choices.
//! 2. [`Action::combine`] folds the coerced value into the accumulator.
//!
//! The built-in actions fall into two families. `Store`, `StoreConst`,
//! `StoreTrue` and `StoreFalse` *replace*: the highest-priority mention wins
//! and the default only shows through when there are no mentions at all.
//! `Append`, `Extend` and `Count` *accumulate*: the default is the seed and
//! every mention adds to it, lowest priority first.
//!
//! User-defined actions implement [`CustomAction`] and are made available by
//! tag through an [`ActionRegistry`].

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::error::{LayerfigError, display_value};
use crate::mention::MentionArgs;
use crate::spec::ItemSpec;
use crate::types::{Arity, ItemDefault, Resolved};

/// A user-defined action.
///
/// Only [`combine`](CustomAction::combine) is mandatory; validation and
/// coercion default to the same arity/choices handling the built-in actions
/// use.
pub trait CustomAction: Send + Sync {
    /// The tag the action is registered under, e.g. `"store_upper"`.
    fn tag(&self) -> &str;

    /// Arity used when the item does not set one.
    fn default_arity(&self) -> Arity {
        Arity::Single
    }

    /// Reject item configurations this action cannot work with.
    fn check(&self, _item: &ItemSpec) -> Result<(), String> {
        Ok(())
    }

    fn validate_and_coerce(
        &self,
        item: &ItemSpec,
        args: &MentionArgs,
    ) -> Result<Resolved, LayerfigError> {
        coerce_args(item, args)
    }

    /// Fold `new` into `current`. `new` is never [`Resolved::Absent`].
    fn combine(
        &self,
        item: &ItemSpec,
        current: Resolved,
        new: Resolved,
    ) -> Result<Resolved, LayerfigError>;
}

/// The action bound to an item.
#[derive(Clone)]
pub enum Action {
    Store,
    StoreConst,
    StoreTrue,
    StoreFalse,
    Append,
    Extend,
    Count,
    Custom(Arc<dyn CustomAction>),
}

impl Action {
    pub fn custom(action: impl CustomAction + 'static) -> Self {
        Action::Custom(Arc::new(action))
    }

    pub fn tag(&self) -> &str {
        match self {
            Action::Store => "store",
            Action::StoreConst => "store_const",
            Action::StoreTrue => "store_true",
            Action::StoreFalse => "store_false",
            Action::Append => "append",
            Action::Extend => "extend",
            Action::Count => "count",
            Action::Custom(custom) => custom.tag(),
        }
    }

    fn builtins() -> [Action; 7] {
        [
            Action::Store,
            Action::StoreConst,
            Action::StoreTrue,
            Action::StoreFalse,
            Action::Append,
            Action::Extend,
            Action::Count,
        ]
    }

    pub(crate) fn default_arity(&self) -> Arity {
        match self {
            Action::Store | Action::Append => Arity::Single,
            Action::Extend => Arity::OneOrMore,
            Action::StoreConst | Action::StoreTrue | Action::StoreFalse | Action::Count => {
                Arity::Zero
            }
            Action::Custom(custom) => custom.default_arity(),
        }
    }

    /// Built-in actions whose mentions never carry values.
    pub(crate) fn takes_no_values(&self) -> bool {
        matches!(
            self,
            Action::StoreConst | Action::StoreTrue | Action::StoreFalse | Action::Count
        )
    }

    /// The default an item gets when neither it nor the parser sets one.
    pub(crate) fn implied_default(&self) -> ItemDefault {
        match self {
            Action::StoreTrue => ItemDefault::Value(Value::Bool(false)),
            Action::StoreFalse => ItemDefault::Value(Value::Bool(true)),
            _ => ItemDefault::Absent,
        }
    }

    pub fn validate_and_coerce(
        &self,
        item: &ItemSpec,
        args: &MentionArgs,
    ) -> Result<Resolved, LayerfigError> {
        match self {
            Action::Custom(custom) => custom.validate_and_coerce(item, args),
            _ => coerce_args(item, args),
        }
    }

    pub fn combine(
        &self,
        item: &ItemSpec,
        current: Resolved,
        new: Resolved,
    ) -> Result<Resolved, LayerfigError> {
        match self {
            Action::Store => Ok(match new {
                Resolved::NoValue if item.arity() == Arity::ZeroOrOne => {
                    Resolved::Value(item.const_or_null())
                }
                other => other,
            }),
            Action::StoreConst => Ok(Resolved::Value(item.const_or_null())),
            Action::StoreTrue => Ok(Resolved::Value(Value::Bool(true))),
            Action::StoreFalse => Ok(Resolved::Value(Value::Bool(false))),
            Action::Append => {
                let mut list = seed_list(item, current)?;
                list.push(element(item, new));
                Ok(Resolved::Value(Value::Array(list)))
            }
            Action::Extend => {
                let mut list = seed_list(item, current)?;
                match element(item, new) {
                    Value::Array(values) => list.extend(values),
                    other => list.push(other),
                }
                Ok(Resolved::Value(Value::Array(list)))
            }
            Action::Count => match current {
                Resolved::Absent | Resolved::NoValue => Ok(Resolved::Value(Value::from(1))),
                Resolved::Value(v) => match v.as_i64() {
                    Some(n) => n
                        .checked_add(1)
                        .map(|next| Resolved::Value(Value::from(next)))
                        .ok_or_else(|| LayerfigError::Accumulate {
                            item: item.name().into(),
                            reason: format!("count overflows past {n}"),
                        }),
                    None => Err(LayerfigError::Accumulate {
                        item: item.name().into(),
                        reason: format!("cannot count onto '{}'", display_value(&v)),
                    }),
                },
            },
            Action::Custom(custom) => custom.combine(item, current, new),
        }
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Custom(custom) => write!(f, "Custom({:?})", custom.tag()),
            builtin => write!(f, "{}", builtin.tag()),
        }
    }
}

impl PartialEq for Action {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Action::Custom(a), Action::Custom(b)) => a.tag() == b.tag(),
            (Action::Custom(_), _) | (_, Action::Custom(_)) => false,
            (a, b) => a.tag() == b.tag(),
        }
    }
}

/// The value an accumulating action adds for one mention.
fn element(item: &ItemSpec, new: Resolved) -> Value {
    match new {
        Resolved::Value(v) => v,
        Resolved::Absent | Resolved::NoValue => item.const_or_null(),
    }
}

/// The list an accumulating action appends to. Takes ownership so the seed
/// (a clone of the item's default) is extended in place.
fn seed_list(item: &ItemSpec, current: Resolved) -> Result<Vec<Value>, LayerfigError> {
    match current {
        Resolved::Absent | Resolved::NoValue => Ok(Vec::new()),
        Resolved::Value(Value::Array(values)) => Ok(values),
        Resolved::Value(other) => Err(LayerfigError::Accumulate {
            item: item.name().into(),
            reason: format!("expected a list to add to, found '{}'", display_value(&other)),
        }),
    }
}

/// Check a mention's arguments against the item's arity, then coerce and
/// validate each value.
///
/// Scalar arities (`Single`, `ZeroOrOne`) produce a scalar; list arities
/// produce a list. A bare mention, or an empty argument list, counts as "no
/// value" for `Zero` and `ZeroOrOne` and as an empty list for `ZeroOrMore`.
pub fn coerce_args(item: &ItemSpec, args: &MentionArgs) -> Result<Resolved, LayerfigError> {
    let values: &[Value] = match args {
        MentionArgs::NoValue => &[],
        MentionArgs::Values(values) => values,
    };

    match item.arity() {
        Arity::Zero => match values.first() {
            None => Ok(Resolved::NoValue),
            Some(value) => Err(LayerfigError::ZeroArityValue {
                item: item.name().into(),
                value: display_value(value),
            }),
        },
        Arity::ZeroOrOne if values.is_empty() => Ok(Resolved::NoValue),
        Arity::Single | Arity::ZeroOrOne => match values {
            [value] => Ok(Resolved::Value(coerce_one(item, value)?)),
            _ => Err(arity_error(item, values.len())),
        },
        Arity::Fixed(n) if values.len() != n => Err(arity_error(item, values.len())),
        Arity::OneOrMore if values.is_empty() => Err(arity_error(item, 0)),
        Arity::Fixed(_) | Arity::ZeroOrMore | Arity::OneOrMore => {
            let coerced = values
                .iter()
                .map(|value| coerce_one(item, value))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Resolved::Value(Value::Array(coerced)))
        }
    }
}

fn coerce_one(item: &ItemSpec, raw: &Value) -> Result<Value, LayerfigError> {
    let value = item
        .coercer()
        .apply(raw)
        .map_err(|reason| LayerfigError::Coercion {
            item: item.name().into(),
            value: display_value(raw),
            reason,
        })?;
    item.check_choice(&value)?;
    Ok(value)
}

fn arity_error(item: &ItemSpec, got: usize) -> LayerfigError {
    LayerfigError::Arity {
        item: item.name().into(),
        expected: item.arity().expectation(),
        got,
    }
}

/// Actions available by tag.
///
/// A fresh registry knows the built-in tags (`store`, `store_const`,
/// `store_true`, `store_false`, `append`, `extend`, `count`). Custom actions
/// are added with [`register`](Self::register). The registry is a plain value
/// owned by the parser; nothing is global.
#[derive(Debug, Clone)]
pub struct ActionRegistry {
    actions: BTreeMap<String, Action>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        let actions = Action::builtins()
            .into_iter()
            .map(|action| (action.tag().to_string(), action))
            .collect();
        Self { actions }
    }

    pub fn register(&mut self, action: impl CustomAction + 'static) -> Result<(), LayerfigError> {
        let tag = action.tag().to_string();
        if self.actions.contains_key(&tag) {
            return Err(LayerfigError::DuplicateAction(tag));
        }
        self.actions.insert(tag, Action::custom(action));
        Ok(())
    }

    pub fn get(&self, tag: &str) -> Result<Action, LayerfigError> {
        self.actions
            .get(tag)
            .cloned()
            .ok_or_else(|| LayerfigError::UnknownAction(tag.into()))
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.actions.keys().map(String::as_str)
    }
}

impl Default for ActionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
