//! Item specifications.
//!
//! An [`ItemSpec`] describes one config item: its name, the output key it
//! resolves into, its action and arity, how raw values are coerced, which
//! values are allowed, its default, whether it is required, and which sources
//! it listens to. Specs are built once through [`ItemSpecBuilder`] and are
//! immutable afterwards, so one spec can serve any number of parses.

use std::collections::BTreeSet;

use serde_json::Value;

use crate::action::Action;
use crate::coerce::Coercer;
use crate::error::{LayerfigError, display_value};
use crate::types::{Arity, ItemDefault, SourceFilter};

/// Immutable description of one config item.
#[derive(Debug, Clone)]
pub struct ItemSpec {
    name: String,
    dest: String,
    action: Action,
    arity: Arity,
    coercer: Coercer,
    choices: Option<Vec<Value>>,
    default: Option<ItemDefault>,
    required: bool,
    constant: Option<Value>,
    source_filter: SourceFilter,
    help: Option<String>,
}

impl ItemSpec {
    pub fn builder(name: &str) -> ItemSpecBuilder {
        ItemSpecBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The output key. Defaults to the name.
    pub fn dest(&self) -> &str {
        &self.dest
    }

    pub fn action(&self) -> &Action {
        &self.action
    }

    pub fn arity(&self) -> Arity {
        self.arity
    }

    pub fn coercer(&self) -> &Coercer {
        &self.coercer
    }

    pub fn choices(&self) -> Option<&[Value]> {
        self.choices.as_deref()
    }

    /// The default set on the item itself, if any.
    pub fn default(&self) -> Option<&ItemDefault> {
        self.default.as_ref()
    }

    pub fn required(&self) -> bool {
        self.required
    }

    pub fn constant(&self) -> Option<&Value> {
        self.constant.as_ref()
    }

    pub fn source_filter(&self) -> &SourceFilter {
        &self.source_filter
    }

    pub fn help(&self) -> Option<&str> {
        self.help.as_deref()
    }

    pub fn accepts_source(&self, source_id: &str) -> bool {
        self.source_filter.accepts(source_id)
    }

    /// The default used for a parse: the item's own default, else the
    /// parser-wide default, else whatever the action implies.
    pub fn effective_default(&self, parser_default: Option<&ItemDefault>) -> ItemDefault {
        self.default
            .clone()
            .or_else(|| parser_default.cloned())
            .unwrap_or_else(|| self.action.implied_default())
    }

    pub(crate) fn const_or_null(&self) -> Value {
        self.constant.clone().unwrap_or(Value::Null)
    }

    pub(crate) fn check_choice(&self, value: &Value) -> Result<(), LayerfigError> {
        match &self.choices {
            Some(choices) if !choices.contains(value) => Err(LayerfigError::InvalidChoice {
                item: self.name.clone(),
                value: display_value(value),
                choices: choices
                    .iter()
                    .map(display_value)
                    .collect::<Vec<_>>()
                    .join(","),
            }),
            _ => Ok(()),
        }
    }
}

/// Builder for [`ItemSpec`]. All checks happen in [`build`](Self::build).
pub struct ItemSpecBuilder {
    name: String,
    dest: Option<String>,
    action: Action,
    arity: Option<Arity>,
    coercer: Option<Coercer>,
    choices: Option<Vec<Value>>,
    default: Option<ItemDefault>,
    required: Option<bool>,
    constant: Option<Value>,
    include_sources: Option<BTreeSet<String>>,
    exclude_sources: Option<BTreeSet<String>>,
    help: Option<String>,
}

impl ItemSpecBuilder {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            dest: None,
            action: Action::Store,
            arity: None,
            coercer: None,
            choices: None,
            default: None,
            required: None,
            constant: None,
            include_sources: None,
            exclude_sources: None,
            help: None,
        }
    }

    /// Output key (default: the item name). Several items may share one.
    pub fn dest(mut self, dest: &str) -> Self {
        self.dest = Some(dest.to_string());
        self
    }

    /// Set the action (default: [`Action::Store`]).
    pub fn action(mut self, action: Action) -> Self {
        self.action = action;
        self
    }

    /// Set the arity. Defaults depend on the action: `Single` for store and
    /// append, `OneOrMore` for extend, `Zero` for the flag-style actions.
    pub fn arity(mut self, arity: Arity) -> Self {
        self.arity = Some(arity);
        self
    }

    /// Set the coercion applied to each raw value (default: [`crate::coerce::string`]).
    pub fn coerce(mut self, coercer: Coercer) -> Self {
        self.coercer = Some(coercer);
        self
    }

    pub fn coerce_with<F>(self, name: &'static str, func: F) -> Self
    where
        F: Fn(&Value) -> Result<Value, String> + Send + Sync + 'static,
    {
        self.coerce(Coercer::new(name, func))
    }

    /// Restrict coerced values to this set.
    pub fn choices<I, V>(mut self, choices: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.choices = Some(choices.into_iter().map(Into::into).collect());
        self
    }

    /// Set a default value. For append/extend it must be a list, for count
    /// an integer.
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(ItemDefault::Value(value.into()));
        self
    }

    /// Leave the key out of the output when the item is never mentioned.
    pub fn omit(mut self) -> Self {
        self.default = Some(ItemDefault::Omit);
        self
    }

    /// Set the default as an [`ItemDefault`]. An explicit
    /// `ItemDefault::Absent` keeps the parser-wide default off this item.
    pub fn default_value(mut self, default: ItemDefault) -> Self {
        self.default = Some(default);
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = Some(required);
        self
    }

    /// The value used for bare mentions: mandatory for store_const, and only
    /// allowed with `Arity::ZeroOrOne` for store, append and extend.
    pub fn constant(mut self, value: impl Into<Value>) -> Self {
        self.constant = Some(value.into());
        self
    }

    /// Only listen to these source ids.
    pub fn include_sources<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.include_sources = Some(ids.into_iter().map(Into::into).collect());
        self
    }

    /// Ignore these source ids.
    pub fn exclude_sources<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude_sources = Some(ids.into_iter().map(Into::into).collect());
        self
    }

    pub fn help(mut self, help: &str) -> Self {
        self.help = Some(help.to_string());
        self
    }

    /// Validate the configuration and produce the spec.
    pub fn build(self) -> Result<ItemSpec, LayerfigError> {
        let name = self.name.clone();
        let invalid = |reason: String| LayerfigError::InvalidItem {
            item: name.clone(),
            reason,
        };
        let tag = self.action.tag().to_string();

        if !is_identifier(&self.name) {
            return Err(invalid("name must be a valid identifier".into()));
        }
        let dest = self.dest.unwrap_or_else(|| self.name.clone());
        if !is_identifier(&dest) {
            return Err(invalid(format!("dest '{dest}' must be a valid identifier")));
        }

        let source_filter = match (self.include_sources, self.exclude_sources) {
            (Some(_), Some(_)) => {
                return Err(invalid(
                    "cannot set both include_sources and exclude_sources".into(),
                ));
            }
            (Some(ids), None) => SourceFilter::Include(ids),
            (None, Some(ids)) => SourceFilter::Exclude(ids),
            (None, None) => SourceFilter::All,
        };

        if self.required == Some(true)
            && matches!(
                self.action,
                Action::StoreConst | Action::StoreTrue | Action::StoreFalse
            )
        {
            return Err(invalid(format!("the {tag} action cannot be required")));
        }

        let arity = if self.action.takes_no_values() {
            if matches!(self.arity, Some(a) if a != Arity::Zero) {
                return Err(invalid(format!("arity cannot be set for the {tag} action")));
            }
            if self.choices.is_some() {
                return Err(invalid(format!("choices cannot be set for the {tag} action")));
            }
            if self.coercer.is_some() {
                return Err(invalid(format!("a coercion cannot be set for the {tag} action")));
            }
            Arity::Zero
        } else {
            self.arity.unwrap_or_else(|| self.action.default_arity())
        };

        if arity == Arity::Fixed(0) {
            return Err(invalid("a fixed arity must be at least 1; use Arity::Zero".into()));
        }

        match &self.action {
            Action::Store | Action::Append | Action::Extend => {
                if arity == Arity::Zero {
                    return Err(invalid(format!("arity 0 is not valid for the {tag} action")));
                }
                if self.constant.is_some() && arity != Arity::ZeroOrOne {
                    return Err(invalid(format!(
                        "const cannot be supplied to the {tag} action unless arity is ZeroOrOne"
                    )));
                }
            }
            Action::StoreConst => {
                if self.constant.is_none() {
                    return Err(invalid("the store_const action requires a const".into()));
                }
            }
            Action::StoreTrue | Action::StoreFalse | Action::Count => {
                if self.constant.is_some() {
                    return Err(invalid(format!("const cannot be supplied to the {tag} action")));
                }
            }
            Action::Custom(_) => {}
        }

        if let Some(ItemDefault::Value(default)) = &self.default {
            match &self.action {
                Action::Append | Action::Extend if !default.is_array() => {
                    return Err(invalid(format!("the default for the {tag} action must be a list")));
                }
                Action::Count if default.as_i64().is_none() => {
                    return Err(invalid("the default for the count action must be an integer".into()));
                }
                _ => {}
            }
        }

        let spec = ItemSpec {
            name: self.name,
            dest,
            action: self.action,
            arity,
            coercer: self.coercer.unwrap_or_default(),
            choices: self.choices,
            default: self.default,
            required: self.required.unwrap_or(false),
            constant: self.constant,
            source_filter,
            help: self.help,
        };

        if let Action::Custom(custom) = &spec.action {
            custom.check(&spec).map_err(invalid)?;
        }

        Ok(spec)
    }
}

/// `[A-Za-z_][A-Za-z0-9_]*`
fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
