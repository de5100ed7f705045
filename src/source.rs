//! In-memory sources.
//!
//! - [`MapSource`] reads a key/value map (built directly, from any
//!   `Serialize` value, or from an already-decoded `toml::Table`) and emits one
//!   mention per key that names a config item.
//! - [`StaticSource`] replays a fixed list of mentions, for adapters that have
//!   already done their own scanning.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{LayerfigError, display_value};
use crate::mention::{Mention, MentionArgs, Source};
use crate::spec::ItemSpec;
use crate::types::Arity;

/// Emits one mention for each map key that matches an item name.
///
/// Values are mapped onto the item's arity:
///
/// - A value in `none_values` (default `[null]`) is a bare mention for
///   `Zero` and `ZeroOrOne` items, and an empty list for `ZeroOrMore` items.
///   Any other value for a `Zero` item is an error.
/// - For list arities a JSON array supplies the arguments; a bare scalar is
///   taken as a single argument.
/// - Everything else is a single raw value.
#[derive(Debug, Clone)]
pub struct MapSource {
    id: String,
    priority: i64,
    values: Map<String, Value>,
    none_values: Vec<Value>,
    strict: bool,
}

impl MapSource {
    pub const DEFAULT_ID: &'static str = "map";

    pub fn new<I, K>(values: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Self {
            id: Self::DEFAULT_ID.to_string(),
            priority: 0,
            values: values.into_iter().map(|(k, v)| (k.into(), v)).collect(),
            none_values: vec![Value::Null],
            strict: false,
        }
    }

    /// Build from any value that serializes to a map (a struct, a
    /// `HashMap`, a clap-derived args struct, ...). `null` entries, such as
    /// `Option::None` fields, are skipped.
    pub fn from_serialize<S: Serialize>(source: &S) -> Result<Self, LayerfigError> {
        let value = serde_json::to_value(source).map_err(|e| LayerfigError::Source {
            id: Self::DEFAULT_ID.into(),
            reason: format!("cannot serialize values: {e}"),
        })?;
        match value {
            Value::Object(map) => Ok(Self::new(
                map.into_iter().filter(|(_, value)| !value.is_null()),
            )),
            other => Err(LayerfigError::Source {
                id: Self::DEFAULT_ID.into(),
                reason: format!("expected a map of values, got '{}'", display_value(&other)),
            }),
        }
    }

    /// Build from a decoded TOML table. Datetimes become strings.
    pub fn from_toml(table: toml::Table) -> Self {
        Self::new(table.into_iter().map(|(k, v)| (k, toml_to_json(v))))
    }

    /// Source id used by item filters (default: `"map"`).
    pub fn with_id(mut self, id: &str) -> Self {
        self.id = id.to_string();
        self
    }

    /// Set the priority (default: `0`).
    pub fn with_priority(mut self, priority: i64) -> Self {
        self.priority = priority;
        self
    }

    /// Values that mean "mentioned without a value" (default: `[null]`).
    pub fn none_values<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.none_values = values.into_iter().map(Into::into).collect();
        self
    }

    /// Reject keys that match no item (default: `false`).
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    fn args_for(&self, item: &ItemSpec, value: &Value) -> Result<MentionArgs, LayerfigError> {
        let is_none = self.none_values.contains(value);
        let args = match item.arity() {
            Arity::Zero if is_none => MentionArgs::NoValue,
            Arity::Zero => {
                return Err(LayerfigError::ZeroArityValue {
                    item: item.name().into(),
                    value: display_value(value),
                });
            }
            Arity::ZeroOrOne if is_none => MentionArgs::NoValue,
            Arity::ZeroOrMore if is_none => MentionArgs::Values(vec![]),
            arity if arity.is_list() => match value {
                Value::Array(values) => MentionArgs::Values(values.clone()),
                other => MentionArgs::Values(vec![other.clone()]),
            },
            _ => MentionArgs::Values(vec![value.clone()]),
        };
        Ok(args)
    }
}

impl Source for MapSource {
    fn id(&self) -> &str {
        &self.id
    }

    fn priority(&self) -> i64 {
        self.priority
    }

    fn mentions(&self, items: &[ItemSpec]) -> Result<Vec<Mention>, LayerfigError> {
        if self.strict
            && let Some(key) = self
                .values
                .keys()
                .find(|key| !items.iter().any(|item| item.name() == key.as_str()))
        {
            return Err(LayerfigError::UnknownKey {
                key: key.clone(),
                id: self.id.clone(),
            });
        }

        let mut mentions = Vec::new();
        for item in items {
            let Some(value) = self.values.get(item.name()) else {
                continue;
            };
            mentions.push(Mention::new(item.name(), self.args_for(item, value)?));
        }
        Ok(mentions)
    }
}

fn toml_to_json(value: toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::from(i),
        toml::Value::Float(f) => Value::from(f),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(values) => Value::Array(values.into_iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => Value::Object(
            table
                .into_iter()
                .map(|(k, v)| (k, toml_to_json(v)))
                .collect(),
        ),
    }
}

/// Replays a fixed list of mentions.
#[derive(Debug, Clone)]
pub struct StaticSource {
    id: String,
    priority: i64,
    mentions: Vec<Mention>,
}

impl StaticSource {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            priority: 0,
            mentions: Vec::new(),
        }
    }

    pub fn with_priority(mut self, priority: i64) -> Self {
        self.priority = priority;
        self
    }

    pub fn mention(mut self, mention: Mention) -> Self {
        self.mentions.push(mention);
        self
    }

}

impl Source for StaticSource {
    fn id(&self) -> &str {
        &self.id
    }

    fn priority(&self) -> i64 {
        self.priority
    }

    fn mentions(&self, _items: &[ItemSpec]) -> Result<Vec<Mention>, LayerfigError> {
        Ok(self.mentions.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Action;
    use crate::fixtures::test::item;
    use serde_json::json;
    use std::collections::HashMap;

    fn map(pairs: &[(&str, Value)]) -> MapSource {
        MapSource::new(pairs.iter().map(|(k, v)| (k.to_string(), v.clone())))
    }

    fn items(specs: Vec<crate::spec::ItemSpecBuilder>) -> Vec<ItemSpec> {
        specs.into_iter().map(|b| b.build().unwrap()).collect()
    }

    #[test]
    fn one_mention_per_known_key_in_item_order() {
        let specs = items(vec![item("b"), item("a")]);
        let source = map(&[("a", json!("va")), ("b", json!("vb")), ("other", json!(1))]);
        let mentions = source.mentions(&specs).unwrap();
        assert_eq!(
            mentions,
            vec![
                Mention::new("b", MentionArgs::one("vb")),
                Mention::new("a", MentionArgs::one("va")),
            ]
        );
    }

    #[test]
    fn defaults() {
        let source = map(&[]);
        assert_eq!(source.id(), "map");
        assert_eq!(source.priority(), 0);
    }

    #[test]
    fn id_and_priority_configurable() {
        let source = map(&[]).with_id("overrides").with_priority(30);
        assert_eq!(source.id(), "overrides");
        assert_eq!(source.priority(), 30);
    }

    #[test]
    fn null_is_a_bare_mention_for_flags() {
        let specs = items(vec![item("v").action(Action::Count)]);
        let mentions = map(&[("v", Value::Null)]).mentions(&specs).unwrap();
        assert_eq!(mentions[0].args, MentionArgs::NoValue);
    }

    #[test]
    fn flag_with_value_is_rejected() {
        let specs = items(vec![item("v").action(Action::StoreTrue)]);
        let err = map(&[("v", json!("yes"))]).mentions(&specs).unwrap_err();
        assert!(matches!(err, LayerfigError::ZeroArityValue { .. }));
    }

    #[test]
    fn custom_none_values() {
        let specs = items(vec![item("c").arity(Arity::ZeroOrOne).constant("cv")]);
        let source = map(&[("c", json!("none_value"))]).none_values(["none_value"]);
        assert_eq!(source.mentions(&specs).unwrap()[0].args, MentionArgs::NoValue);
    }

    #[test]
    fn null_as_real_value_when_not_a_none_value() {
        let specs = items(vec![item("c").arity(Arity::ZeroOrOne)]);
        let source = map(&[("c", Value::Null)]).none_values(Vec::<Value>::new());
        assert_eq!(
            source.mentions(&specs).unwrap()[0].args,
            MentionArgs::Values(vec![Value::Null])
        );
    }

    #[test]
    fn zero_or_more_none_is_empty_list() {
        let specs = items(vec![item("c").arity(Arity::ZeroOrMore)]);
        let mentions = map(&[("c", Value::Null)]).mentions(&specs).unwrap();
        assert_eq!(mentions[0].args, MentionArgs::Values(vec![]));
    }

    #[test]
    fn list_arities_accept_bare_scalars() {
        let specs = items(vec![
            item("plus").arity(Arity::OneOrMore),
            item("pair").arity(Arity::Fixed(2)),
        ]);
        let source = map(&[("plus", json!("only")), ("pair", json!(["a", "b"]))]);
        let mentions = source.mentions(&specs).unwrap();
        assert_eq!(mentions[0].args, MentionArgs::one("only"));
        assert_eq!(mentions[1].args, MentionArgs::many(["a", "b"]));
    }

    #[test]
    fn single_arity_keeps_arrays_whole() {
        let specs = items(vec![item("c").coerce(crate::coerce::identity())]);
        let mentions = map(&[("c", json!([1, 2]))]).mentions(&specs).unwrap();
        assert_eq!(mentions[0].args, MentionArgs::Values(vec![json!([1, 2])]));
    }

    #[test]
    fn strict_rejects_unknown_keys() {
        let specs = items(vec![item("host")]);
        let source = map(&[("host", json!("x")), ("typo", json!(1))]).strict(true);
        match source.mentions(&specs).unwrap_err() {
            LayerfigError::UnknownKey { key, id } => {
                assert_eq!(key, "typo");
                assert_eq!(id, "map");
            }
            other => panic!("Expected UnknownKey, got: {other:?}"),
        }
    }

    #[test]
    fn lenient_ignores_unknown_keys() {
        let specs = items(vec![item("host")]);
        let source = map(&[("host", json!("x")), ("typo", json!(1))]);
        assert_eq!(source.mentions(&specs).unwrap().len(), 1);
    }

    #[derive(Serialize)]
    struct Args {
        host: Option<String>,
        port: Option<u16>,
        command: &'static str,
    }

    #[test]
    fn from_serialize_skips_none_fields() {
        let args = Args {
            host: None,
            port: Some(3000),
            command: "run",
        };
        let specs = items(vec![item("host"), item("port")]);
        let source = MapSource::from_serialize(&args).unwrap();
        let mentions = source.mentions(&specs).unwrap();
        assert_eq!(mentions, vec![Mention::new("port", MentionArgs::one(3000))]);
    }

    #[test]
    fn from_serialize_hashmap() {
        let mut values = HashMap::new();
        values.insert("host", "0.0.0.0");
        let specs = items(vec![item("host")]);
        let mentions = MapSource::from_serialize(&values)
            .unwrap()
            .mentions(&specs)
            .unwrap();
        assert_eq!(mentions[0].args, MentionArgs::one("0.0.0.0"));
    }

    #[test]
    fn from_serialize_rejects_non_maps() {
        assert!(matches!(
            MapSource::from_serialize(&vec![1, 2]),
            Err(LayerfigError::Source { .. })
        ));
    }

    #[test]
    fn from_serialize_failure_is_a_source_error() {
        let mut values = HashMap::new();
        values.insert((1, 2), "tuple keys cannot become map keys");
        match MapSource::from_serialize(&values) {
            Err(LayerfigError::Source { id, reason }) => {
                assert_eq!(id, "map");
                assert!(reason.contains("serialize"));
            }
            other => panic!("Expected Source error, got: {other:?}"),
        }
    }

    #[test]
    fn from_toml_converts_values() {
        let table: toml::Table = r#"
            host = "localhost"
            port = 8080
            rate = 1.5
            debug = true
            tags = ["a", "b"]
            "#
        .parse()
        .unwrap();
        let specs = items(vec![
            item("host"),
            item("port").coerce(crate::coerce::integer()),
            item("rate").coerce(crate::coerce::float()),
            item("debug").coerce(crate::coerce::boolean()),
            item("tags").arity(Arity::ZeroOrMore),
        ]);
        let mentions = MapSource::from_toml(table).mentions(&specs).unwrap();
        assert_eq!(mentions[0].args, MentionArgs::one("localhost"));
        assert_eq!(mentions[1].args, MentionArgs::one(8080));
        assert_eq!(mentions[2].args, MentionArgs::one(1.5));
        assert_eq!(mentions[3].args, MentionArgs::one(true));
        assert_eq!(mentions[4].args, MentionArgs::many(["a", "b"]));
    }

    #[test]
    fn static_source_replays_in_order() {
        let source = StaticSource::new("fixed")
            .with_priority(5)
            .mention(Mention::new("a", MentionArgs::one("1")))
            .mention(Mention::flag("b"));
        assert_eq!(source.id(), "fixed");
        assert_eq!(source.priority(), 5);
        let mentions = source.mentions(&[]).unwrap();
        assert_eq!(mentions.len(), 2);
        assert_eq!(mentions[0].item, "a");
        assert_eq!(mentions[1].args, MentionArgs::NoValue);
    }
}
