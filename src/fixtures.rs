#[cfg(test)]
pub mod test {
    use serde_json::Value;

    use crate::action::CustomAction;
    use crate::error::LayerfigError;
    use crate::mention::{Mention, MentionArgs};
    use crate::source::StaticSource;
    use crate::spec::{ItemSpec, ItemSpecBuilder};
    use crate::types::Resolved;

    pub fn item(name: &str) -> ItemSpecBuilder {
        ItemSpec::builder(name)
    }

    /// A static source emitting one single-value mention per pair.
    pub fn values_source(id: &str, priority: i64, pairs: &[(&str, &str)]) -> StaticSource {
        pairs.iter().fold(
            StaticSource::new(id).with_priority(priority),
            |source, (item, value)| source.mention(Mention::new(*item, MentionArgs::one(*value))),
        )
    }

    /// A static source emitting one bare mention per name.
    pub fn flags_source(id: &str, priority: i64, items: &[&str]) -> StaticSource {
        items.iter().fold(
            StaticSource::new(id).with_priority(priority),
            |source, item| source.mention(Mention::flag(*item)),
        )
    }

    // -- Custom action fixture ---------------------------------------------------

    /// Stores the upper-cased string value (or each upper-cased element).
    pub struct UpperStore;

    impl CustomAction for UpperStore {
        fn tag(&self) -> &str {
            "store_upper"
        }

        fn check(&self, item: &ItemSpec) -> Result<(), String> {
            if item.coercer().name() != "string" {
                return Err("store_upper only works with the string coercion".into());
            }
            Ok(())
        }

        fn combine(
            &self,
            _item: &ItemSpec,
            _current: Resolved,
            new: Resolved,
        ) -> Result<Resolved, LayerfigError> {
            Ok(match new {
                Resolved::Value(v) => Resolved::Value(upper(v)),
                other => other,
            })
        }
    }

    fn upper(value: Value) -> Value {
        match value {
            Value::String(s) => Value::String(s.to_uppercase()),
            Value::Array(values) => Value::Array(values.into_iter().map(upper).collect()),
            other => other,
        }
    }
}
