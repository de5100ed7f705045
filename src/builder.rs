use tracing::debug;

use crate::action::{Action, ActionRegistry};
use crate::error::LayerfigError;
use crate::mention::Source;
use crate::namespace::Namespace;
use crate::resolve::{self, ResolveInput};
use crate::spec::ItemSpec;
use crate::types::ItemDefault;

/// Registers config items and sources, then resolves them into a
/// [`Namespace`].
///
/// Sources are queried in registration order on every parse. A parser holds
/// no state between parses, so parsing twice gives the same result as long
/// as the sources do.
///
/// ```
/// use layerfig::{Action, ConfigParser, ItemSpec, MapSource};
/// use serde_json::json;
///
/// let mut parser = ConfigParser::new();
/// parser.add_item(ItemSpec::builder("host").default("localhost").build()?)?;
/// parser.add_item(ItemSpec::builder("verbose").action(Action::Count).build()?)?;
/// parser.add_source(MapSource::new([("verbose", json!(null))]));
///
/// let ns = parser.parse()?;
/// assert_eq!(ns.get("host"), Some(&json!("localhost")));
/// assert_eq!(ns.get("verbose"), Some(&json!(1)));
/// # Ok::<(), layerfig::LayerfigError>(())
/// ```
pub struct ConfigParser {
    registry: ActionRegistry,
    config_default: Option<ItemDefault>,
    items: Vec<ItemSpec>,
    sources: Vec<Box<dyn Source>>,
}

impl ConfigParser {
    pub fn new() -> Self {
        Self {
            registry: ActionRegistry::new(),
            config_default: None,
            items: Vec::new(),
            sources: Vec::new(),
        }
    }

    /// Replace the action registry (default: the built-in actions only).
    pub fn registry(mut self, registry: ActionRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Default for every item that does not set its own. Takes precedence
    /// over the defaults implied by `store_true` / `store_false`.
    pub fn config_default(mut self, default: ItemDefault) -> Self {
        self.config_default = Some(default);
        self
    }

    /// Look up an action by tag in this parser's registry.
    pub fn action(&self, tag: &str) -> Result<Action, LayerfigError> {
        self.registry.get(tag)
    }

    /// Register an item. Names must be unique; several items may share a
    /// `dest`. Custom actions must be known to the registry.
    pub fn add_item(&mut self, spec: ItemSpec) -> Result<(), LayerfigError> {
        if self.items.iter().any(|item| item.name() == spec.name()) {
            return Err(LayerfigError::DuplicateItem(spec.name().into()));
        }
        if let Action::Custom(_) = spec.action() {
            self.registry.get(spec.action().tag())?;
        }
        debug!(
            item = spec.name(),
            dest = spec.dest(),
            action = spec.action().tag(),
            "Registered item"
        );
        self.items.push(spec);
        Ok(())
    }

    pub fn add_source(&mut self, source: impl Source + 'static) {
        debug!(source = source.id(), priority = source.priority(), "Registered source");
        self.sources.push(Box::new(source));
    }

    /// Registered items, in registration order.
    pub fn items(&self) -> &[ItemSpec] {
        &self.items
    }

    /// Resolve every item, failing if a required item was never mentioned.
    pub fn parse(&self) -> Result<Namespace, LayerfigError> {
        self.run(true)
    }

    /// Like [`parse`](Self::parse), but without the required-item check.
    pub fn partial_parse(&self) -> Result<Namespace, LayerfigError> {
        self.run(false)
    }

    fn run(&self, check_required: bool) -> Result<Namespace, LayerfigError> {
        let mut mentions = Vec::new();
        for source in &self.sources {
            let priority = source.priority();
            let found = source.mentions(&self.items)?;
            debug!(
                source = source.id(),
                priority,
                mentions = found.len(),
                "Queried source"
            );
            mentions.extend(found.into_iter().map(|mut mention| {
                mention.priority = priority;
                (source.id().to_string(), mention)
            }));
        }

        resolve::resolve(ResolveInput {
            items: &self.items,
            mentions,
            config_default: self.config_default.clone(),
            check_required,
        })
    }
}

impl Default for ConfigParser {
    fn default() -> Self {
        Self::new()
    }
}
