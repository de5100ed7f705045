//! Core accumulation pipeline: fold every mention into one value per output key.
//!
//! Operates on pre-collected data (`ResolveInput`) with no source queries,
//! making the whole pipeline testable with synthetic mentions. Steps:
//!
//! 1. Drop mentions of unknown items and mentions from sources the item
//!    does not listen to
//! 2. Group the rest by output key and stable-sort each group by priority
//!    (lowest first; ties keep emission order)
//! 3. Seed each key with the default of the first item registered for it
//! 4. Fold: validate and coerce each mention, then combine it into the
//!    accumulator with the mentioned item's action
//! 5. Finalize: unresolved keys become `null`, or vanish if the default is
//!    `Omit`
//! 6. Check required items (optional)

use std::collections::{BTreeMap, BTreeSet};

use serde_json::Value;
use tracing::{debug, trace};

use crate::error::LayerfigError;
use crate::mention::Mention;
use crate::namespace::Namespace;
use crate::spec::ItemSpec;
use crate::types::{ItemDefault, Resolved};

/// Everything needed to resolve one parse. Nothing here is mutated.
pub struct ResolveInput<'a> {
    /// Items in registration order.
    pub items: &'a [ItemSpec],
    /// Mentions tagged with the id of the source that emitted them, in
    /// source registration order then emission order. Each mention's
    /// `priority` is already set.
    pub mentions: Vec<(String, Mention)>,
    /// Default for items that have none of their own.
    pub config_default: Option<ItemDefault>,
    /// Fail if a required item was never mentioned.
    pub check_required: bool,
}

/// Resolve a [`Namespace`] from pre-collected mentions.
pub fn resolve(input: ResolveInput<'_>) -> Result<Namespace, LayerfigError> {
    let by_name: BTreeMap<&str, &ItemSpec> =
        input.items.iter().map(|item| (item.name(), item)).collect();

    // 1-2: filter and group
    let mut groups: BTreeMap<&str, Vec<(&ItemSpec, Mention)>> = BTreeMap::new();
    let mut mentioned: BTreeSet<&str> = BTreeSet::new();
    for (source_id, mention) in input.mentions {
        let Some(item) = by_name.get(mention.item.as_str()).copied() else {
            debug!(source = %source_id, item = %mention.item, "Ignoring mention of unknown item");
            continue;
        };
        if !item.accepts_source(&source_id) {
            debug!(source = %source_id, item = item.name(), "Source filtered out for item");
            continue;
        }
        mentioned.insert(item.name());
        groups.entry(item.dest()).or_default().push((item, mention));
    }
    for group in groups.values_mut() {
        group.sort_by_key(|(_, mention)| mention.priority);
    }

    // 3-5: seed, fold, finalize; one pass per dest in registration order
    let mut values = BTreeMap::new();
    let mut seen_dests = BTreeSet::new();
    for owner in input.items {
        if !seen_dests.insert(owner.dest()) {
            continue;
        }
        let default = owner.effective_default(input.config_default.as_ref());
        let mut acc = default.seed();

        for (item, mention) in groups.remove(owner.dest()).unwrap_or_default() {
            let new = item.action().validate_and_coerce(item, &mention.args)?;
            acc = item.action().combine(item, acc, new)?;
            trace!(
                dest = owner.dest(),
                item = item.name(),
                priority = mention.priority,
                acc = ?acc,
                "Combined mention"
            );
        }

        match acc {
            Resolved::Value(value) => {
                values.insert(owner.dest().to_string(), value);
            }
            Resolved::NoValue => {
                values.insert(owner.dest().to_string(), Value::Null);
            }
            Resolved::Absent if default == ItemDefault::Omit => {
                trace!(dest = owner.dest(), "Omitting unmentioned key");
            }
            Resolved::Absent => {
                values.insert(owner.dest().to_string(), Value::Null);
            }
        }
    }

    // 6: required items, first missing in registration order
    if input.check_required
        && let Some(missing) = input
            .items
            .iter()
            .find(|item| item.required() && !mentioned.contains(item.name()))
    {
        return Err(LayerfigError::RequiredNotFound(missing.name().into()));
    }

    debug!(keys = values.len(), mentioned = mentioned.len(), "Resolved namespace");
    Ok(Namespace::new(values))
}
