//! Multi-source configuration with per-item accumulation rules. Declare your
//! items, plug in your sources, and parse.
//!
//! Layerfig resolves configuration from any number of sources (a decoded
//! config file, environment-derived maps, the command line, values computed
//! by your program) into one [`Namespace`]. Each source reports *mentions*
//! of config items; each item's *action* decides how its mentions combine.
//!
//! ```
//! use layerfig::{Action, ConfigParser, ItemSpec, MapSource};
//! use serde_json::json;
//!
//! let mut parser = ConfigParser::new();
//! parser.add_item(ItemSpec::builder("host").default("localhost").build()?)?;
//! parser.add_item(
//!     ItemSpec::builder("plugins")
//!         .action(Action::Append)
//!         .default(json!(["core"]))
//!         .build()?,
//! )?;
//! parser.add_source(MapSource::new([("plugins", json!("metrics"))]));
//!
//! let ns = parser.parse()?;
//! assert_eq!(ns.get("host"), Some(&json!("localhost")));
//! assert_eq!(ns.get("plugins"), Some(&json!(["core", "metrics"])));
//! # Ok::<(), layerfig::LayerfigError>(())
//! ```
//!
//! # Why layerfig
//!
//! Layered configuration usually means "the highest layer wins". That is
//! right for a port number and wrong for a plugin list, a verbosity counter
//! or a list of include paths, where every layer should *contribute*. Layerfig
//! makes the combination rule part of the item: the same parse can let the
//! command line override a host while appending to a list that the config
//! file started.
//!
//! # Items
//!
//! An [`ItemSpec`] is built once and never changes:
//!
//! - **name** and **dest**: the name sources use to mention the item, and
//!   the output key (defaults to the name). Several items may share a dest,
//!   e.g. `color` and `no_color` both writing `color`.
//! - **action**: see below.
//! - **arity**: how many raw values one mention carries ([`Arity`]).
//! - **coercion**: a [`Coercer`] turning each raw value into a typed one
//!   (`string` by default; see [`coerce`] for the built-ins).
//! - **choices**: the allowed coerced values.
//! - **default**: a value, [`ItemDefault::Omit`] to leave the key out when
//!   nothing mentions the item, or nothing (the key resolves to `null`).
//! - **required**: at least one source must mention the item.
//! - **source filter**: `include_sources` / `exclude_sources` by source id.
//!
//! Construction checks everything that can be checked up front: identifier
//! names, `const` only where it means something, list defaults for list
//! actions, and so on.
//!
//! # Actions
//!
//! | Action | Mentions | Default |
//! |--------|----------|---------|
//! | `Store` | highest priority wins | used if never mentioned |
//! | `StoreConst` | stores the item's `const` | used if never mentioned |
//! | `StoreTrue` / `StoreFalse` | store `true` / `false` | `false` / `true` |
//! | `Append` | each value appended, lowest priority first | the seed list |
//! | `Extend` | like append, splicing list values | the seed list |
//! | `Count` | adds 1 per mention | the seed count |
//!
//! The asymmetry is the point: replacing actions let the default show through
//! only when nothing mentions the item, accumulating actions always start
//! from it. Custom actions implement [`CustomAction`] and are looked up by
//! tag through the parser's [`ActionRegistry`].
//!
//! # Sources and priority
//!
//! A [`Source`] has an id, an integer priority and a way to report mentions.
//! Mentions are folded lowest priority first; mentions with equal priority
//! keep the order in which their sources were registered and then the
//! order in which each source emitted them. The built-in sources:
//!
//! | Source | Id | Priority |
//! |--------|----|----------|
//! | [`MapSource`] | `map` | 0 |
//! | [`StaticSource`] | chosen | 0 |
//! | [`ClapSource`] (feature `clap`) | `cli` | 20 |
//!
//! A source may emit a mention without a value (a flag, or an option whose
//! optional argument was left out). That is distinct from a `null` value,
//! which is a legitimate config value like any other.
//!
//! # Parsing
//!
//! [`ConfigParser::parse`] fails if a required item was never mentioned;
//! [`ConfigParser::partial_parse`] skips that check. Both abort on the first
//! invalid mention and never return a partial result. Parses are independent:
//! defaults are cloned into each parse, so parsing twice gives the same
//! namespace.
//!
//! # Error handling
//!
//! All fallible operations return [`LayerfigError`]. Errors are user-facing:
//! they name the item and the offending value. See the [`error`] module for
//! the full set.

pub mod action;
pub mod coerce;
pub mod error;
pub mod mention;
pub mod types;

mod builder;
#[cfg(feature = "clap")]
mod cli;
mod namespace;
mod resolve;
mod source;
mod spec;

#[cfg(test)]
mod fixtures;

pub use action::{Action, ActionRegistry, CustomAction};
pub use builder::ConfigParser;
#[cfg(feature = "clap")]
pub use cli::ClapSource;
pub use coerce::Coercer;
pub use error::LayerfigError;
pub use mention::{Mention, MentionArgs, Source};
pub use namespace::Namespace;
pub use resolve::{ResolveInput, resolve};
pub use source::{MapSource, StaticSource};
pub use spec::{ItemSpec, ItemSpecBuilder};
pub use types::{Arity, ItemDefault, Resolved, SourceFilter};
