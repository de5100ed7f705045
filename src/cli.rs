//! Clap adapter for layerfig.
//!
//! This module is the **optional integration layer** between layerfig's
//! source-agnostic core and the [clap](https://docs.rs/clap) CLI parser. It
//! is compiled only when the `clap` Cargo feature is enabled (on by default).
//!
//! Two steps:
//!
//! 1. [`ClapSource::augment`] adds one `--item-name` argument per config item
//!    to your `clap::Command`, with the item's arity and help text.
//! 2. After clap has parsed, [`ClapSource::new`] wraps the `ArgMatches` into a
//!    [`Source`] that reports one mention per occurrence, in command-line
//!    order.
//!
//! ```
//! use clap::Command;
//! use layerfig::{Action, ClapSource, ConfigParser, ItemSpec};
//! use serde_json::json;
//!
//! let mut parser = ConfigParser::new();
//! parser.add_item(ItemSpec::builder("log_level").build()?)?;
//! parser.add_item(ItemSpec::builder("verbose").action(Action::Count).build()?)?;
//!
//! let command = ClapSource::augment(Command::new("app"), parser.items())?;
//! let matches = command
//!     .try_get_matches_from(["app", "--log-level", "debug", "--verbose", "--verbose"])
//!     .unwrap();
//! parser.add_source(ClapSource::new(matches));
//!
//! let ns = parser.parse()?;
//! assert_eq!(ns.get("log_level"), Some(&json!("debug")));
//! assert_eq!(ns.get("verbose"), Some(&json!(2)));
//! # Ok::<(), layerfig::LayerfigError>(())
//! ```

use clap::parser::MatchesError;
use clap::{Arg, ArgAction, ArgMatches, Command};
use serde_json::Value;
use tracing::trace;

use crate::error::LayerfigError;
use crate::mention::{Mention, MentionArgs, Source};
use crate::spec::ItemSpec;
use crate::types::Arity;

/// Value clap records for an occurrence given without values.
const MISSING: &str = "";

/// Mentions read from parsed command-line arguments.
///
/// Mentions follow command-line order across items, so for two items sharing
/// a dest the one typed last wins. Values are handed on as strings, so items
/// fed from the command line usually want a typed coercion.
///
/// An explicitly empty value (`--color=`) on an item that may be given bare
/// counts as a bare mention.
#[derive(Debug, Clone)]
pub struct ClapSource {
    id: String,
    priority: i64,
    matches: ArgMatches,
}

impl ClapSource {
    pub const DEFAULT_ID: &'static str = "cli";
    pub const DEFAULT_PRIORITY: i64 = 20;

    pub fn new(matches: ArgMatches) -> Self {
        Self {
            id: Self::DEFAULT_ID.to_string(),
            priority: Self::DEFAULT_PRIORITY,
            matches,
        }
    }

    /// Source id used by item filters (default: `"cli"`).
    pub fn with_id(mut self, id: &str) -> Self {
        self.id = id.to_string();
        self
    }

    /// Set the priority (default: `20`).
    pub fn with_priority(mut self, priority: i64) -> Self {
        self.priority = priority;
        self
    }

    /// Add an argument for every item that listens to the `"cli"` source.
    ///
    /// Underscores in item names become hyphens in the flag: `log_level`
    /// is `--log-level`. Zero-arity items become repeatable flags; every
    /// other item takes the values its arity allows, once per occurrence.
    ///
    /// Fails with [`LayerfigError::InvalidItem`] when an item's flag is
    /// already taken, either by an argument of `command` or by clap's own
    /// `--help` / `--version`.
    pub fn augment(command: Command, items: &[ItemSpec]) -> Result<Command, LayerfigError> {
        Self::augment_with_id(Self::DEFAULT_ID, command, items)
    }

    /// Like [`augment`](Self::augment), for a source registered under `id`
    /// with [`with_id`](Self::with_id).
    pub fn augment_with_id(
        id: &str,
        command: Command,
        items: &[ItemSpec],
    ) -> Result<Command, LayerfigError> {
        let mut command = command;
        for item in items.iter().filter(|item| item.accepts_source(id)) {
            let arg = to_arg(item);
            check_free(&command, item, &arg)?;
            command = command.arg(arg);
        }
        Ok(command)
    }

    /// Every occurrence of `item`, keyed by its position on the command line.
    fn occurrences(&self, item: &ItemSpec) -> Result<Vec<(usize, MentionArgs)>, LayerfigError> {
        let occurrences = match self.matches.try_get_raw_occurrences(item.name()) {
            Ok(Some(occurrences)) => occurrences,
            Ok(None) | Err(MatchesError::UnknownArgument { .. }) => return Ok(Vec::new()),
            Err(e) => return Err(self.error(item, e)),
        };
        let mut indices = self.matches.indices_of(item.name()).into_iter().flatten();

        let mut found = Vec::new();
        for raw in occurrences {
            let values: Vec<String> = raw.map(|v| v.to_string_lossy().into_owned()).collect();
            let index = indices.by_ref().take(values.len()).min().unwrap_or(usize::MAX);
            let args = if item.arity().accepts_no_value() && values == [MISSING] {
                MentionArgs::NoValue
            } else {
                MentionArgs::Values(values.into_iter().map(Value::String).collect())
            };
            found.push((index, args));
        }
        Ok(found)
    }

    fn error(&self, item: &ItemSpec, e: MatchesError) -> LayerfigError {
        LayerfigError::Source {
            id: self.id.clone(),
            reason: format!("cannot read '{}': {e}", item.name()),
        }
    }
}

impl Source for ClapSource {
    fn id(&self) -> &str {
        &self.id
    }

    fn priority(&self) -> i64 {
        self.priority
    }

    fn mentions(&self, items: &[ItemSpec]) -> Result<Vec<Mention>, LayerfigError> {
        let mut found = Vec::new();
        for item in items {
            if !item.accepts_source(&self.id) {
                continue;
            }
            for (index, args) in self.occurrences(item)? {
                trace!(item = item.name(), index, "Found command-line mention");
                found.push((index, Mention::new(item.name(), args)));
            }
        }
        found.sort_by_key(|(index, _)| *index);
        Ok(found.into_iter().map(|(_, mention)| mention).collect())
    }
}

fn check_free(command: &Command, item: &ItemSpec, arg: &Arg) -> Result<(), LayerfigError> {
    let long = arg.get_long().unwrap_or_default();
    let taken_by = if long == "help" && !command.is_disable_help_flag_set() {
        Some("--help".to_string())
    } else if long == "version" && !command.is_disable_version_flag_set() {
        Some("--version".to_string())
    } else {
        command
            .get_arguments()
            .find(|a| a.get_id() == arg.get_id() || a.get_long() == Some(long))
            .map(|a| a.get_id().to_string())
    };
    match taken_by {
        Some(other) => Err(LayerfigError::InvalidItem {
            item: item.name().into(),
            reason: format!("flag '--{long}' is already taken by '{other}'"),
        }),
        None => Ok(()),
    }
}

fn to_arg(item: &ItemSpec) -> Arg {
    let arg = Arg::new(item.name().to_string())
        .long(item.name().replace('_', "-"))
        .action(ArgAction::Append);
    let arg = match item.help() {
        Some(help) => arg.help(help.to_string()),
        None => arg,
    };
    let arg = match item.arity() {
        Arity::Zero => arg.num_args(0),
        arity => {
            let arg = arg.value_name(item.name().to_uppercase());
            match arity {
                Arity::Single => arg.num_args(1),
                Arity::Fixed(n) => arg.num_args(n),
                Arity::ZeroOrOne => arg.num_args(0..=1),
                Arity::ZeroOrMore => arg.num_args(0..),
                Arity::OneOrMore | Arity::Zero => arg.num_args(1..),
            }
        }
    };
    if item.arity().accepts_no_value() {
        arg.default_missing_value(MISSING)
    } else {
        arg
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Action;
    use crate::builder::ConfigParser;
    use crate::fixtures::test::item;
    use crate::spec::ItemSpecBuilder;
    use serde_json::json;

    fn specs(builders: Vec<ItemSpecBuilder>) -> Vec<ItemSpec> {
        builders.into_iter().map(|b| b.build().unwrap()).collect()
    }

    fn matches(command: Command, args: &[&str]) -> ArgMatches {
        let mut argv = vec!["test"];
        argv.extend_from_slice(args);
        command.try_get_matches_from(argv).unwrap()
    }

    fn source(items: &[ItemSpec], args: &[&str]) -> ClapSource {
        let command = ClapSource::augment(Command::new("test"), items).unwrap();
        ClapSource::new(matches(command, args))
    }

    fn parser(builders: Vec<ItemSpecBuilder>) -> ConfigParser {
        let mut parser = ConfigParser::new();
        for spec in specs(builders) {
            parser.add_item(spec).unwrap();
        }
        parser
    }

    #[test]
    fn defaults() {
        let s = source(&[], &[]);
        assert_eq!(s.id(), "cli");
        assert_eq!(s.priority(), 20);
        let s = s.with_id("args").with_priority(5);
        assert_eq!(s.id(), "args");
        assert_eq!(s.priority(), 5);
    }

    #[test]
    fn augment_adds_hyphenated_longs_with_help() {
        let items = specs(vec![item("log_level").help("How chatty to be"), item("port")]);
        let command = ClapSource::augment(Command::new("test"), &items).unwrap();
        let arg = command
            .get_arguments()
            .find(|a| a.get_id() == "log_level")
            .unwrap();
        assert_eq!(arg.get_long(), Some("log-level"));
        assert_eq!(
            arg.get_help().map(|h| h.to_string()),
            Some("How chatty to be".to_string())
        );
        assert!(command.get_arguments().any(|a| a.get_id() == "port"));
    }

    #[test]
    fn augment_skips_items_that_ignore_the_cli() {
        let items = specs(vec![item("secret").exclude_sources(["cli"]), item("host")]);
        let command = ClapSource::augment(Command::new("test"), &items).unwrap();
        assert!(!command.get_arguments().any(|a| a.get_id() == "secret"));
        assert!(command.get_arguments().any(|a| a.get_id() == "host"));
    }

    #[test]
    fn augment_with_custom_id() {
        let mut p = parser(vec![
            item("host").include_sources(["args"]),
            item("port").include_sources(["cli"]),
        ]);
        let command = ClapSource::augment_with_id("args", Command::new("test"), p.items()).unwrap();
        assert!(command.get_arguments().any(|a| a.get_id() == "host"));
        assert!(!command.get_arguments().any(|a| a.get_id() == "port"));

        let m = matches(command, &["--host", "example.org"]);
        p.add_source(ClapSource::new(m).with_id("args"));
        let ns = p.parse().unwrap();
        assert_eq!(ns.get("host"), Some(&json!("example.org")));
        assert_eq!(ns.get("port"), Some(&Value::Null));
    }

    #[test]
    fn item_named_help_is_rejected() {
        let items = specs(vec![item("help")]);
        let err = ClapSource::augment(Command::new("test"), &items).unwrap_err();
        match err {
            LayerfigError::InvalidItem { item, reason } => {
                assert_eq!(item, "help");
                assert!(reason.contains("--help"));
            }
            other => panic!("Expected InvalidItem, got: {other:?}"),
        }
    }

    #[test]
    fn item_named_help_allowed_without_help_flag() {
        let items = specs(vec![item("help")]);
        let command = Command::new("test").disable_help_flag(true);
        let s = ClapSource::new(matches(
            ClapSource::augment(command, &items).unwrap(),
            &["--help", "topics"],
        ));
        assert_eq!(
            s.mentions(&items).unwrap(),
            vec![Mention::new("help", MentionArgs::one("topics"))]
        );
    }

    #[test]
    fn item_named_version_needs_a_versionless_command() {
        let items = specs(vec![item("version")]);
        assert!(ClapSource::augment(Command::new("test"), &items).is_ok());
        let err = ClapSource::augment(Command::new("test").version("1.0"), &items).unwrap_err();
        assert!(matches!(err, LayerfigError::InvalidItem { .. }));
    }

    #[test]
    fn item_clashing_with_existing_argument_is_rejected() {
        let items = specs(vec![item("log_level")]);
        let command = Command::new("test").arg(Arg::new("level").long("log-level"));
        let err = ClapSource::augment(command, &items).unwrap_err();
        assert!(matches!(err, LayerfigError::InvalidItem { item, .. } if item == "log_level"));
    }

    #[test]
    fn single_values_one_mention_per_occurrence() {
        let items = specs(vec![item("host")]);
        let mentions = source(&items, &["--host", "a", "--host", "b"])
            .mentions(&items)
            .unwrap();
        assert_eq!(
            mentions,
            vec![
                Mention::new("host", MentionArgs::one("a")),
                Mention::new("host", MentionArgs::one("b")),
            ]
        );
    }

    #[test]
    fn mentions_follow_command_line_order() {
        let items = specs(vec![item("host"), item("port"), item("v").action(Action::Count)]);
        let mentions = source(&items, &["--v", "--host", "a", "--port", "1", "--host", "b", "--v"])
            .mentions(&items)
            .unwrap();
        assert_eq!(
            mentions,
            vec![
                Mention::flag("v"),
                Mention::new("host", MentionArgs::one("a")),
                Mention::new("port", MentionArgs::one("1")),
                Mention::new("host", MentionArgs::one("b")),
                Mention::flag("v"),
            ]
        );
    }

    #[test]
    fn last_typed_flag_wins_a_shared_dest() {
        let builders = || {
            vec![
                item("color").action(Action::StoreTrue),
                item("no_color").dest("color").action(Action::StoreFalse),
            ]
        };
        for (args, expected) in [
            (["--no-color", "--color"], true),
            (["--color", "--no-color"], false),
        ] {
            let mut p = parser(builders());
            let cli = source(p.items(), &args);
            p.add_source(cli);
            assert_eq!(p.parse().unwrap().get("color"), Some(&json!(expected)));
        }
    }

    #[test]
    fn absent_arguments_produce_no_mentions() {
        let items = specs(vec![item("host"), item("v").action(Action::Count)]);
        assert!(source(&items, &[]).mentions(&items).unwrap().is_empty());
    }

    #[test]
    fn flags_repeat() {
        let items = specs(vec![item("verbose").action(Action::Count)]);
        let mentions = source(&items, &["--verbose", "--verbose", "--verbose"])
            .mentions(&items)
            .unwrap();
        assert_eq!(mentions.len(), 3);
        assert!(mentions.iter().all(|m| m.args == MentionArgs::NoValue));
    }

    #[test]
    fn flags_take_no_values() {
        let items = specs(vec![item("verbose").action(Action::Count)]);
        let command = ClapSource::augment(Command::new("test"), &items).unwrap();
        assert!(command.try_get_matches_from(["test", "--verbose=3"]).is_err());
    }

    #[test]
    fn multi_value_occurrences_keep_grouping() {
        let items = specs(vec![item("pair").action(Action::Append).arity(Arity::Fixed(2))]);
        let mentions = source(&items, &["--pair", "a", "b", "--pair", "c", "d"])
            .mentions(&items)
            .unwrap();
        assert_eq!(mentions[0].args, MentionArgs::many(["a", "b"]));
        assert_eq!(mentions[1].args, MentionArgs::many(["c", "d"]));
    }

    #[test]
    fn optional_value_left_out_is_a_bare_mention() {
        let items = specs(vec![item("color").arity(Arity::ZeroOrOne).constant("auto")]);
        let mentions = source(&items, &["--color", "--color", "never"])
            .mentions(&items)
            .unwrap();
        assert_eq!(
            mentions,
            vec![
                Mention::flag("color"),
                Mention::new("color", MentionArgs::one("never")),
            ]
        );
    }

    #[test]
    fn wrong_value_count_rejected_by_clap() {
        let items = specs(vec![item("pair").arity(Arity::Fixed(2))]);
        let command = ClapSource::augment(Command::new("test"), &items).unwrap();
        assert!(command.try_get_matches_from(["test", "--pair", "a"]).is_err());
    }

    #[test]
    fn end_to_end_with_parser() {
        let mut parser = parser(vec![
            item("port").coerce(crate::coerce::integer()).default(8080),
            item("tags").action(Action::Extend),
            item("debug").action(Action::StoreTrue),
        ]);
        parser.add_source(crate::source::MapSource::new([
            ("port", json!(3000)),
            ("tags", json!(["from-map"])),
        ]));
        let cli = source(
            parser.items(),
            &["--port", "9000", "--tags", "x", "y", "--debug"],
        );
        parser.add_source(cli);

        let ns = parser.parse().unwrap();
        assert_eq!(ns.get("port"), Some(&json!(9000)));
        assert_eq!(ns.get("tags"), Some(&json!(["from-map", "x", "y"])));
        assert_eq!(ns.get("debug"), Some(&json!(true)));
    }

    #[test]
    fn filtered_items_are_not_reported() {
        let items = specs(vec![item("host")]);
        let s = source(&items, &["--host", "a"]);
        let filtered = specs(vec![item("host").include_sources(["map"])]);
        assert!(s.mentions(&filtered).unwrap().is_empty());
    }
}
