//! Mentions and the source contract.
//!
//! A [`Source`] is anything that can look for config items and report, for
//! every occurrence it finds, one [`Mention`]: the item name and the raw,
//! uncoerced arguments. Sources never coerce or validate; that is the job of
//! the item's action during resolution.
//!
//! Encoding rules every source follows:
//!
//! - A bare occurrence (a flag, an optional argument left out) is
//!   [`MentionArgs::NoValue`], never `null`. `null` is a real value.
//! - Arguments are listed in the order they appeared.
//! - One mention per occurrence: `--verbose --verbose` is two mentions.

use serde_json::Value;

use crate::error::LayerfigError;
use crate::spec::ItemSpec;

/// The raw arguments of one mention.
#[derive(Debug, Clone, PartialEq)]
pub enum MentionArgs {
    NoValue,
    Values(Vec<Value>),
}

impl MentionArgs {
    /// A mention carrying a single raw value.
    pub fn one(value: impl Into<Value>) -> Self {
        MentionArgs::Values(vec![value.into()])
    }

    pub fn many<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        MentionArgs::Values(values.into_iter().map(Into::into).collect())
    }

    /// Number of raw values; a bare mention has none.
    pub fn len(&self) -> usize {
        match self {
            MentionArgs::NoValue => 0,
            MentionArgs::Values(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One occurrence of an item in one source.
#[derive(Debug, Clone, PartialEq)]
pub struct Mention {
    pub item: String,
    pub args: MentionArgs,
    /// Set by the parser from the emitting source's priority.
    pub priority: i64,
}

impl Mention {
    pub fn new(item: impl Into<String>, args: MentionArgs) -> Self {
        Self {
            item: item.into(),
            args,
            priority: 0,
        }
    }

    /// A bare mention (flag-style).
    pub fn flag(item: impl Into<String>) -> Self {
        Self::new(item, MentionArgs::NoValue)
    }
}

/// A producer of mentions.
///
/// Sources are queried in registration order. Their output is combined by
/// priority (higher wins), then by registration order, then by the order the
/// source emitted its mentions.
pub trait Source {
    /// Identifier used by item source filters (`include_sources` /
    /// `exclude_sources`).
    fn id(&self) -> &str;

    fn priority(&self) -> i64;

    /// Report every occurrence of the given items. Items are passed in
    /// registration order. Only I/O-style failures of the source itself
    /// should be returned here.
    fn mentions(&self, items: &[ItemSpec]) -> Result<Vec<Mention>, LayerfigError>;
}
