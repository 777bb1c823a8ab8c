//! Parsed arguments handed to command handlers.

use std::collections::BTreeMap;

use crate::interrupt::InterruptFlag;

/// Value parsed for one flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgValue {
    /// `store_true` / `store_false` switch.
    Switch(bool),
    /// Occurrence counter.
    Count(u8),
    /// Single stored value, absent when neither given nor defaulted.
    Value(Option<String>),
    /// Values collected by a repeatable flag.
    Values(Vec<String>),
}

/// Keyword record of every flag registered along the selected command path.
///
/// Keys are argument destinations (`--dry-run` stores under `dry_run`).
/// Global flags, module flags and command flags share one namespace.
///
/// # Examples
///
/// ```
/// use skal_app::{ArgValue, CommandArgs};
///
/// let args = CommandArgs::new(["third"])
///     .with("i", ArgValue::Switch(true))
///     .with("test", ArgValue::Value(Some("x".into())));
///
/// assert_eq!(args.command(), "third");
/// assert!(args.flag("i"));
/// assert_eq!(args.value("test"), Some("x"));
/// assert_eq!(args.value("missing"), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandArgs {
    path: Vec<String>,
    values: BTreeMap<String, ArgValue>,
    interrupt: InterruptFlag,
}

impl CommandArgs {
    /// Creates an empty record for the command reached through `path`.
    pub fn new<I, S>(path: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            path: path.into_iter().map(Into::into).collect(),
            values: BTreeMap::new(),
            interrupt: InterruptFlag::default(),
        }
    }

    /// Uses `flag` for [`interrupted`](Self::interrupted).
    pub fn with_interrupt(mut self, flag: InterruptFlag) -> Self {
        self.interrupt = flag;
        self
    }

    /// Returns `true` once the user asked to interrupt the command.
    /// Long-running handlers should poll this and return.
    pub fn interrupted(&self) -> bool {
        self.interrupt.is_raised()
    }

    /// Adds a value and returns the record.
    pub fn with(mut self, dest: &str, value: ArgValue) -> Self {
        self.insert(dest, value);
        self
    }

    /// Stores a value under `dest`, replacing any earlier one.
    pub fn insert(&mut self, dest: &str, value: ArgValue) {
        self.values.insert(dest.to_string(), value);
    }

    /// Name of the selected command.
    pub fn command(&self) -> &str {
        self.path.last().map(String::as_str).unwrap_or_default()
    }

    /// Subcommand names from the root to the selected command.
    pub fn path(&self) -> &[String] {
        &self.path
    }

    /// Raw value stored under `dest`.
    pub fn get(&self, dest: &str) -> Option<&ArgValue> {
        self.values.get(dest)
    }

    /// Returns `true` if `dest` was registered on the command path.
    pub fn contains(&self, dest: &str) -> bool {
        self.values.contains_key(dest)
    }

    /// Boolean switch value; `false` for anything that is not a switch.
    pub fn flag(&self, dest: &str) -> bool {
        matches!(self.get(dest), Some(ArgValue::Switch(true)))
    }

    /// Occurrence count; `0` for anything that is not a counter.
    pub fn count(&self, dest: &str) -> u8 {
        match self.get(dest) {
            Some(ArgValue::Count(n)) => *n,
            _ => 0,
        }
    }

    /// Single stored value, or the last of a repeatable flag's values.
    pub fn value(&self, dest: &str) -> Option<&str> {
        match self.get(dest)? {
            ArgValue::Value(value) => value.as_deref(),
            ArgValue::Values(values) => values.last().map(String::as_str),
            _ => None,
        }
    }

    /// All values of a repeatable flag, or the single stored value.
    pub fn values(&self, dest: &str) -> Vec<&str> {
        match self.get(dest) {
            Some(ArgValue::Values(values)) => values.iter().map(String::as_str).collect(),
            Some(ArgValue::Value(Some(value))) => vec![value.as_str()],
            _ => Vec::new(),
        }
    }

    /// Iterates over `(dest, value)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ArgValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of stored values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if no flags were registered on the path.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
