//! Flag specification types.
//!
//! A [`FlagTable`] is the declarative description of the switches a parser
//! scope accepts. Each entry pairs a [`FlagKey`] (the option strings) with
//! [`FlagOptions`] (help, action, default and friends). Tables serialize as
//! a list so they can live in YAML or JSON manifests:
//!
//! ```yaml
//! - key: "-b"
//!   help: bool argument
//!   action: store_true
//! - key: ["-s", "--string"]
//!   help: string argument with long name
//! ```

use std::fmt;
use std::panic;

use serde::{Deserialize, Serialize};

/// Version of the manifest contract (semver).
///
/// Embedded in every [`ModuleManifest`](crate::ModuleManifest) written by
/// this crate.
pub const MANIFEST_CONTRACT_VERSION: &str = "1.0.0";

/// Option strings for one flag.
///
/// Either a single token (`"-b"`, `"--verbose"`, or a bare name for a
/// positional argument) or a `(short, long)` pair where each side may be
/// absent.
///
/// # Examples
///
/// ```
/// use skal_core::FlagKey;
///
/// let key = FlagKey::from(("-s", "--string"));
/// assert_eq!(key.names(), vec!["-s", "--string"]);
/// assert_eq!(key.to_string(), "-s/--string");
///
/// let key = FlagKey::pair(None, Some("--test"));
/// assert_eq!(key.names(), vec!["--test"]);
///
/// assert!(FlagKey::from("path").is_positional());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FlagKey {
    /// One option string, or a positional name when it has no leading dash.
    Single(String),
    /// Short and long forms, either of which may be missing.
    Pair(Option<String>, Option<String>),
}

impl FlagKey {
    /// Creates a single-token key.
    pub fn single(name: impl Into<String>) -> Self {
        Self::Single(name.into())
    }

    /// Creates a `(short, long)` key.
    pub fn pair(short: Option<&str>, long: Option<&str>) -> Self {
        Self::Pair(short.map(String::from), long.map(String::from))
    }

    /// Returns the option strings in declaration order, skipping absent
    /// sides of a pair.
    pub fn names(&self) -> Vec<&str> {
        match self {
            Self::Single(name) => vec![name.as_str()],
            Self::Pair(short, long) => short
                .as_deref()
                .into_iter()
                .chain(long.as_deref())
                .collect(),
        }
    }

    /// Returns `true` if the key names a positional argument.
    pub fn is_positional(&self) -> bool {
        match self {
            Self::Single(name) => !name.starts_with('-'),
            Self::Pair(..) => false,
        }
    }

    /// Returns the first short option string (`-x`), if any.
    pub fn short(&self) -> Option<&str> {
        self.names()
            .into_iter()
            .find(|n| n.starts_with('-') && !n.starts_with("--"))
    }

    /// Returns the first long option string (`--name`), if any.
    pub fn long(&self) -> Option<&str> {
        self.names().into_iter().find(|n| n.starts_with("--"))
    }
}

impl fmt::Display for FlagKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = self.names();
        if names.is_empty() {
            return f.write_str("<unnamed>");
        }
        f.write_str(&names.join("/"))
    }
}

impl From<&str> for FlagKey {
    fn from(name: &str) -> Self {
        Self::single(name)
    }
}

impl From<String> for FlagKey {
    fn from(name: String) -> Self {
        Self::Single(name)
    }
}

impl From<(&str, &str)> for FlagKey {
    fn from((short, long): (&str, &str)) -> Self {
        Self::pair(Some(short), Some(long))
    }
}

impl From<(Option<&str>, Option<&str>)> for FlagKey {
    fn from((short, long): (Option<&str>, Option<&str>)) -> Self {
        Self::pair(short, long)
    }
}

/// What the parser does when it meets a flag.
///
/// Names follow the argparse vocabulary so tables read the same in any
/// manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagAction {
    /// Store the single value that follows the flag (the default).
    #[default]
    Store,
    /// Boolean switch, `false` unless given.
    StoreTrue,
    /// Boolean switch, `true` unless given.
    StoreFalse,
    /// Count occurrences (`-vvv`).
    Count,
    /// Collect a value each time the flag appears.
    Append,
}

impl FlagAction {
    /// Returns `true` if the flag consumes a value from the command line.
    pub fn takes_value(self) -> bool {
        matches!(self, Self::Store | Self::Append)
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// Parsing options for one flag, forwarded to the parser as-is.
///
/// # Examples
///
/// ```
/// use skal_core::{FlagAction, FlagOptions};
///
/// let opts = FlagOptions::store_true().with_help("bool argument");
/// assert_eq!(opts.action, FlagAction::StoreTrue);
/// assert_eq!(opts.help.as_deref(), Some("bool argument"));
///
/// let opts = FlagOptions::new().with_choices(["json", "yaml"]).with_default("json");
/// assert_eq!(opts.choices.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagOptions {
    /// Help line shown next to the flag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
    /// Parser action.
    #[serde(default)]
    pub action: FlagAction,
    /// Default value when the flag is omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    /// Key under which the parsed value is stored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dest: Option<String>,
    /// Placeholder shown for the value in help output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metavar: Option<String>,
    /// Whether the flag must be given.
    #[serde(default, skip_serializing_if = "is_false")]
    pub required: bool,
    /// Allowed values.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<String>,
}

impl FlagOptions {
    /// Options for a flag that stores one value.
    pub fn new() -> Self {
        Self::default()
    }

    /// Options for a `store_true` switch.
    pub fn store_true() -> Self {
        Self::with_action(FlagAction::StoreTrue)
    }

    /// Options for a `store_false` switch.
    pub fn store_false() -> Self {
        Self::with_action(FlagAction::StoreFalse)
    }

    /// Options for an occurrence counter.
    pub fn count() -> Self {
        Self::with_action(FlagAction::Count)
    }

    /// Options for a repeatable flag.
    pub fn append() -> Self {
        Self::with_action(FlagAction::Append)
    }

    /// Options with the given action.
    pub fn with_action(action: FlagAction) -> Self {
        Self {
            action,
            ..Self::default()
        }
    }

    /// Sets the help line.
    pub fn with_help(mut self, help: &str) -> Self {
        self.help = Some(help.to_string());
        self
    }

    /// Sets the default value.
    pub fn with_default(mut self, default: &str) -> Self {
        self.default = Some(default.to_string());
        self
    }

    /// Overrides the destination key.
    pub fn with_dest(mut self, dest: &str) -> Self {
        self.dest = Some(dest.to_string());
        self
    }

    /// Sets the value placeholder.
    pub fn with_metavar(mut self, metavar: &str) -> Self {
        self.metavar = Some(metavar.to_string());
        self
    }

    /// Marks the flag as required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Restricts the accepted values.
    pub fn with_choices<I, S>(mut self, choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.choices = choices.into_iter().map(Into::into).collect();
        self
    }
}

/// One row of a [`FlagTable`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagEntry {
    /// Option strings.
    pub key: FlagKey,
    /// Parsing options.
    #[serde(flatten)]
    pub options: FlagOptions,
}

impl FlagEntry {
    /// Creates an entry.
    pub fn new(key: impl Into<FlagKey>, options: FlagOptions) -> Self {
        Self {
            key: key.into(),
            options,
        }
    }

    /// Returns the key the parsed value is stored under.
    ///
    /// Follows argparse: an explicit `dest`, else the first long name, else
    /// the first short name, with leading dashes removed and inner dashes
    /// turned into underscores. Positional arguments use their own name.
    ///
    /// # Examples
    ///
    /// ```
    /// use skal_core::{FlagEntry, FlagOptions};
    ///
    /// let entry = FlagEntry::new(("-s", "--dry-run"), FlagOptions::store_true());
    /// assert_eq!(entry.dest().as_deref(), Some("dry_run"));
    ///
    /// let entry = FlagEntry::new("-b", FlagOptions::store_true());
    /// assert_eq!(entry.dest().as_deref(), Some("b"));
    /// ```
    pub fn dest(&self) -> Option<String> {
        if let Some(dest) = &self.options.dest {
            return Some(dest.clone());
        }
        let raw = if self.key.is_positional() {
            self.key.names().first().copied()
        } else {
            self.key
                .long()
                .or_else(|| self.key.short())
                .map(|n| n.trim_start_matches('-'))
        }?;
        if raw.is_empty() {
            return None;
        }
        Some(raw.replace('-', "_"))
    }
}

/// Ordered table of flag specifications.
///
/// # Examples
///
/// ```
/// use skal_core::{FlagOptions, FlagTable};
///
/// let table = FlagTable::new()
///     .flag("-b", FlagOptions::store_true().with_help("bool argument"))
///     .flag(("-s", "--string"), FlagOptions::new().with_help("string argument"));
///
/// assert_eq!(table.len(), 2);
/// assert!(table.contains(&"-b".into()));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlagTable {
    entries: Vec<FlagEntry>,
}

impl FlagTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a flag and returns the table.
    pub fn flag(mut self, key: impl Into<FlagKey>, options: FlagOptions) -> Self {
        self.push(FlagEntry::new(key, options));
        self
    }

    /// Appends an entry.
    pub fn push(&mut self, entry: FlagEntry) {
        self.entries.push(entry);
    }

    /// Looks up the options declared for `key`.
    pub fn get(&self, key: &FlagKey) -> Option<&FlagOptions> {
        self.entries
            .iter()
            .find(|e| &e.key == key)
            .map(|e| &e.options)
    }

    /// Returns `true` if the table declares `key`.
    pub fn contains(&self, key: &FlagKey) -> bool {
        self.get(key).is_some()
    }

    /// Iterates over entries in declaration order.
    pub fn iter(&self) -> std::slice::Iter<'_, FlagEntry> {
        self.entries.iter()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a FlagTable {
    type Item = &'a FlagEntry;
    type IntoIter = std::slice::Iter<'a, FlagEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl<K: Into<FlagKey>> FromIterator<(K, FlagOptions)> for FlagTable {
    fn from_iter<T: IntoIterator<Item = (K, FlagOptions)>>(iter: T) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(key, options)| FlagEntry::new(key, options))
                .collect(),
        }
    }
}

/// Where a command or module was declared.
///
/// Used in diagnostics so a warning points at the offending source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// Source file (Rust file or manifest path).
    pub file: String,
    /// Line, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
}

impl Location {
    /// Location of a file without line information.
    pub fn file(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            line: None,
        }
    }

    /// Location of the caller of the function this is invoked from.
    #[track_caller]
    pub fn caller() -> Self {
        let loc = panic::Location::caller();
        Self {
            file: loc.file().to_string(),
            line: Some(loc.line()),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "{}:{line}", self.file),
            None => f.write_str(&self.file),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_key_pair_skips_missing_side() {
        let key = FlagKey::pair(Some("-t"), None);
        assert_eq!(key.names(), vec!["-t"]);
        assert_eq!(key.short(), Some("-t"));
        assert_eq!(key.long(), None);
    }

    #[test]
    fn test_dest_prefers_long_name() {
        let entry = FlagEntry::new(("-t", "--test"), FlagOptions::new());
        assert_eq!(entry.dest().as_deref(), Some("test"));

        let entry = FlagEntry::new(("-t", "--test"), FlagOptions::new().with_dest("target"));
        assert_eq!(entry.dest().as_deref(), Some("target"));
    }

    #[test]
    fn test_dest_for_positional_and_empty_pair() {
        let entry = FlagEntry::new("file-name", FlagOptions::new());
        assert_eq!(entry.dest().as_deref(), Some("file_name"));

        let entry = FlagEntry::new(FlagKey::pair(None, None), FlagOptions::new());
        assert_eq!(entry.dest(), None);
    }

    #[test]
    fn test_flag_table_deserializes_both_key_shapes() {
        let yaml = r#"
- key: "-b"
  help: bool argument
  action: store_true
- key: ["-s", "--string"]
  help: string argument with long name
"#;
        let table: FlagTable = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(table.len(), 2);

        let b = table.get(&"-b".into()).unwrap();
        assert_eq!(b.action, FlagAction::StoreTrue);

        let s = table.get(&("-s", "--string").into()).unwrap();
        assert_eq!(s.action, FlagAction::Store);
        assert_eq!(s.help.as_deref(), Some("string argument with long name"));
    }

    #[test]
    fn test_flag_table_json_shape() {
        let table = FlagTable::new().flag(("-t", "--test"), FlagOptions::new());
        let json = serde_json::to_value(&table).unwrap();
        assert_eq!(
            json,
            serde_json::json!([{ "key": ["-t", "--test"], "action": "store" }])
        );
    }

    #[test]
    fn test_location_caller_records_this_file() {
        let loc = Location::caller();
        assert!(loc.file.ends_with("types.rs"));
        assert!(loc.line.is_some());
    }
}
