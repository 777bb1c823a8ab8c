//! Flag table to clap argument conversion.
//!
//! Each parser scope (root, module group, command) owns a [`FlagScope`] that
//! remembers which option strings and destinations are taken. Every entry is
//! checked against the scope before an [`Arg`] is built, so a bad entry is
//! reported as a warning and skipped while the rest of the table is still
//! added. clap is never handed an argument it would reject with a panic.

use std::collections::HashSet;

use clap::builder::PossibleValuesParser;
use clap::{Arg, ArgAction, Command};
use skal_core::{FlagAction, FlagEntry, FlagTable, check_entry};
use tracing::debug;

use crate::diagnostics::{Diagnostics, Warning};

/// Id of the `-h/--help` argument every parser carries.
pub(crate) const HELP_ID: &str = "help";
/// Id of the root `--version` argument.
pub(crate) const VERSION_ID: &str = "version";

/// Kind of parser a scope belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ScopeKind {
    Root { versioned: bool },
    Group { versioned: bool },
    Command,
}

impl ScopeKind {
    /// Whether the parser carries its own `--version`.
    fn versioned(self) -> bool {
        matches!(
            self,
            Self::Root { versioned: true } | Self::Group { versioned: true }
        )
    }
}

/// A flag that made it into a parser, read back at dispatch time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FlagSlot {
    pub(crate) dest: String,
    pub(crate) action: FlagAction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Positionals {
    Open,
    OptionalSeen,
    Closed,
}

/// Option strings and destinations claimed in one parser.
#[derive(Debug)]
pub(crate) struct FlagScope {
    kind: ScopeKind,
    names: HashSet<String>,
    dests: HashSet<String>,
    slots: Vec<FlagSlot>,
    positionals: Positionals,
}

impl FlagScope {
    pub(crate) fn new(kind: ScopeKind) -> Self {
        let mut names: HashSet<String> = ["-h", "--help"].into_iter().map(String::from).collect();
        let mut dests: HashSet<String> = HashSet::from([HELP_ID.to_string()]);
        if kind.versioned() {
            names.insert("--version".to_string());
            dests.insert(VERSION_ID.to_string());
        }
        Self {
            kind,
            names,
            dests,
            slots: Vec::new(),
            positionals: Positionals::Open,
        }
    }

    /// Flags added so far, in order.
    #[cfg(test)]
    pub(crate) fn slots(&self) -> &[FlagSlot] {
        &self.slots
    }

    pub(crate) fn into_slots(self) -> Vec<FlagSlot> {
        self.slots
    }

    /// Checks `entry` against the scope and claims its names on success.
    fn admit(&mut self, entry: &FlagEntry) -> Result<String, String> {
        check_entry(entry, &self.names, &self.dests).map_err(|e| e.to_string())?;
        let dest = entry
            .dest()
            .ok_or_else(|| "flag must define short or long form".to_string())?;
        let opts = &entry.options;
        let positional = entry.key.is_positional();

        if positional {
            if self.kind != ScopeKind::Command {
                return Err("positional arguments are only allowed on commands".into());
            }
            if !opts.action.takes_value() {
                return Err("positional arguments must take a value".into());
            }
            let required = opts.default.is_none();
            match self.positionals {
                Positionals::Closed => {
                    return Err("no positional argument may follow a repeated one".into());
                }
                Positionals::OptionalSeen if required => {
                    return Err(
                        "a required positional argument cannot follow an optional one".into(),
                    );
                }
                _ => {}
            }
        } else if opts.required {
            if !opts.action.takes_value() {
                return Err("only flags that take a value can be required".into());
            }
            if opts.default.is_some() {
                return Err("a required flag cannot have a default".into());
            }
        }

        if let Some(default) = &opts.default {
            if opts.action.takes_value() && !opts.choices.is_empty() && !opts.choices.contains(default)
            {
                return Err(format!("default {default:?} is not one of the choices"));
            }
        }

        if positional {
            if opts.action == FlagAction::Append {
                self.positionals = Positionals::Closed;
            } else if opts.default.is_some() {
                self.positionals = Positionals::OptionalSeen;
            }
        } else {
            self.names
                .extend(entry.key.names().into_iter().map(String::from));
        }
        self.dests.insert(dest.clone());
        self.slots.push(FlagSlot {
            dest: dest.clone(),
            action: opts.action,
        });
        Ok(dest)
    }
}

/// Adds every acceptable entry of `table` to `cmd`.
///
/// Rejected entries are reported as `argument error` warnings; processing
/// continues with the next entry.
pub(crate) fn add_flags(
    mut cmd: Command,
    table: &FlagTable,
    scope: &mut FlagScope,
    diags: &mut Diagnostics,
) -> Command {
    for entry in table {
        match scope.admit(entry) {
            Ok(dest) => {
                debug!(command = %cmd.get_name(), flag = %entry.key, dest = %dest, "adding flag");
                cmd = cmd.arg(build_arg(entry, dest));
            }
            Err(reason) => diags.warn(Warning::ArgumentError {
                flag: entry.key.to_string(),
                reason,
            }),
        }
    }
    cmd
}

fn build_arg(entry: &FlagEntry, dest: String) -> Arg {
    let opts = &entry.options;
    let positional = entry.key.is_positional();
    let mut arg = Arg::new(dest);

    if positional {
        arg = arg.required(opts.default.is_none());
    } else {
        let mut has_short = false;
        let mut has_long = false;
        for name in entry.key.names() {
            if let Some(long) = name.strip_prefix("--") {
                arg = if has_long {
                    arg.visible_alias(long.to_string())
                } else {
                    arg.long(long.to_string())
                };
                has_long = true;
            } else if let Some(short) = name.strip_prefix('-').and_then(|s| s.chars().next()) {
                arg = if has_short {
                    arg.visible_short_alias(short)
                } else {
                    arg.short(short)
                };
                has_short = true;
            }
        }
        if opts.required {
            arg = arg.required(true);
        }
    }

    arg = match opts.action {
        FlagAction::Store => arg.action(ArgAction::Set).num_args(1),
        FlagAction::StoreTrue => arg.action(ArgAction::SetTrue),
        FlagAction::StoreFalse => arg.action(ArgAction::SetFalse),
        FlagAction::Count => arg.action(ArgAction::Count),
        FlagAction::Append if positional => arg.action(ArgAction::Append).num_args(1..),
        FlagAction::Append => arg.action(ArgAction::Append).num_args(1),
    };

    if let Some(help) = &opts.help {
        arg = arg.help(help.clone());
    }

    // Defaults and value constraints only apply to value-taking actions.
    if opts.action.takes_value() {
        if let Some(metavar) = &opts.metavar {
            arg = arg.value_name(metavar.clone());
        }
        if let Some(default) = &opts.default {
            arg = arg.default_value(default.clone());
        }
        if !opts.choices.is_empty() {
            arg = arg.value_parser(PossibleValuesParser::new(opts.choices.clone()));
        }
    }

    arg
}

#[cfg(test)]
mod tests {
    use skal_core::{FlagKey, FlagOptions};

    use super::*;

    fn apply(kind: ScopeKind, table: &FlagTable) -> (Command, FlagScope, Vec<Warning>) {
        let mut scope = FlagScope::new(kind);
        let mut diags = Diagnostics::new(false);
        let cmd = add_flags(Command::new("prog"), table, &mut scope, &mut diags);
        (cmd, scope, diags.into_warnings())
    }

    #[test]
    fn test_single_and_pair_keys() {
        let table = FlagTable::new()
            .flag("-b", FlagOptions::store_true().with_help("bool argument"))
            .flag(("-s", "--string"), FlagOptions::new())
            .flag(FlagKey::pair(None, Some("--only-long")), FlagOptions::new());
        let (cmd, scope, warnings) = apply(ScopeKind::Root { versioned: true }, &table);

        assert!(warnings.is_empty());
        let dests: Vec<_> = scope.slots().iter().map(|s| s.dest.as_str()).collect();
        assert_eq!(dests, vec!["b", "string", "only_long"]);

        let matches = cmd
            .try_get_matches_from(["prog", "-b", "--string=test", "--only-long", "x"])
            .unwrap();
        assert!(matches.get_flag("b"));
        assert_eq!(matches.get_one::<String>("string").unwrap(), "test");
        assert_eq!(matches.get_one::<String>("only_long").unwrap(), "x");
    }

    #[test]
    fn test_bad_entry_is_skipped_and_rest_added() {
        let table = FlagTable::new()
            .flag("-foo", FlagOptions::store_true())
            .flag("-h", FlagOptions::store_true())
            .flag("-i", FlagOptions::store_true())
            .flag(("-i", "--again"), FlagOptions::store_true());
        let (_, scope, warnings) = apply(ScopeKind::Command, &table);

        assert_eq!(scope.slots().len(), 1);
        assert_eq!(
            warnings
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>(),
            vec![
                "argument error: -foo: single-dash flags must be one character: -foo",
                "argument error: -h: conflicting option string: -h",
                "argument error: -i/--again: conflicting option string: -i",
            ]
        );
    }

    #[test]
    fn test_version_is_reserved_only_on_versioned_parsers() {
        let table = FlagTable::new().flag("--version", FlagOptions::store_true());

        let (_, _, warnings) = apply(ScopeKind::Root { versioned: true }, &table);
        assert_eq!(warnings.len(), 1);

        let (_, _, warnings) = apply(ScopeKind::Group { versioned: true }, &table);
        assert_eq!(warnings.len(), 1);

        let (_, scope, warnings) = apply(ScopeKind::Group { versioned: false }, &table);
        assert!(warnings.is_empty());
        assert_eq!(scope.slots().len(), 1);

        let (_, scope, warnings) = apply(ScopeKind::Root { versioned: false }, &table);
        assert!(warnings.is_empty());
        assert_eq!(scope.slots()[0].dest, "version");
    }

    #[test]
    fn test_positionals_only_on_commands() {
        let table = FlagTable::new().flag("path", FlagOptions::new());

        let (_, _, warnings) = apply(ScopeKind::Group { versioned: false }, &table);
        assert_eq!(
            warnings[0].to_string(),
            "argument error: path: positional arguments are only allowed on commands"
        );

        let (cmd, _, warnings) = apply(ScopeKind::Command, &table);
        assert!(warnings.is_empty());
        let matches = cmd.try_get_matches_from(["prog", "notes.txt"]).unwrap();
        assert_eq!(matches.get_one::<String>("path").unwrap(), "notes.txt");
    }

    #[test]
    fn test_nothing_follows_repeated_positional() {
        let table = FlagTable::new()
            .flag("first", FlagOptions::new())
            .flag("rest", FlagOptions::append())
            .flag("after", FlagOptions::new().with_default("z"));
        let (cmd, scope, warnings) = apply(ScopeKind::Command, &table);

        let dests: Vec<_> = scope.slots().iter().map(|s| s.dest.as_str()).collect();
        assert_eq!(dests, vec!["first", "rest"]);
        assert_eq!(
            warnings[0].to_string(),
            "argument error: after: no positional argument may follow a repeated one"
        );

        let matches = cmd.try_get_matches_from(["prog", "a", "b", "c"]).unwrap();
        let rest: Vec<_> = matches.get_many::<String>("rest").unwrap().collect();
        assert_eq!(rest, vec!["b", "c"]);
    }

    #[test]
    fn test_required_positional_after_optional_is_rejected() {
        let table = FlagTable::new()
            .flag("first", FlagOptions::new().with_default("a"))
            .flag("second", FlagOptions::new());
        let (_, scope, warnings) = apply(ScopeKind::Command, &table);

        assert_eq!(scope.slots().len(), 1);
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_options_that_clap_would_reject_are_warned() {
        let table = FlagTable::new()
            .flag("--mode", FlagOptions::new().with_choices(["a", "b"]).with_default("c"))
            .flag("--need", FlagOptions::new().required().with_default("x"))
            .flag("--flag", FlagOptions::store_true().required());
        let (_, scope, warnings) = apply(ScopeKind::Command, &table);

        assert!(scope.slots().is_empty());
        assert_eq!(warnings.len(), 3);
    }

    #[test]
    fn test_actions_and_choices() {
        let table = FlagTable::new()
            .flag(("-v", "--verbose"), FlagOptions::count())
            .flag("--tag", FlagOptions::append())
            .flag("--no-color", FlagOptions::store_false().with_dest("color"))
            .flag(
                "--format",
                FlagOptions::new().with_choices(["json", "yaml"]).with_default("json"),
            );
        let (cmd, _, warnings) = apply(ScopeKind::Command, &table);
        assert!(warnings.is_empty());

        let matches = cmd
            .clone()
            .try_get_matches_from(["prog", "-vv", "--tag", "a", "--tag", "b", "--no-color"])
            .unwrap();
        assert_eq!(*matches.get_one::<u8>("verbose").unwrap(), 2);
        let tags: Vec<_> = matches.get_many::<String>("tag").unwrap().collect();
        assert_eq!(tags, vec!["a", "b"]);
        assert!(!matches.get_flag("color"));
        assert_eq!(matches.get_one::<String>("format").unwrap(), "json");

        assert!(
            cmd.try_get_matches_from(["prog", "--format", "toml"])
                .is_err()
        );
    }
}
