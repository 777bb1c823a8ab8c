//! Flag table, command name and manifest validation.
//!
//! Catches structural problems before a table reaches the argument parser:
//! malformed option strings, names or destinations declared twice in one
//! scope, and empty or malformed command names.
//!
//! # Examples
//!
//! ```
//! use skal_core::*;
//!
//! let table = FlagTable::new().flag("-b", FlagOptions::store_true());
//! assert!(validate_flag_table(&table).is_empty());
//!
//! // Invalid: short flag missing leading dash on a pair key
//! let bad = FlagTable::new().flag(("b", "--bool"), FlagOptions::store_true());
//! assert!(!validate_flag_table(&bad).is_empty());
//! ```

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::{FlagEntry, FlagKey, FlagTable, ModuleManifest};

static SHORT_FLAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-[^-\s]$").expect("valid short flag pattern"));
static LONG_FLAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^--[A-Za-z0-9][A-Za-z0-9_.-]*$").expect("valid long flag pattern")
});
static POSITIONAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_-]*$").expect("valid positional pattern")
});
static COMMAND_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_][A-Za-z0-9_.-]*$").expect("valid command name pattern")
});

/// Validation errors.
///
/// Each variant describes one structural problem. The `Display` impl gives
/// the human-readable message used in diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Command or module name is empty or whitespace-only.
    #[error("command name cannot be empty")]
    EmptyCommandName,
    /// Command name contains characters a command line cannot carry.
    #[error("invalid command name: {0}")]
    InvalidCommandName(String),
    /// Two members of the same manifest share a name.
    #[error("duplicate command in module: {0}")]
    DuplicateCommand(String),
    /// A flag key has no option strings at all.
    #[error("flag must define short or long form")]
    MissingFlagName,
    /// Short flag is not a dash followed by one character.
    #[error("invalid short flag format: {0}")]
    InvalidShortFlag(String),
    /// Long flag does not start with `--` or is malformed.
    #[error("invalid long flag format: {0}")]
    InvalidLongFlag(String),
    /// Single-dash flag with more than one character (`-foo`).
    #[error("single-dash flags must be one character: {0}")]
    MultiCharShortFlag(String),
    /// Positional name is not a plain identifier.
    #[error("invalid positional argument name: {0}")]
    InvalidPositional(String),
    /// Two flags in the same scope share an option string.
    #[error("conflicting option string: {0}")]
    DuplicateFlag(String),
    /// Two flags in the same scope store under the same key.
    #[error("conflicting destination: {0}")]
    DuplicateDest(String),
}

/// Checks the option strings of one key in isolation.
///
/// # Examples
///
/// ```
/// use skal_core::{validate_flag_key, FlagKey, ValidationError};
///
/// assert!(validate_flag_key(&"-b".into()).is_ok());
/// assert!(validate_flag_key(&("-s", "--string").into()).is_ok());
/// assert_eq!(
///     validate_flag_key(&"-foo".into()),
///     Err(ValidationError::MultiCharShortFlag("-foo".into())),
/// );
/// assert_eq!(
///     validate_flag_key(&FlagKey::pair(None, None)),
///     Err(ValidationError::MissingFlagName),
/// );
/// ```
pub fn validate_flag_key(key: &FlagKey) -> Result<(), ValidationError> {
    let names = key.names();
    if names.is_empty() {
        return Err(ValidationError::MissingFlagName);
    }

    if key.is_positional() {
        let name = names[0];
        if !POSITIONAL.is_match(name) {
            return Err(ValidationError::InvalidPositional(name.to_string()));
        }
        return Ok(());
    }

    for name in names {
        if name.starts_with("--") {
            if !LONG_FLAG.is_match(name) {
                return Err(ValidationError::InvalidLongFlag(name.to_string()));
            }
        } else if name.starts_with('-') {
            if name.chars().count() > 2 && !name.contains(char::is_whitespace) {
                return Err(ValidationError::MultiCharShortFlag(name.to_string()));
            }
            if !SHORT_FLAG.is_match(name) {
                return Err(ValidationError::InvalidShortFlag(name.to_string()));
            }
        } else {
            return Err(ValidationError::InvalidShortFlag(name.to_string()));
        }
    }

    Ok(())
}

/// Validates every entry of a table against the others.
///
/// Unlike a fail-fast check, all problems are collected so each offending
/// flag can be reported on its own.
///
/// # Examples
///
/// ```
/// use skal_core::*;
///
/// let table = FlagTable::new()
///     .flag("-b", FlagOptions::store_true())
///     .flag(("-b", "--bool"), FlagOptions::store_true());
///
/// assert_eq!(
///     validate_flag_table(&table),
///     vec![ValidationError::DuplicateFlag("-b".into())],
/// );
/// ```
pub fn validate_flag_table(table: &FlagTable) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let mut seen_names: HashSet<String> = HashSet::new();
    let mut seen_dests: HashSet<String> = HashSet::new();

    for entry in table {
        if let Err(err) = check_entry(entry, &seen_names, &seen_dests) {
            errors.push(err);
            continue;
        }
        seen_names.extend(entry.key.names().into_iter().map(String::from));
        if let Some(dest) = entry.dest() {
            seen_dests.insert(dest);
        }
    }

    errors
}

/// Checks one entry against the option strings and destinations already
/// claimed in its scope.
///
/// Used by table validation and by callers that register flags one at a time
/// into a scope that already holds other flags.
pub fn check_entry(
    entry: &FlagEntry,
    taken_names: &HashSet<String>,
    taken_dests: &HashSet<String>,
) -> Result<(), ValidationError> {
    validate_flag_key(&entry.key)?;

    if let Some(name) = entry
        .key
        .names()
        .into_iter()
        .find(|n| !entry.key.is_positional() && taken_names.contains(*n))
    {
        return Err(ValidationError::DuplicateFlag(name.to_string()));
    }

    let dest = entry.dest().ok_or(ValidationError::MissingFlagName)?;
    if taken_dests.contains(&dest) {
        return Err(ValidationError::DuplicateDest(dest));
    }

    Ok(())
}

/// Checks that `name` can be used as a subcommand name.
///
/// # Examples
///
/// ```
/// use skal_core::{validate_command_name, ValidationError};
///
/// assert!(validate_command_name("no_doc").is_ok());
/// assert_eq!(validate_command_name(" "), Err(ValidationError::EmptyCommandName));
/// assert!(validate_command_name("-x").is_err());
/// ```
pub fn validate_command_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::EmptyCommandName);
    }
    if !COMMAND_NAME.is_match(name) {
        return Err(ValidationError::InvalidCommandName(name.to_string()));
    }
    Ok(())
}

/// Validates a module manifest.
///
/// Checks the module name, every member name, duplicate member names, and
/// the module and command flag tables.
///
/// # Examples
///
/// ```
/// use skal_core::*;
///
/// let mut manifest = ModuleManifest::new("tools");
/// manifest.members.push(MemberManifest::new("first").as_command(command(None)));
/// assert!(validate_manifest(&manifest).is_empty());
///
/// manifest.members.push(MemberManifest::new("first"));
/// let errors = validate_manifest(&manifest);
/// assert!(errors.iter().any(|e| matches!(e, ValidationError::DuplicateCommand(_))));
/// ```
pub fn validate_manifest(manifest: &ModuleManifest) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    for segment in manifest.name.split('.') {
        if let Err(err) = validate_command_name(segment) {
            errors.push(err);
            return errors;
        }
    }

    errors.extend(validate_flag_table(&manifest.flags));

    let mut seen: HashSet<&str> = HashSet::new();
    for member in &manifest.members {
        if let Err(err) = validate_command_name(&member.name) {
            errors.push(err);
            continue;
        }
        if !seen.insert(member.name.as_str()) {
            errors.push(ValidationError::DuplicateCommand(member.name.clone()));
            continue;
        }
        if let Some(flags) = member.command.as_ref().and_then(|m| m.flags()) {
            errors.extend(validate_flag_table(flags));
        }
    }

    errors
}
