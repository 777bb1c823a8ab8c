//! Command metadata.
//!
//! A member becomes a command by carrying a [`CommandMeta`]. The metadata
//! optionally holds the command's own [`FlagTable`]; members without metadata
//! stay invisible on the command line.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::FlagTable;

/// Marks a member as a command.
///
/// # Examples
///
/// ```
/// use skal_core::{CommandMeta, FlagOptions, FlagTable};
///
/// let bare = CommandMeta::bare();
/// assert!(bare.flags().is_none());
///
/// let meta = CommandMeta::with_flags(FlagTable::new().flag("-i", FlagOptions::store_true()));
/// assert_eq!(meta.flags().map(FlagTable::len), Some(1));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandMeta {
    /// Flags specific to this command.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flags: Option<FlagTable>,
}

impl CommandMeta {
    /// Metadata without a flag table.
    pub fn bare() -> Self {
        Self::default()
    }

    /// Metadata carrying `flags`.
    pub fn with_flags(flags: FlagTable) -> Self {
        Self { flags: Some(flags) }
    }

    /// The command's own flags, if declared.
    pub fn flags(&self) -> Option<&FlagTable> {
        self.flags.as_ref()
    }
}

impl From<FlagTable> for CommandMeta {
    fn from(flags: FlagTable) -> Self {
        Self::with_flags(flags)
    }
}

/// Errors raised while building command metadata.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MetaError {
    /// The requested capability exists in the API but has no behavior.
    #[error("{0} is not implemented")]
    NotImplemented(&'static str),
}

/// Builds command metadata.
///
/// Accepts both call shapes: `command(None)` marks a bare command, and
/// `command(table)` attaches the command's flag table.
///
/// # Examples
///
/// ```
/// use skal_core::{command, FlagOptions, FlagTable};
///
/// assert!(command(None).flags().is_none());
///
/// let meta = command(FlagTable::new().flag(("-t", "--test"), FlagOptions::new()));
/// assert!(meta.flags().unwrap().contains(&("-t", "--test").into()));
/// ```
pub fn command(flags: impl Into<Option<FlagTable>>) -> CommandMeta {
    CommandMeta {
        flags: flags.into(),
    }
}

/// Marks a command as the one to run when none is named.
///
/// Not supported: always fails with [`MetaError::NotImplemented`].
///
/// # Examples
///
/// ```
/// use skal_core::{command, default, MetaError};
///
/// assert_eq!(default(command(None)), Err(MetaError::NotImplemented("default")));
/// ```
pub fn default(_meta: CommandMeta) -> Result<CommandMeta, MetaError> {
    Err(MetaError::NotImplemented("default"))
}
