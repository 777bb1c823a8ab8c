//! Core types for building subcommand command lines.
//!
//! This crate defines the declarative side of skal:
//!
//! - [`FlagTable`]: ordered flag specifications, keyed by a single option
//!   string or a `(short, long)` pair ([`FlagKey`]) with [`FlagOptions`].
//! - [`CommandMeta`]: the marker that turns a member into a command,
//!   optionally carrying its own flags. Built with [`command`].
//! - [`DocText`]: help line and description derived from documentation.
//! - [`ModuleManifest`]: a serializable module of members for YAML/JSON
//!   command definitions.
//!
//! Validation ([`validate_flag_table`], [`validate_manifest`]) catches
//! malformed option strings and names declared twice in one scope before they
//! reach the argument parser.
//!
//! # Example
//!
//! ```
//! use skal_core::*;
//!
//! let meta = command(
//!     FlagTable::new()
//!         .flag("-i", FlagOptions::store_true().with_help("bool argument"))
//!         .flag(("-t", "--test"), FlagOptions::new().with_help("string argument")),
//! );
//!
//! let flags = meta.flags().unwrap();
//! assert!(validate_flag_table(flags).is_empty());
//!
//! let doc = DocText::parse(Some("third command\n\n    Runs the third step.")).unwrap();
//! assert_eq!(doc.help, "third command");
//! ```

mod doc;
mod manifest;
mod meta;
mod types;
mod validate;

pub use doc::{DocText, clean_doc};
pub use manifest::{MemberManifest, ModuleManifest};
pub use meta::{CommandMeta, MetaError, command, default};
pub use types::*;
pub use validate::{
    ValidationError, check_entry, validate_command_name, validate_flag_key,
    validate_flag_table, validate_manifest,
};
