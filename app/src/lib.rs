//! Subcommand command lines from registered commands and modules.
//!
//! An application lists its methods (or a module lists its members); those
//! marked with [`command`] become subcommands. Help text comes from each
//! member's documentation, `--version` from the application's version, and
//! the selected command runs with a [`CommandArgs`] record of every flag on
//! its path. Argument parsing itself is delegated to [`clap`].
//!
//! Problems found while assembling an application never abort it: they are
//! printed as `Warning: ...` lines on stderr and kept on the [`App`].
//!
//! # Example
//!
//! ```
//! use skal_app::*;
//!
//! let greetings = ModuleRegistry::new().register("greetings", || {
//!     Ok(Module::new("greetings")
//!         .with_doc("Greeting commands")
//!         .member(
//!             Member::new("hello", |args| {
//!                 assert_eq!(args.value("name"), Some("Ada"));
//!                 Ok(())
//!             })
//!             .with_doc("Say hello")
//!             .command(command(
//!                 FlagTable::new().flag(("-n", "--name"), FlagOptions::new()),
//!             )),
//!         ))
//! });
//!
//! let app = App::builder("demo")
//!     .description("Demo application")
//!     .version("0.1")
//!     .subcommand_modules(["greetings"])
//!     .loader(greetings)
//!     .build();
//!
//! assert_eq!(app.try_run(["greetings", "hello", "--name", "Ada"]).unwrap(), 0);
//! ```

mod app;
mod args;
mod config;
mod diagnostics;
mod discover;
mod dispatch;
mod error;
mod interrupt;
mod manifest;
mod module;
mod normalize;

pub use app::{App, AppBuilder, Application, Method};
pub use args::{ArgValue, CommandArgs};
pub use config::AppConfig;
pub use diagnostics::Warning;
pub use dispatch::{EINTR_EXIT_CODE, InterruptPolicy};
pub use error::{AppError, CommandError, CommandResult, ConfigError, LoadError, Result};
pub use interrupt::InterruptFlag;
pub use manifest::{HandlerTable, ManifestLoader};
pub use module::{Handler, LoaderChain, Member, Module, ModuleLoader, ModuleRegistry};
pub use skal_core::{
    CommandMeta, DocText, FlagAction, FlagEntry, FlagKey, FlagOptions, FlagTable, Location,
    MetaError, clean_doc, command, default,
};
