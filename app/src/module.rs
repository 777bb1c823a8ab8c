//! Members, modules, and the module-loading collaborator.
//!
//! A [`Module`] is an explicit registration table: its members are listed in
//! declaration order, each with optional [`CommandMeta`]. Only members that
//! carry metadata become commands.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use skal_core::{CommandMeta, FlagTable, Location};
use tracing::debug;

use crate::args::CommandArgs;
use crate::error::{CommandResult, LoadError};

/// A bound command implementation.
pub type Handler = Rc<dyn Fn(&CommandArgs) -> CommandResult>;

/// One member of a module or application.
///
/// # Examples
///
/// ```
/// use skal_app::{command, Member};
///
/// let member = Member::new("first", |_args| Ok(()))
///     .with_doc("first command")
///     .command(command(None));
///
/// assert!(member.is_command());
/// assert!(member.location.file.ends_with(".rs"));
/// ```
#[derive(Clone)]
pub struct Member {
    /// Member name, used as the command name.
    pub name: String,
    /// Documentation, cleaned into help and description.
    pub doc: Option<String>,
    /// Where the member was declared.
    pub location: Location,
    /// Command metadata; `None` keeps the member off the command line.
    pub meta: Option<CommandMeta>,
    handler: Handler,
}

impl Member {
    /// Creates a plain member declared at the caller's location.
    #[track_caller]
    pub fn new<F>(name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&CommandArgs) -> CommandResult + 'static,
    {
        Self::from_handler(name, Rc::new(handler), Location::caller())
    }

    /// Creates a plain member from an already shared handler.
    pub fn from_handler(name: impl Into<String>, handler: Handler, location: Location) -> Self {
        Self {
            name: name.into(),
            doc: None,
            location,
            meta: None,
            handler,
        }
    }

    /// Sets the documentation.
    pub fn with_doc(mut self, doc: &str) -> Self {
        self.doc = Some(doc.to_string());
        self
    }

    /// Attaches command metadata, turning the member into a command.
    pub fn command(mut self, meta: CommandMeta) -> Self {
        self.meta = Some(meta);
        self
    }

    /// Returns `true` if the member carries command metadata.
    pub fn is_command(&self) -> bool {
        self.meta.is_some()
    }

    /// The command's own flags, if any.
    pub fn flags(&self) -> Option<&FlagTable> {
        self.meta.as_ref().and_then(CommandMeta::flags)
    }

    /// The bound implementation.
    pub fn handler(&self) -> &Handler {
        &self.handler
    }
}

impl fmt::Debug for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Member")
            .field("name", &self.name)
            .field("doc", &self.doc)
            .field("location", &self.location)
            .field("meta", &self.meta)
            .finish_non_exhaustive()
    }
}

/// A named group of members.
///
/// As a command module its commands join the root scope; as a subcommand
/// module they are grouped under the last segment of its name.
///
/// # Examples
///
/// ```
/// use skal_app::{command, Member, Module};
///
/// let module = Module::new("pkg.greetings")
///     .with_doc("Greeting commands")
///     .member(Member::new("hello", |_| Ok(())).command(command(None)))
///     .member(Member::new("helper", |_| Ok(())));
///
/// assert_eq!(module.short_name(), "greetings");
/// assert_eq!(module.command_names(), vec!["hello"]);
/// ```
#[derive(Debug, Clone)]
pub struct Module {
    /// Dotted module name.
    pub name: String,
    /// Module documentation.
    pub doc: Option<String>,
    /// Module version, shown by the group's `--version` when the module is
    /// added as a subcommand module.
    pub version: Option<String>,
    /// Flags added to the parser the module's commands attach to.
    pub flags: Option<FlagTable>,
    /// Where the module was declared.
    pub location: Location,
    /// Members in declaration order.
    pub members: Vec<Member>,
}

impl Module {
    /// Creates an empty module declared at the caller's location.
    #[track_caller]
    pub fn new(name: impl Into<String>) -> Self {
        Self::at(name, Location::caller())
    }

    /// Creates an empty module declared at `location`.
    pub fn at(name: impl Into<String>, location: Location) -> Self {
        Self {
            name: name.into(),
            doc: None,
            version: None,
            flags: None,
            location,
            members: Vec::new(),
        }
    }

    /// Sets the documentation (help line, blank line, description).
    pub fn with_doc(mut self, doc: &str) -> Self {
        self.doc = Some(doc.to_string());
        self
    }

    /// Sets the module version.
    pub fn with_version(mut self, version: &str) -> Self {
        self.version = Some(version.to_string());
        self
    }

    /// Sets the flags added to the parser the module attaches to.
    pub fn with_flags(mut self, flags: FlagTable) -> Self {
        self.flags = Some(flags);
        self
    }

    /// Appends a member.
    pub fn member(mut self, member: Member) -> Self {
        self.members.push(member);
        self
    }

    /// Last segment of the dotted name.
    pub fn short_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }

    /// Names of members that are commands, in declaration order.
    pub fn command_names(&self) -> Vec<&str> {
        self.members
            .iter()
            .filter(|m| m.is_command())
            .map(|m| m.name.as_str())
            .collect()
    }
}

/// Resolves module names to modules.
pub trait ModuleLoader {
    /// Loads the module called `name`.
    fn load(&self, name: &str) -> Result<Module, LoadError>;
}

impl<L: ModuleLoader + ?Sized> ModuleLoader for Box<L> {
    fn load(&self, name: &str) -> Result<Module, LoadError> {
        (**self).load(name)
    }
}

type ModuleFactory = Box<dyn Fn() -> Result<Module, LoadError>>;

/// In-memory loader mapping names to module factories.
///
/// Factories run on every load, so a module is built fresh for each
/// application.
///
/// # Examples
///
/// ```
/// use skal_app::{Module, ModuleLoader, ModuleRegistry};
///
/// let registry = ModuleRegistry::new().register("tools", || Ok(Module::new("tools")));
/// assert!(registry.load("tools").is_ok());
/// assert!(registry.load("missing").unwrap_err().is_not_found());
/// ```
#[derive(Default)]
pub struct ModuleRegistry {
    factories: HashMap<String, ModuleFactory>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a factory and returns the registry.
    pub fn register<F>(mut self, name: &str, factory: F) -> Self
    where
        F: Fn() -> Result<Module, LoadError> + 'static,
    {
        self.insert(name, factory);
        self
    }

    /// Registers a factory, replacing any earlier one for `name`.
    pub fn insert<F>(&mut self, name: &str, factory: F)
    where
        F: Fn() -> Result<Module, LoadError> + 'static,
    {
        self.factories.insert(name.to_string(), Box::new(factory));
    }

    /// Returns `true` if `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered module names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl ModuleLoader for ModuleRegistry {
    fn load(&self, name: &str) -> Result<Module, LoadError> {
        let factory = self.factories.get(name).ok_or_else(|| LoadError::NotFound {
            module: name.to_string(),
        })?;
        factory()
    }
}

/// Tries loaders in order.
///
/// A loader reporting [`LoadError::NotFound`] passes the name on to the next
/// one; any other result, success or failure, is final.
///
/// # Examples
///
/// ```
/// use skal_app::{LoaderChain, Module, ModuleLoader, ModuleRegistry};
///
/// let chain = LoaderChain::new()
///     .with(ModuleRegistry::new())
///     .with(ModuleRegistry::new().register("tools", || Ok(Module::new("tools"))));
///
/// assert_eq!(chain.load("tools").unwrap().name, "tools");
/// ```
#[derive(Default)]
pub struct LoaderChain {
    loaders: Vec<Box<dyn ModuleLoader>>,
}

impl LoaderChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a loader and returns the chain.
    pub fn with(mut self, loader: impl ModuleLoader + 'static) -> Self {
        self.push(loader);
        self
    }

    /// Appends a loader.
    pub fn push(&mut self, loader: impl ModuleLoader + 'static) {
        self.loaders.push(Box::new(loader));
    }

    /// Number of loaders.
    pub fn len(&self) -> usize {
        self.loaders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loaders.is_empty()
    }
}

impl ModuleLoader for LoaderChain {
    fn load(&self, name: &str) -> Result<Module, LoadError> {
        for (index, loader) in self.loaders.iter().enumerate() {
            match loader.load(name) {
                Err(LoadError::NotFound { .. }) => {
                    debug!(module = %name, loader = index, "module not found, trying next loader");
                }
                result => return result,
            }
        }
        Err(LoadError::NotFound {
            module: name.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use skal_core::command;

    use super::*;

    #[test]
    fn test_member_without_meta_is_not_a_command() {
        let member = Member::new("second", |_| Ok(())).with_doc("second command");
        assert!(!member.is_command());
        assert!(member.flags().is_none());
    }

    #[test]
    fn test_member_handler_is_invoked() {
        let calls = Rc::new(Cell::new(0));
        let seen = Rc::clone(&calls);
        let member = Member::new("first", move |_| {
            seen.set(seen.get() + 1);
            Ok(())
        })
        .command(command(None));

        (member.handler())(&CommandArgs::new(["first"])).unwrap();
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_short_name_without_dots() {
        assert_eq!(Module::new("tools").short_name(), "tools");
    }

    #[test]
    fn test_chain_stops_at_first_real_failure() {
        let chain = LoaderChain::new()
            .with(ModuleRegistry::new().register("broken", || {
                Err(LoadError::Syntax {
                    module: "broken".into(),
                    detail: "bad".into(),
                })
            }))
            .with(ModuleRegistry::new().register("broken", || Ok(Module::new("broken"))));

        let err = chain.load("broken").unwrap_err();
        assert!(matches!(err, LoadError::Syntax { .. }));

        let err = chain.load("other").unwrap_err();
        assert_eq!(
            err,
            LoadError::NotFound {
                module: "other".into()
            }
        );
    }

    #[test]
    fn test_registry_names_sorted() {
        let registry = ModuleRegistry::new()
            .register("b", || Ok(Module::new("b")))
            .register("a", || Ok(Module::new("a")));
        assert_eq!(registry.names(), vec!["a", "b"]);
        assert!(registry.contains("a"));
    }
}
