//! The application shell: declaring an application, assembling it and
//! running it.

use std::ffi::OsString;
use std::path::Path;
use std::process::ExitCode;
use std::rc::Rc;

use clap::Command;
use clap::error::ErrorKind;
use skal_core::{CommandMeta, DocText, FlagTable, Location};
use tracing::{debug, warn};

use crate::args::CommandArgs;
use crate::config::AppConfig;
use crate::diagnostics::{Diagnostics, Warning};
use crate::discover::{ParserNode, load_module};
use crate::dispatch::{self, DispatchNode, InterruptPolicy, Resolved};
use crate::error::{AppError, CommandError, CommandResult, Result};
use crate::interrupt::{self, InterruptFlag};
use crate::module::{Member, ModuleLoader, ModuleRegistry};

/// An application whose methods become subcommands.
///
/// Implementors list their methods in [`methods`](Application::methods);
/// only those marked with [`Method::command`] are exposed.
///
/// # Examples
///
/// ```
/// use skal_app::*;
///
/// struct Demo;
///
/// impl Application for Demo {
///     fn doc(&self) -> Option<String> {
///         Some("Demo application".into())
///     }
///
///     fn version(&self) -> Option<String> {
///         Some("0.1".into())
///     }
///
///     fn methods(&self) -> Vec<Method<Self>> {
///         vec![
///             Method::new("first", |_app: &Demo, _args| Ok(()))
///                 .with_doc("first command")
///                 .command(command(None)),
///             Method::new("helper", |_app: &Demo, _args| Ok(())),
///         ]
///     }
/// }
///
/// let app = App::builder_for(Demo).quiet(true).build();
/// assert_eq!(app.command_names(), vec!["first"]);
/// assert_eq!(app.try_run(["first"]).unwrap(), 0);
/// ```
pub trait Application: Sized + 'static {
    /// Program name; defaults to the running executable's file name.
    fn name(&self) -> String {
        program_name()
    }

    /// Documentation: help line, then the full description.
    fn doc(&self) -> Option<String> {
        None
    }

    /// Version shown by `--version`.
    fn version(&self) -> Option<String> {
        None
    }

    /// Global flags.
    fn flags(&self) -> Option<FlagTable> {
        None
    }

    /// Methods in declaration order.
    fn methods(&self) -> Vec<Method<Self>>;
}

type MethodFn<A> = Rc<dyn Fn(&A, &CommandArgs) -> CommandResult>;

/// A method of an [`Application`].
pub struct Method<A> {
    name: String,
    doc: Option<String>,
    location: Location,
    meta: Option<CommandMeta>,
    call: MethodFn<A>,
}

impl<A: 'static> Method<A> {
    /// Creates a plain method declared at the caller's location.
    #[track_caller]
    pub fn new<F>(name: impl Into<String>, call: F) -> Self
    where
        F: Fn(&A, &CommandArgs) -> CommandResult + 'static,
    {
        Self {
            name: name.into(),
            doc: None,
            location: Location::caller(),
            meta: None,
            call: Rc::new(call),
        }
    }

    /// Sets the documentation.
    pub fn with_doc(mut self, doc: &str) -> Self {
        self.doc = Some(doc.to_string());
        self
    }

    /// Attaches command metadata, turning the method into a command.
    pub fn command(mut self, meta: CommandMeta) -> Self {
        self.meta = Some(meta);
        self
    }

    /// Method name, used as the command name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Binds the method to `target`.
    fn bind(self, target: &Rc<A>) -> Member {
        let target = Rc::clone(target);
        let call = self.call;
        let mut member = Member::from_handler(
            self.name,
            Rc::new(move |args: &CommandArgs| call(&*target, args)),
            self.location,
        );
        member.doc = self.doc;
        member.meta = self.meta;
        member
    }
}

fn program_name() -> String {
    std::env::args_os()
        .next()
        .as_deref()
        .and_then(|arg0| Path::new(arg0).file_name())
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "app".to_string())
}

/// Assembles an [`App`].
///
/// Explicit settings take precedence over what an [`Application`] declares.
/// Parsers are populated in this order: global flags, application methods,
/// extra members, command modules, subcommand modules. Within a scope the
/// first registration of a name wins.
///
/// # Examples
///
/// ```
/// use skal_app::*;
///
/// let app = AppBuilder::new("tool")
///     .description("A tool\n\nDoes tool things.")
///     .version("1.2")
///     .flags(FlagTable::new().flag("-b", FlagOptions::store_true()))
///     .member(
///         Member::new("run", |args| {
///             assert!(args.flag("b"));
///             Ok(())
///         })
///         .with_doc("run it")
///         .command(command(None)),
///     )
///     .build();
///
/// assert!(app.warnings().is_empty());
/// assert_eq!(app.try_run(["-b", "run"]).unwrap(), 0);
/// ```
pub struct AppBuilder {
    name: String,
    description: Option<String>,
    version: Option<String>,
    flags: Option<FlagTable>,
    app_doc: Option<String>,
    app_version: Option<String>,
    app_flags: Option<FlagTable>,
    members: Vec<Member>,
    command_modules: Vec<String>,
    subcommand_modules: Vec<String>,
    loader: Option<Box<dyn ModuleLoader>>,
    on_interrupt: InterruptPolicy,
    quiet: bool,
}

impl AppBuilder {
    /// Starts an application called `name` with no members.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            version: None,
            flags: None,
            app_doc: None,
            app_version: None,
            app_flags: None,
            members: Vec::new(),
            command_modules: Vec::new(),
            subcommand_modules: Vec::new(),
            loader: None,
            on_interrupt: InterruptPolicy::default(),
            quiet: false,
        }
    }

    /// Starts from an [`Application`], binding its methods.
    pub fn for_application<A: Application>(application: A) -> Self {
        let mut builder = Self::new(application.name());
        builder.app_doc = application.doc();
        builder.app_version = application.version();
        builder.app_flags = application.flags();

        let methods = application.methods();
        let target = Rc::new(application);
        builder.members = methods.into_iter().map(|m| m.bind(&target)).collect();
        builder
    }

    /// Sets the program name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Documentation for the root parser.
    pub fn description(mut self, doc: &str) -> Self {
        self.description = Some(doc.to_string());
        self
    }

    /// Version for `--version`, replacing the application's.
    pub fn version(mut self, version: &str) -> Self {
        self.version = Some(version.to_string());
        self
    }

    /// Global flags, replacing the application's.
    pub fn flags(mut self, flags: FlagTable) -> Self {
        self.flags = Some(flags);
        self
    }

    /// Adds a member to the root scope.
    pub fn member(mut self, member: Member) -> Self {
        self.members.push(member);
        self
    }

    /// Modules whose commands join the root scope.
    pub fn command_modules<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.command_modules
            .extend(names.into_iter().map(Into::into));
        self
    }

    /// Modules grouped under their own subcommand.
    pub fn subcommand_modules<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.subcommand_modules
            .extend(names.into_iter().map(Into::into));
        self
    }

    /// Loader used to resolve module names.
    pub fn loader(mut self, loader: impl ModuleLoader + 'static) -> Self {
        self.loader = Some(Box::new(loader));
        self
    }

    /// What to do when a command is interrupted.
    pub fn on_interrupt(mut self, policy: InterruptPolicy) -> Self {
        self.on_interrupt = policy;
        self
    }

    /// Suppresses `Warning:` lines on stderr. Warnings are still recorded.
    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    /// Applies the fields set in `config`.
    pub fn config(mut self, config: &AppConfig) -> Self {
        if let Some(name) = &config.name {
            self.name = name.clone();
        }
        if let Some(description) = &config.description {
            self.description = Some(description.clone());
        }
        if let Some(version) = &config.version {
            self.version = Some(version.clone());
        }
        self.command_modules
            .extend(config.command_modules.iter().cloned());
        self.subcommand_modules
            .extend(config.subcommand_modules.iter().cloned());
        if let Some(policy) = config.interrupt_policy() {
            self.on_interrupt = policy;
        }
        self
    }

    /// Assembles the parser tree. Problems are reported as warnings and
    /// never abort construction.
    pub fn build(self) -> App {
        let mut diags = Diagnostics::new(!self.quiet);

        let doc = DocText::parse(self.description.as_deref().or(self.app_doc.as_deref()));
        if doc.is_none() {
            diags.warn(Warning::NoMainDocumentation);
        }
        let version = self
            .version
            .or(self.app_version)
            .filter(|v| !v.trim().is_empty());
        if version.is_none() {
            diags.warn(Warning::NoVersion);
        }

        let mut root = ParserNode::root(&self.name, doc.as_ref(), version.as_deref());
        if let Some(flags) = self.flags.as_ref().or(self.app_flags.as_ref()) {
            root.add_flags(flags, &mut diags);
        }

        for member in &self.members {
            root.add_command(member, &mut diags);
        }

        let registry;
        let loader: &dyn ModuleLoader = match &self.loader {
            Some(loader) => &**loader,
            None => {
                registry = ModuleRegistry::new();
                &registry
            }
        };
        for name in &self.command_modules {
            if let Some(module) = load_module(loader, name, &mut diags) {
                root.add_module_commands(&module, &mut diags);
            }
        }
        for name in &self.subcommand_modules {
            if let Some(module) = load_module(loader, name, &mut diags) {
                root.add_subcommand_module(&module, &mut diags);
            }
        }

        let entries: Vec<String> = root.entry_names().into_iter().map(String::from).collect();
        let (command, dispatch) = root.finish();
        let warnings = diags.into_warnings();
        debug!(
            app = %self.name,
            commands = entries.len(),
            warnings = warnings.len(),
            "application built"
        );

        App {
            name: self.name,
            version,
            command,
            dispatch,
            entries,
            warnings,
            on_interrupt: self.on_interrupt,
            interrupt: InterruptFlag::new(),
        }
    }
}

/// An assembled application, ready to run.
pub struct App {
    name: String,
    version: Option<String>,
    command: Command,
    dispatch: DispatchNode,
    entries: Vec<String>,
    warnings: Vec<Warning>,
    on_interrupt: InterruptPolicy,
    interrupt: InterruptFlag,
}

impl App {
    /// Starts a builder for an application called `name`.
    pub fn builder(name: impl Into<String>) -> AppBuilder {
        AppBuilder::new(name)
    }

    /// Starts a builder from an [`Application`].
    pub fn builder_for<A: Application>(application: A) -> AppBuilder {
        AppBuilder::for_application(application)
    }

    /// Builds an [`Application`] with default settings.
    pub fn new<A: Application>(application: A) -> Self {
        AppBuilder::for_application(application).build()
    }

    /// Program name used in usage and help output.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Version shown by `--version`, if any.
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Warnings recorded while building.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Root-level command and group names, sorted.
    pub fn command_names(&self) -> Vec<&str> {
        self.entries.iter().map(String::as_str).collect()
    }

    /// The underlying clap command.
    pub fn command(&self) -> &Command {
        &self.command
    }

    /// Handle to the flag that marks the running command as interrupted.
    ///
    /// [`run`](Self::run) raises it on Ctrl-C; other code may raise it from
    /// any thread. It is lowered when the command returns.
    pub fn interrupt_flag(&self) -> InterruptFlag {
        self.interrupt.clone()
    }

    /// Full help text of the root parser.
    pub fn render_help(&self) -> String {
        self.command.clone().render_long_help().to_string()
    }

    /// Parses `args` (without the program name) and runs the selected
    /// command.
    ///
    /// Returns the exit code on success, including an interrupted command
    /// under [`InterruptPolicy::ExitCode`]. A command is interrupted when it
    /// returns [`CommandError::Interrupted`] or when the
    /// [`interrupt_flag`](Self::interrupt_flag) was raised while it ran.
    ///
    /// # Errors
    ///
    /// - [`AppError::Usage`] for help, version and usage errors
    /// - [`AppError::Interrupted`] for an interrupted command under
    ///   [`InterruptPolicy::Propagate`]
    /// - [`AppError::Command`] when the command fails
    pub fn try_run<I, T>(&self, args: I) -> Result<u8>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        let argv = std::iter::once(OsString::from(&self.name)).chain(args.into_iter().map(Into::into));
        let matches = self.command.clone().try_get_matches_from(argv)?;

        let Resolved { args, handler } = dispatch::resolve(&self.dispatch, &matches);
        let Some(handler) = handler else {
            let mut cmd = self.command.clone();
            return Err(AppError::Usage(
                cmd.error(ErrorKind::MissingSubcommand, "a command is required"),
            ));
        };

        let args = args.with_interrupt(self.interrupt.clone());
        let command = args.path().join(" ");
        debug!(command = %command, args = args.len(), "dispatching");
        let outcome = handler(&args);
        let interrupted = self.interrupt.take();

        match outcome {
            Err(CommandError::Interrupted) => self.interrupted(&command),
            _ if interrupted => self.interrupted(&command),
            Ok(()) => Ok(0),
            Err(source) => Err(AppError::Command { command, source }),
        }
    }

    fn interrupted(&self, command: &str) -> Result<u8> {
        debug!(command = %command, policy = ?self.on_interrupt, "command interrupted");
        match self.on_interrupt {
            InterruptPolicy::Propagate => Err(AppError::Interrupted),
            InterruptPolicy::ExitCode(code) => Ok(code),
        }
    }

    /// Runs with `args` and converts the outcome into a process exit code.
    ///
    /// Ctrl-C is routed to the [`interrupt_flag`](Self::interrupt_flag)
    /// while the command runs; a second Ctrl-C exits at once with the
    /// interrupt policy's code. Help, version and usage errors are printed
    /// by clap, which exits the process. Other errors are printed as
    /// `error: ...` and map to exit code 1.
    pub fn run_with<I, T>(&self, args: I) -> ExitCode
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        let _armed = match interrupt::arm(&self.interrupt, self.on_interrupt.exit_code()) {
            Ok(guard) => Some(guard),
            Err(err) => {
                warn!(error = %err, "cannot watch for interrupts");
                None
            }
        };

        match self.try_run(args) {
            Ok(code) => ExitCode::from(code),
            Err(AppError::Usage(err)) => err.exit(),
            Err(err) => {
                eprintln!("error: {err}");
                ExitCode::FAILURE
            }
        }
    }

    /// Runs with the process arguments.
    pub fn run(&self) -> ExitCode {
        self.run_with(std::env::args_os().skip(1))
    }
}
