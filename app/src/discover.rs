//! Builds the clap command tree and the matching dispatch tree.
//!
//! Members are visited in declaration order. A member becomes a subcommand
//! only if it carries command metadata; the first member registered under a
//! name wins and later ones are dropped with a warning. Subcommand modules
//! add one more level, named after the last segment of the module name.

use clap::{Arg, ArgAction, Command};
use skal_core::{DocText, FlagTable, Location, validate_command_name};
use tracing::debug;

use crate::diagnostics::{Diagnostics, Warning};
use crate::dispatch::DispatchNode;
use crate::module::{Handler, Member, Module, ModuleLoader};
use crate::normalize::{self, FlagScope, HELP_ID, ScopeKind, VERSION_ID};

/// A parser under construction.
pub(crate) struct ParserNode {
    name: String,
    cmd: Command,
    scope: FlagScope,
    dispatch: DispatchNode,
}

impl ParserNode {
    /// The root parser. `--version` is only added when a version is known.
    pub(crate) fn root(name: &str, doc: Option<&DocText>, version: Option<&str>) -> Self {
        let node = Self::new(name, ScopeKind::Root { versioned: version.is_some() }, doc);
        node.with_version(version)
    }

    fn with_version(mut self, version: Option<&str>) -> Self {
        if let Some(version) = version {
            let cmd = std::mem::take(&mut self.cmd);
            self.cmd = cmd.version(format!("v{version}")).arg(
                Arg::new(VERSION_ID)
                    .long("version")
                    .action(ArgAction::Version)
                    .help("Show program's version number and exit"),
            );
        }
        self
    }

    fn new(name: &str, kind: ScopeKind, doc: Option<&DocText>) -> Self {
        let mut cmd = Command::new(name.to_string())
            .disable_help_flag(true)
            .disable_version_flag(true)
            .disable_help_subcommand(true)
            .arg(
                Arg::new(HELP_ID)
                    .short('h')
                    .long("help")
                    .action(ArgAction::HelpLong)
                    .help("Show this help message and exit"),
            );
        if let Some(doc) = doc {
            cmd = cmd
                .about(doc.help.clone())
                .long_about(doc.description.clone());
        }
        Self {
            name: name.to_string(),
            cmd,
            scope: FlagScope::new(kind),
            dispatch: DispatchNode::default(),
        }
    }

    /// Adds a flag table to this parser.
    pub(crate) fn add_flags(&mut self, table: &FlagTable, diags: &mut Diagnostics) {
        let cmd = std::mem::take(&mut self.cmd);
        self.cmd = normalize::add_flags(cmd, table, &mut self.scope, diags);
    }

    fn has_entry(&self, name: &str) -> bool {
        self.dispatch.children.contains_key(name)
    }

    /// Checks that `name` can be registered in this scope.
    fn claim(&self, name: &str, location: &Location, diags: &mut Diagnostics) -> bool {
        if self.has_entry(name) {
            diags.warn(Warning::DuplicateCommand {
                name: name.to_string(),
                location: location.clone(),
            });
            return false;
        }
        if let Err(err) = validate_command_name(name) {
            diags.warn(Warning::InvalidCommandName {
                name: name.to_string(),
                location: location.clone(),
                reason: err.to_string(),
            });
            return false;
        }
        true
    }

    fn attach(&mut self, child: ParserNode, handler: Option<Handler>) {
        let name = child.name.clone();
        let (cmd, mut dispatch) = child.finish();
        dispatch.handler = handler;
        let parent = std::mem::take(&mut self.cmd);
        self.cmd = parent.subcommand(cmd);
        self.dispatch.children.insert(name, dispatch);
    }

    /// Registers `member` as a subcommand if it is a command.
    pub(crate) fn add_command(&mut self, member: &Member, diags: &mut Diagnostics) {
        if !member.is_command() {
            debug!(member = %member.name, "skipping member without command metadata");
            return;
        }
        if !self.claim(&member.name, &member.location, diags) {
            return;
        }

        let doc = documented(&member.name, member.doc.as_deref(), &member.location, diags);
        let mut child = Self::new(&member.name, ScopeKind::Command, doc.as_ref());
        if let Some(flags) = member.flags() {
            child.add_flags(flags, diags);
        }

        debug!(parent = %self.name, command = %member.name, "registered command");
        self.attach(child, Some(member.handler().clone()));
    }

    /// Adds a module's flags to this parser and its commands to this scope.
    pub(crate) fn add_module_commands(&mut self, module: &Module, diags: &mut Diagnostics) {
        debug!(module = %module.name, members = module.members.len(), "adding command module");
        if let Some(flags) = &module.flags {
            self.add_flags(flags, diags);
        }
        for member in &module.members {
            self.add_command(member, diags);
        }
    }

    /// Adds a module as a group named after its last name segment. A module
    /// version becomes the group's `--version`.
    pub(crate) fn add_subcommand_module(&mut self, module: &Module, diags: &mut Diagnostics) {
        let name = module.short_name();
        if !self.claim(name, &module.location, diags) {
            return;
        }

        let doc = documented(&module.name, module.doc.as_deref(), &module.location, diags);
        let version = module.version.as_deref().filter(|v| !v.trim().is_empty());
        let kind = ScopeKind::Group {
            versioned: version.is_some(),
        };
        let mut group = Self::new(name, kind, doc.as_ref()).with_version(version);
        if let Some(flags) = &module.flags {
            group.add_flags(flags, diags);
        }
        for member in &module.members {
            group.add_command(member, diags);
        }

        debug!(parent = %self.name, module = %module.name, group = %name, "registered subcommand module");
        self.attach(group, None);
    }

    /// Names registered in this scope, sorted.
    pub(crate) fn entry_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.dispatch.children.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Completes the parser, returning the clap command and dispatch node.
    pub(crate) fn finish(self) -> (Command, DispatchNode) {
        let mut cmd = self.cmd;
        if !self.dispatch.children.is_empty() {
            cmd = cmd.subcommand_required(true);
        }
        let mut dispatch = self.dispatch;
        dispatch.slots = self.scope.into_slots();
        (cmd, dispatch)
    }
}

/// Parses documentation, warning when there is none.
fn documented(
    name: &str,
    doc: Option<&str>,
    location: &Location,
    diags: &mut Diagnostics,
) -> Option<DocText> {
    let parsed = DocText::parse(doc);
    if parsed.is_none() {
        diags.warn(Warning::MissingDocumentation {
            name: name.to_string(),
            location: location.clone(),
        });
    }
    parsed
}

/// Loads `name`, turning loader failures into warnings.
pub(crate) fn load_module(
    loader: &dyn ModuleLoader,
    name: &str,
    diags: &mut Diagnostics,
) -> Option<Module> {
    match loader.load(name) {
        Ok(module) => Some(module),
        Err(err) => {
            debug!(module = %name, error = %err, "module load failed");
            diags.load_failed(err);
            None
        }
    }
}
