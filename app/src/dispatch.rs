//! Dispatch table and argument collection.

use std::collections::HashMap;

use clap::ArgMatches;
use skal_core::FlagAction;

use crate::args::{ArgValue, CommandArgs};
use crate::module::Handler;
use crate::normalize::FlagSlot;

/// Exit code conventionally used for an interrupted system call.
pub const EINTR_EXIT_CODE: u8 = 4;

/// What happens when a command is interrupted.
///
/// A command counts as interrupted when its handler returns
/// [`CommandError::Interrupted`](crate::CommandError::Interrupted), or when
/// the app's [`InterruptFlag`](crate::InterruptFlag) was raised while it
/// ran (Ctrl-C under [`App::run`](crate::App::run)). Handlers are never
/// preempted: a long-running handler should check
/// [`CommandArgs::interrupted`] and return early.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InterruptPolicy {
    /// Return [`AppError::Interrupted`](crate::AppError::Interrupted) to the
    /// caller; [`App::run`](crate::App::run) exits 1.
    #[default]
    Propagate,
    /// Treat the run as finished with this exit code.
    ExitCode(u8),
}

impl InterruptPolicy {
    /// Exit with [`EINTR_EXIT_CODE`].
    pub fn eintr() -> Self {
        Self::ExitCode(EINTR_EXIT_CODE)
    }

    /// Process exit code of an interrupted run.
    pub fn exit_code(self) -> u8 {
        match self {
            Self::Propagate => 1,
            Self::ExitCode(code) => code,
        }
    }
}

/// One parser in the dispatch tree: the flags it owns, the handler bound to
/// it (commands only) and its subcommands.
#[derive(Default)]
pub(crate) struct DispatchNode {
    pub(crate) slots: Vec<FlagSlot>,
    pub(crate) handler: Option<Handler>,
    pub(crate) children: HashMap<String, DispatchNode>,
}

/// The command selected by a parse.
pub(crate) struct Resolved<'a> {
    pub(crate) args: CommandArgs,
    pub(crate) handler: Option<&'a Handler>,
}

/// Follows the subcommand chain of `matches`, collecting every slot of
/// every parser passed through.
pub(crate) fn resolve<'a>(root: &'a DispatchNode, matches: &ArgMatches) -> Resolved<'a> {
    let mut path = Vec::new();
    let mut values = Vec::new();
    let mut node = root;
    let mut current = matches;

    loop {
        collect(&node.slots, current, &mut values);
        let Some((name, sub)) = current.subcommand() else {
            break;
        };
        let Some(child) = node.children.get(name) else {
            break;
        };
        path.push(name.to_string());
        node = child;
        current = sub;
    }

    let mut args = CommandArgs::new(path);
    for (dest, value) in values {
        args.insert(&dest, value);
    }
    Resolved {
        args,
        handler: node.handler.as_ref(),
    }
}

fn collect(slots: &[FlagSlot], matches: &ArgMatches, out: &mut Vec<(String, ArgValue)>) {
    for slot in slots {
        let id = slot.dest.as_str();
        let value = match slot.action {
            FlagAction::StoreTrue | FlagAction::StoreFalse => {
                let unset = slot.action == FlagAction::StoreFalse;
                ArgValue::Switch(
                    matches
                        .try_get_one::<bool>(id)
                        .ok()
                        .flatten()
                        .copied()
                        .unwrap_or(unset),
                )
            }
            FlagAction::Count => ArgValue::Count(
                matches
                    .try_get_one::<u8>(id)
                    .ok()
                    .flatten()
                    .copied()
                    .unwrap_or(0),
            ),
            FlagAction::Store => ArgValue::Value(
                matches
                    .try_get_one::<String>(id)
                    .ok()
                    .flatten()
                    .cloned(),
            ),
            FlagAction::Append => ArgValue::Values(
                matches
                    .try_get_many::<String>(id)
                    .ok()
                    .flatten()
                    .map(|values| values.cloned().collect())
                    .unwrap_or_default(),
            ),
        };
        out.push((slot.dest.clone(), value));
    }
}
