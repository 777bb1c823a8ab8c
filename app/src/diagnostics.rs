//! Construction-time warnings.
//!
//! Nothing found while assembling an application is fatal. Each problem is
//! recorded as a [`Warning`], written to stderr with a `Warning: ` prefix, and
//! kept on the [`App`](crate::App) for inspection.

use std::fmt;

use skal_core::Location;
use tracing::debug;

use crate::error::LoadError;

/// A problem found while assembling an application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// Neither an explicit description nor application documentation.
    NoMainDocumentation,
    /// Neither an explicit version nor an application version.
    NoVersion,
    /// A module named for loading is unknown to the loader.
    ModuleNotFound { module: String },
    /// A module exists but failed to load.
    ModuleLoadFailed { error: LoadError },
    /// A command or subcommand module has no documentation.
    MissingDocumentation { name: String, location: Location },
    /// A command name is already taken in its parser scope.
    DuplicateCommand { name: String, location: Location },
    /// A command name cannot be used on a command line.
    InvalidCommandName {
        name: String,
        location: Location,
        reason: String,
    },
    /// One flag of a table could not be added.
    ArgumentError { flag: String, reason: String },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoMainDocumentation => f.write_str("no main documentation"),
            Self::NoVersion => f.write_str("no version set"),
            Self::ModuleNotFound { module } => {
                write!(f, "module \"{module}\" does not exist, skipping")
            }
            Self::ModuleLoadFailed { error } => match error {
                LoadError::NotFound { module } => {
                    write!(f, "module \"{module}\" does not exist, skipping")
                }
                LoadError::Syntax { module, detail } => {
                    write!(f, "syntax error in \"{module}\", skipping: {detail}")
                }
                LoadError::Name { module, detail } => {
                    write!(f, "name error in \"{module}\", skipping: {detail}")
                }
            },
            Self::MissingDocumentation { name, location } => {
                write!(f, "no documentation for \"{name}\" in {location}")
            }
            Self::DuplicateCommand { name, location } => {
                write!(f, "ignoring duplicate command \"{name}\" in {location}")
            }
            Self::InvalidCommandName {
                name,
                location,
                reason,
            } => write!(f, "ignoring command \"{name}\" in {location}: {reason}"),
            Self::ArgumentError { flag, reason } => {
                write!(f, "argument error: {flag}: {reason}")
            }
        }
    }
}

/// Collects warnings while an application is assembled.
#[derive(Debug)]
pub(crate) struct Diagnostics {
    warnings: Vec<Warning>,
    echo: bool,
}

impl Diagnostics {
    /// `echo` controls whether warnings are written to stderr.
    pub(crate) fn new(echo: bool) -> Self {
        Self {
            warnings: Vec::new(),
            echo,
        }
    }

    pub(crate) fn warn(&mut self, warning: Warning) {
        debug!(warning = %warning, "discovery warning");
        if self.echo {
            eprintln!("Warning: {warning}");
        }
        self.warnings.push(warning);
    }

    /// Records a loader failure under the matching category.
    pub(crate) fn load_failed(&mut self, error: LoadError) {
        match error {
            LoadError::NotFound { module } => self.warn(Warning::ModuleNotFound { module }),
            other => self.warn(Warning::ModuleLoadFailed { error: other }),
        }
    }

    pub(crate) fn into_warnings(self) -> Vec<Warning> {
        self.warnings
    }
}
