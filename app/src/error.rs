//! Error types for building and running an application.

use thiserror::Error;

/// Failure reported by a command handler.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The command was interrupted by the user; handled by the
    /// application's [`InterruptPolicy`](crate::InterruptPolicy).
    #[error("interrupted")]
    Interrupted,

    /// The command failed with a message.
    #[error("{0}")]
    Failed(String),

    /// I/O failure inside the command.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CommandError {
    /// Convenience constructor for [`CommandError::Failed`].
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

/// Return type of command handlers.
pub type CommandResult = std::result::Result<(), CommandError>;

/// Failure of the module-loading collaborator.
///
/// A closed set: the module is missing, or it exists but cannot be loaded
/// because it is malformed (`Syntax`) or refers to something that does not
/// exist (`Name`). All variants are recoverable; discovery skips the module.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    /// No loader knows the module.
    #[error("module \"{module}\" does not exist")]
    NotFound { module: String },

    /// The module definition is malformed.
    #[error("syntax error in \"{module}\": {detail}")]
    Syntax { module: String, detail: String },

    /// The module references a name that cannot be resolved.
    #[error("name error in \"{module}\": {detail}")]
    Name { module: String, detail: String },
}

impl LoadError {
    /// Name of the module that failed.
    pub fn module(&self) -> &str {
        match self {
            Self::NotFound { module } | Self::Syntax { module, .. } | Self::Name { module, .. } => {
                module
            }
        }
    }

    /// Returns `true` for [`LoadError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Errors reading or writing an [`AppConfig`](crate::AppConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Errors returned by [`App::try_run`](crate::App::try_run).
#[derive(Debug, Error)]
pub enum AppError {
    /// Help, version, or a usage error detected by the argument parser.
    ///
    /// [`clap::Error::exit`] prints it and exits with the parser's code.
    #[error(transparent)]
    Usage(#[from] clap::Error),

    /// A command was interrupted and the policy is to propagate.
    #[error("command interrupted")]
    Interrupted,

    /// A command handler failed.
    #[error("command \"{command}\" failed: {source}")]
    Command {
        command: String,
        #[source]
        source: CommandError,
    },
}

impl AppError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Usage(err) => err.exit_code(),
            Self::Interrupted | Self::Command { .. } => 1,
        }
    }
}

/// Convenience alias for results with [`AppError`].
pub type Result<T> = std::result::Result<T, AppError>;
