//! Ctrl-C delivery to the running command.
//!
//! A handler cannot be preempted, so interruption is cooperative. While
//! [`App::run`](crate::App::run) dispatches, Ctrl-C raises the app's
//! [`InterruptFlag`]; the handler sees it through
//! [`CommandArgs::interrupted`](crate::CommandArgs::interrupted) and returns,
//! and the outcome goes through the app's
//! [`InterruptPolicy`](crate::InterruptPolicy). A second Ctrl-C while the
//! flag is still raised ends the process with the policy's exit code, so a
//! handler that never checks the flag can still be stopped.
//!
//! The watcher is a background thread driving a current-thread tokio
//! runtime. It is installed on first use and stays for the life of the
//! process; Ctrl-C outside a dispatch exits with code 130.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use std::thread;

use tracing::debug;

/// Exit code for an interrupt arriving while no command runs (128 + SIGINT).
const UNARMED_EXIT_CODE: i32 = 130;

/// Shared "interrupt requested" flag.
///
/// Clones share state, so a clone can be raised from another thread while a
/// command runs.
///
/// # Examples
///
/// ```
/// use skal_app::InterruptFlag;
///
/// let flag = InterruptFlag::new();
/// let remote = flag.clone();
/// assert!(!flag.is_raised());
///
/// remote.raise();
/// assert!(flag.is_raised());
/// ```
#[derive(Debug, Clone, Default)]
pub struct InterruptFlag(Arc<AtomicBool>);

impl InterruptFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests an interrupt.
    pub fn raise(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Returns `true` once an interrupt was requested.
    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Lowers the flag, returning whether it was raised.
    pub(crate) fn take(&self) -> bool {
        self.0.swap(false, Ordering::SeqCst)
    }
}

/// Flags compare by state.
impl PartialEq for InterruptFlag {
    fn eq(&self, other: &Self) -> bool {
        self.is_raised() == other.is_raised()
    }
}

impl Eq for InterruptFlag {}

struct Armed {
    flag: InterruptFlag,
    exit_code: i32,
}

static ARMED: Mutex<Option<Armed>> = Mutex::new(None);
static WATCHER: OnceLock<Result<(), String>> = OnceLock::new();

/// Routes Ctrl-C to an [`InterruptFlag`] until dropped.
pub(crate) struct InterruptGuard(());

impl Drop for InterruptGuard {
    fn drop(&mut self) {
        *ARMED.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

/// Installs the watcher if needed and routes Ctrl-C to `flag`. A second
/// Ctrl-C exits with `exit_code`.
pub(crate) fn arm(flag: &InterruptFlag, exit_code: u8) -> io::Result<InterruptGuard> {
    WATCHER
        .get_or_init(|| spawn_watcher().map_err(|e| e.to_string()))
        .clone()
        .map_err(io::Error::other)?;

    *ARMED.lock().unwrap_or_else(PoisonError::into_inner) = Some(Armed {
        flag: flag.clone(),
        exit_code: i32::from(exit_code),
    });
    Ok(InterruptGuard(()))
}

fn spawn_watcher() -> io::Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    // Registered here so the handler is in place before arm() returns.
    let mut interrupts = {
        let _context = runtime.enter();
        listen()?
    };

    thread::Builder::new()
        .name("skal-interrupt".into())
        .spawn(move || {
            runtime.block_on(async move {
                while interrupts.recv().await.is_some() {
                    deliver();
                }
            });
        })?;
    debug!("interrupt watcher installed");
    Ok(())
}

#[cfg(unix)]
fn listen() -> io::Result<tokio::signal::unix::Signal> {
    use tokio::signal::unix::{SignalKind, signal};

    signal(SignalKind::interrupt())
}

#[cfg(windows)]
fn listen() -> io::Result<tokio::signal::windows::CtrlC> {
    tokio::signal::windows::ctrl_c()
}

fn deliver() {
    let armed = ARMED.lock().unwrap_or_else(PoisonError::into_inner);
    match armed.as_ref() {
        Some(armed) if armed.flag.is_raised() => {
            debug!(code = armed.exit_code, "second interrupt, exiting");
            std::process::exit(armed.exit_code);
        }
        Some(armed) => {
            debug!("interrupt delivered to running command");
            armed.flag.raise();
        }
        None => {
            debug!("interrupt outside a command, exiting");
            std::process::exit(UNARMED_EXIT_CODE);
        }
    }
}
