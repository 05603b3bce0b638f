//! Cross-cutting wrapping of caller-facing operations.
//!
//! An [OperationGuard] runs an operation behind an ordered list of layers
//! (confirmation, timing) and always contains its failure into an
//! [Outcome]. Layers run outside-in in the order they were added: a timer
//! added before a confirmation also measures the time spent confirming.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::time::{Duration, Instant};

use tracing::{error, info, warn};

use crate::error::{Error, ErrorKind, Result};

/// Asks whether a destructive action should go ahead.
pub trait Confirm {
    fn confirm(&mut self, action: &str) -> bool;
}

impl<F> Confirm for F
where
    F: FnMut(&str) -> bool,
{
    fn confirm(&mut self, action: &str) -> bool {
        self(action)
    }
}

/// Approves every action. Used when confirmation is disabled or for scripts.
#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysConfirm;

impl Confirm for AlwaysConfirm {
    fn confirm(&mut self, _action: &str) -> bool {
        true
    }
}

/// What a guarded operation reports back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    /// The operation ran and succeeded.
    Done(T),
    /// Confirmation was refused; nothing ran.
    Declined,
    /// The operation ran and failed; nothing was changed.
    Failed { kind: ErrorKind, message: String },
}

impl<T> Outcome<T> {
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done(_))
    }

    pub fn ok(self) -> Option<T> {
        match self {
            Self::Done(value) => Some(value),
            _ => None,
        }
    }

    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Failed { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Self::Done(value) => Outcome::Done(f(value)),
            Self::Declined => Outcome::Declined,
            Self::Failed { kind, message } => Outcome::Failed { kind, message },
        }
    }
}

impl<T> fmt::Display for Outcome<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Done(_) => f.write_str("ok"),
            Self::Declined => f.write_str("cancelled"),
            Self::Failed { kind, message } => write!(f, "error ({kind}): {message}"),
        }
    }
}

enum Layer<'a> {
    Confirm(&'a mut dyn Confirm),
    Timed,
}

/// Builder wrapping one named operation.
///
/// # Example
/// ```
/// use primdb::guard::{OperationGuard, Outcome};
///
/// let mut refuse = |_: &str| false;
/// let outcome = OperationGuard::new("drop_table")
///     .timed()
///     .confirmed_by(&mut refuse)
///     .run(|| Ok(42));
/// assert_eq!(outcome, Outcome::Declined);
/// ```
pub struct OperationGuard<'a> {
    action: String,
    layers: Vec<Layer<'a>>,
}

impl<'a> OperationGuard<'a> {
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            layers: Vec::new(),
        }
    }

    /// Requires `confirm` to approve the action before it runs.
    pub fn confirmed_by(mut self, confirm: &'a mut dyn Confirm) -> Self {
        self.layers.push(Layer::Confirm(confirm));
        self
    }

    /// Logs the wall-clock duration of everything inside this layer.
    pub fn timed(mut self) -> Self {
        self.layers.push(Layer::Timed);
        self
    }

    pub fn action(&self) -> &str {
        &self.action
    }

    /// Runs `op` through the layers and contains any error it returns.
    ///
    /// A panic inside `op` is contained too and reported as
    /// [Error::Unexpected].
    pub fn run<T>(self, op: impl FnOnce() -> Result<T>) -> Outcome<T> {
        self.run_measured(op).0
    }

    /// Like [OperationGuard::run], also returning the duration reported by
    /// each timing layer that started, innermost first.
    pub fn run_measured<T>(self, op: impl FnOnce() -> Result<T>) -> (Outcome<T>, Vec<Duration>) {
        let Self { action, layers } = self;
        let mut timers: Vec<Instant> = Vec::new();
        let mut declined = false;

        for layer in layers {
            match layer {
                Layer::Timed => timers.push(Instant::now()),
                Layer::Confirm(confirm) => {
                    if !confirm.confirm(&action) {
                        declined = true;
                        break;
                    }
                }
            }
        }

        let result = if declined { None } else { Some(contain_panic(op)) };

        let elapsed: Vec<Duration> = timers
            .into_iter()
            .rev()
            .map(|started| started.elapsed())
            .collect();
        for duration in &elapsed {
            report_elapsed(&action, *duration);
        }

        let outcome = match result {
            None => {
                info!(action = %action, "operation cancelled");
                Outcome::Declined
            }
            Some(Ok(value)) => Outcome::Done(value),
            Some(Err(err)) => {
                let kind = err.kind();
                match kind {
                    ErrorKind::PersistenceFailure | ErrorKind::Unexpected => {
                        error!(action = %action, %kind, error = %err, "operation failed")
                    }
                    _ => warn!(action = %action, %kind, error = %err, "operation rejected"),
                }
                Outcome::Failed {
                    kind,
                    message: err.to_string(),
                }
            }
        };
        (outcome, elapsed)
    }
}

fn contain_panic<T>(op: impl FnOnce() -> Result<T>) -> Result<T> {
    panic::catch_unwind(AssertUnwindSafe(op)).unwrap_or_else(|payload| {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "operation panicked".to_string());
        Err(Error::Unexpected(message))
    })
}

fn report_elapsed(action: &str, elapsed: Duration) {
    info!(
        action,
        elapsed_ms = elapsed.as_secs_f64() * 1000.0,
        "{action} finished in {:.3}s",
        elapsed.as_secs_f64()
    );
}
