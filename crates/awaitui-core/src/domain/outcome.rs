//! Outcome model: what a caller of `render` gets back.
//!
//! A task ends in exactly one of three ways:
//! - resolved, with or without a value (`Ok(Some(v))` / `Ok(None)`)
//! - rejected without a reason: the user declined (`Rejection::Cancelled`)
//! - rejected with a reason: something actually went wrong (`Rejection::Failed`)
//!
//! `Rejection::Abandoned` covers the case Rust makes observable on its own: every
//! resolve/reject handle of the task was dropped without being called.

/// Caller-defined failure reason carried by `reject`.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Settled value of a render task.
pub type Outcome<T> = Result<Option<T>, Rejection>;

#[derive(Debug, thiserror::Error)]
pub enum Rejection {
    /// `reject()` was called without a reason.
    #[error("cancelled by user")]
    Cancelled,

    /// `reject(reason)` was called; the reason is passed through untouched.
    #[error("rejected: {0}")]
    Failed(#[source] BoxError),

    /// The task can never settle (its handles are gone or the manager is shut down).
    #[error("render task abandoned before it settled")]
    Abandoned,
}

impl Rejection {
    /// Cancellation is the expected "no" answer and is not an error condition.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Rejection::Cancelled)
    }

    pub fn reason(&self) -> Option<&BoxError> {
        match self {
            Rejection::Failed(reason) => Some(reason),
            _ => None,
        }
    }

    /// Downcast the failure reason to a concrete error type.
    pub fn downcast_ref<E: std::error::Error + 'static>(&self) -> Option<&E> {
        self.reason().and_then(|reason| reason.downcast_ref::<E>())
    }
}

impl From<Option<BoxError>> for Rejection {
    fn from(reason: Option<BoxError>) -> Self {
        match reason {
            Some(reason) => Rejection::Failed(reason),
            None => Rejection::Cancelled,
        }
    }
}
