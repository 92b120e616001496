use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::oneshot;

use crate::domain::{Outcome, Rejection, TaskId};

/// The caller's handle on a render task.
///
/// Resolves once the task's `resolve` / `reject` is first called. There is no
/// timeout: wrap it in `tokio::time::timeout` if the caller needs one.
#[must_use = "a render task does nothing observable unless its outcome is awaited"]
#[derive(Debug)]
pub struct RenderFuture<T> {
    id: TaskId,
    receiver: Option<oneshot::Receiver<Outcome<T>>>,
}

impl<T> RenderFuture<T> {
    pub(crate) fn new(id: TaskId, receiver: oneshot::Receiver<Outcome<T>>) -> Self {
        Self {
            id,
            receiver: Some(receiver),
        }
    }

    /// A future that is already `Err(Rejection::Abandoned)`.
    pub(crate) fn abandoned(id: TaskId) -> Self {
        Self { id, receiver: None }
    }

    pub fn id(&self) -> TaskId {
        self.id
    }
}

impl<T> Future for RenderFuture<T> {
    type Output = Outcome<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let Some(receiver) = self.receiver.as_mut() else {
            return Poll::Ready(Err(Rejection::Abandoned));
        };

        match Pin::new(receiver).poll(cx) {
            Poll::Ready(Ok(outcome)) => Poll::Ready(outcome),
            Poll::Ready(Err(_closed)) => Poll::Ready(Err(Rejection::Abandoned)),
            Poll::Pending => Poll::Pending,
        }
    }
}
