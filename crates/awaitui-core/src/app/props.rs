//! Per-task settlement handles.
//!
//! `render` が component factory に渡す `resolve` / `reject` の実体です。
//! 両者は 1 つの `SettleSlot`（oneshot sender を 1 回だけ取り出せる箱）を共有するので、
//! どちらを何回呼んでも future が確定するのは最初の 1 回だけです。

use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::{Arc, Mutex, OnceLock, PoisonError, Weak};

use tokio::sync::oneshot;
use tracing::trace;

use crate::domain::{BoxError, Outcome, Rejection, TaskId};

/// Registry side of a settlement: implemented by the manager.
pub(crate) trait SettleHook: Send + Sync {
    fn on_settled(&self, id: TaskId);

    /// Called from `Drop`, possibly while the manager's lock is held;
    /// implementations must not block on that lock here.
    fn on_abandoned(&self, id: TaskId);
}

pub(crate) struct SettleSlot<T> {
    id: TaskId,
    sender: Mutex<Option<oneshot::Sender<Outcome<T>>>>,
    /// Set once the task is in the registry; a slot without a hook never
    /// reports to the manager.
    hook: OnceLock<Weak<dyn SettleHook>>,
}

impl<T> SettleSlot<T> {
    pub(crate) fn new(id: TaskId, sender: oneshot::Sender<Outcome<T>>) -> Self {
        Self {
            id,
            sender: Mutex::new(Some(sender)),
            hook: OnceLock::new(),
        }
    }

    /// Route later settlements to `hook`. Only the first call has an effect.
    pub(crate) fn attach(&self, hook: Weak<dyn SettleHook>) {
        let _ = self.hook.set(hook);
    }

    fn hook(&self) -> Option<Arc<dyn SettleHook>> {
        self.hook.get().and_then(Weak::upgrade)
    }

    fn take_sender(&self) -> Option<oneshot::Sender<Outcome<T>>> {
        self.sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    pub(crate) fn is_settled(&self) -> bool {
        self.sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }

    /// First call wins; later calls are absorbed.
    pub(crate) fn settle(&self, outcome: Outcome<T>) {
        let Some(sender) = self.take_sender() else {
            trace!(task_id = %self.id, "ignoring redundant settlement");
            return;
        };

        // the caller may have dropped the future; the task is settled regardless
        let _ = sender.send(outcome);

        if let Some(hook) = self.hook() {
            hook.on_settled(self.id);
        }
    }
}

impl<T> Drop for SettleSlot<T> {
    fn drop(&mut self) {
        let unsettled = self
            .sender
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .is_some();

        // every handle is gone: the future reports Abandoned, the entry starts its removal
        if unsettled && let Some(hook) = self.hook() {
            trace!(task_id = %self.id, "render task abandoned");
            hook.on_abandoned(self.id);
        }
    }
}

/// `resolve` side of a task. Cloning shares the same settlement.
pub struct Resolver<T> {
    slot: Arc<SettleSlot<T>>,
}

impl<T> Resolver<T> {
    /// Settle the task successfully with `value`.
    pub fn resolve(&self, value: T) {
        self.slot.settle(Ok(Some(value)));
    }

    /// Settle the task successfully without a value.
    pub fn resolve_empty(&self) {
        self.slot.settle(Ok(None));
    }

    pub fn id(&self) -> TaskId {
        self.slot.id
    }

    pub fn is_settled(&self) -> bool {
        self.slot.is_settled()
    }
}

impl<T> Clone for Resolver<T> {
    fn clone(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
        }
    }
}

impl<T> fmt::Debug for Resolver<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver").field("id", &self.slot.id).finish()
    }
}

/// `reject` side of a task. Cloning shares the same settlement.
pub struct Rejecter<T> {
    slot: Arc<SettleSlot<T>>,
}

impl<T> Rejecter<T> {
    /// Reject without a reason: the user declined.
    pub fn reject(&self) {
        self.slot.settle(Err(Rejection::Cancelled));
    }

    /// Reject with a concrete failure reason.
    pub fn reject_with(&self, reason: impl Into<BoxError>) {
        self.slot.settle(Err(Rejection::Failed(reason.into())));
    }

    pub fn id(&self) -> TaskId {
        self.slot.id
    }

    pub fn is_settled(&self) -> bool {
        self.slot.is_settled()
    }
}

impl<T> Clone for Rejecter<T> {
    fn clone(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
        }
    }
}

impl<T> fmt::Debug for Rejecter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rejecter").field("id", &self.slot.id).finish()
    }
}

/// What a component factory receives: the caller's props plus the task's
/// `resolve` / `reject` handles.
///
/// Derefs to `P`, so `props.title` reads the caller's field directly.
///
/// # 使用例
/// ```ignore
/// manager.render(
///     |props: AsyncRenderProps<DialogProps, Choice>| Dialog::new(props),
///     DialogProps { title: "Are you sure?".into() },
/// )
/// ```
pub struct AsyncRenderProps<P, T> {
    pub props: P,
    pub resolve: Resolver<T>,
    pub reject: Rejecter<T>,
}

impl<P, T> AsyncRenderProps<P, T> {
    pub(crate) fn new(props: P, slot: Arc<SettleSlot<T>>) -> Self {
        Self {
            props,
            resolve: Resolver {
                slot: Arc::clone(&slot),
            },
            reject: Rejecter { slot },
        }
    }

    pub fn id(&self) -> TaskId {
        self.resolve.id()
    }

    pub fn into_parts(self) -> (P, Resolver<T>, Rejecter<T>) {
        (self.props, self.resolve, self.reject)
    }
}

impl<P, T> Deref for AsyncRenderProps<P, T> {
    type Target = P;

    fn deref(&self) -> &P {
        &self.props
    }
}

impl<P, T> DerefMut for AsyncRenderProps<P, T> {
    fn deref_mut(&mut self) -> &mut P {
        &mut self.props
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ulid::Ulid;

    #[derive(Default)]
    struct RecordingHook {
        settled: Mutex<Vec<TaskId>>,
        abandoned: Mutex<Vec<TaskId>>,
    }

    impl SettleHook for RecordingHook {
        fn on_settled(&self, id: TaskId) {
            self.settled.lock().unwrap().push(id);
        }

        fn on_abandoned(&self, id: TaskId) {
            self.abandoned.lock().unwrap().push(id);
        }
    }

    fn props<T>(title: &str) -> (AsyncRenderProps<String, T>, oneshot::Receiver<Outcome<T>>) {
        let (tx, rx) = oneshot::channel();
        let slot = Arc::new(SettleSlot::new(TaskId::from_ulid(Ulid::new()), tx));
        (AsyncRenderProps::new(title.to_string(), slot), rx)
    }

    fn attach(props: &AsyncRenderProps<String, ()>, hook: &Arc<RecordingHook>) {
        let hook: Arc<dyn SettleHook> = hook.clone();
        props.resolve.slot.attach(Arc::downgrade(&hook));
    }

    #[test]
    fn first_resolve_wins() {
        let (props, mut rx) = props::<&str>("A");

        props.resolve.resolve("x");
        props.resolve.resolve("y");
        props.reject.reject();

        assert!(props.resolve.is_settled());
        assert!(matches!(rx.try_recv(), Ok(Ok(Some("x")))));
    }

    #[test]
    fn clones_share_the_settlement() {
        let (props, mut rx) = props::<u32>("A");
        let reject = props.reject.clone();

        reject.reject_with("boom");
        props.resolve.resolve(1);

        match rx.try_recv() {
            Ok(Err(Rejection::Failed(reason))) => assert_eq!(reason.to_string(), "boom"),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn deref_exposes_caller_props() {
        let (props, _rx) = props::<()>("Are you sure?");
        assert_eq!(props.len(), "Are you sure?".len());
        assert_eq!(props.as_str(), "Are you sure?");
    }

    #[test]
    fn dropping_every_handle_closes_the_channel() {
        let (props, mut rx) = props::<()>("A");
        drop(props);

        assert!(matches!(
            rx.try_recv(),
            Err(oneshot::error::TryRecvError::Closed)
        ));
    }

    #[test]
    fn settling_before_attach_stays_off_the_hook() {
        let hook = Arc::new(RecordingHook::default());
        let (props, mut rx) = props::<()>("A");

        props.resolve.resolve_empty();
        attach(&props, &hook);
        props.reject.reject();

        assert!(matches!(rx.try_recv(), Ok(Ok(None))));
        assert!(hook.settled.lock().unwrap().is_empty());
    }

    #[test]
    fn attached_hook_sees_settlement_and_abandonment() {
        let hook = Arc::new(RecordingHook::default());
        let (settled, _rx) = props::<()>("A");
        let (forgotten, _rx2) = props::<()>("B");
        attach(&settled, &hook);
        attach(&forgotten, &hook);

        settled.resolve.resolve_empty();
        let forgotten_id = forgotten.id();
        drop(forgotten);

        assert_eq!(*hook.settled.lock().unwrap(), vec![settled.id()]);
        assert_eq!(*hook.abandoned.lock().unwrap(), vec![forgotten_id]);
    }
}
