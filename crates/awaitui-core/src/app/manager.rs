//! AsyncRenderManager - 「コンポーネントを表示して結果を await する」API
//!
//! # フロー
//! 1. `render(factory, props)` で ID を払い出し、resolve / reject を束ねた props で factory を呼ぶ
//! 2. できた renderable をレジストリに挿入し、新しい Snapshot を配信
//! 3. UI が resolve / reject を呼ぶと future が確定し、エントリは Settled になる
//! 4. 猶予期間（cleanup_grace_period）後にエントリを削除し、再び Snapshot を配信
//!
//! # ロック
//! - レジストリとタイマーの管理は 1 つの Mutex の内側にある
//! - ロック中に factory やユーザーのコードを呼ばない
//! - 削除したエントリ（renderable）はロックを外してから drop する

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use super::config::RenderConfig;
use super::future::RenderFuture;
use super::props::{AsyncRenderProps, SettleHook, SettleSlot};
use crate::domain::{Rejection, TaskId};
use crate::observability::RegistryCounts;
use crate::ports::{Clock, IdGenerator};
use crate::registry::{RegistryAction, RegistryChange, Snapshot, TaskEntry, TaskRegistry};

/// Handle on one render manager. Cloning is cheap and shares the same registry.
///
/// Dropping the last handle behaves like [`AsyncRenderManager::shutdown`] for
/// pending removal timers.
pub struct AsyncRenderManager<R> {
    inner: Arc<Inner<R>>,
}

impl<R> Clone for AsyncRenderManager<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct Inner<R> {
    config: RenderConfig,
    clock: Arc<dyn Clock>,
    ids: Box<dyn IdGenerator>,
    runtime: Handle,
    state: Mutex<State<R>>,
    snapshots: watch::Sender<Snapshot<R>>,
    this: Weak<Inner<R>>,
}

struct State<R> {
    registry: TaskRegistry<R>,
    cleanups: HashMap<TaskId, JoinHandle<()>>,
    revision: u64,
    closed: bool,
}

impl<R: Send + Sync + 'static> AsyncRenderManager<R> {
    pub(crate) fn new(
        config: RenderConfig,
        clock: Arc<dyn Clock>,
        ids: Box<dyn IdGenerator>,
        runtime: Handle,
    ) -> Self {
        let (snapshots, _) = watch::channel(Snapshot::new(0, Vec::new(), false));
        let inner = Arc::new_cyclic(|this| Inner {
            config,
            clock,
            ids,
            runtime,
            state: Mutex::new(State {
                registry: TaskRegistry::new(),
                cleanups: HashMap::new(),
                revision: 0,
                closed: false,
            }),
            snapshots,
            this: this.clone(),
        });
        Self { inner }
    }

    /// Render a component and get a future for its outcome.
    ///
    /// `factory` receives `props` together with the task's `resolve` / `reject`
    /// handles and returns the renderable the host surface will display. It
    /// runs synchronously, before this method returns.
    ///
    /// Never fails synchronously: every failure arrives through the future.
    pub fn render<P, T, F>(&self, factory: F, props: P) -> RenderFuture<T>
    where
        T: Send + 'static,
        F: FnOnce(AsyncRenderProps<P, T>) -> R,
    {
        let inner = &self.inner;
        let id = inner.ids.generate_task_id();

        if inner.lock_state().closed {
            warn!(task_id = %id, "render called after shutdown");
            return RenderFuture::abandoned(id);
        }

        let (sender, receiver) = oneshot::channel();
        let slot = Arc::new(SettleSlot::new(id, sender));

        let renderable = Arc::new(factory(AsyncRenderProps::new(props, Arc::clone(&slot))));
        let entry = TaskEntry::new(id, renderable, inner.clock.now());

        let mut state = inner.lock_state();
        if state.closed {
            drop(state);
            warn!(task_id = %id, "manager shut down while rendering");
            drop(entry);
            return RenderFuture::new(id, receiver);
        }
        let inserted = state.registry.dispatch(RegistryAction::Insert(entry));
        if inserted.is_ok() {
            inner.publish(&mut state);
        }
        drop(state);

        match inserted {
            Ok(_) => {
                debug!(task_id = %id, "render task inserted");
                let hook: Weak<dyn SettleHook> = inner.this.clone();
                slot.attach(hook);
                // resolve/reject may already have run inside the factory
                if slot.is_settled() {
                    inner.on_settled(id);
                }
            }
            Err(err) => {
                // the slot was never attached, so the task that owns this id is untouched
                error!(task_id = %id, error = %err, "task id collision");
                slot.settle(Err(Rejection::Failed(Box::new(err))));
            }
        }

        RenderFuture::new(id, receiver)
    }

    /// Current registry contents, in display order.
    pub fn snapshot(&self) -> Snapshot<R> {
        self.inner.snapshots.borrow().clone()
    }

    /// Receive a new snapshot after every registry change.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot<R>> {
        self.inner.snapshots.subscribe()
    }

    pub fn counts(&self) -> RegistryCounts {
        self.inner.lock_state().registry.counts()
    }

    pub fn config(&self) -> &RenderConfig {
        &self.inner.config
    }

    pub fn cleanup_grace_period(&self) -> Duration {
        self.inner.config.cleanup_grace_period
    }

    pub fn is_shut_down(&self) -> bool {
        self.inner.lock_state().closed
    }

    /// Tear the manager down.
    ///
    /// Pending removal timers are aborted without touching the registry, the
    /// registry is emptied and a final (closed) snapshot is published. Tasks that
    /// never settled resolve to `Rejection::Abandoned` once nothing holds their
    /// handles any more. Later `render` calls return an abandoned future.
    pub fn shutdown(&self) {
        let (entries, timers) = {
            let mut state = self.inner.lock_state();
            if state.closed {
                return;
            }
            state.closed = true;
            let entries = state.registry.clear();
            let timers: Vec<JoinHandle<()>> = state.cleanups.drain().map(|(_, t)| t).collect();
            self.inner.publish(&mut state);
            (entries, timers)
        };

        for timer in &timers {
            timer.abort();
        }
        debug!(
            discarded_tasks = entries.len(),
            aborted_timers = timers.len(),
            "render manager shut down"
        );
        drop(entries);
    }
}

impl<R> Inner<R> {
    fn lock_state(&self) -> MutexGuard<'_, State<R>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<R: Send + Sync + 'static> Inner<R> {
    fn publish(&self, state: &mut State<R>) {
        state.revision += 1;
        let snapshot = Snapshot::new(state.revision, state.registry.snapshot(), state.closed);
        self.snapshots.send_replace(snapshot);
    }

    /// Start the grace period for a settled task.
    ///
    /// Returns the entry when it was removed on the spot (zero grace period) so
    /// the caller can drop it outside the lock.
    fn schedule_removal(&self, state: &mut State<R>, id: TaskId) -> Option<TaskEntry<R>> {
        let grace = self.config.cleanup_grace_period;
        if grace.is_zero() {
            return self.remove_entry(state, id);
        }

        let this = self.this.clone();
        let timer = self.runtime.spawn(async move {
            tokio::time::sleep(grace).await;
            if let Some(inner) = this.upgrade() {
                inner.remove_task(id);
            }
        });
        state.cleanups.insert(id, timer);
        None
    }

    fn remove_task(&self, id: TaskId) {
        let removed = {
            let mut state = self.lock_state();
            state.cleanups.remove(&id);
            if state.closed {
                return;
            }
            self.remove_entry(&mut state, id)
        };
        drop(removed);
    }

    fn remove_entry(&self, state: &mut State<R>, id: TaskId) -> Option<TaskEntry<R>> {
        match state.registry.dispatch(RegistryAction::Remove(id)) {
            Ok(RegistryChange::Removed(entry)) => {
                debug!(task_id = %id, "render task removed");
                self.publish(state);
                Some(entry)
            }
            _ => None,
        }
    }
}

impl<R: Send + Sync + 'static> SettleHook for Inner<R> {
    fn on_settled(&self, id: TaskId) {
        let removed = {
            let mut state = self.lock_state();
            if state.closed {
                return;
            }
            let at = self.clock.now();
            let settled = state.registry.dispatch(RegistryAction::MarkSettled { id, at });
            if !matches!(settled, Ok(RegistryChange::Settled)) {
                return;
            }
            debug!(task_id = %id, "render task settled");
            self.publish(&mut state);
            self.schedule_removal(&mut state, id)
        };
        drop(removed);
    }

    fn on_abandoned(&self, id: TaskId) {
        let this = self.this.clone();
        self.runtime.spawn(async move {
            if let Some(inner) = this.upgrade() {
                inner.on_settled(id);
            }
        });
    }
}

impl<R> Drop for Inner<R> {
    fn drop(&mut self) {
        let state = self.state.get_mut().unwrap_or_else(PoisonError::into_inner);
        for (_, timer) in state.cleanups.drain() {
            timer.abort();
        }
    }
}
