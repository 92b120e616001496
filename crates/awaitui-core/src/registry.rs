//! TaskRegistry - 表示中のレンダータスクの順序付きストア
//!
//! # 役割
//! - task id -> TaskEntry の対応を挿入順に保持（挿入順 = 表示順）
//! - 変更は insert / mark_settled / remove（マネージャーは RegistryAction 経由で呼ぶ）だけ
//! - レンダーサーフェスは Snapshot を読むだけで、レジストリを直接触らない
//!
//! 所有者は AsyncRenderManager だけです。

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::domain::{RegistryError, TaskId, TaskStatus};
use crate::observability::RegistryCounts;

/// One task as the render surface sees it.
///
/// `renderable` is created once by the component factory and shared by every
/// snapshot, so `Arc::ptr_eq` holds for the whole lifetime of the task.
pub struct TaskEntry<R> {
    pub id: TaskId,
    pub renderable: Arc<R>,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
    pub settled_at: Option<DateTime<Utc>>,
}

impl<R> TaskEntry<R> {
    pub fn new(id: TaskId, renderable: Arc<R>, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            renderable,
            status: TaskStatus::Active,
            created_at,
            settled_at: None,
        }
    }
}

// derive would require `R: Clone` / `R: Debug`
impl<R> Clone for TaskEntry<R> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            renderable: Arc::clone(&self.renderable),
            status: self.status,
            created_at: self.created_at,
            settled_at: self.settled_at,
        }
    }
}

impl<R> fmt::Debug for TaskEntry<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskEntry")
            .field("id", &self.id)
            .field("status", &self.status)
            .field("created_at", &self.created_at)
            .field("settled_at", &self.settled_at)
            .finish_non_exhaustive()
    }
}

/// Reducer form of the registry mutations.
pub enum RegistryAction<R> {
    Insert(TaskEntry<R>),
    MarkSettled { id: TaskId, at: DateTime<Utc> },
    Remove(TaskId),
}

/// What a dispatched [`RegistryAction`] did.
///
/// `Removed` hands the entry back so the owner decides where it is dropped.
pub enum RegistryChange<R> {
    Unchanged,
    Inserted,
    Settled,
    Removed(TaskEntry<R>),
}

impl<R> RegistryChange<R> {
    pub fn is_changed(&self) -> bool {
        !matches!(self, Self::Unchanged)
    }
}

/// TaskRegistry は挿入順を保つ task id -> TaskEntry のマップ
///
/// 同時に表示されるタスクはせいぜい数個なので、Vec の線形探索で十分です。
pub struct TaskRegistry<R> {
    entries: Vec<TaskEntry<R>>,
}

impl<R> TaskRegistry<R> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// エントリを末尾に追加
    ///
    /// 同じ id が既にあれば `RegistryError::DuplicateTask`。
    pub fn insert(&mut self, entry: TaskEntry<R>) -> Result<(), RegistryError> {
        if self.contains(entry.id) {
            return Err(RegistryError::DuplicateTask(entry.id));
        }
        self.entries.push(entry);
        Ok(())
    }

    /// Active なエントリを Settled にする
    ///
    /// 存在しない、または既に Settled なら false。
    pub fn mark_settled(&mut self, id: TaskId, at: DateTime<Utc>) -> bool {
        match self.entries.iter_mut().find(|entry| entry.id == id) {
            Some(entry) if entry.status.is_active() => {
                entry.status = TaskStatus::Settled;
                entry.settled_at = Some(at);
                true
            }
            _ => false,
        }
    }

    /// エントリを削除（存在しなければ何もしない）
    pub fn remove(&mut self, id: TaskId) -> Option<TaskEntry<R>> {
        let index = self.entries.iter().position(|entry| entry.id == id)?;
        Some(self.entries.remove(index))
    }

    /// RegistryAction を適用し、何が変わったかを返す
    pub fn dispatch(
        &mut self,
        action: RegistryAction<R>,
    ) -> Result<RegistryChange<R>, RegistryError> {
        let change = match action {
            RegistryAction::Insert(entry) => {
                self.insert(entry)?;
                RegistryChange::Inserted
            }
            RegistryAction::MarkSettled { id, at } if self.mark_settled(id, at) => {
                RegistryChange::Settled
            }
            RegistryAction::MarkSettled { .. } => RegistryChange::Unchanged,
            RegistryAction::Remove(id) => match self.remove(id) {
                Some(entry) => RegistryChange::Removed(entry),
                None => RegistryChange::Unchanged,
            },
        };
        Ok(change)
    }

    pub fn contains(&self, id: TaskId) -> bool {
        self.entries.iter().any(|entry| entry.id == id)
    }

    pub fn get(&self, id: TaskId) -> Option<&TaskEntry<R>> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    /// 現在のエントリを挿入順で返す（副作用なし）
    pub fn snapshot(&self) -> Vec<TaskEntry<R>> {
        self.entries.clone()
    }

    pub fn counts(&self) -> RegistryCounts {
        let settled = self
            .entries
            .iter()
            .filter(|entry| entry.status.is_settled())
            .count();
        RegistryCounts {
            active: self.entries.len() - settled,
            settled,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry (manager teardown).
    pub(crate) fn clear(&mut self) -> Vec<TaskEntry<R>> {
        std::mem::take(&mut self.entries)
    }
}

impl<R> Default for TaskRegistry<R> {
    fn default() -> Self {
        Self::new()
    }
}

/// A published, read-only view of the registry.
///
/// `revision` increases by one on every registry change, so a surface can tell
/// whether it already rendered this state. The last snapshot of a shut down
/// manager is `closed` and empty.
pub struct Snapshot<R> {
    revision: u64,
    tasks: Arc<[TaskEntry<R>]>,
    closed: bool,
}

impl<R> Snapshot<R> {
    pub(crate) fn new(revision: u64, tasks: Vec<TaskEntry<R>>, closed: bool) -> Self {
        Self {
            revision,
            tasks: tasks.into(),
            closed,
        }
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn tasks(&self) -> &[TaskEntry<R>] {
        &self.tasks
    }

    pub fn ids(&self) -> Vec<TaskId> {
        self.tasks.iter().map(|entry| entry.id).collect()
    }

    pub fn active(&self) -> impl Iterator<Item = &TaskEntry<R>> {
        self.tasks.iter().filter(|entry| entry.status.is_active())
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

impl<R> Clone for Snapshot<R> {
    fn clone(&self) -> Self {
        Self {
            revision: self.revision,
            tasks: Arc::clone(&self.tasks),
            closed: self.closed,
        }
    }
}

impl<R> fmt::Debug for Snapshot<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Snapshot")
            .field("revision", &self.revision)
            .field("tasks", &self.tasks)
            .field("closed", &self.closed)
            .finish()
    }
}
