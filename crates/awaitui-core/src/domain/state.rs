//! State - レンダータスクの状態

use serde::{Deserialize, Serialize};

/// TaskStatus はレンダータスクの状態を表現
///
/// # 状態遷移
/// - active: 表示中で、resolve / reject を待っている
/// - settled: 結果が確定済み（猶予期間が過ぎるまでは表示され続ける）
///
/// `Active -> Settled` の遷移はちょうど一度だけ起こります。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Active,
    Settled,
}

impl TaskStatus {
    pub fn is_active(self) -> bool {
        matches!(self, TaskStatus::Active)
    }

    pub fn is_settled(self) -> bool {
        matches!(self, TaskStatus::Settled)
    }
}
