//! Errors - エラー型と分類
//!
//! settle 時の失敗は `Rejection` で future 経由で返すので、ここにあるのは
//! 構築時とレジストリ操作時のエラーだけです。

use super::TaskId;

/// RegistryError は TaskRegistry の操作エラー
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("task '{0}' is already registered")]
    DuplicateTask(TaskId),
}

/// BuildError はマネージャー構築時のエラー
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("AsyncRenderManager must be built inside a tokio runtime")]
    NoRuntime(#[source] tokio::runtime::TryCurrentError),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
