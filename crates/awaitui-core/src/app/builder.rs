//! ManagerBuilder - AsyncRenderManager の構築とワイヤリング
//!
//! # 学習ポイント
//! - Builder パターンの実装
//! - 起動時検証（Fail-fast 設計）: tokio runtime の外で build すると BuildError
//! - ports（Clock, IdGenerator）の差し替え

use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;

use super::config::RenderConfig;
use super::manager::AsyncRenderManager;
use crate::domain::BuildError;
use crate::ports::{Clock, IdGenerator, SystemClock, UlidGenerator};

/// ManagerBuilder は AsyncRenderManager を構築
///
/// # 使用例
/// ```ignore
/// let manager: AsyncRenderManager<Dialog> = ManagerBuilder::new()
///     .cleanup_grace_period(Duration::from_millis(300))
///     .build()?;
/// ```
///
/// # 既定値
/// - config: `RenderConfig::default()`（猶予 3000ms）
/// - clock: `SystemClock`
/// - id generator: clock を使う `UlidGenerator`
/// - runtime: `build()` を呼んだ時点の tokio runtime
#[derive(Default)]
pub struct ManagerBuilder {
    config: RenderConfig,
    clock: Option<Arc<dyn Clock>>,
    ids: Option<Box<dyn IdGenerator>>,
    runtime: Option<Handle>,
}

impl ManagerBuilder {
    /// 新しい ManagerBuilder を作成
    pub fn new() -> Self {
        Self::default()
    }

    /// 設定をまとめて差し替え
    pub fn config(mut self, config: RenderConfig) -> Self {
        self.config = config;
        self
    }

    /// settle から削除までの猶予期間（0 なら即削除）
    pub fn cleanup_grace_period(mut self, grace: Duration) -> Self {
        self.config.cleanup_grace_period = grace;
        self
    }

    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Some(Arc::new(clock));
        self
    }

    pub fn id_generator(mut self, ids: impl IdGenerator + 'static) -> Self {
        self.ids = Some(Box::new(ids));
        self
    }

    /// 削除タイマーを spawn する runtime を明示
    pub fn runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// マネージャーを構築
    ///
    /// # 検証
    /// - runtime 未指定なら現在の tokio runtime を使う。なければ `BuildError::NoRuntime`
    pub fn build<R: Send + Sync + 'static>(self) -> Result<AsyncRenderManager<R>, BuildError> {
        let runtime = match self.runtime {
            Some(runtime) => runtime,
            None => Handle::try_current().map_err(BuildError::NoRuntime)?,
        };
        let clock: Arc<dyn Clock> = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let ids = self
            .ids
            .unwrap_or_else(|| Box::new(UlidGenerator::new(Arc::clone(&clock))));

        Ok(AsyncRenderManager::new(self.config, clock, ids, runtime))
    }
}
