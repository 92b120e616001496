//! RenderSurface port - 表示側（ホスト UI）の抽象化
//!
//! マネージャーはレジストリが変わるたびに Snapshot を配信し、
//! SurfaceLoop がそれを RenderSurface に渡します。
//! サーフェスは Snapshot を読むだけで、レジストリを変更しません。

use async_trait::async_trait;

use crate::registry::Snapshot;

/// RenderSurface は Snapshot を画面（端末、GUI、テスト用の記録など）に反映する
///
/// # 契約
/// - 渡される Snapshot は挿入順（古いものが先）
/// - Settled なタスクも猶予期間中は含まれる（閉じるアニメーションなどに使う）
/// - 中間の Snapshot は飛ばされることがある（常に最新の状態が届く）
#[async_trait]
pub trait RenderSurface<R: Send + Sync + 'static>: Send + Sync {
    async fn render(&self, snapshot: &Snapshot<R>);
}
