//! SurfaceLoop - Snapshot を RenderSurface に届けるループ
//!
//! # フロー
//! 1. 現在の Snapshot を描画
//! 2. 変更通知（watch）を待って最新の Snapshot を描画、を繰り返す
//! 3. closed な Snapshot を描画したら、またはマネージャーが drop されたら終了

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

use super::manager::AsyncRenderManager;
use crate::ports::RenderSurface;
use crate::registry::Snapshot;

pub struct SurfaceLoop<R, S> {
    snapshots: watch::Receiver<Snapshot<R>>,
    surface: S,
}

impl<R, S> SurfaceLoop<R, S>
where
    R: Send + Sync + 'static,
    S: RenderSurface<R>,
{
    pub fn new(manager: &AsyncRenderManager<R>, surface: S) -> Self {
        Self {
            snapshots: manager.subscribe(),
            surface,
        }
    }

    pub async fn run(mut self) -> S {
        loop {
            let snapshot = self.snapshots.borrow_and_update().clone();
            self.surface.render(&snapshot).await;

            if snapshot.is_closed() {
                debug!(revision = snapshot.revision(), "surface loop saw closed snapshot");
                break;
            }
            if self.snapshots.changed().await.is_err() {
                debug!("render manager dropped, surface loop exiting");
                break;
            }
        }
        self.surface
    }

    pub fn spawn(self) -> JoinHandle<S>
    where
        S: 'static,
    {
        tokio::spawn(self.run())
    }
}
