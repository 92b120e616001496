//! App - アプリケーション層
//!
//! このモジュールは、ports とレジストリを組み合わせて
//! 「render して結果を await する」仕組みを実装します。
//!
//! # 主要コンポーネント
//! - **ManagerBuilder**: マネージャーの構築とワイヤリング
//! - **AsyncRenderManager**: render / snapshot / subscribe / shutdown
//! - **AsyncRenderProps**: factory に渡す props と resolve / reject
//! - **RenderFuture**: 呼び出し側が await する結果
//! - **SurfaceLoop**: Snapshot をレンダーサーフェスに届けるループ

pub mod builder;
pub mod config;
pub mod future;
pub mod manager;
pub mod props;
pub mod surface_loop;

// 主要な型を再エクスポート
pub use self::builder::ManagerBuilder;
pub use self::config::{CLEANUP_GRACE_ENV, DEFAULT_CLEANUP_GRACE_PERIOD, RenderConfig};
pub use self::future::RenderFuture;
pub use self::manager::AsyncRenderManager;
pub use self::props::{AsyncRenderProps, Rejecter, Resolver};
pub use self::surface_loop::SurfaceLoop;
