//! Ports - 抽象化レイヤー
//!
//! このモジュールは Hexagonal Architecture の「ポート」を定義します。
//! 時刻、ID 生成、表示側（レンダーサーフェス）を trait で切り離し、
//! テストでは差し替えられるようにしています。

pub mod clock;
pub mod id_generator;
pub mod render_surface;

// 主要な trait を再エクスポート
pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::id_generator::{IdGenerator, UlidGenerator};
pub use self::render_surface::RenderSurface;
