//! awaitui-core
//!
//! Drive declarative UI imperatively: render a component, then await what the
//! user did with it.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（TaskId, TaskStatus, Rejection, errors）
//! - **ports**: 抽象化レイヤー（Clock, IdGenerator, RenderSurface）
//! - **registry**: 表示中タスクの順序付きストアと Snapshot
//! - **app**: AsyncRenderManager, ManagerBuilder, SurfaceLoop
//! - **observability**: レジストリの集計
//!
//! # 使用例
//! ```ignore
//! let manager = ManagerBuilder::new().build::<Dialog>()?;
//! match manager.render(Dialog::new, DialogProps { title: "Are you sure?".into() }).await {
//!     Ok(choice) => println!("user chose {choice:?}"),
//!     Err(Rejection::Cancelled) => {}
//!     Err(e) => eprintln!("{e}"),
//! }
//! ```

pub mod app;
pub mod domain;
pub mod observability;
pub mod ports;
pub mod registry;

pub use app::{
    AsyncRenderManager, AsyncRenderProps, ManagerBuilder, Rejecter, RenderConfig, RenderFuture,
    Resolver, SurfaceLoop,
};
pub use domain::{BoxError, BuildError, Outcome, Rejection, RegistryError, TaskId, TaskStatus};
pub use observability::RegistryCounts;
pub use registry::{RegistryAction, RegistryChange, Snapshot, TaskEntry, TaskRegistry};
