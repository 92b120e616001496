//! Domain model (IDs, status, outcomes, errors).
//!
//! UI 技術にも runtime にも依存しない型だけを置きます。

pub mod errors;
pub mod ids;
pub mod outcome;
pub mod state;

pub use self::errors::{BuildError, RegistryError};
pub use self::ids::TaskId;
pub use self::outcome::{BoxError, Outcome, Rejection};
pub use self::state::TaskStatus;
