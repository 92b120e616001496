use serde::{Deserialize, Serialize};

/// How many tasks the registry currently holds, by status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryCounts {
    pub active: usize,
    pub settled: usize,
}

