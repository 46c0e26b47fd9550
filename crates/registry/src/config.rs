use certchain_types::GradeScale;
use serde::{Deserialize, Serialize};

/// Registry creation parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Grade table used for every credential this registry issues. Fixed
    /// once the registry exists; a restored registry keeps its stored scale.
    pub grade_scale: GradeScale,
    /// Buffer size for `BroadcastEventSink` subscribers.
    pub event_capacity: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            grade_scale: GradeScale::Extended,
            event_capacity: 1024,
        }
    }
}
