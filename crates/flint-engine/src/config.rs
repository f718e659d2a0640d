use serde::{Deserialize, Serialize};

/// Engine knobs. Every field has a serde default so partial configs
/// deserialize cleanly.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Recursion depth budget for nested construction. Once spent, the
    /// generator resolves recursive requests to the absent value instead
    /// of descending further; stream exhaustion alone never bounds
    /// recursion.
    #[serde(default = "default_max_depth")]
    pub max_depth: u32,

    /// Emit `tracing` debug events for constructor picks, polymorphic
    /// resolutions, and builder call plans.
    #[serde(default)]
    pub log_plans: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            log_plans: false,
        }
    }
}

fn default_max_depth() -> u32 {
    16
}
