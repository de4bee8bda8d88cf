//! Engine defaults: rule fallbacks and the structural series cap.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// COUNT applied when a rule omits it or carries a non-positive/non-numeric value.
pub const DEFAULT_COUNT: u32 = 52;

/// INTERVAL applied when a rule omits it or carries a non-positive/non-numeric value.
pub const DEFAULT_INTERVAL: u32 = 1;

/// Upper bound on how many steps any series may take, whatever its COUNT says.
pub const DEFAULT_SERIES_CAP: u32 = 1000;

/// Tunable defaults shared by the parser and the generator.
///
/// Every field has a default, so a partial TOML table such as
/// `series_cap = 200` deserializes cleanly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub default_count: u32,
    pub default_interval: u32,
    pub series_cap: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_count: DEFAULT_COUNT,
            default_interval: DEFAULT_INTERVAL,
            series_cap: DEFAULT_SERIES_CAP,
        }
    }
}

impl EngineConfig {
    /// Reject zero values; every field must be at least 1.
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("default_count", self.default_count),
            ("default_interval", self.default_interval),
            ("series_cap", self.series_cap),
        ];
        for (name, value) in fields {
            if value == 0 {
                return Err(EngineError::InvalidConfig(format!(
                    "{} must be at least 1",
                    name
                )));
            }
        }
        Ok(())
    }
}
