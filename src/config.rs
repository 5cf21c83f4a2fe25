//! Stage settings supplied by the host page.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use serde::{Deserialize, Serialize};

use crate::consts::DEFAULT_FRAME_RATE;
use crate::error::StageError;

/// Initial settings for a stage. Missing JSON fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageConfig {
    /// Ticks per second. `0` creates a stage that never ticks until a rate is set.
    pub frame_rate: f64,
    /// Resolve the hit target on pointer moves.
    pub trace_mouse_target: bool,
    /// Start with rendering paused.
    pub paused: bool,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self { frame_rate: DEFAULT_FRAME_RATE, trace_mouse_target: true, paused: false }
    }
}

impl StageConfig {
    /// Parse settings from a JSON object.
    ///
    /// # Errors
    ///
    /// Returns [`StageError::Descriptor`] if `json` is not a valid config object.
    pub fn from_json(json: &str) -> Result<Self, StageError> {
        Ok(serde_json::from_str(json)?)
    }
}
