//! Editor configuration.

use crate::error::{EditError, EditResult};
use crate::snap::{ANGLE_SNAP_INCREMENT, SnapOptions};
use serde::{Deserialize, Serialize};

/// Largest resize factor magnitude before the resize flips.
pub const RESIZE_MAX_FACTOR: f64 = 100.0;

/// Tunables for gestures and snapping. Missing JSON fields take their defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub snap: SnapOptions,
    pub snapping_enabled: bool,
    pub resize_max_factor: f64,
    /// Degrees; zero disables rotation snapping.
    pub rotation_snap_increment: f64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            snap: SnapOptions::default(),
            snapping_enabled: true,
            resize_max_factor: RESIZE_MAX_FACTOR,
            rotation_snap_increment: ANGLE_SNAP_INCREMENT,
        }
    }
}

impl EditorConfig {
    pub fn from_json(json: &str) -> EditResult<Self> {
        let config: Self = serde_json::from_str(json).map_err(|e| EditError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> EditResult<()> {
        if self.resize_max_factor.is_nan() || self.resize_max_factor < 1.0 {
            return Err(EditError::Config(format!(
                "resize_max_factor must be at least 1, got {}",
                self.resize_max_factor
            )));
        }
        if self.snap.threshold < 0.0 || self.rotation_snap_increment < 0.0 {
            return Err(EditError::Config("snap distances must not be negative".into()));
        }
        Ok(())
    }
}
