//! Picking and reconstruction settings

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Tolerances used by the intersection and reconstruction engines
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PickSettings {
    /// Radius of the point snap target in viewport pixels
    pub point_radius: f64,
    /// Edge snap distance in camera units at zoom 1 (scaled by zoom)
    pub edge_tolerance: f64,
    /// Smallest accepted area / perimeter² of a picked polygon
    pub min_pick_compactness: f64,
    /// Cloud points required under a free face to fit its plane
    pub min_support_points: usize,
    /// Largest relative residual accepted by the edge-extend solve
    pub max_extend_residual: f64,
    /// Smallest |cos| between a viewing ray and a face normal
    pub min_ray_plane_cos: f64,
}

impl Default for PickSettings {
    fn default() -> Self {
        Self {
            point_radius: 10.0,
            edge_tolerance: 0.001 * 30.0,
            min_pick_compactness: 1e-3,
            min_support_points: 3,
            max_extend_residual: 0.25,
            min_ray_plane_cos: 1e-3,
        }
    }
}

impl PickSettings {
    /// Parse settings from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, String> {
        serde_json::from_str(json).map_err(|e| format!("Invalid settings JSON: {e}"))
    }

    fn config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "facade", "facade-modeler")
            .map(|dirs| dirs.config_dir().join("settings.json"))
    }

    /// Load settings from file, or return default if not found
    pub fn load() -> Self {
        if let Some(config_path) = Self::config_path() {
            if let Ok(json) = std::fs::read_to_string(&config_path) {
                match Self::from_json(&json) {
                    Ok(settings) => return settings,
                    Err(e) => tracing::warn!("Ignoring {}: {e}", config_path.display()),
                }
            }
        }
        Self::default()
    }

    /// Save settings to the user config directory, returning the file written.
    pub fn save(&self) -> Result<PathBuf, String> {
        let config_path = Self::config_path().ok_or("No config directory for this user")?;
        self.save_to(&config_path)?;
        Ok(config_path)
    }

    /// Save settings as pretty JSON, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), String> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)
                .map_err(|e| format!("Failed to create {}: {e}", dir.display()))?;
        }
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize settings: {e}"))?;
        std::fs::write(path, json).map_err(|e| format!("Failed to write {}: {e}", path.display()))
    }
}
