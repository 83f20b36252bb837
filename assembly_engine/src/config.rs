//! Viewer configuration.
//!
//! Every field is optional in the JSON file; missing values fall back to the
//! defaults below and out-of-range values are clamped rather than rejected.

use std::{fs, path::Path, time::Duration};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::resolver::DisplayMode;

pub const MIN_PREVIOUS_STEPS_OPACITY: f32 = 0.1;
pub const MAX_PREVIOUS_STEPS_OPACITY: f32 = 0.9;

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct ViewerConfig {
    pub render: RenderSettings,
    pub display: DisplaySettings,
    pub focus: FocusSettings,
    pub autoplay: AutoPlaySettings,
}

/// Switches handed to the renderer bootstrap.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct RenderSettings {
    /// Whether the renderer may cache decoded resources between loads.
    pub resource_cache: bool,
    /// Force the per-drawable flag normalization pass after each load.
    pub normalize_materials: bool,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            resource_cache: true,
            normalize_materials: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct DisplaySettings {
    pub mode: DisplayMode,
    pub highlight_enabled: bool,
    pub highlight_color: [f32; 3],
    pub previous_steps_transparency: bool,
    pub previous_steps_opacity: f32,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            mode: DisplayMode::Cumulative,
            highlight_enabled: true,
            highlight_color: [1.0, 0.55, 0.1],
            previous_steps_transparency: false,
            previous_steps_opacity: 0.3,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct FocusSettings {
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
    pub padding: f32,
    /// Floor applied to each bounding-box axis before framing.
    pub min_extent: f32,
}

impl Default for FocusSettings {
    fn default() -> Self {
        Self {
            fov_degrees: 50.0,
            padding: 1.5,
            min_extent: 0.1,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct AutoPlaySettings {
    pub interval_ms: u64,
}

impl Default for AutoPlaySettings {
    fn default() -> Self {
        Self { interval_ms: 2000 }
    }
}

impl AutoPlaySettings {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms.max(1))
    }
}

impl ViewerConfig {
    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: ViewerConfig =
            serde_json::from_str(text).context("parsing viewer config JSON")?;
        Ok(config.sanitized())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading viewer config {}", path.display()))?;
        Self::from_json_str(&data).with_context(|| format!("loading {}", path.display()))
    }

    /// Clamp values into the ranges the resolver and camera expect.
    pub fn sanitized(mut self) -> Self {
        let opacity = self.display.previous_steps_opacity;
        self.display.previous_steps_opacity = if opacity.is_finite() {
            opacity.clamp(MIN_PREVIOUS_STEPS_OPACITY, MAX_PREVIOUS_STEPS_OPACITY)
        } else {
            DisplaySettings::default().previous_steps_opacity
        };
        if !(self.focus.fov_degrees.is_finite()
            && self.focus.fov_degrees > 1.0
            && self.focus.fov_degrees < 179.0)
        {
            self.focus.fov_degrees = FocusSettings::default().fov_degrees;
        }
        if !(self.focus.padding.is_finite() && self.focus.padding > 0.0) {
            self.focus.padding = FocusSettings::default().padding;
        }
        if !(self.focus.min_extent.is_finite() && self.focus.min_extent > 0.0) {
            self.focus.min_extent = FocusSettings::default().min_extent;
        }
        self
    }
}
