//! Sandbox configuration.
//!
//! Every field has a default, so a partial JSON document (or `{}`) is a
//! valid configuration.

use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::images::ManipulatorMode;

/// Colors and sizes of the transform overlay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayStyle {
    /// Side length of a handle box in pixels.
    pub handle_size: f64,
    pub handle_fill: Color,
    pub handle_stroke: Color,
    pub handle_line_width: f64,
    /// Wide outline drawn under the dark one.
    pub outline_light: Color,
    pub outline_light_width: f64,
    pub outline_dark: Color,
    pub outline_dark_width: f64,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            handle_size: 20.0,
            handle_fill: Color::SLATE,
            handle_stroke: Color::WHITE,
            handle_line_width: 2.0,
            outline_light: Color::WHITE,
            outline_light_width: 4.0,
            outline_dark: Color::SLATE,
            outline_dark_width: 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SandboxConfig {
    pub background: Color,
    pub overlay: OverlayStyle,
    /// Mode the image collection starts in.
    pub mode: ManipulatorMode,
    /// Image placed by a middle click.
    pub default_image: String,
    /// Maximum retained pointer move/click records; `None` keeps all.
    pub max_pointer_history: Option<usize>,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            background: Color::CHARCOAL,
            overlay: OverlayStyle::default(),
            mode: ManipulatorMode::Transform,
            default_image: "images/centro.jpg".to_string(),
            max_pointer_history: None,
        }
    }
}

impl SandboxConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
