//! Stage configuration.

use crate::error::RenderResult;
use inkpane_core::{CONTROL_RADIUS, ROTATE_HANDLE_OFFSET};
use kurbo::Size;
use peniko::Color;
use serde::{Deserialize, Serialize};

/// RGBA color that round-trips through JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializableColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl SerializableColor {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn to_color(self) -> Color {
        self.into()
    }
}

impl From<Color> for SerializableColor {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Self {
            r: rgba.r,
            g: rgba.g,
            b: rgba.b,
            a: rgba.a,
        }
    }
}

impl From<SerializableColor> for Color {
    fn from(color: SerializableColor) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}

/// Tunables for a [`Stage`](crate::Stage). Every field has a default, so a
/// partial JSON object is a valid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageConfig {
    /// Half-width of a control point's hit window, in shape units. Also sets
    /// the minimum shape size to twice this value.
    pub control_radius: f64,
    /// Distance of the rotate handle from the right edge of the bounds.
    pub rotate_handle_offset: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
    /// Zoom factor applied per wheel notch.
    pub zoom_step: f64,
    /// Background grid spacing in world units.
    pub grid_size: f64,
    pub selection_color: SerializableColor,
    pub background_color: SerializableColor,
    pub grid_color: SerializableColor,
    /// Surface size used when panes are created.
    pub canvas_size: Size,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            control_radius: CONTROL_RADIUS,
            rotate_handle_offset: ROTATE_HANDLE_OFFSET,
            min_zoom: 0.1,
            max_zoom: 10.0,
            zoom_step: 1.1,
            grid_size: 20.0,
            selection_color: SerializableColor::new(59, 130, 246, 255),
            background_color: SerializableColor::new(250, 250, 250, 255),
            grid_color: SerializableColor::new(200, 200, 200, 100),
            canvas_size: Size::new(800.0, 600.0),
        }
    }
}

impl StageConfig {
    /// Parse a JSON configuration; missing fields take their defaults.
    pub fn from_json(json: &str) -> RenderResult<Self> {
        let config: StageConfig = serde_json::from_str(json)?;
        log::debug!("Loaded stage config: {:?}", config);
        Ok(config)
    }

    pub fn to_json(&self) -> RenderResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
