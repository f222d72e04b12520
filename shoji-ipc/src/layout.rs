use serde::{Deserialize, Serialize};

/// Arrangement requested from a layout engine for a workspace root.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutKind {
    #[default]
    Tiles,
    Accordion,
}

impl LayoutKind {
    pub fn name(self) -> &'static str {
        match self {
            LayoutKind::Tiles => "tiles",
            LayoutKind::Accordion => "accordion",
        }
    }
}

/// Message from shoji to layout engine
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LayoutMessage {
    /// Request layout calculation
    Layout {
        width: u32,
        height: u32,
        windows: Vec<u32>, // window IDs in tiling order
    },
}

/// Response from layout engine to shoji
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LayoutResult {
    /// Layout calculation result
    Layout { windows: Vec<WindowGeometry> },
    /// Error occurred
    Error { message: String },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WindowGeometry {
    pub id: u32,
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}
