//! Captured payload types
//!
//! The pipeline treats these as opaque: tree traversal produces [`Node`]s,
//! input capture produces [`InputEvent`]s, and the processor turns them into
//! records. Only their presence matters to the queue.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One UI node collected by tree traversal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Stable identifier of the underlying view
    pub id: i64,
    /// Node kind (e.g. "text", "image", "shape")
    pub kind: String,
    /// Mapper-specific attributes
    #[serde(default)]
    pub attributes: Value,
    /// Nested nodes
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Node>,
}

impl Node {
    /// Create a leaf node
    pub fn new(id: i64, kind: impl Into<String>) -> Self {
        Self {
            id,
            kind: kind.into(),
            attributes: Value::Null,
            children: Vec::new(),
        }
    }

    /// Attach attributes
    pub fn with_attributes(mut self, attributes: Value) -> Self {
        self.attributes = attributes;
        self
    }
}

/// Screen orientation at capture time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
    Undefined,
}

/// Screen bounds in device-independent pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScreenBounds {
    pub width: u64,
    pub height: u64,
}

/// Device state captured alongside a snapshot
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SystemInformation {
    /// Screen bounds
    pub screen_bounds: ScreenBounds,
    /// Screen orientation
    pub orientation: Orientation,
    /// Screen density
    pub screen_density: f32,
    /// Window background color, if resolvable
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme_color: Option<String>,
}

/// Kind of a captured input event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputEventKind {
    PointerDown,
    PointerMove,
    PointerUp,
}

/// A single captured pointer/touch event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputEvent {
    /// Event kind
    pub kind: InputEventKind,
    /// Pointer identifier
    pub pointer_id: i64,
    /// X position
    pub x: i64,
    /// Y position
    pub y: i64,
    /// Wall clock time in milliseconds
    pub timestamp_ms: i64,
}
