//! Visual payloads shown in menu cells.
//!
//! A [`Visual`] is opaque to the runtime apart from equality; the renderer
//! decides how a material and label are actually drawn.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Appearance of one cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Visual {
    /// Host material identifier, e.g. `"gold_ingot"`.
    pub material: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub lore: Vec<String>,

    #[serde(default = "default_amount")]
    pub amount: u32,

    /// Host-specific appearance data passed through to the renderer untouched.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
}

fn default_amount() -> u32 {
    1
}

impl Visual {
    pub fn new(material: impl Into<String>) -> Self {
        Self {
            material: material.into(),
            label: None,
            lore: Vec::new(),
            amount: default_amount(),
            extra: Map::new(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_lore(mut self, line: impl Into<String>) -> Self {
        self.lore.push(line.into());
        self
    }

    pub fn with_amount(mut self, amount: u32) -> Self {
        self.amount = amount;
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// Unlabelled decoration pane.
    pub fn pane(color: PaneColor) -> Self {
        Self::new(color.material()).with_label("")
    }
}

/// Decoration pane colours, in gradient order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaneColor {
    White,
    LightGray,
    Gray,
    Black,
    Brown,
    Red,
    Orange,
    Yellow,
    Lime,
    Green,
    Cyan,
    LightBlue,
    Blue,
    Purple,
    Magenta,
    Pink,
}

impl PaneColor {
    /// Every colour in gradient order.
    pub const ALL: [PaneColor; 16] = [
        PaneColor::White,
        PaneColor::LightGray,
        PaneColor::Gray,
        PaneColor::Black,
        PaneColor::Brown,
        PaneColor::Red,
        PaneColor::Orange,
        PaneColor::Yellow,
        PaneColor::Lime,
        PaneColor::Green,
        PaneColor::Cyan,
        PaneColor::LightBlue,
        PaneColor::Blue,
        PaneColor::Purple,
        PaneColor::Magenta,
        PaneColor::Pink,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PaneColor::White => "white",
            PaneColor::LightGray => "light_gray",
            PaneColor::Gray => "gray",
            PaneColor::Black => "black",
            PaneColor::Brown => "brown",
            PaneColor::Red => "red",
            PaneColor::Orange => "orange",
            PaneColor::Yellow => "yellow",
            PaneColor::Lime => "lime",
            PaneColor::Green => "green",
            PaneColor::Cyan => "cyan",
            PaneColor::LightBlue => "light_blue",
            PaneColor::Blue => "blue",
            PaneColor::Purple => "purple",
            PaneColor::Magenta => "magenta",
            PaneColor::Pink => "pink",
        }
    }

    pub fn material(self) -> String {
        format!("{}_stained_glass_pane", self.as_str())
    }

    pub fn index(self) -> usize {
        PaneColor::ALL
            .iter()
            .position(|c| *c == self)
            .unwrap_or_default()
    }
}

/// How the user interacted with a cell, as reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClickKind {
    Left,
    Right,
    ShiftLeft,
    ShiftRight,
    Middle,
    DoubleClick,
    Drop,
    NumberKey,
    Other,
}

impl Default for ClickKind {
    fn default() -> Self {
        ClickKind::Left
    }
}
