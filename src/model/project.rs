use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A project groups tasks under one header row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    /// Bar color as `#RRGGBB`.
    #[serde(default = "default_color")]
    pub color: String,
    /// Hides every task of the project.
    #[serde(default)]
    pub collapsed: bool,
}

fn default_color() -> String {
    "#4682B4".to_string()
}

impl Project {
    pub fn new(name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            color: color.into(),
            collapsed: false,
        }
    }

    /// Parse `color` into RGB, if it is a valid `#RRGGBB` string.
    pub fn rgb(&self) -> Option<[u8; 3]> {
        let hex = self.color.trim().strip_prefix('#')?;
        if hex.len() != 6 {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
        Some([channel(0)?, channel(2)?, channel(4)?])
    }
}
