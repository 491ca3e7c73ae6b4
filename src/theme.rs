use serde::{Deserialize, Serialize};

/// Font description handed to text measurement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Theme {
    pub font_family: String,
    pub font_size: f32,
}

impl Theme {
    pub fn default_font() -> Self {
        Self {
            font_family: "\"trebuchet ms\", verdana, arial, sans-serif".to_string(),
            font_size: 16.0,
        }
    }

    pub fn modern() -> Self {
        Self {
            font_family: "Inter, Segoe UI, system-ui, -apple-system, sans-serif".to_string(),
            font_size: 13.0,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "modern" => Some(Self::modern()),
            "default" | "base" => Some(Self::default_font()),
            _ => None,
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::default_font()
    }
}
