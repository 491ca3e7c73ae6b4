use crate::theme::Theme;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Width rows are centred in.
    pub container_width: f32,
    /// Rows never start left of this.
    pub left_margin: f32,
    /// Offset of level 0 from the top.
    pub top_margin: f32,
    /// Horizontal gap between neighbours in a row.
    pub node_gap: f32,
    /// Vertical distance between consecutive levels.
    pub row_height: f32,
    pub node_padding_x: f32,
    pub node_padding_y: f32,
    pub label_line_height: f32,
    pub edge_label_padding: f32,
    /// Clearance kept between edge lanes and foreign nodes.
    pub node_padding: f32,
    /// Clearance kept between edge lanes and edge labels.
    pub label_padding: f32,
    /// How far right of the involved nodes an upward lane starts.
    pub back_edge_offset: f32,
    pub self_loop_size: f32,
    /// Radius of rounded corners; 0 keeps right angles.
    pub corner_radius: f32,
    /// Crossing-reduction sweeps; 0 keeps declaration order.
    pub order_passes: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            container_width: 1200.0,
            left_margin: 40.0,
            top_margin: 40.0,
            node_gap: 60.0,
            row_height: 120.0,
            node_padding_x: 30.0,
            node_padding_y: 15.0,
            label_line_height: 1.5,
            edge_label_padding: 4.0,
            node_padding: 12.0,
            label_padding: 6.0,
            back_edge_offset: 30.0,
            self_loop_size: 24.0,
            corner_radius: 8.0,
            order_passes: 2,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub theme: Theme,
    pub layout: LayoutConfig,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    theme: Option<String>,
    theme_variables: Option<ThemeVariables>,
    layout: Option<LayoutConfigFile>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThemeVariables {
    font_family: Option<String>,
    font_size: Option<NumberOrString>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(f32),
    String(String),
}

impl NumberOrString {
    fn as_f32(&self) -> Option<f32> {
        match self {
            NumberOrString::Number(value) => Some(*value),
            NumberOrString::String(value) => value.trim().trim_end_matches("px").parse().ok(),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct LayoutConfigFile {
    container_width: Option<f32>,
    left_margin: Option<f32>,
    top_margin: Option<f32>,
    node_gap: Option<f32>,
    row_height: Option<f32>,
    node_padding_x: Option<f32>,
    node_padding_y: Option<f32>,
    label_line_height: Option<f32>,
    edge_label_padding: Option<f32>,
    node_padding: Option<f32>,
    label_padding: Option<f32>,
    back_edge_offset: Option<f32>,
    self_loop_size: Option<f32>,
    corner_radius: Option<f32>,
    order_passes: Option<usize>,
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let contents = std::fs::read_to_string(path)?;
    parse_config(&contents)
}

/// Parses a config document (JSON or JSON5) over the defaults.
pub fn parse_config(contents: &str) -> anyhow::Result<Config> {
    let mut config = Config::default();
    let parsed: ConfigFile = json5::from_str(contents)?;

    if let Some(theme_name) = parsed.theme.as_deref() {
        match Theme::from_name(theme_name) {
            Some(theme) => config.theme = theme,
            None => tracing::warn!(theme = theme_name, "unknown theme, keeping default"),
        }
    }

    if let Some(vars) = parsed.theme_variables {
        if let Some(v) = vars.font_family {
            config.theme.font_family = v;
        }
        if let Some(v) = vars.font_size.as_ref().and_then(NumberOrString::as_f32) {
            config.theme.font_size = v;
        }
    }

    if let Some(file) = parsed.layout {
        let layout = &mut config.layout;
        if let Some(v) = file.container_width {
            layout.container_width = v;
        }
        if let Some(v) = file.left_margin {
            layout.left_margin = v;
        }
        if let Some(v) = file.top_margin {
            layout.top_margin = v;
        }
        if let Some(v) = file.node_gap {
            layout.node_gap = v;
        }
        if let Some(v) = file.row_height {
            layout.row_height = v;
        }
        if let Some(v) = file.node_padding_x {
            layout.node_padding_x = v;
        }
        if let Some(v) = file.node_padding_y {
            layout.node_padding_y = v;
        }
        if let Some(v) = file.label_line_height {
            layout.label_line_height = v;
        }
        if let Some(v) = file.edge_label_padding {
            layout.edge_label_padding = v;
        }
        if let Some(v) = file.node_padding {
            layout.node_padding = v;
        }
        if let Some(v) = file.label_padding {
            layout.label_padding = v;
        }
        if let Some(v) = file.back_edge_offset {
            layout.back_edge_offset = v;
        }
        if let Some(v) = file.self_loop_size {
            layout.self_loop_size = v;
        }
        if let Some(v) = file.corner_radius {
            layout.corner_radius = v.max(0.0);
        }
        if let Some(v) = file.order_passes {
            layout.order_passes = v;
        }
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_path_gives_defaults() {
        let config = load_config(None).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn overrides_only_given_fields() {
        let config = parse_config(
            r#"{
                // JSON5 comments are accepted
                theme: "modern",
                themeVariables: { fontSize: "14px" },
                layout: { containerWidth: 800, nodeGap: 40, cornerRadius: -3 },
            }"#,
        )
        .unwrap();
        assert_eq!(config.theme.font_family, Theme::modern().font_family);
        assert_eq!(config.theme.font_size, 14.0);
        assert_eq!(config.layout.container_width, 800.0);
        assert_eq!(config.layout.node_gap, 40.0);
        assert_eq!(config.layout.corner_radius, 0.0);
        assert_eq!(config.layout.row_height, LayoutConfig::default().row_height);
    }

    #[test]
    fn plain_json_is_accepted() {
        let config = parse_config(r#"{"layout":{"orderPasses":0}}"#).unwrap();
        assert_eq!(config.layout.order_passes, 0);
    }

    #[test]
    fn malformed_document_is_an_error() {
        assert!(parse_config("{ layout: ").is_err());
    }
}
