use std::collections::HashMap;

use crate::config::LayoutConfig;
use crate::text_metrics::TextMeasure;
use crate::theme::Theme;

use super::TextBlock;

/// Measures labels through the injected [`TextMeasure`], once per distinct
/// label text for the lifetime of one layout run.
pub struct LabelCache<'a> {
    measurer: &'a dyn TextMeasure,
    theme: &'a Theme,
    config: &'a LayoutConfig,
    blocks: HashMap<String, TextBlock>,
}

impl<'a> LabelCache<'a> {
    pub fn new(measurer: &'a dyn TextMeasure, theme: &'a Theme, config: &'a LayoutConfig) -> Self {
        Self {
            measurer,
            theme,
            config,
            blocks: HashMap::new(),
        }
    }

    pub fn measure(&mut self, text: &str) -> &TextBlock {
        if !self.blocks.contains_key(text) {
            let block = measure_label(text, self.measurer, self.theme, self.config);
            self.blocks.insert(text.to_string(), block);
        }
        &self.blocks[text]
    }

    /// Label size plus node padding.
    pub fn node_size(&mut self, label: &str) -> (f32, f32) {
        let pad_x = self.config.node_padding_x;
        let pad_y = self.config.node_padding_y;
        let block = self.measure(label);
        (block.width + pad_x * 2.0, block.height + pad_y * 2.0)
    }

    /// Label size plus edge-label padding.
    pub fn edge_label_size(&mut self, label: &str) -> (f32, f32) {
        let pad = self.config.edge_label_padding;
        let block = self.measure(label);
        (block.width + pad * 2.0, block.height + pad * 2.0)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

pub(super) fn measure_label(
    text: &str,
    measurer: &dyn TextMeasure,
    theme: &Theme,
    config: &LayoutConfig,
) -> TextBlock {
    let lines = split_lines(text);
    let width = lines
        .iter()
        .map(|line| measurer.measure(line, theme).max(0.0))
        .fold(0.0, f32::max);
    let height = lines.len() as f32 * theme.font_size * config.label_line_height;
    TextBlock {
        lines,
        width,
        height,
    }
}

pub(super) fn split_lines(text: &str) -> Vec<String> {
    let normalized = text
        .replace("<br/>", "\n")
        .replace("<br>", "\n")
        .replace("\\n", "\n");
    normalized
        .split('\n')
        .map(|line| line.trim().to_string())
        .collect()
}
