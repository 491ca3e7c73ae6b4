use crate::layout::{EdgeId, Layout, LayoutWarning, PathCommand, Rect};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutDump {
    pub width: f32,
    pub height: f32,
    pub nodes: Vec<NodeDump>,
    pub edges: Vec<EdgeDump>,
    pub back_edges: Vec<EdgeId>,
    pub warnings: Vec<LayoutWarning>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDump {
    pub id: String,
    pub label: Vec<String>,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub level: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeDump {
    pub from: String,
    pub to: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub dashed: bool,
    pub back_edge: bool,
    pub segments: Vec<[[f32; 2]; 2]>,
    pub path: Vec<PathCommand>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label_box: Option<Rect>,
}

impl LayoutDump {
    /// Nodes come out in row order, left to right, so the dump reads top
    /// down.
    pub fn from_layout(layout: &Layout) -> Self {
        let nodes = layout
            .rows
            .iter()
            .flatten()
            .filter_map(|id| layout.nodes.get(id))
            .map(|node| NodeDump {
                id: node.id.clone(),
                label: node.label.lines.clone(),
                x: node.x,
                y: node.y,
                width: node.width,
                height: node.height,
                level: node.level,
            })
            .collect();

        let edges = layout
            .edges
            .iter()
            .map(|edge| EdgeDump {
                from: edge.from.clone(),
                to: edge.to.clone(),
                label: edge.label.as_ref().map(|block| block.lines.join("\n")),
                dashed: edge.dashed,
                back_edge: edge.back_edge,
                segments: edge
                    .segments
                    .iter()
                    .map(|segment| {
                        [
                            [segment.from.x, segment.from.y],
                            [segment.to.x, segment.to.y],
                        ]
                    })
                    .collect(),
                path: edge.path.clone(),
                label_box: edge.label_box,
            })
            .collect();

        LayoutDump {
            width: layout.width,
            height: layout.height,
            nodes,
            edges,
            back_edges: layout.back_edges.clone(),
            warnings: layout.warnings.clone(),
        }
    }
}

pub fn write_layout_dump(path: &Path, layout: &Layout) -> anyhow::Result<()> {
    let file = File::create(path)?;
    write_layout_dump_to(BufWriter::new(file), layout)
}

pub fn write_layout_dump_to<W: Write>(mut writer: W, layout: &Layout) -> anyhow::Result<()> {
    let dump = LayoutDump::from_layout(layout);
    serde_json::to_writer_pretty(&mut writer, &dump)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LayoutConfig;
    use crate::ir::Graph;
    use crate::layout::compute_layout;
    use crate::text_metrics::HeuristicMeasurer;
    use crate::theme::Theme;

    fn sample() -> Layout {
        let mut graph = Graph::new();
        graph.ensure_node("A", None);
        graph.ensure_node("B", Some("Second".to_string()));
        graph.add_labeled_edge("A", "B", "go");
        graph.add_dashed_edge("B", "A");
        compute_layout(
            &graph,
            &Theme::default(),
            &LayoutConfig::default(),
            &HeuristicMeasurer,
        )
        .unwrap()
    }

    #[test]
    fn dump_uses_camel_case_and_row_order() {
        let mut out = Vec::new();
        write_layout_dump_to(&mut out, &sample()).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["nodes"][0]["id"], "A");
        assert_eq!(value["nodes"][1]["label"][0], "Second");
        assert_eq!(value["backEdges"], serde_json::json!([1]));
        assert_eq!(value["edges"][1]["backEdge"], true);
        assert_eq!(value["edges"][0]["label"], "go");
        assert!(value["edges"][0]["labelBox"].is_object());
        assert!(value["edges"][1].get("label").is_none());
        assert_eq!(value["edges"][0]["path"][0]["op"], "moveTo");
    }

    #[test]
    fn dump_writes_to_a_file() {
        let path = std::env::temp_dir().join(format!("lgl-dump-{}.json", std::process::id()));
        write_layout_dump(&path, &sample()).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert!(contents.contains("\"backEdge\": true"));
    }
}
