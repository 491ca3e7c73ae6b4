/// Left edges for one row of nodes, centred in `container_width`.
///
/// The row is packed left to right with `gap` between neighbours and starts
/// at `max(left_margin, (container_width - total) / 2)`, so an overfull row
/// grows to the right instead of spilling past the margin.
pub fn layout_row(widths: &[f32], container_width: f32, left_margin: f32, gap: f32) -> Vec<f32> {
    match widths {
        [] => Vec::new(),
        [width] => vec![left_margin.max((container_width - width) / 2.0)],
        _ => {
            let total: f32 = widths.iter().sum::<f32>() + gap * (widths.len() - 1) as f32;
            let mut x = left_margin.max((container_width - total) / 2.0);
            widths
                .iter()
                .map(|width| {
                    let left = x;
                    x += width + gap;
                    left
                })
                .collect()
        }
    }
}

/// Row top for `level`.
pub fn row_top(level: usize, top_margin: f32, row_height: f32) -> f32 {
    top_margin + level as f32 * row_height
}
