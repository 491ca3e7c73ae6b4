#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod ir;
pub mod layout;
pub mod layout_dump;
pub mod text_metrics;
pub mod theme;

#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{Config, LayoutConfig, load_config};
pub use ir::{Edge, Graph, Node};
pub use layout::{
    CollapseState, Layout, LayoutError, LayoutWarning, Visibility, compute_layout,
    compute_layout_visible,
};
pub use text_metrics::{HeuristicMeasurer, TextMeasure};
pub use theme::Theme;
