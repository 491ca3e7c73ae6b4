use crate::config::{Config, load_config};
use crate::ir::Graph;
use crate::layout::{AllVisible, CollapseState, Layout, compute_layout_visible};
use crate::layout_dump::{write_layout_dump, write_layout_dump_to};
use crate::text_metrics::TextMeasure;
use anyhow::{Context, Result};
use clap::Parser;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "lgl",
    version,
    about = "Level-based graph layout with orthogonal edge routing"
)]
pub struct Args {
    /// Input graph JSON or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output layout JSON. Defaults to stdout if omitted.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Config file (JSON or JSON5)
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Container width, overrides the config file
    #[arg(short = 'w', long = "width")]
    pub width: Option<f32>,

    /// Collapse a node, hiding what is only reachable through it
    #[arg(long = "collapse", value_name = "ID")]
    pub collapse: Vec<String>,

    /// Keep right-angle corners
    #[arg(long = "no-smooth")]
    pub no_smooth: bool,

    /// Log pipeline stages to stderr
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let mut config = load_config(args.config.as_deref())
        .with_context(|| format!("failed to load config {:?}", args.config))?;
    apply_overrides(&mut config, &args);

    let input = read_input(args.input.as_deref())?;
    let graph = Graph::from_json(&input).context("input is not a valid graph document")?;

    let measurer = default_measurer();
    let layout = layout_graph(&graph, &config, &args.collapse, measurer.as_ref())?;
    for warning in &layout.warnings {
        tracing::warn!("{warning}");
    }

    match args.output.as_deref() {
        Some(path) => write_layout_dump(path, &layout)?,
        None => write_layout_dump_to(io::stdout().lock(), &layout)?,
    }
    Ok(())
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    // A subscriber may already be installed when embedded; keep that one.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn apply_overrides(config: &mut Config, args: &Args) {
    if let Some(width) = args.width {
        config.layout.container_width = width;
    }
    if args.no_smooth {
        config.layout.corner_radius = 0.0;
    }
}

fn layout_graph(
    graph: &Graph,
    config: &Config,
    collapsed: &[String],
    measurer: &dyn TextMeasure,
) -> Result<Layout> {
    let layout = if collapsed.is_empty() {
        compute_layout_visible(graph, &AllVisible, &config.theme, &config.layout, measurer)?
    } else {
        let state = CollapseState::new(graph, collapsed.iter().cloned())?;
        compute_layout_visible(graph, &state, &config.theme, &config.layout, measurer)?
    };
    Ok(layout)
}

#[cfg(feature = "system-fonts")]
fn default_measurer() -> Box<dyn TextMeasure> {
    Box::new(crate::text_metrics::FontMeasurer::new())
}

#[cfg(not(feature = "system-fonts"))]
fn default_measurer() -> Box<dyn TextMeasure> {
    Box::new(crate::text_metrics::HeuristicMeasurer)
}

fn read_input(path: Option<&Path>) -> Result<String> {
    if let Some(path) = path
        && path != Path::new("-")
    {
        return std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()));
    }
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}
