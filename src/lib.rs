#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod diagram;
pub mod error;
pub mod ir;
pub mod layout;
pub mod layout_dump;
pub mod render;
pub mod text_metrics;
pub mod theme;
pub mod topology;

use std::path::PathBuf;

pub use config::{Config, LayoutConfig, RenderConfig, load_config};
pub use diagram::{Diagram, DiagramOptions, Scope};
pub use error::{Error, Result};
pub use ir::{Category, ClusterId, Direction, Graph, NodeId, NodeKind, OutputFormat};
pub use layout::{Layout, compute_layout};
pub use render::render_svg;
pub use theme::Theme;
pub use topology::Topology;

/// Renders `topology` with `options` and returns the written path.
///
/// The topology's own title and direction are ignored; `options` wins.
/// An invalid topology fails before the output file is touched.
pub fn render_topology(topology: &Topology, options: DiagramOptions) -> Result<PathBuf> {
    topology.validate()?;
    let mut diagram = Diagram::open(options)?;
    topology.declare_into(&mut diagram)?;
    diagram.render()
}

/// Renders the built-in AWS topology to `docs/architecture.png`.
pub fn generate() -> Result<PathBuf> {
    render_topology(&Topology::aws_reference(), DiagramOptions::default())
}
