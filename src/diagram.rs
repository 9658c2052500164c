use std::path::PathBuf;

use crate::config::Config;
use crate::error::Result;
use crate::ir::{ClusterId, Direction, Graph, NodeId, NodeKind, OutputFormat};
use crate::layout::{Layout, compute_layout};
use crate::render::{ensure_backend, render_svg, write_output};

pub const DEFAULT_TITLE: &str = "React App Infrastructure";
pub const DEFAULT_FILENAME: &str = "docs/architecture";

#[derive(Debug, Clone)]
pub struct DiagramOptions {
    pub title: String,
    /// Output path without extension; the format supplies it.
    pub filename: PathBuf,
    pub direction: Direction,
    pub format: OutputFormat,
    pub config: Config,
}

impl Default for DiagramOptions {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            filename: PathBuf::from(DEFAULT_FILENAME),
            direction: Direction::TopBottom,
            format: OutputFormat::Png,
            config: Config::default(),
        }
    }
}

impl DiagramOptions {
    pub fn output_path(&self) -> PathBuf {
        self.filename.with_extension(self.format.extension())
    }
}

/// Scoped rendering context.
///
/// Nodes, clusters and edges declared through a `Diagram` belong to it until
/// it is closed. Closing lays the graph out and writes the output file, and
/// happens exactly once: either through [`Diagram::render`], or when the
/// guard is dropped on an early return or while unwinding.
#[derive(Debug)]
pub struct Diagram {
    graph: Graph,
    options: DiagramOptions,
    closed: bool,
}

impl Diagram {
    /// Opens a context, failing before any file is touched when the backend
    /// for `options.format` is unavailable.
    pub fn open(options: DiagramOptions) -> Result<Self> {
        ensure_backend(options.format)?;
        log::debug!(
            title = options.title.as_str(),
            output:? = options.output_path();
            "Opened diagram"
        );
        Ok(Self {
            graph: Graph::new(options.title.clone(), options.direction),
            options,
            closed: false,
        })
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn options(&self) -> &DiagramOptions {
        &self.options
    }

    pub fn output_path(&self) -> PathBuf {
        self.options.output_path()
    }

    /// Root declaration scope; nodes and clusters declared through it have
    /// no parent cluster.
    pub fn scope(&mut self) -> Scope<'_> {
        Scope {
            graph: &mut self.graph,
            cluster: None,
        }
    }

    pub fn node(&mut self, kind: NodeKind, label: &str) -> Result<NodeId> {
        self.scope().node(kind, label)
    }

    /// Declares a top-level cluster; everything declared through the scope
    /// passed to `body` lands inside it.
    pub fn cluster<R>(
        &mut self,
        title: &str,
        body: impl FnOnce(&mut Scope<'_>) -> Result<R>,
    ) -> Result<R> {
        self.scope().cluster(title, body)
    }

    pub fn edge(&mut self, from: NodeId, to: NodeId, label: Option<&str>) -> Result<()> {
        self.scope().edge(from, to, label)
    }

    pub fn layout(&self) -> Layout {
        let config = &self.options.config;
        compute_layout(&self.graph, &config.theme, &config.layout)
    }

    pub fn to_svg(&self) -> String {
        let config = &self.options.config;
        render_svg(&self.layout(), &config.theme, &config.layout)
    }

    /// Closes the context and returns the written path.
    pub fn render(mut self) -> Result<PathBuf> {
        self.close()
    }

    fn close(&mut self) -> Result<PathBuf> {
        let path = self.output_path();
        if self.closed {
            return Ok(path);
        }
        self.closed = true;

        let config = &self.options.config;
        let layout = self.layout();
        let svg = render_svg(&layout, &config.theme, &config.layout);
        write_output(&svg, &path, self.options.format, &config.render, &config.theme)?;
        log::info!(
            path:? = path,
            nodes = self.graph.nodes.len(),
            edges = self.graph.edges.len();
            "Wrote diagram"
        );
        Ok(path)
    }
}

impl Drop for Diagram {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        log::debug!("Diagram dropped without render; closing it now");
        if let Err(err) = self.close() {
            log::error!(err:% = err; "Failed to write diagram on close");
        }
    }
}

/// Declaration scope: the root of a diagram or the inside of one cluster.
pub struct Scope<'d> {
    graph: &'d mut Graph,
    cluster: Option<ClusterId>,
}

impl Scope<'_> {
    /// The enclosing cluster, `None` at the root.
    pub fn id(&self) -> Option<ClusterId> {
        self.cluster
    }

    pub fn node(&mut self, kind: NodeKind, label: &str) -> Result<NodeId> {
        let id = self.graph.add_node(kind, label, self.cluster)?;
        log::debug!(id = id.index(), kind:?, label; "Declared node");
        Ok(id)
    }

    pub fn cluster<R>(
        &mut self,
        title: &str,
        body: impl FnOnce(&mut Scope<'_>) -> Result<R>,
    ) -> Result<R> {
        let cluster = self.graph.add_cluster(title, self.cluster)?;
        log::debug!(id = cluster.index(), title; "Entered cluster");
        let mut inner = Scope {
            graph: &mut *self.graph,
            cluster: Some(cluster),
        };
        body(&mut inner)
    }

    /// Edges are global to the diagram whichever scope declares them.
    pub fn edge(&mut self, from: NodeId, to: NodeId, label: Option<&str>) -> Result<()> {
        self.graph.add_edge(from, to, label)?;
        log::debug!(from = from.index(), to = to.index(), label:?; "Declared edge");
        Ok(())
    }
}
