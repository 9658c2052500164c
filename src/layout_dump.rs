use crate::error::{Error, Result};
use crate::ir::Graph;
use crate::layout::Layout;
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct LayoutDump {
    pub title: String,
    pub direction: String,
    pub width: f32,
    pub height: f32,
    pub nodes: Vec<NodeDump>,
    pub edges: Vec<EdgeDump>,
    pub clusters: Vec<ClusterDump>,
}

#[derive(Debug, Serialize)]
pub struct NodeDump {
    pub index: usize,
    pub kind: String,
    pub category: String,
    pub cluster: Option<usize>,
    pub rank: usize,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub label_lines: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct EdgeDump {
    pub from: usize,
    pub to: usize,
    pub label: Option<String>,
    pub label_anchor: Option<[f32; 2]>,
    pub points: Vec<[f32; 2]>,
}

#[derive(Debug, Serialize)]
pub struct ClusterDump {
    pub index: usize,
    pub parent: Option<usize>,
    pub depth: usize,
    pub title: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl LayoutDump {
    pub fn from_layout(layout: &Layout, graph: &Graph) -> Self {
        let nodes = layout
            .nodes
            .iter()
            .map(|node| NodeDump {
                index: node.id.index(),
                kind: format!("{:?}", node.kind),
                category: format!("{:?}", node.kind.category()),
                cluster: graph.node(node.id).cluster.map(|c| c.index()),
                rank: node.rank,
                x: node.x,
                y: node.y,
                width: node.width,
                height: node.height,
                label_lines: node.label.lines.clone(),
            })
            .collect();

        let edges = layout
            .edges
            .iter()
            .zip(&graph.edges)
            .map(|(edge, source)| EdgeDump {
                from: edge.from.index(),
                to: edge.to.index(),
                label: source.label.clone(),
                label_anchor: edge.label_anchor.map(|(x, y)| [x, y]),
                points: edge.points.iter().map(|(x, y)| [*x, *y]).collect(),
            })
            .collect();

        let clusters = layout
            .clusters
            .iter()
            .map(|cluster| ClusterDump {
                index: cluster.id.index(),
                parent: graph.cluster(cluster.id).parent.map(|p| p.index()),
                depth: cluster.depth,
                title: cluster.title.clone(),
                x: cluster.x,
                y: cluster.y,
                width: cluster.width,
                height: cluster.height,
            })
            .collect();

        LayoutDump {
            title: graph.title.clone(),
            direction: format!("{:?}", graph.direction),
            width: layout.width,
            height: layout.height,
            nodes,
            edges,
            clusters,
        }
    }
}

pub fn write_layout_dump(path: &Path, layout: &Layout, graph: &Graph) -> Result<()> {
    let file = File::create(path).map_err(|err| Error::write(path, err))?;
    let writer = BufWriter::new(file);
    let dump = LayoutDump::from_layout(layout, graph);
    serde_json::to_writer_pretty(writer, &dump)
        .map_err(|err| Error::write(path, std::io::Error::other(err)))?;
    log::info!(path:? = path; "Wrote layout dump");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LayoutConfig;
    use crate::ir::{Direction, NodeKind};
    use crate::layout::compute_layout;
    use crate::theme::Theme;

    #[test]
    fn dump_carries_clusters_and_labels() {
        let mut graph = Graph::new("Dump", Direction::LeftRight);
        let vpc = graph.add_cluster("VPC", None).unwrap();
        let a = graph.add_node(NodeKind::Elb, "LB", Some(vpc)).unwrap();
        let b = graph.add_node(NodeKind::Ec2, "App", Some(vpc)).unwrap();
        graph.add_edge(a, b, Some("HTTP")).unwrap();
        let config = LayoutConfig {
            fast_text_metrics: true,
            ..LayoutConfig::default()
        };
        let layout = compute_layout(&graph, &Theme::aws(), &config);
        let dump = LayoutDump::from_layout(&layout, &graph);

        assert_eq!(dump.direction, "LeftRight");
        assert_eq!(dump.nodes.len(), 2);
        assert_eq!(dump.nodes[0].cluster, Some(0));
        assert_eq!(dump.nodes[1].rank, 1);
        assert_eq!(dump.edges[0].label.as_deref(), Some("HTTP"));
        assert!(dump.edges[0].label_anchor.is_some());
        assert_eq!(dump.clusters[0].title, "VPC");

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("layout.json");
        write_layout_dump(&path, &layout, &graph).unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["clusters"][0]["title"], "VPC");
    }
}
