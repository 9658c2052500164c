mod ranking;
mod routing;
mod text;
pub(crate) mod types;

pub use types::*;

use std::collections::{BTreeMap, HashMap};

use crate::config::LayoutConfig;
use crate::ir::{Child, ClusterId, Direction, Graph};
use crate::theme::Theme;

use ranking::{assign_ranks, child_rank};
use routing::{place_edge_labels, route_edge};
use text::{measure_label, measure_label_with_font_size};

/// Positions every node, cluster and edge of `graph`.
///
/// Children of each cluster are grouped into rows by their smallest rank;
/// rows stack along the flow direction and members of a row sit side by side
/// in declaration order. Clusters wrap their rows with padding and a title band.
pub fn compute_layout(graph: &Graph, theme: &Theme, config: &LayoutConfig) -> Layout {
    let ranks = assign_ranks(graph);
    let horizontal = graph.direction.is_horizontal();

    let mut nodes: Vec<NodeLayout> = graph
        .nodes
        .iter()
        .map(|node| {
            let label = measure_label(&node.label, theme, config);
            let width = config.icon_size.max(label.width + config.node_padding_x * 2.0);
            let height = config.icon_size + config.icon_label_gap + label.height;
            NodeLayout {
                id: node.id,
                kind: node.kind,
                x: 0.0,
                y: 0.0,
                width,
                height,
                icon_size: config.icon_size,
                label,
                rank: ranks[node.id.index()],
            }
        })
        .collect();

    let titles: HashMap<ClusterId, TextBlock> = graph
        .clusters
        .iter()
        .map(|cluster| {
            let block = measure_label_with_font_size(
                &cluster.title,
                theme.font_size,
                config,
                false,
                &theme.font_family,
            );
            (cluster.id, block)
        })
        .collect();

    let arranger = Arranger {
        graph,
        ranks: &ranks,
        nodes: &nodes,
        titles: &titles,
        config,
        horizontal,
        reversed: graph.direction.is_reversed(),
    };
    let root = arranger.measure(None);

    let mut placements = Placements::default();
    arranger.place(&root, (config.margin, config.margin), &mut placements);

    let content = if horizontal {
        (root.main, root.cross)
    } else {
        (root.cross, root.main)
    };
    let title = (!graph.title.trim().is_empty()).then(|| {
        measure_label_with_font_size(
            &graph.title,
            theme.title_font_size,
            config,
            false,
            &theme.font_family,
        )
    });
    let title_band = if title.is_some() { config.title_height } else { 0.0 };
    let width = (content.0 + config.margin * 2.0)
        .max(title.as_ref().map_or(0.0, |t| t.width + config.margin * 2.0));
    let height = content.1 + config.margin * 2.0 + title_band;

    let to_xy = |cross: f32, main: f32, cross_len: f32, main_len: f32| {
        let (mut x, mut y, w, h) = if horizontal {
            (main, cross, main_len, cross_len)
        } else {
            (cross, main, cross_len, main_len)
        };
        match graph.direction {
            Direction::RightLeft => x = content.0 + config.margin * 2.0 - x - w,
            Direction::BottomTop => y = content.1 + config.margin * 2.0 - y - h,
            _ => {}
        }
        (x, y + title_band, w, h)
    };

    for (id, rect) in &placements.nodes {
        let node = &mut nodes[*id];
        let (x, y, _, _) = to_xy(rect.0, rect.1, rect.2, rect.3);
        node.x = x;
        node.y = y;
    }

    let mut clusters: Vec<ClusterLayout> = placements
        .clusters
        .iter()
        .map(|(id, rect)| {
            let (x, y, w, h) = to_xy(rect.0, rect.1, rect.2, rect.3);
            let cluster = graph.cluster(*id);
            ClusterLayout {
                id: *id,
                title: cluster.title.clone(),
                title_block: titles[id].clone(),
                depth: graph.depth(*id),
                x,
                y,
                width: w,
                height: h,
            }
        })
        .collect();
    clusters.sort_by_key(|cluster| (cluster.depth, cluster.id));

    let mut lanes: HashMap<(usize, usize), usize> = HashMap::new();
    for edge in &graph.edges {
        *lanes.entry(pair_key(edge.from.index(), edge.to.index())).or_default() += 1;
    }
    let mut lane_cursor: HashMap<(usize, usize), usize> = HashMap::new();
    let mut edges: Vec<EdgeLayout> = graph
        .edges
        .iter()
        .map(|edge| {
            let key = pair_key(edge.from.index(), edge.to.index());
            let cursor = lane_cursor.entry(key).or_default();
            let lane = *cursor;
            *cursor += 1;
            EdgeLayout {
                from: edge.from,
                to: edge.to,
                label: edge
                    .label
                    .as_deref()
                    .map(|label| measure_label(label, theme, config)),
                label_anchor: None,
                points: route_edge(&nodes[edge.from.index()], &nodes[edge.to.index()], lane, lanes[&key]),
            }
        })
        .collect();
    place_edge_labels(&mut edges, &nodes);

    log::debug!(
        nodes = nodes.len(),
        clusters = clusters.len(),
        edges = edges.len(),
        width = width,
        height = height;
        "Computed layout"
    );

    Layout {
        title,
        direction: graph.direction,
        nodes,
        edges,
        clusters,
        width,
        height,
    }
}

fn pair_key(a: usize, b: usize) -> (usize, usize) {
    if a <= b { (a, b) } else { (b, a) }
}

/// A measured child: sizes along the cross and main axes plus nested rows.
struct Block {
    child: Option<Child>,
    cross: f32,
    main: f32,
    /// Padding before content on the cross and main axes.
    lead: (f32, f32),
    rows: Vec<Row>,
}

struct Row {
    blocks: Vec<Block>,
    cross: f32,
    main: f32,
}

#[derive(Default)]
struct Placements {
    nodes: Vec<(usize, (f32, f32, f32, f32))>,
    clusters: Vec<(ClusterId, (f32, f32, f32, f32))>,
}

struct Arranger<'a> {
    graph: &'a Graph,
    ranks: &'a [usize],
    nodes: &'a [NodeLayout],
    titles: &'a HashMap<ClusterId, TextBlock>,
    config: &'a LayoutConfig,
    horizontal: bool,
    reversed: bool,
}

impl Arranger<'_> {
    fn node_extent(&self, idx: usize) -> (f32, f32) {
        let node = &self.nodes[idx];
        if self.horizontal {
            (node.height, node.width)
        } else {
            (node.width, node.height)
        }
    }

    /// Padding as (cross_lead, cross_trail, main_lead, main_trail).
    ///
    /// The title band always ends up above the content: it is a cross-axis
    /// lead when ranks run horizontally, and sits on the side of the main axis
    /// that becomes the top after mirroring otherwise.
    fn padding(&self, cluster: Option<ClusterId>) -> (f32, f32, f32, f32) {
        if cluster.is_none() {
            return (0.0, 0.0, 0.0, 0.0);
        }
        let pad = self.config.cluster_padding;
        let band = self.config.cluster_title_height;
        match (self.horizontal, self.reversed) {
            (true, _) => (pad + band, pad, pad, pad),
            (false, false) => (pad, pad, pad + band, pad),
            (false, true) => (pad, pad, pad, pad + band),
        }
    }

    fn measure(&self, cluster: Option<ClusterId>) -> Block {
        let mut buckets: BTreeMap<usize, Vec<Block>> = BTreeMap::new();
        for child in self.graph.children(cluster) {
            let rank = child_rank(self.graph, self.ranks, child);
            let block = match child {
                Child::Node(id) => {
                    let (cross, main) = self.node_extent(id.index());
                    Block {
                        child: Some(child),
                        cross,
                        main,
                        lead: (0.0, 0.0),
                        rows: Vec::new(),
                    }
                }
                Child::Cluster(id) => {
                    let mut block = self.measure(Some(id));
                    block.child = Some(child);
                    block
                }
            };
            buckets.entry(rank).or_default().push(block);
        }

        let rows: Vec<Row> = buckets
            .into_values()
            .map(|blocks| {
                let gaps = blocks.len().saturating_sub(1) as f32 * self.config.node_spacing;
                let cross = blocks.iter().map(|b| b.cross).sum::<f32>() + gaps;
                let main = blocks.iter().map(|b| b.main).fold(0.0, f32::max);
                Row { blocks, cross, main }
            })
            .collect();

        let gaps = rows.len().saturating_sub(1) as f32 * self.config.rank_spacing;
        let content_cross = rows.iter().map(|r| r.cross).fold(0.0, f32::max);
        let content_main = rows.iter().map(|r| r.main).sum::<f32>() + gaps;

        let (cross_lead, cross_trail, main_lead, main_trail) = self.padding(cluster);
        let (title_cross, title_main) = if cluster.is_some() && !self.horizontal {
            (self.title_min_cross(cluster), 0.0)
        } else {
            (0.0, self.title_min_cross(cluster))
        };
        Block {
            child: None,
            cross: (cross_lead + content_cross + cross_trail).max(title_cross),
            main: (main_lead + content_main + main_trail).max(title_main),
            lead: (cross_lead, main_lead),
            rows,
        }
    }

    fn title_min_cross(&self, cluster: Option<ClusterId>) -> f32 {
        cluster
            .and_then(|id| self.titles.get(&id))
            .map_or(0.0, |t| t.width + self.config.cluster_padding * 2.0)
    }

    fn place(&self, block: &Block, origin: (f32, f32), out: &mut Placements) {
        match block.child {
            Some(Child::Node(id)) => {
                out.nodes
                    .push((id.index(), (origin.0, origin.1, block.cross, block.main)));
                return;
            }
            Some(Child::Cluster(id)) => {
                out.clusters
                    .push((id, (origin.0, origin.1, block.cross, block.main)));
            }
            None => {}
        }

        let (cross_lead, main_lead) = block.lead;
        let (_, cross_trail, _, main_trail) = self.padding(match block.child {
            Some(Child::Cluster(id)) => Some(id),
            _ => None,
        });
        let inner_cross = block.cross - cross_lead - cross_trail;
        let inner_main = block.main - main_lead - main_trail;
        let content_main = block.rows.iter().map(|r| r.main).sum::<f32>()
            + block.rows.len().saturating_sub(1) as f32 * self.config.rank_spacing;

        let mut main_cursor = origin.1 + main_lead + (inner_main - content_main).max(0.0) / 2.0;
        for row in &block.rows {
            let mut cross_cursor =
                origin.0 + cross_lead + (inner_cross - row.cross).max(0.0) / 2.0;
            for child in &row.blocks {
                let child_main = main_cursor + (row.main - child.main) / 2.0;
                self.place(child, (cross_cursor, child_main), out);
                cross_cursor += child.cross + self.config.node_spacing;
            }
            main_cursor += row.main + self.config.rank_spacing;
        }
    }
}
