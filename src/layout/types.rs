use crate::ir::{ClusterId, Direction, NodeId, NodeKind};

#[derive(Debug, Clone)]
pub struct TextBlock {
    pub lines: Vec<String>,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone)]
pub struct NodeLayout {
    pub id: NodeId,
    pub kind: NodeKind,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub icon_size: f32,
    pub label: TextBlock,
    pub rank: usize,
}

impl NodeLayout {
    /// Top-left corner of the icon square, centered over the label.
    pub fn icon_origin(&self) -> (f32, f32) {
        (self.x + (self.width - self.icon_size) / 2.0, self.y)
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn label_center(&self, gap: f32) -> (f32, f32) {
        (
            self.x + self.width / 2.0,
            self.y + self.icon_size + gap + self.label.height / 2.0,
        )
    }
}

#[derive(Debug, Clone)]
pub struct EdgeLayout {
    pub from: NodeId,
    pub to: NodeId,
    pub label: Option<TextBlock>,
    pub label_anchor: Option<(f32, f32)>,
    pub points: Vec<(f32, f32)>,
}

#[derive(Debug, Clone)]
pub struct ClusterLayout {
    pub id: ClusterId,
    pub title: String,
    pub title_block: TextBlock,
    pub depth: usize,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone)]
pub struct Layout {
    pub title: Option<TextBlock>,
    pub direction: Direction,
    /// Indexed by `NodeId::index`.
    pub nodes: Vec<NodeLayout>,
    pub edges: Vec<EdgeLayout>,
    /// Parents precede their nested clusters.
    pub clusters: Vec<ClusterLayout>,
    pub width: f32,
    pub height: f32,
}

impl Layout {
    pub fn node(&self, id: NodeId) -> &NodeLayout {
        &self.nodes[id.index()]
    }
}
