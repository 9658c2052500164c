use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Direction {
    #[default]
    #[serde(rename = "TB")]
    TopBottom,
    #[serde(rename = "BT")]
    BottomTop,
    #[serde(rename = "LR")]
    LeftRight,
    #[serde(rename = "RL")]
    RightLeft,
}

impl Direction {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "TB" | "TD" => Some(Self::TopBottom),
            "BT" => Some(Self::BottomTop),
            "LR" => Some(Self::LeftRight),
            "RL" => Some(Self::RightLeft),
            _ => None,
        }
    }

    /// True when ranks advance along the x axis.
    pub fn is_horizontal(self) -> bool {
        matches!(self, Self::LeftRight | Self::RightLeft)
    }

    pub fn is_reversed(self) -> bool {
        matches!(self, Self::BottomTop | Self::RightLeft)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Png,
    Svg,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Svg => "svg",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::Png => "PNG",
            Self::Svg => "SVG",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Network,
    Compute,
    Storage,
    Management,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Elb,
    Route53,
    Vpc,
    PublicSubnet,
    PrivateSubnet,
    NatGateway,
    InternetGateway,
    SecurityGroup,
    Ecs,
    Ec2,
    Ecr,
    InMemory,
    CloudWatch,
}

impl NodeKind {
    pub fn category(self) -> Category {
        match self {
            Self::Elb
            | Self::Route53
            | Self::Vpc
            | Self::PublicSubnet
            | Self::PrivateSubnet
            | Self::NatGateway
            | Self::InternetGateway
            | Self::SecurityGroup => Category::Network,
            Self::Ecs | Self::Ec2 => Category::Compute,
            Self::Ecr | Self::InMemory => Category::Storage,
            Self::CloudWatch => Category::Management,
        }
    }

    /// Short tag drawn inside the node icon.
    pub fn tag(self) -> &'static str {
        match self {
            Self::Elb => "ELB",
            Self::Route53 => "R53",
            Self::Vpc => "VPC",
            Self::PublicSubnet => "PUB",
            Self::PrivateSubnet => "PRV",
            Self::NatGateway => "NAT",
            Self::InternetGateway => "IGW",
            Self::SecurityGroup => "SG",
            Self::Ecs => "ECS",
            Self::Ec2 => "EC2",
            Self::Ecr => "ECR",
            Self::InMemory => "MEM",
            Self::CloudWatch => "CW",
        }
    }
}

static NEXT_GRAPH_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of the graph that issued a handle. `0` is never issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct GraphId(pub(crate) u64);

impl GraphId {
    fn next() -> Self {
        Self(NEXT_GRAPH_ID.fetch_add(1, Ordering::Relaxed))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    pub(crate) graph: GraphId,
    pub(crate) index: usize,
}

impl NodeId {
    pub fn index(self) -> usize {
        self.index
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClusterId {
    pub(crate) graph: GraphId,
    pub(crate) index: usize,
}

impl ClusterId {
    pub fn index(self) -> usize {
        self.index
    }
}

#[derive(Debug, Clone)]
pub struct Node {
    pub id: NodeId,
    pub label: String,
    pub kind: NodeKind,
    pub cluster: Option<ClusterId>,
}

#[derive(Debug, Clone)]
pub struct Cluster {
    pub id: ClusterId,
    pub title: String,
    pub parent: Option<ClusterId>,
}

#[derive(Debug, Clone)]
pub struct Edge {
    pub from: NodeId,
    pub to: NodeId,
    pub label: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Child {
    Node(NodeId),
    Cluster(ClusterId),
}

/// Arena of nodes and clusters plus the edges between nodes.
///
/// Handles are only produced by `add_node`/`add_cluster` and carry the
/// issuing graph's identity, so an edge can never point at a node that was
/// declared after it or in another graph. A clone shares its identity.
#[derive(Debug, Clone)]
pub struct Graph {
    id: GraphId,
    pub title: String,
    pub direction: Direction,
    pub nodes: Vec<Node>,
    pub clusters: Vec<Cluster>,
    pub edges: Vec<Edge>,
    order: Vec<Child>,
}

impl Graph {
    pub fn new(title: impl Into<String>, direction: Direction) -> Self {
        Self {
            id: GraphId::next(),
            title: title.into(),
            direction,
            nodes: Vec::new(),
            clusters: Vec::new(),
            edges: Vec::new(),
            order: Vec::new(),
        }
    }

    pub fn add_cluster(&mut self, title: &str, parent: Option<ClusterId>) -> Result<ClusterId> {
        self.check_cluster(parent)?;
        check_label(title)?;
        let id = ClusterId {
            graph: self.id,
            index: self.clusters.len(),
        };
        self.clusters.push(Cluster {
            id,
            title: title.to_string(),
            parent,
        });
        self.order.push(Child::Cluster(id));
        Ok(id)
    }

    pub fn add_node(
        &mut self,
        kind: NodeKind,
        label: &str,
        cluster: Option<ClusterId>,
    ) -> Result<NodeId> {
        self.check_cluster(cluster)?;
        check_label(label)?;
        let id = NodeId {
            graph: self.id,
            index: self.nodes.len(),
        };
        self.nodes.push(Node {
            id,
            label: label.to_string(),
            kind,
            cluster,
        });
        self.order.push(Child::Node(id));
        Ok(id)
    }

    pub fn add_edge(&mut self, from: NodeId, to: NodeId, label: Option<&str>) -> Result<()> {
        for id in [from, to] {
            if id.graph != self.id || id.index >= self.nodes.len() {
                return Err(Error::InvalidTopology(format!(
                    "edge endpoint #{} is not a node of this diagram",
                    id.index
                )));
            }
        }
        if let Some(label) = label {
            check_label(label)?;
        }
        self.edges.push(Edge {
            from,
            to,
            label: label.map(str::to_string),
        });
        Ok(())
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index]
    }

    pub fn cluster(&self, id: ClusterId) -> &Cluster {
        &self.clusters[id.index]
    }

    /// Direct children of `parent` (`None` is the root) in declaration order.
    pub fn children(&self, parent: Option<ClusterId>) -> Vec<Child> {
        self.order
            .iter()
            .copied()
            .filter(|child| match child {
                Child::Node(id) => self.nodes[id.index].cluster == parent,
                Child::Cluster(id) => self.clusters[id.index].parent == parent,
            })
            .collect()
    }

    /// Nesting depth of a cluster; top-level clusters have depth 0.
    pub fn depth(&self, id: ClusterId) -> usize {
        let mut depth = 0;
        let mut current = self.clusters[id.index].parent;
        while let Some(parent) = current {
            depth += 1;
            current = self.clusters[parent.index].parent;
        }
        depth
    }

    /// All nodes inside `id`, including those of nested clusters.
    pub fn descendant_nodes(&self, id: ClusterId) -> Vec<NodeId> {
        self.nodes
            .iter()
            .filter(|node| {
                let mut current = node.cluster;
                while let Some(cluster) = current {
                    if cluster == id {
                        return true;
                    }
                    current = self.clusters[cluster.index].parent;
                }
                false
            })
            .map(|node| node.id)
            .collect()
    }

    fn check_cluster(&self, cluster: Option<ClusterId>) -> Result<()> {
        match cluster {
            Some(id) if id.graph != self.id || id.index >= self.clusters.len() => {
                Err(Error::InvalidTopology(format!(
                    "cluster #{} is not part of this diagram",
                    id.index
                )))
            }
            _ => Ok(()),
        }
    }
}

fn check_label(label: &str) -> Result<()> {
    if let Some(ch) = label
        .chars()
        .find(|ch| ch.is_control() && *ch != '\n' && *ch != '\t')
    {
        return Err(Error::InvalidTopology(format!(
            "label {label:?} contains control character {ch:?}"
        )));
    }
    Ok(())
}
