//! Topologies as plain data.
//!
//! A [`Topology`] lists clusters, nodes and edges by string key. It can be
//! validated without rendering and then declared into a [`Diagram`]. The
//! built-in AWS deployment is [`Topology::aws_reference`]; other topologies
//! can be read from JSON5 files with [`Topology::load`].

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::diagram::{Diagram, Scope};
use crate::error::{Error, Result};
use crate::ir::{Direction, NodeId, NodeKind};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterSpec {
    pub key: String,
    pub title: String,
    /// Key of an earlier cluster; `None` places the cluster at the root.
    #[serde(default)]
    pub parent: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSpec {
    pub key: String,
    pub kind: NodeKind,
    pub label: String,
    #[serde(default)]
    pub cluster: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeSpec {
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub label: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Topology {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub direction: Option<Direction>,
    #[serde(default)]
    pub clusters: Vec<ClusterSpec>,
    #[serde(default)]
    pub nodes: Vec<NodeSpec>,
    #[serde(default)]
    pub edges: Vec<EdgeSpec>,
}

fn cluster(key: &str, title: &str, parent: Option<&str>) -> ClusterSpec {
    ClusterSpec {
        key: key.to_string(),
        title: title.to_string(),
        parent: parent.map(str::to_string),
    }
}

fn node(key: &str, kind: NodeKind, label: &str, cluster: Option<&str>) -> NodeSpec {
    NodeSpec {
        key: key.to_string(),
        kind,
        label: label.to_string(),
        cluster: cluster.map(str::to_string),
    }
}

fn edge(from: &str, to: &str, label: Option<&str>) -> EdgeSpec {
    EdgeSpec {
        from: from.to_string(),
        to: to.to_string(),
        label: label.map(str::to_string),
    }
}

impl Topology {
    /// The React app deployment: HAProxy in the public subnets forwarding to
    /// Nginx in the private subnets, with ECR, CloudWatch and service discovery.
    pub fn aws_reference() -> Self {
        use NodeKind::*;

        let clusters = vec![
            cluster("aws", "AWS Cloud (10.0.0.0/16)", None),
            cluster("public", "Public Subnets (10.0.0.0/24, 10.0.1.0/24)", Some("aws")),
            cluster("haproxy_service", "HAProxy Service", Some("public")),
            cluster("private", "Private Subnets (10.0.100.0/24, 10.0.101.0/24)", Some("aws")),
            cluster("nginx_service", "Nginx Service", Some("private")),
            cluster("supporting", "Supporting Services", Some("aws")),
        ];

        let nodes = vec![
            node("internet", InMemory, "Internet\n(Users)", None),
            node("igw", InternetGateway, "Internet Gateway", Some("public")),
            node("haproxy_sg", SecurityGroup, "Public SG\n:80, :443", Some("haproxy_service")),
            node(
                "haproxy",
                Ecs,
                "HAProxy\nCPU: 256, Mem: 512MB\nDesired: 1",
                Some("haproxy_service"),
            ),
            node("eip", Route53, "Elastic IP", Some("public")),
            node("nat", NatGateway, "NAT Gateway", Some("private")),
            node("nginx_sg", SecurityGroup, "Private SG\n:80", Some("nginx_service")),
            node(
                "nginx",
                Ecs,
                "Nginx\nCPU: 256, Mem: 512MB\nDesired: 1",
                Some("nginx_service"),
            ),
            node("ecr_haproxy", Ecr, "ECR Haproxy", Some("supporting")),
            node("ecr_nginx", Ecr, "ECR Nginx", Some("supporting")),
            node("cloudwatch", CloudWatch, "CloudWatch\nLogs & Metrics", Some("supporting")),
            node(
                "route53",
                Route53,
                "Service Discovery\nreact-app.local",
                Some("supporting"),
            ),
        ];

        let edges = vec![
            // Traffic flow
            edge("internet", "haproxy_sg", Some("HTTP :80\nHTTPS :443")),
            edge("haproxy_sg", "haproxy", None),
            edge("haproxy", "nginx_sg", Some("HTTP :80")),
            edge("nginx_sg", "nginx", None),
            // Infrastructure
            edge("haproxy", "ecr_haproxy", Some("Pull Image")),
            edge("nginx", "ecr_nginx", Some("Pull Image")),
            edge("haproxy", "cloudwatch", Some("Send Logs")),
            edge("nginx", "cloudwatch", Some("Send Logs")),
            edge("nginx", "route53", Some("Register")),
            // Network
            edge("haproxy", "igw", None),
            edge("nginx", "nat", None),
            edge("nat", "igw", None),
            edge("haproxy", "eip", None),
        ];

        Self {
            title: None,
            direction: None,
            clusters,
            nodes,
            edges,
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|err| Error::config(path, err))?;
        let topology: Self = json5::from_str(&contents).map_err(|err| Error::config(path, err))?;
        topology.validate()?;
        log::debug!(
            path:? = path,
            clusters = topology.clusters.len(),
            nodes = topology.nodes.len(),
            edges = topology.edges.len();
            "Loaded topology"
        );
        Ok(topology)
    }

    /// Checks keys and references without rendering anything.
    ///
    /// Parents must be declared before their children, so the cluster tree
    /// cannot contain a cycle; every node has exactly one owner and every
    /// edge endpoint names a declared node.
    pub fn validate(&self) -> Result<()> {
        let mut clusters = HashSet::new();
        for spec in &self.clusters {
            if let Some(parent) = &spec.parent
                && !clusters.contains(parent.as_str())
            {
                return Err(Error::InvalidTopology(format!(
                    "cluster `{}` refers to parent `{parent}` before it is declared",
                    spec.key
                )));
            }
            if !clusters.insert(spec.key.as_str()) {
                return Err(Error::InvalidTopology(format!(
                    "duplicate cluster key `{}`",
                    spec.key
                )));
            }
        }

        let mut nodes = HashSet::new();
        for spec in &self.nodes {
            if let Some(cluster) = &spec.cluster
                && !clusters.contains(cluster.as_str())
            {
                return Err(Error::InvalidTopology(format!(
                    "node `{}` belongs to unknown cluster `{cluster}`",
                    spec.key
                )));
            }
            if !nodes.insert(spec.key.as_str()) {
                return Err(Error::InvalidTopology(format!(
                    "duplicate node key `{}`",
                    spec.key
                )));
            }
        }

        for (idx, spec) in self.edges.iter().enumerate() {
            for endpoint in [&spec.from, &spec.to] {
                if !nodes.contains(endpoint.as_str()) {
                    return Err(Error::InvalidTopology(format!(
                        "edge #{idx} ({} -> {}) refers to unknown node `{endpoint}`",
                        spec.from, spec.to
                    )));
                }
            }
        }
        Ok(())
    }

    /// Declares the whole topology into `diagram` and returns the node handles by key.
    ///
    /// Within a cluster, children are declared in the order their first node
    /// appears in `nodes`; empty clusters follow in table order.
    pub fn declare_into(&self, diagram: &mut Diagram) -> Result<HashMap<String, NodeId>> {
        self.validate()?;
        let mut handles = HashMap::new();
        let mut root = diagram.scope();
        self.declare_level(&mut root, None, &mut handles)?;

        for spec in &self.edges {
            root.edge(handles[&spec.from], handles[&spec.to], spec.label.as_deref())?;
        }
        Ok(handles)
    }

    fn declare_level(
        &self,
        scope: &mut Scope<'_>,
        parent: Option<&str>,
        handles: &mut HashMap<String, NodeId>,
    ) -> Result<()> {
        enum Item<'t> {
            Node(&'t NodeSpec),
            Cluster(&'t ClusterSpec),
        }

        let mut items: Vec<(usize, Item<'_>)> = Vec::new();
        for (idx, spec) in self.nodes.iter().enumerate() {
            if spec.cluster.as_deref() == parent {
                items.push((idx, Item::Node(spec)));
            }
        }
        for (idx, spec) in self.clusters.iter().enumerate() {
            if spec.parent.as_deref() == parent {
                let first = self
                    .first_node_index(&spec.key)
                    .unwrap_or(self.nodes.len() + idx);
                items.push((first, Item::Cluster(spec)));
            }
        }
        items.sort_by_key(|(order, _)| *order);

        for (_, item) in items {
            match item {
                Item::Node(spec) => {
                    let id = scope.node(spec.kind, &spec.label)?;
                    handles.insert(spec.key.clone(), id);
                }
                Item::Cluster(spec) => {
                    scope.cluster(&spec.title, |inner| {
                        self.declare_level(inner, Some(&spec.key), handles)
                    })?;
                }
            }
        }
        Ok(())
    }

    /// Index in `nodes` of the first node inside `cluster` or its descendants.
    fn first_node_index(&self, cluster: &str) -> Option<usize> {
        self.nodes.iter().position(|spec| {
            let mut current = spec.cluster.as_deref();
            while let Some(key) = current {
                if key == cluster {
                    return true;
                }
                current = self
                    .clusters
                    .iter()
                    .find(|c| c.key == key)
                    .and_then(|c| c.parent.as_deref());
            }
            false
        })
    }
}
