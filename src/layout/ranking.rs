use std::collections::VecDeque;

use crate::ir::{Child, ClusterId, Graph};

/// Longest-path ranks: every edge target sits at least one rank below its source.
///
/// Nodes on a cycle never reach in-degree zero; they are ranked after the
/// acyclic part in declaration order.
pub(super) fn assign_ranks(graph: &Graph) -> Vec<usize> {
    let count = graph.nodes.len();
    let mut ranks = vec![0usize; count];
    let mut indegree = vec![0usize; count];
    let mut outgoing: Vec<Vec<usize>> = vec![Vec::new(); count];
    for edge in &graph.edges {
        if edge.from == edge.to {
            continue;
        }
        outgoing[edge.from.index()].push(edge.to.index());
        indegree[edge.to.index()] += 1;
    }

    let mut queue: VecDeque<usize> = (0..count).filter(|idx| indegree[*idx] == 0).collect();
    let mut visited = vec![false; count];
    while let Some(idx) = queue.pop_front() {
        visited[idx] = true;
        for &next in &outgoing[idx] {
            ranks[next] = ranks[next].max(ranks[idx] + 1);
            indegree[next] -= 1;
            if indegree[next] == 0 {
                queue.push_back(next);
            }
        }
    }

    let mut next_rank = ranks
        .iter()
        .zip(&visited)
        .filter(|(_, seen)| **seen)
        .map(|(rank, _)| rank + 1)
        .max()
        .unwrap_or(0);
    for idx in 0..count {
        if !visited[idx] {
            ranks[idx] = ranks[idx].max(next_rank);
            next_rank = ranks[idx] + 1;
        }
    }
    ranks
}

/// Smallest rank among a child's nodes; empty clusters sort first.
pub(super) fn child_rank(graph: &Graph, ranks: &[usize], child: Child) -> usize {
    match child {
        Child::Node(id) => ranks[id.index()],
        Child::Cluster(id) => cluster_rank(graph, ranks, id),
    }
}

fn cluster_rank(graph: &Graph, ranks: &[usize], id: ClusterId) -> usize {
    graph
        .descendant_nodes(id)
        .into_iter()
        .map(|node| ranks[node.index()])
        .min()
        .unwrap_or(0)
}
