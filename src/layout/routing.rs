use super::{EdgeLayout, NodeLayout, TextBlock};

const LABEL_PAD_X: f32 = 6.0;
const LABEL_PAD_Y: f32 = 4.0;
const LABEL_ATTEMPTS: usize = 6;
/// Spread between parallel edges of the same node pair.
const PARALLEL_OFFSET: f32 = 10.0;

type Rect = (f32, f32, f32, f32);

/// Straight segment between the borders of two node boxes.
///
/// `lane` shifts parallel edges sideways so they stay distinguishable.
pub(super) fn route_edge(from: &NodeLayout, to: &NodeLayout, lane: usize, lanes: usize) -> Vec<(f32, f32)> {
    let (fx, fy) = from.center();
    let (tx, ty) = to.center();
    let (dx, dy) = (tx - fx, ty - fy);
    let length = (dx * dx + dy * dy).sqrt();
    if length < f32::EPSILON {
        return vec![(fx, fy), (tx, ty)];
    }

    let shift = (lane as f32 - (lanes.saturating_sub(1)) as f32 / 2.0) * PARALLEL_OFFSET;
    let (nx, ny) = (-dy / length * shift, dx / length * shift);
    let origin = (fx + nx, fy + ny);
    let target = (tx + nx, ty + ny);

    let start = clip_to_rect(origin, (dx, dy), &node_rect(from)).unwrap_or(origin);
    let end = clip_to_rect(target, (-dx, -dy), &node_rect(to)).unwrap_or(target);
    vec![start, end]
}

fn node_rect(node: &NodeLayout) -> Rect {
    (node.x, node.y, node.width, node.height)
}

/// Exit point of a ray starting inside `rect`.
fn clip_to_rect(origin: (f32, f32), dir: (f32, f32), rect: &Rect) -> Option<(f32, f32)> {
    let (x, y, w, h) = *rect;
    let mut best: Option<f32> = None;
    let mut consider = |t: f32, px: f32, py: f32| {
        if t > 0.0 && px >= x - 0.01 && px <= x + w + 0.01 && py >= y - 0.01 && py <= y + h + 0.01 {
            best = Some(best.map_or(t, |b: f32| b.min(t)));
        }
    };
    if dir.0.abs() > f32::EPSILON {
        for edge_x in [x, x + w] {
            let t = (edge_x - origin.0) / dir.0;
            consider(t, edge_x, origin.1 + dir.1 * t);
        }
    }
    if dir.1.abs() > f32::EPSILON {
        for edge_y in [y, y + h] {
            let t = (edge_y - origin.1) / dir.1;
            consider(t, origin.0 + dir.0 * t, edge_y);
        }
    }
    best.map(|t| (origin.0 + dir.0 * t, origin.1 + dir.1 * t))
}

pub(super) fn edge_midpoint(points: &[(f32, f32)]) -> (f32, f32) {
    match points {
        [] => (0.0, 0.0),
        [only] => *only,
        [first, .., last] => ((first.0 + last.0) / 2.0, (first.1 + last.1) / 2.0),
    }
}

/// Anchors each labeled edge near its midpoint, stepping along the edge's
/// normal until the label plate clears nodes and earlier labels.
pub(super) fn place_edge_labels(edges: &mut [EdgeLayout], nodes: &[NodeLayout]) {
    let mut occupied: Vec<Rect> = nodes.iter().map(node_rect).collect();

    for edge in edges.iter_mut() {
        let Some(label) = edge.label.as_ref() else {
            continue;
        };
        let (mid_x, mid_y) = edge_midpoint(&edge.points);
        let step = label.height + LABEL_PAD_Y * 2.0;
        let mut placed = None;
        for attempt in 0..LABEL_ATTEMPTS {
            // 0, +1, -1, +2, -2, ...
            let k = attempt.div_ceil(2) as f32 * if attempt % 2 == 0 { -1.0 } else { 1.0 };
            let candidate = (mid_x, mid_y + k * step);
            let rect = label_rect(candidate, label);
            if !collides(&rect, &occupied) {
                occupied.push(rect);
                placed = Some(candidate);
                break;
            }
        }
        let anchor = placed.unwrap_or_else(|| {
            occupied.push(label_rect((mid_x, mid_y), label));
            (mid_x, mid_y)
        });
        edge.label_anchor = Some(anchor);
    }
}

pub(super) fn label_rect(center: (f32, f32), label: &TextBlock) -> Rect {
    (
        center.0 - label.width / 2.0 - LABEL_PAD_X,
        center.1 - label.height / 2.0 - LABEL_PAD_Y,
        label.width + LABEL_PAD_X * 2.0,
        label.height + LABEL_PAD_Y * 2.0,
    )
}

fn collides(rect: &Rect, occupied: &[Rect]) -> bool {
    occupied.iter().any(|(x, y, w, h)| {
        rect.0 < x + w && rect.0 + rect.2 > *x && rect.1 < y + h && rect.1 + rect.3 > *y
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{GraphId, NodeId, NodeKind};

    fn node(idx: usize, x: f32, y: f32) -> NodeLayout {
        NodeLayout {
            id: NodeId {
                graph: GraphId(0),
                index: idx,
            },
            kind: NodeKind::Ecs,
            x,
            y,
            width: 40.0,
            height: 40.0,
            icon_size: 40.0,
            label: TextBlock {
                lines: vec![String::new()],
                width: 0.0,
                height: 0.0,
            },
            rank: 0,
        }
    }

    #[test]
    fn vertical_route_touches_borders() {
        let a = node(0, 0.0, 0.0);
        let b = node(1, 0.0, 100.0);
        let points = route_edge(&a, &b, 0, 1);
        assert_eq!(points.len(), 2);
        assert!((points[0].1 - 40.0).abs() < 0.01);
        assert!((points[1].1 - 100.0).abs() < 0.01);
        assert!((points[0].0 - 20.0).abs() < 0.01);
    }

    #[test]
    fn parallel_lanes_are_offset() {
        let a = node(0, 0.0, 0.0);
        let b = node(1, 0.0, 100.0);
        let first = route_edge(&a, &b, 0, 2);
        let second = route_edge(&a, &b, 1, 2);
        assert!((first[0].0 - second[0].0).abs() > 1.0);
    }

    #[test]
    fn midpoint_of_segment() {
        assert_eq!(edge_midpoint(&[(0.0, 0.0), (10.0, 20.0)]), (5.0, 10.0));
        assert_eq!(edge_midpoint(&[]), (0.0, 0.0));
    }

    #[test]
    fn overlapping_labels_are_separated() {
        let label = TextBlock {
            lines: vec!["Send Logs".to_string()],
            width: 60.0,
            height: 18.0,
        };
        let make = || EdgeLayout {
            from: NodeId {
                graph: GraphId(0),
                index: 0,
            },
            to: NodeId {
                graph: GraphId(0),
                index: 1,
            },
            label: Some(label.clone()),
            label_anchor: None,
            points: vec![(0.0, 200.0), (0.0, 400.0)],
        };
        let mut edges = vec![make(), make()];
        place_edge_labels(&mut edges, &[]);
        let first = edges[0].label_anchor.unwrap();
        let second = edges[1].label_anchor.unwrap();
        assert_ne!(first, second);
    }
}
