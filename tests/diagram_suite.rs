use std::path::Path;

use infra_diagram::topology::EdgeSpec;
use infra_diagram::{
    Diagram, DiagramOptions, Direction, Error, LayoutConfig, OutputFormat, Topology,
    compute_layout, render_svg, render_topology,
};

fn fast_options(stem: &Path, format: OutputFormat) -> DiagramOptions {
    let mut options = DiagramOptions {
        filename: stem.to_path_buf(),
        format,
        ..DiagramOptions::default()
    };
    options.config.layout = LayoutConfig {
        fast_text_metrics: true,
        ..LayoutConfig::default()
    };
    options
}

fn assert_valid_svg(svg: &str, case: &str) {
    assert!(svg.contains("<svg"), "{case}: missing <svg tag");
    assert!(svg.contains("</svg>"), "{case}: missing </svg tag");
}

fn declared_reference(dir: &Path, direction: Direction) -> Diagram {
    let mut options = fast_options(&dir.join("scratch"), OutputFormat::Svg);
    options.direction = direction;
    let mut diagram = Diagram::open(options).expect("open failed");
    Topology::aws_reference()
        .declare_into(&mut diagram)
        .expect("declare failed");
    diagram
}

#[test]
fn reference_topology_renders_in_every_direction() {
    let dir = tempfile::tempdir().unwrap();
    for direction in [
        Direction::TopBottom,
        Direction::BottomTop,
        Direction::LeftRight,
        Direction::RightLeft,
    ] {
        let diagram = declared_reference(dir.path(), direction);
        let case = format!("{direction:?}");
        let svg = diagram.to_svg();
        assert_valid_svg(&svg, &case);
        for label in [
            "React App Infrastructure",
            "AWS Cloud (10.0.0.0/16)",
            "HAProxy Service",
            "Nginx Service",
            "Service Discovery",
            "Pull Image",
            "Logs &amp; Metrics",
        ] {
            assert!(svg.contains(label), "{case}: missing `{label}`");
        }
        diagram.render().expect("render failed");
    }
}

#[test]
fn reference_topology_is_well_formed() {
    let dir = tempfile::tempdir().unwrap();
    let diagram = declared_reference(dir.path(), Direction::TopBottom);
    let graph = diagram.graph();

    assert_eq!(graph.nodes.len(), 12);
    assert_eq!(graph.clusters.len(), 6);
    assert_eq!(graph.edges.len(), 13);

    // Every edge endpoint was declared before the edge.
    for edge in &graph.edges {
        assert!(edge.from.index() < graph.nodes.len());
        assert!(edge.to.index() < graph.nodes.len());
    }

    // Parents precede children, so walking up always terminates at the root.
    for cluster in &graph.clusters {
        if let Some(parent) = cluster.parent {
            assert!(parent.index() < cluster.id.index());
        }
    }

    // Every node appears under exactly one owner.
    let mut owners = vec![0usize; graph.nodes.len()];
    for child in graph.children(None) {
        if let infra_diagram::ir::Child::Node(id) = child {
            owners[id.index()] += 1;
        }
    }
    for cluster in &graph.clusters {
        for child in graph.children(Some(cluster.id)) {
            if let infra_diagram::ir::Child::Node(id) = child {
                owners[id.index()] += 1;
            }
        }
    }
    assert!(owners.iter().all(|count| *count == 1), "owners: {owners:?}");
}

#[test]
fn nodes_stay_inside_their_clusters() {
    let dir = tempfile::tempdir().unwrap();
    let diagram = declared_reference(dir.path(), Direction::LeftRight);
    let layout = diagram.layout();
    let graph = diagram.graph();

    for node in &layout.nodes {
        let Some(owner) = graph.node(node.id).cluster else {
            continue;
        };
        let cluster = layout
            .clusters
            .iter()
            .find(|c| c.id == owner)
            .expect("cluster laid out");
        assert!(node.x >= cluster.x && node.x + node.width <= cluster.x + cluster.width + 0.01);
        assert!(node.y >= cluster.y && node.y + node.height <= cluster.y + cluster.height + 0.01);
    }
    assert!(layout.width > 0.0 && layout.height > 0.0);
}

#[test]
fn svg_output_is_overwritten_on_second_run() {
    let dir = tempfile::tempdir().unwrap();
    let stem = dir.path().join("docs").join("architecture");
    let topology = Topology::aws_reference();

    let first = render_topology(&topology, fast_options(&stem, OutputFormat::Svg)).unwrap();
    let mut options = fast_options(&stem, OutputFormat::Svg);
    options.title = "Second Pass".to_string();
    let second = render_topology(&topology, options).unwrap();

    assert_eq!(first, second);
    assert!(first.ends_with("docs/architecture.svg"));
    let svg = std::fs::read_to_string(second).unwrap();
    assert!(svg.contains("Second Pass"));
}

#[test]
fn invalid_topology_leaves_previous_output_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let stem = dir.path().join("docs").join("architecture");
    let path = render_topology(
        &Topology::aws_reference(),
        fast_options(&stem, OutputFormat::Svg),
    )
    .unwrap();
    let before = std::fs::read_to_string(&path).unwrap();

    let mut broken = Topology::aws_reference();
    broken.edges.push(EdgeSpec {
        from: "nginx".to_string(),
        to: "redis".to_string(),
        label: None,
    });
    let err = render_topology(&broken, fast_options(&stem, OutputFormat::Svg)).unwrap_err();

    assert!(matches!(err, Error::InvalidTopology(_)), "got {err}");
    let after = std::fs::read_to_string(&path).unwrap();
    assert_eq!(before, after);
    assert!(after.contains("HAProxy"));
}

#[test]
fn layout_and_render_are_usable_without_a_diagram() {
    let dir = tempfile::tempdir().unwrap();
    let diagram = declared_reference(dir.path(), Direction::TopBottom);
    let options = diagram.options().clone();
    let layout = compute_layout(diagram.graph(), &options.config.theme, &options.config.layout);
    let svg = render_svg(&layout, &options.config.theme, &options.config.layout);
    assert_eq!(svg, diagram.to_svg());
}

#[cfg(feature = "png")]
#[test]
fn png_written_to_default_location_under_fresh_directory() {
    let dir = tempfile::tempdir().unwrap();
    let stem = dir.path().join("docs").join("architecture");
    let path = render_topology(
        &Topology::aws_reference(),
        fast_options(&stem, OutputFormat::Png),
    )
    .unwrap();

    assert!(path.ends_with("docs/architecture.png"));
    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
}

#[cfg(not(feature = "png"))]
#[test]
fn png_request_reports_missing_dependency_without_writing() {
    let dir = tempfile::tempdir().unwrap();
    let stem = dir.path().join("docs").join("architecture");
    let err = render_topology(
        &Topology::aws_reference(),
        fast_options(&stem, OutputFormat::Png),
    )
    .unwrap_err();

    assert!(err.is_dependency_missing());
    assert!(!dir.path().join("docs").exists());
}
