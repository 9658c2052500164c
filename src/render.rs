use crate::config::{LayoutConfig, RenderConfig};
use crate::error::{Error, Result};
use crate::ir::OutputFormat;
use crate::layout::{ClusterLayout, EdgeLayout, Layout, NodeLayout, TextBlock};
use crate::theme::{Theme, darken};
use std::fmt::Write as _;
use std::path::Path;

const LABEL_PAD_X: f32 = 6.0;
const LABEL_PAD_Y: f32 = 4.0;
const CLUSTER_DEPTH_SHADE: f32 = 0.035;

pub fn render_svg(layout: &Layout, theme: &Theme, config: &LayoutConfig) -> String {
    let mut svg = String::new();
    let width = layout.width.max(200.0);
    let height = layout.height.max(200.0);

    let _ = write!(
        svg,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width:.0}\" height=\"{height:.0}\" viewBox=\"0 0 {width:.2} {height:.2}\">",
    );
    let _ = write!(
        svg,
        "<rect width=\"100%\" height=\"100%\" fill=\"{}\"/>",
        theme.background
    );
    let _ = write!(
        svg,
        "<defs><marker id=\"arrow\" viewBox=\"0 0 10 10\" refX=\"10\" refY=\"5\" markerWidth=\"7\" markerHeight=\"7\" orient=\"auto-start-reverse\"><path d=\"M 0 0 L 10 5 L 0 10 z\" fill=\"{}\"/></marker></defs>",
        theme.line_color
    );

    if let Some(title) = &layout.title {
        let title_theme = Theme {
            font_size: theme.title_font_size,
            ..theme.clone()
        };
        let y = config.margin / 2.0 + config.title_height / 2.0;
        svg.push_str(&text_block_svg(
            layout.width / 2.0,
            y,
            title,
            &title_theme,
            config,
            "font-weight=\"600\"",
        ));
    }

    for cluster in &layout.clusters {
        cluster_svg(&mut svg, cluster, theme, config);
    }
    for edge in &layout.edges {
        edge_path_svg(&mut svg, edge, theme);
    }
    for node in &layout.nodes {
        node_svg(&mut svg, node, theme, config);
    }
    // Label plates go last so they stay readable over crossing edges.
    for edge in &layout.edges {
        edge_label_svg(&mut svg, edge, theme, config);
    }

    svg.push_str("</svg>");
    svg
}

fn cluster_svg(svg: &mut String, cluster: &ClusterLayout, theme: &Theme, config: &LayoutConfig) {
    let fill = darken(
        &theme.cluster_background,
        CLUSTER_DEPTH_SHADE * cluster.depth as f32,
    );
    let _ = write!(
        svg,
        "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" rx=\"8\" ry=\"8\" fill=\"{}\" stroke=\"{}\" stroke-dasharray=\"6 4\" stroke-width=\"1.2\"/>",
        cluster.x, cluster.y, cluster.width, cluster.height, fill, theme.cluster_border
    );
    let label_x = cluster.x + config.cluster_padding / 2.0;
    let label_y = cluster.y + config.cluster_title_height / 2.0 + theme.font_size / 2.0;
    let _ = write!(
        svg,
        "<text x=\"{label_x:.2}\" y=\"{label_y:.2}\" font-family=\"{}\" font-size=\"{}\" fill=\"{}\">{}</text>",
        escape_xml(&theme.font_family),
        theme.font_size,
        theme.text_color,
        escape_xml(&cluster.title)
    );
}

fn edge_path_svg(svg: &mut String, edge: &EdgeLayout, theme: &Theme) {
    let _ = write!(
        svg,
        "<path d=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"1.4\" marker-end=\"url(#arrow)\"/>",
        points_to_path(&edge.points),
        theme.line_color
    );
}

fn edge_label_svg(svg: &mut String, edge: &EdgeLayout, theme: &Theme, config: &LayoutConfig) {
    let (Some(label), Some((x, y))) = (&edge.label, edge.label_anchor) else {
        return;
    };
    let _ = write!(
        svg,
        "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" rx=\"6\" ry=\"6\" fill=\"{}\" stroke=\"{}\" stroke-width=\"0.8\"/>",
        x - label.width / 2.0 - LABEL_PAD_X,
        y - label.height / 2.0 - LABEL_PAD_Y,
        label.width + LABEL_PAD_X * 2.0,
        label.height + LABEL_PAD_Y * 2.0,
        theme.edge_label_background,
        theme.edge_label_border
    );
    svg.push_str(&text_block_svg(x, y, label, theme, config, ""));
}

fn node_svg(svg: &mut String, node: &NodeLayout, theme: &Theme, config: &LayoutConfig) {
    let (icon_x, icon_y) = node.icon_origin();
    let size = node.icon_size;
    let _ = write!(
        svg,
        "<rect x=\"{icon_x:.2}\" y=\"{icon_y:.2}\" width=\"{size:.2}\" height=\"{size:.2}\" rx=\"6\" ry=\"6\" fill=\"{}\"/>",
        theme.category_color(node.kind.category())
    );
    let tag_size = (size * 0.3).round();
    let _ = write!(
        svg,
        "<text x=\"{:.2}\" y=\"{:.2}\" text-anchor=\"middle\" font-family=\"{}\" font-size=\"{tag_size}\" font-weight=\"700\" fill=\"{}\">{}</text>",
        icon_x + size / 2.0,
        icon_y + size / 2.0 + tag_size * 0.35,
        escape_xml(&theme.font_family),
        theme.icon_text_color,
        node.kind.tag()
    );
    let (cx, cy) = node.label_center(config.icon_label_gap);
    svg.push_str(&text_block_svg(cx, cy, &node.label, theme, config, ""));
}

fn points_to_path(points: &[(f32, f32)]) -> String {
    let mut d = String::new();
    for (idx, (x, y)) in points.iter().enumerate() {
        let cmd = if idx == 0 { "M" } else { " L" };
        let _ = write!(d, "{cmd} {x:.2} {y:.2}");
    }
    d
}

fn text_block_svg(
    x: f32,
    y: f32,
    label: &TextBlock,
    theme: &Theme,
    config: &LayoutConfig,
    extra: &str,
) -> String {
    let line_height = theme.font_size * config.label_line_height;
    let total_height = label.lines.len() as f32 * line_height;
    let start_y = y - total_height / 2.0 + line_height / 2.0 + theme.font_size * 0.35;
    let mut text = String::new();
    let _ = write!(
        text,
        "<text x=\"{x:.2}\" y=\"{start_y:.2}\" text-anchor=\"middle\" font-family=\"{}\" font-size=\"{}\" fill=\"{}\" {extra}>",
        escape_xml(&theme.font_family),
        theme.font_size,
        theme.text_color
    );
    for (idx, line) in label.lines.iter().enumerate() {
        let dy = if idx == 0 { 0.0 } else { line_height };
        let _ = write!(
            text,
            "<tspan x=\"{x:.2}\" dy=\"{dy:.2}\">{}</tspan>",
            escape_xml(line)
        );
    }
    text.push_str("</text>");
    text
}

/// Fails with `DependencyMissing` when `format` needs a backend that was not
/// compiled in. Called before any output is produced.
pub fn ensure_backend(format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Svg => Ok(()),
        OutputFormat::Png if cfg!(feature = "png") => Ok(()),
        OutputFormat::Png => Err(Error::DependencyMissing {
            backend: "PNG",
            feature: "png",
        }),
    }
}

/// Writes `svg` to `path` in `format`, creating missing parent directories.
pub fn write_output(
    svg: &str,
    path: &Path,
    format: OutputFormat,
    render_cfg: &RenderConfig,
    theme: &Theme,
) -> Result<()> {
    ensure_backend(format)?;
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        log::info!(dir:? = parent; "Creating output directory");
        std::fs::create_dir_all(parent).map_err(|err| Error::write(parent, err))?;
    }
    match format {
        OutputFormat::Svg => write_output_svg(svg, path),
        OutputFormat::Png => write_output_png(svg, path, render_cfg, theme),
    }
}

pub fn write_output_svg(svg: &str, path: &Path) -> Result<()> {
    std::fs::write(path, svg).map_err(|err| Error::write(path, err))
}

#[cfg(feature = "png")]
pub fn write_output_png(svg: &str, output: &Path, render_cfg: &RenderConfig, theme: &Theme) -> Result<()> {
    let mut opt = usvg::Options {
        font_family: theme
            .font_family
            .split(',')
            .next()
            .map(|name| name.trim().trim_matches('"').to_string())
            .unwrap_or_else(|| "sans-serif".to_string()),
        ..usvg::Options::default()
    };
    opt.fontdb_mut().load_system_fonts();

    let tree = usvg::Tree::from_str(svg, &opt).map_err(|err| Error::Rasterize(err.to_string()))?;
    let size = tree.size().to_int_size();
    let scale = render_cfg.scale.max(0.1);
    let width = (size.width() as f32 * scale).ceil() as u32;
    let height = (size.height() as f32 * scale).ceil() as u32;
    let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)
        .ok_or_else(|| Error::Rasterize(format!("cannot allocate {width}x{height} pixmap")))?;

    resvg::render(
        &tree,
        resvg::tiny_skia::Transform::from_scale(scale, scale),
        &mut pixmap.as_mut(),
    );
    let png = pixmap
        .encode_png()
        .map_err(|err| Error::Rasterize(err.to_string()))?;
    std::fs::write(output, png).map_err(|err| Error::write(output, err))
}

#[cfg(not(feature = "png"))]
pub fn write_output_png(_svg: &str, _output: &Path, _render_cfg: &RenderConfig, _theme: &Theme) -> Result<()> {
    Err(Error::DependencyMissing {
        backend: "PNG",
        feature: "png",
    })
}

fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
