use crate::error::{Error, Result};
use crate::theme::Theme;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub margin: f32,
    pub icon_size: f32,
    pub icon_label_gap: f32,
    pub node_spacing: f32,
    pub rank_spacing: f32,
    pub node_padding_x: f32,
    pub cluster_padding: f32,
    pub cluster_title_height: f32,
    pub title_height: f32,
    pub label_line_height: f32,
    pub max_label_width_chars: usize,
    /// Skip font lookups and use the built-in width table.
    pub fast_text_metrics: bool,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            margin: 32.0,
            icon_size: 56.0,
            icon_label_gap: 8.0,
            node_spacing: 48.0,
            rank_spacing: 64.0,
            node_padding_x: 8.0,
            cluster_padding: 20.0,
            cluster_title_height: 28.0,
            title_height: 48.0,
            label_line_height: 1.4,
            max_label_width_chars: 28,
            fast_text_metrics: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Pixel density multiplier applied when rasterizing; the SVG size comes
    /// from the layout and the background from the theme.
    pub scale: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self { scale: 1.0 }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub theme: Theme,
    pub layout: LayoutConfig,
    pub render: RenderConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme: Theme::aws(),
            layout: LayoutConfig::default(),
            render: RenderConfig::default(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    theme: Option<String>,
    theme_variables: Option<ThemeVariables>,
    layout: Option<LayoutConfigFile>,
    render: Option<RenderConfigFile>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThemeVariables {
    font_family: Option<String>,
    font_size: Option<f32>,
    title_font_size: Option<f32>,
    text_color: Option<String>,
    line_color: Option<String>,
    edge_label_background: Option<String>,
    cluster_bkg: Option<String>,
    cluster_border: Option<String>,
    background: Option<String>,
    network_color: Option<String>,
    compute_color: Option<String>,
    storage_color: Option<String>,
    management_color: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LayoutConfigFile {
    icon_size: Option<f32>,
    node_spacing: Option<f32>,
    rank_spacing: Option<f32>,
    cluster_padding: Option<f32>,
    max_label_width_chars: Option<usize>,
    fast_text_metrics: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RenderConfigFile {
    scale: Option<f32>,
}

pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };

    let contents = std::fs::read_to_string(path).map_err(|err| Error::config(path, err))?;
    let parsed: ConfigFile = json5::from_str(&contents).map_err(|err| Error::config(path, err))?;
    log::debug!(path:? = path; "Loaded config file");
    apply_config_file(parsed).map_err(|message| Error::config(path, message))
}

fn apply_config_file(parsed: ConfigFile) -> std::result::Result<Config, String> {
    let mut config = Config::default();

    if let Some(name) = parsed.theme.as_deref() {
        config.theme = Theme::by_name(name).ok_or_else(|| format!("unknown theme `{name}`"))?;
    }

    if let Some(vars) = parsed.theme_variables {
        if let Some(v) = vars.font_family {
            config.theme.font_family = v;
        }
        if let Some(v) = vars.font_size {
            config.theme.font_size = v;
        }
        if let Some(v) = vars.title_font_size {
            config.theme.title_font_size = v;
        }
        if let Some(v) = vars.text_color {
            config.theme.text_color = v;
        }
        if let Some(v) = vars.line_color {
            config.theme.line_color = v;
        }
        if let Some(v) = vars.edge_label_background {
            config.theme.edge_label_background = v;
        }
        if let Some(v) = vars.cluster_bkg {
            config.theme.cluster_background = v;
        }
        if let Some(v) = vars.cluster_border {
            config.theme.cluster_border = v;
        }
        if let Some(v) = vars.background {
            config.theme.background = v;
        }
        if let Some(v) = vars.network_color {
            config.theme.network_color = v;
        }
        if let Some(v) = vars.compute_color {
            config.theme.compute_color = v;
        }
        if let Some(v) = vars.storage_color {
            config.theme.storage_color = v;
        }
        if let Some(v) = vars.management_color {
            config.theme.management_color = v;
        }
    }

    if let Some(layout) = parsed.layout {
        if let Some(v) = layout.icon_size {
            config.layout.icon_size = v;
        }
        if let Some(v) = layout.node_spacing {
            config.layout.node_spacing = v;
        }
        if let Some(v) = layout.rank_spacing {
            config.layout.rank_spacing = v;
        }
        if let Some(v) = layout.cluster_padding {
            config.layout.cluster_padding = v;
        }
        if let Some(v) = layout.max_label_width_chars {
            config.layout.max_label_width_chars = v;
        }
        if let Some(v) = layout.fast_text_metrics {
            config.layout.fast_text_metrics = v;
        }
    }

    if let Some(render) = parsed.render
        && let Some(scale) = render.scale
    {
        if scale <= 0.0 {
            return Err(format!("render scale must be positive, got {scale}"));
        }
        config.render.scale = scale;
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn parse(src: &str) -> std::result::Result<Config, String> {
        let parsed: ConfigFile = json5::from_str(src).map_err(|e| e.to_string())?;
        apply_config_file(parsed)
    }

    #[test]
    fn missing_path_uses_defaults() {
        let config = load_config(None).unwrap();
        assert_eq!(config.theme.network_color, Theme::aws().network_color);
        assert_eq!(config.render.scale, 1.0);
    }

    #[test]
    fn theme_variables_override_theme() {
        let config = parse(
            r##"{
                // comments are fine in JSON5
                theme: "mono",
                themeVariables: { computeColor: "#FF0000", background: "#000000" },
            }"##,
        )
        .unwrap();
        assert_eq!(config.theme.compute_color, "#FF0000");
        assert_eq!(config.theme.storage_color, Theme::mono().storage_color);
        assert_eq!(config.theme.background, "#000000");
    }

    #[test]
    fn layout_and_render_sections() {
        let config = parse(r#"{ layout: { iconSize: 40, fastTextMetrics: true }, render: { scale: 2 } }"#)
            .unwrap();
        assert_eq!(config.layout.icon_size, 40.0);
        assert!(config.layout.fast_text_metrics);
        assert_eq!(config.render.scale, 2.0);
    }

    #[test]
    fn rejects_unknown_theme_and_bad_scale() {
        assert!(parse(r#"{ theme: "neon" }"#).is_err());
        assert!(parse(r#"{ render: { scale: 0 } }"#).is_err());
    }

    #[test]
    fn load_config_reports_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ theme: ").unwrap();
        let err = load_config(Some(file.path())).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }
}
