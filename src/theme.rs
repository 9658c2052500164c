use serde::{Deserialize, Serialize};

use crate::ir::Category;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    pub font_family: String,
    pub font_size: f32,
    pub title_font_size: f32,
    pub text_color: String,
    pub line_color: String,
    pub edge_label_background: String,
    pub edge_label_border: String,
    pub cluster_background: String,
    pub cluster_border: String,
    pub background: String,
    pub icon_text_color: String,
    pub network_color: String,
    pub compute_color: String,
    pub storage_color: String,
    pub management_color: String,
}

impl Theme {
    /// Palette close to the AWS architecture icon set.
    pub fn aws() -> Self {
        Self {
            font_family: "Inter, Segoe UI, system-ui, -apple-system, sans-serif".to_string(),
            font_size: 13.0,
            title_font_size: 20.0,
            text_color: "#232F3E".to_string(),
            line_color: "#7A8AA6".to_string(),
            edge_label_background: "#FFFFFF".to_string(),
            edge_label_border: "#D5DBE5".to_string(),
            cluster_background: "#F4F7FB".to_string(),
            cluster_border: "#8C9BB5".to_string(),
            background: "#FFFFFF".to_string(),
            icon_text_color: "#FFFFFF".to_string(),
            network_color: "#8C4FFF".to_string(),
            compute_color: "#ED7100".to_string(),
            storage_color: "#7AA116".to_string(),
            management_color: "#E7157B".to_string(),
        }
    }

    pub fn mono() -> Self {
        Self {
            font_family: "\"trebuchet ms\", verdana, arial, sans-serif".to_string(),
            font_size: 14.0,
            title_font_size: 20.0,
            text_color: "#333333".to_string(),
            line_color: "#333333".to_string(),
            edge_label_background: "#E8E8E8".to_string(),
            edge_label_border: "#999999".to_string(),
            cluster_background: "#FAFAFA".to_string(),
            cluster_border: "#666666".to_string(),
            background: "#FFFFFF".to_string(),
            icon_text_color: "#FFFFFF".to_string(),
            network_color: "#555555".to_string(),
            compute_color: "#333333".to_string(),
            storage_color: "#777777".to_string(),
            management_color: "#444444".to_string(),
        }
    }

    pub fn by_name(name: &str) -> Option<Self> {
        match name {
            "aws" | "default" => Some(Self::aws()),
            "mono" | "monochrome" => Some(Self::mono()),
            _ => None,
        }
    }

    pub fn category_color(&self, category: Category) -> &str {
        match category {
            Category::Network => &self.network_color,
            Category::Compute => &self.compute_color,
            Category::Storage => &self.storage_color,
            Category::Management => &self.management_color,
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::aws()
    }
}

/// Darkens a `#RRGGBB` color by `amount` (0.0..=1.0). Other formats pass through.
pub fn darken(color: &str, amount: f32) -> String {
    let Some(hex) = color.strip_prefix('#') else {
        return color.to_string();
    };
    if hex.len() != 6 {
        return color.to_string();
    }
    let Ok(value) = u32::from_str_radix(hex, 16) else {
        return color.to_string();
    };
    let factor = 1.0 - amount.clamp(0.0, 1.0);
    let channel = |shift: u32| (((value >> shift) & 0xFF) as f32 * factor).round() as u32;
    format!("#{:02X}{:02X}{:02X}", channel(16), channel(8), channel(0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn darken_scales_channels() {
        assert_eq!(darken("#FFFFFF", 0.5), "#808080");
        assert_eq!(darken("#102030", 0.0), "#102030");
        assert_eq!(darken("hsl(0, 0%, 0%)", 0.3), "hsl(0, 0%, 0%)");
    }

    #[test]
    fn themes_by_name() {
        assert!(Theme::by_name("aws").is_some());
        assert!(Theme::by_name("mono").is_some());
        assert!(Theme::by_name("neon").is_none());
    }

    #[test]
    fn categories_have_distinct_colors() {
        let theme = Theme::aws();
        let colors = [
            theme.category_color(Category::Network),
            theme.category_color(Category::Compute),
            theme.category_color(Category::Storage),
            theme.category_color(Category::Management),
        ];
        for (i, a) in colors.iter().enumerate() {
            for b in &colors[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
