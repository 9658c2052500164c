use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::LayoutConfig;
use crate::text_metrics;
use crate::theme::Theme;

use super::TextBlock;

static BREAK_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<br\s*/?>|\\n").unwrap());

pub(super) fn measure_label(text: &str, theme: &Theme, config: &LayoutConfig) -> TextBlock {
    measure_label_with_font_size(text, theme.font_size, config, true, &theme.font_family)
}

pub(super) fn measure_label_with_font_size(
    text: &str,
    font_size: f32,
    config: &LayoutConfig,
    wrap: bool,
    font_family: &str,
) -> TextBlock {
    let fast_metrics = config.fast_text_metrics;
    let max_width_px = average_char_width(font_family, font_size, fast_metrics)
        * config.max_label_width_chars.max(1) as f32;

    let mut lines = Vec::new();
    for line in split_lines(text) {
        if wrap {
            lines.extend(wrap_line(&line, max_width_px, font_size, font_family, fast_metrics));
        } else {
            lines.push(line);
        }
    }
    if lines.is_empty() {
        lines.push(String::new());
    }

    let width = lines
        .iter()
        .map(|line| text_width(line, font_size, font_family, fast_metrics))
        .fold(0.0, f32::max);
    let height = lines.len() as f32 * font_size * config.label_line_height;

    TextBlock {
        lines,
        width,
        height,
    }
}

pub(super) fn char_width_factor(ch: char) -> f32 {
    // Relative advances of a typical sans-serif face at 1px.
    match ch {
        ' ' => 0.306,
        '\\' | '.' | ',' | ':' | ';' | '|' | '!' | '(' | ')' | '[' | ']' | '{' | '}' => 0.321,
        'I' | 'i' | 'j' | 'l' => 0.25,
        'f' | 't' | 'r' => 0.34,
        'M' | 'W' | 'm' | 'w' => 0.87,
        'A'..='Z' => 0.66,
        'a'..='z' => 0.56,
        '1' => 0.4,
        '0'..='9' => 0.6,
        '@' | '#' | '%' | '&' => 0.946,
        _ => 0.568,
    }
}

pub(super) fn split_lines(text: &str) -> Vec<String> {
    BREAK_RE
        .replace_all(text, "\n")
        .split('\n')
        .map(|line| line.trim().to_string())
        .collect()
}

/// Greedy word wrap. Words wider than `max_width` on their own (long
/// hostnames, CIDR lists without spaces) are cut at character boundaries.
pub(super) fn wrap_line(
    line: &str,
    max_width: f32,
    font_size: f32,
    font_family: &str,
    fast_metrics: bool,
) -> Vec<String> {
    let fits = |text: &str| text_width(text, font_size, font_family, fast_metrics) <= max_width;
    if fits(line) {
        return vec![line.to_string()];
    }

    let mut lines = Vec::new();
    let mut current = String::new();
    for word in line.split_whitespace() {
        let joined = if current.is_empty() {
            word.to_string()
        } else {
            format!("{current} {word}")
        };
        if fits(&joined) {
            current = joined;
            continue;
        }
        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        for ch in word.chars() {
            current.push(ch);
            if current.chars().count() > 1 && !fits(&current) {
                current.pop();
                lines.push(std::mem::replace(&mut current, ch.to_string()));
            }
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

pub(super) fn text_width(text: &str, font_size: f32, font_family: &str, fast_metrics: bool) -> f32 {
    if fast_metrics {
        return fallback_text_width(text, font_size);
    }
    text_metrics::measure_text_width(text, font_size, font_family)
        .unwrap_or_else(|| fallback_text_width(text, font_size))
}

fn fallback_text_width(text: &str, font_size: f32) -> f32 {
    text.chars().map(char_width_factor).sum::<f32>() * font_size
}

fn average_char_width(font_family: &str, font_size: f32, fast_metrics: bool) -> f32 {
    if fast_metrics {
        return font_size * 0.56;
    }
    text_metrics::average_char_width(font_family, font_size).unwrap_or(font_size * 0.56)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_config() -> LayoutConfig {
        LayoutConfig {
            fast_text_metrics: true,
            ..LayoutConfig::default()
        }
    }

    #[test]
    fn split_lines_handles_breaks() {
        assert_eq!(split_lines("a<br/>b"), vec!["a", "b"]);
        assert_eq!(split_lines("a<BR>b"), vec!["a", "b"]);
        assert_eq!(split_lines("a<br />b"), vec!["a", "b"]);
        assert_eq!(split_lines("a\\nb"), vec!["a", "b"]);
        assert_eq!(split_lines("Internet\n(Users)"), vec!["Internet", "(Users)"]);
    }

    #[test]
    fn split_lines_trims_whitespace() {
        assert_eq!(split_lines("  hello  \n  world  "), vec!["hello", "world"]);
    }

    #[test]
    fn fallback_text_width_scales_with_font_size() {
        let w16 = fallback_text_width("Nginx", 16.0);
        let w32 = fallback_text_width("Nginx", 32.0);
        assert!((w32 - w16 * 2.0).abs() < 0.01);
    }

    #[test]
    fn wrap_line_keeps_short_text() {
        assert_eq!(wrap_line("ECR Nginx", 1000.0, 16.0, "sans-serif", true).len(), 1);
    }

    #[test]
    fn wrap_line_splits_long_text() {
        let result = wrap_line(
            "Private Subnets (10.0.100.0/24, 10.0.101.0/24) with a long tail",
            100.0,
            16.0,
            "sans-serif",
            true,
        );
        assert!(result.len() > 1, "expected wrapping, got {result:?}");
        assert!(result.iter().all(|line| !line.is_empty()));
    }

    #[test]
    fn wrap_line_cuts_overlong_words() {
        let word = "10.0.0.0/24,10.0.1.0/24,10.0.100.0/24";
        let result = wrap_line(word, 60.0, 16.0, "sans-serif", true);
        assert!(result.len() > 1, "expected hard breaks, got {result:?}");
        assert_eq!(result.concat(), word);
        for line in &result {
            assert!(fallback_text_width(line, 16.0) <= 60.0 || line.chars().count() == 1);
        }
    }

    #[test]
    fn multi_line_label_height_counts_lines() {
        let theme = Theme::aws();
        let config = fast_config();
        let block = measure_label("HAProxy\nCPU: 256, Mem: 512MB\nDesired: 1", &theme, &config);
        assert_eq!(block.lines.len(), 3);
        let expected = 3.0 * theme.font_size * config.label_line_height;
        assert!((block.height - expected).abs() < 0.01);
        assert!(block.width > 0.0);
    }

    #[test]
    fn empty_label_is_single_line() {
        let block = measure_label("", &Theme::aws(), &fast_config());
        assert_eq!(block.lines.len(), 1);
    }
}
