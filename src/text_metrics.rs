use fontdb::{Database, Family, Query, Stretch, Style, Weight};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::Mutex;
use ttf_parser::Face;

static TEXT_MEASURER: Lazy<Mutex<TextMeasurer>> = Lazy::new(|| Mutex::new(TextMeasurer::new()));

/// Width of `text` in pixels using the first installed font of `font_family`.
///
/// Returns `None` when no matching font is available, so callers can fall
/// back to a heuristic.
pub fn measure_text_width(text: &str, font_size: f32, font_family: &str) -> Option<f32> {
    if text.is_empty() || font_size <= 0.0 {
        return Some(0.0);
    }
    let mut guard = TEXT_MEASURER.lock().ok()?;
    guard.measure(text, font_size, font_family)
}

pub fn average_char_width(font_family: &str, font_size: f32) -> Option<f32> {
    if font_size <= 0.0 {
        return None;
    }
    let sample = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";
    let width = measure_text_width(sample, font_size, font_family)?;
    Some(width / sample.chars().count() as f32)
}

struct TextMeasurer {
    db: Database,
    loaded_system_fonts: bool,
    faces: HashMap<String, Option<FontMetrics>>,
}

impl TextMeasurer {
    fn new() -> Self {
        Self {
            db: Database::new(),
            loaded_system_fonts: false,
            faces: HashMap::new(),
        }
    }

    fn measure(&mut self, text: &str, font_size: f32, font_family: &str) -> Option<f32> {
        let key = normalize_family_key(font_family);
        if !self.faces.contains_key(&key) {
            let metrics = self.load(&key);
            if metrics.is_none() {
                log::debug!(family = key.as_str(); "No font found, using fallback widths");
            }
            self.faces.insert(key.clone(), metrics);
        }
        let metrics = self.faces.get_mut(&key)?.as_mut()?;
        Some(metrics.width(text, font_size))
    }

    fn load(&mut self, font_family: &str) -> Option<FontMetrics> {
        let names: Vec<String> = font_family
            .split(',')
            .map(|part| part.trim().trim_matches('"').trim_matches('\'').to_string())
            .filter(|part| !part.is_empty())
            .collect();
        let mut families: Vec<Family<'_>> = names
            .iter()
            .map(|name| match name.to_ascii_lowercase().as_str() {
                "serif" => Family::Serif,
                "monospace" | "ui-monospace" => Family::Monospace,
                "sans-serif" | "system-ui" | "-apple-system" | "ui-sans-serif" => {
                    Family::SansSerif
                }
                _ => Family::Name(name.as_str()),
            })
            .collect();
        if families.is_empty() {
            families.push(Family::SansSerif);
        }

        if !self.loaded_system_fonts {
            self.db.load_system_fonts();
            self.loaded_system_fonts = true;
        }

        let id = self.db.query(&Query {
            families: &families,
            weight: Weight::NORMAL,
            stretch: Stretch::Normal,
            style: Style::Normal,
        })?;
        self.db
            .with_face_data(id, |data, index| FontMetrics::parse(data, index))
            .flatten()
    }
}

/// Horizontal advances extracted from a font face, in font units.
struct FontMetrics {
    units_per_em: f32,
    advances: HashMap<char, Option<u16>>,
    data: Vec<u8>,
    index: u32,
}

impl FontMetrics {
    fn parse(data: &[u8], index: u32) -> Option<Self> {
        let face = Face::parse(data, index).ok()?;
        let mut advances = HashMap::new();
        for ch in (0x20u8..0x7F).map(char::from) {
            advances.insert(ch, advance_of(&face, ch));
        }
        Some(Self {
            units_per_em: f32::from(face.units_per_em().max(1)),
            advances,
            data: data.to_vec(),
            index,
        })
    }

    fn width(&mut self, text: &str, font_size: f32) -> f32 {
        let scale = font_size / self.units_per_em;
        let fallback = font_size * 0.56;
        let missing: Vec<char> = text
            .chars()
            .filter(|ch| !self.advances.contains_key(ch))
            .collect();
        if !missing.is_empty()
            && let Ok(face) = Face::parse(&self.data, self.index)
        {
            for ch in missing {
                self.advances.insert(ch, advance_of(&face, ch));
            }
        }

        text.chars()
            .filter(|ch| *ch != '\n')
            .map(|ch| match self.advances.get(&ch).copied().flatten() {
                Some(advance) if advance > 0 => f32::from(advance) * scale,
                _ => fallback,
            })
            .sum()
    }
}

fn advance_of(face: &Face<'_>, ch: char) -> Option<u16> {
    let ch = if ch == '\t' { ' ' } else { ch };
    face.glyph_index(ch)
        .and_then(|glyph| face.glyph_hor_advance(glyph))
}

fn normalize_family_key(font_family: &str) -> String {
    let trimmed = font_family.trim();
    if trimmed.is_empty() {
        "sans-serif".to_string()
    } else {
        trimmed.to_string()
    }
}
