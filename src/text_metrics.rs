//! Text width measurement, injected into layout as a capability.

use crate::theme::Theme;

/// Width of a single line of text in layout units.
pub trait TextMeasure {
    fn measure(&self, text: &str, font: &Theme) -> f32;
}

impl<F> TextMeasure for F
where
    F: Fn(&str, &Theme) -> f32,
{
    fn measure(&self, text: &str, font: &Theme) -> f32 {
        self(text, font)
    }
}

/// Per-character width table; no font files involved.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicMeasurer;

impl TextMeasure for HeuristicMeasurer {
    fn measure(&self, text: &str, font: &Theme) -> f32 {
        fallback_text_width(text, font.font_size)
    }
}

pub(crate) fn fallback_text_width(text: &str, font_size: f32) -> f32 {
    if font_size <= 0.0 {
        return 0.0;
    }
    let text = text.replace('\t', "    ");
    text.chars()
        .filter(|ch| *ch != '\n')
        .map(char_width_factor)
        .sum::<f32>()
        * font_size
}

pub(crate) fn char_width_factor(ch: char) -> f32 {
    // Calibrated against a sans-serif stack at a 16px baseline.
    match ch {
        ' ' => 0.306,
        '\\' | '.' | ',' | ':' | ';' | '|' | '!' | '(' | ')' | '[' | ']' | '{' | '}' => 0.321,
        'A' | 'B' | 'K' => 0.650,
        'C' | 'D' | 'O' | 'Q' | 'U' => 0.740,
        'E' | 'F' | 'L' | 'T' | 'Z' => 0.590,
        'G' | 'H' | 'N' => 0.750,
        'I' => 0.272,
        'J' => 0.557,
        'M' => 0.903,
        'P' | 'R' | 'S' => 0.630,
        'V' | 'X' | 'Y' => 0.655,
        'W' => 0.958,
        'f' => 0.340,
        'i' | 'j' | 'l' => 0.235,
        'm' => 0.867,
        'r' => 0.364,
        't' => 0.305,
        'w' => 0.811,
        'a'..='z' => 0.570,
        '1' => 0.396,
        '0'..='9' => 0.605,
        '@' | '#' | '%' | '&' => 0.946,
        _ if !ch.is_ascii() && is_wide(ch) => 1.0,
        _ => 0.568,
    }
}

fn is_wide(ch: char) -> bool {
    matches!(ch as u32,
        0x1100..=0x115F
        | 0x2E80..=0xA4CF
        | 0xAC00..=0xD7A3
        | 0xF900..=0xFAFF
        | 0xFE30..=0xFE4F
        | 0xFF00..=0xFF60
        | 0xFFE0..=0xFFE6
        | 0x1F300..=0x1FAFF)
}

#[cfg(feature = "system-fonts")]
pub use system::FontMeasurer;

#[cfg(feature = "system-fonts")]
mod system {
    use std::cell::RefCell;
    use std::collections::HashMap;

    use fontdb::{Database, Family, Query, Stretch, Style, Weight};
    use once_cell::unsync::OnceCell;
    use ttf_parser::Face;

    use super::{TextMeasure, char_width_factor};
    use crate::theme::Theme;

    /// Sums glyph advances of the first installed font matching the theme's
    /// family list. Falls back to the width table when nothing resolves.
    ///
    /// System fonts are scanned on first use and kept for the lifetime of
    /// the measurer; faces are cached per family string.
    #[derive(Default)]
    pub struct FontMeasurer {
        db: OnceCell<Database>,
        faces: RefCell<HashMap<String, Option<FontFace>>>,
    }

    impl FontMeasurer {
        pub fn new() -> Self {
            Self::default()
        }

        fn database(&self) -> &Database {
            self.db.get_or_init(|| {
                let mut db = Database::new();
                db.load_system_fonts();
                tracing::debug!(faces = db.len(), "loaded system fonts");
                db
            })
        }

        fn load_face(&self, font_family: &str) -> Option<FontFace> {
            let names: Vec<String> = font_family
                .split(',')
                .map(|part| part.trim().trim_matches('"').trim_matches('\'').to_string())
                .filter(|name| !name.is_empty())
                .collect();
            let mut families: Vec<Family<'_>> = names
                .iter()
                .map(|name| match name.to_ascii_lowercase().as_str() {
                    "serif" => Family::Serif,
                    "sans-serif" | "system-ui" | "-apple-system" | "ui-sans-serif" => {
                        Family::SansSerif
                    }
                    "monospace" | "ui-monospace" => Family::Monospace,
                    "cursive" => Family::Cursive,
                    "fantasy" => Family::Fantasy,
                    _ => Family::Name(name.as_str()),
                })
                .collect();
            if families.is_empty() {
                families.push(Family::SansSerif);
            }

            let db = self.database();
            let query = Query {
                families: &families,
                weight: Weight::NORMAL,
                stretch: Stretch::Normal,
                style: Style::Normal,
            };
            let id = db.query(&query)?;
            db.with_face_data(id, |data, index| FontFace::parse(data.to_vec(), index))
                .flatten()
        }
    }

    impl TextMeasure for FontMeasurer {
        fn measure(&self, text: &str, font: &Theme) -> f32 {
            if text.is_empty() || font.font_size <= 0.0 {
                return 0.0;
            }
            let key = normalize_family_key(&font.font_family);
            let mut faces = self.faces.borrow_mut();
            let face = faces
                .entry(key)
                .or_insert_with(|| self.load_face(&font.font_family));
            match face {
                Some(face) => face.measure_width(text, font.font_size),
                None => super::fallback_text_width(text, font.font_size),
            }
        }
    }

    struct FontFace {
        data: Vec<u8>,
        index: u32,
        units_per_em: u16,
        ascii_advances: [u16; 128],
    }

    impl FontFace {
        fn parse(data: Vec<u8>, index: u32) -> Option<Self> {
            let face = Face::parse(&data, index).ok()?;
            let units_per_em = face.units_per_em().max(1);
            let mut ascii_advances = [0u16; 128];
            for byte in 0u8..=127 {
                if let Some(glyph) = face.glyph_index(byte as char) {
                    ascii_advances[byte as usize] = face.glyph_hor_advance(glyph).unwrap_or(0);
                }
            }
            Some(Self {
                data,
                index,
                units_per_em,
                ascii_advances,
            })
        }

        fn measure_width(&self, text: &str, font_size: f32) -> f32 {
            let scale = font_size / self.units_per_em as f32;
            let text = text.replace('\t', "    ");

            if text.is_ascii() {
                return text
                    .bytes()
                    .filter(|byte| *byte != b'\n')
                    .map(|byte| match self.ascii_advances[byte as usize] {
                        0 => char_width_factor(byte as char) * font_size,
                        advance => advance as f32 * scale,
                    })
                    .sum::<f32>()
                    .max(0.0);
            }

            let Ok(face) = Face::parse(&self.data, self.index) else {
                return super::fallback_text_width(&text, font_size);
            };
            text.chars()
                .filter(|ch| *ch != '\n')
                .map(|ch| {
                    face.glyph_index(ch)
                        .and_then(|glyph| face.glyph_hor_advance(glyph))
                        .map(|advance| advance as f32 * scale)
                        .unwrap_or_else(|| char_width_factor(ch) * font_size)
                })
                .sum::<f32>()
                .max(0.0)
        }
    }

    fn normalize_family_key(font_family: &str) -> String {
        let trimmed = font_family.trim();
        if trimmed.is_empty() {
            "sans-serif".to_string()
        } else {
            trimmed.to_string()
        }
    }
}
