use std::collections::HashMap;

use ab_glyph::{FontArc, PxScale};
use imageproc::drawing::text_size;

use crate::geometry::Size;

const SYSTEM_FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial Unicode.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/System/Library/Fonts/SFNS.ttf",
    "/System/Library/Fonts/Supplemental/Helvetica.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

#[derive(Default)]
pub struct FontCache {
    by_path: HashMap<String, Option<FontArc>>,
    system: Option<Option<FontArc>>,
}

impl FontCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resolve(&mut self, path: Option<&str>) -> Option<FontArc> {
        if let Some(path) = path {
            let font = self
                .by_path
                .entry(path.to_string())
                .or_insert_with(|| {
                    let font = load_font(path);
                    if font.is_none() {
                        log::warn!(target: "fonts", "cannot load font {path}, using system font");
                    }
                    font
                })
                .clone();
            if font.is_some() {
                return font;
            }
        }
        self.system
            .get_or_insert_with(|| {
                let font = SYSTEM_FONT_CANDIDATES.iter().find_map(|path| load_font(path));
                if font.is_none() {
                    log::warn!(target: "fonts", "no system font found, text glyphs will be skipped");
                }
                font
            })
            .clone()
    }
}

fn load_font(path: &str) -> Option<FontArc> {
    let bytes = std::fs::read(path).ok()?;
    FontArc::try_from_vec(bytes).ok()
}

pub fn measure(font: Option<&FontArc>, font_size: f32, text: &str) -> Size {
    match font {
        Some(font) => {
            let (width, height) = text_size(PxScale::from(font_size), font, text);
            Size::new(width as f32, height as f32)
        }
        None => estimate(font_size, text),
    }
}

fn estimate(font_size: f32, text: &str) -> Size {
    let chars = text.chars().count() as f32;
    Size::new(chars * font_size * 0.6, font_size * 1.4)
}
