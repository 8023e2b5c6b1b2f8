use ab_glyph::{FontArc, PxScale};
use image::{GrayImage, Pixel, Rgba, RgbaImage};
use imageproc::drawing::draw_text_mut;
use tiny_skia::{FillRule, Paint, PathBuilder, Pixmap, Rect, Stroke, StrokeDash, Transform};

use crate::color::Color;
use crate::error::{DrawError, DrawResult};
use crate::geometry::{Point, RectData};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LineStyle {
    #[default]
    Solid,
    Dashed,
    Dotted,
    DashDot,
}

impl LineStyle {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "-" | "solid" => Some(Self::Solid),
            "--" | "dashed" => Some(Self::Dashed),
            ":" | "dotted" => Some(Self::Dotted),
            "-." | "dashdot" => Some(Self::DashDot),
            _ => None,
        }
    }

    fn dash(self, width: f32) -> Option<StrokeDash> {
        let unit = width.max(1.0);
        let intervals = match self {
            Self::Solid => return None,
            Self::Dashed => vec![4.0 * unit, 2.0 * unit],
            Self::Dotted => vec![unit, unit],
            Self::DashDot => vec![4.0 * unit, 2.0 * unit, unit, 2.0 * unit],
        };
        StrokeDash::new(intervals, 0.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pen {
    pub color: Color,
    pub width: f32,
    pub style: LineStyle,
}

impl Pen {
    pub fn new(color: Color, width: f32) -> Self {
        Self {
            color,
            width,
            style: LineStyle::Solid,
        }
    }

    pub fn with_style(mut self, style: LineStyle) -> Self {
        self.style = style;
        self
    }

    fn stroke(&self) -> Stroke {
        Stroke {
            width: self.width,
            dash: self.style.dash(self.width),
            ..Default::default()
        }
    }
}

pub struct Surface {
    image: RgbaImage,
    layer: Option<Pixmap>,
}

impl Surface {
    pub fn new(image: RgbaImage) -> Self {
        Self { image, layer: None }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn into_image(mut self) -> RgbaImage {
        self.flush();
        self.image
    }

    /// Fills the pixels covered by an inclusive pixel rectangle `[min, max]`.
    pub fn fill_rect(&mut self, rect: RectData, color: Color) -> DrawResult<()> {
        let rect = rect.normalize();
        self.fill_area(
            RectData::from_ltrb(rect.min.x, rect.min.y, rect.max.x + 1.0, rect.max.y + 1.0),
            color,
        )
    }

    /// Fills the continuous area `[min, max)`.
    pub fn fill_area(&mut self, area: RectData, color: Color) -> DrawResult<()> {
        let area = area.normalize();
        let Some(area) = Rect::from_ltrb(area.min.x, area.min.y, area.max.x, area.max.y) else {
            return Ok(());
        };
        let paint = paint(color, false);
        self.layer()?
            .fill_rect(area, &paint, Transform::identity(), None);
        Ok(())
    }

    /// Outlines an inclusive pixel rectangle with the border growing inwards.
    pub fn stroke_rect(&mut self, rect: RectData, pen: &Pen) -> DrawResult<()> {
        let rect = rect.normalize();
        let half = pen.width / 2.0;
        let (left, top) = (rect.min.x + half, rect.min.y + half);
        let (right, bottom) = (rect.max.x + 1.0 - half, rect.max.y + 1.0 - half);
        if pen.width <= 0.0 {
            return Ok(());
        }
        if right <= left || bottom <= top {
            return self.fill_rect(rect, pen.color);
        }
        let area = Rect::from_ltrb(left, top, right, bottom)
            .ok_or_else(|| DrawError::Raster("invalid rectangle".to_string()))?;
        let path = PathBuilder::from_rect(area);
        let paint = paint(pen.color, false);
        self.layer()?
            .stroke_path(&path, &paint, &pen.stroke(), Transform::identity(), None);
        Ok(())
    }

    pub fn polyline(&mut self, points: &[Point], pen: &Pen) -> DrawResult<()> {
        if points.len() < 2 || pen.width <= 0.0 {
            return Ok(());
        }
        let mut pb = PathBuilder::new();
        pb.move_to(points[0].x, points[0].y);
        for point in &points[1..] {
            pb.line_to(point.x, point.y);
        }
        let Some(path) = pb.finish() else {
            return Ok(());
        };
        let paint = paint(pen.color, true);
        self.layer()?
            .stroke_path(&path, &paint, &pen.stroke(), Transform::identity(), None);
        Ok(())
    }

    pub fn fill_polygon(&mut self, points: &[Point], color: Color) -> DrawResult<()> {
        if points.len() < 3 {
            return Ok(());
        }
        let mut pb = PathBuilder::new();
        pb.move_to(points[0].x, points[0].y);
        for point in &points[1..] {
            pb.line_to(point.x, point.y);
        }
        pb.close();
        let Some(path) = pb.finish() else {
            return Ok(());
        };
        let paint = paint(color, true);
        self.layer()?
            .fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
        Ok(())
    }

    pub fn ellipse(
        &mut self,
        bounds: RectData,
        fill: Option<Color>,
        outline: Option<&Pen>,
    ) -> DrawResult<()> {
        let bounds = bounds.normalize();
        let Some(oval) = Rect::from_ltrb(bounds.min.x, bounds.min.y, bounds.max.x, bounds.max.y)
        else {
            return Ok(());
        };
        let Some(path) = PathBuilder::from_oval(oval) else {
            return Ok(());
        };
        if let Some(color) = fill {
            let paint = paint(color, true);
            self.layer()?
                .fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
        }
        if let Some(pen) = outline.filter(|pen| pen.width > 0.0) {
            let paint = paint(pen.color, true);
            self.layer()?
                .stroke_path(&path, &paint, &pen.stroke(), Transform::identity(), None);
        }
        Ok(())
    }

    pub fn text(
        &mut self,
        origin: Point,
        text: &str,
        color: Color,
        font_size: f32,
        font: Option<&FontArc>,
    ) {
        let Some(font) = font else {
            log::debug!(target: "raster", "no font, skipping text '{text}'");
            return;
        };
        self.flush();
        draw_text_mut(
            &mut self.image,
            color.to_rgba(),
            origin.x.round() as i32,
            origin.y.round() as i32,
            PxScale::from(font_size),
            font,
            text,
        );
    }

    pub fn composite_mask(&mut self, mask: &GrayImage, color: Color) -> DrawResult<()> {
        if mask.dimensions() != self.image.dimensions() {
            return Err(DrawError::MaskSize {
                mask_width: mask.width(),
                mask_height: mask.height(),
                width: self.image.width(),
                height: self.image.height(),
            });
        }
        self.flush();
        for (pixel, level) in self.image.pixels_mut().zip(mask.pixels()) {
            let alpha = level.0[0] as u32 * color.alpha() as u32 / 255;
            if alpha == 0 {
                continue;
            }
            let [r, g, b, _] = color.0;
            pixel.blend(&Rgba([r, g, b, alpha as u8]));
        }
        Ok(())
    }

    fn layer(&mut self) -> DrawResult<&mut Pixmap> {
        if self.layer.is_none() {
            let pixmap = Pixmap::new(self.image.width(), self.image.height())
                .ok_or_else(|| DrawError::Raster("cannot allocate pixmap".to_string()))?;
            self.layer = Some(pixmap);
        }
        self.layer
            .as_mut()
            .ok_or_else(|| DrawError::Raster("cannot allocate pixmap".to_string()))
    }

    fn flush(&mut self) {
        let Some(layer) = self.layer.take() else {
            return;
        };
        for (pixel, source) in self.image.pixels_mut().zip(layer.pixels()) {
            if source.alpha() == 0 {
                continue;
            }
            let source = source.demultiply();
            pixel.blend(&Rgba([
                source.red(),
                source.green(),
                source.blue(),
                source.alpha(),
            ]));
        }
    }
}

fn paint(color: Color, anti_alias: bool) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(color.0[0], color.0[1], color.0[2], color.0[3]);
    paint.anti_alias = anti_alias;
    paint
}
