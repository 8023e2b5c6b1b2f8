use std::path::Path;
use std::str::FromStr;

use ab_glyph::FontArc;
use image::DynamicImage;

use crate::color::Color;
use crate::display::Display;
use crate::error::{DrawError, DrawResult};
use crate::fonts::{self, FontCache};
use crate::geometry::{
    arrow_tips, circle_bounds, get_anchor_coordinates, get_coordinates, Anchor, BoxPosition,
    ImageAlignment, Point, RectData, Size, ARROW_TIP_ANGLE,
};
use crate::picture::{restore_layout, Picture, PixelArray};
use crate::raster::{LineStyle, Pen, Surface};
use crate::registry::StyleRegistry;
use crate::style::{Attributes, StyleField, StyleParameters, UnknownField};
use crate::style_file::{self, StyleBook};

pub const DEFAULT_MARGIN: f32 = 10.0;
pub const DEFAULT_FONT_SIZE: f32 = 14.0;
pub const DEFAULT_THICKNESS: f32 = 1.0;
pub const DEFAULT_POINT_RADIUS: f32 = 3.0;
pub const DEFAULT_TIP_LENGTH: f32 = 10.0;
pub const LABEL_OFFSET: f32 = 10.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DrawerOptions {
    pub return_array: bool,
    /// Coordinates are fractions of the image size. Not supported yet: coordinates are
    /// always read as pixels and a warning is logged.
    pub normalized: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Labels {
    Numbers,
    NumbersFromZero,
    Letters,
    Explicit(Vec<String>),
}

impl Labels {
    pub fn generate(&self, count: usize) -> Vec<String> {
        match self {
            Self::Numbers => (1..=count).map(|n| n.to_string()).collect(),
            Self::NumbersFromZero => (0..count).map(|n| n.to_string()).collect(),
            Self::Letters => (0..count).map(letters).collect(),
            Self::Explicit(labels) => labels.iter().take(count).cloned().collect(),
        }
    }
}

impl FromStr for Labels {
    type Err = DrawError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        match token {
            "numbers" => Ok(Self::Numbers),
            "numbers-0" => Ok(Self::NumbersFromZero),
            "letters" => Ok(Self::Letters),
            other => Err(DrawError::InvalidValue {
                field: "labels",
                reason: format!("unknown label generator '{other}'"),
            }),
        }
    }
}

fn letters(mut index: usize) -> String {
    let mut out = Vec::new();
    loop {
        out.push(b'a' + (index % 26) as u8);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    out.reverse();
    String::from_utf8_lossy(&out).into_owned()
}

#[derive(Clone, Debug, Default)]
pub struct BoxOptions<'a> {
    pub label: Option<&'a str>,
    pub position: Option<&'a str>,
    pub inner: Option<bool>,
    pub color: Option<Color>,
    pub text_color: Option<Color>,
    pub font_size: Option<f32>,
    pub margin: Option<f32>,
    pub style: Option<&'a str>,
}

#[derive(Clone, Debug, Default)]
pub struct TextOptions<'a> {
    pub font_size: Option<f32>,
    pub margin: Option<f32>,
    pub style: Option<&'a str>,
}

#[derive(Clone, Debug, Default)]
pub struct KeypointOptions<'a> {
    pub labels: Option<Labels>,
    pub font_size: Option<f32>,
    pub style: Option<&'a str>,
}

#[derive(Clone, Debug, Default)]
pub struct SegmentOptions<'a> {
    pub thickness: Option<f32>,
    pub style: Option<&'a str>,
}

#[derive(Clone, Debug, Default)]
pub struct PolygonOptions<'a> {
    pub draw_points: bool,
    pub style: Option<&'a str>,
}

#[derive(Clone, Debug, Default)]
pub struct ArrowOptions<'a> {
    pub filled: Option<bool>,
    pub tip_length: Option<f32>,
    pub style: Option<&'a str>,
}

#[derive(Clone, Debug, Default)]
pub struct MaskOptions<'a> {
    pub color: Option<Color>,
    pub style: Option<&'a str>,
}

#[derive(Default)]
pub struct Drawer {
    registry: StyleRegistry,
    options: DrawerOptions,
    fonts: FontCache,
    last_image: Option<DynamicImage>,
    snapshots: Vec<DynamicImage>,
}

impl Drawer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: DrawerOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    pub fn options(&self) -> DrawerOptions {
        self.options
    }

    pub fn set_return_array(&mut self, value: bool) {
        self.options.return_array = value;
    }

    pub fn set_normalized_coords(&mut self, value: bool) {
        self.options.normalized = value;
    }

    pub fn registry(&self) -> &StyleRegistry {
        &self.registry
    }

    pub fn add_style(&mut self, name: &str, attributes: &Attributes) -> Vec<UnknownField> {
        self.registry.add(name, attributes)
    }

    pub fn update_style(
        &mut self,
        name: &str,
        attributes: &Attributes,
    ) -> Option<Vec<UnknownField>> {
        self.registry.update(name, attributes)
    }

    pub fn update_current_style(&mut self, attributes: &Attributes) -> Option<Vec<UnknownField>> {
        self.registry.update_current(attributes)
    }

    pub fn set_style(&mut self, name: &str) -> bool {
        self.registry.select(name)
    }

    pub fn current_style(&self) -> Option<&str> {
        self.registry.current_name()
    }

    pub fn style(&self, name: &str) -> Option<&StyleParameters> {
        self.registry.get(name)
    }

    /// Runs `body` with `name` as the current style and restores the previous selection
    /// afterwards, whether `body` succeeds or fails.
    pub fn with_style<T>(
        &mut self,
        name: Option<&str>,
        body: impl FnOnce(&mut Self) -> DrawResult<T>,
    ) -> DrawResult<T> {
        let scope = self.registry.enter_override(name)?;
        let result = body(self);
        self.registry.exit_override(scope);
        result
    }

    pub fn dump_styles(&self, path: impl AsRef<Path>) -> DrawResult<()> {
        let book = StyleBook::from_registry(&self.registry)?;
        style_file::save(path.as_ref(), &book)
    }

    pub fn load_styles(&mut self, path: impl AsRef<Path>) -> DrawResult<Vec<UnknownField>> {
        let book = style_file::load(path.as_ref())?;
        book.apply(&mut self.registry)
    }

    pub fn bbox(
        &mut self,
        picture: impl Into<Picture>,
        tl: impl Into<Point>,
        br: impl Into<Point>,
        options: &BoxOptions<'_>,
    ) -> DrawResult<Picture> {
        let (tl, br) = (tl.into(), br.into());
        self.invoke(picture.into(), options.style, |painter| {
            painter.draw_box(tl, br, options)
        })
    }

    pub fn text(
        &mut self,
        picture: impl Into<Picture>,
        coords: impl Into<Point>,
        text: &str,
        options: &TextOptions<'_>,
    ) -> DrawResult<Picture> {
        let coords = coords.into();
        self.invoke(picture.into(), options.style, |painter| {
            let font_size = painter.font_size(options.font_size)?;
            let margin = options.margin.unwrap_or(DEFAULT_MARGIN);
            let font = painter.font()?;
            let size = fonts::measure(font.as_ref(), font_size, text);
            let anchor = Anchor::from_panel_origin(coords.x, coords.y, size, margin);
            let color = painter.text_color()?;
            painter.panel_and_text(&anchor, text, color, font_size, font.as_ref())
        })
    }

    pub fn text_anchor(
        &mut self,
        picture: impl Into<Picture>,
        alignment: &str,
        text: &str,
        options: &TextOptions<'_>,
    ) -> DrawResult<Picture> {
        let alignment = ImageAlignment::parse(alignment)?;
        self.invoke(picture.into(), options.style, |painter| {
            let font_size = painter.font_size(options.font_size)?;
            let margin = options.margin.unwrap_or(DEFAULT_MARGIN);
            let font = painter.font()?;
            let size = fonts::measure(font.as_ref(), font_size, text);
            let anchor = get_coordinates(painter.image_size(), size, alignment, margin);
            let color = painter.text_color()?;
            painter.panel_and_text(&anchor, text, color, font_size, font.as_ref())
        })
    }

    pub fn keypoints(
        &mut self,
        picture: impl Into<Picture>,
        points: &[Point],
        options: &KeypointOptions<'_>,
    ) -> DrawResult<Picture> {
        self.invoke(picture.into(), options.style, |painter| {
            painter.draw_keypoints(points, options.labels.as_ref(), options.font_size)
        })
    }

    pub fn skeleton(
        &mut self,
        picture: impl Into<Picture>,
        joints: &[Point],
        bones: &[Option<(usize, usize)>],
        options: &KeypointOptions<'_>,
    ) -> DrawResult<Picture> {
        self.invoke(picture.into(), options.style, |painter| {
            let pen = painter.required_line_pen(None)?;
            for bone in bones.iter().flatten() {
                let (start, end) = (joint(joints, bone.0)?, joint(joints, bone.1)?);
                painter.surface.polyline(&[start, end], &pen)?;
            }
            painter.draw_keypoints(joints, options.labels.as_ref(), options.font_size)
        })
    }

    pub fn segments(
        &mut self,
        picture: impl Into<Picture>,
        segments: &[Vec<Point>],
        options: &SegmentOptions<'_>,
    ) -> DrawResult<Picture> {
        self.invoke(picture.into(), options.style, |painter| {
            let pen = painter.required_line_pen(options.thickness)?;
            for segment in segments {
                painter.surface.polyline(segment, &pen)?;
            }
            Ok(())
        })
    }

    pub fn polygon(
        &mut self,
        picture: impl Into<Picture>,
        points: &[Point],
        options: &PolygonOptions<'_>,
    ) -> DrawResult<Picture> {
        self.invoke(picture.into(), options.style, |painter| {
            if let Some(fill) = painter.style.color(StyleField::BoxFillColor)? {
                painter.surface.fill_polygon(points, fill)?;
            }
            if let Some(pen) = painter.line_pen(None)? {
                if let Some(first) = points.first() {
                    let mut closed = points.to_vec();
                    closed.push(*first);
                    painter.surface.polyline(&closed, &pen)?;
                }
            }
            if options.draw_points {
                painter.draw_keypoints(points, None, None)?;
            }
            Ok(())
        })
    }

    pub fn arrow(
        &mut self,
        picture: impl Into<Picture>,
        points: &[Point],
        options: &ArrowOptions<'_>,
    ) -> DrawResult<Picture> {
        let [from, to] = points else {
            return Err(DrawError::InvalidValue {
                field: "points",
                reason: format!("an arrow needs 2 points, got {}", points.len()),
            });
        };
        let (from, to) = (*from, *to);
        self.invoke(picture.into(), options.style, |painter| {
            painter.draw_arrow(from, to, options)
        })
    }

    pub fn mask(
        &mut self,
        picture: impl Into<Picture>,
        mask: &DynamicImage,
        options: &MaskOptions<'_>,
    ) -> DrawResult<Picture> {
        let mask = mask.to_luma8();
        self.invoke(picture.into(), options.style, |painter| {
            let color = match options.color {
                Some(color) => color,
                None => painter
                    .style
                    .color(StyleField::MaskColor)?
                    .ok_or(DrawError::MissingAttribute("mask color"))?,
            };
            painter.surface.composite_mask(&mask, color)
        })
    }

    pub fn overlay(&mut self, picture: impl Into<Picture>, _text: &str, _position: &str) -> Picture {
        not_implemented("overlay");
        picture.into()
    }

    pub fn side_text(&mut self, picture: impl Into<Picture>, _text: &str, _side: &str) -> Picture {
        not_implemented("side_text");
        picture.into()
    }

    pub fn side_barplot(
        &mut self,
        picture: impl Into<Picture>,
        _values: &[f32],
        _side: &str,
    ) -> Picture {
        not_implemented("side_barplot");
        picture.into()
    }

    pub fn side_plot(&mut self, picture: impl Into<Picture>, _values: &[f32], _side: &str) -> Picture {
        not_implemented("side_plot");
        picture.into()
    }

    pub fn arrow_and_text(
        &mut self,
        picture: impl Into<Picture>,
        _label: &str,
        _points: &[Point],
    ) -> Picture {
        not_implemented("arrow_and_text");
        picture.into()
    }

    pub fn last_image(&self) -> Option<&DynamicImage> {
        self.last_image.as_ref()
    }

    pub fn snapshot(&mut self) -> bool {
        match &self.last_image {
            Some(image) => {
                self.snapshots.push(image.clone());
                true
            }
            None => {
                log::warn!(target: "drawer", "nothing drawn yet, no snapshot taken");
                false
            }
        }
    }

    pub fn snapshots(&self) -> &[DynamicImage] {
        &self.snapshots
    }

    pub fn show_snapshots(&self, display: &mut dyn Display) -> anyhow::Result<()> {
        for image in &self.snapshots {
            display.show(image)?;
        }
        display.finish()
    }

    pub fn show(&self, picture: &Picture, display: &mut dyn Display) -> anyhow::Result<()> {
        display.show(&picture.to_image()?)?;
        display.finish()
    }

    fn invoke<F>(&mut self, picture: Picture, style: Option<&str>, op: F) -> DrawResult<Picture>
    where
        F: FnOnce(&mut Painter<'_>) -> DrawResult<()>,
    {
        if self.options.normalized {
            log::warn!(target: "drawer", "normalized coordinates are not supported, reading pixels");
        }
        self.with_style(style, |drawer| drawer.render(picture, op))
    }

    fn render<F>(&mut self, picture: Picture, op: F) -> DrawResult<Picture>
    where
        F: FnOnce(&mut Painter<'_>) -> DrawResult<()>,
    {
        let original = picture.into_image()?;
        let style = self.registry.active()?;
        let mut painter = Painter {
            style,
            fonts: &mut self.fonts,
            surface: Surface::new(original.to_rgba8()),
        };
        op(&mut painter)?;
        let drawn = restore_layout(painter.surface.into_image(), &original);

        let output = if self.options.return_array {
            Picture::Array(PixelArray::from_image(&drawn))
        } else {
            Picture::Native(drawn.clone())
        };
        self.last_image = Some(drawn);
        Ok(output)
    }
}

fn not_implemented(operation: &str) {
    log::warn!(target: "drawer", "{operation} is not implemented, image left unchanged");
}

fn joint(joints: &[Point], index: usize) -> DrawResult<Point> {
    joints.get(index).copied().ok_or_else(|| DrawError::InvalidValue {
        field: "bones",
        reason: format!("joint {index} out of range for {} joints", joints.len()),
    })
}

struct Painter<'a> {
    style: &'a StyleParameters,
    fonts: &'a mut FontCache,
    surface: Surface,
}

impl Painter<'_> {
    fn image_size(&self) -> Size {
        Size::new(self.surface.width() as f32, self.surface.height() as f32)
    }

    fn thickness(&self) -> DrawResult<f32> {
        Ok(self
            .style
            .integer(StyleField::LineThickness)?
            .map_or(DEFAULT_THICKNESS, |value| value as f32))
    }

    fn line_style(&self) -> DrawResult<LineStyle> {
        match self.style.text(StyleField::LineStyle)? {
            None => Ok(LineStyle::Solid),
            Some(value) => LineStyle::parse(value).ok_or_else(|| DrawError::InvalidValue {
                field: StyleField::LineStyle.label(),
                reason: format!("unknown line style '{value}'"),
            }),
        }
    }

    fn line_pen(&self, thickness: Option<f32>) -> DrawResult<Option<Pen>> {
        let Some(color) = self.style.color(StyleField::LineColor)? else {
            return Ok(None);
        };
        let width = match thickness {
            Some(width) => width,
            None => self.thickness()?,
        };
        Ok(Some(Pen::new(color, width).with_style(self.line_style()?)))
    }

    fn required_line_pen(&self, thickness: Option<f32>) -> DrawResult<Pen> {
        self.line_pen(thickness)?
            .ok_or(DrawError::MissingAttribute(StyleField::LineColor.label()))
    }

    fn font_size(&self, requested: Option<f32>) -> DrawResult<f32> {
        if let Some(size) = requested {
            return Ok(size);
        }
        Ok(self
            .style
            .integer(StyleField::TextFontSize)?
            .map_or(DEFAULT_FONT_SIZE, |size| size as f32))
    }

    fn text_color(&self) -> DrawResult<Color> {
        Ok(self
            .style
            .color(StyleField::TextColor)?
            .unwrap_or(Color::WHITE))
    }

    fn font(&mut self) -> DrawResult<Option<FontArc>> {
        let path = self.style.text(StyleField::TextFont)?;
        Ok(self.fonts.resolve(path))
    }

    fn panel_and_text(
        &mut self,
        anchor: &Anchor,
        text: &str,
        color: Color,
        font_size: f32,
        font: Option<&FontArc>,
    ) -> DrawResult<()> {
        if let Some(fill) = self.style.color(StyleField::TextFillColor)? {
            if !fill.is_transparent() {
                self.surface.fill_area(anchor.panel, fill)?;
            }
        }
        self.surface
            .text(anchor.text_origin, text, color, font_size, font);
        Ok(())
    }

    fn draw_box(&mut self, tl: Point, br: Point, options: &BoxOptions<'_>) -> DrawResult<()> {
        let rect = RectData::new(tl, br).normalize();
        let thickness = self.thickness()?;

        // Resolve the label placement first so a bad token fails before any pixel changes.
        let position = match options.position {
            Some(position) => BoxPosition::parse(position)?,
            None => match self.style.text(StyleField::BoxTextAnchor)? {
                Some(position) => BoxPosition::parse(position)?,
                None => BoxPosition::TOP_LEFT,
            },
        };

        if let Some(fill) = self.style.color(StyleField::BoxFillColor)? {
            self.surface.fill_rect(rect, fill)?;
        }
        let outline = match options.color {
            Some(color) => Some(Pen::new(color, thickness).with_style(self.line_style()?)),
            None => self.line_pen(Some(thickness))?,
        };
        if let Some(pen) = outline {
            self.surface.stroke_rect(rect, &pen)?;
        }

        let Some(label) = options.label else {
            return Ok(());
        };
        let inner = match options.inner {
            Some(inner) => inner,
            None => self.style.flag(StyleField::BoxTextInside)?.unwrap_or(false),
        };
        let font_size = self.font_size(options.font_size)?;
        let margin = options.margin.unwrap_or(DEFAULT_MARGIN);
        let font = self.font()?;
        let size = fonts::measure(font.as_ref(), font_size, label);
        let anchor = get_anchor_coordinates(
            self.image_size(),
            size,
            rect,
            position,
            inner,
            thickness,
            margin,
        );
        let color = match options.text_color {
            Some(color) => color,
            None => self.text_color()?,
        };
        self.panel_and_text(&anchor, label, color, font_size, font.as_ref())
    }

    fn draw_keypoints(
        &mut self,
        points: &[Point],
        labels: Option<&Labels>,
        font_size: Option<f32>,
    ) -> DrawResult<()> {
        let radius = self
            .style
            .number(StyleField::PointsSize)?
            .unwrap_or(DEFAULT_POINT_RADIUS);
        let fill = self.style.color(StyleField::PointsColor)?;
        let outline = match self.style.color(StyleField::PointsOutlineColor)? {
            Some(color) => {
                let width = self
                    .style
                    .integer(StyleField::PointsOutlineThickness)?
                    .map_or(DEFAULT_THICKNESS, |value| value as f32);
                Some(Pen::new(color, width))
            }
            None => None,
        };

        for point in points {
            self.surface
                .ellipse(circle_bounds(*point, radius), fill, outline.as_ref())?;
        }

        let Some(labels) = labels else {
            return Ok(());
        };
        let font_size = self.font_size(font_size)?;
        let font = self.font()?;
        let color = self.text_color()?;
        for (point, label) in points.iter().zip(labels.generate(points.len())) {
            let origin = Point::new(
                point.x + radius + LABEL_OFFSET,
                point.y - radius - LABEL_OFFSET,
            );
            let size = fonts::measure(font.as_ref(), font_size, &label);
            let anchor = Anchor::from_panel_origin(origin.x, origin.y, size, 0.0);
            self.panel_and_text(&anchor, &label, color, font_size, font.as_ref())?;
        }
        Ok(())
    }

    fn draw_arrow(&mut self, from: Point, to: Point, options: &ArrowOptions<'_>) -> DrawResult<()> {
        let color = match self.style.color(StyleField::ArrowColor)? {
            Some(color) => color,
            None => self
                .style
                .color(StyleField::LineColor)?
                .ok_or(DrawError::MissingAttribute(StyleField::LineColor.label()))?,
        };
        let width = match self.style.integer(StyleField::ArrowThickness)? {
            Some(width) => width as f32,
            None => self.thickness()?,
        };
        let angle = self
            .style
            .number(StyleField::ArrowAngle)?
            .unwrap_or(ARROW_TIP_ANGLE);
        let fill = self.style.color(StyleField::ArrowFillColor)?;
        let filled = options.filled.unwrap_or(fill.is_some());
        let tip_length = options.tip_length.unwrap_or(DEFAULT_TIP_LENGTH);

        let pen = Pen::new(color, width).with_style(self.line_style()?);
        self.surface.polyline(&[from, to], &pen)?;

        let [left, right] = arrow_tips(from, to, tip_length, angle);
        if filled {
            self.surface
                .fill_polygon(&[to, left, right], fill.unwrap_or(color))?;
        } else {
            let solid = Pen::new(color, width);
            self.surface.polyline(&[to, left], &solid)?;
            self.surface.polyline(&[to, right], &solid)?;
        }
        Ok(())
    }
}
