use crate::error::{DrawError, DrawResult};

pub const ARROW_TIP_ANGLE: f32 = 0.4;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Point) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }
}

impl From<(f32, f32)> for Point {
    fn from((x, y): (f32, f32)) -> Self {
        Self { x, y }
    }
}

impl From<(i32, i32)> for Point {
    fn from((x, y): (i32, i32)) -> Self {
        Self::new(x as f32, y as f32)
    }
}

impl From<[i32; 2]> for Point {
    fn from([x, y]: [i32; 2]) -> Self {
        Self::new(x as f32, y as f32)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RectData {
    pub min: Point,
    pub max: Point,
}

impl RectData {
    pub fn new(min: Point, max: Point) -> Self {
        Self { min, max }
    }

    pub fn from_ltrb(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            min: Point::new(left, top),
            max: Point::new(right, bottom),
        }
    }

    pub fn normalize(self) -> Self {
        let min_x = self.min.x.min(self.max.x);
        let min_y = self.min.y.min(self.max.y);
        let max_x = self.min.x.max(self.max.x);
        let max_y = self.min.y.max(self.max.y);
        Self {
            min: Point { x: min_x, y: min_y },
            max: Point { x: max_x, y: max_y },
        }
    }

    pub fn width(self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn height(self) -> f32 {
        self.max.y - self.min.y
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Horizontal {
    Left,
    Center,
    Right,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BoxVertical {
    Top,
    Bottom,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImageVertical {
    Top,
    Middle,
    Bottom,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BoxPosition {
    pub horizontal: Horizontal,
    pub vertical: BoxVertical,
}

impl BoxPosition {
    pub const TOP_LEFT: Self = Self {
        horizontal: Horizontal::Left,
        vertical: BoxVertical::Top,
    };

    pub fn parse(descriptor: &str) -> DrawResult<Self> {
        let (horizontal, vertical) = parse_tokens(descriptor, |token| match token {
            "top" => Some(BoxVertical::Top),
            "bottom" => Some(BoxVertical::Bottom),
            _ => None,
        })?;
        Ok(Self {
            horizontal,
            vertical,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageAlignment {
    pub horizontal: Horizontal,
    pub vertical: ImageVertical,
}

impl ImageAlignment {
    pub fn parse(descriptor: &str) -> DrawResult<Self> {
        let (horizontal, vertical) = parse_tokens(descriptor, |token| match token {
            "top" => Some(ImageVertical::Top),
            "middle" => Some(ImageVertical::Middle),
            "bottom" => Some(ImageVertical::Bottom),
            _ => None,
        })?;
        Ok(Self {
            horizontal,
            vertical,
        })
    }
}

fn parse_tokens<V>(
    descriptor: &str,
    vertical_token: impl Fn(&str) -> Option<V>,
) -> DrawResult<(Horizontal, V)> {
    let invalid = || DrawError::InvalidPosition(descriptor.to_string());
    let mut horizontal = None;
    let mut vertical = None;
    for token in descriptor.split_whitespace() {
        let token = token.to_ascii_lowercase();
        let parsed_horizontal = match token.as_str() {
            "left" => Some(Horizontal::Left),
            "center" => Some(Horizontal::Center),
            "right" => Some(Horizontal::Right),
            _ => None,
        };
        if let Some(value) = parsed_horizontal {
            if horizontal.replace(value).is_some() {
                return Err(invalid());
            }
        } else if let Some(value) = vertical_token(&token) {
            if vertical.replace(value).is_some() {
                return Err(invalid());
            }
        } else {
            return Err(invalid());
        }
    }
    match (horizontal, vertical) {
        (Some(horizontal), Some(vertical)) => Ok((horizontal, vertical)),
        _ => Err(invalid()),
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Anchor {
    pub text_origin: Point,
    pub panel: RectData,
}

impl Anchor {
    pub(crate) fn from_panel_origin(x: f32, y: f32, text: Size, margin: f32) -> Self {
        let half = margin / 2.0;
        Self {
            text_origin: Point::new(x + half, y + half),
            panel: RectData::from_ltrb(x, y, x + text.width + margin, y + text.height + margin),
        }
    }
}

/// `inner` moves the panel inside the box border by `thickness`; otherwise `top`/`bottom`
/// put it above/below the box. Horizontal `center` uses `rect.max.x / 2` as the midpoint.
pub fn get_anchor_coordinates(
    _image: Size,
    text: Size,
    rect: RectData,
    position: BoxPosition,
    inner: bool,
    thickness: f32,
    margin: f32,
) -> Anchor {
    let rect = rect.normalize();
    let panel_w = text.width + margin;
    let panel_h = text.height + margin;
    let inset = if inner { thickness } else { 0.0 };

    let x = match position.horizontal {
        Horizontal::Left => rect.min.x + inset,
        Horizontal::Right => rect.max.x - inset - panel_w,
        Horizontal::Center => rect.max.x / 2.0 - panel_w / 2.0,
    };
    let y = match (position.vertical, inner) {
        (BoxVertical::Top, false) => rect.min.y - panel_h,
        (BoxVertical::Top, true) => rect.min.y + thickness,
        (BoxVertical::Bottom, false) => rect.max.y,
        (BoxVertical::Bottom, true) => rect.max.y - thickness - panel_h,
    };
    Anchor::from_panel_origin(x, y, text, margin)
}

pub fn get_coordinates(image: Size, text: Size, alignment: ImageAlignment, margin: f32) -> Anchor {
    let panel_w = text.width + margin;
    let panel_h = text.height + margin;

    let x = match alignment.horizontal {
        Horizontal::Left => 0.0,
        Horizontal::Center => image.width / 2.0 - panel_w / 2.0,
        Horizontal::Right => image.width - panel_w,
    };
    let y = match alignment.vertical {
        ImageVertical::Top => 0.0,
        ImageVertical::Middle => image.height / 2.0 - panel_h / 2.0,
        ImageVertical::Bottom => image.height - panel_h,
    };
    Anchor::from_panel_origin(x, y, text, margin)
}

pub fn circle_bounds(center: Point, radius: f32) -> RectData {
    RectData::from_ltrb(
        center.x - radius,
        center.y - radius,
        center.x + radius,
        center.y + radius,
    )
}

pub fn arrow_tips(from: Point, to: Point, tip_length: f32, angle: f32) -> [Point; 2] {
    let dx = from.x - to.x;
    let dy = from.y - to.y;
    let length = (dx * dx + dy * dy).sqrt();
    if length <= f32::EPSILON {
        return [to, to];
    }
    let vx = dx / length * tip_length;
    let vy = dy / length * tip_length;

    let rotate = |theta: f32| {
        let (sin, cos) = theta.sin_cos();
        Point::new(to.x + vx * cos + vy * sin, to.y - vx * sin + vy * cos)
    };
    [rotate(angle), rotate(-angle)]
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{
        arrow_tips, circle_bounds, get_anchor_coordinates, get_coordinates, BoxPosition,
        BoxVertical, Horizontal, ImageAlignment, ImageVertical, Point, RectData, Size,
        ARROW_TIP_ANGLE,
    };
    use crate::error::DrawError;

    const IMAGE: Size = Size {
        width: 200.0,
        height: 200.0,
    };

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[rstest]
    #[case("top left", Horizontal::Left, BoxVertical::Top)]
    #[case("right bottom", Horizontal::Right, BoxVertical::Bottom)]
    #[case("top  center", Horizontal::Center, BoxVertical::Top)]
    #[case("Bottom Left", Horizontal::Left, BoxVertical::Bottom)]
    fn box_positions_parse(
        #[case] descriptor: &str,
        #[case] horizontal: Horizontal,
        #[case] vertical: BoxVertical,
    ) {
        let position = BoxPosition::parse(descriptor).expect("valid position");
        assert_eq!(position.horizontal, horizontal);
        assert_eq!(position.vertical, vertical);
    }

    #[rstest]
    #[case("middle left")]
    #[case("top")]
    #[case("top upper")]
    #[case("left right")]
    #[case("")]
    fn invalid_box_positions_are_rejected(#[case] descriptor: &str) {
        assert!(matches!(
            BoxPosition::parse(descriptor),
            Err(DrawError::InvalidPosition(_))
        ));
    }

    #[test]
    fn image_alignment_uses_middle_not_center_vertically() {
        let alignment = ImageAlignment::parse("middle center").expect("middle center");
        assert_eq!(alignment.horizontal, Horizontal::Center);
        assert_eq!(alignment.vertical, ImageVertical::Middle);
        // "center" is horizontal only, so this has no vertical token.
        assert!(ImageAlignment::parse("center").is_err());
        assert!(ImageAlignment::parse("center center").is_err());
    }

    #[rstest]
    #[case("top left")]
    #[case("top right")]
    #[case("bottom left")]
    #[case("bottom right")]
    fn outer_left_right_panels_align_with_box_edges(#[case] descriptor: &str) {
        let rect = RectData::from_ltrb(60.0, 60.0, 140.0, 140.0);
        let text = Size::new(30.0, 12.0);
        let position = BoxPosition::parse(descriptor).unwrap();
        let anchor = get_anchor_coordinates(IMAGE, text, rect, position, false, 3.0, 0.0);

        assert!(close(anchor.panel.width(), text.width));
        match position.horizontal {
            Horizontal::Left => assert!(close(anchor.panel.min.x, rect.min.x)),
            Horizontal::Right => assert!(close(anchor.panel.max.x, rect.max.x)),
            Horizontal::Center => unreachable!(),
        }
        match position.vertical {
            BoxVertical::Top => assert!(close(anchor.panel.max.y, rect.min.y)),
            BoxVertical::Bottom => assert!(close(anchor.panel.min.y, rect.max.y)),
        }
    }

    #[test]
    fn inner_panels_sit_inside_the_border() {
        let rect = RectData::from_ltrb(60.0, 60.0, 140.0, 140.0);
        let text = Size::new(30.0, 12.0);

        let top_right = get_anchor_coordinates(
            IMAGE,
            text,
            rect,
            BoxPosition::parse("top right").unwrap(),
            true,
            3.0,
            0.0,
        );
        assert!(close(top_right.panel.max.x, 137.0));
        assert!(close(top_right.panel.min.y, 63.0));

        let bottom_left = get_anchor_coordinates(
            IMAGE,
            text,
            rect,
            BoxPosition::parse("bottom left").unwrap(),
            true,
            3.0,
            0.0,
        );
        assert!(close(bottom_left.panel.min.x, 63.0));
        assert!(close(bottom_left.panel.max.y, 137.0));
    }

    #[test]
    fn margin_pads_panel_and_offsets_glyphs() {
        let rect = RectData::from_ltrb(60.0, 60.0, 140.0, 140.0);
        let text = Size::new(30.0, 12.0);
        let anchor =
            get_anchor_coordinates(IMAGE, text, rect, BoxPosition::TOP_LEFT, false, 1.0, 10.0);

        assert!(close(anchor.panel.width(), 40.0));
        assert!(close(anchor.panel.height(), 22.0));
        assert!(close(anchor.panel.min.y, 38.0));
        assert!(close(anchor.text_origin.x, anchor.panel.min.x + 5.0));
        assert!(close(anchor.text_origin.y, anchor.panel.min.y + 5.0));
    }

    #[test]
    fn box_center_uses_right_edge_halved() {
        let rect = RectData::from_ltrb(100.0, 60.0, 180.0, 140.0);
        let text = Size::new(20.0, 10.0);
        let position = BoxPosition::parse("bottom center").unwrap();
        let anchor = get_anchor_coordinates(IMAGE, text, rect, position, false, 1.0, 0.0);
        assert!(close(anchor.panel.min.x, 90.0 - 10.0));
    }

    #[test]
    fn panels_near_the_image_border_are_not_moved() {
        let text = Size::new(30.0, 12.0);

        let rect = RectData::from_ltrb(0.0, 50.0, 20.0, 80.0);
        let position = BoxPosition::parse("top right").unwrap();
        let anchor = get_anchor_coordinates(IMAGE, text, rect, position, false, 1.0, 0.0);
        assert!(close(anchor.panel.max.x, 20.0));
        assert!(close(anchor.panel.min.x, -10.0));

        let rect = RectData::from_ltrb(10.0, 5.0, 60.0, 60.0);
        let anchor =
            get_anchor_coordinates(IMAGE, text, rect, BoxPosition::TOP_LEFT, false, 1.0, 0.0);
        assert!(close(anchor.panel.max.y, 5.0));
        assert!(close(anchor.panel.min.y, -7.0));
    }

    #[test]
    fn image_anchors() {
        let text = Size::new(40.0, 20.0);
        let bottom_center = get_coordinates(
            IMAGE,
            text,
            ImageAlignment::parse("bottom center").unwrap(),
            10.0,
        );
        assert!(close(bottom_center.panel.min.x, 75.0));
        assert!(close(bottom_center.panel.max.y, 200.0));

        let top_right =
            get_coordinates(IMAGE, text, ImageAlignment::parse("top right").unwrap(), 0.0);
        assert!(close(top_right.panel.max.x, 200.0));
        assert!(close(top_right.panel.min.y, 0.0));

        let middle_left =
            get_coordinates(IMAGE, text, ImageAlignment::parse("middle left").unwrap(), 0.0);
        assert!(close(middle_left.panel.min.y, 90.0));
        assert!(close(middle_left.text_origin.x, 0.0));
    }

    #[test]
    fn circle_bounds_enclose_radius() {
        let bounds = circle_bounds(Point::new(10.0, 20.0), 4.0);
        assert_eq!(bounds, RectData::from_ltrb(6.0, 16.0, 14.0, 24.0));
    }

    #[test]
    fn arrow_tips_are_rotated_reversed_shaft() {
        let to = Point::new(10.0, 0.0);
        let tips = arrow_tips(Point::new(0.0, 0.0), to, 5.0, ARROW_TIP_ANGLE);

        for tip in tips {
            assert!(close(tip.distance(to), 5.0));
            let angle = (tip.y - to.y).atan2(tip.x - to.x);
            let reversed = std::f32::consts::PI;
            let delta = (angle.abs() - reversed).abs();
            assert!(close(delta, ARROW_TIP_ANGLE), "angle {angle}");
        }
        assert!(close(tips[0].y, -tips[1].y));
        assert!(tips[0].x < to.x && tips[1].x < to.x);
    }

    #[test]
    fn degenerate_arrow_collapses_tips() {
        let p = Point::new(3.0, 3.0);
        assert_eq!(arrow_tips(p, p, 5.0, ARROW_TIP_ANGLE), [p, p]);
    }
}
