use anyhow::Result;
use fancymages::{
    Attributes, BoxOptions, Color, Display, DrawError, Drawer, KeypointOptions, Labels,
    MaskOptions, Picture, PixelArray, Point, SegmentOptions, TextOptions,
};
use image::{DynamicImage, GrayImage, Luma, Rgb, RgbImage, Rgba, RgbaImage};

fn black_rgba(size: u32) -> DynamicImage {
    DynamicImage::ImageRgba8(RgbaImage::from_pixel(size, size, Rgba([0, 0, 0, 255])))
}

fn rgba(picture: &Picture) -> RgbaImage {
    picture.to_image().expect("decodable picture").to_rgba8()
}

fn styled_drawer() -> Drawer {
    let mut drawer = Drawer::new();
    drawer.add_style(
        "s1",
        &Attributes::new()
            .set("line color", "blue")
            .set("line thickness", 2),
    );
    drawer.set_style("s1");
    drawer
}

#[derive(Default)]
struct Recording {
    shown: Vec<DynamicImage>,
    finished: usize,
}

impl Display for Recording {
    fn show(&mut self, image: &DynamicImage) -> Result<()> {
        self.shown.push(image.clone());
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.finished += 1;
        Ok(())
    }
}

#[test]
fn box_outline_is_drawn_inside_the_box_edges() {
    let mut drawer = styled_drawer();
    let picture = drawer
        .bbox(black_rgba(100), (10, 10), (50, 50), &BoxOptions::default())
        .expect("box");
    let image = rgba(&picture);

    assert_eq!(image.get_pixel(10, 30).0, [0, 0, 255, 255]);
    assert_eq!(image.get_pixel(11, 30).0, [0, 0, 255, 255]);
    assert_eq!(image.get_pixel(50, 30).0, [0, 0, 255, 255]);
    assert_eq!(image.get_pixel(30, 30).0, [0, 0, 0, 255]);
    assert_eq!(image.get_pixel(9, 30).0, [0, 0, 0, 255]);
}

#[test]
fn caller_image_is_untouched() {
    let mut drawer = styled_drawer();
    let original = black_rgba(40);
    let copy = original.clone();
    drawer
        .bbox(original.clone(), (2, 2), (30, 30), &BoxOptions::default())
        .expect("box");
    assert_eq!(original, copy);
}

#[test]
fn unimplemented_operations_return_the_input() {
    let mut drawer = styled_drawer();
    let input = black_rgba(16);
    let output = drawer.overlay(input.clone(), "text", "top left");
    assert_eq!(output.as_native(), Some(&input));
    let output = drawer.side_barplot(input.clone(), &[1.0, 2.0], "right");
    assert_eq!(output.as_native(), Some(&input));
}

#[test]
fn snapshots_are_shown_in_order() {
    let mut drawer = styled_drawer();
    let first = drawer
        .bbox(black_rgba(30), (2, 2), (10, 10), &BoxOptions::default())
        .expect("first box");
    drawer.snapshot();
    drawer
        .bbox(first, (12, 12), (20, 20), &BoxOptions::default())
        .expect("second box");
    drawer.snapshot();

    let mut display = Recording::default();
    drawer.show_snapshots(&mut display).expect("show");
    assert_eq!(display.shown.len(), 2);
    assert_eq!(display.finished, 1);

    let earlier = display.shown[0].to_rgba8();
    let later = display.shown[1].to_rgba8();
    assert_eq!(earlier.get_pixel(12, 15).0, [0, 0, 0, 255]);
    assert_eq!(later.get_pixel(12, 15).0, [0, 0, 255, 255]);
}

#[test]
fn pixel_arrays_keep_their_layout() {
    let mut drawer = styled_drawer();
    drawer.set_return_array(true);

    let input = PixelArray::zeros(20, 30, 3).expect("array");
    let output = drawer
        .segments(
            input,
            &[vec![Point::new(0.0, 10.5), Point::new(30.0, 10.5)]],
            &SegmentOptions {
                thickness: Some(3.0),
                ..Default::default()
            },
        )
        .expect("segments");
    let array = output.as_array().expect("array output");
    assert_eq!(array.shape(), (20, 30, 3));
    assert_eq!(array.pixel(15, 10), Some(&[0u8, 0, 255][..]));
    assert_eq!(array.pixel(15, 2), Some(&[0u8, 0, 0][..]));
}

#[test]
fn native_rgb_input_returns_rgb_image() {
    let mut drawer = styled_drawer();
    let input = DynamicImage::ImageRgb8(RgbImage::from_pixel(20, 20, Rgb([9, 9, 9])));
    let output = drawer
        .bbox(input, (0, 0), (19, 19), &BoxOptions::default())
        .expect("box");
    assert!(matches!(output.as_native(), Some(DynamicImage::ImageRgb8(_))));
}

#[test]
fn keypoint_labels_do_not_fail_without_a_panel() {
    let mut drawer = styled_drawer();
    drawer.update_current_style(&Attributes::new().set("points color", "red"));
    let points = [Point::new(10.0, 30.0), Point::new(30.0, 30.0)];
    for labels in [
        Labels::Numbers,
        Labels::NumbersFromZero,
        Labels::Letters,
        Labels::Explicit(vec!["only one".to_string()]),
    ] {
        let picture = drawer
            .keypoints(
                black_rgba(60),
                &points,
                &KeypointOptions {
                    labels: Some(labels),
                    ..Default::default()
                },
            )
            .expect("keypoints");
        assert_eq!(rgba(&picture).get_pixel(10, 30).0, [255, 0, 0, 255]);
    }
}

#[test]
fn keypoint_label_panel_sits_above_right_of_the_point() {
    let mut drawer = styled_drawer();
    drawer.update_current_style(
        &Attributes::new()
            .set("points color", "red")
            .set("text fill color", "green"),
    );
    let picture = drawer
        .keypoints(
            black_rgba(60),
            &[Point::new(10.0, 40.0)],
            &KeypointOptions {
                labels: Some(Labels::Numbers),
                ..Default::default()
            },
        )
        .expect("keypoints");
    let image = rgba(&picture);

    // radius 3 and offset 10 put the panel corner at (23, 27)
    assert_eq!(image.get_pixel(23, 27).0, [0, 128, 0, 255]);
    assert_eq!(image.get_pixel(22, 27).0, [0, 0, 0, 255]);
    assert_eq!(image.get_pixel(23, 26).0, [0, 0, 0, 255]);
    assert_eq!(image.get_pixel(10, 40).0, [255, 0, 0, 255]);
}

#[test]
fn nested_overrides_restore_selection_after_errors() {
    let mut drawer = styled_drawer();
    drawer.add_style("s2", &Attributes::new().set("line color", "red"));

    let result: Result<(), DrawError> = drawer.with_style(Some("s2"), |drawer| {
        drawer.text_anchor(black_rgba(20), "nowhere", "x", &TextOptions::default())?;
        Ok(())
    });
    assert!(matches!(result, Err(DrawError::InvalidPosition(_))));
    assert_eq!(drawer.current_style(), Some("s1"));

    let missing = drawer.bbox(
        black_rgba(20),
        (1, 1),
        (5, 5),
        &BoxOptions {
            style: Some("nope"),
            ..Default::default()
        },
    );
    assert!(matches!(missing, Err(DrawError::StyleNotFound(name)) if name == "nope"));
    assert_eq!(drawer.current_style(), Some("s1"));
}

#[test]
fn mask_uses_call_color_over_style_color() {
    let mut drawer = styled_drawer();
    let mut mask = GrayImage::new(10, 10);
    mask.put_pixel(5, 5, Luma([255]));

    let missing = drawer.mask(
        black_rgba(10),
        &DynamicImage::ImageLuma8(mask.clone()),
        &MaskOptions::default(),
    );
    assert!(matches!(missing, Err(DrawError::MissingAttribute("mask color"))));

    let picture = drawer
        .mask(
            black_rgba(10),
            &DynamicImage::ImageLuma8(mask),
            &MaskOptions {
                color: Some(Color::rgb(0, 220, 0)),
                ..Default::default()
            },
        )
        .expect("mask");
    let image = rgba(&picture);
    assert_eq!(image.get_pixel(5, 5).0, [0, 220, 0, 255]);
    assert_eq!(image.get_pixel(4, 5).0, [0, 0, 0, 255]);
}

#[test]
fn styles_survive_a_dump_and_load() {
    let mut drawer = styled_drawer();
    drawer.add_style("panel", &Attributes::new().set("text fill color", "transparent"));

    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("styles.json");
    drawer.dump_styles(&path).expect("dump");

    let mut restored = Drawer::new();
    let unknown = restored.load_styles(&path).expect("load");
    assert!(unknown.is_empty());
    assert_eq!(restored.current_style(), Some("s1"));
    assert_eq!(restored.style("s1"), drawer.style("s1"));
    assert_eq!(restored.style("panel"), drawer.style("panel"));
}

#[test]
fn unknown_fields_are_reported_with_suggestions() {
    let mut drawer = Drawer::new();
    let unknown = drawer.add_style("typo", &Attributes::new().set("line colour", "red"));
    assert_eq!(unknown.len(), 1);
    assert_eq!(unknown[0].key, "line colour");
    assert_eq!(unknown[0].suggestions.first().map(String::as_str), Some("line color"));
}

#[test]
fn normalized_flag_still_reads_pixels_and_show_displays_once() {
    let mut drawer = Drawer::with_options(fancymages::DrawerOptions {
        return_array: false,
        normalized: true,
    });
    drawer.add_style("s1", &Attributes::new().set("line color", "blue"));
    drawer.set_style("s1");
    assert!(drawer.last_image().is_none());

    let picture = drawer
        .bbox(black_rgba(20), (2, 2), (10, 10), &BoxOptions::default())
        .expect("box");
    assert_eq!(rgba(&picture).get_pixel(2, 5).0, [0, 0, 255, 255]);
    assert_eq!(drawer.last_image(), picture.as_native());

    let mut display = Recording::default();
    drawer.show(&picture, &mut display).expect("show");
    assert_eq!(display.shown.len(), 1);
    assert_eq!(display.finished, 1);
}
