use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use fancymages::logging::{self, HeaderStyles};
use fancymages::style_file;
use fancymages::{
    ArrowOptions, Attributes, BoxOptions, Color, Drawer, KeypointOptions, Labels,
    Picture, Point, PolygonOptions, PngDirectory, SegmentOptions, TextOptions, WindowDisplay,
};
use image::{DynamicImage, GrayImage, Luma, RgbImage};
use imageproc::drawing::draw_filled_ellipse_mut;
use log::LevelFilter;

/// fancymages: draws the annotation showcase scene on an image
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Image to draw on; a blank canvas is used when omitted
    #[clap(short, long)]
    pub input: Option<PathBuf>,

    /// Grayscale mask blended by the mask step; a generated one is used when omitted
    #[clap(short, long)]
    pub mask: Option<PathBuf>,

    /// Where to write the annotated image
    #[clap(short, long, default_value = "annotated.png")]
    pub output: PathBuf,

    /// JSON style file merged over the built-in styles; defaults to styles.json in the
    /// user config directory when that file exists
    #[clap(short, long)]
    pub styles: Option<PathBuf>,

    /// Write the final style set to this JSON file
    #[clap(long)]
    pub dump_styles: Option<PathBuf>,

    /// Directory to write each snapshot to as PNG
    #[clap(long)]
    pub snapshots: Option<PathBuf>,

    /// Open a window paging through the snapshots
    #[clap(long)]
    pub show: bool,

    /// Minimum severity of log lines (off, error, warn, info, debug, trace)
    #[clap(long, default_value = "warn")]
    pub log_level: LevelFilter,
}

const BLANK_WIDTH: u32 = 880;
const BLANK_HEIGHT: u32 = 540;

const JOINTS: [[i32; 2]; 19] = [
    [526, 136],
    [517, 128],
    [510, 134],
    [535, 128],
    [540, 135],
    [523, 165],
    [488, 175],
    [483, 232],
    [464, 293],
    [559, 174],
    [578, 229],
    [606, 267],
    [527, 273],
    [508, 292],
    [506, 371],
    [516, 450],
    [550, 291],
    [541, 372],
    [541, 467],
];

const BONES: [(usize, usize); 18] = [
    (0, 1),
    (1, 2),
    (0, 3),
    (3, 4),
    (0, 5),
    (5, 6),
    (6, 7),
    (7, 8),
    (5, 9),
    (9, 10),
    (10, 11),
    (5, 12),
    (12, 13),
    (13, 14),
    (14, 15),
    (12, 16),
    (16, 17),
    (17, 18),
];

fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(args.log_level, HeaderStyles::default()).context("cannot install logger")?;

    let image = match &args.input {
        Some(path) => image::open(path).with_context(|| format!("cannot open {}", path.display()))?,
        None => DynamicImage::ImageRgb8(RgbImage::new(BLANK_WIDTH, BLANK_HEIGHT)),
    };
    let mask = match &args.mask {
        Some(path) => image::open(path).with_context(|| format!("cannot open {}", path.display()))?,
        None => generated_mask(image.width(), image.height()),
    };

    let mut drawer = Drawer::new();
    add_builtin_styles(&mut drawer);
    let styles = args
        .styles
        .clone()
        .or_else(|| style_file::default_path().filter(|path| path.exists()));
    if let Some(path) = &styles {
        drawer
            .load_styles(path)
            .with_context(|| format!("cannot load styles from {}", path.display()))?;
        log::info!("loaded styles from {}", path.display());
    }

    let annotated = draw_scene(&mut drawer, image, &mask)?;
    drawer.snapshot();
    annotated
        .to_image()?
        .save(&args.output)
        .with_context(|| format!("cannot save {}", args.output.display()))?;
    log::info!("saved {}", args.output.display());

    if let Some(path) = &args.dump_styles {
        drawer
            .dump_styles(path)
            .with_context(|| format!("cannot write styles to {}", path.display()))?;
    }
    if let Some(dir) = &args.snapshots {
        let mut display = PngDirectory::new(dir)?;
        drawer.show_snapshots(&mut display)?;
    }
    if args.show {
        drawer.show_snapshots(&mut WindowDisplay::new())?;
    }
    Ok(())
}

fn add_builtin_styles(drawer: &mut Drawer) {
    drawer.add_style(
        "first",
        &Attributes::new()
            .set("line color", "blue")
            .set("box fill color", "gray")
            .set("line thickness", 3)
            .set("text fill color", "transparent")
            .set("points color", "red")
            .set("points outline color", "yellow")
            .set("points outline thickness", 2)
            .set("text font size", 20)
            .set("points size", 5)
            .set("text color", "yellow")
            .set("mask color", Color::rgb(0, 220, 0)),
    );
    drawer.add_style(
        "second",
        &Attributes::new()
            .set("line color", "red")
            .set("box fill color", None::<&str>)
            .set("line thickness", 5)
            .set("text fill color", "red")
            .set("text font size", 30)
            .set("text color", "white"),
    );
}

fn generated_mask(width: u32, height: u32) -> DynamicImage {
    let mut mask = GrayImage::new(width, height);
    let center = ((width as f32 * 0.6) as i32, (height as f32 * 0.55) as i32);
    draw_filled_ellipse_mut(
        &mut mask,
        center,
        (width / 14) as i32,
        (height / 3) as i32,
        Luma([255]),
    );
    DynamicImage::ImageLuma8(mask)
}

fn points(raw: &[[i32; 2]]) -> Vec<Point> {
    raw.iter().copied().map(Point::from).collect()
}

fn text(size: f32) -> TextOptions<'static> {
    TextOptions {
        font_size: Some(size),
        ..Default::default()
    }
}

fn draw_scene(drawer: &mut Drawer, image: DynamicImage, mask: &DynamicImage) -> Result<Picture> {
    drawer.set_style("first");
    let img = drawer.mask(image, mask, &Default::default())?;
    drawer.snapshot();

    drawer.set_style("second");
    let person = BoxOptions {
        label: Some("person"),
        ..Default::default()
    };
    let img = drawer.bbox(img, (449, 93), (618, 491), &person)?;
    let img = drawer.bbox(
        img,
        (607, 53),
        (817, 480),
        &BoxOptions {
            position: Some("top right"),
            ..person
        },
    )?;
    let img = drawer.bbox(
        img,
        (734, 364),
        (823, 491),
        &BoxOptions {
            label: Some("dog"),
            position: Some("top right"),
            inner: Some(true),
            color: Some(Color::rgb(0, 0, 255)),
            ..Default::default()
        },
    )?;
    drawer.snapshot();

    drawer.update_current_style(&Attributes::new().set("text fill color", "green"));
    let img = drawer.text_anchor(img, "top right", "24", &text(40.0))?;
    drawer.update_current_style(&Attributes::new().set("text fill color", "black"));
    let img = drawer.text_anchor(img, "bottom center", "Sample Very Long Caption Text", &text(24.0))?;

    drawer.set_style("first");
    let bones: Vec<_> = BONES.iter().copied().map(Some).collect();
    let img = drawer.skeleton(
        img,
        &points(&JOINTS),
        &bones,
        &KeypointOptions {
            font_size: Some(20.0),
            ..Default::default()
        },
    )?;

    drawer.set_style("second");
    let segments = [
        [(18, 40), (35, 20)],
        [(18, 62), (65, 20)],
        [(18, 90), (115, 20)],
    ];
    let mut img = img;
    for (i, [start, end]) in segments.into_iter().enumerate() {
        img = drawer.segments(
            img,
            &[vec![Point::from(start), Point::from(end)]],
            &SegmentOptions {
                thickness: Some((i as f32 + 1.0) * 2.0),
                ..Default::default()
            },
        )?;
    }
    drawer.update_current_style(&Attributes::new().set("text fill color", "transparent"));
    let img = drawer.text(img, (110, 45), "segments", &TextOptions::default())?;

    drawer.set_style("first");
    let img = drawer.keypoints(
        img,
        &points(&[[30, 175], [67, 140], [81, 160], [126, 150]]),
        &KeypointOptions {
            labels: Some(Labels::Numbers),
            font_size: Some(20.0),
            ..Default::default()
        },
    )?;
    drawer.update_current_style(
        &Attributes::new()
            .set("text fill color", "transparent")
            .set("text color", "white"),
    );
    let img = drawer.text(img, (170, 148), "keypoints", &text(30.0))?;

    let img = drawer.bbox(img, (30, 220), (70, 260), &BoxOptions::default())?;
    drawer.update_current_style(&Attributes::new().set("box fill color", "white"));
    let img = drawer.bbox(
        img,
        (50, 240),
        (90, 280),
        &BoxOptions {
            color: Some(Color::rgb(255, 0, 0)),
            ..Default::default()
        },
    )?;
    drawer.update_current_style(&Attributes::new().set("box fill color", None::<&str>));
    let img = drawer.bbox(
        img,
        (70, 260),
        (110, 300),
        &BoxOptions {
            color: Some(Color::rgb(0, 128, 0)),
            ..Default::default()
        },
    )?;
    let img = drawer.text(img, (140, 242), "filled/empty boxes", &text(30.0))?;

    drawer.update_current_style(
        &Attributes::new()
            .set("box fill color", "yellow")
            .set("line thickness", 7),
    );
    let img = drawer.polygon(
        img,
        &points(&[[60, 335], [90, 360], [80, 405], [50, 395], [20, 355]]),
        &PolygonOptions::default(),
    )?;
    drawer.update_current_style(
        &Attributes::new()
            .set("box fill color", None::<&str>)
            .set("line thickness", 3)
            .set("points size", 3),
    );
    let img = drawer.polygon(
        img,
        &points(&[[145, 335], [175, 360], [165, 405], [135, 395], [105, 355]]),
        &PolygonOptions {
            draw_points: true,
            ..Default::default()
        },
    )?;
    drawer.update_current_style(&Attributes::new().set("line color", "purple"));
    let img = drawer.polygon(
        img,
        &points(&[
            [230, 335],
            [260, 360],
            [235, 383],
            [250, 405],
            [220, 395],
            [210, 370],
            [190, 355],
        ]),
        &PolygonOptions::default(),
    )?;
    let img = drawer.text(img, (283, 353), "polygons", &text(30.0))?;

    drawer.update_current_style(&Attributes::new().set("line color", "green"));
    let img = drawer.arrow(img, &points(&[[20, 460], [80, 450]]), &ArrowOptions::default())?;
    let img = drawer.arrow(img, &points(&[[110, 468], [35, 505]]), &ArrowOptions::default())?;
    let img = drawer.arrow(
        img,
        &points(&[[94, 510], [172, 464]]),
        &ArrowOptions {
            filled: Some(true),
            ..Default::default()
        },
    )?;
    let img = drawer.text(img, (200, 465), "arrows", &text(30.0))?;
    Ok(img)
}
