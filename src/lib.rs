pub mod color;
pub mod display;
pub mod drawer;
pub mod error;
pub mod fonts;
pub mod geometry;
pub mod logging;
pub mod picture;
pub mod raster;
pub mod registry;
pub mod style;
pub mod style_file;
pub mod suggest;
pub mod viewer;

pub use color::Color;
pub use display::{Display, PngDirectory};
pub use drawer::{
    ArrowOptions, BoxOptions, Drawer, DrawerOptions, KeypointOptions, Labels, MaskOptions,
    PolygonOptions, SegmentOptions, TextOptions,
};
pub use error::{DrawError, DrawResult};
pub use geometry::Point;
pub use picture::{Picture, PixelArray};
pub use style::{AttrValue, Attributes, StyleField, StyleParameters, UnknownField};
pub use viewer::WindowDisplay;
