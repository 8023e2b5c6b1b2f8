use image::{DynamicImage, GrayImage, RgbImage, RgbaImage};

use crate::error::{DrawError, DrawResult};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelArray {
    height: usize,
    width: usize,
    channels: usize,
    data: Vec<u8>,
}

fn byte_count(height: usize, width: usize, channels: usize) -> DrawResult<usize> {
    height
        .checked_mul(width)
        .and_then(|area| area.checked_mul(channels))
        .ok_or_else(|| {
            DrawError::InvalidArray(format!("{height}x{width}x{channels} overflows the address space"))
        })
}

impl PixelArray {
    pub fn new(height: usize, width: usize, channels: usize, data: Vec<u8>) -> DrawResult<Self> {
        if !matches!(channels, 1 | 3 | 4) {
            return Err(DrawError::InvalidArray(format!(
                "unsupported channel count {channels}"
            )));
        }
        let expected = byte_count(height, width, channels)?;
        if data.len() != expected {
            return Err(DrawError::InvalidArray(format!(
                "expected {expected} bytes for {height}x{width}x{channels}, got {}",
                data.len()
            )));
        }
        Ok(Self {
            height,
            width,
            channels,
            data,
        })
    }

    pub fn zeros(height: usize, width: usize, channels: usize) -> DrawResult<Self> {
        let len = byte_count(height, width, channels)?;
        Self::new(height, width, channels, vec![0; len])
    }

    pub fn shape(&self) -> (usize, usize, usize) {
        (self.height, self.width, self.channels)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<&[u8]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let start = (y * self.width + x) * self.channels;
        self.data.get(start..start + self.channels)
    }

    pub fn to_image(&self) -> DrawResult<DynamicImage> {
        let invalid = || DrawError::InvalidArray("array does not fit an image".to_string());
        let width = u32::try_from(self.width).map_err(|_| invalid())?;
        let height = u32::try_from(self.height).map_err(|_| invalid())?;
        let data = self.data.clone();
        let image = match self.channels {
            1 => GrayImage::from_raw(width, height, data).map(DynamicImage::ImageLuma8),
            3 => RgbImage::from_raw(width, height, data).map(DynamicImage::ImageRgb8),
            _ => RgbaImage::from_raw(width, height, data).map(DynamicImage::ImageRgba8),
        };
        image.ok_or_else(invalid)
    }

    pub fn from_image(image: &DynamicImage) -> Self {
        let height = image.height() as usize;
        let width = image.width() as usize;
        let (channels, data) = match image {
            DynamicImage::ImageLuma8(buffer) => (1, buffer.as_raw().clone()),
            DynamicImage::ImageRgb8(buffer) => (3, buffer.as_raw().clone()),
            DynamicImage::ImageRgba8(buffer) => (4, buffer.as_raw().clone()),
            other => (4, other.to_rgba8().into_raw()),
        };
        Self {
            height,
            width,
            channels,
            data,
        }
    }
}

#[derive(Clone, Debug)]
pub enum Picture {
    Native(DynamicImage),
    Array(PixelArray),
}

impl Picture {
    pub fn into_image(self) -> DrawResult<DynamicImage> {
        match self {
            Self::Native(image) => Ok(image),
            Self::Array(array) => array.to_image(),
        }
    }

    pub fn to_image(&self) -> DrawResult<DynamicImage> {
        match self {
            Self::Native(image) => Ok(image.clone()),
            Self::Array(array) => array.to_image(),
        }
    }

    pub fn as_native(&self) -> Option<&DynamicImage> {
        match self {
            Self::Native(image) => Some(image),
            Self::Array(_) => None,
        }
    }

    pub fn as_array(&self) -> Option<&PixelArray> {
        match self {
            Self::Native(_) => None,
            Self::Array(array) => Some(array),
        }
    }
}

impl From<DynamicImage> for Picture {
    fn from(value: DynamicImage) -> Self {
        Self::Native(value)
    }
}

impl From<RgbaImage> for Picture {
    fn from(value: RgbaImage) -> Self {
        Self::Native(DynamicImage::ImageRgba8(value))
    }
}

impl From<RgbImage> for Picture {
    fn from(value: RgbImage) -> Self {
        Self::Native(DynamicImage::ImageRgb8(value))
    }
}

impl From<PixelArray> for Picture {
    fn from(value: PixelArray) -> Self {
        Self::Array(value)
    }
}

pub(crate) fn restore_layout(drawn: RgbaImage, like: &DynamicImage) -> DynamicImage {
    let drawn = DynamicImage::ImageRgba8(drawn);
    match like {
        DynamicImage::ImageLuma8(_) => DynamicImage::ImageLuma8(drawn.to_luma8()),
        DynamicImage::ImageRgb8(_) => DynamicImage::ImageRgb8(drawn.to_rgb8()),
        _ => drawn,
    }
}

#[cfg(test)]
mod tests {
    use image::DynamicImage;

    use super::{restore_layout, PixelArray, Picture};
    use crate::error::DrawError;

    #[test]
    fn array_shape_is_validated() {
        assert!(PixelArray::new(2, 2, 3, vec![0; 12]).is_ok());
        assert!(PixelArray::new(2, 2, 3, vec![0; 11]).is_err());
        assert!(PixelArray::new(2, 2, 2, vec![0; 8]).is_err());
    }

    #[test]
    fn oversized_shapes_are_rejected_without_allocating() {
        assert!(matches!(
            PixelArray::new(usize::MAX, 2, 3, Vec::new()),
            Err(DrawError::InvalidArray(_))
        ));
        assert!(matches!(
            PixelArray::zeros(usize::MAX, 2, 1),
            Err(DrawError::InvalidArray(_))
        ));
    }

    #[test]
    fn rgb_array_converts_to_rgb_image_and_back() {
        let mut data = vec![0; 2 * 3 * 3];
        data[3..6].copy_from_slice(&[1, 2, 3]);
        let array = PixelArray::new(2, 3, 3, data).expect("array");

        let image = Picture::from(array.clone()).into_image().expect("image");
        assert!(matches!(image, DynamicImage::ImageRgb8(_)));
        assert_eq!(image.width(), 3);
        assert_eq!(image.height(), 2);

        let back = PixelArray::from_image(&image);
        assert_eq!(back, array);
        assert_eq!(back.pixel(1, 0), Some(&[1u8, 2, 3][..]));
    }

    #[test]
    fn restore_layout_keeps_channel_count() {
        let original = DynamicImage::ImageRgb8(image::RgbImage::new(2, 2));
        let restored = restore_layout(original.to_rgba8(), &original);
        assert!(matches!(restored, DynamicImage::ImageRgb8(_)));
    }
}
