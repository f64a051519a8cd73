// One-bit drawing plane for a single e-paper colour channel
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PointsIter, Rectangle};
use image::GrayImage;
use std::convert::Infallible;

/// Luma below this counts as ink when importing background art.
const INK_THRESHOLD: u8 = 128;

/// A monochrome plane. `BinaryColor::On` is ink, `Off` is bare paper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plane {
    width: u32,
    height: u32,
    ink: Vec<bool>,
}

impl Plane {
    /// Blank plane of the given size
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ink: vec![false; (width * height) as usize],
        }
    }

    pub fn from_luma(image: &GrayImage) -> Self {
        let (width, height) = image.dimensions();
        let ink = image.pixels().map(|p| p.0[0] < INK_THRESHOLD).collect();
        Self { width, height, ink }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn is_ink(&self, x: u32, y: u32) -> bool {
        x < self.width && y < self.height && self.ink[(y * self.width + x) as usize]
    }

    /// Number of inked pixels inside `area` (clipped to the plane)
    pub fn ink_in(&self, area: &Rectangle) -> usize {
        area.points()
            .filter(|p| p.x >= 0 && p.y >= 0 && self.is_ink(p.x as u32, p.y as u32))
            .count()
    }

    /// Pack row-major, MSB first, one bit per pixel; set bits are paper.
    pub fn to_driver_buffer(&self) -> Vec<u8> {
        let stride = self.width.div_ceil(8) as usize;
        let mut buffer = vec![0xFF; stride * self.height as usize];

        for y in 0..self.height {
            for x in 0..self.width {
                if self.is_ink(x, y) {
                    buffer[y as usize * stride + (x / 8) as usize] &= !(0x80 >> (x % 8));
                }
            }
        }

        buffer
    }
}

impl OriginDimensions for Plane {
    fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

impl DrawTarget for Plane {
    type Color = BinaryColor;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if point.x < 0 || point.y < 0 {
                continue;
            }
            let (x, y) = (point.x as u32, point.y as u32);
            if x < self.width && y < self.height {
                self.ink[(y * self.width + x) as usize] = color.is_on();
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};
    use image::Luma;

    #[test]
    fn test_draw_clips_out_of_bounds() {
        let mut plane = Plane::new(8, 2);
        Rectangle::new(Point::new(-2, -2), Size::new(20, 3))
            .into_styled(PrimitiveStyle::with_fill(BinaryColor::On))
            .draw(&mut plane)
            .unwrap();

        assert!(plane.is_ink(0, 0));
        assert!(plane.is_ink(7, 0));
        assert!(!plane.is_ink(0, 1));
        assert_eq!(plane.ink_in(&Rectangle::new(Point::zero(), plane.size())), 8);
    }

    #[test]
    fn test_driver_buffer_packing() {
        let mut plane = Plane::new(10, 2);
        Pixel(Point::new(0, 0), BinaryColor::On).draw(&mut plane).unwrap();
        Pixel(Point::new(9, 1), BinaryColor::On).draw(&mut plane).unwrap();

        // 10 px wide rounds up to a two-byte stride
        assert_eq!(plane.to_driver_buffer(), vec![0x7F, 0xFF, 0xFF, 0xBF]);
    }

    #[test]
    fn test_from_luma_thresholds_dark_pixels() {
        let mut image = GrayImage::from_pixel(3, 1, Luma([255]));
        image.put_pixel(1, 0, Luma([10]));

        let plane = Plane::from_luma(&image);
        assert_eq!(plane.size(), Size::new(3, 1));
        assert!(!plane.is_ink(0, 0));
        assert!(plane.is_ink(1, 0));
        assert!(!plane.is_ink(2, 0));
    }
}
