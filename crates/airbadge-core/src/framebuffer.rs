//! Monochrome framebuffer with dirty-region tracking.
//!
//! Screens compose into this RAM buffer instead of the panel. A full-window
//! refresh sends every pixel downstream; a partial-window refresh only sends
//! the bounding box of pixels that changed since the last flush.

use core::convert::Infallible;

use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use log::debug;

/// Panel width in pixels (1.54" 200x200 e-ink).
pub const DISPLAY_WIDTH_PX: u32 = 200;

/// Panel height in pixels.
pub const DISPLAY_HEIGHT_PX: u32 = 200;

const WIDTH: usize = DISPLAY_WIDTH_PX as usize;
const HEIGHT: usize = DISPLAY_HEIGHT_PX as usize;

/// One bit per pixel, row-major, MSB first.
const BUFFER_BYTES: usize = WIDTH * HEIGHT / 8;

/// Bounding box of pixels that have changed since the last flush.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct DirtyRect {
    min_x: usize,
    min_y: usize,
    max_x: usize,
    max_y: usize,
}

impl DirtyRect {
    fn expand(&mut self, x: usize, y: usize) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
    }

    fn from_point(x: usize, y: usize) -> Self {
        Self {
            min_x: x,
            min_y: y,
            max_x: x,
            max_y: y,
        }
    }

    fn to_rectangle(self) -> Rectangle {
        Rectangle::new(
            Point::new(self.min_x as i32, self.min_y as i32),
            Size::new(
                (self.max_x - self.min_x + 1) as u32,
                (self.max_y - self.min_y + 1) as u32,
            ),
        )
    }
}

/// Packed 1-bit framebuffer implementing `DrawTarget<Color = BinaryColor>`.
///
/// `BinaryColor::On` is ink (black on the panel), `Off` is paper.
pub struct FrameBuffer {
    bits: [u8; BUFFER_BYTES],
    dirty: Option<DirtyRect>,
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameBuffer {
    /// A blank (all paper) framebuffer.
    pub const fn new() -> Self {
        Self {
            bits: [0; BUFFER_BYTES],
            dirty: None,
        }
    }

    #[inline]
    fn index(x: usize, y: usize) -> (usize, u8) {
        let bit = y * WIDTH + x;
        (bit / 8, 0x80 >> (bit % 8))
    }

    /// Color of a pixel, or `None` outside the panel.
    pub fn pixel(&self, point: Point) -> Option<BinaryColor> {
        if point.x < 0 || point.y < 0 || point.x as usize >= WIDTH || point.y as usize >= HEIGHT {
            return None;
        }
        let (byte, mask) = Self::index(point.x as usize, point.y as usize);
        Some(BinaryColor::from(self.bits[byte] & mask != 0))
    }

    /// Number of inked pixels.
    pub fn ink_count(&self) -> u32 {
        self.bits.iter().map(|b| b.count_ones()).sum()
    }

    /// Region changed since the last flush, if any.
    pub fn dirty_area(&self) -> Option<Rectangle> {
        self.dirty.map(DirtyRect::to_rectangle)
    }

    /// Write a single pixel, expanding the dirty rect only if the color changed.
    #[inline]
    fn set_pixel(&mut self, x: usize, y: usize, color: BinaryColor) {
        let (byte, mask) = Self::index(x, y);
        let was_on = self.bits[byte] & mask != 0;
        if was_on == color.is_on() {
            return;
        }
        if color.is_on() {
            self.bits[byte] |= mask;
        } else {
            self.bits[byte] &= !mask;
        }
        match &mut self.dirty {
            Some(rect) => rect.expand(x, y),
            None => self.dirty = Some(DirtyRect::from_point(x, y)),
        }
    }

    fn fill_region(&self, area: &Rectangle) -> impl Iterator<Item = BinaryColor> + '_ {
        let x0 = area.top_left.x as usize;
        let y0 = area.top_left.y as usize;
        let w = area.size.width as usize;
        let h = area.size.height as usize;
        (y0..y0 + h).flat_map(move |y| {
            (x0..x0 + w).map(move |x| {
                let (byte, mask) = Self::index(x, y);
                BinaryColor::from(self.bits[byte] & mask != 0)
            })
        })
    }

    /// Send only the dirty region downstream, then reset the dirty state.
    ///
    /// If nothing changed since the last flush, this is a no-op.
    pub fn flush_partial<D>(&mut self, display: &mut D) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = BinaryColor>,
    {
        let Some(rect) = self.dirty.take() else {
            return Ok(());
        };
        let area = rect.to_rectangle();

        debug!(
            "Flushing {}x{} dirty region at ({}, {})",
            area.size.width, area.size.height, area.top_left.x, area.top_left.y
        );

        display.fill_contiguous(&area, self.fill_region(&area))
    }

    /// Send the whole frame downstream, then reset the dirty state.
    pub fn flush_full<D>(&mut self, display: &mut D) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = BinaryColor>,
    {
        self.dirty = None;
        let area = self.bounding_box();
        display.fill_contiguous(&area, self.fill_region(&area))
    }
}

impl OriginDimensions for FrameBuffer {
    fn size(&self) -> Size {
        Size::new(DISPLAY_WIDTH_PX, DISPLAY_HEIGHT_PX)
    }
}

impl DrawTarget for FrameBuffer {
    type Color = BinaryColor;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(coord, color) in pixels {
            let x = coord.x;
            let y = coord.y;
            if x >= 0 && y >= 0 && (x as usize) < WIDTH && (y as usize) < HEIGHT {
                self.set_pixel(x as usize, y as usize, color);
            }
        }
        Ok(())
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Self::Color) -> Result<(), Self::Error> {
        let x_start = (area.top_left.x.max(0) as usize).min(WIDTH);
        let y_start = (area.top_left.y.max(0) as usize).min(HEIGHT);
        let x_end = (area.top_left.x.max(0) as usize)
            .saturating_add(area.size.width as usize)
            .min(WIDTH);
        let y_end = (area.top_left.y.max(0) as usize)
            .saturating_add(area.size.height as usize)
            .min(HEIGHT);

        for y in y_start..y_end {
            for x in x_start..x_end {
                self.set_pixel(x, y, color);
            }
        }
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        for y in 0..HEIGHT {
            for x in 0..WIDTH {
                self.set_pixel(x, y, color);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_graphics::primitives::PrimitiveStyle;

    /// Downstream target that records the areas it was asked to fill.
    #[derive(Default)]
    struct Recorder {
        areas: heapless::Vec<Rectangle, 4>,
        pixels: u32,
    }

    impl OriginDimensions for Recorder {
        fn size(&self) -> Size {
            Size::new(DISPLAY_WIDTH_PX, DISPLAY_HEIGHT_PX)
        }
    }

    impl DrawTarget for Recorder {
        type Color = BinaryColor;
        type Error = Infallible;

        fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
        where
            I: IntoIterator<Item = Pixel<Self::Color>>,
        {
            self.pixels += pixels.into_iter().count() as u32;
            Ok(())
        }

        fn fill_contiguous<I>(&mut self, area: &Rectangle, colors: I) -> Result<(), Self::Error>
        where
            I: IntoIterator<Item = Self::Color>,
        {
            let _ = self.areas.push(*area);
            self.pixels += colors.into_iter().count() as u32;
            Ok(())
        }
    }

    #[test]
    fn test_new_buffer_is_blank_and_clean() {
        let fb = FrameBuffer::new();
        assert_eq!(fb.ink_count(), 0);
        assert!(fb.dirty_area().is_none());
    }

    #[test]
    fn test_dirty_rect_covers_changed_pixels_only() {
        let mut fb = FrameBuffer::new();
        Rectangle::new(Point::new(10, 20), Size::new(5, 3))
            .into_styled(PrimitiveStyle::with_fill(BinaryColor::On))
            .draw(&mut fb)
            .unwrap();

        assert_eq!(
            fb.dirty_area(),
            Some(Rectangle::new(Point::new(10, 20), Size::new(5, 3)))
        );
        assert_eq!(fb.ink_count(), 15);
        assert_eq!(fb.pixel(Point::new(12, 21)), Some(BinaryColor::On));
        assert_eq!(fb.pixel(Point::new(9, 21)), Some(BinaryColor::Off));
    }

    #[test]
    fn test_redrawing_identical_pixels_stays_clean() {
        let mut fb = FrameBuffer::new();
        fb.clear(BinaryColor::Off).unwrap();
        assert!(fb.dirty_area().is_none());
    }

    #[test]
    fn test_partial_flush_sends_dirty_box_then_resets() {
        let mut fb = FrameBuffer::new();
        Pixel(Point::new(3, 4), BinaryColor::On).draw(&mut fb).unwrap();
        Pixel(Point::new(7, 9), BinaryColor::On).draw(&mut fb).unwrap();

        let mut out = Recorder::default();
        fb.flush_partial(&mut out).unwrap();
        assert_eq!(
            out.areas.as_slice(),
            &[Rectangle::new(Point::new(3, 4), Size::new(5, 6))]
        );
        assert_eq!(out.pixels, 30);

        fb.flush_partial(&mut out).unwrap();
        assert_eq!(out.areas.len(), 1, "second flush must be a no-op");
    }

    #[test]
    fn test_full_flush_sends_every_pixel() {
        let mut fb = FrameBuffer::new();
        let mut out = Recorder::default();
        fb.flush_full(&mut out).unwrap();
        assert_eq!(out.pixels, DISPLAY_WIDTH_PX * DISPLAY_HEIGHT_PX);
    }

    #[test]
    fn test_out_of_bounds_pixels_are_ignored() {
        let mut fb = FrameBuffer::new();
        Pixel(Point::new(-1, 5), BinaryColor::On).draw(&mut fb).unwrap();
        Pixel(Point::new(200, 5), BinaryColor::On).draw(&mut fb).unwrap();
        assert_eq!(fb.ink_count(), 0);
        assert_eq!(fb.pixel(Point::new(200, 0)), None);
    }
}
