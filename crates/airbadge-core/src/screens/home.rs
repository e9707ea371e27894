//! Start-of-day splash
//!
//! Shown full-window at boot and when the user asks for a refresh, while the
//! sensors warm up.

use embedded_graphics::mono_font::ascii::FONT_10X20;
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::text::{Alignment, Text};

use super::{CENTER_Y, ink};
use crate::framebuffer::DISPLAY_WIDTH_PX;

pub(super) fn draw<D>(target: &mut D) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    Text::with_alignment(
        "0000",
        Point::new(DISPLAY_WIDTH_PX as i32 / 2, CENTER_Y - 30),
        ink(&FONT_10X20),
        Alignment::Center,
    )
    .draw(target)?;
    Ok(())
}
