//! Transient "restarting" overlay shown when calibration is cancelled

use embedded_graphics::mono_font::ascii::FONT_6X10;
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};
use embedded_graphics::text::{Baseline, Text};

use super::ink;
use crate::framebuffer::DISPLAY_WIDTH_PX;

/// Top of the strip the notice occupies at the bottom of the panel.
const NOTICE_TOP_PX: i32 = 182;

pub(super) fn draw<D>(target: &mut D) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    // Blank only the strip so the last values stay readable above it.
    Rectangle::new(Point::new(0, NOTICE_TOP_PX), Size::new(DISPLAY_WIDTH_PX, 18))
        .into_styled(PrimitiveStyle::with_fill(BinaryColor::Off))
        .draw(target)?;

    Text::with_baseline(
        "Restarting..",
        Point::new(10, NOTICE_TOP_PX + 4),
        ink(&FONT_6X10),
        Baseline::Top,
    )
    .draw(target)?;
    Ok(())
}
