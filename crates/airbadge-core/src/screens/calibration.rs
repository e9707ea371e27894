//! CO2 calibration prompt and its result screen

use core::fmt::Write;

use embedded_graphics::mono_font::ascii::{FONT_6X10, FONT_9X15};
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::text::{Alignment, Baseline, Text, TextStyleBuilder};
use heapless::String;

use super::{CENTER_Y, draw_main_value, ink};
use crate::framebuffer::DISPLAY_WIDTH_PX;
use crate::sensors::Reading;

/// Prompt text and its offset below the vertical center.
const PROMPT_LINES: [(&str, i32); 4] = [
    ("CO2 CALIBRATION:", 25),
    ("Send command?", 45),
    ("CENTER:    YES", 65),
    ("DOWN  :    NO", 85),
];

pub(super) fn draw_prompt<D>(
    co2: Option<&Reading>,
    countdown: u16,
    target: &mut D,
) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    draw_main_value(co2, target)?;

    for (line, offset) in PROMPT_LINES {
        Text::with_baseline(
            line,
            Point::new(10, CENTER_Y + offset),
            ink(&FONT_9X15),
            Baseline::Top,
        )
        .draw(target)?;
    }

    let mut remaining: String<6> = String::new();
    let _ = write!(remaining, "{}", countdown);
    let top_right = TextStyleBuilder::new()
        .alignment(Alignment::Right)
        .baseline(Baseline::Top)
        .build();
    Text::with_text_style(
        &remaining,
        Point::new(DISPLAY_WIDTH_PX as i32 - 4, 4),
        ink(&FONT_6X10),
        top_right,
    )
    .draw(target)?;
    Ok(())
}

pub(super) fn draw_result<D>(success: bool, target: &mut D) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    let message = if success {
        "!!CALIBRATED!!"
    } else {
        "CALIBRATION FAILED"
    };
    Text::with_baseline(
        message,
        Point::new(10, CENTER_Y - 20),
        ink(&FONT_9X15),
        Baseline::Top,
    )
    .draw(target)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framebuffer::FrameBuffer;

    #[test]
    fn test_countdown_changes_only_the_corner() {
        let mut sixty = FrameBuffer::new();
        draw_prompt(None, 60, &mut sixty).unwrap();
        let mut fifty_nine = FrameBuffer::new();
        draw_prompt(None, 59, &mut fifty_nine).unwrap();

        let mut differing_rows = heapless::Vec::<i32, 200>::new();
        for y in 0..200 {
            let row_differs = (0..200).any(|x| {
                let p = Point::new(x, y);
                sixty.pixel(p) != fifty_nine.pixel(p)
            });
            if row_differs {
                let _ = differing_rows.push(y);
            }
        }
        assert!(!differing_rows.is_empty());
        assert!(differing_rows.iter().all(|&y| y < 20));
    }

    #[test]
    fn test_result_messages_differ() {
        let mut ok = FrameBuffer::new();
        draw_result(true, &mut ok).unwrap();
        let mut failed = FrameBuffer::new();
        draw_result(false, &mut failed).unwrap();
        let differs = (0..200)
            .flat_map(|y| (0..200).map(move |x| Point::new(x, y)))
            .any(|p| ok.pixel(p) != failed.pixel(p));
        assert!(differs);
    }
}
