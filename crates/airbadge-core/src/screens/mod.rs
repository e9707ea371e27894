//! Screen templates drawn onto the e-ink panel
//!
//! Each template renders into any `DrawTarget<Color = BinaryColor>`; the
//! [`DisplayManager`](crate::display::DisplayManager) decides when and with
//! which refresh window a [`Frame`] reaches the panel.
//!
//! [`Frame`] is one enum holding the data of whichever template is being
//! drawn, dispatching to the concrete renderer without trait objects.

mod calibration;
mod home;
mod notice;
mod values;

use core::fmt::Write;

use embedded_graphics::mono_font::{MonoTextStyle, ascii::FONT_6X10, ascii::FONT_10X20};
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use embedded_graphics::text::{Baseline, Text};
use embedded_layout::align::{Align, horizontal, vertical};
use heapless::String;

use crate::display::Screen;
use crate::framebuffer::{DISPLAY_HEIGHT_PX, DISPLAY_WIDTH_PX};
use crate::roles::RoleSnapshot;
use crate::sensors::Reading;

/// Vertical center of the panel, the anchor for most layouts.
pub(crate) const CENTER_Y: i32 = DISPLAY_HEIGHT_PX as i32 / 2;

/// Left margin of text rows in pixels.
pub(crate) const ROW_X_PX: i32 = 11;

/// Band in which the large primary value is centered.
const MAIN_VALUE_BAND: Rectangle = Rectangle::new(
    Point::new(0, CENTER_Y - 50),
    Size::new(DISPLAY_WIDTH_PX, 30),
);

/// Band in which the "name / symbol" caption is centered.
const CAPTION_BAND: Rectangle = Rectangle::new(
    Point::new(0, CENTER_Y - 18),
    Size::new(DISPLAY_WIDTH_PX, 14),
);

/// Ink on paper for the given font.
pub(crate) fn ink(
    font: &'static embedded_graphics::mono_font::MonoFont<'static>,
) -> MonoTextStyle<'static, BinaryColor> {
    MonoTextStyle::new(font, BinaryColor::On)
}

/// Content of one frame, tagged by the screen it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Home,
    Values(RoleSnapshot),
    CalibrationPrompt {
        co2: Option<Reading>,
        countdown: u16,
    },
    CalibrationResult {
        success: bool,
    },
    ShutdownNotice,
}

impl Frame {
    pub fn screen(&self) -> Screen {
        match self {
            Frame::Home => Screen::Home,
            Frame::Values(_) => Screen::Values,
            Frame::CalibrationPrompt { .. } => Screen::CalibrationPrompt,
            Frame::CalibrationResult { .. } => Screen::CalibrationResult,
            Frame::ShutdownNotice => Screen::ShutdownNotice,
        }
    }

    /// Whether the frame starts from blank paper.
    ///
    /// The shutdown notice is an overlay printed on top of whatever the panel
    /// already shows.
    pub fn clears_background(&self) -> bool {
        !matches!(self, Frame::ShutdownNotice)
    }

    pub fn draw<D>(&self, target: &mut D) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = BinaryColor>,
    {
        match self {
            Frame::Home => home::draw(target),
            Frame::Values(snapshot) => values::draw(snapshot, target),
            Frame::CalibrationPrompt { co2, countdown } => {
                calibration::draw_prompt(co2.as_ref(), *countdown, target)
            }
            Frame::CalibrationResult { success } => calibration::draw_result(*success, target),
            Frame::ShutdownNotice => notice::draw(target),
        }
    }
}

/// Large zero-padded value with its "name / symbol" caption underneath.
///
/// Shared by the values screen and the calibration prompt.
pub(crate) fn draw_main_value<D>(reading: Option<&Reading>, target: &mut D) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    let mut value: String<8> = String::new();
    let mut caption: String<40> = String::new();
    match reading {
        Some(reading) => {
            let _ = write!(value, "{:04}", reading.whole_value());
            let _ = write!(caption, "{} / {}", reading.name, reading.symbol);
        }
        None => {
            let _ = value.push_str("----");
        }
    }

    Text::with_baseline(&value, Point::zero(), ink(&FONT_10X20), Baseline::Top)
        .align_to(&MAIN_VALUE_BAND, horizontal::Center, vertical::Center)
        .draw(target)?;

    if !caption.is_empty() {
        Text::with_baseline(&caption, Point::zero(), ink(&FONT_6X10), Baseline::Top)
            .align_to(&CAPTION_BAND, horizontal::Center, vertical::Center)
            .draw(target)?;
    }
    Ok(())
}
