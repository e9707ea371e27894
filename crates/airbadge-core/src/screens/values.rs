//! Main values screen: the primary reading plus four detail rows

use core::fmt::Write;

use embedded_graphics::mono_font::ascii::FONT_9X15;
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::text::{Baseline, Text};
use heapless::String;

use super::{CENTER_Y, ROW_X_PX, draw_main_value, ink};
use crate::roles::RoleSnapshot;
use crate::sensors::Reading;

/// Row offsets below the vertical center.
const ROW_OFFSETS: [i32; 4] = [25, 45, 65, 85];

pub(super) fn draw<D>(snapshot: &RoleSnapshot, target: &mut D) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    draw_main_value(snapshot.primary.as_ref(), target)?;

    let rows = [
        secondary_row(snapshot.secondary.as_ref()),
        temperature_row(snapshot.temperature.as_ref()),
        humidity_row(snapshot.humidity.as_ref()),
        auxiliary_row(snapshot.auxiliary.as_ref()),
    ];

    for (row, offset) in rows.iter().zip(ROW_OFFSETS) {
        Text::with_baseline(
            row,
            Point::new(ROW_X_PX, CENTER_Y + offset),
            ink(&FONT_9X15),
            Baseline::Top,
        )
        .draw(target)?;
    }
    Ok(())
}

type Row = String<24>;

fn secondary_row(reading: Option<&Reading>) -> Row {
    let mut row = Row::new();
    let _ = match reading {
        Some(r) => write!(row, "{:>5}: {:04}", r.name.as_str(), r.whole_value()),
        None => write!(row, "{:>5}: --", ""),
    };
    row
}

fn temperature_row(reading: Option<&Reading>) -> Row {
    let mut row = Row::new();
    let _ = match reading {
        Some(r) => write!(row, " Temp: {:.1}C", r.value),
        None => write!(row, " Temp: --"),
    };
    row
}

fn humidity_row(reading: Option<&Reading>) -> Row {
    let mut row = Row::new();
    let _ = match reading {
        Some(r) => write!(row, " Humi: {:.1}%", r.value),
        None => write!(row, " Humi: --"),
    };
    row
}

fn auxiliary_row(reading: Option<&Reading>) -> Row {
    let mut row = Row::new();
    let _ = match reading {
        Some(r) => write!(row, "{:>5}: {:04.1}", r.name.as_str(), r.value),
        None => write!(row, "{:>5}: --", ""),
    };
    row
}
