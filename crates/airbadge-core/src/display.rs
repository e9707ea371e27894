//! Display state machine for the e-ink panel
//!
//! Drawing is a two-phase commit: a frame is first cleared and composed into
//! the panel's draw target, then [`EinkPanel::submit`] pushes it to the glass
//! with either a full-window or a partial-window refresh.
//!
//! Full-window draws ([`DisplayManager::show`]) are never rate limited.
//! Partial-window draws ([`DisplayManager::request`]) are honoured at most
//! once per `partial_refresh_interval` for each screen; requests arriving
//! sooner are dropped.

use core::fmt::Debug;

use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Instant};
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use log::{debug, error, info};

use crate::screens::Frame;

/// Screens the badge can show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Screen {
    Home,
    Values,
    CalibrationPrompt,
    CalibrationResult,
    ShutdownNotice,
}

impl Screen {
    pub const COUNT: usize = 5;

    const fn index(self) -> usize {
        match self {
            Screen::Home => 0,
            Screen::Values => 1,
            Screen::CalibrationPrompt => 2,
            Screen::CalibrationResult => 3,
            Screen::ShutdownNotice => 4,
        }
    }
}

/// Which part of the panel a submit refreshes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshWindow {
    /// Whole panel, with the flashing clean cycle
    Full,
    /// Only the changed region, faster but ghosts over time
    Partial,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

/// The e-ink panel as seen by the badge.
///
/// Paging, partial-window timing and power sequencing are the driver's job.
pub trait EinkPanel: DrawTarget<Color = BinaryColor> {
    fn set_rotation(&mut self, rotation: Rotation);

    /// Push everything composed since the previous submit to the glass.
    fn submit(&mut self, window: RefreshWindow) -> Result<(), Self::Error>;

    /// Final refresh before the panel loses power. `charge_hint` tells the
    /// driver that external power was seen during the previous cycle.
    fn present(&mut self, charge_hint: bool) -> Result<(), Self::Error>;

    fn power_off(&mut self) -> Result<(), Self::Error>;
}

/// Result of a draw attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedrawOutcome {
    Drawn,
    /// Dropped by the partial-refresh rate limit
    Coalesced,
    /// The panel reported an error; nothing was committed
    Failed,
}

/// Counters for what happened to draw attempts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DisplayStats {
    pub full: u32,
    pub partial: u32,
    pub coalesced: u32,
    pub failed: u32,
}

/// Owns the panel and decides which frames reach it.
pub struct DisplayManager<P> {
    panel: P,
    active: Option<Screen>,
    last_draw: [Option<Instant>; Screen::COUNT],
    partial_interval: Duration,
    draw_ready: Signal<NoopRawMutex, ()>,
    stats: DisplayStats,
}

impl<P> DisplayManager<P>
where
    P: EinkPanel,
    P::Error: Debug,
{
    pub fn new(mut panel: P, partial_interval: Duration) -> Self {
        panel.set_rotation(Rotation::Deg0);
        Self {
            panel,
            active: None,
            last_draw: [None; Screen::COUNT],
            partial_interval,
            draw_ready: Signal::new(),
            stats: DisplayStats::default(),
        }
    }

    /// Full-window draw.
    pub fn show(&mut self, frame: &Frame, now: Instant) -> RedrawOutcome {
        self.draw(frame, RefreshWindow::Full, now)
    }

    /// Partial-window draw, subject to the per-screen rate limit.
    pub fn request(&mut self, frame: &Frame, now: Instant) -> RedrawOutcome {
        let screen = frame.screen();
        if let Some(last) = self.last_draw[screen.index()] {
            let elapsed = now.checked_duration_since(last).unwrap_or(Duration::from_ticks(0));
            if elapsed < self.partial_interval {
                debug!(
                    "Coalesced {:?} redraw ({} ms since last)",
                    screen,
                    elapsed.as_millis()
                );
                self.stats.coalesced += 1;
                return RedrawOutcome::Coalesced;
            }
        }
        self.draw(frame, RefreshWindow::Partial, now)
    }

    fn draw(&mut self, frame: &Frame, window: RefreshWindow, now: Instant) -> RedrawOutcome {
        let screen = frame.screen();
        if let Err(e) = self.compose_and_submit(frame, window) {
            error!("Failed to draw {:?}: {:?}", screen, e);
            self.stats.failed += 1;
            return RedrawOutcome::Failed;
        }

        debug!("Drew {:?} ({:?} window)", screen, window);
        match window {
            RefreshWindow::Full => self.stats.full += 1,
            RefreshWindow::Partial => self.stats.partial += 1,
        }
        self.active = Some(screen);
        self.last_draw[screen.index()] = Some(now);
        if screen == Screen::Values {
            self.draw_ready.signal(());
        }
        RedrawOutcome::Drawn
    }

    fn compose_and_submit(&mut self, frame: &Frame, window: RefreshWindow) -> Result<(), P::Error> {
        if frame.clears_background() {
            self.panel.clear(BinaryColor::Off)?;
        }
        frame.draw(&mut self.panel)?;
        self.panel.submit(window)
    }

    /// Final refresh and panel shutdown ahead of a suspend.
    ///
    /// Failures are logged; the caller suspends regardless.
    pub fn shut_down(&mut self, charge_hint: bool) {
        if let Err(e) = self.panel.present(charge_hint) {
            error!("Panel present failed: {:?}", e);
        }
        if let Err(e) = self.panel.power_off() {
            error!("Panel power off failed: {:?}", e);
        }
        info!("Display powered off");
    }

    /// Whether a values frame has been committed since the last clear.
    pub fn draw_ready(&self) -> bool {
        self.draw_ready.signaled()
    }

    pub fn clear_draw_ready(&self) {
        self.draw_ready.reset();
    }

    pub fn active_screen(&self) -> Option<Screen> {
        self.active
    }

    pub fn last_draw(&self, screen: Screen) -> Option<Instant> {
        self.last_draw[screen.index()]
    }

    pub fn stats(&self) -> DisplayStats {
        self.stats
    }

    pub fn panel(&self) -> &P {
        &self.panel
    }

    pub fn panel_mut(&mut self) -> &mut P {
        &mut self.panel
    }
}
