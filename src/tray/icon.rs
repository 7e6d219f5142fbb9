//! One tray icon: window handle, geometry, colors and its sparkline history.

#![allow(missing_docs)]

use crate::core::color::{Palette, Rgb};
use crate::core::errors::Result;
use crate::monitor::ring_buffer::RingBuffer;
use crate::tray::display::{Display, WindowId};

/// Everything needed to paint one icon, independent of the protocol.
///
/// The backend fills `width x height` with `background`, then for column `i`
/// draws a vertical line of `bars[i]` pixels up from the bottom edge in
/// `foreground`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub width: u16,
    pub height: u16,
    pub background: Rgb,
    pub foreground: Rgb,
    pub alert: bool,
    pub bars: Vec<i32>,
}

/// Pixel height of a bar for a percentage sample, rounded half-up.
///
/// Not clamped: values outside `[0, 100]` give bars that overflow or invert.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn bar_height(value: f64, height: u16) -> i32 {
    (value / 100.0 * f64::from(height) + 0.5) as i32
}

#[derive(Debug)]
pub struct IconSurface {
    label: String,
    window: WindowId,
    buffer: RingBuffer,
    width: u16,
    height: u16,
    palette: Palette,
    alert_threshold: f64,
}

impl IconSurface {
    /// Register a window named `label` and start with an inactive history.
    pub fn create<D: Display + ?Sized>(
        display: &mut D,
        label: &str,
        palette: Palette,
        alert_threshold: f64,
        size: u16,
    ) -> Result<Self> {
        let window = display.create_icon_window(label, size, size)?;
        tracing::debug!(label, window, "created icon window");
        Ok(Self::from_parts(label, window, palette, alert_threshold, size))
    }

    /// Surface for an already existing window.
    #[must_use]
    pub fn from_parts(
        label: &str,
        window: WindowId,
        palette: Palette,
        alert_threshold: f64,
        size: u16,
    ) -> Self {
        Self {
            label: label.to_string(),
            window,
            buffer: RingBuffer::new(),
            width: size,
            height: size,
            palette,
            alert_threshold,
        }
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[must_use]
    pub fn window(&self) -> WindowId {
        self.window
    }

    #[must_use]
    pub fn size(&self) -> (u16, u16) {
        (self.width, self.height)
    }

    #[must_use]
    pub fn buffer(&self) -> &RingBuffer {
        &self.buffer
    }

    /// Apply host geometry. History is dropped only when the width changes.
    ///
    /// Returns whether the history was reset.
    pub fn resize(&mut self, width: u16, height: u16) -> bool {
        let reset = usize::from(width) != self.buffer.capacity();
        if reset {
            tracing::debug!(
                label = %self.label,
                from = self.buffer.capacity(),
                to = width,
                "resizing sparkline history"
            );
            self.buffer.init(usize::from(width));
        }
        self.width = width;
        self.height = height;
        reset
    }

    pub fn push(&mut self, value: f64) {
        self.buffer.push(value);
    }

    #[must_use]
    pub fn latest(&self) -> Option<f64> {
        self.buffer.latest()
    }

    /// Alert colors apply only on check ticks, so an icon over its threshold
    /// blinks at half the tick rate.
    #[must_use]
    pub fn is_alerting(&self, check_tick: bool) -> bool {
        check_tick && self.latest().is_some_and(|v| v > self.alert_threshold)
    }

    /// Paint description for this tick, or `None` while the history is inactive.
    #[must_use]
    pub fn frame(&self, check_tick: bool) -> Option<Frame> {
        if !self.buffer.is_active() {
            return None;
        }
        let alert = self.is_alerting(check_tick);
        let (foreground, background) = self.palette.pair(alert);
        Some(Frame {
            width: self.width,
            height: self.height,
            background,
            foreground,
            alert,
            bars: self
                .buffer
                .iter()
                .map(|value| bar_height(value, self.height))
                .collect(),
        })
    }

    /// Draw the current frame. Returns whether anything was drawn.
    pub fn render<D: Display + ?Sized>(&self, display: &mut D, check_tick: bool) -> Result<bool> {
        let Some(frame) = self.frame(check_tick) else {
            return Ok(false);
        };
        display.draw(self.window, &frame)?;
        Ok(true)
    }
}
