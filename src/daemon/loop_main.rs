//! Main loop: drain protocol events, sample, render, sleep, repeat.
//!
//! Single-threaded and cooperative. Each iteration:
//! 1. drains queued display events without blocking (resize, expose, tray
//!    announce, destroy) and dispatches them to icons and the dock manager;
//! 2. samples every metric source into its icon's history;
//! 3. renders every icon, but only while a tray container is known;
//! 4. sleeps for the sampling interval;
//! 5. flips the check-tick flag that paces alert blinking.
//!
//! There is no shutdown path; the loop ends only on a fatal error.

#![allow(missing_docs)]

use std::collections::HashMap;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::core::color::{Palette, Rgb};
use crate::core::config::Config;
use crate::core::errors::Result;
use crate::monitor::source::{CpuLoadSource, MemoryUsageSource, MetricSource};
use crate::platform::pal::Platform;
use crate::tray::display::{Display, DisplayEvent, WindowId};
use crate::tray::dock::{DockState, TrayDockManager};
use crate::tray::icon::IconSurface;

/// A metric source paired with the icon that plots it.
pub struct Gauge {
    source: Box<dyn MetricSource>,
    icon: IconSurface,
}

impl Gauge {
    #[must_use]
    pub fn new(source: Box<dyn MetricSource>, icon: IconSurface) -> Self {
        Self { source, icon }
    }

    /// Create the icon window for `source`, labelled after it.
    pub fn create<D: Display + ?Sized>(
        display: &mut D,
        source: Box<dyn MetricSource>,
        color: Rgb,
        threshold: f64,
        config: &Config,
    ) -> Result<Self> {
        let palette = Palette::new(color, config.colors.background, config.colors.alert);
        let icon = IconSurface::create(
            display,
            source.label(),
            palette,
            threshold,
            config.sampling.icon_size,
        )?;
        Ok(Self::new(source, icon))
    }

    #[must_use]
    pub fn icon(&self) -> &IconSurface {
        &self.icon
    }

    fn sample(&mut self) -> Result<()> {
        if let Some(value) = self.source.sample()? {
            tracing::trace!(metric = self.source.label(), value, "sample");
            self.icon.push(value);
        }
        Ok(())
    }
}

pub struct EventLoop<D: Display> {
    display: D,
    gauges: Vec<Gauge>,
    by_window: HashMap<WindowId, usize>,
    dock: TrayDockManager,
    interval: Duration,
    check_tick: bool,
}

impl<D: Display> EventLoop<D> {
    /// The standard pair of gauges: CPU load and memory usage.
    pub fn new(mut display: D, config: &Config, platform: Arc<dyn Platform>) -> Result<Self> {
        let cpu = Gauge::create(
            &mut display,
            Box::new(CpuLoadSource::new(Arc::clone(&platform))),
            config.colors.cpu,
            config.alerts.cpu_threshold,
            config,
        )?;
        let memory = Gauge::create(
            &mut display,
            Box::new(MemoryUsageSource::new(platform)),
            config.colors.memory,
            config.alerts.memory_threshold,
            config,
        )?;
        display.flush()?;
        Ok(Self::with_gauges(
            display,
            vec![cpu, memory],
            Duration::from_millis(config.sampling.interval_ms),
        ))
    }

    #[must_use]
    pub fn with_gauges(display: D, gauges: Vec<Gauge>, interval: Duration) -> Self {
        let by_window = gauges
            .iter()
            .enumerate()
            .map(|(index, gauge)| (gauge.icon.window(), index))
            .collect();
        let windows = gauges.iter().map(|gauge| gauge.icon.window()).collect();
        let dock = TrayDockManager::new(&display, windows);
        Self {
            display,
            gauges,
            by_window,
            dock,
            interval,
            check_tick: false,
        }
    }

    #[must_use]
    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn display_mut(&mut self) -> &mut D {
        &mut self.display
    }

    #[must_use]
    pub fn dock(&self) -> &TrayDockManager {
        &self.dock
    }

    #[must_use]
    pub fn gauges(&self) -> &[Gauge] {
        &self.gauges
    }

    #[must_use]
    pub fn check_tick(&self) -> bool {
        self.check_tick
    }

    pub fn toggle_check_tick(&mut self) {
        self.check_tick = !self.check_tick;
    }

    /// Initial tray lookup and docking.
    pub fn start(&mut self) -> Result<DockState> {
        self.dock.start(&mut self.display)
    }

    /// Run forever. Returns only with the error that stopped the loop.
    pub fn run(&mut self) -> Result<()> {
        self.start()?;
        loop {
            self.tick()?;
            thread::sleep(self.interval);
            self.toggle_check_tick();
        }
    }

    /// One iteration without the sleep: drain, sample, render.
    pub fn tick(&mut self) -> Result<()> {
        self.drain_events()?;
        for gauge in &mut self.gauges {
            gauge.sample()?;
        }
        if self.dock.has_container() {
            self.render_all()?;
        }
        self.display.flush()
    }

    /// Dispatch every queued event. Returns how many were handled.
    pub fn drain_events(&mut self) -> Result<usize> {
        let mut handled = 0;
        while let Some(event) = self.display.poll_event()? {
            self.dispatch(event)?;
            handled += 1;
        }
        if handled > 0 {
            self.display.flush()?;
        }
        Ok(handled)
    }

    fn dispatch(&mut self, event: DisplayEvent) -> Result<()> {
        match event {
            DisplayEvent::Exposed { window } => {
                let Some(&index) = self.by_window.get(&window) else {
                    tracing::debug!(window, "expose for unknown window");
                    return Ok(());
                };
                self.dock.on_icon_exposed(&mut self.display, window)?;
                let (width, height) = self.display.geometry(window)?;
                let icon = &mut self.gauges[index].icon;
                icon.resize(width, height);
                if self.dock.has_container() {
                    icon.render(&mut self.display, self.check_tick)?;
                }
            }
            DisplayEvent::Resized {
                window,
                width,
                height,
            } => {
                if let Some(&index) = self.by_window.get(&window) {
                    self.gauges[index].icon.resize(width, height);
                }
            }
            DisplayEvent::Destroyed { window } => {
                self.dock.on_destroyed(window);
            }
            DisplayEvent::TrayAnnounced { selection } => {
                if self.dock.on_tray_announced(&mut self.display, selection)?
                    && self.dock.has_container()
                {
                    self.render_all()?;
                }
            }
        }
        Ok(())
    }

    fn render_all(&mut self) -> Result<()> {
        for gauge in &self.gauges {
            gauge.icon.render(&mut self.display, self.check_tick)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{EventLoop, Gauge};
    use crate::core::color::{Palette, Rgb, Rgba};
    use crate::core::errors::Result;
    use crate::monitor::source::MetricSource;
    use crate::tray::display::{Display, DisplayEvent, MockDisplay};
    use crate::tray::dock::DockState;
    use crate::tray::icon::IconSurface;

    const TRAY: u32 = 0x0040_0010;

    /// Replays fixed values, then repeats the last one.
    struct Scripted {
        values: Vec<Option<f64>>,
        next: usize,
    }

    impl MetricSource for Scripted {
        fn label(&self) -> &'static str {
            "scripted"
        }

        fn sample(&mut self) -> Result<Option<f64>> {
            let value = self.values[self.next.min(self.values.len() - 1)];
            self.next += 1;
            Ok(value)
        }
    }

    fn event_loop(values: Vec<Option<f64>>) -> EventLoop<MockDisplay> {
        let mut display = MockDisplay::default();
        let palette = Palette::new(
            Rgb::new(0, 0xFF, 0),
            Rgb::new(0, 0, 0),
            Rgba::new(0xFF, 0, 0, 0xFF),
        );
        let icon = IconSurface::create(&mut display, "scripted", palette, 50.0, 48).unwrap();
        let gauge = Gauge::new(Box::new(Scripted { values, next: 0 }), icon);
        EventLoop::with_gauges(display, vec![gauge], Duration::from_millis(1))
    }

    fn window(lp: &EventLoop<MockDisplay>) -> u32 {
        lp.gauges()[0].icon().window()
    }

    #[test]
    fn nothing_is_drawn_without_a_tray() {
        let mut lp = event_loop(vec![Some(10.0)]);
        assert_eq!(lp.start().unwrap(), DockState::NoContainer);
        let win = window(&lp);
        lp.display_mut().resize_window(win, 4, 10);
        lp.tick().unwrap();
        assert!(lp.display().frames(win).is_empty());
        // Sampling still happened.
        assert_eq!(lp.gauges()[0].icon().latest(), Some(10.0));
    }

    #[test]
    fn resize_event_sizes_history_and_tick_draws() {
        let mut lp = event_loop(vec![Some(50.0)]);
        lp.display_mut().set_owner(Some(TRAY));
        lp.start().unwrap();
        let win = window(&lp);
        lp.display_mut().resize_window(win, 4, 10);
        lp.tick().unwrap();

        let frames = lp.display().frames(win);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].bars, vec![0, 0, 0, 5]);
    }

    #[test]
    fn expose_queries_geometry_redocks_and_repaints() {
        let mut lp = event_loop(vec![Some(50.0)]);
        lp.display_mut().set_owner(Some(TRAY));
        lp.start().unwrap();
        let win = window(&lp);
        lp.display_mut().take_requests();

        lp.display_mut().set_geometry(win, 3, 8);
        lp.display_mut()
            .queue_event(DisplayEvent::Exposed { window: win });
        assert_eq!(lp.drain_events().unwrap(), 1);

        assert_eq!(lp.gauges()[0].icon().size(), (3, 8));
        assert_eq!(lp.display().dock_requests(), vec![(TRAY, win)]);
        assert_eq!(lp.display().frames(win).len(), 1);
    }

    #[test]
    fn tray_restart_cycle() {
        let mut lp = event_loop(vec![Some(20.0)]);
        lp.start().unwrap();
        let win = window(&lp);
        let selection = lp.display().tray_selection();
        lp.display_mut().resize_window(win, 2, 10);

        lp.display_mut().set_owner(Some(TRAY));
        lp.display_mut()
            .queue_event(DisplayEvent::TrayAnnounced { selection });
        lp.tick().unwrap();
        assert_eq!(lp.dock().state(), DockState::HasContainer(TRAY));
        assert_eq!(lp.display().dock_requests(), vec![(TRAY, win)]);

        lp.display_mut().set_owner(None);
        lp.display_mut()
            .queue_event(DisplayEvent::Destroyed { window: TRAY });
        lp.display_mut().take_requests();
        lp.tick().unwrap();
        assert_eq!(lp.dock().state(), DockState::NoContainer);
        assert!(lp.display().frames(win).is_empty());
    }

    #[test]
    fn alert_blinks_on_alternate_ticks() {
        let mut lp = event_loop(vec![Some(90.0)]);
        lp.display_mut().set_owner(Some(TRAY));
        lp.start().unwrap();
        let win = window(&lp);
        lp.display_mut().resize_window(win, 2, 10);

        let mut alerts = Vec::new();
        for _ in 0..4 {
            lp.tick().unwrap();
            lp.toggle_check_tick();
        }
        for frame in lp.display().frames(win) {
            alerts.push(frame.alert);
        }
        assert_eq!(alerts, vec![false, true, false, true]);
    }

    #[test]
    fn suppressed_samples_are_not_pushed() {
        let mut lp = event_loop(vec![None, Some(30.0)]);
        let win = window(&lp);
        lp.display_mut().resize_window(win, 2, 10);
        lp.tick().unwrap();
        assert_eq!(lp.gauges()[0].icon().buffer().snapshot(), vec![0.0, 0.0]);
        lp.tick().unwrap();
        assert_eq!(lp.gauges()[0].icon().buffer().snapshot(), vec![0.0, 30.0]);
    }

    #[test]
    fn every_tick_flushes_once_when_idle() {
        let mut lp = event_loop(vec![Some(1.0)]);
        let before = lp.display().flush_count();
        lp.tick().unwrap();
        lp.tick().unwrap();
        assert_eq!(lp.display().flush_count(), before + 2);
    }

    #[test]
    fn events_for_unknown_windows_are_ignored() {
        let mut lp = event_loop(vec![Some(1.0)]);
        lp.display_mut().set_owner(Some(TRAY));
        lp.start().unwrap();
        lp.display_mut().take_requests();
        lp.display_mut()
            .queue_event(DisplayEvent::Exposed { window: 0xbeef });
        lp.display_mut().queue_event(DisplayEvent::Resized {
            window: TRAY,
            width: 200,
            height: 24,
        });
        assert_eq!(lp.drain_events().unwrap(), 2);
        assert!(lp.display().requests().is_empty());
        assert_eq!(lp.dock().state(), DockState::HasContainer(TRAY));
    }
}
