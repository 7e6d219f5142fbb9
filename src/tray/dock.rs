//! Tray docking lifecycle: find the tray container, ask it to embed our icons,
//! and follow it as it is replaced or destroyed.
//!
//! ```text
//!   NoContainer --(startup lookup finds owner | MANAGER for our selection)--> HasContainer
//!   HasContainer --(MANAGER for our selection)--> HasContainer (new owner, icons re-docked)
//!   HasContainer --(DestroyNotify for current container)--> NoContainer
//! ```
//!
//! Absence of a tray is a normal state, not an error: icons stay undocked and
//! are not drawn until a container shows up.

#![allow(missing_docs)]

use crate::core::errors::Result;
use crate::tray::display::{AtomId, Display, WindowId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DockState {
    NoContainer,
    HasContainer(WindowId),
}

#[derive(Debug)]
pub struct TrayDockManager {
    selection: AtomId,
    state: DockState,
    icons: Vec<WindowId>,
}

impl TrayDockManager {
    /// Manager for `icons`, tracking the display's tray selection.
    #[must_use]
    pub fn new<D: Display + ?Sized>(display: &D, icons: Vec<WindowId>) -> Self {
        Self {
            selection: display.tray_selection(),
            state: DockState::NoContainer,
            icons,
        }
    }

    #[must_use]
    pub const fn state(&self) -> DockState {
        self.state
    }

    #[must_use]
    pub const fn container(&self) -> Option<WindowId> {
        match self.state {
            DockState::NoContainer => None,
            DockState::HasContainer(window) => Some(window),
        }
    }

    #[must_use]
    pub const fn has_container(&self) -> bool {
        matches!(self.state, DockState::HasContainer(_))
    }

    /// Initial lookup. Docks every icon if a tray is already running.
    pub fn start<D: Display + ?Sized>(&mut self, display: &mut D) -> Result<DockState> {
        match display.tray_owner()? {
            Some(owner) => self.adopt(display, owner)?,
            None => tracing::info!("no system tray running, waiting for one to appear"),
        }
        Ok(self.state)
    }

    /// A `MANAGER` broadcast. Only our own selection triggers a re-dock.
    ///
    /// Returns whether the announcement concerned our selection.
    pub fn on_tray_announced<D: Display + ?Sized>(
        &mut self,
        display: &mut D,
        selection: AtomId,
    ) -> Result<bool> {
        if selection != self.selection {
            tracing::debug!(selection, "ignoring MANAGER for another selection");
            return Ok(false);
        }
        match display.tray_owner()? {
            Some(owner) => self.adopt(display, owner)?,
            None => self.set_state(DockState::NoContainer),
        }
        Ok(true)
    }

    /// A destroy notification. Only the current container matters.
    ///
    /// Returns whether the state changed.
    pub fn on_destroyed(&mut self, window: WindowId) -> bool {
        if self.container() != Some(window) {
            return false;
        }
        tracing::info!(container = window, "system tray went away");
        self.set_state(DockState::NoContainer);
        true
    }

    /// An icon became visible or needs redrawing: re-assert its docking.
    ///
    /// The owner is looked up again first, so a tray that appeared without
    /// us seeing its announcement is picked up here.
    /// With no owner there is no window to address, so nothing is sent.
    pub fn on_icon_exposed<D: Display + ?Sized>(
        &mut self,
        display: &mut D,
        icon: WindowId,
    ) -> Result<()> {
        match display.tray_owner()? {
            Some(owner) if Some(owner) != self.container() => self.adopt(display, owner),
            Some(owner) => self.send_dock(display, owner, icon),
            None => {
                self.set_state(DockState::NoContainer);
                Ok(())
            }
        }
    }

    fn adopt<D: Display + ?Sized>(&mut self, display: &mut D, owner: WindowId) -> Result<()> {
        tracing::info!(container = owner, "docking into system tray");
        self.set_state(DockState::HasContainer(owner));
        display.watch_container(owner)?;
        for icon in self.icons.clone() {
            self.send_dock(display, owner, icon)?;
        }
        display.flush()
    }

    fn send_dock<D: Display + ?Sized>(
        &self,
        display: &mut D,
        container: WindowId,
        icon: WindowId,
    ) -> Result<()> {
        tracing::debug!(container, icon, "sending dock request");
        display.send_dock_request(container, icon)
    }

    fn set_state(&mut self, state: DockState) {
        if self.state != state {
            tracing::debug!(from = ?self.state, to = ?state, "dock state change");
        }
        self.state = state;
    }
}
