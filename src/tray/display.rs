//! Windowing-protocol seam: the calls the tray logic makes, and a recording mock.

#![allow(missing_docs)]

use std::collections::{HashMap, VecDeque};

use crate::core::errors::{Result, XsmonError};
use crate::tray::icon::Frame;

/// Protocol-level window handle.
pub type WindowId = u32;

/// Protocol-level atom handle.
pub type AtomId = u32;

/// Notifications the tray logic reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayEvent {
    /// Window was made visible or needs a redraw.
    Exposed { window: WindowId },
    /// Host changed the window geometry.
    Resized {
        window: WindowId,
        width: u16,
        height: u16,
    },
    /// Window was destroyed.
    Destroyed { window: WindowId },
    /// A client took ownership of `selection` (`MANAGER` broadcast).
    TrayAnnounced { selection: AtomId },
}

/// Connection to the display server, as seen by the tray logic.
pub trait Display {
    /// Create a named, unmapped icon window.
    fn create_icon_window(&mut self, label: &str, width: u16, height: u16) -> Result<WindowId>;
    /// Current size of `window`.
    fn geometry(&mut self, window: WindowId) -> Result<(u16, u16)>;
    /// Paint `frame` into `window`.
    fn draw(&mut self, window: WindowId, frame: &Frame) -> Result<()>;
    /// The tray selection this connection tracks (`_NET_SYSTEM_TRAY_S<n>`).
    fn tray_selection(&self) -> AtomId;
    /// Current owner of the tray selection.
    fn tray_owner(&mut self) -> Result<Option<WindowId>>;
    /// Subscribe to structural notifications (destruction) of `container`.
    fn watch_container(&mut self, container: WindowId) -> Result<()>;
    /// Ask `container` to embed `icon`.
    fn send_dock_request(&mut self, container: WindowId, icon: WindowId) -> Result<()>;
    /// Next queued event, without blocking.
    fn poll_event(&mut self) -> Result<Option<DisplayEvent>>;
    fn flush(&mut self) -> Result<()>;
}

/// Protocol traffic recorded by [`MockDisplay`].
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    Watch { container: WindowId },
    Dock { container: WindowId, icon: WindowId },
    Draw { window: WindowId, frame: Frame },
}

#[derive(Debug, Clone)]
struct MockWindow {
    label: String,
    width: u16,
    height: u16,
}

/// In-memory display for deterministic tests.
#[derive(Debug)]
pub struct MockDisplay {
    selection: AtomId,
    owner: Option<WindowId>,
    next_id: WindowId,
    windows: HashMap<WindowId, MockWindow>,
    events: VecDeque<DisplayEvent>,
    requests: Vec<Request>,
    flushes: usize,
}

impl Default for MockDisplay {
    fn default() -> Self {
        Self::new(0x1a0)
    }
}

impl MockDisplay {
    #[must_use]
    pub fn new(selection: AtomId) -> Self {
        Self {
            selection,
            owner: None,
            next_id: 0x0060_0001,
            windows: HashMap::new(),
            events: VecDeque::new(),
            requests: Vec::new(),
            flushes: 0,
        }
    }

    /// Change the selection owner without announcing it.
    pub fn set_owner(&mut self, owner: Option<WindowId>) {
        self.owner = owner;
    }

    pub fn queue_event(&mut self, event: DisplayEvent) {
        self.events.push_back(event);
    }

    /// Host-side resize: updates the stored geometry and queues the notification.
    pub fn resize_window(&mut self, window: WindowId, width: u16, height: u16) {
        if let Some(entry) = self.windows.get_mut(&window) {
            entry.width = width;
            entry.height = height;
        }
        self.queue_event(DisplayEvent::Resized {
            window,
            width,
            height,
        });
    }

    /// Host-side geometry change with no notification.
    pub fn set_geometry(&mut self, window: WindowId, width: u16, height: u16) {
        if let Some(entry) = self.windows.get_mut(&window) {
            entry.width = width;
            entry.height = height;
        }
    }

    #[must_use]
    pub fn label(&self, window: WindowId) -> Option<&str> {
        self.windows.get(&window).map(|w| w.label.as_str())
    }

    #[must_use]
    pub fn requests(&self) -> &[Request] {
        &self.requests
    }

    pub fn take_requests(&mut self) -> Vec<Request> {
        std::mem::take(&mut self.requests)
    }

    #[must_use]
    pub fn dock_requests(&self) -> Vec<(WindowId, WindowId)> {
        self.requests
            .iter()
            .filter_map(|req| match req {
                Request::Dock { container, icon } => Some((*container, *icon)),
                _ => None,
            })
            .collect()
    }

    #[must_use]
    pub fn frames(&self, window: WindowId) -> Vec<&Frame> {
        self.requests
            .iter()
            .filter_map(|req| match req {
                Request::Draw { window: w, frame } if *w == window => Some(frame),
                _ => None,
            })
            .collect()
    }

    #[must_use]
    pub fn flush_count(&self) -> usize {
        self.flushes
    }

    fn window(&self, window: WindowId) -> Result<&MockWindow> {
        self.windows
            .get(&window)
            .ok_or_else(|| XsmonError::protocol("GetGeometry", format!("BadWindow {window:#x}")))
    }
}

impl Display for MockDisplay {
    fn create_icon_window(&mut self, label: &str, width: u16, height: u16) -> Result<WindowId> {
        let id = self.next_id;
        self.next_id += 1;
        self.windows.insert(
            id,
            MockWindow {
                label: label.to_string(),
                width,
                height,
            },
        );
        Ok(id)
    }

    fn geometry(&mut self, window: WindowId) -> Result<(u16, u16)> {
        let entry = self.window(window)?;
        Ok((entry.width, entry.height))
    }

    fn draw(&mut self, window: WindowId, frame: &Frame) -> Result<()> {
        self.window(window)?;
        self.requests.push(Request::Draw {
            window,
            frame: frame.clone(),
        });
        Ok(())
    }

    fn tray_selection(&self) -> AtomId {
        self.selection
    }

    fn tray_owner(&mut self) -> Result<Option<WindowId>> {
        Ok(self.owner)
    }

    fn watch_container(&mut self, container: WindowId) -> Result<()> {
        self.requests.push(Request::Watch { container });
        Ok(())
    }

    fn send_dock_request(&mut self, container: WindowId, icon: WindowId) -> Result<()> {
        self.requests.push(Request::Dock { container, icon });
        Ok(())
    }

    fn poll_event(&mut self) -> Result<Option<DisplayEvent>> {
        Ok(self.events.pop_front())
    }

    fn flush(&mut self) -> Result<()> {
        self.flushes += 1;
        Ok(())
    }
}
