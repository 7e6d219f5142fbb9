//! X11 backend for [`Display`], speaking the freedesktop system-tray protocol.
//!
//! The tray is whoever owns `_NET_SYSTEM_TRAY_S<screen>`. Docking is a
//! `_NET_SYSTEM_TRAY_OPCODE` client message sent to that owner. A new owner
//! announces itself with a `MANAGER` client message on the root window, which
//! is why the root window's StructureNotify events are selected at connect time.

#![allow(missing_docs)]

use std::collections::HashMap;

use x11rb::connection::Connection;
use x11rb::protocol::Event;
use x11rb::protocol::xproto::{
    Atom, AtomEnum, ChangeGCAux, ChangeWindowAttributesAux, ClientMessageEvent, ConnectionExt as _,
    CreateGCAux, CreateWindowAux, EventMask, Gcontext, PropMode, Rectangle, Segment, Visualid,
    Window, WindowClass,
};
use x11rb::rust_connection::RustConnection;
use x11rb::wrapper::ConnectionExt as _;
use x11rb::{COPY_DEPTH_FROM_PARENT, CURRENT_TIME, NONE};

use crate::core::errors::{Result, XsmonError};
use crate::tray::display::{AtomId, Display, DisplayEvent, WindowId};
use crate::tray::icon::Frame;

const SYSTEM_TRAY_REQUEST_DOCK: u32 = 0;
const XEMBED_VERSION: u32 = 0;
const XEMBED_MAPPED: u32 = 1 << 0;

x11rb::atom_manager! {
    pub Atoms: AtomsCookie {
        MANAGER,
        UTF8_STRING,
        _NET_WM_NAME,
        _NET_SYSTEM_TRAY_OPCODE,
        _XEMBED_INFO,
    }
}

/// Attach the failing request name to any x11rb error.
trait During<T> {
    fn during(self, operation: &'static str) -> Result<T>;
}

impl<T, E: std::fmt::Display> During<T> for std::result::Result<T, E> {
    fn during(self, operation: &'static str) -> Result<T> {
        self.map_err(|error| XsmonError::protocol(operation, error))
    }
}

pub struct X11Display {
    conn: RustConnection,
    root: Window,
    root_visual: Visualid,
    black_pixel: u32,
    atoms: Atoms,
    tray_selection: Atom,
    gcs: HashMap<Window, Gcontext>,
}

impl X11Display {
    /// Connect to `display_name` (or `$DISPLAY`) and prepare tray tracking.
    pub fn connect(display_name: Option<&str>) -> Result<Self> {
        let (conn, screen_num) = x11rb::connect(display_name)?;
        let screen = conn
            .setup()
            .roots
            .get(screen_num)
            .ok_or_else(|| XsmonError::Connection {
                details: format!("server reported no screen {screen_num}"),
            })?;
        let (root, root_visual, black_pixel) =
            (screen.root, screen.root_visual, screen.black_pixel);

        let atoms = Atoms::new(&conn)
            .during("InternAtom")?
            .reply()
            .during("InternAtom")?;
        let selection_name = format!("_NET_SYSTEM_TRAY_S{screen_num}");
        let tray_selection = conn
            .intern_atom(false, selection_name.as_bytes())
            .during("InternAtom")?
            .reply()
            .during("InternAtom")?
            .atom;

        conn.change_window_attributes(
            root,
            &ChangeWindowAttributesAux::new().event_mask(EventMask::STRUCTURE_NOTIFY),
        )
        .during("ChangeWindowAttributes")?;
        conn.flush().during("Flush")?;

        tracing::debug!(screen = screen_num, selection = %selection_name, "connected to X server");
        Ok(Self {
            conn,
            root,
            root_visual,
            black_pixel,
            atoms,
            tray_selection,
            gcs: HashMap::new(),
        })
    }
}

impl Display for X11Display {
    fn create_icon_window(&mut self, label: &str, width: u16, height: u16) -> Result<WindowId> {
        let window = self.conn.generate_id().during("GenerateId")?;
        self.conn
            .create_window(
                COPY_DEPTH_FROM_PARENT,
                window,
                self.root,
                0,
                0,
                width,
                height,
                0,
                WindowClass::INPUT_OUTPUT,
                self.root_visual,
                &CreateWindowAux::new()
                    .background_pixel(self.black_pixel)
                    .event_mask(EventMask::EXPOSURE | EventMask::STRUCTURE_NOTIFY),
            )
            .during("CreateWindow")?;

        let gc = self.conn.generate_id().during("GenerateId")?;
        self.conn
            .create_gc(gc, window, &CreateGCAux::new().foreground(self.black_pixel))
            .during("CreateGC")?;

        self.conn
            .change_property8(
                PropMode::REPLACE,
                window,
                AtomEnum::WM_NAME,
                AtomEnum::STRING,
                label.as_bytes(),
            )
            .during("ChangeProperty")?;
        self.conn
            .change_property8(
                PropMode::REPLACE,
                window,
                self.atoms._NET_WM_NAME,
                self.atoms.UTF8_STRING,
                label.as_bytes(),
            )
            .during("ChangeProperty")?;
        self.conn
            .change_property8(
                PropMode::REPLACE,
                window,
                AtomEnum::WM_CLASS,
                AtomEnum::STRING,
                b"xsmon\0xsmon\0",
            )
            .during("ChangeProperty")?;
        self.conn
            .change_property32(
                PropMode::REPLACE,
                window,
                self.atoms._XEMBED_INFO,
                self.atoms._XEMBED_INFO,
                &[XEMBED_VERSION, XEMBED_MAPPED],
            )
            .during("ChangeProperty")?;

        self.gcs.insert(window, gc);
        Ok(window)
    }

    fn geometry(&mut self, window: WindowId) -> Result<(u16, u16)> {
        let reply = self
            .conn
            .get_geometry(window)
            .during("GetGeometry")?
            .reply()
            .during("GetGeometry")?;
        Ok((reply.width, reply.height))
    }

    fn draw(&mut self, window: WindowId, frame: &Frame) -> Result<()> {
        let gc = *self.gcs.get(&window).ok_or_else(|| {
            XsmonError::protocol("PolyFillRectangle", format!("no GC for window {window:#x}"))
        })?;

        self.conn
            .change_gc(gc, &ChangeGCAux::new().foreground(frame.background.pixel()))
            .during("ChangeGC")?;
        self.conn
            .poly_fill_rectangle(
                window,
                gc,
                &[Rectangle {
                    x: 0,
                    y: 0,
                    width: frame.width,
                    height: frame.height,
                }],
            )
            .during("PolyFillRectangle")?;

        self.conn
            .change_gc(gc, &ChangeGCAux::new().foreground(frame.foreground.pixel()))
            .during("ChangeGC")?;
        let segments: Vec<Segment> = frame
            .bars
            .iter()
            .enumerate()
            .map(|(column, &bar)| bar_segment(column, bar, frame.height))
            .collect();
        self.conn
            .poly_segment(window, gc, &segments)
            .during("PolySegment")?;
        Ok(())
    }

    fn tray_selection(&self) -> AtomId {
        self.tray_selection
    }

    fn tray_owner(&mut self) -> Result<Option<WindowId>> {
        let owner = self
            .conn
            .get_selection_owner(self.tray_selection)
            .during("GetSelectionOwner")?
            .reply()
            .during("GetSelectionOwner")?
            .owner;
        Ok((owner != NONE).then_some(owner))
    }

    fn watch_container(&mut self, container: WindowId) -> Result<()> {
        self.conn
            .change_window_attributes(
                container,
                &ChangeWindowAttributesAux::new().event_mask(EventMask::STRUCTURE_NOTIFY),
            )
            .during("ChangeWindowAttributes")?;
        Ok(())
    }

    fn send_dock_request(&mut self, container: WindowId, icon: WindowId) -> Result<()> {
        let event = ClientMessageEvent::new(
            32,
            container,
            self.atoms._NET_SYSTEM_TRAY_OPCODE,
            [CURRENT_TIME, SYSTEM_TRAY_REQUEST_DOCK, icon, 0, 0],
        );
        self.conn
            .send_event(false, container, EventMask::NO_EVENT, event)
            .during("SendEvent")?;
        Ok(())
    }

    fn poll_event(&mut self) -> Result<Option<DisplayEvent>> {
        while let Some(event) = self.conn.poll_for_event().during("PollForEvent")? {
            if let Some(translated) = translate(&self.atoms, event) {
                return Ok(Some(translated));
            }
        }
        Ok(None)
    }

    fn flush(&mut self) -> Result<()> {
        self.conn.flush().during("Flush")
    }
}

/// Map a raw protocol event to what the tray logic reacts to.
///
/// `MANAGER` carries the claimed selection atom in `data32[1]`. Expose
/// series are collapsed to their last event (`count == 0`).
fn translate(atoms: &Atoms, event: Event) -> Option<DisplayEvent> {
    match event {
        Event::Expose(e) if e.count == 0 => Some(DisplayEvent::Exposed { window: e.window }),
        Event::ConfigureNotify(e) => Some(DisplayEvent::Resized {
            window: e.window,
            width: e.width,
            height: e.height,
        }),
        Event::DestroyNotify(e) => Some(DisplayEvent::Destroyed { window: e.window }),
        Event::ClientMessage(e) if e.type_ == atoms.MANAGER && e.format == 32 => {
            let data = e.data.as_data32();
            Some(DisplayEvent::TrayAnnounced { selection: data[1] })
        }
        Event::Error(error) => {
            // BadWindow after the tray dies is routine.
            tracing::debug!(?error, "X11 error event");
            None
        }
        _ => None,
    }
}

/// Vertical segment for column `column`, `bar` pixels up from the bottom edge.
///
/// The bottom end sits at `y = height`, one past the last row, so a bar of
/// `n` covers exactly `n` visible pixels.
fn bar_segment(column: usize, bar: i32, height: u16) -> Segment {
    let x = i16::try_from(column).unwrap_or(i16::MAX);
    let bottom = i16::try_from(height).unwrap_or(i16::MAX);
    let top = (i32::from(bottom) - bar).clamp(i32::from(i16::MIN), i32::from(i16::MAX));
    Segment {
        x1: x,
        y1: bottom,
        x2: x,
        y2: i16::try_from(top).unwrap_or(i16::MIN),
    }
}
