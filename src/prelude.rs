//! Convenience re-exports for library consumers.
//!
//! ```rust,no_run
//! use xsmon::prelude::*;
//! ```

// Core
pub use crate::core::color::{Palette, Rgb, Rgba, blend};
pub use crate::core::config::Config;
pub use crate::core::errors::{Result, XsmonError};

// Platform
pub use crate::platform::pal::{
    CpuCounters, LinuxPlatform, MemoryInfo, MockPlatform, Platform, detect_platform,
};

// Monitor
pub use crate::monitor::ring_buffer::RingBuffer;
pub use crate::monitor::source::{CpuLoadSource, MemoryUsageSource, MetricSource};

// Tray
pub use crate::tray::display::{Display, DisplayEvent, MockDisplay};
pub use crate::tray::dock::{DockState, TrayDockManager};
pub use crate::tray::icon::{Frame, IconSurface};

// Daemon
pub use crate::daemon::loop_main::{EventLoop, Gauge};

#[cfg(feature = "x11")]
pub use crate::x11::X11Display;
