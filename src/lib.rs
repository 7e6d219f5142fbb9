#![forbid(unsafe_code)]

//! xsmon — CPU and memory sparklines docked in the X11 system tray.
//!
//! Two icons, one per metric, each showing a scrolling bar graph one pixel
//! column per sample. An icon switches to blended alert colors on alternate
//! ticks while its latest sample is above the configured threshold.
//!
//! # Library usage
//!
//! Use the [`prelude`] for convenient access to the most common types:
//!
//! ```rust,no_run
//! use xsmon::prelude::*;
//! ```
//!
//! The tray logic is written against the [`tray::display::Display`] trait, so
//! it can be driven by [`tray::display::MockDisplay`] without an X server:
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use xsmon::prelude::*;
//!
//! let platform = Arc::new(MockPlatform::new(Vec::new(), Vec::new()));
//! let display = MockDisplay::default();
//! let mut event_loop = EventLoop::new(display, &Config::default(), platform)?;
//! event_loop.start()?;
//! # Ok::<(), XsmonError>(())
//! ```

pub mod prelude;

pub mod core;
pub mod daemon;
pub mod logger;
pub mod monitor;
pub mod platform;
pub mod tray;
#[cfg(feature = "x11")]
pub mod x11;
