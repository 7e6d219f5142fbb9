//! Long-running side of xsmon: the sample/render event loop.

pub mod loop_main;
