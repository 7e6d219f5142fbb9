//! Core types: errors, configuration, colors.

pub mod color;
pub mod config;
pub mod errors;
