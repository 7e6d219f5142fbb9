//! Metric collection: CPU and memory sources feeding fixed-width sample histories.

pub mod ring_buffer;
pub mod source;
