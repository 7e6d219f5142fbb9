//! Platform abstraction layer: OS counter access behind a trait.

pub mod pal;
