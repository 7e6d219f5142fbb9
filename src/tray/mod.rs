//! Tray side: protocol seam, icon surfaces, and the docking state machine.

pub mod display;
pub mod dock;
pub mod icon;
