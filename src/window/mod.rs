//! Window Manager (spec §4.5): popup visibility state and geometry.

pub mod manager;

pub use manager::{Geometry, PopupState, WindowManager};
