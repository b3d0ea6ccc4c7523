//! Selection Capture (spec §4.2): clipboard-safe text capture and screenshot
//! capture.

pub mod capture;
pub mod ports;
pub mod screenshot;

pub use capture::{capture_selected_text, replace_selected_text, CapturedContext};
pub use ports::{ClipboardPort, ForegroundWindowPort, InputPort, WindowHandle};
pub use screenshot::{capture_full_display, capture_region, Region, Screenshot, ScreenshotStore};
