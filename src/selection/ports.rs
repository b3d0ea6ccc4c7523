//! Side-effect boundaries for selection capture (Design Notes §9: ports over
//! ambient OS calls so the capture algorithm itself is unit-testable).
//! Grounded on the teacher's `favorites.rs` path-injection pattern, applied
//! here to clipboard/input/window-focus access instead of filesystem paths.

use crate::error::Result;

/// Opaque handle to a top-level window. On Windows this wraps an `HWND`
/// value; the inner representation is never interpreted outside
/// `platform`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowHandle(pub isize);

pub trait ClipboardPort: Send + Sync {
    fn get_text(&self) -> Result<Option<String>>;
    fn set_text(&self, text: &str) -> Result<()>;
}

pub trait InputPort: Send + Sync {
    /// Synthesize the platform "copy" shortcut (Ctrl+C on Windows).
    fn send_copy(&self) -> Result<()>;
    /// Synthesize the platform "paste" shortcut (Ctrl+V on Windows).
    fn send_paste(&self) -> Result<()>;
}

pub trait ForegroundWindowPort: Send + Sync {
    fn current(&self) -> Result<WindowHandle>;
    fn focus(&self, window: WindowHandle) -> Result<()>;
}
