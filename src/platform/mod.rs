//! Production implementations of the selection-capture ports (spec §4.2).
//! `arboard` and `enigo` are already cross-platform; only foreground-window
//! tracking is Windows-specific, gated behind `cfg(windows)` the way the
//! teacher gates its macOS-only accessibility code.

use parking_lot::Mutex;

use crate::error::{CoreError, Result};
use crate::selection::ports::{ClipboardPort, ForegroundWindowPort, InputPort, WindowHandle};

pub struct ArboardClipboard {
    inner: Mutex<arboard::Clipboard>,
}

impl ArboardClipboard {
    pub fn new() -> Result<Self> {
        let clipboard =
            arboard::Clipboard::new().map_err(|e| CoreError::ClipboardUnavailable(e.to_string()))?;
        Ok(ArboardClipboard { inner: Mutex::new(clipboard) })
    }
}

impl ClipboardPort for ArboardClipboard {
    fn get_text(&self) -> Result<Option<String>> {
        match self.inner.lock().get_text() {
            Ok(text) => Ok(Some(text)),
            Err(arboard::Error::ContentNotAvailable) => Ok(None),
            Err(e) => Err(CoreError::ClipboardUnavailable(e.to_string())),
        }
    }

    fn set_text(&self, text: &str) -> Result<()> {
        self.inner
            .lock()
            .set_text(text.to_string())
            .map_err(|e| CoreError::ClipboardUnavailable(e.to_string()))
    }
}

pub struct EnigoInput {
    inner: Mutex<enigo::Enigo>,
}

impl EnigoInput {
    pub fn new() -> Result<Self> {
        let enigo = enigo::Enigo::new(&enigo::Settings::default())
            .map_err(|e| CoreError::WindowError(format!("could not initialize input synthesis: {e}")))?;
        Ok(EnigoInput { inner: Mutex::new(enigo) })
    }

    fn send_combo(&self, key: char) -> Result<()> {
        use enigo::{Direction, Key, Keyboard};
        let mut enigo = self.inner.lock();
        let map_err = |e: enigo::InputError| CoreError::WindowError(format!("input synthesis failed: {e}"));
        enigo.key(Key::Control, Direction::Press).map_err(map_err)?;
        enigo.key(Key::Unicode(key), Direction::Click).map_err(map_err)?;
        enigo.key(Key::Control, Direction::Release).map_err(map_err)?;
        Ok(())
    }
}

impl InputPort for EnigoInput {
    fn send_copy(&self) -> Result<()> {
        self.send_combo('c')
    }

    fn send_paste(&self) -> Result<()> {
        self.send_combo('v')
    }
}

#[cfg(windows)]
pub struct WindowsForegroundWindow;

#[cfg(windows)]
impl WindowsForegroundWindow {
    pub fn new() -> Self {
        WindowsForegroundWindow
    }
}

#[cfg(windows)]
impl ForegroundWindowPort for WindowsForegroundWindow {
    fn current(&self) -> Result<WindowHandle> {
        use windows::Win32::UI::WindowsAndMessaging::GetForegroundWindow;
        let hwnd = unsafe { GetForegroundWindow() };
        Ok(WindowHandle(hwnd.0 as isize))
    }

    fn focus(&self, window: WindowHandle) -> Result<()> {
        use windows::Win32::Foundation::HWND;
        use windows::Win32::UI::WindowsAndMessaging::SetForegroundWindow;
        let hwnd = HWND(window.0 as *mut core::ffi::c_void);
        let ok = unsafe { SetForegroundWindow(hwnd) };
        if ok.as_bool() {
            Ok(())
        } else {
            Err(CoreError::WindowError(format!("could not focus window {:?}", window)))
        }
    }
}

/// Non-Windows builds (CI, contributor laptops) get a stub so the crate
/// still compiles off-target; it is never wired into a real `AppContext`.
#[cfg(not(windows))]
pub struct WindowsForegroundWindow;

#[cfg(not(windows))]
impl WindowsForegroundWindow {
    pub fn new() -> Self {
        WindowsForegroundWindow
    }
}

#[cfg(not(windows))]
impl ForegroundWindowPort for WindowsForegroundWindow {
    fn current(&self) -> Result<WindowHandle> {
        Ok(WindowHandle(0))
    }

    fn focus(&self, _window: WindowHandle) -> Result<()> {
        Ok(())
    }
}

impl Default for WindowsForegroundWindow {
    fn default() -> Self {
        Self::new()
    }
}

/// Current mouse position, used to center the popup on activation (spec
/// §4.5). Same `cfg(windows)`/stub split as `WindowsForegroundWindow`.
#[cfg(windows)]
pub fn cursor_position() -> (i32, i32) {
    use windows::Win32::Foundation::POINT;
    use windows::Win32::UI::WindowsAndMessaging::GetCursorPos;
    let mut point = POINT::default();
    let ok = unsafe { GetCursorPos(&mut point) };
    if ok.as_bool() {
        (point.x, point.y)
    } else {
        (0, 0)
    }
}

#[cfg(not(windows))]
pub fn cursor_position() -> (i32, i32) {
    (0, 0)
}
