//! Selection-capture algorithm (spec §4.2): snapshot the clipboard,
//! synthesize a copy, poll for the change, then restore the original
//! clipboard contents. Shape follows the teacher's
//! `selected_text::set_via_clipboard_fallback` snapshot/simulate/restore
//! sequence, reimplemented over the `ClipboardPort`/`InputPort` traits so it
//! runs against fakes in tests instead of the macOS Accessibility API.

use std::thread::sleep;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::error::{CoreError, Result};

use super::ports::{ClipboardPort, ForegroundWindowPort, InputPort, WindowHandle};

const POLL_TIMEOUT: Duration = Duration::from_millis(200);
const POLL_INTERVAL: Duration = Duration::from_millis(15);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedContext {
    pub text: String,
    pub origin_window: WindowHandle,
}

/// Capture whatever text is currently selected in the foreground
/// application, leaving the system clipboard exactly as it was found.
pub fn capture_selected_text(
    clipboard: &dyn ClipboardPort,
    input: &dyn InputPort,
    foreground: &dyn ForegroundWindowPort,
) -> Result<CapturedContext> {
    let origin_window = foreground.current()?;
    let snapshot = clipboard.get_text()?;

    // A sentinel clears the clipboard first so a successful copy is
    // unambiguous: polling just has to notice the clipboard is non-empty.
    clipboard.set_text("")?;
    input.send_copy()?;

    let deadline = Instant::now() + POLL_TIMEOUT;
    let captured = loop {
        if let Some(text) = clipboard.get_text()? {
            if !text.is_empty() {
                break Some(text);
            }
        }
        if Instant::now() >= deadline {
            break None;
        }
        sleep(POLL_INTERVAL);
    };

    restore_clipboard(clipboard, snapshot.as_deref());

    match captured {
        Some(text) => {
            debug!(chars = text.len(), "selection captured");
            Ok(CapturedContext { text, origin_window })
        }
        None => Err(CoreError::CaptureTimeout),
    }
}

/// Replace the current selection with `text` and restore the user's
/// original clipboard contents afterward (spec §4.2 "clipboard-safe").
/// Used by the foreground replace flow, distinct from the post-action
/// `replace` path in the Session Registry, which intentionally leaves the
/// response on the clipboard (see DESIGN.md).
pub fn replace_selected_text(
    clipboard: &dyn ClipboardPort,
    input: &dyn InputPort,
    text: &str,
) -> Result<()> {
    let snapshot = clipboard.get_text()?;
    clipboard.set_text(text)?;
    input.send_paste()?;
    sleep(Duration::from_millis(50));
    restore_clipboard(clipboard, snapshot.as_deref());
    Ok(())
}

fn restore_clipboard(clipboard: &dyn ClipboardPort, snapshot: Option<&str>) {
    let _ = clipboard.set_text(snapshot.unwrap_or_default());
}
