//! Session Registry (spec §4.4): one active AI session per popup. Starting
//! a new session cancels whatever was running, matching the
//! `ClaudeSessionManager` table-of-sessions idiom from the teacher's
//! `ai/session.rs`, but narrowed to a single active slot instead of a
//! persistent per-id table, since the backend keeps no conversational
//! history beyond popup visibility.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use crate::config::PostAction;
use crate::error::Result;
use crate::selection::{ClipboardPort, ForegroundWindowPort, InputPort, WindowHandle};

struct ActiveSession {
    id: u64,
    cancel: CancellationToken,
}

/// Something that can hide the popup. Implemented by the Window Manager;
/// defined here so the registry does not need to depend on it directly.
pub trait PopupHider: Send + Sync {
    fn hide(&self);
}

pub struct SessionRegistry {
    next_id: AtomicU64,
    active: Mutex<Option<ActiveSession>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        SessionRegistry { next_id: AtomicU64::new(1), active: Mutex::new(None) }
    }

    /// Begin a new session, cancelling and replacing whatever was active.
    /// Returns the new session's id and the token it should watch for
    /// cancellation.
    pub fn start(&self) -> (u64, CancellationToken) {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let cancel = CancellationToken::new();
        let mut active = self.active.lock();
        if let Some(previous) = active.take() {
            previous.cancel.cancel();
        }
        *active = Some(ActiveSession { id, cancel: cancel.clone() });
        (id, cancel)
    }

    pub fn is_active(&self, id: u64) -> bool {
        matches!(&*self.active.lock(), Some(s) if s.id == id)
    }

    pub fn cancel_active(&self) {
        if let Some(previous) = self.active.lock().take() {
            previous.cancel.cancel();
        }
    }

    /// Clear the active slot if it still points at `id` (a session clearing
    /// its own slot after finishing should not clobber a newer one).
    pub fn finish(&self, id: u64) {
        let mut active = self.active.lock();
        if matches!(&*active, Some(s) if s.id == id) {
            *active = None;
        }
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Apply a template's configured post-action to a completed AI response
/// (spec §4.4). `replace` intentionally leaves the response on the
/// clipboard rather than restoring the pre-replace contents, unlike
/// Selection Capture's always-restoring behavior. It does restore focus to
/// `origin_window` before pasting, since the popup (not the source
/// application) holds focus by the time the response is ready.
pub fn apply_post_action(
    action: PostAction,
    response_text: &str,
    clipboard: &dyn ClipboardPort,
    input: &dyn InputPort,
    foreground: &dyn ForegroundWindowPort,
    origin_window: Option<WindowHandle>,
    popup: &dyn PopupHider,
) -> Result<()> {
    match action {
        PostAction::None => Ok(()),
        PostAction::Copy => clipboard.set_text(response_text),
        PostAction::Replace => {
            clipboard.set_text(response_text)?;
            if let Some(window) = origin_window {
                foreground.focus(window)?;
            }
            input.send_paste()?;
            popup.hide();
            Ok(())
        }
    }
}
