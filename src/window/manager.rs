//! Window Manager (spec §4.5): popup visibility state and geometry only —
//! no GUI toolkit dependency, since layout/rendering of the popup is an
//! external collaborator's responsibility. Mirrors the teacher's
//! `WindowVibrancy`/layout-constant shape in `panel.rs`, stripped down to
//! pure state plus arithmetic.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use parking_lot::RwLock;

use crate::session::PopupHider;

/// Fixed height of the compact (foreground-capture) popup; only the
/// expanded state scales with `max_popup_height`.
const COMPACT_HEIGHT: u32 = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopupState {
    Hidden,
    Compact,
    Expanded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

pub struct WindowManager {
    state: RwLock<PopupState>,
    pinned: AtomicBool,
    popup_width: AtomicU32,
    max_popup_height: AtomicU32,
    last_cursor: RwLock<(i32, i32)>,
}

impl WindowManager {
    pub fn new(popup_width: u32, max_popup_height: u32) -> Self {
        WindowManager {
            state: RwLock::new(PopupState::Hidden),
            pinned: AtomicBool::new(false),
            popup_width: AtomicU32::new(popup_width),
            max_popup_height: AtomicU32::new(max_popup_height),
            last_cursor: RwLock::new((0, 0)),
        }
    }

    pub fn state(&self) -> PopupState {
        *self.state.read()
    }

    pub fn is_pinned(&self) -> bool {
        self.pinned.load(Ordering::SeqCst)
    }

    pub fn set_pinned(&self, pinned: bool) {
        self.pinned.store(pinned, Ordering::SeqCst);
    }

    /// Apply a new size set by `resize_popup_window`; the Config Store's
    /// own validation already bounded these, so this just adopts them.
    pub fn set_dimensions(&self, popup_width: u32, max_popup_height: u32) {
        self.popup_width.store(popup_width, Ordering::SeqCst);
        self.max_popup_height.store(max_popup_height, Ordering::SeqCst);
    }

    fn geometry_centered_on(&self, cursor: (i32, i32), height: u32) -> Geometry {
        let width = self.popup_width.load(Ordering::SeqCst);
        Geometry {
            x: (cursor.0 - (width as i32) / 2).max(0),
            y: cursor.1,
            width,
            height,
        }
    }

    /// Show the compact popup (generic hotkey, template foreground
    /// activation) centered under the cursor.
    pub fn show_compact(&self, cursor: (i32, i32)) -> Geometry {
        *self.state.write() = PopupState::Compact;
        *self.last_cursor.write() = cursor;
        self.geometry_centered_on(cursor, COMPACT_HEIGHT)
    }

    /// Expand the popup to show a streaming response.
    pub fn show_expanded(&self, cursor: (i32, i32)) -> Geometry {
        *self.state.write() = PopupState::Expanded;
        *self.last_cursor.write() = cursor;
        let height = self.max_popup_height.load(Ordering::SeqCst);
        self.geometry_centered_on(cursor, height)
    }

    /// Transition Compact to Expanded in place, at the cursor position the
    /// popup was last shown at (spec §4.5: first streamed chunk triggers
    /// this). A no-op if the popup isn't currently Compact (hidden, already
    /// expanded, or a background-mode activation that never showed it).
    pub fn expand_in_place(&self) -> Option<Geometry> {
        if self.state() != PopupState::Compact {
            return None;
        }
        let cursor = *self.last_cursor.read();
        Some(self.show_expanded(cursor))
    }

    pub fn hide(&self) {
        *self.state.write() = PopupState::Hidden;
    }

    /// Called when the popup's window loses OS focus; hides unless pinned.
    pub fn on_focus_lost(&self) {
        if !self.is_pinned() {
            self.hide();
        }
    }
}

impl PopupHider for WindowManager {
    fn hide(&self) {
        WindowManager::hide(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_window_starts_hidden_and_unpinned() {
        let wm = WindowManager::new(500, 600);
        assert_eq!(wm.state(), PopupState::Hidden);
        assert!(!wm.is_pinned());
    }

    #[test]
    fn show_compact_centers_on_cursor_and_transitions_state() {
        let wm = WindowManager::new(500, 600);
        let geometry = wm.show_compact((1000, 200));
        assert_eq!(wm.state(), PopupState::Compact);
        assert_eq!(geometry.width, 500);
        assert_eq!(geometry.x, 1000 - 250);
    }

    #[test]
    fn geometry_clamps_to_non_negative_x_near_screen_edge() {
        let wm = WindowManager::new(500, 600);
        let geometry = wm.show_compact((10, 50));
        assert_eq!(geometry.x, 0);
    }

    #[test]
    fn show_expanded_uses_max_popup_height() {
        let wm = WindowManager::new(500, 600);
        let geometry = wm.show_expanded((500, 500));
        assert_eq!(wm.state(), PopupState::Expanded);
        assert_eq!(geometry.height, 600);
    }

    #[test]
    fn focus_loss_hides_unless_pinned() {
        let wm = WindowManager::new(500, 600);
        wm.show_compact((100, 100));
        wm.set_pinned(true);
        wm.on_focus_lost();
        assert_eq!(wm.state(), PopupState::Compact);

        wm.set_pinned(false);
        wm.on_focus_lost();
        assert_eq!(wm.state(), PopupState::Hidden);
    }

    #[test]
    fn resize_changes_subsequent_geometry() {
        let wm = WindowManager::new(500, 600);
        wm.set_dimensions(800, 900);
        let geometry = wm.show_expanded((400, 400));
        assert_eq!(geometry.width, 800);
        assert_eq!(geometry.height, 900);
    }

    #[test]
    fn expand_in_place_transitions_compact_to_expanded_at_same_cursor() {
        let wm = WindowManager::new(500, 600);
        wm.show_compact((1000, 200));
        let geometry = wm.expand_in_place().unwrap();
        assert_eq!(wm.state(), PopupState::Expanded);
        assert_eq!(geometry.height, 600);
        assert_eq!(geometry.x, 1000 - 250);
    }

    #[test]
    fn expand_in_place_is_a_no_op_when_not_compact() {
        let wm = WindowManager::new(500, 600);
        assert!(wm.expand_in_place().is_none());
        assert_eq!(wm.state(), PopupState::Hidden);
    }

    #[test]
    fn hide_is_idempotent_from_any_state() {
        let wm = WindowManager::new(500, 600);
        wm.hide();
        assert_eq!(wm.state(), PopupState::Hidden);
        wm.show_expanded((0, 0));
        wm.hide();
        assert_eq!(wm.state(), PopupState::Hidden);
    }
}
