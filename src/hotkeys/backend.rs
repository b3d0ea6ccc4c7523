//! OS-facing hotkey registration, abstracted behind a trait so the
//! synchronization algorithm in `dispatcher.rs` is testable without an
//! actual global accelerator table. Production implementation wraps
//! `global_hotkey::GlobalHotKeyManager`, the crate the teacher already uses
//! (`hotkeys/part_000.rs`).

use global_hotkey::hotkey::HotKey;
use global_hotkey::GlobalHotKeyManager;

use crate::accelerator::Accelerator;
use crate::error::{CoreError, Result};

pub trait HotkeyBackend: Send + Sync {
    /// Register an accelerator and return the id it will appear under in
    /// activation events.
    fn register(&self, accelerator: &Accelerator) -> Result<u32>;
    fn unregister(&self, id: u32, accelerator: &Accelerator) -> Result<()>;
}

pub struct GlobalHotkeyBackend {
    manager: GlobalHotKeyManager,
}

impl GlobalHotkeyBackend {
    pub fn new() -> Result<Self> {
        let manager = GlobalHotKeyManager::new()
            .map_err(|e| CoreError::WindowError(format!("could not initialize hotkey manager: {e}")))?;
        Ok(GlobalHotkeyBackend { manager })
    }
}

impl HotkeyBackend for GlobalHotkeyBackend {
    fn register(&self, accelerator: &Accelerator) -> Result<u32> {
        let hotkey = HotKey::new(Some(accelerator.modifiers), accelerator.code);
        self.manager.register(hotkey).map_err(|e| CoreError::HotkeyConflict {
            accelerator: accelerator.render(),
            reason: e.to_string(),
        })?;
        Ok(hotkey.id())
    }

    fn unregister(&self, _id: u32, accelerator: &Accelerator) -> Result<()> {
        let hotkey = HotKey::new(Some(accelerator.modifiers), accelerator.code);
        self.manager
            .unregister(hotkey)
            .map_err(|e| CoreError::WindowError(format!("could not unregister hotkey: {e}")))
    }
}
