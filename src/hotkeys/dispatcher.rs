//! Hotkey Dispatcher (spec §4.6): keeps the OS-registered accelerator set in
//! sync with `AppConfig`, and routes activation ids back to the action they
//! were bound for. The register-new-before-unregister-old sequencing for a
//! changed binding follows the teacher's `rebind_hotkey_transactional`
//! (`hotkeys/part_000.rs`): a bad new accelerator must never cost the user a
//! working one.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::{Mutex, RwLock};
use tracing::warn;

use crate::accelerator::Accelerator;
use crate::config::AppConfig;
use crate::error::Result;

use super::backend::HotkeyBackend;

/// Repeated activations of the same binding within this window are
/// collapsed into one (spec §4.6).
const DEBOUNCE: Duration = Duration::from_millis(150);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum SlotKey {
    Popup,
    Screenshot,
    Template(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HotkeyAction {
    ShowPopup,
    TakeScreenshot,
    ActivateTemplate(String),
}

struct Binding {
    id: u32,
    accelerator: Accelerator,
    action: HotkeyAction,
}

fn desired_slots(config: &AppConfig) -> Vec<(SlotKey, Accelerator, HotkeyAction)> {
    let mut desired = Vec::new();

    match Accelerator::parse(&config.hotkeys.popup_hotkey) {
        Ok(accel) => desired.push((SlotKey::Popup, accel, HotkeyAction::ShowPopup)),
        Err(e) => warn!(hotkey = %config.hotkeys.popup_hotkey, error = ?e, "skipping invalid popup hotkey"),
    }

    if let Some(raw) = &config.hotkeys.screenshot_hotkey {
        match Accelerator::parse(raw) {
            Ok(accel) => desired.push((SlotKey::Screenshot, accel, HotkeyAction::TakeScreenshot)),
            Err(e) => warn!(hotkey = %raw, error = ?e, "skipping invalid screenshot hotkey"),
        }
    }

    for template in &config.templates {
        let Some(raw) = &template.hotkey else { continue };
        match Accelerator::parse(raw) {
            Ok(accel) => desired.push((
                SlotKey::Template(template.id.clone()),
                accel,
                HotkeyAction::ActivateTemplate(template.id.clone()),
            )),
            Err(e) => warn!(hotkey = %raw, template = %template.name, error = ?e, "skipping invalid template hotkey"),
        }
    }

    desired
}

pub struct HotkeyDispatcher {
    backend: Box<dyn HotkeyBackend>,
    bindings: RwLock<HashMap<SlotKey, Binding>>,
    last_activation: Mutex<HashMap<u32, Instant>>,
}

impl HotkeyDispatcher {
    pub fn new(backend: Box<dyn HotkeyBackend>) -> Self {
        HotkeyDispatcher {
            backend,
            bindings: RwLock::new(HashMap::new()),
            last_activation: Mutex::new(HashMap::new()),
        }
    }

    /// Reconcile the registered accelerator set with `config`. Never aborts
    /// partway through: a failure on one slot is logged and the rest of the
    /// sync still runs (spec §4.6).
    pub fn sync(&self, config: &AppConfig) {
        let desired = desired_slots(config);
        let desired_keys: std::collections::HashSet<&SlotKey> =
            desired.iter().map(|(key, _, _)| key).collect();

        let mut bindings = self.bindings.write();

        let stale: Vec<SlotKey> = bindings
            .keys()
            .filter(|key| !desired_keys.contains(key))
            .cloned()
            .collect();
        for key in stale {
            if let Some(binding) = bindings.remove(&key) {
                if let Err(e) = self.backend.unregister(binding.id, &binding.accelerator) {
                    warn!(?key, error = ?e, "failed to unregister stale hotkey");
                }
            }
        }

        for (key, accelerator, action) in desired {
            let unchanged = bindings
                .get(&key)
                .is_some_and(|b| b.accelerator == accelerator);
            if unchanged {
                continue;
            }

            match self.backend.register(&accelerator) {
                Ok(id) => {
                    // New binding registered successfully: now it is safe to
                    // drop whatever was there before.
                    if let Some(old) = bindings.remove(&key) {
                        if let Err(e) = self.backend.unregister(old.id, &old.accelerator) {
                            warn!(?key, error = ?e, "failed to unregister superseded hotkey");
                        }
                    }
                    bindings.insert(key, Binding { id, accelerator, action });
                }
                Err(e) => {
                    // Registration failed: leave any existing binding for this
                    // slot in place rather than losing a working hotkey.
                    warn!(?key, accelerator = %accelerator, error = ?e, "failed to register hotkey; keeping previous binding");
                }
            }
        }
    }

    /// Resolve an activation id to the action it is bound to, applying the
    /// debounce window. Returns `None` for an unknown id or a repeat
    /// activation inside the debounce window.
    pub fn route(&self, id: u32) -> Option<HotkeyAction> {
        let action = self
            .bindings
            .read()
            .values()
            .find(|b| b.id == id)
            .map(|b| b.action.clone())?;

        let mut last = self.last_activation.lock();
        let now = Instant::now();
        if let Some(previous) = last.get(&id) {
            if now.duration_since(*previous) < DEBOUNCE {
                return None;
            }
        }
        last.insert(id, now);
        Some(action)
    }

    #[cfg(test)]
    fn registered_count(&self) -> usize {
        self.bindings.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{HotkeysConfig, Template};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex as StdMutex;

    struct FakeBackend {
        next_id: AtomicU32,
        fail_accelerators: StdMutex<Vec<String>>,
        registered: StdMutex<Vec<String>>,
    }

    impl FakeBackend {
        fn new() -> Self {
            FakeBackend {
                next_id: AtomicU32::new(1),
                fail_accelerators: StdMutex::new(Vec::new()),
                registered: StdMutex::new(Vec::new()),
            }
        }

        fn fail_next(&self, accelerator: &str) {
            self.fail_accelerators.lock().unwrap().push(accelerator.to_string());
        }
    }

    impl HotkeyBackend for FakeBackend {
        fn register(&self, accelerator: &Accelerator) -> Result<u32> {
            let rendered = accelerator.render();
            let mut failures = self.fail_accelerators.lock().unwrap();
            if let Some(pos) = failures.iter().position(|a| a == &rendered) {
                failures.remove(pos);
                return Err(crate::error::CoreError::HotkeyConflict {
                    accelerator: rendered,
                    reason: "simulated conflict".into(),
                });
            }
            self.registered.lock().unwrap().push(rendered);
            Ok(self.next_id.fetch_add(1, Ordering::SeqCst))
        }

        fn unregister(&self, _id: u32, accelerator: &Accelerator) -> Result<()> {
            self.registered.lock().unwrap().retain(|a| a != &accelerator.render());
            Ok(())
        }
    }

    fn config_with(popup: &str, templates: Vec<(&str, &str, Option<&str>)>) -> AppConfig {
        AppConfig {
            hotkeys: HotkeysConfig { popup_hotkey: popup.to_string(), screenshot_hotkey: None },
            templates: templates
                .into_iter()
                .map(|(id, name, hotkey)| Template {
                    id: id.to_string(),
                    name: name.to_string(),
                    prompt: "p".into(),
                    action: crate::config::PostAction::None,
                    hotkey: hotkey.map(str::to_string),
                    background_mode: false,
                })
                .collect(),
            ..AppConfig::default()
        }
    }

    #[test]
    fn sync_registers_popup_and_template_hotkeys() {
        let backend = Box::new(FakeBackend::new());
        let dispatcher = HotkeyDispatcher::new(backend);
        let config = config_with("Alt+S", vec![("t1", "Explain", Some("Alt+E"))]);
        dispatcher.sync(&config);
        assert_eq!(dispatcher.registered_count(), 2);
    }

    #[test]
    fn resync_with_changed_hotkey_unregisters_old_and_registers_new() {
        let backend = Box::new(FakeBackend::new());
        let dispatcher = HotkeyDispatcher::new(backend);
        dispatcher.sync(&config_with("Alt+S", vec![]));
        dispatcher.sync(&config_with("Alt+D", vec![]));
        assert_eq!(dispatcher.registered_count(), 1);
    }

    #[test]
    fn resync_removing_a_template_unregisters_its_hotkey() {
        let backend = Box::new(FakeBackend::new());
        let dispatcher = HotkeyDispatcher::new(backend);
        dispatcher.sync(&config_with("Alt+S", vec![("t1", "Explain", Some("Alt+E"))]));
        dispatcher.sync(&config_with("Alt+S", vec![]));
        assert_eq!(dispatcher.registered_count(), 1);
    }

    #[test]
    fn failed_registration_keeps_previous_working_binding() {
        let backend = FakeBackend::new();
        backend.fail_next("Alt+D");
        let dispatcher = HotkeyDispatcher::new(Box::new(backend));

        dispatcher.sync(&config_with("Alt+S", vec![]));
        dispatcher.sync(&config_with("Alt+D", vec![]));

        // The Alt+S binding must still be registered since Alt+D failed.
        assert_eq!(dispatcher.registered_count(), 1);
    }

    #[test]
    fn route_returns_none_for_unknown_id() {
        let dispatcher = HotkeyDispatcher::new(Box::new(FakeBackend::new()));
        assert!(dispatcher.route(999).is_none());
    }

    #[test]
    fn route_debounces_rapid_repeat_activations() {
        let backend = Box::new(FakeBackend::new());
        let dispatcher = HotkeyDispatcher::new(backend);
        dispatcher.sync(&config_with("Alt+S", vec![]));
        let id = dispatcher.bindings.read().values().next().unwrap().id;

        assert_eq!(dispatcher.route(id), Some(HotkeyAction::ShowPopup));
        assert_eq!(dispatcher.route(id), None, "immediate repeat must be debounced");
    }

    #[test]
    fn unchanged_hotkey_across_resync_is_not_reregistered() {
        let backend = Box::new(FakeBackend::new());
        let dispatcher = HotkeyDispatcher::new(backend);
        dispatcher.sync(&config_with("Alt+S", vec![]));
        let id_before = dispatcher.bindings.read().values().next().unwrap().id;
        dispatcher.sync(&config_with("Alt+S", vec![]));
        let id_after = dispatcher.bindings.read().values().next().unwrap().id;
        assert_eq!(id_before, id_after);
    }
}
