//! Config Store (spec §4.1): single source of truth for `AppConfig`.
//!
//! Load/save functions are path-injectable (teacher idiom: `favorites.rs`)
//! so the migration/validation/merge logic is unit-testable without the
//! real app-data directory. Atomic save follows the teacher's
//! `config/loader.rs` use of `tempfile` for crash-safe writes: write to a
//! sibling temp file, then rename over the destination.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use serde_json::Value;
use tracing::warn;
use uuid::Uuid;

use crate::accelerator::Accelerator;
use crate::error::{CoreError, Result};

use super::types::{AppConfig, Model, Template};

pub fn config_file_path(app_data_dir: &Path) -> PathBuf {
    app_data_dir.join("config.json")
}

/// Parse a single optional field from a JSON object, falling back to the
/// given default and logging a warning if the field is present but fails
/// to deserialize. Mirrors the teacher's `parse_optional_field`.
fn recover_field<T: serde::de::DeserializeOwned + Clone>(
    obj: &serde_json::Map<String, Value>,
    field: &'static str,
    fallback: T,
    correlation_id: &str,
) -> T {
    let Some(raw) = obj.get(field) else {
        return fallback;
    };
    match serde_json::from_value::<T>(raw.clone()) {
        Ok(parsed) => parsed,
        Err(error) => {
            warn!(correlation_id, field, %error, "config field failed to parse; using default");
            fallback
        }
    }
}

/// Best-effort recovery of an `AppConfig` from a loosely-structured JSON
/// value: fields that are missing or individually malformed fall back to
/// documented defaults (spec §4.1) rather than failing the whole load.
fn recover_config(value: Value, correlation_id: &str) -> AppConfig {
    let defaults = AppConfig::default();
    let Some(obj) = value.as_object() else {
        warn!(correlation_id, "config root is not a JSON object; using defaults");
        return defaults;
    };

    AppConfig {
        models: recover_field(obj, "models", defaults.models, correlation_id),
        templates: recover_field(obj, "templates", defaults.templates, correlation_id),
        hotkeys: recover_field(obj, "hotkeys", defaults.hotkeys, correlation_id),
        selected_model_index: recover_field(
            obj,
            "selected_model_index",
            defaults.selected_model_index,
            correlation_id,
        ),
        popup_width: recover_field(obj, "popup_width", defaults.popup_width, correlation_id),
        max_popup_height: recover_field(
            obj,
            "max_popup_height",
            defaults.max_popup_height,
            correlation_id,
        ),
    }
}

pub fn load_from_path(path: &Path) -> AppConfig {
    let contents = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(_) => return AppConfig::default(),
    };

    match serde_json::from_str::<AppConfig>(&contents) {
        Ok(cfg) => cfg,
        Err(_) => {
            // Whole-document parse failed (e.g. a field changed shape across a
            // schema version); recover what we can field-by-field rather than
            // discarding the user's entire configuration.
            let correlation_id = Uuid::new_v4().to_string();
            match serde_json::from_str::<Value>(&contents) {
                Ok(value) => recover_config(value, &correlation_id),
                Err(error) => {
                    warn!(correlation_id = %correlation_id, %error, "config.json is not valid JSON; using defaults");
                    AppConfig::default()
                }
            }
        }
    }
}

pub fn save_to_path(path: &Path, config: &AppConfig) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(config)
        .map_err(|e| CoreError::InvalidConfig(e.to_string()))?;

    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
    use std::io::Write;
    tmp.write_all(json.as_bytes())?;
    tmp.persist(path)
        .map_err(|e| CoreError::Io(e.error))?;
    Ok(())
}

/// Validation rules enforced on save (spec §4.1).
pub fn validate(config: &AppConfig) -> Result<()> {
    if config.models.is_empty() {
        return Err(CoreError::InvalidConfig("at least one model is required".into()));
    }
    if config.selected_model_index >= config.models.len() {
        return Err(CoreError::InvalidConfig(format!(
            "selected_model_index {} out of range (have {} models)",
            config.selected_model_index,
            config.models.len()
        )));
    }
    if !(super::types::POPUP_DIMENSION_MIN..=super::types::POPUP_DIMENSION_MAX)
        .contains(&config.popup_width)
    {
        return Err(CoreError::InvalidConfig(format!(
            "popup_width {} out of range [{}, {}]",
            config.popup_width,
            super::types::POPUP_DIMENSION_MIN,
            super::types::POPUP_DIMENSION_MAX
        )));
    }
    if !(super::types::POPUP_DIMENSION_MIN..=super::types::POPUP_DIMENSION_MAX)
        .contains(&config.max_popup_height)
    {
        return Err(CoreError::InvalidConfig(format!(
            "max_popup_height {} out of range [{}, {}]",
            config.max_popup_height,
            super::types::POPUP_DIMENSION_MIN,
            super::types::POPUP_DIMENSION_MAX
        )));
    }

    Accelerator::parse(&config.hotkeys.popup_hotkey)
        .map_err(|_| CoreError::InvalidConfig(format!("invalid popup hotkey '{}'", config.hotkeys.popup_hotkey)))?;
    if let Some(screenshot) = &config.hotkeys.screenshot_hotkey {
        Accelerator::parse(screenshot)
            .map_err(|_| CoreError::InvalidConfig(format!("invalid screenshot hotkey '{screenshot}'")))?;
    }

    let mut seen_names = HashSet::new();
    for template in &config.templates {
        if template.name.trim().is_empty() {
            return Err(CoreError::InvalidConfig("template name must not be empty".into()));
        }
        if !seen_names.insert(template.name.to_ascii_lowercase()) {
            return Err(CoreError::InvalidConfig(format!(
                "duplicate template name '{}'",
                template.name
            )));
        }
        if let Some(hotkey) = &template.hotkey {
            Accelerator::parse(hotkey)
                .map_err(|_| CoreError::InvalidConfig(format!("invalid template hotkey '{hotkey}'")))?;
        }
        if template.background_mode && template.hotkey.is_none() {
            return Err(CoreError::InvalidConfig(format!(
                "template '{}' is background-mode but has no hotkey, so it is unreachable",
                template.name
            )));
        }
    }

    Ok(())
}

/// Merge-import semantics (spec §4.1): templates are replaced-by-id or
/// appended; models are unioned by name with the existing entry preserved
/// on a name collision; hotkeys and popup geometry are never touched by an
/// import.
pub fn merge_import(existing: &AppConfig, imported: AppConfig) -> AppConfig {
    let mut templates: Vec<Template> = existing.templates.clone();
    for incoming in imported.templates {
        if let Some(slot) = templates.iter_mut().find(|t| t.id == incoming.id) {
            *slot = incoming;
        } else {
            templates.push(incoming);
        }
    }

    let mut models: Vec<Model> = existing.models.clone();
    for incoming in imported.models {
        if !models.iter().any(|m| m.name == incoming.name) {
            models.push(incoming);
        }
    }

    AppConfig {
        models,
        templates,
        hotkeys: existing.hotkeys.clone(),
        selected_model_index: existing.selected_model_index,
        popup_width: existing.popup_width,
        max_popup_height: existing.max_popup_height,
    }
}

/// Callback invoked after every successful save, so the Hotkey Dispatcher
/// and Window Manager can resynchronize (Design Notes §9: an explicit
/// post-save notification call rather than an implicit observer pattern).
pub trait ConfigChangeListener: Send + Sync {
    fn on_config_saved(&self, config: &AppConfig);
}

pub struct ConfigStore {
    path: PathBuf,
    inner: RwLock<AppConfig>,
    listeners: RwLock<Vec<std::sync::Arc<dyn ConfigChangeListener>>>,
}

impl ConfigStore {
    pub fn open(app_data_dir: &Path) -> Self {
        let path = config_file_path(app_data_dir);
        let config = load_from_path(&path);
        ConfigStore {
            path,
            inner: RwLock::new(config),
            listeners: RwLock::new(Vec::new()),
        }
    }

    pub fn subscribe(&self, listener: std::sync::Arc<dyn ConfigChangeListener>) {
        self.listeners.write().push(listener);
    }

    pub fn load(&self) -> AppConfig {
        self.inner.read().clone()
    }

    pub fn save(&self, config: AppConfig) -> Result<()> {
        validate(&config)?;
        save_to_path(&self.path, &config)?;
        *self.inner.write() = config.clone();
        for listener in self.listeners.read().iter() {
            listener.on_config_saved(&config);
        }
        Ok(())
    }

    pub fn export_json(&self) -> Result<String> {
        serde_json::to_string_pretty(&*self.inner.read())
            .map_err(|e| CoreError::InvalidConfig(e.to_string()))
    }

    pub fn import_json(&self, text: &str) -> Result<()> {
        let imported: AppConfig =
            serde_json::from_str(text).map_err(|e| CoreError::InvalidConfig(e.to_string()))?;
        let merged = merge_import(&self.inner.read(), imported);
        self.save(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::{HotkeysConfig, Model, Template};
    use tempfile::tempdir;

    fn sample_config() -> AppConfig {
        AppConfig {
            models: vec![
                Model { name: "OpenAI".into(), base_url: "https://api.openai.com/v1".into(), api_key: "k1".into(), model_name: "gpt-4o".into(), supports_vision: true },
                Model { name: "Local".into(), base_url: "http://localhost:11434/v1".into(), api_key: "".into(), model_name: "llama3".into(), supports_vision: false },
            ],
            templates: vec![Template {
                id: "t1".into(),
                name: "Explain".into(),
                prompt: "Explain:".into(),
                action: PostAction::Copy,
                hotkey: Some("Alt+E".into()),
                background_mode: false,
            }],
            hotkeys: HotkeysConfig { popup_hotkey: "Alt+S".into(), screenshot_hotkey: None },
            selected_model_index: 1,
            popup_width: 500,
            max_popup_height: 600,
        }
    }

    #[test]
    fn round_trip_save_then_load_is_field_for_field_equal() {
        let dir = tempdir().unwrap();
        let store = ConfigStore::open(dir.path());
        let cfg = sample_config();
        store.save(cfg.clone()).unwrap();
        assert_eq!(store.load(), cfg);
    }

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempdir().unwrap();
        let store = ConfigStore::open(dir.path());
        assert_eq!(store.load(), AppConfig::default());
    }

    #[test]
    fn save_persists_atomically_and_survives_reopen() {
        let dir = tempdir().unwrap();
        let cfg = sample_config();
        {
            let store = ConfigStore::open(dir.path());
            store.save(cfg.clone()).unwrap();
        }
        let reopened = ConfigStore::open(dir.path());
        assert_eq!(reopened.load(), cfg);
    }

    #[test]
    fn save_rejects_out_of_range_selected_model_index() {
        let dir = tempdir().unwrap();
        let store = ConfigStore::open(dir.path());
        let mut cfg = sample_config();
        cfg.selected_model_index = 5;
        let before = store.load();
        assert!(store.save(cfg).is_err());
        // Failed save must not mutate the persisted file (spec §7).
        assert_eq!(store.load(), before);
    }

    #[test]
    fn save_rejects_invalid_hotkey() {
        let dir = tempdir().unwrap();
        let store = ConfigStore::open(dir.path());
        let mut cfg = sample_config();
        cfg.hotkeys.popup_hotkey = "NotAKey".into();
        assert!(store.save(cfg).is_err());
    }

    #[test]
    fn save_rejects_duplicate_template_names_case_insensitively() {
        let dir = tempdir().unwrap();
        let store = ConfigStore::open(dir.path());
        let mut cfg = sample_config();
        cfg.templates.push(Template {
            id: "t2".into(),
            name: "EXPLAIN".into(),
            prompt: "x".into(),
            action: PostAction::None,
            hotkey: None,
            background_mode: false,
        });
        assert!(store.save(cfg).is_err());
    }

    #[test]
    fn save_rejects_background_template_without_hotkey() {
        let dir = tempdir().unwrap();
        let store = ConfigStore::open(dir.path());
        let mut cfg = sample_config();
        cfg.templates[0].background_mode = true;
        cfg.templates[0].hotkey = None;
        assert!(store.save(cfg).is_err());
    }

    #[test]
    fn save_rejects_popup_width_out_of_range() {
        let dir = tempdir().unwrap();
        let store = ConfigStore::open(dir.path());
        let mut cfg = sample_config();
        cfg.popup_width = 50;
        assert!(store.save(cfg).is_err());
    }

    #[test]
    fn missing_fields_adopt_documented_defaults() {
        let dir = tempdir().unwrap();
        let path = config_file_path(dir.path());
        std::fs::create_dir_all(dir.path()).unwrap();
        std::fs::write(&path, r#"{"models":[{"name":"X","base_url":"https://x","api_key":"","model_name":"m","supports_vision":false}]}"#).unwrap();
        let loaded = load_from_path(&path);
        assert_eq!(loaded.popup_width, DEFAULT_POPUP_WIDTH_FOR_TEST);
        assert_eq!(loaded.hotkeys.popup_hotkey, "Alt+S");
        assert_eq!(loaded.selected_model_index, 0);
    }

    const DEFAULT_POPUP_WIDTH_FOR_TEST: u32 = super::super::types::DEFAULT_POPUP_WIDTH;

    #[test]
    fn merge_import_replaces_by_id_and_appends_new() {
        let existing = AppConfig {
            templates: vec![
                Template { id: "a".into(), name: "A".into(), prompt: "pa".into(), action: PostAction::None, hotkey: None, background_mode: false },
                Template { id: "b".into(), name: "B".into(), prompt: "pb".into(), action: PostAction::None, hotkey: None, background_mode: false },
            ],
            ..AppConfig::default()
        };
        let imported = AppConfig {
            templates: vec![
                Template { id: "b".into(), name: "B2".into(), prompt: "pb2".into(), action: PostAction::None, hotkey: None, background_mode: false },
                Template { id: "c".into(), name: "C".into(), prompt: "pc".into(), action: PostAction::None, hotkey: None, background_mode: false },
            ],
            ..AppConfig::default()
        };
        let merged = merge_import(&existing, imported);
        let ids: Vec<&str> = merged.templates.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(merged.templates[1].name, "B2");
    }

    #[test]
    fn merge_import_unions_models_by_name_preferring_existing() {
        let existing = AppConfig {
            models: vec![Model { name: "OpenAI".into(), base_url: "existing".into(), api_key: "k".into(), model_name: "gpt-4o".into(), supports_vision: true }],
            ..AppConfig::default()
        };
        let imported = AppConfig {
            models: vec![
                Model { name: "OpenAI".into(), base_url: "imported".into(), api_key: "other".into(), model_name: "gpt-4o".into(), supports_vision: true },
                Model { name: "Local".into(), base_url: "http://localhost".into(), api_key: "".into(), model_name: "llama3".into(), supports_vision: false },
            ],
            ..AppConfig::default()
        };
        let merged = merge_import(&existing, imported);
        assert_eq!(merged.models.len(), 2);
        assert_eq!(merged.models[0].base_url, "existing");
    }

    #[test]
    fn merge_import_ignores_hotkeys_and_popup_size() {
        let existing = AppConfig { popup_width: 700, ..AppConfig::default() };
        let mut imported = AppConfig::default();
        imported.popup_width = 1000;
        imported.hotkeys.popup_hotkey = "Ctrl+Z".into();
        let merged = merge_import(&existing, imported);
        assert_eq!(merged.popup_width, 700);
        assert_eq!(merged.hotkeys.popup_hotkey, existing.hotkeys.popup_hotkey);
    }

    #[test]
    fn import_json_fails_on_malformed_json_without_mutating_store() {
        let dir = tempdir().unwrap();
        let store = ConfigStore::open(dir.path());
        let before = store.load();
        assert!(store.import_json("{not json").is_err());
        assert_eq!(store.load(), before);
    }

    #[test]
    fn export_then_import_round_trips_into_same_store() {
        let dir = tempdir().unwrap();
        let store = ConfigStore::open(dir.path());
        store.save(sample_config()).unwrap();
        let json = store.export_json().unwrap();

        let dir2 = tempdir().unwrap();
        let store2 = ConfigStore::open(dir2.path());
        store2.import_json(&json).unwrap();
        assert_eq!(store2.load().templates, sample_config().templates);
    }
}
