//! Configuration type definitions (spec §3, §6.1).
//!
//! Field layout and `#[serde(default = "...")]` idiom follow the teacher's
//! `config/types.rs`; this module covers only the backend-core schema
//! (models, templates, hotkeys, popup geometry) rather than Script Kit's
//! much larger settings surface.

use serde::{Deserialize, Serialize};

pub const DEFAULT_POPUP_WIDTH: u32 = 500;
pub const DEFAULT_MAX_POPUP_HEIGHT: u32 = 600;
pub const POPUP_DIMENSION_MIN: u32 = 300;
pub const POPUP_DIMENSION_MAX: u32 = 1200;
pub const DEFAULT_POPUP_HOTKEY: &str = "Alt+S";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    pub name: String,
    pub base_url: String,
    pub api_key: String,
    pub model_name: String,
    #[serde(default)]
    pub supports_vision: bool,
}

impl Default for Model {
    fn default() -> Self {
        Model {
            name: "OpenAI".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: String::new(),
            model_name: "gpt-4o".to_string(),
            supports_vision: true,
        }
    }
}

/// Post-action tagged sum (Design Notes §9: model as a sum, not a dispatch table).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PostAction {
    #[default]
    None,
    Copy,
    Replace,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub id: String,
    pub name: String,
    pub prompt: String,
    #[serde(default)]
    pub action: PostAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hotkey: Option<String>,
    #[serde(default)]
    pub background_mode: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotkeysConfig {
    #[serde(default = "default_popup_hotkey")]
    pub popup_hotkey: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screenshot_hotkey: Option<String>,
}

fn default_popup_hotkey() -> String {
    DEFAULT_POPUP_HOTKEY.to_string()
}

impl Default for HotkeysConfig {
    fn default() -> Self {
        HotkeysConfig {
            popup_hotkey: default_popup_hotkey(),
            screenshot_hotkey: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_models")]
    pub models: Vec<Model>,
    #[serde(default)]
    pub templates: Vec<Template>,
    #[serde(default)]
    pub hotkeys: HotkeysConfig,
    #[serde(default)]
    pub selected_model_index: usize,
    #[serde(default = "default_popup_width")]
    pub popup_width: u32,
    #[serde(default = "default_max_popup_height")]
    pub max_popup_height: u32,
}

fn default_models() -> Vec<Model> {
    vec![Model::default()]
}

fn default_popup_width() -> u32 {
    DEFAULT_POPUP_WIDTH
}

fn default_max_popup_height() -> u32 {
    DEFAULT_MAX_POPUP_HEIGHT
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            models: default_models(),
            templates: Vec::new(),
            hotkeys: HotkeysConfig::default(),
            selected_model_index: 0,
            popup_width: DEFAULT_POPUP_WIDTH,
            max_popup_height: DEFAULT_MAX_POPUP_HEIGHT,
        }
    }
}
