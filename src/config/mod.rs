//! Configuration Store (spec §4.1): schema types plus load/save/export/import.

mod store;
mod types;

pub use store::{
    config_file_path, load_from_path, merge_import, save_to_path, validate, ConfigChangeListener,
    ConfigStore,
};
pub use types::{
    AppConfig, HotkeysConfig, Model, PostAction, Template, DEFAULT_MAX_POPUP_HEIGHT,
    DEFAULT_POPUP_HOTKEY, DEFAULT_POPUP_WIDTH, POPUP_DIMENSION_MAX, POPUP_DIMENSION_MIN,
};
