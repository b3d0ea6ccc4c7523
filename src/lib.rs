//! Backend core for a Windows-resident popup AI assistant: hotkeys,
//! selection capture, a streaming AI client, a JSON config store, and popup
//! window state. UI rendering, packaging, and OS autostart are owned by an
//! external collaborator and reached only through the Command Surface in
//! [`commands`].

pub mod accelerator;
pub mod ai;
pub mod commands;
pub mod config;
pub mod error;
pub mod hotkeys;
pub mod logging;
pub mod platform;
pub mod selection;
pub mod session;
pub mod window;

use std::path::Path;
use std::sync::Arc;

use parking_lot::RwLock;

use ai::AiClient;
use config::ConfigStore;
use error::Result;
use hotkeys::{GlobalHotkeyBackend, HotkeyDispatcher};
use selection::{CapturedContext, ClipboardPort, ForegroundWindowPort, InputPort, ScreenshotStore};
use session::SessionRegistry;
use window::WindowManager;

/// Single constructor-injected object threading every component together;
/// the Command Surface is the only thing that touches it (Design Notes §9:
/// no ambient globals).
pub struct AppContext {
    pub config: ConfigStore,
    pub window: WindowManager,
    pub sessions: SessionRegistry,
    pub screenshots: ScreenshotStore,
    pub ai_client: AiClient,
    pub hotkeys: HotkeyDispatcher,
    pub clipboard: Arc<dyn ClipboardPort>,
    pub input: Arc<dyn InputPort>,
    pub foreground: Arc<dyn ForegroundWindowPort>,
    pub last_capture: RwLock<Option<CapturedContext>>,
}

impl AppContext {
    pub fn new(app_data_dir: &Path) -> Result<Arc<Self>> {
        let config = ConfigStore::open(app_data_dir);
        let loaded = config.load();

        let window = WindowManager::new(loaded.popup_width, loaded.max_popup_height);

        let backend: Box<dyn hotkeys::HotkeyBackend> = Box::new(GlobalHotkeyBackend::new()?);
        let hotkeys = HotkeyDispatcher::new(backend);
        hotkeys.sync(&loaded);

        let clipboard: Arc<dyn ClipboardPort> = Arc::new(platform::ArboardClipboard::new()?);
        let input: Arc<dyn InputPort> = Arc::new(platform::EnigoInput::new()?);
        let foreground: Arc<dyn ForegroundWindowPort> = Arc::new(platform::WindowsForegroundWindow::new());

        Ok(Arc::new(AppContext {
            config,
            window,
            sessions: SessionRegistry::new(),
            screenshots: ScreenshotStore::new(),
            ai_client: AiClient::new(),
            hotkeys,
            clipboard,
            input,
            foreground,
            last_capture: RwLock::new(None),
        }))
    }
}
