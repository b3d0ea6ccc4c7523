//! Command Surface (spec §6.3): the fixed interface through which the
//! out-of-scope UI drives this backend. Tagged `Command`/`Event` enums over
//! newline-delimited JSON follow the teacher's `protocol::message::Message`
//! shape (`#[serde(tag = "type")]`), narrowed to this backend's own
//! operations instead of Script Kit's full prompt/media/system surface.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::warn;

use crate::ai::ChatRequest;
use crate::config::{AppConfig, PostAction};
use crate::error::{CoreError, ResultExt};
use crate::selection::{self, Region, Screenshot};
use crate::AppContext;

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum Command {
    #[serde(rename = "load_config")]
    LoadConfig {},
    #[serde(rename = "save_config")]
    SaveConfig { config: AppConfig },
    #[serde(rename = "export_config")]
    ExportConfig {},
    #[serde(rename = "import_config")]
    ImportConfig { json: String },

    #[serde(rename = "show_popup_window")]
    ShowPopupWindow { cursor_x: i32, cursor_y: i32 },
    #[serde(rename = "hide_popup_window")]
    HidePopupWindow {},
    #[serde(rename = "resize_popup_window")]
    ResizePopupWindow { width: u32, height: u32 },
    #[serde(rename = "set_popup_pinned")]
    SetPopupPinned { pinned: bool },
    #[serde(rename = "is_popup_pinned")]
    IsPopupPinned {},

    #[serde(rename = "get_captured_text")]
    GetCapturedText {},
    #[serde(rename = "replace_text_in_source")]
    ReplaceTextInSource { text: String },

    #[serde(rename = "take_screenshot")]
    TakeScreenshot {},
    #[serde(rename = "capture_screenshot_region")]
    CaptureScreenshotRegion { x: i32, y: i32, width: u32, height: u32 },
    #[serde(rename = "get_screenshots")]
    GetScreenshots {},
    #[serde(rename = "clear_screenshots")]
    ClearScreenshots {},
    #[serde(rename = "remove_screenshot")]
    RemoveScreenshot { id: u64 },
    #[serde(rename = "show_screenshot_selector")]
    ShowScreenshotSelector {},

    #[serde(rename = "stream_ai_response")]
    StreamAiResponse {
        template_id: Option<String>,
        text: String,
        #[serde(default)]
        image_data_uri: Option<String>,
    },
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum Response {
    #[serde(rename = "ok")]
    Ok,
    #[serde(rename = "config")]
    Config { config: AppConfig },
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "bool")]
    Bool { value: bool },
    #[serde(rename = "screenshots")]
    Screenshots { screenshots: Vec<Screenshot> },
    #[serde(rename = "screenshot")]
    ScreenshotTaken { screenshot: Screenshot },
    #[serde(rename = "error")]
    Error { message: String },
}

impl From<CoreError> for Response {
    fn from(err: CoreError) -> Self {
        Response::Error { message: err.user_message() }
    }
}

/// Process-initiated messages: streaming chunks and the two
/// external-collaborator events named in spec §6.3.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum Event {
    #[serde(rename = "execute-template")]
    ExecuteTemplate { template_id: String },
    #[serde(rename = "trigger-replace")]
    TriggerReplace { text: String },
    #[serde(rename = "ai_chunk")]
    AiChunk { session_id: u64, chunk: String },
    #[serde(rename = "ai_done")]
    AiDone { session_id: u64, full_text: String },
    #[serde(rename = "ai_error")]
    AiError { session_id: u64, message: String },
}

pub struct CommandHandler {
    ctx: Arc<AppContext>,
}

impl CommandHandler {
    pub fn new(ctx: Arc<AppContext>) -> Self {
        CommandHandler { ctx }
    }

    pub async fn handle(&self, command: Command, events: mpsc::Sender<Event>) -> Response {
        match command {
            Command::LoadConfig {} => Response::Config { config: self.ctx.config.load() },
            Command::SaveConfig { config } => match self.ctx.config.save(config.clone()) {
                Ok(()) => {
                    self.ctx.hotkeys.sync(&config);
                    self.ctx.window.set_dimensions(config.popup_width, config.max_popup_height);
                    Response::Ok
                }
                Err(e) => e.into(),
            },
            Command::ExportConfig {} => match self.ctx.config.export_json() {
                Ok(text) => Response::Text { text },
                Err(e) => e.into(),
            },
            Command::ImportConfig { json } => match self.ctx.config.import_json(&json) {
                Ok(()) => {
                    self.ctx.hotkeys.sync(&self.ctx.config.load());
                    Response::Ok
                }
                Err(e) => e.into(),
            },

            Command::ShowPopupWindow { cursor_x, cursor_y } => {
                self.ctx.window.show_compact((cursor_x, cursor_y));
                Response::Ok
            }
            Command::HidePopupWindow {} => {
                self.ctx.window.hide();
                Response::Ok
            }
            Command::ResizePopupWindow { width, height } => {
                self.ctx.window.set_dimensions(width, height);
                Response::Ok
            }
            Command::SetPopupPinned { pinned } => {
                self.ctx.window.set_pinned(pinned);
                Response::Ok
            }
            Command::IsPopupPinned {} => Response::Bool { value: self.ctx.window.is_pinned() },

            Command::GetCapturedText {} => self.capture_text().await,
            Command::ReplaceTextInSource { text } => self.replace_text(text).await,

            Command::TakeScreenshot {} => self.take_screenshot().await,
            Command::CaptureScreenshotRegion { x, y, width, height } => {
                self.capture_screenshot_region(Region { x, y, width, height }).await
            }
            Command::GetScreenshots {} => {
                Response::Screenshots { screenshots: self.ctx.screenshots.all() }
            }
            Command::ClearScreenshots {} => {
                self.ctx.screenshots.clear();
                Response::Ok
            }
            Command::RemoveScreenshot { id } => {
                self.ctx.screenshots.remove(id);
                Response::Ok
            }
            Command::ShowScreenshotSelector {} => {
                // Layout/rendering of the selector itself is the UI's job;
                // the backend only needs to surface the popup.
                self.ctx.window.show_compact((0, 0));
                Response::Ok
            }

            Command::StreamAiResponse { template_id, text, image_data_uri } => {
                run_ai_stream(&self.ctx, template_id, text, image_data_uri, events).await
            }
        }
    }

    /// Lets the Hotkey Dispatcher's activation path reuse the same
    /// AppContext the command loop runs against.
    pub fn context(&self) -> &Arc<AppContext> {
        &self.ctx
    }

    async fn capture_text(&self) -> Response {
        let clipboard = self.ctx.clipboard.clone();
        let input = self.ctx.input.clone();
        let foreground = self.ctx.foreground.clone();
        let result =
            tokio::task::spawn_blocking(move || selection::capture_selected_text(&*clipboard, &*input, &*foreground))
                .await;

        match result {
            Ok(Ok(captured)) => {
                let text = captured.text.clone();
                *self.ctx.last_capture.write() = Some(captured);
                Response::Text { text }
            }
            // A timed-out capture is not an error (spec §7): the popup still
            // opens, just with nothing pre-filled.
            Ok(Err(CoreError::CaptureTimeout)) => Response::Text { text: String::new() },
            Ok(Err(e)) => e.into(),
            Err(join_err) => CoreError::WindowError(join_err.to_string()).into(),
        }
    }

    async fn replace_text(&self, text: String) -> Response {
        let clipboard = self.ctx.clipboard.clone();
        let input = self.ctx.input.clone();
        let foreground_handle = self.ctx.last_capture.read().as_ref().map(|c| c.origin_window);
        if let Some(handle) = foreground_handle {
            let _ = self.ctx.foreground.focus(handle).warn_on_err();
        }

        let result =
            tokio::task::spawn_blocking(move || selection::replace_selected_text(&*clipboard, &*input, &text)).await;

        match result {
            Ok(Ok(())) => Response::Ok,
            Ok(Err(e)) => e.into(),
            Err(join_err) => CoreError::WindowError(join_err.to_string()).into(),
        }
    }

    async fn take_screenshot(&self) -> Response {
        let result = tokio::task::spawn_blocking(selection::capture_full_display).await;
        self.store_screenshot_result(result).await
    }

    async fn capture_screenshot_region(&self, region: Region) -> Response {
        let result = tokio::task::spawn_blocking(move || selection::capture_region(region)).await;
        self.store_screenshot_result(result).await
    }

    async fn store_screenshot_result(
        &self,
        result: std::result::Result<crate::error::Result<image::RgbaImage>, tokio::task::JoinError>,
    ) -> Response {
        match result {
            Ok(Ok(image)) => match self.ctx.screenshots.add(&image) {
                Ok(screenshot) => Response::ScreenshotTaken { screenshot },
                Err(e) => e.into(),
            },
            Ok(Err(e)) => e.into(),
            Err(join_err) => CoreError::WindowError(join_err.to_string()).into(),
        }
    }

}

/// Run one streaming chat-completion request end to end: start a session,
/// forward chunks to `events`, apply the originating template's post-action
/// (if any) once the response is complete. Shared by the Command Surface
/// (`stream_ai_response`) and the Hotkey Dispatcher's template-activation
/// path, so a template bound to a hotkey behaves identically to one
/// triggered from the UI.
pub async fn run_ai_stream(
    ctx: &Arc<AppContext>,
    template_id: Option<String>,
    text: String,
    image_data_uri: Option<String>,
    events: mpsc::Sender<Event>,
) -> Response {
    let config = ctx.config.load();
    let Some(model) = config.models.get(config.selected_model_index).cloned() else {
        return CoreError::InvalidConfig("no model selected".into()).into();
    };

    let (session_id, cancel) = ctx.sessions.start();
    let request = ChatRequest { model, text, image_data_uri };
    let (tx, mut rx) = mpsc::channel(crate::ai::CHUNK_CHANNEL_CAPACITY);

    let ai_client_events = events.clone();
    let forward_ctx = ctx.clone();
    let stream_result = {
        let forward = tokio::spawn(async move {
            let mut full_text = String::new();
            let mut expanded = false;
            while let Some(chunk) = rx.recv().await {
                match chunk {
                    Ok(text) => {
                        if !expanded {
                            forward_ctx.window.expand_in_place();
                            expanded = true;
                        }
                        full_text.push_str(&text);
                        let _ = ai_client_events.send(Event::AiChunk { session_id, chunk: text }).await;
                    }
                    Err(e) => return Err(e),
                }
            }
            Ok(full_text)
        });

        let send_result = ctx.ai_client.stream(request, cancel, tx).await;
        let full_text = forward.await.unwrap_or(Ok(String::new()));
        send_result.and(full_text)
    };
    ctx.sessions.finish(session_id);

    match stream_result {
        Ok(full_text) => {
            if let Some(id) = &template_id {
                if let Some(template) = config.templates.iter().find(|t| &t.id == id) {
                    let origin_window = ctx.last_capture.read().as_ref().map(|c| c.origin_window);
                    if let Err(e) = crate::session::apply_post_action(
                        template.action,
                        &full_text,
                        &*ctx.clipboard,
                        &*ctx.input,
                        &*ctx.foreground,
                        origin_window,
                        &ctx.window,
                    ) {
                        warn!(error = ?e, "post-action failed");
                    }
                    if template.action == PostAction::Replace {
                        let _ = events.send(Event::TriggerReplace { text: full_text.clone() }).await;
                    }
                }
            }
            let _ = events.send(Event::AiDone { session_id, full_text: full_text.clone() }).await;
            Response::Text { text: full_text }
        }
        Err(CoreError::Cancelled) => Response::Ok,
        Err(e) => {
            let _ = events.send(Event::AiError { session_id, message: e.user_message() }).await;
            e.into()
        }
    }
}
