//! Hotkey activation orchestration (spec §4.5, §4.6): turns a routed
//! `HotkeyAction` into the same capture/AI/post-action sequence the Command
//! Surface performs for UI-initiated requests, so a template bound to a
//! hotkey behaves identically whether it was triggered by the OS or by the
//! external collaborator.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::commands::{run_ai_stream, Event};
use crate::error::ResultExt;
use crate::platform;
use crate::selection;
use crate::AppContext;

use super::dispatcher::HotkeyAction;

/// Handle one activation. Runs entirely in the background: nothing here
/// blocks the hotkey-listener thread beyond dispatching to `tokio::spawn`.
pub async fn handle_activation(action: HotkeyAction, ctx: Arc<AppContext>, events: mpsc::Sender<Event>) {
    match action {
        HotkeyAction::ShowPopup => show_popup(&ctx).await,
        HotkeyAction::TakeScreenshot => take_screenshot(&ctx).await,
        HotkeyAction::ActivateTemplate(template_id) => activate_template(ctx, template_id, events).await,
    }
}

async fn show_popup(ctx: &Arc<AppContext>) {
    let clipboard = ctx.clipboard.clone();
    let input = ctx.input.clone();
    let foreground = ctx.foreground.clone();
    let result =
        tokio::task::spawn_blocking(move || selection::capture_selected_text(&*clipboard, &*input, &*foreground))
            .await;

    match result {
        Ok(Ok(captured)) => *ctx.last_capture.write() = Some(captured),
        Ok(Err(e)) => warn!(error = ?e, "popup hotkey: selection capture failed"),
        Err(join_err) => warn!(error = ?join_err, "popup hotkey: capture task panicked"),
    }

    ctx.window.show_compact(platform::cursor_position());
}

async fn take_screenshot(ctx: &Arc<AppContext>) {
    let result = tokio::task::spawn_blocking(selection::capture_full_display).await;
    match result {
        Ok(Ok(image)) => {
            let _ = ctx.screenshots.add(&image).warn_on_err();
        }
        Ok(Err(e)) => warn!(error = ?e, "screenshot hotkey: capture failed"),
        Err(join_err) => warn!(error = ?join_err, "screenshot hotkey: capture task panicked"),
    }
    ctx.window.show_compact(platform::cursor_position());
}

async fn activate_template(ctx: Arc<AppContext>, template_id: String, events: mpsc::Sender<Event>) {
    let config = ctx.config.load();
    let Some(template) = config.templates.iter().find(|t| t.id == template_id).cloned() else {
        warn!(template_id, "hotkey bound to a template that no longer exists");
        return;
    };

    let clipboard = ctx.clipboard.clone();
    let input = ctx.input.clone();
    let foreground = ctx.foreground.clone();
    let captured =
        tokio::task::spawn_blocking(move || selection::capture_selected_text(&*clipboard, &*input, &*foreground))
            .await;

    let text = match captured {
        Ok(Ok(captured)) => {
            let text = captured.text.clone();
            *ctx.last_capture.write() = Some(captured);
            text
        }
        Ok(Err(e)) => {
            // A foreground template with no selection simply has nothing to
            // send; a background one is handled by the empty-text check
            // below rather than treated as an error.
            warn!(error = ?e, template = %template.name, "template hotkey: no text captured");
            String::new()
        }
        Err(join_err) => {
            warn!(error = ?join_err, "template hotkey: capture task panicked");
            return;
        }
    };

    if template.background_mode && text.is_empty() {
        info!(template = %template.name, "skipping background template with no capturable text");
        return;
    }

    if !template.background_mode {
        ctx.window.show_compact(platform::cursor_position());
        let _ = events.send(Event::ExecuteTemplate { template_id: template.id.clone() }).await;
    }

    run_ai_stream(&ctx, Some(template.id), template.prompt.replace("{{input}}", &text), None, events).await;
}
