//! Process entry point: wires an [`AppContext`] to stdin/stdout as
//! newline-delimited JSON (spec §6.3). One command per line in, one
//! response per line out on `stdout`; asynchronous events (streaming AI
//! chunks, `execute-template`/`trigger-replace`) are interleaved on the
//! same stream as they occur.

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tracing::{error, info};

use popup_assist_core::commands::{Command, CommandHandler, Event};
use popup_assist_core::hotkeys::handle_activation;
use popup_assist_core::AppContext;

fn app_data_dir() -> std::path::PathBuf {
    dirs::data_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("popup-assist-core")
}

#[tokio::main(flavor = "multi_thread")]
async fn main() {
    let data_dir = app_data_dir();
    popup_assist_core::logging::init(&data_dir);
    info!("popup-assist-core starting");

    let ctx = match AppContext::new(&data_dir) {
        Ok(ctx) => ctx,
        Err(e) => {
            error!(error = ?e, "failed to initialize application context");
            std::process::exit(1);
        }
    };

    run(ctx).await;
}

async fn run(ctx: Arc<AppContext>) {
    let (event_tx, mut event_rx) = mpsc::channel::<Event>(64);

    spawn_hotkey_listener(ctx.clone(), event_tx.clone());

    let handler = CommandHandler::new(ctx);
    let mut stdout = tokio::io::stdout();

    let writer = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            write_line(&mut stdout, &event).await;
        }
    });

    let stdin = tokio::io::stdin();
    let mut lines = BufReader::new(stdin).lines();

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break, // stdin closed: external collaborator exited
            Err(e) => {
                error!(error = ?e, "failed to read command line");
                break;
            }
        };

        if line.trim().is_empty() {
            continue;
        }

        let command: Command = match serde_json::from_str(&line) {
            Ok(command) => command,
            Err(e) => {
                error!(error = ?e, line, "received malformed command");
                continue;
            }
        };

        let response = handler.handle(command, event_tx.clone()).await;
        let mut stdout = tokio::io::stdout();
        write_line(&mut stdout, &response).await;
    }

    drop(event_tx);
    let _ = writer.await;
}

/// Dedicated OS-event thread for the global hotkey receiver, mirroring the
/// teacher's `start_hotkey_listener` (`hotkeys/part_003.rs`): `global_hotkey`
/// delivers activations on a blocking channel, so it gets its own
/// `std::thread::spawn` rather than being polled from async code. Each
/// activation is handed off to the tokio runtime via the captured `Handle`.
fn spawn_hotkey_listener(ctx: Arc<AppContext>, events: mpsc::Sender<Event>) {
    let runtime = tokio::runtime::Handle::current();
    std::thread::spawn(move || {
        let receiver = global_hotkey::GlobalHotKeyEvent::receiver();
        while let Ok(event) = receiver.recv() {
            if event.state != global_hotkey::HotKeyState::Pressed {
                continue;
            }

            let Some(action) = ctx.hotkeys.route(event.id) else { continue };
            info!(?action, "hotkey activated");

            let ctx = ctx.clone();
            let events = events.clone();
            runtime.spawn(async move {
                handle_activation(action, ctx, events).await;
            });
        }
    });
}

async fn write_line<T: serde::Serialize>(stdout: &mut tokio::io::Stdout, value: &T) {
    match serde_json::to_string(value) {
        Ok(json) => {
            if stdout.write_all(json.as_bytes()).await.is_ok() {
                let _ = stdout.write_all(b"\n").await;
                let _ = stdout.flush().await;
            }
        }
        Err(e) => error!(error = ?e, "failed to serialize outgoing message"),
    }
}
