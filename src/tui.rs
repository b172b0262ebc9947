//! Terminal front end
//!
//! The UI loop owns the [`App`] state and nothing else: questions and session
//! resets go to the conversation runtime, health and discovery run as
//! background tasks, and every result comes back as a [`UiEvent`].

mod app;
mod event;
mod render;

use crate::backend::Backend;
use crate::runtime::{check_health, discover_schema, RuntimeHandle, RuntimeEvent};
use app::{Action, App};
use crossterm::event::{Event as CrosstermEvent, KeyEventKind};
use event::{EventHandler, UiEvent};
use ratatui::DefaultTerminal;
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};

/// Run the UI until the user quits.
pub async fn run<B: Backend + 'static>(
    mut terminal: DefaultTerminal,
    backend: Arc<B>,
    handle: RuntimeHandle,
    runtime_rx: broadcast::Receiver<RuntimeEvent>,
    health_interval: Option<Duration>,
) -> io::Result<()> {
    let mut app = App::new();
    let mut events = EventHandler::new(runtime_rx, health_interval);
    if app.begin_health_check() {
        spawn_health_check(&backend, events.sender());
    }

    while app.running {
        terminal.draw(|frame| render::draw(frame, &app))?;

        let Some(event) = events.next().await else {
            break;
        };
        match event {
            UiEvent::Terminal(CrosstermEvent::Key(key)) if key.kind == KeyEventKind::Press => {
                let action = app.handle_key(key);
                dispatch(action, &backend, &handle, &events, &mut app).await;
            }
            UiEvent::Terminal(_) => {}
            UiEvent::Runtime(runtime_event) => app.apply_runtime_event(runtime_event),
            UiEvent::Health(status) => {
                if !status.is_connected() {
                    tracing::debug!(?status, "Backend health check failed");
                }
                app.finish_health_check(status);
            }
            UiEvent::Discovery(status) => app.finish_discovery(status),
            // A slow check still running makes this tick redundant
            UiEvent::HealthTick => {
                if app.begin_health_check() {
                    spawn_health_check(&backend, events.sender());
                }
            }
        }
    }

    tracing::info!("UI closed");
    Ok(())
}

async fn dispatch<B: Backend + 'static>(
    action: Action,
    backend: &Arc<B>,
    handle: &RuntimeHandle,
    events: &EventHandler,
    app: &mut App,
) {
    let result = match action {
        Action::None | Action::Quit => Ok(()),
        Action::Submit(text) => handle.submit(text).await,
        Action::NewSession => handle.new_session().await,
        Action::Discover => {
            spawn_discovery(backend, events.sender());
            Ok(())
        }
        Action::CheckHealth => {
            spawn_health_check(backend, events.sender());
            Ok(())
        }
    };

    if let Err(e) = result {
        tracing::error!(error = %e, "Failed to reach conversation runtime");
        app.notice = Some(e.to_string());
        app.running = false;
    }
}

fn spawn_health_check<B: Backend + 'static>(
    backend: &Arc<B>,
    sender: mpsc::UnboundedSender<UiEvent>,
) {
    let backend = Arc::clone(backend);
    tokio::spawn(async move {
        let status = check_health(backend.as_ref()).await;
        let _ = sender.send(UiEvent::Health(status));
    });
}

fn spawn_discovery<B: Backend + 'static>(
    backend: &Arc<B>,
    sender: mpsc::UnboundedSender<UiEvent>,
) {
    let backend = Arc::clone(backend);
    tokio::spawn(async move {
        let status = discover_schema(backend.as_ref()).await;
        let _ = sender.send(UiEvent::Discovery(status));
    });
}
