//! Presentation state and key handling

use crate::runtime::{DiscoveryStatus, HealthStatus, RuntimeEvent, SessionSnapshot};
use crate::state_machine::TransitionError;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Lines moved per PageUp/PageDown
const SCROLL_STEP: u16 = 5;

/// What the UI loop should do after a key press
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    None,
    Submit(String),
    NewSession,
    Discover,
    CheckHealth,
    Quit,
}

/// Everything the renderer needs
#[derive(Debug, Default)]
pub struct App {
    pub running: bool,
    /// Latest conversation snapshot from the runtime
    pub snapshot: Option<SessionSnapshot>,
    pub input: String,
    pub health: HealthStatus,
    /// A health check is in flight; at most one runs at a time
    checking_health: bool,
    /// Result of the last schema discovery
    pub discovery: Option<DiscoveryStatus>,
    pub discovering: bool,
    /// Transient runtime message, cleared on the next transcript change
    pub notice: Option<String>,
    pub show_sql: bool,
    /// Lines scrolled back from the bottom of the transcript
    pub scroll_back: u16,
    /// Last question handed to the runtime, restored if it is turned away
    last_submitted: Option<String>,
}

impl App {
    pub fn new() -> Self {
        Self {
            running: true,
            show_sql: true,
            ..Self::default()
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Action {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => self.quit(),
            KeyCode::Char('c') if ctrl => self.quit(),
            KeyCode::Char('n') if ctrl => Action::NewSession,
            KeyCode::Char('d') if ctrl => {
                if self.discovering {
                    Action::None
                } else {
                    self.discovering = true;
                    self.discovery = None;
                    Action::Discover
                }
            }
            KeyCode::Char('r') if ctrl => {
                if self.begin_health_check() {
                    self.health = HealthStatus::Unknown;
                    Action::CheckHealth
                } else {
                    Action::None
                }
            }
            KeyCode::Char('s') if ctrl => {
                self.show_sql = !self.show_sql;
                Action::None
            }
            KeyCode::Char(_) if ctrl => Action::None,
            KeyCode::Char(c) => {
                self.input.push(c);
                Action::None
            }
            KeyCode::Backspace => {
                self.input.pop();
                Action::None
            }
            // The question stays in the box until the runtime can take it
            KeyCode::Enter if self.awaiting_reply() => {
                self.notice = Some(TransitionError::Busy.to_string());
                Action::None
            }
            // Blank input is forwarded; the runtime ignores it
            KeyCode::Enter => {
                let text = std::mem::take(&mut self.input);
                self.last_submitted = Some(text.clone());
                Action::Submit(text)
            }
            KeyCode::PageUp => {
                self.scroll_back = self.scroll_back.saturating_add(SCROLL_STEP);
                Action::None
            }
            KeyCode::PageDown => {
                self.scroll_back = self.scroll_back.saturating_sub(SCROLL_STEP);
                Action::None
            }
            _ => Action::None,
        }
    }

    fn quit(&mut self) -> Action {
        self.running = false;
        Action::Quit
    }

    pub fn apply_runtime_event(&mut self, event: RuntimeEvent) {
        match event {
            RuntimeEvent::StateChanged(snapshot) => {
                // Jump back to the newest turn whenever the transcript changes
                self.scroll_back = 0;
                self.notice = None;
                self.snapshot = Some(snapshot);
            }
            // A notice means the runtime was busy and dropped the question
            RuntimeEvent::Notice { message } => {
                if self.input.is_empty() {
                    if let Some(text) = self.last_submitted.take() {
                        self.input = text;
                    }
                }
                self.notice = Some(message);
            }
        }
    }

    /// Claim the health check slot. Returns `false` if one is already running.
    pub fn begin_health_check(&mut self) -> bool {
        !std::mem::replace(&mut self.checking_health, true)
    }

    pub fn finish_health_check(&mut self, status: HealthStatus) {
        self.checking_health = false;
        self.health = status;
    }

    pub fn finish_discovery(&mut self, status: DiscoveryStatus) {
        self.discovering = false;
        self.discovery = Some(status);
    }

    pub fn awaiting_reply(&self) -> bool {
        self.snapshot.as_ref().is_some_and(|s| s.awaiting_reply)
    }
}
