use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::debug;

use crate::config::EventConfig;
use crate::controller::{ScreenController, ScreenState};
use crate::effects::EffectCommand;
use crate::speech::SpeechEvent;
use crate::tui::stage::Stage;

const CURSOR_BLINK: Duration = Duration::from_millis(500);

pub struct App {
    pub should_quit: bool,
    pub controller: ScreenController,
    pub event: EventConfig,
    /// Text typed on the entry screen
    pub name_input: String,
    pub stage: Stage,
    cursor_visible: bool,
    last_blink: Option<Instant>,
}

impl App {
    pub fn new(controller: ScreenController, event: EventConfig) -> Self {
        Self {
            should_quit: false,
            controller,
            event,
            name_input: String::new(),
            stage: Stage::new(),
            cursor_visible: true,
            last_blink: None,
        }
    }

    /// The entry button is disabled until something non-blank is typed
    pub fn can_submit(&self) -> bool {
        !self.name_input.trim().is_empty()
    }

    pub fn cursor_visible(&self) -> bool {
        self.cursor_visible
    }

    pub fn handle_key(&mut self, key: KeyEvent, now: Instant) {
        // Mute works on every screen
        if key.code == KeyCode::Tab {
            self.controller.toggle_mute(now);
            return;
        }

        match self.controller.state() {
            ScreenState::Entry => self.handle_entry_key(key, now),
            ScreenState::Greeting => match key.code {
                KeyCode::Char('m') => {
                    self.controller.toggle_mute(now);
                }
                KeyCode::Char('q') => self.should_quit = true,
                _ => {}
            },
            ScreenState::Invitation => self.handle_invitation_key(key, now),
        }
    }

    fn handle_entry_key(&mut self, key: KeyEvent, now: Instant) {
        match key.code {
            KeyCode::Enter => match self.controller.submit(&self.name_input, now) {
                Ok(_) => self.name_input.clear(),
                Err(e) => debug!(target: "tui", "Submit rejected: {}", e),
            },
            KeyCode::Backspace => {
                self.name_input.pop();
            }
            KeyCode::Esc => self.should_quit = true,
            KeyCode::Char(c) => {
                // Add character to input (but don't process control keys like Ctrl+C)
                if !key.modifiers.contains(KeyModifiers::CONTROL) {
                    self.name_input.push(c);
                }
            }
            _ => {}
        }
    }

    fn handle_invitation_key(&mut self, key: KeyEvent, now: Instant) {
        let result = match key.code {
            KeyCode::Char('c') | KeyCode::Enter => self.controller.celebrate(),
            KeyCode::Char('b') | KeyCode::Esc | KeyCode::Backspace => {
                self.controller.back().map(|_| ())
            }
            KeyCode::Char('m') => {
                self.controller.toggle_mute(now);
                Ok(())
            }
            KeyCode::Char('q') => {
                self.should_quit = true;
                Ok(())
            }
            _ => Ok(()),
        };
        if let Err(e) = result {
            debug!(target: "tui", "Key ignored: {}", e);
        }
    }

    pub fn handle_speech_event(&mut self, event: SpeechEvent, now: Instant) {
        self.controller.handle_speech_event(event, now);
    }

    pub fn apply_effect(&mut self, command: EffectCommand, now: Instant) {
        self.stage.apply(command, now);
    }

    pub fn tick(&mut self, now: Instant) {
        if let Some(transition) = self.controller.tick(now) {
            debug!(target: "tui", "Transition: {:?}", transition);
        }
        self.stage.update(now);

        match self.last_blink {
            Some(last) if now.saturating_duration_since(last) < CURSOR_BLINK => {}
            _ => {
                self.cursor_visible = !self.cursor_visible;
                self.last_blink = Some(now);
            }
        }
    }
}
