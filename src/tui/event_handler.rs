use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tokio::sync::mpsc;

#[derive(Debug, Clone)]
pub enum TuiEvent {
    Key(KeyEvent),
    Quit,
    Tick,
}

pub struct EventHandler {
    tx: mpsc::UnboundedSender<TuiEvent>,
    tick_rate: Duration,
}

/// Keeps the polling task alive until `shutdown` is called.
pub struct EventHandlerHandle {
    shutdown: Arc<AtomicBool>,
}

impl EventHandlerHandle {
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }
}

impl EventHandler {
    pub fn new(tick_rate: Duration) -> (Self, mpsc::UnboundedReceiver<TuiEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx, tick_rate }, rx)
    }

    pub fn start(self) -> EventHandlerHandle {
        let shutdown = Arc::new(AtomicBool::new(false));
        let stop = shutdown.clone();

        // crossterm polling blocks, so it gets its own thread
        tokio::task::spawn_blocking(move || {
            let mut last_tick = Instant::now();
            while !stop.load(Ordering::Relaxed) {
                let timeout = self.tick_rate.saturating_sub(last_tick.elapsed());
                if event::poll(timeout).unwrap_or(false) {
                    if let Ok(Event::Key(key)) = event::read() {
                        if let Some(event) = classify_key(key) {
                            if self.tx.send(event).is_err() {
                                break;
                            }
                        }
                    }
                }

                if last_tick.elapsed() >= self.tick_rate {
                    if self.tx.send(TuiEvent::Tick).is_err() {
                        break;
                    }
                    last_tick = Instant::now();
                }
            }
        });

        EventHandlerHandle { shutdown }
    }
}

/// Ctrl+C always quits; key releases are dropped.
fn classify_key(key: KeyEvent) -> Option<TuiEvent> {
    if key.kind == KeyEventKind::Release {
        return None;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        Some(TuiEvent::Quit)
    } else {
        Some(TuiEvent::Key(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ctrl_c_is_quit() {
        let key = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert!(matches!(classify_key(key), Some(TuiEvent::Quit)));
    }

    #[test]
    fn test_plain_c_is_a_key() {
        let key = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::NONE);
        assert!(matches!(classify_key(key), Some(TuiEvent::Key(_))));
    }

    #[test]
    fn test_release_is_dropped() {
        let mut key = KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE);
        key.kind = KeyEventKind::Release;
        assert!(classify_key(key).is_none());
    }
}
