use std::time::{Duration, Instant};

pub const DEFAULT_REVEAL_INTERVAL: Duration = Duration::from_millis(40);
pub const DEFAULT_TYPING_LINGER: Duration = Duration::from_millis(500);

/// Events produced while revealing a message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealEvent {
    /// The visible prefix grew to this many characters
    Progress(usize),
    /// The full message has been shown and has lingered
    Complete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RevealState {
    Idle,
    Typing { next_step: Instant },
    Lingering { complete_at: Instant },
    Done,
    Cancelled,
}

/// Reveals a message one character per interval.
///
/// Driven by [`TextRevealTimer::tick`]; it never sleeps or spawns. Each tick
/// returns every step that has come due since the previous tick, so a late
/// tick catches up without skipping a prefix length.
#[derive(Debug, Clone)]
pub struct TextRevealTimer {
    message: String,
    /// Byte offset of the end of each prefix, indexed by prefix length
    boundaries: Vec<usize>,
    progress: usize,
    interval: Duration,
    linger: Duration,
    state: RevealState,
    pending: Vec<RevealEvent>,
}

impl TextRevealTimer {
    pub fn new(interval: Duration, linger: Duration) -> Self {
        Self {
            message: String::new(),
            boundaries: vec![0],
            progress: 0,
            interval,
            linger,
            state: RevealState::Idle,
            pending: Vec::new(),
        }
    }

    /// Begin revealing `message` from an empty prefix.
    ///
    /// The empty prefix is reported on the next tick. Any previous run is
    /// discarded.
    pub fn start(&mut self, message: &str, now: Instant) {
        self.message = message.to_string();
        self.boundaries = std::iter::once(0)
            .chain(message.char_indices().map(|(i, c)| i + c.len_utf8()))
            .collect();
        self.progress = 0;
        self.pending = vec![RevealEvent::Progress(0)];
        self.state = if self.len() == 0 {
            RevealState::Lingering {
                complete_at: now + self.linger,
            }
        } else {
            RevealState::Typing {
                next_step: now + self.interval,
            }
        };
    }

    pub fn tick(&mut self, now: Instant) -> Vec<RevealEvent> {
        let mut events = std::mem::take(&mut self.pending);

        loop {
            match self.state {
                RevealState::Typing { next_step } if now >= next_step => {
                    self.progress += 1;
                    events.push(RevealEvent::Progress(self.progress));

                    self.state = if self.progress >= self.len() {
                        RevealState::Lingering {
                            complete_at: next_step + self.linger,
                        }
                    } else {
                        RevealState::Typing {
                            next_step: next_step + self.interval,
                        }
                    };
                }
                RevealState::Lingering { complete_at } if now >= complete_at => {
                    events.push(RevealEvent::Complete);
                    self.state = RevealState::Done;
                }
                _ => break,
            }
        }

        events
    }

    /// Stop the current run. Nothing further is emitted for it.
    pub fn cancel(&mut self) {
        if self.is_running() {
            self.state = RevealState::Cancelled;
        }
        self.pending.clear();
    }

    pub fn visible_text(&self) -> &str {
        &self.message[..self.boundaries[self.progress]]
    }

    pub fn progress(&self) -> usize {
        self.progress
    }

    /// Message length in characters
    pub fn len(&self) -> usize {
        self.boundaries.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_running(&self) -> bool {
        matches!(
            self.state,
            RevealState::Typing { .. } | RevealState::Lingering { .. }
        )
    }

    /// Whether every character is visible (the completion event may still be lingering)
    pub fn is_fully_revealed(&self) -> bool {
        self.progress == self.len() && self.state != RevealState::Idle
    }

    pub fn is_complete(&self) -> bool {
        self.state == RevealState::Done
    }
}

impl Default for TextRevealTimer {
    fn default() -> Self {
        Self::new(DEFAULT_REVEAL_INTERVAL, DEFAULT_TYPING_LINGER)
    }
}
