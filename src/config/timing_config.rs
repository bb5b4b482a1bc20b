use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::controller::Timing;

/// Pacing of the greeting, in milliseconds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Delay between revealed characters
    pub reveal_interval_ms: u64,
    /// How long the full greeting stays before the invitation
    pub typing_linger_ms: u64,
    /// Delay before narration starts
    pub speech_startup_ms: u64,
    /// Pause after narration ends
    pub speech_trailing_ms: u64,
    /// Upper bound on waiting for narration after the reveal finished
    pub max_speech_wait_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            reveal_interval_ms: 40,
            typing_linger_ms: 500,
            speech_startup_ms: 600,
            speech_trailing_ms: 800,
            max_speech_wait_ms: 20_000,
        }
    }
}

impl TimingConfig {
    pub fn timing(&self) -> Timing {
        Timing {
            reveal_interval: Duration::from_millis(self.reveal_interval_ms),
            typing_linger: Duration::from_millis(self.typing_linger_ms),
            speech_trailing: Duration::from_millis(self.speech_trailing_ms),
            max_speech_wait: Duration::from_millis(self.max_speech_wait_ms),
        }
    }

    pub fn speech_startup(&self) -> Duration {
        Duration::from_millis(self.speech_startup_ms)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.reveal_interval_ms == 0 {
            return Err("timing.reveal_interval_ms must be greater than zero".to_string());
        }
        if !(500..=2000).contains(&self.typing_linger_ms) {
            return Err(format!(
                "timing.typing_linger_ms must be between 500 and 2000, got {}",
                self.typing_linger_ms
            ));
        }
        if !(500..=600).contains(&self.speech_startup_ms) {
            return Err(format!(
                "timing.speech_startup_ms must be between 500 and 600, got {}",
                self.speech_startup_ms
            ));
        }
        if !(500..=2000).contains(&self.speech_trailing_ms) {
            return Err(format!(
                "timing.speech_trailing_ms must be between 500 and 2000, got {}",
                self.speech_trailing_ms
            ));
        }
        if self.max_speech_wait_ms < self.speech_trailing_ms {
            return Err(format!(
                "timing.max_speech_wait_ms must be at least speech_trailing_ms ({}), got {}",
                self.speech_trailing_ms, self.max_speech_wait_ms
            ));
        }
        Ok(())
    }
}
