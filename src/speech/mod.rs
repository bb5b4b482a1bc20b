//! Spoken narration of the greeting.
//!
//! [`SpeechNarrator`] owns the single speech channel of the session. The
//! actual synthesis happens in a [`SpeechBackend`], which reports progress
//! back as [`SpeechEvent`]s over a channel. Anything that goes wrong with
//! speech degrades to a silent, text-only greeting.

pub mod command;

use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

pub use command::CommandSpeech;

pub const DEFAULT_SPEECH_RATE: f32 = 0.65;
pub const DEFAULT_STARTUP_DELAY: Duration = Duration::from_millis(600);

pub type UtteranceId = u64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Voice {
    /// Identifier passed back to the synthesizer
    pub id: String,
    pub name: String,
    pub lang: String,
}

/// One playback request
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub id: UtteranceId,
    pub text: String,
    /// `None` means the host default voice
    pub voice: Option<Voice>,
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
}

/// Notifications reported by a backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeechEvent {
    /// The voice list has been (re)populated
    VoicesChanged,
    Started(UtteranceId),
    Ended(UtteranceId),
    Failed { id: UtteranceId, reason: String },
}

/// What the narrator tells its owner after filtering backend events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeechSignal {
    Started,
    Ended,
}

/// A host speech capability.
pub trait SpeechBackend: Send {
    /// Short name for logs
    fn name(&self) -> &str;

    fn is_available(&self) -> bool;

    /// Voices known so far. May be empty until `VoicesChanged` is reported.
    fn voices(&self) -> Vec<Voice>;

    /// Start playing. Progress is reported as [`SpeechEvent`]s.
    fn speak(&mut self, utterance: Utterance);

    /// Stop whatever is playing.
    fn cancel(&mut self);
}

/// Backend for hosts without speech.
#[derive(Debug, Default)]
pub struct NullSpeech;

impl SpeechBackend for NullSpeech {
    fn name(&self) -> &str {
        "none"
    }

    fn is_available(&self) -> bool {
        false
    }

    fn voices(&self) -> Vec<Voice> {
        Vec::new()
    }

    fn speak(&mut self, _utterance: Utterance) {}

    fn cancel(&mut self) {}
}

#[derive(Debug, Clone, PartialEq)]
pub struct VoicePreferences {
    /// Substrings marking a higher quality voice, matched case-insensitively
    pub quality_markers: Vec<String>,
    pub preferred_lang: String,
}

impl Default for VoicePreferences {
    fn default() -> Self {
        Self {
            quality_markers: vec!["google".to_string(), "premium".to_string()],
            preferred_lang: "en-US".to_string(),
        }
    }
}

fn normalize_lang(lang: &str) -> String {
    lang.trim().replace('_', "-").to_lowercase()
}

/// Pick a voice: a quality-marked one, then one for the preferred locale,
/// otherwise the host default.
pub fn select_voice(voices: &[Voice], preferences: &VoicePreferences) -> Option<Voice> {
    let markers: Vec<String> = preferences
        .quality_markers
        .iter()
        .map(|marker| marker.to_lowercase())
        .filter(|marker| !marker.is_empty())
        .collect();

    let by_quality = voices.iter().find(|voice| {
        let name = voice.name.to_lowercase();
        markers.iter().any(|marker| name.contains(marker.as_str()))
    });

    let preferred_lang = normalize_lang(&preferences.preferred_lang);
    by_quality
        .or_else(|| {
            voices
                .iter()
                .find(|voice| normalize_lang(&voice.lang) == preferred_lang)
        })
        .cloned()
}

#[derive(Debug, Clone, PartialEq)]
pub struct NarrationSettings {
    pub rate: f32,
    pub startup_delay: Duration,
    pub voice_preferences: VoicePreferences,
}

impl Default for NarrationSettings {
    fn default() -> Self {
        Self {
            rate: DEFAULT_SPEECH_RATE,
            startup_delay: DEFAULT_STARTUP_DELAY,
            voice_preferences: VoicePreferences::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum NarrationState {
    Idle,
    AwaitingVoices { id: UtteranceId, text: String },
    Scheduled { id: UtteranceId, text: String, start_at: Instant },
    Playing { id: UtteranceId, started: bool },
}

/// Speaks a greeting at most once per activation.
pub struct SpeechNarrator {
    backend: Box<dyn SpeechBackend>,
    settings: NarrationSettings,
    /// Single-use guard, cleared by [`SpeechNarrator::reset_guard`]
    spoken: bool,
    state: NarrationState,
    next_id: UtteranceId,
}

impl SpeechNarrator {
    pub fn new(backend: Box<dyn SpeechBackend>, settings: NarrationSettings) -> Self {
        Self {
            backend,
            settings,
            spoken: false,
            state: NarrationState::Idle,
            next_id: 1,
        }
    }

    pub fn silent() -> Self {
        Self::new(Box::new(NullSpeech), NarrationSettings::default())
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    pub fn is_available(&self) -> bool {
        self.backend.is_available()
    }

    /// Allow the next `speak` call to play again.
    pub fn reset_guard(&mut self) {
        self.spoken = false;
    }

    /// Request narration of `message`.
    ///
    /// Returns whether playback was scheduled. Nothing happens when speech is
    /// unavailable, `muted` is set, or this activation already spoke.
    pub fn speak(&mut self, message: &str, muted: bool, now: Instant) -> bool {
        if !self.backend.is_available() {
            debug!(target: "speech", "No speech capability; greeting stays text-only");
            return false;
        }
        if muted {
            debug!(target: "speech", "Muted; skipping narration");
            return false;
        }
        if self.spoken {
            debug!(target: "speech", "Narration already triggered for this greeting");
            return false;
        }

        self.spoken = true;
        self.backend.cancel();

        let id = self.next_id;
        self.next_id += 1;
        let text = message.to_string();

        self.state = if self.backend.voices().is_empty() {
            debug!(target: "speech", "Voice list not ready; deferring utterance {}", id);
            NarrationState::AwaitingVoices { id, text }
        } else {
            NarrationState::Scheduled {
                id,
                text,
                start_at: now + self.settings.startup_delay,
            }
        };
        true
    }

    /// Start a scheduled utterance once its startup delay has passed.
    pub fn tick(&mut self, now: Instant) {
        if let NarrationState::Scheduled { start_at, .. } = self.state {
            if now >= start_at {
                self.play();
            }
        }
    }

    /// Feed a backend notification. Events for utterances other than the
    /// current one are ignored.
    pub fn handle_event(&mut self, event: SpeechEvent) -> Option<SpeechSignal> {
        match event {
            SpeechEvent::VoicesChanged => {
                if matches!(self.state, NarrationState::AwaitingVoices { .. }) {
                    self.play();
                }
                None
            }
            SpeechEvent::Started(id) if self.is_current(id) => {
                if let NarrationState::Playing { started, .. } = &mut self.state {
                    *started = true;
                }
                Some(SpeechSignal::Started)
            }
            SpeechEvent::Ended(id) if self.is_current(id) => {
                self.state = NarrationState::Idle;
                Some(SpeechSignal::Ended)
            }
            SpeechEvent::Failed { id, reason } if self.is_current(id) => {
                warn!(target: "speech", "Speech failed, continuing without it: {}", reason);
                self.state = NarrationState::Idle;
                None
            }
            event => {
                debug!(target: "speech", "Ignoring speech event {:?}", event);
                None
            }
        }
    }

    /// Stop any pending or playing utterance. Issues exactly one backend cancel.
    pub fn cancel(&mut self) {
        self.backend.cancel();
        self.state = NarrationState::Idle;
    }

    /// Whether an utterance has been handed to the backend and not finished
    pub fn is_active(&self) -> bool {
        matches!(self.state, NarrationState::Playing { .. })
    }

    /// Whether audio is actually playing
    pub fn is_speaking(&self) -> bool {
        matches!(self.state, NarrationState::Playing { started: true, .. })
    }

    pub fn is_pending(&self) -> bool {
        matches!(
            self.state,
            NarrationState::AwaitingVoices { .. } | NarrationState::Scheduled { .. }
        )
    }

    fn is_current(&self, id: UtteranceId) -> bool {
        matches!(self.state, NarrationState::Playing { id: current, .. } if current == id)
    }

    fn play(&mut self) {
        let state = std::mem::replace(&mut self.state, NarrationState::Idle);
        let (id, text) = match state {
            NarrationState::AwaitingVoices { id, text } | NarrationState::Scheduled { id, text, .. } => {
                (id, text)
            }
            other => {
                self.state = other;
                return;
            }
        };

        let voice = select_voice(&self.backend.voices(), &self.settings.voice_preferences);
        info!(
            target: "speech",
            "Speaking utterance {} with {} voice via {}",
            id,
            voice.as_ref().map(|v| v.name.as_str()).unwrap_or("default"),
            self.backend.name()
        );

        self.backend.speak(Utterance {
            id,
            text,
            voice,
            rate: self.settings.rate,
            pitch: 1.0,
            volume: 1.0,
        });
        self.state = NarrationState::Playing { id, started: false };
    }
}

impl Drop for SpeechNarrator {
    fn drop(&mut self) {
        self.backend.cancel();
    }
}
