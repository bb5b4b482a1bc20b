//! The screen state machine.
//!
//! `Entry` -> `Greeting` on a submitted name, `Greeting` -> `Invitation` once
//! the greeting has finished, `Invitation` -> `Entry` on back. The greeting
//! finishes when the typed reveal completes, unless narration is playing, in
//! which case the end of speech decides. Either way the transition happens
//! exactly once per greeting.

use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::effects::Effects;
use crate::greeting::{GreetingMessage, DEFAULT_GREETING_TEMPLATE};
use crate::guest::{GuestIdentity, NameLookup};
use crate::reveal::{RevealEvent, TextRevealTimer, DEFAULT_REVEAL_INTERVAL, DEFAULT_TYPING_LINGER};
use crate::speech::{SpeechEvent, SpeechNarrator, SpeechSignal};

pub const DEFAULT_SPEECH_TRAILING: Duration = Duration::from_millis(800);
pub const DEFAULT_MAX_SPEECH_WAIT: Duration = Duration::from_secs(20);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenState {
    Entry,
    Greeting,
    Invitation,
}

impl std::fmt::Display for ScreenState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScreenState::Entry => write!(f, "entry"),
            ScreenState::Greeting => write!(f, "greeting"),
            ScreenState::Invitation => write!(f, "invitation"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    EntryToGreeting,
    GreetingToInvitation,
    InvitationToEntry,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("a name is required")]
    BlankName,
    #[error("{action} is not available on the {screen} screen")]
    NotAllowed {
        action: &'static str,
        screen: ScreenState,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    pub reveal_interval: Duration,
    pub typing_linger: Duration,
    /// Pause after speech ends before showing the invitation
    pub speech_trailing: Duration,
    /// Longest the finished reveal waits on speech that is still playing
    pub max_speech_wait: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            reveal_interval: DEFAULT_REVEAL_INTERVAL,
            typing_linger: DEFAULT_TYPING_LINGER,
            speech_trailing: DEFAULT_SPEECH_TRAILING,
            max_speech_wait: DEFAULT_MAX_SPEECH_WAIT,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ControllerOptions {
    pub lookup: NameLookup,
    pub greeting_template: String,
    pub timing: Timing,
    pub muted: bool,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            lookup: NameLookup::default(),
            greeting_template: DEFAULT_GREETING_TEMPLATE.to_string(),
            timing: Timing::default(),
            muted: false,
        }
    }
}

/// State for one activation of the greeting screen
#[derive(Debug)]
struct GreetingSession {
    guest: GuestIdentity,
    message: GreetingMessage,
    reveal: TextRevealTimer,
    typing_done_at: Option<Instant>,
    /// Set when speech ended; the invitation is shown at this time
    advance_at: Option<Instant>,
    /// Latch: the transition to the invitation has been taken
    advanced: bool,
}

impl GreetingSession {
    fn is_due(&self, now: Instant, speech_active: bool, max_speech_wait: Duration) -> bool {
        if let Some(at) = self.advance_at {
            return now >= at;
        }
        match self.typing_done_at {
            Some(done) => !speech_active || now >= done + max_speech_wait,
            None => false,
        }
    }
}

#[derive(Debug)]
enum Screen {
    Entry,
    Greeting(GreetingSession),
    Invitation { guest: GuestIdentity },
}

pub struct ScreenController {
    screen: Screen,
    lookup: NameLookup,
    greeting_template: String,
    timing: Timing,
    muted: bool,
    narrator: SpeechNarrator,
    effects: Box<dyn Effects>,
}

impl ScreenController {
    pub fn new(
        options: ControllerOptions,
        narrator: SpeechNarrator,
        effects: Box<dyn Effects>,
    ) -> Self {
        effects.trigger_ambient_particles();

        Self {
            screen: Screen::Entry,
            lookup: options.lookup,
            greeting_template: options.greeting_template,
            timing: options.timing,
            muted: options.muted,
            narrator,
            effects,
        }
    }

    pub fn state(&self) -> ScreenState {
        match self.screen {
            Screen::Entry => ScreenState::Entry,
            Screen::Greeting(_) => ScreenState::Greeting,
            Screen::Invitation { .. } => ScreenState::Invitation,
        }
    }

    /// The guest being greeted or invited, if any
    pub fn guest(&self) -> Option<&GuestIdentity> {
        match &self.screen {
            Screen::Entry => None,
            Screen::Greeting(session) => Some(&session.guest),
            Screen::Invitation { guest } => Some(guest),
        }
    }

    pub fn greeting_message(&self) -> Option<&GreetingMessage> {
        match &self.screen {
            Screen::Greeting(session) => Some(&session.message),
            _ => None,
        }
    }

    /// The part of the greeting revealed so far
    pub fn revealed_text(&self) -> Option<&str> {
        match &self.screen {
            Screen::Greeting(session) => Some(session.reveal.visible_text()),
            _ => None,
        }
    }

    pub fn reveal_progress(&self) -> Option<usize> {
        match &self.screen {
            Screen::Greeting(session) => Some(session.reveal.progress()),
            _ => None,
        }
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn is_speaking(&self) -> bool {
        self.narrator.is_speaking()
    }

    pub fn speech_available(&self) -> bool {
        self.narrator.is_available()
    }

    pub fn speech_backend(&self) -> &str {
        self.narrator.backend_name()
    }

    /// Entry -> Greeting
    pub fn submit(&mut self, raw: &str, now: Instant) -> Result<Transition, TransitionError> {
        self.ensure_state(ScreenState::Entry, "submit")?;
        if raw.trim().is_empty() {
            return Err(TransitionError::BlankName);
        }

        let guest = self.lookup.resolve(raw);
        let message = GreetingMessage::new(&self.greeting_template, &guest);

        let mut reveal = TextRevealTimer::new(self.timing.reveal_interval, self.timing.typing_linger);
        reveal.start(message.as_str(), now);

        self.narrator.reset_guard();
        self.narrator.speak(message.as_str(), self.muted, now);

        info!(target: "screen", "Greeting {}", guest);
        self.screen = Screen::Greeting(GreetingSession {
            guest,
            message,
            reveal,
            typing_done_at: None,
            advance_at: None,
            advanced: false,
        });
        Ok(Transition::EntryToGreeting)
    }

    /// Invitation -> Entry, forgetting the guest
    pub fn back(&mut self) -> Result<Transition, TransitionError> {
        self.ensure_state(ScreenState::Invitation, "back")?;

        self.effects.clear_celebration();
        self.screen = Screen::Entry;
        info!(target: "screen", "Back to entry");
        Ok(Transition::InvitationToEntry)
    }

    /// Manual confetti on the invitation
    pub fn celebrate(&mut self) -> Result<(), TransitionError> {
        self.ensure_state(ScreenState::Invitation, "celebrate")?;
        self.effects.trigger_celebration_burst();
        Ok(())
    }

    /// Flip the mute flag and return the new value.
    ///
    /// Muting during the greeting stops narration. Unmuting narrates only if
    /// this greeting has not been narrated yet, so a greeting that began
    /// muted is spoken on unmute but one that was cut off is not replayed.
    pub fn toggle_mute(&mut self, now: Instant) -> bool {
        self.muted = !self.muted;
        debug!(target: "screen", "Muted: {}", self.muted);

        if let Screen::Greeting(session) = &self.screen {
            if self.muted {
                self.narrator.cancel();
            } else {
                self.narrator.speak(session.message.as_str(), false, now);
            }
        }
        self.muted
    }

    /// Feed a notification from the speech backend.
    pub fn handle_speech_event(&mut self, event: SpeechEvent, now: Instant) {
        let signal = self.narrator.handle_event(event);

        let Screen::Greeting(session) = &mut self.screen else {
            return;
        };
        match signal {
            Some(SpeechSignal::Started) => {
                debug!(target: "screen", "Narration started");
            }
            Some(SpeechSignal::Ended) => {
                if session.advance_at.is_none() {
                    debug!(target: "screen", "Narration ended");
                    session.advance_at = Some(now + self.timing.speech_trailing);
                }
            }
            None => {}
        }
    }

    /// Advance timers. Returns the transition taken, if any.
    pub fn tick(&mut self, now: Instant) -> Option<Transition> {
        self.narrator.tick(now);

        let speech_active = self.narrator.is_active();
        let max_speech_wait = self.timing.max_speech_wait;
        let Screen::Greeting(session) = &mut self.screen else {
            return None;
        };

        for event in session.reveal.tick(now) {
            if event == RevealEvent::Complete {
                session.typing_done_at = Some(now);
                if speech_active {
                    debug!(target: "screen", "Reveal complete, waiting for narration to end");
                }
            }
        }

        if session.is_due(now, speech_active, max_speech_wait) {
            self.complete_greeting()
        } else {
            None
        }
    }

    /// Greeting -> Invitation. Runs at most once per greeting.
    fn complete_greeting(&mut self) -> Option<Transition> {
        let Screen::Greeting(session) = &mut self.screen else {
            return None;
        };
        if session.advanced {
            return None;
        }
        session.advanced = true;
        session.reveal.cancel();
        let guest = session.guest.clone();

        self.narrator.cancel();
        self.effects.trigger_invitation_burst();
        info!(target: "screen", "Inviting {}", guest);
        self.screen = Screen::Invitation { guest };
        Some(Transition::GreetingToInvitation)
    }

    fn ensure_state(&self, expected: ScreenState, action: &'static str) -> Result<(), TransitionError> {
        let screen = self.state();
        if screen == expected {
            Ok(())
        } else {
            debug!(target: "screen", "Ignoring {} on the {} screen", action, screen);
            Err(TransitionError::NotAllowed { action, screen })
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::effects::Effects;
    use crate::speech::testing::{voice, RecordingSpeech, SpeechLog};
    use crate::speech::{NarrationSettings, DEFAULT_STARTUP_DELAY};

    #[derive(Default)]
    struct EffectLog {
        ambient: usize,
        invitation: usize,
        celebration: usize,
        cleared: usize,
    }

    struct RecordingEffects(Arc<Mutex<EffectLog>>);

    impl Effects for RecordingEffects {
        fn trigger_ambient_particles(&self) {
            self.0.lock().unwrap().ambient += 1;
        }
        fn trigger_invitation_burst(&self) {
            self.0.lock().unwrap().invitation += 1;
        }
        fn trigger_celebration_burst(&self) {
            self.0.lock().unwrap().celebration += 1;
        }
        fn clear_celebration(&self) {
            self.0.lock().unwrap().cleared += 1;
        }
    }

    struct Harness {
        controller: ScreenController,
        speech: Arc<Mutex<SpeechLog>>,
        effects: Arc<Mutex<EffectLog>>,
    }

    fn harness(template: &str) -> Harness {
        let (backend, speech) = RecordingSpeech::with_voices(vec![voice("en", "en-US")]);
        let narrator = SpeechNarrator::new(Box::new(backend), NarrationSettings::default());
        let effects = Arc::new(Mutex::new(EffectLog::default()));
        let options = ControllerOptions {
            greeting_template: template.to_string(),
            ..Default::default()
        };
        Harness {
            controller: ScreenController::new(
                options,
                narrator,
                Box::new(RecordingEffects(effects.clone())),
            ),
            speech,
            effects,
        }
    }

    /// Reveal of a 3-character message is complete at 3 * 40ms + 500ms
    const SHORT_REVEAL: Duration = Duration::from_millis(620);

    #[test]
    fn test_starts_on_entry_with_ambient_particles() {
        let h = harness("Hi");
        assert_eq!(h.controller.state(), ScreenState::Entry);
        assert!(h.controller.guest().is_none());
        assert_eq!(h.effects.lock().unwrap().ambient, 1);
    }

    #[test]
    fn test_blank_submit_is_rejected() {
        let mut h = harness("Hi");
        assert_eq!(
            h.controller.submit("   ", Instant::now()),
            Err(TransitionError::BlankName)
        );
        assert_eq!(h.controller.state(), ScreenState::Entry);
    }

    #[test]
    fn test_resubmit_outside_entry_is_ignored() {
        let mut h = harness("Hi");
        let now = Instant::now();
        h.controller.submit("riya", now).unwrap();

        let err = h.controller.submit("jay", now).unwrap_err();
        assert_eq!(
            err,
            TransitionError::NotAllowed {
                action: "submit",
                screen: ScreenState::Greeting
            }
        );
        assert_eq!(h.controller.guest().unwrap().names(), ["Riya"]);
    }

    #[test]
    fn test_typing_completion_advances_without_speech() {
        let mut h = harness("Hey");
        let start = Instant::now();
        h.controller.toggle_mute(start);
        h.controller.submit("riya", start).unwrap();

        assert_eq!(h.controller.tick(start + SHORT_REVEAL - Duration::from_millis(1)), None);
        assert_eq!(
            h.controller.tick(start + SHORT_REVEAL),
            Some(Transition::GreetingToInvitation)
        );
        assert!(h.speech.lock().unwrap().spoken.is_empty());
        assert_eq!(h.effects.lock().unwrap().invitation, 1);
    }

    #[test]
    fn test_speech_end_is_authoritative_while_playing() {
        let mut h = harness("Hey");
        let start = Instant::now();
        h.controller.submit("riya", start).unwrap();

        let playing = start + DEFAULT_STARTUP_DELAY;
        h.controller.tick(playing);
        let id = h.speech.lock().unwrap().spoken[0].id;
        h.controller.handle_speech_event(SpeechEvent::Started(id), playing);
        assert!(h.controller.is_speaking());

        // The reveal finished long ago but speech is still playing
        assert_eq!(h.controller.tick(start + Duration::from_secs(3)), None);

        let ended = start + Duration::from_secs(4);
        h.controller.handle_speech_event(SpeechEvent::Ended(id), ended);
        assert_eq!(h.controller.tick(ended + DEFAULT_SPEECH_TRAILING / 2), None);
        assert_eq!(
            h.controller.tick(ended + DEFAULT_SPEECH_TRAILING),
            Some(Transition::GreetingToInvitation)
        );
    }

    #[test]
    fn test_both_signals_transition_once() {
        let mut h = harness("Hey");
        let start = Instant::now();
        h.controller.submit("riya", start).unwrap();
        let playing = start + DEFAULT_STARTUP_DELAY;
        h.controller.tick(playing);
        let id = h.speech.lock().unwrap().spoken[0].id;
        h.controller.handle_speech_event(SpeechEvent::Started(id), playing);

        let typing_done = start + Duration::from_secs(1);
        let mut transitions = Vec::new();
        transitions.extend(h.controller.tick(typing_done));
        let speech_done = typing_done + Duration::from_millis(10);
        h.controller.handle_speech_event(SpeechEvent::Ended(id), speech_done);
        for ms in (0..2000).step_by(16) {
            transitions.extend(h.controller.tick(speech_done + Duration::from_millis(ms)));
        }

        assert_eq!(transitions, vec![Transition::GreetingToInvitation]);
        assert_eq!(h.effects.lock().unwrap().invitation, 1);
    }

    #[test]
    fn test_hung_speech_is_bounded() {
        let mut h = harness("Hey");
        let start = Instant::now();
        h.controller.submit("riya", start).unwrap();
        h.controller.tick(start + DEFAULT_STARTUP_DELAY);

        let typing_done = start + Duration::from_secs(1);
        assert_eq!(h.controller.tick(typing_done), None);
        assert_eq!(
            h.controller.tick(typing_done + DEFAULT_MAX_SPEECH_WAIT),
            Some(Transition::GreetingToInvitation)
        );
    }

    #[test]
    fn test_mute_during_greeting_cancels_and_does_not_replay() {
        let mut h = harness("Hey");
        let start = Instant::now();
        h.controller.submit("riya", start).unwrap();
        h.controller.tick(start + DEFAULT_STARTUP_DELAY);
        let cancels = h.speech.lock().unwrap().cancels;

        assert!(h.controller.toggle_mute(start + DEFAULT_STARTUP_DELAY));
        assert_eq!(h.speech.lock().unwrap().cancels, cancels + 1);
        assert!(!h.controller.toggle_mute(start + DEFAULT_STARTUP_DELAY));
        h.controller.tick(start + DEFAULT_STARTUP_DELAY * 3);
        assert_eq!(h.speech.lock().unwrap().spoken.len(), 1);
    }

    #[test]
    fn test_unmute_narrates_greeting_that_began_muted() {
        let mut h = harness("Hey");
        let start = Instant::now();
        h.controller.toggle_mute(start);
        h.controller.submit("riya", start).unwrap();
        h.controller.tick(start + Duration::from_millis(50));
        assert!(h.speech.lock().unwrap().spoken.is_empty());

        let unmuted = start + Duration::from_millis(100);
        assert!(!h.controller.toggle_mute(unmuted));
        h.controller.tick(unmuted + DEFAULT_STARTUP_DELAY);
        assert_eq!(h.speech.lock().unwrap().spoken.len(), 1);
    }

    #[test]
    fn test_leaving_greeting_cancels_playing_speech() {
        let mut h = harness("Hey");
        let start = Instant::now();
        h.controller.submit("riya", start).unwrap();
        let playing = start + DEFAULT_STARTUP_DELAY;
        h.controller.tick(playing);
        let id = h.speech.lock().unwrap().spoken[0].id;
        h.controller.handle_speech_event(SpeechEvent::Started(id), playing);

        let typing_done = start + Duration::from_secs(1);
        assert_eq!(h.controller.tick(typing_done), None);
        assert!(h.controller.is_speaking());
        let cancels = h.speech.lock().unwrap().cancels;

        assert_eq!(
            h.controller.tick(typing_done + DEFAULT_MAX_SPEECH_WAIT),
            Some(Transition::GreetingToInvitation)
        );
        assert_eq!(h.speech.lock().unwrap().cancels, cancels + 1);
        assert!(!h.controller.is_speaking());

        // Later ticks on the invitation leave the backend alone
        h.controller.tick(typing_done + DEFAULT_MAX_SPEECH_WAIT * 2);
        assert_eq!(h.speech.lock().unwrap().cancels, cancels + 1);
    }

    #[test]
    fn test_back_clears_guest_and_allows_new_greeting() {
        let mut h = harness("Hey {names}");
        let start = Instant::now();
        h.controller.toggle_mute(start);
        h.controller.submit("jay", start).unwrap();
        let done = start + Duration::from_secs(5);
        assert_eq!(h.controller.tick(done), Some(Transition::GreetingToInvitation));

        assert!(h.controller.back().is_ok());
        assert_eq!(h.controller.state(), ScreenState::Entry);
        assert!(h.controller.guest().is_none());
        assert_eq!(h.effects.lock().unwrap().cleared, 1);

        h.controller.submit("riya", done).unwrap();
        assert_eq!(h.controller.reveal_progress(), Some(0));
        assert_eq!(h.controller.greeting_message().unwrap().as_str(), "Hey Riya");
    }

    #[test]
    fn test_celebrate_only_on_invitation() {
        let mut h = harness("Hey");
        assert!(h.controller.celebrate().is_err());
        assert!(h.controller.back().is_err());

        let start = Instant::now();
        h.controller.toggle_mute(start);
        h.controller.submit("riya", start).unwrap();
        h.controller.tick(start + Duration::from_secs(5));
        h.controller.celebrate().unwrap();
        h.controller.celebrate().unwrap();
        assert_eq!(h.effects.lock().unwrap().celebration, 2);
    }
}
