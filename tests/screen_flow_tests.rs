// End-to-end flows through the screen controller

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use soiree::controller::{ControllerOptions, ScreenController, ScreenState, Transition};
use soiree::effects::{ChannelEffects, EffectCommand};
use soiree::speech::{
    NarrationSettings, SpeechBackend, SpeechEvent, SpeechNarrator, Utterance, UtteranceId, Voice,
};
use tokio::sync::mpsc;

/// Reports `Started` as soon as it is asked to speak; the test decides when
/// speech ends.
struct ScriptedSpeech {
    events: mpsc::UnboundedSender<SpeechEvent>,
    spoken: Arc<Mutex<Vec<Utterance>>>,
    cancels: Arc<Mutex<usize>>,
}

impl SpeechBackend for ScriptedSpeech {
    fn name(&self) -> &str {
        "scripted"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn voices(&self) -> Vec<Voice> {
        vec![Voice {
            id: "en-us".to_string(),
            name: "Google US English".to_string(),
            lang: "en-US".to_string(),
        }]
    }

    fn speak(&mut self, utterance: Utterance) {
        let _ = self.events.send(SpeechEvent::Started(utterance.id));
        self.spoken.lock().unwrap().push(utterance);
    }

    fn cancel(&mut self) {
        *self.cancels.lock().unwrap() += 1;
    }
}

struct Flow {
    controller: ScreenController,
    speech_rx: mpsc::UnboundedReceiver<SpeechEvent>,
    effect_rx: mpsc::UnboundedReceiver<EffectCommand>,
    spoken: Arc<Mutex<Vec<Utterance>>>,
    cancels: Arc<Mutex<usize>>,
}

impl Flow {
    fn new(muted: bool) -> Self {
        let (speech_tx, speech_rx) = mpsc::unbounded_channel();
        let spoken = Arc::new(Mutex::new(Vec::new()));
        let cancels = Arc::new(Mutex::new(0));
        let backend = ScriptedSpeech {
            events: speech_tx,
            spoken: spoken.clone(),
            cancels: cancels.clone(),
        };
        let narrator = SpeechNarrator::new(Box::new(backend), NarrationSettings::default());
        let (effects, effect_rx) = ChannelEffects::new();
        let options = ControllerOptions {
            muted,
            ..Default::default()
        };

        Self {
            controller: ScreenController::new(options, narrator, Box::new(effects)),
            speech_rx,
            effect_rx,
            spoken,
            cancels,
        }
    }

    /// Deliver any pending backend events
    fn pump_speech(&mut self, now: Instant) {
        while let Ok(event) = self.speech_rx.try_recv() {
            self.controller.handle_speech_event(event, now);
        }
    }

    fn effects(&mut self) -> Vec<EffectCommand> {
        let mut commands = Vec::new();
        while let Ok(command) = self.effect_rx.try_recv() {
            commands.push(command);
        }
        commands
    }

    fn cancel_count(&self) -> usize {
        *self.cancels.lock().unwrap()
    }

    fn spoken_id(&self) -> UtteranceId {
        self.spoken.lock().unwrap()[0].id
    }

    /// Tick every 16ms until the invitation shows or `limit` passes
    fn run_until_invitation(&mut self, start: Instant, limit: Duration) -> Option<Instant> {
        let mut now = start;
        while now <= start + limit {
            self.pump_speech(now);
            if self.controller.tick(now) == Some(Transition::GreetingToInvitation) {
                return Some(now);
            }
            now += Duration::from_millis(16);
        }
        None
    }
}

#[tokio::test]
async fn test_nickname_flow_reaches_invitation() {
    let mut flow = Flow::new(false);
    let start = Instant::now();

    flow.controller.submit("jay", start).unwrap();
    assert_eq!(flow.controller.state(), ScreenState::Greeting);
    assert!(flow
        .controller
        .greeting_message()
        .unwrap()
        .as_str()
        .starts_with("Hey Jay & Yash!"));

    // Speech starts after its startup delay and ends much later
    flow.controller.tick(start + Duration::from_millis(600));
    flow.pump_speech(start + Duration::from_millis(600));
    assert!(flow.controller.is_speaking());
    assert!(flow.spoken.lock().unwrap()[0].text.contains("Jay & Yash"));

    // Reveal finishes while still speaking; nothing happens yet
    assert_eq!(flow.controller.tick(start + Duration::from_secs(10)), None);
    assert_eq!(flow.controller.state(), ScreenState::Greeting);

    let ended = start + Duration::from_secs(12);
    let id = flow.spoken_id();
    flow.controller
        .handle_speech_event(SpeechEvent::Ended(id), ended);
    assert_eq!(
        flow.controller.tick(ended + Duration::from_millis(800)),
        Some(Transition::GreetingToInvitation)
    );

    assert_eq!(flow.controller.guest().unwrap().joined(), "Jay & Yash");
    assert_eq!(
        flow.effects(),
        [EffectCommand::AmbientParticles, EffectCommand::InvitationBurst]
    );
}

#[tokio::test]
async fn test_padded_name_is_capitalized() {
    let mut flow = Flow::new(true);
    let start = Instant::now();

    flow.controller.submit("  RIYA  ", start).unwrap();
    assert!(flow
        .run_until_invitation(start, Duration::from_secs(30))
        .is_some());
    assert_eq!(flow.controller.guest().unwrap().names(), ["Riya"]);
}

#[tokio::test]
async fn test_muted_flow_falls_back_to_typing() {
    let mut flow = Flow::new(true);
    let start = Instant::now();

    flow.controller.submit("riya", start).unwrap();
    let message_len = flow.controller.greeting_message().unwrap().char_len() as u32;
    let shown = flow
        .run_until_invitation(start, Duration::from_secs(30))
        .unwrap();

    assert!(flow.spoken.lock().unwrap().is_empty());
    assert!(flow.speech_rx.try_recv().is_err());

    // One frame after reveal + linger at the latest
    let expected = start + Duration::from_millis(40) * message_len + Duration::from_millis(500);
    assert!(shown >= expected);
    assert!(shown <= expected + Duration::from_millis(16));
}

#[tokio::test]
async fn test_signals_close_together_transition_once() {
    let mut flow = Flow::new(false);
    let start = Instant::now();

    flow.controller.submit("riya", start).unwrap();
    flow.controller.tick(start + Duration::from_millis(600));
    flow.pump_speech(start + Duration::from_millis(600));

    let message_len = flow.controller.greeting_message().unwrap().char_len() as u32;
    let typing_done = start + Duration::from_millis(40) * message_len + Duration::from_millis(500);
    let id = flow.spoken_id();

    // Speech ends 10ms before typing completes
    flow.controller
        .handle_speech_event(SpeechEvent::Ended(id), typing_done - Duration::from_millis(10));

    let mut transitions = 0;
    let mut now = typing_done - Duration::from_millis(10);
    while now <= typing_done + Duration::from_secs(2) {
        if flow.controller.tick(now).is_some() {
            transitions += 1;
        }
        // A late duplicate end must not re-trigger anything
        flow.controller.handle_speech_event(SpeechEvent::Ended(id), now);
        now += Duration::from_millis(5);
    }

    assert_eq!(transitions, 1);
    let bursts = flow
        .effects()
        .into_iter()
        .filter(|command| *command == EffectCommand::InvitationBurst)
        .count();
    assert_eq!(bursts, 1);
}

#[tokio::test]
async fn test_speech_still_playing_is_cut_off_at_invitation() {
    let mut flow = Flow::new(false);
    let start = Instant::now();

    flow.controller.submit("riya", start).unwrap();
    flow.controller.tick(start + Duration::from_millis(600));
    flow.pump_speech(start + Duration::from_millis(600));
    assert!(flow.controller.is_speaking());
    let cancels = flow.cancel_count();

    // The synthesizer never reports an end
    let shown = flow
        .run_until_invitation(start + Duration::from_millis(616), Duration::from_secs(30))
        .unwrap();
    assert!(shown >= start + Duration::from_secs(20));
    assert_eq!(flow.cancel_count(), cancels + 1);
    assert!(!flow.controller.is_speaking());
}

#[tokio::test]
async fn test_back_clears_guest_and_allows_new_greeting() {
    let mut flow = Flow::new(true);
    let start = Instant::now();

    flow.controller.submit("jay", start).unwrap();
    let shown = flow
        .run_until_invitation(start, Duration::from_secs(30))
        .unwrap();

    flow.controller.celebrate().unwrap();
    assert_eq!(flow.controller.back(), Ok(Transition::InvitationToEntry));
    assert_eq!(flow.controller.state(), ScreenState::Entry);
    assert!(flow.controller.guest().is_none());
    assert!(flow.controller.greeting_message().is_none());

    let commands = flow.effects();
    assert!(commands.contains(&EffectCommand::CelebrationBurst));
    assert_eq!(commands.last(), Some(&EffectCommand::ClearCelebration));

    flow.controller.submit("riya", shown).unwrap();
    assert!(flow
        .controller
        .greeting_message()
        .unwrap()
        .as_str()
        .starts_with("Hey Riya!"));
}
