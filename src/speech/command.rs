//! Speech through an external synthesizer program.
//!
//! Supports espeak-ng/espeak, speech-dispatcher's `spd-say` and macOS `say`.
//! The voice list is loaded in the background; `VoicesChanged` is reported
//! once it is available.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::{Arc, Mutex};

use tokio::process::Command;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{SpeechBackend, SpeechEvent, Utterance, Voice};

/// Programs probed on `PATH`, in order of preference.
pub const CANDIDATE_PROGRAMS: [&str; 4] = ["espeak-ng", "espeak", "spd-say", "say"];

/// Cancels every message speech-dispatcher has queued or is speaking
const SPD_CANCEL_ARGS: &[&str] = &["-C"];

/// Words per minute the engines use at rate 1.0
const BASE_WORDS_PER_MINUTE: f32 = 175.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Engine {
    Espeak,
    SpeechDispatcher,
    MacSay,
}

impl Engine {
    /// Guess the engine from a program name or path.
    pub fn from_program(program: &Path) -> Option<Self> {
        let stem = program.file_stem()?.to_str()?.to_lowercase();
        match stem.as_str() {
            "espeak-ng" | "espeak" => Some(Engine::Espeak),
            "spd-say" => Some(Engine::SpeechDispatcher),
            "say" => Some(Engine::MacSay),
            _ => None,
        }
    }

    fn list_voices_args(&self) -> &'static [&'static str] {
        match self {
            Engine::Espeak => &["--voices"],
            Engine::SpeechDispatcher => &["-L"],
            Engine::MacSay => &["-v", "?"],
        }
    }

    pub fn parse_voices(&self, output: &str) -> Vec<Voice> {
        match self {
            Engine::Espeak => parse_espeak_voices(output),
            Engine::SpeechDispatcher => parse_spd_voices(output),
            Engine::MacSay => parse_say_voices(output),
        }
    }

    /// Extra command needed to silence speech after the client is killed.
    ///
    /// `spd-say` only hands text to the speech-dispatcher daemon, which keeps
    /// talking when the client goes away.
    pub fn cancel_args(&self) -> Option<&'static [&'static str]> {
        match self {
            Engine::SpeechDispatcher => Some(SPD_CANCEL_ARGS),
            Engine::Espeak | Engine::MacSay => None,
        }
    }

    pub fn speak_args(&self, utterance: &Utterance) -> Vec<String> {
        let words_per_minute = (BASE_WORDS_PER_MINUTE * utterance.rate).round() as i32;
        let mut args = Vec::new();

        match self {
            Engine::Espeak => {
                args.extend(["-s".to_string(), words_per_minute.to_string()]);
                args.extend(["-p".to_string(), ((50.0 * utterance.pitch).round() as i32).to_string()]);
                args.extend(["-a".to_string(), ((100.0 * utterance.volume).round() as i32).to_string()]);
                if let Some(ref voice) = utterance.voice {
                    args.extend(["-v".to_string(), voice.id.clone()]);
                }
            }
            Engine::SpeechDispatcher => {
                // spd-say rates run from -100 to 100 around a neutral 0
                let rate = ((utterance.rate - 1.0) * 100.0).round().clamp(-100.0, 100.0) as i32;
                args.extend(["-w".to_string(), "-r".to_string(), rate.to_string()]);
                if let Some(ref voice) = utterance.voice {
                    args.extend(["-y".to_string(), voice.id.clone()]);
                }
            }
            Engine::MacSay => {
                args.extend(["-r".to_string(), words_per_minute.to_string()]);
                if let Some(ref voice) = utterance.voice {
                    args.extend(["-v".to_string(), voice.id.clone()]);
                }
            }
        }

        args.push(utterance.text.clone());
        args
    }
}

/// `espeak-ng --voices`:
///
/// ```text
/// Pty Language       Age/Gender VoiceName          File                 Other Languages
///  5  en-us           --/M      English_(America)  gmw/en-US            (en 10)
/// ```
fn parse_espeak_voices(output: &str) -> Vec<Voice> {
    output
        .lines()
        .skip(1)
        .filter_map(|line| {
            let columns: Vec<&str> = line.split_whitespace().collect();
            if columns.len() < 4 {
                return None;
            }
            Some(Voice {
                id: columns[1].to_string(),
                name: columns[3].replace('_', " "),
                lang: columns[1].to_string(),
            })
        })
        .collect()
}

/// `spd-say -L`:
///
/// ```text
///                NAME     LANGUAGE  VARIANT
///    English (America)     en-US     none
/// ```
fn parse_spd_voices(output: &str) -> Vec<Voice> {
    output
        .lines()
        .skip(1)
        .filter_map(|line| {
            let columns: Vec<&str> = line.split_whitespace().collect();
            if columns.len() < 3 {
                return None;
            }
            let name = columns[..columns.len() - 2].join(" ");
            Some(Voice {
                id: name.clone(),
                name,
                lang: columns[columns.len() - 2].to_string(),
            })
        })
        .collect()
}

/// `say -v '?'`:
///
/// ```text
/// Samantha            en_US    # Hello, my name is Samantha.
/// ```
fn parse_say_voices(output: &str) -> Vec<Voice> {
    output
        .lines()
        .filter_map(|line| {
            let description = line.split('#').next()?.trim_end();
            let (name, lang) = description.rsplit_once(char::is_whitespace)?;
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            Some(Voice {
                id: name.to_string(),
                name: name.to_string(),
                lang: lang.to_string(),
            })
        })
        .collect()
}

/// Find `program` as given, or on `PATH` when it is a bare name.
pub fn find_program(program: &str) -> Option<PathBuf> {
    let candidate = Path::new(program);
    if candidate.components().count() > 1 {
        return candidate.is_file().then(|| candidate.to_path_buf());
    }

    let path = std::env::var_os("PATH")?;
    std::env::split_paths(&path)
        .map(|dir| dir.join(program))
        .find(|full| full.is_file())
}

/// Speech backend driving an external synthesizer.
pub struct CommandSpeech {
    program: PathBuf,
    engine: Engine,
    voices: Arc<Mutex<Vec<Voice>>>,
    events: mpsc::UnboundedSender<SpeechEvent>,
    current: Option<JoinHandle<()>>,
}

impl CommandSpeech {
    /// Locate a synthesizer. `preferred` may name a program or a path;
    /// otherwise the usual candidates are probed.
    pub fn detect(
        preferred: Option<&str>,
        events: mpsc::UnboundedSender<SpeechEvent>,
    ) -> Option<Self> {
        let found = match preferred {
            Some(program) => find_program(program),
            None => CANDIDATE_PROGRAMS.iter().find_map(|program| find_program(program)),
        };

        match found {
            Some(program) => Self::new(program, events),
            None => {
                warn!(target: "speech", "No speech synthesizer found; greetings will be text-only");
                None
            }
        }
    }

    /// Must be called from within a tokio runtime; loading the voice list
    /// is spawned immediately.
    pub fn new(program: PathBuf, events: mpsc::UnboundedSender<SpeechEvent>) -> Option<Self> {
        let Some(engine) = Engine::from_program(&program) else {
            warn!(target: "speech", "Unrecognized speech program {}", program.display());
            return None;
        };
        info!(target: "speech", "Using speech synthesizer {}", program.display());

        let backend = Self {
            program,
            engine,
            voices: Arc::new(Mutex::new(Vec::new())),
            events,
            current: None,
        };
        backend.load_voices();
        Some(backend)
    }

    fn load_voices(&self) {
        let mut command = Command::new(&self.program);
        command
            .args(self.engine.list_voices_args())
            .stdin(Stdio::null())
            .stderr(Stdio::null());
        let engine = self.engine;
        let voices = self.voices.clone();
        let events = self.events.clone();

        tokio::spawn(async move {
            let listed = match command.output().await {
                Ok(output) if output.status.success() => {
                    engine.parse_voices(&String::from_utf8_lossy(&output.stdout))
                }
                Ok(output) => {
                    warn!(target: "speech", "Listing voices failed with {}", output.status);
                    Vec::new()
                }
                Err(e) => {
                    warn!(target: "speech", "Failed to list voices: {}", e);
                    Vec::new()
                }
            };

            debug!(target: "speech", "Loaded {} voices", listed.len());
            if let Ok(mut guard) = voices.lock() {
                *guard = listed;
            }
            // Reported even when empty so a waiting utterance falls back to the default voice
            let _ = events.send(SpeechEvent::VoicesChanged);
        });
    }

    /// Kill the running synthesizer. Returns the arguments of the command
    /// still needed to silence the engine, if any.
    fn stop_current(&mut self) -> Option<&'static [&'static str]> {
        let handle = self.current.take()?;
        let was_running = !handle.is_finished();
        // Dropping the child kills the synthesizer
        handle.abort();

        let args = self.engine.cancel_args().filter(|_| was_running)?;
        debug!(target: "speech", "Cancelling queued speech with {} {:?}", self.program.display(), args);
        Some(args)
    }

    fn cancel_command(&self, args: &[&str]) -> Command {
        let mut command = Command::new(&self.program);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        command
    }
}

async fn run_cancel(mut command: Command) {
    if let Err(e) = command.status().await {
        warn!(target: "speech", "Failed to cancel speech: {}", e);
    }
}

impl SpeechBackend for CommandSpeech {
    fn name(&self) -> &str {
        match self.engine {
            Engine::Espeak => "espeak",
            Engine::SpeechDispatcher => "speech-dispatcher",
            Engine::MacSay => "say",
        }
    }

    fn is_available(&self) -> bool {
        true
    }

    fn voices(&self) -> Vec<Voice> {
        self.voices
            .lock()
            .map(|voices| voices.clone())
            .unwrap_or_default()
    }

    fn speak(&mut self, utterance: Utterance) {
        let cancel = self.stop_current().map(|args| self.cancel_command(args));

        let mut command = Command::new(&self.program);
        command
            .args(self.engine.speak_args(&utterance))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);
        let events = self.events.clone();
        let id = utterance.id;

        self.current = Some(tokio::spawn(async move {
            // The daemon must drop the old message before taking the new one
            if let Some(cancel) = cancel {
                run_cancel(cancel).await;
            }

            let mut child = match command.spawn() {
                Ok(child) => child,
                Err(e) => {
                    let _ = events.send(SpeechEvent::Failed {
                        id,
                        reason: e.to_string(),
                    });
                    return;
                }
            };

            let _ = events.send(SpeechEvent::Started(id));
            let event = match child.wait().await {
                Ok(status) if status.success() => SpeechEvent::Ended(id),
                Ok(status) => SpeechEvent::Failed {
                    id,
                    reason: format!("synthesizer exited with {}", status),
                },
                Err(e) => SpeechEvent::Failed {
                    id,
                    reason: e.to_string(),
                },
            };
            let _ = events.send(event);
        }));
    }

    fn cancel(&mut self) {
        if let Some(args) = self.stop_current() {
            tokio::spawn(run_cancel(self.cancel_command(args)));
        }
    }
}

impl Drop for CommandSpeech {
    fn drop(&mut self) {
        let Some(args) = self.stop_current() else {
            return;
        };
        // Blocking: a spawned task may never run once the app is exiting
        let status = std::process::Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();
        if let Err(e) = status {
            warn!(target: "speech", "Failed to cancel speech: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utterance(voice: Option<Voice>) -> Utterance {
        Utterance {
            id: 1,
            text: "Hey Riya!".to_string(),
            voice,
            rate: 0.65,
            pitch: 1.0,
            volume: 1.0,
        }
    }

    #[test]
    fn test_engine_from_program() {
        assert_eq!(
            Engine::from_program(Path::new("/usr/bin/espeak-ng")),
            Some(Engine::Espeak)
        );
        assert_eq!(
            Engine::from_program(Path::new("spd-say")),
            Some(Engine::SpeechDispatcher)
        );
        assert_eq!(Engine::from_program(Path::new("say")), Some(Engine::MacSay));
        assert_eq!(Engine::from_program(Path::new("festival")), None);
    }

    #[test]
    fn test_parse_espeak_voices() {
        let output = "Pty Language       Age/Gender VoiceName          File                 Other Languages\n 5  af              --/M      Afrikaans          gmw/af\n 2  en-us           --/M      English_(America)  gmw/en-US            (en 3)\n";
        let voices = Engine::Espeak.parse_voices(output);
        assert_eq!(voices.len(), 2);
        assert_eq!(voices[1].name, "English (America)");
        assert_eq!(voices[1].lang, "en-us");
        assert_eq!(voices[1].id, "en-us");
    }

    #[test]
    fn test_parse_spd_voices() {
        let output = "               NAME     LANGUAGE  VARIANT\n   English (America)     en-US     none\n";
        let voices = Engine::SpeechDispatcher.parse_voices(output);
        assert_eq!(voices.len(), 1);
        assert_eq!(voices[0].name, "English (America)");
        assert_eq!(voices[0].lang, "en-US");
    }

    #[test]
    fn test_parse_say_voices() {
        let output = "Samantha            en_US    # Hello, my name is Samantha.\nGood News           en_US    # Hello!\n";
        let voices = Engine::MacSay.parse_voices(output);
        assert_eq!(voices.len(), 2);
        assert_eq!(voices[1].name, "Good News");
        assert_eq!(voices[1].lang, "en_US");
    }

    #[test]
    fn test_espeak_args_scale_rate() {
        let voice = Voice {
            id: "en-us".to_string(),
            name: "English (America)".to_string(),
            lang: "en-us".to_string(),
        };
        let args = Engine::Espeak.speak_args(&utterance(Some(voice)));
        assert_eq!(
            args,
            ["-s", "114", "-p", "50", "-a", "100", "-v", "en-us", "Hey Riya!"]
        );
    }

    #[test]
    fn test_default_voice_omits_voice_flag() {
        let args = Engine::MacSay.speak_args(&utterance(None));
        assert_eq!(args, ["-r", "114", "Hey Riya!"]);

        let args = Engine::SpeechDispatcher.speak_args(&utterance(None));
        assert_eq!(args, ["-w", "-r", "-35", "Hey Riya!"]);
    }

    #[test]
    fn test_only_speech_dispatcher_needs_cancel_command() {
        assert_eq!(Engine::SpeechDispatcher.cancel_args(), Some(&["-C"][..]));
        assert_eq!(Engine::Espeak.cancel_args(), None);
        assert_eq!(Engine::MacSay.cancel_args(), None);
    }

    /// Writes a fake `spd-say` that logs its arguments and keeps "speaking"
    /// while waiting (`-w`).
    #[cfg(unix)]
    fn fake_spd_say(dir: &Path) -> (PathBuf, PathBuf) {
        use std::os::unix::fs::PermissionsExt;

        let log = dir.join("calls.log");
        let program = dir.join("spd-say");
        let script = format!(
            "#!/bin/sh\necho \"$*\" >> '{}'\nif [ \"$1\" = \"-w\" ]; then sleep 5; fi\n",
            log.display()
        );
        std::fs::write(&program, script).unwrap();
        std::fs::set_permissions(&program, std::fs::Permissions::from_mode(0o755)).unwrap();
        (program, log)
    }

    #[cfg(unix)]
    async fn wait_for_line(log: &Path, prefix: &str) -> bool {
        for _ in 0..100 {
            let calls = std::fs::read_to_string(log).unwrap_or_default();
            if calls.lines().any(|line| line.starts_with(prefix)) {
                return true;
            }
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        }
        false
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_cancel_silences_speech_dispatcher() {
        let dir = tempfile::tempdir().unwrap();
        let (program, log) = fake_spd_say(dir.path());
        let (tx, mut rx) = mpsc::unbounded_channel();

        let mut speech = CommandSpeech::new(program, tx).unwrap();
        speech.speak(utterance(None));
        assert!(wait_for_line(&log, "-w").await);
        while let Some(event) = rx.recv().await {
            if event == SpeechEvent::Started(1) {
                break;
            }
        }

        speech.cancel();
        assert!(wait_for_line(&log, "-C").await);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_cancel_with_nothing_spoken_runs_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let (program, log) = fake_spd_say(dir.path());
        let (tx, _rx) = mpsc::unbounded_channel();

        let mut speech = CommandSpeech::new(program, tx).unwrap();
        assert!(wait_for_line(&log, "-L").await);
        speech.cancel();
        drop(speech);

        let calls = std::fs::read_to_string(&log).unwrap();
        assert!(!calls.lines().any(|line| line.starts_with("-C")));
    }

    #[test]
    fn test_find_program_missing() {
        assert!(find_program("definitely-not-a-speech-engine-xyz").is_none());
    }
}
