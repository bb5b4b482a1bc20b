use serde::{Deserialize, Serialize};

use crate::speech::{NarrationSettings, VoicePreferences, DEFAULT_SPEECH_RATE};

use super::TimingConfig;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// Whether to look for a speech synthesizer at all
    pub enabled: bool,

    /// Speaking rate multiplier, kept slow for clarity
    pub rate: f32,

    /// Voice names containing any of these are preferred
    pub quality_markers: Vec<String>,

    /// Locale used when no quality voice exists
    pub preferred_lang: String,

    /// Synthesizer program name or path (default: probe espeak-ng, espeak, spd-say, say)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        let preferences = VoicePreferences::default();
        Self {
            enabled: true,
            rate: DEFAULT_SPEECH_RATE,
            quality_markers: preferences.quality_markers,
            preferred_lang: preferences.preferred_lang,
            command: None,
        }
    }
}

impl SpeechConfig {
    pub fn narration_settings(&self, timing: &TimingConfig) -> NarrationSettings {
        NarrationSettings {
            rate: self.rate,
            startup_delay: timing.speech_startup(),
            voice_preferences: VoicePreferences {
                quality_markers: self.quality_markers.clone(),
                preferred_lang: self.preferred_lang.clone(),
            },
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if !(0.65..=0.75).contains(&self.rate) {
            return Err(format!(
                "speech.rate must be between 0.65 and 0.75, got {}",
                self.rate
            ));
        }
        Ok(())
    }
}
