pub mod event_config;
pub mod guests_config;
pub mod paths;
pub mod soiree_config;
pub mod speech_config;
pub mod timing_config;

pub use event_config::EventConfig;
pub use guests_config::GuestsConfig;
pub use paths::ProjectPaths;
pub use soiree_config::{ConfigLoadError, SoireeConfig};
pub use speech_config::SpeechConfig;
pub use timing_config::TimingConfig;
