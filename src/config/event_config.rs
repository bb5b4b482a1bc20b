use serde::{Deserialize, Serialize};

use crate::greeting::DEFAULT_GREETING_TEMPLATE;

/// The event shown on the invitation card, rendered verbatim
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventConfig {
    /// Heading on the entry screen
    pub title: String,
    /// Whose birthday it is
    pub host: String,
    pub tagline: String,
    pub date: String,
    pub time: String,
    pub venue: String,
    pub footer: String,
    /// Greeting spoken and typed out; `{names}` is replaced by the guests
    pub greeting: String,
}

impl Default for EventConfig {
    fn default() -> Self {
        Self {
            title: "Anoop's Birthday".to_string(),
            host: "Anoop Sharma".to_string(),
            tagline: "turns fabulous!".to_string(),
            date: "10th February".to_string(),
            time: "9:00 PM".to_string(),
            venue: "Bellandur Social".to_string(),
            footer: "Let's make this celebration unforgettable!".to_string(),
            greeting: DEFAULT_GREETING_TEMPLATE.to_string(),
        }
    }
}
