use crate::guest::GuestIdentity;

/// Placeholder replaced by the joined guest names.
pub const NAMES_PLACEHOLDER: &str = "{names}";

pub const DEFAULT_GREETING_TEMPLATE: &str = "Hey {names}!\nIt’s my birthday, and I’m really happy you’re here. I’d love for you to join me in celebrating this special day with lots of fun!";

/// The text revealed and spoken on the greeting screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GreetingMessage {
    text: String,
}

impl GreetingMessage {
    pub fn new(template: &str, guest: &GuestIdentity) -> Self {
        Self {
            text: template.replace(NAMES_PLACEHOLDER, &guest.joined()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Length in characters, which is what the reveal cursor counts.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

impl std::fmt::Display for GreetingMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}
