use std::collections::BTreeMap;

use tracing::debug;

/// Name used when the entered text resolves to nothing.
pub const DEFAULT_GUEST_NAME: &str = "Guest";

/// The resolved display name(s) for the current visitor.
///
/// Always holds at least one name, each capitalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuestIdentity {
    names: Vec<String>,
}

impl GuestIdentity {
    /// Build an identity from display names. Blank names are dropped; if
    /// nothing is left the default guest name is used.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let names: Vec<String> = names
            .into_iter()
            .map(|name| capitalize(name.as_ref().trim()))
            .filter(|name| !name.is_empty())
            .collect();

        if names.is_empty() {
            Self::default()
        } else {
            Self { names }
        }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Names joined for display, e.g. "Jay & Yash"
    pub fn joined(&self) -> String {
        self.names.join(" & ")
    }
}

impl Default for GuestIdentity {
    fn default() -> Self {
        Self {
            names: vec![DEFAULT_GUEST_NAME.to_string()],
        }
    }
}

impl std::fmt::Display for GuestIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.joined())
    }
}

/// Upper-case the first character and lower-case the rest.
pub fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => {
            let mut capitalized: String = first.to_uppercase().collect();
            capitalized.push_str(&chars.as_str().to_lowercase());
            capitalized
        }
        None => String::new(),
    }
}

/// Maps entered names onto invite groups.
///
/// Nicknames are matched case-insensitively after trimming. Anything that is
/// not a known nickname resolves to a single capitalized name.
#[derive(Debug, Clone)]
pub struct NameLookup {
    groups: BTreeMap<String, Vec<String>>,
    default_name: String,
}

impl NameLookup {
    pub fn new(groups: BTreeMap<String, Vec<String>>) -> Self {
        let groups = groups
            .into_iter()
            .map(|(nickname, names)| (nickname.trim().to_lowercase(), names))
            .collect();
        Self {
            groups,
            default_name: DEFAULT_GUEST_NAME.to_string(),
        }
    }

    /// Use `name` instead of "Guest" for input that resolves to nothing.
    pub fn with_default_name(mut self, name: &str) -> Self {
        if !name.trim().is_empty() {
            self.default_name = name.trim().to_string();
        }
        self
    }

    pub fn resolve(&self, raw: &str) -> GuestIdentity {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            debug!(target: "guest", "Resolving blank input to the default guest");
            return GuestIdentity::new([self.default_name.as_str()]);
        }

        match self.groups.get(&trimmed.to_lowercase()) {
            Some(group) => GuestIdentity::new(group),
            None => GuestIdentity::new([trimmed]),
        }
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }
}

impl Default for NameLookup {
    fn default() -> Self {
        Self::new(default_groups())
    }
}

/// The built-in nickname groups.
pub fn default_groups() -> BTreeMap<String, Vec<String>> {
    BTreeMap::from([
        ("jay".to_string(), vec!["Jay".to_string(), "Yash".to_string()]),
        (
            "khushi".to_string(),
            vec!["Khushi".to_string(), "Nikki".to_string()],
        ),
    ])
}
