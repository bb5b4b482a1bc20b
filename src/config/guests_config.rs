use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::guest::{default_groups, NameLookup, DEFAULT_GUEST_NAME};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuestsConfig {
    /// Name shown when nothing usable was entered
    pub default_name: String,

    /// Nickname -> everyone invited under it
    pub groups: BTreeMap<String, Vec<String>>,
}

impl Default for GuestsConfig {
    fn default() -> Self {
        Self {
            default_name: DEFAULT_GUEST_NAME.to_string(),
            groups: default_groups(),
        }
    }
}

impl GuestsConfig {
    pub fn lookup(&self) -> NameLookup {
        NameLookup::new(self.groups.clone()).with_default_name(&self.default_name)
    }

    /// Groups must have a nickname and at least two non-blank names.
    pub fn validate(&self) -> Result<(), String> {
        for (nickname, names) in &self.groups {
            if nickname.trim().is_empty() {
                return Err("guest group with a blank nickname".to_string());
            }
            let named = names.iter().filter(|name| !name.trim().is_empty()).count();
            if named < 2 {
                return Err(format!(
                    "guest group '{}' needs at least two names, found {}",
                    nickname, named
                ));
            }
        }
        Ok(())
    }
}
