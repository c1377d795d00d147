use std::fs;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::conditions::Defeat;

/// Tunable constants of the ruleset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Rules {
    /// Hits the attacker gives up to move a hit to another location.
    pub relocate_cost: i32,
    /// Weapon damage used when the attacker carries no equipped weapon.
    pub unarmed_damage: i32,
    /// Permanent Willpower loss for succumbing to stress or corruption.
    pub condition_willpower_penalty: i32,
    pub encumbrance_base_capacity: i32,
    pub specialization_bonus_hits: i32,
    pub physical_defeat: Defeat,
    pub mental_defeat: Defeat,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            relocate_cost: 2,
            unarmed_damage: 1,
            condition_willpower_penalty: 5,
            encumbrance_base_capacity: 5,
            specialization_bonus_hits: 1,
            physical_defeat: Defeat::Dead,
            mental_defeat: Defeat::Unconscious,
        }
    }
}

impl Rules {
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).context("failed to parse rules YAML")
    }

    pub fn load(path: &str) -> Result<Self> {
        let data =
            fs::read_to_string(path).with_context(|| format!("failed to read rules: {}", path))?;
        Self::from_yaml_str(&data).with_context(|| format!("in {}", path))
    }
}
