use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::Rules;
use crate::host::ActorPatch;

/// Standing afflictions that can be quarrelled against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionKind {
    Aflame,
    Bleed,
    Poison,
    Stress,
    Corruption,
}

impl ConditionKind {
    pub const PHYSICAL: [ConditionKind; 3] =
        [ConditionKind::Aflame, ConditionKind::Bleed, ConditionKind::Poison];

    pub fn is_physical(self) -> bool {
        Self::PHYSICAL.contains(&self)
    }

    /// Conditions cleared together when the creature overcomes this one.
    pub fn family(self) -> &'static [ConditionKind] {
        match self {
            ConditionKind::Aflame | ConditionKind::Bleed | ConditionKind::Poison => &Self::PHYSICAL,
            ConditionKind::Stress => &[ConditionKind::Stress],
            ConditionKind::Corruption => &[ConditionKind::Corruption],
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            ConditionKind::Aflame => "aflame",
            ConditionKind::Bleed => "bleed",
            ConditionKind::Poison => "poison",
            ConditionKind::Stress => "stress",
            ConditionKind::Corruption => "corruption",
        }
    }
}

impl fmt::Display for ConditionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for ConditionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "aflame" => Ok(ConditionKind::Aflame),
            "bleed" => Ok(ConditionKind::Bleed),
            "poison" => Ok(ConditionKind::Poison),
            "stress" => Ok(ConditionKind::Stress),
            "corruption" => Ok(ConditionKind::Corruption),
            other => Err(format!("unknown condition '{}'", other)),
        }
    }
}

/// Current intensity of each condition on an actor. Zero means not afflicted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConditionValues {
    #[serde(default)]
    pub aflame: i32,
    #[serde(default)]
    pub bleed: i32,
    #[serde(default)]
    pub poison: i32,
    #[serde(default)]
    pub stress: i32,
    #[serde(default)]
    pub corruption: i32,
}

impl ConditionValues {
    pub fn get(&self, kind: ConditionKind) -> i32 {
        match kind {
            ConditionKind::Aflame => self.aflame,
            ConditionKind::Bleed => self.bleed,
            ConditionKind::Poison => self.poison,
            ConditionKind::Stress => self.stress,
            ConditionKind::Corruption => self.corruption,
        }
    }

    pub fn set(&mut self, kind: ConditionKind, value: i32) {
        let slot = match kind {
            ConditionKind::Aflame => &mut self.aflame,
            ConditionKind::Bleed => &mut self.bleed,
            ConditionKind::Poison => &mut self.poison,
            ConditionKind::Stress => &mut self.stress,
            ConditionKind::Corruption => &mut self.corruption,
        };
        *slot = value;
    }
}

/// Defeat marker placed on a creature that lost to its affliction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Defeat {
    Unconscious,
    Dead,
}

/// Side effects of a finished condition quarrel on the afflicted creature.
///
/// Clearing patches are plain overwrites; replaying them on a clear actor is a no-op.
pub fn condition_outcome_patches(
    creature_name: &str,
    kind: ConditionKind,
    creature_won: bool,
    rules: &Rules,
    mut log: impl FnMut(String),
) -> Vec<ActorPatch> {
    let mut patches = Vec::new();

    if creature_won {
        for cleared in kind.family() {
            patches.push(ActorPatch::SetCondition(*cleared, 0));
        }
        log(format!(
            "[COND][{}] overcomes {} → {} cleared",
            creature_name,
            kind,
            kind.family().iter().map(|k| k.key()).collect::<Vec<_>>().join(", ")
        ));
        return patches;
    }

    let defeat = if kind.is_physical() {
        rules.physical_defeat
    } else {
        rules.mental_defeat
    };
    patches.push(ActorPatch::SetDefeat(Some(defeat)));
    log(format!(
        "[COND][{}] succumbs to {} → {:?}",
        creature_name, kind, defeat
    ));

    if !kind.is_physical() {
        patches.push(ActorPatch::AddWillpowerPenalty(rules.condition_willpower_penalty));
        patches.push(ActorPatch::SetCondition(kind, 0));
        log(format!(
            "[COND][{}] loses {} Willpower; {} resets to 0",
            creature_name, rules.condition_willpower_penalty, kind
        ));
    }

    patches
}
