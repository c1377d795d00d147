use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Coarse locations used by the combat quarrel and by the character sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BodyLocation {
    Head,
    Torso,
    RightArm,
    LeftArm,
    RightLeg,
    LeftLeg,
}

impl BodyLocation {
    pub const ALL: [BodyLocation; 6] = [
        BodyLocation::Head,
        BodyLocation::Torso,
        BodyLocation::RightArm,
        BodyLocation::LeftArm,
        BodyLocation::RightLeg,
        BodyLocation::LeftLeg,
    ];

    /// Digit table: the ones digit of the attack roll picks the location.
    pub fn from_roll_digit(raw_roll: i32) -> Self {
        match raw_roll.rem_euclid(10) {
            0 => BodyLocation::Head,
            1..=3 => BodyLocation::Torso,
            4 | 6 => BodyLocation::RightArm,
            5 | 7 => BodyLocation::LeftArm,
            8 => BodyLocation::RightLeg,
            _ => BodyLocation::LeftLeg,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            BodyLocation::Head => "head",
            BodyLocation::Torso => "torso",
            BodyLocation::RightArm => "rightArm",
            BodyLocation::LeftArm => "leftArm",
            BodyLocation::RightLeg => "rightLeg",
            BodyLocation::LeftLeg => "leftLeg",
        }
    }

    pub fn is_arm(self) -> bool {
        matches!(self, BodyLocation::RightArm | BodyLocation::LeftArm)
    }
}

impl fmt::Display for BodyLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for BodyLocation {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BodyLocation::ALL
            .into_iter()
            .find(|loc| loc.key().eq_ignore_ascii_case(s))
            .ok_or_else(|| EngineError::InvalidLocation(s.to_string()))
    }
}

/// Finer locations of the alternate combat-damage table, picked by a d10.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WoundSite {
    Head,
    Face,
    Neck,
    Chest,
    Back,
    Arm,
    Hand,
    Leg,
    Foot,
    Jaw,
}

impl WoundSite {
    pub const ALL: [WoundSite; 10] = [
        WoundSite::Head,
        WoundSite::Face,
        WoundSite::Neck,
        WoundSite::Chest,
        WoundSite::Back,
        WoundSite::Arm,
        WoundSite::Hand,
        WoundSite::Leg,
        WoundSite::Foot,
        WoundSite::Jaw,
    ];

    /// d10 table. Rolls outside 1..=10 are rejected.
    pub fn from_d10(roll: i32) -> Result<Self, EngineError> {
        usize::try_from(roll - 1)
            .ok()
            .and_then(|idx| WoundSite::ALL.get(idx).copied())
            .ok_or_else(|| EngineError::InvalidLocation(format!("d10={roll}")))
    }

    pub fn key(self) -> &'static str {
        match self {
            WoundSite::Head => "Head",
            WoundSite::Face => "Face",
            WoundSite::Neck => "Neck",
            WoundSite::Chest => "Chest",
            WoundSite::Back => "Back",
            WoundSite::Arm => "Arm",
            WoundSite::Hand => "Hand",
            WoundSite::Leg => "Leg",
            WoundSite::Foot => "Foot",
            WoundSite::Jaw => "Jaw",
        }
    }
}

impl fmt::Display for WoundSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for WoundSite {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WoundSite::ALL
            .into_iter()
            .find(|site| site.key().eq_ignore_ascii_case(s))
            .ok_or_else(|| EngineError::InvalidLocation(s.to_string()))
    }
}
