//! Wounds: the combat-damage injury generator and the injury records kept on actors.

use std::fmt;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::EngineError;
use crate::location::{BodyLocation, WoundSite};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InjuryId(pub Uuid);

impl InjuryId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for InjuryId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for InjuryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Where a wound sits. Sheet penalties are only derived for `Body` locations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InjuryLocation {
    Body(BodyLocation),
    Wound(WoundSite),
}

impl InjuryLocation {
    pub fn key(self) -> &'static str {
        match self {
            InjuryLocation::Body(loc) => loc.key(),
            InjuryLocation::Wound(site) => site.key(),
        }
    }
}

impl fmt::Display for InjuryLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InjuryTier {
    Minor,
    Moderate,
    Severe,
}

impl InjuryTier {
    /// None when the damage was fully soaked.
    pub fn for_net_damage(net_damage: i32) -> Option<Self> {
        match net_damage {
            i32::MIN..=0 => None,
            1..=2 => Some(InjuryTier::Minor),
            3..=4 => Some(InjuryTier::Moderate),
            _ => Some(InjuryTier::Severe),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierText {
    pub description: String,
    pub effect: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationTexts {
    pub minor: TierText,
    pub moderate: TierText,
    pub severe: TierText,
}

impl LocationTexts {
    pub fn tier(&self, tier: InjuryTier) -> &TierText {
        match tier {
            InjuryTier::Minor => &self.minor,
            InjuryTier::Moderate => &self.moderate,
            InjuryTier::Severe => &self.severe,
        }
    }
}

/// Location key → tier descriptions. Keys match `BodyLocation::key` and `WoundSite::key`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InjuryTable(pub IndexMap<String, LocationTexts>);

impl InjuryTable {
    pub fn texts(&self, location: InjuryLocation) -> Option<&LocationTexts> {
        self.0.get(location.key())
    }
}

/// A freshly generated combat injury, before it is attached to an actor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InjuryRecord {
    pub location: InjuryLocation,
    pub net_damage: i32,
    pub tier: InjuryTier,
    pub severity: i32,
    pub description: String,
    pub effect: String,
    pub requires_medical_aid: bool,
    pub requires_surgery: bool,
}

impl InjuryRecord {
    pub fn into_injury(self) -> Injury {
        Injury {
            id: InjuryId::new(),
            location: self.location,
            severity: self.severity,
            description: self.description,
            effect: self.effect,
            treated: false,
            permanent: false,
            timestamp: Utc::now(),
        }
    }
}

/// max(0, weapon damage + |net hits| - soak)
pub fn net_damage(weapon_damage: i32, net_hits: i32, soak: i32) -> i32 {
    (weapon_damage + net_hits.abs() - soak).max(0)
}

/// clamp(round(net_damage / 2), 0, 5), rounding halves up.
pub fn combat_severity(net_damage: i32) -> i32 {
    ((net_damage.max(0) + 1) / 2).clamp(0, 5)
}

pub fn determine_injury(
    table: &InjuryTable,
    location: InjuryLocation,
    net_damage: i32,
) -> Option<InjuryRecord> {
    let tier = InjuryTier::for_net_damage(net_damage)?;
    let (description, effect) = match table.texts(location) {
        Some(texts) => {
            let text = texts.tier(tier);
            (text.description.clone(), text.effect.clone())
        }
        None => (format!("{:?} wound to the {}", tier, location), String::new()),
    };
    Some(InjuryRecord {
        location,
        net_damage,
        tier,
        severity: combat_severity(net_damage),
        description,
        effect,
        requires_medical_aid: true,
        requires_surgery: tier == InjuryTier::Severe,
    })
}

/// Alternate combat-damage flow: the location comes from its own d10.
pub fn determine_wound(
    table: &InjuryTable,
    location_d10: i32,
    net_damage: i32,
) -> Result<Option<InjuryRecord>, EngineError> {
    let site = WoundSite::from_d10(location_d10)?;
    Ok(determine_injury(table, InjuryLocation::Wound(site), net_damage))
}

/// A wound carried by an actor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Injury {
    pub id: InjuryId,
    pub location: InjuryLocation,
    pub severity: i32,
    pub description: String,
    #[serde(default)]
    pub effect: String,
    #[serde(default)]
    pub treated: bool,
    #[serde(default)]
    pub permanent: bool,
    pub timestamp: DateTime<Utc>,
}

impl Injury {
    /// GM-entered injury on one of the six sheet locations.
    pub fn manual(
        location: BodyLocation,
        severity: i32,
        description: impl Into<String>,
        effect: impl Into<String>,
    ) -> Result<Self, EngineError> {
        if !(1..=10).contains(&severity) {
            return Err(EngineError::InvalidSeverity(severity));
        }
        Ok(Self {
            id: InjuryId::new(),
            location: InjuryLocation::Body(location),
            severity,
            description: description.into(),
            effect: effect.into(),
            treated: false,
            permanent: false,
            timestamp: Utc::now(),
        })
    }

    /// Still weighing on the sheet: untreated, or permanent regardless of treatment.
    pub fn is_active(&self) -> bool {
        !self.treated || self.permanent
    }

    pub fn treat(&mut self) {
        self.treated = true;
    }

    /// Permanent injuries are always treated as well.
    pub fn make_permanent(&mut self) {
        self.permanent = true;
        self.treated = true;
    }
}
