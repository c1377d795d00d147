//! Actor sheets and the stats derived from them.
//!
//! Nothing here caches: `Actor::derive` rebuilds every bonus and injury penalty
//! from the stored ratings and injury list each time it is called.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::conditions::{ConditionValues, Defeat};
use crate::config::Rules;
use crate::injury::{Injury, InjuryId, InjuryLocation};
use crate::location::BodyLocation;
use crate::rating_bonus;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorId(pub String);

impl From<&str> for ActorId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ActorKind {
    #[default]
    Character,
    Npc,
    Enemy,
    Monster,
}

impl ActorKind {
    pub fn is_monster_like(self) -> bool {
        matches!(self, ActorKind::Enemy | ActorKind::Monster)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ability {
    Muscle,
    Finesse,
    Agility,
    Robustness,
    Intelligence,
    Willpower,
    Luck,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Abilities {
    pub muscle: i32,
    pub finesse: i32,
    pub agility: i32,
    pub robustness: i32,
    pub intelligence: i32,
    pub willpower: i32,
    pub luck: i32,
}

impl Abilities {
    pub fn value_of(&self, ability: Ability) -> i32 {
        match ability {
            Ability::Muscle => self.muscle,
            Ability::Finesse => self.finesse,
            Ability::Agility => self.agility,
            Ability::Robustness => self.robustness,
            Ability::Intelligence => self.intelligence,
            Ability::Willpower => self.willpower,
            Ability::Luck => self.luck,
        }
    }

    pub fn bonus_of(&self, ability: Ability) -> i32 {
        rating_bonus(self.value_of(ability))
    }

    fn add(&self, delta: &Abilities) -> Abilities {
        Abilities {
            muscle: self.muscle + delta.muscle,
            finesse: self.finesse + delta.finesse,
            agility: self.agility + delta.agility,
            robustness: self.robustness + delta.robustness,
            intelligence: self.intelligence + delta.intelligence,
            willpower: self.willpower + delta.willpower,
            luck: self.luck + delta.luck,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Skill {
    Melee,
    Ranged,
    LightFoot,
    Brawl,
    Awareness,
    Stealth,
    Lore,
    Medicine,
}

impl Skill {
    /// Skills that make an exchange with a monster a fight.
    pub fn is_melee_flavored(self) -> bool {
        matches!(self, Skill::Melee | Skill::Brawl)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SkillRating {
    pub value: i32,
    #[serde(default)]
    pub specializations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ItemKind {
    Weapon { damage: i32 },
    Armor { soak: i32 },
    Gear,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub name: String,
    pub kind: ItemKind,
    #[serde(default)]
    pub weight: i32,
    #[serde(default)]
    pub equipped: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ActorFlags {
    /// Every quarrel involving this actor is a fight.
    #[serde(default)]
    pub combat: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Actor {
    pub id: ActorId,
    pub name: String,
    #[serde(default)]
    pub kind: ActorKind,
    #[serde(default)]
    pub left_handed: bool,
    pub abilities: Abilities,
    #[serde(default)]
    pub skills: IndexMap<Skill, SkillRating>,
    pub speed: i32,
    #[serde(default = "one")]
    pub attacks_per_round: i32,
    #[serde(default)]
    pub luck_current: i32,
    #[serde(default)]
    pub willpower_penalty: i32,
    #[serde(default)]
    pub conditions: ConditionValues,
    #[serde(default)]
    pub defeat: Option<Defeat>,
    #[serde(default)]
    pub injuries: Vec<Injury>,
    #[serde(default)]
    pub items: Vec<Item>,
    #[serde(default)]
    pub flags: ActorFlags,
}

fn one() -> i32 {
    1
}

/// Read view of one ability, the shape hosts expect from `getAbility`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AbilityView {
    pub value: i32,
    pub bonus: i32,
    pub injury_modifier: i32,
}

/// Stat deltas accumulated from active injuries.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct InjuryModifiers {
    pub abilities: Abilities,
    pub melee: i32,
    pub ranged: i32,
    pub light_foot: i32,
    pub speed: i32,
    pub lost_attack: bool,
}

impl InjuryModifiers {
    pub fn skill(&self, skill: Skill) -> i32 {
        match skill {
            Skill::Melee => self.melee,
            Skill::Ranged => self.ranged,
            Skill::LightFoot => self.light_foot,
            _ => 0,
        }
    }

    fn accumulate(&mut self, location: BodyLocation, severity: i32, dominant_arm: BodyLocation) {
        match location {
            BodyLocation::Head => {
                if severity >= 3 {
                    self.abilities.intelligence -= severity * 5;
                    self.abilities.willpower -= severity * 5;
                }
            }
            BodyLocation::Torso => {
                if severity >= 2 {
                    self.abilities.robustness -= severity * 5;
                }
                if severity >= 5 {
                    self.lost_attack = true;
                }
            }
            arm if arm.is_arm() => {
                self.melee -= severity * 5;
                if severity >= 3 {
                    self.abilities.muscle -= severity * 3;
                    self.abilities.finesse -= severity * 5;
                }
                if arm == dominant_arm {
                    self.ranged -= severity * 10;
                }
            }
            _ => {
                self.abilities.agility -= severity * 5;
                self.light_foot -= severity * 5;
                self.speed -= severity * 2;
                if severity >= 4 {
                    self.speed -= 5;
                }
            }
        }
    }
}

/// Everything the sheet shows that is computed rather than stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DerivedStats {
    pub abilities: Abilities,
    pub skills: IndexMap<Skill, i32>,
    pub speed: i32,
    pub attacks_per_round: i32,
    pub carried_weight: i32,
    pub carry_capacity: i32,
    pub encumbrance: i32,
    pub soak: i32,
    pub modifiers: InjuryModifiers,
}

impl DerivedStats {
    pub fn ability(&self, ability: Ability) -> i32 {
        self.abilities.value_of(ability)
    }

    pub fn bonus(&self, ability: Ability) -> i32 {
        self.abilities.bonus_of(ability)
    }

    pub fn skill(&self, skill: Skill) -> i32 {
        self.skills.get(&skill).copied().unwrap_or(self.modifiers.skill(skill))
    }
}

impl Actor {
    pub fn new(id: &str, name: &str, abilities: Abilities) -> Self {
        Self {
            id: ActorId::from(id),
            name: name.to_string(),
            kind: ActorKind::Character,
            left_handed: false,
            abilities,
            skills: IndexMap::new(),
            speed: 10,
            attacks_per_round: 1,
            luck_current: abilities.luck,
            willpower_penalty: 0,
            conditions: ConditionValues::default(),
            defeat: None,
            injuries: Vec::new(),
            items: Vec::new(),
            flags: ActorFlags::default(),
        }
    }

    pub fn with_skill(mut self, skill: Skill, value: i32, specializations: &[&str]) -> Self {
        self.skills.insert(
            skill,
            SkillRating {
                value,
                specializations: specializations.iter().map(|s| s.to_string()).collect(),
            },
        );
        self
    }

    pub fn with_item(mut self, item: Item) -> Self {
        self.items.push(item);
        self
    }

    pub fn dominant_arm(&self) -> BodyLocation {
        if self.left_handed {
            BodyLocation::LeftArm
        } else {
            BodyLocation::RightArm
        }
    }

    /// Damage of the first equipped weapon, or the unarmed value.
    pub fn weapon_damage(&self, rules: &Rules) -> i32 {
        self.items
            .iter()
            .filter(|i| i.equipped)
            .find_map(|i| match i.kind {
                ItemKind::Weapon { damage } => Some(damage),
                _ => None,
            })
            .unwrap_or(rules.unarmed_damage)
    }

    pub fn soak(&self) -> i32 {
        self.items
            .iter()
            .filter(|i| i.equipped)
            .map(|i| match i.kind {
                ItemKind::Armor { soak } => soak,
                _ => 0,
            })
            .sum()
    }

    pub fn has_weapon(&self) -> bool {
        self.items.iter().any(|i| matches!(i.kind, ItemKind::Weapon { .. }))
    }

    pub fn carried_weight(&self) -> i32 {
        self.items.iter().map(|i| i.weight).sum()
    }

    pub fn injury(&self, id: InjuryId) -> Option<&Injury> {
        self.injuries.iter().find(|i| i.id == id)
    }

    /// Penalties from untreated or permanent injuries on the six sheet locations.
    pub fn injury_modifiers(&self) -> InjuryModifiers {
        let dominant = self.dominant_arm();
        let mut mods = InjuryModifiers::default();
        for injury in self.injuries.iter().filter(|i| i.is_active()) {
            if let InjuryLocation::Body(location) = injury.location {
                mods.accumulate(location, injury.severity, dominant);
            }
        }
        mods
    }

    pub fn ability_view(&self, ability: Ability) -> AbilityView {
        let mods = self.injury_modifiers();
        let value = self.abilities.value_of(ability);
        AbilityView { value, bonus: rating_bonus(value), injury_modifier: mods.abilities.value_of(ability) }
    }

    pub fn derive(&self, rules: &Rules) -> DerivedStats {
        let modifiers = self.injury_modifiers();

        let mut abilities = self.abilities.add(&modifiers.abilities);
        abilities.willpower -= self.willpower_penalty;

        let skills = self
            .skills
            .iter()
            .map(|(skill, rating)| (*skill, rating.value + modifiers.skill(*skill)))
            .collect();

        let carried_weight = self.carried_weight();
        let carry_capacity = rules.encumbrance_base_capacity + abilities.bonus_of(Ability::Muscle);
        let encumbrance = (carried_weight - carry_capacity).max(0);

        let speed = ((self.speed + modifiers.speed).max(0) - encumbrance).max(0);
        let attacks_per_round = if modifiers.lost_attack {
            (self.attacks_per_round - 1).max(1)
        } else {
            self.attacks_per_round
        };

        DerivedStats {
            abilities,
            skills,
            speed,
            attacks_per_round,
            carried_weight,
            carry_capacity,
            encumbrance,
            soak: self.soak(),
            modifiers,
        }
    }
}
