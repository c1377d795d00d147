//! The contract with the tabletop host: actor documents, targeting and presentation.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::actor::{Ability, AbilityView, Actor, ActorId, Skill, SkillRating};
use crate::checks::CheckResult;
use crate::conditions::{ConditionKind, Defeat};
use crate::error::EngineError;
use crate::injury::{Injury, InjuryId};
use crate::quarrel::{Quarrel, QuarrelOutcome};

/// Actor plus, when the host knows it, the specific token on the board.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActorRef {
    pub actor: ActorId,
    #[serde(default)]
    pub token: Option<String>,
}

impl ActorRef {
    pub fn actor(id: &str) -> Self {
        Self { actor: ActorId::from(id), token: None }
    }

    pub fn token(id: &str, token: &str) -> Self {
        Self { actor: ActorId::from(id), token: Some(token.to_string()) }
    }
}

/// One read-modify-write against an actor document.
#[derive(Debug, Clone, PartialEq)]
pub enum ActorPatch {
    SetCondition(ConditionKind, i32),
    SetDefeat(Option<Defeat>),
    AddWillpowerPenalty(i32),
    SetLuck(i32),
    AddInjury(Injury),
    ReplaceInjury(Injury),
    RemoveInjury(InjuryId),
}

impl ActorPatch {
    /// Dotted document path the host persists this patch under.
    pub fn path(&self) -> String {
        match self {
            ActorPatch::SetCondition(kind, _) => format!("system.conditions.{}", kind.key()),
            ActorPatch::SetDefeat(_) => "system.defeat".to_string(),
            ActorPatch::AddWillpowerPenalty(_) => "system.abilities.willpower.penalty".to_string(),
            ActorPatch::SetLuck(_) => "system.abilities.luck.current".to_string(),
            ActorPatch::AddInjury(_) | ActorPatch::ReplaceInjury(_) | ActorPatch::RemoveInjury(_) => {
                "system.injuries".to_string()
            }
        }
    }

    pub fn apply(self, actor: &mut Actor) -> Result<(), EngineError> {
        match self {
            ActorPatch::SetCondition(kind, value) => actor.conditions.set(kind, value),
            ActorPatch::SetDefeat(defeat) => actor.defeat = defeat,
            ActorPatch::AddWillpowerPenalty(amount) => actor.willpower_penalty += amount,
            ActorPatch::SetLuck(value) => actor.luck_current = value,
            ActorPatch::AddInjury(injury) => actor.injuries.push(injury),
            ActorPatch::ReplaceInjury(injury) => {
                let slot = actor
                    .injuries
                    .iter_mut()
                    .find(|i| i.id == injury.id)
                    .ok_or_else(|| EngineError::MissingInjury(injury.id, actor.id.clone()))?;
                *slot = injury;
            }
            ActorPatch::RemoveInjury(id) => {
                let before = actor.injuries.len();
                actor.injuries.retain(|i| i.id != id);
                if actor.injuries.len() == before {
                    return Err(EngineError::MissingInjury(id, actor.id.clone()));
                }
            }
        }
        Ok(())
    }
}

pub trait ActorStore {
    fn actor(&self, id: &ActorId) -> Option<&Actor>;

    fn update(&mut self, id: &ActorId, patch: ActorPatch) -> Result<(), EngineError>;

    fn require(&self, id: &ActorId) -> Result<&Actor, EngineError> {
        self.actor(id).ok_or_else(|| EngineError::MissingActor(id.clone()))
    }

    fn ability(&self, id: &ActorId, ability: Ability) -> Result<AbilityView, EngineError> {
        Ok(self.require(id)?.ability_view(ability))
    }

    fn skill(&self, id: &ActorId, skill: Skill) -> Result<SkillRating, EngineError> {
        Ok(self.require(id)?.skills.get(&skill).cloned().unwrap_or_default())
    }

    fn injuries(&self, id: &ActorId) -> Result<Vec<Injury>, EngineError> {
        Ok(self.require(id)?.injuries.clone())
    }
}

pub trait TargetSource {
    fn selected_targets(&self, actor: &ActorId) -> Vec<ActorRef>;
}

/// Fire-and-forget notifications for the presentation layer.
pub trait PresentationSink {
    fn publish_check_result(&mut self, check: &CheckResult, roller: &ActorRef);
    fn publish_quarrel_result(&mut self, quarrel: &Quarrel, outcome: &QuarrelOutcome);
}

pub trait Host: ActorStore + TargetSource + PresentationSink {}

impl<T: ActorStore + TargetSource + PresentationSink> Host for T {}

#[derive(Debug, Clone, PartialEq)]
pub enum Published {
    Check(CheckResult, ActorRef),
    Quarrel(Quarrel, QuarrelOutcome),
}

/// In-process host: actors in insertion order, explicit target selections and a
/// record of everything published.
#[derive(Debug, Default)]
pub struct MemoryHost {
    pub actors: IndexMap<ActorId, Actor>,
    pub targets: IndexMap<ActorId, Vec<ActorRef>>,
    pub published: Vec<Published>,
}

impl MemoryHost {
    pub fn new(actors: impl IntoIterator<Item = Actor>) -> Self {
        Self {
            actors: actors.into_iter().map(|a| (a.id.clone(), a)).collect(),
            ..Self::default()
        }
    }

    pub fn select_targets(&mut self, actor: &str, targets: Vec<ActorRef>) {
        self.targets.insert(ActorId::from(actor), targets);
    }

    pub fn clear_targets(&mut self, actor: &str) {
        self.targets.shift_remove(&ActorId::from(actor));
    }

    pub fn quarrel_results(&self) -> impl Iterator<Item = &QuarrelOutcome> {
        self.published.iter().filter_map(|p| match p {
            Published::Quarrel(_, outcome) => Some(outcome),
            Published::Check(..) => None,
        })
    }
}

impl ActorStore for MemoryHost {
    fn actor(&self, id: &ActorId) -> Option<&Actor> {
        self.actors.get(id)
    }

    fn update(&mut self, id: &ActorId, patch: ActorPatch) -> Result<(), EngineError> {
        let actor = self
            .actors
            .get_mut(id)
            .ok_or_else(|| EngineError::MissingActor(id.clone()))?;
        debug!(actor = %id, path = %patch.path(), "actor update");
        patch.apply(actor)
    }
}

impl TargetSource for MemoryHost {
    fn selected_targets(&self, actor: &ActorId) -> Vec<ActorRef> {
        self.targets.get(actor).cloned().unwrap_or_default()
    }
}

impl PresentationSink for MemoryHost {
    fn publish_check_result(&mut self, check: &CheckResult, roller: &ActorRef) {
        self.published.push(Published::Check(check.clone(), roller.clone()));
    }

    fn publish_quarrel_result(&mut self, quarrel: &Quarrel, outcome: &QuarrelOutcome) {
        self.published.push(Published::Quarrel(quarrel.clone(), outcome.clone()));
    }
}
