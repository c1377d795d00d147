//! Pairing of two independently rolled checks into a quarrel.
//!
//! The registry only holds matching state. It lives as long as the session that
//! owns it and is never persisted. Check and combat history is kept for the most
//! recent `DEFAULT_HISTORY_LIMIT` entries; older ones are evicted first.

use std::collections::HashSet;
use std::fmt;

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::actor::{Actor, ActorId, Skill};
use crate::checks::{CheckId, CheckResult, ContestOutcome};
use crate::conditions::ConditionKind;
use crate::error::EngineError;
use crate::host::ActorRef;
use crate::injury::{InjuryId, InjuryRecord};
use crate::location::BodyLocation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QuarrelId {
    pub initiator: CheckId,
    pub responder: CheckId,
}

impl fmt::Display for QuarrelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.initiator, self.responder)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResultMessages {
    pub success: Option<String>,
    pub failure: Option<String>,
    pub cost: Option<String>,
}

/// Presentation-only fields, passed through to the sink untouched.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DisplayInfo {
    pub custom_name: Option<String>,
    pub custom_icon: Option<String>,
    pub skill: Option<String>,
    pub result_messages: Option<ResultMessages>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuarrelSide {
    pub actor: ActorId,
    pub token: Option<String>,
    pub check: CheckId,
    pub raw_roll: i32,
    pub hits: i32,
}

impl QuarrelSide {
    pub fn from_check(roller: &ActorRef, check: &CheckResult) -> Self {
        Self {
            actor: roller.actor.clone(),
            token: roller.token.clone(),
            check: check.id,
            raw_roll: check.raw_roll,
            hits: check.hits,
        }
    }
}

/// A finished check waiting for the targeted actor to answer it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingCheck {
    pub initiator: QuarrelSide,
    pub initiator_check: CheckResult,
    pub target: ActorRef,
    pub condition: Option<ConditionKind>,
    pub combat: Option<bool>,
    pub skill: Option<Skill>,
    pub display: DisplayInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum PendingKey {
    Token(String),
    Actor(ActorId),
}

impl PendingKey {
    fn for_target(target: &ActorRef) -> Self {
        match &target.token {
            Some(token) => PendingKey::Token(token.clone()),
            None => PendingKey::Actor(target.actor.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quarrel {
    pub id: QuarrelId,
    pub initiator: QuarrelSide,
    pub responder: QuarrelSide,
    pub initiator_check: CheckResult,
    pub responder_check: CheckResult,
    pub is_combat_check: bool,
    pub condition: Option<ConditionKind>,
    pub display: DisplayInfo,
}

impl Quarrel {
    /// Initiator hits minus responder hits.
    pub fn net_hits(&self) -> i32 {
        self.initiator.hits - self.responder.hits
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatOutcome {
    pub attacker: ActorId,
    pub defender: ActorId,
    pub net_hits: i32,
    pub weapon_damage: i32,
    pub soak: i32,
    pub net_damage: i32,
    pub location_roll: i32,
    pub location: BodyLocation,
    pub injury: Option<InjuryRecord>,
    pub injury_id: Option<InjuryId>,
    pub relocated: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionOutcome {
    pub condition: ConditionKind,
    pub creature_won: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuarrelOutcome {
    pub quarrel: QuarrelId,
    pub net_hits: i32,
    pub initiator_won: bool,
    pub contest: ContestOutcome,
    pub combat: Option<CombatOutcome>,
    pub condition: Option<ConditionOutcome>,
    pub log: Vec<String>,
}

/// Decide whether a quarrel deals damage.
///
/// A condition quarrel never does. Otherwise the flag set on the check request
/// wins; without one, either actor's combat flag, a monster-like actor in a
/// melee exchange, or either actor carrying a weapon makes it a fight.
pub fn is_combat_check(
    condition: Option<ConditionKind>,
    explicit: Option<bool>,
    initiator: &Actor,
    responder: &Actor,
    skill: Option<Skill>,
) -> bool {
    if condition.is_some() {
        return false;
    }
    if let Some(flag) = explicit {
        return flag;
    }
    let actors = [initiator, responder];
    if actors.iter().any(|a| a.flags.combat) {
        return true;
    }
    let melee = skill.is_some_and(Skill::is_melee_flavored);
    if melee && actors.iter().any(|a| a.kind.is_monster_like()) {
        return true;
    }
    actors.iter().any(|a| a.has_weapon())
}

#[derive(Debug, Clone)]
struct DisplayedCheck {
    roller: ActorRef,
    check: CheckResult,
}

pub const DEFAULT_HISTORY_LIMIT: usize = 256;

#[derive(Debug)]
pub struct QuarrelRegistry {
    pending: IndexMap<PendingKey, PendingCheck>,
    active: HashSet<ActorId>,
    quarrels: IndexMap<QuarrelId, Quarrel>,
    displayed: IndexMap<CheckId, DisplayedCheck>,
    resolved: IndexSet<CheckId>,
    combat_results: IndexMap<QuarrelId, CombatOutcome>,
    history_limit: usize,
}

impl Default for QuarrelRegistry {
    fn default() -> Self {
        Self::with_history_limit(DEFAULT_HISTORY_LIMIT)
    }
}

impl QuarrelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry that remembers at most `limit` displayed checks, resolved checks
    /// and combat results each.
    pub fn with_history_limit(limit: usize) -> Self {
        Self {
            pending: IndexMap::new(),
            active: HashSet::new(),
            quarrels: IndexMap::new(),
            displayed: IndexMap::new(),
            resolved: IndexSet::new(),
            combat_results: IndexMap::new(),
            history_limit: limit.max(1),
        }
    }

    /// Register a pending check; a newer one for the same target replaces it.
    pub fn register(&mut self, pending: PendingCheck) {
        let key = PendingKey::for_target(&pending.target);
        self.active.insert(pending.initiator.actor.clone());
        self.active.insert(pending.target.actor.clone());
        debug!(initiator = %pending.initiator.actor, target = %pending.target.actor, "pending check registered");
        if let Some(old) = self.pending.insert(key, pending) {
            debug!(check = %old.initiator.check, "pending check superseded");
            self.release_unreferenced([old.initiator.actor]);
        }
    }

    pub fn is_active(&self, actor: &ActorId) -> bool {
        self.active.contains(actor)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Pending check waiting for `roller`.
    ///
    /// A roller with a token answers the check aimed at that token, or one aimed at
    /// its actor without a token. A roller without a token answers any check aimed
    /// at its actor.
    pub fn find_pending(&self, roller: &ActorRef) -> Option<&PendingCheck> {
        self.match_key(roller).and_then(|key| self.pending.get(&key))
    }

    pub fn take_pending(&mut self, roller: &ActorRef) -> Option<PendingCheck> {
        let key = self.match_key(roller)?;
        self.pending.shift_remove(&key)
    }

    fn match_key(&self, roller: &ActorRef) -> Option<PendingKey> {
        if let Some(token) = &roller.token {
            return [PendingKey::Token(token.clone()), PendingKey::Actor(roller.actor.clone())]
                .into_iter()
                .find(|key| self.pending.contains_key(key));
        }
        self.pending
            .iter()
            .find(|(_, p)| p.target.actor == roller.actor)
            .map(|(k, _)| k.clone())
    }

    /// Drop the actor's active flag and every pending check it starts or answers.
    pub fn clear_actor(&mut self, actor: &ActorId) {
        self.active.remove(actor);
        let mut others = Vec::new();
        self.pending.retain(|_, p| {
            let keep = &p.initiator.actor != actor && &p.target.actor != actor;
            if !keep {
                others.push(p.initiator.actor.clone());
                others.push(p.target.actor.clone());
            }
            keep
        });
        self.release_unreferenced(others);
    }

    /// Deactivate actors no remaining pending check refers to.
    fn release_unreferenced(&mut self, actors: impl IntoIterator<Item = ActorId>) {
        for actor in actors {
            let referenced = self
                .pending
                .values()
                .any(|p| p.initiator.actor == actor || p.target.actor == actor);
            if !referenced {
                self.active.remove(&actor);
            }
        }
    }

    pub fn insert_quarrel(&mut self, quarrel: Quarrel) -> QuarrelId {
        let id = quarrel.id;
        self.quarrels.insert(id, quarrel);
        id
    }

    pub fn quarrel(&self, id: &QuarrelId) -> Result<&Quarrel, EngineError> {
        self.quarrels.get(id).ok_or(EngineError::MissingPendingData(*id))
    }

    pub fn take_quarrel(&mut self, id: &QuarrelId) -> Result<Quarrel, EngineError> {
        self.quarrels
            .shift_remove(id)
            .ok_or(EngineError::MissingPendingData(*id))
    }

    /// Track a freshly shown check so it can still be reversed, rerolled or nudged.
    pub fn display(&mut self, roller: &ActorRef, check: &CheckResult) {
        self.displayed.insert(check.id, DisplayedCheck { roller: roller.clone(), check: check.clone() });
        while self.displayed.len() > self.history_limit {
            self.displayed.shift_remove_index(0);
        }
    }

    pub fn displayed(&self, id: CheckId) -> Result<(&ActorRef, &CheckResult), EngineError> {
        if self.resolved.contains(&id) {
            return Err(EngineError::CheckAlreadyResolved(id));
        }
        self.displayed
            .get(&id)
            .map(|d| (&d.roller, &d.check))
            .ok_or(EngineError::UnknownCheck(id))
    }

    /// Swap in a revised check everywhere the old one is referenced.
    pub fn revise(&mut self, check: &CheckResult) {
        if let Some(shown) = self.displayed.get_mut(&check.id) {
            shown.check = check.clone();
        }
        for pending in self.pending.values_mut() {
            if pending.initiator.check == check.id {
                pending.initiator.raw_roll = check.raw_roll;
                pending.initiator.hits = check.hits;
                pending.initiator_check = check.clone();
            }
        }
    }

    pub fn mark_resolved(&mut self, id: CheckId) {
        self.displayed.shift_remove(&id);
        self.resolved.insert(id);
        while self.resolved.len() > self.history_limit {
            self.resolved.shift_remove_index(0);
        }
    }

    /// Keep a combat result around for relocation; the oldest is evicted past the limit.
    pub fn record_combat(&mut self, id: QuarrelId, outcome: CombatOutcome) {
        self.combat_results.insert(id, outcome);
        while self.combat_results.len() > self.history_limit {
            self.combat_results.shift_remove_index(0);
        }
    }

    /// Displayed, resolved and combat entries currently remembered.
    pub fn history_len(&self) -> (usize, usize, usize) {
        (self.displayed.len(), self.resolved.len(), self.combat_results.len())
    }

    pub fn combat_result(&self, id: &QuarrelId) -> Result<&CombatOutcome, EngineError> {
        self.combat_results.get(id).ok_or(EngineError::MissingPendingData(*id))
    }

    pub fn combat_result_mut(&mut self, id: &QuarrelId) -> Result<&mut CombatOutcome, EngineError> {
        self.combat_results.get_mut(id).ok_or(EngineError::MissingPendingData(*id))
    }
}
