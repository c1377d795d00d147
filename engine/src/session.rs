//! Session orchestration: rolling checks, matching them into quarrels and
//! applying the consequences to actors through the host.

use anyhow::Result as AnyResult;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::actor::{Ability, ActorId, DerivedStats, Skill};
use crate::checks::{classify, contest, roll_check, CheckId, CheckResult, HitsPolicy};
use crate::conditions::{condition_outcome_patches, ConditionKind};
use crate::config::Rules;
use crate::content::{default_injury_table, default_rules};
use crate::error::EngineError;
use crate::host::{ActorPatch, ActorRef, Host};
use crate::injury::{determine_injury, net_damage, Injury, InjuryId, InjuryLocation, InjuryTable};
use crate::location::BodyLocation;
use crate::quarrel::{
    is_combat_check, CombatOutcome, ConditionOutcome, DisplayInfo, PendingCheck, Quarrel,
    QuarrelId, QuarrelOutcome, QuarrelRegistry, QuarrelSide,
};
use crate::Dice;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    Ability(Ability),
    Skill {
        skill: Skill,
        specialization: Option<String>,
    },
    /// Fixed target, e.g. a condition's potency rolled by the GM.
    Flat(i32),
}

/// What the caller wants rolled, tagged with everything that decides how a
/// resulting quarrel is handled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckRequest {
    pub roller: ActorRef,
    pub kind: CheckKind,
    #[serde(default)]
    pub modifier: i32,
    /// Set by a caller that knows whether this is a fight; overrides inference.
    #[serde(default)]
    pub combat: Option<bool>,
    #[serde(default)]
    pub condition: Option<ConditionKind>,
    #[serde(default)]
    pub display: DisplayInfo,
}

impl CheckRequest {
    pub fn ability(roller: ActorRef, ability: Ability) -> Self {
        Self::new(roller, CheckKind::Ability(ability))
    }

    pub fn skill(roller: ActorRef, skill: Skill) -> Self {
        Self::new(roller, CheckKind::Skill { skill, specialization: None })
    }

    pub fn flat(roller: ActorRef, target: i32) -> Self {
        Self::new(roller, CheckKind::Flat(target))
    }

    fn new(roller: ActorRef, kind: CheckKind) -> Self {
        Self {
            roller,
            kind,
            modifier: 0,
            combat: None,
            condition: None,
            display: DisplayInfo::default(),
        }
    }

    pub fn with_modifier(mut self, modifier: i32) -> Self {
        self.modifier = modifier;
        self
    }

    pub fn with_specialization(mut self, name: &str) -> Self {
        if let CheckKind::Skill { specialization, .. } = &mut self.kind {
            *specialization = Some(name.to_string());
        }
        self
    }

    pub fn with_condition(mut self, condition: ConditionKind) -> Self {
        self.condition = Some(condition);
        self
    }

    pub fn combat(mut self, combat: bool) -> Self {
        self.combat = Some(combat);
        self
    }

    fn skill_kind(&self) -> Option<Skill> {
        match self.kind {
            CheckKind::Skill { skill, .. } => Some(skill),
            _ => None,
        }
    }
}

/// What happened to a check after it was rolled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckDisposition {
    /// No quarrel involved.
    Standalone,
    /// Waiting for the listed targets to answer.
    Registered(Vec<ActorRef>),
    /// Answered a pending check; the quarrel has been resolved.
    Resolved(QuarrelOutcome),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollReport {
    pub check: CheckResult,
    pub disposition: CheckDisposition,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LuckSpend {
    pub check: CheckResult,
    pub spent: i32,
    /// The request asked for more than the pool or the d100 range allowed.
    pub clamped: bool,
}

pub struct Session<H: Host> {
    pub host: H,
    pub dice: Dice,
    pub rules: Rules,
    pub injury_table: InjuryTable,
    pub registry: QuarrelRegistry,
}

impl<H: Host> Session<H> {
    pub fn new(host: H, dice: Dice, rules: Rules, injury_table: InjuryTable) -> Self {
        Self { host, dice, rules, injury_table, registry: QuarrelRegistry::new() }
    }

    /// Session with the shipped rules and injury table.
    pub fn with_defaults(host: H, dice: Dice) -> AnyResult<Self> {
        Ok(Self::new(host, dice, default_rules()?, default_injury_table()?))
    }

    pub fn derived(&self, actor: &ActorId) -> Result<DerivedStats, EngineError> {
        Ok(self.host.require(actor)?.derive(&self.rules))
    }

    /// Roll the requested check, show it, and pair or register it.
    pub fn roll(&mut self, request: CheckRequest) -> Result<RollReport, EngineError> {
        let (target, additional_hits) = self.target_for(&request)?;
        let check = roll_check(
            &mut self.dice,
            target,
            request.modifier,
            additional_hits,
            HitsPolicy::Ability,
        );
        self.submit(request, check)
    }

    /// Feed a check rolled elsewhere into the quarrel machinery.
    pub fn submit(&mut self, request: CheckRequest, check: CheckResult) -> Result<RollReport, EngineError> {
        info!(actor = %request.roller.actor, "{}", check);
        self.host.publish_check_result(&check, &request.roller);
        self.registry.display(&request.roller, &check);
        let disposition = self.after_check(&request, &check)?;
        Ok(RollReport { check, disposition })
    }

    fn target_for(&self, request: &CheckRequest) -> Result<(i32, i32), EngineError> {
        let actor = self.host.require(&request.roller.actor)?;
        let derived = actor.derive(&self.rules);
        Ok(match &request.kind {
            CheckKind::Ability(ability) => (derived.ability(*ability), 0),
            CheckKind::Skill { skill, specialization } => {
                let specialized = specialization.as_ref().is_some_and(|name| {
                    actor.skills.get(skill).is_some_and(|rating| {
                        rating.specializations.iter().any(|s| s.eq_ignore_ascii_case(name))
                    })
                });
                let bonus = if specialized { self.rules.specialization_bonus_hits } else { 0 };
                (derived.skill(*skill), bonus)
            }
            CheckKind::Flat(target) => (*target, 0),
        })
    }

    fn after_check(
        &mut self,
        request: &CheckRequest,
        check: &CheckResult,
    ) -> Result<CheckDisposition, EngineError> {
        // The pending check is consumed only once both actors are known to exist.
        if let Some(pending) = self.registry.find_pending(&request.roller).cloned() {
            let id = self.pair(pending, request, check)?;
            self.registry.take_pending(&request.roller);
            return self.resolve_quarrel(id).map(CheckDisposition::Resolved);
        }

        let actor = &request.roller.actor;
        if self.registry.is_active(actor) {
            debug!(actor = %actor, "actor already in a quarrel; check stands alone");
            return Ok(CheckDisposition::Standalone);
        }

        let targets = self.host.selected_targets(actor);
        if targets.is_empty() {
            return Ok(CheckDisposition::Standalone);
        }
        for target in &targets {
            self.registry.register(PendingCheck {
                initiator: QuarrelSide::from_check(&request.roller, check),
                initiator_check: check.clone(),
                target: target.clone(),
                condition: request.condition,
                combat: request.combat,
                skill: request.skill_kind(),
                display: request.display.clone(),
            });
        }
        Ok(CheckDisposition::Registered(targets))
    }

    fn pair(
        &mut self,
        pending: PendingCheck,
        request: &CheckRequest,
        check: &CheckResult,
    ) -> Result<QuarrelId, EngineError> {
        let initiator = self.host.require(&pending.initiator.actor)?;
        let responder = self.host.require(&request.roller.actor)?;
        let explicit = pending.combat.or(request.combat);
        let skill = pending.skill.or(request.skill_kind());
        let is_combat = is_combat_check(pending.condition, explicit, initiator, responder, skill);

        let id = QuarrelId { initiator: pending.initiator.check, responder: check.id };
        debug!(quarrel = %id, is_combat, condition = ?pending.condition, "quarrel paired");
        Ok(self.registry.insert_quarrel(Quarrel {
            id,
            initiator: pending.initiator,
            responder: QuarrelSide::from_check(&request.roller, check),
            initiator_check: pending.initiator_check,
            responder_check: check.clone(),
            is_combat_check: is_combat,
            condition: pending.condition,
            display: pending.display,
        }))
    }

    /// Resolve a paired quarrel exactly once.
    ///
    /// Every lookup happens before the quarrel is consumed. The registry is settled
    /// before any actor patch is written, so a failing write still leaves the
    /// quarrel resolved and both actors free.
    pub fn resolve_quarrel(&mut self, id: QuarrelId) -> Result<QuarrelOutcome, EngineError> {
        let quarrel = self.registry.quarrel(&id)?.clone();
        let initiator_name = self.host.require(&quarrel.initiator.actor)?.name.clone();
        let responder_name = self.host.require(&quarrel.responder.actor)?.name.clone();

        let net_hits = quarrel.net_hits();
        let initiator_won = net_hits >= 0;
        let mut log = vec![format!(
            "[QUARREL] {} ({} hits) vs {} ({} hits) → net {} → {} wins",
            initiator_name,
            quarrel.initiator.hits,
            responder_name,
            quarrel.responder.hits,
            net_hits,
            if initiator_won { &initiator_name } else { &responder_name }
        )];

        let mut outcome = QuarrelOutcome {
            quarrel: id,
            net_hits,
            initiator_won,
            contest: contest(&quarrel.initiator_check, &quarrel.responder_check),
            combat: None,
            condition: None,
            log: Vec::new(),
        };

        let mut patches = Vec::new();
        if let Some(condition) = quarrel.condition {
            let creature_won = !initiator_won;
            for patch in condition_outcome_patches(
                &responder_name,
                condition,
                creature_won,
                &self.rules,
                |line| log.push(line),
            ) {
                patches.push((quarrel.responder.actor.clone(), patch));
            }
            outcome.condition = Some(ConditionOutcome { condition, creature_won });
        } else if quarrel.is_combat_check {
            let (combat, patch) = self.resolve_combat(&quarrel, initiator_won, &mut log)?;
            if let Some(patch) = patch {
                patches.push((combat.defender.clone(), patch));
            }
            outcome.combat = Some(combat);
        }

        self.registry.take_quarrel(&id)?;
        if let Some(combat) = &outcome.combat {
            self.registry.record_combat(id, combat.clone());
        }
        self.registry.mark_resolved(quarrel.initiator.check);
        self.registry.mark_resolved(quarrel.responder.check);
        self.registry.clear_actor(&quarrel.initiator.actor);
        self.registry.clear_actor(&quarrel.responder.actor);

        for (actor, patch) in patches {
            self.host.update(&actor, patch)?;
        }

        outcome.log = log;
        info!(quarrel = %id, net_hits, initiator_won, "quarrel resolved");
        self.host.publish_quarrel_result(&quarrel, &outcome);
        Ok(outcome)
    }

    /// Work out damage and the resulting injury. The injury patch is returned, not applied.
    fn resolve_combat(
        &mut self,
        quarrel: &Quarrel,
        initiator_won: bool,
        log: &mut Vec<String>,
    ) -> Result<(CombatOutcome, Option<ActorPatch>), EngineError> {
        let (attacker_id, defender_id) = if initiator_won {
            (&quarrel.initiator.actor, &quarrel.responder.actor)
        } else {
            (&quarrel.responder.actor, &quarrel.initiator.actor)
        };
        let attacker = self.host.require(attacker_id)?;
        let defender = self.host.require(defender_id)?;
        let weapon_damage = attacker.weapon_damage(&self.rules);
        let soak = defender.soak();
        let defender_name = defender.name.clone();

        let net_hits = quarrel.net_hits().abs();
        let damage = net_damage(weapon_damage, net_hits, soak);
        let location_roll = self.dice.d100();
        let location = BodyLocation::from_roll_digit(location_roll);
        log.push(format!(
            "[COMBAT] {} damage {} + {} hits - {} soak = {} at {} (d100={})",
            attacker.name, weapon_damage, net_hits, soak, damage, location, location_roll
        ));

        let injury = determine_injury(&self.injury_table, InjuryLocation::Body(location), damage);
        let mut injury_id = None;
        let mut patch = None;
        match &injury {
            Some(record) => {
                let wound = record.clone().into_injury();
                injury_id = Some(wound.id);
                log.push(format!(
                    "[INJURY][{}] {} ({:?}, severity {}){}",
                    defender_name,
                    record.description,
                    record.tier,
                    record.severity,
                    if record.requires_surgery { "; surgery required" } else { "" }
                ));
                patch = Some(ActorPatch::AddInjury(wound));
            }
            None => log.push(format!("[INJURY][{}] no injury", defender_name)),
        }

        let combat = CombatOutcome {
            attacker: attacker_id.clone(),
            defender: defender_id.clone(),
            net_hits,
            weapon_damage,
            soak,
            net_damage: damage,
            location_roll,
            location,
            injury,
            injury_id,
            relocated: false,
        };
        Ok((combat, patch))
    }

    /// Spend the attacker's hits to move a resolved hit to another location. Once per result.
    pub fn relocate(
        &mut self,
        id: QuarrelId,
        location: BodyLocation,
    ) -> Result<CombatOutcome, EngineError> {
        let cost = self.rules.relocate_cost;
        let current = self.registry.combat_result(&id)?.clone();
        if current.relocated {
            return Err(EngineError::AlreadyRelocated(id));
        }
        if current.net_hits < cost {
            return Err(EngineError::InsufficientResource {
                resource: "hits",
                needed: cost,
                available: current.net_hits,
            });
        }
        let defender = self.host.require(&current.defender)?;

        let net_hits = current.net_hits - cost;
        let damage = net_damage(current.weapon_damage, net_hits, current.soak);
        let injury = determine_injury(&self.injury_table, InjuryLocation::Body(location), damage);

        let (patch, injury_id) = match (current.injury_id, &injury) {
            (Some(old_id), Some(record)) => {
                let old = defender
                    .injury(old_id)
                    .ok_or_else(|| EngineError::MissingInjury(old_id, current.defender.clone()))?;
                let mut wound = record.clone().into_injury();
                wound.id = old_id;
                wound.timestamp = old.timestamp;
                (Some(ActorPatch::ReplaceInjury(wound)), Some(old_id))
            }
            (Some(old_id), None) => (Some(ActorPatch::RemoveInjury(old_id)), None),
            (None, Some(record)) => {
                let wound = record.clone().into_injury();
                let new_id = wound.id;
                (Some(ActorPatch::AddInjury(wound)), Some(new_id))
            }
            (None, None) => (None, None),
        };
        if let Some(patch) = patch {
            self.host.update(&current.defender, patch)?;
        }

        let updated = self.registry.combat_result_mut(&id)?;
        updated.net_hits = net_hits;
        updated.net_damage = damage;
        updated.location = location;
        updated.injury = injury;
        updated.injury_id = injury_id;
        updated.relocated = true;
        info!(quarrel = %id, %location, "hit relocated");
        Ok(updated.clone())
    }

    /// Swap the digits of a displayed, unresolved check.
    pub fn reverse(&mut self, id: CheckId) -> Result<CheckResult, EngineError> {
        let (roller, check) = self.registry.displayed(id)?;
        let (roller, revised) = (roller.clone(), check.reversed());
        debug!(check = %id, from = check.raw_roll, to = revised.raw_roll, "check reversed");
        self.publish_revision(&roller, &revised);
        Ok(revised)
    }

    /// Replace a displayed, unresolved check's roll with a fresh d100.
    pub fn reroll(&mut self, id: CheckId) -> Result<CheckResult, EngineError> {
        let (roller, check) = self.registry.displayed(id)?;
        let (roller, check) = (roller.clone(), check.clone());
        let revised = check.with_raw_roll(self.dice.d100(), HitsPolicy::Generic);
        debug!(check = %id, from = check.raw_roll, to = revised.raw_roll, "check rerolled");
        self.publish_revision(&roller, &revised);
        Ok(revised)
    }

    /// Shift a displayed check's roll by `delta`, paid for with the roller's luck.
    pub fn spend_luck(&mut self, id: CheckId, delta: i32) -> Result<LuckSpend, EngineError> {
        let (roller, check) = self.registry.displayed(id)?;
        let (roller, check) = (roller.clone(), check.clone());
        let available = self.host.require(&roller.actor)?.luck_current;

        let requested = delta.abs();
        let affordable = requested.min(available.max(0));
        let raw_roll = (check.raw_roll + delta.signum() * affordable).clamp(1, 100);
        let spent = (raw_roll - check.raw_roll).abs();
        let clamped = spent < requested;
        if clamped {
            warn!(actor = %roller.actor, requested, spent, available, "luck spend clamped");
        }

        let revised = check.with_raw_roll(raw_roll, HitsPolicy::Generic);
        self.host.update(&roller.actor, ActorPatch::SetLuck(available - spent))?;
        self.publish_revision(&roller, &revised);
        Ok(LuckSpend { check: revised, spent, clamped })
    }

    fn publish_revision(&mut self, roller: &ActorRef, revised: &CheckResult) {
        self.registry.revise(revised);
        self.host.publish_check_result(revised, roller);
    }

    /// Release the actor from any quarrel it is waiting on.
    pub fn clear_actor(&mut self, actor: &ActorId) {
        self.registry.clear_actor(actor);
    }

    /// GM-entered injury on one of the six sheet locations.
    pub fn add_injury(
        &mut self,
        actor: &ActorId,
        location: &str,
        severity: i32,
        description: &str,
        effect: &str,
    ) -> Result<InjuryId, EngineError> {
        let location: BodyLocation = location.parse()?;
        let injury = Injury::manual(location, severity, description, effect)?;
        let id = injury.id;
        self.host.update(actor, ActorPatch::AddInjury(injury))?;
        Ok(id)
    }

    pub fn treat_injury(&mut self, actor: &ActorId, id: InjuryId) -> Result<(), EngineError> {
        self.edit_injury(actor, id, Injury::treat)
    }

    pub fn make_permanent(&mut self, actor: &ActorId, id: InjuryId) -> Result<(), EngineError> {
        self.edit_injury(actor, id, Injury::make_permanent)
    }

    pub fn delete_injury(&mut self, actor: &ActorId, id: InjuryId) -> Result<(), EngineError> {
        self.host.update(actor, ActorPatch::RemoveInjury(id))
    }

    fn edit_injury(
        &mut self,
        actor: &ActorId,
        id: InjuryId,
        edit: impl FnOnce(&mut Injury),
    ) -> Result<(), EngineError> {
        let mut injury = self
            .host
            .require(actor)?
            .injury(id)
            .cloned()
            .ok_or_else(|| EngineError::MissingInjury(id, actor.clone()))?;
        edit(&mut injury);
        self.host.update(actor, ActorPatch::ReplaceInjury(injury))
    }

    /// Classify a roll the host already drew, using the ability-roll policy.
    pub fn classify_ability_roll(&self, raw_roll: i32, target: i32, modifier: i32) -> CheckResult {
        classify(raw_roll, target, modifier, 0, HitsPolicy::Ability)
    }
}
