mod common;

use common::{marsh_thing, session, swordsman, villager};
use quarrel_engine::session::CheckDisposition;
use quarrel_engine::content::default_injury_table;
use quarrel_engine::{
    Actor, ActorId, ActorPatch, ActorRef, ActorStore, BodyLocation, CheckRequest, CheckResult,
    Dice, EngineError, HitsPolicy, InjuryLocation, InjuryTier, MemoryHost, PresentationSink,
    Quarrel, QuarrelOutcome, QuarrelRegistry, Rules, Session, Skill, TargetSource,
};

fn resolved(disposition: CheckDisposition) -> QuarrelOutcome {
    match disposition {
        CheckDisposition::Resolved(outcome) => outcome,
        other => panic!("expected a resolved quarrel, got {:?}", other),
    }
}

fn melee(actor: &str) -> CheckRequest {
    CheckRequest::skill(ActorRef::actor(actor), Skill::Melee)
}

#[test]
fn first_check_with_a_target_waits_for_an_answer() {
    let mut s = session(vec![swordsman(), marsh_thing()], vec![31]);
    s.host.select_targets("aldric", vec![ActorRef::actor("grull")]);

    let report = s.roll(melee("aldric")).unwrap();
    assert_eq!(report.check.hits, 3);
    assert_eq!(report.check.policy, HitsPolicy::Ability);
    assert_eq!(report.disposition, CheckDisposition::Registered(vec![ActorRef::actor("grull")]));
    assert!(s.registry.is_active(&ActorId::from("aldric")));
    assert!(s.registry.is_active(&ActorId::from("grull")));
}

#[test]
fn check_without_targets_stands_alone() {
    let mut s = session(vec![swordsman()], vec![31]);
    let report = s.roll(melee("aldric")).unwrap();
    assert_eq!(report.disposition, CheckDisposition::Standalone);
    assert_eq!(s.registry.pending_count(), 0);
}

#[test]
fn answered_melee_check_wounds_the_loser() {
    // aldric 31 vs 60 → 3 hits; grull 42 vs 45 → 0 hits; location die 84
    let mut s = session(vec![swordsman(), marsh_thing()], vec![31, 42, 84]);
    s.host.select_targets("aldric", vec![ActorRef::actor("grull")]);
    s.roll(melee("aldric")).unwrap();
    let outcome = resolved(s.roll(melee("grull")).unwrap().disposition);

    assert_eq!(outcome.net_hits, 3);
    assert!(outcome.initiator_won);
    assert!(outcome.contest.success);
    assert_eq!(outcome.log[0], "[QUARREL] Aldric (3 hits) vs Grull (0 hits) → net 3 → Aldric wins");

    let combat = outcome.combat.expect("melee against a monster is a fight");
    assert_eq!(combat.attacker, ActorId::from("aldric"));
    assert_eq!(combat.defender, ActorId::from("grull"));
    // 3 weapon + 3 hits - 2 soak
    assert_eq!(combat.net_damage, 4);
    assert_eq!(combat.location, BodyLocation::RightArm);
    let injury = combat.injury.unwrap();
    assert_eq!(injury.tier, InjuryTier::Moderate);
    assert_eq!(injury.severity, 2);

    let grull = s.host.actor(&ActorId::from("grull")).unwrap();
    assert_eq!(grull.injuries.len(), 1);
    assert_eq!(grull.injuries[0].location, InjuryLocation::Body(BodyLocation::RightArm));
    assert_eq!(s.registry.pending_count(), 0);
    assert!(!s.registry.is_active(&ActorId::from("aldric")));
    assert!(!s.registry.is_active(&ActorId::from("grull")));
    assert_eq!(s.host.quarrel_results().count(), 1);
}

#[test]
fn tie_goes_to_the_initiator() {
    // 31 vs 60 → 3 hits; 12 vs 45 → 3 hits
    let mut s = session(vec![swordsman(), marsh_thing()], vec![31, 12, 55]);
    s.host.select_targets("aldric", vec![ActorRef::actor("grull")]);
    s.roll(melee("aldric")).unwrap();
    let outcome = resolved(s.roll(melee("grull")).unwrap().disposition);

    assert_eq!(outcome.net_hits, 0);
    assert!(outcome.initiator_won);
    let combat = outcome.combat.unwrap();
    assert_eq!(combat.attacker, ActorId::from("aldric"));
    assert_eq!(combat.net_damage, 1);
    assert_eq!(combat.injury.unwrap().tier, InjuryTier::Minor);
}

#[test]
fn winning_responder_strikes_back_unarmed() {
    // 60 vs 60 → 0 hits; 12 vs 45 → 3 hits; location die 40 → head
    let mut s = session(vec![swordsman(), marsh_thing()], vec![60, 12, 40]);
    s.host.select_targets("aldric", vec![ActorRef::actor("grull")]);
    s.roll(melee("aldric")).unwrap();
    let outcome = resolved(s.roll(melee("grull")).unwrap().disposition);

    assert!(!outcome.initiator_won);
    let combat = outcome.combat.unwrap();
    assert_eq!(combat.attacker, ActorId::from("grull"));
    // 1 unarmed + 3 hits - 1 soak
    assert_eq!(combat.net_damage, 3);
    assert_eq!(combat.location, BodyLocation::Head);
    assert_eq!(combat.injury.unwrap().description, "Concussion");
    assert_eq!(s.host.actor(&ActorId::from("aldric")).unwrap().injuries.len(), 1);
}

#[test]
fn resolving_twice_reports_not_found_and_changes_nothing() {
    let mut s = session(vec![swordsman(), marsh_thing()], vec![31, 42, 84]);
    s.host.select_targets("aldric", vec![ActorRef::actor("grull")]);
    s.roll(melee("aldric")).unwrap();
    let outcome = resolved(s.roll(melee("grull")).unwrap().disposition);

    let before = s.host.actor(&ActorId::from("grull")).unwrap().clone();
    let again = s.resolve_quarrel(outcome.quarrel);
    assert_eq!(again, Err(EngineError::MissingPendingData(outcome.quarrel)));
    assert_eq!(s.host.actor(&ActorId::from("grull")).unwrap(), &before);
}

#[test]
fn answer_from_unknown_actor_aborts_without_mutation() {
    let mut s = session(vec![swordsman(), marsh_thing()], vec![31]);
    s.host.select_targets("aldric", vec![ActorRef::actor("ghost")]);
    s.roll(melee("aldric")).unwrap();

    let check = s.classify_ability_roll(40, 50, 0);
    let err = s.submit(CheckRequest::flat(ActorRef::actor("ghost"), 50), check).unwrap_err();
    assert_eq!(err, EngineError::MissingActor(ActorId::from("ghost")));
    assert!(s.host.actor(&ActorId::from("aldric")).unwrap().injuries.is_empty());
    assert_eq!(s.registry.pending_count(), 1);
    assert!(s.registry.is_active(&ActorId::from("aldric")));

    // once the actor exists the same pending check can still be answered
    let mut ghost = villager();
    ghost.id = ActorId::from("ghost");
    s.host.actors.insert(ghost.id.clone(), ghost);
    let check = s.classify_ability_roll(40, 50, 0);
    let report = s.submit(CheckRequest::flat(ActorRef::actor("ghost"), 50), check).unwrap();
    assert!(matches!(report.disposition, CheckDisposition::Resolved(_)));
    assert_eq!(s.registry.pending_count(), 0);
}

/// Host whose actor documents cannot be written.
struct ReadOnlyHost(MemoryHost);

impl ActorStore for ReadOnlyHost {
    fn actor(&self, id: &ActorId) -> Option<&Actor> {
        self.0.actor(id)
    }

    fn update(&mut self, id: &ActorId, _patch: ActorPatch) -> Result<(), EngineError> {
        Err(EngineError::MissingActor(id.clone()))
    }
}

impl TargetSource for ReadOnlyHost {
    fn selected_targets(&self, actor: &ActorId) -> Vec<ActorRef> {
        self.0.selected_targets(actor)
    }
}

impl PresentationSink for ReadOnlyHost {
    fn publish_check_result(&mut self, check: &CheckResult, roller: &ActorRef) {
        self.0.publish_check_result(check, roller);
    }

    fn publish_quarrel_result(&mut self, quarrel: &Quarrel, outcome: &QuarrelOutcome) {
        self.0.publish_quarrel_result(quarrel, outcome);
    }
}

#[test]
fn failed_actor_write_still_settles_the_registry() {
    let mut host = MemoryHost::new(vec![swordsman(), marsh_thing()]);
    host.select_targets("aldric", vec![ActorRef::actor("grull")]);
    let table = default_injury_table().unwrap();
    let mut s = Session::new(ReadOnlyHost(host), Dice::from_scripted(vec![31, 42, 84]), Rules::default(), table);

    let first = s.roll(melee("aldric")).unwrap().check;
    let err = s.roll(melee("grull")).unwrap_err();
    assert_eq!(err, EngineError::MissingActor(ActorId::from("grull")));

    assert_eq!(s.registry.pending_count(), 0);
    assert!(!s.registry.is_active(&ActorId::from("aldric")));
    assert!(!s.registry.is_active(&ActorId::from("grull")));
    assert_eq!(s.reverse(first.id), Err(EngineError::CheckAlreadyResolved(first.id)));
}

#[test]
fn waiting_initiator_does_not_open_a_second_quarrel() {
    let mut s = session(vec![swordsman(), marsh_thing()], vec![31, 50]);
    s.host.select_targets("aldric", vec![ActorRef::actor("grull")]);
    s.roll(melee("aldric")).unwrap();
    let report = s.roll(melee("aldric")).unwrap();
    assert_eq!(report.disposition, CheckDisposition::Standalone);
    assert_eq!(s.registry.pending_count(), 1);
}

#[test]
fn clearing_an_actor_releases_its_pending_check() {
    let mut s = session(vec![swordsman(), marsh_thing()], vec![31, 42]);
    s.host.select_targets("aldric", vec![ActorRef::actor("grull")]);
    s.roll(melee("aldric")).unwrap();
    s.clear_actor(&ActorId::from("aldric"));
    assert_eq!(s.registry.pending_count(), 0);

    let report = s.roll(melee("grull")).unwrap();
    assert_eq!(report.disposition, CheckDisposition::Standalone);
}

#[test]
fn newer_pending_check_replaces_older_for_same_target() {
    let mut s = session(vec![swordsman(), marsh_thing(), villager()], vec![31, 45, 42, 3]);
    s.host.select_targets("aldric", vec![ActorRef::actor("grull")]);
    s.host.select_targets("wren", vec![ActorRef::actor("grull")]);
    s.roll(melee("aldric")).unwrap();
    s.roll(CheckRequest::skill(ActorRef::actor("wren"), Skill::Awareness)).unwrap();
    assert_eq!(s.registry.pending_count(), 1);

    let outcome = resolved(s.roll(melee("grull")).unwrap().disposition);
    let quarrel_initiator = outcome.log[0].split(' ').nth(1).unwrap().to_string();
    assert_eq!(quarrel_initiator, "Wren");
}

#[test]
fn token_match_beats_actor_fallback() {
    let mut s = session(vec![swordsman(), marsh_thing(), villager()], vec![31, 45, 42]);
    s.host.select_targets("aldric", vec![ActorRef::token("grull", "grull-1")]);
    s.host.select_targets("wren", vec![ActorRef::token("grull", "grull-2")]);
    s.roll(melee("aldric")).unwrap();
    s.roll(CheckRequest::skill(ActorRef::actor("wren"), Skill::Awareness)).unwrap();
    assert_eq!(s.registry.pending_count(), 2);

    let answer = CheckRequest::skill(ActorRef::token("grull", "grull-2"), Skill::Melee);
    let outcome = resolved(s.roll(answer).unwrap().disposition);
    assert!(outcome.log[0].starts_with("[QUARREL] Wren"));
    // wren's quarrel is settled; aldric's claim on grull is cleared with it
    assert_eq!(s.registry.pending_count(), 0);
}

#[test]
fn token_roller_does_not_answer_another_tokens_check() {
    let mut s = session(vec![swordsman(), marsh_thing()], vec![31, 42]);
    s.host.select_targets("aldric", vec![ActorRef::token("grull", "grull-1")]);
    s.roll(melee("aldric")).unwrap();

    let report = s.roll(CheckRequest::skill(ActorRef::token("grull", "grull-2"), Skill::Melee)).unwrap();
    assert_eq!(report.disposition, CheckDisposition::Standalone);
    assert_eq!(s.registry.pending_count(), 1);
    assert!(s.registry.find_pending(&ActorRef::token("grull", "grull-1")).is_some());
    assert!(s.registry.find_pending(&ActorRef::actor("grull")).is_some());
}

#[test]
fn token_roller_answers_check_aimed_at_its_actor() {
    let mut s = session(vec![swordsman(), marsh_thing()], vec![31, 42, 84]);
    s.host.select_targets("aldric", vec![ActorRef::actor("grull")]);
    s.roll(melee("aldric")).unwrap();
    let answer = CheckRequest::skill(ActorRef::token("grull", "grull-2"), Skill::Melee);
    assert!(matches!(s.roll(answer).unwrap().disposition, CheckDisposition::Resolved(_)));
}

#[test]
fn check_and_combat_history_is_bounded() {
    let rolls = vec![31, 32, 34, 31, 42, 84, 31, 42, 84, 31, 42, 84];
    let mut s = session(vec![swordsman(), marsh_thing()], rolls);
    s.registry = QuarrelRegistry::with_history_limit(2);

    let first = s.roll(melee("aldric")).unwrap().check;
    s.roll(melee("aldric")).unwrap();
    s.roll(melee("aldric")).unwrap();
    assert_eq!(s.reverse(first.id), Err(EngineError::UnknownCheck(first.id)));

    s.host.select_targets("aldric", vec![ActorRef::actor("grull")]);
    let mut quarrels = Vec::new();
    for _ in 0..3 {
        s.roll(melee("aldric")).unwrap();
        quarrels.push(resolved(s.roll(melee("grull")).unwrap().disposition).quarrel);
    }
    assert_eq!(s.registry.history_len(), (0, 2, 2));
    assert_eq!(
        s.relocate(quarrels[0], BodyLocation::Head),
        Err(EngineError::MissingPendingData(quarrels[0]))
    );
    assert!(s.relocate(quarrels[2], BodyLocation::Head).is_ok());
}

#[test]
fn explicit_flag_overrides_weapon_inference() {
    let mut s = session(vec![swordsman(), marsh_thing()], vec![31, 42]);
    s.host.select_targets("aldric", vec![ActorRef::actor("grull")]);
    s.roll(melee("aldric").combat(false)).unwrap();
    let outcome = resolved(s.roll(melee("grull")).unwrap().disposition);
    assert!(outcome.combat.is_none());
    assert!(s.host.actor(&ActorId::from("grull")).unwrap().injuries.is_empty());
}

#[test]
fn monster_brawl_is_a_fight_but_conversation_is_not() {
    let mut s = session(vec![villager(), marsh_thing()], vec![20, 42, 84, 20, 42]);
    s.host.select_targets("wren", vec![ActorRef::actor("grull")]);
    s.roll(CheckRequest::skill(ActorRef::actor("wren"), Skill::Brawl)).unwrap();
    let outcome = resolved(s.roll(CheckRequest::skill(ActorRef::actor("grull"), Skill::Brawl)).unwrap().disposition);
    assert!(outcome.combat.is_some());

    s.roll(CheckRequest::skill(ActorRef::actor("wren"), Skill::Awareness)).unwrap();
    let outcome = resolved(
        s.roll(CheckRequest::ability(ActorRef::actor("grull"), quarrel_engine::Ability::Intelligence))
            .unwrap()
            .disposition,
    );
    assert!(outcome.combat.is_none());
}

#[test]
fn specialization_adds_a_hit() {
    let mut s = session(vec![swordsman()], vec![31]);
    let report = s.roll(melee("aldric").with_specialization("swords")).unwrap();
    assert_eq!(report.check.hits, 4);
}

#[test]
fn relocation_costs_two_hits_once() {
    let mut s = session(vec![swordsman(), marsh_thing()], vec![31, 42, 84]);
    s.host.select_targets("aldric", vec![ActorRef::actor("grull")]);
    s.roll(melee("aldric")).unwrap();
    let outcome = resolved(s.roll(melee("grull")).unwrap().disposition);
    let original_id = outcome.combat.as_ref().unwrap().injury_id.unwrap();

    let moved = s.relocate(outcome.quarrel, BodyLocation::Head).unwrap();
    assert_eq!(moved.net_hits, 1);
    // 3 weapon + 1 hit - 2 soak
    assert_eq!(moved.net_damage, 2);
    assert_eq!(moved.location, BodyLocation::Head);
    assert_eq!(moved.injury_id, Some(original_id));
    assert_eq!(moved.injury.as_ref().unwrap().description, "Minor Concussion");

    let grull = s.host.actor(&ActorId::from("grull")).unwrap();
    assert_eq!(grull.injuries.len(), 1);
    assert_eq!(grull.injuries[0].location, InjuryLocation::Body(BodyLocation::Head));
    assert_eq!(grull.injuries[0].severity, 1);

    assert_eq!(
        s.relocate(outcome.quarrel, BodyLocation::Torso),
        Err(EngineError::AlreadyRelocated(outcome.quarrel))
    );
}

#[test]
fn relocation_needs_enough_hits() {
    let mut s = session(vec![swordsman(), marsh_thing()], vec![31, 12, 55]);
    s.host.select_targets("aldric", vec![ActorRef::actor("grull")]);
    s.roll(melee("aldric")).unwrap();
    let outcome = resolved(s.roll(melee("grull")).unwrap().disposition);
    assert!(matches!(
        s.relocate(outcome.quarrel, BodyLocation::Head),
        Err(EngineError::InsufficientResource { resource: "hits", needed: 2, available: 0 })
    ));
}
