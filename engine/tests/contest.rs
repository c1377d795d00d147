use quarrel_engine::{classify, contest, HitsPolicy};

fn check(raw: i32, target: i32) -> quarrel_engine::CheckResult {
    classify(raw, target, 0, 0, HitsPolicy::Ability)
}

#[test]
fn failed_active_loses_outright() {
    let passive = check(20, 50);
    let out = contest(&check(80, 50), &passive);
    assert!(!out.success);
    assert_eq!(out.net_hits, 0);
    assert_eq!(out.margin, passive.hits);
}

#[test]
fn both_failing_leaves_no_margin() {
    let out = contest(&check(80, 50), &check(90, 40));
    assert!(!out.success);
    assert_eq!((out.net_hits, out.margin), (0, 0));
}

#[test]
fn failed_passive_hands_active_its_hits() {
    let active = check(31, 60);
    let out = contest(&active, &check(80, 50));
    assert!(out.success);
    assert_eq!(out.net_hits, 3);
    assert_eq!(out.margin, 3);
}

#[test]
fn exact_tie_goes_to_active() {
    let active = check(20, 70);
    let passive = check(30, 80);
    assert_eq!((active.hits, passive.hits), (5, 5));
    let out = contest(&active, &passive);
    assert!(out.success);
    assert_eq!(out.net_hits, 0);
}

#[test]
fn stronger_passive_wins_by_difference() {
    let out = contest(&check(42, 50), &check(12, 70));
    assert!(!out.success);
    assert_eq!(out.margin, 1 - 6);
    assert_eq!(out.net_hits, 5);
}
