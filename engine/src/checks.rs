//! Percentile checks: drawing, classifying and scoring a d100 roll against a target,
//! plus the opposed-check comparison used by quarrels.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Dice;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CheckId(pub Uuid);

impl CheckId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CheckId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CheckId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// How criticals and fumbles bend the hit count.
///
/// Ability and skill rolls use `Ability`: a critical is worth at least 6 hits and a
/// fumble is always exactly -6. Rolls revised after display (reverse, reroll, luck)
/// use `Generic`: a critical adds one hit with a floor of 1, a fumble subtracts one
/// with a ceiling of -1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum HitsPolicy {
    Ability,
    #[default]
    Generic,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    pub id: CheckId,
    pub raw_roll: i32,
    pub target: i32,
    pub modifier: i32,
    pub effective_target: i32,
    pub additional_hits: i32,
    pub policy: HitsPolicy,
    pub is_success: bool,
    pub is_doubles: bool,
    pub is_critical: bool,
    pub is_fumble: bool,
    pub hits: i32,
}

impl CheckResult {
    /// Same check, different raw roll. Keeps the id so pending quarrels still match it.
    pub fn with_raw_roll(&self, raw_roll: i32, policy: HitsPolicy) -> CheckResult {
        let mut next = classify(raw_roll, self.target, self.modifier, self.additional_hits, policy);
        next.id = self.id;
        next
    }

    /// Swap the tens and ones digits; 100 reverses to itself.
    pub fn reversed(&self) -> CheckResult {
        self.with_raw_roll(reverse_digits(self.raw_roll), HitsPolicy::Generic)
    }

    pub fn outcome_label(&self) -> &'static str {
        match (self.is_success, self.is_critical, self.is_fumble) {
            (true, true, _) => "CRITICAL",
            (true, false, _) => "SUCCESS",
            (false, _, true) => "FUMBLE",
            (false, _, false) => "FAIL",
        }
    }
}

impl fmt::Display for CheckResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "d100={} vs {} ({:+}) → {} hits={}",
            self.raw_roll,
            self.target,
            self.modifier,
            self.outcome_label(),
            self.hits
        )
    }
}

/// 11, 22, ..., 99. 100 never counts.
pub fn is_doubles(raw_roll: i32) -> bool {
    (1..=99).contains(&raw_roll) && raw_roll / 10 == raw_roll % 10
}

pub fn reverse_digits(raw_roll: i32) -> i32 {
    if raw_roll >= 100 {
        return raw_roll;
    }
    (raw_roll % 10) * 10 + raw_roll / 10
}

/// Draw a d100 and classify it against `target + modifier`.
pub fn roll_check(
    dice: &mut Dice,
    target: i32,
    modifier: i32,
    additional_hits: i32,
    policy: HitsPolicy,
) -> CheckResult {
    classify(dice.d100(), target, modifier, additional_hits, policy)
}

/// Classify an already-drawn raw roll. No bounds are enforced on the target.
pub fn classify(
    raw_roll: i32,
    target: i32,
    modifier: i32,
    additional_hits: i32,
    policy: HitsPolicy,
) -> CheckResult {
    let effective_target = target + modifier;
    let is_success = raw_roll <= effective_target;
    let is_doubles = is_doubles(raw_roll);
    let is_critical = is_success && (raw_roll <= 5 || is_doubles);
    let is_fumble = !is_success && (raw_roll >= 96 || is_doubles);
    CheckResult {
        id: CheckId::new(),
        raw_roll,
        target,
        modifier,
        effective_target,
        additional_hits,
        policy,
        is_success,
        is_doubles,
        is_critical,
        is_fumble,
        hits: hits(raw_roll, effective_target, is_success, is_critical, is_fumble, additional_hits, policy),
    }
}

/// Signed margin in tens between the effective target and the roll.
pub fn hits(
    raw_roll: i32,
    effective_target: i32,
    is_success: bool,
    is_critical: bool,
    is_fumble: bool,
    additional_hits: i32,
    policy: HitsPolicy,
) -> i32 {
    let target_tens = effective_target.div_euclid(10);
    let roll_tens = raw_roll.div_euclid(10);

    if is_success {
        let normal = (target_tens - roll_tens).max(0) + additional_hits;
        if !is_critical {
            return normal;
        }
        match policy {
            HitsPolicy::Ability => (normal + 1).max(6),
            HitsPolicy::Generic => (normal + 1).max(1),
        }
    } else {
        let shortfall = roll_tens - target_tens;
        let normal = if shortfall > 0 { -shortfall } else { 0 };
        if !is_fumble {
            return normal;
        }
        match policy {
            HitsPolicy::Ability => -6,
            HitsPolicy::Generic => (normal - 1).min(-1),
        }
    }
}

/// Result of an opposed check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContestOutcome {
    pub success: bool,
    pub net_hits: i32,
    pub margin: i32,
}

/// Active side against passive side. An exact tie goes to the active side.
pub fn contest(active: &CheckResult, passive: &CheckResult) -> ContestOutcome {
    if !active.is_success {
        return ContestOutcome {
            success: false,
            net_hits: 0,
            margin: if passive.is_success { passive.hits } else { 0 },
        };
    }
    if !passive.is_success {
        return ContestOutcome { success: true, net_hits: active.hits, margin: active.hits };
    }
    let margin = active.hits - passive.hits;
    ContestOutcome { success: margin >= 0, net_hits: margin.abs(), margin }
}
