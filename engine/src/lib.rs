use std::collections::VecDeque;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

pub mod actor;
pub mod checks;
pub mod conditions;
pub mod config;
pub mod content;
pub mod error;
pub mod host;
pub mod initiative;
pub mod injury;
pub mod location;
pub mod quarrel;
pub mod session;

pub use actor::{Ability, Abilities, Actor, ActorFlags, ActorId, ActorKind, DerivedStats, Item, ItemKind, Skill, SkillRating};
pub use checks::{classify, contest, hits, CheckId, CheckResult, ContestOutcome, HitsPolicy};
pub use conditions::{ConditionKind, ConditionValues, Defeat};
pub use config::Rules;
pub use error::EngineError;
pub use host::{ActorPatch, ActorRef, ActorStore, Host, MemoryHost, PresentationSink, TargetSource};
pub use injury::{Injury, InjuryId, InjuryLocation, InjuryRecord, InjuryTier};
pub use location::{BodyLocation, WoundSite};
pub use quarrel::{Quarrel, QuarrelId, QuarrelOutcome, QuarrelRegistry};
pub use session::{CheckKind, CheckRequest, Session};

/// Source of die rolls. Scripted values are handed out first, then the seeded generator takes over.
pub struct Dice {
    rng: ChaCha8Rng,
    script: VecDeque<i32>,
}

impl Dice {
    pub fn from_seed(seed: u64) -> Self {
        Self { rng: ChaCha8Rng::seed_from_u64(seed), script: VecDeque::new() }
    }

    /// Dice that return `rolls` in order, regardless of die size.
    pub fn from_scripted(rolls: Vec<i32>) -> Self {
        Self { rng: ChaCha8Rng::seed_from_u64(0), script: rolls.into() }
    }

    fn roll(&mut self, sides: i32) -> i32 {
        match self.script.pop_front() {
            Some(v) => v,
            None => self.rng.gen_range(1..=sides),
        }
    }

    pub fn d100(&mut self) -> i32 {
        self.roll(100)
    }

    pub fn d10(&mut self) -> i32 {
        self.roll(10)
    }

    pub fn d6(&mut self) -> i32 {
        self.roll(6)
    }
}

/// Bonus of a 0–100 rating = floor(value / 10).
pub fn rating_bonus(value: i32) -> i32 {
    // `div_euclid` with positive divisor matches mathematical floor division.
    value.div_euclid(10)
}
