use serde::{Deserialize, Serialize};

use crate::Dice;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Players,
    Opponents,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SideInitiative {
    pub first: Side,
    /// (players, opponents) d6 pairs in roll order; every pair but the last was a tie.
    pub rolls: Vec<(i32, i32)>,
}

/// Each side rolls a d6; ties are rolled again and the higher side acts first.
pub fn roll_side_initiative(dice: &mut Dice) -> SideInitiative {
    let mut rolls = Vec::new();
    loop {
        let players = dice.d6();
        let opponents = dice.d6();
        rolls.push((players, opponents));
        if players != opponents {
            let first = if players > opponents { Side::Players } else { Side::Opponents };
            return SideInitiative { first, rolls };
        }
    }
}
