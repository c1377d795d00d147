#![allow(dead_code)]

use quarrel_engine::{
    Abilities, Actor, ActorKind, Dice, Item, ItemKind, MemoryHost, Session, Skill,
};

pub fn abilities(value: i32) -> Abilities {
    Abilities {
        muscle: value,
        finesse: value,
        agility: value,
        robustness: value,
        intelligence: value,
        willpower: value,
        luck: 20,
    }
}

/// Sword (3 damage) and gambeson (1 soak), Melee 60 with a Swords specialization.
pub fn swordsman() -> Actor {
    let mut a = Actor::new("aldric", "Aldric", abilities(45))
        .with_skill(Skill::Melee, 60, &["Swords"])
        .with_skill(Skill::Ranged, 35, &[])
        .with_item(Item {
            name: "Arming sword".into(),
            kind: ItemKind::Weapon { damage: 3 },
            weight: 2,
            equipped: true,
        })
        .with_item(Item {
            name: "Gambeson".into(),
            kind: ItemKind::Armor { soak: 1 },
            weight: 3,
            equipped: true,
        });
    a.attacks_per_round = 2;
    a
}

/// Unarmed monster with 2 soak, Melee 45 and Brawl 55.
pub fn marsh_thing() -> Actor {
    let mut a = Actor::new("grull", "Grull", abilities(50))
        .with_skill(Skill::Melee, 45, &[])
        .with_skill(Skill::Brawl, 55, &[])
        .with_item(Item {
            name: "Scaled hide".into(),
            kind: ItemKind::Armor { soak: 2 },
            weight: 0,
            equipped: true,
        });
    a.kind = ActorKind::Monster;
    a
}

/// Unarmed, unarmoured character.
pub fn villager() -> Actor {
    Actor::new("wren", "Wren", abilities(40))
        .with_skill(Skill::Awareness, 50, &[])
        .with_skill(Skill::Brawl, 30, &[])
}

pub fn session(actors: Vec<Actor>, rolls: Vec<i32>) -> Session<MemoryHost> {
    Session::with_defaults(MemoryHost::new(actors), Dice::from_scripted(rolls))
        .expect("built-in content parses")
}
