use std::collections::HashMap;

use anyhow::{Context, Result};

use crate::actor::Actor;
use crate::config::Rules;
use crate::injury::InjuryTable;

pub fn builtin_injury_tables() -> HashMap<&'static str, &'static str> {
    HashMap::from([("default", include_str!("../content/injuries.json"))])
}

pub fn builtin_actors() -> HashMap<&'static str, &'static str> {
    HashMap::from([("duelists", include_str!("../content/actors/duelists.json"))])
}

pub fn builtin_rules() -> HashMap<&'static str, &'static str> {
    HashMap::from([("default", include_str!("../content/rules.yaml"))])
}

/// The injury table shipped with the engine.
pub fn default_injury_table() -> Result<InjuryTable> {
    let tables = builtin_injury_tables();
    let json = tables.get("default").context("built-in injury table missing")?;
    parse_injury_table(json)
}

/// The ruleset shipped with the engine.
pub fn default_rules() -> Result<Rules> {
    let rules = builtin_rules();
    let yaml = rules.get("default").context("built-in rules missing")?;
    Rules::from_yaml_str(yaml)
}

pub fn parse_injury_table(json: &str) -> Result<InjuryTable> {
    serde_json::from_str(json).context("failed to parse injury table JSON")
}

pub fn parse_actors(json: &str) -> Result<Vec<Actor>> {
    serde_json::from_str(json).context("failed to parse actors JSON")
}

pub fn load_actors(path: &str) -> Result<Vec<Actor>> {
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read actors JSON: {}", path))?;
    parse_actors(&data).with_context(|| format!("in {}", path))
}
