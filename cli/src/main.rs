use clap::{Parser, Subcommand, ValueEnum};
use quarrel_engine::content::{builtin_actors, default_injury_table, load_actors, parse_actors};
use quarrel_engine::initiative::roll_side_initiative;
use quarrel_engine::injury::{determine_injury, determine_wound, net_damage};
use quarrel_engine::session::CheckDisposition;
use quarrel_engine::{
    checks, contest, Actor, ActorRef, BodyLocation, CheckRequest, Dice, HitsPolicy, InjuryLocation,
    MemoryHost, Rules, Session, Skill,
};
use tracing::Level;

#[derive(Copy, Clone, ValueEnum)]
enum Policy {
    Ability,
    Generic,
}

impl From<Policy> for HitsPolicy {
    fn from(p: Policy) -> Self {
        match p {
            Policy::Ability => HitsPolicy::Ability,
            Policy::Generic => HitsPolicy::Generic,
        }
    }
}

#[derive(Copy, Clone, ValueEnum)]
enum SkillArg {
    Melee,
    Brawl,
    Ranged,
}

impl From<SkillArg> for Skill {
    fn from(s: SkillArg) -> Self {
        match s {
            SkillArg::Melee => Skill::Melee,
            SkillArg::Brawl => Skill::Brawl,
            SkillArg::Ranged => Skill::Ranged,
        }
    }
}

#[derive(Subcommand)]
enum Cmd {
    /// Roll d100 several times
    Roll {
        /// RNG seed for determinism
        #[arg(long, default_value_t = 42)]
        seed: u64,
        /// Number of rolls
        #[arg(long, default_value_t = 5)]
        rolls: u32,
    },
    /// Roll a percentile check against a target
    Check {
        #[arg(long, default_value_t = 42)]
        seed: u64,
        /// Rating to roll under
        #[arg(long)]
        target: i32,
        #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
        modifier: i32,
        /// Classify an exact roll instead of drawing one
        #[arg(long)]
        raw: Option<i32>,
        #[arg(long, value_enum, default_value_t = Policy::Ability)]
        policy: Policy,
    },
    /// Opposed check: active side against passive side
    Contest {
        #[arg(long, default_value_t = 42)]
        seed: u64,
        #[arg(long)]
        active: i32,
        #[arg(long)]
        passive: i32,
    },
    /// Generate the injury for a landed hit
    Injury {
        #[arg(long)]
        weapon_damage: i32,
        #[arg(long, allow_hyphen_values = true)]
        net_hits: i32,
        #[arg(long, default_value_t = 0)]
        soak: i32,
        /// Sheet location (head, torso, rightArm, ...)
        #[arg(long, conflicts_with = "d10")]
        location: Option<String>,
        /// Alternate table: d10 wound site
        #[arg(long)]
        d10: Option<i32>,
    },
    /// Play one quarrel between two actors
    Quarrel {
        #[arg(long, default_value_t = 7)]
        seed: u64,
        /// Actors JSON file (defaults to the built-in duelists)
        #[arg(long)]
        actors: Option<String>,
        #[arg(long, default_value = "aldric")]
        attacker: String,
        #[arg(long, default_value = "grull")]
        defender: String,
        #[arg(long, value_enum, default_value_t = SkillArg::Melee)]
        skill: SkillArg,
    },
    /// Print an actor's derived sheet as JSON
    Sheet {
        #[arg(long)]
        actors: Option<String>,
        #[arg(long, default_value = "aldric")]
        actor: String,
    },
    /// Roll side-based initiative
    Initiative {
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
}

#[derive(Parser)]
#[command(name = "quarrel-cli")]
#[command(about = "Percentile quarrel engine harness")]
struct Cli {
    /// Log engine internals
    #[arg(long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    cmd: Cmd,
}

fn actors_from(path: Option<&str>) -> anyhow::Result<Vec<Actor>> {
    match path {
        Some(p) => load_actors(p),
        None => {
            let builtins = builtin_actors();
            let json = builtins
                .get("duelists")
                .ok_or_else(|| anyhow::anyhow!("built-in duelists missing"))?;
            parse_actors(json)
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::WARN })
        .with_writer(std::io::stderr)
        .init();

    match cli.cmd {
        Cmd::Roll { seed, rolls } => {
            let mut dice = Dice::from_seed(seed);
            for _ in 0..rolls {
                println!("{}", dice.d100());
            }
        }
        Cmd::Check { seed, target, modifier, raw, policy } => {
            let res = match raw {
                Some(raw) => checks::classify(raw, target, modifier, 0, policy.into()),
                None => {
                    let mut dice = Dice::from_seed(seed);
                    checks::roll_check(&mut dice, target, modifier, 0, policy.into())
                }
            };
            println!("{}", res);
        }
        Cmd::Contest { seed, active, passive } => {
            let mut dice = Dice::from_seed(seed);
            let a = checks::roll_check(&mut dice, active, 0, 0, HitsPolicy::Ability);
            let p = checks::roll_check(&mut dice, passive, 0, 0, HitsPolicy::Ability);
            let out = contest(&a, &p);
            println!("active  {}", a);
            println!("passive {}", p);
            println!(
                "{} net_hits={} margin={}",
                if out.success { "ACTIVE WINS" } else { "PASSIVE WINS" },
                out.net_hits,
                out.margin
            );
        }
        Cmd::Injury { weapon_damage, net_hits, soak, location, d10 } => {
            let table = default_injury_table()?;
            let damage = net_damage(weapon_damage, net_hits, soak);
            let record = match (location, d10) {
                (_, Some(roll)) => determine_wound(&table, roll, damage)?,
                (loc, None) => {
                    let loc: BodyLocation = loc.as_deref().unwrap_or("torso").parse()?;
                    determine_injury(&table, InjuryLocation::Body(loc), damage)
                }
            };
            match record {
                Some(r) => println!("{}", serde_json::to_string_pretty(&r)?),
                None => println!("no injury (net damage {})", damage),
            }
        }
        Cmd::Quarrel { seed, actors, attacker, defender, skill } => {
            let actors = actors_from(actors.as_deref())?;
            let mut host = MemoryHost::new(actors);
            host.select_targets(&attacker, vec![ActorRef::actor(&defender)]);
            let mut session = Session::with_defaults(host, Dice::from_seed(seed))?;

            let skill: Skill = skill.into();
            let first = session.roll(CheckRequest::skill(ActorRef::actor(&attacker), skill))?;
            println!("{} {}", attacker, first.check);
            let second = session.roll(CheckRequest::skill(ActorRef::actor(&defender), skill))?;
            println!("{} {}", defender, second.check);
            match second.disposition {
                CheckDisposition::Resolved(outcome) => {
                    for line in &outcome.log {
                        println!("{}", line);
                    }
                }
                _ => anyhow::bail!("quarrel did not resolve"),
            }
        }
        Cmd::Sheet { actors, actor } => {
            let actors = actors_from(actors.as_deref())?;
            let found = actors
                .iter()
                .find(|a| a.id.0 == actor)
                .ok_or_else(|| anyhow::anyhow!("actor '{}' not found", actor))?;
            let derived = found.derive(&Rules::default());
            println!("{}", serde_json::to_string_pretty(&derived)?);
        }
        Cmd::Initiative { seed } => {
            let mut dice = Dice::from_seed(seed);
            let init = roll_side_initiative(&mut dice);
            for (p, o) in &init.rolls {
                println!("players d6={} opponents d6={}", p, o);
            }
            println!("{:?} act first", init.first);
        }
    }
    Ok(())
}
