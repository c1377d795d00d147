use clap::Parser;
use quarrel_engine::content::{builtin_actors, load_actors, parse_actors};
use quarrel_engine::session::CheckDisposition;
use quarrel_engine::{ActorRef, CheckRequest, Dice, MemoryHost, Session, Skill};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "simulate-quarrels")]
#[command(about = "Monte Carlo sim: many melee quarrels between two actors")]
struct Args {
    /// Actors JSON (falls back to the built-in duelists)
    #[arg(long)]
    actors: Option<PathBuf>,

    #[arg(long, default_value = "aldric")]
    attacker: String,

    #[arg(long, default_value = "grull")]
    defender: String,

    /// Number of trials
    #[arg(long, default_value_t = 1000)]
    trials: u32,

    /// RNG base seed (trial i uses seed+i)
    #[arg(long, default_value_t = 12345)]
    seed: u64,
}

#[derive(Default)]
struct Tally {
    attacker_wins: u32,
    injuries: u32,
    total_damage: i64,
    severe: u32,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let actors = match &args.actors {
        Some(path) => load_actors(&path.to_string_lossy())?,
        None => {
            let builtins = builtin_actors();
            let json = builtins
                .get("duelists")
                .ok_or_else(|| anyhow::anyhow!("built-in duelists missing"))?;
            parse_actors(json)?
        }
    };

    let mut tally = Tally::default();
    for i in 0..args.trials {
        let mut host = MemoryHost::new(actors.clone());
        host.select_targets(&args.attacker, vec![ActorRef::actor(&args.defender)]);
        let mut session = Session::with_defaults(host, Dice::from_seed(args.seed + i as u64))?;

        session.roll(CheckRequest::skill(ActorRef::actor(&args.attacker), Skill::Melee).combat(true))?;
        let answer = session.roll(CheckRequest::skill(ActorRef::actor(&args.defender), Skill::Melee))?;
        let CheckDisposition::Resolved(outcome) = answer.disposition else {
            anyhow::bail!("trial {} did not resolve", i);
        };

        if outcome.initiator_won {
            tally.attacker_wins += 1;
        }
        if let Some(combat) = outcome.combat {
            tally.total_damage += combat.net_damage as i64;
            if let Some(injury) = combat.injury {
                tally.injuries += 1;
                if injury.requires_surgery {
                    tally.severe += 1;
                }
            }
        }
    }

    let n = args.trials.max(1) as f64;
    println!("trials: {}", args.trials);
    println!("{} wins: {:.1}%", args.attacker, 100.0 * tally.attacker_wins as f64 / n);
    println!("injuries: {:.1}%", 100.0 * tally.injuries as f64 / n);
    println!("severe injuries: {:.1}%", 100.0 * tally.severe as f64 / n);
    println!("mean net damage: {:.2}", tally.total_damage as f64 / n);
    Ok(())
}
