//! Swarm Siege - headless scenario runner
//!
//! Spawns one swarm, places objectives and obstacles, runs a fixed number of
//! ticks and prints a summary (text) or the final snapshot (json).

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use swarm_siege::core::config::SimulationConfig;
use swarm_siege::core::error::Result;
use swarm_siege::core::types::Vec2;
use swarm_siege::ecs::world::World;
use swarm_siege::entity::archetype::Archetype;
use swarm_siege::environment::EnvironmentKind;
use swarm_siege::simulation::tick::SimulationEvent;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Human-readable summary
    Text,
    /// Final snapshot as pretty-printed JSON
    Json,
}

/// Headless swarm simulation
#[derive(Parser, Debug)]
#[command(name = "swarm-siege")]
#[command(about = "Run a swarm against objectives and report what happened")]
struct Args {
    /// TOML configuration file; defaults are used when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Archetype to spawn: flyer, swimmer or crawler
    #[arg(long, default_value = "flyer")]
    archetype: Archetype,

    /// Environment; defaults to the archetype's native one
    #[arg(long)]
    environment: Option<EnvironmentKind>,

    /// Number of agents to spawn
    #[arg(long, default_value_t = 200)]
    count: usize,

    /// Ticks to simulate
    #[arg(long, default_value_t = 1200)]
    ticks: u64,

    /// Time step per tick
    #[arg(long, default_value_t = 1.0 / 60.0)]
    dt: f32,

    /// Random seed (overrides the config file)
    #[arg(long)]
    seed: Option<u64>,

    /// Objective position as x,y (repeatable)
    #[arg(long, value_parser = parse_point)]
    objective: Vec<Vec2>,

    /// Obstacle as x,y,radius (repeatable)
    #[arg(long, value_parser = parse_obstacle)]
    obstacle: Vec<(Vec2, f32)>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

fn parse_numbers(s: &str, expected: usize) -> std::result::Result<Vec<f32>, String> {
    let values = s
        .split(',')
        .map(|part| part.trim().parse::<f32>().map_err(|e| format!("'{part}': {e}")))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    if values.len() != expected {
        return Err(format!("expected {expected} comma-separated numbers, got '{s}'"));
    }
    Ok(values)
}

fn parse_point(s: &str) -> std::result::Result<Vec2, String> {
    let v = parse_numbers(s, 2)?;
    Ok(Vec2::new(v[0], v[1]))
}

fn parse_obstacle(s: &str) -> std::result::Result<(Vec2, f32), String> {
    let v = parse_numbers(s, 3)?;
    Ok((Vec2::new(v[0], v[1]), v[2]))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("swarm_siege=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => SimulationConfig::load(path)?,
        None => SimulationConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.world.seed = seed;
    }

    let mut world = World::new(config)?;
    let environment = args
        .environment
        .unwrap_or_else(|| args.archetype.native_environment());
    world.spawn(args.archetype, args.count, environment)?;

    for &(position, radius) in &args.obstacle {
        world.place_obstacle(position, radius)?;
    }
    let objectives = if args.objective.is_empty() {
        vec![Vec2::new(world.width() * 0.5, world.height() * 0.5)]
    } else {
        args.objective.clone()
    };
    for position in objectives {
        world.place_objective(position)?;
    }

    let mut destroyed_at = Vec::new();
    for _ in 0..args.ticks {
        world.tick(args.dt);
        for event in world.drain_events() {
            if let SimulationEvent::ObjectiveDestroyed { objective, tick } = event {
                destroyed_at.push((objective, tick));
            }
        }
        if !world.objectives.is_empty() && world.objectives.iter().all(|o| o.destroyed) {
            tracing::info!(tick = world.current_tick, "all objectives destroyed");
            break;
        }
    }

    let snapshot = world.snapshot();
    if args.format == OutputFormat::Json {
        println!("{}", snapshot.to_json()?);
        return Ok(());
    }

    println!("=== SWARM SIEGE ===");
    println!(
        "Ticks run: {} ({:.1} time units)",
        snapshot.tick, snapshot.elapsed
    );
    println!(
        "Agents: {} flyers, {} swimmers, {} crawlers",
        snapshot.population.flyers, snapshot.population.swimmers, snapshot.population.crawlers
    );
    let aggressive = snapshot.agents.iter().filter(|a| a.aggressive).count();
    println!("Aggressive agents: {}/{}", aggressive, snapshot.agents.len());
    for objective in &snapshot.objectives {
        println!(
            "  {} at ({:.0}, {:.0}): health {:.1}/{:.0}{}",
            objective.id,
            objective.position.x,
            objective.position.y,
            objective.health,
            objective.max_health,
            if objective.destroyed { " [destroyed]" } else { "" }
        );
    }
    for (objective, tick) in &destroyed_at {
        println!("  {objective} destroyed at tick {tick}");
    }
    println!(
        "Damage dealt: {:.1}, dives: {}, surges: {}, messages delivered: {}",
        snapshot.stats.total_damage,
        snapshot.stats.dives,
        snapshot.stats.surges,
        snapshot.stats.messages_delivered
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_accepts_text_and_json() {
        let args = Args::try_parse_from(["swarm-siege", "--format", "json"]).unwrap();
        assert_eq!(args.format, OutputFormat::Json);
        let args = Args::try_parse_from(["swarm-siege"]).unwrap();
        assert_eq!(args.format, OutputFormat::Text);
    }

    #[test]
    fn test_unknown_format_is_rejected() {
        assert!(Args::try_parse_from(["swarm-siege", "--format", "yaml"]).is_err());
    }

    #[test]
    fn test_parses_points_and_obstacles() {
        let args = Args::try_parse_from([
            "swarm-siege",
            "--objective",
            "10,20",
            "--obstacle",
            "5, 6, 7",
        ])
        .unwrap();
        assert_eq!(args.objective, vec![Vec2::new(10.0, 20.0)]);
        assert_eq!(args.obstacle, vec![(Vec2::new(5.0, 6.0), 7.0)]);
        assert!(Args::try_parse_from(["swarm-siege", "--objective", "10"]).is_err());
    }
}
