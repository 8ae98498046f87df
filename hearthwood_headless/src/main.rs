// CLI entry point for running a Hearthwood colony without a renderer.
//
// Builds a `SimState` (generated from a seed, or from an ASCII map file),
// optionally replays a JSON command script against it, and runs ticks at the
// configured cadence (`tick_duration_ms`, or flat out with `--fast`).
// Notifications are logged as they happen; at the end the final colony is
// printed as an ASCII summary, or as the UI snapshot JSON with `--json`.
//
// Logs go to stderr through `tracing-subscriber`, filtered by `RUST_LOG`
// (default `info`), so `--json` output on stdout stays machine-readable.
//
// Map files use the grid legend (`.` grass, `T` tree, `#` wall, `D` door,
// `B` bed, `F` fireplace) plus `@` for a worker standing on grass. A map with
// no `@` gets one worker at its centre.
//
// Usage:
//   hearthwood-headless [OPTIONS]
//     --seed <N>            PRNG seed (default: 0)
//     --width/--height <N>  Generated world size (default: from config)
//     --ticks <N>           Ticks to run (default: 1000)
//     --config <FILE>       Partial GameConfig JSON
//     --map <FILE>          ASCII map instead of a generated world
//     --script <FILE>       JSON array of SimCommands
//     --report-every <N>    Log a status line every N ticks
//     --fast                Ignore tick_duration_ms
//     --json                Print the final snapshot as JSON

use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use hearthwood_sim::command::SimCommand;
use hearthwood_sim::config::GameConfig;
use hearthwood_sim::grid::Grid;
use hearthwood_sim::sim::SimState;
use hearthwood_sim::types::{AgentState, BuildType, Position, TileType};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "hearthwood-headless",
    version,
    about = "Run a Hearthwood colony simulation without a renderer"
)]
struct Cli {
    /// Seed for world generation, growth and spawning.
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Width of a generated world. Ignored with --map.
    #[arg(long)]
    width: Option<u32>,

    /// Height of a generated world. Ignored with --map.
    #[arg(long)]
    height: Option<u32>,

    /// Number of ticks to run.
    #[arg(long, default_value_t = 1000)]
    ticks: u64,

    /// JSON file overriding GameConfig fields.
    #[arg(long)]
    config: Option<PathBuf>,

    /// ASCII map file to start from instead of a generated world.
    #[arg(long)]
    map: Option<PathBuf>,

    /// JSON file holding an array of SimCommands.
    #[arg(long)]
    script: Option<PathBuf>,

    /// Log a status line every N ticks (0 = never).
    #[arg(long, default_value_t = 0)]
    report_every: u64,

    /// Run as fast as possible instead of pacing by tick_duration_ms.
    #[arg(long)]
    fast: bool,

    /// Print the final snapshot as JSON instead of the ASCII summary.
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    let commands = load_script(cli.script.as_deref())?;
    let mut sim = build_sim(&cli, config)?;

    info!(
        seed = cli.seed,
        width = sim.world.grid.width(),
        height = sim.world.grid.height(),
        agents = sim.world.agents.len(),
        commands = commands.len(),
        "hearthwood-headless starting"
    );

    let period = if cli.fast {
        Duration::ZERO
    } else {
        Duration::from_millis(u64::from(sim.config.tick_duration_ms))
    };
    run(&mut sim, &commands, cli.ticks, cli.report_every, period);

    if cli.json {
        println!("{}", sim.snapshot().to_json().context("failed to serialize snapshot")?);
    } else {
        print!("{}", render_summary(&sim));
    }
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<GameConfig> {
    let Some(path) = path else {
        return Ok(GameConfig::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    GameConfig::from_json(&text).with_context(|| format!("invalid config {}", path.display()))
}

fn load_script(path: Option<&Path>) -> Result<Vec<SimCommand>> {
    let Some(path) = path else {
        return Ok(Vec::new());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read script {}", path.display()))?;
    let mut commands: Vec<SimCommand> = serde_json::from_str(&text)
        .with_context(|| format!("invalid command script {}", path.display()))?;
    // Stable: commands sharing a tick keep their file order.
    commands.sort_by_key(|c| c.tick);
    Ok(commands)
}

fn build_sim(cli: &Cli, mut config: GameConfig) -> Result<SimState> {
    let mut sim = match &cli.map {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read map {}", path.display()))?;
            let (grid, agents) =
                parse_map(&text).with_context(|| format!("invalid map {}", path.display()))?;
            SimState::with_grid(cli.seed, config, grid, &agents)
        }
        None => {
            if let Some(width) = cli.width {
                config.world_size.0 = width;
            }
            if let Some(height) = cli.height {
                config.world_size.1 = height;
            }
            config.validate().context("invalid world size")?;
            SimState::with_config(cli.seed, config)
        }
    };
    sim.start();
    Ok(sim)
}

/// Split an ASCII map into a grid and worker positions. `@` marks a worker
/// on grass; with none, one worker starts at the centre (cleared to grass).
fn parse_map(text: &str) -> Result<(Grid, Vec<Position>)> {
    let mut agents = Vec::new();
    let mut layout = String::with_capacity(text.len());
    let rows = text.lines().map(str::trim).filter(|l| !l.is_empty());
    for (y, row) in rows.enumerate() {
        for (x, glyph) in row.chars().enumerate() {
            if glyph == '@' {
                agents.push(Position::new(x as i32, y as i32));
                layout.push(TileType::Grass.glyph());
            } else {
                layout.push(glyph);
            }
        }
        layout.push('\n');
    }

    let mut grid = Grid::parse(&layout)?;
    if agents.is_empty() {
        let center = Position::new((grid.width() / 2) as i32, (grid.height() / 2) as i32);
        grid.set(center, TileType::Grass);
        agents.push(center);
    }
    Ok((grid, agents))
}

/// Tick until `ticks` have elapsed or a scripted `Stop` pauses the sim.
fn run(sim: &mut SimState, commands: &[SimCommand], ticks: u64, report_every: u64, period: Duration) {
    let mut pending = commands.iter().peekable();
    let mut deadline = Instant::now();

    while sim.current_tick() < ticks {
        while let Some(cmd) = pending.next_if(|c| c.tick <= sim.current_tick()) {
            tracing::debug!(tick = cmd.tick, action = ?cmd.action, "applying scripted command");
            sim.apply_action(&cmd.action);
        }
        if !sim.running {
            info!(tick = sim.current_tick(), "simulation paused by script, stopping early");
            break;
        }

        let outcome = sim.tick();
        for notification in &outcome.notifications {
            info!(tick = notification.tick, "{}", notification.message());
        }

        if report_every > 0 && sim.current_tick() % report_every == 0 {
            info!(
                tick = sim.current_tick(),
                wood = sim.wood(),
                agents = sim.world.agents.len(),
                queued = sim.world.tasks.len(),
                trees = sim.world.grid.count(TileType::Tree),
                "status"
            );
        }

        if !period.is_zero() {
            deadline += period;
            let now = Instant::now();
            if deadline > now {
                thread::sleep(deadline - now);
            } else {
                // Fell behind; don't try to catch up with a burst.
                deadline = now;
            }
        }
    }
}

/// Final colony as text: the map with workers drawn as `@`, then totals.
fn render_summary(sim: &SimState) -> String {
    let world = &sim.world;
    let mut rows: Vec<Vec<char>> = world
        .grid
        .render()
        .lines()
        .map(|row| row.chars().collect())
        .collect();
    for agent in &world.agents {
        let cell = rows
            .get_mut(agent.position.y as usize)
            .and_then(|row| row.get_mut(agent.position.x as usize));
        if let Some(cell) = cell {
            *cell = '@';
        }
    }

    let mut out = String::new();
    for row in rows {
        out.extend(row);
        out.push('\n');
    }
    out.push('\n');
    out.push_str(&format!(
        "tick {}  wood {}  trees {}  queued tasks {}\n",
        world.tick,
        world.stock.wood(),
        world.grid.count(TileType::Tree),
        world.tasks.len()
    ));
    let structures: Vec<String> = BuildType::ALL
        .iter()
        .map(|b| format!("{} {}", b, world.grid.count(b.tile())))
        .collect();
    out.push_str(&format!("structures: {}\n", structures.join(", ")));
    for agent in &world.agents {
        let state = match agent.state {
            AgentState::Idle => "idle",
            AgentState::Moving => "moving",
            AgentState::Chopping => "chopping",
            AgentState::Building => "building",
        };
        let target = agent
            .target()
            .map_or_else(|| "-".to_string(), |t| t.to_string());
        let warm = if agent.is_warm { " (warm)" } else { "" };
        out.push_str(&format!(
            "{} at {} {state} -> {target}{warm}\n",
            agent.id, agent.position
        ));
    }
    for notification in world.notifications.iter() {
        out.push_str(&format!("[{}] {}\n", notification.tick, notification.message()));
    }
    out
}
