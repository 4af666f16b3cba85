#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that solves tile maps and prints them to the terminal.

mod config;
mod render;
mod snapshot;
mod terrain;

use std::{cell::RefCell, path::PathBuf, rc::Rc, sync::Arc};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tilewave_core::CellCoord;
use tilewave_grid::Grid;
use tilewave_solver::{Solver, SolverConfig};
use tilewave_system_navigation::TravelCostField;
use tilewave_tileset::TileSet;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::{config::Scenario, snapshot::TileMapSnapshot};

const DEFAULT_WIDTH: u32 = 32;
const DEFAULT_HEIGHT: u32 = 16;
const DEFAULT_BATCH: usize = 64;

#[derive(Parser, Debug)]
#[command(name = "tilewave", about = "Wave function collapse tile map generator")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Solve a tile map and print it.
    Solve(SolveArgs),
    /// Print a tile map from a snapshot string.
    Decode(DecodeArgs),
}

#[derive(Args, Debug)]
struct SolveArgs {
    /// Scenario file; the built-in terrain is used when omitted.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Seed for the random source, overriding the scenario's.
    #[arg(long)]
    seed: Option<u64>,
    /// Grid width in cells, overriding the scenario's.
    #[arg(long)]
    width: Option<u32>,
    /// Grid height in cells, overriding the scenario's.
    #[arg(long)]
    height: Option<u32>,
    /// Steps performed between progress reports.
    #[arg(long, default_value_t = DEFAULT_BATCH)]
    batch: usize,
    /// Print a snapshot string after solving.
    #[arg(long)]
    export: bool,
    /// Print the entropy heat map after each batch.
    #[arg(long)]
    heatmap: bool,
    /// Print the glyph legend.
    #[arg(long)]
    legend: bool,
}

#[derive(Args, Debug)]
struct DecodeArgs {
    /// Snapshot string produced by `solve --export`.
    snapshot: String,
    /// Scenario whose tile set the snapshot was made with.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Command::Solve(args) => solve(args),
        Command::Decode(args) => decode(args),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn load_scenario(path: Option<&PathBuf>) -> Result<Scenario> {
    match path {
        Some(path) => config::load(path),
        None => Ok(Scenario {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            rng_seed: 0,
            solver: SolverConfig::default(),
            definitions: terrain::definitions(),
            placements: Vec::new(),
        }),
    }
}

fn solve(args: SolveArgs) -> Result<()> {
    if args.batch == 0 {
        bail!("--batch must be at least 1");
    }
    let mut scenario = load_scenario(args.config.as_ref())?;
    if let Some(width) = args.width {
        scenario.width = width;
    }
    if let Some(height) = args.height {
        scenario.height = height;
    }
    let rng_seed = args.seed.unwrap_or(scenario.rng_seed);

    let tiles = Arc::new(
        TileSet::new(scenario.definitions.clone()).context("scenario tile set is invalid")?,
    );
    let seeds = scenario.seeds(&tiles)?;
    info!(
        width = scenario.width,
        height = scenario.height,
        tiles = tiles.len(),
        seeds = seeds.len(),
        rng_seed,
        "solve_started"
    );

    let mut solver = Solver::with_tile_set(
        Arc::clone(&tiles),
        scenario.width,
        scenario.height,
        &seeds,
        scenario.solver,
        ChaCha8Rng::seed_from_u64(rng_seed),
    )
    .context("failed to set up the solver")?;

    let field = Rc::new(RefCell::new(None));
    let sink = Rc::clone(&field);
    solver.set_completion_hook(move |grid, _| {
        *sink.borrow_mut() = Some(TravelCostField::from_grid(grid));
    });

    while !solver.is_done() {
        let summary = solver
            .run_batch(args.batch)
            .context("generation gave up")?;
        info!(
            progress = %solver.progress(),
            collapsed = summary.collapsed,
            repaired = summary.repaired,
            attempts = solver.attempts(),
            "batch_finished"
        );
        if args.heatmap && !summary.done {
            print!("{}", render::heatmap(solver.grid()));
            println!();
        }
    }

    print!("{}", render::glyph_map(solver.grid()));
    if args.legend {
        println!();
        print!("{}", render::legend(solver.grid()));
    }

    if let Some(field) = field.borrow().as_ref() {
        report_crossing(field);
    }

    if args.export {
        let encoded = TileMapSnapshot::capture(solver.grid()).encode()?;
        println!("{encoded}");
    }
    Ok(())
}

fn report_crossing(field: &TravelCostField) {
    let start = CellCoord::new(0, 0);
    let goal = CellCoord::new(
        field.width().saturating_sub(1),
        field.height().saturating_sub(1),
    );
    match field.route(start, goal) {
        Some(route) => {
            let slowest = route
                .iter()
                .filter_map(|cell| field.speed_factor(*cell))
                .fold(1.0_f64, f64::min);
            info!(cells = route.len(), slowest, "route_found");
        }
        None => warn!("no_route_between_corners"),
    }
}

fn decode(args: DecodeArgs) -> Result<()> {
    let scenario = load_scenario(args.config.as_ref())?;
    let tiles = Arc::new(
        TileSet::new(scenario.definitions).context("scenario tile set is invalid")?,
    );
    let snapshot = TileMapSnapshot::decode(&args.snapshot).context("invalid snapshot")?;
    let resolved = snapshot
        .resolve(&tiles)
        .context("snapshot does not match the tile set")?;

    let mut grid = Grid::new(snapshot.columns, snapshot.rows, tiles)?;
    for (index, tile) in resolved.into_iter().enumerate() {
        let (Some(tile), Some(cell)) = (tile, grid.coord(index)) else {
            continue;
        };
        grid.collapse(cell, tile)
            .with_context(|| format!("cannot place tile at {cell}"))?;
    }
    print!("{}", render::glyph_map(&grid));
    Ok(())
}
