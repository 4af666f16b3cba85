use std::{cell::RefCell, rc::Rc};

use tilewave_core::{
    CellCoord, CellRect, CellRectSize, ConfigurationError, GridError, MetadataValue, Seed,
    SolverEvent, TileDefinition, TileId, TRAVEL_COST_KEY,
};
use tilewave_grid::query;
use tilewave_solver::{
    RepairStrategy, Solver, SolverConfig, SolverError, SolverState, StepOutcome,
};
use tilewave_system_navigation::TravelCostField;
use tilewave_tileset::authoring::rotation_family;

fn road_network() -> Vec<TileDefinition> {
    let path = |name: &str, edges: [&str; 4], weight: f64| {
        TileDefinition::from_strs(name, edges, weight)
            .with_metadata(TRAVEL_COST_KEY, MetadataValue::Number(0.0))
    };
    let mut definitions = vec![
        TileDefinition::from_strs("grass", ["ggg"; 4], 20.0)
            .with_metadata(TRAVEL_COST_KEY, MetadataValue::Number(0.25)),
        path("crossing", ["gpg"; 4], 1.0),
    ];
    for base in [
        path("straight", ["gpg", "ggg", "gpg", "ggg"], 2.0),
        path("corner", ["gpg", "gpg", "ggg", "ggg"], 2.0),
        path("junction", ["gpg", "gpg", "ggg", "gpg"], 1.0),
        path("dead_end", ["gpg", "ggg", "ggg", "ggg"], 1.0),
    ] {
        definitions.extend(rotation_family(&base));
    }
    definitions
}

fn incompatible_pair() -> Vec<TileDefinition> {
    vec![
        TileDefinition::from_strs("a", ["aa", "ab", "aa", "aa"], 1.0),
        TileDefinition::from_strs("b", ["bb"; 4], 1.0),
    ]
}

#[test]
fn single_self_compatible_tile_fills_the_grid() {
    let tiles = vec![TileDefinition::from_strs("a", ["a"; 4], 1.0)];
    let mut solver = Solver::seeded(tiles, 2, 2, &[], SolverConfig::default(), 1).expect("solver");

    let summary = solver.run_to_completion().expect("solvable");

    assert!(summary.done);
    assert_eq!(summary.collapsed, 4);
    assert!(solver.is_done());
    assert_eq!(solver.attempts(), 0);
    for y in 0..2 {
        for x in 0..2 {
            assert_eq!(solver.collapsed_at(x, y).expect("cell"), Some(TileId::new(0)));
        }
    }
    assert_eq!(solver.progress().to_string(), "4/4");
}

#[test]
fn unsatisfiable_seed_triggers_one_repair_then_hits_the_ceiling() {
    let seeds = [Seed::new(CellCoord::new(0, 0), TileId::new(0))];
    let config = SolverConfig::default().with_max_attempts(Some(1));
    let mut solver = Solver::seeded(incompatible_pair(), 2, 1, &seeds, config, 3).expect("solver");

    assert!(
        solver.possibilities_at(1, 0).expect("cell").is_empty(),
        "seeding must empty the neighbouring cell"
    );

    let first = solver.step().expect("first repair");
    assert_eq!(
        first,
        StepOutcome::Repaired {
            cell: CellCoord::new(1, 0),
            attempts: 1
        }
    );
    assert_eq!(solver.attempts(), 1);
    assert_eq!(solver.state(), SolverState::Running);
    assert_eq!(
        solver.collapsed_at(0, 0).expect("cell"),
        Some(TileId::new(0)),
        "locked seed survives the repair"
    );

    let second = solver.step().unwrap_err();
    assert_eq!(second, SolverError::Unsatisfiable { attempts: 1 });
    assert_eq!(solver.attempts(), 1);
}

#[test]
fn neighbouring_seeds_that_cannot_touch_are_rejected() {
    let tiles = vec![
        TileDefinition::from_strs("a", ["a"; 4], 1.0),
        TileDefinition::from_strs("b", ["b"; 4], 1.0),
    ];
    let seeds = [
        Seed::new(CellCoord::new(0, 0), TileId::new(0)),
        Seed::new(CellCoord::new(1, 0), TileId::new(1)),
    ];

    let error = Solver::seeded(tiles, 3, 1, &seeds, SolverConfig::default(), 0).unwrap_err();
    assert_eq!(
        error,
        SolverError::Configuration(ConfigurationError::IncompatibleSeeds {
            first: CellCoord::new(0, 0),
            second: CellCoord::new(1, 0),
        })
    );
}

#[test]
fn neighbouring_compatible_seeds_are_accepted() {
    let seeds = [
        Seed::new(CellCoord::new(1, 1), TileId::new(0)),
        Seed::new(CellCoord::new(2, 1), TileId::new(0)),
    ];
    let mut solver =
        Solver::seeded(road_network(), 4, 3, &seeds, SolverConfig::default(), 8).expect("solver");
    let _ = solver.run_to_completion().expect("solvable");
    assert!(query::incompatible_pairs(solver.grid()).is_empty());
}

#[test]
fn batch_that_collapses_the_last_cell_reports_done() {
    let tiles = vec![TileDefinition::from_strs("a", ["a"; 4], 1.0)];
    let mut solver = Solver::seeded(tiles, 3, 2, &[], SolverConfig::default(), 6).expect("solver");

    let summary = solver.run_batch(6).expect("batch");
    assert_eq!(summary.collapsed, 6);
    assert!(summary.done);
    assert!(solver.is_done());
    assert!(matches!(
        solver.drain_events().last(),
        Some(SolverEvent::GenerationCompleted { attempts: 0 })
    ));
}

#[test]
fn full_reset_strategy_also_respects_the_ceiling() {
    let seeds = [Seed::new(CellCoord::new(0, 0), TileId::new(0))];
    let config = SolverConfig::default()
        .with_repair(RepairStrategy::FullReset { reseed_count: 1 })
        .with_max_attempts(Some(3));
    let mut solver = Solver::seeded(incompatible_pair(), 2, 1, &seeds, config, 9).expect("solver");

    let error = solver.run_to_completion().unwrap_err();
    assert_eq!(error, SolverError::Unsatisfiable { attempts: 3 });
    let repairs = solver
        .drain_events()
        .into_iter()
        .filter(|event| matches!(event, SolverEvent::ContradictionRepaired { .. }))
        .count();
    assert_eq!(repairs, 3);
}

#[test]
fn solved_grid_keeps_every_invariant() {
    let mut solver =
        Solver::seeded(road_network(), 10, 8, &[], SolverConfig::default(), 2024).expect("solver");
    let _ = solver.run_to_completion().expect("road networks always close");

    let grid = solver.grid();
    grid.check_invariants().expect("collapsed cells are singletons");
    assert!(grid.is_fully_collapsed());
    assert!(query::incompatible_pairs(grid).is_empty());
    for (_, cell) in grid.iter() {
        assert_eq!(cell.entropy(), 1);
    }
    assert_eq!(solver.attempts(), 0);
}

#[test]
fn seeds_are_locked_and_kept() {
    let definitions = road_network();
    let crossing = TileId::new(1);
    let seeds = [
        Seed::new(CellCoord::new(2, 2), crossing),
        Seed::new(CellCoord::new(2, 2), crossing),
    ];
    let mut solver =
        Solver::seeded(definitions, 5, 5, &seeds, SolverConfig::default(), 5).expect("solver");
    assert_eq!(solver.progress().collapsed, 1);

    let _ = solver.run_to_completion().expect("solvable");
    assert_eq!(solver.collapsed_at(2, 2).expect("cell"), Some(crossing));
    assert!(solver
        .grid()
        .cell(CellCoord::new(2, 2))
        .expect("cell")
        .is_locked());

    let _ = solver.force_reset_all().expect("reset");
    assert_eq!(solver.progress().collapsed, 1);
    assert_eq!(solver.collapsed_at(2, 2).expect("cell"), Some(crossing));
}

#[test]
fn malformed_construction_is_rejected() {
    let config = SolverConfig::default();

    assert_eq!(
        Solver::seeded(Vec::new(), 2, 2, &[], config, 0).unwrap_err(),
        SolverError::Configuration(ConfigurationError::EmptyTileSet)
    );
    assert_eq!(
        Solver::seeded(road_network(), 0, 2, &[], config, 0).unwrap_err(),
        SolverError::Configuration(ConfigurationError::EmptyGrid {
            width: 0,
            height: 2
        })
    );

    let unknown = [Seed::new(CellCoord::new(0, 0), TileId::new(500))];
    assert_eq!(
        Solver::seeded(road_network(), 2, 2, &unknown, config, 0).unwrap_err(),
        SolverError::Configuration(ConfigurationError::UnknownTileId {
            tile: TileId::new(500)
        })
    );

    let conflicting = [
        Seed::new(CellCoord::new(1, 1), TileId::new(0)),
        Seed::new(CellCoord::new(1, 1), TileId::new(1)),
    ];
    assert_eq!(
        Solver::seeded(road_network(), 2, 2, &conflicting, config, 0).unwrap_err(),
        SolverError::Configuration(ConfigurationError::ConflictingSeeds {
            cell: CellCoord::new(1, 1)
        })
    );

    let outside = [Seed::new(CellCoord::new(4, 0), TileId::new(0))];
    assert!(matches!(
        Solver::seeded(road_network(), 2, 2, &outside, config, 0).unwrap_err(),
        SolverError::Grid(GridError::OutOfBounds { .. })
    ));

    let bad_window = config.with_repair(RepairStrategy::LocalWindow {
        width: 0,
        height: 5,
    });
    assert!(matches!(
        Solver::seeded(road_network(), 2, 2, &[], bad_window, 0).unwrap_err(),
        SolverError::Configuration(ConfigurationError::InvalidRepairWindow { .. })
    ));
}

#[test]
fn out_of_bounds_queries_are_errors() {
    let solver =
        Solver::seeded(road_network(), 3, 3, &[], SolverConfig::default(), 0).expect("solver");
    assert!(matches!(
        solver.collapsed_at(3, 0),
        Err(SolverError::Grid(GridError::OutOfBounds { .. }))
    ));
    assert!(solver.possibilities_at(0, 9).is_err());
}

#[test]
fn completion_hook_fires_once_per_transition() {
    let mut solver =
        Solver::seeded(road_network(), 6, 6, &[], SolverConfig::default(), 77).expect("solver");
    let fired = Rc::new(RefCell::new(0_u32));
    let counter = Rc::clone(&fired);
    solver.set_completion_hook(move |_, _| *counter.borrow_mut() += 1);

    let _ = solver.run_to_completion().expect("solvable");
    assert_eq!(*fired.borrow(), 1);
    assert_eq!(solver.step().expect("idle"), StepOutcome::Done);
    assert_eq!(*fired.borrow(), 1, "staying done must not fire again");

    let region = CellRect::from_origin_and_size(CellCoord::new(4, 4), CellRectSize::new(5, 5));
    let clipped = solver.force_reset_region(region).expect("reset");
    assert_eq!(clipped.size(), CellRectSize::new(2, 2));
    assert_eq!(solver.state(), SolverState::Running);
    assert_eq!(solver.collapsed_at(5, 5).expect("cell"), None);
    assert_eq!(solver.progress().collapsed, 32);

    let _ = solver.run_to_completion().expect("solvable");
    assert_eq!(*fired.borrow(), 2);
}

#[test]
fn reset_outside_the_grid_is_rejected() {
    let mut solver =
        Solver::seeded(road_network(), 3, 3, &[], SolverConfig::default(), 0).expect("solver");
    let region = CellRect::from_origin_and_size(CellCoord::new(3, 0), CellRectSize::new(2, 2));
    assert!(matches!(
        solver.force_reset_region(region),
        Err(SolverError::Grid(GridError::OutOfBounds { .. }))
    ));
}

#[test]
fn completion_hook_builds_a_navigation_field() {
    let mut solver =
        Solver::seeded(road_network(), 8, 8, &[], SolverConfig::default(), 12).expect("solver");
    let field = Rc::new(RefCell::new(None));
    let sink = Rc::clone(&field);
    solver.set_completion_hook(move |grid, _| {
        *sink.borrow_mut() = Some(TravelCostField::from_grid(grid));
    });

    let _ = solver.run_to_completion().expect("solvable");

    let field = field.borrow();
    let field = field.as_ref().expect("hook ran");
    assert_eq!((field.width(), field.height()), (8, 8));
    for (coord, cell) in solver.grid().iter() {
        let tile = cell.collapsed().expect("solved");
        let expected = if tile == TileId::new(0) { 0.25 } else { 0.0 };
        assert_eq!(field.cost(coord), Some(expected));
    }
}

#[test]
fn queries_expose_progress_and_entropy() {
    let mut solver =
        Solver::seeded(road_network(), 2, 2, &[], SolverConfig::default(), 4).expect("solver");
    assert_eq!(solver.progress().to_string(), "0/4");
    assert!(solver.entropy_map().iter().all(|value| *value == 1.0));

    let (cell, tile) = solver
        .place_random_tile()
        .expect("placement")
        .expect("open cell");
    assert_eq!(
        solver.collapsed_at(cell.column(), cell.row()).expect("cell"),
        Some(tile)
    );
    assert_eq!(solver.progress().collapsed, 1);
    assert!(solver.entropy_map().iter().any(|value| *value < 1.0));
    assert_eq!(
        solver.drain_events(),
        vec![SolverEvent::TileCollapsed { cell, tile }]
    );
    assert!(solver.drain_events().is_empty());
}
