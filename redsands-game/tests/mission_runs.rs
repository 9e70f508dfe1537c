//! Full mission runs against the live world: movement, collection,
//! resource depletion, faults, and the stop lifecycle.

use redsands_game::constants::{COLLISION_HEALTH_PENALTY, START_FUEL, START_HEALTH};
use redsands_game::{
    Cell, CellKind, MissionEvent, MissionSession, Mineral, RoverStatus, RuntimeFault, WorldMap,
    WorldMapError, compile,
};

fn survey_map() -> WorldMap {
    WorldMap::from_json(
        r#"{
            "gridSize": 9,
            "obstacles": [{"x": 1, "z": 0}, {"x": -1, "z": 0}],
            "minerals": [{"x": 0, "z": -1, "value": 50}],
            "roverStart": {"x": 0, "z": 0},
            "baseStation": {"x": 3, "z": 3}
        }"#,
    )
    .expect("fixture map parses")
}

fn session(source: &str, map: WorldMap) -> MissionSession {
    MissionSession::new(compile(source).expect("compiles"), map).expect("valid map")
}

#[test]
fn moving_onto_a_mineral_collects_and_hides_it() {
    let mut mission = session(
        r#"Do Move()
Write Scan("front")"#,
        survey_map(),
    );
    let outcome = mission.tick();

    // The mineral at (0, -1) is collected on entry and scored.
    assert_eq!((outcome.snapshot.x, outcome.snapshot.z), (0, -1));
    assert_eq!(outcome.snapshot.score, 50.0);
    assert_eq!(mission.map().cell_kind(0, -1), CellKind::Empty);
    assert!(
        mission
            .timeline()
            .iter()
            .any(|f| f.event == MissionEvent::Collect)
    );

    // Re-entering the cell later finds nothing to collect.
    let mut mission = session(
        r#"Do Move()
Do Turn("south")
Do Move()
Do Turn("north")
Do Move()"#,
        survey_map(),
    );
    let outcome = mission.tick();
    assert_eq!(outcome.snapshot.score, 50.0);
}

#[test]
fn sensors_report_empty_after_collection() {
    // Collect the mineral at (0, -1), back off, and scan the same cell.
    let mut mission = session(
        r#"Do Move()
Do Turn("south")
Do Move()
Do Turn("north")
Write Scan("front")"#,
        survey_map(),
    );
    let outcome = mission.tick();
    assert_eq!(outcome.snapshot.score, 50.0);
    assert_eq!(mission.output(), [String::from("EMPTY")]);
}

#[test]
fn boundary_and_obstacle_moves_are_denied_with_damage() {
    // Obstacle to the east.
    let mut mission = session(
        r#"Do Turn("east")
Do Move()"#,
        survey_map(),
    );
    let outcome = mission.tick();
    assert_eq!((outcome.snapshot.x, outcome.snapshot.z), (0, 0));
    assert_eq!(outcome.snapshot.health, START_HEALTH - COLLISION_HEALTH_PENALTY);
    assert_eq!(outcome.snapshot.fuel, START_FUEL);

    // Boundary at the grid edge: half-extent of a 9-grid is 4.
    let mut map = survey_map();
    map.rover_start = Cell::new(0, -4);
    let mut mission = session("Do Move()", map);
    let outcome = mission.tick();
    assert_eq!((outcome.snapshot.x, outcome.snapshot.z), (0, -4));
    assert_eq!(
        mission.timeline().last().map(|f| f.event),
        Some(MissionEvent::Collision)
    );
}

#[test]
fn repeated_collisions_breach_the_hull() {
    let mut mission = session(
        r#"Do Turn("east")
Do Move()"#,
        survey_map(),
    );
    let summary = mission.run(1_000);

    assert_eq!(summary.final_state.status, RoverStatus::HullBreach);
    assert_eq!(summary.final_state.health, 0.0);
    // START_HEALTH / COLLISION_HEALTH_PENALTY collisions, one per tick
    // after the first turn.
    let expected_ticks = (START_HEALTH / COLLISION_HEALTH_PENALTY) as u32;
    assert_eq!(summary.ticks, expected_ticks);
}

#[test]
fn fuel_runs_dry_with_the_matching_status() {
    let map = WorldMap::from_json(
        r#"{
            "gridSize": 5,
            "roverStart": {"x": 0, "z": 0},
            "baseStation": {"x": 1, "z": 1}
        }"#,
    )
    .unwrap();
    let mut mission = session(
        r#"Do Move()
Do Turn("south")
Do Move()
Do Turn("north")"#,
        map,
    );
    let summary = mission.run(10_000);
    assert_eq!(summary.final_state.status, RoverStatus::FuelDepleted);
    assert_eq!(summary.final_state.fuel, 0.0);
}

#[test]
fn runtime_faults_are_contained_to_the_session() {
    let mut mission = session(r#"Write context.%Get("rover").%Get("x").%Get("oops")"#, survey_map());
    let outcome = mission.tick();
    assert_eq!(outcome.fault, Some(RuntimeFault::NotAMapping));
    assert_eq!(outcome.snapshot.status, RoverStatus::Fault);
    assert!(outcome.halted);

    // The same map seeds a fresh session for a retry.
    let mut retry = session("Do Move()", survey_map());
    let outcome = retry.tick();
    assert_eq!(outcome.snapshot.status, RoverStatus::Running);
}

#[test]
fn stop_cancels_before_the_next_tick_and_stays_stopped() {
    let mut mission = session("Do Move()", survey_map());
    mission.tick();
    mission.stop();
    mission.stop();

    let outcome = mission.tick();
    assert!(outcome.halted);
    assert_eq!(mission.ticks(), 1);
}

#[test]
fn invalid_maps_never_start() {
    let mut map = survey_map();
    map.minerals.push(Mineral {
        x: 40,
        z: 0,
        value: 10.0,
        collected: false,
    });
    let err = MissionSession::new(compile("Quit").unwrap(), map).unwrap_err();
    assert_eq!(
        err,
        WorldMapError::OutOfBounds {
            what: "mineral",
            x: 40,
            z: 0
        }
    );
}

#[test]
fn autopilot_scripts_steer_by_sensor() {
    // Turn away from whatever blocks the path; otherwise roll forward.
    let source = r#"
If Scan("front")="OBSTACLE" {
    Do Turn("right")
}
ElseIf Scan("front")="BOUNDARY" {
    Do Turn("right")
}
Else {
    Do Move()
}
"#;
    let mut map = survey_map();
    map.obstacles = vec![Cell::new(0, -2)];
    map.minerals = vec![];
    let mut mission = session(source, map);
    let summary = mission.run(12);

    // One step north, a right turn at the obstacle, then eastward travel
    // until the boundary turn; the rover never takes damage.
    assert_eq!(summary.final_state.health, START_HEALTH);
    assert!(summary.final_state.steps > 1);
    assert_eq!(summary.final_state.status, RoverStatus::Running);
}
