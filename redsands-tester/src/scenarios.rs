//! Built-in QA scenarios: operator scripts paired with mission maps and an
//! expectation on the final status.

use redsands_game::RoverStatus;

/// One self-contained scenario runnable without external files.
pub struct Scenario {
    pub name: &'static str,
    pub description: &'static str,
    pub script: &'static str,
    pub map_json: &'static str,
    /// Status the run is expected to end in within the tick budget.
    pub expected_status: RoverStatus,
}

const SMOKE_MAP: &str = r#"{
    "gridSize": 9,
    "obstacles": [],
    "minerals": [],
    "roverStart": {"x": 0, "z": 0},
    "baseStation": {"x": 3, "z": 3}
}"#;

const PROSPECT_MAP: &str = r#"{
    "gridSize": 9,
    "obstacles": [{"x": 1, "z": -1}],
    "minerals": [
        {"x": 0, "z": -2, "value": 50},
        {"x": 0, "z": -4, "value": 25}
    ],
    "roverStart": {"x": 0, "z": 0},
    "baseStation": {"x": 3, "z": 3}
}"#;

const BOXED_IN_MAP: &str = r#"{
    "gridSize": 5,
    "obstacles": [
        {"x": 0, "z": -1}, {"x": 0, "z": 1},
        {"x": -1, "z": 0}, {"x": 1, "z": 0}
    ],
    "roverStart": {"x": 0, "z": 0},
    "baseStation": {"x": 2, "z": 2}
}"#;

const SCENARIOS: &[Scenario] = &[
    Scenario {
        name: "smoke",
        description: "Square patrol on an empty map; ends cleanly",
        script: r#"ClassMethod Patrol(ctx) {
    For leg=1:1:4 {
        Do Move()
        Do Move()
        Do Turn("right")
    }
    Write "patrol "_ctx.%Get("rover").%Get("steps")
    Quit
}"#,
        map_json: SMOKE_MAP,
        expected_status: RoverStatus::FuelDepleted,
    },
    Scenario {
        name: "prospector",
        description: "Sensor-guided mineral sweep along the north run",
        script: r#"If Scan("front")="MINERAL" {
    Do Move()
    Write "mineral collected"
}
ElseIf Scan("front")="EMPTY" {
    Do Move()
}
Else {
    Do Turn("right")
}"#,
        map_json: PROSPECT_MAP,
        expected_status: RoverStatus::FuelDepleted,
    },
    Scenario {
        name: "boxed-in",
        description: "Walled in on all sides; the hull gives out",
        script: r#"Do Move()"#,
        map_json: BOXED_IN_MAP,
        expected_status: RoverStatus::HullBreach,
    },
];

/// Look up a scenario by name.
pub fn get_scenario(name: &str) -> Option<&'static Scenario> {
    SCENARIOS.iter().find(|s| s.name == name)
}

/// All built-in scenarios in catalog order.
pub fn list_scenarios() -> &'static [Scenario] {
    SCENARIOS
}

#[cfg(test)]
mod tests {
    use super::*;
    use redsands_game::constants::DEFAULT_MAX_TICKS;
    use redsands_game::{MissionSession, WorldMap, compile};

    #[test]
    fn every_scenario_compiles_and_meets_its_expectation() {
        for scenario in list_scenarios() {
            let routine = compile(scenario.script)
                .unwrap_or_else(|e| panic!("{} script: {e}", scenario.name));
            let map = WorldMap::from_json(scenario.map_json)
                .unwrap_or_else(|e| panic!("{} map: {e}", scenario.name));
            let mut session = MissionSession::new(routine, map)
                .unwrap_or_else(|e| panic!("{} session: {e}", scenario.name));

            let summary = session.run(DEFAULT_MAX_TICKS);
            assert_eq!(
                summary.final_state.status, scenario.expected_status,
                "{} ended {:?}",
                scenario.name, summary.final_state.status
            );
        }
    }

    #[test]
    fn scenario_names_are_unique() {
        let mut names: Vec<_> = list_scenarios().iter().map(|s| s.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), list_scenarios().len());
    }
}
