//! Rover pose, resources, and the mission status machine.
//!
//! `RoverState` doubles as the snapshot shape published after every tick
//! and embedded in timeline frames; status strings on the wire match the
//! HUD contract (`RUNNING`, `FAULT`, `HULL_BREACH`, `FUEL_DEPLETED`).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::constants::{COLLISION_HEALTH_PENALTY, MOVE_FUEL_COST, START_FUEL, START_HEALTH};
use crate::world::Cell;

/// Cardinal facing. North decreases `z`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    North,
    South,
    East,
    West,
}

impl Direction {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::North => "north",
            Self::South => "south",
            Self::East => "east",
            Self::West => "west",
        }
    }

    /// One-cell displacement when moving forward.
    #[must_use]
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Self::North => (0, -1),
            Self::South => (0, 1),
            Self::East => (1, 0),
            Self::West => (-1, 0),
        }
    }

    #[must_use]
    pub const fn left(self) -> Self {
        match self {
            Self::North => Self::West,
            Self::West => Self::South,
            Self::South => Self::East,
            Self::East => Self::North,
        }
    }

    #[must_use]
    pub const fn right(self) -> Self {
        match self {
            Self::North => Self::East,
            Self::East => Self::South,
            Self::South => Self::West,
            Self::West => Self::North,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "north" => Ok(Self::North),
            "south" => Ok(Self::South),
            "east" => Ok(Self::East),
            "west" => Ok(Self::West),
            _ => Err(()),
        }
    }
}

/// Mission status. `Running` is the only non-terminal state; once the rover
/// leaves it, every primitive becomes a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoverStatus {
    #[default]
    Running,
    Fault,
    HullBreach,
    FuelDepleted,
}

impl RoverStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Running => "RUNNING",
            Self::Fault => "FAULT",
            Self::HullBreach => "HULL_BREACH",
            Self::FuelDepleted => "FUEL_DEPLETED",
        }
    }
}

impl fmt::Display for RoverStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Live rover state; also the published snapshot shape.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoverState {
    pub x: i32,
    pub z: i32,
    pub direction: Direction,
    pub fuel: f64,
    pub health: f64,
    pub score: f64,
    pub steps: u32,
    pub status: RoverStatus,
}

impl RoverState {
    /// Fresh rover at the mission start cell with full tanks.
    #[must_use]
    pub const fn at_start(start: Cell) -> Self {
        Self {
            x: start.x,
            z: start.z,
            direction: Direction::North,
            fuel: START_FUEL,
            health: START_HEALTH,
            score: 0.0,
            steps: 0,
            status: RoverStatus::Running,
        }
    }

    #[must_use]
    pub const fn is_running(&self) -> bool {
        matches!(self.status, RoverStatus::Running)
    }

    /// Charge the fixed per-move fuel cost and advance one cell.
    pub(crate) fn apply_move(&mut self, x: i32, z: i32) {
        self.x = x;
        self.z = z;
        self.steps += 1;
        self.fuel = (self.fuel - MOVE_FUEL_COST).max(0.0);
        self.refresh_status();
    }

    /// Charge the fixed collision penalty for a denied move.
    pub(crate) fn apply_collision(&mut self) {
        self.health = (self.health - COLLISION_HEALTH_PENALTY).max(0.0);
        self.refresh_status();
    }

    pub(crate) fn collect(&mut self, value: f64) {
        self.score += value;
    }

    /// Terminal transitions the instant a resource hits zero. Hull breach
    /// wins when both resources reach zero on the same primitive.
    fn refresh_status(&mut self) {
        if !self.is_running() {
            return;
        }
        if self.health <= 0.0 {
            self.status = RoverStatus::HullBreach;
        } else if self.fuel <= 0.0 {
            self.status = RoverStatus::FuelDepleted;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotations_cover_the_compass() {
        assert_eq!(Direction::North.right(), Direction::East);
        assert_eq!(Direction::East.right(), Direction::South);
        assert_eq!(Direction::North.left(), Direction::West);
        assert_eq!(Direction::West.left(), Direction::South);
        assert_eq!("west".parse(), Ok(Direction::West));
        assert!(Direction::from_str("up").is_err());
    }

    #[test]
    fn move_charges_fuel_and_counts_steps() {
        let mut rover = RoverState::at_start(Cell::new(0, 0));
        rover.apply_move(0, -1);
        assert_eq!((rover.x, rover.z), (0, -1));
        assert_eq!(rover.steps, 1);
        assert!((rover.fuel - (START_FUEL - MOVE_FUEL_COST)).abs() < f64::EPSILON);
        assert_eq!(rover.status, RoverStatus::Running);
    }

    #[test]
    fn fuel_depletion_is_terminal_the_instant_it_hits_zero() {
        let mut rover = RoverState::at_start(Cell::new(0, 0));
        rover.fuel = MOVE_FUEL_COST;
        rover.apply_move(0, -1);
        assert_eq!(rover.status, RoverStatus::FuelDepleted);
    }

    #[test]
    fn collisions_breach_the_hull_at_zero_health() {
        let mut rover = RoverState::at_start(Cell::new(0, 0));
        rover.health = COLLISION_HEALTH_PENALTY;
        rover.apply_collision();
        assert_eq!(rover.health, 0.0);
        assert_eq!(rover.status, RoverStatus::HullBreach);
    }

    #[test]
    fn hull_breach_wins_the_simultaneous_zero_tie_break() {
        let mut rover = RoverState::at_start(Cell::new(0, 0));
        rover.fuel = 0.0;
        rover.health = COLLISION_HEALTH_PENALTY;
        // Status is refreshed by the primitive that zeroes the second
        // resource; health and fuel are both zero afterwards.
        rover.apply_collision();
        assert_eq!(rover.status, RoverStatus::HullBreach);
    }

    #[test]
    fn terminal_status_never_regresses() {
        let mut rover = RoverState::at_start(Cell::new(0, 0));
        rover.status = RoverStatus::FuelDepleted;
        rover.health = 0.0;
        rover.apply_collision();
        assert_eq!(rover.status, RoverStatus::FuelDepleted);
    }

    #[test]
    fn snapshot_wire_form_uses_hud_contract_strings() {
        let rover = RoverState::at_start(Cell::new(0, 0));
        let json = serde_json::to_value(rover).unwrap();
        assert_eq!(json["direction"], "north");
        assert_eq!(json["status"], "RUNNING");
        assert_eq!(json["fuel"], 100.0);
    }
}
