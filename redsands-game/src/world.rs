//! Grid world model: map geometry, obstacles, minerals, and sensing.
//!
//! The grid is centered on the origin with an integer half-extent of
//! `grid_size / 2`; the rover starts at the map's `roverStart` (the center
//! in shipped maps) and north decreases `z`, matching the scene the
//! presentation layer renders.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

use crate::rover::Direction;

/// A single grid cell address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell {
    pub x: i32,
    pub z: i32,
}

impl Cell {
    #[must_use]
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }
}

/// A collectible mineral deposit. `collected` is runtime state; map data
/// normally omits it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mineral {
    pub x: i32,
    pub z: i32,
    pub value: f64,
    #[serde(default)]
    pub collected: bool,
}

/// Mission terrain as consumed from the data layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorldMap {
    pub grid_size: i32,
    #[serde(default)]
    pub obstacles: Vec<Cell>,
    #[serde(default)]
    pub minerals: Vec<Mineral>,
    pub rover_start: Cell,
    pub base_station: Cell,
}

/// Errors raised when world map invariants are violated.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WorldMapError {
    #[error("gridSize must be positive (got {got})")]
    NonPositiveGrid { got: i32 },
    #[error("{what} at ({x}, {z}) is outside the grid")]
    OutOfBounds { what: &'static str, x: i32, z: i32 },
    #[error("roverStart at ({x}, {z}) collides with an obstacle")]
    StartOnObstacle { x: i32, z: i32 },
}

/// Semantic content of a grid cell as reported by sensors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CellKind {
    Empty,
    Obstacle,
    Mineral,
    Boundary,
}

impl CellKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Empty => "EMPTY",
            Self::Obstacle => "OBSTACLE",
            Self::Mineral => "MINERAL",
            Self::Boundary => "BOUNDARY",
        }
    }
}

/// Directional sensor sweep relative to the rover's pose. Computed fresh on
/// every scan; readings are never cached across ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorReading {
    pub front: CellKind,
    pub far: CellKind,
    pub left: CellKind,
    pub right: CellKind,
}

impl SensorReading {
    /// Sweep the four sensors from `(x, z)` facing `direction`. `far` looks
    /// two cells ahead.
    #[must_use]
    pub fn sweep(map: &WorldMap, x: i32, z: i32, direction: Direction) -> Self {
        let (dx, dz) = direction.delta();
        let (lx, lz) = direction.left().delta();
        let (rx, rz) = direction.right().delta();
        Self {
            front: map.cell_kind(x + dx, z + dz),
            far: map.cell_kind(x + 2 * dx, z + 2 * dz),
            left: map.cell_kind(x + lx, z + lz),
            right: map.cell_kind(x + rx, z + rz),
        }
    }

    /// Reading for a named sensor, if the name is one of the four.
    #[must_use]
    pub fn by_name(self, name: &str) -> Option<CellKind> {
        match name {
            "front" => Some(self.front),
            "far" => Some(self.far),
            "left" => Some(self.left),
            "right" => Some(self.right),
            _ => None,
        }
    }
}

impl WorldMap {
    /// Parse a map from its JSON wire form.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed into a valid map shape.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Integer half-extent of the grid; cells are valid when both
    /// coordinates lie within `[-half, half]`.
    #[must_use]
    pub const fn half_extent(&self) -> i32 {
        self.grid_size / 2
    }

    #[must_use]
    pub const fn in_bounds(&self, x: i32, z: i32) -> bool {
        let half = self.half_extent();
        x >= -half && x <= half && z >= -half && z <= half
    }

    /// Check placement invariants.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant: non-positive grid, any
    /// placement outside the grid, or a rover start on an obstacle.
    pub fn validate(&self) -> Result<(), WorldMapError> {
        if self.grid_size <= 0 {
            return Err(WorldMapError::NonPositiveGrid {
                got: self.grid_size,
            });
        }
        for cell in &self.obstacles {
            if !self.in_bounds(cell.x, cell.z) {
                return Err(WorldMapError::OutOfBounds {
                    what: "obstacle",
                    x: cell.x,
                    z: cell.z,
                });
            }
        }
        for mineral in &self.minerals {
            if !self.in_bounds(mineral.x, mineral.z) {
                return Err(WorldMapError::OutOfBounds {
                    what: "mineral",
                    x: mineral.x,
                    z: mineral.z,
                });
            }
        }
        if !self.in_bounds(self.rover_start.x, self.rover_start.z) {
            return Err(WorldMapError::OutOfBounds {
                what: "roverStart",
                x: self.rover_start.x,
                z: self.rover_start.z,
            });
        }
        if !self.in_bounds(self.base_station.x, self.base_station.z) {
            return Err(WorldMapError::OutOfBounds {
                what: "baseStation",
                x: self.base_station.x,
                z: self.base_station.z,
            });
        }
        if self
            .obstacles
            .contains(&Cell::new(self.rover_start.x, self.rover_start.z))
        {
            return Err(WorldMapError::StartOnObstacle {
                x: self.rover_start.x,
                z: self.rover_start.z,
            });
        }
        Ok(())
    }

    /// Obstacle cells as a set for constant-time denial checks.
    #[must_use]
    pub fn obstacle_set(&self) -> HashSet<Cell> {
        self.obstacles.iter().copied().collect()
    }

    /// Index of the uncollected mineral occupying `(x, z)`, if any.
    #[must_use]
    pub fn mineral_at(&self, x: i32, z: i32) -> Option<usize> {
        self.minerals
            .iter()
            .position(|m| !m.collected && m.x == x && m.z == z)
    }

    /// Semantic content of a cell. Collected minerals read as empty.
    #[must_use]
    pub fn cell_kind(&self, x: i32, z: i32) -> CellKind {
        if !self.in_bounds(x, z) {
            CellKind::Boundary
        } else if self.obstacles.contains(&Cell::new(x, z)) {
            CellKind::Obstacle
        } else if self.mineral_at(x, z).is_some() {
            CellKind::Mineral
        } else {
            CellKind::Empty
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_map() -> WorldMap {
        WorldMap {
            grid_size: 7,
            obstacles: vec![Cell::new(1, 0)],
            minerals: vec![Mineral {
                x: 0,
                z: -1,
                value: 50.0,
                collected: false,
            }],
            rover_start: Cell::new(0, 0),
            base_station: Cell::new(2, 2),
        }
    }

    #[test]
    fn parses_camel_case_wire_form() {
        let json = r#"{
            "gridSize": 7,
            "obstacles": [{"x": 1, "z": 0}],
            "minerals": [{"x": 0, "z": -1, "value": 50}],
            "roverStart": {"x": 0, "z": 0},
            "baseStation": {"x": 2, "z": 2}
        }"#;
        let map = WorldMap::from_json(json).unwrap();
        assert_eq!(map, small_map());
        assert!(map.validate().is_ok());
    }

    #[test]
    fn bounds_are_centered_on_the_origin() {
        let map = small_map();
        assert_eq!(map.half_extent(), 3);
        assert!(map.in_bounds(3, -3));
        assert!(!map.in_bounds(4, 0));
        assert!(!map.in_bounds(0, -4));
    }

    #[test]
    fn validate_rejects_bad_placements() {
        let mut map = small_map();
        map.grid_size = 0;
        assert_eq!(
            map.validate(),
            Err(WorldMapError::NonPositiveGrid { got: 0 })
        );

        let mut map = small_map();
        map.obstacles.push(Cell::new(9, 0));
        assert_eq!(
            map.validate(),
            Err(WorldMapError::OutOfBounds {
                what: "obstacle",
                x: 9,
                z: 0
            })
        );

        let mut map = small_map();
        map.obstacles.push(Cell::new(0, 0));
        assert_eq!(
            map.validate(),
            Err(WorldMapError::StartOnObstacle { x: 0, z: 0 })
        );
    }

    #[test]
    fn sensors_see_obstacles_minerals_and_boundary() {
        let map = small_map();
        let reading = SensorReading::sweep(&map, 0, 0, Direction::North);
        assert_eq!(reading.front, CellKind::Mineral);
        assert_eq!(reading.far, CellKind::Empty);
        assert_eq!(reading.left, CellKind::Empty);
        assert_eq!(reading.right, CellKind::Obstacle);

        let at_edge = SensorReading::sweep(&map, 0, -3, Direction::North);
        assert_eq!(at_edge.front, CellKind::Boundary);
        assert_eq!(at_edge.far, CellKind::Boundary);
    }

    #[test]
    fn collected_minerals_read_as_empty() {
        let mut map = small_map();
        assert_eq!(map.cell_kind(0, -1), CellKind::Mineral);
        map.minerals[0].collected = true;
        assert_eq!(map.cell_kind(0, -1), CellKind::Empty);
        assert_eq!(map.mineral_at(0, -1), None);
    }
}
