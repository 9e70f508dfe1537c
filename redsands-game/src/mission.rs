//! Mission session: the tick runner and the rover API bridge.
//!
//! A [`MissionSession`] owns everything mutable for one run — the live map,
//! the rover, the compiled routine, the script context, the recorded
//! timeline, and the output log — with an explicit create → tick/run →
//! stop lifecycle. Compiled routines reach the world only through the
//! [`RoverApi`] implementation here.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;
use std::str::FromStr;

use crate::replay::{MissionEvent, TimelineFrame};
use crate::rover::{Direction, RoverState, RoverStatus};
use crate::script::{Routine, RoverApi, RuntimeFault, run};
use crate::value::{Mapping, Value};
use crate::world::{Cell, SensorReading, WorldMap, WorldMapError};

/// Live world plus recording; the rover API bridge.
#[derive(Debug, Clone)]
pub struct Mission {
    map: WorldMap,
    obstacles: HashSet<Cell>,
    rover: RoverState,
    timeline: Vec<TimelineFrame>,
    output: Vec<String>,
}

impl Mission {
    fn new(map: WorldMap) -> Self {
        let rover = RoverState::at_start(map.rover_start);
        let obstacles = map.obstacle_set();
        let mut mission = Self {
            map,
            obstacles,
            rover,
            timeline: Vec::new(),
            output: Vec::new(),
        };
        mission.record(MissionEvent::Start);
        mission
    }

    fn record(&mut self, event: MissionEvent) {
        self.timeline.push(TimelineFrame {
            rover_state: self.rover,
            event,
        });
    }
}

impl RoverApi for Mission {
    fn move_forward(&mut self) -> Result<Value, RuntimeFault> {
        if !self.rover.is_running() {
            return Ok(Value::Bool(false));
        }
        let (dx, dz) = self.rover.direction.delta();
        let (tx, tz) = (self.rover.x + dx, self.rover.z + dz);

        if !self.map.in_bounds(tx, tz) || self.obstacles.contains(&Cell::new(tx, tz)) {
            self.rover.apply_collision();
            self.record(MissionEvent::Collision);
            return Ok(Value::Bool(false));
        }

        let mineral = self.map.mineral_at(tx, tz);
        self.rover.apply_move(tx, tz);
        if let Some(index) = mineral {
            self.map.minerals[index].collected = true;
            self.rover.collect(self.map.minerals[index].value);
            self.record(MissionEvent::Collect);
        } else {
            self.record(MissionEvent::Move);
        }
        Ok(Value::Bool(true))
    }

    fn turn(&mut self, heading: &Value) -> Result<Value, RuntimeFault> {
        if !self.rover.is_running() {
            return Ok(Value::Undefined);
        }
        let name = heading.to_text().to_ascii_lowercase();
        let direction = match name.as_str() {
            "left" => self.rover.direction.left(),
            "right" => self.rover.direction.right(),
            other => Direction::from_str(other)
                .map_err(|()| RuntimeFault::UnknownTurn { name: name.clone() })?,
        };
        self.rover.direction = direction;
        self.record(MissionEvent::Turn);
        Ok(Value::Undefined)
    }

    fn scan(&mut self, sensor: &Value) -> Result<Value, RuntimeFault> {
        if !self.rover.is_running() {
            return Ok(Value::Undefined);
        }
        let name = sensor.to_text().to_ascii_lowercase();
        let reading = SensorReading::sweep(&self.map, self.rover.x, self.rover.z, self.rover.direction);
        let kind = reading
            .by_name(&name)
            .ok_or(RuntimeFault::UnknownSensor { name })?;
        self.record(MissionEvent::Scan);
        Ok(Value::str(kind.as_str()))
    }

    fn write_line(&mut self, text: &str) {
        if !self.rover.is_running() {
            return;
        }
        self.output.push(text.to_string());
    }
}

/// Result of one tick: the published snapshot plus whether the run halted.
#[derive(Debug, Clone, PartialEq)]
pub struct TickOutcome {
    pub snapshot: RoverState,
    pub halted: bool,
    pub fault: Option<RuntimeFault>,
}

/// End-of-run report for a headless mission.
#[derive(Debug, Clone, PartialEq)]
pub struct MissionSummary {
    pub ticks: u32,
    pub final_state: RoverState,
    pub output: Vec<String>,
    pub fault: Option<RuntimeFault>,
}

/// One rover program bound to one live world.
#[derive(Debug, Clone)]
pub struct MissionSession {
    routine: Routine,
    mission: Mission,
    context: Rc<RefCell<Mapping>>,
    ticks: u32,
    stopped: bool,
}

impl MissionSession {
    /// Bind a compiled routine to a validated map.
    ///
    /// # Errors
    ///
    /// Returns the map's first violated invariant.
    pub fn new(routine: Routine, map: WorldMap) -> Result<Self, WorldMapError> {
        map.validate()?;
        let mut session = Self {
            routine,
            mission: Mission::new(map),
            context: Rc::new(RefCell::new(Mapping::new())),
            ticks: 0,
            stopped: false,
        };
        session.refresh_context();
        Ok(session)
    }

    /// Run one tick: a single routine invocation, then a fresh snapshot.
    ///
    /// A fault inside the invocation is caught here — status moves to
    /// `FAULT`, the run halts, and the fault is surfaced in the outcome.
    pub fn tick(&mut self) -> TickOutcome {
        if self.stopped || !self.mission.rover.is_running() {
            return TickOutcome {
                snapshot: self.snapshot(),
                halted: true,
                fault: None,
            };
        }

        self.refresh_context();
        let context = Value::Map(Rc::clone(&self.context));
        let fault = match run(&self.routine, &context, &mut self.mission) {
            Ok(()) => None,
            Err(fault) => {
                if self.mission.rover.is_running() {
                    self.mission.rover.status = RoverStatus::Fault;
                }
                Some(fault)
            }
        };
        self.ticks += 1;

        TickOutcome {
            snapshot: self.snapshot(),
            halted: self.stopped || !self.mission.rover.is_running(),
            fault,
        }
    }

    /// Tick until the rover leaves `RUNNING`, the session is stopped, or
    /// `max_ticks` is reached.
    pub fn run(&mut self, max_ticks: u32) -> MissionSummary {
        let mut fault = None;
        while !self.stopped && self.mission.rover.is_running() && self.ticks < max_ticks {
            let outcome = self.tick();
            if outcome.fault.is_some() {
                fault = outcome.fault;
            }
            if outcome.halted {
                break;
            }
        }
        MissionSummary {
            ticks: self.ticks,
            final_state: self.snapshot(),
            output: self.mission.output.clone(),
            fault,
        }
    }

    /// Idempotent external stop signal; no tick runs afterwards.
    pub fn stop(&mut self) {
        self.stopped = true;
    }

    #[must_use]
    pub const fn is_stopped(&self) -> bool {
        self.stopped
    }

    #[must_use]
    pub const fn snapshot(&self) -> RoverState {
        self.mission.rover
    }

    #[must_use]
    pub const fn ticks(&self) -> u32 {
        self.ticks
    }

    /// Frames recorded so far; serializable as replay input.
    #[must_use]
    pub fn timeline(&self) -> &[TimelineFrame] {
        &self.mission.timeline
    }

    #[must_use]
    pub fn output(&self) -> &[String] {
        &self.mission.output
    }

    #[must_use]
    pub const fn map(&self) -> &WorldMap {
        &self.mission.map
    }

    /// Rebuild the `rover` entry of the script context from live state.
    /// Script-written keys elsewhere in the context persist across ticks.
    fn refresh_context(&mut self) {
        let rover = &self.mission.rover;
        let rover_entry = Value::map_from([
            (String::from("x"), Value::Num(f64::from(rover.x))),
            (String::from("z"), Value::Num(f64::from(rover.z))),
            (
                String::from("direction"),
                Value::str(rover.direction.as_str()),
            ),
            (String::from("fuel"), Value::Num(rover.fuel)),
            (String::from("health"), Value::Num(rover.health)),
            (String::from("score"), Value::Num(rover.score)),
            (String::from("steps"), Value::Num(f64::from(rover.steps))),
            (String::from("status"), Value::str(rover.status.as_str())),
        ]);
        let mission_entry = Value::map_from([
            (
                String::from("gridSize"),
                Value::Num(f64::from(self.mission.map.grid_size)),
            ),
            (
                String::from("baseX"),
                Value::Num(f64::from(self.mission.map.base_station.x)),
            ),
            (
                String::from("baseZ"),
                Value::Num(f64::from(self.mission.map.base_station.z)),
            ),
        ]);
        let mut context = self.context.borrow_mut();
        context.set("rover", rover_entry);
        context.set("mission", mission_entry);
    }
}
