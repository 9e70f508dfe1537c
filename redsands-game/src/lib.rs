//! Redsands Mission Engine
//!
//! Platform-agnostic core for the Redsands rover mission game: compiles
//! operator scripts written in a small ObjectScript-flavored control
//! language, runs them tick by tick against a deterministic grid world,
//! and replays recorded timelines. This crate provides all mission
//! mechanics without UI or platform-specific dependencies; rendering and
//! HUD layers consume the published snapshots.

pub mod constants;
pub mod mission;
pub mod replay;
pub mod rover;
pub mod script;
pub mod value;
pub mod world;

// Re-export commonly used types
pub use mission::{MissionSession, MissionSummary, TickOutcome};
pub use replay::{
    MissionEvent, ReplayPlayer, ReplayUpdate, TimelineFrame, timeline_from_json, timeline_to_json,
};
pub use rover::{Direction, RoverState, RoverStatus};
pub use script::{
    CompileError, GenerateError, Routine, RoverApi, RuntimeFault, SyntaxError, compile,
};
pub use value::{Mapping, Value};
pub use world::{Cell, CellKind, Mineral, SensorReading, WorldMap, WorldMapError};

/// Trait for abstracting mission map loading.
/// Platform-specific implementations should provide this.
pub trait MapLoader {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load a world map by mission name.
    ///
    /// # Errors
    ///
    /// Returns an error if the map cannot be loaded or parsed.
    fn load_map(&self, mission: &str) -> Result<WorldMap, Self::Error>;
}

/// Front door binding a map source to the compile-and-run pipeline.
pub struct MissionEngine<L>
where
    L: MapLoader,
{
    loader: L,
}

impl<L> MissionEngine<L>
where
    L: MapLoader,
{
    /// Create a new engine over the provided map loader.
    pub const fn new(loader: L) -> Self {
        Self { loader }
    }

    /// Compile operator script source without starting a session.
    ///
    /// # Errors
    ///
    /// Returns an error if the script fails validation or generation.
    pub fn compile(&self, source: &str) -> Result<Routine, CompileError> {
        script::compile(source)
    }

    /// Load a mission map and bind a freshly compiled script to it.
    ///
    /// # Errors
    ///
    /// Returns an error if the map cannot be loaded, the script does not
    /// compile, or the map violates a placement invariant.
    pub fn start_mission(
        &self,
        mission: &str,
        source: &str,
    ) -> Result<MissionSession, anyhow::Error>
    where
        L::Error: Into<anyhow::Error>,
    {
        let map = self.loader.load_map(mission).map_err(Into::into)?;
        let routine = script::compile(source)?;
        Ok(MissionSession::new(routine, map)?)
    }
}
