//! Timeline frames and the deterministic replay player.
//!
//! Replay trusts recorded frames verbatim: no physics is re-derived, the
//! player only re-renders. Time is an explicit millisecond clock supplied
//! by the caller, so the same frames polled on the same cadence always
//! produce the same update sequence.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::constants::{DAMAGE_FLASH_MS, REPLAY_FRAME_INTERVAL_MS};
use crate::rover::RoverState;
use crate::world::WorldMap;

/// What happened on a recorded frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MissionEvent {
    Start,
    Move,
    Turn,
    Collect,
    Collision,
    Scan,
}

/// One recorded snapshot-plus-event. Immutable once recorded; the player
/// never rewrites a frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineFrame {
    pub rover_state: RoverState,
    pub event: MissionEvent,
}

/// Parse a timeline from its JSON wire form.
///
/// # Errors
///
/// Returns an error if the JSON does not decode as an ordered frame list.
pub fn timeline_from_json(json: &str) -> Result<Vec<TimelineFrame>, serde_json::Error> {
    serde_json::from_str(json)
}

/// Serialize a timeline to its JSON wire form.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn timeline_to_json(frames: &[TimelineFrame]) -> Result<String, serde_json::Error> {
    serde_json::to_string(frames)
}

/// Presentation updates released by [`ReplayPlayer::poll`], in order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReplayUpdate {
    /// Publish this snapshot; identical in shape to a live tick snapshot.
    Snapshot(RoverState),
    /// A collected mineral disappears from the presented map.
    MineralHidden { x: i32, z: i32 },
    DamageFlashStarted,
    DamageFlashEnded,
}

#[derive(Debug, Clone, Copy)]
struct ScheduledEffect {
    due_ms: u64,
}

/// Plays a recorded timeline on a fixed inter-frame interval.
///
/// Pending visual effects (the damage-flash revert) live in an explicit
/// queue; [`ReplayPlayer::stop`] cancels everything pending, so nothing
/// fires after a stop.
#[derive(Debug, Clone)]
pub struct ReplayPlayer {
    frames: Vec<TimelineFrame>,
    map: WorldMap,
    cursor: usize,
    interval_ms: u64,
    flash_ends: VecDeque<ScheduledEffect>,
    stopped: bool,
}

impl ReplayPlayer {
    /// Player over `frames` as recorded against `map`. The first frame is
    /// due immediately.
    #[must_use]
    pub fn new(frames: Vec<TimelineFrame>, map: WorldMap) -> Self {
        Self {
            frames,
            map,
            cursor: 0,
            interval_ms: REPLAY_FRAME_INTERVAL_MS,
            flash_ends: VecDeque::new(),
            stopped: false,
        }
    }

    /// Override the frame cadence.
    #[must_use]
    pub const fn with_interval(mut self, interval_ms: u64) -> Self {
        self.interval_ms = interval_ms;
        self
    }

    /// Release every frame and scheduled effect due by `now_ms`, in
    /// chronological order. A stopped player releases nothing.
    pub fn poll(&mut self, now_ms: u64) -> Vec<ReplayUpdate> {
        let mut updates = Vec::new();
        if self.stopped {
            return updates;
        }

        loop {
            let next_frame_due = (self.cursor < self.frames.len())
                .then(|| self.cursor as u64 * self.interval_ms);
            let next_flash_due = self.flash_ends.front().map(|e| e.due_ms);

            match (next_frame_due, next_flash_due) {
                (Some(frame_due), flash) if frame_due <= now_ms => {
                    // Effects scheduled earlier fire before the frame.
                    if let Some(flash_due) = flash
                        && flash_due < frame_due
                    {
                        self.flash_ends.pop_front();
                        updates.push(ReplayUpdate::DamageFlashEnded);
                        continue;
                    }
                    self.play_frame(frame_due, &mut updates);
                }
                (_, Some(flash_due)) if flash_due <= now_ms => {
                    self.flash_ends.pop_front();
                    updates.push(ReplayUpdate::DamageFlashEnded);
                }
                _ => break,
            }
        }
        updates
    }

    fn play_frame(&mut self, due_ms: u64, updates: &mut Vec<ReplayUpdate>) {
        let frame = self.frames[self.cursor];
        self.cursor += 1;
        updates.push(ReplayUpdate::Snapshot(frame.rover_state));
        match frame.event {
            MissionEvent::Collect => {
                // Frames are trusted: hide whatever mineral sits on the
                // frame's cell, once.
                if let Some(index) = self.map.mineral_at(frame.rover_state.x, frame.rover_state.z)
                {
                    self.map.minerals[index].collected = true;
                    updates.push(ReplayUpdate::MineralHidden {
                        x: frame.rover_state.x,
                        z: frame.rover_state.z,
                    });
                }
            }
            MissionEvent::Collision => {
                updates.push(ReplayUpdate::DamageFlashStarted);
                self.flash_ends.push_back(ScheduledEffect {
                    due_ms: due_ms + DAMAGE_FLASH_MS,
                });
            }
            MissionEvent::Start
            | MissionEvent::Move
            | MissionEvent::Turn
            | MissionEvent::Scan => {}
        }
    }

    /// All frames released and no effect pending.
    #[must_use]
    pub fn finished(&self) -> bool {
        self.stopped || (self.cursor >= self.frames.len() && self.flash_ends.is_empty())
    }

    #[must_use]
    pub const fn is_stopped(&self) -> bool {
        self.stopped
    }

    #[must_use]
    pub fn frames_played(&self) -> usize {
        self.cursor
    }

    /// Idempotent; cancels every pending frame and scheduled effect.
    pub fn stop(&mut self) {
        self.stopped = true;
        self.flash_ends.clear();
    }
}
