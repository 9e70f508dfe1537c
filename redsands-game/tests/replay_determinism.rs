//! Replay behavior: trusted frames, fixed cadence, determinism, and the
//! live-run → record → replay loop.

use redsands_game::{
    MissionEvent, MissionSession, ReplayPlayer, ReplayUpdate, RoverState, TimelineFrame, WorldMap,
    compile, timeline_from_json, timeline_to_json,
};

fn replay_map() -> WorldMap {
    WorldMap::from_json(
        r#"{
            "gridSize": 9,
            "minerals": [{"x": 0, "z": -2, "value": 50}],
            "roverStart": {"x": 0, "z": 0},
            "baseStation": {"x": 3, "z": 3}
        }"#,
    )
    .unwrap()
}

fn fixture_timeline() -> Vec<TimelineFrame> {
    timeline_from_json(
        r#"[
            {"roverState": {"x": 0, "z": 0, "direction": "north", "fuel": 100.0,
                            "health": 100.0, "score": 0.0, "steps": 0, "status": "RUNNING"},
             "event": "START"},
            {"roverState": {"x": 0, "z": -1, "direction": "north", "fuel": 99.0,
                            "health": 100.0, "score": 0.0, "steps": 1, "status": "RUNNING"},
             "event": "MOVE"},
            {"roverState": {"x": 0, "z": -2, "direction": "north", "fuel": 98.0,
                            "health": 100.0, "score": 50.0, "steps": 2, "status": "RUNNING"},
             "event": "COLLECT"}
        ]"#,
    )
    .expect("fixture timeline parses")
}

fn drain(player: &mut ReplayPlayer) -> Vec<ReplayUpdate> {
    let mut updates = Vec::new();
    let mut now = 0;
    while !player.finished() {
        updates.extend(player.poll(now));
        now += 150;
    }
    updates
}

fn snapshots(updates: &[ReplayUpdate]) -> Vec<RoverState> {
    updates
        .iter()
        .filter_map(|u| match u {
            ReplayUpdate::Snapshot(s) => Some(*s),
            _ => None,
        })
        .collect()
}

#[test]
fn replayed_timeline_ends_on_the_recorded_totals() {
    let mut player = ReplayPlayer::new(fixture_timeline(), replay_map());
    let updates = drain(&mut player);
    let published = snapshots(&updates);

    assert_eq!(published.len(), 3);
    let last = published.last().unwrap();
    assert_eq!(last.score, 50.0);
    assert_eq!(last.fuel, 98.0);
    // The collect frame also hides the mineral at its coordinates.
    assert!(updates.contains(&ReplayUpdate::MineralHidden { x: 0, z: -2 }));
}

#[test]
fn frames_are_trusted_verbatim_without_physics() {
    // A frame sequence physics would never produce: fuel rises, the rover
    // teleports. The player publishes it untouched.
    let frames = timeline_from_json(
        r#"[
            {"roverState": {"x": 4, "z": 4, "direction": "west", "fuel": 10.0,
                            "health": 5.0, "score": 0.0, "steps": 9, "status": "RUNNING"},
             "event": "MOVE"},
            {"roverState": {"x": -4, "z": -4, "direction": "east", "fuel": 90.0,
                            "health": 5.0, "score": 0.0, "steps": 10, "status": "RUNNING"},
             "event": "MOVE"}
        ]"#,
    )
    .unwrap();
    let mut player = ReplayPlayer::new(frames.clone(), replay_map());
    let published = snapshots(&drain(&mut player));
    assert_eq!(published, vec![frames[0].rover_state, frames[1].rover_state]);
}

#[test]
fn double_replay_is_bit_identical() {
    let polls: Vec<u64> = (0..20).map(|i| i * 137).collect();

    let mut first = Vec::new();
    let mut player = ReplayPlayer::new(fixture_timeline(), replay_map());
    for &now in &polls {
        first.extend(player.poll(now));
    }

    let mut second = Vec::new();
    let mut player = ReplayPlayer::new(fixture_timeline(), replay_map());
    for &now in &polls {
        second.extend(player.poll(now));
    }

    assert_eq!(first, second);
}

#[test]
fn recorded_missions_replay_to_the_same_snapshots() {
    let source = r#"Do Move()
Do Move()"#;
    let mut mission = MissionSession::new(compile(source).unwrap(), replay_map()).unwrap();
    mission.tick();

    // Round-trip the recording through its wire form.
    let wire = timeline_to_json(mission.timeline()).unwrap();
    let frames = timeline_from_json(&wire).unwrap();
    assert_eq!(frames, mission.timeline());

    let mut player = ReplayPlayer::new(frames, replay_map());
    let published = snapshots(&drain(&mut player));

    // One snapshot per recorded frame, ending exactly on the live state.
    assert_eq!(published.len(), mission.timeline().len());
    assert_eq!(published.last().copied(), Some(mission.snapshot()));
    assert_eq!(
        mission.timeline().iter().map(|f| f.event).collect::<Vec<_>>(),
        [MissionEvent::Start, MissionEvent::Move, MissionEvent::Collect]
    );
}

#[test]
fn stopped_player_releases_nothing_ever_again() {
    let mut player = ReplayPlayer::new(fixture_timeline(), replay_map());
    assert!(!player.poll(0).is_empty());

    player.stop();
    player.stop();
    assert!(player.poll(u64::MAX).is_empty());
    assert_eq!(player.frames_played(), 1);
}
