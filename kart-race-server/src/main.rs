//! Kart Race Server
//!
//! Runs a demo race on a circular drive line with AI drivers, then replays
//! the recorded controls and checks the state hash matches.
//!
//! Usage: `kart-race-server [config.json]`

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use kart_race::{
    VERSION, FRAME_RATE,
    game::{
        config::{KartProperties, RaceConfig, FIXED_FRAME_DT},
        events::KartEventData,
        input::{ControlFrame, ControlRecording},
        kart::KartState,
        moveable::wrap_degrees,
        pickup::{PickupField, PickupKind},
        race::{replay_race, Race},
        track::{DriveLine, Track},
    },
};

/// Track radius of the demo circuit (m).
const TRACK_RADIUS: f32 = 40.0;

/// Centerline points of the demo circuit.
const TRACK_SEGMENTS: usize = 64;

/// Karts on the grid.
const NUM_KARTS: usize = 4;

/// Give up after this many frames (three minutes).
const MAX_FRAMES: u64 = 180 * FRAME_RATE as u64;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    info!("Kart Race Server v{}", VERSION);

    let config = match std::env::args().nth(1) {
        Some(path) => {
            let json = std::fs::read_to_string(&path)
                .with_context(|| format!("reading config {path}"))?;
            RaceConfig::from_json_str(&json).with_context(|| format!("parsing config {path}"))?
        }
        None => RaceConfig { seed: 12345, ..Default::default() },
    };
    info!("Laps: {}, seed: {}, frame rate: {} Hz", config.num_laps, config.seed, FRAME_RATE);

    demo_race(config)
}

fn demo_track() -> Result<DriveLine> {
    Ok(DriveLine::circle(TRACK_RADIUS, TRACK_SEGMENTS)?)
}

fn demo_pickups(track: &DriveLine) -> PickupField {
    let mut field = PickupField::new();
    let kinds = [PickupKind::Common, PickupKind::Rare, PickupKind::Offensive, PickupKind::Penalty];
    for (n, hint) in (4..TRACK_SEGMENTS).step_by(6).enumerate() {
        field.add(track.track_to_spatial(hint), kinds[n % kinds.len()]);
    }
    field
}

fn demo_grid() -> Vec<KartProperties> {
    (0..NUM_KARTS)
        .map(|i| KartProperties {
            ident: format!("kart-{i}"),
            max_power: 2600.0 + 150.0 * i as f32,
            ..Default::default()
        })
        .collect()
}

/// Follow the centerline a few segments ahead.
fn drive_ai(kart: &KartState, track: &DriveLine, frame: u64) -> ControlFrame {
    let target = track.track_to_spatial(kart.track_hint + 3);
    let desired = (target - kart.position.xyz).heading();
    let error = wrap_degrees(desired - kart.position.hpr.x);
    let steer = (-error / 30.0).clamp(-1.0, 1.0);

    let mut input = ControlFrame::driving(200, (steer * 127.0) as i8);
    let fire_slot = (kart.grid_position as u64 * 37) % 240;
    if frame % 240 == fire_slot {
        input.set_flag(ControlFrame::FLAG_FIRE, true);
    }
    input
}

fn demo_race(config: RaceConfig) -> Result<()> {
    info!("=== Starting Demo Race ===");

    let track = demo_track()?;
    let pickups = demo_pickups(&track);
    info!("Track length: {:.1} m, {} pickups", track.lap_length(), pickups.present_count());

    let mut race = Race::new(track.clone(), pickups.clone(), config.clone(), demo_grid())?;
    race.start()?;

    let mut recordings = vec![ControlRecording::new(); NUM_KARTS];
    let mut skid_events = 0usize;

    while race.frame() < MAX_FRAMES && !race.is_finished() {
        let frame = race.frame();
        for (i, recording) in recordings.iter_mut().enumerate() {
            let Some(kart) = race.kart(i) else {
                continue;
            };
            let input = drive_ai(kart, &track, frame);
            recording.record(frame, input);
            race.set_controls(i, input.to_controls());
        }

        let result = race.update(FIXED_FRAME_DT);

        for event in &result.events {
            if event.is_skid() {
                skid_events += 1;
                continue;
            }
            match &event.data {
                KartEventData::LapChanged { lap, delta } if *delta > 0 => {
                    info!("Frame {}: kart {} starts lap {}", event.frame, event.kart, lap + 1);
                }
                KartEventData::LapChanged { lap, .. } => {
                    warn!("Frame {}: kart {} crossed the line backwards (lap {})", event.frame, event.kart, lap);
                }
                KartEventData::Crashed { speed } => {
                    info!("Frame {}: kart {} crashed at {:.1} m/s", event.frame, event.kart, speed);
                }
                KartEventData::ZipperStarted => {
                    info!("Frame {}: kart {} zipper", event.frame, event.kart);
                }
                _ => {}
            }
        }

        if result.race_finished {
            info!("Race finished at frame {}", result.frame);
        }
    }

    info!("=== Race Results ===");
    for grid_position in race.standings() {
        if let Some(kart) = race.kart(grid_position) {
            info!(
                "#{}: {} (lap {}, {:.1} m, {} pickups)",
                kart.race_position,
                kart.properties().ident,
                kart.race_lap,
                kart.distance_down_track(),
                kart.num_pickups_gobbled,
            );
        }
    }
    info!("Skid events: {}", skid_events);

    let hash = race.compute_hash();
    info!("Final State Hash: {}", hex::encode(hash));

    info!("=== Verifying Determinism ===");
    let (replayed, _) = replay_race(track, pickups, config, demo_grid(), &recordings, race.frame())?;
    let replay_hash = replayed.compute_hash();
    info!("Replay State Hash: {}", hex::encode(replay_hash));

    if hash == replay_hash {
        info!("DETERMINISM VERIFIED: Hashes match!");
    } else {
        warn!("DETERMINISM FAILURE: Hashes differ!");
    }
    Ok(())
}
