//! Bounce Cubes entry point
//!
//! Headless run: scatter cubes over a ground plane, tick a fixed number of
//! frames and print a JSON summary.
//!
//! Usage: `bounce-cubes [settings.json] [--cubes N] [--frames F] [--seed S]`

use std::process::ExitCode;
use std::sync::Arc;

use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::Serialize;

use bounce_cubes::sim::{BounceSimulation, GroundPlane, GroundProximity, TransformArray};
use bounce_cubes::{Settings, SimError};

/// Command line options
struct Options {
    settings_path: Option<String>,
    cubes: usize,
    frames: u64,
    seed: u64,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            settings_path: None,
            cubes: 100,
            frames: 600,
            seed: 12345,
        }
    }
}

impl Options {
    fn parse(mut args: impl Iterator<Item = String>) -> Result<Self, String> {
        let mut options = Self::default();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--cubes" => options.cubes = parse_value(&arg, args.next())?,
                "--frames" => options.frames = parse_value(&arg, args.next())?,
                "--seed" => options.seed = parse_value(&arg, args.next())?,
                flag if flag.starts_with("--") => return Err(format!("unknown flag {}", flag)),
                path => options.settings_path = Some(path.to_string()),
            }
        }
        Ok(options)
    }
}

fn parse_value<T: std::str::FromStr>(flag: &str, value: Option<String>) -> Result<T, String> {
    let value = value.ok_or_else(|| format!("{} needs a value", flag))?;
    value
        .parse()
        .map_err(|_| format!("invalid value for {}: {}", flag, value))
}

/// What the run looked like, printed as JSON
#[derive(Serialize)]
struct Summary {
    cubes: usize,
    frames: u64,
    near_frames: u64,
    proximity_changes: u64,
    final_proximity: GroundProximity,
    heights: Vec<f32>,
    velocities: Vec<f32>,
}

/// Lay cubes out on a grid with seeded random drop heights
fn scatter(count: usize, seed: u64) -> TransformArray {
    let mut rng = Pcg32::seed_from_u64(seed);
    let side = (count as f32).sqrt().ceil().max(1.0) as usize;
    TransformArray::new((0..count).map(|i| {
        let x = (i % side) as f32 * 1.5;
        let z = (i / side) as f32 * 1.5;
        Vec3::new(x, rng.random_range(2.0..20.0), z)
    }))
}

fn run(options: &Options) -> Result<Summary, SimError> {
    let settings = match &options.settings_path {
        Some(path) => Settings::load_or_default(path)?,
        None => Settings::default(),
    };

    let transforms = Arc::new(scatter(options.cubes, options.seed));
    let mut sim = BounceSimulation::with_scene(settings, GroundPlane::horizontal(0.0))?;
    let display = sim.signal();
    sim.activate(transforms.clone())?;

    let mut near_frames = 0;
    let mut proximity_changes = 0;
    let mut last = display.get();
    for _ in 0..options.frames {
        sim.tick()?;
        let proximity = display.get();
        if proximity.is_near() {
            near_frames += 1;
        }
        if proximity != last {
            proximity_changes += 1;
            last = proximity;
        }
    }

    let velocities = sim.velocities()?;
    sim.deactivate()?;

    Ok(Summary {
        cubes: options.cubes,
        frames: options.frames,
        near_frames,
        proximity_changes,
        final_proximity: last,
        heights: transforms.world_positions().iter().map(|p| p.y).collect(),
        velocities,
    })
}

fn main() -> ExitCode {
    env_logger::init();
    log::info!("Bounce Cubes (headless) starting...");

    let options = match Options::parse(std::env::args().skip(1)) {
        Ok(options) => options,
        Err(err) => {
            eprintln!("{}", err);
            eprintln!("usage: bounce-cubes [settings.json] [--cubes N] [--frames F] [--seed S]");
            return ExitCode::from(2);
        }
    };

    match run(&options) {
        Ok(summary) => {
            match serde_json::to_string_pretty(&summary) {
                Ok(json) => println!("{}", json),
                Err(err) => log::warn!("Failed to encode summary: {}", err),
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            log::error!("Run failed: {}", err);
            ExitCode::FAILURE
        }
    }
}
