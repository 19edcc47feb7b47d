//! ballista-probe: fire one shot from a JSON preset and print what happens.
//!
//! Usage:
//!   ballista-probe predict --definition slug.json --scene range.json --direction 0,0,1
//!   ballista-probe run --definition slug.json --scene range.json --ticks 120

use std::fs;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use glam::DVec3;
use serde::Serialize;

use ballista_core::events::ProjectileEvent;
use ballista_core::material::Atmosphere;
use ballista_core::types::EmitterId;
use ballista_sim::definition::ProjectileDefinition;
use ballista_sim::projectile::{LaunchRequest, SeekTarget};
use ballista_sim::scene::BoxScene;
use ballista_sim::systems::snapshot::EmitterSnapshot;
use ballista_sim::{Emitter, EmitterConfig};

#[derive(Parser)]
#[command(name = "ballista-probe")]
#[command(about = "Inspect projectile presets against a box scene", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Dry-run one shot until it dies and print the predicted path
    Predict {
        #[command(flatten)]
        shot: ShotArgs,

        /// Include every resolve step, not just the final state
        #[arg(long)]
        full: bool,
    },

    /// Launch one live shot and tick the emitter
    Run {
        #[command(flatten)]
        shot: ShotArgs,

        /// Number of ticks to run
        #[arg(long, default_value_t = 300)]
        ticks: u32,
    },
}

#[derive(Args)]
struct ShotArgs {
    /// Projectile definition (JSON)
    #[arg(long)]
    definition: String,

    /// Box scene (JSON); empty space when omitted
    #[arg(long)]
    scene: Option<String>,

    /// Launch position as x,y,z
    #[arg(long, default_value = "0,0,0", value_parser = parse_vec3)]
    origin: DVec3,

    /// Launch direction as x,y,z
    #[arg(long, default_value = "0,0,1", value_parser = parse_vec3)]
    direction: DVec3,

    /// Point to seek, as x,y,z
    #[arg(long, value_parser = parse_vec3)]
    seek: Option<DVec3>,

    /// RNG seed for ricochet scatter
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Disable air drag
    #[arg(long)]
    vacuum: bool,
}

fn parse_vec3(s: &str) -> std::result::Result<DVec3, String> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    if parts.len() != 3 {
        return Err(format!("expected x,y,z, got '{s}'"));
    }
    let mut v = [0.0; 3];
    for (slot, part) in v.iter_mut().zip(&parts) {
        *slot = part.parse().map_err(|_| format!("'{part}' is not a number"))?;
    }
    Ok(DVec3::from_array(v))
}

struct Setup {
    emitter: Emitter,
    scene: BoxScene,
    request: LaunchRequest,
}

fn setup(shot: &ShotArgs) -> Result<Setup> {
    let definition = ProjectileDefinition::load(&shot.definition)
        .with_context(|| format!("Failed to load definition: {}", shot.definition))?;
    let scene = match &shot.scene {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("Failed to read scene: {path}"))?;
            BoxScene::from_json(&text).with_context(|| format!("Failed to parse scene: {path}"))?
        }
        None => BoxScene::new(),
    };

    let config = EmitterConfig {
        seed: shot.seed,
        atmosphere: if shot.vacuum { Atmosphere::vacuum() } else { Atmosphere::default() },
        ..Default::default()
    };
    let emitter = Emitter::new(EmitterId(0), config).with_definition(Arc::new(definition));

    let mut request = LaunchRequest::new(shot.origin, shot.direction);
    if let Some(point) = shot.seek {
        request.seek = SeekTarget::Point(point);
    }
    Ok(Setup { emitter, scene, request })
}

#[derive(Serialize)]
struct RunReport {
    ticks: u32,
    events: Vec<ProjectileEvent>,
    last: EmitterSnapshot,
}

fn predict(shot: &ShotArgs, full: bool) -> Result<()> {
    let Setup { emitter, scene, request } = setup(shot)?;
    let prediction = emitter.predict(request, &scene, &scene.materials(), full)?;

    let json = if full {
        let views: Vec<_> = prediction
            .steps
            .iter()
            .map(ballista_sim::systems::snapshot::ProjectileView::from)
            .collect();
        serde_json::to_string_pretty(&views)?
    } else {
        serde_json::to_string_pretty(&prediction.report())?
    };
    println!("{json}");
    Ok(())
}

fn run(shot: &ShotArgs, ticks: u32) -> Result<()> {
    let Setup {
        mut emitter,
        scene,
        request,
    } = setup(shot)?;
    let materials = scene.materials();
    emitter.launch(request)?;

    let mut events = Vec::new();
    let mut ran = 0;
    while ran < ticks && !emitter.is_empty() {
        events.extend(emitter.tick(&scene, &materials));
        ran += 1;
    }

    let report = RunReport {
        ticks: ran,
        events,
        last: emitter.snapshot(),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Predict { shot, full } => predict(&shot, full),
        Commands::Run { shot, ticks } => run(&shot, ticks),
    }
}
