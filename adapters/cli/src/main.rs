#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Headless demo binary that drives the Lane Runner track spawner.

mod config;

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use lane_runner_core::{Event, ProgressSource, SpeedSource, KPH_PER_UNIT_SPEED};
use lane_runner_track::{query, Track};

use crate::config::{RunnerConfig, SessionConfig};

/// Command-line options of the demo binary.
#[derive(Debug, Parser)]
#[command(name = "lane-runner", about = "Headless endless-runner track spawner demo")]
struct Options {
    /// Path to a JSON session config; the built-in sample is used when omitted.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Seed of the spawner's random stream.
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Number of simulation ticks to run.
    #[arg(long, default_value_t = 120)]
    ticks: u32,
    /// Simulated seconds per tick.
    #[arg(long, default_value_t = 0.5)]
    tick_seconds: f32,
    /// Print only the end-of-run summary.
    #[arg(long)]
    quiet: bool,
}

/// Simulated runner standing in for the player controller's signals.
struct RunnerSim {
    forward_speed: f32,
    max_speed: f32,
    gain_per_second: f32,
    distance: f32,
}

impl RunnerSim {
    fn new(config: &RunnerConfig) -> Self {
        Self {
            forward_speed: config.start_speed,
            max_speed: config.max_speed,
            gain_per_second: config.gain_per_second,
            distance: 0.0,
        }
    }

    fn advance(&mut self, dt_seconds: f32) {
        self.distance += self.forward_speed * dt_seconds;
        self.forward_speed =
            (self.forward_speed + self.gain_per_second * dt_seconds).min(self.max_speed);
    }
}

impl SpeedSource for RunnerSim {
    fn speed_kph(&self) -> Option<f32> {
        Some(self.forward_speed * KPH_PER_UNIT_SPEED)
    }
}

impl ProgressSource for RunnerSim {
    fn distance(&self) -> Option<f32> {
        Some(self.distance)
    }
}

/// Entry point of the Lane Runner demo.
fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let options = Options::parse();
    let session = match &options.config {
        Some(path) => SessionConfig::load(path)
            .with_context(|| format!("loading session config from {}", path.display()))?,
        None => SessionConfig::sample(),
    };

    let rules = session
        .rule_set()
        .context("assembling the content rule set")?;
    let mut pool = session.build_pool();
    let mut runner = RunnerSim::new(&session.runner);
    let mut track = Track::new(session.track_config(), rules, options.seed);

    let mut events = Vec::new();
    for _ in 0..options.ticks {
        runner.advance(options.tick_seconds);
        track.tick(&runner, &runner, &mut pool, &mut events);
        if !options.quiet {
            for event in &events {
                print_event(event);
            }
        }
        events.clear();
    }

    let totals = query::totals(&track);
    println!("--- session summary ---");
    println!(
        "distance {:.1}  final speed {:.0} km/h",
        runner.distance,
        runner.forward_speed * KPH_PER_UNIT_SPEED
    );
    println!(
        "segments: {} spawned, {} retired, {} live",
        totals.segments_spawned,
        totals.segments_retired,
        query::active_segment_count(&track)
    );
    println!(
        "placements: {} made, {} failed, {} bonus corridors, {} instances live",
        totals.placements,
        totals.failed_placements,
        totals.bonus_corridors,
        pool.live_count()
    );

    Ok(())
}

fn print_event(event: &Event) {
    match event {
        Event::SegmentSpawned {
            segment,
            origin_z,
            slot_count,
            bonus,
        } => {
            let marker = if *bonus { " [bonus]" } else { "" };
            println!(
                "segment {} spawned at z={origin_z:.1} with {slot_count} slots{marker}",
                segment.get()
            );
        }
        Event::ContentPlaced {
            cell,
            key,
            category,
            position,
            ..
        } => {
            println!(
                "  {:<12} {:?} lane {} slot {} at z={:.1}",
                key.as_str(),
                category,
                cell.lane(),
                cell.slot(),
                position.z()
            );
        }
        Event::PlacementFailed { cell, key, .. } => {
            println!(
                "  {:<12} could not spawn (lane {} slot {})",
                key.as_str(),
                cell.lane(),
                cell.slot()
            );
        }
        Event::SegmentRetired { segment, released } => {
            println!(
                "segment {} retired, {released} instances released",
                segment.get()
            );
        }
        Event::BonusEntered { segments } => {
            println!("bonus corridor entered for {segments} segments");
        }
        Event::BonusEnded => println!("bonus corridor ended"),
    }
}
