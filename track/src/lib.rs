#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative rolling-window track state for Lane Runner.
//!
//! The scroller owns a bounded FIFO queue of generated segments. Each tick it
//! tops the window up to its target size, generating new segments at the
//! frontier, and retires segments that fell behind the viewpoint, releasing
//! their content back to the injected [`SpawnPort`]. All randomness is drawn
//! from a single seeded stream owned by the scroller so a fixed seed and a
//! fixed signal trace reproduce the exact same track.

mod segment;

pub use segment::{PlacedContent, Segment};

use std::collections::VecDeque;

use lane_runner_core::{
    BonusConfig, DensityProfile, Event, Orientation, ProgressSource, RuleSet, SegmentId,
    SpawnPort, SpeedSource, TrackLayout, WaveSchedule,
};
use lane_runner_system_difficulty::{Difficulty, DifficultyInputs};
use lane_runner_system_selection::ContentSelector;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, warn};

/// Static configuration of the scroller.
#[derive(Clone, Debug)]
pub struct TrackConfig {
    /// Number of segments kept alive ahead of and around the viewpoint.
    pub segments_in_window: u32,
    /// Extra distance a segment must fall behind before it is retired.
    pub safe_zone: f32,
    /// Track geometry.
    pub layout: TrackLayout,
    /// Speed-dependent slot and density response.
    pub profile: DensityProfile,
    /// Bonus-corridor parameters.
    pub bonus: BonusConfig,
    /// Difficulty wave schedule.
    pub waves: WaveSchedule,
}

impl Default for TrackConfig {
    fn default() -> Self {
        Self {
            segments_in_window: 10,
            safe_zone: 50.0,
            layout: TrackLayout::default(),
            profile: DensityProfile::default(),
            bonus: BonusConfig::default(),
            waves: WaveSchedule::default(),
        }
    }
}

/// Counters accumulated over the lifetime of one scroller.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TrackTotals {
    /// Segments generated since the session started.
    pub segments_spawned: u64,
    /// Segments retired since the session started.
    pub segments_retired: u64,
    /// Content instances successfully placed.
    pub placements: u64,
    /// Planned placements that failed to acquire an instance.
    pub failed_placements: u64,
    /// Bonus corridors entered.
    pub bonus_corridors: u64,
}

/// Authoritative track scroller.
#[derive(Debug)]
pub struct Track {
    config: TrackConfig,
    rules: RuleSet,
    segments: VecDeque<Segment>,
    spawn_z: f32,
    next_segment: u64,
    rng: ChaCha8Rng,
    difficulty: Difficulty,
    selector: ContentSelector,
    bonus_was_active: bool,
    totals: TrackTotals,
}

impl Track {
    /// Creates a scroller with an empty window and a seeded random stream.
    #[must_use]
    pub fn new(config: TrackConfig, rules: RuleSet, seed: u64) -> Self {
        Self {
            config,
            rules,
            segments: VecDeque::new(),
            spawn_z: 0.0,
            next_segment: 0,
            rng: ChaCha8Rng::seed_from_u64(seed),
            difficulty: Difficulty::new(),
            selector: ContentSelector::new(),
            bonus_was_active: false,
            totals: TrackTotals::default(),
        }
    }

    /// Advances the scroller by one simulation tick.
    ///
    /// Signals are sampled once; an unbound source degrades to 0.0 rather
    /// than failing the tick. Generation tops the window up to its target
    /// size, then retirement reclaims every segment whose far edge fell more
    /// than the safe zone behind the sampled progress.
    pub fn tick(
        &mut self,
        speed: &dyn SpeedSource,
        progress: &dyn ProgressSource,
        port: &mut dyn SpawnPort,
        out_events: &mut Vec<Event>,
    ) {
        let speed_kph = speed.speed_kph().unwrap_or(0.0);
        let distance = progress.distance().unwrap_or(0.0);

        while self.segments.len() < self.config.segments_in_window as usize {
            self.generate_segment(speed_kph, distance, port, out_events);
        }

        self.retire_expired(distance, port, out_events);
    }

    fn generate_segment(
        &mut self,
        speed_kph: f32,
        distance: f32,
        port: &mut dyn SpawnPort,
        out_events: &mut Vec<Event>,
    ) {
        let inputs = DifficultyInputs {
            speed_kph,
            distance,
            profile: &self.config.profile,
            bonus: &self.config.bonus,
            waves: &self.config.waves,
        };
        let context = self.difficulty.advance(&inputs, &mut self.rng);

        if context.bonus_active && !self.bonus_was_active {
            self.totals.bonus_corridors += 1;
            out_events.push(Event::BonusEntered {
                segments: context.bonus_remaining + 1,
            });
        } else if !context.bonus_active && self.bonus_was_active {
            out_events.push(Event::BonusEnded);
        }
        self.bonus_was_active = context.bonus_active;

        let plan = self.selector.fill_segment(
            &self.rules,
            &self.config.waves,
            &context,
            &self.config.layout,
            self.spawn_z,
            &mut self.rng,
        );

        let id = SegmentId::new(self.next_segment);
        self.next_segment += 1;
        out_events.push(Event::SegmentSpawned {
            segment: id,
            origin_z: self.spawn_z,
            slot_count: context.slot_count,
            bonus: context.bonus_active,
        });

        let mut placements = Vec::with_capacity(plan.placements.len());
        for planned in plan.placements {
            let handle = port.acquire(&planned.key, planned.position, Orientation::IDENTITY, id);
            match handle {
                Some(_) => {
                    self.totals.placements += 1;
                    out_events.push(Event::ContentPlaced {
                        segment: id,
                        cell: planned.cell,
                        key: planned.key.clone(),
                        category: planned.category,
                        position: planned.position,
                    });
                }
                None => {
                    // The planned cell stays consumed even though nothing
                    // spawned into it.
                    self.totals.failed_placements += 1;
                    warn!(
                        key = planned.key.as_str(),
                        segment = id.get(),
                        "content key not registered; leaving the cell empty"
                    );
                    out_events.push(Event::PlacementFailed {
                        segment: id,
                        cell: planned.cell,
                        key: planned.key.clone(),
                    });
                }
            }
            placements.push(PlacedContent {
                cell: planned.cell,
                key: planned.key,
                category: planned.category,
                position: planned.position,
                handle,
            });
        }

        debug!(
            segment = id.get(),
            origin_z = self.spawn_z,
            slots = context.slot_count,
            bonus = context.bonus_active,
            "segment generated"
        );
        self.segments.push_back(Segment {
            id,
            origin_z: self.spawn_z,
            length: self.config.layout.segment_length,
            slot_count: context.slot_count,
            bonus: context.bonus_active,
            placements,
        });
        self.totals.segments_spawned += 1;
        self.spawn_z += self.config.layout.segment_length;
    }

    fn retire_expired(
        &mut self,
        distance: f32,
        port: &mut dyn SpawnPort,
        out_events: &mut Vec<Event>,
    ) {
        loop {
            let expired = match self.segments.front() {
                Some(front) => distance > front.end_z() + self.config.safe_zone,
                None => false,
            };
            if !expired {
                break;
            }

            let Some(segment) = self.segments.pop_front() else {
                break;
            };
            let mut released = 0;
            for placement in &segment.placements {
                if let Some(handle) = placement.handle {
                    port.release(handle);
                    released += 1;
                }
            }
            self.totals.segments_retired += 1;
            debug!(segment = segment.id.get(), released, "segment retired");
            out_events.push(Event::SegmentRetired {
                segment: segment.id,
                released,
            });
        }
    }
}

/// Query functions that provide read-only access to the scroller state.
pub mod query {
    use super::{Segment, Track, TrackTotals};

    /// Iterates the live segments from oldest to newest.
    pub fn segments(track: &Track) -> impl Iterator<Item = &Segment> {
        track.segments.iter()
    }

    /// Number of segments currently alive in the window.
    #[must_use]
    pub fn active_segment_count(track: &Track) -> usize {
        track.segments.len()
    }

    /// Target number of live segments the scroller maintains.
    #[must_use]
    pub fn window_target(track: &Track) -> u32 {
        track.config.segments_in_window
    }

    /// World-space coordinate where the next segment will be generated.
    #[must_use]
    pub fn frontier_z(track: &Track) -> f32 {
        track.spawn_z
    }

    /// Oldest live segment, next in line for retirement.
    #[must_use]
    pub fn oldest_segment(track: &Track) -> Option<&Segment> {
        track.segments.front()
    }

    /// Bonus segments still owed after the newest generation.
    #[must_use]
    pub fn bonus_remaining(track: &Track) -> u32 {
        track.difficulty.bonus_remaining()
    }

    /// Lifetime counters for the session's score surface.
    #[must_use]
    pub fn totals(track: &Track) -> TrackTotals {
        track.totals
    }
}
