use lane_runner_core::{
    Category, CategoryMultipliers, ContentKey, ContentRule, DensityProfile, Event, ProgressSource,
    RuleSet, SpeedSource, TrackLayout,
};
use lane_runner_pool::InstancePool;
use lane_runner_track::{Track, TrackConfig};

struct TraceSignals {
    speed: f32,
    distance: f32,
}

impl SpeedSource for TraceSignals {
    fn speed_kph(&self) -> Option<f32> {
        Some(self.speed)
    }
}

impl ProgressSource for TraceSignals {
    fn distance(&self) -> Option<f32> {
        Some(self.distance)
    }
}

fn replay_config() -> TrackConfig {
    TrackConfig {
        segments_in_window: 4,
        safe_zone: 5.0,
        layout: TrackLayout {
            segment_length: 10.0,
            ..TrackLayout::default()
        },
        profile: DensityProfile {
            base_density: 0.7,
            ..DensityProfile::default()
        },
        ..TrackConfig::default()
    }
}

fn replay_rules() -> RuleSet {
    let mut rock = ContentRule::new(ContentKey::new("rock"), Category::ObstacleLow, 1.5);
    rock.min_distance_between_same = 2;
    let coin = ContentRule::new(ContentKey::new("coin"), Category::Pickup, 2.0);
    let drone = ContentRule::new(ContentKey::new("drone"), Category::Enemy, 0.7);
    RuleSet::new(vec![rock, coin, drone], CategoryMultipliers::default())
}

fn replay_pool() -> InstancePool {
    let mut pool = InstancePool::new();
    pool.register(ContentKey::new("rock"), 16);
    pool.register(ContentKey::new("coin"), 16);
    pool.register(ContentKey::new("drone"), 16);
    pool
}

fn run(seed: u64) -> Vec<Event> {
    let mut track = Track::new(replay_config(), replay_rules(), seed);
    let mut pool = replay_pool();
    let mut events = Vec::new();

    // A fixed signal trace: the runner accelerates and advances every tick.
    for tick in 0..30 {
        let signals = TraceSignals {
            speed: 30.0 + tick as f32 * 4.0,
            distance: tick as f32 * 8.0,
        };
        track.tick(&signals, &signals, &mut pool, &mut events);
    }
    events
}

#[test]
fn identical_seeds_replay_identical_sessions() {
    let first = run(0xc0ffee);
    let second = run(0xc0ffee);
    assert_eq!(first, second);
}

#[test]
fn placements_arrive_in_a_stable_order() {
    let events = run(0xc0ffee);
    let placements: Vec<_> = events
        .iter()
        .filter(|event| matches!(event, Event::ContentPlaced { .. }))
        .collect();
    assert!(!placements.is_empty());

    let replayed: Vec<_> = run(0xc0ffee)
        .into_iter()
        .filter(|event| matches!(event, Event::ContentPlaced { .. }))
        .collect();
    assert_eq!(placements.len(), replayed.len());
    for (left, right) in placements.iter().zip(replayed.iter()) {
        assert_eq!(*left, right);
    }
}

#[test]
fn different_seeds_diverge() {
    let first = run(1);
    let second = run(2);
    assert_ne!(first, second);
}
