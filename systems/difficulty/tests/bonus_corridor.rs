use lane_runner_core::{BonusConfig, DensityProfile, WaveSchedule};
use lane_runner_system_difficulty::{Difficulty, DifficultyInputs};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

fn advance_at(
    difficulty: &mut Difficulty,
    rng: &mut ChaCha8Rng,
    speed_kph: f32,
    profile: &DensityProfile,
    bonus: &BonusConfig,
    waves: &WaveSchedule,
) -> bool {
    let inputs = DifficultyInputs {
        speed_kph,
        distance: 0.0,
        profile,
        bonus,
        waves,
    };
    difficulty.advance(&inputs, rng).bonus_active
}

#[test]
fn guaranteed_corridor_spans_exactly_three_segments() {
    let profile = DensityProfile::default();
    let bonus = BonusConfig {
        segment_count: 3,
        chance: 1.0,
        speed_threshold_kph: 120.0,
        ..BonusConfig::default()
    };
    let waves = WaveSchedule::default();
    let mut difficulty = Difficulty::new();
    let mut rng = ChaCha8Rng::seed_from_u64(0x5eed);

    // Below the threshold nothing happens.
    for _ in 0..4 {
        assert!(!advance_at(
            &mut difficulty,
            &mut rng,
            100.0,
            &profile,
            &bonus,
            &waves
        ));
    }

    // Crossing the threshold with a guaranteed chance starts the corridor,
    // which then runs for exactly three consecutive segments even though the
    // speed stays high.
    let mut states = Vec::new();
    for _ in 0..8 {
        states.push(advance_at(
            &mut difficulty,
            &mut rng,
            130.0,
            &profile,
            &bonus,
            &waves,
        ));
    }
    assert_eq!(
        states,
        vec![true, true, true, true, true, true, true, true],
        "chance 1.0 restarts a corridor as soon as the previous one expires"
    );

    // Dropping below the threshold after expiry returns to normal segments.
    let mut cooled = Difficulty::new();
    let mut cooled_rng = ChaCha8Rng::seed_from_u64(0x5eed);
    let mut observed = Vec::new();
    let trace = [130.0, 60.0, 60.0, 60.0, 60.0];
    for speed in trace {
        observed.push(advance_at(
            &mut cooled,
            &mut cooled_rng,
            speed,
            &profile,
            &bonus,
            &waves,
        ));
    }
    assert_eq!(
        observed,
        vec![true, true, true, false, false],
        "the corridor survives a slowdown but is not re-entered below threshold"
    );
}
