#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic difficulty system deriving per-segment spawn parameters.

use lane_runner_core::{BonusConfig, DensityProfile, DifficultyContext, WaveSchedule};
use rand::Rng;

/// Signals and configuration sampled once per segment generation.
#[derive(Clone, Copy, Debug)]
pub struct DifficultyInputs<'a> {
    /// Current forward speed in km/h (0.0 when the source is unavailable).
    pub speed_kph: f32,
    /// Distance traveled along the track in world units.
    pub distance: f32,
    /// Speed-dependent slot and density response.
    pub profile: &'a DensityProfile,
    /// Bonus-corridor parameters.
    pub bonus: &'a BonusConfig,
    /// Difficulty wave schedule.
    pub waves: &'a WaveSchedule,
}

/// Pure system that recomputes the [`DifficultyContext`] for each new segment.
///
/// The only state carried between segments is the bonus-corridor countdown;
/// everything else is derived from the sampled signals.
#[derive(Debug, Default)]
pub struct Difficulty {
    bonus_remaining: u32,
}

impl Difficulty {
    /// Creates a difficulty system outside any bonus corridor.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bonus segments still owed after the most recent advance.
    #[must_use]
    pub fn bonus_remaining(&self) -> u32 {
        self.bonus_remaining
    }

    /// Advances the bonus state machine and derives the context for the next
    /// segment. Draws at most one uniform sample from the provided stream.
    pub fn advance(
        &mut self,
        inputs: &DifficultyInputs<'_>,
        rng: &mut impl Rng,
    ) -> DifficultyContext {
        let active = inputs.waves.active(inputs.speed_kph, inputs.distance);
        let (active_wave, slot_mult, density_mult, bonus_chance_mult) = match active {
            Some((index, wave)) => (
                Some(index),
                wave.slot_multiplier,
                wave.density_multiplier,
                wave.bonus_chance_multiplier,
            ),
            None => (None, 1.0, 1.0, 1.0),
        };

        let bonus_active = if self.bonus_remaining > 0 {
            self.bonus_remaining -= 1;
            true
        } else if inputs.bonus.segment_count > 0
            && inputs.speed_kph >= inputs.bonus.speed_threshold_kph
            && rng.gen::<f32>() < inputs.bonus.chance * bonus_chance_mult
        {
            self.bonus_remaining = inputs.bonus.segment_count - 1;
            true
        } else {
            false
        };

        let bonus_slot_mult = if bonus_active {
            inputs.bonus.slot_multiplier
        } else {
            1.0
        };
        let slot_scale =
            inputs.profile.slot_curve.evaluate(inputs.speed_kph) * slot_mult * bonus_slot_mult;
        let slot_count = (inputs.profile.base_slots_per_segment as f32 * slot_scale)
            .round()
            .max(1.0) as u32;

        let mut density = (inputs.profile.base_density
            + inputs.profile.density_curve.evaluate(inputs.speed_kph))
        .clamp(0.0, 1.0)
            * density_mult;
        if bonus_active {
            density *= inputs.bonus.density_multiplier;
        }
        let density = density.clamp(0.0, 1.0);

        DifficultyContext {
            speed_kph: inputs.speed_kph,
            active_wave,
            bonus_active,
            bonus_remaining: self.bonus_remaining,
            slot_count,
            density,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lane_runner_core::{Wave, WaveTrigger};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn inputs<'a>(
        speed_kph: f32,
        profile: &'a DensityProfile,
        bonus: &'a BonusConfig,
        waves: &'a WaveSchedule,
    ) -> DifficultyInputs<'a> {
        DifficultyInputs {
            speed_kph,
            distance: 0.0,
            profile,
            bonus,
            waves,
        }
    }

    #[test]
    fn slot_count_never_drops_below_one() {
        let profile = DensityProfile {
            base_slots_per_segment: 2,
            slot_curve: lane_runner_core::ResponseCurve::constant(0.0),
            ..DensityProfile::default()
        };
        let bonus = BonusConfig::default();
        let waves = WaveSchedule::default();
        let mut difficulty = Difficulty::new();
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        let context = difficulty.advance(&inputs(30.0, &profile, &bonus, &waves), &mut rng);
        assert_eq!(context.slot_count, 1);
    }

    #[test]
    fn density_stays_within_unit_interval() {
        let profile = DensityProfile {
            base_density: 0.9,
            density_curve: lane_runner_core::ResponseCurve::constant(0.5),
            ..DensityProfile::default()
        };
        let bonus = BonusConfig::default();
        let waves = WaveSchedule::new(vec![{
            let mut wave = Wave::new(WaveTrigger::SpeedAtLeast(0.0));
            wave.density_multiplier = 5.0;
            wave
        }]);
        let mut difficulty = Difficulty::new();
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        let context = difficulty.advance(&inputs(30.0, &profile, &bonus, &waves), &mut rng);
        assert!((context.density - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn wave_multiplier_scales_slot_count() {
        let profile = DensityProfile {
            base_slots_per_segment: 4,
            ..DensityProfile::default()
        };
        let bonus = BonusConfig::default();
        let waves = WaveSchedule::new(vec![{
            let mut wave = Wave::new(WaveTrigger::DistanceAtLeast(0.0));
            wave.slot_multiplier = 2.0;
            wave
        }]);
        let mut difficulty = Difficulty::new();
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        let context = difficulty.advance(&inputs(30.0, &profile, &bonus, &waves), &mut rng);
        assert_eq!(context.active_wave, Some(0));
        assert_eq!(context.slot_count, 8);
    }

    #[test]
    fn no_bonus_below_speed_threshold() {
        let profile = DensityProfile::default();
        let bonus = BonusConfig {
            chance: 1.0,
            speed_threshold_kph: 120.0,
            ..BonusConfig::default()
        };
        let waves = WaveSchedule::default();
        let mut difficulty = Difficulty::new();
        let mut rng = ChaCha8Rng::seed_from_u64(7);

        let context = difficulty.advance(&inputs(119.0, &profile, &bonus, &waves), &mut rng);
        assert!(!context.bonus_active);
        assert_eq!(difficulty.bonus_remaining(), 0);
    }

    #[test]
    fn zero_length_corridors_never_start() {
        let profile = DensityProfile::default();
        let bonus = BonusConfig {
            segment_count: 0,
            chance: 1.0,
            speed_threshold_kph: 0.0,
            ..BonusConfig::default()
        };
        let waves = WaveSchedule::default();
        let mut difficulty = Difficulty::new();
        let mut rng = ChaCha8Rng::seed_from_u64(7);

        let context = difficulty.advance(&inputs(200.0, &profile, &bonus, &waves), &mut rng);
        assert!(!context.bonus_active);
    }
}
