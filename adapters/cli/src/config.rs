//! Session configuration loading for the demo binary.

use std::fs;
use std::path::Path;

use lane_runner_core::{
    BonusConfig, Category, CategoryMultipliers, ContentKey, ContentRule, DensityProfile,
    ResponseCurve, RuleError, RuleSet, TrackLayout, Wave, WaveSchedule, WaveTrigger,
};
use lane_runner_pool::InstancePool;
use lane_runner_track::TrackConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

fn default_window() -> u32 {
    10
}

fn default_safe_zone() -> f32 {
    50.0
}

fn default_preload() -> u32 {
    8
}

/// Preload request registering one content key with the instance pool.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) struct PoolPreload {
    /// Content key to register.
    pub(crate) key: ContentKey,
    /// Number of instances preallocated for the key.
    #[serde(default = "default_preload")]
    pub(crate) preload: u32,
}

fn default_start_speed() -> f32 {
    5.0
}

fn default_max_speed() -> f32 {
    55.0
}

fn default_speed_gain() -> f32 {
    0.5
}

/// Parameters of the simulated runner driving the demo's signal sources.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) struct RunnerConfig {
    /// Initial forward speed in internal units per second.
    #[serde(default = "default_start_speed")]
    pub(crate) start_speed: f32,
    /// Upper bound of the forward speed.
    #[serde(default = "default_max_speed")]
    pub(crate) max_speed: f32,
    /// Forward-speed gain per simulated second.
    #[serde(default = "default_speed_gain")]
    pub(crate) gain_per_second: f32,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            start_speed: default_start_speed(),
            max_speed: default_max_speed(),
            gain_per_second: default_speed_gain(),
        }
    }
}

/// Complete session description loaded before the scroller starts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) struct SessionConfig {
    /// Number of segments kept alive around the viewpoint.
    #[serde(default = "default_window")]
    pub(crate) segments_in_window: u32,
    /// Extra trailing distance before segments are retired.
    #[serde(default = "default_safe_zone")]
    pub(crate) safe_zone: f32,
    /// Track geometry.
    #[serde(default)]
    pub(crate) layout: TrackLayout,
    /// Speed-dependent slot and density response.
    #[serde(default)]
    pub(crate) profile: DensityProfile,
    /// Bonus-corridor parameters.
    #[serde(default)]
    pub(crate) bonus: BonusConfig,
    /// Difficulty wave schedule.
    #[serde(default)]
    pub(crate) waves: WaveSchedule,
    /// Spawnable content rules.
    pub(crate) rules: Vec<ContentRule>,
    /// Global per-category weight multipliers.
    #[serde(default)]
    pub(crate) global_multipliers: CategoryMultipliers,
    /// Category priority order; earlier categories claim contested cells.
    #[serde(default)]
    pub(crate) category_order: Option<Vec<Category>>,
    /// Designer convenience: rules without incompatibilities default to
    /// excluding every other category.
    #[serde(default)]
    pub(crate) autofill_incompatibilities: bool,
    /// Content keys registered with the instance pool.
    #[serde(default)]
    pub(crate) pool: Vec<PoolPreload>,
    /// Simulated runner parameters.
    #[serde(default)]
    pub(crate) runner: RunnerConfig,
}

/// Errors reported while loading a session configuration.
#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read session config: {0}")]
    Io(#[from] std::io::Error),
    /// The config file was not valid JSON for the expected schema.
    #[error("failed to parse session config: {0}")]
    Parse(#[from] serde_json::Error),
    /// A rule or the category order failed validation.
    #[error("invalid rule configuration: {0}")]
    Rule(#[from] RuleError),
    /// A response curve's control points were not in ascending order.
    #[error("curve control points must be in ascending input order")]
    UnsortedCurve,
}

impl SessionConfig {
    /// Loads and validates a session config from a JSON file.
    pub(crate) fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Parses and validates a session config from JSON text.
    pub(crate) fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Validates rules, wave overrides and curves against the track geometry.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        for rule in &self.rules {
            rule.validate(self.layout.lane_count)?;
        }
        for wave in self.waves.waves() {
            for rule in &wave.rule_overrides {
                rule.validate(self.layout.lane_count)?;
            }
        }
        if !self.profile.slot_curve.is_sorted() || !self.profile.density_curve.is_sorted() {
            return Err(ConfigError::UnsortedCurve);
        }
        Ok(())
    }

    /// Assembles the scroller configuration.
    pub(crate) fn track_config(&self) -> TrackConfig {
        TrackConfig {
            segments_in_window: self.segments_in_window,
            safe_zone: self.safe_zone,
            layout: self.layout.clone(),
            profile: self.profile.clone(),
            bonus: self.bonus.clone(),
            waves: self.waves.clone(),
        }
    }

    /// Assembles the rule set, applying the declared order and autofill.
    pub(crate) fn rule_set(&self) -> Result<RuleSet, ConfigError> {
        let mut rules = RuleSet::new(self.rules.clone(), self.global_multipliers.clone());
        if let Some(order) = &self.category_order {
            rules = rules.with_category_order(order.clone())?;
        }
        if self.autofill_incompatibilities {
            rules.autofill_incompatibilities();
        }
        Ok(rules)
    }

    /// Builds the instance pool with every declared preload.
    pub(crate) fn build_pool(&self) -> InstancePool {
        let mut pool = InstancePool::new();
        for entry in &self.pool {
            pool.register(entry.key.clone(), entry.preload);
        }
        pool
    }

    /// Built-in demo session used when no config file is supplied.
    pub(crate) fn sample() -> Self {
        let mut rock = ContentRule::new(ContentKey::new("rock"), Category::ObstacleLow, 1.0);
        rock.min_distance_between_same = 2;
        rock.only_outside_bonus = true;

        let mut barrier = ContentRule::new(ContentKey::new("barrier"), Category::ObstacleHigh, 0.8);
        barrier.min_distance_between_same = 2;
        barrier.only_outside_bonus = true;

        let mut drone = ContentRule::new(ContentKey::new("drone"), Category::Enemy, 1.0);
        drone.min_speed_kph = 60.0;
        drone.incompatible_categories = vec![Category::ObstacleLow, Category::ObstacleHigh];
        drone.dependency_radius = 1;
        drone.only_outside_bonus = true;

        let coin = ContentRule::new(ContentKey::new("coin"), Category::Pickup, 2.0);

        let mut magnet = ContentRule::new(ContentKey::new("magnet"), Category::Pickup, 0.3);
        magnet.only_in_bonus = true;

        let mut colossus = ContentRule::new(ContentKey::new("colossus"), Category::Boss, 0.2);
        colossus.min_speed_kph = 120.0;
        colossus.allowed_lanes = vec![1];
        colossus.dependency_radius = 2;
        colossus.incompatible_categories = vec![
            Category::ObstacleLow,
            Category::ObstacleHigh,
            Category::Enemy,
            Category::Pickup,
        ];
        colossus.only_outside_bonus = true;

        let mut surge = Wave::new(WaveTrigger::SpeedAtLeast(100.0));
        surge.density_multiplier = 1.2;
        surge.slot_multiplier = 1.5;

        let mut frenzy = Wave::new(WaveTrigger::SpeedAtLeast(160.0));
        frenzy.weight_multipliers.enemy = 2.0;
        frenzy.bonus_chance_multiplier = 1.5;

        Self {
            segments_in_window: default_window(),
            safe_zone: default_safe_zone(),
            layout: TrackLayout::default(),
            profile: DensityProfile {
                base_slots_per_segment: 6,
                base_density: 0.6,
                slot_curve: ResponseCurve::linear(30.0, 1.0, 200.0, 2.0),
                density_curve: ResponseCurve::linear(30.0, 0.1, 200.0, -0.3),
            },
            bonus: BonusConfig {
                density_multiplier: 2.0,
                ..BonusConfig::default()
            },
            waves: WaveSchedule::new(vec![surge, frenzy]),
            rules: vec![rock, barrier, drone, coin, magnet, colossus],
            global_multipliers: CategoryMultipliers {
                pickup: 2.0,
                enemy: 0.8,
                boss: 0.5,
                ..CategoryMultipliers::default()
            },
            category_order: None,
            autofill_incompatibilities: false,
            pool: vec![
                PoolPreload {
                    key: ContentKey::new("rock"),
                    preload: 8,
                },
                PoolPreload {
                    key: ContentKey::new("barrier"),
                    preload: 8,
                },
                PoolPreload {
                    key: ContentKey::new("drone"),
                    preload: 8,
                },
                PoolPreload {
                    key: ContentKey::new("coin"),
                    preload: 16,
                },
                PoolPreload {
                    key: ContentKey::new("magnet"),
                    preload: 4,
                },
                PoolPreload {
                    key: ContentKey::new("colossus"),
                    preload: 2,
                },
            ],
            runner: RunnerConfig::default(),
        }
    }
}
