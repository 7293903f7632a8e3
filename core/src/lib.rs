#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Lane Runner spawner.
//!
//! This crate defines the data model and the seams that connect the
//! authoritative track scroller, the pure generation systems, and the
//! adapters. Designer-facing configuration (rules, waves, curves, geometry)
//! lives here as serde-enabled data; the scroller consumes injected
//! [`SpawnPort`], [`SpeedSource`] and [`ProgressSource`] implementations and
//! broadcasts [`Event`] values for adapters and tests to observe.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Conversion factor from internal forward-speed units to kilometres per hour.
pub const KPH_PER_UNIT_SPEED: f32 = 3.6;

/// Coarse content type used for weighting, priority, and dependency rules.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Ground-level obstacle cleared by jumping.
    ObstacleLow,
    /// Elevated obstacle cleared by sliding.
    ObstacleHigh,
    /// Hostile actor placed on the track.
    Enemy,
    /// Collectible reward.
    Pickup,
    /// Large setpiece hostile.
    Boss,
}

impl Category {
    /// Every category in declaration order.
    pub const ALL: [Category; 5] = [
        Category::ObstacleLow,
        Category::ObstacleHigh,
        Category::Enemy,
        Category::Pickup,
        Category::Boss,
    ];

    const fn bit(self) -> u8 {
        match self {
            Category::ObstacleLow => 1,
            Category::ObstacleHigh => 1 << 1,
            Category::Enemy => 1 << 2,
            Category::Pickup => 1 << 3,
            Category::Boss => 1 << 4,
        }
    }
}

/// Compact set of [`Category`] values stored as a bitmask.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct CategorySet(u8);

impl CategorySet {
    /// Creates an empty category set.
    #[must_use]
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Returns a copy of the set with the provided category added.
    #[must_use]
    pub const fn with(self, category: Category) -> Self {
        Self(self.0 | category.bit())
    }

    /// Builds a set from a slice of categories.
    #[must_use]
    pub fn from_slice(categories: &[Category]) -> Self {
        let mut set = Self::empty();
        for category in categories {
            set = set.with(*category);
        }
        set
    }

    /// Adds a category to the set in place.
    pub fn insert(&mut self, category: Category) {
        self.0 |= category.bit();
    }

    /// Reports whether the set contains the provided category.
    #[must_use]
    pub const fn contains(&self, category: Category) -> bool {
        self.0 & category.bit() != 0
    }

    /// Reports whether the two sets share at least one category.
    #[must_use]
    pub const fn intersects(&self, other: CategorySet) -> bool {
        self.0 & other.0 != 0
    }

    /// Reports whether the set contains no categories.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

/// Identifier of spawnable content registered with the instance pool.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentKey(String);

impl ContentKey {
    /// Creates a content key from any string-like value.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Borrows the key's textual representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Reports whether the key holds an empty identifier.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Address of one placement cell: a lane crossed with a slot along the track.
///
/// Distances between cells are measured in slot units along the travel axis
/// regardless of lane; this is the canonical spacing metric used by every
/// dependency and spacing check.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SlotCoord {
    lane: u32,
    slot: u32,
}

impl SlotCoord {
    /// Creates a new cell address.
    #[must_use]
    pub const fn new(lane: u32, slot: u32) -> Self {
        Self { lane, slot }
    }

    /// Zero-based lane index across the track width.
    #[must_use]
    pub const fn lane(&self) -> u32 {
        self.lane
    }

    /// Zero-based slot index along the travel axis.
    #[must_use]
    pub const fn slot(&self) -> u32 {
        self.slot
    }

    /// Distance to another cell in slot units along the travel axis.
    #[must_use]
    pub const fn slot_distance(&self, other: SlotCoord) -> u32 {
        self.slot.abs_diff(other.slot)
    }
}

/// Unique identifier assigned to one generated track segment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SegmentId(u64);

impl SegmentId {
    /// Creates a new segment identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

/// Opaque handle to a content instance acquired from a [`SpawnPort`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceHandle(u64);

impl InstanceHandle {
    /// Creates a new instance handle with the provided numeric value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the handle.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

/// World-space position handed to the spawn port for placement.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WorldPosition {
    x: f32,
    y: f32,
    z: f32,
}

impl WorldPosition {
    /// Creates a new position from its components.
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Lateral offset across the track width.
    #[must_use]
    pub const fn x(&self) -> f32 {
        self.x
    }

    /// Vertical offset above the track surface.
    #[must_use]
    pub const fn y(&self) -> f32 {
        self.y
    }

    /// Distance along the travel axis.
    #[must_use]
    pub const fn z(&self) -> f32 {
        self.z
    }
}

/// Yaw orientation applied to spawned content.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Orientation(f32);

impl Orientation {
    /// Identity orientation facing down the track.
    pub const IDENTITY: Orientation = Orientation(0.0);

    /// Creates an orientation from a yaw angle in degrees.
    #[must_use]
    pub const fn from_yaw_degrees(yaw: f32) -> Self {
        Self(yaw)
    }

    /// Yaw angle in degrees.
    #[must_use]
    pub const fn yaw_degrees(&self) -> f32 {
        self.0
    }
}

fn default_weight() -> f32 {
    1.0
}

fn default_max_speed() -> f32 {
    f32::MAX
}

/// One spawnable content entry with its weighting and placement constraints.
///
/// Immutable after load; many rules typically share a category.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContentRule {
    /// Pool key of the content spawned when this rule wins a cell.
    pub key: ContentKey,
    /// Category the rule belongs to.
    pub category: Category,
    /// Non-negative selection weight before multipliers.
    #[serde(default = "default_weight")]
    pub weight: f32,
    /// Lanes the rule may occupy; empty means all lanes.
    #[serde(default)]
    pub allowed_lanes: Vec<u32>,
    /// Categories that must not appear within the dependency window.
    #[serde(default)]
    pub incompatible_categories: Vec<Category>,
    /// Categories of which at least one must appear within the dependency
    /// window; empty means no requirement.
    #[serde(default)]
    pub required_categories: Vec<Category>,
    /// Radius of the dependency window in slot units.
    #[serde(default)]
    pub dependency_radius: u32,
    /// Minimum current speed (km/h) for the rule to be eligible.
    #[serde(default)]
    pub min_speed_kph: f32,
    /// Maximum current speed (km/h) for the rule to be eligible.
    #[serde(default = "default_max_speed")]
    pub max_speed_kph: f32,
    /// Restricts the rule to bonus-corridor segments.
    #[serde(default)]
    pub only_in_bonus: bool,
    /// Restricts the rule to segments outside bonus corridors.
    #[serde(default)]
    pub only_outside_bonus: bool,
    /// Minimum slot distance between two placements sharing this category.
    #[serde(default)]
    pub min_distance_between_same: u32,
}

impl ContentRule {
    /// Creates a rule with the provided key, category and weight; every
    /// constraint starts at its permissive default.
    #[must_use]
    pub fn new(key: ContentKey, category: Category, weight: f32) -> Self {
        Self {
            key,
            category,
            weight,
            allowed_lanes: Vec::new(),
            incompatible_categories: Vec::new(),
            required_categories: Vec::new(),
            dependency_radius: 0,
            min_speed_kph: 0.0,
            max_speed_kph: f32::MAX,
            only_in_bonus: false,
            only_outside_bonus: false,
            min_distance_between_same: 0,
        }
    }

    /// Reports whether the rule may occupy the provided lane.
    #[must_use]
    pub fn allows_lane(&self, lane: u32) -> bool {
        self.allowed_lanes.is_empty() || self.allowed_lanes.contains(&lane)
    }

    /// Validates the rule against the track's lane count.
    pub fn validate(&self, lane_count: u32) -> Result<(), RuleError> {
        if self.key.is_empty() {
            return Err(RuleError::EmptyKey);
        }
        if !self.weight.is_finite() || self.weight < 0.0 {
            return Err(RuleError::InvalidWeight {
                key: self.key.clone(),
                weight: self.weight,
            });
        }
        if self.min_speed_kph > self.max_speed_kph {
            return Err(RuleError::InvalidSpeedRange {
                key: self.key.clone(),
                min: self.min_speed_kph,
                max: self.max_speed_kph,
            });
        }
        if self.only_in_bonus && self.only_outside_bonus {
            return Err(RuleError::ConflictingBonusFlags {
                key: self.key.clone(),
            });
        }
        for &lane in &self.allowed_lanes {
            if lane >= lane_count {
                return Err(RuleError::LaneOutOfRange {
                    key: self.key.clone(),
                    lane,
                    lane_count,
                });
            }
        }
        Ok(())
    }
}

/// Errors reported while validating designer-authored rules.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum RuleError {
    /// A rule referenced an empty content key.
    #[error("content rule has an empty key")]
    EmptyKey,
    /// A rule carried a negative or non-finite weight.
    #[error("rule `{key:?}` has invalid weight {weight}")]
    InvalidWeight {
        /// Key of the offending rule.
        key: ContentKey,
        /// Weight that failed validation.
        weight: f32,
    },
    /// A rule's minimum speed exceeded its maximum speed.
    #[error("rule `{key:?}` has inverted speed range [{min}, {max}]")]
    InvalidSpeedRange {
        /// Key of the offending rule.
        key: ContentKey,
        /// Lower bound of the range.
        min: f32,
        /// Upper bound of the range.
        max: f32,
    },
    /// A rule requested both bonus-only and outside-bonus-only placement.
    #[error("rule `{key:?}` sets both only_in_bonus and only_outside_bonus")]
    ConflictingBonusFlags {
        /// Key of the offending rule.
        key: ContentKey,
    },
    /// A rule restricted itself to a lane the track does not have.
    #[error("rule `{key:?}` allows lane {lane} but the track has {lane_count} lanes")]
    LaneOutOfRange {
        /// Key of the offending rule.
        key: ContentKey,
        /// Offending lane index.
        lane: u32,
        /// Number of lanes configured for the track.
        lane_count: u32,
    },
    /// The category priority order listed a category more than once.
    #[error("category order lists {category:?} more than once")]
    DuplicateCategoryInOrder {
        /// Category that appeared twice.
        category: Category,
    },
}

/// Per-category multiplier table applied to rule weights.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryMultipliers {
    /// Multiplier applied to low-obstacle rules.
    pub obstacle_low: f32,
    /// Multiplier applied to high-obstacle rules.
    pub obstacle_high: f32,
    /// Multiplier applied to enemy rules.
    pub enemy: f32,
    /// Multiplier applied to pickup rules.
    pub pickup: f32,
    /// Multiplier applied to boss rules.
    pub boss: f32,
}

impl CategoryMultipliers {
    /// Retrieves the multiplier associated with the provided category.
    #[must_use]
    pub fn get(&self, category: Category) -> f32 {
        match category {
            Category::ObstacleLow => self.obstacle_low,
            Category::ObstacleHigh => self.obstacle_high,
            Category::Enemy => self.enemy,
            Category::Pickup => self.pickup,
            Category::Boss => self.boss,
        }
    }
}

impl Default for CategoryMultipliers {
    fn default() -> Self {
        Self {
            obstacle_low: 1.0,
            obstacle_high: 1.0,
            enemy: 1.0,
            pickup: 1.0,
            boss: 1.0,
        }
    }
}

/// One control point of a [`ResponseCurve`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    /// Input coordinate, typically a speed in km/h.
    pub input: f32,
    /// Output value of the curve at the input coordinate.
    pub output: f32,
}

/// Piecewise-linear response curve keyed on a scalar input.
///
/// Control points must be listed in ascending input order; evaluation clamps
/// to the first and last outputs outside the covered range.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResponseCurve {
    points: Vec<CurvePoint>,
}

impl ResponseCurve {
    /// Creates a curve interpolating linearly between two control points.
    #[must_use]
    pub fn linear(input_start: f32, output_start: f32, input_end: f32, output_end: f32) -> Self {
        Self {
            points: vec![
                CurvePoint {
                    input: input_start,
                    output: output_start,
                },
                CurvePoint {
                    input: input_end,
                    output: output_end,
                },
            ],
        }
    }

    /// Creates a curve that yields the same output for every input.
    #[must_use]
    pub fn constant(output: f32) -> Self {
        Self {
            points: vec![CurvePoint { input: 0.0, output }],
        }
    }

    /// Reports whether the control points are in ascending input order.
    #[must_use]
    pub fn is_sorted(&self) -> bool {
        self.points.windows(2).all(|pair| pair[0].input <= pair[1].input)
    }

    /// Evaluates the curve at the provided input.
    ///
    /// An empty curve yields 1.0 so a missing designer curve behaves as a
    /// neutral multiplier.
    #[must_use]
    pub fn evaluate(&self, input: f32) -> f32 {
        let Some(first) = self.points.first() else {
            return 1.0;
        };
        if input <= first.input {
            return first.output;
        }
        for pair in self.points.windows(2) {
            let (left, right) = (pair[0], pair[1]);
            if input <= right.input {
                let span = right.input - left.input;
                if span <= f32::EPSILON {
                    return right.output;
                }
                let t = (input - left.input) / span;
                return left.output + (right.output - left.output) * t;
            }
        }
        self.points
            .last()
            .map(|point| point.output)
            .unwrap_or(1.0)
    }
}

/// Condition that activates a difficulty wave.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaveTrigger {
    /// Active once the current speed reaches the threshold in km/h.
    SpeedAtLeast(f32),
    /// Active once the traveled distance reaches the threshold in world units.
    DistanceAtLeast(f32),
}

fn default_multiplier() -> f32 {
    1.0
}

/// One difficulty tier scaling weights, density and slot count.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Wave {
    /// Condition under which the wave becomes active.
    pub trigger: WaveTrigger,
    /// Per-category weight multipliers applied while the wave is active.
    #[serde(default)]
    pub weight_multipliers: CategoryMultipliers,
    /// Multiplier applied to the segment slot count.
    #[serde(default = "default_multiplier")]
    pub slot_multiplier: f32,
    /// Multiplier applied to the per-cell density.
    #[serde(default = "default_multiplier")]
    pub density_multiplier: f32,
    /// Multiplier applied to the bonus-corridor entry chance.
    #[serde(default = "default_multiplier")]
    pub bonus_chance_multiplier: f32,
    /// Replacement candidate rules; a non-empty set of rules for a category
    /// replaces that category's base list while the wave is active.
    #[serde(default)]
    pub rule_overrides: Vec<ContentRule>,
}

impl Wave {
    /// Creates a neutral wave activated by the provided trigger.
    #[must_use]
    pub fn new(trigger: WaveTrigger) -> Self {
        Self {
            trigger,
            weight_multipliers: CategoryMultipliers::default(),
            slot_multiplier: 1.0,
            density_multiplier: 1.0,
            bonus_chance_multiplier: 1.0,
            rule_overrides: Vec::new(),
        }
    }

    /// Returns the wave's override rules for a category, if any were declared.
    #[must_use]
    pub fn overrides_for(&self, category: Category) -> Option<Vec<&ContentRule>> {
        let rules: Vec<&ContentRule> = self
            .rule_overrides
            .iter()
            .filter(|rule| rule.category == category)
            .collect();
        if rules.is_empty() {
            None
        } else {
            Some(rules)
        }
    }
}

/// Ordered list of difficulty waves keyed by ascending thresholds.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WaveSchedule {
    waves: Vec<Wave>,
}

impl WaveSchedule {
    /// Creates a schedule from the provided waves in designer order.
    #[must_use]
    pub fn new(waves: Vec<Wave>) -> Self {
        Self { waves }
    }

    /// Selects the active wave for the provided speed and distance.
    ///
    /// The last wave whose trigger condition holds wins, so schedules keyed
    /// by ascending thresholds select the most recently crossed tier.
    #[must_use]
    pub fn active(&self, speed_kph: f32, distance: f32) -> Option<(usize, &Wave)> {
        let mut selected = None;
        for (index, wave) in self.waves.iter().enumerate() {
            let triggered = match wave.trigger {
                WaveTrigger::SpeedAtLeast(threshold) => speed_kph >= threshold,
                WaveTrigger::DistanceAtLeast(threshold) => distance >= threshold,
            };
            if triggered {
                selected = Some((index, wave));
            }
        }
        selected
    }

    /// Retrieves a wave by its schedule index.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Wave> {
        self.waves.get(index)
    }

    /// Borrows the waves in schedule order.
    #[must_use]
    pub fn waves(&self) -> &[Wave] {
        &self.waves
    }
}

fn default_lane_count() -> u32 {
    3
}

fn default_segment_length() -> f32 {
    10.0
}

fn default_lane_spacing() -> f32 {
    3.0
}

fn default_pickup_height() -> f32 {
    0.3
}

/// Geometry of the generated track.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrackLayout {
    /// Length of one segment in world units.
    #[serde(default = "default_segment_length")]
    pub segment_length: f32,
    /// Number of parallel lanes across the track width.
    #[serde(default = "default_lane_count")]
    pub lane_count: u32,
    /// Distance between adjacent lane centres in world units.
    #[serde(default = "default_lane_spacing")]
    pub lane_spacing: f32,
    /// Vertical offset applied to pickup placements.
    #[serde(default = "default_pickup_height")]
    pub pickup_height: f32,
}

impl TrackLayout {
    /// Lateral offset of the provided lane's centre from the track centre.
    #[must_use]
    pub fn lane_offset_x(&self, lane: u32) -> f32 {
        (lane as f32 - (self.lane_count.saturating_sub(1)) as f32 / 2.0) * self.lane_spacing
    }
}

impl Default for TrackLayout {
    fn default() -> Self {
        Self {
            segment_length: default_segment_length(),
            lane_count: default_lane_count(),
            lane_spacing: default_lane_spacing(),
            pickup_height: default_pickup_height(),
        }
    }
}

fn default_base_slots() -> u32 {
    6
}

fn default_base_density() -> f32 {
    0.6
}

fn default_unit_curve() -> ResponseCurve {
    ResponseCurve::constant(1.0)
}

fn default_zero_curve() -> ResponseCurve {
    ResponseCurve::constant(0.0)
}

/// Speed-dependent slot-count and density response of the spawner.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DensityProfile {
    /// Slot count of a segment before speed and wave scaling.
    #[serde(default = "default_base_slots")]
    pub base_slots_per_segment: u32,
    /// Probability that a cell is attempted before speed and wave scaling.
    #[serde(default = "default_base_density")]
    pub base_density: f32,
    /// Multiplier applied to the slot count as a function of speed in km/h.
    #[serde(default = "default_unit_curve")]
    pub slot_curve: ResponseCurve,
    /// Additive density adjustment as a function of speed in km/h.
    #[serde(default = "default_zero_curve")]
    pub density_curve: ResponseCurve,
}

impl Default for DensityProfile {
    fn default() -> Self {
        Self {
            base_slots_per_segment: default_base_slots(),
            base_density: default_base_density(),
            slot_curve: default_unit_curve(),
            density_curve: default_zero_curve(),
        }
    }
}

fn default_bonus_segments() -> u32 {
    10
}

fn default_bonus_chance() -> f32 {
    0.08
}

fn default_bonus_threshold() -> f32 {
    140.0
}

/// Parameters governing bonus-corridor entry and its spawn modifiers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BonusConfig {
    /// Number of consecutive segments a bonus corridor lasts.
    #[serde(default = "default_bonus_segments")]
    pub segment_count: u32,
    /// Probability of entering a corridor once the speed threshold is met.
    #[serde(default = "default_bonus_chance")]
    pub chance: f32,
    /// Speed in km/h required before corridors may start.
    #[serde(default = "default_bonus_threshold")]
    pub speed_threshold_kph: f32,
    /// Multiplier applied to the slot count during a corridor.
    #[serde(default = "default_multiplier")]
    pub slot_multiplier: f32,
    /// Multiplier applied to the density during a corridor.
    #[serde(default = "default_multiplier")]
    pub density_multiplier: f32,
}

impl Default for BonusConfig {
    fn default() -> Self {
        Self {
            segment_count: default_bonus_segments(),
            chance: default_bonus_chance(),
            speed_threshold_kph: default_bonus_threshold(),
            slot_multiplier: 1.0,
            density_multiplier: 1.0,
        }
    }
}

/// Default category priority order: earlier categories claim contested cells.
pub const DEFAULT_CATEGORY_ORDER: [Category; 5] = [
    Category::ObstacleLow,
    Category::ObstacleHigh,
    Category::Enemy,
    Category::Pickup,
    Category::Boss,
];

/// Read-only rule configuration grouped by category.
#[derive(Clone, Debug, PartialEq)]
pub struct RuleSet {
    rules: Vec<ContentRule>,
    global_multipliers: CategoryMultipliers,
    category_order: Vec<Category>,
}

impl RuleSet {
    /// Creates a rule set with the default category priority order.
    #[must_use]
    pub fn new(rules: Vec<ContentRule>, global_multipliers: CategoryMultipliers) -> Self {
        Self {
            rules,
            global_multipliers,
            category_order: DEFAULT_CATEGORY_ORDER.to_vec(),
        }
    }

    /// Replaces the category priority order.
    ///
    /// Earlier categories get first claim on contested cells during segment
    /// fill. The order must not list a category twice.
    pub fn with_category_order(mut self, order: Vec<Category>) -> Result<Self, RuleError> {
        let mut seen = CategorySet::empty();
        for &category in &order {
            if seen.contains(category) {
                return Err(RuleError::DuplicateCategoryInOrder { category });
            }
            seen.insert(category);
        }
        self.category_order = order;
        Ok(self)
    }

    /// Iterates the rules declared for the provided category, in load order.
    pub fn rules_for(&self, category: Category) -> impl Iterator<Item = &ContentRule> {
        self.rules.iter().filter(move |rule| rule.category == category)
    }

    /// Retrieves the global weight multiplier for the provided category.
    #[must_use]
    pub fn global_weight_multiplier(&self, category: Category) -> f32 {
        self.global_multipliers.get(category)
    }

    /// Borrows the designer-declared category priority order.
    #[must_use]
    pub fn category_order(&self) -> &[Category] {
        &self.category_order
    }

    /// Borrows every rule in load order.
    #[must_use]
    pub fn rules(&self) -> &[ContentRule] {
        &self.rules
    }

    /// Designer-time convenience: rules with an empty incompatibility list
    /// default to being incompatible with every other category.
    pub fn autofill_incompatibilities(&mut self) {
        for rule in &mut self.rules {
            if rule.incompatible_categories.is_empty() {
                rule.incompatible_categories = Category::ALL
                    .iter()
                    .copied()
                    .filter(|category| *category != rule.category)
                    .collect();
            }
        }
    }

    /// Validates every rule against the track's lane count.
    pub fn validate(&self, lane_count: u32) -> Result<(), RuleError> {
        for rule in &self.rules {
            rule.validate(lane_count)?;
        }
        Ok(())
    }
}

/// Derived, time-varying parameters computed once per segment generation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DifficultyContext {
    /// Current forward speed in km/h (0.0 when the source is unavailable).
    pub speed_kph: f32,
    /// Index of the active wave within the schedule, if any.
    pub active_wave: Option<usize>,
    /// Whether the segment belongs to a bonus corridor.
    pub bonus_active: bool,
    /// Bonus segments remaining after this one.
    pub bonus_remaining: u32,
    /// Number of slots partitioning the new segment.
    pub slot_count: u32,
    /// Probability that an unoccupied cell is attempted at all.
    pub density: f32,
}

/// One placement decided by the content selector.
#[derive(Clone, Debug, PartialEq)]
pub struct PlannedPlacement {
    /// Cell claimed by the placement.
    pub cell: SlotCoord,
    /// Pool key of the content to spawn.
    pub key: ContentKey,
    /// Category recorded for dependency checks.
    pub category: Category,
    /// World-space position at the slot centre.
    pub position: WorldPosition,
}

/// Complete fill decision for one segment, in placement order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SegmentPlan {
    /// Placements in the order they were decided.
    pub placements: Vec<PlannedPlacement>,
}

/// Acquire/release service placing content instances by pool key.
pub trait SpawnPort {
    /// Acquires an instance of the keyed content at the provided position.
    ///
    /// Returns `None` when the key is not registered with the pool; the
    /// caller degrades the placement instead of failing the segment.
    fn acquire(
        &mut self,
        key: &ContentKey,
        position: WorldPosition,
        orientation: Orientation,
        segment: SegmentId,
    ) -> Option<InstanceHandle>;

    /// Releases a previously acquired instance. Idempotent.
    fn release(&mut self, handle: InstanceHandle);
}

/// Read-only forward-speed signal in km/h.
pub trait SpeedSource {
    /// Samples the current speed; `None` when no provider is bound yet.
    fn speed_kph(&self) -> Option<f32>;
}

/// Read-only progress signal measuring distance along the track.
pub trait ProgressSource {
    /// Samples the traveled distance; `None` when no provider is bound yet.
    fn distance(&self) -> Option<f32>;
}

/// Events broadcast by the track scroller as it generates and retires
/// segments.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// A new segment was generated at the frontier.
    SegmentSpawned {
        /// Identifier assigned to the segment.
        segment: SegmentId,
        /// World-space origin of the segment along the travel axis.
        origin_z: f32,
        /// Number of slots partitioning the segment.
        slot_count: u32,
        /// Whether the segment belongs to a bonus corridor.
        bonus: bool,
    },
    /// Content was placed into a cell of the newest segment.
    ContentPlaced {
        /// Segment that owns the placement.
        segment: SegmentId,
        /// Cell claimed by the placement.
        cell: SlotCoord,
        /// Pool key of the spawned content.
        key: ContentKey,
        /// Category of the spawned content.
        category: Category,
        /// World-space position of the placement.
        position: WorldPosition,
    },
    /// A planned placement could not acquire an instance from the pool.
    PlacementFailed {
        /// Segment that owns the wasted cell.
        segment: SegmentId,
        /// Cell consumed by the failed placement.
        cell: SlotCoord,
        /// Pool key that was not registered.
        key: ContentKey,
    },
    /// The oldest segment fell behind the viewpoint and was reclaimed.
    SegmentRetired {
        /// Identifier of the retired segment.
        segment: SegmentId,
        /// Number of instances released back to the pool.
        released: u32,
    },
    /// A bonus corridor started with the newest segment.
    BonusEntered {
        /// Total number of segments the corridor will span.
        segments: u32,
    },
    /// The bonus corridor expired.
    BonusEnded,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::de::DeserializeOwned;

    #[test]
    fn slot_distance_ignores_lanes() {
        let left = SlotCoord::new(0, 2);
        let right = SlotCoord::new(2, 5);
        assert_eq!(left.slot_distance(right), 3);
        assert_eq!(right.slot_distance(left), 3);
    }

    #[test]
    fn category_set_tracks_membership() {
        let mut set = CategorySet::empty();
        assert!(set.is_empty());
        set.insert(Category::Enemy);
        assert!(set.contains(Category::Enemy));
        assert!(!set.contains(Category::Pickup));

        let other = CategorySet::from_slice(&[Category::Enemy, Category::Boss]);
        assert!(set.intersects(other));
        assert!(!set.intersects(CategorySet::from_slice(&[Category::Pickup])));
    }

    #[test]
    fn lane_offset_centres_the_middle_lane() {
        let layout = TrackLayout::default();
        assert!((layout.lane_offset_x(0) + layout.lane_spacing).abs() < f32::EPSILON);
        assert!(layout.lane_offset_x(1).abs() < f32::EPSILON);
        assert!((layout.lane_offset_x(2) - layout.lane_spacing).abs() < f32::EPSILON);
    }

    #[test]
    fn curve_evaluation_clamps_and_interpolates() {
        let curve = ResponseCurve::linear(30.0, 1.0, 120.0, 2.0);
        assert!((curve.evaluate(0.0) - 1.0).abs() < f32::EPSILON);
        assert!((curve.evaluate(200.0) - 2.0).abs() < f32::EPSILON);
        assert!((curve.evaluate(75.0) - 1.5).abs() < 1e-5);
        assert!(curve.is_sorted());
    }

    #[test]
    fn empty_curve_is_a_neutral_multiplier() {
        let curve = ResponseCurve { points: Vec::new() };
        assert!((curve.evaluate(50.0) - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn schedule_selects_the_last_matching_wave() {
        let schedule = WaveSchedule::new(vec![
            Wave::new(WaveTrigger::DistanceAtLeast(0.0)),
            Wave::new(WaveTrigger::DistanceAtLeast(100.0)),
            Wave::new(WaveTrigger::DistanceAtLeast(400.0)),
        ]);
        let (index, _) = schedule.active(0.0, 150.0).expect("wave expected");
        assert_eq!(index, 1);
    }

    #[test]
    fn schedule_without_match_yields_none() {
        let schedule = WaveSchedule::new(vec![Wave::new(WaveTrigger::SpeedAtLeast(90.0))]);
        assert!(schedule.active(50.0, 1_000.0).is_none());
    }

    #[test]
    fn rule_validation_rejects_inverted_speed_range() {
        let mut rule = ContentRule::new(ContentKey::new("rock"), Category::ObstacleLow, 1.0);
        rule.min_speed_kph = 90.0;
        rule.max_speed_kph = 30.0;
        assert!(matches!(
            rule.validate(3),
            Err(RuleError::InvalidSpeedRange { .. })
        ));
    }

    #[test]
    fn rule_validation_rejects_conflicting_bonus_flags() {
        let mut rule = ContentRule::new(ContentKey::new("coin"), Category::Pickup, 1.0);
        rule.only_in_bonus = true;
        rule.only_outside_bonus = true;
        assert!(matches!(
            rule.validate(3),
            Err(RuleError::ConflictingBonusFlags { .. })
        ));
    }

    #[test]
    fn rule_validation_rejects_out_of_range_lane() {
        let mut rule = ContentRule::new(ContentKey::new("drone"), Category::Enemy, 1.0);
        rule.allowed_lanes = vec![3];
        assert!(matches!(
            rule.validate(3),
            Err(RuleError::LaneOutOfRange { lane: 3, .. })
        ));
        rule.allowed_lanes = vec![2];
        assert!(rule.validate(3).is_ok());
    }

    #[test]
    fn autofill_targets_only_rules_without_incompatibilities() {
        let mut declared = ContentRule::new(ContentKey::new("rock"), Category::ObstacleLow, 1.0);
        declared.incompatible_categories = vec![Category::Boss];
        let blank = ContentRule::new(ContentKey::new("coin"), Category::Pickup, 1.0);

        let mut rules = RuleSet::new(vec![declared, blank], CategoryMultipliers::default());
        rules.autofill_incompatibilities();

        assert_eq!(rules.rules()[0].incompatible_categories, vec![Category::Boss]);
        let filled = &rules.rules()[1].incompatible_categories;
        assert_eq!(filled.len(), 4);
        assert!(!filled.contains(&Category::Pickup));
    }

    #[test]
    fn category_order_rejects_duplicates() {
        let rules = RuleSet::new(Vec::new(), CategoryMultipliers::default());
        let result =
            rules.with_category_order(vec![Category::Pickup, Category::Pickup]);
        assert!(matches!(
            result,
            Err(RuleError::DuplicateCategoryInOrder {
                category: Category::Pickup
            })
        ));
    }

    fn assert_round_trip<T>(value: &T)
    where
        T: serde::Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn content_rule_round_trips_through_bincode() {
        let mut rule = ContentRule::new(ContentKey::new("rock"), Category::ObstacleLow, 2.5);
        rule.allowed_lanes = vec![0, 2];
        rule.incompatible_categories = vec![Category::Enemy];
        rule.dependency_radius = 2;
        assert_round_trip(&rule);
    }

    #[test]
    fn wave_round_trips_through_bincode() {
        let mut wave = Wave::new(WaveTrigger::SpeedAtLeast(120.0));
        wave.slot_multiplier = 1.5;
        wave.rule_overrides = vec![ContentRule::new(
            ContentKey::new("gold"),
            Category::Pickup,
            3.0,
        )];
        assert_round_trip(&wave);
    }

    #[test]
    fn slot_coord_round_trips_through_bincode() {
        assert_round_trip(&SlotCoord::new(1, 7));
    }

    #[test]
    fn segment_id_round_trips_through_bincode() {
        assert_round_trip(&SegmentId::new(42));
    }
}
