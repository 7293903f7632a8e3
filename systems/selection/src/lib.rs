#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Weighted, constraint-checked content selection for one track segment.
//!
//! The selector partitions a segment into a lane×slot reservation grid and
//! fills it category by category in the rule set's priority order. Earlier
//! categories get first claim on contested cells; once a cell is occupied no
//! later pass may reclaim it.

use lane_runner_core::{
    Category, CategorySet, ContentRule, DifficultyContext, PlannedPlacement, RuleSet, SegmentPlan,
    SlotCoord, TrackLayout, WaveSchedule, WorldPosition,
};
use rand::seq::SliceRandom;
use rand::Rng;

#[derive(Clone, Copy, Debug, Default)]
struct Cell {
    occupied: bool,
    categories: CategorySet,
}

/// Per-segment reservation matrix of lanes crossed with slots.
///
/// The grid exists only during one segment's fill phase; once a cell reports
/// `occupied` it never becomes free again.
#[derive(Debug)]
pub struct SlotGrid {
    lane_count: u32,
    slot_count: u32,
    cells: Vec<Cell>,
}

impl SlotGrid {
    /// Creates an empty grid with the provided dimensions.
    #[must_use]
    pub fn new(lane_count: u32, slot_count: u32) -> Self {
        Self {
            lane_count,
            slot_count,
            cells: vec![Cell::default(); lane_count as usize * slot_count as usize],
        }
    }

    /// Number of lanes across the grid.
    #[must_use]
    pub const fn lane_count(&self) -> u32 {
        self.lane_count
    }

    /// Number of slots along the grid.
    #[must_use]
    pub const fn slot_count(&self) -> u32 {
        self.slot_count
    }

    fn index(&self, lane: u32, slot: u32) -> usize {
        lane as usize * self.slot_count as usize + slot as usize
    }

    /// Reports whether the provided cell is already claimed.
    #[must_use]
    pub fn is_occupied(&self, cell: SlotCoord) -> bool {
        self.cells[self.index(cell.lane(), cell.slot())].occupied
    }

    /// Claims a cell for the provided category.
    pub fn mark(&mut self, cell: SlotCoord, category: Category) {
        let index = self.index(cell.lane(), cell.slot());
        self.cells[index].occupied = true;
        self.cells[index].categories.insert(category);
    }

    /// Number of cells claimed so far.
    #[must_use]
    pub fn occupied_count(&self) -> u32 {
        self.cells.iter().filter(|cell| cell.occupied).count() as u32
    }

    /// Scans `±radius` slots around the provided slot, across all lanes, for
    /// any placed category contained in the provided set.
    #[must_use]
    pub fn category_within(&self, slot: u32, radius: u32, set: CategorySet) -> bool {
        if set.is_empty() || self.slot_count == 0 {
            return false;
        }
        let start = slot.saturating_sub(radius);
        let end = slot.saturating_add(radius).min(self.slot_count - 1);
        for scan in start..=end {
            for lane in 0..self.lane_count {
                if self.cells[self.index(lane, scan)].categories.intersects(set) {
                    return true;
                }
            }
        }
        false
    }

    /// Reports whether a placement of the category exists closer than
    /// `distance` slot units, in any lane.
    #[must_use]
    pub fn same_category_closer_than(&self, slot: u32, distance: u32, category: Category) -> bool {
        if distance == 0 {
            return false;
        }
        self.category_within(slot, distance - 1, CategorySet::empty().with(category))
    }
}

/// Pure system that fills a segment's slot grid from the rule configuration.
///
/// The slot visit order is a fresh random permutation per segment so low
/// slot indices carry no systematic bias when the density gate rejects cells.
#[derive(Debug, Default)]
pub struct ContentSelector {
    slot_order: Vec<u32>,
}

impl ContentSelector {
    /// Creates a selector with an empty scratch buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decides every placement for one segment.
    ///
    /// Draws from the provided stream in a fixed order (permutation, density
    /// gates, weighted picks), which keeps the outcome reproducible for a
    /// fixed seed and signal trace.
    pub fn fill_segment(
        &mut self,
        rules: &RuleSet,
        waves: &WaveSchedule,
        context: &DifficultyContext,
        layout: &TrackLayout,
        origin_z: f32,
        rng: &mut impl Rng,
    ) -> SegmentPlan {
        let mut plan = SegmentPlan::default();
        if context.slot_count == 0 || layout.lane_count == 0 {
            return plan;
        }

        let mut grid = SlotGrid::new(layout.lane_count, context.slot_count);
        let step = layout.segment_length / context.slot_count as f32;
        let active_wave = context.active_wave.and_then(|index| waves.get(index));

        self.slot_order.clear();
        self.slot_order.extend(0..context.slot_count);
        self.slot_order.shuffle(rng);

        for &category in rules.category_order() {
            let candidates: Vec<&ContentRule> = match active_wave
                .and_then(|wave| wave.overrides_for(category))
            {
                Some(overrides) => overrides,
                None => rules.rules_for(category).collect(),
            };

            let global = rules.global_weight_multiplier(category);
            let wave_mult = active_wave
                .map(|wave| wave.weight_multipliers.get(category))
                .unwrap_or(1.0);
            let weighted: Vec<(&ContentRule, f32)> = candidates
                .into_iter()
                .map(|rule| (rule, rule.weight * global * wave_mult))
                .filter(|(_, weight)| *weight > 0.0)
                .collect();
            let total: f32 = weighted.iter().map(|(_, weight)| weight).sum();
            if weighted.is_empty() || total <= 0.0 {
                continue;
            }

            for &slot in &self.slot_order {
                for lane in 0..layout.lane_count {
                    let cell = SlotCoord::new(lane, slot);
                    if grid.is_occupied(cell) {
                        continue;
                    }
                    if rng.gen::<f32>() >= context.density {
                        continue;
                    }
                    let Some(rule) = weighted_draw(&weighted, total, rng) else {
                        continue;
                    };
                    if !rule_permits(rule, cell, &grid, context) {
                        continue;
                    }
                    grid.mark(cell, rule.category);
                    plan.placements.push(PlannedPlacement {
                        cell,
                        key: rule.key.clone(),
                        category: rule.category,
                        position: placement_position(layout, origin_z, step, cell, rule.category),
                    });
                }
            }
        }

        plan
    }
}

fn weighted_draw<'rules>(
    candidates: &[(&'rules ContentRule, f32)],
    total: f32,
    rng: &mut impl Rng,
) -> Option<&'rules ContentRule> {
    let roll = rng.gen::<f32>() * total;
    let mut cumulative = 0.0;
    for &(rule, weight) in candidates {
        cumulative += weight;
        if roll < cumulative {
            return Some(rule);
        }
    }
    candidates.last().map(|&(rule, _)| rule)
}

fn rule_permits(
    rule: &ContentRule,
    cell: SlotCoord,
    grid: &SlotGrid,
    context: &DifficultyContext,
) -> bool {
    if context.speed_kph < rule.min_speed_kph || context.speed_kph > rule.max_speed_kph {
        return false;
    }
    if rule.only_in_bonus && !context.bonus_active {
        return false;
    }
    if rule.only_outside_bonus && context.bonus_active {
        return false;
    }
    if !rule.allows_lane(cell.lane()) {
        return false;
    }

    let incompatible = CategorySet::from_slice(&rule.incompatible_categories);
    if grid.category_within(cell.slot(), rule.dependency_radius, incompatible) {
        return false;
    }

    if !rule.required_categories.is_empty() {
        let required = CategorySet::from_slice(&rule.required_categories);
        if !grid.category_within(cell.slot(), rule.dependency_radius, required) {
            return false;
        }
    }

    if rule.min_distance_between_same > 0
        && grid.same_category_closer_than(cell.slot(), rule.min_distance_between_same, rule.category)
    {
        return false;
    }

    true
}

fn placement_position(
    layout: &TrackLayout,
    origin_z: f32,
    step: f32,
    cell: SlotCoord,
    category: Category,
) -> WorldPosition {
    let x = layout.lane_offset_x(cell.lane());
    let y = if category == Category::Pickup {
        layout.pickup_height
    } else {
        0.0
    };
    let z = origin_z + (cell.slot() as f32 + 0.5) * step;
    WorldPosition::new(x, y, z)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn marked_cells_stay_occupied() {
        let mut grid = SlotGrid::new(3, 4);
        let cell = SlotCoord::new(1, 2);
        assert!(!grid.is_occupied(cell));
        grid.mark(cell, Category::Enemy);
        assert!(grid.is_occupied(cell));
        assert_eq!(grid.occupied_count(), 1);
    }

    #[test]
    fn window_scan_crosses_lanes() {
        let mut grid = SlotGrid::new(3, 6);
        grid.mark(SlotCoord::new(0, 1), Category::ObstacleLow);

        let set = CategorySet::empty().with(Category::ObstacleLow);
        assert!(grid.category_within(3, 2, set));
        assert!(!grid.category_within(4, 2, set));
        assert!(!grid.category_within(3, 2, CategorySet::empty().with(Category::Boss)));
    }

    #[test]
    fn spacing_scan_uses_strict_distance() {
        let mut grid = SlotGrid::new(2, 8);
        grid.mark(SlotCoord::new(0, 3), Category::ObstacleHigh);

        assert!(grid.same_category_closer_than(4, 2, Category::ObstacleHigh));
        assert!(!grid.same_category_closer_than(5, 2, Category::ObstacleHigh));
        assert!(!grid.same_category_closer_than(4, 0, Category::ObstacleHigh));
    }

    #[test]
    fn weighted_draw_honors_cumulative_order() {
        let heavy = ContentRule::new(
            lane_runner_core::ContentKey::new("heavy"),
            Category::Pickup,
            1.0,
        );
        let zero_chance = ContentRule::new(
            lane_runner_core::ContentKey::new("light"),
            Category::Pickup,
            1.0,
        );
        let candidates = vec![(&heavy, 1.0_f32), (&zero_chance, 0.0_f32)];
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        for _ in 0..32 {
            let pick = weighted_draw(&candidates, 1.0, &mut rng).expect("candidate expected");
            assert_eq!(pick.key.as_str(), "heavy");
        }
    }

    #[test]
    fn bonus_flags_gate_rule_eligibility() {
        let grid = SlotGrid::new(1, 1);
        let cell = SlotCoord::new(0, 0);
        let context = DifficultyContext {
            speed_kph: 50.0,
            active_wave: None,
            bonus_active: false,
            bonus_remaining: 0,
            slot_count: 1,
            density: 1.0,
        };

        let mut bonus_only = ContentRule::new(
            lane_runner_core::ContentKey::new("gold"),
            Category::Pickup,
            1.0,
        );
        bonus_only.only_in_bonus = true;
        assert!(!rule_permits(&bonus_only, cell, &grid, &context));

        let mut normal_only = ContentRule::new(
            lane_runner_core::ContentKey::new("rock"),
            Category::ObstacleLow,
            1.0,
        );
        normal_only.only_outside_bonus = true;
        assert!(rule_permits(&normal_only, cell, &grid, &context));
    }
}
