use super::*;

use crate::constants::{
    DOT_CELLS_PER_AXIS, GRID_ORIGIN, GRID_SPACING, PLACEMENT_ATTEMPT_CAP,
    POWER_SPAWN_CELLS_PER_AXIS, PURSUER_SIZE, PURSUER_SPAWN_BASE, PURSUER_SPAWN_STEP,
    PURSUER_SPEED,
};

use super::utils::behavior_for_slot;

/// The full dot grid, x-major, in deterministic order.
pub(super) fn initial_dots() -> Vec<Vec2> {
    let mut dots = Vec::with_capacity((DOT_CELLS_PER_AXIS * DOT_CELLS_PER_AXIS) as usize);
    for col in 0..DOT_CELLS_PER_AXIS {
        for row in 0..DOT_CELLS_PER_AXIS {
            dots.push(Vec2 {
                x: GRID_ORIGIN + col * GRID_SPACING,
                y: GRID_ORIGIN + row * GRID_SPACING,
            });
        }
    }
    dots
}

/// A random grid-aligned cell whose box does not overlap any wall.
/// Rejection sampling is capped; past the cap a row-major scan takes
/// the first open cell, so placement terminates on any layout.
pub(super) fn random_open_cell(
    walls: &[Rect],
    rng: &mut Rng,
    cells_per_axis: i32,
    size: i32,
) -> Vec2 {
    let is_open = |x: i32, y: i32| {
        let rect = Rect::square(x, y, size);
        walls.iter().all(|wall| !rect.overlaps(wall))
    };

    for _ in 0..PLACEMENT_ATTEMPT_CAP {
        let x = rng.grid_coord(cells_per_axis);
        let y = rng.grid_coord(cells_per_axis);
        if is_open(x, y) {
            return Vec2 { x, y };
        }
    }

    for row in 0..cells_per_axis {
        for col in 0..cells_per_axis {
            let x = GRID_ORIGIN + col * GRID_SPACING;
            let y = GRID_ORIGIN + row * GRID_SPACING;
            if is_open(x, y) {
                return Vec2 { x, y };
            }
        }
    }

    Vec2 {
        x: GRID_ORIGIN,
        y: GRID_ORIGIN,
    }
}

impl GameEngine {
    /// Replaces the whole pursuer set for the current level: count
    /// `min(level + 1, MAX_PURSUERS)`, behaviors cycling the fixed
    /// pattern, hues randomized, spawns along the center diagonal.
    /// A diagonal slot blocked by the level's walls is relocated to a
    /// sampled open cell so the rollback invariant holds from spawn.
    pub(super) fn regenerate_pursuers(&mut self) {
        let walls = walls_for(self.level);
        let count = ((self.level + 1) as usize).min(MAX_PURSUERS);
        self.pursuers.clear();
        for slot in 0..count {
            let mut pos = Vec2 {
                x: PURSUER_SPAWN_BASE + slot as i32 * PURSUER_SPAWN_STEP,
                y: PURSUER_SPAWN_BASE + slot as i32 * PURSUER_SPAWN_STEP,
            };
            let rect = Rect::square(pos.x, pos.y, PURSUER_SIZE);
            if walls.iter().any(|wall| rect.overlaps(wall)) {
                pos = random_open_cell(walls, &mut self.rng, DOT_CELLS_PER_AXIS, PURSUER_SIZE);
            }
            let hue = self.rng.next_f32();
            self.pursuers.push(PursuerInternal::new(
                pos,
                behavior_for_slot(slot),
                hue,
                PURSUER_SPEED,
            ));
        }
    }

    /// Spawns the single power item once the tick interval since the
    /// last spawn or pickup has elapsed.
    pub(super) fn maybe_spawn_power_item(&mut self) {
        if self.power_item.is_some() {
            return;
        }
        if self
            .tick_counter
            .saturating_sub(self.last_power_spawn_tick)
            <= POWER_SPAWN_INTERVAL_TICKS
        {
            return;
        }
        let cell = random_open_cell(
            walls_for(self.level),
            &mut self.rng,
            POWER_SPAWN_CELLS_PER_AXIS,
            POWER_ITEM_SIZE,
        );
        self.power_item = Some(cell);
        self.last_power_spawn_tick = self.tick_counter;
        self.events.push(RuntimeEvent::PowerSpawned {
            x: cell.x,
            y: cell.y,
        });
    }
}
