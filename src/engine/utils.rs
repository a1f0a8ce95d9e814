use crate::rng::Rng;
use crate::types::{BehaviorKind, Direction};

const BEHAVIOR_PATTERN: [BehaviorKind; 5] = [
    BehaviorKind::Pursuit,
    BehaviorKind::Wander,
    BehaviorKind::Wander,
    BehaviorKind::Pursuit,
    BehaviorKind::Wander,
];

pub(super) fn offset(x: i32, y: i32, dir: Direction, step: i32) -> (i32, i32) {
    match dir {
        Direction::Up => (x, y - step),
        Direction::Down => (x, y + step),
        Direction::Left => (x - step, y),
        Direction::Right => (x + step, y),
        Direction::None => (x, y),
    }
}

const WANDER_DIRECTIONS: [Direction; 4] = [
    Direction::Up,
    Direction::Down,
    Direction::Left,
    Direction::Right,
];

pub(super) fn random_direction(rng: &mut Rng) -> Direction {
    WANDER_DIRECTIONS[rng.pick_index(WANDER_DIRECTIONS.len())]
}

/// Behavior for the n-th pursuer slot, cycling through the fixed pattern.
pub(super) fn behavior_for_slot(slot: usize) -> BehaviorKind {
    BEHAVIOR_PATTERN[slot % BEHAVIOR_PATTERN.len()]
}
