use crate::types::Difficulty;

pub const TICK_MS: u64 = 30;
pub const TICK_RATE: u32 = (1000 / TICK_MS) as u32;

pub const PLAYER_SIZE: i32 = 30;
pub const PURSUER_SIZE: i32 = 30;
pub const DOT_SIZE: i32 = 10;
pub const POWER_ITEM_SIZE: i32 = 20;

pub const GRID_ORIGIN: i32 = 50;
pub const GRID_SPACING: i32 = 30;
pub const DOT_CELLS_PER_AXIS: i32 = 10;
pub const PLAYER_SPAWN_CELLS_PER_AXIS: i32 = 11;
pub const POWER_SPAWN_CELLS_PER_AXIS: i32 = 10;

pub const DOT_SCORE: i32 = 10;
pub const LEVEL_SCORE_THRESHOLD: i32 = 300;
pub const MAX_LEVEL: i32 = 1000;

pub const MAX_PURSUERS: usize = 5;
pub const PURSUER_SPEED: i32 = 1;
pub const PURSUER_SPAWN_BASE: i32 = 200;
pub const PURSUER_SPAWN_STEP: i32 = 30;

pub const POWER_DURATION_TICKS: u32 = 100;
pub const POWER_SPAWN_INTERVAL_MS: u64 = 60_000;
pub const POWER_SPAWN_INTERVAL_TICKS: u64 = POWER_SPAWN_INTERVAL_MS / TICK_MS;

pub const PLACEMENT_ATTEMPT_CAP: u32 = 64;

pub fn get_player_speed(difficulty: Difficulty) -> i32 {
    match difficulty {
        Difficulty::Easy => 6,
        Difficulty::Medium => 8,
        Difficulty::Hard => 10,
    }
}
