use serde::Serialize;

use crate::geometry::Rect;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
    None,
}

impl Direction {
    pub fn parse_move(value: &str) -> Option<Self> {
        match value {
            "up" => Some(Self::Up),
            "down" => Some(Self::Down),
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            "none" => Some(Self::None),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "easy" => Some(Self::Easy),
            "medium" => Some(Self::Medium),
            "hard" => Some(Self::Hard),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BehaviorKind {
    Pursuit,
    Wander,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Menu,
    Running,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Vec2 {
    pub x: i32,
    pub y: i32,
}

#[derive(Clone, Copy, Debug, Serialize)]
pub struct PursuerView {
    pub rect: Rect,
    pub hue: f32,
    pub behavior: BehaviorKind,
    pub dir: Direction,
}

#[derive(Clone, Copy, Debug, Serialize)]
pub struct GameConfig {
    #[serde(rename = "tickMs")]
    pub tick_ms: u64,
    #[serde(rename = "tickRate")]
    pub tick_rate: u32,
    #[serde(rename = "powerDurationTicks")]
    pub power_duration_ticks: u32,
    #[serde(rename = "powerSpawnIntervalTicks")]
    pub power_spawn_interval_ticks: u64,
    #[serde(rename = "dotScore")]
    pub dot_score: i32,
    #[serde(rename = "levelScoreThreshold")]
    pub level_score_threshold: i32,
    #[serde(rename = "maxPursuers")]
    pub max_pursuers: usize,
    #[serde(rename = "playerSpeed")]
    pub player_speed: i32,
    pub difficulty: Difficulty,
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuntimeEvent {
    DotEaten {
        x: i32,
        y: i32,
    },
    PowerSpawned {
        x: i32,
        y: i32,
    },
    PowerTaken,
    PowerExpired,
    LevelUp {
        level: i32,
    },
    GameOver {
        tick: u64,
    },
}

#[derive(Clone, Debug, Serialize)]
pub struct Snapshot {
    pub tick: u64,
    pub player: Rect,
    pub dots: Vec<Rect>,
    pub pursuers: Vec<PursuerView>,
    #[serde(rename = "powerItem")]
    pub power_item: Option<Rect>,
    #[serde(rename = "powerActive")]
    pub power_active: bool,
    #[serde(rename = "powerTicksLeft")]
    pub power_ticks_left: u32,
    pub score: i32,
    pub level: i32,
    #[serde(rename = "gameOver")]
    pub game_over: bool,
    #[serde(rename = "inMenu")]
    pub in_menu: bool,
    pub events: Vec<RuntimeEvent>,
}

#[derive(Clone, Debug, Serialize)]
pub struct SessionSummary {
    pub score: i32,
    pub level: i32,
    #[serde(rename = "dotsEaten")]
    pub dots_eaten: i32,
    #[serde(rename = "durationTicks")]
    pub duration_ticks: u64,
    #[serde(rename = "gameOver")]
    pub game_over: bool,
    pub difficulty: Difficulty,
}
