use crate::constants::{
    get_player_speed, DOT_SCORE, DOT_SIZE, LEVEL_SCORE_THRESHOLD, MAX_LEVEL, MAX_PURSUERS,
    PLAYER_SIZE, POWER_DURATION_TICKS, POWER_ITEM_SIZE, POWER_SPAWN_INTERVAL_TICKS, TICK_MS,
    TICK_RATE,
};
use crate::geometry::Rect;
use crate::rng::Rng;
use crate::types::{
    Difficulty, Direction, GameConfig, RuntimeEvent, SessionPhase, SessionSummary, Snapshot, Vec2,
};
use crate::walls::walls_for;

mod pursuer;
mod spawn_system;
mod utils;

use self::pursuer::PursuerInternal;
use self::spawn_system::{initial_dots, random_open_cell};
use self::utils::offset;

/// Authoritative simulation state. One instance per session; the
/// driver owns it exclusively and advances it one `tick` at a time.
#[derive(Clone, Debug)]
pub struct GameEngine {
    config: GameConfig,
    rng: Rng,
    phase: SessionPhase,
    player: Vec2,
    score: i32,
    level: i32,
    game_over: bool,
    power_active: bool,
    power_ticks: u32,
    dots: Vec<Vec2>,
    pursuers: Vec<PursuerInternal>,
    power_item: Option<Vec2>,
    last_power_spawn_tick: u64,
    tick_counter: u64,
    dots_eaten: i32,
    events: Vec<RuntimeEvent>,
}

fn build_config(difficulty: Difficulty) -> GameConfig {
    GameConfig {
        tick_ms: TICK_MS,
        tick_rate: TICK_RATE,
        power_duration_ticks: POWER_DURATION_TICKS,
        power_spawn_interval_ticks: POWER_SPAWN_INTERVAL_TICKS,
        dot_score: DOT_SCORE,
        level_score_threshold: LEVEL_SCORE_THRESHOLD,
        max_pursuers: MAX_PURSUERS,
        player_speed: get_player_speed(difficulty),
        difficulty,
    }
}

impl GameEngine {
    /// A fresh engine sits in the menu phase; nothing is simulated
    /// until `start_session`.
    pub fn new(seed: u32) -> Self {
        Self {
            config: build_config(Difficulty::Medium),
            rng: Rng::new(seed),
            phase: SessionPhase::Menu,
            player: Vec2 { x: 0, y: 0 },
            score: 0,
            level: 1,
            game_over: false,
            power_active: false,
            power_ticks: 0,
            dots: Vec::new(),
            pursuers: Vec::new(),
            power_item: None,
            last_power_spawn_tick: 0,
            tick_counter: 0,
            dots_eaten: 0,
            events: Vec::new(),
        }
    }

    /// Leaves the menu and starts a run at the chosen difficulty,
    /// which fixes the player's step size for the session.
    pub fn start_session(&mut self, difficulty: Difficulty) {
        self.config = build_config(difficulty);
        self.phase = SessionPhase::Running;
        self.reset_run();
    }

    /// Restarts the run, keeping the chosen difficulty. Clears the
    /// terminal flag; this is the only way out of it.
    pub fn reset_session(&mut self) {
        self.phase = SessionPhase::Running;
        self.reset_run();
    }

    pub fn is_ended(&self) -> bool {
        self.game_over
    }

    pub fn is_in_menu(&self) -> bool {
        self.phase == SessionPhase::Menu
    }

    pub fn config(&self) -> GameConfig {
        self.config
    }

    fn reset_run(&mut self) {
        self.score = 0;
        self.level = 1;
        self.game_over = false;
        self.power_active = false;
        self.power_ticks = 0;
        self.power_item = None;
        self.tick_counter = 0;
        self.dots_eaten = 0;
        self.last_power_spawn_tick = 0;
        self.events.clear();
        self.dots = initial_dots();
        self.regenerate_pursuers();
        self.place_player();
    }

    fn player_rect(&self) -> Rect {
        Rect::square(self.player.x, self.player.y, PLAYER_SIZE)
    }

    /// Advances the world by one step. A no-op in the menu phase and
    /// after the terminal flag is set.
    pub fn tick(&mut self, intent: Direction) {
        if self.game_over || self.phase == SessionPhase::Menu {
            return;
        }
        self.tick_counter += 1;

        // Intent applies directly; walls block pursuers only.
        let (px, py) = offset(self.player.x, self.player.y, intent, self.config.player_speed);
        self.player = Vec2 { x: px, y: py };

        let walls = walls_for(self.level);
        for idx in 0..self.pursuers.len() {
            self.pursuers[idx].advance(self.player, walls, &mut self.rng);
        }

        let player_rect = self.player_rect();
        if !self.power_active
            && self
                .pursuers
                .iter()
                .any(|pursuer| pursuer.rect().overlaps(&player_rect))
        {
            self.game_over = true;
            self.events.push(RuntimeEvent::GameOver {
                tick: self.tick_counter,
            });
            return;
        }

        // At most one dot per tick, in stored order.
        let mut ate_dot = false;
        if let Some(idx) = self
            .dots
            .iter()
            .position(|dot| Rect::square(dot.x, dot.y, DOT_SIZE).overlaps(&player_rect))
        {
            let dot = self.dots.remove(idx);
            self.score += DOT_SCORE;
            self.dots_eaten += 1;
            ate_dot = true;
            self.events.push(RuntimeEvent::DotEaten { x: dot.x, y: dot.y });
        }

        if let Some(item) = self.power_item {
            if Rect::square(item.x, item.y, POWER_ITEM_SIZE).overlaps(&player_rect) {
                self.power_active = true;
                self.power_ticks = 0;
                self.power_item = None;
                self.last_power_spawn_tick = self.tick_counter;
                self.events.push(RuntimeEvent::PowerTaken);
            }
        }

        // The dot gate makes the threshold fire once per crossing, not
        // on every tick the score sits on a multiple.
        if ate_dot && self.score > 0 && self.score % LEVEL_SCORE_THRESHOLD == 0 {
            self.level = (self.level + 1).min(MAX_LEVEL);
            self.regenerate_pursuers();
            self.events.push(RuntimeEvent::LevelUp { level: self.level });
        }

        if self.power_active {
            self.power_ticks += 1;
            if self.power_ticks >= POWER_DURATION_TICKS {
                self.power_active = false;
                self.events.push(RuntimeEvent::PowerExpired);
            }
        }

        self.maybe_spawn_power_item();
    }

    pub fn build_snapshot(&mut self, include_events: bool) -> Snapshot {
        let snapshot = Snapshot {
            tick: self.tick_counter,
            player: self.player_rect(),
            dots: self
                .dots
                .iter()
                .map(|dot| Rect::square(dot.x, dot.y, DOT_SIZE))
                .collect(),
            pursuers: self.pursuers.iter().map(|p| p.view()).collect(),
            power_item: self
                .power_item
                .map(|item| Rect::square(item.x, item.y, POWER_ITEM_SIZE)),
            power_active: self.power_active,
            power_ticks_left: if self.power_active {
                POWER_DURATION_TICKS - self.power_ticks
            } else {
                0
            },
            score: self.score,
            level: self.level,
            game_over: self.game_over,
            in_menu: self.phase == SessionPhase::Menu,
            events: if include_events {
                self.events.clone()
            } else {
                Vec::new()
            },
        };
        if include_events {
            self.events.clear();
        }
        snapshot
    }

    pub fn build_summary(&self) -> SessionSummary {
        SessionSummary {
            score: self.score,
            level: self.level,
            dots_eaten: self.dots_eaten,
            duration_ticks: self.tick_counter,
            game_over: self.game_over,
            difficulty: self.config.difficulty,
        }
    }

    fn place_player(&mut self) {
        self.player = random_open_cell(
            walls_for(self.level),
            &mut self.rng,
            crate::constants::PLAYER_SPAWN_CELLS_PER_AXIS,
            PLAYER_SIZE,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{GRID_ORIGIN, GRID_SPACING};
    use crate::types::BehaviorKind;

    fn running_engine(seed: u32) -> GameEngine {
        let mut engine = GameEngine::new(seed);
        engine.start_session(Difficulty::Medium);
        engine
    }

    /// Parks the player outside the dot field and away from walls so a
    /// test controls exactly what it collides with.
    fn isolate_player(engine: &mut GameEngine) {
        engine.player = Vec2 { x: 600, y: 600 };
    }

    #[test]
    fn menu_phase_ignores_ticks() {
        let mut engine = GameEngine::new(1);
        engine.tick(Direction::Right);
        let snapshot = engine.build_snapshot(false);
        assert!(snapshot.in_menu);
        assert_eq!(snapshot.tick, 0);
        assert!(snapshot.dots.is_empty());
    }

    #[test]
    fn start_session_lays_one_hundred_dots_on_the_grid() {
        let mut engine = running_engine(42);
        let snapshot = engine.build_snapshot(false);
        assert_eq!(snapshot.dots.len(), 100);
        assert_eq!(snapshot.dots[0].x, GRID_ORIGIN);
        assert_eq!(snapshot.dots[0].y, GRID_ORIGIN);
        let last = snapshot.dots[99];
        assert_eq!(last.x, GRID_ORIGIN + 9 * GRID_SPACING);
        assert_eq!(last.y, GRID_ORIGIN + 9 * GRID_SPACING);
        for dot in &snapshot.dots {
            assert_eq!((dot.x - GRID_ORIGIN) % GRID_SPACING, 0);
            assert_eq!((dot.y - GRID_ORIGIN) % GRID_SPACING, 0);
        }
    }

    #[test]
    fn start_session_spawns_two_pursuers_at_level_one() {
        let mut engine = running_engine(7);
        let snapshot = engine.build_snapshot(false);
        assert_eq!(snapshot.level, 1);
        assert_eq!(snapshot.pursuers.len(), 2);
        assert_eq!(snapshot.pursuers[0].behavior, BehaviorKind::Pursuit);
        assert_eq!(snapshot.pursuers[1].behavior, BehaviorKind::Wander);
        assert_eq!(snapshot.pursuers[0].rect.x, 200);
        assert_eq!(snapshot.pursuers[1].rect.x, 230);
    }

    #[test]
    fn player_spawn_never_overlaps_a_wall() {
        for seed in 0..50 {
            let engine = running_engine(seed);
            let player = engine.player_rect();
            for wall in walls_for(engine.level) {
                assert!(!player.overlaps(wall), "seed {seed} spawned in a wall");
            }
        }
    }

    #[test]
    fn tick_after_game_over_changes_nothing() {
        let mut engine = running_engine(11);
        engine.game_over = true;
        let before = serde_json::to_string(&engine.build_snapshot(false)).unwrap();
        for _ in 0..10 {
            engine.tick(Direction::Left);
        }
        let after = serde_json::to_string(&engine.build_snapshot(false)).unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn at_most_one_dot_is_eaten_per_tick() {
        let mut engine = running_engine(5);
        engine.pursuers.clear();
        isolate_player(&mut engine);
        // Two dots inside the player's box at the isolated position.
        engine.dots = vec![
            Vec2 { x: 605, y: 605 },
            Vec2 { x: 615, y: 615 },
            Vec2 { x: 50, y: 50 },
        ];

        engine.tick(Direction::None);
        assert_eq!(engine.score, DOT_SCORE);
        assert_eq!(engine.dots.len(), 2);

        engine.tick(Direction::None);
        assert_eq!(engine.score, 2 * DOT_SCORE);
        assert_eq!(engine.dots.len(), 1);

        // The far dot is out of reach; nothing more to eat.
        engine.tick(Direction::None);
        assert_eq!(engine.score, 2 * DOT_SCORE);
        assert_eq!(engine.dots.len(), 1);
    }

    #[test]
    fn dots_are_eaten_in_stored_order() {
        let mut engine = running_engine(5);
        engine.pursuers.clear();
        isolate_player(&mut engine);
        engine.dots = vec![Vec2 { x: 615, y: 615 }, Vec2 { x: 605, y: 605 }];

        engine.tick(Direction::None);
        assert_eq!(engine.dots, vec![Vec2 { x: 605, y: 605 }]);
    }

    #[test]
    fn score_three_hundred_levels_up_and_regenerates_pursuers() {
        let mut engine = running_engine(9);
        engine.pursuers.clear();
        isolate_player(&mut engine);
        engine.score = 290;
        engine.dots = vec![Vec2 { x: 605, y: 605 }];

        engine.tick(Direction::None);
        assert_eq!(engine.score, 300);
        assert_eq!(engine.level, 2);
        assert_eq!(engine.pursuers.len(), 3);
        assert_eq!(engine.pursuers[0].behavior, BehaviorKind::Pursuit);
        assert_eq!(engine.pursuers[1].behavior, BehaviorKind::Wander);
        assert_eq!(engine.pursuers[2].behavior, BehaviorKind::Wander);
    }

    #[test]
    fn level_increments_once_per_threshold_crossing() {
        let mut engine = running_engine(9);
        engine.pursuers.clear();
        isolate_player(&mut engine);
        engine.score = 290;
        engine.dots = vec![Vec2 { x: 605, y: 605 }];

        engine.tick(Direction::None);
        assert_eq!(engine.level, 2);

        // Score stays on the multiple; no further dot, no further level.
        engine.pursuers.clear();
        for _ in 0..5 {
            engine.tick(Direction::None);
        }
        assert_eq!(engine.score, 300);
        assert_eq!(engine.level, 2);
    }

    #[test]
    fn pursuer_count_is_capped_at_five() {
        let mut engine = running_engine(13);
        engine.level = 40;
        engine.regenerate_pursuers();
        assert_eq!(engine.pursuers.len(), MAX_PURSUERS);
    }

    #[test]
    fn level_is_clamped_at_the_maximum() {
        let mut engine = running_engine(13);
        engine.pursuers.clear();
        isolate_player(&mut engine);
        engine.level = MAX_LEVEL;
        engine.score = LEVEL_SCORE_THRESHOLD - DOT_SCORE;
        engine.dots = vec![Vec2 { x: 605, y: 605 }];

        engine.tick(Direction::None);
        assert_eq!(engine.level, MAX_LEVEL);
    }

    #[test]
    fn power_item_pickup_activates_immunity() {
        let mut engine = running_engine(21);
        engine.pursuers.clear();
        isolate_player(&mut engine);
        engine.dots.clear();
        engine.power_item = Some(Vec2 { x: 605, y: 605 });

        engine.tick(Direction::None);
        assert!(engine.power_active);
        assert!(engine.power_item.is_none());

        // A pursuer sitting on the player no longer terminates the run.
        engine
            .pursuers
            .push(PursuerInternal::new(engine.player, BehaviorKind::Pursuit, 0.1, 1));
        engine.tick(Direction::None);
        assert!(!engine.game_over);
    }

    #[test]
    fn power_expires_after_fixed_duration_and_immunity_ends() {
        let mut engine = running_engine(22);
        engine.pursuers.clear();
        isolate_player(&mut engine);
        engine.dots.clear();
        engine.power_item = Some(Vec2 { x: 605, y: 605 });
        engine.tick(Direction::None);
        assert!(engine.power_active);

        engine
            .pursuers
            .push(PursuerInternal::new(engine.player, BehaviorKind::Pursuit, 0.1, 1));
        for _ in 0..(POWER_DURATION_TICKS - 1) {
            engine.tick(Direction::None);
            assert!(!engine.game_over);
        }
        assert!(!engine.power_active);

        engine.tick(Direction::None);
        assert!(engine.game_over);
    }

    #[test]
    fn pursuer_overlap_without_power_is_terminal_and_stops_the_tick() {
        let mut engine = running_engine(23);
        engine.pursuers.clear();
        isolate_player(&mut engine);
        engine.dots = vec![Vec2 { x: 605, y: 605 }];
        engine
            .pursuers
            .push(PursuerInternal::new(engine.player, BehaviorKind::Pursuit, 0.1, 1));

        engine.tick(Direction::None);
        assert!(engine.game_over);
        // Dot intake never ran on the terminal tick.
        assert_eq!(engine.score, 0);
        assert_eq!(engine.dots.len(), 1);
    }

    #[test]
    fn power_item_spawns_after_the_interval_on_an_open_cell() {
        let mut engine = running_engine(31);
        engine.pursuers.clear();
        engine.dots.clear();
        isolate_player(&mut engine);

        for _ in 0..POWER_SPAWN_INTERVAL_TICKS {
            engine.tick(Direction::None);
        }
        assert!(engine.power_item.is_none());

        engine.tick(Direction::None);
        let item = engine.power_item.expect("power item spawned");
        let item_rect = Rect::square(item.x, item.y, POWER_ITEM_SIZE);
        for wall in walls_for(engine.level) {
            assert!(!item_rect.overlaps(wall));
        }
        assert_eq!(engine.last_power_spawn_tick, engine.tick_counter);
    }

    #[test]
    fn pickup_rebases_the_spawn_clock() {
        let mut engine = running_engine(32);
        engine.pursuers.clear();
        engine.dots.clear();
        isolate_player(&mut engine);
        engine.power_item = Some(Vec2 { x: 605, y: 605 });

        engine.tick(Direction::None);
        assert!(engine.power_item.is_none());
        assert_eq!(engine.last_power_spawn_tick, 1);

        // Next spawn waits a full interval from the pickup.
        for _ in 0..POWER_SPAWN_INTERVAL_TICKS {
            engine.tick(Direction::None);
        }
        assert!(engine.power_item.is_none());
        engine.tick(Direction::None);
        assert!(engine.power_item.is_some());
    }

    #[test]
    fn pursuers_never_end_a_tick_inside_a_wall() {
        let mut engine = running_engine(55);
        let intents = [
            Direction::Right,
            Direction::Down,
            Direction::Left,
            Direction::Up,
        ];
        for step in 0..500 {
            engine.tick(intents[step % intents.len()]);
            if engine.is_ended() {
                break;
            }
            let walls = walls_for(engine.level);
            for pursuer in &engine.pursuers {
                let rect = pursuer.rect();
                for wall in walls {
                    assert!(!rect.overlaps(wall), "pursuer inside wall at step {step}");
                }
            }
        }
    }

    #[test]
    fn same_seed_produces_same_progression() {
        let mut a = GameEngine::new(424_242);
        let mut b = GameEngine::new(424_242);
        a.start_session(Difficulty::Hard);
        b.start_session(Difficulty::Hard);

        let intents = [
            Direction::Right,
            Direction::Right,
            Direction::Down,
            Direction::None,
            Direction::Left,
            Direction::Up,
        ];
        for step in 0..400 {
            let intent = intents[step % intents.len()];
            a.tick(intent);
            b.tick(intent);
            let sa = serde_json::to_string(&a.build_snapshot(true)).unwrap();
            let sb = serde_json::to_string(&b.build_snapshot(true)).unwrap();
            assert_eq!(sa, sb);
            if a.is_ended() {
                break;
            }
        }
    }

    #[test]
    fn score_is_always_a_multiple_of_the_dot_increment() {
        let mut engine = running_engine(77);
        for _ in 0..300 {
            engine.tick(Direction::Right);
            assert!(engine.score >= 0);
            assert_eq!(engine.score % DOT_SCORE, 0);
            if engine.is_ended() {
                break;
            }
        }
    }

    #[test]
    fn reset_session_clears_the_terminal_flag() {
        let mut engine = running_engine(88);
        engine.game_over = true;
        engine.score = 500;

        engine.reset_session();
        assert!(!engine.is_ended());
        assert_eq!(engine.score, 0);
        assert_eq!(engine.level, 1);
        assert_eq!(engine.dots.len(), 100);
        let snapshot = engine.build_snapshot(false);
        assert!(!snapshot.in_menu);
    }

    #[test]
    fn build_snapshot_drains_events_when_requested() {
        let mut engine = running_engine(99);
        engine.events.push(RuntimeEvent::PowerTaken);

        let first = engine.build_snapshot(true);
        let second = engine.build_snapshot(true);
        assert_eq!(first.events.len(), 1);
        assert!(second.events.is_empty());
    }

    #[test]
    fn player_moves_through_walls() {
        let mut engine = running_engine(101);
        engine.pursuers.clear();
        engine.dots.clear();
        // Walk left far past the level-1 wall column.
        for _ in 0..100 {
            engine.tick(Direction::Left);
        }
        assert!(engine.player.x < 50 - PLAYER_SIZE);
    }

    #[test]
    fn difficulty_selects_player_step_size() {
        for (difficulty, speed) in [
            (Difficulty::Easy, 6),
            (Difficulty::Medium, 8),
            (Difficulty::Hard, 10),
        ] {
            let mut engine = GameEngine::new(3);
            engine.start_session(difficulty);
            engine.pursuers.clear();
            engine.dots.clear();
            let before = engine.player.x;
            engine.tick(Direction::Right);
            assert_eq!(engine.player.x, before + speed);
            assert_eq!(engine.config().player_speed, speed);
        }
    }
}
