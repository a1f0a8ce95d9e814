use crate::constants::PURSUER_SIZE;
use crate::geometry::Rect;
use crate::rng::Rng;
use crate::types::{BehaviorKind, Direction, PursuerView, Vec2};

use super::utils::{offset, random_direction};

#[derive(Clone, Debug)]
pub(super) struct PursuerInternal {
    pub pos: Vec2,
    pub behavior: BehaviorKind,
    pub hue: f32,
    pub speed: i32,
    /// Diagnostic only; with pursuit movement the y-axis update may
    /// overwrite the marker written by the x-axis update.
    pub last_dir: Direction,
}

impl PursuerInternal {
    pub fn new(pos: Vec2, behavior: BehaviorKind, hue: f32, speed: i32) -> Self {
        Self {
            pos,
            behavior,
            hue,
            speed,
            last_dir: Direction::None,
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::square(self.pos.x, self.pos.y, PURSUER_SIZE)
    }

    pub fn view(&self) -> PursuerView {
        PursuerView {
            rect: self.rect(),
            hue: self.hue,
            behavior: self.behavior,
            dir: self.last_dir,
        }
    }

    /// One movement step. The candidate position is checked against the
    /// walls in order; the first overlap reverts to the pre-move position.
    pub fn advance(&mut self, player: Vec2, walls: &[Rect], rng: &mut Rng) {
        let prev = self.pos;

        match self.behavior {
            BehaviorKind::Pursuit => {
                if self.pos.x < player.x {
                    self.pos.x += self.speed;
                    self.last_dir = Direction::Right;
                } else if self.pos.x > player.x {
                    self.pos.x -= self.speed;
                    self.last_dir = Direction::Left;
                }
                if self.pos.y < player.y {
                    self.pos.y += self.speed;
                    self.last_dir = Direction::Down;
                } else if self.pos.y > player.y {
                    self.pos.y -= self.speed;
                    self.last_dir = Direction::Up;
                }
            }
            BehaviorKind::Wander => {
                let dir = random_direction(rng);
                self.last_dir = dir;
                let (nx, ny) = offset(self.pos.x, self.pos.y, dir, self.speed);
                self.pos = Vec2 { x: nx, y: ny };
            }
        }

        let candidate = self.rect();
        for wall in walls {
            if candidate.overlaps(wall) {
                self.pos = prev;
                break;
            }
        }
    }
}
