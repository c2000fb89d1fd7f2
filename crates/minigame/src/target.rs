use std::time::Duration;

use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Play field in the same units as target positions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Arena {
    pub width: f32,
    pub height: f32,
}

impl Default for Arena {
    fn default() -> Self {
        Self {
            width: 640.0,
            height: 420.0,
        }
    }
}

impl Arena {
    pub fn contains(&self, point: Point) -> bool {
        (0.0..=self.width).contains(&point.x) && (0.0..=self.height).contains(&point.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Target {
    pub position: Point,
    pub radius: f32,
    /// Run-elapsed time at which the target relocates, if it ever does.
    pub expires_at: Option<Duration>,
}

impl Target {
    pub fn contains(&self, point: Point) -> bool {
        let dx = point.x - self.position.x;
        let dy = point.y - self.position.y;
        dx * dx + dy * dy <= self.radius * self.radius
    }

    pub fn is_expired(&self, elapsed: Duration) -> bool {
        self.expires_at.is_some_and(|at| elapsed >= at)
    }
}

pub trait TargetSpawner {
    /// Picks a centre so the whole disc stays inside the arena when it fits.
    fn place(&mut self, arena: &Arena, radius: f32) -> Point;
}

pub struct RandomSpawner<R: Rng = StdRng> {
    rng: R,
}

impl RandomSpawner<StdRng> {
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl<R: Rng> RandomSpawner<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng> TargetSpawner for RandomSpawner<R> {
    fn place(&mut self, arena: &Arena, radius: f32) -> Point {
        let max_x = (arena.width - radius).max(radius);
        let max_y = (arena.height - radius).max(radius);
        Point {
            x: self.rng.gen_range(radius..=max_x).floor(),
            y: self.rng.gen_range(radius..=max_y).floor(),
        }
    }
}
