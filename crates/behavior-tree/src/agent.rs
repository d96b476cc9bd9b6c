//! Agent environment driven by a tree.
//!
//! The tree does not move anything itself. Leaves write commands here
//! (velocity, scale, child activation) and read sensed state (time,
//! positions, trigger contacts); the host applies the commands to its own
//! physics or scene.

use std::collections::HashMap;
use std::ops::{Add, Mul, Sub};

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Seed used when the host does not pick one.
pub const DEFAULT_SEED: u64 = 0x5eed;

/// A 2D position or direction.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };
    pub const UP: Vec2 = Vec2 { x: 0.0, y: 1.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Unit vector at `angle` radians.
    pub fn from_angle(angle: f32) -> Self {
        Self::new(angle.cos(), angle.sin())
    }

    pub fn length(self) -> f32 {
        self.x.hypot(self.y)
    }

    /// Unit vector in the same direction. Near-zero vectors stay zero.
    pub fn normalized(self) -> Self {
        let length = self.length();
        if length < 1e-5 {
            Vec2::ZERO
        } else {
            self * (1.0 / length)
        }
    }

    /// Quarter turn counter-clockwise.
    pub fn perpendicular(self) -> Self {
        Self::new(-self.y, self.x)
    }
}

impl Add for Vec2 {
    type Output = Vec2;

    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2 {
    type Output = Vec2;

    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for Vec2 {
    type Output = Vec2;

    fn mul(self, rhs: f32) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

/// Whether a trigger contact starts or ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(ascii_case_insensitive)]
pub enum TriggerEvent {
    Enter,
    Exit,
}

/// An object currently inside a trigger of some kind.
#[derive(Debug, Clone, PartialEq)]
pub struct TriggerObject {
    pub kind: String,
    pub name: String,
    /// Last position reported by the host.
    pub position: Vec2,
    /// Last velocity reported by the host, if the object moves on its own.
    pub velocity: Option<Vec2>,
}

/// Velocity command for the host's physics step.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Motion {
    pub vx: f32,
    pub vy: f32,
    /// When set, the host overrides its horizontal velocity with `vx`.
    pub apply_vx: bool,
    /// When set, the host overrides its vertical velocity with `vy`.
    pub apply_vy: bool,
    pub impulse_vx: f32,
    pub impulse_vy: f32,
}

impl Motion {
    /// Commands both velocity components.
    pub fn drive(&mut self, velocity: Vec2) {
        self.vx = velocity.x;
        self.vy = velocity.y;
        self.apply_vx = true;
        self.apply_vy = true;
    }
}

/// State shared between the tree and its host.
#[derive(Debug, Clone)]
pub struct Agent {
    /// Current time in seconds, supplied by the scheduler.
    pub now: f64,
    /// Scheduler period in seconds.
    pub tick_period: f32,
    /// Agent position, supplied by the host.
    pub position: Vec2,
    pub motion: Motion,
    pub scale_x: Option<f32>,
    pub scale_y: Option<f32>,
    trigger_counts: HashMap<String, i32>,
    trigger_objects: Vec<TriggerObject>,
    children: HashMap<String, bool>,
    rng: SmallRng,
}

impl Default for Agent {
    fn default() -> Self {
        Self {
            now: 0.0,
            tick_period: 0.0,
            position: Vec2::ZERO,
            motion: Motion::default(),
            scale_x: None,
            scale_y: None,
            trigger_counts: HashMap::new(),
            trigger_objects: Vec::new(),
            children: HashMap::new(),
            rng: SmallRng::seed_from_u64(DEFAULT_SEED),
        }
    }
}

impl Agent {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restarts the random sequence used by wandering leaves.
    pub fn seed(&mut self, seed: u64) {
        self.rng = SmallRng::seed_from_u64(seed);
    }

    /// Uniform sample in `[low, high)`.
    pub fn random_range(&mut self, low: f32, high: f32) -> f32 {
        if low < high {
            self.rng.gen_range(low..high)
        } else {
            low
        }
    }

    /// Records a trigger contact change.
    pub fn record_trigger(&mut self, kind: &str, event: TriggerEvent, object: &str) {
        let count = self.trigger_counts.entry(kind.to_string()).or_insert(0);
        match event {
            TriggerEvent::Enter => {
                *count += 1;
                self.trigger_objects.push(TriggerObject {
                    kind: kind.to_string(),
                    name: object.to_string(),
                    position: Vec2::ZERO,
                    velocity: None,
                });
            }
            TriggerEvent::Exit => {
                *count -= 1;
                self.trigger_objects.retain(|o| o.name != object);
            }
        }
        tracing::debug!(kind, %event, object, count = *count, "trigger");
    }

    /// Number of objects currently inside triggers of `kind`.
    pub fn trigger_count(&self, kind: &str) -> i32 {
        self.trigger_counts.get(kind).copied().unwrap_or(0)
    }

    /// First object currently inside a trigger of `kind`.
    pub fn trigger_object(&self, kind: &str) -> Option<&TriggerObject> {
        self.trigger_objects.iter().find(|o| o.kind == kind)
    }

    /// Updates the position and velocity of every tracked object named `name`.
    /// Returns `false` if no such object is inside a trigger.
    pub fn track_object(&mut self, name: &str, position: Vec2, velocity: Option<Vec2>) -> bool {
        let mut found = false;
        for object in self.trigger_objects.iter_mut().filter(|o| o.name == name) {
            object.position = position;
            object.velocity = velocity;
            found = true;
        }
        found
    }

    /// Declares a named child object the tree may activate.
    pub fn add_child(&mut self, name: impl Into<String>, active: bool) {
        self.children.insert(name.into(), active);
    }

    pub fn child_active(&self, name: &str) -> Option<bool> {
        self.children.get(name).copied()
    }

    /// Sets a child's active flag. Returns `false` if no such child exists.
    pub fn set_child_active(&mut self, name: &str, active: bool) -> bool {
        match self.children.get_mut(name) {
            Some(flag) => {
                *flag = active;
                true
            }
            None => false,
        }
    }

    /// Takes the pending impulse, leaving zero behind.
    pub fn take_impulse(&mut self) -> (f32, f32) {
        let impulse = (self.motion.impulse_vx, self.motion.impulse_vy);
        self.motion.impulse_vx = 0.0;
        self.motion.impulse_vy = 0.0;
        impulse
    }
}
