//! 2D steering leaves.
//!
//! Each leaf reads the agent position and the tracked trigger objects,
//! computes a velocity and commands it through [`Motion`](crate::Motion).
//! Moving the agent is left to the host.

use std::f32::consts::TAU;

use crate::error::{Result, TreeError};
use crate::{Behavior, Param, Status, TickContext, Vec2};

/// Distance of the point picked by a random `moveto`.
pub const WANDER_DISTANCE: f32 = 5.0;

/// Seconds between two `roam` destinations.
pub const ROAM_RETARGET_PERIOD: f64 = 2.0;

/// Trigger kind that counts as standing on the ground for `dodge`.
pub const GROUND_KIND: &str = "Ground";

#[derive(Debug, Clone)]
enum Destination {
    Random,
    Trigger(Param<String>),
    Point(Param<f32>, Param<f32>),
}

/// `moveto speed [kind | x y]`: heads for a point.
///
/// With one parameter the point is picked at random around the agent, with
/// two it is the first object inside a `kind` trigger (`Failure` when there
/// is none), with three it is `(x, y)`. The speed is capped so the agent
/// does not overshoot within one tick.
#[derive(Debug, Clone)]
pub struct MoveTo {
    speed: Param<f32>,
    destination: Destination,
}

impl MoveTo {
    pub fn from_params(params: &[String]) -> Result<Self> {
        let destination = match params.len() {
            0 | 1 => Destination::Random,
            2 => Destination::Trigger(Param::at(params, 1, String::new())),
            _ => Destination::Point(Param::at(params, 1, 0.0), Param::at(params, 2, 0.0)),
        };
        Ok(Self {
            speed: Param::at(params, 0, 0.0),
            destination,
        })
    }
}

impl Behavior for MoveTo {
    fn tick(&mut self, ctx: &mut TickContext<'_>) -> Status {
        let Some(speed) = self.speed.resolve(ctx.variables) else {
            return Status::Failure;
        };
        let position = ctx.agent.position;

        let target = match &self.destination {
            Destination::Random => {
                let heading = Vec2::new(
                    ctx.agent.random_range(-2.0, 2.0),
                    ctx.agent.random_range(-2.0, 2.0),
                );
                position + heading.normalized() * WANDER_DISTANCE
            }
            Destination::Trigger(kind) => {
                let Some(kind) = kind.resolve(ctx.variables) else {
                    return Status::Failure;
                };
                match ctx.agent.trigger_object(&kind) {
                    Some(object) => object.position,
                    None => return Status::Failure,
                }
            }
            Destination::Point(x, y) => {
                let (Some(x), Some(y)) = (x.resolve(ctx.variables), y.resolve(ctx.variables))
                else {
                    return Status::Failure;
                };
                Vec2::new(x, y)
            }
        };

        let offset = target - position;
        let reach = if ctx.agent.tick_period > 0.0 {
            offset.length() / ctx.agent.tick_period
        } else {
            speed
        };
        ctx.agent.motion.drive(offset.normalized() * speed.min(reach));
        Status::Success
    }
}

/// `roam [speed] [radius]`: wanders around the spot the agent started from.
///
/// The spawn point is the agent position at the first tick. A new
/// destination on the circle of `radius` around it is drawn every
/// [`ROAM_RETARGET_PERIOD`] seconds.
#[derive(Debug, Clone)]
pub struct Roam {
    speed: Param<f32>,
    radius: Param<f32>,
    spawn: Option<Vec2>,
    target: Vec2,
    retarget_at: f64,
}

impl Roam {
    pub fn from_params(params: &[String]) -> Result<Self> {
        Ok(Self {
            speed: Param::at(params, 0, 2.0),
            radius: Param::at(params, 1, 3.0),
            spawn: None,
            target: Vec2::ZERO,
            retarget_at: f64::NEG_INFINITY,
        })
    }
}

impl Behavior for Roam {
    fn tick(&mut self, ctx: &mut TickContext<'_>) -> Status {
        let (Some(speed), Some(radius)) = (
            self.speed.resolve(ctx.variables),
            self.radius.resolve(ctx.variables),
        ) else {
            return Status::Failure;
        };
        let position = ctx.agent.position;
        let spawn = *self.spawn.get_or_insert(position);

        if ctx.agent.now > self.retarget_at {
            let angle = ctx.agent.random_range(0.0, TAU);
            self.target = spawn + Vec2::from_angle(angle) * radius;
            self.retarget_at = ctx.agent.now + ROAM_RETARGET_PERIOD;
        }

        let offset = self.target - position;
        ctx.agent
            .motion
            .drive(offset.normalized() * speed.min(offset.length()));
        Status::Success
    }
}

/// `prowl [kind] [speed] [radius] [step]`: circles the first object inside
/// a `kind` trigger.
///
/// Every tick the angle around the object advances by `step` radians.
/// `Failure` when nothing is inside the trigger.
#[derive(Debug, Clone)]
pub struct Prowl {
    kind: Param<String>,
    speed: Param<f32>,
    radius: Param<f32>,
    step: Param<f32>,
    angle: f32,
}

impl Prowl {
    pub fn from_params(params: &[String]) -> Result<Self> {
        Ok(Self {
            kind: Param::at(params, 0, "Player".to_string()),
            speed: Param::at(params, 1, 2.0),
            radius: Param::at(params, 2, 3.0),
            step: Param::at(params, 3, 0.1),
            angle: 0.0,
        })
    }
}

impl Behavior for Prowl {
    fn tick(&mut self, ctx: &mut TickContext<'_>) -> Status {
        let vars = &*ctx.variables;
        let (Some(kind), Some(speed), Some(radius), Some(step)) = (
            self.kind.resolve(vars),
            self.speed.resolve(vars),
            self.radius.resolve(vars),
            self.step.resolve(vars),
        ) else {
            return Status::Failure;
        };
        let Some(center) = ctx.agent.trigger_object(&kind).map(|o| o.position) else {
            return Status::Failure;
        };

        self.angle += step;
        let offset = center + Vec2::from_angle(self.angle) * radius - ctx.agent.position;
        let velocity = if offset.length() > 0.01 {
            offset.normalized() * speed
        } else {
            Vec2::ZERO
        };
        ctx.agent.motion.drive(velocity);
        Status::Success
    }
}

/// `dodge vx vy kind [jump]`: sidesteps the first object inside a `kind`
/// trigger.
///
/// The escape direction is the object's velocity turned a quarter counter-
/// clockwise, or straight up when the object does not report a velocity.
/// With `jump` the vertical component is only applied while a
/// [`GROUND_KIND`] trigger is touched. Keeps running while the object is
/// around and succeeds once it is gone.
#[derive(Debug, Clone)]
pub struct Dodge {
    vx: Param<f32>,
    vy: Param<f32>,
    kind: Param<String>,
    jump: Param<bool>,
}

impl Dodge {
    pub fn from_params(params: &[String]) -> Result<Self> {
        if params.len() < 3 {
            return Err(TreeError::InvalidParams {
                token: "dodge".to_string(),
                reason: "expected `vx vy kind [jump]`".to_string(),
            });
        }
        Ok(Self {
            vx: Param::at(params, 0, 0.0),
            vy: Param::at(params, 1, 0.0),
            kind: Param::at(params, 2, String::new()),
            jump: Param::at(params, 3, false),
        })
    }
}

impl Behavior for Dodge {
    fn tick(&mut self, ctx: &mut TickContext<'_>) -> Status {
        let vars = &*ctx.variables;
        let (Some(vx), Some(vy), Some(kind), Some(jump)) = (
            self.vx.resolve(vars),
            self.vy.resolve(vars),
            self.kind.resolve(vars),
            self.jump.resolve(vars),
        ) else {
            return Status::Failure;
        };
        let Some(object) = ctx.agent.trigger_object(&kind) else {
            return Status::Success;
        };

        let away = object
            .velocity
            .map_or(Vec2::UP, |velocity| velocity.perpendicular().normalized());
        let grounded = !jump || ctx.agent.trigger_count(GROUND_KIND) > 0;

        let motion = &mut ctx.agent.motion;
        motion.vx = away.x * vx;
        motion.apply_vx = true;
        motion.apply_vy = grounded;
        if grounded {
            motion.vy = (away.y * vy).abs();
        }
        Status::Running
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Agent, TriggerEvent, Variables};

    fn params(raw: &str) -> Vec<String> {
        raw.split_whitespace().map(str::to_string).collect()
    }

    fn agent() -> Agent {
        let mut agent = Agent::new();
        agent.tick_period = 0.1;
        agent
    }

    fn tick(behavior: &mut dyn Behavior, agent: &mut Agent) -> Status {
        let mut variables = Variables::new();
        let mut ctx = TickContext {
            variables: &mut variables,
            agent,
            index: 1,
        };
        behavior.tick(&mut ctx)
    }

    fn velocity(agent: &Agent) -> Vec2 {
        Vec2::new(agent.motion.vx, agent.motion.vy)
    }

    fn close(a: Vec2, b: Vec2) -> bool {
        (a - b).length() < 1e-4
    }

    #[test]
    fn moveto_point_caps_speed_near_the_target() {
        let mut agent = agent();
        let mut far = MoveTo::from_params(&params("2 3 4")).unwrap();
        assert_eq!(tick(&mut far, &mut agent), Status::Success);
        assert!(close(velocity(&agent), Vec2::new(1.2, 1.6)));
        assert!(agent.motion.apply_vx && agent.motion.apply_vy);

        // 0.1 away with a 0.1s period: one unit per second is enough.
        agent.position = Vec2::new(3.0, 3.9);
        tick(&mut far, &mut agent);
        assert!(close(velocity(&agent), Vec2::new(0.0, 1.0)));
    }

    #[test]
    fn moveto_trigger_needs_an_object() {
        let mut agent = agent();
        let mut chase = MoveTo::from_params(&params("1 Player")).unwrap();
        assert_eq!(tick(&mut chase, &mut agent), Status::Failure);

        agent.record_trigger("Player", TriggerEvent::Enter, "hero");
        agent.track_object("hero", Vec2::new(0.0, -5.0), None);
        assert_eq!(tick(&mut chase, &mut agent), Status::Success);
        assert!(close(velocity(&agent), Vec2::new(0.0, -1.0)));
    }

    #[test]
    fn random_moveto_follows_the_seed() {
        let mut a = agent();
        let mut b = agent();
        a.seed(11);
        b.seed(11);
        let mut wander = MoveTo::from_params(&params("1")).unwrap();

        assert_eq!(tick(&mut wander, &mut a), Status::Success);
        tick(&mut wander, &mut b);
        assert_eq!(velocity(&a), velocity(&b));
        assert!((velocity(&a).length() - 1.0).abs() < 1e-4);
    }

    #[test]
    fn roam_retargets_periodically() {
        let mut agent = agent();
        agent.position = Vec2::new(10.0, 0.0);
        let mut roam = Roam::from_params(&[]).unwrap();

        // Spawn is the current position, the target lies 3 away: full speed.
        assert_eq!(tick(&mut roam, &mut agent), Status::Success);
        let first = velocity(&agent);
        assert!((first.length() - 2.0).abs() < 1e-4);

        agent.now = 1.0;
        tick(&mut roam, &mut agent);
        assert_eq!(velocity(&agent), first);

        agent.now = 2.5;
        tick(&mut roam, &mut agent);
        assert_ne!(velocity(&agent), first);
    }

    #[test]
    fn roam_slows_down_on_arrival() {
        let mut agent = agent();
        let mut roam = Roam::from_params(&params("2 0.5")).unwrap();
        tick(&mut roam, &mut agent);
        assert!((velocity(&agent).length() - 0.5).abs() < 1e-4);
    }

    #[test]
    fn prowl_circles_the_object() {
        let mut agent = agent();
        let mut prowl = Prowl::from_params(&params("Player 2 3 0.5")).unwrap();
        assert_eq!(tick(&mut prowl, &mut agent), Status::Failure);

        agent.record_trigger("Player", TriggerEvent::Enter, "hero");
        assert_eq!(tick(&mut prowl, &mut agent), Status::Success);
        assert!(close(velocity(&agent), Vec2::from_angle(0.5) * 2.0));

        tick(&mut prowl, &mut agent);
        assert!(close(velocity(&agent), Vec2::from_angle(1.0) * 2.0));
    }

    #[test]
    fn prowl_stops_on_the_circle() {
        let mut agent = agent();
        agent.record_trigger("Player", TriggerEvent::Enter, "hero");
        agent.position = Vec2::from_angle(0.1) * 3.0;
        let mut prowl = Prowl::from_params(&[]).unwrap();
        tick(&mut prowl, &mut agent);
        assert_eq!(velocity(&agent), Vec2::ZERO);
    }

    #[test]
    fn dodge_sidesteps_moving_objects() {
        let mut agent = agent();
        let mut dodge = Dodge::from_params(&params("3 4 Bullet")).unwrap();
        assert_eq!(tick(&mut dodge, &mut agent), Status::Success);

        // No velocity reported: straight up.
        agent.record_trigger("Bullet", TriggerEvent::Enter, "b1");
        assert_eq!(tick(&mut dodge, &mut agent), Status::Running);
        assert_eq!(velocity(&agent), Vec2::new(0.0, 4.0));

        agent.track_object("b1", Vec2::ZERO, Some(Vec2::new(0.0, 2.0)));
        tick(&mut dodge, &mut agent);
        assert_eq!(agent.motion.vx, -3.0);
        assert_eq!(agent.motion.vy, 0.0);
        assert!(agent.motion.apply_vx && agent.motion.apply_vy);
    }

    #[test]
    fn jumping_dodge_needs_ground() {
        let mut agent = agent();
        agent.record_trigger("Bullet", TriggerEvent::Enter, "b1");
        let mut dodge = Dodge::from_params(&params("3 4 Bullet true")).unwrap();

        tick(&mut dodge, &mut agent);
        assert!(agent.motion.apply_vx);
        assert!(!agent.motion.apply_vy);

        agent.record_trigger(GROUND_KIND, TriggerEvent::Enter, "floor");
        tick(&mut dodge, &mut agent);
        assert!(agent.motion.apply_vy);
        assert_eq!(agent.motion.vy, 4.0);
    }

    #[test]
    fn dodge_requires_a_kind() {
        assert!(matches!(
            Dodge::from_params(&params("3 4")),
            Err(TreeError::InvalidParams { .. })
        ));
    }
}
