//! Action leaves: timers, expressions and agent commands.

use std::sync::Arc;

use bt_expr::Expression;

use crate::error::{Result, TreeError};
use crate::{Behavior, Param, Status, TickContext};

/// What a [`Wait`] does once its timeout has elapsed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, strum::Display, strum::EnumString)]
#[strum(ascii_case_insensitive)]
pub enum WaitMode {
    /// Latch `Success` until aborted.
    #[default]
    Block,
    /// Report `Success` once, then start a new wait on the next tick.
    Skip,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum WaitState {
    Idle,
    Running { until: f64 },
    Done,
}

/// `wait [timeout] [Block|Skip]`: runs until `timeout` seconds have passed.
#[derive(Debug, Clone)]
pub struct Wait {
    timeout: Param<f32>,
    mode: WaitMode,
    state: WaitState,
}

impl Wait {
    pub const DEFAULT_TIMEOUT: f32 = 1.0;

    pub fn new(timeout: Param<f32>, mode: WaitMode) -> Self {
        Self {
            timeout,
            mode,
            state: WaitState::Idle,
        }
    }

    pub fn from_params(params: &[String]) -> Result<Self> {
        let timeout = Param::at(params, 0, Self::DEFAULT_TIMEOUT);
        let mode = match params.get(1) {
            Some(raw) => raw.parse().map_err(|_| TreeError::InvalidParams {
                token: "wait".to_string(),
                reason: format!("unknown mode `{raw}`"),
            })?,
            None => WaitMode::default(),
        };
        Ok(Self::new(timeout, mode))
    }
}

impl Behavior for Wait {
    fn tick(&mut self, ctx: &mut TickContext<'_>) -> Status {
        match self.state {
            WaitState::Idle => {
                let Some(timeout) = self.timeout.resolve(ctx.variables) else {
                    return Status::Failure;
                };
                self.state = WaitState::Running {
                    until: ctx.agent.now + f64::from(timeout),
                };
                Status::Running
            }
            WaitState::Running { until } if ctx.agent.now > until => {
                self.state = match self.mode {
                    WaitMode::Block => WaitState::Done,
                    WaitMode::Skip => WaitState::Idle,
                };
                Status::Success
            }
            WaitState::Running { .. } => Status::Running,
            WaitState::Done => Status::Success,
        }
    }

    fn abort(&mut self, _ctx: &mut TickContext<'_>) {
        self.state = WaitState::Idle;
    }
}

/// `$ [!] [target =] expression`: evaluates an arithmetic expression.
///
/// The result is written to `target` when one is given. With `!` the
/// expression runs once and then reports `Success` until aborted.
#[derive(Debug, Clone)]
pub struct Evaluate {
    expression: Arc<Expression>,
    target: Option<String>,
    once: bool,
    done: bool,
}

impl Evaluate {
    pub fn from_params(params: &[String]) -> Result<Self> {
        let mut rest = params;
        let once = rest.first().is_some_and(|p| p == "!");
        if once {
            rest = &rest[1..];
        }

        let target = match rest {
            [name, eq, tail @ ..] if eq == "=" => {
                rest = tail;
                Some(name.clone())
            }
            _ => None,
        };

        let expression = bt_expr::cached(&rest.join(" "))?;
        Ok(Self {
            expression,
            target,
            once,
            done: false,
        })
    }

    pub fn expression(&self) -> &Expression {
        &self.expression
    }
}

impl Behavior for Evaluate {
    fn init(&mut self, ctx: &mut TickContext<'_>) {
        for name in self.expression.variables() {
            ctx.variables.declare(name.as_str(), 0.0_f32);
        }
        if let Some(target) = &self.target {
            ctx.variables.declare(target.as_str(), 0.0_f32);
        }
    }

    fn tick(&mut self, ctx: &mut TickContext<'_>) -> Status {
        if self.done {
            return Status::Success;
        }
        if self.once {
            self.done = true;
        }

        let result = self.expression.evaluate(&*ctx.variables);
        if let Some(target) = &self.target {
            ctx.variables.set(target.as_str(), result);
        }
        Status::Success
    }

    fn abort(&mut self, _ctx: &mut TickContext<'_>) {
        self.done = false;
    }
}

/// `velocity [vx] [vy]`: commands the agent's velocity.
///
/// An omitted component is left to the host. Abort releases both components.
#[derive(Debug, Clone)]
pub struct Velocity {
    vx: Option<Param<f32>>,
    vy: Option<Param<f32>>,
}

impl Velocity {
    pub fn from_params(params: &[String]) -> Result<Self> {
        Ok(Self {
            vx: params.first().map(|raw| Param::parse(raw)),
            vy: params.get(1).map(|raw| Param::parse(raw)),
        })
    }
}

impl Behavior for Velocity {
    fn tick(&mut self, ctx: &mut TickContext<'_>) -> Status {
        let resolve = |param: &Option<Param<f32>>| match param {
            Some(param) => param.resolve(ctx.variables).map(Some),
            None => Some(None),
        };
        let (Some(vx), Some(vy)) = (resolve(&self.vx), resolve(&self.vy)) else {
            return Status::Failure;
        };

        let motion = &mut ctx.agent.motion;
        motion.apply_vx = vx.is_some();
        motion.apply_vy = vy.is_some();
        motion.vx = vx.unwrap_or(motion.vx);
        motion.vy = vy.unwrap_or(motion.vy);
        Status::Success
    }

    fn abort(&mut self, ctx: &mut TickContext<'_>) {
        ctx.agent.motion.apply_vx = false;
        ctx.agent.motion.apply_vy = false;
    }
}

/// `scale [sx] [sy]`: sets the agent's scale. Omitted axes are untouched.
#[derive(Debug, Clone)]
pub struct Scale {
    sx: Option<Param<f32>>,
    sy: Option<Param<f32>>,
}

impl Scale {
    pub fn from_params(params: &[String]) -> Result<Self> {
        Ok(Self {
            sx: params.first().map(|raw| Param::parse(raw)),
            sy: params.get(1).map(|raw| Param::parse(raw)),
        })
    }
}

impl Behavior for Scale {
    fn tick(&mut self, ctx: &mut TickContext<'_>) -> Status {
        let resolve = |param: &Option<Param<f32>>| match param {
            Some(param) => param.resolve(ctx.variables).map(Some),
            None => Some(None),
        };
        let (Some(sx), Some(sy)) = (resolve(&self.sx), resolve(&self.sy)) else {
            return Status::Failure;
        };
        if sx.is_some() {
            ctx.agent.scale_x = sx;
        }
        if sy.is_some() {
            ctx.agent.scale_y = sy;
        }
        Status::Success
    }
}

/// `activate name [on]`: toggles a named child object of the agent.
///
/// `on` defaults to `false`, so a bare `activate shield` hides the shield.
#[derive(Debug, Clone)]
pub struct Activate {
    name: Param<String>,
    on: Param<bool>,
}

impl Activate {
    pub fn from_params(params: &[String]) -> Result<Self> {
        if params.is_empty() {
            return Err(TreeError::InvalidParams {
                token: "activate".to_string(),
                reason: "missing child name".to_string(),
            });
        }
        Ok(Self {
            name: Param::at(params, 0, String::new()),
            on: Param::at(params, 1, false),
        })
    }
}

impl Behavior for Activate {
    fn tick(&mut self, ctx: &mut TickContext<'_>) -> Status {
        let (Some(name), Some(on)) = (
            self.name.resolve(ctx.variables),
            self.on.resolve(ctx.variables),
        ) else {
            return Status::Failure;
        };
        if ctx.agent.set_child_active(&name, on) {
            Status::Success
        } else {
            Status::Failure
        }
    }
}
