//! Condition leaves: succeed or fail from sensed state, never run.

use crate::error::{Result, TreeError};
use crate::{Behavior, Param, Status, TickContext};

/// `trigger type [on]`: checks whether something is inside a trigger.
///
/// Succeeds when "at least one object of `type` is inside" equals `on`,
/// which defaults to `false`: a bare `trigger Player` checks that no player
/// is around.
#[derive(Debug, Clone)]
pub struct TriggerCheck {
    kind: Param<String>,
    on: Param<bool>,
}

impl TriggerCheck {
    pub fn from_params(params: &[String]) -> Result<Self> {
        if params.is_empty() {
            return Err(TreeError::InvalidParams {
                token: "trigger".to_string(),
                reason: "missing trigger type".to_string(),
            });
        }
        Ok(Self {
            kind: Param::at(params, 0, String::new()),
            on: Param::at(params, 1, false),
        })
    }
}

impl Behavior for TriggerCheck {
    fn tick(&mut self, ctx: &mut TickContext<'_>) -> Status {
        let (Some(kind), Some(on)) = (
            self.kind.resolve(ctx.variables),
            self.on.resolve(ctx.variables),
        ) else {
            return Status::Failure;
        };
        if (ctx.agent.trigger_count(&kind) > 0) == on {
            Status::Success
        } else {
            Status::Failure
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Agent, TriggerEvent, Variables};

    fn check(trigger: &mut TriggerCheck, agent: &mut Agent) -> Status {
        let mut variables = Variables::new();
        let mut ctx = TickContext {
            variables: &mut variables,
            agent,
            index: 1,
        };
        trigger.tick(&mut ctx)
    }

    #[test]
    fn follows_trigger_contacts() {
        let mut agent = Agent::new();
        let mut inside =
            TriggerCheck::from_params(&["Player".to_string(), "true".to_string()]).unwrap();
        let mut outside =
            TriggerCheck::from_params(&["Player".to_string(), "false".to_string()]).unwrap();

        assert_eq!(check(&mut inside, &mut agent), Status::Failure);
        assert_eq!(check(&mut outside, &mut agent), Status::Success);

        agent.record_trigger("Player", TriggerEvent::Enter, "hero");
        assert_eq!(check(&mut inside, &mut agent), Status::Success);
        assert_eq!(check(&mut outside, &mut agent), Status::Failure);
    }

    #[test]
    fn bare_check_means_nobody_inside() {
        let mut agent = Agent::new();
        let mut bare = TriggerCheck::from_params(&["Player".to_string()]).unwrap();
        assert_eq!(check(&mut bare, &mut agent), Status::Success);

        agent.record_trigger("Player", TriggerEvent::Enter, "hero");
        assert_eq!(check(&mut bare, &mut agent), Status::Failure);
    }

    #[test]
    fn requires_a_type() {
        assert!(TriggerCheck::from_params(&[]).is_err());
    }
}
