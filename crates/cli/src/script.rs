//! Scripted trigger contacts for a simulated run.

use std::str::FromStr;

use behavior_tree::TriggerEvent;

/// `kind@step` enters a trigger at a simulation step, `kind@step:exit`
/// leaves it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptedTrigger {
    pub kind: String,
    pub step: u32,
    pub event: TriggerEvent,
}

impl ScriptedTrigger {
    /// Object reported as entering or leaving. One per kind, so an exit
    /// only removes the contact of its own kind.
    pub fn object_name(&self) -> String {
        format!("{}-scripted", self.kind)
    }
}

impl FromStr for ScriptedTrigger {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let (kind, rest) = raw
            .split_once('@')
            .ok_or_else(|| format!("expected kind@step, got `{raw}`"))?;
        if kind.is_empty() {
            return Err(format!("missing trigger kind in `{raw}`"));
        }
        let (step, event) = match rest.split_once(':') {
            Some((step, event)) => (
                step,
                event
                    .parse()
                    .map_err(|_| format!("unknown trigger event `{event}`"))?,
            ),
            None => (rest, TriggerEvent::Enter),
        };
        let step = step
            .parse()
            .map_err(|_| format!("invalid step `{step}` in `{raw}`"))?;

        Ok(Self {
            kind: kind.to_string(),
            step,
            event,
        })
    }
}
