//! Name to implementation table used by the DSL compiler.
//!
//! `?` and `>` are built into the grammar. Every other token is looked up
//! here and resolved to a factory that builds a decorator or a leaf from the
//! node's parameters.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TreeError};
use crate::pack::{
    Activate, Dodge, Evaluate, MoveTo, Prowl, Roam, Scale, TriggerCheck, Velocity, Wait,
};
use crate::{Behavior, Constant, Decorator, NodeKind, Status};

/// Builds a leaf behavior from its parameters.
pub type LeafFactory = Arc<dyn Fn(&[String]) -> Result<Box<dyn Behavior>> + Send + Sync>;

/// How a registered token is instantiated.
#[derive(Clone)]
pub enum NodeFactory {
    Leaf(LeafFactory),
    Decorator(fn(&[String]) -> Decorator),
}

impl std::fmt::Debug for NodeFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeFactory::Leaf(_) => f.write_str("Leaf"),
            NodeFactory::Decorator(_) => f.write_str("Decorator"),
        }
    }
}

/// Built-in node implementations, addressable by name from configuration.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::AsRefStr,
)]
#[strum(ascii_case_insensitive)]
pub enum Builtin {
    Invert,
    Successify,
    Failify,
    Once,
    Gate,
    RowReset,
    Repeat,
    Threshold,
    Wait,
    Expression,
    Trigger,
    Velocity,
    Scale,
    Activate,
    MoveTo,
    Roam,
    Prowl,
    Dodge,
    Succeed,
    Fail,
    Run,
}

/// One documented parameter of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ParamDoc {
    pub name: &'static str,
    /// Value used when the parameter is omitted, if it is optional.
    pub default: Option<&'static str>,
    pub description: &'static str,
}

/// Reference entry for a node type, as listed by `bt --nodes`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NodeDoc {
    /// Usage line, starting with the default token.
    pub prototype: &'static str,
    pub description: &'static str,
    pub params: &'static [ParamDoc],
}

const fn param(
    name: &'static str,
    default: Option<&'static str>,
    description: &'static str,
) -> ParamDoc {
    ParamDoc {
        name,
        default,
        description,
    }
}

const fn node_doc(
    prototype: &'static str,
    description: &'static str,
    params: &'static [ParamDoc],
) -> NodeDoc {
    NodeDoc {
        prototype,
        description,
        params,
    }
}

/// Composite tokens, which are part of the grammar rather than the registry.
pub const COMPOSITE_DOCS: [NodeDoc; 2] = [
    NodeDoc {
        prototype: "?",
        description: "selector: ticks children in order until one succeeds or runs",
        params: &[],
    },
    NodeDoc {
        prototype: ">",
        description: "sequence: ticks children in order until one fails or runs",
        params: &[],
    },
];

impl Builtin {
    /// DSL token the built-in is registered under by default.
    pub fn default_token(self) -> &'static str {
        match self {
            Builtin::Invert => "invertify",
            Builtin::Successify => "successify",
            Builtin::Failify => "failify",
            Builtin::Once => "onceify",
            Builtin::Gate => "gatify",
            Builtin::RowReset => "rowresetify",
            Builtin::Repeat => "repeatify",
            Builtin::Threshold => "thresholdify",
            Builtin::Wait => "wait",
            Builtin::Expression => "$",
            Builtin::Trigger => "trigger",
            Builtin::Velocity => "velocity",
            Builtin::Scale => "scale",
            Builtin::Activate => "activate",
            Builtin::MoveTo => "moveto",
            Builtin::Roam => "roam",
            Builtin::Prowl => "prowl",
            Builtin::Dodge => "dodge",
            Builtin::Succeed => "succeed",
            Builtin::Fail => "fail",
            Builtin::Run => "running",
        }
    }

    pub fn factory(self) -> NodeFactory {
        match self {
            Builtin::Invert => NodeFactory::Decorator(|_| Decorator::Invert),
            Builtin::Successify => NodeFactory::Decorator(|_| Decorator::Successify),
            Builtin::Failify => NodeFactory::Decorator(|_| Decorator::Failify),
            Builtin::Once => NodeFactory::Decorator(|_| Decorator::once()),
            Builtin::Gate => NodeFactory::Decorator(|_| Decorator::gate()),
            Builtin::RowReset => NodeFactory::Decorator(|_| Decorator::row_reset()),
            Builtin::Repeat => NodeFactory::Decorator(|_| Decorator::Repeat),
            Builtin::Threshold => NodeFactory::Decorator(Decorator::threshold),
            Builtin::Wait => leaf(|p| Ok(Box::new(Wait::from_params(p)?))),
            Builtin::Expression => leaf(|p| Ok(Box::new(Evaluate::from_params(p)?))),
            Builtin::Trigger => leaf(|p| Ok(Box::new(TriggerCheck::from_params(p)?))),
            Builtin::Velocity => leaf(|p| Ok(Box::new(Velocity::from_params(p)?))),
            Builtin::Scale => leaf(|p| Ok(Box::new(Scale::from_params(p)?))),
            Builtin::Activate => leaf(|p| Ok(Box::new(Activate::from_params(p)?))),
            Builtin::MoveTo => leaf(|p| Ok(Box::new(MoveTo::from_params(p)?))),
            Builtin::Roam => leaf(|p| Ok(Box::new(Roam::from_params(p)?))),
            Builtin::Prowl => leaf(|p| Ok(Box::new(Prowl::from_params(p)?))),
            Builtin::Dodge => leaf(|p| Ok(Box::new(Dodge::from_params(p)?))),
            Builtin::Succeed => leaf(|_| Ok(Box::new(Constant(Status::Success)))),
            Builtin::Fail => leaf(|_| Ok(Box::new(Constant(Status::Failure)))),
            Builtin::Run => leaf(|_| Ok(Box::new(Constant(Status::Running)))),
        }
    }

    /// Usage reference for the built-in under its default token.
    pub fn doc(self) -> NodeDoc {
        const NO_PARAMS: &[ParamDoc] = &[];
        match self {
            Builtin::Invert => node_doc("invertify", "inverts the result of the child", NO_PARAMS),
            Builtin::Successify => node_doc(
                "successify",
                "always succeeds, whether the child succeeds or fails",
                NO_PARAMS,
            ),
            Builtin::Failify => node_doc(
                "failify",
                "always fails, whether the child succeeds or fails",
                NO_PARAMS,
            ),
            Builtin::Once => node_doc(
                "onceify",
                "ticks the child once, then succeeds until aborted",
                NO_PARAMS,
            ),
            Builtin::Gate => node_doc(
                "gatify",
                "mirrors the child until it succeeds, then succeeds until the parent exits",
                NO_PARAMS,
            ),
            Builtin::RowReset => node_doc(
                "rowresetify",
                "like gatify, re-armed when an earlier node takes over",
                NO_PARAMS,
            ),
            Builtin::Repeat => node_doc(
                "repeatify",
                "keeps running, restarting the child each time it succeeds",
                NO_PARAMS,
            ),
            Builtin::Threshold => node_doc(
                "thresholdify [codes]",
                "succeeds when the child's status changes as selected by the codes",
                const { &[param(
                    "codes",
                    Some("tnn"),
                    "one literal letter per status (success, failure, running): \
                     t on entering, f on leaving, b both, n never",
                )] },
            ),
            Builtin::Wait => node_doc(
                "wait [timeout] [mode]",
                "runs until the timeout expires; an abort restarts the timer",
                const { &[
                    param("timeout", Some("1"), "seconds to wait"),
                    param(
                        "mode",
                        Some("Block"),
                        "Block keeps succeeding, Skip starts over after each success",
                    ),
                ] },
            ),
            Builtin::Expression => node_doc(
                "$ [!] [target =] expression",
                "evaluates an arithmetic expression, optionally into a variable",
                const { &[
                    param("!", None, "evaluate once, then succeed until aborted"),
                    param("target", None, "variable receiving the result"),
                    param("expression", None, "infix expression over variables"),
                ] },
            ),
            Builtin::Trigger => node_doc(
                "trigger kind [on]",
                "succeeds when whether something is inside a kind trigger equals on",
                const { &[
                    param("kind", None, "trigger kind"),
                    param("on", Some("false"), "expected presence"),
                ] },
            ),
            Builtin::Velocity => node_doc(
                "velocity [vx] [vy]",
                "commands the given velocity components; abort releases them",
                const { &[
                    param("vx", None, "horizontal velocity"),
                    param("vy", None, "vertical velocity"),
                ] },
            ),
            Builtin::Scale => node_doc(
                "scale [sx] [sy]",
                "sets the given scale components",
                const { &[
                    param("sx", None, "horizontal scale"),
                    param("sy", None, "vertical scale"),
                ] },
            ),
            Builtin::Activate => node_doc(
                "activate name [on]",
                "shows or hides a named child object; fails if there is none",
                const { &[
                    param("name", None, "child object"),
                    param("on", Some("false"), "active state to set"),
                ] },
            ),
            Builtin::MoveTo => node_doc(
                "moveto speed [kind | x y]",
                "heads for a random point, a trigger object or a position",
                const { &[
                    param("speed", None, "units per second"),
                    param("kind", None, "trigger kind whose first object is the target"),
                    param("x y", None, "target position"),
                ] },
            ),
            Builtin::Roam => node_doc(
                "roam [speed] [radius]",
                "wanders around the first position, picking a new point every 2 seconds",
                const { &[
                    param("speed", Some("2"), "units per second"),
                    param("radius", Some("3"), "distance from the first position"),
                ] },
            ),
            Builtin::Prowl => node_doc(
                "prowl [kind] [speed] [radius] [step]",
                "circles the first object inside a kind trigger",
                const { &[
                    param("kind", Some("Player"), "trigger kind"),
                    param("speed", Some("2"), "units per second"),
                    param("radius", Some("3"), "distance to the object"),
                    param("step", Some("0.1"), "radians added per tick"),
                ] },
            ),
            Builtin::Dodge => node_doc(
                "dodge vx vy kind [jump]",
                "sidesteps the first object inside a kind trigger while it is there",
                const { &[
                    param("vx", None, "horizontal escape speed"),
                    param("vy", None, "vertical escape speed"),
                    param("kind", None, "trigger kind"),
                    param("jump", Some("false"), "only move vertically from the ground"),
                ] },
            ),
            Builtin::Succeed => node_doc("succeed", "always succeeds", NO_PARAMS),
            Builtin::Fail => node_doc("fail", "always fails", NO_PARAMS),
            Builtin::Run => node_doc("running", "always runs", NO_PARAMS),
        }
    }
}

fn leaf<F>(build: F) -> NodeFactory
where
    F: Fn(&[String]) -> Result<Box<dyn Behavior>> + Send + Sync + 'static,
{
    NodeFactory::Leaf(Arc::new(build))
}

/// One `[[nodes]]` entry: DSL token `name` runs implementation `node`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NodeBinding {
    pub name: String,
    pub node: String,
}

/// Token table as loaded from configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RegistryConfig {
    #[serde(default)]
    pub nodes: Vec<NodeBinding>,
}

/// Maps DSL tokens to node factories.
#[derive(Debug, Clone, Default)]
pub struct NodeRegistry {
    factories: HashMap<String, NodeFactory>,
}

impl NodeRegistry {
    /// Creates an empty registry. Only `?` and `>` resolve.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with every built-in under its default token.
    pub fn with_defaults() -> Self {
        use strum::IntoEnumIterator;

        let mut registry = Self::new();
        for builtin in Builtin::iter() {
            registry.register(builtin.default_token(), builtin.factory());
        }
        registry
    }

    /// Creates a registry from configured bindings.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::UnknownImplementation`] if a binding names an
    /// implementation that is not built in.
    pub fn from_config(config: &RegistryConfig) -> Result<Self> {
        let mut registry = Self::new();
        for binding in &config.nodes {
            let builtin: Builtin = binding
                .node
                .parse()
                .map_err(|_| TreeError::UnknownImplementation(binding.node.clone()))?;
            registry.register(&binding.name, builtin.factory());
        }
        tracing::debug!(tokens = registry.len(), "node registry configured");
        Ok(registry)
    }

    /// Registers (or replaces) the factory behind `token`.
    pub fn register(&mut self, token: impl Into<String>, factory: NodeFactory) {
        self.factories.insert(token.into(), factory);
    }

    /// Registers a host-provided leaf.
    pub fn register_leaf<F>(&mut self, token: impl Into<String>, build: F)
    where
        F: Fn(&[String]) -> Result<Box<dyn Behavior>> + Send + Sync + 'static,
    {
        self.register(token, leaf(build));
    }

    pub fn get(&self, token: &str) -> Option<&NodeFactory> {
        self.factories.get(token)
    }

    /// True if `token` resolves, including the composite tokens.
    pub fn contains(&self, token: &str) -> bool {
        matches!(token, "?" | ">") || self.factories.contains_key(token)
    }

    /// Number of registered tokens, composites excluded.
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Builds the node kind behind `token`.
    pub fn instantiate(&self, token: &str, params: &[String]) -> Result<NodeKind> {
        match token {
            "?" => return Ok(NodeKind::Selector),
            ">" => return Ok(NodeKind::Sequence),
            _ => {}
        }
        match self.factories.get(token) {
            Some(NodeFactory::Decorator(build)) => Ok(NodeKind::Decorator(build(params))),
            Some(NodeFactory::Leaf(build)) => Ok(NodeKind::Leaf(build(params)?)),
            None => Err(TreeError::UnknownToken(token.to_string())),
        }
    }
}
