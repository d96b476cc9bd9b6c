//! Binding of textual node parameters.
//!
//! A parameter token is parsed as a literal of the expected type when
//! possible. Otherwise the token is kept as the name of a variable and looked
//! up in the tree's [`Variables`] every time the parameter is read, which is
//! how scripts feed runtime values into nodes (`velocity speed 0`).

use std::sync::LazyLock;

use regex::Regex;

use crate::{Value, Variables};

/// Plain decimal notation: sign, digits with an optional fraction, exponent.
/// Keeps words like `inf` or `nan` free for variable names.
static DECIMAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?$").expect("decimal pattern is valid")
});

/// Types a parameter can be bound to.
pub trait ParamValue: Sized + Clone {
    /// Parses a literal token. `None` turns the token into a variable reference.
    fn parse_literal(raw: &str) -> Option<Self>;

    /// Converts a variable's value, if its type fits.
    fn from_value(value: &Value) -> Option<Self>;
}

impl ParamValue for f32 {
    fn parse_literal(raw: &str) -> Option<Self> {
        if !DECIMAL.is_match(raw) {
            return None;
        }
        raw.parse().ok().filter(|value: &f32| value.is_finite())
    }

    fn from_value(value: &Value) -> Option<Self> {
        value.as_f32()
    }
}

impl ParamValue for i64 {
    fn parse_literal(raw: &str) -> Option<Self> {
        raw.parse().ok()
    }

    fn from_value(value: &Value) -> Option<Self> {
        value.as_i64()
    }
}

impl ParamValue for bool {
    fn parse_literal(raw: &str) -> Option<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        }
    }

    fn from_value(value: &Value) -> Option<Self> {
        value.as_bool()
    }
}

/// Strings are always literal.
impl ParamValue for String {
    fn parse_literal(raw: &str) -> Option<Self> {
        Some(raw.to_string())
    }

    fn from_value(value: &Value) -> Option<Self> {
        Some(value.to_string())
    }
}

/// A parameter bound either to a literal or to a variable name.
#[derive(Debug, Clone, PartialEq)]
pub enum Param<T> {
    Literal(T),
    Variable(String),
}

impl<T: ParamValue> Param<T> {
    /// Binds a raw token, falling back to a variable reference.
    pub fn parse(raw: &str) -> Self {
        match T::parse_literal(raw) {
            Some(value) => Param::Literal(value),
            None => {
                tracing::debug!(token = raw, "parameter bound to variable");
                Param::Variable(raw.to_string())
            }
        }
    }

    /// Binds `params[position]`, or `default` when the parameter is absent.
    pub fn at(params: &[String], position: usize, default: T) -> Self {
        params
            .get(position)
            .map_or(Param::Literal(default), |raw| Param::parse(raw))
    }

    /// Current value. `None` if the variable is undefined or has the wrong type.
    pub fn resolve(&self, vars: &Variables) -> Option<T> {
        match self {
            Param::Literal(value) => Some(value.clone()),
            Param::Variable(name) => vars.get(name).and_then(T::from_value),
        }
    }

    pub fn is_variable(&self) -> bool {
        matches!(self, Param::Variable(_))
    }
}
