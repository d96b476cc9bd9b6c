//! Variable store shared by every node of a tree.

use std::collections::HashMap;
use std::fmt;

use bt_expr::VariableSource;
use serde::Serialize;

/// A variable value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Float(f32),
    Int(i64),
    Bool(bool),
    Str(String),
}

impl Value {
    /// Numeric view: ints widen, bools read as 0/1, strings have none.
    pub fn as_f32(&self) -> Option<f32> {
        match self {
            Value::Float(v) => Some(*v),
            Value::Int(v) => Some(*v as f32),
            Value::Bool(v) => Some(if *v { 1.0 } else { 0.0 }),
            Value::Str(_) => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            Value::Float(v) => Some(*v as i64),
            Value::Bool(v) => Some(i64::from(*v)),
            Value::Str(_) => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            Value::Int(v) => Some(*v != 0),
            Value::Float(v) => Some(*v != 0.0),
            Value::Str(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Float(v) => write!(f, "{v}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Str(v) => f.write_str(v),
        }
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

/// Named variables, owned by the tree root.
#[derive(Debug, Clone, Default)]
pub struct Variables {
    values: HashMap<String, Value>,
}

impl Variables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Sets `name`, replacing any previous value and type.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(name.into(), value.into());
    }

    /// Sets `name` only if it is not defined yet.
    pub fn declare(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.values.entry(name.into()).or_insert_with(|| value.into());
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.values.remove(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl VariableSource for Variables {
    fn value(&self, name: &str) -> Option<f32> {
        self.values.get(name).and_then(Value::as_f32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_replaces_type() {
        let mut vars = Variables::new();
        vars.set("x", 1_i64);
        vars.set("x", "fast");
        assert_eq!(vars.get("x"), Some(&Value::Str("fast".into())));
    }

    #[test]
    fn declare_keeps_existing_value() {
        let mut vars = Variables::new();
        vars.set("speed", 2.5_f32);
        vars.declare("speed", 0.0_f32);
        vars.declare("other", 0.0_f32);
        assert_eq!(vars.get("speed"), Some(&Value::Float(2.5)));
        assert_eq!(vars.get("other"), Some(&Value::Float(0.0)));
    }

    #[test]
    fn numeric_view_for_expressions() {
        let mut vars = Variables::new();
        vars.set("i", 3_i64);
        vars.set("b", true);
        vars.set("s", "name");
        assert_eq!(VariableSource::value(&vars, "i"), Some(3.0));
        assert_eq!(VariableSource::value(&vars, "b"), Some(1.0));
        assert_eq!(VariableSource::value(&vars, "s"), None);
    }
}
