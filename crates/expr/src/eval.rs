//! Operator tree and evaluation.

use std::collections::HashMap;
use std::fmt;

/// Read access to named float variables.
pub trait VariableSource {
    /// Returns the current value of `name`, if defined.
    fn value(&self, name: &str) -> Option<f32>;
}

impl VariableSource for HashMap<String, f32> {
    fn value(&self, name: &str) -> Option<f32> {
        self.get(name).copied()
    }
}

/// Operation applied by a [`Call`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Add,
    Sub,
    Mul,
    Div,
    Cos,
    Sin,
    Stp,
    Spk,
    Mod,
    /// Identity of the first operand. Unknown call names map here.
    None,
}

impl Op {
    /// Resolves a call name, case-insensitively.
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "add" => Op::Add,
            "sub" => Op::Sub,
            "mul" => Op::Mul,
            "div" => Op::Div,
            "cos" => Op::Cos,
            "sin" => Op::Sin,
            "stp" => Op::Stp,
            "spk" => Op::Spk,
            "mod" => Op::Mod,
            _ => Op::None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Op::Add => "add",
            Op::Sub => "sub",
            Op::Mul => "mul",
            Op::Div => "div",
            Op::Cos => "cos",
            Op::Sin => "sin",
            Op::Stp => "stp",
            Op::Spk => "spk",
            Op::Mod => "mod",
            Op::None => "none",
        }
    }
}

/// A call argument.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Literal(f32),
    Variable(String),
    Call(Box<Call>),
}

impl Operand {
    fn resolve<V>(&self, vars: &V) -> f32
    where
        V: VariableSource + ?Sized,
    {
        match self {
            Operand::Literal(value) => *value,
            Operand::Variable(name) => vars.value(name).unwrap_or(0.0),
            Operand::Call(call) => call.evaluate(vars),
        }
    }
}

/// One node of the operator tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    op: Op,
    operands: Vec<Operand>,
}

impl Call {
    pub fn new(op: Op, operands: Vec<Operand>) -> Self {
        Self { op, operands }
    }

    pub fn op(&self) -> Op {
        self.op
    }

    pub fn operands(&self) -> &[Operand] {
        &self.operands
    }

    /// Evaluates this call and its nested calls.
    pub fn evaluate<V>(&self, vars: &V) -> f32
    where
        V: VariableSource + ?Sized,
    {
        let arg = |i: usize, default: f32| {
            self.operands
                .get(i)
                .map_or(default, |operand| operand.resolve(vars))
        };
        let mut values = self.operands.iter().map(|o| o.resolve(vars));

        match self.op {
            Op::Add => values.sum(),
            Op::Mul => values.product(),
            Op::Sub => {
                let first = values.next().unwrap_or(0.0);
                values.fold(first, |acc, v| acc - v)
            }
            Op::Div => {
                let first = values.next().unwrap_or(1.0);
                values.fold(first, |acc, v| acc / v)
            }
            Op::Mod => arg(0, 0.0) % arg(1, 1.0),
            Op::Cos => (arg(1, 1.0) * arg(0, 0.0) + arg(2, 0.0)).cos(),
            Op::Sin => (arg(1, 1.0) * arg(0, 0.0) + arg(2, 0.0)).sin(),
            Op::Stp => {
                let period = arg(1, 1.0);
                step(arg(0, 1.0), period, arg(2, period / 4.0))
            }
            Op::Spk => {
                let period = arg(1, 1.0);
                spike(arg(0, 1.0), period, arg(2, period / 4.0))
            }
            Op::None => arg(0, 0.0),
        }
    }
}

/// Trapezoidal pulse of the given period: ramps up, holds 1 for `width`,
/// ramps down, then rests at 0 for `width`.
pub fn step(x: f32, period: f32, width: f32) -> f32 {
    if width >= period {
        return 0.0;
    }

    let half = period * 0.5;
    let slope = 1.0 / (half - width);
    let x = x % period;

    if x < half - width {
        x * slope
    } else if x < half {
        1.0
    } else if x < period - width {
        1.0 - (x - half) * slope
    } else {
        0.0
    }
}

/// Triangular spike of base `width` at the start of each period.
pub fn spike(x: f32, period: f32, width: f32) -> f32 {
    let rise = width * 0.5;
    let slope = 1.0 / rise;
    let x = x % period;

    if x < rise {
        x * slope
    } else if x < width {
        1.0 - (x - rise) * slope
    } else {
        0.0
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Literal(value) => write!(f, "{value}"),
            Operand::Variable(name) => f.write_str(name),
            Operand::Call(call) => call.fmt(f),
        }
    }
}

impl fmt::Display for Call {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.op.name())?;
        for (i, operand) in self.operands.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{operand}")?;
        }
        f.write_str(")")
    }
}
