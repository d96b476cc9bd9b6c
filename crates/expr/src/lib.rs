//! Arithmetic expression compiler and evaluator.
//!
//! Expressions are written in infix form (`speed * 2 + offset`) and compiled
//! once into an operator tree that can be evaluated any number of times
//! against a store of named float variables.
//!
//! Compilation happens in two passes:
//!
//! 1. [`rewrite`] turns binary operators into prefix calls
//!    (`a+b` → `add(a,b)`), one operator at a time in the fixed order
//!    `+ - * / %`. This is a textual substitution, not a precedence parser.
//! 2. [`parse`] reads the resulting call syntax into [`Call`] nodes whose
//!    operands are literals, variables or nested calls.
//!
//! Compiled expressions are memoized by source string, either in a caller
//! owned [`ExpressionCache`] or in the process-wide cache behind [`cached`].
//!
//! # Example
//!
//! ```
//! use std::collections::HashMap;
//!
//! let expr = bt_expr::Expression::compile("x+1").unwrap();
//! let vars = HashMap::from([("x".to_string(), 4.0_f32)]);
//! assert_eq!(expr.evaluate(&vars), 5.0);
//! ```

pub mod cache;
pub mod error;
pub mod eval;
pub mod parse;
pub mod rewrite;

pub use cache::{ExprId, ExpressionCache, by_id, cached, cached_id};
pub use error::{ExprError, Result};
pub use eval::{Call, Op, Operand, VariableSource};

/// A compiled expression.
#[derive(Debug, Clone)]
pub struct Expression {
    source: String,
    root: Call,
    variables: Vec<String>,
}

impl Expression {
    /// Compiles `source` into an operator tree.
    ///
    /// An empty source compiles to the constant `0`. Whitespace is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ExprError`] when the rewritten text is not a well formed
    /// call, for example on a missing closing parenthesis or an empty
    /// operand list.
    pub fn compile(source: &str) -> Result<Self> {
        let compact: String = source.chars().filter(|c| !c.is_whitespace()).collect();
        let compact = if compact.is_empty() {
            "0".to_string()
        } else {
            compact
        };

        let prefix = rewrite::to_prefix(&compact);
        let mut variables = Vec::new();
        let root = parse::parse_call(&prefix, &mut variables)?;

        tracing::debug!(source, prefix = %prefix, "compiled expression");

        Ok(Self {
            source: source.to_string(),
            root,
            variables,
        })
    }

    /// Evaluates the expression. Unknown variables read as `0`.
    pub fn evaluate<V>(&self, vars: &V) -> f32
    where
        V: VariableSource + ?Sized,
    {
        self.root.evaluate(vars)
    }

    /// Source text this expression was compiled from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Variable names referenced by the expression, in first-seen order.
    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    /// Root call of the operator tree.
    pub fn root(&self) -> &Call {
        &self.root
    }
}

impl std::fmt::Display for Expression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.root.fmt(f)
    }
}
