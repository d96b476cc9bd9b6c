//! Call-syntax parser.
//!
//! Reads the prefix form produced by [`crate::rewrite`] (`name(arg,arg,...)`)
//! into a [`Call`] tree. Each argument is a float literal, a nested call, or
//! a variable name.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{ExprError, Result};
use crate::eval::{Call, Op, Operand};

static CALL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\w*)\((.*)\)").expect("call pattern is valid"));

/// Parses `text` as a call, recording new variable names into `variables`.
pub fn parse_call(text: &str, variables: &mut Vec<String>) -> Result<Call> {
    let captures = CALL_PATTERN
        .captures(text)
        .ok_or_else(|| ExprError::InvalidOperation(text.to_string()))?;

    let op = Op::from_name(&captures[1]);
    let operands = split_operands(&captures[2])?
        .into_iter()
        .map(|arg| parse_operand(arg, variables))
        .collect::<Result<Vec<_>>>()?;

    Ok(Call::new(op, operands))
}

fn parse_operand(arg: &str, variables: &mut Vec<String>) -> Result<Operand> {
    if is_float_literal(arg) {
        let value = arg
            .parse::<f32>()
            .map_err(|_| ExprError::InvalidOperand(arg.to_string()))?;
        return Ok(Operand::Literal(value));
    }

    if arg.contains('(') {
        return Ok(Operand::Call(Box::new(parse_call(arg, variables)?)));
    }

    if !variables.iter().any(|v| v == arg) {
        variables.push(arg.to_string());
    }
    Ok(Operand::Variable(arg.to_string()))
}

/// Splits an argument list on commas that are not nested in parentheses.
///
/// Empty arguments are dropped; a list with no argument at all is an error.
pub fn split_operands(args: &str) -> Result<Vec<&str>> {
    let mut operands = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;

    for (i, c) in args.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth -= 1,
            ',' if depth == 0 => {
                operands.push(&args[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    operands.push(&args[start..]);
    operands.retain(|arg| !arg.is_empty());

    if operands.is_empty() {
        return Err(ExprError::InvalidOperand(args.to_string()));
    }
    Ok(operands)
}

/// Unsigned decimal literal: digits with at most one decimal point.
fn is_float_literal(text: &str) -> bool {
    let mut digits = 0;
    let mut points = 0;
    for c in text.chars() {
        match c {
            '0'..='9' => digits += 1,
            '.' => points += 1,
            _ => return false,
        }
    }
    digits > 0 && points <= 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_commas_do_not_split() {
        let parts = split_operands("add(1,2),3").unwrap();
        assert_eq!(parts, vec!["add(1,2)", "3"]);
    }

    #[test]
    fn empty_argument_list_is_rejected() {
        assert_eq!(
            split_operands(""),
            Err(ExprError::InvalidOperand(String::new()))
        );
    }

    #[test]
    fn missing_closing_parenthesis_is_rejected() {
        let mut vars = Vec::new();
        assert!(matches!(
            parse_call("add(1,2", &mut vars),
            Err(ExprError::InvalidOperation(_))
        ));
    }

    #[test]
    fn variables_are_registered_once() {
        let mut vars = Vec::new();
        parse_call("mul(x,add(x,y))", &mut vars).unwrap();
        assert_eq!(vars, vec!["x".to_string(), "y".to_string()]);
    }

    #[test]
    fn literal_classification() {
        assert!(is_float_literal("12"));
        assert!(is_float_literal("0.25"));
        assert!(!is_float_literal("."));
        assert!(!is_float_literal("1.2.3"));
        assert!(!is_float_literal("x1"));
    }
}
