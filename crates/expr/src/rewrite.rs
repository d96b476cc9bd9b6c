//! Infix to prefix rewriting.
//!
//! Each binary operator is replaced by a call wrapping its two neighbouring
//! operands. Operands extend outward until a parenthesis that closes the
//! enclosing group, a top-level comma, or another occurrence of the same
//! operator. Operators are expanded in the order `+ - * / %`, each one until
//! no occurrence remains.

/// Operator characters and the call names they expand to, in expansion order.
pub const EXPANSIONS: [(char, &str); 5] = [
    ('+', "add"),
    ('-', "sub"),
    ('*', "mul"),
    ('/', "div"),
    ('%', "mod"),
];

/// Rewrites every binary operator of `source` into call form.
pub fn to_prefix(source: &str) -> String {
    let mut text = source.to_string();
    for (sep, opcode) in EXPANSIONS {
        text = expand(&text, sep, opcode);
    }

    if !text.contains('(') {
        text = format!("none({text})");
    }
    text
}

/// Expands every occurrence of `sep` in `source` into `opcode(lhs,rhs)`.
pub fn expand(source: &str, sep: char, opcode: &str) -> String {
    let mut chars: Vec<char> = source.chars().collect();

    while let Some(pos) = chars.iter().position(|&c| c == sep) {
        let start = left_operand_start(&chars, pos, sep);
        let end = right_operand_end(&chars, pos, sep);

        let mut next = String::with_capacity(chars.len() + opcode.len() + 3);
        next.extend(&chars[..start]);
        next.push_str(opcode);
        next.push('(');
        next.extend(&chars[start..pos]);
        next.push(',');
        next.extend(&chars[pos + 1..end]);
        next.push(')');
        next.extend(&chars[end..]);

        chars = next.chars().collect();
    }

    chars.into_iter().collect()
}

/// Exclusive end of the operand to the right of `pos`.
fn right_operand_end(chars: &[char], pos: usize, sep: char) -> usize {
    let mut depth = 0usize;
    let mut i = pos + 1;

    while i < chars.len() {
        match chars[i] {
            '(' => depth += 1,
            ')' if depth == 0 => break,
            ')' => depth -= 1,
            c if (c == sep || c == ',') && depth == 0 => break,
            _ => {}
        }
        i += 1;
    }
    i
}

/// Start of the operand to the left of `pos`.
fn left_operand_start(chars: &[char], pos: usize, sep: char) -> usize {
    let mut depth = 0usize;
    let mut i = pos as isize - 1;

    while i >= 0 {
        let c = chars[i as usize];
        if c == ')' {
            // A closing parenthesis not directly before the operator, at the
            // operand's own level, bounds the operand.
            if depth == 0 && i < pos as isize - 1 {
                i += 1;
                break;
            }
            depth += 1;
        } else if c == '(' {
            if depth == 0 {
                break;
            }
            depth -= 1;
        } else if (c == sep || c == ',') && depth == 0 {
            break;
        }
        i -= 1;
    }

    if i < 0 { 0 } else { i as usize + 1 }
}
