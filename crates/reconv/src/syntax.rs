//! Recursive-descent parsing of operator-annotated expressions.
//!
//! The grammar has no precedence table of its own.  Instead the root of every
//! (sub)expression is the lowest-precedence operator outside all brackets:
//! UNION binds loosest, then CONCATENATION, then STAR.  Among operators of the
//! same kind the rightmost one is the root, which makes the binary operators
//! chain to the left, so `a+b+c` reads as `(a+b)+c`.
//!
//! All positions reported by this module count characters, not bytes.

use crate::{
    expr::{Expr, Symbol},
    op::{Operator, Symbols},
};

/// Longest input accepted by [`parse`] and [`simplify`]
pub const MAX_LEN: usize = 1 << 14;

/// Deepest operator nesting accepted by [`parse`], counted in operations
/// between the root and the deepest operand
pub const MAX_DEPTH: usize = 512;

/// Reasons an expression is rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// A character that is neither operand, operator nor bracket
    #[error("Illegal character {0:?} at position {1}")]
    IllegalAlphabet(char, usize),
    /// A closing bracket without partner, or unclosed brackets at the end
    #[error("Unbalanced brackets at position {0}")]
    UnbalancedBrackets(usize),
    /// An operator is missing an operand
    #[error("Missing operand for {0}")]
    EmptyOperand(Operator),
    /// An operand with no operator to attach it to
    #[error(
        "Unexpected operand{}",
        .0.map_or_else(String::new, |i| format!(" at position {i}"))
    )]
    UnexpectedOperand(Option<usize>),
    /// The character is not bound to any operator
    #[error("{0:?} is not an operator symbol")]
    UnknownOperator(char),
    /// Nothing to parse, possibly after stripping brackets
    #[error("Empty expression")]
    EmptyExpression,
    /// Input longer than [`MAX_LEN`]
    #[error("Expression is {0} characters long, the limit is {MAX_LEN}")]
    TooLong(usize),
    /// Operators nested deeper than [`MAX_DEPTH`]
    #[error("Expression nests operators more than {MAX_DEPTH} deep")]
    TooDeep,
}

#[inline]
fn is_valid_char(c: char, syms: &Symbols) -> bool {
    c == '(' || c == ')' || Symbol::from_char(c).is_some() || syms.is_operator(c)
}

fn validate_chars(cs: &[char], syms: &Symbols) -> Result<(), ParseError> {
    let mut depth = 0_usize;

    for (i, &c) in cs.iter().enumerate() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.checked_sub(1).ok_or(ParseError::UnbalancedBrackets(i))?,
            c if is_valid_char(c, syms) => (),
            c => return Err(ParseError::IllegalAlphabet(c, i)),
        }
    }

    if depth == 0 {
        Ok(())
    } else {
        Err(ParseError::UnbalancedBrackets(cs.len()))
    }
}

/// Check that `text` only uses operands, the current operator symbols and
/// brackets, and that its brackets nest properly.
///
/// # Errors
/// Returns [`ParseError::IllegalAlphabet`] or
/// [`ParseError::UnbalancedBrackets`] on the first offending character.
pub fn validate(text: &str, syms: &Symbols) -> Result<(), ParseError> {
    let cs: Vec<char> = text.chars().collect();
    validate_chars(&cs, syms)
}

/// True if the first character is an opening bracket whose partner is the
/// last character
fn outer_linked(cs: &[char]) -> bool {
    let ['(', inner @ .., ')'] = cs else {
        return false;
    };

    let mut depth = 1_usize;
    for &c in inner {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return false;
                }
            },
            _ => (),
        }
    }

    true
}

/// Strip linked outer brackets as many times as possible, tracking how far
/// the start moved
fn strip_all(mut cs: &[char], mut at: usize) -> (&[char], usize) {
    while outer_linked(cs) {
        cs = &cs[1..cs.len() - 1];
        at += 1;
    }

    (cs, at)
}

/// Remove one pair of outer brackets if they match each other.
///
/// `(a+b)` becomes `a+b`, while `(a)+(b)` is returned unchanged.  Assumes the
/// brackets in `text` are balanced.
#[must_use]
pub fn strip_outer_brackets(text: &str) -> &str {
    let cs: Vec<char> = text.chars().collect();
    if outer_linked(&cs) {
        &text[1..text.len() - 1]
    } else {
        text
    }
}

fn root_index(cs: &[char], syms: &Symbols) -> Option<usize> {
    let mut found = [None; 3];
    let mut depth = 0_isize;

    for (i, &c) in cs.iter().enumerate().rev() {
        match c {
            ')' => depth += 1,
            '(' => depth -= 1,
            c if depth == 0 => {
                if let Ok(op) = syms.operator_for(c) {
                    found[op as usize].get_or_insert(i);
                }
            },
            _ => (),
        }
    }

    let [star, concat, union] = found;
    union.or(concat).or(star)
}

/// Locate the operator at the root of `text`: the rightmost unbracketed
/// UNION, else the rightmost unbracketed CONCATENATION, else the rightmost
/// unbracketed STAR.
///
/// `(a+b)*` has its root at 5, `a*+b` at 2.
#[must_use]
pub fn find_root_index(text: &str, syms: &Symbols) -> Option<usize> {
    let cs: Vec<char> = text.chars().collect();
    root_index(&cs, syms)
}

fn parse_in(cs: &[char], at: usize, depth: usize, syms: &Symbols) -> Result<Expr, ParseError> {
    if depth > MAX_DEPTH {
        return Err(ParseError::TooDeep);
    }

    let (cs, at) = strip_all(cs, at);

    match *cs {
        [] => return Err(ParseError::EmptyExpression),
        [c] => {
            if let Some(sym) = Symbol::from_char(c) {
                return Ok(Expr::Operand(sym));
            }
        },
        _ => (),
    }

    let Some(root) = root_index(cs, syms) else {
        return Err(ParseError::UnexpectedOperand(Some(at + 1)));
    };

    let (left, right) = (&cs[..root], &cs[root + 1..]);
    let op = syms.operator_for(cs[root])?;

    if left.is_empty() {
        return Err(ParseError::EmptyOperand(op));
    }

    let left = parse_in(left, at, depth + 1, syms)?;

    let right = if op.is_binary() {
        if right.is_empty() {
            return Err(ParseError::EmptyOperand(op));
        }

        Some(parse_in(right, at + root + 1, depth + 1, syms)?)
    } else {
        if !right.is_empty() {
            return Err(ParseError::UnexpectedOperand(Some(at + root + 1)));
        }

        None
    };

    Expr::operation(op, left, right)
}

fn parse_chars(cs: &[char], syms: &Symbols) -> Result<Expr, ParseError> {
    if cs.len() > MAX_LEN {
        return Err(ParseError::TooLong(cs.len()));
    }

    validate_chars(cs, syms)?;
    parse_in(cs, 0, 0, syms)
}

/// Parse `text` into an expression tree using the given operator symbols.
///
/// # Errors
/// Fails if `text` does not [`validate`], if an operator is missing an
/// operand or has one too many, or if `text` exceeds [`MAX_LEN`] or
/// [`MAX_DEPTH`].
pub fn parse(text: &str, syms: &Symbols) -> Result<Expr, ParseError> {
    let cs: Vec<char> = text.chars().collect();
    parse_chars(&cs, syms)
}

/// Bracket pairs as `(open, close)`, innermost first
fn bracket_pairs(cs: &[char]) -> Vec<(usize, usize)> {
    let mut open = vec![];
    let mut pairs = vec![];

    for (i, &c) in cs.iter().enumerate() {
        match c {
            '(' => open.push(i),
            ')' => pairs.extend(open.pop().map(|o| (o, i))),
            _ => (),
        }
    }

    pairs
}

/// Remove every bracket pair from `text` that does not change how it parses.
///
/// Pairs are tried innermost first, and a removal is only kept if the
/// result still parses to the same tree as `text`.
///
/// # Errors
/// Fails if `text` itself does not parse.
pub fn simplify(text: &str, syms: &Symbols) -> Result<String, ParseError> {
    let mut cs: Vec<char> = text.chars().collect();
    let reference = parse_chars(&cs, syms)?;

    'scan: loop {
        for (open, close) in bracket_pairs(&cs) {
            let candidate: Vec<char> = cs
                .iter()
                .enumerate()
                .filter(|&(i, _)| i != open && i != close)
                .map(|(_, &c)| c)
                .collect();

            if parse_chars(&candidate, syms).is_ok_and(|e| e == reference) {
                cs = candidate;
                continue 'scan;
            }
        }

        break;
    }

    Ok(cs.into_iter().collect())
}
