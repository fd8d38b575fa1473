//! Expression trees

use std::{borrow::Cow, fmt, str::FromStr};

use crate::{
    dot,
    free::Free,
    op::{Operator, Symbols, registry},
    syntax::{self, ParseError},
};

/// An operand: a literal character or one of the two meta-symbols
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Symbol {
    /// Matches this character literally
    Char(char),
    /// Matches exactly the empty sequence
    EmptyString,
    /// Matches nothing
    EmptySet,
}

impl Symbol {
    /// Written form of [`Symbol::EmptySet`]
    pub const EMPTY_SET: char = '∅';
    /// Written form of [`Symbol::EmptyString`]
    pub const EMPTY_STRING: char = 'ε';

    /// Classify `c` as an operand, or `None` if it cannot be one
    #[must_use]
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            Self::EMPTY_STRING => Some(Self::EmptyString),
            Self::EMPTY_SET => Some(Self::EmptySet),
            c if c.is_ascii_alphanumeric() => Some(Self::Char(c)),
            _ => None,
        }
    }

    /// The character this operand is written as
    #[must_use]
    pub fn as_char(self) -> char {
        match self {
            Self::Char(c) => c,
            Self::EmptyString => Self::EMPTY_STRING,
            Self::EmptySet => Self::EMPTY_SET,
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.as_char(), f)
    }
}

/// A regular expression tree.
///
/// Trees are values: every transformation builds a new tree instead of
/// editing one in place.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Expr {
    /// A single operand
    Operand(Symbol),
    /// Zero or more repetitions
    Star(Box<Expr>),
    /// Left followed by right
    Concat(Box<Expr>, Box<Expr>),
    /// Either side
    Union(Box<Expr>, Box<Expr>),
}

impl From<Symbol> for Expr {
    #[inline]
    fn from(sym: Symbol) -> Self { Self::Operand(sym) }
}

impl Expr {
    /// The expression matching nothing
    pub const EMPTY_SET: Expr = Expr::Operand(Symbol::EmptySet);
    /// The expression matching only the empty sequence
    pub const EMPTY_STRING: Expr = Expr::Operand(Symbol::EmptyString);

    /// A literal character operand
    #[inline]
    #[must_use]
    pub fn char(c: char) -> Self { Self::Operand(Symbol::Char(c)) }

    /// `inner*`
    #[inline]
    #[must_use]
    pub fn star(inner: Self) -> Self { Self::Star(inner.into()) }

    /// `l` then `r`
    #[inline]
    #[must_use]
    pub fn concat(l: Self, r: Self) -> Self { Self::Concat(l.into(), r.into()) }

    /// `l` or `r`
    #[inline]
    #[must_use]
    pub fn union(l: Self, r: Self) -> Self { Self::Union(l.into(), r.into()) }

    /// Build an operation node, checking the operator's arity.
    ///
    /// # Errors
    /// A STAR given a right operand fails with
    /// [`ParseError::UnexpectedOperand`], a binary operator missing its right
    /// operand fails with [`ParseError::EmptyOperand`].
    pub fn operation(op: Operator, left: Self, right: Option<Self>) -> Result<Self, ParseError> {
        match (op, right) {
            (Operator::Star, None) => Ok(Self::star(left)),
            (Operator::Star, Some(_)) => Err(ParseError::UnexpectedOperand(None)),
            (Operator::Concat, Some(r)) => Ok(Self::concat(left, r)),
            (Operator::Union, Some(r)) => Ok(Self::union(left, r)),
            (op @ (Operator::Concat | Operator::Union), None) => Err(ParseError::EmptyOperand(op)),
        }
    }

    /// The operator of an operation node, or `None` for an operand
    #[must_use]
    pub fn operator(&self) -> Option<Operator> {
        match self {
            Self::Operand(_) => None,
            Self::Star(_) => Some(Operator::Star),
            Self::Concat(..) => Some(Operator::Concat),
            Self::Union(..) => Some(Operator::Union),
        }
    }

    /// The operand of a leaf, or `None` for an operation
    #[must_use]
    pub fn symbol(&self) -> Option<Symbol> {
        match *self {
            Self::Operand(s) => Some(s),
            _ => None,
        }
    }

    /// The first child of an operation
    #[must_use]
    pub fn left(&self) -> Option<&Expr> {
        match self {
            Self::Operand(_) => None,
            Self::Star(l) | Self::Concat(l, _) | Self::Union(l, _) => Some(l),
        }
    }

    /// The right child; always `None` for STAR
    #[must_use]
    pub fn right(&self) -> Option<&Expr> {
        match self {
            Self::Operand(_) | Self::Star(_) => None,
            Self::Concat(_, r) | Self::Union(_, r) => Some(r),
        }
    }

    /// Number of operations on the longest path from the root to an operand
    #[must_use]
    pub fn depth(&self) -> usize {
        match self {
            Self::Operand(_) => 0,
            Self::Star(l) => l.depth() + 1,
            Self::Concat(l, r) | Self::Union(l, r) => l.depth().max(r.depth()) + 1,
        }
    }

    /// Nodes in parent-left-right order
    #[inline]
    #[must_use]
    pub fn pre_order(&self) -> PreOrder<'_> { PreOrder(vec![self]) }

    /// Nodes in left-right-parent order
    #[inline]
    #[must_use]
    pub fn post_order(&self) -> PostOrder<'_> { PostOrder(vec![(self, false)]) }

    /// Print with the fewest brackets that still parse back to this tree
    #[inline]
    #[must_use]
    pub fn display<'a>(&'a self, syms: &'a Symbols) -> Display<'a> { Display(self, syms) }

    /// Print with every operation bracketed
    #[must_use]
    pub fn canonical(&self, syms: &Symbols) -> String {
        fn go(e: &Expr, syms: &Symbols, s: &mut String) {
            match e {
                Expr::Operand(o) => s.push(o.as_char()),
                Expr::Star(l) => {
                    s.push('(');
                    go(l, syms, s);
                    s.push(syms.symbol(Operator::Star));
                    s.push(')');
                },
                Expr::Concat(l, r) | Expr::Union(l, r) => {
                    s.push('(');
                    go(l, syms, s);
                    s.push(syms.symbol(e.operator().unwrap_or_else(|| unreachable!())));
                    go(r, syms, s);
                    s.push(')');
                },
            }
        }

        let mut s = String::new();
        go(self, syms, &mut s);
        s
    }

    /// Render the parse tree as a Graphviz graph
    #[must_use]
    pub fn dot(&self, syms: &Symbols) -> dot::Graph<'static> {
        fn go(e: &Expr, syms: &Symbols, free: &mut Free<u32>, graph: &mut dot::Graph<'static>) -> u32 {
            let id = free.fresh();
            let label: Cow<'static, str> = match e {
                Expr::Operand(s) => s.to_string().into(),
                e => syms
                    .symbol(e.operator().unwrap_or_else(|| unreachable!()))
                    .to_string()
                    .into(),
            };

            let node = graph.node(id.to_string());
            node.label(label);
            if e.symbol().is_some() {
                node.shape("plaintext");
            }

            for child in [e.left(), e.right()].into_iter().flatten() {
                let child = go(child, syms, free, graph);
                graph.edge(id.to_string(), child.to_string());
            }

            id
        }

        let mut graph = dot::Graph::new();
        go(self, syms, &mut Free::from(0), &mut graph);
        graph
    }
}

/// Iterator returned by [`Expr::pre_order`]
#[derive(Debug)]
pub struct PreOrder<'a>(Vec<&'a Expr>);

impl<'a> Iterator for PreOrder<'a> {
    type Item = &'a Expr;

    fn next(&mut self) -> Option<Self::Item> {
        let next = self.0.pop()?;
        self.0.extend(next.right());
        self.0.extend(next.left());
        Some(next)
    }
}

/// Iterator returned by [`Expr::post_order`]
#[derive(Debug)]
pub struct PostOrder<'a>(Vec<(&'a Expr, bool)>);

impl<'a> Iterator for PostOrder<'a> {
    type Item = &'a Expr;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (next, expanded) = self.0.pop()?;
            if expanded {
                break Some(next);
            }

            self.0.push((next, true));
            self.0.extend(next.right().map(|r| (r, false)));
            self.0.extend(next.left().map(|l| (l, false)));
        }
    }
}

/// Minimal-bracket printer returned by [`Expr::display`]
#[derive(Debug, Clone, Copy)]
pub struct Display<'a>(&'a Expr, &'a Symbols);

impl Display<'_> {
    fn write(f: &mut fmt::Formatter<'_>, e: &Expr, syms: &Symbols, bracket: bool) -> fmt::Result {
        if bracket {
            f.write_str("(")?;
        }

        match e {
            Expr::Operand(s) => write!(f, "{s}")?,
            // A STAR operand only binds tighter than the binary operators
            Expr::Star(l) => {
                Self::write(f, l, syms, l.operator().is_some_and(Operator::is_binary))?;
                write!(f, "{}", syms.symbol(Operator::Star))?;
            },
            // Concatenation chains to the left and binds tighter than union
            Expr::Concat(l, r) => {
                Self::write(f, l, syms, matches!(**l, Expr::Union(..)))?;
                write!(f, "{}", syms.symbol(Operator::Concat))?;
                Self::write(f, r, syms, r.operator().is_some_and(Operator::is_binary))?;
            },
            Expr::Union(l, r) => {
                Self::write(f, l, syms, false)?;
                write!(f, "{}", syms.symbol(Operator::Union))?;
                Self::write(f, r, syms, matches!(**r, Expr::Union(..)))?;
            },
        }

        if bracket {
            f.write_str(")")?;
        }

        Ok(())
    }
}

impl fmt::Display for Display<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self(e, syms) = *self;
        Self::write(f, e, syms, false)
    }
}

/// Prints using a snapshot of the process-wide symbol table
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.display(&registry::get()), f)
    }
}

/// Parses using a snapshot of the process-wide symbol table
impl FromStr for Expr {
    type Err = ParseError;

    #[inline]
    fn from_str(s: &str) -> Result<Self, Self::Err> { syntax::parse(s, &registry::get()) }
}

#[cfg(test)]
mod test {
    use proptest::prelude::*;

    use super::{Expr, Symbol};
    use crate::{
        op::{Operator, Symbols},
        syntax::{ParseError, parse},
    };

    fn a() -> Expr { Expr::char('a') }

    fn b() -> Expr { Expr::char('b') }

    fn c() -> Expr { Expr::char('c') }

    #[test]
    fn symbols() {
        assert_eq!(Symbol::from_char('x'), Some(Symbol::Char('x')));
        assert_eq!(Symbol::from_char('7'), Some(Symbol::Char('7')));
        assert_eq!(Symbol::from_char('ε'), Some(Symbol::EmptyString));
        assert_eq!(Symbol::from_char('∅'), Some(Symbol::EmptySet));
        assert_eq!(Symbol::from_char('*'), None);
        assert_eq!(Symbol::from_char(' '), None);
        assert_eq!(Symbol::EmptySet.to_string(), "∅");
    }

    #[test]
    fn checked_operation() {
        assert_eq!(
            Expr::operation(Operator::Star, a(), None).unwrap(),
            Expr::star(a())
        );
        assert!(matches!(
            Expr::operation(Operator::Star, a(), Some(b())),
            Err(ParseError::UnexpectedOperand(_))
        ));
        assert!(matches!(
            Expr::operation(Operator::Union, a(), None),
            Err(ParseError::EmptyOperand(Operator::Union))
        ));
        assert_eq!(
            Expr::operation(Operator::Concat, a(), Some(b())).unwrap(),
            Expr::concat(a(), b())
        );
    }

    #[test]
    fn shape() {
        let e = Expr::union(Expr::star(a()), Expr::concat(b(), Expr::star(Expr::star(c()))));
        assert_eq!(e.depth(), 4);
        assert_eq!(e.operator(), Some(Operator::Union));
        assert_eq!(e.left(), Some(&Expr::star(a())));
        assert_eq!(Expr::star(a()).right(), None);
        assert_eq!(a().depth(), 0);
        assert_eq!(a().operator(), None);
    }

    #[test]
    fn traversals() {
        let e = Expr::union(Expr::concat(a(), b()), Expr::star(c()));
        let syms = Symbols::default();

        let pre: Vec<_> = e.pre_order().map(|e| e.display(&syms).to_string()).collect();
        assert_eq!(pre, ["a|b+c*", "a|b", "a", "b", "c*", "c"]);

        let post: Vec<_> = e.post_order().map(|e| e.display(&syms).to_string()).collect();
        assert_eq!(post, ["a", "b", "a|b", "c", "c*", "a|b+c*"]);
    }

    #[test]
    fn minimal_brackets() {
        let syms = Symbols::default();
        let show = |e: Expr| e.display(&syms).to_string();

        assert_eq!(show(Expr::union(Expr::union(a(), b()), c())), "a+b+c");
        assert_eq!(show(Expr::union(a(), Expr::union(b(), c()))), "a+(b+c)");
        assert_eq!(show(Expr::concat(Expr::concat(a(), b()), c())), "a|b|c");
        assert_eq!(show(Expr::concat(a(), Expr::concat(b(), c()))), "a|(b|c)");
        assert_eq!(show(Expr::concat(Expr::union(a(), b()), c())), "(a+b)|c");
        assert_eq!(show(Expr::star(Expr::union(a(), b()))), "(a+b)*");
        assert_eq!(show(Expr::star(Expr::star(a()))), "a**");
        assert_eq!(show(Expr::union(Expr::star(a()), b())), "a*+b");
        assert_eq!(show(Expr::star(Expr::EMPTY_SET)), "∅*");
    }

    #[test]
    fn canonical_form() {
        let syms = Symbols::default();
        let e = Expr::union(Expr::star(a()), Expr::concat(b(), c()));
        assert_eq!(e.canonical(&syms), "((a*)+(b|c))");
        assert_eq!(parse(&e.canonical(&syms), &syms).unwrap(), e);
    }

    #[test]
    fn custom_symbols() {
        let mut syms = Symbols::default();
        assert!(syms.set_symbol(Operator::Concat, '.'));
        assert!(syms.set_symbol(Operator::Union, '|'));
        let e = Expr::union(Expr::concat(a(), Expr::star(b())), c());
        assert_eq!(e.display(&syms).to_string(), "a.b*|c");
    }

    #[test]
    fn parse_tree_dot() {
        let syms = Symbols::default();
        let dot = Expr::concat(a(), Expr::star(b())).dot(&syms).to_string();
        assert!(dot.starts_with("digraph {"));
        assert!(dot.contains(r#""0"->"1""#));
        assert!(dot.contains(r#""0"->"2""#));
        assert!(dot.contains(r#""2"->"3""#));
    }

    proptest! {
        #[test]
        fn display_parses_back(e in crate::prop::expr(6, 48)) {
            let syms = Symbols::default();
            let s = e.display(&syms).to_string();
            let parsed = parse(&s, &syms).unwrap_or_else(|err| panic!("Error parsing {s:?}: {err}"));
            prop_assert_eq!(parsed, e);
        }

        #[test]
        fn traversals_agree(e in crate::prop::expr(6, 48)) {
            prop_assert_eq!(e.pre_order().count(), e.post_order().count());
            prop_assert!(std::ptr::eq(e.pre_order().next().unwrap(), &e));
            prop_assert!(std::ptr::eq(e.post_order().last().unwrap(), &e));
        }
    }
}
