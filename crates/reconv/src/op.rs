//! Operator kinds and the table binding each one to its written symbol

use std::fmt;

use crate::{bijection::Bijection, syntax::ParseError};

/// The three regular operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Operator {
    /// Kleene closure, unary and postfix
    Star,
    /// Sequencing, binary
    Concat,
    /// Alternation, binary
    Union,
}

impl Operator {
    /// Every operator, in order of decreasing precedence
    pub const ALL: [Operator; 3] = [Self::Star, Self::Concat, Self::Union];

    /// Number of operands taken
    #[inline]
    #[must_use]
    pub fn arity(self) -> usize {
        match self {
            Self::Star => 1,
            Self::Concat | Self::Union => 2,
        }
    }

    /// True for CONCATENATION and UNION
    #[inline]
    #[must_use]
    pub fn is_binary(self) -> bool { self.arity() == 2 }

    /// Symbol used until the operator is rebound
    #[must_use]
    pub fn default_symbol(self) -> char {
        match self {
            Self::Star => '*',
            Self::Concat => '|',
            Self::Union => '+',
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Star => "STAR",
            Self::Concat => "CONCATENATION",
            Self::Union => "UNION",
        })
    }
}

/// Reasons an operator symbol change is refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SymbolError {
    /// The symbol already belongs to another operator
    #[error("Symbol {0:?} is already bound to {1}")]
    DuplicateOperatorSymbol(char, Operator),
    /// The character may not be used as an operator symbol
    #[error("Symbol {0:?} cannot be used as an operator")]
    IllegalSymbol(char),
}

/// Whether `c` may be bound to an operator at all
#[inline]
#[must_use]
pub fn is_symbol_char(c: char) -> bool { c.is_ascii_punctuation() && c != '(' && c != ')' }

/// Operator symbol configuration, passed into the parser and printers.
///
/// The table is always total and one-to-one: every operator has exactly one
/// symbol and no two operators share one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbols(Bijection<Operator, char>);

impl Default for Symbols {
    fn default() -> Self {
        let mut map = Bijection::new();
        for op in Operator::ALL {
            assert_eq!(map.rebind(op, op.default_symbol()), Ok(true));
        }
        Self(map)
    }
}

impl Symbols {
    /// The symbol currently written for `op`
    #[must_use]
    pub fn symbol(&self, op: Operator) -> char {
        self.0
            .image(op)
            .unwrap_or_else(|| unreachable!("Missing symbol for {op}"))
    }

    /// Look up the operator written as `c`
    ///
    /// # Errors
    /// Returns [`ParseError::UnknownOperator`] if no operator is bound to `c`.
    pub fn operator_for(&self, c: char) -> Result<Operator, ParseError> {
        self.0
            .preimage(c)
            .ok_or(ParseError::UnknownOperator(c))
    }

    /// True if `c` is the symbol of any operator
    #[inline]
    #[must_use]
    pub fn is_operator(&self, c: char) -> bool { self.0.preimage(c).is_some() }

    /// Bind `op` to `c`.
    ///
    /// # Errors
    /// Fails if `c` is outside the allowed symbol class or already written for
    /// a different operator.  The table is unchanged on error.
    pub fn try_set_symbol(&mut self, op: Operator, c: char) -> Result<(), SymbolError> {
        if !is_symbol_char(c) {
            return Err(SymbolError::IllegalSymbol(c));
        }

        self.0
            .rebind(op, c)
            .map(|_| ())
            .map_err(|other| SymbolError::DuplicateOperatorSymbol(c, other))
    }

    /// Bind `op` to `c`, returning false if the binding was rejected
    #[inline]
    pub fn set_symbol(&mut self, op: Operator, c: char) -> bool {
        self.try_set_symbol(op, c).is_ok()
    }
}

/// The process-wide symbol table.
///
/// Parsing and printing never consult this implicitly except through the
/// [`FromStr`](std::str::FromStr) and [`Display`](std::fmt::Display) impls of
/// [`Expr`](crate::Expr), which take a snapshot with [`get`].
pub mod registry {
    use spin::{Lazy, RwLock};

    use super::{Operator, SymbolError, Symbols};
    use crate::syntax::ParseError;

    static REGISTRY: Lazy<RwLock<Symbols>> = Lazy::new(|| RwLock::new(Symbols::default()));

    /// Snapshot of the current table
    #[must_use]
    pub fn get() -> Symbols { REGISTRY.read().clone() }

    /// The symbol currently written for `op`
    #[must_use]
    pub fn symbol(op: Operator) -> char { REGISTRY.read().symbol(op) }

    /// # Errors
    /// See [`Symbols::operator_for`].
    pub fn operator_for(c: char) -> Result<Operator, ParseError> { REGISTRY.read().operator_for(c) }

    /// # Errors
    /// See [`Symbols::try_set_symbol`].
    pub fn try_set_symbol(op: Operator, c: char) -> Result<(), SymbolError> {
        let ret = REGISTRY.write().try_set_symbol(op, c);
        match ret {
            Ok(()) => tracing::debug!(%op, symbol = ?c, "Operator symbol changed"),
            Err(ref err) => tracing::debug!(%op, %err, "Rejected operator symbol"),
        }
        ret
    }

    /// Like [`try_set_symbol`], returning false instead of an error
    pub fn set_symbol(op: Operator, c: char) -> bool { try_set_symbol(op, c).is_ok() }

    /// Restore the default symbols
    pub fn reset() { *REGISTRY.write() = Symbols::default(); }
}
