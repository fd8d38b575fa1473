//! Conversion engine between operator-annotated regular expressions and
//! labelled finite automata, one step at a time

#![deny(
    clippy::disallowed_methods,
    clippy::suspicious,
    clippy::style,
    clippy::clone_on_ref_ptr,
    missing_debug_implementations,
    missing_copy_implementations
)]
#![warn(clippy::pedantic, missing_docs)]
#![allow(clippy::module_name_repetitions)]

pub mod autom;
pub mod bijection;
pub mod build;
pub mod dot;
pub mod expr;
pub mod free;
pub mod op;
pub mod reduce;
pub mod syntax;

pub use autom::{Automaton, StateId};
pub use build::build;
pub use expr::{Expr, Symbol};
pub use op::{Operator, Symbols};
pub use reduce::{eliminate, final_regex, is_fully_reduced, reduce_state};
pub use syntax::{parse, simplify};

#[cfg(any(test, feature = "proptest"))]
pub mod prop {
    //! Strategies for generating random expression trees

    use proptest::prelude::*;

    use crate::expr::{Expr, Symbol};

    /// A random operand, biased towards plain characters
    pub fn symbol() -> impl Strategy<Value = Symbol> {
        prop_oneof![
            8 => prop::char::range('a', 'e').prop_map(Symbol::Char),
            1 => Just(Symbol::EmptyString),
            1 => Just(Symbol::EmptySet),
        ]
    }

    /// A random expression tree of at most `depth` levels
    pub fn expr(depth: u32, tree_size: u32) -> impl Strategy<Value = Expr> {
        symbol()
            .prop_map(Expr::Operand)
            .prop_recursive(depth, tree_size, 2, |s| {
                prop_oneof![
                    s.clone().prop_map(Expr::star),
                    (s.clone(), s.clone()).prop_map(|(l, r)| Expr::concat(l, r)),
                    (s.clone(), s).prop_map(|(l, r)| Expr::union(l, r)),
                ]
            })
    }
}
