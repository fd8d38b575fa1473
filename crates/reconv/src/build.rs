//! Thompson-style construction of an automaton from an expression tree

use crate::{
    autom::{Automaton, StateId},
    expr::{Expr, Symbol},
};

struct Builder(Automaton);

impl Builder {
    #[inline]
    fn epsilon(&mut self, from: StateId, to: StateId) {
        assert!(self.0.connect(from, to, Symbol::EmptyString.to_string()).is_none());
    }

    #[inline]
    fn fresh_pair(&mut self) -> (StateId, StateId) { (self.0.add_state(), self.0.add_state()) }

    /// Build the fragment for `expr`, returning its initial and final state
    fn build_in(&mut self, expr: &Expr) -> (StateId, StateId) {
        match expr {
            Expr::Operand(sym) => {
                let (i, f) = self.fresh_pair();
                assert!(self.0.connect(i, f, sym.to_string()).is_none());
                tracing::trace!(%i, %f, %sym, "Operand fragment");
                (i, f)
            },
            Expr::Star(inner) => {
                let (ai, af) = self.build_in(inner);
                let (i, f) = self.fresh_pair();

                self.epsilon(i, ai);
                self.epsilon(af, f);
                self.epsilon(af, ai);
                self.epsilon(i, f);
                tracing::trace!(%i, %f, inner = ?(ai, af), "Star fragment");
                (i, f)
            },
            Expr::Concat(l, r) => {
                let (li, lf) = self.build_in(l);
                let (ri, rf) = self.build_in(r);

                self.0.merge(lf, ri);
                tracing::trace!(i = %li, f = %rf, joint = %lf, "Concatenation fragment");
                (li, rf)
            },
            Expr::Union(l, r) => {
                let (li, lf) = self.build_in(l);
                let (ri, rf) = self.build_in(r);
                let (i, f) = self.fresh_pair();

                self.epsilon(i, li);
                self.epsilon(i, ri);
                self.epsilon(lf, f);
                self.epsilon(rf, f);
                tracing::trace!(%i, %f, left = ?(li, lf), right = ?(ri, rf), "Union fragment");
                (i, f)
            },
        }
    }
}

/// Construct an automaton accepting the language of `expr`.
///
/// Every transition of the result is labelled with a single operand symbol,
/// `ε` included.  The expression is only borrowed.
#[must_use]
pub fn build(expr: &Expr) -> Automaton {
    let mut builder = Builder(Automaton::new());
    let (i, f) = builder.build_in(expr);

    let Builder(mut autom) = builder;
    autom.set_initial(Some(i));
    autom.set_final(Some(f));
    tracing::debug!(
        states = autom.len(),
        transitions = autom.transition_count(),
        "Built automaton"
    );
    autom
}

impl From<&Expr> for Automaton {
    #[inline]
    fn from(expr: &Expr) -> Self { build(expr) }
}

#[cfg(test)]
mod test {
    use proptest::prelude::*;

    use super::build;
    use crate::{autom::Automaton, expr::Expr};

    fn a() -> Expr { Expr::char('a') }

    fn b() -> Expr { Expr::char('b') }

    fn edges(autom: &Automaton) -> Vec<(u32, u32, String)> {
        let ids: Vec<_> = autom.states().collect();
        let idx = |s| u32::try_from(ids.iter().position(|&i| i == s).unwrap()).unwrap();
        autom
            .transitions()
            .map(|(f, t, l)| (idx(f), idx(t), l.to_owned()))
            .collect()
    }

    fn state_count(e: &Expr) -> usize {
        match e {
            Expr::Operand(_) => 2,
            Expr::Star(l) => state_count(l) + 2,
            Expr::Concat(l, r) => state_count(l) + state_count(r) - 1,
            Expr::Union(l, r) => state_count(l) + state_count(r) + 2,
        }
    }

    #[test]
    fn operand() {
        let autom = build(&a());
        assert_eq!(autom.len(), 2);
        assert_eq!(edges(&autom), [(0, 1, "a".into())]);
        let (i, f) = (autom.initial().unwrap(), autom.final_state().unwrap());
        assert_eq!(autom.label(i, f), Some("a"));
        assert!(autom.is_valid());
    }

    #[test]
    fn star() {
        let autom = build(&Expr::star(a()));
        // inner states come first, then the new initial and final
        assert_eq!(edges(&autom), [
            (0, 1, "a".into()),
            (1, 0, "ε".into()),
            (1, 3, "ε".into()),
            (2, 0, "ε".into()),
            (2, 3, "ε".into()),
        ]);
        let ids: Vec<_> = autom.states().collect();
        assert_eq!(autom.initial(), Some(ids[2]));
        assert_eq!(autom.final_state(), Some(ids[3]));
    }

    #[test]
    fn concat_merges_joint() {
        let autom = build(&Expr::concat(a(), b()));
        assert_eq!(autom.len(), 3);
        assert_eq!(edges(&autom), [(0, 1, "a".into()), (1, 2, "b".into())]);
        let ids: Vec<_> = autom.states().collect();
        assert_eq!(autom.initial(), Some(ids[0]));
        assert_eq!(autom.final_state(), Some(ids[2]));
    }

    #[test]
    fn union() {
        let autom = build(&Expr::union(a(), b()));
        assert_eq!(edges(&autom), [
            (0, 1, "a".into()),
            (1, 5, "ε".into()),
            (2, 3, "b".into()),
            (3, 5, "ε".into()),
            (4, 0, "ε".into()),
            (4, 2, "ε".into()),
        ]);
        let ids: Vec<_> = autom.states().collect();
        assert_eq!(autom.initial(), Some(ids[4]));
        assert_eq!(autom.final_state(), Some(ids[5]));
    }

    #[test]
    fn meta_symbols() {
        let autom = build(&Expr::union(Expr::EMPTY_SET, Expr::EMPTY_STRING));
        let labels: Vec<_> = autom.transitions().map(|(.., l)| l.to_owned()).collect();
        assert!(labels.contains(&"∅".to_owned()));
        assert_eq!(labels.iter().filter(|l| *l == "ε").count(), 5);
    }

    proptest! {
        #[test]
        fn built_automata_are_valid(e in crate::prop::expr(6, 48)) {
            let autom = Automaton::from(&e);
            prop_assert!(autom.is_valid());
            prop_assert_ne!(autom.initial(), autom.final_state());
            prop_assert_eq!(autom.len(), state_count(&e));

            let i = autom.initial().unwrap();
            let f = autom.final_state().unwrap();
            prop_assert_eq!(autom.predecessors(i).count(), 0);
            prop_assert_eq!(autom.successors(f).count(), 0);
        }
    }
}
