//! Step-wise state elimination from an automaton down to a single regex.
//!
//! Eliminating a state `R` folds every path `P → R → Q` into the transition
//! `P → Q`, so that once only the initial and final states remain the label
//! between them describes the language of the whole automaton.  Labels are
//! combined as expression trees and rewritten with a handful of identities
//! (`∅ + x = x`, `ε | x = x`, `∅* = ε` and friends) before being printed.

use std::fmt;

use crate::{
    autom::{Automaton, StateId},
    expr::{Expr, Symbol},
    op::Symbols,
    syntax::{self, ParseError},
};

/// Reasons a reduction step or read-off is refused
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReduceError {
    /// Roles are missing or shared, or some state is unreachable
    #[error(
        "Automaton needs distinct initial and final states with every state reachable from the \
         initial one"
    )]
    InvalidAutomaton,
    /// The state is not part of the automaton
    #[error("No such state {0}")]
    UnknownState(StateId),
    /// The initial and final states cannot be eliminated
    #[error("Cannot eliminate {0}, it is the initial or final state")]
    TerminalState(StateId),
    /// More than the initial and final state remain
    #[error("Automaton is not fully reduced, {0} states remain")]
    NotReduced(usize),
    /// A transition label did not parse
    #[error("Invalid transition label {0:?}")]
    Label(String, #[source] ParseError),
}

/// A transition written by [`reduce_state`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
    /// Source state
    pub from: StateId,
    /// Target state
    pub to: StateId,
    /// New label, already simplified
    pub label: String,
}

impl fmt::Display for Rewrite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self { from, to, label } = self;
        write!(f, "{from} -> {to}: {label}")
    }
}

#[inline]
fn is_sym(expr: &Expr, sym: Symbol) -> bool { matches!(expr, Expr::Operand(s) if *s == sym) }

fn kleene(inner: Expr) -> Expr {
    match inner {
        Expr::Operand(Symbol::EmptySet | Symbol::EmptyString) => Expr::EMPTY_STRING,
        e @ Expr::Star(_) => e,
        e => Expr::star(e),
    }
}

fn cat(l: Expr, r: Expr) -> Expr {
    if is_sym(&l, Symbol::EmptySet) || is_sym(&r, Symbol::EmptySet) {
        Expr::EMPTY_SET
    } else if is_sym(&l, Symbol::EmptyString) {
        r
    } else if is_sym(&r, Symbol::EmptyString) {
        l
    } else {
        Expr::concat(l, r)
    }
}

/// True for `x*`, `x|x*` and `x*|x`, all of which already accept `ε`
fn absorbs_empty_string(expr: &Expr) -> bool {
    match expr {
        Expr::Star(_) => true,
        Expr::Concat(l, r) => {
            matches!(&**r, Expr::Star(s) if **s == **l) || matches!(&**l, Expr::Star(s) if **s == **r)
        },
        _ => false,
    }
}

/// Rewrite an expression accepted by [`absorbs_empty_string`] as `x*`
fn into_closure(expr: Expr) -> Expr {
    match expr {
        Expr::Concat(l, r) => {
            if matches!(&*r, Expr::Star(s) if **s == *l) {
                *r
            } else {
                *l
            }
        },
        e => e,
    }
}

fn alt(l: Expr, r: Expr) -> Expr {
    if is_sym(&l, Symbol::EmptySet) {
        r
    } else if is_sym(&r, Symbol::EmptySet) || l == r {
        l
    } else if is_sym(&l, Symbol::EmptyString) && absorbs_empty_string(&r) {
        into_closure(r)
    } else if is_sym(&r, Symbol::EmptyString) && absorbs_empty_string(&l) {
        into_closure(l)
    } else {
        Expr::union(l, r)
    }
}

/// Rebuild `expr` bottom-up through the label identities
fn normalize(expr: Expr) -> Expr {
    match expr {
        e @ Expr::Operand(_) => e,
        Expr::Star(e) => kleene(normalize(*e)),
        Expr::Concat(l, r) => cat(normalize(*l), normalize(*r)),
        Expr::Union(l, r) => alt(normalize(*l), normalize(*r)),
    }
}

fn label(
    autom: &Automaton,
    from: StateId,
    to: StateId,
    syms: &Symbols,
) -> Result<Option<Expr>, ReduceError> {
    autom
        .label(from, to)
        .map(|l| {
            syntax::parse(l, syms)
                .map(normalize)
                .map_err(|e| ReduceError::Label(l.to_owned(), e))
        })
        .transpose()
}

#[inline]
fn label_or_empty(
    autom: &Automaton,
    from: StateId,
    to: StateId,
    syms: &Symbols,
) -> Result<Expr, ReduceError> {
    label(autom, from, to, syms).map(|l| l.unwrap_or(Expr::EMPTY_SET))
}

fn render(expr: &Expr, syms: &Symbols) -> Result<String, ReduceError> {
    let text = expr.display(syms).to_string();
    syntax::simplify(&text, syms).map_err(|e| ReduceError::Label(text, e))
}

fn terminals(autom: &Automaton) -> Result<(StateId, StateId), ReduceError> {
    match (autom.initial(), autom.final_state()) {
        (Some(i), Some(f)) if i != f => Ok((i, f)),
        _ => Err(ReduceError::InvalidAutomaton),
    }
}

/// Eliminate `state` from `autom`, rerouting every path through it.
///
/// For each predecessor `P` and successor `Q` of `state` (other than
/// `state` itself) the transition `P → Q` is replaced by
/// `P→Q + P→R | (R→R)* | R→Q`.  The written transitions are returned in
/// order.  On error the automaton is left unchanged.
///
/// # Errors
/// Fails if the automaton is not valid, if `state` does not exist or is the
/// initial or final state, or if one of the involved labels does not parse
/// with `syms`.
pub fn reduce_state(
    autom: &mut Automaton,
    state: StateId,
    syms: &Symbols,
) -> Result<Vec<Rewrite>, ReduceError> {
    terminals(autom)?;
    if !autom.is_valid() {
        return Err(ReduceError::InvalidAutomaton);
    }

    if !autom.contains(state) {
        return Err(ReduceError::UnknownState(state));
    }

    if autom.is_initial(state) || autom.is_final(state) {
        return Err(ReduceError::TerminalState(state));
    }

    let preds: Vec<_> = autom.predecessors(state).filter(|&p| p != state).collect();
    let succs: Vec<_> = autom
        .successors(state)
        .map(|(q, _)| q)
        .filter(|&q| q != state)
        .collect();
    let cycle = kleene(label_or_empty(autom, state, state, syms)?);

    let mut rewrites = Vec::with_capacity(preds.len() * succs.len());
    for &p in &preds {
        let into = label_or_empty(autom, p, state, syms)?;

        for &q in &succs {
            let direct = label_or_empty(autom, p, q, syms)?;
            let out = label_or_empty(autom, state, q, syms)?;
            let via = cat(cat(into.clone(), cycle.clone()), out);
            let label = render(&alt(direct, via), syms)?;

            tracing::trace!(%p, %q, %label, "Rerouting around {state}");
            rewrites.push(Rewrite { from: p, to: q, label });
        }
    }

    for Rewrite { from, to, label } in &rewrites {
        autom.connect(*from, *to, label.as_str());
    }

    assert!(autom.remove_state(state));
    tracing::debug!(
        %state,
        rewrites = rewrites.len(),
        remaining = autom.len(),
        "Eliminated state"
    );

    Ok(rewrites)
}

/// True once only the initial and final states are left
#[inline]
#[must_use]
pub fn is_fully_reduced(autom: &Automaton) -> bool { autom.len() == 2 }

/// Read the regex off a fully reduced automaton.
///
/// This is the label from the initial to the final state, or `∅` if there is
/// none.  Loops on either state and a transition back to the initial state
/// are folded in as `(I→I)* | I→F | (F→F + F→I | (I→I)* | I→F)*`.
///
/// # Errors
/// Fails if the automaton has more than two states, lacks distinct initial
/// and final states, or has a label that does not parse.
pub fn final_regex(autom: &Automaton, syms: &Symbols) -> Result<String, ReduceError> {
    let (i, f) = terminals(autom)?;

    if !is_fully_reduced(autom) {
        return Err(ReduceError::NotReduced(autom.len()));
    }

    let head = kleene(label_or_empty(autom, i, i, syms)?);
    let body = label_or_empty(autom, i, f, syms)?;
    let back = cat(
        cat(label_or_empty(autom, f, i, syms)?, head.clone()),
        body.clone(),
    );
    let tail = kleene(alt(label_or_empty(autom, f, f, syms)?, back));

    render(&cat(cat(head, body), tail), syms)
}

fn next_state(autom: &Automaton) -> Option<StateId> {
    autom
        .states()
        .find(|&s| !autom.is_initial(s) && !autom.is_final(s))
}

/// Eliminate every non-terminal state, lowest identity first, and return
/// the resulting regex
///
/// # Errors
/// Fails under the same conditions as [`reduce_state`] and [`final_regex`].
pub fn eliminate(mut autom: Automaton, syms: &Symbols) -> Result<String, ReduceError> {
    while let Some(state) = next_state(&autom) {
        reduce_state(&mut autom, state, syms)?;
    }

    final_regex(&autom, syms)
}

#[cfg(test)]
mod test {
    use proptest::prelude::*;

    use super::{ReduceError, Rewrite, eliminate, final_regex, is_fully_reduced, reduce_state};
    use crate::{
        autom::{Automaton, StateId},
        build::build,
        expr::{Expr, Symbol},
        op::Symbols,
        syntax::{ParseError, parse},
    };

    fn a() -> Expr { Expr::char('a') }

    fn b() -> Expr { Expr::char('b') }

    fn elim(e: &Expr) -> String { eliminate(build(e), &Symbols::default()).unwrap() }

    /// Initial, middle and final state with the given transitions
    fn three(edges: &[(usize, usize, &str)]) -> (Automaton, [StateId; 3]) {
        let mut autom = Automaton::new();
        let ids = [autom.add_state(), autom.add_state(), autom.add_state()];
        for &(f, t, l) in edges {
            autom.connect(ids[f], ids[t], l);
        }
        autom.set_initial(Some(ids[0]));
        autom.set_final(Some(ids[2]));
        (autom, ids)
    }

    #[test]
    fn trivial() {
        let mut autom = Automaton::new();
        let i = autom.add_state();
        let f = autom.add_state();
        autom.set_initial(Some(i));
        autom.set_final(Some(f));
        assert!(is_fully_reduced(&autom));
        assert_eq!(final_regex(&autom, &Symbols::default()).unwrap(), "∅");

        autom.connect(i, f, "a");
        assert_eq!(eliminate(autom, &Symbols::default()).unwrap(), "a");
    }

    #[test]
    fn round_trips() {
        assert_eq!(elim(&a()), "a");
        assert_eq!(elim(&Expr::EMPTY_STRING), "ε");
        assert_eq!(elim(&Expr::star(a())), "a*");
        assert_eq!(elim(&Expr::concat(a(), b())), "a|b");
        assert_eq!(elim(&Expr::union(a(), b())), "a+b");
        assert_eq!(elim(&Expr::star(Expr::union(a(), b()))), "(a+b)*");
        assert_eq!(elim(&Expr::union(a(), Expr::EMPTY_SET)), "a");
        assert_eq!(elim(&Expr::concat(a(), Expr::EMPTY_SET)), "∅");
    }

    #[test]
    fn single_step() {
        let syms = Symbols::default();
        let mut autom = build(&Expr::concat(a(), b()));
        let ids: Vec<_> = autom.states().collect();
        assert!(!is_fully_reduced(&autom));
        assert_eq!(final_regex(&autom, &syms), Err(ReduceError::NotReduced(3)));

        let rewrites = reduce_state(&mut autom, ids[1], &syms).unwrap();
        assert_eq!(rewrites, [Rewrite {
            from: ids[0],
            to: ids[2],
            label: "a|b".into(),
        }]);
        assert_eq!(rewrites[0].to_string(), "q0 -> q3: a|b");
        assert!(is_fully_reduced(&autom));
        assert_eq!(final_regex(&autom, &syms).unwrap(), "a|b");
    }

    #[test]
    fn self_loop() {
        let (autom, _) = three(&[(0, 1, "a"), (1, 1, "b"), (1, 2, "c")]);
        assert_eq!(eliminate(autom, &Symbols::default()).unwrap(), "a|b*|c");
    }

    #[test]
    fn parallel_paths() {
        let (autom, _) = three(&[(0, 2, "a"), (0, 1, "b"), (1, 2, "c")]);
        assert_eq!(eliminate(autom, &Symbols::default()).unwrap(), "a+b|c");

        let (autom, _) = three(&[(0, 2, "a"), (0, 1, "a"), (1, 2, "ε")]);
        assert_eq!(eliminate(autom, &Symbols::default()).unwrap(), "a");
    }

    #[test]
    fn labels_are_expressions() {
        let (mut autom, ids) = three(&[(0, 1, "(a+b)"), (1, 2, "c*"), (1, 1, "ε+∅")]);
        let rewrites = reduce_state(&mut autom, ids[1], &Symbols::default()).unwrap();
        assert_eq!(rewrites[0].label, "(a+b)|c*");
    }

    #[test]
    fn terminal_loops() {
        let mut autom = Automaton::new();
        let i = autom.add_state();
        let f = autom.add_state();
        autom.connect(i, i, "a");
        autom.connect(i, f, "b");
        autom.set_initial(Some(i));
        autom.set_final(Some(f));

        assert_eq!(final_regex(&autom, &Symbols::default()).unwrap(), "a*|b");
    }

    #[test]
    fn errors() {
        let syms = Symbols::default();
        let mut autom = build(&Expr::concat(a(), b()));
        let ids: Vec<_> = autom.states().collect();

        assert_eq!(
            reduce_state(&mut autom, ids[0], &syms),
            Err(ReduceError::TerminalState(ids[0]))
        );
        assert_eq!(
            reduce_state(&mut autom, ids[2], &syms),
            Err(ReduceError::TerminalState(ids[2]))
        );

        let foreign: Vec<_> = build(&Expr::star(a())).states().collect();
        assert!(!autom.contains(foreign[2]));
        assert_eq!(
            reduce_state(&mut autom, foreign[2], &syms),
            Err(ReduceError::UnknownState(foreign[2]))
        );

        let (mut cut, ids) = three(&[(1, 2, "a")]);
        assert_eq!(
            reduce_state(&mut cut, ids[1], &syms),
            Err(ReduceError::InvalidAutomaton)
        );

        let (mut same, ids) = three(&[(0, 1, "a"), (1, 2, "b")]);
        same.set_final(Some(ids[0]));
        assert_eq!(
            reduce_state(&mut same, ids[1], &syms),
            Err(ReduceError::InvalidAutomaton)
        );
    }

    #[test]
    fn bad_label_leaves_automaton() {
        let (mut autom, ids) = three(&[(0, 1, "a"), (1, 2, "b c")]);
        assert_eq!(
            reduce_state(&mut autom, ids[1], &Symbols::default()),
            Err(ReduceError::Label(
                "b c".into(),
                ParseError::IllegalAlphabet(' ', 1)
            ))
        );
        assert_eq!(autom.len(), 3);
        assert_eq!(autom.label(ids[0], ids[1]), Some("a"));
    }

    fn nullable(e: &Expr) -> bool {
        match e {
            Expr::Operand(s) => *s == Symbol::EmptyString,
            Expr::Star(_) => true,
            Expr::Concat(l, r) => nullable(l) && nullable(r),
            Expr::Union(l, r) => nullable(l) || nullable(r),
        }
    }

    fn derive(e: &Expr, c: char) -> Expr {
        match e {
            Expr::Operand(Symbol::Char(x)) if *x == c => Expr::EMPTY_STRING,
            Expr::Operand(_) => Expr::EMPTY_SET,
            Expr::Star(inner) => Expr::concat(derive(inner, c), e.clone()),
            Expr::Concat(l, r) => {
                let head = Expr::concat(derive(l, c), (**r).clone());
                if nullable(l) {
                    Expr::union(head, derive(r, c))
                } else {
                    head
                }
            },
            Expr::Union(l, r) => Expr::union(derive(l, c), derive(r, c)),
        }
    }

    fn accepts(e: &Expr, s: &[char]) -> bool {
        match s {
            [] => nullable(e),
            [c, rest @ ..] => accepts(&derive(e, *c), rest),
        }
    }

    fn words() -> Vec<Vec<char>> {
        let mut all = vec![vec![]];
        let mut last = vec![vec![]];
        for _ in 0..3 {
            last = last
                .iter()
                .flat_map(|w: &Vec<char>| {
                    ['a', 'b', 'c'].into_iter().map(move |c| {
                        let mut w = w.clone();
                        w.push(c);
                        w
                    })
                })
                .collect();
            all.extend(last.iter().cloned());
        }
        all
    }

    proptest! {
        #[test]
        fn elimination_preserves_language(e in crate::prop::expr(4, 12)) {
            let syms = Symbols::default();
            let text = eliminate(build(&e), &syms).unwrap();
            let back = parse(&text, &syms).unwrap();

            for w in words() {
                prop_assert_eq!(accepts(&e, &w), accepts(&back, &w), "{} vs {:?}", text, w);
            }
        }
    }
}
