//! Labelled automata with a single initial and a single final state

use std::{
    borrow::Cow,
    collections::{BTreeMap, BTreeSet, VecDeque},
    fmt,
};

use hashbrown::HashSet;

use crate::{dot, free::Free};

/// Handle to a state of one particular [`Automaton`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct StateId(u32);

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "q{}", self.0) }
}

#[derive(Debug, Default, Clone)]
struct State {
    succ: BTreeMap<StateId, String>,
    pred: BTreeSet<StateId>,
}

/// A directed graph of states whose transitions carry regex-valued labels.
///
/// There is at most one transition per ordered pair of states; connecting
/// an already-connected pair replaces its label.
#[derive(Debug, Clone, Default)]
pub struct Automaton {
    states: BTreeMap<StateId, State>,
    initial: Option<StateId>,
    accept: Option<StateId>,
    free: Free<u32>,
}

impl Automaton {
    /// An empty automaton with no roles assigned
    #[inline]
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Create a fresh state with no transitions and no role
    pub fn add_state(&mut self) -> StateId {
        let id = StateId(self.free.fresh());
        assert!(self.states.insert(id, State::default()).is_none());
        id
    }

    /// Delete a state together with every transition touching it.  Returns
    /// false if the state did not exist.
    pub fn remove_state(&mut self, id: StateId) -> bool {
        let Some(state) = self.states.remove(&id) else {
            return false;
        };

        for succ in state.succ.keys() {
            if let Some(s) = self.states.get_mut(succ) {
                s.pred.remove(&id);
            }
        }

        for pred in &state.pred {
            if let Some(p) = self.states.get_mut(pred) {
                p.succ.remove(&id);
            }
        }

        if self.initial == Some(id) {
            self.initial = None;
        }

        if self.accept == Some(id) {
            self.accept = None;
        }

        true
    }

    /// True if `id` is a state of this automaton
    #[inline]
    #[must_use]
    pub fn contains(&self, id: StateId) -> bool { self.states.contains_key(&id) }

    /// Number of states
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize { self.states.len() }

    /// True if there are no states
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool { self.states.is_empty() }

    /// All states, oldest first
    #[inline]
    pub fn states(&self) -> impl Iterator<Item = StateId> + '_ { self.states.keys().copied() }

    /// The initial state, if assigned
    #[inline]
    #[must_use]
    pub fn initial(&self) -> Option<StateId> { self.initial }

    /// The final state, if assigned
    #[inline]
    #[must_use]
    pub fn final_state(&self) -> Option<StateId> { self.accept }

    /// True if `id` is the initial state
    #[inline]
    #[must_use]
    pub fn is_initial(&self, id: StateId) -> bool { self.initial == Some(id) }

    /// True if `id` is the final state
    #[inline]
    #[must_use]
    pub fn is_final(&self, id: StateId) -> bool { self.accept == Some(id) }

    /// Make `id` the initial state, or clear the role with `None`
    pub fn set_initial(&mut self, id: Option<StateId>) {
        assert!(id.is_none_or(|i| self.contains(i)), "No such state {id:?}");
        self.initial = id;
    }

    /// Make `id` the final state, or clear the role with `None`
    pub fn set_final(&mut self, id: Option<StateId>) {
        assert!(id.is_none_or(|i| self.contains(i)), "No such state {id:?}");
        self.accept = id;
    }

    /// Add a transition, returning the label it replaced if the pair was
    /// already connected
    pub fn connect(&mut self, from: StateId, to: StateId, label: impl Into<String>) -> Option<String> {
        assert!(self.contains(to), "No such state {to}");
        let old = self
            .states
            .get_mut(&from)
            .unwrap_or_else(|| panic!("No such state {from}"))
            .succ
            .insert(to, label.into());

        if let Some(t) = self.states.get_mut(&to) {
            t.pred.insert(from);
        }

        old
    }

    /// Remove the transition between two states, returning its label
    pub fn disconnect(&mut self, from: StateId, to: StateId) -> Option<String> {
        let label = self.states.get_mut(&from)?.succ.remove(&to)?;
        if let Some(t) = self.states.get_mut(&to) {
            t.pred.remove(&from);
        }
        Some(label)
    }

    /// Label of the transition from `from` to `to`, if there is one
    #[must_use]
    pub fn label(&self, from: StateId, to: StateId) -> Option<&str> {
        self.states.get(&from)?.succ.get(&to).map(String::as_str)
    }

    /// Outgoing transitions of `id` as `(target, label)`
    pub fn successors(&self, id: StateId) -> impl Iterator<Item = (StateId, &str)> + '_ {
        self.states
            .get(&id)
            .into_iter()
            .flat_map(|s| s.succ.iter().map(|(t, l)| (*t, l.as_str())))
    }

    /// Sources of the incoming transitions of `id`
    pub fn predecessors(&self, id: StateId) -> impl Iterator<Item = StateId> + '_ {
        self.states
            .get(&id)
            .into_iter()
            .flat_map(|s| s.pred.iter().copied())
    }

    /// Every transition as `(source, target, label)`
    pub fn transitions(&self) -> impl Iterator<Item = (StateId, StateId, &str)> + '_ {
        self.states
            .iter()
            .flat_map(|(f, s)| s.succ.iter().map(move |(t, l)| (*f, *t, l.as_str())))
    }

    /// Total number of transitions
    #[must_use]
    pub fn transition_count(&self) -> usize { self.states.values().map(|s| s.succ.len()).sum() }

    /// Fold `absorb` into `keep`: every transition of `absorb` is re-pointed
    /// to `keep` and `absorb` is deleted, handing its roles to `keep`.
    pub(crate) fn merge(&mut self, keep: StateId, absorb: StateId) {
        assert!(keep != absorb && self.contains(keep));

        let outgoing: Vec<_> = self
            .successors(absorb)
            .map(|(to, l)| (if to == absorb { keep } else { to }, l.to_owned()))
            .collect();
        let incoming: Vec<_> = self
            .predecessors(absorb)
            .filter(|&from| from != absorb)
            .filter_map(|from| Some((from, self.label(from, absorb)?.to_owned())))
            .collect();
        let roles = (self.is_initial(absorb), self.is_final(absorb));

        assert!(self.remove_state(absorb), "No such state {absorb}");

        for (to, label) in outgoing {
            self.connect(keep, to, label);
        }

        for (from, label) in incoming {
            self.connect(from, keep, label);
        }

        if roles.0 {
            self.initial = Some(keep);
        }

        if roles.1 {
            self.accept = Some(keep);
        }
    }

    /// True if both roles are assigned and every state is reachable from the
    /// initial state
    #[must_use]
    pub fn is_valid(&self) -> bool {
        let (Some(initial), Some(_)) = (self.initial, self.accept) else {
            return false;
        };

        let mut seen = HashSet::new();
        let mut queue = VecDeque::new();
        seen.insert(initial);
        queue.push_back(initial);

        while let Some(id) = queue.pop_front() {
            for (next, _) in self.successors(id) {
                if seen.insert(next) {
                    queue.push_back(next);
                }
            }
        }

        self.states.keys().all(|s| seen.contains(s))
    }

    /// Render as a Graphviz graph: the final state gets a double border and
    /// the initial state an arrow from nowhere
    #[must_use]
    pub fn dot(&self) -> dot::Graph<'_> {
        let mut graph = dot::Graph::new();
        graph.rank_dir("LR");

        for id in self.states() {
            let node = graph.node(id.to_string());
            node.label(id.to_string()).shape("circle");
            if self.is_final(id) {
                node.border_count("2");
            }
        }

        for (from, to, label) in self.transitions() {
            graph
                .edge(from.to_string(), to.to_string())
                .label(Cow::Borrowed(label));
        }

        if let Some(initial) = self.initial {
            graph.node("_start").style("invis").shape("point").label("");
            graph.edge("_start", initial.to_string());
        }

        graph
    }
}
