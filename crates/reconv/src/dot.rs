//! Minimal Graphviz DOT writer for automata and parse trees, always
//! producing a directed graph

use std::{
    borrow::Cow,
    collections::BTreeMap,
    fmt::{self, Display},
};

use indexmap::IndexMap;

macro_rules! attr {
    ($id:ident, $name:literal) => {
        #[doc = concat!("Set the `", $name, "` attribute")]
        pub fn $id<S: Into<Cow<'a, str>>>(&mut self, $id: S) -> &mut Self {
            self.attrs.insert($name, $id.into());
            self
        }
    };
}

/// A directed graph ready to be written out with [`Display`]
#[derive(Debug, Default)]
pub struct Graph<'a> {
    attrs: BTreeMap<&'static str, Cow<'a, str>>,
    nodes: IndexMap<Cow<'a, str>, Node<'a>>,
    edges: IndexMap<(Cow<'a, str>, Cow<'a, str>), Vec<Edge<'a>>>,
}

impl<'a> Graph<'a> {
    attr!(rank_dir, "rankdir");

    /// An empty graph
    #[inline]
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Get or create the node named `id`
    #[inline]
    pub fn node<S: Into<Cow<'a, str>>>(&mut self, id: S) -> &mut Node<'a> {
        self.nodes.entry(id.into()).or_default()
    }

    /// Add a new edge between two nodes, creating them if necessary
    pub fn edge<L: Into<Cow<'a, str>>, R: Into<Cow<'a, str>>>(
        &mut self,
        l: L,
        r: R,
    ) -> &mut Edge<'a> {
        let l = l.into();
        let r = r.into();
        self.node(l.clone());
        self.node(r.clone());
        let edges = self.edges.entry((l, r)).or_default();
        edges.push(Edge::default());
        edges.last_mut().unwrap_or_else(|| unreachable!())
    }
}

#[derive(Default)]
struct AttrState {
    any: bool,
}

impl AttrState {
    fn write_one(
        &mut self,
        f: &mut fmt::Formatter,
        key: &'static str,
        val: impl FnOnce(&mut fmt::Formatter) -> fmt::Result,
    ) -> fmt::Result {
        f.write_str(if self.any {
            ","
        } else {
            self.any = true;
            "["
        })?;

        f.write_str(key)?;
        f.write_str("=")?;
        val(f)
    }

    fn finish(self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.any { f.write_str("]") } else { Ok(()) }
    }
}

fn write_attrs(f: &mut fmt::Formatter, attrs: &BTreeMap<&'static str, Cow<str>>) -> fmt::Result {
    let mut attr_state = AttrState::default();

    for (key, val) in attrs {
        attr_state.write_one(f, key, |f| write!(f, "{val:?}"))?;
    }

    attr_state.finish(f)
}

impl Display for Graph<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let Self {
            attrs,
            nodes,
            edges,
        } = self;

        f.write_str("digraph {")?;

        for (key, val) in attrs {
            write!(f, "{key}={val:?};")?;
        }

        for (id, Node { attrs }) in nodes {
            write!(f, "{id:?}")?;
            write_attrs(f, attrs)?;
            f.write_str(";")?;
        }

        for ((l, r), edges) in edges {
            for Edge { attrs } in edges {
                write!(f, "{l:?}->{r:?}")?;
                write_attrs(f, attrs)?;
                f.write_str(";")?;
            }
        }

        f.write_str("}")
    }
}

/// Attributes of one node
#[derive(Debug, Default)]
pub struct Node<'a> {
    attrs: BTreeMap<&'static str, Cow<'a, str>>,
}

impl<'a> Node<'a> {
    attr!(style, "style");

    attr!(shape, "shape");

    attr!(label, "label");

    attr!(border_count, "peripheries");
}

/// Attributes of one edge
#[derive(Debug, Default)]
pub struct Edge<'a> {
    attrs: BTreeMap<&'static str, Cow<'a, str>>,
}

impl<'a> Edge<'a> {
    attr!(label, "label");
}

#[cfg(test)]
mod test {
    use super::Graph;

    #[test]
    fn writes_graph() {
        let mut g = Graph::new();
        g.rank_dir("LR");
        g.node("a").label("start").border_count("2");
        g.edge("a", "b").label("x");
        g.edge("a", "b");

        assert_eq!(
            g.to_string(),
            r#"digraph {rankdir="LR";"a"[label="start",peripheries="2"];"b";"a"->"b"[label="x"];"a"->"b";}"#
        );
    }
}
