//! Declarative tree-pattern walk.
//!
//! A [`Pattern`] maps node kinds to either a leaf extractor or a nested
//! pattern. Walking a node list keeps only nodes whose kind the current
//! level names. Leaves turn a node into field sets; nested patterns
//! descend into the node's named children. Fields declared on a level
//! (usually the tag kind) flow down into every level below it unless a
//! narrower level or the extracted fields set them.

pub mod javascript;

use std::fmt::Debug;

use tracing::debug;

use crate::tag::{Tag, TagFields};

/// A syntax node as seen by the pattern walk.
pub trait SyntaxNode: Sized {
    type Kind: Copy + Eq + Debug;

    /// `None` for kinds no pattern can name.
    fn kind(&self) -> Option<Self::Kind>;

    /// Named children in document order.
    fn children(&self) -> Vec<Self>;
}

/// Turns one node into zero or more field sets.
pub type Extractor<N> = fn(&N) -> Vec<TagFields>;

pub enum Entry<N: SyntaxNode> {
    Leaf(Extractor<N>),
    Nest(Pattern<N>),
}

pub struct Pattern<N: SyntaxNode> {
    fields: TagFields,
    entries: Vec<(N::Kind, Entry<N>)>,
}

impl<N: SyntaxNode> Default for Pattern<N> {
    fn default() -> Self {
        Self {
            fields: TagFields::default(),
            entries: Vec::new(),
        }
    }
}

impl<N: SyntaxNode> Pattern<N> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tag kind for everything extracted at this level and below.
    pub fn tag(mut self, tag: &str) -> Self {
        self.fields.tag = Some(tag.to_string());
        self
    }

    pub fn leaf(mut self, kind: N::Kind, extract: Extractor<N>) -> Self {
        self.entries.push((kind, Entry::Leaf(extract)));
        self
    }

    pub fn nest(mut self, kind: N::Kind, pattern: Pattern<N>) -> Self {
        self.entries.push((kind, Entry::Nest(pattern)));
        self
    }

    fn entry(&self, kind: N::Kind) -> Option<&Entry<N>> {
        self.entries.iter().find(|(k, _)| *k == kind).map(|(_, e)| e)
    }
}

/// Walk `nodes` against `pattern`, returning one tag per extracted field
/// set in document order. Field sets that end up without a tag kind are
/// dropped.
pub fn document<N: SyntaxNode>(nodes: &[N], pattern: &Pattern<N>) -> Vec<Tag> {
    let mut tags = Vec::new();
    walk(nodes, pattern, &TagFields::default(), &mut tags);
    tags
}

fn walk<N: SyntaxNode>(nodes: &[N], pattern: &Pattern<N>, inherited: &TagFields, out: &mut Vec<Tag>) {
    let scope = pattern.fields.clone().over(inherited);
    for node in nodes {
        let kind = node.kind();
        let Some(entry) = kind.and_then(|k| pattern.entry(k)) else {
            debug!(?kind, "pattern walk pruned node");
            continue;
        };
        match entry {
            Entry::Leaf(extract) => {
                out.extend(extract(node).into_iter().filter_map(|f| f.over(&scope).into_tag()));
            }
            Entry::Nest(sub) => walk(&node.children(), sub, &scope, out),
        }
    }
}
