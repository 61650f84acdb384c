//! Syntax tree model shared by the matcher, the dispatcher and the rules
//!
//! The host owns parsing. It hands over an arena of nodes in ESTree shape:
//! every node has a kind, a byte span into the source text, a parent
//! back-reference and named slots holding child nodes, child lists or scalar
//! attributes. Rules only ever see [`Node`] handles borrowed from the tree and
//! keep [`NodeId`]s in their per-file state.

pub mod estree;
mod kind;
mod lines;
pub mod synth;

pub use kind::NodeKind;
pub use lines::LineIndex;

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use thiserror::Error;

/// Error while building a tree
#[derive(Debug, Error, PartialEq)]
pub enum TreeError {
    #[error("Unknown node kind '{0}'")]
    UnknownKind(String),

    #[error("Node is missing its source range: {0}")]
    MissingRange(String),

    #[error("Span {start}..{end} is outside the source text ({len} bytes)")]
    SpanOutOfBounds { start: usize, end: usize, len: usize },

    #[error("Node {0} is referenced from more than one parent")]
    SharedNode(u32),

    #[error("Node {0} is not reachable from the root")]
    Detached(u32),

    #[error("Invalid tree: {0}")]
    Invalid(String),
}

/// Stable identity of a node within one tree
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct NodeId(u32);

impl NodeId {
    pub fn new(index: usize) -> Self {
        Self(index as u32)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Half-open byte range into the source text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Zero-width span at an offset
    pub fn empty(at: usize) -> Self {
        Self { start: at, end: at }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    pub fn contains(&self, other: Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

/// Scalar attribute value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
}

impl Value {
    /// String form used for literal comparisons (`${value}` in JavaScript)
    pub fn to_js_string(&self) -> Cow<'_, str> {
        match self {
            Value::Null => Cow::Borrowed("null"),
            Value::Bool(true) => Cow::Borrowed("true"),
            Value::Bool(false) => Cow::Borrowed("false"),
            Value::Number(n) => Cow::Owned(format_number(*n)),
            Value::String(s) => Cow::Borrowed(s),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Value::String(s) => s.trim().parse().ok(),
            Value::Null => Some(0.0),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

pub(crate) fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// Content of a named slot
#[derive(Debug, Clone, PartialEq)]
pub enum Slot {
    Node(NodeId),
    /// `None` marks a hole such as the first element of `[, a]`
    List(Vec<Option<NodeId>>),
    Value(Value),
}

/// Where a node sits inside its parent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SlotRef {
    field: usize,
    index: Option<usize>,
}

#[derive(Debug, Clone)]
struct NodeData {
    kind: NodeKind,
    span: Span,
    parent: Option<NodeId>,
    slot: Option<SlotRef>,
    fields: Vec<(String, Slot)>,
    children: Vec<NodeId>,
}

/// An immutable syntax tree together with its source text
#[derive(Debug, Clone)]
pub struct SyntaxTree {
    nodes: Vec<NodeData>,
    root: NodeId,
    source: String,
    lines: LineIndex,
}

impl SyntaxTree {
    pub fn root(&self) -> Node<'_> {
        self.node(self.root)
    }

    /// Handle for an id of this tree
    ///
    /// Ids come from this tree only; a foreign id is a caller bug.
    pub fn node(&self, id: NodeId) -> Node<'_> {
        debug_assert!(id.index() < self.nodes.len());
        Node { tree: self, id }
    }

    pub fn get(&self, id: NodeId) -> Option<Node<'_>> {
        (id.index() < self.nodes.len()).then(|| Node { tree: self, id })
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn lines(&self) -> &LineIndex {
        &self.lines
    }

    /// Verbatim source text of a span (empty when out of bounds)
    pub fn slice(&self, span: Span) -> &str {
        self.source.get(span.start..span.end).unwrap_or("")
    }

    /// All nodes in arena order
    pub fn nodes(&self) -> impl Iterator<Item = Node<'_>> {
        (0..self.nodes.len()).map(move |i| Node {
            tree: self,
            id: NodeId::new(i),
        })
    }

    fn data(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.index()]
    }
}

/// Borrowed handle to one node
#[derive(Clone, Copy)]
pub struct Node<'t> {
    tree: &'t SyntaxTree,
    id: NodeId,
}

impl PartialEq for Node<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && std::ptr::eq(self.tree, other.tree)
    }
}

impl Eq for Node<'_> {}

impl fmt::Debug for Node<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}@{}..{}",
            self.kind(),
            self.id,
            self.span().start,
            self.span().end
        )
    }
}

impl<'t> Node<'t> {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn tree(&self) -> &'t SyntaxTree {
        self.tree
    }

    pub fn kind(&self) -> NodeKind {
        self.data().kind
    }

    pub fn is(&self, kind: NodeKind) -> bool {
        self.kind() == kind
    }

    pub fn is_function(&self) -> bool {
        self.kind().is_function()
    }

    pub fn span(&self) -> Span {
        self.data().span
    }

    /// Verbatim source text of this node
    pub fn text(&self) -> &'t str {
        self.tree.slice(self.span())
    }

    pub fn parent(&self) -> Option<Node<'t>> {
        self.data().parent.map(|id| self.tree.node(id))
    }

    /// Parent chain, nearest first
    pub fn ancestors(&self) -> Ancestors<'t> {
        Ancestors {
            next: self.parent(),
        }
    }

    /// Name of the parent slot holding this node
    pub fn field_name(&self) -> Option<&'t str> {
        let slot = self.data().slot?;
        let parent = self.data().parent?;
        self.tree
            .data(parent)
            .fields
            .get(slot.field)
            .map(|(name, _)| name.as_str())
    }

    /// Position in the parent's list slot
    pub fn list_index(&self) -> Option<usize> {
        self.data().slot.and_then(|s| s.index)
    }

    /// Siblings that precede this node in the same list slot, nearest last
    pub fn preceding_siblings(&self) -> NodeList<'t> {
        let empty = NodeList::empty(self.tree);
        let (Some(slot), Some(parent)) = (self.data().slot, self.data().parent) else {
            return empty;
        };
        let Some(index) = slot.index else {
            return empty;
        };
        match self.tree.data(parent).fields.get(slot.field) {
            Some((_, Slot::List(items))) => NodeList {
                tree: self.tree,
                items: Items::Sparse(&items[..index.min(items.len())]),
            },
            _ => empty,
        }
    }

    /// Structural children in source order
    pub fn children(&self) -> NodeList<'t> {
        NodeList {
            tree: self.tree,
            items: Items::Dense(&self.data().children),
        }
    }

    /// Raw slot by name
    pub fn slot(&self, field: &str) -> Option<&'t Slot> {
        self.data()
            .fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, slot)| slot)
    }

    /// Named slot holding a single node
    pub fn child(&self, field: &str) -> Option<Node<'t>> {
        match self.slot(field)? {
            Slot::Node(id) => Some(self.tree.node(*id)),
            _ => None,
        }
    }

    /// Named slot holding a list of nodes (empty when absent)
    pub fn list(&self, field: &str) -> NodeList<'t> {
        match self.slot(field) {
            Some(Slot::List(items)) => NodeList {
                tree: self.tree,
                items: Items::Sparse(items),
            },
            _ => NodeList::empty(self.tree),
        }
    }

    /// Named scalar attribute
    pub fn value(&self, field: &str) -> Option<&'t Value> {
        match self.slot(field)? {
            Slot::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn str(&self, field: &str) -> Option<&'t str> {
        self.value(field).and_then(Value::as_str)
    }

    /// Boolean attribute, false when absent
    pub fn flag(&self, field: &str) -> bool {
        matches!(self.value(field), Some(Value::Bool(true)))
    }

    /// Identifier name
    pub fn name(&self) -> Option<&'t str> {
        match self.kind() {
            NodeKind::Identifier | NodeKind::PrivateIdentifier => self.str("name"),
            _ => None,
        }
    }

    /// True for an identifier with exactly this name
    pub fn is_identifier(&self, name: &str) -> bool {
        self.is(NodeKind::Identifier) && self.name() == Some(name)
    }

    /// Resolve a dotted attribute path (`callee.property.name`, `arguments.0`,
    /// `params.length`, `type`)
    pub fn path<S: AsRef<str>>(&self, path: &[S]) -> Option<Attr<'t>> {
        let mut current = Attr::Node(*self);
        for segment in path {
            current = current.step(segment.as_ref())?;
        }
        Some(current)
    }

    fn data(&self) -> &'t NodeData {
        self.tree.data(self.id)
    }
}

/// Iterator over a node's ancestors
pub struct Ancestors<'t> {
    next: Option<Node<'t>>,
}

impl<'t> Iterator for Ancestors<'t> {
    type Item = Node<'t>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = current.parent();
        Some(current)
    }
}

#[derive(Clone, Copy)]
enum Items<'t> {
    Dense(&'t [NodeId]),
    Sparse(&'t [Option<NodeId>]),
}

/// A borrowed list of nodes
///
/// Positions count holes, so `len` and `get` agree with the JavaScript array;
/// iteration yields only the nodes.
#[derive(Clone, Copy)]
pub struct NodeList<'t> {
    tree: &'t SyntaxTree,
    items: Items<'t>,
}

impl<'t> NodeList<'t> {
    fn empty(tree: &'t SyntaxTree) -> Self {
        NodeList {
            tree,
            items: Items::Dense(&[]),
        }
    }

    pub fn len(&self) -> usize {
        match self.items {
            Items::Dense(ids) => ids.len(),
            Items::Sparse(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Node at a position; `None` past the end or at a hole
    pub fn get(&self, index: usize) -> Option<Node<'t>> {
        let id = match self.items {
            Items::Dense(ids) => ids.get(index).copied(),
            Items::Sparse(items) => items.get(index).copied().flatten(),
        };
        id.map(|id| self.tree.node(id))
    }

    /// First node, skipping holes
    pub fn first(&self) -> Option<Node<'t>> {
        self.iter().next()
    }

    /// Last node, skipping holes
    pub fn last(&self) -> Option<Node<'t>> {
        self.iter().next_back()
    }

    pub fn ids(&self) -> impl DoubleEndedIterator<Item = NodeId> + 't {
        let (dense, sparse): (&'t [NodeId], &'t [Option<NodeId>]) = match self.items {
            Items::Dense(ids) => (ids, &[]),
            Items::Sparse(items) => (&[], items),
        };
        dense.iter().copied().chain(sparse.iter().flatten().copied())
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = Node<'t>> + 't {
        let tree = self.tree;
        self.ids().map(move |id| tree.node(id))
    }
}

impl fmt::Debug for NodeList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

/// Value reached by an attribute path
#[derive(Debug, Clone, Copy)]
pub enum Attr<'t> {
    Node(Node<'t>),
    List(NodeList<'t>),
    Value(&'t Value),
    Kind(NodeKind),
    Length(usize),
}

impl<'t> Attr<'t> {
    fn step(self, segment: &str) -> Option<Attr<'t>> {
        match self {
            Attr::Node(node) => {
                if segment == "type" {
                    return Some(Attr::Kind(node.kind()));
                }
                match node.slot(segment)? {
                    Slot::Node(id) => Some(Attr::Node(node.tree.node(*id))),
                    Slot::List(items) => Some(Attr::List(NodeList {
                        tree: node.tree,
                        items: Items::Sparse(items),
                    })),
                    Slot::Value(v) => Some(Attr::Value(v)),
                }
            }
            Attr::List(list) => {
                if segment == "length" {
                    return Some(Attr::Length(list.len()));
                }
                let index: usize = segment.parse().ok()?;
                list.get(index).map(Attr::Node)
            }
            Attr::Value(Value::String(s)) if segment == "length" => {
                Some(Attr::Length(s.chars().count()))
            }
            _ => None,
        }
    }

    /// `p != null` in JavaScript terms
    pub fn is_present(&self) -> bool {
        !matches!(self, Attr::Value(Value::Null))
    }

    /// String form for literal comparison; objects have none
    pub fn as_text(&self) -> Option<Cow<'t, str>> {
        match self {
            Attr::Value(v) => Some(v.to_js_string()),
            Attr::Kind(k) => Some(Cow::Borrowed(k.as_str())),
            Attr::Length(n) => Some(Cow::Owned(n.to_string())),
            Attr::Node(_) | Attr::List(_) => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Attr::Value(v) => v.as_number(),
            Attr::Length(n) => Some(*n as f64),
            _ => None,
        }
    }
}

/// Incremental, bottom-up tree construction
///
/// Children are added before their parents; [`TreeBuilder::finish`] links
/// parents, orders children by source position and validates spans.
#[derive(Debug, Default)]
pub struct TreeBuilder {
    nodes: Vec<NodeData>,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node whose child slots reference already-added nodes
    pub fn add(&mut self, kind: NodeKind, span: Span, fields: Vec<(String, Slot)>) -> NodeId {
        let id = NodeId::new(self.nodes.len());
        self.nodes.push(NodeData {
            kind,
            span,
            parent: None,
            slot: None,
            fields,
            children: Vec::new(),
        });
        id
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Link parents and produce the immutable tree
    pub fn finish(mut self, root: NodeId, source: impl Into<String>) -> Result<SyntaxTree, TreeError> {
        let source = source.into();
        if root.index() >= self.nodes.len() {
            return Err(TreeError::Invalid(format!("root {} does not exist", root)));
        }

        for node in &self.nodes {
            if node.span.start > node.span.end || node.span.end > source.len() {
                return Err(TreeError::SpanOutOfBounds {
                    start: node.span.start,
                    end: node.span.end,
                    len: source.len(),
                });
            }
        }

        let mut links: Vec<(NodeId, NodeId, SlotRef)> = Vec::new();
        for (index, node) in self.nodes.iter().enumerate() {
            for (field, (_, slot)) in node.fields.iter().enumerate() {
                match slot {
                    Slot::Node(child) => {
                        links.push((NodeId::new(index), *child, SlotRef { field, index: None }))
                    }
                    Slot::List(items) => {
                        for (i, child) in items.iter().enumerate() {
                            let Some(child) = child else {
                                continue;
                            };
                            links.push((
                                NodeId::new(index),
                                *child,
                                SlotRef {
                                    field,
                                    index: Some(i),
                                },
                            ));
                        }
                    }
                    Slot::Value(_) => {}
                }
            }
        }

        for (parent, child, slot) in links {
            if child.index() >= self.nodes.len() {
                return Err(TreeError::Invalid(format!(
                    "{} references missing node {}",
                    parent, child
                )));
            }
            if child == root || self.nodes[child.index()].parent.is_some() {
                return Err(TreeError::SharedNode(child.0));
            }
            let data = &mut self.nodes[child.index()];
            data.parent = Some(parent);
            data.slot = Some(slot);
            self.nodes[parent.index()].children.push(child);
        }

        // Every node must be reachable from the root
        let mut reached = vec![false; self.nodes.len()];
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if !std::mem::replace(&mut reached[id.index()], true) {
                stack.extend(self.nodes[id.index()].children.iter().copied());
            }
        }
        if let Some(index) = reached.iter().position(|r| !r) {
            return Err(TreeError::Detached(index as u32));
        }

        let starts: Vec<usize> = self.nodes.iter().map(|n| n.span.start).collect();
        for node in &mut self.nodes {
            // Stable sort keeps slot order for children sharing a start offset
            node.children.sort_by_key(|id| starts[id.index()]);
        }

        let lines = LineIndex::new(&source);
        Ok(SyntaxTree {
            nodes: self.nodes,
            root,
            source,
            lines,
        })
    }
}
