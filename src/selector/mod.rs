//! Tree-pattern selectors
//!
//! Rules register listeners with esquery-style selector strings such as
//! `CallExpression[callee.property.name='pipe'] > ArrowFunctionExpression`.
//! Strings are parsed once, when a rule instance is built, into a closed
//! [`Selector`] AST that [`CompiledSelector::matches`] interprets against a
//! node. Matching only inspects the node's own attributes, its parent chain and
//! the preceding siblings in its parent slot (plus descendants for `:has`).

mod matcher;
mod parser;

use crate::tree::{Node, NodeKind};
use regex::Regex;
use std::fmt;
use thiserror::Error;

/// Error while parsing a selector string
#[derive(Debug, Error, PartialEq)]
pub enum SelectorError {
    #[error("Empty selector")]
    Empty,

    #[error("Unexpected end of selector '{0}'")]
    UnexpectedEnd(String),

    #[error("Unexpected '{found}' at offset {offset} in selector '{selector}'")]
    Unexpected {
        selector: String,
        found: char,
        offset: usize,
    },

    #[error("Unknown node kind '{0}'")]
    UnknownKind(String),

    #[error("Unknown pseudo-class ':{0}'")]
    UnknownPseudo(String),

    #[error("Invalid regex /{pattern}/: {message}")]
    Regex { pattern: String, message: String },
}

/// Parsed selector AST
#[derive(Debug, Clone)]
pub enum Selector {
    /// `*`
    Wildcard,
    /// The node a `:has` is evaluated from (implicit in `:has(> X)`)
    Scope,
    /// `CallExpression`
    Kind(NodeKind),
    /// `.callee`: the node occupies this slot of its parent
    Field(Vec<String>),
    /// `[path]`, `[path op value]`
    Attribute(AttrTest),
    /// Several simple selectors on the same node: `Identifier[name='x']`
    Compound(Vec<Selector>),
    /// `:not(a, b)`
    Not(Vec<Selector>),
    /// `:matches(a, b)` / `:is(a, b)`, and top-level selector lists
    Matches(Vec<Selector>),
    /// `:has(a, > b)`
    Has(Vec<Selector>),
    /// `:first-child`, `:nth-child(n)` (1-based)
    NthChild(usize),
    /// `:last-child`, `:nth-last-child(n)` (1-based)
    NthLastChild(usize),
    /// `a > b`
    Child(Box<Selector>, Box<Selector>),
    /// `a b`
    Descendant(Box<Selector>, Box<Selector>),
    /// `a ~ b`
    Sibling(Box<Selector>, Box<Selector>),
    /// `a + b`
    Adjacent(Box<Selector>, Box<Selector>),
}

/// Attribute predicate on a dotted path
#[derive(Debug, Clone)]
pub struct AttrTest {
    pub path: Vec<String>,
    pub op: Option<(AttrOp, AttrValue)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Debug, Clone)]
pub enum AttrValue {
    /// Quoted string or bare word, compared by string form
    Literal(String),
    Number(f64),
    Regex(Regex),
}

impl Selector {
    /// Parse a selector string, including an optional `:exit` suffix
    pub fn parse(source: &str) -> Result<CompiledSelector, SelectorError> {
        CompiledSelector::new(source)
    }

    /// Node kinds this selector can match, `None` when unconstrained
    pub fn subject_kinds(&self) -> Option<Vec<NodeKind>> {
        match self {
            Selector::Kind(kind) => Some(vec![*kind]),
            Selector::Compound(parts) => {
                let mut narrowest: Option<Vec<NodeKind>> = None;
                for kinds in parts.iter().filter_map(Selector::subject_kinds) {
                    narrowest = Some(match narrowest {
                        None => kinds,
                        Some(previous) => previous.into_iter().filter(|k| kinds.contains(k)).collect(),
                    });
                }
                narrowest
            }
            Selector::Matches(list) => union_kinds(list),
            Selector::Child(_, right)
            | Selector::Descendant(_, right)
            | Selector::Sibling(_, right)
            | Selector::Adjacent(_, right) => right.subject_kinds(),
            Selector::Wildcard
            | Selector::Scope
            | Selector::Field(_)
            | Selector::Attribute(_)
            | Selector::Not(_)
            | Selector::Has(_)
            | Selector::NthChild(_)
            | Selector::NthLastChild(_) => None,
        }
    }
}

fn union_kinds(list: &[Selector]) -> Option<Vec<NodeKind>> {
    let mut all = Vec::new();
    for selector in list {
        for kind in selector.subject_kinds()? {
            if !all.contains(&kind) {
                all.push(kind);
            }
        }
    }
    Some(all)
}

/// A parsed selector ready for matching
#[derive(Debug, Clone)]
pub struct CompiledSelector {
    source: String,
    selector: Selector,
    exit: bool,
    kinds: Option<Vec<NodeKind>>,
}

impl CompiledSelector {
    pub fn new(source: &str) -> Result<Self, SelectorError> {
        let trimmed = source.trim();
        let (body, exit) = match trimmed.strip_suffix(":exit") {
            Some(body) => (body.trim_end(), true),
            None => (trimmed, false),
        };
        let selector = parser::parse(body)?;
        let kinds = selector.subject_kinds();
        Ok(Self {
            source: source.to_string(),
            selector,
            exit,
            kinds,
        })
    }

    /// True if the node satisfies the selector
    pub fn matches(&self, node: Node<'_>) -> bool {
        matcher::matches(&self.selector, node, None)
    }

    /// Fires on the post-order revisit
    pub fn is_exit(&self) -> bool {
        self.exit
    }

    /// Kinds the selector's subject is restricted to, `None` for any kind
    pub fn subject_kinds(&self) -> Option<&[NodeKind]> {
        self.kinds.as_deref()
    }

    pub fn selector(&self) -> &Selector {
        &self.selector
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Wildcard => f.write_str("*"),
            Selector::Scope => f.write_str(":scope"),
            Selector::Kind(kind) => write!(f, "{}", kind),
            Selector::Field(path) => write!(f, ".{}", path.join(".")),
            Selector::Attribute(test) => write!(f, "{}", test),
            Selector::Compound(parts) => parts.iter().try_for_each(|p| write!(f, "{}", p)),
            Selector::Not(list) => write_pseudo(f, "not", list),
            Selector::Matches(list) => write_pseudo(f, "matches", list),
            Selector::Has(list) => write_pseudo(f, "has", list),
            Selector::NthChild(n) => write!(f, ":nth-child({})", n),
            Selector::NthLastChild(n) => write!(f, ":nth-last-child({})", n),
            Selector::Child(l, r) => write!(f, "{} > {}", l, r),
            Selector::Descendant(l, r) => write!(f, "{} {}", l, r),
            Selector::Sibling(l, r) => write!(f, "{} ~ {}", l, r),
            Selector::Adjacent(l, r) => write!(f, "{} + {}", l, r),
        }
    }
}

fn write_pseudo(f: &mut fmt::Formatter<'_>, name: &str, list: &[Selector]) -> fmt::Result {
    write!(f, ":{}(", name)?;
    for (i, selector) in list.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", selector)?;
    }
    f.write_str(")")
}

impl fmt::Display for AttrTest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}", self.path.join("."))?;
        if let Some((op, value)) = &self.op {
            let op = match op {
                AttrOp::Eq => "=",
                AttrOp::Ne => "!=",
                AttrOp::Lt => "<",
                AttrOp::Le => "<=",
                AttrOp::Gt => ">",
                AttrOp::Ge => ">=",
            };
            match value {
                AttrValue::Literal(s) => write!(f, "{}'{}'", op, s.replace('\'', "\\'"))?,
                AttrValue::Number(n) => write!(f, "{}{}", op, n)?,
                AttrValue::Regex(re) => write!(f, "{}/{}/", op, re.as_str().replace('/', "\\/"))?,
            }
        }
        f.write_str("]")
    }
}
