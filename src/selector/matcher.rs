//! Selector evaluation against a node

use super::{AttrOp, AttrTest, AttrValue, Selector};
use crate::tree::{Attr, Node, NodeId, Value};
use std::cmp::Ordering;

/// Evaluate `selector` at `node`
///
/// `scope` is the node a `:has` started from; combinators never walk above it.
pub(super) fn matches(selector: &Selector, node: Node<'_>, scope: Option<NodeId>) -> bool {
    match selector {
        Selector::Wildcard => true,
        Selector::Scope => scope == Some(node.id()),
        Selector::Kind(kind) => node.kind() == *kind,
        Selector::Field(path) => field_matches(path, node),
        Selector::Attribute(test) => test.matches(node),
        Selector::Compound(parts) => parts.iter().all(|s| matches(s, node, scope)),
        Selector::Not(list) => !list.iter().any(|s| matches(s, node, scope)),
        Selector::Matches(list) => list.iter().any(|s| matches(s, node, scope)),
        Selector::Has(list) => has_descendant(list, node),
        Selector::NthChild(n) => node.list_index().is_some_and(|i| i + 1 == *n),
        Selector::NthLastChild(n) => match (node.list_index(), node.field_name(), node.parent()) {
            (Some(i), Some(field), Some(parent)) => parent.list(field).len() == i + *n,
            _ => false,
        },
        Selector::Child(left, right) => {
            matches(right, node, scope)
                && parent_in_scope(node, scope).is_some_and(|p| matches(left, p, scope))
        }
        Selector::Descendant(left, right) => {
            if !matches(right, node, scope) {
                return false;
            }
            let mut current = parent_in_scope(node, scope);
            while let Some(ancestor) = current {
                if matches(left, ancestor, scope) {
                    return true;
                }
                current = parent_in_scope(ancestor, scope);
            }
            false
        }
        Selector::Sibling(left, right) => {
            matches(right, node, scope)
                && node
                    .preceding_siblings()
                    .iter()
                    .any(|s| matches(left, s, scope))
        }
        Selector::Adjacent(left, right) => {
            matches(right, node, scope)
                && node
                    .preceding_siblings()
                    .last()
                    .is_some_and(|s| matches(left, s, scope))
        }
    }
}

fn parent_in_scope<'t>(node: Node<'t>, scope: Option<NodeId>) -> Option<Node<'t>> {
    if scope == Some(node.id()) {
        return None;
    }
    node.parent()
}

/// `.a.b`: the node sits in slot `b` of a parent that sits in slot `a`
fn field_matches(path: &[String], node: Node<'_>) -> bool {
    let mut current = Some(node);
    for segment in path.iter().rev() {
        match current {
            Some(n) if n.field_name() == Some(segment.as_str()) => current = n.parent(),
            _ => return false,
        }
    }
    true
}

fn has_descendant(list: &[Selector], node: Node<'_>) -> bool {
    let scope = Some(node.id());
    let mut stack: Vec<Node<'_>> = node.children().iter().rev().collect();
    while let Some(current) = stack.pop() {
        if list.iter().any(|s| matches(s, current, scope)) {
            return true;
        }
        stack.extend(current.children().iter().rev());
    }
    false
}

impl AttrTest {
    pub(super) fn matches(&self, node: Node<'_>) -> bool {
        let attr = node.path(&self.path);
        let Some((op, value)) = &self.op else {
            return attr.is_some_and(|a| a.is_present());
        };

        match (op, value) {
            (AttrOp::Eq, AttrValue::Regex(re)) => match attr {
                Some(Attr::Value(Value::String(s))) => re.is_match(s),
                Some(Attr::Kind(kind)) => re.is_match(kind.as_str()),
                _ => false,
            },
            (AttrOp::Ne, AttrValue::Regex(re)) => {
                match attr.as_ref().and_then(Attr::as_text) {
                    Some(text) => !re.is_match(&text),
                    None => true,
                }
            }
            (AttrOp::Eq, _) => attr
                .and_then(|a| a.as_text())
                .is_some_and(|text| text == literal_text(value)),
            (AttrOp::Ne, _) => attr
                .and_then(|a| a.as_text())
                .map_or(true, |text| text != literal_text(value)),
            (op, _) => attr
                .and_then(|a| compare(&a, value))
                .is_some_and(|ordering| match op {
                    AttrOp::Lt => ordering == Ordering::Less,
                    AttrOp::Le => ordering != Ordering::Greater,
                    AttrOp::Gt => ordering == Ordering::Greater,
                    AttrOp::Ge => ordering != Ordering::Less,
                    AttrOp::Eq | AttrOp::Ne => false,
                }),
        }
    }
}

fn literal_text(value: &AttrValue) -> String {
    match value {
        AttrValue::Literal(s) => s.clone(),
        AttrValue::Number(n) => crate::tree::format_number(*n),
        AttrValue::Regex(re) => re.as_str().to_string(),
    }
}

fn compare(attr: &Attr<'_>, value: &AttrValue) -> Option<Ordering> {
    match value {
        AttrValue::Number(n) => attr.as_number()?.partial_cmp(n),
        AttrValue::Literal(s) => match s.parse::<f64>() {
            Ok(n) => attr.as_number()?.partial_cmp(&n),
            Err(_) => {
                let text = attr.as_text()?;
                Some(Ord::cmp(&*text, s.as_str()))
            }
        },
        AttrValue::Regex(_) => None,
    }
}
