//! Declared-name sites shared by the naming rules

use crate::tree::{Node, NodeKind};
use crate::types::{Type, TypeQuery};

/// Identifiers that may declare a name; [`declared_name_site`] narrows them
pub(crate) const NAME_SELECTOR: &str =
    "Identifier:matches(.id, .params, .key, .value, .elements, .left, .argument, .parameter)";

/// Kind of declaration a name belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NameSite {
    Function,
    Method,
    Parameter,
    Property,
    Variable,
}

/// Site of a declaring identifier, `None` for references and type positions
pub(crate) fn declared_name_site(identifier: Node<'_>) -> Option<NameSite> {
    let parent = identifier.parent()?;
    let field = identifier.field_name()?;
    match (parent.kind(), field) {
        (NodeKind::VariableDeclarator, "id") => Some(NameSite::Variable),
        (NodeKind::FunctionDeclaration, "id") => Some(NameSite::Function),
        (kind, "params") if kind.is_function() => Some(NameSite::Parameter),
        (NodeKind::TSParameterProperty, "parameter") => Some(NameSite::Parameter),
        (NodeKind::PropertyDefinition | NodeKind::TSPropertySignature, "key") => {
            Some(NameSite::Property)
        }
        (NodeKind::Property, "key") => {
            let in_object = parent
                .parent()
                .is_some_and(|p| p.is(NodeKind::ObjectExpression));
            (in_object && !parent.flag("method") && !parent.flag("computed"))
                .then_some(NameSite::Property)
        }
        (NodeKind::MethodDefinition, "key") => match parent.str("kind") {
            Some("get" | "set") => Some(NameSite::Property),
            Some("method") => Some(NameSite::Method),
            _ => None,
        },
        (NodeKind::TSMethodSignature, "key") => Some(NameSite::Method),
        (NodeKind::ArrayPattern, "elements")
        | (NodeKind::AssignmentPattern, "left")
        | (NodeKind::RestElement, "argument") => pattern_site(parent),
        (NodeKind::Property, "value")
            if parent.parent().is_some_and(|p| p.is(NodeKind::ObjectPattern)) =>
        {
            pattern_site(parent)
        }
        _ => None,
    }
}

/// Site of the declaration owning a destructuring pattern
fn pattern_site(part: Node<'_>) -> Option<NameSite> {
    let mut outermost = part;
    while let Some(parent) = outermost.parent() {
        match parent.kind() {
            NodeKind::ArrayPattern
            | NodeKind::ObjectPattern
            | NodeKind::Property
            | NodeKind::AssignmentPattern
            | NodeKind::RestElement => outermost = parent,
            _ => break,
        }
    }
    let owner = outermost.parent()?;
    match (owner.kind(), outermost.field_name()?) {
        (NodeKind::VariableDeclarator, "id") => Some(NameSite::Variable),
        (kind, "params") if kind.is_function() => Some(NameSite::Parameter),
        _ => None,
    }
}

/// Type of a declared name, falling back to its declaring node
pub(crate) fn declared_type<'a>(types: TypeQuery<'a>, identifier: Node<'_>) -> Option<&'a Type> {
    types
        .type_of(identifier)
        .or_else(|| identifier.parent().and_then(|p| types.type_of(p)))
}
