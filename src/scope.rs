//! Lexical bindings and their reference sites

use crate::tree::{Node, NodeId, NodeKind, SyntaxTree};
use std::collections::HashMap;

/// How a name was bound
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingKind {
    Var,
    Let,
    Const,
    Parameter,
    Function,
    Class,
    Import,
    CatchParameter,
}

/// A declared name
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub name: String,
    pub kind: BindingKind,
    /// The declaring identifier
    pub declaration: NodeId,
    /// Module specifier for imports
    pub import_source: Option<String>,
    /// Exported name for named imports (`of` in `{ of as just }`)
    pub imported: Option<String>,
}

/// Host-replaceable binding resolution
pub trait ScopeResolver: Send + Sync {
    /// Binding declared by an identifier
    fn binding(&self, declaration: NodeId) -> Option<&Binding>;

    /// Declaring identifier an identifier resolves to; a declaring
    /// identifier resolves to itself
    fn resolve(&self, identifier: NodeId) -> Option<NodeId>;

    /// Reference sites of a binding, declaration excluded, in source order
    fn references(&self, declaration: NodeId) -> &[NodeId];

    /// Module an identifier was imported from
    fn import_source(&self, identifier: NodeId) -> Option<&str> {
        let declaration = self.resolve(identifier)?;
        self.binding(declaration)?.import_source.as_deref()
    }
}

/// Built-in scope analysis over a syntax tree
///
/// Hoisting is approximated: `var` goes to the enclosing function, everything
/// else to the nearest block. Unresolved names (globals) have no binding.
#[derive(Debug, Default)]
pub struct ScopeAnalysis {
    bindings: HashMap<NodeId, Binding>,
    resolved: HashMap<NodeId, NodeId>,
    references: HashMap<NodeId, Vec<NodeId>>,
}

const TYPE_CONTEXTS: &[NodeKind] = &[
    NodeKind::TSTypeAnnotation,
    NodeKind::TSTypeReference,
    NodeKind::TSTypeParameterInstantiation,
    NodeKind::TSTypeParameterDeclaration,
    NodeKind::TSQualifiedName,
    NodeKind::TSTypeQuery,
    NodeKind::TSInterfaceDeclaration,
    NodeKind::TSTypeAliasDeclaration,
    NodeKind::TSTypeLiteral,
    NodeKind::TSFunctionType,
    NodeKind::TSInterfaceHeritage,
    NodeKind::TSClassImplements,
    NodeKind::TSImportType,
];

impl ScopeAnalysis {
    pub fn analyze(tree: &SyntaxTree) -> Self {
        let mut analysis = Self::default();
        let mut scopes: HashMap<(NodeId, String), NodeId> = HashMap::new();

        for node in tree.nodes() {
            for (identifier, scope, kind) in declarations(node) {
                let Some(name) = identifier.name() else {
                    continue;
                };
                let (import_source, imported) = import_details(identifier);
                scopes
                    .entry((scope.id(), name.to_string()))
                    .or_insert(identifier.id());
                analysis.bindings.insert(
                    identifier.id(),
                    Binding {
                        name: name.to_string(),
                        kind,
                        declaration: identifier.id(),
                        import_source,
                        imported,
                    },
                );
            }
        }

        for node in tree.nodes() {
            if !node.is(NodeKind::Identifier) || analysis.bindings.contains_key(&node.id()) {
                continue;
            }
            if !is_reference(node) {
                continue;
            }
            let Some(name) = node.name() else {
                continue;
            };
            let mut scope = enclosing_scope(node);
            while let Some(current) = scope {
                if let Some(declaration) = scopes.get(&(current.id(), name.to_string())) {
                    analysis.resolved.insert(node.id(), *declaration);
                    analysis
                        .references
                        .entry(*declaration)
                        .or_default()
                        .push(node.id());
                    break;
                }
                scope = enclosing_scope(current);
            }
        }

        let spans: HashMap<NodeId, usize> = tree.nodes().map(|n| (n.id(), n.span().start)).collect();
        for references in analysis.references.values_mut() {
            references.sort_by_key(|id| spans.get(id).copied().unwrap_or(0));
        }

        log::trace!(
            "Scope analysis: {} bindings, {} resolved references",
            analysis.bindings.len(),
            analysis.resolved.len()
        );
        analysis
    }
}

impl ScopeResolver for ScopeAnalysis {
    fn binding(&self, declaration: NodeId) -> Option<&Binding> {
        self.bindings.get(&declaration)
    }

    fn resolve(&self, identifier: NodeId) -> Option<NodeId> {
        if self.bindings.contains_key(&identifier) {
            return Some(identifier);
        }
        self.resolved.get(&identifier).copied()
    }

    fn references(&self, declaration: NodeId) -> &[NodeId] {
        self.references
            .get(&declaration)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

fn creates_scope(node: Node<'_>) -> bool {
    match node.kind() {
        NodeKind::Program
        | NodeKind::CatchClause
        | NodeKind::ForStatement
        | NodeKind::ForInStatement
        | NodeKind::ForOfStatement
        | NodeKind::StaticBlock => true,
        kind if kind.is_function() => true,
        // A function body shares the function's scope
        NodeKind::BlockStatement => !node.parent().is_some_and(|p| p.is_function()),
        _ => false,
    }
}

/// Nearest scope-creating ancestor, excluding the node itself
fn enclosing_scope<'t>(node: Node<'t>) -> Option<Node<'t>> {
    node.ancestors().find(|a| creates_scope(*a))
}

fn function_scope<'t>(node: Node<'t>) -> Option<Node<'t>> {
    node.ancestors()
        .find(|a| a.is_function() || a.is(NodeKind::Program))
}

/// Identifiers declared directly by a node, with their scope
fn declarations<'t>(node: Node<'t>) -> Vec<(Node<'t>, Node<'t>, BindingKind)> {
    let mut out = Vec::new();
    match node.kind() {
        NodeKind::VariableDeclaration => {
            let kind = match node.str("kind") {
                Some("var") => BindingKind::Var,
                Some("let") => BindingKind::Let,
                _ => BindingKind::Const,
            };
            let scope = if kind == BindingKind::Var {
                function_scope(node)
            } else {
                enclosing_scope(node)
            };
            if let Some(scope) = scope {
                for declarator in node.list("declarations").iter() {
                    if let Some(id) = declarator.child("id") {
                        for identifier in pattern_identifiers(id) {
                            out.push((identifier, scope, kind));
                        }
                    }
                }
            }
        }
        NodeKind::FunctionDeclaration | NodeKind::TSDeclareFunction => {
            if let (Some(id), Some(scope)) = (node.child("id"), enclosing_scope(node)) {
                out.push((id, scope, BindingKind::Function));
            }
            params(node, &mut out);
        }
        NodeKind::FunctionExpression => {
            if let Some(id) = node.child("id") {
                out.push((id, node, BindingKind::Function));
            }
            params(node, &mut out);
        }
        NodeKind::ArrowFunctionExpression => params(node, &mut out),
        NodeKind::ClassDeclaration | NodeKind::ClassExpression => {
            if let (Some(id), Some(scope)) = (node.child("id"), enclosing_scope(node)) {
                out.push((id, scope, BindingKind::Class));
            }
        }
        NodeKind::ImportSpecifier
        | NodeKind::ImportDefaultSpecifier
        | NodeKind::ImportNamespaceSpecifier => {
            let program = node.ancestors().last();
            if let (Some(local), Some(program)) = (node.child("local"), program) {
                out.push((local, program, BindingKind::Import));
            }
        }
        NodeKind::CatchClause => {
            if let Some(param) = node.child("param") {
                for identifier in pattern_identifiers(param) {
                    out.push((identifier, node, BindingKind::CatchParameter));
                }
            }
        }
        _ => {}
    }
    out
}

fn params<'t>(function: Node<'t>, out: &mut Vec<(Node<'t>, Node<'t>, BindingKind)>) {
    for param in function.list("params").iter() {
        for identifier in pattern_identifiers(param) {
            out.push((identifier, function, BindingKind::Parameter));
        }
    }
}

/// Binding identifiers of a pattern
pub fn pattern_identifiers(pattern: Node<'_>) -> Vec<Node<'_>> {
    let mut out = Vec::new();
    let mut stack = vec![pattern];
    while let Some(node) = stack.pop() {
        match node.kind() {
            NodeKind::Identifier => out.push(node),
            NodeKind::ObjectPattern => {
                for property in node.list("properties").iter().rev() {
                    match property.kind() {
                        NodeKind::Property => stack.extend(property.child("value")),
                        _ => stack.push(property),
                    }
                }
            }
            NodeKind::ArrayPattern => stack.extend(node.list("elements").iter().rev()),
            NodeKind::AssignmentPattern => stack.extend(node.child("left")),
            NodeKind::RestElement => stack.extend(node.child("argument")),
            NodeKind::TSParameterProperty => stack.extend(node.child("parameter")),
            _ => {}
        }
    }
    out
}

fn import_details(identifier: Node<'_>) -> (Option<String>, Option<String>) {
    let Some(specifier) = identifier.parent() else {
        return (None, None);
    };
    let source = specifier
        .parent()
        .filter(|p| p.is(NodeKind::ImportDeclaration))
        .and_then(|d| d.child("source"))
        .and_then(|s| s.str("value"))
        .map(str::to_string);
    let imported = match specifier.kind() {
        NodeKind::ImportSpecifier => specifier
            .child("imported")
            .and_then(|i| i.name().or_else(|| i.str("value")))
            .map(str::to_string),
        NodeKind::ImportDefaultSpecifier => Some("default".to_string()),
        _ => None,
    };
    (source, imported)
}

/// True for identifiers that read or write a binding
fn is_reference(identifier: Node<'_>) -> bool {
    let Some(parent) = identifier.parent() else {
        return false;
    };
    let field = identifier.field_name();
    let reference = match (parent.kind(), field) {
        (NodeKind::MemberExpression, Some("property")) => parent.flag("computed"),
        (
            NodeKind::Property
            | NodeKind::PropertyDefinition
            | NodeKind::MethodDefinition
            | NodeKind::AccessorProperty
            | NodeKind::TSAbstractMethodDefinition
            | NodeKind::TSAbstractPropertyDefinition,
            Some("key"),
        ) => parent.flag("computed"),
        (NodeKind::ExportSpecifier, Some("exported")) => false,
        (
            NodeKind::ImportSpecifier
            | NodeKind::ImportDefaultSpecifier
            | NodeKind::ImportNamespaceSpecifier
            | NodeKind::LabeledStatement
            | NodeKind::BreakStatement
            | NodeKind::ContinueStatement
            | NodeKind::MetaProperty,
            _,
        ) => false,
        _ => true,
    };
    reference
        && !identifier
            .ancestors()
            .any(|a| TYPE_CONTEXTS.contains(&a.kind()))
}
