//! Programmatic tree construction
//!
//! Builds an ESTree-shaped tree together with canonical source text, so spans
//! always agree with the text. Types attached with [`Js::typed`] are collected
//! into a [`TypeTable`] keyed by the produced node ids.
//!
//! ```
//! use rxlint::tree::synth::*;
//!
//! let (tree, _types) = program(vec![expr_stmt(method(ident("source"), "pipe", vec![]))])
//!     .build()
//!     .unwrap();
//! assert_eq!(tree.source(), "source.pipe();");
//! ```

use super::{NodeId, NodeKind, Slot, Span, SyntaxTree, TreeBuilder, TreeError, Value};
use crate::types::{Type, TypeTable};
use std::collections::HashMap;

/// A node under construction
#[derive(Debug, Clone)]
pub struct Js {
    kind: NodeKind,
    pieces: Vec<Piece>,
    attrs: Vec<(String, Value)>,
    ty: Option<Type>,
    tag: Option<String>,
}

#[derive(Debug, Clone)]
enum Piece {
    Text(String),
    Child(&'static str, Js),
    List(&'static str, Vec<Js>, &'static str),
    Null(&'static str),
    /// Identifier occupying the span of the previous child (`{ of }` specifiers)
    Alias(&'static str, String),
}

/// Result of [`Js::build_tagged`]
#[derive(Debug)]
pub struct Synthesized {
    pub tree: SyntaxTree,
    pub types: TypeTable,
    pub tags: HashMap<String, NodeId>,
}

impl Synthesized {
    /// Node id registered with [`Js::tag`]
    pub fn tagged(&self, tag: &str) -> Option<NodeId> {
        self.tags.get(tag).copied()
    }
}

impl Js {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            pieces: Vec::new(),
            attrs: Vec::new(),
            ty: None,
            tag: None,
        }
    }

    fn text(mut self, text: &str) -> Self {
        self.pieces.push(Piece::Text(text.to_string()));
        self
    }

    fn child(mut self, field: &'static str, child: Js) -> Self {
        self.pieces.push(Piece::Child(field, child));
        self
    }

    fn opt_child(mut self, field: &'static str, child: Option<Js>) -> Self {
        match child {
            Some(child) => self.pieces.push(Piece::Child(field, child)),
            None => self.pieces.push(Piece::Null(field)),
        }
        self
    }

    fn list(mut self, field: &'static str, items: Vec<Js>, separator: &'static str) -> Self {
        self.pieces.push(Piece::List(field, items, separator));
        self
    }

    fn alias(mut self, field: &'static str, name: &str) -> Self {
        self.pieces.push(Piece::Alias(field, name.to_string()));
        self
    }

    /// Set a scalar attribute
    pub fn attr(mut self, key: &str, value: impl Into<Value>) -> Self {
        let value = value.into();
        match self.attrs.iter_mut().find(|(k, _)| k == key) {
            Some(slot) => slot.1 = value,
            None => self.attrs.push((key.to_string(), value)),
        }
        self
    }

    /// Attach the node's static type
    pub fn typed(mut self, ty: Type) -> Self {
        self.ty = Some(ty);
        self
    }

    /// Name the node for lookup after building
    pub fn tag(mut self, tag: &str) -> Self {
        self.tag = Some(tag.to_string());
        self
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Canonical source text of this node
    pub fn source(&self) -> String {
        let mut out = String::new();
        self.write_source(&mut out);
        out
    }

    fn write_source(&self, out: &mut String) {
        for piece in &self.pieces {
            match piece {
                Piece::Text(text) => out.push_str(text),
                Piece::Child(_, child) => child.write_source(out),
                Piece::List(_, items, separator) => {
                    for (i, item) in items.iter().enumerate() {
                        if i > 0 {
                            out.push_str(separator);
                        }
                        item.write_source(out);
                    }
                }
                Piece::Null(_) | Piece::Alias(..) => {}
            }
        }
    }

    /// Render into a tree and its type table
    pub fn build(self) -> Result<(SyntaxTree, TypeTable), TreeError> {
        let built = self.build_tagged()?;
        Ok((built.tree, built.types))
    }

    pub fn build_tagged(self) -> Result<Synthesized, TreeError> {
        let mut renderer = Renderer::default();
        let root = renderer.render(self);
        let tree = renderer.builder.finish(root, renderer.out)?;
        Ok(Synthesized {
            tree,
            types: renderer.types,
            tags: renderer.tags,
        })
    }
}

#[derive(Default)]
struct Renderer {
    out: String,
    builder: TreeBuilder,
    spans: Vec<Span>,
    types: TypeTable,
    tags: HashMap<String, NodeId>,
}

impl Renderer {
    fn render(&mut self, js: Js) -> NodeId {
        let start = self.out.len();
        let mut fields: Vec<(String, Slot)> = Vec::new();
        let mut last = Span::empty(start);

        for piece in js.pieces {
            match piece {
                Piece::Text(text) => self.out.push_str(&text),
                Piece::Child(field, child) => {
                    let id = self.render(child);
                    last = self.spans[id.index()];
                    fields.push((field.to_string(), Slot::Node(id)));
                }
                Piece::List(field, items, separator) => {
                    let mut ids = Vec::with_capacity(items.len());
                    for (i, item) in items.into_iter().enumerate() {
                        if i > 0 {
                            self.out.push_str(separator);
                        }
                        let id = self.render(item);
                        last = self.spans[id.index()];
                        ids.push(Some(id));
                    }
                    fields.push((field.to_string(), Slot::List(ids)));
                }
                Piece::Null(field) => fields.push((field.to_string(), Slot::Value(Value::Null))),
                Piece::Alias(field, name) => {
                    let id = self.add(
                        NodeKind::Identifier,
                        last,
                        vec![("name".to_string(), Slot::Value(Value::String(name)))],
                    );
                    fields.push((field.to_string(), Slot::Node(id)));
                }
            }
        }

        for (key, value) in js.attrs {
            fields.push((key, Slot::Value(value)));
        }
        let id = self.add(js.kind, Span::new(start, self.out.len()), fields);
        if let Some(ty) = js.ty {
            self.types.insert(id, ty);
        }
        if let Some(tag) = js.tag {
            self.tags.insert(tag, id);
        }
        id
    }

    fn add(&mut self, kind: NodeKind, span: Span, fields: Vec<(String, Slot)>) -> NodeId {
        self.spans.push(span);
        self.builder.add(kind, span, fields)
    }
}

// Program and statements

pub fn program(body: Vec<Js>) -> Js {
    Js::new(NodeKind::Program)
        .list("body", body, "\n")
        .attr("sourceType", "module")
}

pub fn expr_stmt(expression: Js) -> Js {
    Js::new(NodeKind::ExpressionStatement)
        .child("expression", expression)
        .text(";")
}

/// `{ a; b; }`
pub fn block(body: Vec<Js>) -> Js {
    if body.is_empty() {
        return Js::new(NodeKind::BlockStatement).list("body", body, " ").text("{}");
    }
    Js::new(NodeKind::BlockStatement)
        .text("{ ")
        .list("body", body, " ")
        .text(" }")
}

pub fn return_stmt(argument: Option<Js>) -> Js {
    match argument {
        Some(argument) => Js::new(NodeKind::ReturnStatement)
            .text("return ")
            .child("argument", argument)
            .text(";"),
        None => Js::new(NodeKind::ReturnStatement)
            .text("return")
            .opt_child("argument", None)
            .text(";"),
    }
}

pub fn throw_stmt(argument: Js) -> Js {
    Js::new(NodeKind::ThrowStatement)
        .text("throw ")
        .child("argument", argument)
        .text(";")
}

/// `if (test) consequent`
pub fn if_stmt(test: Js, consequent: Js) -> Js {
    Js::new(NodeKind::IfStatement)
        .text("if (")
        .child("test", test)
        .text(") ")
        .child("consequent", consequent)
        .opt_child("alternate", None)
}

/// `try { ... } catch (param) { ... }`
pub fn try_catch(block_body: Js, param: Option<Js>, handler_body: Js) -> Js {
    let handler = match param {
        Some(param) => Js::new(NodeKind::CatchClause)
            .text("catch (")
            .child("param", param)
            .text(") ")
            .child("body", handler_body),
        None => Js::new(NodeKind::CatchClause)
            .text("catch ")
            .opt_child("param", None)
            .child("body", handler_body),
    };
    Js::new(NodeKind::TryStatement)
        .text("try ")
        .child("block", block_body)
        .text(" ")
        .child("handler", handler)
        .opt_child("finalizer", None)
}

/// `const id = init;`
pub fn const_decl(id: Js, init: Js) -> Js {
    declaration("const", id, Some(init))
}

/// `let id;` or `let id = init;`
pub fn let_decl(id: Js, init: Option<Js>) -> Js {
    declaration("let", id, init)
}

pub fn declaration(kind: &str, id: Js, init: Option<Js>) -> Js {
    let declarator = match init {
        Some(init) => Js::new(NodeKind::VariableDeclarator)
            .child("id", id)
            .text(" = ")
            .child("init", init),
        None => Js::new(NodeKind::VariableDeclarator)
            .child("id", id)
            .opt_child("init", None),
    };
    Js::new(NodeKind::VariableDeclaration)
        .text(kind)
        .text(" ")
        .list("declarations", vec![declarator], ", ")
        .text(";")
        .attr("kind", kind)
}

// Modules

/// `import { a, b as c } from "source";`
pub fn import_decl(specifiers: Vec<Js>, source: &str) -> Js {
    import_with(specifiers, string(source))
}

/// As [`import_decl`] with an explicit source literal (for quote styles)
pub fn import_with(specifiers: Vec<Js>, source: Js) -> Js {
    let braced = specifiers
        .iter()
        .any(|s| s.kind == NodeKind::ImportSpecifier);
    let js = Js::new(NodeKind::ImportDeclaration).text("import ");
    let js = if braced {
        js.text("{ ").list("specifiers", specifiers, ", ").text(" }")
    } else {
        js.list("specifiers", specifiers, ", ")
    };
    js.text(" from ")
        .child("source", source)
        .text(";")
        .attr("importKind", "value")
}

/// `import "source";`
pub fn import_bare(source: &str) -> Js {
    Js::new(NodeKind::ImportDeclaration)
        .text("import ")
        .list("specifiers", vec![], ", ")
        .child("source", string(source))
        .text(";")
        .attr("importKind", "value")
}

/// `name` inside import braces
pub fn import_spec(name: &str) -> Js {
    Js::new(NodeKind::ImportSpecifier)
        .child("imported", ident(name))
        .alias("local", name)
        .attr("importKind", "value")
}

/// `imported as local` inside import braces
pub fn import_spec_as(imported: &str, local: &str) -> Js {
    Js::new(NodeKind::ImportSpecifier)
        .child("imported", ident(imported))
        .text(" as ")
        .child("local", ident(local))
        .attr("importKind", "value")
}

pub fn import_default(local: &str) -> Js {
    Js::new(NodeKind::ImportDefaultSpecifier).child("local", ident(local))
}

pub fn import_namespace(local: &str) -> Js {
    Js::new(NodeKind::ImportNamespaceSpecifier)
        .text("* as ")
        .child("local", ident(local))
}

// Expressions

pub fn ident(name: &str) -> Js {
    Js::new(NodeKind::Identifier).text(name).attr("name", name)
}

/// Parameter or binding with a type annotation: `name: T`
pub fn ident_typed(name: &str, annotation: Js) -> Js {
    Js::new(NodeKind::Identifier)
        .text(name)
        .child("typeAnnotation", type_annotation(annotation))
        .attr("name", name)
}

pub fn this() -> Js {
    Js::new(NodeKind::ThisExpression).text("this")
}

/// Double-quoted string literal
pub fn string(value: &str) -> Js {
    quoted(value, '"')
}

/// String literal with a chosen quote character
pub fn quoted(value: &str, quote: char) -> Js {
    let raw = format!("{quote}{value}{quote}");
    Js::new(NodeKind::Literal)
        .text(&raw)
        .attr("value", value)
        .attr("raw", raw.as_str())
}

pub fn number(value: f64) -> Js {
    let raw = super::format_number(value);
    Js::new(NodeKind::Literal)
        .text(&raw)
        .attr("value", value)
        .attr("raw", raw.as_str())
}

pub fn boolean(value: bool) -> Js {
    let raw = if value { "true" } else { "false" };
    Js::new(NodeKind::Literal)
        .text(raw)
        .attr("value", value)
        .attr("raw", raw)
}

pub fn null() -> Js {
    Js::new(NodeKind::Literal)
        .text("null")
        .attr("value", Value::Null)
        .attr("raw", "null")
}

/// `object.name`
pub fn member(object: Js, name: &str) -> Js {
    Js::new(NodeKind::MemberExpression)
        .child("object", object)
        .text(".")
        .child("property", ident(name))
        .attr("computed", false)
        .attr("optional", false)
}

/// `object[property]`
pub fn index(object: Js, property: Js) -> Js {
    Js::new(NodeKind::MemberExpression)
        .child("object", object)
        .text("[")
        .child("property", property)
        .text("]")
        .attr("computed", true)
        .attr("optional", false)
}

/// `callee(args)`
pub fn call(callee: Js, arguments: Vec<Js>) -> Js {
    Js::new(NodeKind::CallExpression)
        .child("callee", callee)
        .text("(")
        .list("arguments", arguments, ", ")
        .text(")")
        .attr("optional", false)
}

/// `callee<T, U>(args)`
pub fn call_generic(callee: Js, type_arguments: Vec<Js>, arguments: Vec<Js>) -> Js {
    Js::new(NodeKind::CallExpression)
        .child("callee", callee)
        .child("typeArguments", type_instantiation(type_arguments))
        .text("(")
        .list("arguments", arguments, ", ")
        .text(")")
        .attr("optional", false)
}

/// `object.name(args)`
pub fn method(object: Js, name: &str, arguments: Vec<Js>) -> Js {
    call(member(object, name), arguments)
}

/// `new callee(args)`
pub fn new_expr(callee: Js, arguments: Vec<Js>) -> Js {
    Js::new(NodeKind::NewExpression)
        .text("new ")
        .child("callee", callee)
        .text("(")
        .list("arguments", arguments, ", ")
        .text(")")
}

/// `new callee<T>(args)`
pub fn new_generic(callee: Js, type_arguments: Vec<Js>, arguments: Vec<Js>) -> Js {
    Js::new(NodeKind::NewExpression)
        .text("new ")
        .child("callee", callee)
        .child("typeArguments", type_instantiation(type_arguments))
        .text("(")
        .list("arguments", arguments, ", ")
        .text(")")
}

/// `(a, b) => body`
pub fn arrow(params: Vec<Js>, body: Js) -> Js {
    let expression = body.kind != NodeKind::BlockStatement;
    Js::new(NodeKind::ArrowFunctionExpression)
        .text("(")
        .list("params", params, ", ")
        .text(") => ")
        .child("body", body)
        .attr("async", false)
        .attr("generator", false)
        .attr("expression", expression)
}

/// `a => body`, a single parameter without parentheses
pub fn arrow_bare(param: Js, body: Js) -> Js {
    let expression = body.kind != NodeKind::BlockStatement;
    Js::new(NodeKind::ArrowFunctionExpression)
        .list("params", vec![param], "")
        .text(" => ")
        .child("body", body)
        .attr("async", false)
        .attr("generator", false)
        .attr("expression", expression)
}

/// `function (params) body`
pub fn function_expr(params: Vec<Js>, body: Js) -> Js {
    Js::new(NodeKind::FunctionExpression)
        .text("function ")
        .opt_child("id", None)
        .text("(")
        .list("params", params, ", ")
        .text(") ")
        .child("body", body)
        .attr("async", false)
        .attr("generator", false)
}

/// `function name(params) body`
pub fn function_decl(name: &str, params: Vec<Js>, body: Js) -> Js {
    Js::new(NodeKind::FunctionDeclaration)
        .text("function ")
        .child("id", ident(name))
        .text("(")
        .list("params", params, ", ")
        .text(") ")
        .child("body", body)
        .attr("async", false)
        .attr("generator", false)
}

/// Mark a function node `async`
pub fn async_fn(function: Js) -> Js {
    let mut function = function.attr("async", true);
    function.pieces.insert(0, Piece::Text("async ".to_string()));
    function
}

/// `{ a: b, c }`
pub fn object(properties: Vec<Js>) -> Js {
    if properties.is_empty() {
        return Js::new(NodeKind::ObjectExpression)
            .list("properties", properties, ", ")
            .text("{}");
    }
    Js::new(NodeKind::ObjectExpression)
        .text("{ ")
        .list("properties", properties, ", ")
        .text(" }")
}

/// `key: value`
pub fn prop(key: &str, value: Js) -> Js {
    Js::new(NodeKind::Property)
        .child("key", ident(key))
        .text(": ")
        .child("value", value)
        .attr("kind", "init")
        .attr("computed", false)
        .attr("method", false)
        .attr("shorthand", false)
}

/// `name` as a shorthand property
pub fn prop_shorthand(name: &str) -> Js {
    Js::new(NodeKind::Property)
        .child("key", ident(name))
        .alias("value", name)
        .attr("kind", "init")
        .attr("computed", false)
        .attr("method", false)
        .attr("shorthand", true)
}

/// `[a, b]`
pub fn array(elements: Vec<Js>) -> Js {
    Js::new(NodeKind::ArrayExpression)
        .text("[")
        .list("elements", elements, ", ")
        .text("]")
}

/// `left op right`
pub fn binary(left: Js, operator: &str, right: Js) -> Js {
    Js::new(NodeKind::BinaryExpression)
        .child("left", left)
        .text(&format!(" {} ", operator))
        .child("right", right)
        .attr("operator", operator)
}

/// `left = right`
pub fn assign(left: Js, right: Js) -> Js {
    Js::new(NodeKind::AssignmentExpression)
        .child("left", left)
        .text(" = ")
        .child("right", right)
        .attr("operator", "=")
}

/// `{ a, b }` binding pattern
pub fn object_pattern(names: &[&str]) -> Js {
    let properties = names.iter().map(|n| prop_shorthand(n)).collect();
    Js::new(NodeKind::ObjectPattern)
        .text("{ ")
        .list("properties", properties, ", ")
        .text(" }")
}

/// `[a, b]` binding pattern
pub fn array_pattern(names: &[&str]) -> Js {
    let elements = names.iter().map(|n| ident(n)).collect();
    Js::new(NodeKind::ArrayPattern)
        .text("[")
        .list("elements", elements, ", ")
        .text("]")
}

// Classes

/// `class Name extends Base { members }`
pub fn class_decl(name: &str, super_class: Option<Js>, members: Vec<Js>) -> Js {
    let js = Js::new(NodeKind::ClassDeclaration)
        .text("class ")
        .child("id", ident(name));
    let js = match super_class {
        Some(base) => js.text(" extends ").child("superClass", base),
        None => js.opt_child("superClass", None),
    };
    js.text(" ").child("body", class_body(members))
}

fn class_body(members: Vec<Js>) -> Js {
    if members.is_empty() {
        return Js::new(NodeKind::ClassBody).list("body", members, " ").text("{}");
    }
    Js::new(NodeKind::ClassBody)
        .text("{ ")
        .list("body", members, " ")
        .text(" }")
}

/// `private name: T = value;`
pub fn property_def(
    accessibility: Option<&str>,
    name: &str,
    annotation: Option<Js>,
    value: Option<Js>,
) -> Js {
    let mut js = Js::new(NodeKind::PropertyDefinition);
    if let Some(accessibility) = accessibility {
        js = js.text(accessibility).text(" ").attr("accessibility", accessibility);
    }
    js = js.child("key", ident(name));
    if let Some(annotation) = annotation {
        js = js.child("typeAnnotation", type_annotation(annotation));
    }
    js = match value {
        Some(value) => js.text(" = ").child("value", value),
        None => js.opt_child("value", None),
    };
    js.text(";")
        .attr("computed", false)
        .attr("static", false)
}

/// `get name(): T { ... }`, `set name(v) { ... }` or `name(params): T { ... }`
pub fn method_def(
    kind: &str,
    accessibility: Option<&str>,
    name: &str,
    params: Vec<Js>,
    return_type: Option<Js>,
    body: Js,
) -> Js {
    let mut js = Js::new(NodeKind::MethodDefinition);
    if let Some(accessibility) = accessibility {
        js = js.text(accessibility).text(" ").attr("accessibility", accessibility);
    }
    if kind == "get" || kind == "set" {
        js = js.text(kind).text(" ");
    }
    let mut function = Js::new(NodeKind::FunctionExpression)
        .opt_child("id", None)
        .text("(")
        .list("params", params, ", ")
        .text(")");
    if let Some(return_type) = return_type {
        function = function.child("returnType", type_annotation(return_type));
    }
    let function = function
        .text(" ")
        .child("body", body)
        .attr("async", false)
        .attr("generator", false);
    js.child("key", ident(name))
        .child("value", function)
        .attr("kind", kind)
        .attr("computed", false)
        .attr("static", false)
}

/// `constructor(params) {}`
pub fn constructor(params: Vec<Js>) -> Js {
    method_def("constructor", None, "constructor", params, None, block(vec![]))
}

/// `private name: T` constructor parameter property
pub fn param_property(accessibility: Option<&str>, parameter: Js) -> Js {
    let mut js = Js::new(NodeKind::TSParameterProperty);
    if let Some(accessibility) = accessibility {
        js = js.text(accessibility).text(" ").attr("accessibility", accessibility);
    } else {
        js = js.text("readonly ").attr("readonly", true);
    }
    js.child("parameter", parameter)
}

// Type syntax

/// `: T`
pub fn type_annotation(annotation: Js) -> Js {
    Js::new(NodeKind::TSTypeAnnotation)
        .text(": ")
        .child("typeAnnotation", annotation)
}

/// `<T, U>`
pub fn type_instantiation(params: Vec<Js>) -> Js {
    Js::new(NodeKind::TSTypeParameterInstantiation)
        .text("<")
        .list("params", params, ", ")
        .text(">")
}

/// `Name` or `Name<T>`
pub fn ts_ref(name: &str, type_arguments: Vec<Js>) -> Js {
    let js = Js::new(NodeKind::TSTypeReference).child("typeName", ident(name));
    if type_arguments.is_empty() {
        js
    } else {
        js.child("typeArguments", type_instantiation(type_arguments))
    }
}

/// Keyword type such as `any`, `unknown`, `number` or `void`
pub fn ts_keyword(keyword: &str) -> Js {
    let kind = match keyword {
        "any" => NodeKind::TSAnyKeyword,
        "unknown" => NodeKind::TSUnknownKeyword,
        "number" => NodeKind::TSNumberKeyword,
        "string" => NodeKind::TSStringKeyword,
        "boolean" => NodeKind::TSBooleanKeyword,
        "void" => NodeKind::TSVoidKeyword,
        "never" => NodeKind::TSNeverKeyword,
        "undefined" => NodeKind::TSUndefinedKeyword,
        "null" => NodeKind::TSNullKeyword,
        _ => NodeKind::TSObjectKeyword,
    };
    Js::new(kind).text(keyword)
}

/// `A | B`
pub fn ts_union(types: Vec<Js>) -> Js {
    Js::new(NodeKind::TSUnionType).list("types", types, " | ")
}

/// `{}` object type literal
pub fn ts_type_literal() -> Js {
    Js::new(NodeKind::TSTypeLiteral).list("members", vec![], "; ").text("{}")
}
