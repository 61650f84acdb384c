//! Static type model and capability queries
//!
//! The host resolves types (normally through the TypeScript checker) and hands
//! them over as a [`TypeOracle`]. Rules never inspect the oracle directly; they
//! ask capability questions through [`TypeQuery`], which answers `false` for
//! every node whose type cannot be resolved.

use crate::tree::{Node, NodeId, Value};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// A resolved static type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Type {
    Any,
    Unknown,
    Void,
    Undefined,
    Null,
    Never,
    /// `string`, `number`, `boolean`, `bigint`, `symbol`, `object`
    Primitive { name: String },
    /// String, number or boolean literal type
    Literal { value: Value },
    Object(ObjectType),
    Union { types: Vec<Type> },
    Intersection { types: Vec<Type> },
}

/// A named (class, interface, alias) or anonymous object type
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ObjectType {
    /// Symbol name, empty for anonymous types
    pub name: String,
    /// Path of the declaring source file or module
    pub module: Option<String>,
    pub type_arguments: Vec<Type>,
    pub bases: Vec<Type>,
    pub implements: Vec<Type>,
    pub call_signatures: Vec<Signature>,
    pub properties: Vec<Property>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Signature {
    #[serde(default)]
    pub parameters: Vec<Type>,
    pub return_type: Type,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: Type,
}

/// Target of a `could be` query: an exact symbol name or a pattern
#[derive(Debug, Clone, Copy)]
pub enum TypeName<'a> {
    Exact(&'a str),
    Pattern(&'a Regex),
}

impl TypeName<'_> {
    fn matches(&self, name: &str) -> bool {
        match self {
            TypeName::Exact(expected) => *expected == name,
            TypeName::Pattern(re) => re.is_match(name),
        }
    }
}

impl<'a> From<&'a str> for TypeName<'a> {
    fn from(name: &'a str) -> Self {
        TypeName::Exact(name)
    }
}

impl<'a> From<&'a Regex> for TypeName<'a> {
    fn from(re: &'a Regex) -> Self {
        TypeName::Pattern(re)
    }
}

impl Type {
    /// Named object type without arguments
    pub fn named(name: &str) -> Self {
        Type::Object(ObjectType {
            name: name.to_string(),
            ..Default::default()
        })
    }

    /// Generic instantiation of a named type
    pub fn generic(name: &str, type_arguments: Vec<Type>) -> Self {
        Type::Object(ObjectType {
            name: name.to_string(),
            type_arguments,
            ..Default::default()
        })
    }

    /// Anonymous function type
    pub fn function(parameters: Vec<Type>, return_type: Type) -> Self {
        Type::Object(ObjectType {
            call_signatures: vec![Signature {
                parameters,
                return_type,
            }],
            ..Default::default()
        })
    }

    pub fn primitive(name: &str) -> Self {
        Type::Primitive {
            name: name.to_string(),
        }
    }

    pub fn string_literal(value: &str) -> Self {
        Type::Literal {
            value: Value::String(value.to_string()),
        }
    }

    pub fn union(types: Vec<Type>) -> Self {
        Type::Union { types }
    }

    /// Set the declaring module of an object type
    pub fn in_module(mut self, module: &str) -> Self {
        if let Type::Object(object) = &mut self {
            object.module = Some(module.to_string());
        }
        self
    }

    /// Add a base type to an object type
    pub fn extending(mut self, base: Type) -> Self {
        if let Type::Object(object) = &mut self {
            object.bases.push(base);
        }
        self
    }

    /// Add a property to an object type
    pub fn with_property(mut self, name: &str, ty: Type) -> Self {
        if let Type::Object(object) = &mut self {
            object.properties.push(Property {
                name: name.to_string(),
                ty,
            });
        }
        self
    }

    /// Add a call signature to an object type
    pub fn with_call_signature(mut self, return_type: Type) -> Self {
        if let Type::Object(object) = &mut self {
            object.call_signatures.push(Signature {
                parameters: Vec::new(),
                return_type,
            });
        }
        self
    }

    pub fn is_any(&self) -> bool {
        matches!(self, Type::Any)
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Type::Unknown)
    }

    pub fn is_void(&self) -> bool {
        matches!(self, Type::Void)
    }

    pub fn is_union(&self) -> bool {
        matches!(self, Type::Union { .. })
    }

    pub fn as_object(&self) -> Option<&ObjectType> {
        match self {
            Type::Object(object) => Some(object),
            _ => None,
        }
    }

    /// Members of a union, or the type itself
    pub fn union_members(&self) -> &[Type] {
        match self {
            Type::Union { types } => types,
            other => std::slice::from_ref(other),
        }
    }

    /// Type arguments of a generic instantiation
    pub fn type_arguments(&self) -> &[Type] {
        match self {
            Type::Object(object) => &object.type_arguments,
            _ => &[],
        }
    }

    pub fn call_signatures(&self) -> &[Signature] {
        match self {
            Type::Object(object) => &object.call_signatures,
            _ => &[],
        }
    }

    /// Declared property type, searching base types
    pub fn property(&self, name: &str) -> Option<&Type> {
        match self {
            Type::Object(object) => object
                .properties
                .iter()
                .find(|p| p.name == name)
                .map(|p| &p.ty)
                .or_else(|| object.bases.iter().find_map(|b| b.property(name))),
            Type::Intersection { types } => types.iter().find_map(|t| t.property(name)),
            _ => None,
        }
    }

    /// True if the type, one of its union or intersection constituents, or
    /// one of its base types or implemented interfaces has a matching symbol
    pub fn could_be<'n>(&self, name: impl Into<TypeName<'n>>) -> bool {
        self.could_be_in(name.into(), None)
    }

    /// As [`Type::could_be`], also requiring the symbol's module to match
    pub fn could_be_in(&self, name: TypeName<'_>, module: Option<&Regex>) -> bool {
        match self {
            Type::Union { types } | Type::Intersection { types } => {
                types.iter().any(|t| t.could_be_in(name, module))
            }
            Type::Object(object) => {
                let module_ok = match module {
                    None => true,
                    Some(re) => object.module.as_deref().is_some_and(|m| re.is_match(m)),
                };
                (module_ok && !object.name.is_empty() && name.matches(&object.name))
                    || object.bases.iter().any(|t| t.could_be_in(name, module))
                    || object.implements.iter().any(|t| t.could_be_in(name, module))
            }
            _ => false,
        }
    }

    /// True if some call signature's return type could be `name`
    pub fn could_return<'n>(&self, name: impl Into<TypeName<'n>>) -> bool {
        let name = name.into();
        self.union_members().iter().any(|member| {
            member
                .call_signatures()
                .iter()
                .any(|s| s.return_type.could_be_in(name, None))
        })
    }

    /// True if the type is invocable
    pub fn could_be_function(&self) -> bool {
        match self {
            Type::Union { types } | Type::Intersection { types } => {
                types.iter().any(Type::could_be_function)
            }
            Type::Object(object) => !object.call_signatures.is_empty() || object.name == "Function",
            _ => false,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Any => f.write_str("any"),
            Type::Unknown => f.write_str("unknown"),
            Type::Void => f.write_str("void"),
            Type::Undefined => f.write_str("undefined"),
            Type::Null => f.write_str("null"),
            Type::Never => f.write_str("never"),
            Type::Primitive { name } => f.write_str(name),
            Type::Literal {
                value: Value::String(s),
            } => write!(f, "\"{}\"", s),
            Type::Literal { value } => f.write_str(&value.to_js_string()),
            Type::Union { types } => write_joined(f, types, " | "),
            Type::Intersection { types } => write_joined(f, types, " & "),
            Type::Object(object) if object.name.is_empty() => match object.call_signatures.first() {
                Some(signature) => {
                    f.write_str("(")?;
                    write_joined(f, &signature.parameters, ", ")?;
                    write!(f, ") => {}", signature.return_type)
                }
                None => f.write_str("{}"),
            },
            Type::Object(object) => {
                f.write_str(&object.name)?;
                if !object.type_arguments.is_empty() {
                    f.write_str("<")?;
                    write_joined(f, &object.type_arguments, ", ")?;
                    f.write_str(">")?;
                }
                Ok(())
            }
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, types: &[Type], separator: &str) -> fmt::Result {
    for (i, t) in types.iter().enumerate() {
        if i > 0 {
            f.write_str(separator)?;
        }
        write!(f, "{}", t)?;
    }
    Ok(())
}

/// Source of per-node types for one file
pub trait TypeOracle: Send + Sync {
    /// Static type of an expression or declaration node
    fn type_of(&self, node: NodeId) -> Option<&Type>;
}

/// Host-supplied node to type map
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TypeTable {
    types: HashMap<NodeId, Type>,
}

impl TypeTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, node: NodeId, ty: Type) {
        self.types.insert(node, ty);
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl TypeOracle for TypeTable {
    fn type_of(&self, node: NodeId) -> Option<&Type> {
        self.types.get(&node)
    }
}

/// Capability queries over nodes
///
/// Every query is `false` when the file has no oracle or the oracle has no
/// type for the node.
#[derive(Clone, Copy)]
pub struct TypeQuery<'a> {
    oracle: Option<&'a dyn TypeOracle>,
}

impl<'a> TypeQuery<'a> {
    pub fn new(oracle: Option<&'a dyn TypeOracle>) -> Self {
        Self { oracle }
    }

    pub fn is_available(&self) -> bool {
        self.oracle.is_some()
    }

    pub fn type_of(&self, node: Node<'_>) -> Option<&'a Type> {
        self.oracle?.type_of(node.id())
    }

    pub fn could_be_type<'n>(&self, node: Node<'_>, name: impl Into<TypeName<'n>>) -> bool {
        self.type_of(node).is_some_and(|t| t.could_be(name))
    }

    pub fn could_be_type_in<'n>(
        &self,
        node: Node<'_>,
        name: impl Into<TypeName<'n>>,
        module: &Regex,
    ) -> bool {
        self.type_of(node)
            .is_some_and(|t| t.could_be_in(name.into(), Some(module)))
    }

    pub fn could_return_type<'n>(&self, node: Node<'_>, name: impl Into<TypeName<'n>>) -> bool {
        self.type_of(node).is_some_and(|t| t.could_return(name))
    }

    pub fn could_be_function(&self, node: Node<'_>) -> bool {
        self.type_of(node).is_some_and(Type::could_be_function)
    }

    pub fn is_any(&self, node: Node<'_>) -> bool {
        self.type_of(node).is_some_and(Type::is_any)
    }

    pub fn is_unknown(&self, node: Node<'_>) -> bool {
        self.type_of(node).is_some_and(Type::is_unknown)
    }

    pub fn is_void(&self, node: Node<'_>) -> bool {
        self.type_of(node).is_some_and(Type::is_void)
    }

    /// Rendered type of a node, `None` when unresolved
    pub fn display(&self, node: Node<'_>) -> Option<String> {
        self.type_of(node).map(Type::to_string)
    }
}
