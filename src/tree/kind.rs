//! Closed set of syntax node kinds (ESTree plus the typescript-estree extensions)

use std::fmt;

macro_rules! node_kinds {
    ($($kind:ident),* $(,)?) => {
        /// Discriminant of a syntax node
        ///
        /// Names are spelled exactly as the ESTree `type` property, so selector
        /// strings and host JSON use the same vocabulary.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum NodeKind {
            $($kind),*
        }

        impl NodeKind {
            /// Every kind of the grammar
            pub const ALL: &'static [NodeKind] = &[$(NodeKind::$kind),*];

            /// The ESTree `type` name
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(NodeKind::$kind => stringify!($kind)),*
                }
            }
        }

        impl std::str::FromStr for NodeKind {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $(stringify!($kind) => Ok(NodeKind::$kind),)*
                    _ => Err(format!("Unknown node kind: {}", s)),
                }
            }
        }
    };
}

node_kinds! {
    // Program structure
    Program,
    ExpressionStatement,
    BlockStatement,
    StaticBlock,
    EmptyStatement,
    DebuggerStatement,
    ReturnStatement,
    BreakStatement,
    ContinueStatement,
    LabeledStatement,
    IfStatement,
    SwitchStatement,
    SwitchCase,
    ThrowStatement,
    TryStatement,
    CatchClause,
    WhileStatement,
    DoWhileStatement,
    ForStatement,
    ForInStatement,
    ForOfStatement,
    VariableDeclaration,
    VariableDeclarator,

    // Modules
    ImportDeclaration,
    ImportSpecifier,
    ImportDefaultSpecifier,
    ImportNamespaceSpecifier,
    ImportAttribute,
    ImportExpression,
    ExportNamedDeclaration,
    ExportSpecifier,
    ExportDefaultDeclaration,
    ExportAllDeclaration,

    // Functions and classes
    FunctionDeclaration,
    FunctionExpression,
    ArrowFunctionExpression,
    ClassDeclaration,
    ClassExpression,
    ClassBody,
    MethodDefinition,
    PropertyDefinition,
    AccessorProperty,
    Decorator,

    // Expressions
    Identifier,
    PrivateIdentifier,
    Literal,
    TemplateLiteral,
    TemplateElement,
    TaggedTemplateExpression,
    ThisExpression,
    Super,
    ArrayExpression,
    ObjectExpression,
    Property,
    SpreadElement,
    UnaryExpression,
    UpdateExpression,
    BinaryExpression,
    LogicalExpression,
    AssignmentExpression,
    MemberExpression,
    ChainExpression,
    CallExpression,
    NewExpression,
    ConditionalExpression,
    SequenceExpression,
    AwaitExpression,
    YieldExpression,
    MetaProperty,

    // Patterns
    RestElement,
    AssignmentPattern,
    ArrayPattern,
    ObjectPattern,

    // TypeScript
    TSAbstractMethodDefinition,
    TSAbstractPropertyDefinition,
    TSAnyKeyword,
    TSArrayType,
    TSAsExpression,
    TSBigIntKeyword,
    TSBooleanKeyword,
    TSCallSignatureDeclaration,
    TSClassImplements,
    TSConditionalType,
    TSConstructSignatureDeclaration,
    TSConstructorType,
    TSDeclareFunction,
    TSEmptyBodyFunctionExpression,
    TSEnumDeclaration,
    TSEnumMember,
    TSExportAssignment,
    TSExternalModuleReference,
    TSFunctionType,
    TSImportEqualsDeclaration,
    TSImportType,
    TSIndexSignature,
    TSIndexedAccessType,
    TSInferType,
    TSInterfaceBody,
    TSInterfaceDeclaration,
    TSInterfaceHeritage,
    TSIntersectionType,
    TSLiteralType,
    TSMappedType,
    TSMethodSignature,
    TSModuleBlock,
    TSModuleDeclaration,
    TSNamedTupleMember,
    TSNeverKeyword,
    TSNonNullExpression,
    TSNullKeyword,
    TSNumberKeyword,
    TSObjectKeyword,
    TSOptionalType,
    TSParameterProperty,
    TSPropertySignature,
    TSQualifiedName,
    TSRestType,
    TSSatisfiesExpression,
    TSStringKeyword,
    TSSymbolKeyword,
    TSTemplateLiteralType,
    TSThisType,
    TSTupleType,
    TSTypeAliasDeclaration,
    TSTypeAnnotation,
    TSTypeAssertion,
    TSTypeLiteral,
    TSTypeOperator,
    TSTypeParameter,
    TSTypeParameterDeclaration,
    TSTypeParameterInstantiation,
    TSTypePredicate,
    TSTypeQuery,
    TSTypeReference,
    TSUndefinedKeyword,
    TSUnionType,
    TSUnknownKeyword,
    TSVoidKeyword,
}

impl NodeKind {
    /// Function-like nodes that own parameters and a body
    pub fn is_function(&self) -> bool {
        matches!(
            self,
            NodeKind::FunctionDeclaration
                | NodeKind::FunctionExpression
                | NodeKind::ArrowFunctionExpression
        )
    }

    /// Nodes whose `body` is a statement list
    pub fn is_statement_list(&self) -> bool {
        matches!(
            self,
            NodeKind::Program | NodeKind::BlockStatement | NodeKind::StaticBlock
        )
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
