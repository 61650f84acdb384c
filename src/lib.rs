//! rxlint - RxJS lint rules over ESTree syntax trees
//!
//! The host parses TypeScript/JavaScript, then hands over an ESTree-shaped
//! tree, the source text and optionally a type oracle and a scope resolver.
//! rxlint walks the tree once per file, dispatching nodes to the listeners of
//! every enabled rule, and collects diagnostics with optional fixes and
//! suggestions.
//!
//! # Architecture
//!
//! ```text
//! Config -> registry -> Linter -> Dispatch -> Rule listeners -> Diagnostic
//!                          |           |
//!                    SourceFile    Selector matcher
//! ```
//!
//! Rules declare listeners as esquery-style selectors (`selector`), compiled
//! once when the rule is built. The dispatcher (`engine`) visits each node
//! on enter and on exit and runs every listener whose selector matches. Rules
//! that need type information ask the `types` adapter, which answers
//! conservatively when no type is known.
//!
//! # Configuration
//!
//! ```yaml
//! extends: [recommended]
//! rules:
//!   finnish: [error, { functions: false }]
//!   no-unsafe-takeuntil:
//!     severity: warn
//!     options: { alias: [untilDestroyed] }
//! ```

pub mod config;
pub mod diagnostic;
pub mod directives;
pub mod engine;
pub mod fixer;
pub mod registry;
pub mod rule;
pub mod rules;
pub mod scope;
pub mod selector;
pub mod tree;
pub mod types;

// Re-export main types
pub use config::{Config, ConfigError, EngineConfig, RuleSetting};
pub use diagnostic::{Diagnostic, Fix, FixBuilder, FixError, Location, Severity, Suggestion};
pub use directives::Directives;
pub use engine::{FileResult, LintError, LintResult, Linter, RuleTiming, SourceFile};
pub use fixer::{apply_fixes, FixMode, FixOutput, FixResult, Fixer};
pub use rule::{
    Report, Rule, RuleCategory, RuleContext, RuleDef, RuleMeta, RuleStability,
};
pub use scope::{ScopeAnalysis, ScopeResolver};
pub use selector::{CompiledSelector, SelectorError};
pub use tree::{Node, NodeId, NodeKind, Span, SyntaxTree, TreeError};
pub use types::{Type, TypeOracle, TypeTable};
