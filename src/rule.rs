//! Rule definition and per-file rule context
//!
//! A rule is a set of listeners: selector strings compiled once when the rule
//! instance is built, each paired with a handler. The dispatcher creates a fresh
//! `State` for every rule at the start of each file and drops it at the end, so
//! handlers keep cross-node information as [`NodeId`]s in that state.

use crate::diagnostic::{Diagnostic, Fix, FixBuilder, Location, Severity, Suggestion};
use crate::scope::{ScopeAnalysis, ScopeResolver};
use crate::selector::{CompiledSelector, Selector, SelectorError};
use crate::tree::{Node, NodeId, Span, SyntaxTree};
use crate::types::{TypeOracle, TypeQuery};
use once_cell::sync::Lazy;
use once_cell::unsync::OnceCell;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

/// Rule category for grouping related rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuleCategory {
    /// Code that is definitely wrong or useless
    Correctness,
    /// Code that is likely wrong or suspicious
    Suspicious,
    /// Idiomatic and consistent style rules
    #[default]
    Style,
    /// Rules that improve runtime performance
    Perf,
    /// Extra strict rules that may have false positives
    Pedantic,
    /// Rules that ban specific patterns or features
    Restriction,
    /// Rules under development (may change or be removed)
    Nursery,
}

impl fmt::Display for RuleCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleCategory::Correctness => write!(f, "correctness"),
            RuleCategory::Suspicious => write!(f, "suspicious"),
            RuleCategory::Style => write!(f, "style"),
            RuleCategory::Perf => write!(f, "perf"),
            RuleCategory::Pedantic => write!(f, "pedantic"),
            RuleCategory::Restriction => write!(f, "restriction"),
            RuleCategory::Nursery => write!(f, "nursery"),
        }
    }
}

impl std::str::FromStr for RuleCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "correctness" => Ok(RuleCategory::Correctness),
            "suspicious" => Ok(RuleCategory::Suspicious),
            "style" => Ok(RuleCategory::Style),
            "perf" | "performance" => Ok(RuleCategory::Perf),
            "pedantic" => Ok(RuleCategory::Pedantic),
            "restriction" => Ok(RuleCategory::Restriction),
            "nursery" | "experimental" => Ok(RuleCategory::Nursery),
            _ => Err(format!("Unknown category: {}", s)),
        }
    }
}

/// Rule stability level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuleStability {
    /// Rule is stable and recommended for use
    #[default]
    Stable,
    /// Rule is in preview/experimental stage
    Preview,
    /// Rule is deprecated and will be removed
    Deprecated,
}

impl fmt::Display for RuleStability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleStability::Stable => write!(f, "stable"),
            RuleStability::Preview => write!(f, "preview"),
            RuleStability::Deprecated => write!(f, "deprecated"),
        }
    }
}

/// Shape of a configuration option
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum OptionKind {
    Boolean,
    String,
    /// String compiled as a regular expression
    Regex,
    StringList,
    /// Object from name regex to `true`/`false` or an explanation string
    PatternMap,
}

/// One entry of a rule's option schema
#[derive(Debug, Clone, Copy, Serialize)]
pub struct OptionSpec {
    pub name: &'static str,
    pub kind: OptionKind,
    /// Default value as JSON text
    pub default: &'static str,
    pub description: &'static str,
}

/// Static description of a rule
#[derive(Debug, Clone, Copy, Serialize)]
pub struct RuleMeta {
    /// Rule ID (e.g., "no-ignored-notifier")
    pub name: &'static str,
    pub description: &'static str,
    pub category: RuleCategory,
    pub stability: RuleStability,
    /// Needs a type oracle for every file it runs on
    pub requires_type_checking: bool,
    pub fixable: bool,
    pub has_suggestions: bool,
    /// Message templates by id; `{{key}}` is replaced from report data
    pub messages: &'static [(&'static str, &'static str)],
    /// Options accepted in configuration
    pub options: &'static [OptionSpec],
    /// Replacement for a deprecated rule
    pub replaced_by: Option<&'static str>,
}

impl RuleMeta {
    /// Template for a message id
    pub fn message(&self, id: &str) -> Option<&'static str> {
        self.messages
            .iter()
            .find(|(key, _)| *key == id)
            .map(|(_, template)| *template)
    }

    pub fn is_deprecated(&self) -> bool {
        self.stability == RuleStability::Deprecated
    }

    /// Get the deprecation warning message
    pub fn deprecation_warning(&self) -> Option<String> {
        if !self.is_deprecated() {
            return None;
        }
        let mut msg = format!("Rule '{}' is deprecated", self.name);
        if let Some(replacement) = self.replaced_by {
            msg.push_str(&format!(". Use '{}' instead", replacement));
        }
        Some(msg)
    }
}

/// Type-erased rule, as seen by the dispatcher
pub trait Rule: Send + Sync {
    fn meta(&self) -> &'static RuleMeta;

    /// Listener selectors; the position is the listener index passed to
    /// [`FileVisitor::visit`]
    fn selectors(&self) -> &[CompiledSelector];

    /// Fresh per-file state bound to this rule
    fn start_file(&self) -> Box<dyn FileVisitor + '_>;
}

/// Receives matched nodes for one rule during one file's traversal
pub trait FileVisitor {
    fn visit(&mut self, listener: usize, node: Node<'_>, cx: &mut RuleContext<'_>);
}

/// Listener callback
pub type Handler<R> = for<'a, 'b> fn(&R, &mut <R as RuleDef>::State, Node<'a>, &mut RuleContext<'b>);

/// A rule written as typed state plus listeners
///
/// Every `RuleDef` is a [`Rule`].
pub trait RuleDef: Send + Sync + Sized + 'static {
    /// Per-file state, created with `Default` for every file
    type State: Default + 'static;

    const META: &'static RuleMeta;

    fn listeners(&self) -> &Listeners<Self>;
}

/// Selector to handler registrations of a rule
pub struct Listeners<R: RuleDef> {
    selectors: Vec<CompiledSelector>,
    handlers: Vec<Handler<R>>,
}

impl<R: RuleDef> Listeners<R> {
    pub fn new() -> Self {
        Self {
            selectors: Vec::new(),
            handlers: Vec::new(),
        }
    }

    /// Register `handler` for nodes matching `selector`
    pub fn on(mut self, selector: &str, handler: Handler<R>) -> Result<Self, SelectorError> {
        self.selectors.push(Selector::parse(selector)?);
        self.handlers.push(handler);
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl<R: RuleDef> Default for Listeners<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: RuleDef> fmt::Debug for Listeners<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.selectors.iter().map(CompiledSelector::source))
            .finish()
    }
}

struct Bound<'r, R: RuleDef> {
    rule: &'r R,
    state: R::State,
}

impl<R: RuleDef> FileVisitor for Bound<'_, R> {
    fn visit(&mut self, listener: usize, node: Node<'_>, cx: &mut RuleContext<'_>) {
        if let Some(handler) = self.rule.listeners().handlers.get(listener) {
            handler(self.rule, &mut self.state, node, cx);
        }
    }
}

impl<R: RuleDef> Rule for R {
    fn meta(&self) -> &'static RuleMeta {
        R::META
    }

    fn selectors(&self) -> &[CompiledSelector] {
        &self.listeners().selectors
    }

    fn start_file(&self) -> Box<dyn FileVisitor + '_> {
        Box::new(Bound {
            rule: self,
            state: R::State::default(),
        })
    }
}

/// Everything rules may read about the file being linted
pub struct FileContext<'t> {
    path: &'t Path,
    tree: &'t SyntaxTree,
    types: TypeQuery<'t>,
    host_scopes: Option<&'t dyn ScopeResolver>,
    analysis: OnceCell<ScopeAnalysis>,
}

impl<'t> FileContext<'t> {
    pub fn new(path: &'t Path, tree: &'t SyntaxTree, types: Option<&'t dyn TypeOracle>) -> Self {
        Self {
            path,
            tree,
            types: TypeQuery::new(types),
            host_scopes: None,
            analysis: OnceCell::new(),
        }
    }

    /// Use a host-provided resolver instead of the built-in analysis
    pub fn with_scopes(mut self, scopes: Option<&'t dyn ScopeResolver>) -> Self {
        self.host_scopes = scopes;
        self
    }

    pub fn path(&self) -> &'t Path {
        self.path
    }

    pub fn tree(&self) -> &'t SyntaxTree {
        self.tree
    }

    pub fn types(&self) -> TypeQuery<'t> {
        self.types
    }

    /// Bindings and references; the built-in analysis runs on first use
    pub fn scopes(&self) -> &dyn ScopeResolver {
        match self.host_scopes {
            Some(scopes) => scopes,
            None => self.analysis.get_or_init(|| ScopeAnalysis::analyze(self.tree)),
        }
    }
}

/// Handle given to listeners: file access plus the diagnostic sink of one rule
pub struct RuleContext<'t> {
    file: &'t FileContext<'t>,
    meta: &'static RuleMeta,
    severity: Severity,
    diagnostics: Vec<Diagnostic>,
}

impl<'t> RuleContext<'t> {
    pub fn new(file: &'t FileContext<'t>, meta: &'static RuleMeta, severity: Severity) -> Self {
        Self {
            file,
            meta,
            severity,
            diagnostics: Vec::new(),
        }
    }

    pub fn rule_name(&self) -> &'static str {
        self.meta.name
    }

    pub fn path(&self) -> &'t Path {
        self.file.path()
    }

    pub fn tree(&self) -> &'t SyntaxTree {
        self.file.tree()
    }

    pub fn node(&self, id: NodeId) -> Node<'t> {
        self.file.tree().node(id)
    }

    pub fn source(&self) -> &'t str {
        self.file.tree().source()
    }

    pub fn types(&self) -> TypeQuery<'t> {
        self.file.types()
    }

    pub fn scopes(&self) -> &'t dyn ScopeResolver {
        self.file.scopes()
    }

    /// Diagnostics reported so far
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    /// Record a diagnostic
    pub fn report(&mut self, report: Report) {
        let tree = self.file.tree();
        let message = self.render(report.message_id, &report.data);
        let location = Location::new(self.file.path().to_path_buf(), tree.lines(), report.span);
        let source_line = tree.lines().line_text(location.line).map(str::to_string);

        let mut diagnostic = Diagnostic::new(
            self.meta.name,
            report.message_id,
            self.severity,
            &message,
            location,
        );
        diagnostic.data = report
            .data
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect::<BTreeMap<_, _>>();
        if let Some(line) = source_line {
            diagnostic = diagnostic.with_source_line(&line);
        }
        if let Some(fix) = report.fix.and_then(|f| self.build_fix(f)) {
            diagnostic = diagnostic.with_fix(fix);
        }
        for (message_id, builder) in report.suggestions {
            if let Some(fix) = self.build_fix(builder) {
                diagnostic = diagnostic.with_suggestion(Suggestion {
                    message_id: message_id.to_string(),
                    message: self.render(message_id, &report.data),
                    fix,
                });
            }
        }

        log::trace!(
            "{} reported '{}' at {}:{}",
            self.meta.name,
            report.message_id,
            diagnostic.location.line,
            diagnostic.location.column
        );
        self.diagnostics.push(diagnostic);
    }

    fn render(&self, message_id: &str, data: &[(&'static str, String)]) -> String {
        match self.meta.message(message_id) {
            Some(template) => interpolate(template, data),
            None => {
                if cfg!(debug_assertions) {
                    panic!("{}: no message with id '{}'", self.meta.name, message_id);
                }
                log::error!("{}: no message with id '{}'", self.meta.name, message_id);
                message_id.to_string()
            }
        }
    }

    fn build_fix(&self, builder: FixBuilder) -> Option<Fix> {
        match builder.build(self.file.tree().source().len()) {
            Ok(fix) => Some(fix),
            Err(err) => {
                if cfg!(debug_assertions) {
                    panic!("{}: invalid fix: {}", self.meta.name, err);
                }
                log::warn!("{}: dropping invalid fix: {}", self.meta.name, err);
                None
            }
        }
    }
}

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").expect("placeholder regex is valid")
});

/// Replace `{{key}}` placeholders; unknown keys stay as written
pub fn interpolate(template: &str, data: &[(&str, String)]) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &regex::Captures| {
            let key = &caps[1];
            match data.iter().find(|(k, _)| *k == key) {
                Some((_, value)) => value.clone(),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// A diagnostic about to be reported
#[derive(Debug, Clone)]
pub struct Report {
    message_id: &'static str,
    span: Span,
    data: Vec<(&'static str, String)>,
    fix: Option<FixBuilder>,
    suggestions: Vec<(&'static str, FixBuilder)>,
}

impl Report {
    /// Report `message_id` on a node
    pub fn new(message_id: &'static str, node: Node<'_>) -> Self {
        Self::at(message_id, node.span())
    }

    /// Report `message_id` on an explicit span
    pub fn at(message_id: &'static str, span: Span) -> Self {
        Self {
            message_id,
            span,
            data: Vec::new(),
            fix: None,
            suggestions: Vec::new(),
        }
    }

    pub fn with_data(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.data.push((key, value.into()));
        self
    }

    /// Attach an automatic fix
    pub fn with_fix(mut self, fix: FixBuilder) -> Self {
        self.fix = Some(fix);
        self
    }

    /// Offer an alternative fix under its own message
    pub fn with_suggestion(mut self, message_id: &'static str, fix: FixBuilder) -> Self {
        self.suggestions.push((message_id, fix));
        self
    }
}
