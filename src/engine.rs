//! Core linter engine
//!
//! Each file is walked exactly once. Listeners of every configured rule are
//! indexed by the node kinds their selector can match; on entering a node the
//! enter listeners for its kind are tested in registration order, and after
//! its children the `:exit` listeners are. Rule state lives for one file.

use crate::config::{Config, ConfigError, EngineConfig};
use crate::diagnostic::{Diagnostic, Severity};
use crate::directives::Directives;
use crate::registry;
use crate::rule::{FileContext, FileVisitor, Rule, RuleContext};
use crate::scope::ScopeResolver;
use crate::selector::CompiledSelector;
use crate::tree::{Node, NodeId, NodeKind, SyntaxTree};
use crate::types::TypeOracle;
use rayon::prelude::*;
use std::any::Any;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use thiserror::Error;

/// A rule that could not run (or stopped running) on a file
#[derive(Debug, Clone, Error, PartialEq)]
pub enum LintError {
    #[error("Rule '{rule}' requires type information, which is not available for {}", file.display())]
    TypeInformationRequired { rule: String, file: PathBuf },

    #[error("Rule '{rule}' panicked on {}: {message}", file.display())]
    RulePanicked {
        rule: String,
        file: PathBuf,
        message: String,
    },
}

/// Per-rule timing statistics
#[derive(Debug, Clone, Default)]
pub struct RuleTiming {
    /// Rule ID
    pub rule_id: String,
    /// Total time spent matching and running listeners
    pub total_time: Duration,
    /// Number of selector tests
    pub evaluation_count: usize,
    /// Number of listener invocations
    pub match_count: usize,
}

impl RuleTiming {
    /// Create a new timing entry
    pub fn new(rule_id: &str) -> Self {
        Self {
            rule_id: rule_id.to_string(),
            ..Default::default()
        }
    }

    /// Average time per evaluation
    pub fn avg_time(&self) -> Duration {
        if self.evaluation_count > 0 {
            self.total_time / self.evaluation_count as u32
        } else {
            Duration::ZERO
        }
    }

    fn add(&mut self, other: &RuleTiming) {
        self.total_time += other.total_time;
        self.evaluation_count += other.evaluation_count;
        self.match_count += other.match_count;
    }
}

/// A file handed over by the host
pub struct SourceFile {
    pub path: PathBuf,
    pub tree: SyntaxTree,
    types: Option<Box<dyn TypeOracle>>,
    scopes: Option<Box<dyn ScopeResolver>>,
}

impl SourceFile {
    pub fn new(path: impl Into<PathBuf>, tree: SyntaxTree) -> Self {
        Self {
            path: path.into(),
            tree,
            types: None,
            scopes: None,
        }
    }

    /// Attach the type oracle for this file
    pub fn with_types(mut self, types: impl TypeOracle + 'static) -> Self {
        self.types = Some(Box::new(types));
        self
    }

    /// Replace the built-in scope analysis
    pub fn with_scopes(mut self, scopes: impl ScopeResolver + 'static) -> Self {
        self.scopes = Some(Box::new(scopes));
        self
    }

    pub fn types(&self) -> Option<&dyn TypeOracle> {
        self.types.as_deref()
    }

    pub fn scopes(&self) -> Option<&dyn ScopeResolver> {
        self.scopes.as_deref()
    }

    pub fn has_types(&self) -> bool {
        self.types.is_some()
    }
}

/// Outcome of linting one file
#[derive(Debug, Default)]
pub struct FileResult {
    pub path: PathBuf,
    /// Diagnostics ordered by position
    pub diagnostics: Vec<Diagnostic>,
    /// Rules skipped or stopped on this file
    pub errors: Vec<LintError>,
    /// Diagnostics dropped by inline directives
    pub suppressed: usize,
    pub rule_timings: HashMap<String, RuleTiming>,
}

impl FileResult {
    pub fn error_count(&self) -> usize {
        self.count(Severity::Error)
    }

    pub fn warning_count(&self) -> usize {
        self.count(Severity::Warning)
    }

    fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }
}

/// Result of linting operation
#[derive(Debug, Default)]
pub struct LintResult {
    /// All diagnostics
    pub diagnostics: Vec<Diagnostic>,

    /// Rules that could not run
    pub errors: Vec<LintError>,

    /// Files processed
    pub files_processed: usize,

    /// Files with errors
    pub files_with_errors: usize,

    /// Files with warnings
    pub files_with_warnings: usize,

    /// Total errors
    pub error_count: usize,

    /// Total warnings
    pub warning_count: usize,

    /// Total info messages
    pub info_count: usize,

    /// Diagnostics dropped by inline directives
    pub suppressed_count: usize,

    /// Processing duration
    pub duration: Duration,

    /// Per-rule timing statistics (rule_id -> timing)
    pub rule_timings: HashMap<String, RuleTiming>,
}

impl From<FileResult> for LintResult {
    fn from(file: FileResult) -> Self {
        let mut result = LintResult {
            files_processed: 1,
            suppressed_count: file.suppressed,
            errors: file.errors,
            rule_timings: file.rule_timings,
            ..LintResult::default()
        };
        for diag in &file.diagnostics {
            match diag.severity {
                Severity::Error => result.error_count += 1,
                Severity::Warning => result.warning_count += 1,
                Severity::Info => result.info_count += 1,
            }
        }
        if result.error_count > 0 {
            result.files_with_errors = 1;
        }
        if result.warning_count > 0 {
            result.files_with_warnings = 1;
        }
        result.diagnostics = file.diagnostics;
        result
    }
}

impl LintResult {
    /// Check if there are any errors
    pub fn has_errors(&self) -> bool {
        self.error_count > 0
    }

    /// Check if there are any warnings
    pub fn has_warnings(&self) -> bool {
        self.warning_count > 0
    }

    /// Check if result is clean (no errors or warnings)
    pub fn is_clean(&self) -> bool {
        self.error_count == 0 && self.warning_count == 0
    }

    /// Get exit code (0 = success, 1 = warnings, 2 = errors)
    pub fn exit_code(&self) -> i32 {
        if self.error_count > 0 || !self.errors.is_empty() {
            2
        } else if self.warning_count > 0 {
            1
        } else {
            0
        }
    }

    /// Merge another result into this one
    pub fn merge(&mut self, other: LintResult) {
        self.diagnostics.extend(other.diagnostics);
        self.errors.extend(other.errors);
        self.files_processed += other.files_processed;
        self.files_with_errors += other.files_with_errors;
        self.files_with_warnings += other.files_with_warnings;
        self.error_count += other.error_count;
        self.warning_count += other.warning_count;
        self.info_count += other.info_count;
        self.suppressed_count += other.suppressed_count;

        for (rule_id, timing) in other.rule_timings {
            self.rule_timings
                .entry(rule_id)
                .or_insert_with(|| RuleTiming::new(&timing.rule_id))
                .add(&timing);
        }
    }

    /// Get rule timings sorted by total time (descending)
    pub fn sorted_timings(&self) -> Vec<&RuleTiming> {
        let mut timings: Vec<_> = self.rule_timings.values().collect();
        timings.sort_by(|a, b| b.total_time.cmp(&a.total_time));
        timings
    }

    /// Format timing statistics as a string
    pub fn format_timings(&self) -> String {
        let mut output = String::new();
        let timings = self.sorted_timings();

        if timings.is_empty() {
            return "No timing data available".to_string();
        }

        output.push_str("Rule Timing Statistics:\n");
        output.push_str(&format!(
            "{:<40} {:>12} {:>12} {:>10} {:>12}\n",
            "Rule ID", "Total", "Avg", "Evals", "Matches"
        ));
        output.push_str(&"-".repeat(90));
        output.push('\n');

        for timing in timings {
            let total_ms = timing.total_time.as_secs_f64() * 1000.0;
            let avg_us = timing.avg_time().as_secs_f64() * 1_000_000.0;

            output.push_str(&format!(
                "{:<40} {:>10.2}ms {:>10.2}µs {:>10} {:>12}\n",
                timing.rule_id, total_ms, avg_us, timing.evaluation_count, timing.match_count
            ));
        }

        output
    }
}

struct ConfiguredRule {
    rule: Box<dyn Rule>,
    severity: Severity,
}

/// The main linter engine
#[derive(Default)]
pub struct Linter {
    rules: Vec<ConfiguredRule>,
    engine: EngineConfig,
}

impl Linter {
    /// A linter without rules
    pub fn new() -> Self {
        Self::default()
    }

    /// Build every rule enabled in the configuration
    ///
    /// Fails on the first unknown rule, bad severity or invalid option.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let mut linter = Self::new().with_engine(config.engine.clone());
        for (name, setting) in &config.rules {
            let Some(severity) = setting.severity(name)? else {
                log::debug!("Rule '{}' is off", name);
                continue;
            };
            let rule = registry::create_rule(name, setting.options())?;
            if let Some(warning) = rule.meta().deprecation_warning() {
                log::warn!("{}", warning);
            }
            log::debug!("Configured rule '{}' at {}", name, severity);
            linter.add_rule(rule, severity);
        }
        Ok(linter)
    }

    pub fn with_engine(mut self, engine: EngineConfig) -> Self {
        self.engine = engine;
        self
    }

    pub fn with_rule(mut self, rule: Box<dyn Rule>, severity: Severity) -> Self {
        self.add_rule(rule, severity);
        self
    }

    pub fn add_rule(&mut self, rule: Box<dyn Rule>, severity: Severity) {
        self.rules.push(ConfiguredRule { rule, severity });
    }

    /// Names of the configured rules, in registration order
    pub fn rule_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.rules.iter().map(|r| r.rule.meta().name)
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Lint multiple files
    pub fn lint(&self, files: &[SourceFile]) -> LintResult {
        let start = Instant::now();

        let pool = if self.engine.parallel && files.len() > 1 {
            let threads = if self.engine.jobs > 0 {
                self.engine.jobs
            } else {
                num_cpus::get()
            };
            match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
                Ok(pool) => Some(pool),
                Err(err) => {
                    log::warn!("Falling back to sequential linting: {}", err);
                    None
                }
            }
        } else {
            None
        };

        let results: Vec<FileResult> = match pool {
            Some(pool) => pool.install(|| files.par_iter().map(|f| self.lint_file(f)).collect()),
            None => files.iter().map(|f| self.lint_file(f)).collect(),
        };

        let mut combined = LintResult::default();
        for result in results {
            combined.merge(result.into());
        }

        combined.duration = start.elapsed();
        combined
    }

    /// Lint a single file
    pub fn lint_file(&self, file: &SourceFile) -> FileResult {
        log::debug!("Linting {}", file.path.display());
        let mut result = FileResult {
            path: file.path.clone(),
            ..FileResult::default()
        };

        let directives = Directives::parse(file.tree.source());
        let context = FileContext::new(&file.path, &file.tree, file.types()).with_scopes(file.scopes());

        let mut active = Vec::new();
        for configured in &self.rules {
            let meta = configured.rule.meta();
            if meta.requires_type_checking && !file.has_types() {
                log::warn!(
                    "Skipping '{}' on {}: no type information",
                    meta.name,
                    file.path.display()
                );
                result.errors.push(LintError::TypeInformationRequired {
                    rule: meta.name.to_string(),
                    file: file.path.clone(),
                });
                continue;
            }
            if directives.is_disabled_for_file(meta.name) {
                log::debug!("'{}' disabled for {}", meta.name, file.path.display());
                continue;
            }
            active.push(configured);
        }

        let mut runs: Vec<RuleRun<'_>> = active
            .iter()
            .map(|configured| RuleRun {
                visitor: configured.rule.start_file(),
                cx: RuleContext::new(&context, configured.rule.meta(), configured.severity),
                timing: RuleTiming::new(configured.rule.meta().name),
                failed: false,
            })
            .collect();

        let mut dispatch = Dispatch::new(active.iter().map(|c| c.rule.as_ref()));
        walk(&file.tree, |node, phase| {
            for &(rule, listener) in dispatch.candidates(node.kind(), phase) {
                let run = &mut runs[rule];
                if run.failed {
                    continue;
                }
                let started = Instant::now();
                run.timing.evaluation_count += 1;
                let selector = &active[rule].rule.selectors()[listener];
                if selector.matches(node) {
                    run.timing.match_count += 1;
                    log::trace!(
                        "{} '{}' on {} {}",
                        run.timing.rule_id,
                        selector.source(),
                        node.kind(),
                        node.id()
                    );
                    let visitor = &mut run.visitor;
                    let cx = &mut run.cx;
                    let outcome =
                        panic::catch_unwind(AssertUnwindSafe(|| visitor.visit(listener, node, cx)));
                    if let Err(payload) = outcome {
                        let message = panic_message(payload.as_ref());
                        log::error!(
                            "Rule '{}' panicked on {}: {}",
                            run.timing.rule_id,
                            file.path.display(),
                            message
                        );
                        result.errors.push(LintError::RulePanicked {
                            rule: run.timing.rule_id.clone(),
                            file: file.path.clone(),
                            message,
                        });
                        run.failed = true;
                    }
                }
                run.timing.total_time += started.elapsed();
            }
        });

        for run in runs {
            result
                .rule_timings
                .insert(run.timing.rule_id.clone(), run.timing);
            for diagnostic in run.cx.into_diagnostics() {
                if directives.is_disabled(&diagnostic.rule_id, diagnostic.location.line) {
                    result.suppressed += 1;
                } else {
                    result.diagnostics.push(diagnostic);
                }
            }
        }
        result.diagnostics.sort_by_key(|d| d.location.span.start);
        result
    }
}

struct RuleRun<'a> {
    visitor: Box<dyn FileVisitor + 'a>,
    cx: RuleContext<'a>,
    timing: RuleTiming,
    failed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Phase {
    Enter,
    Exit,
}

/// Pre-order enter, post-order exit; children in source order
fn walk<'t>(tree: &'t SyntaxTree, mut visit: impl FnMut(Node<'t>, Phase)) {
    let mut stack: Vec<(NodeId, Phase)> = vec![(tree.root().id(), Phase::Enter)];
    while let Some((id, phase)) = stack.pop() {
        let node = tree.node(id);
        visit(node, phase);
        if phase == Phase::Enter {
            stack.push((id, Phase::Exit));
            stack.extend(node.children().ids().rev().map(|c| (c, Phase::Enter)));
        }
    }
}

/// Listener lookup by node kind, built lazily per kind
struct Dispatch<'r> {
    listeners: Vec<(usize, usize, &'r CompiledSelector)>,
    by_kind: HashMap<(NodeKind, Phase), Vec<(usize, usize)>>,
}

impl<'r> Dispatch<'r> {
    fn new(rules: impl Iterator<Item = &'r dyn Rule>) -> Self {
        let listeners = rules
            .enumerate()
            .flat_map(|(rule, r)| {
                r.selectors()
                    .iter()
                    .enumerate()
                    .map(move |(listener, selector)| (rule, listener, selector))
            })
            .collect();
        Self {
            listeners,
            by_kind: HashMap::new(),
        }
    }

    fn candidates(&mut self, kind: NodeKind, phase: Phase) -> &[(usize, usize)] {
        let listeners = &self.listeners;
        self.by_kind.entry((kind, phase)).or_insert_with(|| {
            listeners
                .iter()
                .filter(|(_, _, selector)| {
                    (phase == Phase::Exit) == selector.is_exit()
                        && selector
                            .subject_kinds()
                            .is_none_or(|kinds| kinds.contains(&kind))
                })
                .map(|&(rule, listener, _)| (rule, listener))
                .collect()
        })
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
