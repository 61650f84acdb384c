//! Diagnostic types for linting results

use crate::tree::{LineIndex, Node, Span};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use thiserror::Error;

/// Severity level for diagnostics
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational message
    Info,
    /// Warning - potential issue
    #[default]
    Warning,
    /// Error - definite problem
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "info" | "hint" | "note" => Ok(Severity::Info),
            "warning" | "warn" => Ok(Severity::Warning),
            "error" | "err" => Ok(Severity::Error),
            _ => Err(()),
        }
    }
}

/// Source code location
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// File path
    pub file: PathBuf,
    /// Line number (1-based)
    pub line: usize,
    /// Column number (1-based, in characters)
    pub column: usize,
    pub end_line: usize,
    pub end_column: usize,
    /// Byte range in the source text
    pub span: Span,
}

impl Location {
    pub fn new(file: PathBuf, lines: &LineIndex, span: Span) -> Self {
        let (line, column) = lines.line_col(span.start);
        let (end_line, end_column) = lines.line_col(span.end);
        Self {
            file,
            line,
            column,
            end_line,
            end_column,
            span,
        }
    }
}

/// Error building a fix
#[derive(Debug, Error, PartialEq)]
pub enum FixError {
    #[error("Fix has no edits")]
    Empty,

    #[error("Edits {first:?} and {second:?} overlap")]
    Overlap { first: Span, second: Span },

    #[error("Edit {span:?} is outside the source text ({len} bytes)")]
    OutOfBounds { span: Span, len: usize },
}

/// Replace the text of `span` with `replacement`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextEdit {
    pub span: Span,
    pub replacement: String,
}

/// A validated set of non-overlapping edits, ordered by position
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fix {
    edits: Vec<TextEdit>,
}

impl Fix {
    /// Validate and order edits against a source of `source_len` bytes
    pub fn new(mut edits: Vec<TextEdit>, source_len: usize) -> Result<Self, FixError> {
        if edits.is_empty() {
            return Err(FixError::Empty);
        }
        edits.sort_by_key(|e| (e.span.start, e.span.end));
        for edit in &edits {
            if edit.span.start > edit.span.end || edit.span.end > source_len {
                return Err(FixError::OutOfBounds {
                    span: edit.span,
                    len: source_len,
                });
            }
        }
        for pair in edits.windows(2) {
            if pair[1].span.start < pair[0].span.end {
                return Err(FixError::Overlap {
                    first: pair[0].span,
                    second: pair[1].span,
                });
            }
        }
        Ok(Self { edits })
    }

    pub fn edits(&self) -> &[TextEdit] {
        &self.edits
    }

    /// Smallest span covering every edit
    pub fn range(&self) -> Span {
        let start = self.edits.first().map(|e| e.span.start).unwrap_or(0);
        let end = self.edits.iter().map(|e| e.span.end).max().unwrap_or(start);
        Span::new(start, end)
    }

    /// Apply to the text the fix was built for
    pub fn apply(&self, source: &str) -> String {
        let mut out = String::with_capacity(source.len());
        let mut cursor = 0;
        for edit in &self.edits {
            out.push_str(source.get(cursor..edit.span.start).unwrap_or(""));
            out.push_str(&edit.replacement);
            cursor = edit.span.end;
        }
        out.push_str(source.get(cursor..).unwrap_or(""));
        out
    }
}

/// Collects edits for one fix
#[derive(Debug, Default, Clone)]
pub struct FixBuilder {
    edits: Vec<TextEdit>,
}

impl FixBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replace(mut self, span: Span, replacement: impl Into<String>) -> Self {
        self.edits.push(TextEdit {
            span,
            replacement: replacement.into(),
        });
        self
    }

    pub fn replace_node(self, node: Node<'_>, replacement: impl Into<String>) -> Self {
        self.replace(node.span(), replacement)
    }

    pub fn insert_before(self, node: Node<'_>, text: impl Into<String>) -> Self {
        self.replace(Span::empty(node.span().start), text)
    }

    pub fn insert_after(self, node: Node<'_>, text: impl Into<String>) -> Self {
        self.replace(Span::empty(node.span().end), text)
    }

    pub fn insert_at(self, offset: usize, text: impl Into<String>) -> Self {
        self.replace(Span::empty(offset), text)
    }

    pub fn remove(self, span: Span) -> Self {
        self.replace(span, "")
    }

    pub fn build(self, source_len: usize) -> Result<Fix, FixError> {
        Fix::new(self.edits, source_len)
    }
}

/// An alternative fix a user applies explicitly
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub message_id: String,
    pub message: String,
    pub fix: Fix,
}

/// A lint diagnostic (warning, error, etc.)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Rule ID that triggered this diagnostic
    pub rule_id: String,
    /// Stable message identifier from the rule's message table
    pub message_id: String,
    /// Severity level
    pub severity: Severity,
    /// Human-readable message
    pub message: String,
    /// Interpolation data used for the message
    #[serde(default)]
    pub data: BTreeMap<String, String>,
    /// Source location
    pub location: Location,
    /// The source line (for display)
    pub source_line: Option<String>,
    /// Automatic fix
    pub fix: Option<Fix>,
    /// Fixes that need explicit acceptance
    #[serde(default)]
    pub suggestions: Vec<Suggestion>,
}

impl Diagnostic {
    /// Create a new diagnostic
    pub fn new(
        rule_id: &str,
        message_id: &str,
        severity: Severity,
        message: &str,
        location: Location,
    ) -> Self {
        Self {
            rule_id: rule_id.to_string(),
            message_id: message_id.to_string(),
            severity,
            message: message.to_string(),
            data: BTreeMap::new(),
            location,
            source_line: None,
            fix: None,
            suggestions: Vec::new(),
        }
    }

    /// Add source line for display
    pub fn with_source_line(mut self, line: &str) -> Self {
        self.source_line = Some(line.to_string());
        self
    }

    pub fn with_fix(mut self, fix: Fix) -> Self {
        self.fix = Some(fix);
        self
    }

    pub fn with_suggestion(mut self, suggestion: Suggestion) -> Self {
        self.suggestions.push(suggestion);
        self
    }

    /// Check if this diagnostic has a fix
    pub fn has_fix(&self) -> bool {
        self.fix.is_some()
    }

    /// Check if this is an error
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// Check if this is a warning
    pub fn is_warning(&self) -> bool {
        self.severity == Severity::Warning
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn edit(start: usize, end: usize, text: &str) -> TextEdit {
        TextEdit {
            span: Span::new(start, end),
            replacement: text.to_string(),
        }
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Error > Severity::Warning);
        assert!(Severity::Warning > Severity::Info);
    }

    #[test]
    fn test_severity_from_str() {
        assert_eq!("error".parse::<Severity>(), Ok(Severity::Error));
        assert_eq!("warning".parse::<Severity>(), Ok(Severity::Warning));
        assert_eq!("warn".parse::<Severity>(), Ok(Severity::Warning));
        assert_eq!("hint".parse::<Severity>(), Ok(Severity::Info));
        assert!("off".parse::<Severity>().is_err());
    }

    #[test]
    fn test_severity_display() {
        assert_eq!(format!("{}", Severity::Error), "error");
        assert_eq!(format!("{}", Severity::Warning), "warning");
        assert_eq!(format!("{}", Severity::Info), "info");
    }

    #[test]
    fn test_location_from_span() {
        let lines = LineIndex::new("import { of } from \"rxjs\";\nof(1);");
        let loc = Location::new(PathBuf::from("a.ts"), &lines, Span::new(27, 29));
        assert_eq!((loc.line, loc.column), (2, 1));
        assert_eq!((loc.end_line, loc.end_column), (2, 3));
    }

    #[test]
    fn test_fix_orders_edits() {
        let fix = Fix::new(vec![edit(6, 7, "b"), edit(0, 1, "a")], 10).unwrap();
        assert_eq!(fix.edits()[0].span.start, 0);
        assert_eq!(fix.range(), Span::new(0, 7));
        assert_eq!(fix.apply("x.....y..."), "a.....b...");
    }

    #[test]
    fn test_fix_rejects_overlap() {
        let err = Fix::new(vec![edit(0, 4, "a"), edit(3, 5, "b")], 10).unwrap_err();
        assert_eq!(
            err,
            FixError::Overlap {
                first: Span::new(0, 4),
                second: Span::new(3, 5)
            }
        );
    }

    #[test]
    fn test_fix_adjacent_and_insertions_allowed() {
        let fix = Fix::new(
            vec![edit(0, 0, "("), edit(0, 1, "x"), edit(1, 1, ": unknown)")],
            1,
        )
        .unwrap();
        assert_eq!(fix.apply("e"), "(x: unknown)");
    }

    #[test]
    fn test_fix_rejects_out_of_bounds() {
        assert!(matches!(
            Fix::new(vec![edit(2, 12, "")], 10),
            Err(FixError::OutOfBounds { .. })
        ));
        assert_eq!(Fix::new(vec![], 10), Err(FixError::Empty));
    }

    #[test]
    fn test_diagnostic_creation() {
        let loc = Location::default();
        let diag = Diagnostic::new("no-create", "forbidden", Severity::Error, "msg", loc);
        assert_eq!(diag.rule_id, "no-create");
        assert_eq!(diag.message_id, "forbidden");
        assert!(diag.is_error());
        assert!(!diag.is_warning());
        assert!(!diag.has_fix());
    }

    #[test]
    fn test_diagnostic_serializes() {
        let diag = Diagnostic::new("just", "forbidden", Severity::Warning, "Use just alias.", Location::default())
            .with_fix(Fix::new(vec![edit(0, 2, "just")], 2).unwrap());
        let json = serde_json::to_value(&diag).unwrap();
        assert_eq!(json["severity"], "warning");
        assert_eq!(json["fix"]["edits"][0]["replacement"], "just");
    }
}
