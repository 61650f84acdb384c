//! Applying fixes to source text
//!
//! Fixes are applied in one pass, ordered by position. A fix whose range
//! overlaps one already taken is skipped; re-linting the output and fixing
//! again picks it up. Suggestions are never applied here.

use crate::diagnostic::{Diagnostic, Fix};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Result of applying the fixes of one text
#[derive(Debug, Clone, PartialEq)]
pub struct FixOutput {
    /// Text after all applied fixes
    pub output: String,
    /// Rule IDs of the applied fixes, in application order
    pub applied: Vec<String>,
    /// Number of fixes skipped because they overlapped an applied one
    pub skipped: usize,
}

impl FixOutput {
    pub fn is_changed(&self) -> bool {
        !self.applied.is_empty()
    }
}

/// Apply every non-conflicting fix carried by `diagnostics` to `source`
pub fn apply_fixes(source: &str, diagnostics: &[Diagnostic]) -> FixOutput {
    let mut fixes: Vec<(&str, &Fix)> = diagnostics
        .iter()
        .filter_map(|d| d.fix.as_ref().map(|fix| (d.rule_id.as_str(), fix)))
        .collect();
    fixes.sort_by_key(|(_, fix)| (fix.range().start, fix.range().end));

    let mut output = String::with_capacity(source.len());
    let mut applied = Vec::new();
    let mut skipped = 0;
    let mut cursor = 0;
    // Insertions at the end of the previous fix must not land before it
    let mut last_end: Option<usize> = None;

    for (rule_id, fix) in fixes {
        let range = fix.range();
        let conflicts = match last_end {
            Some(end) => range.start < end || (range.start == end && range.is_empty()),
            None => false,
        };
        if conflicts || range.end > source.len() {
            log::debug!("Skipping overlapping fix from '{}' at {}", rule_id, range.start);
            skipped += 1;
            continue;
        }
        for edit in fix.edits() {
            output.push_str(source.get(cursor..edit.span.start).unwrap_or(""));
            output.push_str(&edit.replacement);
            cursor = edit.span.end;
        }
        last_end = Some(range.end);
        applied.push(rule_id.to_string());
    }
    output.push_str(source.get(cursor..).unwrap_or(""));

    FixOutput {
        output,
        applied,
        skipped,
    }
}

/// Summary of a fixing run over several files
#[derive(Debug, Default)]
pub struct FixResult {
    /// Number of files modified
    pub files_modified: usize,
    /// Number of fixes applied
    pub fixes_applied: usize,
    /// Number of fixes skipped because of conflicts
    pub fixes_skipped: usize,
    /// Errors encountered
    pub errors: Vec<String>,
    /// Diff output (if diff mode enabled)
    pub diffs: HashMap<PathBuf, String>,
}

/// Fix mode options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FixMode {
    /// Write fixed files
    #[default]
    Apply,
    /// Diff mode - show changes without applying
    Diff,
}

/// Applies collected fixes to files on disk
#[derive(Debug, Default)]
pub struct Fixer {
    mode: FixMode,
    fixes_by_file: HashMap<PathBuf, Vec<Diagnostic>>,
}

impl Fixer {
    /// Create a new fixer
    pub fn new(mode: FixMode) -> Self {
        Self {
            mode,
            fixes_by_file: HashMap::new(),
        }
    }

    pub fn mode(&self) -> FixMode {
        self.mode
    }

    /// Collect fixable diagnostics, grouped by file
    pub fn collect_from_diagnostics(&mut self, diagnostics: &[Diagnostic]) {
        for diag in diagnostics.iter().filter(|d| d.has_fix()) {
            self.fixes_by_file
                .entry(diag.location.file.clone())
                .or_default()
                .push(diag.clone());
        }
    }

    /// Number of fixes waiting to be applied
    pub fn pending_count(&self) -> usize {
        self.fixes_by_file.values().map(Vec::len).sum()
    }

    /// Apply the collected fixes
    ///
    /// Files are read from disk and must not have changed since linting.
    pub fn apply_all(&self) -> FixResult {
        let mut result = FixResult::default();
        let mut files: Vec<_> = self.fixes_by_file.iter().collect();
        files.sort_by(|a, b| a.0.cmp(b.0));

        for (path, diagnostics) in files {
            let source = match std::fs::read_to_string(path) {
                Ok(source) => source,
                Err(e) => {
                    result
                        .errors
                        .push(format!("Failed to read {}: {}", path.display(), e));
                    continue;
                }
            };
            let fixed = apply_fixes(&source, diagnostics);
            result.fixes_applied += fixed.applied.len();
            result.fixes_skipped += fixed.skipped;
            if !fixed.is_changed() {
                continue;
            }

            match self.mode {
                FixMode::Apply => match std::fs::write(path, &fixed.output) {
                    Ok(()) => {
                        log::debug!("Applied {} fixes to {}", fixed.applied.len(), path.display());
                        result.files_modified += 1;
                    }
                    Err(e) => result
                        .errors
                        .push(format!("Failed to write {}: {}", path.display(), e)),
                },
                FixMode::Diff => {
                    result.diffs.insert(
                        path.clone(),
                        generate_unified_diff(path, &source, &fixed.output),
                    );
                }
            }
        }

        result
    }

    /// Concatenated diffs of a diff-mode run
    pub fn format_diffs(&self, result: &FixResult) -> String {
        let mut files: Vec<_> = result.diffs.iter().collect();
        files.sort_by(|a, b| a.0.cmp(b.0));

        let mut output = String::new();
        for (file, diff) in files {
            output.push_str(&format!(
                "diff --rxlint a/{} b/{}\n",
                file.display(),
                file.display()
            ));
            output.push_str(diff);
            output.push('\n');
        }
        output
    }
}

/// Generate a unified diff between two strings
fn generate_unified_diff(file: &Path, original: &str, modified: &str) -> String {
    let mut diff = String::new();

    let original_lines: Vec<&str> = original.lines().collect();
    let modified_lines: Vec<&str> = modified.lines().collect();

    diff.push_str(&format!("--- a/{}\n", file.display()));
    diff.push_str(&format!("+++ b/{}\n", file.display()));

    // Line-by-line; fixes rarely change the line count
    let max_len = original_lines.len().max(modified_lines.len());
    let mut hunk_start = None;
    let mut hunk_lines: Vec<String> = Vec::new();

    for i in 0..max_len {
        match (original_lines.get(i), modified_lines.get(i)) {
            (Some(o), Some(m)) if o == m => {
                if hunk_start.is_some() {
                    hunk_lines.push(format!(" {}", o));
                }
            }
            (o, m) => {
                if hunk_start.is_none() {
                    hunk_start = Some(i + 1);
                    if let Some(ctx) = i.checked_sub(1).and_then(|p| original_lines.get(p)) {
                        hunk_lines.push(format!(" {}", ctx));
                    }
                }
                if let Some(o) = o {
                    hunk_lines.push(format!("-{}", o));
                }
                if let Some(m) = m {
                    hunk_lines.push(format!("+{}", m));
                }
            }
        }
    }

    if let Some(start) = hunk_start {
        diff.push_str(&format!(
            "@@ -{},{} +{},{} @@\n",
            start,
            original_lines.len(),
            start,
            modified_lines.len()
        ));
        for line in hunk_lines {
            diff.push_str(&line);
            diff.push('\n');
        }
    }

    diff
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::{FixBuilder, Location, Severity};
    use crate::tree::{LineIndex, Span};
    use pretty_assertions::assert_eq;

    fn diagnostic(file: &Path, source: &str, rule: &str, fix: FixBuilder) -> Diagnostic {
        let fix = fix.build(source.len()).unwrap();
        let location = Location::new(file.to_path_buf(), &LineIndex::new(source), fix.range());
        Diagnostic::new(rule, "id", Severity::Warning, "message", location).with_fix(fix)
    }

    #[test]
    fn test_apply_non_overlapping_fixes() {
        let source = "of(a); of(b);";
        let path = Path::new("a.ts");
        let diagnostics = vec![
            diagnostic(path, source, "second", FixBuilder::new().replace(Span::new(7, 9), "just")),
            diagnostic(path, source, "first", FixBuilder::new().replace(Span::new(0, 2), "just")),
        ];
        let fixed = apply_fixes(source, &diagnostics);
        assert_eq!(fixed.output, "just(a); just(b);");
        assert_eq!(fixed.applied, vec!["first".to_string(), "second".to_string()]);
        assert_eq!(fixed.skipped, 0);
    }

    #[test]
    fn test_overlapping_fix_is_skipped() {
        let source = "source.subscribe(a, b);";
        let path = Path::new("a.ts");
        let diagnostics = vec![
            diagnostic(path, source, "wide", FixBuilder::new().replace(Span::new(0, 22), "x")),
            diagnostic(path, source, "narrow", FixBuilder::new().replace(Span::new(17, 18), "y")),
        ];
        let fixed = apply_fixes(source, &diagnostics);
        assert_eq!(fixed.output, "x;");
        assert_eq!(fixed.skipped, 1);
    }

    #[test]
    fn test_insert_at_start_of_file() {
        let source = "of(1);";
        let path = Path::new("a.ts");
        let diagnostics = vec![diagnostic(
            path,
            source,
            "macro",
            FixBuilder::new().insert_at(0, "import \"m\";\n"),
        )];
        assert_eq!(apply_fixes(source, &diagnostics).output, "import \"m\";\nof(1);");
    }

    #[test]
    fn test_generate_diff() {
        let original = "line1\nline2\nline3\n";
        let modified = "line1\nmodified\nline3\n";
        let diff = generate_unified_diff(Path::new("test.ts"), original, modified);

        assert!(diff.contains("--- a/test.ts"));
        assert!(diff.contains("+++ b/test.ts"));
        assert!(diff.contains(" line1"));
        assert!(diff.contains("-line2"));
        assert!(diff.contains("+modified"));
    }

    #[test]
    fn test_fixer_writes_or_diffs_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.ts");
        let source = "import { of } from \"rxjs/internal/observable/of\";\n";
        std::fs::write(&path, source).unwrap();
        let diag = diagnostic(
            &path,
            source,
            "no-internal",
            FixBuilder::new().replace(Span::new(19, 48), "\"rxjs\""),
        );

        let mut diff_fixer = Fixer::new(FixMode::Diff);
        diff_fixer.collect_from_diagnostics(std::slice::from_ref(&diag));
        assert_eq!(diff_fixer.pending_count(), 1);
        let result = diff_fixer.apply_all();
        assert_eq!(result.files_modified, 0);
        assert!(diff_fixer.format_diffs(&result).contains("+import { of } from \"rxjs\";"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), source);

        let mut fixer = Fixer::new(FixMode::Apply);
        fixer.collect_from_diagnostics(&[diag]);
        let result = fixer.apply_all();
        assert_eq!(result.files_modified, 1);
        assert_eq!(result.fixes_applied, 1);
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "import { of } from \"rxjs\";\n"
        );
    }
}
