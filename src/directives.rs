//! Inline disable comments
//!
//! ```text
//! // rxlint-disable-next-line no-ignored-subscription
//! // rxlint-disable-line no-topromise -- migrating in #42
//! /* rxlint-disable just, no-internal */
//! ```
//!
//! `-next-line` and `-line` cover one line; a plain `rxlint-disable` covers the
//! whole file. An empty rule list or `all` disables every rule. Text after
//! `--` or `:` is kept as the reason.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};

static DIRECTIVE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?s)(?://[ \t]*|/\*\s*)rxlint-(disable-next-line|disable-line|disable)\b([^\n]*?)(?:\*/|\n|$)",
    )
    .expect("directive regex is valid")
});

const ALL: &str = "all";

/// Where a directive applies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectiveScope {
    NextLine,
    Line,
    File,
}

/// One parsed disable comment
#[derive(Debug, Clone, PartialEq)]
pub struct Directive {
    pub scope: DirectiveScope,
    /// Line of the comment (1-based)
    pub line: usize,
    /// Rule names; empty means every rule
    pub rules: Vec<String>,
    pub reason: Option<String>,
}

/// Suppression lookup for one file
#[derive(Debug, Default)]
pub struct Directives {
    directives: Vec<Directive>,
    lines: HashMap<usize, HashSet<String>>,
    file_rules: HashSet<String>,
}

impl Directives {
    /// Scan source text for directives
    pub fn parse(source: &str) -> Self {
        let mut parsed = Self::default();
        for caps in DIRECTIVE.captures_iter(source) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            let line = source[..whole.start()].matches('\n').count() + 1;
            let scope = match &caps[1] {
                "disable-next-line" => DirectiveScope::NextLine,
                "disable-line" => DirectiveScope::Line,
                _ => DirectiveScope::File,
            };
            let (rules, reason) = split_reason(caps.get(2).map_or("", |m| m.as_str()));
            parsed.add(Directive {
                scope,
                line,
                rules,
                reason,
            });
        }
        parsed
    }

    fn add(&mut self, directive: Directive) {
        let names: Vec<String> = if directive.rules.is_empty() {
            vec![ALL.to_string()]
        } else {
            directive.rules.clone()
        };
        match directive.scope {
            DirectiveScope::File => self.file_rules.extend(names),
            DirectiveScope::Line => self.lines.entry(directive.line).or_default().extend(names),
            DirectiveScope::NextLine => self
                .lines
                .entry(directive.line + 1)
                .or_default()
                .extend(names),
        }
        self.directives.push(directive);
    }

    /// True if diagnostics of `rule` on `line` are suppressed
    pub fn is_disabled(&self, rule: &str, line: usize) -> bool {
        self.is_disabled_for_file(rule)
            || self
                .lines
                .get(&line)
                .is_some_and(|rules| rules.contains(ALL) || rules.contains(rule))
    }

    pub fn is_disabled_for_file(&self, rule: &str) -> bool {
        self.file_rules.contains(ALL) || self.file_rules.contains(rule)
    }

    /// Reason given by the directive covering `rule` on `line`
    pub fn reason(&self, rule: &str, line: usize) -> Option<&str> {
        self.directives
            .iter()
            .filter(|d| {
                let covers_line = match d.scope {
                    DirectiveScope::File => true,
                    DirectiveScope::Line => d.line == line,
                    DirectiveScope::NextLine => d.line + 1 == line,
                };
                covers_line && (d.rules.is_empty() || d.rules.iter().any(|r| r == rule || r == ALL))
            })
            .find_map(|d| d.reason.as_deref())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Directive> {
        self.directives.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.directives.is_empty()
    }
}

fn split_reason(text: &str) -> (Vec<String>, Option<String>) {
    let text = text.trim();
    let (list, reason) = match text.find("--").or_else(|| text.find(':')) {
        Some(at) => {
            let separator = if text[at..].starts_with("--") { 2 } else { 1 };
            let reason = text[at + separator..].trim();
            (&text[..at], (!reason.is_empty()).then(|| reason.to_string()))
        }
        None => (text, None),
    };
    let rules = list
        .split(',')
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(str::to_string)
        .collect();
    (rules, reason)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_next_line_and_line() {
        let source = "// rxlint-disable-next-line just, no-internal\nof(1);\nof(2); // rxlint-disable-line\n";
        let directives = Directives::parse(source);
        assert!(directives.is_disabled("just", 2));
        assert!(directives.is_disabled("no-internal", 2));
        assert!(!directives.is_disabled("no-index", 2));
        assert!(directives.is_disabled("no-index", 3));
        assert!(!directives.is_disabled("just", 1));
    }

    #[test]
    fn test_block_comment_disables_file() {
        let directives = Directives::parse("/* rxlint-disable no-sharereplay */\nx;\ny;");
        assert!(directives.is_disabled_for_file("no-sharereplay"));
        assert!(directives.is_disabled("no-sharereplay", 3));
        assert!(!directives.is_disabled("just", 3));

        let directives = Directives::parse("/* rxlint-disable */");
        assert!(directives.is_disabled("anything", 10));
    }

    #[test]
    fn test_reasons() {
        let source = "x; // rxlint-disable-line no-topromise -- migrating later\n// rxlint-disable-next-line just: legacy code\ny;";
        let directives = Directives::parse(source);
        assert_eq!(directives.reason("no-topromise", 1), Some("migrating later"));
        assert_eq!(directives.reason("just", 3), Some("legacy code"));
        assert_eq!(directives.reason("just", 1), None);

        let first = directives.iter().next().unwrap();
        assert_eq!(first.rules, vec!["no-topromise".to_string()]);
        assert_eq!(first.scope, DirectiveScope::Line);
    }

    #[test]
    fn test_plain_comments_ignored() {
        let directives = Directives::parse("// rxlint is great\nconst a = 1;");
        assert!(directives.is_empty());
        assert!(!directives.is_disabled("just", 2));
    }
}
