//! Forbid imports from `rxjs/internal`

use super::{no_options, Configurable};
use crate::config::ConfigError;
use crate::diagnostic::FixBuilder;
use crate::rule::{Listeners, Report, RuleCategory, RuleContext, RuleDef, RuleMeta, RuleStability};
use crate::tree::Node;
use serde_json::Value as Json;

pub struct NoInternal {
    listeners: Listeners<Self>,
}

/// Public location for an internal module specifier, keeping its quotes
fn replacement(raw: &str) -> Option<String> {
    let raw = raw.trim_start();
    let quote = raw.chars().next().filter(|c| *c == '\'' || *c == '"')?;
    let path = &raw[1..];
    let public = if path.starts_with("rxjs/internal/ajax") {
        "rxjs/ajax"
    } else if path.starts_with("rxjs/internal/operators") {
        "rxjs/operators"
    } else if path.starts_with("rxjs/internal/testing") {
        "rxjs/testing"
    } else if path.to_ascii_lowercase().starts_with("rxjs/internal/websocket") {
        "rxjs/webSocket"
    } else {
        "rxjs"
    };
    Some(format!("{quote}{public}{quote}"))
}

impl NoInternal {
    fn check_source(&self, _: &mut (), source: Node<'_>, cx: &mut RuleContext<'_>) {
        let report = Report::new("forbidden", source);
        let report = match replacement(source.text()) {
            Some(text) => {
                let fix = FixBuilder::new().replace_node(source, text);
                report.with_fix(fix.clone()).with_suggestion("suggest", fix)
            }
            None => report,
        };
        cx.report(report);
    }
}

impl Configurable for NoInternal {
    fn from_options(options: &Json) -> Result<Self, ConfigError> {
        no_options(Self::META.name, options)?;
        Ok(Self {
            listeners: Listeners::<Self>::new().on(
                r"ImportDeclaration > Literal.source[value=/^rxjs\/internal/]",
                Self::check_source,
            )?,
        })
    }
}

impl RuleDef for NoInternal {
    type State = ();

    const META: &'static RuleMeta = &RuleMeta {
        name: "no-internal",
        description: "Forbids the importation of internals.",
        category: RuleCategory::Correctness,
        stability: RuleStability::Stable,
        requires_type_checking: false,
        fixable: true,
        has_suggestions: true,
        messages: &[
            ("forbidden", "RxJS imports from internal are forbidden."),
            ("suggest", "Import from a non-internal location."),
        ],
        options: &[],
        replaced_by: None,
    };

    fn listeners(&self) -> &Listeners<Self> {
        &self.listeners
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::test_util::*;
    use crate::tree::synth::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_replacement_locations() {
        assert_eq!(replacement("\"rxjs/internal/observable/of\"").as_deref(), Some("\"rxjs\""));
        assert_eq!(
            replacement("'rxjs/internal/operators/map'").as_deref(),
            Some("'rxjs/operators'")
        );
        assert_eq!(
            replacement("\"rxjs/internal/observable/dom/WebSocketSubject\"").as_deref(),
            Some("\"rxjs\"")
        );
        assert_eq!(
            replacement("\"rxjs/internal/websocket/webSocket\"").as_deref(),
            Some("\"rxjs/webSocket\"")
        );
        assert_eq!(replacement("rxjs/internal"), None);
    }

    #[test]
    fn test_fix_and_suggestion() {
        let linted = lint_default::<NoInternal>(program(vec![
            import_decl(vec![import_spec("of")], "rxjs/internal/observable/of"),
            import_with(vec![import_spec("map")], quoted("rxjs/internal/operators/map", '\'')),
            import_decl(vec![import_spec("of")], "rxjs"),
        ]));
        assert_eq!(linted.count(), 2);
        assert_eq!(linted.messages()[0], "RxJS imports from internal are forbidden.");
        assert_eq!(
            linted.diagnostics[0].suggestions[0].message,
            "Import from a non-internal location."
        );

        let expected = program(vec![
            import_decl(vec![import_spec("of")], "rxjs"),
            import_with(vec![import_spec("map")], quoted("rxjs/operators", '\'')),
            import_decl(vec![import_spec("of")], "rxjs"),
        ]);
        assert_eq!(linted.fixed(), expected.source());
        assert_eq!(
            linted.suggested(1),
            program(vec![
                import_decl(vec![import_spec("of")], "rxjs/internal/observable/of"),
                import_with(vec![import_spec("map")], quoted("rxjs/operators", '\'')),
                import_decl(vec![import_spec("of")], "rxjs"),
            ])
            .source()
        );
        assert_eq!(lint_default::<NoInternal>(expected).count(), 0);
    }
}
