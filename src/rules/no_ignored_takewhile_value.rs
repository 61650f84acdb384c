//! Require the `takeWhile` predicate to use its value

use super::{no_options, Configurable};
use crate::config::ConfigError;
use crate::rule::{Listeners, Report, RuleCategory, RuleContext, RuleDef, RuleMeta, RuleStability};
use crate::tree::{Node, NodeKind};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value as Json;

static RXJS_IMPORT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^rxjs(/|$)").expect("import pattern is valid"));

pub struct NoIgnoredTakewhileValue {
    listeners: Listeners<Self>,
}

impl NoIgnoredTakewhileValue {
    fn check_predicate(&self, _: &mut (), predicate: Node<'_>, cx: &mut RuleContext<'_>) {
        if predicate.field_name() != Some("arguments") {
            return;
        }
        let Some(callee) = predicate.parent().and_then(|call| call.child("callee")) else {
            return;
        };
        let from_rxjs = cx
            .scopes()
            .import_source(callee.id())
            .is_some_and(|source| RXJS_IMPORT.is_match(source));
        if !from_rxjs {
            return;
        }
        let ignored = match predicate.list("params").first() {
            None => true,
            Some(param) if param.is(NodeKind::Identifier) => {
                cx.scopes().references(param.id()).is_empty()
            }
            // Destructured values count as used
            Some(_) => false,
        };
        if ignored {
            cx.report(Report::new("forbidden", callee));
        }
    }
}

impl Configurable for NoIgnoredTakewhileValue {
    fn from_options(options: &Json) -> Result<Self, ConfigError> {
        no_options(Self::META.name, options)?;
        Ok(Self {
            listeners: Listeners::<Self>::new().on(
                "CallExpression[callee.name='takeWhile'] > :matches(ArrowFunctionExpression, FunctionExpression)",
                Self::check_predicate,
            )?,
        })
    }
}

impl RuleDef for NoIgnoredTakewhileValue {
    type State = ();

    const META: &'static RuleMeta = &RuleMeta {
        name: "no-ignored-takewhile-value",
        description: "Forbids ignoring the value within `takeWhile`.",
        category: RuleCategory::Suspicious,
        stability: RuleStability::Stable,
        requires_type_checking: false,
        fixable: false,
        has_suggestions: false,
        messages: &[("forbidden", "Ignoring the value within takeWhile is forbidden.")],
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

    fn take_while(predicate: Js) -> Js {
        expr_stmt(method(
            ident("source"),
            "pipe",
            vec![call(ident("takeWhile"), vec![predicate])],
        ))
    }

    #[test]
    fn test_ignored_values() {
        let linted = lint_default::<NoIgnoredTakewhileValue>(program(vec![
            import_decl(vec![import_spec("takeWhile")], "rxjs/operators"),
            take_while(arrow(vec![ident("value")], ident("flag"))),
            take_while(arrow(vec![], ident("flag"))),
            take_while(arrow(vec![ident("value")], binary(ident("value"), ">", number(0.0)))),
            take_while(function_expr(
                vec![object_pattern(&["done"])],
                block(vec![return_stmt(Some(ident("flag")))]),
            )),
        ]));
        assert_eq!(linted.reported(), vec!["takeWhile", "takeWhile"]);
        assert_eq!(
            linted.messages()[0],
            "Ignoring the value within takeWhile is forbidden."
        );
    }

    #[test]
    fn test_other_take_while_ignored() {
        let linted = lint_default::<NoIgnoredTakewhileValue>(program(vec![
            import_decl(vec![import_spec("takeWhile")], "lodash"),
            take_while(arrow(vec![], ident("flag"))),
        ]));
        assert_eq!(linted.count(), 0);
    }
}
