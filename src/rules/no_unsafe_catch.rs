//! Forbid `catchError` in effects and epics unless the caught source is returned

use super::{
    compile_regex, is_effect_pipe, is_function_expression, parse_options, Configurable,
    DEFAULT_OBSERVABLE, DEFAULT_OBSERVABLE_JSON,
};
use crate::config::ConfigError;
use crate::rule::{
    Listeners, OptionKind, OptionSpec, Report, RuleCategory, RuleContext, RuleDef, RuleMeta,
    RuleStability,
};
use crate::tree::{Node, NodeKind};
use regex::Regex;
use serde::Deserialize;
use serde_json::Value as Json;

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct Options {
    observable: String,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            observable: DEFAULT_OBSERVABLE.to_string(),
        }
    }
}

pub struct NoUnsafeCatch {
    observable: Regex,
    listeners: Listeners<Self>,
}

impl NoUnsafeCatch {
    fn check_pipe(&self, _: &mut (), pipe: Node<'_>, cx: &mut RuleContext<'_>) {
        if !is_effect_pipe(pipe, &self.observable) || !cx.types().could_be_type(pipe, "Observable")
        {
            return;
        }
        for operator in pipe.list("arguments").iter() {
            if !operator.is(NodeKind::CallExpression) {
                continue;
            }
            let Some(callee) = operator.child("callee").filter(|c| c.is_identifier("catchError"))
            else {
                continue;
            };
            let Some(handler) = operator.list("arguments").first() else {
                continue;
            };
            // (error, caught) => ... may resubscribe to the caught source
            if is_function_expression(handler) && handler.list("params").len() < 2 {
                cx.report(Report::new("forbidden", callee));
            }
        }
    }
}

impl Configurable for NoUnsafeCatch {
    fn from_options(options: &Json) -> Result<Self, ConfigError> {
        let options: Options = parse_options(Self::META.name, options)?;
        Ok(Self {
            observable: compile_regex(Self::META.name, &options.observable)?,
            listeners: Listeners::<Self>::new()
                .on("CallExpression[callee.property.name='pipe']", Self::check_pipe)?,
        })
    }
}

impl RuleDef for NoUnsafeCatch {
    type State = ();

    const META: &'static RuleMeta = &RuleMeta {
        name: "no-unsafe-catch",
        description: "Forbids unsafe `catchError` usage in effects and epics.",
        category: RuleCategory::Correctness,
        stability: RuleStability::Stable,
        requires_type_checking: true,
        fixable: false,
        has_suggestions: false,
        messages: &[(
            "forbidden",
            "Unsafe catchError usage in effects and epics are forbidden.",
        )],
        options: &[OptionSpec {
            name: "observable",
            kind: OptionKind::Regex,
            default: DEFAULT_OBSERVABLE_JSON,
            description: "Pattern for the action stream names of effects and epics",
        }],
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
    use serde_json::json;

    fn effect(receiver: Js, handler: Js) -> Js {
        expr_stmt(
            method(
                receiver,
                "pipe",
                vec![
                    call(ident("switchMap"), vec![ident("load")]),
                    call(ident("catchError"), vec![handler]),
                ],
            )
            .typed(observable(number_type())),
        )
    }

    #[test]
    fn test_unsafe_catch() {
        let linted = lint_default::<NoUnsafeCatch>(program(vec![
            effect(
                ident("actions$"),
                arrow(vec![ident("error")], call(ident("of"), vec![ident("error")])),
            ),
            effect(
                member(this(), "actions"),
                arrow(vec![], ident("EMPTY")),
            ),
            effect(
                ident("actions$"),
                arrow(vec![ident("error"), ident("caught")], ident("caught")),
            ),
            effect(ident("values$"), arrow(vec![ident("error")], ident("error"))),
        ]));
        assert_eq!(linted.reported(), vec!["catchError", "catchError"]);
    }

    #[test]
    fn test_custom_observable_pattern() {
        let linted = lint::<NoUnsafeCatch>(
            json!([{ "observable": "^events$" }]),
            program(vec![
                effect(ident("events"), arrow(vec![ident("error")], ident("error"))),
                effect(ident("actions$"), arrow(vec![ident("error")], ident("error"))),
            ]),
        );
        assert_eq!(linted.count(), 1);
        assert_eq!(
            linted.messages(),
            vec!["Unsafe catchError usage in effects and epics are forbidden."]
        );
    }
}
