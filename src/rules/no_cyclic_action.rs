//! Forbid effects and epics that re-emit the actions they filter

use super::{
    compile_regex, is_effect_pipe, parse_options, Configurable, DEFAULT_OBSERVABLE,
    DEFAULT_OBSERVABLE_JSON,
};
use crate::config::ConfigError;
use crate::rule::{
    Listeners, OptionKind, OptionSpec, Report, RuleCategory, RuleContext, RuleDef, RuleMeta,
    RuleStability,
};
use crate::tree::{Node, NodeKind};
use crate::types::Type;
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

pub struct NoCyclicAction {
    observable: Regex,
    listeners: Listeners<Self>,
}

/// Rendered `type` property of an action, one per union member
fn action_types(ty: &Type) -> Vec<String> {
    if ty.is_union() {
        return ty.union_members().iter().flat_map(action_types).collect();
    }
    ty.property("type")
        .map(|t| vec![t.to_string()])
        .unwrap_or_default()
}

impl NoCyclicAction {
    fn check_pipe(&self, _: &mut (), pipe: Node<'_>, cx: &mut RuleContext<'_>) {
        if !is_effect_pipe(pipe, &self.observable) {
            return;
        }
        let Some(operator) = pipe.list("arguments").iter().find(|arg| {
            arg.is(NodeKind::CallExpression)
                && arg.child("callee").is_some_and(|c| c.is_identifier("ofType"))
        }) else {
            return;
        };
        let types = cx.types();
        // ofType(...) is an operator function returning Observable<FilteredAction>
        let Some(filtered) = types
            .type_of(operator)
            .and_then(|t| t.call_signatures().first())
            .map(|s| &s.return_type)
            .filter(|r| r.could_be("Observable"))
            .and_then(|r| r.type_arguments().first())
        else {
            return;
        };
        let Some(emitted) = types
            .type_of(pipe)
            .and_then(|t| t.type_arguments().first())
        else {
            return;
        };
        let emitted = action_types(emitted);
        if action_types(filtered).iter().any(|t| emitted.contains(t)) {
            if let Some(callee) = pipe.child("callee") {
                cx.report(Report::new("forbidden", callee));
            }
        }
    }
}

impl Configurable for NoCyclicAction {
    fn from_options(options: &Json) -> Result<Self, ConfigError> {
        let options: Options = parse_options(Self::META.name, options)?;
        Ok(Self {
            observable: compile_regex(Self::META.name, &options.observable)?,
            listeners: Listeners::<Self>::new()
                .on("CallExpression[callee.property.name='pipe']", Self::check_pipe)?,
        })
    }
}

impl RuleDef for NoCyclicAction {
    type State = ();

    const META: &'static RuleMeta = &RuleMeta {
        name: "no-cyclic-action",
        description: "Forbids effects and epics that re-emit filtered actions.",
        category: RuleCategory::Correctness,
        stability: RuleStability::Stable,
        requires_type_checking: true,
        fixable: false,
        has_suggestions: false,
        messages: &[(
            "forbidden",
            "Effects and epics that re-emit filtered actions are forbidden.",
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

    fn action(name: &str, tag: &str) -> Type {
        Type::named(name).with_property("type", Type::string_literal(tag))
    }

    /// actions$.pipe(ofType(...), mapTo(...)) filtering `filtered` and emitting `emitted`
    fn effect(filtered: Type, emitted: Type) -> Js {
        expr_stmt(
            method(
                ident("actions$"),
                "pipe",
                vec![
                    call(ident("ofType"), vec![ident("kind")])
                        .typed(Type::function(vec![], observable(filtered))),
                    call(ident("mapTo"), vec![ident("next")]),
                ],
            )
            .typed(observable(emitted)),
        )
    }

    #[test]
    fn test_action_types() {
        let both = Type::union(vec![action("A", "a"), action("B", "b")]);
        assert_eq!(action_types(&both), vec!["\"a\"", "\"b\""]);
        assert!(action_types(&number_type()).is_empty());
    }

    #[test]
    fn test_cyclic_effects() {
        let linted = lint_default::<NoCyclicAction>(program(vec![
            effect(action("Ping", "PING"), action("Ping", "PING")),
            effect(
                action("Ping", "PING"),
                Type::union(vec![action("Pong", "PONG"), action("Ping", "PING")]),
            ),
            effect(action("Ping", "PING"), action("Pong", "PONG")),
        ]));
        assert_eq!(linted.reported(), vec!["actions$.pipe", "actions$.pipe"]);
        assert_eq!(
            linted.messages()[0],
            "Effects and epics that re-emit filtered actions are forbidden."
        );
    }
}
