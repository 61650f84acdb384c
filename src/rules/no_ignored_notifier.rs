//! Require the notifier passed to `repeatWhen` and `retryWhen` to be used

use super::{is_function_expression, no_options, Configurable};
use crate::config::ConfigError;
use crate::rule::{Listeners, Report, RuleCategory, RuleContext, RuleDef, RuleMeta, RuleStability};
use crate::tree::{Node, NodeId, NodeKind};
use serde_json::Value as Json;

const NOTIFIER_CALL: &str = "CallExpression[callee.name=/^(repeatWhen|retryWhen)$/]";

pub struct NoIgnoredNotifier {
    listeners: Listeners<Self>,
}

/// One enclosing `repeatWhen`/`retryWhen` call whose notifier is tracked
struct Notifier {
    call: NodeId,
    param: String,
    /// Identifiers named like the notifier, its own declaration included
    sightings: usize,
}

#[derive(Default)]
pub struct NotifierStack(Vec<Notifier>);

impl NoIgnoredNotifier {
    fn enter_call(&self, stack: &mut NotifierStack, call: Node<'_>, cx: &mut RuleContext<'_>) {
        if !cx.types().could_be_type(call, "MonoTypeOperatorFunction") {
            return;
        }
        let Some(callback) = call.list("arguments").first().filter(|a| is_function_expression(*a))
        else {
            return;
        };
        let Some(callee) = call.child("callee") else {
            return;
        };
        match callback.list("params").first() {
            None => cx.report(Report::new("forbidden", callee)),
            Some(param) if param.is(NodeKind::Identifier) => {
                if let Some(name) = param.name() {
                    stack.0.push(Notifier {
                        call: call.id(),
                        param: name.to_string(),
                        sightings: 0,
                    });
                }
            }
            // Destructured notifiers are taken as used
            Some(_) => {}
        }
    }

    fn sight_identifier(&self, stack: &mut NotifierStack, ident: Node<'_>, _: &mut RuleContext<'_>) {
        if let Some(top) = stack.0.last_mut() {
            if ident.name() == Some(top.param.as_str()) {
                top.sightings += 1;
            }
        }
    }

    fn exit_call(&self, stack: &mut NotifierStack, call: Node<'_>, cx: &mut RuleContext<'_>) {
        if stack.0.last().map(|top| top.call) != Some(call.id()) {
            return;
        }
        if let Some(top) = stack.0.pop() {
            if top.sightings < 2 {
                if let Some(callee) = call.child("callee") {
                    cx.report(Report::new("forbidden", callee));
                }
            }
        }
    }
}

impl Configurable for NoIgnoredNotifier {
    fn from_options(options: &Json) -> Result<Self, ConfigError> {
        no_options(Self::META.name, options)?;
        Ok(Self {
            listeners: Listeners::<Self>::new()
                .on(NOTIFIER_CALL, Self::enter_call)?
                .on("Identifier", Self::sight_identifier)?
                .on(&format!("{}:exit", NOTIFIER_CALL), Self::exit_call)?,
        })
    }
}

impl RuleDef for NoIgnoredNotifier {
    type State = NotifierStack;

    const META: &'static RuleMeta = &RuleMeta {
        name: "no-ignored-notifier",
        description: "Forbids observables not composed from the `repeatWhen` or `retryWhen` notifier.",
        category: RuleCategory::Correctness,
        stability: RuleStability::Stable,
        requires_type_checking: true,
        fixable: false,
        has_suggestions: false,
        messages: &[("forbidden", "Ignoring the notifier is forbidden.")],
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
    use crate::types::Type;
    use pretty_assertions::assert_eq;

    fn operator() -> Type {
        Type::generic("MonoTypeOperatorFunction", vec![number_type()])
    }

    fn retry_when(params: Vec<Js>, body: Js) -> Js {
        call(ident("retryWhen"), vec![arrow(params, body)]).typed(operator())
    }

    #[test]
    fn test_ignored_notifiers() {
        let linted = lint_default::<NoIgnoredNotifier>(program(vec![
            // retryWhen((errors) => timer(1))
            expr_stmt(retry_when(
                vec![ident("errors")],
                call(ident("timer"), vec![number(1.0)]),
            )),
            // retryWhen(() => timer(1))
            expr_stmt(retry_when(vec![], call(ident("timer"), vec![number(1.0)]))),
            // retryWhen((errors) => errors.pipe(delay(1)))
            expr_stmt(retry_when(
                vec![ident("errors")],
                method(ident("errors"), "pipe", vec![call(ident("delay"), vec![number(1.0)])]),
            )),
        ]));
        assert_eq!(linted.reported(), vec!["retryWhen", "retryWhen"]);
        assert_eq!(linted.diagnostics[1].location.line, 2);
    }

    #[test]
    fn test_nested_notifiers_are_tracked_separately() {
        // retryWhen((errors) => errors.pipe(repeatWhen((errors) => timer(1))))
        let inner = call(
            ident("repeatWhen"),
            vec![arrow(vec![ident("errors")], call(ident("timer"), vec![number(1.0)]))],
        )
        .typed(operator());
        let linted = lint_default::<NoIgnoredNotifier>(program(vec![expr_stmt(retry_when(
            vec![ident("errors")],
            method(ident("errors"), "pipe", vec![inner]),
        ))]));
        assert_eq!(linted.reported(), vec!["repeatWhen"]);
    }

    #[test]
    fn test_sighting_threshold() {
        // source.pipe(repeatWhen(x => x)); source.pipe(repeatWhen(() => other));
        let repeat_when = |callback: Js| call(ident("repeatWhen"), vec![callback]).typed(operator());
        let linted = lint_default::<NoIgnoredNotifier>(program(vec![
            expr_stmt(method(
                ident("source"),
                "pipe",
                vec![repeat_when(arrow_bare(ident("x"), ident("x")))],
            )),
            expr_stmt(method(
                ident("source"),
                "pipe",
                vec![repeat_when(arrow(vec![], ident("other")))],
            )),
        ]));
        assert_eq!(linted.reported(), vec!["repeatWhen"]);
        assert_eq!(linted.diagnostics[0].location.line, 2);
    }

    #[test]
    fn test_untyped_calls_are_ignored() {
        let linted = lint_default::<NoIgnoredNotifier>(program(vec![expr_stmt(call(
            ident("retryWhen"),
            vec![arrow(vec![], number(1.0))],
        ))]));
        assert_eq!(linted.count(), 0);
    }
}
