//! Forbid calling `subscribe` within a subscribe callback

use super::{no_options, Configurable};
use crate::config::ConfigError;
use crate::rule::{Listeners, Report, RuleCategory, RuleContext, RuleDef, RuleMeta, RuleStability};
use crate::tree::{Node, NodeId};
use serde_json::Value as Json;
use std::collections::HashSet;

pub struct NoNestedSubscribe {
    listeners: Listeners<Self>,
}

impl NoNestedSubscribe {
    fn check_member(
        &self,
        handlers: &mut HashSet<NodeId>,
        member: Node<'_>,
        cx: &mut RuleContext<'_>,
    ) {
        let (Some(object), Some(property), Some(call)) =
            (member.child("object"), member.child("property"), member.parent())
        else {
            return;
        };
        let types = cx.types();
        if !types.could_be_type(object, "Observable") && !types.could_be_type(object, "Subscribable")
        {
            return;
        }
        if call.ancestors().any(|a| handlers.contains(&a.id())) {
            cx.report(Report::new("forbidden", property));
        } else {
            handlers.extend(call.list("arguments").ids());
        }
    }
}

impl Configurable for NoNestedSubscribe {
    fn from_options(options: &Json) -> Result<Self, ConfigError> {
        no_options(Self::META.name, options)?;
        Ok(Self {
            listeners: Listeners::<Self>::new().on(
                "CallExpression > MemberExpression.callee[property.name='subscribe']",
                Self::check_member,
            )?,
        })
    }
}

impl RuleDef for NoNestedSubscribe {
    type State = HashSet<NodeId>;

    const META: &'static RuleMeta = &RuleMeta {
        name: "no-nested-subscribe",
        description: "Forbids the calling of `subscribe` within a `subscribe` callback.",
        category: RuleCategory::Correctness,
        stability: RuleStability::Stable,
        requires_type_checking: true,
        fixable: false,
        has_suggestions: false,
        messages: &[("forbidden", "Nested subscribe calls are forbidden.")],
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

    fn subscribe(receiver: &str, args: Vec<Js>) -> Js {
        method(ident(receiver).typed(observable(number_type())), "subscribe", args)
    }

    #[test]
    fn test_nested_subscribe() {
        // a.subscribe((v) => { b.subscribe(); });
        let linted = lint_default::<NoNestedSubscribe>(program(vec![
            expr_stmt(subscribe(
                "a",
                vec![arrow(vec![ident("v")], block(vec![expr_stmt(subscribe("b", vec![]))]))],
            )),
            expr_stmt(subscribe("c", vec![])),
        ]));
        assert_eq!(linted.reported(), vec!["subscribe"]);
        let start = linted.diagnostics[0].location.span.start;
        assert!(linted.source[..start].ends_with("b."));
    }

    #[test]
    fn test_nested_in_observer_object() {
        // a.subscribe({ next: (v) => b.subscribe() });
        let linted = lint_default::<NoNestedSubscribe>(program(vec![expr_stmt(subscribe(
            "a",
            vec![object(vec![prop("next", arrow(vec![ident("v")], subscribe("b", vec![])))])],
        ))]));
        assert_eq!(linted.count(), 1);
    }

    #[test]
    fn test_sequential_subscribes() {
        let linted = lint_default::<NoNestedSubscribe>(program(vec![
            expr_stmt(subscribe("a", vec![ident("handler")])),
            expr_stmt(subscribe("b", vec![ident("handler")])),
        ]));
        assert_eq!(linted.count(), 0);
    }
}
