//! Forbid discarding the subscription returned by `subscribe`

use super::{no_options, Configurable};
use crate::config::ConfigError;
use crate::rule::{Listeners, Report, RuleCategory, RuleContext, RuleDef, RuleMeta, RuleStability};
use crate::tree::Node;
use serde_json::Value as Json;

pub struct NoIgnoredSubscription {
    listeners: Listeners<Self>,
}

impl NoIgnoredSubscription {
    fn check_member(&self, _: &mut (), member: Node<'_>, cx: &mut RuleContext<'_>) {
        let (Some(object), Some(property), Some(call)) =
            (member.child("object"), member.child("property"), member.parent())
        else {
            return;
        };
        let types = cx.types();
        if !types.could_be_type(object, "Observable") {
            return;
        }
        // Subscribing a subscriber chains its teardown
        let arguments = call.list("arguments");
        if arguments.len() == 1
            && arguments
                .first()
                .is_some_and(|arg| types.could_be_type(arg, "Subscriber"))
        {
            return;
        }
        cx.report(Report::new("forbidden", property));
    }
}

impl Configurable for NoIgnoredSubscription {
    fn from_options(options: &Json) -> Result<Self, ConfigError> {
        no_options(Self::META.name, options)?;
        Ok(Self {
            listeners: Listeners::<Self>::new().on(
                "ExpressionStatement > CallExpression > MemberExpression.callee[property.name='subscribe']",
                Self::check_member,
            )?,
        })
    }
}

impl RuleDef for NoIgnoredSubscription {
    type State = ();

    const META: &'static RuleMeta = &RuleMeta {
        name: "no-ignored-subscription",
        description: "Forbids ignoring the subscription returned by `subscribe`.",
        category: RuleCategory::Pedantic,
        stability: RuleStability::Stable,
        requires_type_checking: true,
        fixable: false,
        has_suggestions: false,
        messages: &[("forbidden", "Ignoring returned subscriptions is forbidden.")],
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
    fn test_ignored_subscriptions() {
        let linted = lint_default::<NoIgnoredSubscription>(program(vec![
            expr_stmt(method(
                ident("source").typed(observable(number_type())),
                "subscribe",
                vec![ident("handler")],
            )),
            const_decl(
                ident("subscription"),
                method(ident("source").typed(observable(number_type())), "subscribe", vec![]),
            ),
            expr_stmt(method(
                ident("source").typed(observable(number_type())),
                "subscribe",
                vec![ident("subscriber").typed(subscriber(number_type()))],
            )),
        ]));
        assert_eq!(linted.reported(), vec!["subscribe"]);
        assert_eq!(linted.diagnostics[0].location.line, 1);
        assert_eq!(
            linted.messages(),
            vec!["Ignoring returned subscriptions is forbidden."]
        );
    }
}
