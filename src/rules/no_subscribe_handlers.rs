//! Forbid passing handlers to `subscribe`

use super::{no_options, Configurable};
use crate::config::ConfigError;
use crate::rule::{Listeners, Report, RuleCategory, RuleContext, RuleDef, RuleMeta, RuleStability};
use crate::tree::Node;
use serde_json::Value as Json;

pub struct NoSubscribeHandlers {
    listeners: Listeners<Self>,
}

impl NoSubscribeHandlers {
    fn check_member(&self, _: &mut (), member: Node<'_>, cx: &mut RuleContext<'_>) {
        let (Some(object), Some(property)) = (member.child("object"), member.child("property"))
        else {
            return;
        };
        let types = cx.types();
        if types.could_be_type(object, "Observable") || types.could_be_type(object, "Subscribable") {
            cx.report(Report::new("forbidden", property));
        }
    }
}

impl Configurable for NoSubscribeHandlers {
    fn from_options(options: &Json) -> Result<Self, ConfigError> {
        no_options(Self::META.name, options)?;
        Ok(Self {
            listeners: Listeners::<Self>::new().on(
                "CallExpression[arguments.length > 0] > MemberExpression.callee[property.name='subscribe']",
                Self::check_member,
            )?,
        })
    }
}

impl RuleDef for NoSubscribeHandlers {
    type State = ();

    const META: &'static RuleMeta = &RuleMeta {
        name: "no-subscribe-handlers",
        description: "Forbids the passing of handlers to `subscribe`.",
        category: RuleCategory::Restriction,
        stability: RuleStability::Stable,
        requires_type_checking: true,
        fixable: false,
        has_suggestions: false,
        messages: &[("forbidden", "Passing handlers to subscribe is forbidden.")],
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
    fn test_handlers() {
        let linted = lint_default::<NoSubscribeHandlers>(program(vec![
            expr_stmt(method(
                ident("source").typed(observable(number_type())),
                "subscribe",
                vec![arrow(vec![ident("value")], ident("value"))],
            )),
            expr_stmt(method(ident("source").typed(observable(number_type())), "subscribe", vec![])),
            expr_stmt(method(ident("store"), "subscribe", vec![ident("listener")])),
        ]));
        assert_eq!(linted.reported(), vec!["subscribe"]);
    }
}
