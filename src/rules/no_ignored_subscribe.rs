//! Forbid `subscribe` calls without arguments

use super::{no_options, Configurable};
use crate::config::ConfigError;
use crate::rule::{Listeners, Report, RuleCategory, RuleContext, RuleDef, RuleMeta, RuleStability};
use crate::tree::Node;
use serde_json::Value as Json;

pub struct NoIgnoredSubscribe {
    listeners: Listeners<Self>,
}

impl NoIgnoredSubscribe {
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

impl Configurable for NoIgnoredSubscribe {
    fn from_options(options: &Json) -> Result<Self, ConfigError> {
        no_options(Self::META.name, options)?;
        Ok(Self {
            listeners: Listeners::<Self>::new().on(
                "CallExpression[arguments.length=0] > MemberExpression.callee[property.name='subscribe']",
                Self::check_member,
            )?,
        })
    }
}

impl RuleDef for NoIgnoredSubscribe {
    type State = ();

    const META: &'static RuleMeta = &RuleMeta {
        name: "no-ignored-subscribe",
        description: "Forbids the calling of `subscribe` without specifying arguments.",
        category: RuleCategory::Pedantic,
        stability: RuleStability::Stable,
        requires_type_checking: true,
        fixable: false,
        has_suggestions: false,
        messages: &[("forbidden", "Calling subscribe without arguments is forbidden.")],
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
    fn test_subscribe_without_arguments() {
        let linted = lint_default::<NoIgnoredSubscribe>(program(vec![
            expr_stmt(method(ident("source").typed(observable(number_type())), "subscribe", vec![])),
            expr_stmt(method(
                ident("source").typed(observable(number_type())),
                "subscribe",
                vec![ident("observer")],
            )),
            expr_stmt(method(ident("emitter"), "subscribe", vec![])),
        ]));
        assert_eq!(linted.reported(), vec!["subscribe"]);
        assert_eq!(
            linted.messages(),
            vec!["Calling subscribe without arguments is forbidden."]
        );
    }
}
