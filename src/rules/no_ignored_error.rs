//! Require an error handler when subscribing with callbacks

use super::{no_options, Configurable};
use crate::config::ConfigError;
use crate::rule::{Listeners, Report, RuleCategory, RuleContext, RuleDef, RuleMeta, RuleStability};
use crate::tree::Node;
use serde_json::Value as Json;

pub struct NoIgnoredError {
    listeners: Listeners<Self>,
}

impl NoIgnoredError {
    fn check_subscribe(&self, _: &mut (), property: Node<'_>, cx: &mut RuleContext<'_>) {
        let Some(member) = property.parent() else {
            return;
        };
        let (Some(object), Some(call)) = (member.child("object"), member.parent()) else {
            return;
        };
        let arguments = call.list("arguments");
        let types = cx.types();
        if arguments.len() == 1
            && types.could_be_type(object, "Observable")
            && arguments.first().is_some_and(|arg| types.could_be_function(arg))
        {
            cx.report(Report::new("forbidden", property));
        }
    }
}

impl Configurable for NoIgnoredError {
    fn from_options(options: &Json) -> Result<Self, ConfigError> {
        no_options(Self::META.name, options)?;
        Ok(Self {
            listeners: Listeners::<Self>::new().on(
                "CallExpression[arguments.length > 0] > MemberExpression.callee > Identifier.property[name='subscribe']",
                Self::check_subscribe,
            )?,
        })
    }
}

impl RuleDef for NoIgnoredError {
    type State = ();

    const META: &'static RuleMeta = &RuleMeta {
        name: "no-ignored-error",
        description: "Forbids the calling of `subscribe` without specifying an error handler.",
        category: RuleCategory::Pedantic,
        stability: RuleStability::Stable,
        requires_type_checking: true,
        fixable: false,
        has_suggestions: false,
        messages: &[("forbidden", "Calling subscribe without an error handler is forbidden.")],
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

    fn handler() -> Js {
        arrow(vec![ident("value")], ident("value")).typed(func(Type::Void))
    }

    #[test]
    fn test_single_callback() {
        let linted = lint_default::<NoIgnoredError>(program(vec![
            expr_stmt(method(
                ident("source").typed(observable(number_type())),
                "subscribe",
                vec![handler()],
            )),
            expr_stmt(method(
                ident("source").typed(observable(number_type())),
                "subscribe",
                vec![handler(), handler()],
            )),
            expr_stmt(method(
                ident("source").typed(observable(number_type())),
                "subscribe",
                vec![ident("observer").typed(Type::named("Observer"))],
            )),
        ]));
        assert_eq!(linted.reported(), vec!["subscribe"]);
        assert_eq!(
            linted.messages(),
            vec!["Calling subscribe without an error handler is forbidden."]
        );
    }
}
