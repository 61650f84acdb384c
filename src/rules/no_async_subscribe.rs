//! Forbid async functions as `subscribe` callbacks

use super::{no_options, Configurable};
use crate::config::ConfigError;
use crate::rule::{Listeners, Report, RuleCategory, RuleContext, RuleDef, RuleMeta, RuleStability};
use crate::tree::{Node, Span};
use serde_json::Value as Json;

pub struct NoAsyncSubscribe {
    listeners: Listeners<Self>,
}

impl NoAsyncSubscribe {
    fn check_callback(&self, _: &mut (), function: Node<'_>, cx: &mut RuleContext<'_>) {
        let object = function
            .parent()
            .and_then(|call| call.child("callee"))
            .and_then(|callee| callee.child("object"));
        if !object.is_some_and(|object| cx.types().could_be_type(object, "Observable")) {
            return;
        }
        // Point at the `async` keyword
        let start = function.span().start;
        let end = (start + "async".len()).min(function.span().end);
        cx.report(Report::at("forbidden", Span::new(start, end)));
    }
}

impl Configurable for NoAsyncSubscribe {
    fn from_options(options: &Json) -> Result<Self, ConfigError> {
        no_options(Self::META.name, options)?;
        Ok(Self {
            listeners: Listeners::<Self>::new().on(
                "CallExpression[callee.property.name='subscribe'] > :matches(ArrowFunctionExpression, FunctionExpression)[async=true]",
                Self::check_callback,
            )?,
        })
    }
}

impl RuleDef for NoAsyncSubscribe {
    type State = ();

    const META: &'static RuleMeta = &RuleMeta {
        name: "no-async-subscribe",
        description: "Forbids passing async functions to subscribe.",
        category: RuleCategory::Correctness,
        stability: RuleStability::Stable,
        requires_type_checking: true,
        fixable: false,
        has_suggestions: false,
        messages: &[("forbidden", "Passing async functions to subscribe is forbidden.")],
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
    fn test_async_callbacks() {
        let linted = lint_default::<NoAsyncSubscribe>(program(vec![
            expr_stmt(method(
                ident("source").typed(observable(number_type())),
                "subscribe",
                vec![async_fn(arrow(vec![ident("value")], block(vec![])))],
            )),
            expr_stmt(method(
                ident("source").typed(observable(number_type())),
                "subscribe",
                vec![async_fn(function_expr(vec![], block(vec![])))],
            )),
        ]));
        assert_eq!(linted.reported(), vec!["async", "async"]);
        assert_eq!(
            linted.messages()[0],
            "Passing async functions to subscribe is forbidden."
        );
    }

    #[test]
    fn test_sync_callbacks_and_other_receivers() {
        let linted = lint_default::<NoAsyncSubscribe>(program(vec![
            expr_stmt(method(
                ident("source").typed(observable(number_type())),
                "subscribe",
                vec![arrow(vec![ident("value")], block(vec![]))],
            )),
            expr_stmt(method(
                ident("emitter"),
                "subscribe",
                vec![async_fn(arrow(vec![], block(vec![])))],
            )),
        ]));
        assert_eq!(linted.count(), 0);
    }
}
