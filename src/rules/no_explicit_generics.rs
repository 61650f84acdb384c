//! Forbid explicit type arguments where they can be inferred

use super::{no_options, Configurable};
use crate::config::ConfigError;
use crate::rule::{Listeners, Report, RuleCategory, RuleContext, RuleDef, RuleMeta, RuleStability};
use crate::tree::{Node, NodeKind};
use serde_json::Value as Json;

pub struct NoExplicitGenerics {
    listeners: Listeners<Self>,
}

/// Array and object literals need the type argument to widen
fn is_literal_collection(node: Option<Node<'_>>) -> bool {
    node.is_some_and(|n| matches!(n.kind(), NodeKind::ArrayExpression | NodeKind::ObjectExpression))
}

impl NoExplicitGenerics {
    fn report_callee(&self, _: &mut (), callee: Node<'_>, cx: &mut RuleContext<'_>) {
        cx.report(Report::new("forbidden", callee));
    }

    /// `new BehaviorSubject<T>(value)`
    fn check_behavior_subject(&self, _: &mut (), callee: Node<'_>, cx: &mut RuleContext<'_>) {
        let initial = callee.parent().and_then(|new| new.list("arguments").first());
        if !is_literal_collection(initial) {
            cx.report(Report::new("forbidden", callee));
        }
    }

    /// `new Notification<T>("N", value)`
    fn check_notification(&self, _: &mut (), callee: Node<'_>, cx: &mut RuleContext<'_>) {
        let value = callee.parent().and_then(|new| new.list("arguments").get(1));
        if !is_literal_collection(value) {
            cx.report(Report::new("forbidden", callee));
        }
    }
}

impl Configurable for NoExplicitGenerics {
    fn from_options(options: &Json) -> Result<Self, ConfigError> {
        no_options(Self::META.name, options)?;
        Ok(Self {
            listeners: Listeners::<Self>::new()
                .on(
                    "CallExpression[callee.property.name='pipe'] > CallExpression[typeArguments.params.length > 0] > Identifier.callee",
                    Self::report_callee,
                )?
                .on(
                    "NewExpression[typeArguments.params.length > 0] > Identifier.callee[name='BehaviorSubject']",
                    Self::check_behavior_subject,
                )?
                .on(
                    "CallExpression[typeArguments.params.length > 0] > Identifier.callee[name=/^(from|of)$/]",
                    Self::report_callee,
                )?
                .on(
                    "NewExpression[typeArguments.params.length > 0][arguments.0.value='N'] > Identifier.callee[name='Notification']",
                    Self::check_notification,
                )?,
        })
    }
}

impl RuleDef for NoExplicitGenerics {
    type State = ();

    const META: &'static RuleMeta = &RuleMeta {
        name: "no-explicit-generics",
        description: "Forbids explicit generic type arguments.",
        category: RuleCategory::Style,
        stability: RuleStability::Stable,
        requires_type_checking: false,
        fixable: false,
        has_suggestions: false,
        messages: &[("forbidden", "Explicit generic type arguments are forbidden.")],
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

    fn n() -> Js {
        ts_keyword("number")
    }

    #[test]
    fn test_explicit_generics() {
        let linted = lint_default::<NoExplicitGenerics>(program(vec![
            // source.pipe(map<number, number>((x) => x));
            expr_stmt(method(
                ident("source"),
                "pipe",
                vec![call_generic(ident("map"), vec![n(), n()], vec![arrow(vec![ident("x")], ident("x"))])],
            )),
            const_decl(ident("a"), new_generic(ident("BehaviorSubject"), vec![n()], vec![number(1.0)])),
            const_decl(ident("b"), call_generic(ident("of"), vec![n()], vec![number(1.0)])),
            const_decl(
                ident("c"),
                new_generic(ident("Notification"), vec![n()], vec![string("N"), number(1.0)]),
            ),
        ]));
        assert_eq!(
            linted.reported(),
            vec!["map", "BehaviorSubject", "of", "Notification"]
        );
    }

    #[test]
    fn test_widening_and_inferred_cases() {
        let linted = lint_default::<NoExplicitGenerics>(program(vec![
            const_decl(
                ident("a"),
                new_generic(ident("BehaviorSubject"), vec![ts_ref("Thing", vec![])], vec![object(vec![])]),
            ),
            const_decl(
                ident("b"),
                new_generic(
                    ident("Notification"),
                    vec![n()],
                    vec![string("N"), array(vec![])],
                ),
            ),
            const_decl(ident("c"), call(ident("of"), vec![number(1.0)])),
            expr_stmt(method(ident("source"), "pipe", vec![call(ident("map"), vec![ident("f")])])),
        ]));
        assert_eq!(linted.count(), 0);
    }
}
