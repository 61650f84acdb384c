//! Forbid reading the current value of a `BehaviorSubject`

use super::{no_options, Configurable};
use crate::config::ConfigError;
use crate::rule::{Listeners, Report, RuleCategory, RuleContext, RuleDef, RuleMeta, RuleStability};
use crate::tree::Node;
use serde_json::Value as Json;

pub struct NoSubjectValue {
    listeners: Listeners<Self>,
}

impl NoSubjectValue {
    fn check_member(&self, _: &mut (), member: Node<'_>, cx: &mut RuleContext<'_>) {
        let (Some(object), Some(property)) = (member.child("object"), member.child("property"))
        else {
            return;
        };
        if cx.types().could_be_type(object, "BehaviorSubject") {
            cx.report(Report::new("forbidden", property));
        }
    }
}

impl Configurable for NoSubjectValue {
    fn from_options(options: &Json) -> Result<Self, ConfigError> {
        no_options(Self::META.name, options)?;
        Ok(Self {
            listeners: Listeners::<Self>::new().on(
                "MemberExpression[property.name=/^(value|getValue)$/]",
                Self::check_member,
            )?,
        })
    }
}

impl RuleDef for NoSubjectValue {
    type State = ();

    const META: &'static RuleMeta = &RuleMeta {
        name: "no-subject-value",
        description: "Forbids accessing the `value` property of a `BehaviorSubject` instance.",
        category: RuleCategory::Restriction,
        stability: RuleStability::Stable,
        requires_type_checking: true,
        fixable: false,
        has_suggestions: false,
        messages: &[(
            "forbidden",
            "Accessing the value property of a BehaviorSubject is forbidden.",
        )],
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
    fn test_value_access() {
        let linted = lint_default::<NoSubjectValue>(program(vec![
            const_decl(
                ident("a"),
                member(ident("subject").typed(behavior_subject(number_type())), "value"),
            ),
            const_decl(
                ident("b"),
                method(ident("subject").typed(behavior_subject(number_type())), "getValue", vec![]),
            ),
            const_decl(ident("c"), member(ident("subject").typed(subject(number_type())), "value")),
            const_decl(ident("d"), member(ident("input"), "value")),
        ]));
        assert_eq!(linted.reported(), vec!["value", "getValue"]);
    }
}
