//! Forbid unsubscribing subjects

use super::{no_options, Configurable};
use crate::config::ConfigError;
use crate::rule::{Listeners, Report, RuleCategory, RuleContext, RuleDef, RuleMeta, RuleStability};
use crate::tree::Node;
use serde_json::Value as Json;

pub struct NoSubjectUnsubscribe {
    listeners: Listeners<Self>,
}

impl NoSubjectUnsubscribe {
    fn check_unsubscribe(&self, _: &mut (), member: Node<'_>, cx: &mut RuleContext<'_>) {
        let (Some(object), Some(property)) = (member.child("object"), member.child("property"))
        else {
            return;
        };
        if cx.types().could_be_type(object, "Subject") {
            cx.report(Report::new("forbidden", property));
        }
    }

    /// `subscription.add(subject)`
    fn check_add(&self, _: &mut (), call: Node<'_>, cx: &mut RuleContext<'_>) {
        let Some(object) = call.child("callee").and_then(|c| c.child("object")) else {
            return;
        };
        let types = cx.types();
        if !types.could_be_type(object, "Subscription") {
            return;
        }
        if let Some(argument) = call.list("arguments").first() {
            if types.could_be_type(argument, "Subject") {
                cx.report(Report::new("forbidden", argument));
            }
        }
    }
}

impl Configurable for NoSubjectUnsubscribe {
    fn from_options(options: &Json) -> Result<Self, ConfigError> {
        no_options(Self::META.name, options)?;
        Ok(Self {
            listeners: Listeners::<Self>::new()
                .on("MemberExpression[property.name='unsubscribe']", Self::check_unsubscribe)?
                .on(
                    "CallExpression[callee.property.name='add'][arguments.length > 0]",
                    Self::check_add,
                )?,
        })
    }
}

impl RuleDef for NoSubjectUnsubscribe {
    type State = ();

    const META: &'static RuleMeta = &RuleMeta {
        name: "no-subject-unsubscribe",
        description: "Forbids calling the `unsubscribe` method of a subject instance.",
        category: RuleCategory::Correctness,
        stability: RuleStability::Stable,
        requires_type_checking: true,
        fixable: false,
        has_suggestions: false,
        messages: &[("forbidden", "Calling unsubscribe on a subject is forbidden.")],
        options: &[],
        replaced_by: None,
    };

    fn listeners(&self) -> &Listeners<Self> {
        &self.listeners
    }
}
