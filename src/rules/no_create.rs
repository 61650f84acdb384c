//! Forbid `Observable.create`

use super::{no_options, Configurable};
use crate::config::ConfigError;
use crate::rule::{Listeners, Report, RuleCategory, RuleContext, RuleDef, RuleMeta, RuleStability};
use crate::tree::Node;
use serde_json::Value as Json;

pub struct NoCreate {
    listeners: Listeners<Self>,
}

impl NoCreate {
    fn check_member(&self, _: &mut (), member: Node<'_>, cx: &mut RuleContext<'_>) {
        let (Some(object), Some(property)) = (member.child("object"), member.child("property"))
        else {
            return;
        };
        if cx.types().could_be_type(object, "Observable") {
            cx.report(Report::new("forbidden", property));
        }
    }
}

impl Configurable for NoCreate {
    fn from_options(options: &Json) -> Result<Self, ConfigError> {
        no_options(Self::META.name, options)?;
        Ok(Self {
            listeners: Listeners::<Self>::new().on(
                "CallExpression > MemberExpression.callee[object.name='Observable'][property.name='create']",
                Self::check_member,
            )?,
        })
    }
}

impl RuleDef for NoCreate {
    type State = ();

    const META: &'static RuleMeta = &RuleMeta {
        name: "no-create",
        description: "Forbids the calling of `Observable.create`.",
        category: RuleCategory::Style,
        stability: RuleStability::Stable,
        requires_type_checking: true,
        fixable: false,
        has_suggestions: false,
        messages: &[("forbidden", "Observable.create is forbidden; use new Observable.")],
        options: &[],
        replaced_by: None,
    };

    fn listeners(&self) -> &Listeners<Self> {
        &self.listeners
    }
}
