//! Forbid `Observable.prototype.toPromise`

use super::{no_options, Configurable};
use crate::config::ConfigError;
use crate::rule::{Listeners, Report, RuleCategory, RuleContext, RuleDef, RuleMeta, RuleStability};
use crate::tree::Node;
use serde_json::Value as Json;

pub struct NoTopromise {
    listeners: Listeners<Self>,
}

impl NoTopromise {
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

impl Configurable for NoTopromise {
    fn from_options(options: &Json) -> Result<Self, ConfigError> {
        no_options(Self::META.name, options)?;
        Ok(Self {
            listeners: Listeners::<Self>::new()
                .on("MemberExpression[property.name='toPromise']", Self::check_member)?,
        })
    }
}

impl RuleDef for NoTopromise {
    type State = ();

    const META: &'static RuleMeta = &RuleMeta {
        name: "no-topromise",
        description: "Forbids the use of the `toPromise` method.",
        category: RuleCategory::Style,
        stability: RuleStability::Stable,
        requires_type_checking: true,
        fixable: false,
        has_suggestions: false,
        messages: &[("forbidden", "The toPromise method is forbidden.")],
        options: &[],
        replaced_by: None,
    };

    fn listeners(&self) -> &Listeners<Self> {
        &self.listeners
    }
}
