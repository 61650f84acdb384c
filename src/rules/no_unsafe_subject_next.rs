//! Forbid `next()` without a value on subjects whose element type needs one

use super::{no_options, Configurable};
use crate::config::ConfigError;
use crate::rule::{Listeners, Report, RuleCategory, RuleContext, RuleDef, RuleMeta, RuleStability};
use crate::tree::Node;
use crate::types::Type;
use serde_json::Value as Json;

pub struct NoUnsafeSubjectNext {
    listeners: Listeners<Self>,
}

/// Element types that accept a missing value
fn tolerates_void(element: &Type) -> bool {
    element.is_any()
        || element.is_unknown()
        || element.is_void()
        || (element.is_union() && element.union_members().iter().any(Type::is_void))
}

impl NoUnsafeSubjectNext {
    fn check_member(&self, _: &mut (), member: Node<'_>, cx: &mut RuleContext<'_>) {
        let (Some(object), Some(property)) = (member.child("object"), member.child("property"))
        else {
            return;
        };
        let types = cx.types();
        if !types.could_be_type(object, "Subject") {
            return;
        }
        let Some(element) = types.type_of(object).and_then(|t| t.type_arguments().first()) else {
            return;
        };
        if !tolerates_void(element) {
            cx.report(Report::new("forbidden", property));
        }
    }
}

impl Configurable for NoUnsafeSubjectNext {
    fn from_options(options: &Json) -> Result<Self, ConfigError> {
        no_options(Self::META.name, options)?;
        Ok(Self {
            listeners: Listeners::<Self>::new().on(
                "CallExpression[arguments.length=0] > MemberExpression.callee[property.name='next']",
                Self::check_member,
            )?,
        })
    }
}

impl RuleDef for NoUnsafeSubjectNext {
    type State = ();

    const META: &'static RuleMeta = &RuleMeta {
        name: "no-unsafe-subject-next",
        description: "Forbids unsafe optional `next` calls.",
        category: RuleCategory::Correctness,
        stability: RuleStability::Stable,
        requires_type_checking: true,
        fixable: false,
        has_suggestions: false,
        messages: &[("forbidden", "Unsafe optional next calls are forbidden.")],
        options: &[],
        replaced_by: None,
    };

    fn listeners(&self) -> &Listeners<Self> {
        &self.listeners
    }
}
