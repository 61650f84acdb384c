//! Forbid discarding observables returned from calls

use super::{no_options, Configurable};
use crate::config::ConfigError;
use crate::rule::{Listeners, Report, RuleCategory, RuleContext, RuleDef, RuleMeta, RuleStability};
use crate::tree::Node;
use serde_json::Value as Json;

pub struct NoIgnoredObservable {
    listeners: Listeners<Self>,
}

impl NoIgnoredObservable {
    fn check_call(&self, _: &mut (), call: Node<'_>, cx: &mut RuleContext<'_>) {
        if cx.types().could_be_type(call, "Observable") {
            cx.report(Report::new("forbidden", call));
        }
    }
}

impl Configurable for NoIgnoredObservable {
    fn from_options(options: &Json) -> Result<Self, ConfigError> {
        no_options(Self::META.name, options)?;
        Ok(Self {
            listeners: Listeners::<Self>::new()
                .on("ExpressionStatement > CallExpression", Self::check_call)?,
        })
    }
}

impl RuleDef for NoIgnoredObservable {
    type State = ();

    const META: &'static RuleMeta = &RuleMeta {
        name: "no-ignored-observable",
        description: "Forbids the ignoring of observables returned by functions.",
        category: RuleCategory::Correctness,
        stability: RuleStability::Stable,
        requires_type_checking: true,
        fixable: false,
        has_suggestions: false,
        messages: &[("forbidden", "Ignoring a returned Observable is forbidden.")],
        options: &[],
        replaced_by: None,
    };

    fn listeners(&self) -> &Listeners<Self> {
        &self.listeners
    }
}
