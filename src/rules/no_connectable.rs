//! Forbid operators that return connectable observables

use super::{no_options, Configurable};
use crate::config::ConfigError;
use crate::rule::{Listeners, Report, RuleCategory, RuleContext, RuleDef, RuleMeta, RuleStability};
use crate::tree::Node;
use serde_json::Value as Json;

pub struct NoConnectable {
    listeners: Listeners<Self>,
}

impl NoConnectable {
    fn check_multicast(&self, _: &mut (), call: Node<'_>, cx: &mut RuleContext<'_>) {
        if call.list("arguments").len() == 1 {
            report_callee(call, cx);
        }
    }

    fn check_publish(&self, _: &mut (), call: Node<'_>, cx: &mut RuleContext<'_>) {
        let types = cx.types();
        if !call
            .list("arguments")
            .iter()
            .any(|arg| types.could_be_function(arg))
        {
            report_callee(call, cx);
        }
    }
}

fn report_callee(call: Node<'_>, cx: &mut RuleContext<'_>) {
    if let Some(callee) = call.child("callee") {
        cx.report(Report::new("forbidden", callee));
    }
}

impl Configurable for NoConnectable {
    fn from_options(options: &Json) -> Result<Self, ConfigError> {
        no_options(Self::META.name, options)?;
        let listeners = Listeners::<Self>::new()
            .on("CallExpression[callee.name='multicast']", Self::check_multicast)?
            .on(
                "CallExpression[callee.name=/^(publish|publishBehavior|publishLast|publishReplay)$/]",
                Self::check_publish,
            )?;
        Ok(Self { listeners })
    }
}

impl RuleDef for NoConnectable {
    type State = ();

    const META: &'static RuleMeta = &RuleMeta {
        name: "no-connectable",
        description: "Forbids operators that return connectable observables.",
        category: RuleCategory::Suspicious,
        stability: RuleStability::Stable,
        requires_type_checking: true,
        fixable: false,
        has_suggestions: false,
        messages: &[("forbidden", "Connectable observables are forbidden.")],
        options: &[],
        replaced_by: None,
    };

    fn listeners(&self) -> &Listeners<Self> {
        &self.listeners
    }
}
