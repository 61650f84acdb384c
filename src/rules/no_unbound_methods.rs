//! Forbid passing unbound methods as callbacks

use super::{no_options, Configurable};
use crate::config::ConfigError;
use crate::rule::{Listeners, Report, RuleCategory, RuleContext, RuleDef, RuleMeta, RuleStability};
use crate::tree::{Node, NodeId, NodeKind, NodeList};
use serde_json::Value as Json;
use std::collections::HashSet;

pub struct NoUnboundMethods {
    listeners: Listeners<Self>,
}

/// Flag member-expression arguments that resolve to functions
fn flag_arguments(flagged: &mut HashSet<NodeId>, arguments: NodeList<'_>, cx: &RuleContext<'_>) {
    let types = cx.types();
    for argument in arguments.iter() {
        if argument.is(NodeKind::MemberExpression) && types.could_be_function(argument) {
            flagged.insert(argument.id());
        }
    }
}

impl NoUnboundMethods {
    fn check_pipe(&self, flagged: &mut HashSet<NodeId>, call: Node<'_>, cx: &mut RuleContext<'_>) {
        let Some(object) = call.child("callee").and_then(|c| c.child("object")) else {
            return;
        };
        if !cx.types().could_be_type(object, "Observable") {
            return;
        }
        for operator in call.list("arguments").iter() {
            if operator.is(NodeKind::CallExpression) {
                flag_arguments(flagged, operator.list("arguments"), cx);
            }
        }
    }

    fn check_subscribe(
        &self,
        flagged: &mut HashSet<NodeId>,
        call: Node<'_>,
        cx: &mut RuleContext<'_>,
    ) {
        let Some(object) = call.child("callee").and_then(|c| c.child("object")) else {
            return;
        };
        let types = cx.types();
        if types.could_be_type(object, "Observable") || types.could_be_type(object, "Subscription") {
            flag_arguments(flagged, call.list("arguments"), cx);
        }
    }

    fn check_subscription(
        &self,
        flagged: &mut HashSet<NodeId>,
        new: Node<'_>,
        cx: &mut RuleContext<'_>,
    ) {
        flag_arguments(flagged, new.list("arguments"), cx);
    }

    fn check_this(&self, flagged: &mut HashSet<NodeId>, this: Node<'_>, cx: &mut RuleContext<'_>) {
        if let Some(argument) = this.ancestors().find(|a| flagged.contains(&a.id())) {
            cx.report(Report::new("forbidden", argument));
        }
    }
}

impl Configurable for NoUnboundMethods {
    fn from_options(options: &Json) -> Result<Self, ConfigError> {
        no_options(Self::META.name, options)?;
        Ok(Self {
            listeners: Listeners::<Self>::new()
                .on("CallExpression[callee.property.name='pipe']", Self::check_pipe)?
                .on(
                    "CallExpression[callee.property.name=/^(add|subscribe)$/]",
                    Self::check_subscribe,
                )?
                .on("NewExpression[callee.name='Subscription']", Self::check_subscription)?
                .on("ThisExpression", Self::check_this)?,
        })
    }
}

impl RuleDef for NoUnboundMethods {
    type State = HashSet<NodeId>;

    const META: &'static RuleMeta = &RuleMeta {
        name: "no-unbound-methods",
        description: "Forbids the passing of unbound methods.",
        category: RuleCategory::Correctness,
        stability: RuleStability::Stable,
        requires_type_checking: true,
        fixable: false,
        has_suggestions: false,
        messages: &[("forbidden", "Unbound methods are forbidden.")],
        options: &[],
        replaced_by: None,
    };

    fn listeners(&self) -> &Listeners<Self> {
        &self.listeners
    }
}
