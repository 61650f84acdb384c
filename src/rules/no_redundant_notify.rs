//! Forbid notifications following a terminal notification

use super::{no_options, Configurable};
use crate::config::ConfigError;
use crate::rule::{Listeners, Report, RuleCategory, RuleContext, RuleDef, RuleMeta, RuleStability};
use crate::tree::{Node, NodeKind};
use serde_json::Value as Json;

pub struct NoRedundantNotify {
    listeners: Listeners<Self>,
}

/// Receiver and property of `receiver.method(...)` in an expression statement
fn notification(statement: Node<'_>) -> Option<(Node<'_>, Node<'_>)> {
    let callee = statement.child("expression")?.child("callee")?;
    Some((callee.child("object")?, callee.child("property")?))
}

impl NoRedundantNotify {
    fn check_statement(&self, _: &mut (), statement: Node<'_>, cx: &mut RuleContext<'_>) {
        let in_block = statement
            .parent()
            .is_some_and(|p| matches!(p.kind(), NodeKind::BlockStatement | NodeKind::Program));
        if !in_block {
            return;
        }
        let Some(previous) = statement.preceding_siblings().last() else {
            return;
        };
        let (Some((terminal, _)), Some((receiver, property))) =
            (notification(previous), notification(statement))
        else {
            return;
        };
        if terminal.text() != receiver.text() {
            return;
        }
        let types = cx.types();
        let notifies = |node: Node<'_>| {
            types.could_be_type(node, "Subject") || types.could_be_type(node, "Subscriber")
        };
        if notifies(terminal) && notifies(receiver) {
            cx.report(Report::new("forbidden", property));
        }
    }
}

impl Configurable for NoRedundantNotify {
    fn from_options(options: &Json) -> Result<Self, ConfigError> {
        no_options(Self::META.name, options)?;
        Ok(Self {
            listeners: Listeners::<Self>::new().on(
                "ExpressionStatement[expression.callee.property.name=/^(complete|error)$/] \
                 + ExpressionStatement[expression.callee.property.name=/^(next|complete|error)$/]",
                Self::check_statement,
            )?,
        })
    }
}

impl RuleDef for NoRedundantNotify {
    type State = ();

    const META: &'static RuleMeta = &RuleMeta {
        name: "no-redundant-notify",
        description: "Forbids redundant notifications from completed or errored observables.",
        category: RuleCategory::Correctness,
        stability: RuleStability::Stable,
        requires_type_checking: true,
        fixable: false,
        has_suggestions: false,
        messages: &[("forbidden", "Redundant notifications are forbidden.")],
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

    fn notify(receiver: &str, name: &str) -> Js {
        expr_stmt(method(ident(receiver).typed(subject(number_type())), name, vec![]))
    }

    #[test]
    fn test_redundant_notifications() {
        let linted = lint_default::<NoRedundantNotify>(program(vec![
            notify("subject", "complete"),
            notify("subject", "next"),
            notify("subject", "error"),
        ]));
        // next after complete, then error after next is fine
        assert_eq!(linted.reported(), vec!["next"]);
    }

    #[test]
    fn test_terminal_pairs_in_blocks() {
        let linted = lint_default::<NoRedundantNotify>(program(vec![function_decl(
            "finish",
            vec![],
            block(vec![notify("subject", "error"), notify("subject", "complete")]),
        )]));
        assert_eq!(linted.reported(), vec!["complete"]);
        assert_eq!(linted.messages(), vec!["Redundant notifications are forbidden."]);
    }

    #[test]
    fn test_different_receivers() {
        let linted = lint_default::<NoRedundantNotify>(program(vec![
            notify("a", "complete"),
            notify("b", "next"),
            notify("c", "next"),
            notify("c", "complete"),
        ]));
        assert_eq!(linted.count(), 0);
    }
}
