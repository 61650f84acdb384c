//! Prefer observer objects over separate callbacks

use super::{parse_options, Configurable};
use crate::config::ConfigError;
use crate::diagnostic::FixBuilder;
use crate::rule::{
    Listeners, OptionKind, OptionSpec, Report, RuleCategory, RuleContext, RuleDef, RuleMeta,
    RuleStability,
};
use crate::tree::{Node, NodeList, Span};
use serde::Deserialize;
use serde_json::Value as Json;

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
struct Options {
    allow_next: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self { allow_next: true }
    }
}

pub struct PreferObserver {
    allow_next: bool,
    listeners: Listeners<Self>,
}

/// Rewrite `(next, error, complete)` arguments into one observer object
fn observer_fix(arguments: NodeList<'_>) -> Option<FixBuilder> {
    let first = arguments.first()?;
    let last = arguments.last()?;
    let properties: Vec<String> = ["next", "error", "complete"]
        .iter()
        .zip(arguments.iter())
        .filter_map(|(key, argument)| {
            let text = argument.text().trim();
            (!matches!(text, "" | "undefined" | "null")).then(|| format!("{}: {}", key, text))
        })
        .collect();
    let observer = if properties.is_empty() {
        "{}".to_string()
    } else {
        format!("{{ {} }}", properties.join(", "))
    };
    let mut fix = FixBuilder::new().replace_node(first, observer);
    if arguments.len() > 1 {
        fix = fix.remove(Span::new(first.span().end, last.span().end));
    }
    Some(fix)
}

impl PreferObserver {
    fn check_arguments(&self, call: Node<'_>, reported: Node<'_>, cx: &mut RuleContext<'_>) {
        let arguments = call.list("arguments");
        let separate = match arguments.len() {
            0 => false,
            1 => {
                !self.allow_next
                    && arguments
                        .first()
                        .is_some_and(|a| cx.types().could_be_function(a))
            }
            _ => true,
        };
        if !separate {
            return;
        }
        let mut report = Report::new("forbidden", reported);
        if let Some(fix) = observer_fix(arguments) {
            report = report.with_fix(fix.clone()).with_suggestion("forbidden", fix);
        }
        cx.report(report);
    }

    fn check_tap(&self, _: &mut (), call: Node<'_>, cx: &mut RuleContext<'_>) {
        if let Some(callee) = call.child("callee") {
            self.check_arguments(call, callee, cx);
        }
    }

    fn check_subscribe(&self, _: &mut (), call: Node<'_>, cx: &mut RuleContext<'_>) {
        let Some(callee) = call.child("callee") else {
            return;
        };
        let (Some(object), Some(property)) = (callee.child("object"), callee.child("property"))
        else {
            return;
        };
        if cx.types().could_be_type(object, "Observable") {
            self.check_arguments(call, property, cx);
        }
    }
}

impl Configurable for PreferObserver {
    fn from_options(options: &Json) -> Result<Self, ConfigError> {
        let options: Options = parse_options(Self::META.name, options)?;
        Ok(Self {
            allow_next: options.allow_next,
            listeners: Listeners::<Self>::new()
                .on(
                    "CallExpression[callee.property.name='pipe'] > CallExpression[callee.name='tap']",
                    Self::check_tap,
                )?
                .on("CallExpression[callee.property.name='subscribe']", Self::check_subscribe)?,
        })
    }
}

impl RuleDef for PreferObserver {
    type State = ();

    const META: &'static RuleMeta = &RuleMeta {
        name: "prefer-observer",
        description: "Forbids the passing separate handlers to `subscribe` and `tap`.",
        category: RuleCategory::Style,
        stability: RuleStability::Stable,
        requires_type_checking: true,
        fixable: true,
        has_suggestions: true,
        messages: &[(
            "forbidden",
            "Passing separate handlers is forbidden; pass an observer instead.",
        )],
        options: &[OptionSpec {
            name: "allowNext",
            kind: OptionKind::Boolean,
            default: "true",
            description: "Accept a lone next handler",
        }],
        replaced_by: None,
    };

    fn listeners(&self) -> &Listeners<Self> {
        &self.listeners
    }
}
