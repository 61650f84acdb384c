//! Forbid `shareReplay`, optionally allowing it with a config object

use super::{parse_options, Configurable};
use crate::config::ConfigError;
use crate::rule::{
    Listeners, OptionKind, OptionSpec, Report, RuleCategory, RuleContext, RuleDef, RuleMeta,
    RuleStability,
};
use crate::tree::{Node, NodeKind};
use serde::Deserialize;
use serde_json::Value as Json;

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
struct Options {
    allow_config: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self { allow_config: true }
    }
}

pub struct NoSharereplay {
    allow_config: bool,
    listeners: Listeners<Self>,
}

impl NoSharereplay {
    fn check_call(&self, _: &mut (), call: Node<'_>, cx: &mut RuleContext<'_>) {
        let Some(callee) = call.child("callee") else {
            return;
        };
        if !self.allow_config {
            cx.report(Report::new("forbidden", callee));
            return;
        }
        let arguments = call.list("arguments");
        let with_config = arguments.len() == 1
            && arguments
                .first()
                .is_some_and(|a| a.is(NodeKind::ObjectExpression));
        if !with_config {
            cx.report(Report::new("forbiddenWithoutConfig", callee));
        }
    }
}

impl Configurable for NoSharereplay {
    fn from_options(options: &Json) -> Result<Self, ConfigError> {
        let options: Options = parse_options(Self::META.name, options)?;
        Ok(Self {
            allow_config: options.allow_config,
            listeners: Listeners::<Self>::new()
                .on("CallExpression[callee.name='shareReplay']", Self::check_call)?,
        })
    }
}

impl RuleDef for NoSharereplay {
    type State = ();

    const META: &'static RuleMeta = &RuleMeta {
        name: "no-sharereplay",
        description: "Forbids using the `shareReplay` operator.",
        category: RuleCategory::Restriction,
        stability: RuleStability::Stable,
        requires_type_checking: false,
        fixable: false,
        has_suggestions: false,
        messages: &[
            ("forbidden", "shareReplay is forbidden."),
            (
                "forbiddenWithoutConfig",
                "shareReplay is forbidden unless a config argument is passed.",
            ),
        ],
        options: &[OptionSpec {
            name: "allowConfig",
            kind: OptionKind::Boolean,
            default: "true",
            description: "Allow shareReplay when a config object is passed",
        }],
        replaced_by: None,
    };

    fn listeners(&self) -> &Listeners<Self> {
        &self.listeners
    }
}
