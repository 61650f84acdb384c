//! Forbid completing operators in effects and epics

use super::{
    compile_regex, is_effect_pipe, parse_options, Configurable, DEFAULT_OBSERVABLE,
    DEFAULT_OBSERVABLE_JSON,
};
use crate::config::ConfigError;
use crate::rule::{
    Listeners, OptionKind, OptionSpec, Report, RuleCategory, RuleContext, RuleDef, RuleMeta,
    RuleStability,
};
use crate::tree::{Node, NodeKind};
use regex::Regex;
use serde::Deserialize;
use serde_json::Value as Json;

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct Options {
    observable: String,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            observable: DEFAULT_OBSERVABLE.to_string(),
        }
    }
}

pub struct NoUnsafeFirst {
    observable: Regex,
    listeners: Listeners<Self>,
}

impl NoUnsafeFirst {
    fn check_pipe(&self, _: &mut (), pipe: Node<'_>, cx: &mut RuleContext<'_>) {
        if !is_effect_pipe(pipe, &self.observable) || !cx.types().could_be_type(pipe, "Observable")
        {
            return;
        }
        for operator in pipe.list("arguments").iter() {
            if !operator.is(NodeKind::CallExpression) {
                continue;
            }
            let Some(callee) = operator.child("callee") else {
                continue;
            };
            if callee.is_identifier("first") || callee.is_identifier("take") {
                cx.report(Report::new("forbidden", callee));
            }
        }
    }
}

impl Configurable for NoUnsafeFirst {
    fn from_options(options: &Json) -> Result<Self, ConfigError> {
        let options: Options = parse_options(Self::META.name, options)?;
        Ok(Self {
            observable: compile_regex(Self::META.name, &options.observable)?,
            listeners: Listeners::<Self>::new()
                .on("CallExpression[callee.property.name='pipe']", Self::check_pipe)?,
        })
    }
}

impl RuleDef for NoUnsafeFirst {
    type State = ();

    const META: &'static RuleMeta = &RuleMeta {
        name: "no-unsafe-first",
        description: "Forbids unsafe `first`/`take` usage in effects and epics.",
        category: RuleCategory::Correctness,
        stability: RuleStability::Stable,
        requires_type_checking: true,
        fixable: false,
        has_suggestions: false,
        messages: &[(
            "forbidden",
            "Unsafe first and take usage in effects and epics are forbidden.",
        )],
        options: &[OptionSpec {
            name: "observable",
            kind: OptionKind::Regex,
            default: DEFAULT_OBSERVABLE_JSON,
            description: "Pattern for the action stream names of effects and epics",
        }],
        replaced_by: None,
    };

    fn listeners(&self) -> &Listeners<Self> {
        &self.listeners
    }
}
