//! Forbid operators after `takeUntil` that can resubscribe or outlive it

use super::{callee_name, compile_regex, parse_options, Configurable};
use crate::config::ConfigError;
use crate::rule::{
    Listeners, OptionKind, OptionSpec, Report, RuleCategory, RuleContext, RuleDef, RuleMeta,
    RuleStability,
};
use crate::tree::{Node, NodeKind};
use regex::Regex;
use serde::Deserialize;
use serde_json::Value as Json;

const DEFAULT_ALLOW: &[&str] = &[
    "count",
    "defaultIfEmpty",
    "endWith",
    "every",
    "finalize",
    "finally",
    "isEmpty",
    "last",
    "max",
    "min",
    "publish",
    "publishBehavior",
    "publishLast",
    "publishReplay",
    "reduce",
    "share",
    "shareReplay",
    "skipLast",
    "takeLast",
    "throwIfEmpty",
    "toArray",
];

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct Options {
    alias: Vec<String>,
    allow: Vec<String>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            alias: Vec::new(),
            allow: DEFAULT_ALLOW.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Scan state while walking a pipe from its last operator backwards
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scan {
    Allowed,
    Disallowed,
    Taken,
}

pub struct NoUnsafeTakeuntil {
    checked: Regex,
    allow: Vec<String>,
    listeners: Listeners<Self>,
}

impl NoUnsafeTakeuntil {
    fn operator_name<'t>(operator: Node<'t>) -> Option<&'t str> {
        if operator.is(NodeKind::CallExpression) {
            callee_name(operator)
        } else {
            None
        }
    }

    fn check_operator(&self, _: &mut (), operator: Node<'_>, cx: &mut RuleContext<'_>) {
        let is_checked = operator
            .child("callee")
            .filter(|c| c.is(NodeKind::Identifier))
            .and_then(|c| c.name())
            .is_some_and(|name| self.checked.is_match(name));
        if !is_checked {
            return;
        }
        let Some(pipe) = operator.parent() else {
            return;
        };
        let receiver = pipe.child("callee").and_then(|c| c.child("object"));
        if !receiver.is_some_and(|r| cx.types().could_be_type(r, "Observable")) {
            return;
        }

        let mut scan = Scan::Allowed;
        for argument in pipe.list("arguments").iter().rev() {
            let Some(name) = Self::operator_name(argument) else {
                scan = Scan::Disallowed;
                continue;
            };
            if self.checked.is_match(name) {
                if scan == Scan::Disallowed && argument.id() == operator.id() {
                    if let Some(callee) = argument.child("callee") {
                        cx.report(Report::new("forbidden", callee));
                    }
                }
                scan = Scan::Taken;
                break;
            }
            if !self.allow.iter().any(|allowed| allowed == name) {
                scan = Scan::Disallowed;
            }
        }
        log::trace!("takeUntil scan of pipe at {} ended {:?}", pipe.span().start, scan);
    }
}

impl Configurable for NoUnsafeTakeuntil {
    fn from_options(options: &Json) -> Result<Self, ConfigError> {
        let options: Options = parse_options(Self::META.name, options)?;
        // Aliases are regex fragments, so `untilDestroyed\w*` covers a family
        let names: Vec<&str> = std::iter::once("takeUntil")
            .chain(options.alias.iter().map(String::as_str))
            .collect();
        Ok(Self {
            checked: compile_regex(Self::META.name, &format!("^({})$", names.join("|")))?,
            allow: options.allow,
            listeners: Listeners::<Self>::new().on(
                "CallExpression[callee.property.name='pipe'] > CallExpression",
                Self::check_operator,
            )?,
        })
    }
}

impl RuleDef for NoUnsafeTakeuntil {
    type State = ();

    const META: &'static RuleMeta = &RuleMeta {
        name: "no-unsafe-takeuntil",
        description: "Forbids the application of operators after `takeUntil`.",
        category: RuleCategory::Correctness,
        stability: RuleStability::Stable,
        requires_type_checking: true,
        fixable: false,
        has_suggestions: false,
        messages: &[("forbidden", "Applying operators after takeUntil is forbidden.")],
        options: &[
            OptionSpec {
                name: "alias",
                kind: OptionKind::StringList,
                default: "[]",
                description: "Operator name patterns (regular expressions) treated like takeUntil",
            },
            OptionSpec {
                name: "allow",
                kind: OptionKind::StringList,
                default: r#"["count","defaultIfEmpty","endWith","every","finalize","finally","isEmpty","last","max","min","publish","publishBehavior","publishLast","publishReplay","reduce","share","shareReplay","skipLast","takeLast","throwIfEmpty","toArray"]"#,
                description: "Operators that may follow takeUntil",
            },
        ],
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
    use serde_json::json;

    fn pipe(operators: &[&str]) -> Js {
        let calls = operators
            .iter()
            .map(|name| call(ident(name), vec![ident("x")]))
            .collect();
        expr_stmt(method(ident("source").typed(observable(number_type())), "pipe", calls))
    }

    #[test]
    fn test_operators_after_take_until() {
        let linted = lint_default::<NoUnsafeTakeuntil>(program(vec![
            pipe(&["map", "takeUntil", "switchMap"]),
            pipe(&["map", "takeUntil"]),
            pipe(&["takeUntil", "toArray", "shareReplay"]),
            pipe(&["takeUntil", "switchMap", "takeUntil"]),
        ]));
        assert_eq!(linted.reported(), vec!["takeUntil"]);
        assert_eq!(linted.diagnostics[0].location.line, 1);
        assert_eq!(
            linted.messages(),
            vec!["Applying operators after takeUntil is forbidden."]
        );
    }

    #[test]
    fn test_alias_and_allow_options() {
        let linted = lint::<NoUnsafeTakeuntil>(
            json!([{ "alias": ["untilDestroyed"], "allow": ["tap"] }]),
            program(vec![
                pipe(&["untilDestroyed", "map"]),
                pipe(&["untilDestroyed", "tap"]),
                pipe(&["takeUntil", "toArray"]),
            ]),
        );
        assert_eq!(linted.reported(), vec!["untilDestroyed", "takeUntil"]);
    }

    #[test]
    fn test_alias_patterns() {
        let linted = lint::<NoUnsafeTakeuntil>(
            json!([{ "alias": [r"untilDestroyed\w*"] }]),
            program(vec![
                pipe(&["untilDestroyedBy", "map"]),
                pipe(&["untilDestroyed", "map"]),
                pipe(&["xuntilDestroyed", "map"]),
            ]),
        );
        assert_eq!(linted.reported(), vec!["untilDestroyedBy", "untilDestroyed"]);
    }

    #[test]
    fn test_invalid_alias_fails_configuration() {
        assert!(matches!(
            NoUnsafeTakeuntil::from_options(&json!([{ "alias": ["("] }])),
            Err(ConfigError::InvalidRegex { .. })
        ));
    }

    #[test]
    fn test_untyped_pipes_are_ignored() {
        let linted = lint_default::<NoUnsafeTakeuntil>(program(vec![expr_stmt(method(
            ident("source"),
            "pipe",
            vec![
                call(ident("takeUntil"), vec![ident("x")]),
                call(ident("map"), vec![ident("x")]),
            ],
        ))]));
        assert_eq!(linted.count(), 0);
    }
}
