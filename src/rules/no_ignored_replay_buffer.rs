//! Require an explicit buffer size for replaying subjects and operators

use super::{no_options, Configurable};
use crate::config::ConfigError;
use crate::rule::{Listeners, Report, RuleCategory, RuleContext, RuleDef, RuleMeta, RuleStability};
use crate::tree::{Node, NodeKind};
use serde_json::Value as Json;

pub struct NoIgnoredReplayBuffer {
    listeners: Listeners<Self>,
}

impl NoIgnoredReplayBuffer {
    /// `callee` of a `new` or call expression; reports when no arguments were passed
    fn check_callee(&self, _: &mut (), callee: Node<'_>, cx: &mut RuleContext<'_>) {
        let Some(call) = callee.ancestors().find(|n| {
            matches!(n.kind(), NodeKind::NewExpression | NodeKind::CallExpression)
        }) else {
            return;
        };
        let arguments = call.list("arguments");
        if arguments.is_empty() {
            cx.report(Report::new("forbidden", callee));
            return;
        }
        // shareReplay({ refCount: true }) still replays everything
        if callee.name() == Some("shareReplay") && arguments.len() == 1 {
            let Some(config) = arguments.first().filter(|a| a.is(NodeKind::ObjectExpression)) else {
                return;
            };
            let has_buffer_size = config.list("properties").iter().any(|p| {
                p.child("key")
                    .and_then(|k| k.name().or_else(|| k.str("value")))
                    == Some("bufferSize")
            });
            if !has_buffer_size {
                cx.report(Report::new("forbidden", callee));
            }
        }
    }
}

impl Configurable for NoIgnoredReplayBuffer {
    fn from_options(options: &Json) -> Result<Self, ConfigError> {
        no_options(Self::META.name, options)?;
        Ok(Self {
            listeners: Listeners::<Self>::new()
                .on("NewExpression > Identifier.callee[name='ReplaySubject']", Self::check_callee)?
                .on(
                    "NewExpression > MemberExpression.callee > Identifier.property[name='ReplaySubject']",
                    Self::check_callee,
                )?
                .on(
                    "CallExpression > Identifier.callee[name=/^(publishReplay|shareReplay)$/]",
                    Self::check_callee,
                )?,
        })
    }
}

impl RuleDef for NoIgnoredReplayBuffer {
    type State = ();

    const META: &'static RuleMeta = &RuleMeta {
        name: "no-ignored-replay-buffer",
        description: "Forbids using `ReplaySubject`, `publishReplay` or `shareReplay` without specifying the buffer size.",
        category: RuleCategory::Suspicious,
        stability: RuleStability::Stable,
        requires_type_checking: false,
        fixable: false,
        has_suggestions: false,
        messages: &[("forbidden", "Ignoring the buffer size is forbidden.")],
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

    #[test]
    fn test_missing_buffer_sizes() {
        let linted = lint_default::<NoIgnoredReplayBuffer>(program(vec![
            const_decl(ident("a"), new_expr(ident("ReplaySubject"), vec![])),
            const_decl(ident("b"), new_expr(member(ident("Rx"), "ReplaySubject"), vec![])),
            const_decl(ident("c"), call(ident("shareReplay"), vec![])),
            const_decl(
                ident("d"),
                call(ident("shareReplay"), vec![object(vec![prop("refCount", boolean(true))])]),
            ),
            const_decl(ident("e"), call(ident("publishReplay"), vec![])),
        ]));
        assert_eq!(
            linted.reported(),
            vec!["ReplaySubject", "ReplaySubject", "shareReplay", "shareReplay", "publishReplay"]
        );
    }

    #[test]
    fn test_explicit_buffer_sizes() {
        let linted = lint_default::<NoIgnoredReplayBuffer>(program(vec![
            const_decl(ident("a"), new_expr(ident("ReplaySubject"), vec![number(1.0)])),
            const_decl(
                ident("b"),
                new_expr(member(ident("Rx"), "ReplaySubject"), vec![number(1.0)]),
            ),
            const_decl(ident("c"), call(ident("shareReplay"), vec![number(1.0)])),
            const_decl(
                ident("d"),
                call(
                    ident("shareReplay"),
                    vec![object(vec![
                        prop("bufferSize", number(1.0)),
                        prop("refCount", boolean(true)),
                    ])],
                ),
            ),
            const_decl(ident("e"), call(ident("publishReplay"), vec![number(1.0)])),
        ]));
        assert_eq!(linted.count(), 0);
    }
}
