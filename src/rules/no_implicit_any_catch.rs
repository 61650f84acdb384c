//! Require error callback parameters to be typed `unknown`

use super::{is_function_expression, parse_options, Configurable};
use crate::config::ConfigError;
use crate::diagnostic::FixBuilder;
use crate::rule::{
    Listeners, OptionKind, OptionSpec, Report, RuleCategory, RuleContext, RuleDef, RuleMeta,
    RuleStability,
};
use crate::tree::{Node, NodeKind};
use serde::Deserialize;
use serde_json::Value as Json;

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
struct Options {
    allow_explicit_any: bool,
}

pub struct NoImplicitAnyCatch {
    allow_explicit_any: bool,
    listeners: Listeners<Self>,
}

/// Error callback of a `subscribe` or `tap` call: the second argument, or
/// the `error` property of an observer object
fn error_callback(call: Node<'_>) -> Option<Node<'_>> {
    let arguments = call.list("arguments");
    if arguments.len() >= 2 {
        return arguments.get(1);
    }
    let observer = arguments.first().filter(|a| a.is(NodeKind::ObjectExpression))?;
    observer
        .list("properties")
        .iter()
        .find(|p| p.child("key").and_then(|k| k.name()) == Some("error"))
        .and_then(|p| p.child("value"))
}

impl NoImplicitAnyCatch {
    fn check_callback(&self, callback: Node<'_>, cx: &mut RuleContext<'_>) {
        if !is_function_expression(callback) {
            return;
        }
        let Some(param) = callback.list("params").first().filter(|p| p.is(NodeKind::Identifier))
        else {
            return;
        };
        match param.child("typeAnnotation") {
            Some(annotation) => {
                let Some(ty) = annotation.child("typeAnnotation") else {
                    return;
                };
                let unknown = || FixBuilder::new().replace_node(annotation, ": unknown");
                match ty.kind() {
                    NodeKind::TSUnknownKeyword => {}
                    NodeKind::TSAnyKeyword if self.allow_explicit_any => {}
                    NodeKind::TSAnyKeyword => cx.report(
                        Report::new("explicitAny", param)
                            .with_fix(unknown())
                            .with_suggestion("suggestExplicitUnknown", unknown()),
                    ),
                    _ => cx.report(
                        Report::new("narrowed", param)
                            .with_suggestion("suggestExplicitUnknown", unknown()),
                    ),
                }
            }
            None => {
                let source = cx.source();
                let before = source
                    .get(callback.span().start..param.span().start)
                    .unwrap_or_default();
                let annotate = || {
                    if before.contains('(') {
                        FixBuilder::new().insert_after(param, ": unknown")
                    } else {
                        FixBuilder::new()
                            .insert_before(param, "(")
                            .insert_after(param, ": unknown)")
                    }
                };
                cx.report(
                    Report::new("implicitAny", param)
                        .with_fix(annotate())
                        .with_suggestion("suggestExplicitUnknown", annotate()),
                );
            }
        }
    }

    fn check_catch_error(&self, _: &mut (), call: Node<'_>, cx: &mut RuleContext<'_>) {
        if let Some(callback) = call.list("arguments").first() {
            self.check_callback(callback, cx);
        }
    }

    fn check_subscribe(&self, _: &mut (), call: Node<'_>, cx: &mut RuleContext<'_>) {
        let Some(object) = call.child("callee").and_then(|c| c.child("object")) else {
            return;
        };
        if !cx.types().could_be_type(object, "Observable") {
            return;
        }
        if let Some(callback) = error_callback(call) {
            self.check_callback(callback, cx);
        }
    }

    fn check_tap(&self, _: &mut (), call: Node<'_>, cx: &mut RuleContext<'_>) {
        if let Some(callback) = error_callback(call) {
            self.check_callback(callback, cx);
        }
    }
}

impl Configurable for NoImplicitAnyCatch {
    fn from_options(options: &Json) -> Result<Self, ConfigError> {
        let options: Options = parse_options(Self::META.name, options)?;
        Ok(Self {
            allow_explicit_any: options.allow_explicit_any,
            listeners: Listeners::<Self>::new()
                .on("CallExpression[callee.name='catchError']", Self::check_catch_error)?
                .on("CallExpression[callee.property.name='subscribe']", Self::check_subscribe)?
                .on("CallExpression[callee.name='tap']", Self::check_tap)?,
        })
    }
}

impl RuleDef for NoImplicitAnyCatch {
    type State = ();

    const META: &'static RuleMeta = &RuleMeta {
        name: "no-implicit-any-catch",
        description: "Forbids implicit `any` error parameters in `catchError` operators.",
        category: RuleCategory::Suspicious,
        stability: RuleStability::Stable,
        requires_type_checking: true,
        fixable: true,
        has_suggestions: true,
        messages: &[
            ("explicitAny", "Explicit `any` in error callback."),
            ("implicitAny", "Implicit `any` in error callback."),
            ("narrowed", "Error type must be `unknown` or `any`."),
            (
                "suggestExplicitUnknown",
                "Use `unknown` instead, this will force you to explicitly and safely assert the type is correct.",
            ),
        ],
        options: &[OptionSpec {
            name: "allowExplicitAny",
            kind: OptionKind::Boolean,
            default: "false",
            description: "Accept error parameters annotated as `any`",
        }],
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

    fn catch_error(callback: Js) -> Js {
        expr_stmt(method(
            ident("source"),
            "pipe",
            vec![call(ident("catchError"), vec![callback])],
        ))
    }

    fn recover() -> Js {
        call(ident("of"), vec![null()])
    }

    #[test]
    fn test_implicit_any_fixed() {
        let linted = lint_default::<NoImplicitAnyCatch>(program(vec![
            catch_error(arrow(vec![ident("error")], recover())),
            catch_error(arrow_bare(ident("error"), recover())),
        ]));
        assert_eq!(linted.message_ids(), vec!["implicitAny", "implicitAny"]);

        let expected = program(vec![
            catch_error(arrow(
                vec![ident_typed("error", ts_keyword("unknown"))],
                recover(),
            )),
            catch_error(arrow(
                vec![ident_typed("error", ts_keyword("unknown"))],
                recover(),
            )),
        ]);
        assert_eq!(linted.fixed(), expected.source());
        assert_eq!(lint_default::<NoImplicitAnyCatch>(expected).count(), 0);
    }

    #[test]
    fn test_explicit_any_and_narrowed() {
        let source = program(vec![
            catch_error(arrow(vec![ident_typed("error", ts_keyword("any"))], recover())),
            catch_error(arrow(vec![ident_typed("error", ts_ref("Error", vec![]))], recover())),
        ]);
        let linted = lint_default::<NoImplicitAnyCatch>(source);
        assert_eq!(linted.message_ids(), vec!["explicitAny", "narrowed"]);
        assert!(linted.diagnostics[1].fix.is_none());
        assert_eq!(
            linted.suggested(1),
            program(vec![
                catch_error(arrow(vec![ident_typed("error", ts_keyword("any"))], recover())),
                catch_error(arrow(
                    vec![ident_typed("error", ts_keyword("unknown"))],
                    recover()
                )),
            ])
            .source()
        );

        let allowed = lint::<NoImplicitAnyCatch>(
            json!([{ "allowExplicitAny": true }]),
            program(vec![catch_error(arrow(
                vec![ident_typed("error", ts_keyword("any"))],
                recover(),
            ))]),
        );
        assert_eq!(allowed.count(), 0);
    }

    #[test]
    fn test_subscribe_and_tap_error_callbacks() {
        let linted = lint_default::<NoImplicitAnyCatch>(program(vec![
            expr_stmt(method(
                ident("source").typed(observable(number_type())),
                "subscribe",
                vec![ident("next"), arrow(vec![ident("error")], block(vec![]))],
            )),
            expr_stmt(method(
                ident("source").typed(observable(number_type())),
                "subscribe",
                vec![object(vec![prop("error", arrow(vec![ident("error")], block(vec![])))])],
            )),
            expr_stmt(call(
                ident("tap"),
                vec![ident("next"), arrow(vec![ident("error")], block(vec![]))],
            )),
            // Untyped receivers are not observables
            expr_stmt(method(
                ident("emitter"),
                "subscribe",
                vec![ident("next"), arrow(vec![ident("error")], block(vec![]))],
            )),
        ]));
        assert_eq!(linted.count(), 3);
        assert_eq!(linted.messages()[0], "Implicit `any` in error callback.");
    }
}
