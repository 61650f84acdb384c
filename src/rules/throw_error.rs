//! Require `Error` values for `throw` statements and `throwError`

use super::{parse_options, Configurable};
use crate::config::ConfigError;
use crate::rule::{
    Listeners, OptionKind, OptionSpec, Report, RuleCategory, RuleContext, RuleDef, RuleMeta,
    RuleStability,
};
use crate::tree::Node;
use crate::types::Type;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value as Json;

static ERROR_TYPES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(Error|DOMException)$").expect("error type pattern is valid"));

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
struct Options {
    allow_throwing_any: bool,
    allow_throwing_unknown: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            allow_throwing_any: true,
            allow_throwing_unknown: true,
        }
    }
}

pub struct ThrowError {
    options: Options,
    listeners: Listeners<Self>,
}

impl ThrowError {
    /// Whether a thrown value of type `ty` is acceptable
    fn accepts(&self, ty: &Type) -> bool {
        // throwError(() => new Error()) passes a factory
        let ty = match ty.call_signatures().first() {
            Some(signature) => &signature.return_type,
            None => ty,
        };
        if ty.is_any() {
            return self.options.allow_throwing_any;
        }
        if ty.is_unknown() {
            return self.options.allow_throwing_unknown;
        }
        ty.could_be(&*ERROR_TYPES)
    }

    fn check_thrown(&self, value: Node<'_>, cx: &mut RuleContext<'_>) {
        let Some(ty) = cx.types().type_of(value) else {
            return;
        };
        if !self.accepts(ty) {
            cx.report(Report::new("forbidden", value));
        }
    }

    fn check_throw(&self, _: &mut (), argument: Node<'_>, cx: &mut RuleContext<'_>) {
        self.check_thrown(argument, cx);
    }

    fn check_throw_error(&self, _: &mut (), call: Node<'_>, cx: &mut RuleContext<'_>) {
        if !cx.types().could_be_type(call, "Observable") {
            return;
        }
        if let Some(argument) = call.list("arguments").first() {
            self.check_thrown(argument, cx);
        }
    }
}

impl Configurable for ThrowError {
    fn from_options(options: &Json) -> Result<Self, ConfigError> {
        let options: Options = parse_options(Self::META.name, options)?;
        Ok(Self {
            options,
            listeners: Listeners::<Self>::new()
                .on("ThrowStatement > *", Self::check_throw)?
                .on("CallExpression[callee.name='throwError']", Self::check_throw_error)?,
        })
    }
}

impl RuleDef for ThrowError {
    type State = ();

    const META: &'static RuleMeta = &RuleMeta {
        name: "throw-error",
        description: "Enforces the passing of `Error` values to error notifications.",
        category: RuleCategory::Pedantic,
        stability: RuleStability::Stable,
        requires_type_checking: true,
        fixable: false,
        has_suggestions: false,
        messages: &[("forbidden", "Passing non-Error values are forbidden.")],
        options: &[
            OptionSpec {
                name: "allowThrowingAny",
                kind: OptionKind::Boolean,
                default: "true",
                description: "Accept values typed `any`",
            },
            OptionSpec {
                name: "allowThrowingUnknown",
                kind: OptionKind::Boolean,
                default: "true",
                description: "Accept values typed `unknown`",
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

    fn error() -> Type {
        Type::named("Error")
    }

    fn throw_error(argument: Js) -> Js {
        call(ident("throwError"), vec![argument]).typed(observable(Type::Never))
    }

    fn thrown() -> Js {
        program(vec![
            throw_stmt(new_expr(ident("Error"), vec![string("a")]).typed(error())),
            throw_stmt(string("b").typed(string_type())),
            throw_stmt(ident("c").typed(Type::named("TypeError").extending(error()))),
            throw_stmt(ident("d").typed(Type::Any)),
            throw_stmt(ident("e")),
            expr_stmt(throw_error(string("f").typed(string_type()))),
            expr_stmt(throw_error(
                arrow(vec![], new_expr(ident("Error"), vec![])).typed(func(error())),
            )),
            expr_stmt(throw_error(ident("h").typed(Type::Unknown))),
        ])
    }

    #[test]
    fn test_non_error_values() {
        let linted = lint_default::<ThrowError>(thrown());
        assert_eq!(linted.reported(), vec!["\"b\"", "\"f\""]);
        assert_eq!(linted.messages()[0], "Passing non-Error values are forbidden.");
    }

    #[test]
    fn test_any_and_unknown_disallowed() {
        let linted = lint::<ThrowError>(
            json!([{ "allowThrowingAny": false, "allowThrowingUnknown": false }]),
            thrown(),
        );
        assert_eq!(linted.reported(), vec!["\"b\"", "d", "\"f\"", "h"]);
    }

    #[test]
    fn test_non_observable_throw_error_ignored() {
        // A local `throwError` helper returning void, and an untyped call
        let linted = lint_default::<ThrowError>(program(vec![
            expr_stmt(
                call(ident("throwError"), vec![string("f").typed(string_type())])
                    .typed(Type::Void),
            ),
            expr_stmt(call(ident("throwError"), vec![string("g").typed(string_type())])),
        ]));
        assert_eq!(linted.count(), 0);
    }
}
