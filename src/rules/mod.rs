//! The RxJS rule set
//!
//! Every rule is a [`RuleDef`] built from its JSON options through
//! [`Configurable::from_options`]; the registry maps rule names to these
//! constructors.

pub mod ban_observables;
pub mod ban_operators;
pub mod babel_macro;
pub mod finnish;
pub mod just;
mod naming;
pub mod no_async_subscribe;
pub mod no_compat;
pub mod no_connectable;
pub mod no_create;
pub mod no_cyclic_action;
pub mod no_explicit_generics;
pub mod no_exposed_subjects;
pub mod no_finnish;
pub mod no_ignored_error;
pub mod no_ignored_notifier;
pub mod no_ignored_observable;
pub mod no_ignored_replay_buffer;
pub mod no_ignored_subscribe;
pub mod no_ignored_subscription;
pub mod no_ignored_takewhile_value;
pub mod no_implicit_any_catch;
pub mod no_index;
pub mod no_internal;
pub mod no_nested_subscribe;
pub mod no_redundant_notify;
pub mod no_sharereplay;
pub mod no_subclass;
pub mod no_subject_unsubscribe;
pub mod no_subject_value;
pub mod no_subscribe_handlers;
pub mod no_topromise;
pub mod no_unbound_methods;
pub mod no_unsafe_catch;
pub mod no_unsafe_first;
pub mod no_unsafe_subject_next;
pub mod no_unsafe_switchmap;
pub mod no_unsafe_takeuntil;
pub mod prefer_observer;
pub mod suffix_subjects;
pub mod throw_error;

use crate::config::ConfigError;
use crate::rule::RuleDef;
use crate::tree::{Node, NodeKind};
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value as Json;
use std::collections::BTreeMap;

/// A rule that can be built from configuration options
pub trait Configurable: RuleDef {
    fn from_options(options: &Json) -> Result<Self, ConfigError>;
}

/// Deserialize rule options
///
/// `null` and `[]` give the defaults; a one-element list (ESLint style) is
/// unwrapped.
pub(crate) fn parse_options<T: DeserializeOwned + Default>(
    rule: &str,
    options: &Json,
) -> Result<T, ConfigError> {
    let value = match options {
        Json::Null => return Ok(T::default()),
        Json::Array(items) if items.is_empty() => return Ok(T::default()),
        Json::Array(items) if items.len() == 1 => &items[0],
        other => other,
    };
    T::deserialize(value).map_err(|e| ConfigError::InvalidOptions {
        rule: rule.to_string(),
        message: e.to_string(),
    })
}

/// Reject options for a rule that takes none
pub(crate) fn no_options(rule: &str, options: &Json) -> Result<(), ConfigError> {
    match options {
        Json::Null => Ok(()),
        Json::Array(items) if items.is_empty() => Ok(()),
        Json::Object(map) if map.is_empty() => Ok(()),
        _ => Err(ConfigError::InvalidOptions {
            rule: rule.to_string(),
            message: "rule takes no options".to_string(),
        }),
    }
}

pub(crate) fn compile_regex(rule: &str, pattern: &str) -> Result<Regex, ConfigError> {
    Regex::new(pattern).map_err(|source| ConfigError::InvalidRegex {
        rule: rule.to_string(),
        pattern: pattern.to_string(),
        source,
    })
}

/// Value of a ban map entry
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum BanValue {
    Enabled(bool),
    Explanation(String),
}

/// Names banned by a `{ name: true | "explanation" }` map
#[derive(Debug, Default)]
pub(crate) struct BanList {
    entries: Vec<(Regex, String)>,
}

impl BanList {
    /// Keys match whole names; `false` entries are dropped
    pub(crate) fn compile(rule: &str, map: &BTreeMap<String, BanValue>) -> Result<Self, ConfigError> {
        let mut entries = Vec::new();
        for (key, value) in map {
            let explanation = match value {
                BanValue::Enabled(false) => continue,
                BanValue::Enabled(true) => String::new(),
                BanValue::Explanation(text) => format!(": {}", text),
            };
            entries.push((compile_regex(rule, &format!("^{}$", key))?, explanation));
        }
        Ok(Self { entries })
    }

    /// Explanation suffix of the first matching entry
    pub(crate) fn find(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(re, _)| re.is_match(name))
            .map(|(_, explanation)| explanation.as_str())
    }
}

/// `{ regex: validate }` maps of the naming rules, in key order
pub(crate) fn compile_validation_map(
    rule: &str,
    map: &BTreeMap<String, bool>,
) -> Result<Vec<(Regex, bool)>, ConfigError> {
    map.iter()
        .map(|(pattern, validate)| Ok((compile_regex(rule, pattern)?, *validate)))
        .collect()
}

pub(crate) fn default_types_map() -> BTreeMap<String, bool> {
    BTreeMap::from([("^EventEmitter$".to_string(), false)])
}

/// One string or a list of strings
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub(crate) enum StringOrList {
    One(String),
    Many(Vec<String>),
}

/// Name of the called function: `f` in `f()` and `obj.f()`
pub(crate) fn callee_name<'t>(call: Node<'t>) -> Option<&'t str> {
    let callee = call.child("callee")?;
    match callee.kind() {
        NodeKind::Identifier => callee.name(),
        NodeKind::MemberExpression => callee.child("property")?.name(),
        _ => None,
    }
}

/// Arrow function or function expression
pub(crate) fn is_function_expression(node: Node<'_>) -> bool {
    matches!(
        node.kind(),
        NodeKind::ArrowFunctionExpression | NodeKind::FunctionExpression
    )
}

/// Identifier name, or the property name of a member expression
pub(crate) fn member_or_identifier_name<'t>(node: Node<'t>) -> Option<&'t str> {
    match node.kind() {
        NodeKind::Identifier => node.name(),
        NodeKind::MemberExpression => node.child("property")?.name(),
        _ => None,
    }
}

/// Default `observable` option of the effect and epic rules
pub(crate) const DEFAULT_OBSERVABLE: &str = r"[Aa]ction(s|s\$|\$)$";
/// [`DEFAULT_OBSERVABLE`] as a JSON string
pub(crate) const DEFAULT_OBSERVABLE_JSON: &str = r#""[Aa]ction(s|s\\$|\\$)$""#;

/// True for `pipe` calls whose receiver name (`actions$.pipe` or
/// `this.actions$.pipe`) matches `observable`
pub(crate) fn is_effect_pipe(call: Node<'_>, observable: &Regex) -> bool {
    let Some(callee) = call.child("callee") else {
        return false;
    };
    if !callee.is(NodeKind::MemberExpression)
        || callee.child("property").and_then(|p| p.name()) != Some("pipe")
    {
        return false;
    }
    callee
        .child("object")
        .and_then(member_or_identifier_name)
        .is_some_and(|name| observable.is_match(name))
}

#[cfg(test)]
pub(crate) mod test_util {
    use super::Configurable;
    use crate::diagnostic::{Diagnostic, Severity};
    use crate::engine::{Linter, SourceFile};
    use crate::fixer::apply_fixes;
    use crate::tree::synth::Js;
    use crate::types::Type;

    const RXJS: &str = "node_modules/rxjs/dist/types/internal/Observable.d.ts";

    pub fn observable(element: Type) -> Type {
        Type::generic("Observable", vec![element]).in_module(RXJS)
    }

    pub fn subject(element: Type) -> Type {
        Type::generic("Subject", vec![element.clone()])
            .in_module(RXJS)
            .extending(observable(element))
    }

    pub fn behavior_subject(element: Type) -> Type {
        Type::generic("BehaviorSubject", vec![element.clone()])
            .in_module(RXJS)
            .extending(subject(element))
    }

    pub fn subscription() -> Type {
        Type::named("Subscription").in_module(RXJS)
    }

    pub fn subscriber(element: Type) -> Type {
        Type::generic("Subscriber", vec![element])
            .in_module(RXJS)
            .extending(subscription())
    }

    pub fn number_type() -> Type {
        Type::primitive("number")
    }

    pub fn string_type() -> Type {
        Type::primitive("string")
    }

    /// `() => returns`
    pub fn func(returns: Type) -> Type {
        Type::function(vec![], returns)
    }

    /// Diagnostics of one rule over one synthesized program
    pub struct Linted {
        pub source: String,
        pub diagnostics: Vec<Diagnostic>,
    }

    impl Linted {
        pub fn count(&self) -> usize {
            self.diagnostics.len()
        }

        pub fn messages(&self) -> Vec<&str> {
            self.diagnostics.iter().map(|d| d.message.as_str()).collect()
        }

        pub fn message_ids(&self) -> Vec<&str> {
            self.diagnostics
                .iter()
                .map(|d| d.message_id.as_str())
                .collect()
        }

        /// Source text under each reported span
        pub fn reported(&self) -> Vec<&str> {
            self.diagnostics
                .iter()
                .map(|d| &self.source[d.location.span.start..d.location.span.end])
                .collect()
        }

        /// Source after applying every fix
        pub fn fixed(&self) -> String {
            apply_fixes(&self.source, &self.diagnostics).output
        }

        /// Source after applying the first suggestion of a diagnostic
        pub fn suggested(&self, index: usize) -> String {
            self.diagnostics[index].suggestions[0].fix.apply(&self.source)
        }
    }

    /// Build `R` from `options` and lint `program` with it
    pub fn lint<R: Configurable>(options: serde_json::Value, program: Js) -> Linted {
        let _ = env_logger::builder().is_test(true).try_init();
        let rule = R::from_options(&options).expect("valid options");
        let (tree, types) = program.build().expect("valid tree");
        let source = tree.source().to_string();
        let result = Linter::new()
            .with_rule(Box::new(rule), Severity::Error)
            .lint_file(&SourceFile::new("test.ts", tree).with_types(types));
        assert!(result.errors.is_empty(), "{:?}", result.errors);
        Linted {
            source,
            diagnostics: result.diagnostics,
        }
    }

    /// As [`lint`] with default options
    pub fn lint_default<R: Configurable>(program: Js) -> Linted {
        lint::<R>(serde_json::Value::Null, program)
    }
}
