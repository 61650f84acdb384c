//! Forbid `switchMap` in effects and epics handling mutating actions

use super::{
    compile_regex, is_effect_pipe, member_or_identifier_name, parse_options, Configurable,
    StringOrList, DEFAULT_OBSERVABLE, DEFAULT_OBSERVABLE_JSON,
};
use crate::config::ConfigError;
use crate::rule::{
    Listeners, OptionKind, OptionSpec, Report, RuleCategory, RuleContext, RuleDef, RuleMeta,
    RuleStability,
};
use crate::tree::{Node, NodeKind};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value as Json;
use std::borrow::Cow;

const DEFAULT_DISALLOW: &[&str] = &[
    "add", "create", "delete", "post", "put", "remove", "set", "update",
];

static LOWER_UPPER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([\p{Ll}\d])(\p{Lu})").expect("case boundary pattern is valid"));
static UPPER_RUN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\p{Lu}+)(\p{Lu}[\p{Ll}\d]+)").expect("acronym boundary pattern is valid")
});

/// `addTodo` and `XMLRequest` become `add_todo` and `xml_request`
fn decamelize(name: &str) -> String {
    let split = LOWER_UPPER.replace_all(name, "${1}_${2}");
    let split = UPPER_RUN.replace_all(&split, "${1}_${2}");
    split.to_lowercase()
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct Options {
    allow: Option<StringOrList>,
    disallow: Option<StringOrList>,
    observable: String,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            allow: None,
            disallow: None,
            observable: DEFAULT_OBSERVABLE.to_string(),
        }
    }
}

/// A pattern taken verbatim, or words matched between boundaries or underscores
fn words_regex(rule: &str, config: &StringOrList) -> Result<Option<Regex>, ConfigError> {
    let pattern = match config {
        StringOrList::One(pattern) if pattern.is_empty() => return Ok(None),
        StringOrList::One(pattern) => Cow::Borrowed(pattern.as_str()),
        StringOrList::Many(words) if words.is_empty() => return Ok(None),
        StringOrList::Many(words) => Cow::Owned(format!(
            "({})",
            words
                .iter()
                .map(|w| format!(r"(\b|_){}(\b|_)", regex::escape(w)))
                .collect::<Vec<_>>()
                .join("|")
        )),
    };
    compile_regex(rule, &format!("(?i){}", pattern)).map(Some)
}

enum ActionFilter {
    Allow(Regex),
    Disallow(Regex),
    Nothing,
}

pub struct NoUnsafeSwitchmap {
    filter: ActionFilter,
    observable: Regex,
    listeners: Listeners<Self>,
}

impl NoUnsafeSwitchmap {
    fn is_unsafe(&self, of_type: Node<'_>) -> bool {
        let names: Vec<String> = of_type
            .list("arguments")
            .iter()
            .map(|arg| {
                let name = match arg.kind() {
                    NodeKind::Literal => arg.str("value"),
                    _ => member_or_identifier_name(arg),
                };
                decamelize(name.unwrap_or_default())
            })
            .collect();
        match &self.filter {
            ActionFilter::Allow(allow) => !names.iter().all(|n| allow.is_match(n)),
            ActionFilter::Disallow(disallow) => names.iter().any(|n| disallow.is_match(n)),
            ActionFilter::Nothing => false,
        }
    }

    fn check_pipe(&self, _: &mut (), pipe: Node<'_>, cx: &mut RuleContext<'_>) {
        if !is_effect_pipe(pipe, &self.observable) || !cx.types().could_be_type(pipe, "Observable")
        {
            return;
        }
        let operators: Vec<(Node<'_>, Node<'_>)> = pipe
            .list("arguments")
            .iter()
            .filter(|arg| arg.is(NodeKind::CallExpression))
            .filter_map(|arg| {
                arg.child("callee")
                    .filter(|c| c.is(NodeKind::Identifier))
                    .map(|callee| (arg, callee))
            })
            .collect();
        let filters_unsafe = operators
            .iter()
            .any(|(call, callee)| callee.is_identifier("ofType") && self.is_unsafe(*call));
        if !filters_unsafe {
            return;
        }
        for (_, callee) in operators {
            if callee.is_identifier("switchMap") {
                cx.report(Report::new("forbidden", callee));
            }
        }
    }
}

impl Configurable for NoUnsafeSwitchmap {
    fn from_options(options: &Json) -> Result<Self, ConfigError> {
        let name = Self::META.name;
        let options: Options = parse_options(name, options)?;
        let default_disallow =
            StringOrList::Many(DEFAULT_DISALLOW.iter().map(|w| w.to_string()).collect());
        let filter = match (&options.allow, &options.disallow) {
            (Some(allow), _) => words_regex(name, allow)?.map(ActionFilter::Allow),
            (None, Some(disallow)) => words_regex(name, disallow)?.map(ActionFilter::Disallow),
            (None, None) => words_regex(name, &default_disallow)?.map(ActionFilter::Disallow),
        };
        Ok(Self {
            filter: filter.unwrap_or(ActionFilter::Nothing),
            observable: compile_regex(name, &options.observable)?,
            listeners: Listeners::<Self>::new()
                .on("CallExpression[callee.property.name='pipe']", Self::check_pipe)?,
        })
    }
}

impl RuleDef for NoUnsafeSwitchmap {
    type State = ();

    const META: &'static RuleMeta = &RuleMeta {
        name: "no-unsafe-switchmap",
        description: "Forbids unsafe `switchMap` usage in effects and epics.",
        category: RuleCategory::Correctness,
        stability: RuleStability::Stable,
        requires_type_checking: true,
        fixable: false,
        has_suggestions: false,
        messages: &[(
            "forbidden",
            "Unsafe switchMap usage in effects and epics is forbidden.",
        )],
        options: &[
            OptionSpec {
                name: "allow",
                kind: OptionKind::StringList,
                default: "null",
                description: "Action words (or one pattern) that may use switchMap; overrides disallow",
            },
            OptionSpec {
                name: "disallow",
                kind: OptionKind::StringList,
                default: r#"["add","create","delete","post","put","remove","set","update"]"#,
                description: "Action words (or one pattern) that must not use switchMap",
            },
            OptionSpec {
                name: "observable",
                kind: OptionKind::Regex,
                default: DEFAULT_OBSERVABLE_JSON,
                description: "Pattern for the action stream names of effects and epics",
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

    fn effect(action: Js) -> Js {
        expr_stmt(
            method(
                ident("actions$"),
                "pipe",
                vec![
                    call(ident("ofType"), vec![action]),
                    call(ident("tap"), vec![ident("log")]),
                    call(ident("switchMap"), vec![ident("save")]),
                ],
            )
            .typed(observable(number_type())),
        )
    }

    #[test]
    fn test_decamelize() {
        assert_eq!(decamelize("addTodo"), "add_todo");
        assert_eq!(decamelize("ADD_TODO"), "add_todo");
        assert_eq!(decamelize("XMLRequest"), "xml_request");
        assert_eq!(decamelize("[Todo] Add"), "[todo] add");
    }

    #[test]
    fn test_default_disallowed_actions() {
        let linted = lint_default::<NoUnsafeSwitchmap>(program(vec![
            effect(string("ADD_TODO")),
            effect(member(ident("ActionTypes"), "RemoveTodo")),
            effect(ident("addressChanged")),
            effect(string("[Todo] Load")),
        ]));
        assert_eq!(linted.reported(), vec!["switchMap", "switchMap"]);
        assert_eq!(linted.diagnostics[1].location.line, 2);
    }

    #[test]
    fn test_allow_and_disallow_options() {
        let allowed = lint::<NoUnsafeSwitchmap>(
            json!([{ "allow": ["load", "get"] }]),
            program(vec![effect(string("LOAD_TODOS")), effect(string("SAVE_TODO"))]),
        );
        assert_eq!(allowed.count(), 1);
        assert_eq!(allowed.diagnostics[0].location.line, 2);

        let disallowed = lint::<NoUnsafeSwitchmap>(
            json!([{ "disallow": "^save" }]),
            program(vec![effect(string("SAVE_TODO")), effect(string("ADD_TODO"))]),
        );
        assert_eq!(disallowed.count(), 1);
        assert_eq!(disallowed.diagnostics[0].location.line, 1);
    }
}
