//! Forbid subclassing RxJS classes

use super::{no_options, Configurable};
use crate::config::ConfigError;
use crate::rule::{Listeners, Report, RuleCategory, RuleContext, RuleDef, RuleMeta, RuleStability};
use crate::tree::Node;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value as Json;

static RXJS_MODULE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[/\\]rxjs[/\\]").expect("module pattern is valid"));

const CLASSES: &[&str] = &[
    "AsyncSubject",
    "BehaviorSubject",
    "Observable",
    "ReplaySubject",
    "Scheduler",
    "Subject",
    "Subscriber",
];

pub struct NoSubclass {
    listeners: Listeners<Self>,
}

impl NoSubclass {
    fn check_super_class(&self, _: &mut (), super_class: Node<'_>, cx: &mut RuleContext<'_>) {
        let Some(name) = super_class.name().filter(|n| CLASSES.contains(n)) else {
            return;
        };
        if cx.types().could_be_type_in(super_class, name, &RXJS_MODULE) {
            cx.report(Report::new("forbidden", super_class));
        }
    }
}

impl Configurable for NoSubclass {
    fn from_options(options: &Json) -> Result<Self, ConfigError> {
        no_options(Self::META.name, options)?;
        Ok(Self {
            listeners: Listeners::<Self>::new().on(
                ":matches(ClassDeclaration, ClassExpression) > Identifier.superClass",
                Self::check_super_class,
            )?,
        })
    }
}

impl RuleDef for NoSubclass {
    type State = ();

    const META: &'static RuleMeta = &RuleMeta {
        name: "no-subclass",
        description: "Forbids subclassing RxJS classes.",
        category: RuleCategory::Restriction,
        stability: RuleStability::Stable,
        requires_type_checking: true,
        fixable: false,
        has_suggestions: false,
        messages: &[("forbidden", "Subclassing RxJS classes is forbidden.")],
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
    use crate::types::Type;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_subclasses() {
        let local_subject = Type::named("Subject").in_module("src/app/subject.ts");
        let linted = lint_default::<NoSubclass>(program(vec![
            class_decl(
                "GenericObservable",
                Some(ident("Observable").typed(observable(Type::Any))),
                vec![],
            ),
            class_decl("Mine", Some(ident("Subject").typed(local_subject)), vec![]),
            class_decl("Untyped", Some(ident("Subscriber")), vec![]),
        ]));
        assert_eq!(linted.reported(), vec!["Observable"]);
        assert_eq!(
            linted.messages(),
            vec!["Subclassing RxJS classes is forbidden."]
        );
    }
}
