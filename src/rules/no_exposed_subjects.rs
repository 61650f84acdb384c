//! Forbid subjects that are visible outside their class

use super::{parse_options, Configurable};
use crate::config::ConfigError;
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
    allow_protected: bool,
}

pub struct NoExposedSubjects {
    message_id: &'static str,
    listeners: Listeners<Self>,
}

impl NoExposedSubjects {
    fn report(&self, name: Node<'_>, cx: &mut RuleContext<'_>) {
        let subject = name.name().unwrap_or_default().to_string();
        cx.report(Report::new(self.message_id, name).with_data("subject", subject));
    }

    /// Class properties and accessors typed as subjects
    fn check_member(&self, _: &mut (), member: Node<'_>, cx: &mut RuleContext<'_>) {
        let Some(key) = member.child("key") else {
            return;
        };
        let types = cx.types();
        let is_subject = types.could_be_type(member, "Subject") || types.could_be_type(key, "Subject");
        if is_subject {
            self.report(key, cx);
        }
    }

    /// `constructor(public subject: Subject<T>)`
    fn check_parameter(&self, _: &mut (), param: Node<'_>, cx: &mut RuleContext<'_>) {
        if cx.types().could_be_type(param, "Subject") {
            self.report(param, cx);
        }
    }

    /// Methods declared to return a subject
    fn check_method(&self, _: &mut (), method: Node<'_>, cx: &mut RuleContext<'_>) {
        let Some(key) = method.child("key") else {
            return;
        };
        let returns_subject = method
            .child("value")
            .and_then(|f| f.child("returnType"))
            .and_then(|r| r.child("typeAnnotation"))
            .filter(|t| t.is(NodeKind::TSTypeReference))
            .and_then(|t| t.child("typeName"))
            .and_then(|n| n.name())
            .is_some_and(|n| n.ends_with("Subject"));
        if returns_subject {
            self.report(key, cx);
        }
    }
}

impl Configurable for NoExposedSubjects {
    fn from_options(options: &Json) -> Result<Self, ConfigError> {
        let options: Options = parse_options(Self::META.name, options)?;
        let (hidden, message_id) = if options.allow_protected {
            ("/^(private|protected)$/", "forbiddenAllowProtected")
        } else {
            ("/^private$/", "forbidden")
        };
        let listeners = Listeners::<Self>::new()
            .on(
                &format!("PropertyDefinition[accessibility!={}]", hidden),
                Self::check_member,
            )?
            .on(
                &format!(
                    "MethodDefinition[kind='constructor'] > FunctionExpression > TSParameterProperty[accessibility!={}] > Identifier",
                    hidden
                ),
                Self::check_parameter,
            )?
            .on(
                &format!("MethodDefinition[kind=/^(get|set)$/][accessibility!={}]", hidden),
                Self::check_member,
            )?
            .on(
                &format!("MethodDefinition[kind='method'][accessibility!={}]", hidden),
                Self::check_method,
            )?;
        Ok(Self {
            message_id,
            listeners,
        })
    }
}

impl RuleDef for NoExposedSubjects {
    type State = ();

    const META: &'static RuleMeta = &RuleMeta {
        name: "no-exposed-subjects",
        description: "Forbids exposed (i.e. non-private) subjects.",
        category: RuleCategory::Restriction,
        stability: RuleStability::Stable,
        requires_type_checking: true,
        fixable: false,
        has_suggestions: false,
        messages: &[
            ("forbidden", "Subject '{{subject}}' must be private."),
            (
                "forbiddenAllowProtected",
                "Subject '{{subject}}' must be private or protected.",
            ),
        ],
        options: &[OptionSpec {
            name: "allowProtected",
            kind: OptionKind::Boolean,
            default: "false",
            description: "Accept protected subjects",
        }],
        replaced_by: None,
    };

    fn listeners(&self) -> &Listeners<Self> {
        &self.listeners
    }
}
