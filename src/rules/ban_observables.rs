//! Ban observable creators imported from `rxjs`

use super::{parse_options, BanList, BanValue, Configurable};
use crate::config::ConfigError;
use crate::rule::{
    Listeners, OptionKind, OptionSpec, Report, RuleCategory, RuleContext, RuleDef, RuleMeta,
    RuleStability,
};
use crate::tree::Node;
use serde_json::Value as Json;
use std::collections::BTreeMap;

pub struct BanObservables {
    bans: BanList,
    listeners: Listeners<Self>,
}

impl BanObservables {
    fn check_specifier(&self, _: &mut (), specifier: Node<'_>, cx: &mut RuleContext<'_>) {
        let Some(imported) = specifier.child("imported") else {
            return;
        };
        let Some(name) = imported.name() else {
            return;
        };
        if let Some(explanation) = self.bans.find(name) {
            cx.report(
                Report::new("forbidden", imported)
                    .with_data("name", name)
                    .with_data("explanation", explanation),
            );
        }
    }
}

impl Configurable for BanObservables {
    fn from_options(options: &Json) -> Result<Self, ConfigError> {
        let map: BTreeMap<String, BanValue> = parse_options(Self::META.name, options)?;
        Ok(Self {
            bans: BanList::compile(Self::META.name, &map)?,
            listeners: Listeners::<Self>::new().on(
                "ImportDeclaration[source.value='rxjs'] > ImportSpecifier",
                Self::check_specifier,
            )?,
        })
    }
}

impl RuleDef for BanObservables {
    type State = ();

    const META: &'static RuleMeta = &RuleMeta {
        name: "ban-observables",
        description: "Forbids the use of banned observables.",
        category: RuleCategory::Restriction,
        stability: RuleStability::Stable,
        requires_type_checking: false,
        fixable: false,
        has_suggestions: false,
        messages: &[("forbidden", "RxJS observable is banned: {{name}}{{explanation}}.")],
        options: &[OptionSpec {
            name: "<name>",
            kind: OptionKind::PatternMap,
            default: "{}",
            description: "Observable name patterns mapped to true or an explanation",
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

    #[test]
    fn test_banned_imports() {
        let linted = lint::<BanObservables>(
            json!({ "of": true, "from": "use defer", "timer": false }),
            program(vec![
                import_decl(
                    vec![import_spec("of"), import_spec("from"), import_spec("timer")],
                    "rxjs",
                ),
                import_decl(vec![import_spec("of")], "rxjs/operators"),
            ]),
        );
        assert_eq!(
            linted.messages(),
            vec![
                "RxJS observable is banned: of.",
                "RxJS observable is banned: from: use defer.",
            ]
        );
        assert_eq!(linted.reported(), vec!["of", "from"]);
    }

    #[test]
    fn test_patterns_match_whole_names() {
        let linted = lint::<BanObservables>(
            json!([{ "inter.*": true }]),
            program(vec![import_decl(
                vec![import_spec("interval"), import_spec("of")],
                "rxjs",
            )]),
        );
        assert_eq!(linted.reported(), vec!["interval"]);
    }

    #[test]
    fn test_invalid_pattern_fails_configuration() {
        assert!(matches!(
            BanObservables::from_options(&json!({ "[": true })),
            Err(ConfigError::InvalidRegex { .. })
        ));
    }
}
