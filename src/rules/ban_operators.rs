//! Ban operators imported from `rxjs` or `rxjs/operators`

use super::{parse_options, BanList, BanValue, Configurable};
use crate::config::ConfigError;
use crate::rule::{
    Listeners, OptionKind, OptionSpec, Report, RuleCategory, RuleContext, RuleDef, RuleMeta,
    RuleStability,
};
use crate::tree::Node;
use serde_json::Value as Json;
use std::collections::BTreeMap;

pub struct BanOperators {
    bans: BanList,
    listeners: Listeners<Self>,
}

impl BanOperators {
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

impl Configurable for BanOperators {
    fn from_options(options: &Json) -> Result<Self, ConfigError> {
        let map: BTreeMap<String, BanValue> = parse_options(Self::META.name, options)?;
        Ok(Self {
            bans: BanList::compile(Self::META.name, &map)?,
            listeners: Listeners::<Self>::new().on(
                r"ImportDeclaration[source.value=/^rxjs(\/operators)?$/] > ImportSpecifier",
                Self::check_specifier,
            )?,
        })
    }
}

impl RuleDef for BanOperators {
    type State = ();

    const META: &'static RuleMeta = &RuleMeta {
        name: "ban-operators",
        description: "Forbids the use of banned operators.",
        category: RuleCategory::Restriction,
        stability: RuleStability::Stable,
        requires_type_checking: false,
        fixable: false,
        has_suggestions: false,
        messages: &[("forbidden", "RxJS operator is banned: {{name}}{{explanation}}.")],
        options: &[OptionSpec {
            name: "<name>",
            kind: OptionKind::PatternMap,
            default: "{}",
            description: "Operator name patterns mapped to true or an explanation",
        }],
        replaced_by: None,
    };

    fn listeners(&self) -> &Listeners<Self> {
        &self.listeners
    }
}
