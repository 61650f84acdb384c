//! Forbid import locations that need `rxjs-compat`

use super::{no_options, Configurable};
use crate::config::ConfigError;
use crate::rule::{Listeners, Report, RuleCategory, RuleContext, RuleDef, RuleMeta, RuleStability};
use crate::tree::Node;
use serde_json::Value as Json;

pub struct NoCompat {
    listeners: Listeners<Self>,
}

impl NoCompat {
    fn check_import(&self, _: &mut (), import: Node<'_>, cx: &mut RuleContext<'_>) {
        cx.report(Report::new("forbidden", import));
    }
}

impl Configurable for NoCompat {
    fn from_options(options: &Json) -> Result<Self, ConfigError> {
        no_options(Self::META.name, options)?;
        Ok(Self {
            listeners: Listeners::<Self>::new().on(
                r"ImportDeclaration[source.value=/^rxjs\//]:not(ImportDeclaration[source.value=/^rxjs\/(ajax|fetch|operators|testing|webSocket)$/])",
                Self::check_import,
            )?,
        })
    }
}

impl RuleDef for NoCompat {
    type State = ();

    const META: &'static RuleMeta = &RuleMeta {
        name: "no-compat",
        description: "Forbids importation from locations that depend upon 'rxjs-compat'.",
        category: RuleCategory::Restriction,
        stability: RuleStability::Stable,
        requires_type_checking: false,
        fixable: false,
        has_suggestions: false,
        messages: &[(
            "forbidden",
            "'rxjs-compat'-dependent import locations are forbidden.",
        )],
        options: &[],
        replaced_by: None,
    };

    fn listeners(&self) -> &Listeners<Self> {
        &self.listeners
    }
}
