//! Forbid Finnish notation

use super::naming::{declared_name_site, declared_type, NAME_SELECTOR};
use super::{no_options, Configurable};
use crate::config::ConfigError;
use crate::rule::{Listeners, Report, RuleCategory, RuleContext, RuleDef, RuleMeta, RuleStability};
use crate::tree::Node;
use serde_json::Value as Json;

pub struct NoFinnish {
    listeners: Listeners<Self>,
}

impl NoFinnish {
    fn check_name(&self, _: &mut (), identifier: Node<'_>, cx: &mut RuleContext<'_>) {
        if !identifier.name().is_some_and(|n| n.ends_with('$')) {
            return;
        }
        if declared_name_site(identifier).is_none() {
            return;
        }
        let observable = declared_type(cx.types(), identifier)
            .is_some_and(|ty| ty.could_be("Observable") || ty.could_return("Observable"));
        if observable {
            cx.report(Report::new("forbidden", identifier));
        }
    }
}

impl Configurable for NoFinnish {
    fn from_options(options: &Json) -> Result<Self, ConfigError> {
        no_options(Self::META.name, options)?;
        Ok(Self {
            listeners: Listeners::<Self>::new().on(NAME_SELECTOR, Self::check_name)?,
        })
    }
}

impl RuleDef for NoFinnish {
    type State = ();

    const META: &'static RuleMeta = &RuleMeta {
        name: "no-finnish",
        description: "Forbids the use of Finnish notation.",
        category: RuleCategory::Style,
        stability: RuleStability::Stable,
        requires_type_checking: true,
        fixable: false,
        has_suggestions: false,
        messages: &[("forbidden", "Finnish notation is forbidden.")],
        options: &[],
        replaced_by: None,
    };

    fn listeners(&self) -> &Listeners<Self> {
        &self.listeners
    }
}
