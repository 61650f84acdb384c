//! Require `of` to be imported as `just`

use super::{no_options, Configurable};
use crate::config::ConfigError;
use crate::diagnostic::FixBuilder;
use crate::rule::{Listeners, Report, RuleCategory, RuleContext, RuleDef, RuleMeta, RuleStability};
use crate::tree::Node;
use serde_json::Value as Json;

pub struct Just {
    listeners: Listeners<Self>,
}

impl Just {
    fn check_specifier(&self, _: &mut (), specifier: Node<'_>, cx: &mut RuleContext<'_>) {
        let (Some(imported), Some(local)) = (specifier.child("imported"), specifier.child("local"))
        else {
            return;
        };
        // Already renamed
        if local.span() != imported.span() {
            return;
        }
        cx.report(
            Report::new("forbidden", specifier)
                .with_fix(FixBuilder::new().replace_node(specifier, "of as just")),
        );
        for &reference in cx.scopes().references(local.id()) {
            let reference = cx.node(reference);
            cx.report(
                Report::new("forbidden", reference)
                    .with_fix(FixBuilder::new().replace_node(reference, "just")),
            );
        }
    }
}

impl Configurable for Just {
    fn from_options(options: &Json) -> Result<Self, ConfigError> {
        no_options(Self::META.name, options)?;
        Ok(Self {
            listeners: Listeners::<Self>::new().on(
                "ImportDeclaration[source.value='rxjs'] > ImportSpecifier[imported.name='of']",
                Self::check_specifier,
            )?,
        })
    }
}

impl RuleDef for Just {
    type State = ();

    const META: &'static RuleMeta = &RuleMeta {
        name: "just",
        description: "Enforces the use of a `just` alias for `of`.",
        category: RuleCategory::Style,
        stability: RuleStability::Stable,
        requires_type_checking: false,
        fixable: true,
        has_suggestions: false,
        messages: &[("forbidden", "Use just alias.")],
        options: &[],
        replaced_by: None,
    };

    fn listeners(&self) -> &Listeners<Self> {
        &self.listeners
    }
}
