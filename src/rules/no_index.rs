//! Forbid imports from RxJS index modules

use super::{no_options, Configurable};
use crate::config::ConfigError;
use crate::rule::{Listeners, Report, RuleCategory, RuleContext, RuleDef, RuleMeta, RuleStability};
use crate::tree::Node;
use serde_json::Value as Json;

pub struct NoIndex {
    listeners: Listeners<Self>,
}

impl NoIndex {
    fn check_source(&self, _: &mut (), source: Node<'_>, cx: &mut RuleContext<'_>) {
        cx.report(Report::new("forbidden", source));
    }
}

impl Configurable for NoIndex {
    fn from_options(options: &Json) -> Result<Self, ConfigError> {
        no_options(Self::META.name, options)?;
        Ok(Self {
            listeners: Listeners::<Self>::new().on(
                r"ImportDeclaration > Literal.source[value=/^rxjs(?:\/\w+)?\/index/]",
                Self::check_source,
            )?,
        })
    }
}

impl RuleDef for NoIndex {
    type State = ();

    const META: &'static RuleMeta = &RuleMeta {
        name: "no-index",
        description: "Forbids the importation from index modules.",
        category: RuleCategory::Restriction,
        stability: RuleStability::Stable,
        requires_type_checking: false,
        fixable: false,
        has_suggestions: false,
        messages: &[("forbidden", "RxJS imports from index modules are forbidden.")],
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
    use pretty_assertions::assert_eq;

    #[test]
    fn test_index_imports() {
        let linted = lint_default::<NoIndex>(program(vec![
            import_decl(vec![import_spec("of")], "rxjs/index"),
            import_decl(vec![import_spec("map")], "rxjs/operators/index"),
            import_decl(vec![import_spec("map")], "rxjs/operators"),
            import_decl(vec![import_spec("indexOf")], "rxjs"),
        ]));
        assert_eq!(
            linted.reported(),
            vec!["\"rxjs/index\"", "\"rxjs/operators/index\""]
        );
        assert_eq!(
            linted.messages()[0],
            "RxJS imports from index modules are forbidden."
        );
    }
}
