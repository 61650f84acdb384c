//! Require the RxJS Tools Babel macro import in files that use RxJS

use super::{no_options, Configurable};
use crate::config::ConfigError;
use crate::diagnostic::FixBuilder;
use crate::rule::{Listeners, Report, RuleCategory, RuleContext, RuleDef, RuleMeta, RuleStability};
use crate::tree::{Node, NodeId};
use serde_json::Value as Json;

const MACRO_IMPORT: &str = "babel-plugin-rxjs-tools/macro";

pub struct Macro {
    listeners: Listeners<Self>,
}

#[derive(Default)]
pub struct MacroState {
    first_use: Option<NodeId>,
    has_macro_import: bool,
}

impl Macro {
    fn record_use(&self, state: &mut MacroState, node: Node<'_>, _: &mut RuleContext<'_>) {
        state.first_use.get_or_insert(node.id());
    }

    fn record_import(&self, state: &mut MacroState, _: Node<'_>, _: &mut RuleContext<'_>) {
        state.has_macro_import = true;
    }

    fn check_program(&self, state: &mut MacroState, program: Node<'_>, cx: &mut RuleContext<'_>) {
        let Some(first_use) = state.first_use else {
            return;
        };
        if state.has_macro_import {
            return;
        }
        cx.report(
            Report::new("macro", cx.node(first_use)).with_fix(
                FixBuilder::new()
                    .insert_at(program.span().start, format!("import \"{}\";\n", MACRO_IMPORT)),
            ),
        );
    }
}

impl Configurable for Macro {
    fn from_options(options: &Json) -> Result<Self, ConfigError> {
        no_options(Self::META.name, options)?;
        let listeners = Listeners::<Self>::new()
            .on(
                "CallExpression[callee.property.name=/^(pipe|subscribe)$/]",
                Self::record_use,
            )?
            .on(r"ImportDeclaration[source.value=/^rxjs(\/|$)/]", Self::record_use)?
            .on(
                "ImportDeclaration[source.value='babel-plugin-rxjs-tools/macro']",
                Self::record_import,
            )?
            .on("Program:exit", Self::check_program)?;
        Ok(Self { listeners })
    }
}

impl RuleDef for Macro {
    type State = MacroState;

    const META: &'static RuleMeta = &RuleMeta {
        name: "macro",
        description: "Enforces the use of the RxJS Tools Babel macro.",
        category: RuleCategory::Style,
        stability: RuleStability::Deprecated,
        requires_type_checking: false,
        fixable: true,
        has_suggestions: false,
        messages: &[("macro", "Use the RxJS Tools Babel macro.")],
        options: &[],
        replaced_by: None,
    };

    fn listeners(&self) -> &Listeners<Self> {
        &self.listeners
    }
}
