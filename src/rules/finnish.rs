//! Enforce Finnish notation (`$` suffix) for observable names

use super::naming::{declared_name_site, declared_type, NameSite, NAME_SELECTOR};
use super::{compile_validation_map, default_types_map, parse_options, Configurable};
use crate::config::ConfigError;
use crate::rule::{
    Listeners, OptionKind, OptionSpec, Report, RuleCategory, RuleContext, RuleDef, RuleMeta,
    RuleStability,
};
use crate::tree::Node;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value as Json;
use std::collections::BTreeMap;

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct Options {
    functions: bool,
    methods: bool,
    names: BTreeMap<String, bool>,
    parameters: bool,
    properties: bool,
    strict: bool,
    types: BTreeMap<String, bool>,
    variables: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            functions: true,
            methods: true,
            names: BTreeMap::new(),
            parameters: true,
            properties: true,
            strict: false,
            types: default_types_map(),
            variables: true,
        }
    }
}

pub struct Finnish {
    sites: Vec<NameSite>,
    strict: bool,
    names: Vec<(Regex, bool)>,
    types: Vec<(Regex, bool)>,
    listeners: Listeners<Self>,
}

impl Finnish {
    fn check_name(&self, _: &mut (), identifier: Node<'_>, cx: &mut RuleContext<'_>) {
        let Some(site) = declared_name_site(identifier) else {
            return;
        };
        let Some(name) = identifier.name() else {
            return;
        };
        if !self.sites.contains(&site) {
            return;
        }
        let suffixed = name.ends_with('$');
        if suffixed && !self.strict {
            return;
        }
        let should_not = |cx: &mut RuleContext<'_>| {
            if suffixed {
                cx.report(Report::new("shouldNotBeFinnish", identifier));
            }
        };

        if self
            .names
            .iter()
            .any(|(re, validate)| !validate && re.is_match(name))
        {
            should_not(cx);
            return;
        }

        let Some(ty) = declared_type(cx.types(), identifier) else {
            return;
        };
        if ty.could_be("Observable") || ty.could_return("Observable") {
            let exempt = self
                .types
                .iter()
                .any(|(re, validate)| !validate && ty.could_be(re));
            if exempt {
                should_not(cx);
            } else if !suffixed {
                cx.report(Report::new("shouldBeFinnish", identifier));
            }
            return;
        }
        should_not(cx);
    }
}

impl Configurable for Finnish {
    fn from_options(options: &Json) -> Result<Self, ConfigError> {
        let name = Self::META.name;
        let options: Options = parse_options(name, options)?;
        let sites = [
            (options.functions, NameSite::Function),
            (options.methods, NameSite::Method),
            (options.parameters, NameSite::Parameter),
            (options.properties, NameSite::Property),
            (options.variables, NameSite::Variable),
        ]
        .into_iter()
        .filter_map(|(enabled, site)| enabled.then_some(site))
        .collect();
        Ok(Self {
            sites,
            strict: options.strict,
            names: compile_validation_map(name, &options.names)?,
            types: compile_validation_map(name, &options.types)?,
            listeners: Listeners::<Self>::new().on(NAME_SELECTOR, Self::check_name)?,
        })
    }
}

impl RuleDef for Finnish {
    type State = ();

    const META: &'static RuleMeta = &RuleMeta {
        name: "finnish",
        description: "Enforces the use of Finnish notation.",
        category: RuleCategory::Style,
        stability: RuleStability::Stable,
        requires_type_checking: true,
        fixable: false,
        has_suggestions: false,
        messages: &[
            ("shouldBeFinnish", "Finnish notation should be used here."),
            ("shouldNotBeFinnish", "Finnish notation should not be used here."),
        ],
        options: &[
            OptionSpec {
                name: "functions",
                kind: OptionKind::Boolean,
                default: "true",
                description: "Check function names",
            },
            OptionSpec {
                name: "methods",
                kind: OptionKind::Boolean,
                default: "true",
                description: "Check method names",
            },
            OptionSpec {
                name: "names",
                kind: OptionKind::PatternMap,
                default: "{}",
                description: "Name patterns mapped to false are exempt",
            },
            OptionSpec {
                name: "parameters",
                kind: OptionKind::Boolean,
                default: "true",
                description: "Check parameter names",
            },
            OptionSpec {
                name: "properties",
                kind: OptionKind::Boolean,
                default: "true",
                description: "Check property and accessor names",
            },
            OptionSpec {
                name: "strict",
                kind: OptionKind::Boolean,
                default: "false",
                description: "Also report suffixed names that are not observables",
            },
            OptionSpec {
                name: "types",
                kind: OptionKind::PatternMap,
                default: r#"{"^EventEmitter$":false}"#,
                description: "Type name patterns mapped to false are exempt",
            },
            OptionSpec {
                name: "variables",
                kind: OptionKind::Boolean,
                default: "true",
                description: "Check variable names",
            },
        ],
        replaced_by: None,
    };

    fn listeners(&self) -> &Listeners<Self> {
        &self.listeners
    }
}
