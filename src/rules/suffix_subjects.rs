//! Enforce a naming suffix for subjects

use super::naming::{declared_name_site, declared_type, NameSite, NAME_SELECTOR};
use super::{compile_regex, compile_validation_map, default_types_map, parse_options, Configurable};
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
    parameters: bool,
    properties: bool,
    suffix: String,
    types: BTreeMap<String, bool>,
    variables: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            parameters: true,
            properties: true,
            suffix: "Subject".to_string(),
            types: default_types_map(),
            variables: true,
        }
    }
}

pub struct SuffixSubjects {
    sites: Vec<NameSite>,
    suffix: String,
    suffix_pattern: Regex,
    types: Vec<(Regex, bool)>,
    listeners: Listeners<Self>,
}

impl SuffixSubjects {
    fn check_name(&self, _: &mut (), identifier: Node<'_>, cx: &mut RuleContext<'_>) {
        let Some(site) = declared_name_site(identifier) else {
            return;
        };
        let Some(name) = identifier.name() else {
            return;
        };
        if !self.sites.contains(&site) || self.suffix_pattern.is_match(name) {
            return;
        }
        let Some(ty) = declared_type(cx.types(), identifier) else {
            return;
        };
        if !ty.could_be("Subject") {
            return;
        }
        if self.types.iter().any(|(re, validate)| !validate && ty.could_be(re)) {
            return;
        }
        cx.report(Report::new("forbidden", identifier).with_data("suffix", self.suffix.clone()));
    }
}

impl Configurable for SuffixSubjects {
    fn from_options(options: &Json) -> Result<Self, ConfigError> {
        let name = Self::META.name;
        let options: Options = parse_options(name, options)?;
        let sites = [
            (options.parameters, NameSite::Parameter),
            (options.properties, NameSite::Property),
            (options.variables, NameSite::Variable),
        ]
        .into_iter()
        .filter_map(|(enabled, site)| enabled.then_some(site))
        .collect();
        let suffix_pattern = compile_regex(name, &format!(r"(?i){}\$?$", regex::escape(&options.suffix)))?;
        Ok(Self {
            sites,
            suffix_pattern,
            types: compile_validation_map(name, &options.types)?,
            suffix: options.suffix,
            listeners: Listeners::<Self>::new().on(NAME_SELECTOR, Self::check_name)?,
        })
    }
}

impl RuleDef for SuffixSubjects {
    type State = ();

    const META: &'static RuleMeta = &RuleMeta {
        name: "suffix-subjects",
        description: "Enforces the use of a suffix in subject identifiers.",
        category: RuleCategory::Style,
        stability: RuleStability::Stable,
        requires_type_checking: true,
        fixable: false,
        has_suggestions: false,
        messages: &[("forbidden", "Subject identifiers must end with \"{{suffix}}\".")],
        options: &[
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
                name: "suffix",
                kind: OptionKind::String,
                default: "\"Subject\"",
                description: "Required suffix, optionally followed by `$`",
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
